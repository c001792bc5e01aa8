use std::path::Path;
use std::time::Duration;

use crate::render::{RenderError, SceneRenderer};

/// How long a frame capture may take before the generator moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturePolicy {
    pub max_polls: u32,
    pub poll_interval: Duration,
    /// Pause after a frame that is only displayed.
    pub preview_delay: Duration,
}

impl Default for CapturePolicy {
    fn default() -> Self {
        Self {
            max_polls: 100,
            poll_interval: Duration::from_millis(30),
            preview_delay: Duration::from_millis(300),
        }
    }
}

impl CapturePolicy {
    pub fn timeout(&self) -> Duration {
        self.poll_interval * self.max_polls
    }
}

#[derive(Debug)]
pub enum CaptureOutcome {
    Saved,
    Previewed,
    TimedOut,
    Failed(RenderError),
}

impl CaptureOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, CaptureOutcome::Saved)
    }
}

/// Renders one frame and waits for it to land in `target`, or for the
/// preview delay when there is no target. Never retries.
pub async fn capture_frame<R: SceneRenderer + ?Sized>(
    renderer: &mut R,
    target: Option<&Path>,
    policy: &CapturePolicy,
) -> CaptureOutcome {
    if renderer.is_busy() {
        log::debug!("Previous capture still in flight");
    }

    let signal = renderer.render_frame(target);

    let Some(target) = target else {
        tokio::time::sleep(policy.preview_delay).await;
        return CaptureOutcome::Previewed;
    };

    match tokio::time::timeout(policy.timeout(), signal).await {
        Ok(Ok(Ok(()))) => {
            log::info!("Saved screen image to `{}`", target.display());
            CaptureOutcome::Saved
        }
        Ok(Ok(Err(err))) => {
            log::warn!("Capture of `{}` failed: {err}", target.display());
            CaptureOutcome::Failed(err)
        }
        Ok(Err(_)) => {
            log::warn!("Capture of `{}` was abandoned by the renderer", target.display());
            CaptureOutcome::Failed(RenderError::Dropped)
        }
        Err(_) => {
            log::warn!(
                "Capture of `{}` did not complete within {:?}",
                target.display(),
                policy.timeout()
            );
            CaptureOutcome::TimedOut
        }
    }
}
