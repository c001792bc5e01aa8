use std::path::{Path, PathBuf};

use imaginarium::Image;
use tokio::sync::oneshot;

use crate::render::{CaptureSignal, Lighting, Pose, RenderError, SceneRenderer};

mod pipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureBehavior {
    #[default]
    Complete,
    /// The signal never resolves.
    Stall,
    Fail,
    /// The sender is dropped without a result.
    Drop,
}

/// Scene state at the moment a frame was triggered.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub target: Option<PathBuf>,
    pub visible: Vec<bool>,
    pub poses: Vec<Pose>,
    pub lighting: Option<Lighting>,
    /// First pixel of the background.
    pub background: Option<Vec<u8>>,
}

/// Renderer double that records what the generator asked for.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    behavior: CaptureBehavior,
    lighting: Option<Lighting>,
    models: Vec<PathBuf>,
    visible: Vec<bool>,
    poses: Vec<Pose>,
    background: Option<Vec<u8>>,
    snapshots: Vec<Snapshot>,
    stalled: Vec<oneshot::Sender<Result<(), RenderError>>>,
    close_after: Option<usize>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            lighting: Some(Lighting::default()),
            ..Default::default()
        }
    }

    pub fn without_light(mut self) -> Self {
        self.lighting = None;
        self
    }

    pub fn with_capture(mut self, behavior: CaptureBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn close_after(mut self, frames: usize) -> Self {
        self.close_after = Some(frames);
        self
    }

    pub fn models(&self) -> &[PathBuf] {
        &self.models
    }

    pub fn visibility(&self) -> Vec<bool> {
        self.visible.clone()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn captures(&self) -> Vec<Option<PathBuf>> {
        self.snapshots.iter().map(|s| s.target.clone()).collect()
    }
}

impl SceneRenderer for RecordingRenderer {
    fn load_scene(&mut self, models: &[PathBuf]) -> Result<(), RenderError> {
        self.models = models.to_vec();
        self.visible = vec![true; models.len()];
        self.poses = vec![Pose::default(); models.len()];
        Ok(())
    }

    fn set_pose(&mut self, object: usize, pose: &Pose) {
        if let Some(slot) = self.poses.get_mut(object) {
            *slot = *pose;
        }
    }

    fn set_visible(&mut self, object: usize, visible: bool) {
        if let Some(slot) = self.visible.get_mut(object) {
            *slot = visible;
        }
    }

    fn set_background(&mut self, image: &Image) {
        self.background = Some(image.pixel(0, 0, 0).to_vec());
    }

    fn lighting(&self) -> Option<Lighting> {
        self.lighting
    }

    fn set_lighting(&mut self, lighting: Lighting) {
        self.lighting = Some(lighting);
    }

    fn render_frame(&mut self, target: Option<&Path>) -> CaptureSignal {
        self.snapshots.push(Snapshot {
            target: target.map(Path::to_path_buf),
            visible: self.visible.clone(),
            poses: self.poses.clone(),
            lighting: self.lighting,
            background: self.background.clone(),
        });

        let (tx, rx) = oneshot::channel();
        match self.behavior {
            CaptureBehavior::Complete => {
                let _ = tx.send(Ok(()));
            }
            CaptureBehavior::Stall => self.stalled.push(tx),
            CaptureBehavior::Fail => {
                let _ = tx.send(Err(RenderError::Save {
                    path: target.map(Path::to_path_buf).unwrap_or_default(),
                    message: "disk full".to_string(),
                }));
            }
            CaptureBehavior::Drop => drop(tx),
        }
        rx
    }

    fn is_busy(&self) -> bool {
        !self.stalled.is_empty()
    }

    fn is_closed(&self) -> bool {
        self.close_after
            .is_some_and(|frames| self.snapshots.len() >= frames)
    }
}
