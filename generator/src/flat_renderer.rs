use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use imaginarium::{ChannelCount, Image};
use tokio::sync::oneshot;

use crate::render::{CaptureSignal, Lighting, Pose, RenderError, SceneRenderer};

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub model: PathBuf,
    pub pose: Pose,
    pub visible: bool,
}

/// Headless renderer: tracks scene state and writes the current background,
/// scaled to the output width, as the frame.
#[derive(Debug)]
pub struct FlatRenderer {
    output_width: u32,
    objects: Vec<SceneObject>,
    background: Option<Arc<Image>>,
    lighting: Option<Lighting>,
    pending: Arc<AtomicUsize>,
    frames: u64,
    frame_limit: Option<u64>,
}

impl FlatRenderer {
    pub fn new(output_width: u32) -> Self {
        Self {
            output_width: output_width.max(1),
            objects: Vec::new(),
            background: None,
            lighting: Some(Lighting::default()),
            pending: Arc::new(AtomicUsize::new(0)),
            frames: 0,
            frame_limit: None,
        }
    }

    /// Reports the viewer as closed once `limit` frames were rendered.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

/// Frame as it would be read back from an RGB framebuffer of `width` pixels.
fn compose(background: &Image, width: u32) -> imaginarium::Result<Image> {
    let desc = background.desc();
    let height = (width as u64 * desc.height as u64 / desc.width.max(1) as u64).max(1) as u32;

    background
        .convert_channels(ChannelCount::Rgb)?
        .resize(width, height)
}

impl SceneRenderer for FlatRenderer {
    fn load_scene(&mut self, models: &[PathBuf]) -> Result<(), RenderError> {
        if models.is_empty() {
            return Err(RenderError::Scene("no models to load".to_string()));
        }
        if let Some(missing) = models.iter().find(|model| !model.is_file()) {
            return Err(RenderError::Scene(format!(
                "model file {} not found",
                missing.display()
            )));
        }

        self.objects = models
            .iter()
            .map(|model| SceneObject {
                model: model.clone(),
                pose: Pose::default(),
                visible: true,
            })
            .collect();
        log::debug!("Scene loaded with {} objects", self.objects.len());

        Ok(())
    }

    fn set_pose(&mut self, object: usize, pose: &Pose) {
        match self.objects.get_mut(object) {
            Some(target) => target.pose = *pose,
            None => log::warn!("Pose for unknown object {object} ignored"),
        }
    }

    fn set_visible(&mut self, object: usize, visible: bool) {
        match self.objects.get_mut(object) {
            Some(target) => target.visible = visible,
            None => log::warn!("Visibility for unknown object {object} ignored"),
        }
    }

    fn set_background(&mut self, image: &Image) {
        self.background = Some(Arc::new(image.clone()));
    }

    fn lighting(&self) -> Option<Lighting> {
        self.lighting
    }

    fn set_lighting(&mut self, lighting: Lighting) {
        self.lighting = Some(lighting);
    }

    fn render_frame(&mut self, target: Option<&Path>) -> CaptureSignal {
        let (tx, rx) = oneshot::channel();
        self.frames += 1;

        let Some(target) = target else {
            let _ = tx.send(Ok(()));
            return rx;
        };
        let Some(background) = self.background.clone() else {
            let _ = tx.send(Err(RenderError::NoBackground));
            return rx;
        };

        let path = target.to_path_buf();
        let width = self.output_width;
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);

        tokio::task::spawn_blocking(move || {
            let result = compose(&background, width)
                .and_then(|frame| frame.save_file(&path))
                .map_err(|err| RenderError::Save {
                    path: path.clone(),
                    message: err.to_string(),
                });
            pending.fetch_sub(1, Ordering::SeqCst);
            let _ = tx.send(result);
        });

        rx
    }

    fn is_busy(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    fn is_closed(&self) -> bool {
        self.frame_limit.is_some_and(|limit| self.frames >= limit)
    }
}
