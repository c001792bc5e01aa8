use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use glam::{DVec3, Vec4};
use imaginarium::Image;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::occlusion::VisibilityMask;
use crate::sampler::Sample;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to load scene: {0}")]
    Scene(String),
    #[error("No background set before rendering")]
    NoBackground,
    #[error("Failed to save frame to {path:?}: {message}")]
    Save { path: PathBuf, message: String },
    #[error("Renderer dropped the capture before completing it")]
    Dropped,
}

/// Completion of one triggered render. Resolves once the frame is on disk.
pub type CaptureSignal = oneshot::Receiver<Result<(), RenderError>>;

/// Placement of one object in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: DVec3,
    /// Euler angles about X, Y, Z, applied in that order.
    pub rotation: DVec3,
    pub scale: DVec3,
}

impl Pose {
    pub fn new(position: DVec3, rotation: DVec3, scale: DVec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Pose at `position` with the sample's rotation and scale.
    pub fn at(position: DVec3, sample: &Sample) -> Self {
        Self::new(position, sample.rotation, sample.scale_vec())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(DVec3::ZERO, DVec3::ZERO, DVec3::ONE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
}

impl Lighting {
    /// Unlit objects render as flat black silhouettes.
    pub const DARK: Lighting = Lighting {
        ambient: Vec4::new(0.0, 0.0, 0.0, 1.0),
        diffuse: Vec4::new(0.0, 0.0, 0.0, 1.0),
        specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
    };
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vec4::new(1.0, 1.0, 1.0, 1.0),
        }
    }
}

/// The scene graph, rasterizer and viewer behind the generator. Objects are
/// addressed by their index in the list passed to [`load_scene`].
///
/// [`load_scene`]: SceneRenderer::load_scene
pub trait SceneRenderer {
    /// Replaces the scene content with one object per model path.
    fn load_scene(&mut self, models: &[PathBuf]) -> Result<(), RenderError>;

    fn set_pose(&mut self, object: usize, pose: &Pose);

    fn set_visible(&mut self, object: usize, visible: bool);

    fn apply_visibility(&mut self, mask: VisibilityMask, object_count: usize) {
        for object in 0..object_count {
            self.set_visible(object, mask.is_visible(object));
        }
    }

    fn set_background(&mut self, image: &Image);

    /// `None` when the scene has no light source.
    fn lighting(&self) -> Option<Lighting>;

    fn set_lighting(&mut self, lighting: Lighting);

    /// Triggers one render. With a target the frame is saved there and the
    /// signal resolves after the write; without one the frame is only shown.
    fn render_frame(&mut self, target: Option<&Path>) -> CaptureSignal;

    /// A previously triggered capture has not completed yet.
    fn is_busy(&self) -> bool;

    /// The viewer was closed; the current pass should stop.
    fn is_closed(&self) -> bool;
}

/// Swaps the scene lighting for the lifetime of the guard and puts the
/// previous lighting back on drop.
pub struct LightingScope<'a, R: SceneRenderer + ?Sized> {
    renderer: &'a mut R,
    saved: Option<Lighting>,
}

impl<'a, R: SceneRenderer + ?Sized> LightingScope<'a, R> {
    pub fn new(renderer: &'a mut R, lighting: Lighting) -> Self {
        let saved = renderer.lighting();
        if saved.is_some() {
            renderer.set_lighting(lighting);
        }

        Self { renderer, saved }
    }
}

impl<R: SceneRenderer + ?Sized> Deref for LightingScope<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        &*self.renderer
    }
}

impl<R: SceneRenderer + ?Sized> DerefMut for LightingScope<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut *self.renderer
    }
}

impl<R: SceneRenderer + ?Sized> Drop for LightingScope<'_, R> {
    fn drop(&mut self) {
        if let Some(lighting) = self.saved.take() {
            self.renderer.set_lighting(lighting);
        }
    }
}
