pub mod augment;
pub mod capture;
pub mod config;
pub mod dataset;
pub mod flat_renderer;
pub mod layout;
pub mod occlusion;
pub mod pipeline;
pub mod render;
pub mod sampler;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use crate::augment::{augment, AugmentParams, Augmented, BackgroundAugmentor};
    pub use crate::capture::{capture_frame, CaptureOutcome, CapturePolicy};
    pub use crate::config::{
        Config, ConfigError, GeneratorConfig, InputPolicy, OutputPolicy, Range, Range3,
        ShiftBounds, TranslationSpec,
    };
    pub use crate::dataset::{FrameNaming, LabelManifest, LabelRow};
    pub use crate::flat_renderer::FlatRenderer;
    pub use crate::layout::{layout, LayoutError, MAX_GROUP_SIZE};
    pub use crate::occlusion::{MaskKind, MaskRender, VisibilityMask};
    pub use crate::pipeline::{Generator, Mode, PassError, RunSummary};
    pub use crate::render::{CaptureSignal, Lighting, LightingScope, Pose, RenderError, SceneRenderer};
    pub use crate::sampler::Sample;
}
