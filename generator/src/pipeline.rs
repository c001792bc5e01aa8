use std::io;
use std::path::{Path, PathBuf};

use common::file_utils::{find_files, IMAGE_EXTENSIONS, MODEL_EXTENSIONS};
use imaginarium::{ColorFormat, Image, ImageDesc};
use rand::rngs::StdRng;
use thiserror::Error;

use crate::augment::BackgroundAugmentor;
use crate::capture::{capture_frame, CaptureOutcome, CapturePolicy};
use crate::config::{Config, GeneratorConfig, OutputPolicy};
use crate::dataset::{
    background_index, ensure_dir, folder_index_width, multi_model_info, object_mask_name,
    single_mask_name, single_model_info, write_info, zero_pad, FrameNaming, LabelManifest,
    LabelRow,
};
use crate::layout::{layout, LayoutError, MAX_GROUP_SIZE};
use crate::occlusion::{mask_renders, VisibilityMask};
use crate::render::{Lighting, LightingScope, Pose, RenderError, SceneRenderer};

/// Width backgrounds are normalized to on load; the height follows the
/// output aspect ratio.
pub const BACKGROUND_WIDTH: u32 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// Show frames without writing anything.
    #[default]
    Preview,
    /// Write frames, labels and info files per model.
    Generate,
    /// Log the parsed configuration and exit.
    CheckConfig,
    /// Like `generate`, plus one silhouette mask per frame.
    Masks,
    /// All models in one scene with random occlusion and per-object masks.
    Multi,
}

impl Mode {
    pub fn writes_files(self) -> bool {
        !matches!(self, Mode::Preview | Mode::CheckConfig)
    }

    pub fn renders_masks(self) -> bool {
        matches!(self, Mode::Masks | Mode::Multi)
    }
}

#[derive(Debug, Error)]
pub enum PassError {
    #[error("No background images found in {0:?}")]
    NoBackgrounds(PathBuf),
    #[error("No models found in {0:?}")]
    NoModels(PathBuf),
    #[error("A multi-object scene holds at most {MAX_GROUP_SIZE} models, found {0}")]
    TooManyModels(usize),
    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Image(#[from] imaginarium::Error),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> PassError + '_ {
    move |source| PassError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub masks: u64,
    pub saved: u64,
    pub timed_out: u64,
    pub failed: u64,
    /// The viewer closed before every frame was rendered.
    pub interrupted: bool,
}

impl RunSummary {
    fn record(&mut self, outcome: &CaptureOutcome) {
        match outcome {
            CaptureOutcome::Saved => self.saved += 1,
            CaptureOutcome::TimedOut => self.timed_out += 1,
            CaptureOutcome::Failed(_) => self.failed += 1,
            CaptureOutcome::Previewed => {}
        }
    }
}

/// Backgrounds and models found on disk for one run.
#[derive(Debug, Clone)]
pub struct Assets {
    pub backgrounds: Vec<Image>,
    pub models: Vec<PathBuf>,
    pub mask_background: Option<Image>,
}

fn background_size(output: &OutputPolicy) -> (u32, u32) {
    let height = BACKGROUND_WIDTH as u64 * output.size.height as u64 / output.size.width.max(1) as u64;
    (BACKGROUND_WIDTH, (height as u32).max(1))
}

fn load_background(path: &Path, (width, height): (u32, u32)) -> imaginarium::Result<Image> {
    Image::read_file(path)?.resize(width, height)
}

fn discover(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    find_files(dir, extensions).unwrap_or_else(|err| {
        log::error!("Cannot list {}: {err}", dir.display());
        Vec::new()
    })
}

impl Assets {
    pub fn load(config: &GeneratorConfig, mode: Mode) -> Result<Self, PassError> {
        let input = &config.input;
        let size = background_size(&config.output);

        let backgrounds: Vec<Image> = discover(&input.background_folder, IMAGE_EXTENSIONS)
            .iter()
            .filter_map(|path| match load_background(path, size) {
                Ok(image) => {
                    log::debug!("Loaded background {}", path.display());
                    Some(image)
                }
                Err(err) => {
                    log::warn!("Skipping background {}: {err}", path.display());
                    None
                }
            })
            .collect();
        if backgrounds.is_empty() {
            return Err(PassError::NoBackgrounds(input.background_folder.clone()));
        }

        let models = discover(&input.model_folder, MODEL_EXTENSIONS);
        if models.is_empty() {
            return Err(PassError::NoModels(input.model_folder.clone()));
        }

        let mask_background = if mode.renders_masks() {
            Some(Self::load_mask_background(input.mask_background.as_deref(), size)?)
        } else {
            None
        };

        log::info!(
            "Found {} backgrounds and {} models",
            backgrounds.len(),
            models.len()
        );

        Ok(Self {
            backgrounds,
            models,
            mask_background,
        })
    }

    fn load_mask_background(path: Option<&Path>, size: (u32, u32)) -> Result<Image, PassError> {
        if let Some(path) = path {
            match load_background(path, size) {
                Ok(image) => return Ok(image),
                Err(err) => log::warn!("Cannot load mask background {}: {err}", path.display()),
            }
        } else {
            log::warn!("No mask background configured");
        }
        log::warn!("Using a black mask background");

        Ok(Image::new_empty(ImageDesc::new(size.0, size.1, ColorFormat::RGB_U8))?)
    }

    fn background_for(&self, counter: u64) -> &Image {
        &self.backgrounds[background_index(counter, self.backgrounds.len())]
    }
}

/// Drives the renderer through every frame of a run and assembles the
/// dataset on disk.
pub struct Generator<R: SceneRenderer> {
    config: Config,
    renderer: R,
    rng: StdRng,
    mode: Mode,
    policy: CapturePolicy,
    visibility_plan: Vec<VisibilityMask>,
}

/// Frame `frame_index` (1-based) takes the plan entry at that position,
/// cycling; an empty plan draws a random mask.
fn next_visibility(plan: &[VisibilityMask], frame_index: u64, rng: &mut StdRng) -> VisibilityMask {
    if plan.is_empty() {
        VisibilityMask::random(rng)
    } else {
        plan[((frame_index - 1) % plan.len() as u64) as usize]
    }
}

impl<R: SceneRenderer> Generator<R> {
    pub fn new(config: Config, renderer: R, rng: StdRng, mode: Mode) -> Self {
        Self {
            config,
            renderer,
            rng,
            mode,
            policy: CapturePolicy::default(),
            visibility_plan: Vec::new(),
        }
    }

    pub fn with_capture_policy(mut self, policy: CapturePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the random per-frame occlusion of the multi-object pass with
    /// a fixed sequence of masks.
    pub fn with_visibility_plan(mut self, plan: Vec<VisibilityMask>) -> Self {
        self.visibility_plan = plan;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub async fn run(&mut self) -> Result<RunSummary, PassError> {
        log::info!("Running in {:?} mode", self.mode);

        match self.mode {
            Mode::CheckConfig => {
                self.check_config();
                Ok(RunSummary::default())
            }
            Mode::Multi => {
                let assets = Assets::load(&self.config.generator, self.mode)?;
                self.run_multi_object(&assets).await
            }
            Mode::Preview | Mode::Generate | Mode::Masks => {
                let assets = Assets::load(&self.config.generator, self.mode)?;
                self.run_single_object(&assets).await
            }
        }
    }

    pub fn check_config(&self) {
        let generator = &self.config.generator;
        log::info!(
            "Translations: {}, frames per pass: {}",
            generator.translations.len(),
            generator.total_frames()
        );
        if let Some(t) = generator.translations.first() {
            log::info!(
                "First translation: random {}, position x {} : {}",
                t.is_random(),
                t.position().x.from,
                t.position().x.to
            );
            log::info!(
                "First translation: angle x {} : {}, multi samples {}",
                t.angle().x.from,
                t.angle().x.to,
                generator.output.num_multi_samples
            );
        }
    }

    /// One pass per model with `num_objects` copies of it laid out around
    /// each sampled position.
    async fn run_single_object(&mut self, assets: &Assets) -> Result<RunSummary, PassError> {
        let generator = &self.config.generator;
        let output = &generator.output;
        let renderer = &mut self.renderer;
        let rng = &mut self.rng;
        let policy = self.policy;

        let writes = self.mode.writes_files();
        let mask_background = match self.mode {
            Mode::Masks => assets.mask_background.as_ref(),
            _ => None,
        };
        let object_count = output.object_count();
        let folder_width = folder_index_width(assets.models.len());
        let naming = FrameNaming::new(generator.total_frames(), &output.extension);
        let augmentor = BackgroundAugmentor::new(generator.input.bg_augmentation);

        if mask_background.is_some() {
            ensure_dir(&output.mask_folder).map_err(io_error(&output.mask_folder))?;
        }

        let mut summary = RunSummary::default();
        let mut background_counter: u64 = 1;

        for (k, model) in assets.models.iter().enumerate() {
            let folder = output.folder.join(zero_pad(k as u64, folder_width));
            if writes {
                ensure_dir(&folder).map_err(io_error(&folder))?;
                write_info(&folder, &single_model_info(model, self.config.pretty()))
                    .map_err(io_error(&folder))?;
            }

            renderer.load_scene(&vec![model.clone(); object_count])?;
            log::info!("Rendering model {} into {}", model.display(), folder.display());

            let mut manifest = LabelManifest::new();
            let mut frame_index: u64 = 1;

            'frames: for spec in &generator.translations {
                for j in 0..spec.count() {
                    let frame_id = naming.frame_id(frame_index);
                    let sample = spec.sample(j, rng);
                    let positions = layout(sample.position, object_count, &output.obj_shifts, rng)?;
                    for (object, position) in positions.iter().enumerate() {
                        renderer.set_pose(object, &Pose::at(*position, &sample));
                    }
                    manifest.push(&LabelRow::new(frame_id.as_str(), sample));

                    let background = augmentor.prepare(assets.background_for(background_counter), rng);
                    renderer.set_background(&background);

                    let target = writes.then(|| folder.join(naming.file_name(&frame_id)));
                    let outcome = capture_frame(renderer, target.as_deref(), &policy).await;
                    summary.record(&outcome);
                    summary.frames += 1;

                    if let Some(mask_background) = mask_background {
                        let name = if assets.models.len() > 1 {
                            object_mask_name(k, &frame_id, naming.extension())
                        } else {
                            single_mask_name(&frame_id, naming.extension())
                        };
                        let target = output.mask_folder.join(name);

                        let mut scope = LightingScope::new(&mut *renderer, Lighting::DARK);
                        scope.set_background(mask_background);
                        let outcome = capture_frame(&mut *scope, Some(&target), &policy).await;
                        summary.record(&outcome);
                        summary.masks += 1;
                    }

                    frame_index += 1;
                    background_counter += 1;

                    if renderer.is_closed() {
                        log::info!("Viewer closed, stopping after frame {frame_id}");
                        summary.interrupted = true;
                        break 'frames;
                    }
                }
            }

            if writes {
                manifest.write_to(&folder).map_err(io_error(&folder))?;
            }
            if summary.interrupted {
                break;
            }
        }

        Ok(summary)
    }

    /// All models share one scene. Every frame hides a random subset, lays
    /// the rest out around the sampled position and renders a combined mask
    /// plus one isolated mask per model.
    async fn run_multi_object(&mut self, assets: &Assets) -> Result<RunSummary, PassError> {
        let object_count = assets.models.len();
        if object_count > MAX_GROUP_SIZE {
            return Err(PassError::TooManyModels(object_count));
        }

        let generator = &self.config.generator;
        let output = &generator.output;
        let renderer = &mut self.renderer;
        let rng = &mut self.rng;
        let policy = self.policy;
        let plan = &self.visibility_plan;

        let naming = FrameNaming::new(generator.total_frames(), &output.extension);
        let folder = &output.folder;
        let mask_folder = &output.mask_folder;

        ensure_dir(folder).map_err(io_error(folder))?;
        ensure_dir(mask_folder).map_err(io_error(mask_folder))?;
        write_info(folder, &multi_model_info(&assets.models, self.config.pretty()))
            .map_err(io_error(folder))?;

        renderer.load_scene(&assets.models)?;
        log::info!("Rendering {object_count} models into {}", folder.display());

        let mut summary = RunSummary::default();
        let mut manifest = LabelManifest::new();
        let mut frame_index: u64 = 1;

        'frames: for spec in &generator.translations {
            for j in 0..spec.count() {
                let frame_id = naming.frame_id(frame_index);

                let visibility = next_visibility(plan, frame_index, rng);
                renderer.apply_visibility(visibility, object_count);

                let sample = spec.sample(j, rng);
                let group = layout(
                    sample.position,
                    visibility.visible_count(object_count),
                    &output.obj_shifts,
                    rng,
                )?;
                let positions = visibility.assign_positions(&group, object_count, sample.position);
                for (object, position) in positions.iter().enumerate() {
                    renderer.set_pose(object, &Pose::at(*position, &sample));
                }
                manifest.push(&LabelRow::new(frame_id.as_str(), sample));

                renderer.set_background(assets.background_for(frame_index));
                let target = folder.join(naming.file_name(&frame_id));
                let outcome = capture_frame(renderer, Some(&target), &policy).await;
                summary.record(&outcome);
                summary.frames += 1;

                if let Some(mask_background) = assets.mask_background.as_ref() {
                    let mut scope = LightingScope::new(&mut *renderer, Lighting::DARK);
                    scope.set_background(mask_background);

                    for mask in mask_renders(&frame_id, naming.extension(), visibility, object_count) {
                        scope.apply_visibility(mask.visibility, object_count);
                        let target = mask_folder.join(&mask.file_name);
                        let outcome = capture_frame(&mut *scope, Some(&target), &policy).await;
                        summary.record(&outcome);
                        summary.masks += 1;
                    }
                }

                frame_index += 1;

                if renderer.is_closed() {
                    log::info!("Viewer closed, stopping after frame {frame_id}");
                    summary.interrupted = true;
                    break 'frames;
                }
            }
        }

        manifest.write_to(folder).map_err(io_error(folder))?;

        Ok(summary)
    }
}
