use std::path::{Path, PathBuf};

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::normalize_extension;
use crate::layout::MAX_GROUP_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Scalar `[from, to]` range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Range {
    pub from: f64,
    pub to: f64,
}

impl Range {
    pub const fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    pub fn span(&self) -> f64 {
        self.to - self.from
    }

    /// Per-frame increment of a stepped sweep. Zero when there are no frames.
    pub fn step(&self, count: u32) -> f64 {
        if count == 0 {
            0.0
        } else {
            self.span() / count as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Range3 {
    pub x: Range,
    pub y: Range,
    pub z: Range,
}

impl Range3 {
    pub const fn new(x: Range, y: Range, z: Range) -> Self {
        Self { x, y, z }
    }

    pub fn from_vec(&self) -> DVec3 {
        DVec3::new(self.x.from, self.y.from, self.z.from)
    }

    pub fn step(&self, count: u32) -> DVec3 {
        DVec3::new(self.x.step(count), self.y.step(count), self.z.step(count))
    }
}

/// Per-axis bounds for the random offsets between objects of one group.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftBounds {
    #[serde(rename = "x")]
    pub x_from: f64,
    pub x_to: f64,
    #[serde(rename = "y")]
    pub y_from: f64,
    pub y_to: f64,
    #[serde(rename = "z")]
    pub z_from: f64,
    pub z_to: f64,
}

impl ShiftBounds {
    pub fn as_range3(&self) -> Range3 {
        Range3::new(
            Range::new(self.x_from, self.x_to),
            Range::new(self.y_from, self.y_to),
            Range::new(self.z_from, self.z_to),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPolicy {
    pub size: Size,
    #[serde(rename = "output_folder")]
    pub folder: PathBuf,
    pub extension: String,
    pub num_multi_samples: u32,
    pub mask_folder: PathBuf,
    pub num_objects: u32,
    pub obj_shifts: ShiftBounds,
}

impl Default for OutputPolicy {
    fn default() -> Self {
        Self {
            size: Size::default(),
            folder: PathBuf::from("output"),
            extension: ".png".to_string(),
            num_multi_samples: 0,
            mask_folder: PathBuf::from("masks"),
            num_objects: 1,
            obj_shifts: ShiftBounds::default(),
        }
    }
}

impl OutputPolicy {
    pub fn object_count(&self) -> usize {
        self.num_objects.max(1) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPolicy {
    pub background_folder: PathBuf,
    pub model_folder: PathBuf,
    pub mask_background: Option<PathBuf>,
    pub bg_augmentation: bool,
}

/// Raw shape of a translation entry as it appears in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct TranslationDef {
    count: i64,
    random: bool,
    position: Range3,
    angle: Range3,
    scale: Range,
}

/// A sweep of frames sharing one sampling policy.
///
/// Step deltas are derived once on construction; the spec is immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "TranslationDef")]
pub struct TranslationSpec {
    count: u32,
    random: bool,
    position: Range3,
    angle: Range3,
    scale: Range,

    position_step: DVec3,
    angle_step: DVec3,
    scale_step: f64,
}

impl TranslationSpec {
    pub fn new(count: u32, random: bool, position: Range3, angle: Range3, scale: Range) -> Self {
        Self {
            count,
            random,
            position,
            angle,
            scale,
            position_step: position.step(count),
            angle_step: angle.step(count),
            scale_step: scale.step(count),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
    pub fn is_random(&self) -> bool {
        self.random
    }
    pub fn position(&self) -> &Range3 {
        &self.position
    }
    pub fn angle(&self) -> &Range3 {
        &self.angle
    }
    pub fn scale(&self) -> &Range {
        &self.scale
    }
    pub fn position_step(&self) -> DVec3 {
        self.position_step
    }
    pub fn angle_step(&self) -> DVec3 {
        self.angle_step
    }
    pub fn scale_step(&self) -> f64 {
        self.scale_step
    }
}

impl From<TranslationDef> for TranslationSpec {
    fn from(def: TranslationDef) -> Self {
        let count = if def.count < 0 {
            log::warn!("Translation count {} is negative, using 0", def.count);
            0
        } else {
            u32::try_from(def.count).unwrap_or(u32::MAX)
        };

        TranslationSpec::new(count, def.random, def.position, def.angle, def.scale)
    }
}

/// Total number of frames a list of translations produces in one pass.
pub fn total_frames(translations: &[TranslationSpec]) -> u64 {
    translations.iter().map(|t| t.count() as u64).sum()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub input: InputPolicy,
    pub output: OutputPolicy,
    pub translations: Vec<TranslationSpec>,
}

impl GeneratorConfig {
    pub fn total_frames(&self) -> u64 {
        total_frames(&self.translations)
    }

    fn normalize(&mut self) -> Result<(), ConfigError> {
        if self.output.num_objects == 0 {
            self.output.num_objects = 1;
        }
        if self.output.num_objects as usize > MAX_GROUP_SIZE {
            return Err(ConfigError::Invalid(format!(
                "num_objects is {}, at most {MAX_GROUP_SIZE} objects fit in a group",
                self.output.num_objects
            )));
        }
        if self.output.size.width == 0 || self.output.size.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "output size {}x{} must be non-zero",
                self.output.size.width, self.output.size.height
            )));
        }
        self.output.extension = normalize_extension(&self.output.extension);

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    generator: GeneratorConfig,
}

/// Loaded configuration together with its pretty-printed source, which is
/// copied verbatim into every `info.txt`.
#[derive(Debug, Clone)]
pub struct Config {
    pub generator: GeneratorConfig,
    pretty: String,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded configuration from {}", path.display());

        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let pretty = serde_json::to_string_pretty(&value)?;
        let ConfigFile { mut generator } = serde_json::from_value(value)?;
        generator.normalize()?;

        Ok(Self { generator, pretty })
    }

    pub fn pretty(&self) -> &str {
        &self.pretty
    }
}
