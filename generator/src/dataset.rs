use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use crate::sampler::Sample;

pub const LABELS_FILE: &str = "labels.csv";
pub const INFO_FILE: &str = "info.txt";
pub const LABELS_HEADER: &str = "file,px,py,pz,ax,ay,az,s";

const SIGNIFICANT_DIGITS: i32 = 6;

fn decimal_digits(mut value: u64) -> usize {
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}

/// Digits needed for frame indices `1..=total`.
pub fn index_width(total: u64) -> usize {
    decimal_digits(total)
}

/// Digits used for per-model output folders. Folders are numbered from zero,
/// so the width follows the largest index, `model_count - 1`.
pub fn folder_index_width(model_count: usize) -> usize {
    if model_count <= 2 {
        1
    } else {
        decimal_digits(model_count as u64 - 1)
    }
}

pub fn zero_pad(index: u64, width: usize) -> String {
    format!("{index:0width$}")
}

/// `png` becomes `.png`; an empty extension stays empty.
pub fn normalize_extension(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}

pub fn combined_mask_name(frame_id: &str, extension: &str) -> String {
    format!("bg_{frame_id}_mask{extension}")
}

pub fn object_mask_name(object: usize, frame_id: &str, extension: &str) -> String {
    format!("{object}_{frame_id}_mask{extension}")
}

pub fn single_mask_name(frame_id: &str, extension: &str) -> String {
    format!("{frame_id}_mask{extension}")
}

/// Frame ids and file names of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNaming {
    width: usize,
    extension: String,
}

impl FrameNaming {
    pub fn new(total_frames: u64, extension: &str) -> Self {
        Self {
            width: index_width(total_frames),
            extension: normalize_extension(extension),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `index` is 1-based.
    pub fn frame_id(&self, index: u64) -> String {
        zero_pad(index, self.width)
    }

    pub fn file_name(&self, frame_id: &str) -> String {
        format!("{frame_id}{}", self.extension)
    }
}

/// Formats like a default C++ output stream: six significant digits,
/// trailing zeros trimmed, exponent notation outside `[1e-4, 1e6)`.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let scientific = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.abs()
        )
    } else {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// One manifest row: the pose parameters a frame was generated with.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRow {
    pub frame_id: String,
    pub sample: Sample,
}

impl LabelRow {
    pub fn new(frame_id: impl Into<String>, sample: Sample) -> Self {
        Self {
            frame_id: frame_id.into(),
            sample,
        }
    }
}

/// CSV label manifest accumulated over one pass.
#[derive(Debug, Clone)]
pub struct LabelManifest {
    text: String,
    rows: usize,
}

impl Default for LabelManifest {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelManifest {
    pub fn new() -> Self {
        let mut text = String::with_capacity(1024);
        text.push_str(LABELS_HEADER);
        text.push('\n');

        Self { text, rows: 0 }
    }

    pub fn push(&mut self, row: &LabelRow) {
        let Sample {
            position: p,
            rotation: a,
            scale,
        } = row.sample;

        let _ = write!(self.text, "{}", row.frame_id);
        for value in [p.x, p.y, p.z, a.x, a.y, a.z, scale] {
            self.text.push(',');
            self.text.push_str(&format_value(value));
        }
        self.text.push('\n');
        self.rows += 1;
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Writes `labels.csv` into `dir`, replacing any previous manifest.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(LABELS_FILE);
        std::fs::write(&path, &self.text)?;
        log::info!("Wrote {} labels to {}", self.rows, path.display());

        Ok(path)
    }
}

pub fn single_model_info(model: &Path, config: &str) -> String {
    format!("model :{}\nconfiguration: \n{config}", model.display())
}

pub fn multi_model_info(models: &[PathBuf], config: &str) -> String {
    let mut text = String::from("Multiple models :\n");
    for model in models {
        let _ = writeln!(text, "model :{}", model.display());
    }
    let _ = write!(text, "configuration: \n{config}");
    text
}

pub fn write_info(dir: &Path, content: &str) -> io::Result<PathBuf> {
    let path = dir.join(INFO_FILE);
    std::fs::write(&path, content)?;
    Ok(path)
}

pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// Background used for the 1-based frame `counter`.
pub fn background_index(counter: u64, pool_size: usize) -> usize {
    if pool_size == 0 {
        0
    } else {
        (counter % pool_size as u64) as usize
    }
}
