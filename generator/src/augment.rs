use imaginarium::{Image, Rect};
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("Augmentation scale factors must be at least 1, got {h_scale}x{v_scale}")]
    InvalidScale { h_scale: f64, v_scale: f64 },
    #[error("Background augmentation failed: {0}")]
    Image(#[from] imaginarium::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AugmentParams {
    pub h_flip: bool,
    pub v_flip: bool,
    pub h_scale: f64,
    pub v_scale: f64,
}

impl AugmentParams {
    pub const IDENTITY: Self = Self {
        h_flip: false,
        v_flip: false,
        h_scale: 1.0,
        v_scale: 1.0,
    };

    /// Flips with probability 1/2, zoom factors uniform in `[1, 2)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let h_flip = rng.random::<f64>() > 0.5;
        let v_flip = rng.random::<f64>() > 0.5;
        let h_scale = rng.random::<f64>() + 1.0;
        let v_scale = rng.random::<f64>() + 1.0;

        Self {
            h_flip,
            v_flip,
            h_scale,
            v_scale,
        }
    }
}

impl Default for AugmentParams {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone)]
pub struct Augmented {
    pub image: Image,
    /// Part of the zoomed image that ended up in `image`, in zoomed pixels.
    pub dst: Rect,
}

/// Zooms `image` by the scale factors, keeps the top-left original-sized
/// window and applies the flips. The output has the input's size and format.
pub fn augment(image: &Image, params: &AugmentParams) -> Result<Augmented, AugmentError> {
    if !(params.h_scale >= 1.0 && params.v_scale >= 1.0) {
        return Err(AugmentError::InvalidScale {
            h_scale: params.h_scale,
            v_scale: params.v_scale,
        });
    }

    let desc = *image.desc();
    let (s, t) = (desc.width as f64, desc.height as f64);
    let new_width = (s * params.h_scale).floor() as u32;
    let new_height = (t * params.v_scale).floor() as u32;

    let zoomed = image.resize(new_width, new_height)?;
    let cropped = zoomed.crop(
        &Rect::from_size(new_width as f64, new_height as f64),
        &Rect::from_size(s, t),
    )?;

    let mut result = cropped.image;
    if params.h_flip {
        result.flip_horizontal();
    }
    if params.v_flip {
        result.flip_vertical();
    }

    Ok(Augmented {
        image: result,
        dst: cropped.dst,
    })
}

/// Applies random augmentation to frame backgrounds when enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackgroundAugmentor {
    enabled: bool,
}

impl BackgroundAugmentor {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Returns the background to show for one frame. A failed augmentation
    /// falls back to the untouched image.
    pub fn prepare<R: Rng + ?Sized>(&self, background: &Image, rng: &mut R) -> Image {
        if !self.enabled {
            return background.clone();
        }

        let params = AugmentParams::random(rng);
        match augment(background, &params) {
            Ok(augmented) => augmented.image,
            Err(err) => {
                log::warn!("{err}, using the original background");
                background.clone()
            }
        }
    }
}
