use glam::DVec3;
use rand::Rng;

use crate::config::{Range, Range3, TranslationSpec};

/// Pose parameters of one frame before group layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: DVec3,
    /// Euler angles about X, Y, Z, applied in that order.
    pub rotation: DVec3,
    /// Isotropic scale.
    pub scale: f64,
}

impl Sample {
    pub fn scale_vec(&self) -> DVec3 {
        DVec3::splat(self.scale)
    }
}

fn draw<R: Rng + ?Sized>(range: &Range, rng: &mut R) -> f64 {
    let u: f64 = rng.random();
    range.from + u * range.span()
}

fn draw3<R: Rng + ?Sized>(range: &Range3, rng: &mut R) -> DVec3 {
    let x = draw(&range.x, rng);
    let y = draw(&range.y, rng);
    let z = draw(&range.z, rng);
    DVec3::new(x, y, z)
}

impl TranslationSpec {
    /// Samples frame `j` of this sweep.
    ///
    /// Stepped sweeps walk `from + step * j` with `step = (to - from) / count`,
    /// so the last frame stops one step short of `to`. Random sweeps draw each
    /// axis uniformly from `[from, to)` and a single scale for all axes.
    pub fn sample<R: Rng + ?Sized>(&self, j: u32, rng: &mut R) -> Sample {
        if self.is_random() {
            let position = draw3(self.position(), rng);
            let rotation = draw3(self.angle(), rng);
            let scale = draw(self.scale(), rng);

            Sample {
                position,
                rotation,
                scale,
            }
        } else {
            let j = j as f64;

            Sample {
                position: self.position().from_vec() + self.position_step() * j,
                rotation: self.angle().from_vec() + self.angle_step() * j,
                scale: self.scale().from + self.scale_step() * j,
            }
        }
    }
}
