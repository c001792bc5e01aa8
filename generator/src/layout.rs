use glam::DVec3;
use rand::Rng;
use thiserror::Error;

use crate::config::ShiftBounds;

/// Largest group the layout engine can place around one center.
pub const MAX_GROUP_SIZE: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Group layout supports at most {MAX_GROUP_SIZE} objects, got {0}")]
    UnsupportedGroupCount(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Signs(DVec3);

impl Signs {
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut sign = || if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let x = sign();
        let y = sign();
        let z = sign();
        Self(DVec3::new(x, y, z))
    }

    fn flip_z(self) -> Self {
        Self(self.0 * DVec3::new(1.0, 1.0, -1.0))
    }
}

fn draw_offset<R: Rng + ?Sized>(bounds: &ShiftBounds, signs: Signs, rng: &mut R) -> DVec3 {
    let range = bounds.as_range3();
    let x = range.x.from + rng.random::<f64>() * range.x.span();
    let y = range.y.from + rng.random::<f64>() * range.y.span();
    let z = range.z.from + rng.random::<f64>() * range.z.span();

    DVec3::new(x, y, z) * signs.0
}

/// Two positions that average to `center`.
fn antithetic_pair<R: Rng + ?Sized>(
    center: DVec3,
    bounds: &ShiftBounds,
    signs: Signs,
    rng: &mut R,
) -> [DVec3; 2] {
    let offset = draw_offset(bounds, signs, rng);
    [center + offset, center - offset]
}

/// Places `group_count` objects symmetrically around `center`.
///
/// One sign triple is drawn per call regardless of the count. A third object
/// sits on the center; a fourth pair mirrors the first one's Z sign.
pub fn layout<R: Rng + ?Sized>(
    center: DVec3,
    group_count: usize,
    bounds: &ShiftBounds,
    rng: &mut R,
) -> Result<Vec<DVec3>, LayoutError> {
    let signs = Signs::random(rng);

    let positions = match group_count {
        0 => Vec::new(),
        1 => vec![center],
        2 => antithetic_pair(center, bounds, signs, rng).to_vec(),
        3 => {
            let [a, b] = antithetic_pair(center, bounds, signs, rng);
            vec![a, b, center]
        }
        4 => {
            let [a, b] = antithetic_pair(center, bounds, signs, rng);
            let [c, d] = antithetic_pair(center, bounds, signs.flip_z(), rng);
            vec![a, b, c, d]
        }
        n => return Err(LayoutError::UnsupportedGroupCount(n)),
    };

    Ok(positions)
}
