use glam::DVec3;
use rand::Rng;

use crate::dataset::{combined_mask_name, object_mask_name};

/// Per-frame visibility of up to 16 objects. A set bit hides the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VisibilityMask(u16);

impl VisibilityMask {
    pub const ALL_VISIBLE: Self = Self(0);

    /// Number of distinct channel values drawn per frame.
    pub const CHANNELS: u16 = 16;

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.random_range(0..Self::CHANNELS))
    }

    pub fn is_hidden(self, object: usize) -> bool {
        object < 16 && self.0 & (1 << object) != 0
    }

    pub fn is_visible(self, object: usize) -> bool {
        !self.is_hidden(object)
    }

    pub fn visible_objects(self, object_count: usize) -> impl Iterator<Item = usize> {
        (0..object_count).filter(move |&i| self.is_visible(i))
    }

    pub fn visible_count(self, object_count: usize) -> usize {
        self.visible_objects(object_count).count()
    }

    /// Every object except `object` hidden; `object` keeps its own bit.
    pub fn isolate(self, object: usize, object_count: usize) -> Self {
        let mut bits = 0u16;
        for i in (0..object_count.min(16)).filter(|&i| i != object) {
            bits |= 1 << i;
        }
        if self.is_hidden(object) {
            bits |= 1 << object;
        }
        Self(bits)
    }

    /// Hands layout positions to visible objects in index order; hidden
    /// objects are parked at `center`.
    pub fn assign_positions(
        self,
        group: &[DVec3],
        object_count: usize,
        center: DVec3,
    ) -> Vec<DVec3> {
        let mut group = group.iter();
        (0..object_count)
            .map(|i| {
                if self.is_visible(i) {
                    group.next().copied().unwrap_or(center)
                } else {
                    center
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskKind {
    Combined,
    Object(usize),
}

/// One mask image to render after the main frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskRender {
    pub kind: MaskKind,
    pub visibility: VisibilityMask,
    pub file_name: String,
}

/// Combined mask first, then one isolated mask per object.
pub fn mask_renders(
    frame_id: &str,
    extension: &str,
    visibility: VisibilityMask,
    object_count: usize,
) -> Vec<MaskRender> {
    let combined = MaskRender {
        kind: MaskKind::Combined,
        visibility,
        file_name: combined_mask_name(frame_id, extension),
    };

    std::iter::once(combined)
        .chain((0..object_count).map(|m| MaskRender {
            kind: MaskKind::Object(m),
            visibility: visibility.isolate(m, object_count),
            file_name: object_mask_name(m, frame_id, extension),
        }))
        .collect()
}
