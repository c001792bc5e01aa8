use bytemuck::Pod;
use num_traits::{Bounded, NumCast, ToPrimitive};

use crate::color_format::{ChannelSize, ChannelType};
use crate::error::{Error, Result};
use crate::image::Image;

trait Component: Pod + ToPrimitive + NumCast + Bounded {
    const INTEGER: bool;
}

impl Component for u8 {
    const INTEGER: bool = true;
}

impl Component for u16 {
    const INTEGER: bool = true;
}

impl Component for f32 {
    const INTEGER: bool = false;
}

#[inline]
fn read<T: Component>(bytes: &[u8]) -> f32 {
    bytemuck::pod_read_unaligned::<T>(bytes)
        .to_f32()
        .unwrap_or_default()
}

#[inline]
fn write<T: Component>(value: f32, out: &mut [u8]) {
    let value = if T::INTEGER { value.round() } else { value };
    let lo = T::min_value().to_f32().unwrap_or(f32::MIN);
    let hi = T::max_value().to_f32().unwrap_or(f32::MAX);
    let value: T = NumCast::from(value.clamp(lo, hi)).unwrap_or_else(T::min_value);
    out.copy_from_slice(bytemuck::bytes_of(&value));
}

/// Source coordinate of destination pixel `i` when `src` pixels are stretched
/// over `dst`, sampling at pixel centers.
#[inline]
fn sample_coord(i: u32, src: u32, dst: u32) -> (usize, usize, f32) {
    let pos = ((i as f32 + 0.5) * src as f32 / dst as f32 - 0.5).clamp(0.0, (src - 1) as f32);
    let i0 = pos.floor() as usize;
    let i1 = (i0 + 1).min(src as usize - 1);
    (i0, i1, pos - i0 as f32)
}

impl Image {
    /// Resamples the image to `width` x `height` with bilinear filtering.
    /// Layers are resampled independently, the format is preserved.
    pub fn resize(&self, width: u32, height: u32) -> Result<Image> {
        let desc = *self.desc();
        if width == 0 || height == 0 || desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidDimensions(format!(
                "cannot resize {} to {}x{}",
                desc, width, height
            )));
        }
        if width == desc.width && height == desc.height {
            return Ok(self.clone());
        }

        let format = desc.color_format;
        match (format.channel_size, format.channel_type) {
            (ChannelSize::_8bit, ChannelType::UInt) => self.resize_typed::<u8>(width, height),
            (ChannelSize::_16bit, ChannelType::UInt) => self.resize_typed::<u16>(width, height),
            (ChannelSize::_32bit, ChannelType::Float) => self.resize_typed::<f32>(width, height),
            _ => Err(Error::UnsupportedFormat(format!("resize of {}", format))),
        }
    }

    fn resize_typed<T: Component>(&self, width: u32, height: u32) -> Result<Image> {
        let src_desc = *self.desc();
        let mut result = Image::new_empty(src_desc.resized(width, height))?;

        let size = std::mem::size_of::<T>();
        let channels = src_desc.color_format.channel_count.channel_count() as usize;
        let bpp = channels * size;

        let columns: Vec<_> = (0..width)
            .map(|x| sample_coord(x, src_desc.width, width))
            .collect();

        for layer in 0..src_desc.depth {
            for y in 0..height {
                let (y0, y1, fy) = sample_coord(y, src_desc.height, height);
                let top = self.row(y0 as u32, layer);
                let bottom = self.row(y1 as u32, layer);
                let out = result.row_mut(y, layer);

                for (x, &(x0, x1, fx)) in columns.iter().enumerate() {
                    for c in 0..channels {
                        let at = |row: &[u8], px: usize| {
                            let offset = px * bpp + c * size;
                            read::<T>(&row[offset..offset + size])
                        };

                        let upper = at(top, x0) * (1.0 - fx) + at(top, x1) * fx;
                        let lower = at(bottom, x0) * (1.0 - fx) + at(bottom, x1) * fx;
                        let value = upper * (1.0 - fy) + lower * fy;

                        let offset = x * bpp + c * size;
                        write::<T>(value, &mut out[offset..offset + size]);
                    }
                }
            }
        }

        Ok(result)
    }
}
