use crate::color_format::{ChannelCount, ChannelType, ColorFormat};
use crate::error::{Error, Result};
use crate::image::{Image, ImageDesc};

fn expand(src: &[u8], from: ChannelCount, to: ChannelCount, dst: &mut [u8]) {
    let (r, g, b, a) = match from {
        ChannelCount::L => (src[0], src[0], src[0], u8::MAX),
        ChannelCount::LA => (src[0], src[0], src[0], src[1]),
        ChannelCount::Rgb => (src[0], src[1], src[2], u8::MAX),
        ChannelCount::Rgba => (src[0], src[1], src[2], src[3]),
    };

    match to {
        ChannelCount::L => dst[0] = luma(r, g, b),
        ChannelCount::LA => {
            dst[0] = luma(r, g, b);
            dst[1] = a;
        }
        ChannelCount::Rgb => dst.copy_from_slice(&[r, g, b]),
        ChannelCount::Rgba => dst.copy_from_slice(&[r, g, b, a]),
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8
}

impl Image {
    /// Changes the channel layout of an 8-bit image. Alpha is dropped or set
    /// opaque; gray is replicated or computed as Rec. 601 luma.
    pub fn convert_channels(&self, channel_count: ChannelCount) -> Result<Image> {
        let desc = *self.desc();
        let from = desc.color_format;
        if from.channel_size.byte_count() != 1 || from.channel_type != ChannelType::UInt {
            return Err(Error::UnsupportedFormat(format!(
                "channel conversion supports 8-bit integer images only, got {from}"
            )));
        }
        if from.channel_count == channel_count {
            return Ok(self.clone());
        }

        let to = ColorFormat::new(channel_count, from.channel_size, from.channel_type);
        let out_desc = ImageDesc::new(desc.width, desc.height, to).with_depth(desc.depth);
        let mut result = Image::new_empty(out_desc)?;

        let src_bpp = from.byte_count() as usize;
        let dst_bpp = to.byte_count() as usize;
        for layer in 0..desc.depth {
            for y in 0..desc.height {
                let src_row = self.row(y, layer);
                let dst_row = result.row_mut(y, layer);
                for (src, dst) in src_row
                    .chunks_exact(src_bpp)
                    .zip(dst_row.chunks_exact_mut(dst_bpp))
                {
                    expand(src, from.channel_count, channel_count, dst);
                }
            }
        }

        Ok(result)
    }
}
