use std::path::Path;

use ::image as image_lib;

use super::{Image, ImageDesc};
use crate::color_format::{ChannelCount, ChannelSize, ChannelType, ColorFormat};
use crate::error::{Error, Result};

pub(crate) fn load_png_jpeg<P: AsRef<Path>>(filename: P) -> Result<Image> {
    let path = filename.as_ref();
    let img = image_lib::open(path)?;

    let (channel_count, channel_size, channel_type) = match img.color() {
        image_lib::ColorType::L8 => (ChannelCount::L, ChannelSize::_8bit, ChannelType::UInt),
        image_lib::ColorType::L16 => (ChannelCount::L, ChannelSize::_16bit, ChannelType::UInt),
        image_lib::ColorType::La8 => (ChannelCount::LA, ChannelSize::_8bit, ChannelType::UInt),
        image_lib::ColorType::La16 => (ChannelCount::LA, ChannelSize::_16bit, ChannelType::UInt),
        image_lib::ColorType::Rgb8 => (ChannelCount::Rgb, ChannelSize::_8bit, ChannelType::UInt),
        image_lib::ColorType::Rgb16 => (ChannelCount::Rgb, ChannelSize::_16bit, ChannelType::UInt),
        image_lib::ColorType::Rgba8 => (ChannelCount::Rgba, ChannelSize::_8bit, ChannelType::UInt),
        image_lib::ColorType::Rgba16 => {
            (ChannelCount::Rgba, ChannelSize::_16bit, ChannelType::UInt)
        }
        image_lib::ColorType::Rgb32F => {
            (ChannelCount::Rgb, ChannelSize::_32bit, ChannelType::Float)
        }
        image_lib::ColorType::Rgba32F => {
            (ChannelCount::Rgba, ChannelSize::_32bit, ChannelType::Float)
        }
        _ => return Err(Error::UnsupportedColorType(format!("{:?}", img.color()))),
    };

    let color_format = ColorFormat::new(channel_count, channel_size, channel_type);
    let desc = ImageDesc::new_packed(img.width(), img.height(), color_format);
    log::debug!("Decoded {} from {}", desc, path.display());

    Image::new_with_data(desc, img.into_bytes())
}

fn encoder_color_type(image: &Image, format_name: &str) -> Result<image_lib::ColorType> {
    let color_format = image.desc().color_format;

    if color_format.channel_type != ChannelType::UInt {
        return Err(Error::UnsupportedFormat(format!(
            "{} channel type: {:?}",
            format_name, color_format.channel_type
        )));
    }

    let color_type = match (color_format.channel_size, color_format.channel_count) {
        (ChannelSize::_8bit, ChannelCount::L) => image_lib::ColorType::L8,
        (ChannelSize::_8bit, ChannelCount::LA) => image_lib::ColorType::La8,
        (ChannelSize::_8bit, ChannelCount::Rgb) => image_lib::ColorType::Rgb8,
        (ChannelSize::_8bit, ChannelCount::Rgba) => image_lib::ColorType::Rgba8,
        (ChannelSize::_16bit, ChannelCount::L) => image_lib::ColorType::L16,
        (ChannelSize::_16bit, ChannelCount::LA) => image_lib::ColorType::La16,
        (ChannelSize::_16bit, ChannelCount::Rgb) => image_lib::ColorType::Rgb16,
        (ChannelSize::_16bit, ChannelCount::Rgba) => image_lib::ColorType::Rgba16,

        _ => {
            return Err(Error::UnsupportedFormat(format!(
                "{} color format: {}",
                format_name, color_format
            )));
        }
    };

    Ok(color_type)
}

pub(crate) fn save_jpg<P: AsRef<Path>>(image: &Image, filename: P) -> Result<()> {
    debug_assert!(
        image.desc().is_packed(),
        "Image must be packed before saving"
    );

    let color_type = encoder_color_type(image, "JPEG")?;
    if !matches!(
        color_type,
        image_lib::ColorType::L8 | image_lib::ColorType::Rgb8
    ) {
        return Err(Error::UnsupportedFormat(format!(
            "JPEG color format: {}",
            image.desc().color_format
        )));
    }

    image_lib::save_buffer_with_format(
        filename,
        image.bytes(),
        image.desc().width,
        image.desc().height,
        color_type,
        image_lib::ImageFormat::Jpeg,
    )?;

    Ok(())
}

pub(crate) fn save_png<P: AsRef<Path>>(image: &Image, filename: P) -> Result<()> {
    debug_assert!(
        image.desc().is_packed(),
        "Image must be packed before saving"
    );

    let color_type = encoder_color_type(image, "PNG")?;

    image_lib::save_buffer_with_format(
        filename,
        image.bytes(),
        image.desc().width,
        image.desc().height,
        color_type,
        image_lib::ImageFormat::Png,
    )?;

    Ok(())
}
