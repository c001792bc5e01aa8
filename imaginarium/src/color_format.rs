use crate::error::{Error, Result};

#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Default)]
#[repr(u8)]
pub enum ChannelCount {
    L = 1,
    LA = 2,
    Rgb = 3,
    #[default]
    Rgba = 4,
}

#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Default)]
#[repr(u8)]
pub enum ChannelSize {
    #[default]
    _8bit = 1,
    _16bit = 2,
    _32bit = 4,
}

#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Default)]
#[repr(u8)]
pub enum ChannelType {
    #[default]
    UInt,
    Float,
}

#[derive(Clone, Copy, Debug, Hash, Default, PartialEq, Eq)]
pub struct ColorFormat {
    pub channel_count: ChannelCount,
    pub channel_size: ChannelSize,
    pub channel_type: ChannelType,
}

impl ChannelCount {
    pub fn channel_count(&self) -> u8 {
        *self as u8
    }
    pub fn byte_count(&self, channel_size: ChannelSize) -> u8 {
        self.channel_count() * channel_size.byte_count()
    }
}

impl ChannelSize {
    pub fn byte_count(&self) -> u8 {
        *self as u8
    }
}

impl ColorFormat {
    pub const L_U8: ColorFormat = ColorFormat::new(ChannelCount::L, ChannelSize::_8bit, ChannelType::UInt);
    pub const LA_U8: ColorFormat = ColorFormat::new(ChannelCount::LA, ChannelSize::_8bit, ChannelType::UInt);
    pub const RGB_U8: ColorFormat = ColorFormat::new(ChannelCount::Rgb, ChannelSize::_8bit, ChannelType::UInt);
    pub const RGBA_U8: ColorFormat = ColorFormat::new(ChannelCount::Rgba, ChannelSize::_8bit, ChannelType::UInt);

    pub const L_U16: ColorFormat = ColorFormat::new(ChannelCount::L, ChannelSize::_16bit, ChannelType::UInt);
    pub const LA_U16: ColorFormat = ColorFormat::new(ChannelCount::LA, ChannelSize::_16bit, ChannelType::UInt);
    pub const RGB_U16: ColorFormat = ColorFormat::new(ChannelCount::Rgb, ChannelSize::_16bit, ChannelType::UInt);
    pub const RGBA_U16: ColorFormat = ColorFormat::new(ChannelCount::Rgba, ChannelSize::_16bit, ChannelType::UInt);

    pub const RGB_F32: ColorFormat = ColorFormat::new(ChannelCount::Rgb, ChannelSize::_32bit, ChannelType::Float);
    pub const RGBA_F32: ColorFormat = ColorFormat::new(ChannelCount::Rgba, ChannelSize::_32bit, ChannelType::Float);

    pub const fn new(
        channel_count: ChannelCount,
        channel_size: ChannelSize,
        channel_type: ChannelType,
    ) -> Self {
        Self {
            channel_count,
            channel_size,
            channel_type,
        }
    }

    /// Bytes per pixel.
    pub fn byte_count(&self) -> u8 {
        self.channel_count.byte_count(self.channel_size)
    }

    pub fn is_supported(&self) -> bool {
        ALL_FORMATS.contains(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.is_supported() {
            return Err(Error::InvalidColorFormat(format!(
                "unsupported color format: {:?}",
                self
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = match self.channel_count {
            ChannelCount::L => "L",
            ChannelCount::LA => "LA",
            ChannelCount::Rgb => "RGB",
            ChannelCount::Rgba => "RGBA",
        };
        let kind = match self.channel_type {
            ChannelType::UInt => "u",
            ChannelType::Float => "f",
        };
        write!(f, "{} {}{}", count, kind, self.channel_size.byte_count() * 8)
    }
}

/// All supported color formats.
pub const ALL_FORMATS: &[ColorFormat] = &[
    ColorFormat::L_U8,
    ColorFormat::LA_U8,
    ColorFormat::RGB_U8,
    ColorFormat::RGBA_U8,
    //
    ColorFormat::L_U16,
    ColorFormat::LA_U16,
    ColorFormat::RGB_U16,
    ColorFormat::RGBA_U16,
    //
    ColorFormat::RGB_F32,
    ColorFormat::RGBA_F32,
];
