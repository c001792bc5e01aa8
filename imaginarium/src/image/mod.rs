mod io;
mod stride;


use std::path::Path;

use crate::color_format::ColorFormat;
use crate::error::{Error, Result};

use stride::{align_stride, strip_stride_padding};

/// Supported image file extensions for reading and writing.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Layout of an image buffer.
///
/// Rows are `stride` bytes apart. A buffer holds `depth` layers of
/// `height` rows each, stored one after another.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub stride: usize,
    pub color_format: ColorFormat,
}

#[derive(Clone, Debug)]
pub struct Image {
    desc: ImageDesc,
    bytes: Vec<u8>,
}

impl Image {
    /// Returns the image descriptor.
    pub fn desc(&self) -> &ImageDesc {
        &self.desc
    }

    /// Returns the image bytes as a slice.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the image bytes as a mutable slice.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn new_empty(desc: ImageDesc) -> Result<Image> {
        desc.validate()?;

        let bytes = vec![0; desc.size_in_bytes()];

        Ok(Image { desc, bytes })
    }

    pub fn new_with_data(desc: ImageDesc, bytes: Vec<u8>) -> Result<Image> {
        desc.validate()?;

        if bytes.len() != desc.size_in_bytes() {
            return Err(Error::InvalidColorFormat(format!(
                "bytes length {} does not match expected size {}",
                bytes.len(),
                desc.size_in_bytes()
            )));
        }

        Ok(Image { desc, bytes })
    }

    /// Creates an image with every pixel set to `pixel`, which must be
    /// exactly one pixel worth of bytes.
    pub fn new_filled(desc: ImageDesc, pixel: &[u8]) -> Result<Image> {
        if pixel.len() != desc.color_format.byte_count() as usize {
            return Err(Error::InvalidColorFormat(format!(
                "fill pixel has {} bytes, format {} needs {}",
                pixel.len(),
                desc.color_format,
                desc.color_format.byte_count()
            )));
        }

        let mut image = Image::new_empty(desc)?;
        for layer in 0..desc.depth {
            for y in 0..desc.height {
                image
                    .row_mut(y, layer)
                    .chunks_exact_mut(pixel.len())
                    .for_each(|px| px.copy_from_slice(pixel));
            }
        }

        Ok(image)
    }

    pub fn read_file<P: AsRef<Path>>(filename: P) -> Result<Image> {
        let extension = extension_of(filename.as_ref())?;

        let image = match extension.as_str() {
            "png" | "jpeg" | "jpg" => io::load_png_jpeg(filename)?,

            _ => return Err(Error::InvalidExtension(extension)),
        };

        Ok(image)
    }

    pub fn save_file<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        let extension = extension_of(filename.as_ref())?;

        if self.desc.depth != 1 {
            return Err(Error::UnsupportedFormat(format!(
                "cannot encode image with {} layers",
                self.desc.depth
            )));
        }

        // Encoders expect tightly packed rows
        let image = if self.desc.is_packed() {
            std::borrow::Cow::Borrowed(self)
        } else {
            std::borrow::Cow::Owned(self.clone().packed())
        };

        match extension.as_str() {
            "png" => io::save_png(&image, filename)?,
            "jpeg" | "jpg" => io::save_jpg(&image, filename)?,

            _ => return Err(Error::InvalidExtension(extension)),
        };

        Ok(())
    }

    pub fn bytes_per_pixel(&self) -> u8 {
        self.desc.color_format.byte_count()
    }

    /// Pixel bytes of row `y` in `layer`, without stride padding.
    pub fn row(&self, y: u32, layer: u32) -> &[u8] {
        let offset = self.desc.row_offset(y, layer);
        &self.bytes[offset..offset + self.desc.row_bytes()]
    }

    pub fn row_mut(&mut self, y: u32, layer: u32) -> &mut [u8] {
        let offset = self.desc.row_offset(y, layer);
        let row_bytes = self.desc.row_bytes();
        &mut self.bytes[offset..offset + row_bytes]
    }

    /// Bytes of the pixel at `(x, y)` in `layer`.
    pub fn pixel(&self, x: u32, y: u32, layer: u32) -> &[u8] {
        let bpp = self.bytes_per_pixel() as usize;
        let start = x as usize * bpp;
        &self.row(y, layer)[start..start + bpp]
    }

    /// Returns an image with tightly packed pixel data (stride equals row bytes).
    pub fn packed(self) -> Image {
        if self.desc.is_packed() {
            return self;
        }

        let bytes = strip_stride_padding(
            &self.bytes,
            self.desc.row_bytes(),
            (self.desc.height * self.desc.depth) as usize,
            self.desc.stride,
        );

        Image {
            desc: ImageDesc {
                stride: self.desc.row_bytes(),
                ..self.desc
            },
            bytes,
        }
    }
}

fn extension_of(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|os_str| os_str.to_str())
        .ok_or_else(|| Error::InvalidExtension("missing extension".to_string()))?
        .to_ascii_lowercase();

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::InvalidExtension(extension));
    }

    Ok(extension)
}

impl ImageDesc {
    /// Single-layer descriptor with 4-byte aligned stride.
    pub fn new(width: u32, height: u32, color_format: ColorFormat) -> Self {
        let stride = align_stride(width as usize * color_format.byte_count() as usize);

        Self {
            width,
            height,
            depth: 1,
            stride,
            color_format,
        }
    }

    /// Single-layer descriptor without row padding.
    pub fn new_packed(width: u32, height: u32, color_format: ColorFormat) -> Self {
        Self {
            width,
            height,
            depth: 1,
            stride: width as usize * color_format.byte_count() as usize,
            color_format,
        }
    }

    pub fn with_depth(self, depth: u32) -> Self {
        Self { depth, ..self }
    }

    /// Same layout rules and format, different extent.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        let desc = if self.is_packed() {
            ImageDesc::new_packed(width, height, self.color_format)
        } else {
            ImageDesc::new(width, height, self.color_format)
        };
        desc.with_depth(self.depth)
    }

    pub fn size_in_bytes(&self) -> usize {
        self.height as usize * self.depth as usize * self.stride
    }

    /// Returns the number of bytes per row without padding.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.color_format.byte_count() as usize
    }

    pub fn row_offset(&self, y: u32, layer: u32) -> usize {
        debug_assert!(y < self.height && layer < self.depth);
        (layer as usize * self.height as usize + y as usize) * self.stride
    }

    /// Returns true if stride equals row bytes (no padding).
    pub fn is_packed(&self) -> bool {
        self.stride == self.row_bytes()
    }

    pub fn validate(&self) -> Result<()> {
        self.color_format.validate()?;

        if self.stride < self.row_bytes() {
            return Err(Error::InvalidDimensions(format!(
                "stride {} is smaller than row size {}",
                self.stride,
                self.row_bytes()
            )));
        }
        if self.depth == 0 {
            return Err(Error::InvalidDimensions("image depth is zero".to_string()));
        }

        Ok(())
    }
}

impl std::fmt::Display for ImageDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        if self.depth != 1 {
            write!(f, "x{}", self.depth)?;
        }
        write!(f, " {}", self.color_format)
    }
}
