use crate::error::{Error, Result};
use crate::image::Image;

/// Axis-aligned rectangle in continuous coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Integer pixel window inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct Cropped {
    pub image: Image,
    pub window: CropWindow,
    /// Area actually covered by `window`, in the coordinates of the source rect.
    pub dst: Rect,
}

impl Rect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

impl CropWindow {
    /// Maps `dst`, expressed in the coordinate frame where the whole image
    /// spans `src`, onto a pixel window of a `width` x `height` image.
    ///
    /// The origin is clamped to `[0, dim-1]`, the extent to `[0, dim]`, and the
    /// extent is then shrunk so the window stays inside the image.
    pub fn compute(width: u32, height: u32, src: &Rect, dst: &Rect) -> CropWindow {
        if width == 0 || height == 0 {
            return CropWindow::default();
        }

        let s = width as i64;
        let t = height as i64;

        let x = (((dst.min_x - src.min_x) / src.width() * s as f64).floor() as i64).clamp(0, s - 1);
        let y = (((dst.min_y - src.min_y) / src.height() * t as f64).floor() as i64).clamp(0, t - 1);
        let mut w = ((((dst.max_x - src.min_x) / src.width() * s as f64).ceil() as i64) - x).clamp(0, s);
        let mut h = ((((dst.max_y - src.min_y) / src.height() * t as f64).ceil() as i64) - y).clamp(0, t);

        if x + w > s {
            w = s - x;
        }
        if y + h > t {
            h = t - y;
        }

        CropWindow {
            x: x as u32,
            y: y as u32,
            width: w as u32,
            height: h as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The area this window covers, mapped back into `src` coordinates
    /// of a `width` x `height` image.
    pub fn realized(&self, width: u32, height: u32, src: &Rect) -> Rect {
        let res_s = src.width() / width as f64;
        let res_t = src.height() / height as f64;

        let min_x = src.min_x + self.x as f64 * res_s;
        let min_y = src.min_y + self.y as f64 * res_t;

        Rect {
            min_x,
            min_y,
            max_x: min_x + self.width as f64 * res_s,
            max_y: min_y + self.height as f64 * res_t,
        }
    }
}

impl Image {
    /// Cuts out the part of the image that `dst` covers when the whole image
    /// spans `src`.
    ///
    /// Every depth layer is copied row by row into a freshly allocated image
    /// of the same format. The returned `dst` is recomputed from the integer
    /// window, so it reflects what was actually copied.
    pub fn crop(&self, src: &Rect, dst: &Rect) -> Result<Cropped> {
        let desc = *self.desc();
        let window = CropWindow::compute(desc.width, desc.height, src, dst);
        if window.is_empty() {
            return Err(Error::EmptyCropWindow);
        }

        let realized = window.realized(desc.width, desc.height, src);

        let mut cropped = Image::new_empty(desc.resized(window.width, window.height))?;
        let bpp = self.bytes_per_pixel() as usize;
        let start = window.x as usize * bpp;
        let end = start + window.width as usize * bpp;

        for layer in 0..desc.depth {
            for dst_row in 0..window.height {
                let src_row = window.y + dst_row;
                cropped
                    .row_mut(dst_row, layer)
                    .copy_from_slice(&self.row(src_row, layer)[start..end]);
            }
        }

        Ok(Cropped {
            image: cropped,
            window,
            dst: realized,
        })
    }
}
