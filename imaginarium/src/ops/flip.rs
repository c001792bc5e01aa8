use crate::image::Image;

impl Image {
    /// Mirrors every row left to right, in place.
    pub fn flip_horizontal(&mut self) {
        let desc = *self.desc();
        let bpp = self.bytes_per_pixel() as usize;
        let width = desc.width as usize;

        for layer in 0..desc.depth {
            for y in 0..desc.height {
                let row = self.row_mut(y, layer);
                for x in 0..width / 2 {
                    let (left, right) = row.split_at_mut((width - 1 - x) * bpp);
                    left[x * bpp..(x + 1) * bpp].swap_with_slice(&mut right[..bpp]);
                }
            }
        }
    }

    /// Mirrors every layer top to bottom, in place.
    pub fn flip_vertical(&mut self) {
        let desc = *self.desc();
        let row_bytes = desc.row_bytes();

        for layer in 0..desc.depth {
            for y in 0..desc.height / 2 {
                let top = desc.row_offset(y, layer);
                let bottom = desc.row_offset(desc.height - 1 - y, layer);
                let (head, tail) = self.bytes_mut().split_at_mut(bottom);
                head[top..top + row_bytes].swap_with_slice(&mut tail[..row_bytes]);
            }
        }
    }
}
