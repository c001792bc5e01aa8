mod convert;
mod crop;
mod flip;
mod resize;

pub use crop::{CropWindow, Cropped, Rect};
