mod color_format;
mod error;
mod image;
mod ops;

pub mod prelude;

pub use prelude::*;
