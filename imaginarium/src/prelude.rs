// Color formats
pub use crate::color_format::{ChannelCount, ChannelSize, ChannelType, ColorFormat, ALL_FORMATS};

// Error handling
pub use crate::error::{Error, Result};

// Image types
pub use crate::image::{Image, ImageDesc, SUPPORTED_EXTENSIONS};

// Operations
pub use crate::ops::{CropWindow, Cropped, Rect};
