pub mod decode;
pub mod document;
pub mod image_types;
pub mod resize;
