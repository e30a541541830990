use crate::errors::DecodeError;
use crate::image_ops::image_types::IntoImageFormat;
use image::{DynamicImage, ImageFormat};
use log::debug;

/// Determine image format, from supporting by decoding lib
pub fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    imghdr::from_bytes(data).and_then(|img_type| img_type.image_format())
}

/// Decode uploaded bytes into an 8-bit RGB raster.
///
/// Alpha and palette data are flattened, so every page of a document is
/// embedded with the same color space.
pub fn decode(data: &[u8]) -> Result<DynamicImage, DecodeError> {
    let format = sniff_format(data).ok_or(DecodeError::UnsupportedFormat)?;
    debug!("decoding {} bytes as {:?}", data.len(), format);

    let img = image::load_from_memory_with_format(data, format)?;
    Ok(match img {
        DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    })
}
