use image::ImageFormat;
use strum::EnumString;

/// Mapping of a sniffed file type onto a format the decoding lib understands
pub trait IntoImageFormat {
    fn image_format(&self) -> Option<ImageFormat>;
}

impl IntoImageFormat for imghdr::Type {
    fn image_format(&self) -> Option<ImageFormat> {
        match &self {
            imghdr::Type::Gif => Some(ImageFormat::Gif),
            imghdr::Type::Tiff => Some(ImageFormat::Tiff),
            imghdr::Type::Jpeg => Some(ImageFormat::Jpeg),
            imghdr::Type::Bmp => Some(ImageFormat::Bmp),
            imghdr::Type::Png => Some(ImageFormat::Png),
            imghdr::Type::Webp => Some(ImageFormat::WebP),
            _ => None,
        }
    }
}

/// How raster pages are embedded into the resulting document
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, EnumString, strum::Display)]
pub enum PageEncoding {
    /// DCTDecode stream, lossy but small
    Jpeg,
    /// zlib-compressed raw RGB samples, lossless
    Flate,
}

impl PageEncoding {
    /// Name of the PDF stream filter for this encoding
    pub fn filter_name(&self) -> &'static str {
        match self {
            PageEncoding::Jpeg => "DCTDecode",
            PageEncoding::Flate => "FlateDecode",
        }
    }
}

impl Default for PageEncoding {
    fn default() -> Self {
        PageEncoding::Jpeg
    }
}
