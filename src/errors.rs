use thiserror::Error;

/// Generic reply for failures the user can't fix by changing their input
pub const INTERNAL_FAILURE_MESSAGE: &str = "⚠️ Conversion failed. Please try /convert again.";

/// Rejected custom resize reply
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ResizeInputError {
    #[error("percent must be an integer in {min}..={max}, got {input:?}")]
    InvalidPercent { input: String, min: u32, max: u32 },
    #[error("expected <width>x<height> with positive integers, got {input:?}")]
    InvalidDimensions { input: String },
    #[error("requested size {input:?} exceeds {max_width}x{max_height}")]
    DimensionsTooLarge {
        input: String,
        max_width: u32,
        max_height: u32,
    },
}

impl ResizeInputError {
    pub fn user_message(&self) -> String {
        match self {
            ResizeInputError::InvalidPercent { min, max, .. } => {
                format!("❗ Please send a valid number ({}–{}).", min, max)
            }
            ResizeInputError::InvalidDimensions { .. } => {
                "❗ Format error. Please send like `800x600`".to_string()
            }
            ResizeInputError::DimensionsTooLarge {
                max_width,
                max_height,
                ..
            } => format!(
                "❗ Size is too large. Maximum is {}x{}.",
                max_width, max_height
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("resampling {from_width}x{from_height} -> {width}x{height} failed: {detail}")]
    Resample {
        from_width: u32,
        from_height: u32,
        width: u32,
        height: u32,
        detail: String,
    },
    /// A page would exceed the configured maximum size
    #[error("target {width}x{height} exceeds {max_width}x{max_height}")]
    TargetTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("uploaded bytes are not an image in a supported format")]
    UnsupportedFormat,
    #[error("image is corrupted: {0}")]
    Corrupted(#[from] image::ImageError),
}

impl DecodeError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DecodeError::UnsupportedFormat => {
                "❌ Unsupported file. Please send a JPEG, PNG, GIF, BMP, TIFF or WebP image."
            }
            DecodeError::Corrupted(_) => "❌ Could not read this image. Please send it again.",
        }
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Assembling was requested for zero pages
    #[error("no images to assemble")]
    EmptyInput,
    #[error("failed to encode page: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to compress page: {0}")]
    Compress(#[from] std::io::Error),
    #[error("failed to write document: {0}")]
    Pdf(#[from] lopdf::Error),
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("user has no pending images")]
    EmptyCollection,
    #[error(transparent)]
    Resize(#[from] ResizeError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("conversion worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ConversionError {
    pub fn user_message(&self) -> String {
        match self {
            ConversionError::EmptyCollection => {
                "❌ No images found. Please send some images first.".to_string()
            }
            ConversionError::Resize(ResizeError::TargetTooLarge {
                max_width,
                max_height,
                ..
            }) => format!(
                "❗ Size is too large. Maximum is {}x{}.",
                max_width, max_height
            ),
            _ => INTERNAL_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Failures caused by broken internal invariants rather than user actions
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            ConversionError::EmptyCollection
                | ConversionError::Resize(ResizeError::TargetTooLarge { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_message_mentions_configured_range() {
        let err = ResizeInputError::InvalidPercent {
            input: "300".into(),
            min: 1,
            max: 200,
        };
        assert_eq!(err.user_message(), "❗ Please send a valid number (1–200).");
    }

    #[test]
    fn internal_failures_share_one_reply() {
        let err = ConversionError::Document(DocumentError::EmptyInput);
        assert!(err.is_internal());
        assert_eq!(err.user_message(), INTERNAL_FAILURE_MESSAGE);
        assert!(!ConversionError::EmptyCollection.is_internal());
    }

    #[test]
    fn oversized_targets_are_reported_to_the_user() {
        let err = ConversionError::Resize(ResizeError::TargetTooLarge {
            width: 180,
            height: 180,
            max_width: 100,
            max_height: 100,
        });
        assert!(!err.is_internal());
        assert_eq!(err.user_message(), "❗ Size is too large. Maximum is 100x100.");
    }
}
