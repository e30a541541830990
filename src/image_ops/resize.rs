use crate::errors::{ResizeError, ResizeInputError};
use fast_image_resize::Resizer;
use image::DynamicImage;
use rayon::prelude::*;
use std::borrow::Borrow;
use std::str::FromStr;

pub const ORIGINAL_SIZE_PERCENT: u32 = 100;
pub const HALF_SIZE_PERCENT: u32 = 50;

/// Resize choice made by the user
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum ResizeRequest {
    OriginalSize,
    FixedPercent(u32),
    /// Percent is sent later as a text reply
    CustomPercent,
    /// Target size is sent later as a `<width>x<height>` text reply
    CustomWidthHeight,
}

/// Accepted bounds for a custom percent reply, both inclusive
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct PercentRange {
    pub min: u32,
    pub max: u32,
}

impl PercentRange {
    pub fn contains(&self, percent: i64) -> bool {
        percent >= self.min as i64 && percent <= self.max as i64
    }
}

impl Default for PercentRange {
    fn default() -> Self {
        PercentRange { min: 1, max: 200 }
    }
}

/// Largest target a `<width>x<height>` reply may ask for
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct SizeLimit {
    pub width: u32,
    pub height: u32,
}

impl SizeLimit {
    pub fn is_allowed_size(&self, width: u32, height: u32) -> bool {
        width <= self.width && height <= self.height
    }
}

impl Default for SizeLimit {
    fn default() -> Self {
        SizeLimit {
            width: 10_000,
            height: 10_000,
        }
    }
}

#[derive(Debug)]
pub struct ParseSizeError {
    #[allow(dead_code)]
    msg: String,
}

impl FromStr for SizeLimit {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let elems: Vec<&str> = s.split(',').map(str::trim).collect();
        if elems.len() != 2 {
            return Err(ParseSizeError {
                msg: format!("Expected size \"width, height\", got {}", s),
            });
        }
        let sizes: Vec<u32> = elems
            .iter()
            .map_while(|el| el.parse::<u32>().ok())
            .filter(|size| *size > 0)
            .collect();

        match sizes.as_slice() {
            [width, height] => Ok(SizeLimit {
                width: *width,
                height: *height,
            }),
            _ => Err(ParseSizeError {
                msg: format!("Expected positive \"width, height\", got {}", s),
            }),
        }
    }
}

/// Resolved rule mapping a source size onto the size it is resized to
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum ResizePlan {
    /// Scale both sides by `percent / 100`, truncating fractional pixels
    Percent(u32),
    /// Every image gets exactly this size, source ratio is not kept
    Exact { width: u32, height: u32 },
}

impl ResizePlan {
    pub fn target(&self, width: u32, height: u32) -> (u32, u32) {
        match *self {
            ResizePlan::Percent(percent) => (scale(width, percent), scale(height, percent)),
            ResizePlan::Exact { width, height } => (width, height),
        }
    }

    /// Scale factor of a percent plan, `None` for exact sizes
    pub fn factor(&self) -> Option<f64> {
        match self {
            ResizePlan::Percent(percent) => Some(*percent as f64 / 100.0),
            ResizePlan::Exact { .. } => None,
        }
    }
}

/// A side that would truncate to zero keeps a single pixel
fn scale(side: u32, percent: u32) -> u32 {
    let scaled = side as u64 * percent as u64 / 100;
    scaled.clamp(1, u32::MAX as u64) as u32
}

pub fn resolve_fixed(percent: u32) -> ResizePlan {
    ResizePlan::Percent(percent)
}

/// Parse a custom percent reply, e.g. `"150"`
pub fn parse_percent_input(text: &str, range: PercentRange) -> Result<ResizePlan, ResizeInputError> {
    let invalid = || ResizeInputError::InvalidPercent {
        input: text.to_string(),
        min: range.min,
        max: range.max,
    };
    let percent = text.trim().parse::<i64>().map_err(|_| invalid())?;
    if !range.contains(percent) {
        return Err(invalid());
    }
    Ok(resolve_fixed(percent as u32))
}

/// Parse a custom size reply, e.g. `"800x600"` or `"800 X 600"`
pub fn parse_width_height_input(
    text: &str,
    limit: SizeLimit,
) -> Result<ResizePlan, ResizeInputError> {
    let invalid = || ResizeInputError::InvalidDimensions {
        input: text.to_string(),
    };
    let normalized = text.to_lowercase().replace('x', " ");
    let sides: Vec<i64> = normalized
        .split_whitespace()
        .map(|token| token.parse::<i64>())
        .collect::<Result<_, _>>()
        .map_err(|_| invalid())?;

    let [width, height] = sides.as_slice() else {
        return Err(invalid());
    };
    if *width <= 0 || *height <= 0 {
        return Err(invalid());
    }
    let (width, height) = match (u32::try_from(*width), u32::try_from(*height)) {
        (Ok(width), Ok(height)) if limit.is_allowed_size(width, height) => (width, height),
        _ => {
            return Err(ResizeInputError::DimensionsTooLarge {
                input: text.to_string(),
                max_width: limit.width,
                max_height: limit.height,
            });
        }
    };
    Ok(ResizePlan::Exact { width, height })
}

/// Produce a resized copy of `img` according to `plan`
pub fn resize(img: &DynamicImage, plan: ResizePlan) -> Result<DynamicImage, ResizeError> {
    let (w, h) = plan.target(img.width(), img.height());
    if (w, h) == (img.width(), img.height()) {
        return Ok(img.clone());
    }

    let mut resizer = Resizer::new();
    let mut dst_img = DynamicImage::new(w, h, img.color());
    resizer
        .resize(img, &mut dst_img, None)
        .map_err(|err| ResizeError::Resample {
            from_width: img.width(),
            from_height: img.height(),
            width: w,
            height: h,
            detail: err.to_string(),
        })?;
    Ok(dst_img)
}

/// Fails with the first page whose target size is over `limit`
pub fn ensure_within_limit<I: Borrow<DynamicImage>>(
    images: &[I],
    plan: ResizePlan,
    limit: SizeLimit,
) -> Result<(), ResizeError> {
    for img in images {
        let img = img.borrow();
        let (width, height) = plan.target(img.width(), img.height());
        if !limit.is_allowed_size(width, height) {
            return Err(ResizeError::TargetTooLarge {
                width,
                height,
                max_width: limit.width,
                max_height: limit.height,
            });
        }
    }
    Ok(())
}

/// Resize a whole pending set, keeping its order.
///
/// Target sizes are checked against `limit` before anything is allocated.
pub fn resize_all<I: Borrow<DynamicImage> + Sync>(
    images: &[I],
    plan: ResizePlan,
    limit: SizeLimit,
) -> Result<Vec<DynamicImage>, ResizeError> {
    ensure_within_limit(images, plan, limit)?;
    images
        .par_iter()
        .map(|img| resize(img.borrow(), plan))
        .collect()
}
