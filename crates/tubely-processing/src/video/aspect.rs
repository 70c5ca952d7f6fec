//! Aspect-ratio classification.
//!
//! The observed `width / height` is compared against an ordered table of target ratios and
//! the first target within [`TOLERANCE`] wins. Table order is the tie-break.

use std::fmt;
use thiserror::Error;

/// Maximum absolute difference between observed and target ratio.
pub const TOLERANCE: f64 = 0.05;

/// Named targets in evaluation order.
pub const TARGET_RATIOS: [(AspectLabel, f64); 2] = [
    (AspectLabel::Landscape16x9, 16.0 / 9.0),
    (AspectLabel::Portrait9x16, 9.0 / 16.0),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AspectError {
    #[error("Cannot classify {width}x{height}: dimensions must be positive")]
    UnknownAspect { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AspectLabel {
    Landscape16x9,
    Portrait9x16,
    Other,
}

impl AspectLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectLabel::Landscape16x9 => "16:9",
            AspectLabel::Portrait9x16 => "9:16",
            AspectLabel::Other => "other",
        }
    }
}

impl fmt::Display for AspectLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse orientation used as the first key segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AspectLabel> for Orientation {
    fn from(label: AspectLabel) -> Self {
        orientation_of(label)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Reduce `width:height` to lowest terms. Both must be positive.
pub fn reduced_ratio(width: u32, height: u32) -> (u32, u32) {
    let divisor = gcd(width, height);
    (width / divisor, height / divisor)
}

/// Bucket a frame size into one of the target ratios or [`AspectLabel::Other`].
pub fn classify(width: u32, height: u32) -> Result<AspectLabel, AspectError> {
    if width == 0 || height == 0 {
        return Err(AspectError::UnknownAspect { width, height });
    }

    let (rw, rh) = reduced_ratio(width, height);
    let observed = f64::from(width) / f64::from(height);

    let label = TARGET_RATIOS
        .iter()
        .find(|(_, target)| (observed - target).abs() < TOLERANCE)
        .map(|(label, _)| *label)
        .unwrap_or(AspectLabel::Other);

    tracing::debug!(
        width,
        height,
        reduced = %format!("{}:{}", rw, rh),
        ratio = observed,
        label = %label,
        "Classified aspect ratio"
    );

    Ok(label)
}

pub fn orientation_of(label: AspectLabel) -> Orientation {
    match label {
        AspectLabel::Landscape16x9 => Orientation::Landscape,
        AspectLabel::Portrait9x16 => Orientation::Portrait,
        AspectLabel::Other => Orientation::Other,
    }
}
