//! # Color Banding
//!
//! The contract between quantized tiles and whatever draws them: an
//! ordered list of `(lower_bound, color)` pairs. A value takes the color of
//! the last band whose lower bound it reaches.
//!
//! Nothing in generation depends on this module; renderers pick a banding
//! (or ignore it and read the raw `0..=255` values).

use serde::{Deserialize, Serialize};

use crate::error::{ProceduralError, ProceduralResult};

/// An sRGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Black.
    pub const BLACK: Self = Self([0, 0, 0]);
    /// White.
    pub const WHITE: Self = Self([255, 255, 255]);

    /// A neutral gray of the given level.
    #[inline]
    #[must_use]
    pub const fn gray(level: u8) -> Self {
        Self([level, level, level])
    }
}

/// One band: values at or above `lower_bound` (up to the next band) get `color`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorBand {
    /// Smallest value in the band.
    pub lower_bound: u8,
    /// Color for the band.
    pub color: Rgb,
}

impl ColorBand {
    /// Creates a band.
    #[inline]
    #[must_use]
    pub const fn new(lower_bound: u8, color: Rgb) -> Self {
        Self { lower_bound, color }
    }
}

/// Ordered value-to-color mapping covering all of `0..=255`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorBanding {
    bands: Vec<ColorBand>,
}

impl ColorBanding {
    /// Threshold of the binary preset.
    pub const DEFAULT_THRESHOLD: u8 = 45;

    /// Creates a banding from bands sorted by `lower_bound`.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidParameter`] if `bands` is empty,
    /// does not start at 0, or is not strictly increasing.
    pub fn new(bands: Vec<ColorBand>) -> ProceduralResult<Self> {
        match bands.first() {
            None => return Err(ProceduralError::invalid("palette", "needs at least one band")),
            Some(first) if first.lower_bound != 0 => {
                return Err(ProceduralError::invalid(
                    "palette",
                    format!("first band must start at 0, starts at {}", first.lower_bound),
                ));
            }
            Some(_) => {}
        }
        if let Some(pair) = bands.windows(2).find(|w| w[0].lower_bound >= w[1].lower_bound) {
            return Err(ProceduralError::invalid(
                "palette",
                format!(
                    "bounds must strictly increase ({} then {})",
                    pair[0].lower_bound, pair[1].lower_bound
                ),
            ));
        }
        Ok(Self { bands })
    }

    /// Five-step gray ramp over the lowlands, black above 45.
    #[must_use]
    pub fn terrain() -> Self {
        Self {
            bands: vec![
                ColorBand::new(0, Rgb::gray(90)),
                ColorBand::new(25, Rgb::gray(120)),
                ColorBand::new(30, Rgb::gray(190)),
                ColorBand::new(35, Rgb::gray(220)),
                ColorBand::new(40, Rgb::WHITE),
                ColorBand::new(45, Rgb::BLACK),
            ],
        }
    }

    /// White below `threshold`, black at or above it.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidParameter`] if `threshold` is 0
    /// (there would be no white band).
    pub fn binary(threshold: u8) -> ProceduralResult<Self> {
        Self::new(vec![
            ColorBand::new(0, Rgb::WHITE),
            ColorBand::new(threshold, Rgb::BLACK),
        ])
    }

    /// The bands, in order.
    #[inline]
    #[must_use]
    pub fn bands(&self) -> &[ColorBand] {
        &self.bands
    }

    /// Color for a quantized value.
    #[must_use]
    pub fn color_for(&self, value: u8) -> Rgb {
        // First band starts at 0, so the partition point is at least 1
        let index = self.bands.partition_point(|band| band.lower_bound <= value);
        self.bands[index - 1].color
    }
}

impl Default for ColorBanding {
    fn default() -> Self {
        Self::terrain()
    }
}
