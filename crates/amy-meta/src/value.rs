//! Typed views over textual attribute values.
//!
//! Attribute values are stored as strings on the document model; these
//! helpers parse and format the structured kinds (pairs, colors, reals)
//! with the exact textual conventions the on-disk files use.

use serde::{Deserialize, Serialize};

/// A pair of reals, used by the Xy, Size and Scale kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xy {
    pub x: f64,
    pub y: f64,
}

impl Xy {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Parse `"x,y"` with optional whitespace around the comma.
    pub fn parse(text: &str) -> Option<Self> {
        let (x, y) = text.split_once(',')?;
        Some(Self {
            x: parse_real(x)?,
            y: parse_real(y)?,
        })
    }

    /// Format as `"x,y"`.
    pub fn format(&self) -> String {
        format!("{},{}", format_real(self.x), format_real(self.y))
    }
}

/// An opaque RGB color, components in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `"r,g,b"`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(',').map(|p| p.trim().parse::<u8>().ok());
        let rgb = Self {
            r: parts.next()??,
            g: parts.next()??,
            b: parts.next()??,
        };
        // Exactly three components
        if parts.next().is_some() {
            return None;
        }
        Some(rgb)
    }

    pub fn format(&self) -> String {
        format!("{},{},{}", self.r, self.g, self.b)
    }
}

/// An RGB color with alpha, components in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argb {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Argb {
    /// Parse `"a,r,g,b"`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(',').map(|p| p.trim().parse::<u8>().ok());
        let argb = Self {
            a: parts.next()??,
            r: parts.next()??,
            g: parts.next()??,
            b: parts.next()??,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(argb)
    }

    pub fn format(&self) -> String {
        format!("{},{},{},{}", self.a, self.r, self.g, self.b)
    }
}

/// Parse a real number, rejecting NaN and infinities.
///
/// The on-disk format never contains non-finite values; treating them as
/// parse failures keeps range checks total.
pub fn parse_real(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Format a real the way the editor writes it: integral values lose the
/// fractional part (`3` rather than `3.0`).
pub fn format_real(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
