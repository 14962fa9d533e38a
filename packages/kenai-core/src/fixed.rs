//! 32 bit fixed point number with 8 bits of fractional precision.

#![allow(clippy::cast_precision_loss)]

/// A fixed point number with 8 bits of fractional precision, as carried by
/// coordinate arguments of pointer and drag events.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Fixed(i32);

impl Fixed {
    /// Reinterprets a raw wire value.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw wire value.
    #[must_use]
    pub const fn into_raw(self) -> i32 {
        self.0
    }

    /// Returns the absolute value.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }
}

impl std::fmt::Display for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", f64::from(*self))
    }
}

impl From<i32> for Fixed {
    fn from(value: i32) -> Self {
        Self(value << 8)
    }
}

impl From<f64> for Fixed {
    fn from(value: f64) -> Self {
        Self((value * 256.0).round() as i32)
    }
}

impl From<Fixed> for f64 {
    fn from(value: Fixed) -> Self {
        Self::from(value.0) / 256.0
    }
}

impl From<Fixed> for f32 {
    fn from(value: Fixed) -> Self {
        value.0 as Self / 256.0
    }
}

impl From<Fixed> for i32 {
    fn from(value: Fixed) -> Self {
        value.0 / 256
    }
}
