//! Sixth-order finite-difference stencils on a uniform line of samples.
//!
//! Three zones are used along the differenced axis of length `N`:
//!
//! ```text
//! i = 0..2       forward    (-11 f[i] + 18 f[i+1] - 9 f[i+2] + 2 f[i+3]) / (6 h)
//! i = 3..N-4     centred    (-f[i-3] + 9 f[i-2] - 45 f[i-1] + 45 f[i+1] - 9 f[i+2] + f[i+3]) / (60 h)
//! i = N-3..N-1   backward   (-2 f[i-3] + 9 f[i-2] - 18 f[i-1] + 11 f[i]) / (6 h)
//! ```
//!
//! Each stencil reads up to three neighbours on one side, so the axis must
//! hold at least [`MIN_STENCIL_LEN`] samples for the zones not to overlap the
//! ends of the line.

use crate::core_types::Axis;
use crate::error::{FieldError, FieldResult};

/// Minimum axis length that supports the three-zone stencil
pub const MIN_STENCIL_LEN: usize = 7;

/// Stencil zone used at one position along an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stencil {
    /// One-sided, reads `i..=i+3`
    Forward,
    /// Symmetric, reads `i-3..=i+3` (skipping `i`)
    Centered,
    /// One-sided, reads `i-3..=i`
    Backward,
}

impl Stencil {
    /// Select the zone for position `i` on an axis of length `n`
    #[inline]
    #[must_use]
    pub fn select(i: usize, n: usize) -> Self {
        if i < 3 {
            Stencil::Forward
        } else if i + 3 >= n {
            Stencil::Backward
        } else {
            Stencil::Centered
        }
    }

    /// Weighted sum of samples for position `i`; `at(k)` returns sample `k`
    ///
    /// `self` must be `Stencil::select(i, n)` for the line being read.
    #[inline(always)]
    pub(crate) fn numerator<F>(self, i: usize, at: F) -> f32
    where
        F: Fn(usize) -> f32,
    {
        match self {
            Stencil::Forward => {
                -11.0 * at(i) + 18.0 * at(i + 1) - 9.0 * at(i + 2) + 2.0 * at(i + 3)
            }
            Stencil::Centered => {
                -at(i - 3) + 9.0 * at(i - 2) - 45.0 * at(i - 1) + 45.0 * at(i + 1)
                    - 9.0 * at(i + 2)
                    + at(i + 3)
            }
            Stencil::Backward => {
                -2.0 * at(i - 3) + 9.0 * at(i - 2) - 18.0 * at(i - 1) + 11.0 * at(i)
            }
        }
    }

    /// Zone-selected weighted sum at position `i` of a line of `n` samples
    ///
    /// Returns `None` when `i` is outside the line or the line is shorter than
    /// [`MIN_STENCIL_LEN`]. Divide by `denominator() * h` for the derivative.
    #[must_use]
    pub fn weighted_sum<F>(i: usize, n: usize, at: F) -> Option<(Self, f32)>
    where
        F: Fn(usize) -> f32,
    {
        if n < MIN_STENCIL_LEN || i >= n {
            return None;
        }
        let stencil = Self::select(i, n);
        Some((stencil, stencil.numerator(i, at)))
    }

    /// Constant that multiplies the spacing in the denominator
    #[inline]
    #[must_use]
    pub fn denominator(self) -> f32 {
        match self {
            Stencil::Centered => 60.0,
            Stencil::Forward | Stencil::Backward => 6.0,
        }
    }

    /// Sample offsets (relative to `i`) this zone reads with non-zero weight
    #[must_use]
    pub fn footprint(self) -> &'static [isize] {
        match self {
            Stencil::Forward => &[0, 1, 2, 3],
            Stencil::Centered => &[-3, -2, -1, 1, 2, 3],
            Stencil::Backward => &[-3, -2, -1, 0],
        }
    }
}

/// Reject axes shorter than the stencil
///
/// # Errors
/// Returns `InsufficientExtent` when `length < MIN_STENCIL_LEN`.
pub fn require_stencil_extent(axis: Axis, length: usize) -> FieldResult<()> {
    if length < MIN_STENCIL_LEN {
        return Err(FieldError::InsufficientExtent {
            axis,
            length,
            required: MIN_STENCIL_LEN,
        });
    }
    Ok(())
}

/// Reject zero or non-finite spacings
///
/// # Errors
/// Returns `DegenerateSpacing` when the spacing is zero, NaN or infinite.
pub fn require_spacing(axis: Axis, spacing: f32) -> FieldResult<()> {
    if spacing == 0.0 || !spacing.is_finite() {
        return Err(FieldError::DegenerateSpacing { axis, spacing });
    }
    Ok(())
}
