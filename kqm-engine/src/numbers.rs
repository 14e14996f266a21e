//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a count to u32, saturating on overflow.
#[must_use]
pub fn usize_to_u32(value: usize) -> u32 {
    cast::<usize, u32>(value).unwrap_or(u32::MAX)
}

/// Widen a roll count to usize, saturating on 16-bit targets.
#[must_use]
pub fn u32_to_usize(value: u32) -> usize {
    cast::<u32, usize>(value).unwrap_or(usize::MAX)
}

/// Returns true when two floats agree within a tolerance scaled to their magnitude.
#[must_use]
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= tolerance * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_eq_scales_with_magnitude() {
        assert!(approx_eq(1_000_000.0, 1_000_000.000_000_1, 1e-12));
        assert!(!approx_eq(1.0, 1.001, 1e-9));
        assert!(approx_eq(0.0, 0.0, 0.0));
    }

    #[test]
    fn counts_saturate_instead_of_wrapping() {
        assert_eq!(usize_to_u32(5), 5);
        assert_eq!(usize_to_u32(usize::MAX), u32::MAX);
        assert_eq!(u32_to_usize(20), 20);
        assert_eq!(usize_to_u32(u32_to_usize(u32::MAX)), u32::MAX);
    }
}
