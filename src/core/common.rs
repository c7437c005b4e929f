//! Type definition of Float, otherwise constants and functions which
//! can be used almost everywhere else in the code.

// std
use std::f32::consts::PI;
use std::ops::{Add, BitAnd, Mul, Sub};
// others
use num;

pub type Float = f32;

pub const MACHINE_EPSILON: Float = std::f32::EPSILON * 0.5;

/// Clamp the given value *val* to lie between the values *low* and *high*.
pub fn clamp_t<T>(val: T, low: T, high: T) -> T
where
    T: PartialOrd,
{
    let r: T;
    if val < low {
        r = low;
    } else if val > high {
        r = high;
    } else {
        r = val;
    }
    r
}

/// Interpolate linearly between two provided values.
pub fn lerp<S, T>(t: S, a: T, b: T) -> T
where
    S: num::One,
    S: Sub<S, Output = S>,
    S: Copy,
    T: Add<T, Output = T>,
    T: Mul<S, Output = T>,
{
    let one: S = num::One::one();
    a * (one - t) + b * t
}

/// Convert from angles expressed in degrees to radians.
pub fn radians(deg: Float) -> Float {
    (PI / 180.0) * deg
}

/// Convert from angles expressed in radians to degrees.
pub fn degrees(rad: Float) -> Float {
    (180.0 / PI) * rad
}

/// Determine if a given integer is an exact power of 2.
pub fn is_power_of_2<T>(v: T) -> bool
where
    T: num::Zero + num::One + Copy + PartialOrd + BitAnd<T, Output = T> + Sub<T, Output = T>,
{
    (v > num::Zero::zero()) && !((v & (v - num::One::one())) > num::Zero::zero())
}

/// Quantize a normalized box coordinate (in [0, 1] relative to the
/// parent extent) to a byte, rounding down. Used for the low side of
/// a child box so the dequantized value never overshoots the real
/// bound.
pub fn quantize_lo(t: Float) -> u8 {
    clamp_t((t * 255.0 as Float).floor(), 0.0 as Float, 255.0 as Float) as u8
}

/// Quantize a normalized box coordinate to a byte, rounding up. Used
/// for the high side of a child box.
pub fn quantize_hi(t: Float) -> u8 {
    clamp_t((t * 255.0 as Float).ceil(), 0.0 as Float, 255.0 as Float) as u8
}

/// Reconstruct a world-space coordinate from a quantized byte and the
/// parent bound: `lo + (byte / 255) * (hi - lo)`.
pub fn dequantize(b: u8, lo: Float, extent: Float) -> Float {
    lo + (b as Float) * (1.0 as Float / 255.0 as Float) * extent
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quantization_is_conservative() {
        let lo: Float = -3.0;
        let hi: Float = 5.0;
        let extent: Float = hi - lo;
        let v0: Float = -1.37;
        let v1: Float = 2.11;
        let q0: u8 = quantize_lo((v0 - lo) / extent);
        let q1: u8 = quantize_hi((v1 - lo) / extent);
        assert!(dequantize(q0, lo, extent) <= v0);
        assert!(dequantize(q1, lo, extent) >= v1);
        // the full parent extent maps onto the full byte range
        assert_eq!(quantize_lo(0.0), 0_u8);
        assert_eq!(quantize_hi(1.0), 255_u8);
        assert_eq!(dequantize(255_u8, lo, extent), hi);
    }

    #[test]
    fn clamp_and_lerp() {
        assert_eq!(clamp_t(7_i32, 0_i32, 4_i32), 4_i32);
        assert_eq!(clamp_t(-2.0 as Float, 0.0, 4.0), 0.0);
        assert_eq!(lerp(0.5 as Float, 2.0 as Float, 4.0 as Float), 3.0);
        assert!(is_power_of_2(32_u32));
        assert!(!is_power_of_2(33_u32));
    }
}
