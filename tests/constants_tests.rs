// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use yuv2rgba::constants::fixed_point as fp;
use yuv2rgba::constants::*;

#[test]
fn test_coefficients_approximate_jfif() {
    // Fixed-point ratios stay within 0.1% of the floating point matrix
    let close = |mul: i32, div: i32, expected: f64| {
        let actual = mul as f64 / div as f64;
        assert!(
            ((actual - expected) / expected).abs() < 1e-3,
            "{}/{} = {} is not close to {}",
            mul,
            div,
            actual,
            expected
        );
    };
    close(fp::R_V_MUL, fp::R_V_DIV, 1.402);
    close(fp::G_V_MUL, fp::G_DIV, 0.71414);
    close(fp::B_U_MUL, fp::B_U_DIV, 1.772);
}

#[test]
fn test_green_u_multiplier_is_pinned() {
    // Not the JFIF ratio; changing it alters every converted pixel
    assert_eq!(fp::G_U_MUL, 46549);
    assert_eq!(fp::G_DIV, 1 << 17);
}

#[test]
fn test_offsets_fold_chroma_bias() {
    // Each offset is the JFIF coefficient applied to the 128 chroma bias, rounded
    let bias = |coefficient: f64| (128.0 * coefficient).round() as i32;
    assert_eq!(fp::R_OFFSET, bias(1.402));
    assert_eq!(fp::G_U_OFFSET, bias(0.34414));
    assert_eq!(fp::G_V_OFFSET, bias(0.71414));
    assert_eq!(fp::B_OFFSET, bias(1.772));
}

#[test]
fn test_products_fit_in_i32() {
    assert!(255i64 * (fp::G_V_MUL as i64) < i32::MAX as i64);
}

#[test]
fn test_defaults() {
    assert_eq!(OPAQUE_ALPHA, 255);
    assert_eq!(RGBA_BYTES_PER_PIXEL, 4);
    assert_eq!(WORKGROUP_SIZE, 16);
    assert_eq!(PPG_MEASUREMENT_TIME_DEFAULT.as_secs(), 60);
    assert!(FRAME_CHANNEL_CAPACITY_DEFAULT > 0);
}
