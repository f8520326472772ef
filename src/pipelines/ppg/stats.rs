// SPDX-License-Identifier: GPL-3.0-only

//! Mean colour of an RGBA frame

/// Per-channel means of one frame, normalised to `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    /// Number of pixels the means were taken over
    pub sample_size: usize,
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl FrameStats {
    /// Reduce RGBA bytes (`4*i` = R, `4*i+1` = G, `4*i+2` = B) to channel means
    ///
    /// Alpha is ignored, as is a trailing partial pixel. Empty input yields
    /// zero means rather than NaN.
    pub fn from_rgba(rgba: &[u8]) -> Self {
        let mut totals = [0u64; 3];
        for px in rgba.chunks_exact(4) {
            totals[0] += px[0] as u64;
            totals[1] += px[1] as u64;
            totals[2] += px[2] as u64;
        }

        let sample_size = rgba.len() / 4;
        if sample_size == 0 {
            return Self::default();
        }

        let range = 255.0 * sample_size as f64;
        Self {
            sample_size,
            red: (totals[0] as f64 / range) as f32,
            green: (totals[1] as f64 / range) as f32,
            blue: (totals[2] as f64 / range) as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_frame() {
        let rgba: Vec<u8> = [255, 0, 51, 255].repeat(10);
        let stats = FrameStats::from_rgba(&rgba);
        assert_eq!(stats.sample_size, 10);
        assert_eq!(stats.red, 1.0);
        assert_eq!(stats.green, 0.0);
        assert!((stats.blue - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_mixed_frame() {
        let rgba = [0, 100, 200, 255, 255, 100, 0, 0];
        let stats = FrameStats::from_rgba(&rgba);
        assert_eq!(stats.sample_size, 2);
        assert!((stats.red - 0.5).abs() < 1e-6);
        assert!((stats.green - 100.0 / 255.0).abs() < 1e-6);
        assert!((stats.blue - 100.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_is_zero() {
        let stats = FrameStats::from_rgba(&[]);
        assert_eq!(stats, FrameStats::default());
        assert!(!stats.red.is_nan());
    }
}
