// SPDX-License-Identifier: GPL-3.0-only

//! PPG measurement records

use serde::{Deserialize, Serialize};

use super::FrameStats;

/// One PPG data point, produced per processed frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PpgSample {
    /// Capture time, seconds since the Unix epoch
    pub time: f64,
    /// Processing time, seconds since the Unix epoch
    pub time_received: f64,
    pub sample_size: usize,
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl PpgSample {
    /// Build a sample from millisecond timestamps and frame statistics
    pub fn new(time_ms: i64, time_received_ms: i64, stats: &FrameStats) -> Self {
        Self {
            time: time_ms as f64 / 1000.0,
            time_received: time_received_ms as f64 / 1000.0,
            sample_size: stats.sample_size,
            red: stats.red,
            green: stats.green,
            blue: stats.blue,
        }
    }
}

/// Wall-clock milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_from_stats() {
        let stats = FrameStats {
            sample_size: 40000,
            red: 0.75,
            green: 0.25,
            blue: 0.125,
        };
        let sample = PpgSample::new(1_500_000_000_250, 1_500_000_000_300, &stats);
        assert_eq!(sample.time, 1_500_000_000.25);
        assert_eq!(sample.time_received, 1_500_000_000.3);
        assert_eq!(sample.sample_size, 40000);
        assert_eq!(sample.red, 0.75);
    }

    #[test]
    fn test_json_keys() {
        let sample = PpgSample::new(1000, 2000, &FrameStats::default());
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json["time"], 1.0);
        assert_eq!(json["timeReceived"], 2.0);
        assert_eq!(json["sampleSize"], 0);
        assert!(json.get("time_received").is_none());
    }

    #[test]
    fn test_now_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_millis() > 1_577_836_800_000);
    }
}
