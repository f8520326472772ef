// SPDX-License-Identifier: GPL-3.0-only

//! Async PPG recorder
//!
//! Frames are pushed into a bounded channel and consumed by one blocking
//! worker that owns the [`RenderContext`]. Each frame is converted, reduced
//! to [`FrameStats`] and emitted as a [`PpgSample`].
//!
//! ```text
//! push(TimedFrame) ──▶ [bounded mpsc] ──▶ worker: render → stats ──▶ samples
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{FrameStats, Measurement, PpgSample, now_millis};
use crate::errors::{Error, Result};
use crate::frame::{YuvFrame, YuvLayout};
use crate::render_context::RenderContext;

/// Owned frame bytes with their capture time
#[derive(Debug, Clone)]
pub struct TimedFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub layout: YuvLayout,
    /// Capture time, milliseconds since the Unix epoch
    pub time_ms: i64,
}

impl TimedFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, layout: YuvLayout, time_ms: i64) -> Self {
        Self {
            data,
            width,
            height,
            layout,
            time_ms,
        }
    }

    /// Borrow the bytes as a frame handle
    pub fn frame(&self) -> Result<YuvFrame<'_>> {
        YuvFrame::new(&self.data, self.width, self.height, self.layout)
    }
}

/// Why a recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingEnd {
    /// The frame sender was closed
    InputClosed,
    /// A frame arrived after the measurement duration
    DurationElapsed,
    /// [`Measurement::stop`] was called
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingSummary {
    /// Samples emitted
    pub samples: usize,
    /// Capture time span covered by the emitted samples
    pub elapsed: Duration,
    pub end: RecordingEnd,
}

/// Running PPG recording
pub struct PpgRecorder {
    frames: Option<mpsc::Sender<TimedFrame>>,
    samples: mpsc::UnboundedReceiver<PpgSample>,
    measurement: Measurement,
    worker: JoinHandle<Result<RecordingSummary>>,
}

impl PpgRecorder {
    /// Start the worker on tokio's blocking pool
    ///
    /// `capacity` bounds how many frames may wait for conversion before
    /// [`PpgRecorder::push`] applies back-pressure. Must be called from
    /// within a tokio runtime.
    pub fn spawn(context: RenderContext, measurement: Measurement, capacity: usize) -> Self {
        let (frame_tx, frame_rx) = mpsc::channel(capacity.max(1));
        let (sample_tx, sample_rx) = mpsc::unbounded_channel();

        info!(
            width = context.width(),
            height = context.height(),
            converter = context.converter_name(),
            duration_secs = measurement.duration().as_secs_f64(),
            "Starting PPG recording"
        );

        let worker_measurement = measurement.clone();
        let worker = tokio::task::spawn_blocking(move || {
            record(context, worker_measurement, frame_rx, sample_tx)
        });

        Self {
            frames: Some(frame_tx),
            samples: sample_rx,
            measurement,
            worker,
        }
    }

    /// Queue a frame, waiting while the channel is full
    ///
    /// Fails with [`Error::Channel`] once the recording has ended.
    pub async fn push(&self, frame: TimedFrame) -> Result<()> {
        let sender = self
            .frames
            .as_ref()
            .ok_or_else(|| Error::Channel("recorder input already closed".to_string()))?;
        sender
            .send(frame)
            .await
            .map_err(|_| Error::Channel("PPG recording has ended".to_string()))
    }

    /// A sender for feeding frames from another task
    pub fn frame_sender(&self) -> Option<mpsc::Sender<TimedFrame>> {
        self.frames.clone()
    }

    /// Signal that no more frames will be pushed
    pub fn close_input(&mut self) {
        self.frames = None;
    }

    /// Next sample, or `None` once the worker has finished and all samples
    /// were taken
    pub async fn next_sample(&mut self) -> Option<PpgSample> {
        self.samples.recv().await
    }

    /// Handle that can stop the measurement from elsewhere
    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    pub fn stop(&self) {
        self.measurement.stop();
    }

    /// Close the input and wait for the worker
    ///
    /// Samples not yet taken with [`PpgRecorder::next_sample`] are dropped.
    pub async fn finish(mut self) -> Result<RecordingSummary> {
        self.close_input();
        self.worker
            .await
            .map_err(|e| Error::Channel(format!("PPG worker panicked: {}", e)))?
    }
}

fn record(
    mut context: RenderContext,
    measurement: Measurement,
    mut frames: mpsc::Receiver<TimedFrame>,
    samples: mpsc::UnboundedSender<PpgSample>,
) -> Result<RecordingSummary> {
    let mut start_ms: Option<i64> = None;
    let mut emitted = 0usize;
    let mut elapsed = Duration::ZERO;

    let end = loop {
        let Some(timed) = frames.blocking_recv() else {
            break RecordingEnd::InputClosed;
        };

        if measurement.is_stopped() {
            break RecordingEnd::Stopped;
        }

        let start = *start_ms.get_or_insert(timed.time_ms);
        let frame_elapsed = Duration::from_millis(timed.time_ms.saturating_sub(start).max(0) as u64);
        if measurement.is_complete(frame_elapsed) {
            break RecordingEnd::DurationElapsed;
        }

        let frame = timed.frame()?;
        let rgba = context.render(&frame)?;
        let stats = FrameStats::from_rgba(rgba);
        let sample = PpgSample::new(timed.time_ms, now_millis(), &stats);

        debug!(
            time = sample.time,
            red = sample.red,
            green = sample.green,
            blue = sample.blue,
            "PPG sample"
        );

        if samples.send(sample).is_err() {
            // Nobody is listening any more
            break RecordingEnd::InputClosed;
        }
        emitted += 1;
        elapsed = frame_elapsed;
    };

    info!(samples = emitted, end = ?end, "PPG recording finished");

    Ok(RecordingSummary {
        samples: emitted,
        elapsed,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackendType;

    fn gray(time_ms: i64) -> TimedFrame {
        TimedFrame::new(
            vec![128; YuvLayout::NV21.frame_size(4, 4).unwrap()],
            4,
            4,
            YuvLayout::NV21,
            time_ms,
        )
    }

    fn recorder(duration: Duration) -> PpgRecorder {
        let context = RenderContext::new(4, 4, BackendType::Cpu).unwrap();
        PpgRecorder::spawn(context, Measurement::new(duration), 2)
    }

    #[tokio::test]
    async fn test_records_until_input_closes() {
        let mut rec = recorder(Duration::from_secs(60));
        for i in 0..3 {
            rec.push(gray(1_000 + i * 33)).await.unwrap();
        }
        rec.close_input();

        let mut samples = Vec::new();
        while let Some(sample) = rec.next_sample().await {
            samples.push(sample);
        }
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].time, 1.0);
        assert_eq!(samples[0].sample_size, 16);
        assert!((samples[0].red - 128.0 / 255.0).abs() < 1e-6);

        let summary = rec.finish().await.unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.end, RecordingEnd::InputClosed);
        assert_eq!(summary.elapsed, Duration::from_millis(66));
    }

    #[tokio::test]
    async fn test_stops_after_duration() {
        let mut rec = recorder(Duration::from_secs(1));
        // 0.0s, 0.5s and 1.0s are inside the window, 1.5s is not
        for t in [0, 500, 1000, 1500, 2000] {
            if rec.push(gray(t)).await.is_err() {
                break;
            }
        }
        rec.close_input();

        let mut count = 0;
        while rec.next_sample().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 3);

        let summary = rec.finish().await.unwrap();
        assert_eq!(summary.end, RecordingEnd::DurationElapsed);
    }

    #[tokio::test]
    async fn test_stop_request() {
        let rec = recorder(Duration::from_secs(60));
        rec.stop();
        rec.push(gray(0)).await.unwrap();

        let summary = rec.finish().await.unwrap();
        assert_eq!(summary.samples, 0);
        assert_eq!(summary.end, RecordingEnd::Stopped);
    }

    #[tokio::test]
    async fn test_bad_frame_ends_with_error() {
        let rec = recorder(Duration::from_secs(60));
        rec.push(TimedFrame::new(vec![0; 3], 4, 4, YuvLayout::NV21, 0))
            .await
            .unwrap();
        assert!(matches!(
            rec.finish().await,
            Err(Error::BufferTooSmall { .. })
        ));
    }
}
