// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Converting a frame of a raw YUV file to PNG
//! - Running a PPG measurement over a recorded stream
//! - Choosing a capture size

use chrono::Local;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use yuv2rgba::backends::BackendType;
use yuv2rgba::frame::{YuvFrame, YuvLayout};
use yuv2rgba::pipelines::ppg::{
    Measurement, PpgRecorder, Size, TimedFrame, choose_optimal_size, now_millis,
};
use yuv2rgba::render_context::RenderContext;

pub struct ConvertArgs {
    pub input: PathBuf,
    pub width: u32,
    pub height: u32,
    pub layout: YuvLayout,
    pub frame_index: usize,
    pub output: Option<PathBuf>,
    pub backend: BackendType,
}

/// Convert one frame of a raw file and save it as PNG
pub fn convert_frame(args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(&args.input)?;
    let frame_size = args
        .layout
        .frame_size(args.width, args.height)
        .ok_or("Frame size does not fit in memory")?;
    let frame_bytes = nth_frame(&data, frame_size, args.frame_index).ok_or_else(|| {
        format!(
            "Frame {} out of range: {} holds {} complete {} frame(s) of {}x{}",
            args.frame_index,
            args.input.display(),
            data.len() / frame_size.max(1),
            args.layout,
            args.width,
            args.height
        )
    })?;

    let frame = YuvFrame::new(frame_bytes, args.width, args.height, args.layout)?;
    let mut context = RenderContext::new(args.width, args.height, args.backend)?;
    println!("Converter: {}", context.converter_name());

    let rgba = context.render(&frame)?.to_vec();
    let image = image::RgbaImage::from_raw(args.width, args.height, rgba)
        .ok_or("RGBA buffer does not match the image size")?;

    let output_path = match args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            path
        }
        None => {
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            PathBuf::from(format!("frame_{}.png", timestamp))
        }
    };

    image.save_with_format(&output_path, image::ImageFormat::Png)?;
    println!("Frame saved: {}", output_path.display());
    Ok(())
}

/// Bytes of frame `index` in a file of back-to-back frames
fn nth_frame(data: &[u8], frame_size: usize, index: usize) -> Option<&[u8]> {
    let start = index.checked_mul(frame_size)?;
    data.get(start..start.checked_add(frame_size)?)
}

pub struct PpgArgs {
    pub input: PathBuf,
    pub width: u32,
    pub height: u32,
    pub layout: YuvLayout,
    pub fps: u32,
    pub duration: Duration,
    pub output: Option<PathBuf>,
    pub backend: BackendType,
    pub channel_capacity: usize,
}

/// Replay a raw stream through the PPG recorder, writing one JSON line per sample
pub fn run_ppg(args: PpgArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.fps == 0 {
        return Err("fps must be positive".into());
    }

    let context = RenderContext::new(args.width, args.height, args.backend)?;
    // Samples may go to stdout, so status goes to stderr
    eprintln!("Converter: {}", context.converter_name());

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Box::new(std::io::BufWriter::new(std::fs::File::create(path)?))
        }
        None => Box::new(std::io::stdout().lock()),
    };

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(async {
        let measurement = Measurement::new(args.duration);
        let mut recorder = PpgRecorder::spawn(context, measurement.clone(), args.channel_capacity);

        // Ctrl+C ends the measurement at the next frame
        ctrlc::set_handler(move || {
            eprintln!();
            eprintln!("Stopping early...");
            measurement.stop();
        })?;

        let sender = recorder
            .frame_sender()
            .ok_or("PPG recorder input closed")?;
        recorder.close_input();
        let reader = tokio::spawn(read_frames(
            args.input.clone(),
            args.width,
            args.height,
            args.layout,
            args.fps,
            sender,
        ));

        while let Some(sample) = recorder.next_sample().await {
            serde_json::to_writer(&mut out, &sample)?;
            writeln!(out)?;
        }
        out.flush()?;

        let frames_read = reader.await??;
        debug!(frames_read, "Raw stream reader finished");

        let summary = recorder.finish().await?;
        Ok::<_, Box<dyn std::error::Error>>(summary)
    })?;

    eprintln!(
        "Recorded {} samples over {:.2} s ({:?})",
        summary.samples,
        summary.elapsed.as_secs_f64(),
        summary.end
    );
    Ok(())
}

/// Feed consecutive frames of a raw file into the recorder
///
/// Capture times are synthesised from `fps`, starting at the current time.
/// Returns the number of frames read.
async fn read_frames(
    path: PathBuf,
    width: u32,
    height: u32,
    layout: YuvLayout,
    fps: u32,
    sender: mpsc::Sender<TimedFrame>,
) -> yuv2rgba::Result<usize> {
    let mut file = tokio::fs::File::open(&path).await?;
    let frame_size = layout.frame_size(width, height).ok_or_else(|| {
        yuv2rgba::Error::invalid_frame(format!(
            "{}x{} {} frame does not fit in memory",
            width, height, layout
        ))
    })?;
    let start_ms = now_millis();
    let mut index = 0usize;

    info!(path = %path.display(), frame_size, fps, "Reading raw YUV stream");

    loop {
        let mut data = vec![0u8; frame_size];
        let filled = read_full(&mut file, &mut data).await?;
        if filled < frame_size {
            if filled > 0 {
                warn!(bytes = filled, "Ignoring trailing partial frame");
            }
            break;
        }

        let time_ms = start_ms + (index as i64 * 1000) / fps as i64;
        if sender
            .send(TimedFrame::new(data, width, height, layout, time_ms))
            .await
            .is_err()
        {
            // Measurement finished before the stream did
            break;
        }
        index += 1;
    }

    Ok(index)
}

/// Read until `buf` is full or EOF; returns the bytes read
async fn read_full(file: &mut tokio::fs::File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Print the supported size closest to `preferred`
pub fn print_optimal_size(
    sizes: &[Size],
    preferred: Size,
) -> Result<(), Box<dyn std::error::Error>> {
    let chosen = choose_optimal_size(sizes, preferred)
        .ok_or("Optimal image size cannot be determined")?;
    println!("{}", chosen);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_frame() {
        let data: Vec<u8> = (0..12).collect();
        assert_eq!(nth_frame(&data, 6, 0), Some(&data[..6]));
        assert_eq!(nth_frame(&data, 6, 1), Some(&data[6..]));
        assert_eq!(nth_frame(&data, 6, 2), None);
        assert_eq!(nth_frame(&data, 5, 2), None);
    }

    #[test]
    fn test_nth_frame_index_overflow() {
        // 2x2 NV21 is 6 bytes; this index wraps `start` to 0 without checks
        let data = vec![0u8; 6];
        assert_eq!(nth_frame(&data, 6, 1usize << (usize::BITS - 1)), None);
        assert_eq!(nth_frame(&data, 6, usize::MAX), None);
    }
}
