// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use yuv2rgba::backends::BackendType;
use yuv2rgba::constants::RECORDED_FPS_DEFAULT;
use yuv2rgba::frame::YuvLayout;
use yuv2rgba::pipelines::ppg::Size;

mod cli;

#[derive(Parser)]
#[command(name = "yuv2rgba")]
#[command(about = "Fixed-point YUV to RGBA conversion and PPG frame statistics")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/yuv2rgba/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one frame of a raw YUV file to PNG
    Convert {
        /// Raw YUV file (consecutive frames)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        /// i420, yv12, nv12, nv21, yuyv or uyvy
        #[arg(short, long, default_value = "nv21")]
        layout: YuvLayout,

        /// Zero-based frame index within the file
        #[arg(short, long, default_value = "0")]
        frame: usize,

        /// Output PNG (default: ./frame_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Converter backend (overrides the config file)
        #[arg(short, long, value_enum)]
        backend: Option<BackendType>,
    },

    /// Run a PPG measurement over a recorded raw YUV stream
    Ppg {
        /// Raw YUV file (consecutive frames)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        /// i420, yv12, nv12, nv21, yuyv or uyvy
        #[arg(short, long, default_value = "nv21")]
        layout: YuvLayout,

        /// Frame rate the stream was recorded at
        #[arg(long, default_value_t = RECORDED_FPS_DEFAULT)]
        fps: u32,

        /// Measurement length in seconds (overrides the config file)
        #[arg(short, long)]
        duration: Option<u64>,

        /// JSON lines output (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Converter backend (overrides the config file)
        #[arg(short, long, value_enum)]
        backend: Option<BackendType>,
    },

    /// Choose the supported capture size closest to the preferred one
    Sizes {
        /// Preferred size, e.g. 200x200 (default from the config file)
        #[arg(short, long)]
        preferred: Option<Size>,

        /// Supported sizes, e.g. 640x480 320x240
        #[arg(required = true)]
        sizes: Vec<Size>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=yuv2rgba=trace, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = yuv2rgba::Config::load_or_default(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Convert {
            input,
            width,
            height,
            layout,
            frame,
            output,
            backend,
        } => cli::convert_frame(cli::ConvertArgs {
            input,
            width,
            height,
            layout,
            frame_index: frame,
            output,
            backend: backend.unwrap_or(config.backend),
        }),
        Commands::Ppg {
            input,
            width,
            height,
            layout,
            fps,
            duration,
            output,
            backend,
        } => cli::run_ppg(cli::PpgArgs {
            input,
            width,
            height,
            layout,
            fps,
            duration: duration
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| config.measurement_time()),
            output,
            backend: backend.unwrap_or(config.backend),
            channel_capacity: config.channel_capacity,
        }),
        Commands::Sizes { preferred, sizes } => {
            cli::print_optimal_size(&sizes, preferred.unwrap_or(config.measurement_size()))
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
