// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines built on frame conversion
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │  YUV frames  │ ──▶ │   PPG recorder    │ ──▶ │  PpgSample   │
//! │  (NV21, ...) │     │  - YUV→RGBA       │     │  stream      │
//! │              │     │  - Mean R, G, B   │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`ppg`]: measurement sizing, timing and the async recorder

pub mod ppg;
