//! # Copper Bars
//!
//! Twenty-eight color bars bouncing up and down the screen, drawn by nothing
//! but the copper changing `COLOR00` on the right scanlines.
//!
//! ## Quick Start
//!
//! ```ignore
//! use copperbars::{config::DemoConfig, demo};
//!
//! let summary = demo::run(&mut platform, &DemoConfig::default())?;
//! ```
//!
//! `platform` is anything implementing [`Platform`](chipset::Platform): the
//! `rom` binary on a real Amiga, or the `cbemu-core` simulator on a host.
//!
//! ## How a frame works
//!
//! ```text
//!  line 0    vertical blank interrupt
//!            └─ FrameHandler: ack, step bars, sort, rewrite bar segment
//!  line 44   display window opens (FRAME_OFFSET)
//!  line 64+  copper: WAIT line, COLOR00 = bar, WAIT line+2, COLOR00 = black, ...
//!  ...       copper parks on the End WAIT
//!  line 311  last line; the copper restarts from COP1LC at the next blank
//! ```
//!
//! ## Modules
//!
//! | Module       | What it does                                              |
//! |--------------|-----------------------------------------------------------|
//! | [`bars`]     | The bar table, bouncing and sorting                       |
//! | [`copper`]   | Copper instruction encoding and program memory            |
//! | [`program`]  | Static header and per-frame bar segment                   |
//! | [`frame`]    | The vertical blank handler                                |
//! | [`takeover`] | Taking the system over and giving it back                 |
//! | [`demo`]     | The main loop                                             |
//! | [`blit`]     | Clearing bitplanes                                        |
//! | [`chipset`]  | The [`Chipset`](chipset::Chipset) and [`Platform`](chipset::Platform) seams |
//! | [`custom`]   | Register offsets and flags                                |
//! | [`mmio`]     | The real register file                                    |
//! | [`config`]   | PAL timing, screen geometry, the animation band           |
//!
//! ## Hardware Overview
//!
//! | Feature  | Detail                                 |
//! |----------|----------------------------------------|
//! | CPU      | 68000 @ 7.09 MHz (PAL)                 |
//! | Display  | 320×256 lowres, 1 bitplane             |
//! | Video    | PAL, 312 lines, 50 Hz                  |
//! | Copper   | MOVE / WAIT / SKIP, 2 words each       |

#![cfg_attr(not(test), no_std)]

pub mod bars;
pub mod blit;
pub mod chipset;
pub mod config;
pub mod copper;
pub mod custom;
pub mod demo;
pub mod error;
pub mod frame;
pub mod mmio;
pub mod program;
pub mod takeover;

pub use error::Error;
