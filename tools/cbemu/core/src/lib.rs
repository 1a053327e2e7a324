//! # cbemu-core
//!
//! A PAL OCS Amiga, simulated just far enough to run the copper bars:
//! beam, copper, a D-only blitter, CIA-A's mouse button, chip RAM and the
//! scraps of exec and graphics.library the takeover talks to.
//!
//! ```ignore
//! let mut amiga = Amiga::new();
//! amiga.click_at(100);
//! let summary = copperbars::demo::run(&mut amiga, &DemoConfig::default())?;
//! ```

#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod beam;
pub mod blitter;
pub mod bus;
pub mod chip_ram;
pub mod cia;
pub mod copper;
pub mod exec;
pub mod machine;
pub mod raster;

pub use machine::{Amiga, SystemSnapshot};
pub use raster::{CapturedFrame, Raster};
