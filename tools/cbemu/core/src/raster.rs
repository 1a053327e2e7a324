//! What `COLOR00` looked like on every line of a frame.
//!
//! One sample per line, taken at [`SAMPLE_HPOS`], well after the bar WAITs
//! release at `$10`.

use alloc::vec::Vec;

use copperbars::config::LINES_PER_FRAME;
use copperbars::custom::Rgb4;

pub const SAMPLE_HPOS: u16 = 0x80;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    lines: [Rgb4; LINES_PER_FRAME as usize],
}

impl Default for Raster {
    fn default() -> Self {
        Self {
            lines: [Rgb4::BLACK; LINES_PER_FRAME as usize],
        }
    }
}

impl Raster {
    #[inline]
    pub fn record(&mut self, line: u16, color: Rgb4) {
        if let Some(l) = self.lines.get_mut(line as usize) {
            *l = color;
        }
    }

    #[inline]
    pub fn line(&self, line: u16) -> Rgb4 {
        self.lines[line as usize]
    }

    pub fn lines(&self) -> &[Rgb4] {
        &self.lines
    }

    /// Runs of identical color as `(first line, length, color)`.
    pub fn spans(&self) -> Vec<(u16, u16, Rgb4)> {
        let mut spans: Vec<(u16, u16, Rgb4)> = Vec::new();
        for (i, &c) in self.lines.iter().enumerate() {
            match spans.last_mut() {
                Some((_, len, color)) if *color == c => *len += 1,
                _ => spans.push((i as u16, 1, c)),
            }
        }
        spans
    }
}

/// A finished frame kept for inspection.
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    /// Beam frame number, counted from power on.
    pub frame: u64,
    /// How many times the demo's frame handler had run when the frame ended.
    pub handler_frames: u32,
    pub raster: Raster,
}
