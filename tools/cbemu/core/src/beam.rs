//! The PAL beam counter, in color clocks.
//!
//! A frame is 312 lines of 227 color clocks. Line 0 starts the vertical
//! blank; that is where the copper restarts and `VERTB` is raised.

use copperbars::config::{CCKS_PER_LINE, LINES_PER_FRAME};
use copperbars::custom::Beam;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BeamEvent {
    None,
    NewLine,
    NewFrame,
}

#[derive(Clone, Debug, Default)]
pub struct BeamCounter {
    line: u16,
    hpos: u16,
    frame: u64,
    ccks: u64,
}

impl BeamCounter {
    /// One color clock forward.
    #[inline]
    pub fn advance(&mut self) -> BeamEvent {
        self.ccks += 1;
        self.hpos += 1;
        if self.hpos < CCKS_PER_LINE {
            return BeamEvent::None;
        }

        self.hpos = 0;
        self.line += 1;
        if self.line < LINES_PER_FRAME {
            return BeamEvent::NewLine;
        }

        self.line = 0;
        self.frame += 1;
        BeamEvent::NewFrame
    }

    #[inline]
    pub fn position(&self) -> Beam {
        Beam {
            line: self.line,
            hpos: self.hpos,
        }
    }

    #[inline]
    pub fn line(&self) -> u16 {
        self.line
    }

    #[inline]
    pub fn hpos(&self) -> u16 {
        self.hpos
    }

    /// Frames started since power on.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn ccks(&self) -> u64 {
        self.ccks
    }

    /// `VPOSR`: long frame flag and V8.
    #[inline]
    pub fn vposr(&self) -> u16 {
        0x8000 | (self.line >> 8)
    }

    /// `VHPOSR`: V7-V0 and H8-H1.
    #[inline]
    pub fn vhposr(&self) -> u16 {
        ((self.line & 0xFF) << 8) | (self.hpos & 0xFF)
    }
}
