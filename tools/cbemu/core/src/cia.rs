//! CIA-A port A. Only `/FIR0`, the left mouse button, is wired.

use bit_field::BitField;
use copperbars::chipset::CIAA_PRA_FIR0;

pub const MAX_CLICKS: usize = 8;

/// How long a scripted click holds the button down.
pub const CLICK_FRAMES: u64 = 2;

/// A button press from frame `at` for `frames` frames.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Click {
    pub at: u64,
    pub frames: u64,
}

#[derive(Debug, Default)]
pub struct CiaA {
    clicks: heapless::Vec<Click, MAX_CLICKS>,
}

impl CiaA {
    /// Queue a click. Returns false once the script is full.
    pub fn click_at(&mut self, frame: u64) -> bool {
        self.clicks
            .push(Click {
                at: frame,
                frames: CLICK_FRAMES,
            })
            .is_ok()
    }

    pub fn button_down(&self, frame: u64) -> bool {
        self.clicks
            .iter()
            .any(|c| frame >= c.at && frame < c.at + c.frames)
    }

    /// Port A as read at `frame`. Inputs float high; the button pulls low.
    pub fn pra(&self, frame: u64) -> u8 {
        let mut pra = 0xFFu8;
        pra.set_bit(CIAA_PRA_FIR0, !self.button_down(frame));
        pra
    }
}
