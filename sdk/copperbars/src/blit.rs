//! Clearing bitplanes with the blitter.
//!
//! A D-only blit with minterm 0 writes zeros: `BLTCON0 = $0100` enables
//! channel D and nothing else.

use crate::{chipset::Chipset, config::ScreenConfig, custom::reg};

/// `BLTCON0` for a D-only clear.
pub const CLEAR_BLTCON0: u16 = 0x0100;

/// `BLTSIZE` for a `height` line by `words` word blit. Starts the blitter.
#[inline]
pub const fn bltsize(height: u16, words: u16) -> u16 {
    (height << 6) | (words & 0x3F)
}

/// Zero every configured plane, one blit per plane.
///
/// Waits for the blitter before starting and after each plane.
pub fn clear_bitplanes<C: Chipset + ?Sized>(chips: &mut C, screen: &ScreenConfig, bitplanes: u32) {
    chips.wait_blitter();

    chips.write(reg::BLTCON0, CLEAR_BLTCON0);
    chips.write(reg::BLTCON1, 0);
    chips.write(reg::BLTAFWM, 0xFFFF);
    chips.write(reg::BLTALWM, 0xFFFF);
    // rows are packed, nothing to skip
    chips.write(reg::BLTDMOD, 0);

    let mut plane = bitplanes;
    for _ in 0..screen.depth {
        chips.write_ptr(reg::BLTDPTH, plane);
        chips.write(reg::BLTSIZE, bltsize(screen.height, screen.words_per_row()));
        chips.wait_blitter();
        plane += screen.plane_bytes() as u32;
    }
}
