//! # Bars
//!
//! The bar table is a fixed array of [`NUM_BARS`] bars, built once from
//! [`STOCK_BARS`] and then stepped and re-sorted by the frame handler every
//! vertical blank.
//!
//! The stock table is four seven-bar gradients (red, green, blue, pink), two
//! lines apart, all moving down at one line per frame. Bars reach the bottom
//! of the band at different frames, turn around, and cross the ones still
//! coming down, which is why the table has to be re-sorted every frame.

use crate::{config::AnimationBand, custom::Rgb4};

pub const NUM_BARS: usize = 28;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bar {
    /// Lines below the top of the display window.
    pub position: u16,
    /// Height in lines.
    pub extent: u16,
    pub color: Rgb4,
    /// Lines moved per frame.
    pub velocity: i16,
}

impl Bar {
    pub const fn new(position: u16, extent: u16, color: u16, velocity: i16) -> Self {
        Self {
            position,
            extent,
            color: Rgb4(color),
            velocity,
        }
    }

    /// Move by one frame, bouncing off either end of `band`.
    ///
    /// A bar that would leave the band is clamped to the bound it crossed and
    /// its velocity negated once.
    #[inline]
    pub fn step(&mut self, band: &AnimationBand) {
        let top = band.top as i32;
        let bottom = band.bottom_bound(self.extent) as i32;
        let mut next = self.position as i32 + self.velocity as i32;

        if next < top {
            next = top;
            self.velocity = -self.velocity;
        }
        if next > bottom {
            next = bottom;
            self.velocity = -self.velocity;
        }

        self.position = next as u16;
    }

    /// Where the bar is drawn this frame: one more step ahead of its stored
    /// position, to cover the time between the interrupt and the beam
    /// reaching the bar. Not stored.
    #[inline]
    pub fn lead_position(&self) -> u16 {
        (self.position as i32 + self.velocity as i32).max(0) as u16
    }
}

#[rustfmt::skip]
pub const STOCK_BARS: [Bar; NUM_BARS] = [
    // red
    Bar::new(52, 2, 0x300, 1),
    Bar::new(54, 2, 0x600, 1),
    Bar::new(56, 2, 0xA00, 1),
    Bar::new(58, 2, 0xF00, 1),
    Bar::new(60, 2, 0xA00, 1),
    Bar::new(62, 2, 0x600, 1),
    Bar::new(64, 2, 0x300, 1),
    // green
    Bar::new(66, 2, 0x030, 1),
    Bar::new(68, 2, 0x060, 1),
    Bar::new(70, 2, 0x090, 1),
    Bar::new(72, 2, 0x0F0, 1),
    Bar::new(74, 2, 0x090, 1),
    Bar::new(76, 2, 0x060, 1),
    Bar::new(78, 2, 0x030, 1),
    // blue
    Bar::new(80, 2, 0x003, 1),
    Bar::new(82, 2, 0x006, 1),
    Bar::new(84, 2, 0x009, 1),
    Bar::new(86, 2, 0x00F, 1),
    Bar::new(88, 2, 0x009, 1),
    Bar::new(90, 2, 0x006, 1),
    Bar::new(92, 2, 0x003, 1),
    // pink
    Bar::new(94, 2, 0x303, 1),
    Bar::new(96, 2, 0x606, 1),
    Bar::new(98, 2, 0x909, 1),
    Bar::new(100, 2, 0xF0F, 1),
    Bar::new(102, 2, 0x909, 1),
    Bar::new(104, 2, 0x606, 1),
    Bar::new(106, 2, 0x303, 1),
];

/// Stable insertion sort by position.
///
/// Bars move at most a few lines per frame, so the table is nearly sorted on
/// every call and this runs close to linear.
pub fn sort_by_position(bars: &mut [Bar]) {
    for i in 1..bars.len() {
        let key = bars[i];
        let mut j = i;
        while j > 0 && bars[j - 1].position > key.position {
            bars[j] = bars[j - 1];
            j -= 1;
        }
        bars[j] = key;
    }
}
