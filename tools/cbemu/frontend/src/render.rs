//! Rasters as ANSI true-color text, two scanlines per row.

use std::fmt::Write;

use cbemu_core::Raster;
use copperbars::custom::Rgb4;

/// Lines inside the PAL display window.
pub const FIRST_LINE: u16 = 0x2C;
pub const LAST_LINE: u16 = 0x2C + 256;

const UPPER_HALF: char = '▀';

fn fg(out: &mut String, c: Rgb4) {
    let (r, g, b) = c.to_rgb888();
    let _ = write!(out, "\x1b[38;2;{r};{g};{b}m");
}

fn bg(out: &mut String, c: Rgb4) {
    let (r, g, b) = c.to_rgb888();
    let _ = write!(out, "\x1b[48;2;{r};{g};{b}m");
}

/// `width` columns per row; each row is line `n` over line `n + 1`.
pub fn raster(raster: &Raster, width: usize) -> String {
    let mut out = String::new();
    let mut line = FIRST_LINE;
    while line < LAST_LINE {
        fg(&mut out, raster.line(line));
        bg(&mut out, raster.line(line + 1));
        out.extend(std::iter::repeat_n(UPPER_HALF, width));
        out.push_str("\x1b[0m\n");
        line += 2;
    }
    out
}
