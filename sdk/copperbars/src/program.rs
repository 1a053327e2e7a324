//! # Copper Program
//!
//! The program lives in one chip RAM buffer and has a fixed layout:
//!
//! | Words                 | Contents                                          |
//! |-----------------------|---------------------------------------------------|
//! | `0..header`           | Display window, fetch, `BPLCON0`, modulos, plane pointers |
//! | `header..header+8N`   | Per bar: WAIT, MOVE `COLOR00`, WAIT, MOVE `COLOR00` |
//! | last two              | End                                               |
//!
//! The header is written once. The bar segment is rewritten in place every
//! frame from the vertical blank interrupt, while the copper may still be
//! parked on the End WAIT of the previous pass. The word count never changes,
//! only values do.
//!
//! There is one buffer, not two. The rewrite is safe as long as the handler
//! finishes before the beam reaches the first bar WAIT, which is at least
//! `band.top + FRAME_OFFSET` lines (line 64 with the stock band) into the
//! frame. A late handler shows up as one frame of torn bars.

use log::debug;

use crate::{
    bars::Bar,
    config::{ScreenConfig, BAR_WAIT_HPOS, FRAME_OFFSET},
    copper::{ProgramMemory, Writer},
    custom::{reg, Rgb4},
    error::Error,
};

/// Geometry and mode MOVEs before the plane pointers.
pub const GEOMETRY_PAIRS: usize = 7;

/// Words per bar in the dynamic segment.
pub const WORDS_PER_BAR: usize = 8;

/// Words taken by the End instruction.
pub const END_WORDS: usize = 2;

/// Color the bars are cleared back to.
pub const BACKGROUND: Rgb4 = Rgb4::BLACK;

/// Words in the static header for `screen`.
pub const fn header_words(screen: &ScreenConfig) -> usize {
    (GEOMETRY_PAIRS + 2 * screen.depth as usize) * 2
}

/// Total words of a program for `screen` with `bars` bars.
pub const fn program_words(screen: &ScreenConfig, bars: usize) -> usize {
    header_words(screen) + WORDS_PER_BAR * bars + END_WORDS
}

/// The copper program buffer and what is known about its layout.
pub struct CopperProgram<M: ProgramMemory> {
    mem: M,
    dynamic_start: usize,
    bars: usize,
}

impl<M: ProgramMemory> CopperProgram<M> {
    /// Take ownership of `mem` for a program with `bars` bars.
    pub fn new(mem: M, screen: &ScreenConfig, bars: usize) -> Result<Self, Error> {
        let needed = program_words(screen, bars);
        if mem.len() < needed {
            return Err(Error::ProgramTooSmall {
                needed,
                capacity: mem.len(),
            });
        }

        Ok(Self {
            mem,
            dynamic_start: header_words(screen),
            bars,
        })
    }

    /// Write the static header for `screen`, with plane `n` at
    /// `bitplanes + n * plane_bytes`, followed by an empty bar segment.
    ///
    /// Returns the word offset the bar segment starts at.
    pub fn build_static(&mut self, screen: &ScreenConfig, bitplanes: u32) -> usize {
        let mut w = Writer::at(&mut self.mem, 0);
        w.mov(reg::DIWSTRT, screen.diwstrt);
        w.mov(reg::DIWSTOP, screen.diwstop);
        w.mov(reg::DDFSTRT, screen.ddfstrt);
        w.mov(reg::DDFSTOP, screen.ddfstop);
        w.mov(reg::BPLCON0, screen.bplcon0());
        w.mov(reg::BPL1MOD, 0);
        w.mov(reg::BPL2MOD, 0);

        let mut plane = bitplanes;
        for n in 0..screen.depth as usize {
            w.mov_ptr(reg::bplpt(n), plane);
            plane += screen.plane_bytes() as u32;
        }

        self.dynamic_start = w.pos();
        debug!(
            "copper header: {} words, bars from word {}, {} words total",
            self.dynamic_start,
            self.dynamic_start,
            self.words()
        );

        self.clear_dynamic();
        self.dynamic_start
    }

    /// Fill the bar segment with do-nothing pairs so the program is valid
    /// before the first interrupt rewrites it.
    fn clear_dynamic(&mut self) {
        let mut w = Writer::at(&mut self.mem, self.dynamic_start);
        for _ in 0..self.bars * 2 {
            w.wait(FRAME_OFFSET as u8, BAR_WAIT_HPOS as u8);
            w.mov(reg::color(0), BACKGROUND.bits());
        }
        w.end();
    }

    /// Rewrite the bar segment from `start`.
    ///
    /// `bars` must be sorted by position and `render` gives the line each bar
    /// is drawn at, relative to the top of the display window. WAIT targets
    /// never go backwards: a bar that starts before its predecessor has been
    /// cleared starts at the predecessor's clear line instead, and still ends
    /// at its own bottom. A bar entirely behind its predecessor gets an empty
    /// span.
    pub fn regenerate<F>(&mut self, bars: &[Bar], start: usize, render: F)
    where
        F: Fn(&Bar) -> u16,
    {
        debug_assert_eq!(bars.len(), self.bars);

        let mut w = Writer::at(&mut self.mem, start);
        let mut last = 0u16;
        for bar in bars {
            let line = render(bar) + FRAME_OFFSET;
            let top = clamp_line(line.max(last));
            let bottom = clamp_line((line + bar.extent).max(top));

            w.wait(top as u8, BAR_WAIT_HPOS as u8);
            w.mov(reg::color(0), bar.color.bits());
            w.wait(bottom as u8, BAR_WAIT_HPOS as u8);
            w.mov(reg::color(0), BACKGROUND.bits());

            last = bottom;
        }
        w.end();
    }

    /// Word offset of the bar segment.
    #[inline]
    pub fn dynamic_start(&self) -> usize {
        self.dynamic_start
    }

    /// Words the program occupies, End included.
    #[inline]
    pub fn words(&self) -> usize {
        self.dynamic_start + WORDS_PER_BAR * self.bars + END_WORDS
    }

    /// Chip RAM address for `COP1LC`.
    #[inline]
    pub fn address(&self) -> u32 {
        self.mem.address()
    }

    #[inline]
    pub fn memory(&self) -> &M {
        &self.mem
    }

    /// Hand the buffer back, to be freed.
    pub fn into_memory(self) -> M {
        self.mem
    }
}

/// WAITs only carry eight VP bits. Everything the band allows fits, this
/// keeps an out-of-band position from wrapping to the top of the frame.
#[inline]
fn clamp_line(line: u16) -> u16 {
    line.min(0xFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bars::{sort_by_position, NUM_BARS, STOCK_BARS},
        copper::{instructions, tests::Words, Instruction},
    };

    const WORDS: usize = 512;

    fn wait_lines(mem: &Words<WORDS>) -> Vec<u16> {
        instructions(mem)
            .filter_map(|ins| match ins {
                Instruction::Wait { vp, .. } => Some(vp as u16),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn layout_word_counts() {
        let mut screen = ScreenConfig::PAL_LOWRES;
        assert_eq!(header_words(&screen), 18);
        assert_eq!(program_words(&screen, NUM_BARS), 18 + 224 + 2);

        screen.depth = 0;
        assert_eq!(header_words(&screen), 14);
        assert_eq!(program_words(&screen, NUM_BARS), 240);
    }

    #[test]
    fn too_small_buffer_is_rejected() {
        let screen = ScreenConfig::PAL_LOWRES;
        let err = CopperProgram::new(Words([0u16; 64]), &screen, NUM_BARS).err();
        assert_eq!(
            err,
            Some(Error::ProgramTooSmall {
                needed: 244,
                capacity: 64
            })
        );
    }

    #[test]
    fn static_header_contents() {
        let screen = ScreenConfig::PAL_LOWRES;
        let mut program = CopperProgram::new(Words([0u16; WORDS]), &screen, NUM_BARS).unwrap();
        let start = program.build_static(&screen, 0x0002_3450);
        assert_eq!(start, 18);

        let words = &program.memory().0;
        assert_eq!(
            &words[..18],
            &[
                0x008E, 0x2C81, 0x0090, 0x2CC1, 0x0092, 0x0038, 0x0094, 0x00D0, 0x0100, 0x1200,
                0x0108, 0x0000, 0x010A, 0x0000, 0x00E0, 0x0002, 0x00E2, 0x3450,
            ]
        );
        // valid program before the first regeneration
        assert_eq!(instructions(program.memory()).count(), (18 + 224) / 2 + 1);
    }

    #[test]
    fn regenerated_segment_for_first_bar() {
        let screen = ScreenConfig::PAL_LOWRES;
        let mut program = CopperProgram::new(Words([0u16; WORDS]), &screen, NUM_BARS).unwrap();
        let start = program.build_static(&screen, 0);
        program.regenerate(&STOCK_BARS, start, |b| b.position);

        let words = &program.memory().0;
        let y = 52 + 0x2C;
        assert_eq!(
            &words[start..start + 8],
            &[(y << 8) | 0x11, 0xFFFE, 0x0180, 0x0300, ((y + 2) << 8) | 0x11, 0xFFFE, 0x0180, 0x0000]
        );
        let end = start + 8 * NUM_BARS;
        assert_eq!(&words[end..end + 2], &[0xFFFF, 0xFFFE]);
    }

    #[test]
    fn word_count_is_invariant_across_regenerations() {
        let screen = ScreenConfig::PAL_LOWRES;
        let mut program = CopperProgram::new(Words([0u16; WORDS]), &screen, NUM_BARS).unwrap();
        let start = program.build_static(&screen, 0);
        let mut bars = STOCK_BARS;
        for _ in 0..10 {
            program.regenerate(&bars, start, |b| b.lead_position());
            let words: usize = instructions(program.memory()).count() * 2;
            assert_eq!(words, program.words());
            assert_eq!(words, 244);
            for bar in bars.iter_mut() {
                bar.position += 3;
            }
        }
    }

    #[test]
    fn waits_never_go_backwards_for_overlapping_bars() {
        let screen = ScreenConfig::PAL_LOWRES;
        let mut program = CopperProgram::new(Words([0u16; WORDS]), &screen, NUM_BARS).unwrap();
        let start = program.build_static(&screen, 0);

        let mut bars = STOCK_BARS;
        // squash everything into a handful of lines, with velocities that
        // reorder the drawn positions relative to the stored ones
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.position = 100 + (i as u16 % 4);
            bar.velocity = if i % 2 == 0 { 1 } else { -1 };
        }
        sort_by_position(&mut bars);
        program.regenerate(&bars, start, |b| b.lead_position());

        let waits = wait_lines(program.memory());
        // header has no WAITs; End decodes separately
        assert_eq!(waits.len(), 2 * NUM_BARS);
        for pair in waits.windows(2) {
            assert!(pair[0] <= pair[1], "{} > {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn bars_on_one_line_are_not_pushed_down() {
        let screen = ScreenConfig::PAL_LOWRES;
        let mut program = CopperProgram::new(Words([0u16; WORDS]), &screen, NUM_BARS).unwrap();
        let start = program.build_static(&screen, 0);

        let bars = [Bar::new(150, 2, 0xF00, 1); NUM_BARS];
        program.regenerate(&bars, start, |b| b.position);

        let top = 150 + FRAME_OFFSET;
        let waits = wait_lines(program.memory());
        assert_eq!(&waits[..2], &[top, top + 2]);
        // the rest hide behind the first bar
        for pair in waits[2..].chunks(2) {
            assert_eq!(pair, &[top + 2, top + 2]);
        }
        assert!(waits.iter().all(|&l| l <= top + 2));
    }

    #[test]
    fn overlapping_bar_keeps_its_own_bottom() {
        let screen = ScreenConfig::PAL_LOWRES;
        let mut program = CopperProgram::new(Words([0u16; WORDS]), &screen, NUM_BARS).unwrap();
        let start = program.build_static(&screen, 0);

        let mut bars = [Bar::new(180, 2, 0x00F, 1); NUM_BARS];
        bars[0] = Bar::new(100, 4, 0xF00, 1);
        bars[1] = Bar::new(102, 4, 0x0F0, 1);
        program.regenerate(&bars, start, |b| b.position);

        let y = 100 + FRAME_OFFSET;
        let waits = wait_lines(program.memory());
        // second bar shows only below the first, ending where it always would
        assert_eq!(&waits[..4], &[y, y + 4, y + 4, y + 6]);
    }
}
