//! The blitter, D channel only.
//!
//! Sources A, B and C are not fetched; their data registers read as zero, so
//! the written word is all ones or all zeros depending on minterm bit 0
//! (the `abc = 000` row). That covers clears and fills, which is all the demo
//! asks of it.
//!
//! Blits run whether or not blitter DMA is enabled.

use bitfield::bitfield;
use log::{debug, warn};

use crate::chip_ram::ChipRam;

/// Color clocks per destination word.
pub const CCKS_PER_WORD: u8 = 2;

bitfield! {
    /// `BLTCON0`.
    #[derive(Copy, Clone, Default)]
    pub struct BltCon0(u16);
    impl Debug;
    pub u8, ash, _: 15, 12;
    pub use_a, _: 11;
    pub use_b, _: 10;
    pub use_c, _: 9;
    pub use_d, _: 8;
    pub u8, minterm, _: 7, 0;
}

bitfield! {
    /// `BLTSIZE`: height in lines, width in words. Zero means the maximum.
    #[derive(Copy, Clone, Default)]
    pub struct BltSize(u16);
    impl Debug;
    pub height, _: 15, 6;
    pub width, _: 5, 0;
}

impl BltSize {
    pub fn lines(&self) -> u16 {
        match self.height() {
            0 => 1024,
            h => h,
        }
    }

    pub fn words(&self) -> u16 {
        match self.width() {
            0 => 64,
            w => w,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Job {
    addr: u32,
    lines_left: u16,
    words: u16,
    col: u16,
    word: u16,
    write: bool,
    clock: u8,
}

#[derive(Debug, Default)]
pub struct Blitter {
    con0: BltCon0,
    con1: u16,
    afwm: u16,
    alwm: u16,
    dpt: u32,
    dmod: i16,
    job: Option<Job>,
    zero: bool,
}

impl Blitter {
    pub fn set_con0(&mut self, value: u16) {
        self.con0 = BltCon0(value);
    }

    pub fn set_con1(&mut self, value: u16) {
        self.con1 = value;
    }

    pub fn set_masks(&mut self, first: Option<u16>, last: Option<u16>) {
        if let Some(m) = first {
            self.afwm = m;
        }
        if let Some(m) = last {
            self.alwm = m;
        }
    }

    pub fn set_dpt_high(&mut self, value: u16) {
        self.dpt = (self.dpt & 0xFFFF) | ((value as u32) << 16);
    }

    pub fn set_dpt_low(&mut self, value: u16) {
        self.dpt = (self.dpt & 0xFFFF_0000) | (value & 0xFFFE) as u32;
    }

    pub fn set_dmod(&mut self, value: u16) {
        self.dmod = (value & 0xFFFE) as i16;
    }

    pub fn dpt(&self) -> u32 {
        self.dpt
    }

    /// A `BLTSIZE` write.
    pub fn start(&mut self, size: u16) {
        if self.job.is_some() {
            warn!("BLTSIZE written while the blitter is busy");
        }

        let size = BltSize(size);
        if self.con0.use_a() || self.con0.use_b() || self.con0.use_c() {
            warn!("blitter source channels are not simulated, reading zeros");
        }
        let word = if self.con0.minterm() & 1 != 0 { 0xFFFF } else { 0 };

        debug!(
            "blit {}x{} words to {:08x}, con0={:?}",
            size.words(),
            size.lines(),
            self.dpt,
            self.con0
        );

        self.zero = true;
        self.job = Some(Job {
            addr: self.dpt,
            lines_left: size.lines(),
            words: size.words(),
            col: 0,
            word,
            write: self.con0.use_d(),
            clock: CCKS_PER_WORD,
        });
    }

    #[inline]
    pub fn busy(&self) -> bool {
        self.job.is_some()
    }

    /// Every word of the last blit was zero.
    #[inline]
    pub fn zero(&self) -> bool {
        self.zero
    }

    /// One color clock. True on the clock the blit finishes.
    pub fn cycle(&mut self, ram: &ChipRam) -> bool {
        let Some(job) = self.job.as_mut() else {
            return false;
        };

        job.clock -= 1;
        if job.clock > 0 {
            return false;
        }
        job.clock = CCKS_PER_WORD;

        if job.write {
            ram.write_word(job.addr, job.word);
        }
        self.zero &= job.word == 0;
        job.addr += 2;
        job.col += 1;

        if job.col < job.words {
            return false;
        }
        job.col = 0;
        job.addr = job.addr.wrapping_add_signed(self.dmod as i32);
        job.lines_left -= 1;
        if job.lines_left > 0 {
            return false;
        }

        self.dpt = job.addr;
        self.job = None;
        true
    }
}
