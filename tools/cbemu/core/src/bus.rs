//! # Custom Chip Bus
//!
//! The register file at `$DFF000` and everything clocked by the beam: the
//! copper, the blitter and the raster capture. CIA-A hangs off here too since
//! it is read through the same [`Chipset`] seam.
//!
//! Every access costs time. A register access advances the beam by
//! [`ACCESS_CCKS`], a CIA access by [`CIA_ACCESS_CCKS`], so a spin loop over
//! `VHPOSR` or `DMACONR` sees the machine move.
//!
//! | Register           | Read                           | Write                       |
//! |--------------------|--------------------------------|-----------------------------|
//! | `DMACON(R)`        | enables, `BBUSY`, `BZERO`      | set/clear, mask `$07FF`     |
//! | `INTENA(R)`        | enables                        | set/clear, mask `$7FFF`     |
//! | `INTREQ(R)`        | pending requests               | set/clear, mask `$7FFF`     |
//! | `ADKCON(R)`        | value                          | set/clear, mask `$7FFF`     |
//! | `VPOSR`/`VHPOSR`   | beam position                  | ignored                     |
//! | `COPxLC`/`COPJMPx` |                                | copper location / restart   |
//! | `BLT*`             |                                | blitter setup, `BLTSIZE` starts |
//! | `COLORxx`          |                                | palette                     |
//!
//! Anything else is latched and otherwise ignored.

use alloc::vec::Vec;

use copperbars::chipset::Chipset;
use copperbars::custom::{reg, Beam, DmaFlags, IntFlags, Rgb4, NUM_COLOR_REGS, SETCLR};
use log::trace;

use crate::beam::{BeamCounter, BeamEvent};
use crate::blitter::Blitter;
use crate::chip_ram::ChipRam;
use crate::cia::CiaA;
use crate::copper::Copper;
use crate::raster::{CapturedFrame, Raster, SAMPLE_HPOS};

/// Color clocks per CPU access to a custom register.
pub const ACCESS_CCKS: u32 = 2;

/// CIA accesses are synchronized to the slow E clock.
pub const CIA_ACCESS_CCKS: u32 = 10;

/// Chip RAM pointers ignore bit 0 and anything above 2M.
pub const CHIP_ADDR_MASK: u32 = 0x001F_FFFE;

/// Apply a `SETCLR` style write.
#[inline]
pub fn set_clr(current: u16, value: u16, mask: u16) -> u16 {
    if value & SETCLR != 0 {
        current | (value & mask)
    } else {
        current & !(value & mask)
    }
}

pub struct CustomBus {
    beam: BeamCounter,
    copper: Copper,
    blitter: Blitter,
    cia: CiaA,
    ram: ChipRam,

    dmacon: u16,
    intena: u16,
    intreq: u16,
    adkcon: u16,
    cop1lc: u32,
    cop2lc: u32,
    colors: [Rgb4; NUM_COLOR_REGS],
    latches: [u16; (reg::END / 2) as usize],

    raster: Raster,
    last_raster: Raster,
    capture_every: Option<u64>,
    captures: Vec<CapturedFrame>,
    handler_frames: u32,
}

impl CustomBus {
    pub fn new(ram: ChipRam) -> Self {
        Self {
            beam: BeamCounter::default(),
            copper: Copper::default(),
            blitter: Blitter::default(),
            cia: CiaA::default(),
            ram,
            dmacon: 0,
            intena: 0,
            intreq: 0,
            adkcon: 0,
            cop1lc: 0,
            cop2lc: 0,
            colors: [Rgb4::BLACK; NUM_COLOR_REGS],
            latches: [0; (reg::END / 2) as usize],
            raster: Raster::default(),
            last_raster: Raster::default(),
            capture_every: None,
            captures: Vec::new(),
            handler_frames: 0,
        }
    }

    /// Advance the machine by `ccks` color clocks.
    pub fn tick(&mut self, ccks: u32) {
        for _ in 0..ccks {
            self.cycle();
        }
    }

    fn cycle(&mut self) {
        if self.beam.advance() == BeamEvent::NewFrame {
            self.vertical_blank();
        }

        if self.dma_enabled(DmaFlags::COPPER) {
            if let Some((reg, value)) = self.copper.cycle(self.beam.position(), &self.ram) {
                self.poke(reg, value);
            }
        }

        if self.blitter.cycle(&self.ram) {
            self.intreq |= IntFlags::BLIT.bits();
        }

        if self.beam.hpos() == SAMPLE_HPOS {
            self.raster.record(self.beam.line(), self.colors[0]);
        }
    }

    fn vertical_blank(&mut self) {
        let finished = self.beam.frame() - 1;
        if let Some(every) = self.capture_every {
            if finished % every == 0 {
                self.captures.push(CapturedFrame {
                    frame: finished,
                    handler_frames: self.handler_frames,
                    raster: self.raster.clone(),
                });
            }
        }
        core::mem::swap(&mut self.last_raster, &mut self.raster);

        self.intreq |= IntFlags::VERTB.bits();
        self.copper.jump(self.cop1lc);
        trace!("vertical blank, frame {}", self.beam.frame());
    }

    #[inline]
    fn dma_enabled(&self, channel: DmaFlags) -> bool {
        DmaFlags::from_bits_retain(self.dmacon).contains(DmaFlags::MASTER | channel)
    }

    /// A register read with no time cost.
    pub fn peek(&self, offset: u16) -> u16 {
        match offset {
            reg::DMACONR => {
                let mut dma = DmaFlags::from_bits_retain(self.dmacon);
                dma.set(DmaFlags::BBUSY, self.blitter.busy());
                dma.set(DmaFlags::BZERO, self.blitter.zero());
                dma.bits()
            }
            reg::VPOSR => self.beam.vposr(),
            reg::VHPOSR => self.beam.vhposr(),
            reg::ADKCONR => self.adkcon,
            reg::INTENAR => self.intena,
            reg::INTREQR => self.intreq,
            _ => {
                trace!("read of write-only register {offset:03x}");
                0
            }
        }
    }

    /// A register write with no time cost. The copper writes through here.
    pub fn poke(&mut self, offset: u16, value: u16) {
        let offset = offset & 0x01FE;
        if offset >= reg::END {
            return;
        }
        self.latches[(offset >> 1) as usize] = value;

        match offset {
            reg::DMACON => self.dmacon = set_clr(self.dmacon, value, DmaFlags::ALL.bits()),
            reg::INTENA => self.intena = set_clr(self.intena, value, IntFlags::ALL.bits()),
            reg::INTREQ => self.intreq = set_clr(self.intreq, value, IntFlags::ALL.bits()),
            reg::ADKCON => self.adkcon = set_clr(self.adkcon, value, 0x7FFF),

            reg::COP1LCH => self.cop1lc = high(self.cop1lc, value),
            reg::COP1LCL => self.cop1lc = low(self.cop1lc, value),
            reg::COP2LCH => self.cop2lc = high(self.cop2lc, value),
            reg::COP2LCL => self.cop2lc = low(self.cop2lc, value),
            reg::COPJMP1 => self.copper.jump(self.cop1lc),
            reg::COPJMP2 => self.copper.jump(self.cop2lc),

            reg::BLTCON0 => self.blitter.set_con0(value),
            reg::BLTCON1 => self.blitter.set_con1(value),
            reg::BLTAFWM => self.blitter.set_masks(Some(value), None),
            reg::BLTALWM => self.blitter.set_masks(None, Some(value)),
            reg::BLTDPTH => self.blitter.set_dpt_high(value),
            reg::BLTDPTL => self.blitter.set_dpt_low(value),
            reg::BLTDMOD => self.blitter.set_dmod(value),
            reg::BLTSIZE => self.blitter.start(value),

            r if (reg::COLOR..reg::color(NUM_COLOR_REGS)).contains(&r) => {
                self.colors[((r - reg::COLOR) >> 1) as usize] = Rgb4(value & 0x0FFF);
            }
            _ => {}
        }
    }

    /// Level 3 requests the CPU would take right now.
    pub fn pending_level3(&self) -> IntFlags {
        let intena = IntFlags::from_bits_retain(self.intena);
        if !intena.contains(IntFlags::INTEN) {
            return IntFlags::empty();
        }
        IntFlags::from_bits_retain(self.intreq) & intena & IntFlags::LEVEL3
    }

    pub fn note_handler_frame(&mut self) {
        self.handler_frames = self.handler_frames.wrapping_add(1);
    }

    pub fn handler_frames(&self) -> u32 {
        self.handler_frames
    }

    /// Keep every `every`-th finished frame's raster.
    pub fn capture_every(&mut self, every: u64) {
        self.capture_every = (every > 0).then_some(every);
    }

    pub fn take_captures(&mut self) -> Vec<CapturedFrame> {
        core::mem::take(&mut self.captures)
    }

    pub fn captures(&self) -> &[CapturedFrame] {
        &self.captures
    }

    /// The raster of the last finished frame.
    pub fn last_raster(&self) -> &Raster {
        &self.last_raster
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.beam.frame()
    }

    #[inline]
    pub fn position(&self) -> Beam {
        self.beam.position()
    }

    pub fn ccks(&self) -> u64 {
        self.beam.ccks()
    }

    pub fn color(&self, n: usize) -> Rgb4 {
        self.colors[n]
    }

    pub fn cop1lc(&self) -> u32 {
        self.cop1lc
    }

    pub fn cop2lc(&self) -> u32 {
        self.cop2lc
    }

    /// Last value written to `offset`, whatever the register does.
    pub fn latched(&self, offset: u16) -> u16 {
        self.latches[((offset & 0x01FE) >> 1) as usize]
    }

    pub fn copper(&self) -> &Copper {
        &self.copper
    }

    pub fn cia_mut(&mut self) -> &mut CiaA {
        &mut self.cia
    }

    pub fn ram(&self) -> &ChipRam {
        &self.ram
    }
}

#[inline]
fn high(ptr: u32, value: u16) -> u32 {
    ((ptr & 0xFFFF) | ((value as u32) << 16)) & CHIP_ADDR_MASK
}

#[inline]
fn low(ptr: u32, value: u16) -> u32 {
    ((ptr & 0xFFFF_0000) | value as u32) & CHIP_ADDR_MASK
}

impl Chipset for CustomBus {
    fn read(&mut self, offset: u16) -> u16 {
        self.tick(ACCESS_CCKS);
        self.peek(offset)
    }

    fn write(&mut self, offset: u16, value: u16) {
        self.tick(ACCESS_CCKS);
        self.poke(offset, value);
    }

    fn ciaa_pra(&mut self) -> u8 {
        self.tick(CIA_ACCESS_CCKS);
        self.cia.pra(self.beam.frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copperbars::config::{CCKS_PER_LINE, LINES_PER_FRAME};
    use copperbars::copper::{ProgramMemory, Writer};

    use crate::chip_ram::{ChipAllocator, ChipBuffer};

    const FRAME_CCKS: u32 = LINES_PER_FRAME as u32 * CCKS_PER_LINE as u32;

    fn bus() -> CustomBus {
        CustomBus::new(ChipRam::new(0x4000))
    }

    #[test]
    fn set_clr_semantics() {
        assert_eq!(set_clr(0x0010, 0x8003, 0x7FFF), 0x0013);
        assert_eq!(set_clr(0x0013, 0x0001, 0x7FFF), 0x0012);
        assert_eq!(set_clr(0x7FFF, 0x7FFF, 0x7FFF), 0);
        // BBUSY can't be written
        assert_eq!(set_clr(0, 0xC000, DmaFlags::ALL.bits()), 0);
    }

    #[test]
    fn dmaconr_reports_the_blitter() {
        let mut bus = bus();
        bus.write(reg::DMACON, 0x8240);
        bus.write(reg::BLTCON0, 0x0100);
        bus.write_ptr(reg::BLTDPTH, 0x2000);
        bus.write(reg::BLTSIZE, (1 << 6) | 4);
        let dma = bus.dma();
        assert!(dma.contains(DmaFlags::BBUSY | DmaFlags::MASTER | DmaFlags::BLITTER));

        bus.wait_blitter();
        let dma = bus.dma();
        assert!(!dma.contains(DmaFlags::BBUSY));
        assert!(dma.contains(DmaFlags::BZERO));
        assert!(bus.intreq().contains(IntFlags::BLIT));
    }

    #[test]
    fn vertical_blank_raises_vertb_once_per_frame() {
        let mut bus = bus();
        let vertb = |bus: &CustomBus| bus.peek(reg::INTREQR) & IntFlags::VERTB.bits() != 0;
        bus.tick(FRAME_CCKS - 1);
        assert!(!vertb(&bus));
        bus.tick(1);
        assert_eq!(bus.position(), Beam { line: 0, hpos: 0 });
        assert!(vertb(&bus));
        bus.ack(IntFlags::VERTB);
        assert!(!vertb(&bus));
    }

    #[test]
    fn level3_needs_the_master_enable() {
        let mut bus = bus();
        bus.poke(reg::INTREQ, 0x8020);
        bus.poke(reg::INTENA, 0x8020);
        assert!(bus.pending_level3().is_empty());
        bus.poke(reg::INTENA, 0xC000);
        assert_eq!(bus.pending_level3(), IntFlags::VERTB);
    }

    #[test]
    fn wait_vbl_lands_on_the_last_line() {
        let mut bus = bus();
        bus.wait_vbl();
        assert_eq!(bus.position().line, LINES_PER_FRAME - 1);
        let frame = bus.frame();
        bus.wait_vbl();
        assert_eq!(bus.frame(), frame + 1);
    }

    #[test]
    fn copper_paints_the_raster_from_cop1lc() {
        let mut bus = bus();
        let mut alloc = ChipAllocator::new(bus.ram().bytes());
        let block = alloc.alloc(bus.ram(), 64).unwrap();
        let mut program = ChipBuffer::new(bus.ram().clone(), block);

        let mut w = Writer::at(&mut program, 0);
        w.mov(reg::COLOR, 0x0000);
        w.wait(100, 0x10);
        w.mov(reg::COLOR, 0x0F80);
        w.wait(104, 0x10);
        w.mov(reg::COLOR, 0x0000);
        w.end();

        bus.write_ptr(reg::COP1LCH, program.address());
        bus.write(reg::DMACON, 0x8280);

        bus.tick(2 * FRAME_CCKS);
        let raster = bus.last_raster();
        assert_eq!(raster.line(99), Rgb4::BLACK);
        for line in 100..104 {
            assert_eq!(raster.line(line), Rgb4(0x0F80));
        }
        assert_eq!(raster.line(104), Rgb4::BLACK);
    }

    #[test]
    fn captures_every_nth_frame() {
        let mut bus = bus();
        bus.capture_every(2);
        bus.tick(5 * FRAME_CCKS);
        let frames: Vec<u64> = bus.captures().iter().map(|c| c.frame).collect();
        assert_eq!(frames, vec![0, 2, 4]);
    }
}
