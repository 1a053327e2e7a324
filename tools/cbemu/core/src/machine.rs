//! # The Simulated Amiga
//!
//! [`Amiga`] is a 512K OCS machine with a minimal operating system: the
//! custom chip bus, chip RAM, exec/graphics bookkeeping and a CPU vector table
//! holding the level 3 autovector. It implements both
//! [`Chipset`] and [`Platform`], so the demo runs on it unchanged.
//!
//! ## Interrupts
//!
//! There is no 68000. The "CPU" is whoever calls into the [`Chipset`]; a
//! pending level 3 interrupt is taken after the next register access, the way
//! the real CPU takes it between instructions. The vector at `VBR + $6C`
//! decides who runs:
//!
//! | Vector                   | Runs                                             |
//! |--------------------------|--------------------------------------------------|
//! | [`FRAME_HANDLER_ENTRY`]  | the installed [`FrameHandler`]                   |
//! | anything else            | the system handler, which acknowledges and counts|
//!
//! Whatever a handler leaves pending is acknowledged afterwards, so a
//! misbehaving handler can't wedge the simulation.
//!
//! ## Boot state
//!
//! | Register  | Value   | Meaning                                              |
//! |-----------|---------|------------------------------------------------------|
//! | `DMACON`  | `$03F0` | master, bitplanes, copper, blitter, sprites, disk    |
//! | `INTENA`  | `$602C` | master, external, vertical blank, ports, software    |
//! | `ADKCON`  | `$1100` | disk MFM settings                                    |
//! | `COP1LC`  | `$0400` | system `copinit`, paints `COLOR00` Workbench blue    |
//! | `COP2LC`  | `$0480` | system `LOFlist`                                     |

use alloc::vec::Vec;

use copperbars::chipset::{
    ChipBlock, Chipset, IrqVector, Platform, ViewHandle, LEVEL3_VECTOR_OFFSET,
};
use copperbars::config::CCKS_PER_LINE;
use copperbars::copper::Writer;
use copperbars::custom::{reg, DmaFlags, IntFlags, Rgb4, SETCLR};
use copperbars::error::Error;
use copperbars::frame::FrameHandler;
use heapless::FnvIndexMap;
use log::{debug, info, warn};

use crate::bus::{CustomBus, ACCESS_CCKS};
use crate::chip_ram::{ChipAllocator, ChipBuffer, ChipRam, CHIP_RAM_BYTES};
use crate::exec::Exec;
use crate::raster::CapturedFrame;

/// Where the OS level 3 server chain lives, in ROM.
pub const SYSTEM_LEVEL3: IrqVector = IrqVector(0x00FC_0C5A);

/// The entry point handed out for an installed frame handler.
pub const FRAME_HANDLER_ENTRY: IrqVector = IrqVector(0x0000_0F00);

pub const COPINIT: u32 = 0x0400;
pub const LOF_LIST: u32 = 0x0480;

pub const SYSTEM_BACKGROUND: Rgb4 = Rgb4(0x005A);
pub const SYSTEM_DMACON: u16 = 0x03F0;
pub const SYSTEM_INTENA: u16 = 0x602C;
pub const SYSTEM_ADKCON: u16 = 0x1100;

/// Color clocks charged for a library call.
pub const OS_CALL_CCKS: u32 = 20;

pub const MAX_VECTORS: usize = 8;

/// Everything the takeover promises to put back, read without costing time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SystemSnapshot {
    pub intena: u16,
    /// Enable bits only; `BBUSY` and `BZERO` are not state the takeover owns.
    pub dmacon: u16,
    pub adkcon: u16,
    pub cop1lc: u32,
    pub cop2lc: u32,
    pub level3: Option<IrqVector>,
    pub view: Option<ViewHandle>,
    pub forbid_nest: i32,
    pub disable_nest: i32,
    pub blitter_owned: bool,
}

pub struct Amiga {
    bus: CustomBus,
    exec: Exec,
    chip: ChipAllocator,
    vbr: usize,
    vectors: FnvIndexMap<usize, IrqVector, MAX_VECTORS>,
    handler: Option<FrameHandler<ChipBuffer>>,
    system_interrupts: u32,
}

impl Default for Amiga {
    fn default() -> Self {
        Self::new()
    }
}

impl Amiga {
    pub fn new() -> Self {
        Self::with_chip_ram(CHIP_RAM_BYTES)
    }

    pub fn with_chip_ram(bytes: usize) -> Self {
        let ram = ChipRam::new(bytes);
        let mut amiga = Self {
            chip: ChipAllocator::new(ram.bytes()),
            bus: CustomBus::new(ram),
            exec: Exec::default(),
            vbr: 0,
            vectors: FnvIndexMap::new(),
            handler: None,
            system_interrupts: 0,
        };
        amiga.boot();
        amiga
    }

    fn boot(&mut self) {
        let ram = self.bus.ram().clone();

        let mut copinit = ChipBuffer::new(ram.clone(), ChipBlock { addr: COPINIT, bytes: 8 });
        let mut w = Writer::at(&mut copinit, 0);
        w.mov(reg::color(0), SYSTEM_BACKGROUND.bits());
        w.end();

        let mut lof = ChipBuffer::new(ram, ChipBlock { addr: LOF_LIST, bytes: 8 });
        let mut w = Writer::at(&mut lof, 0);
        w.mov(reg::color(1), 0x0FFF);
        w.end();

        self.bus.poke(reg::COP1LCH, (COPINIT >> 16) as u16);
        self.bus.poke(reg::COP1LCL, COPINIT as u16);
        self.bus.poke(reg::COP2LCH, (LOF_LIST >> 16) as u16);
        self.bus.poke(reg::COP2LCL, LOF_LIST as u16);
        self.bus.poke(reg::DMACON, SETCLR | SYSTEM_DMACON);
        self.bus.poke(reg::INTENA, SETCLR | SYSTEM_INTENA);
        self.bus.poke(reg::ADKCON, SETCLR | SYSTEM_ADKCON);

        self.install_vector(self.vbr, SYSTEM_LEVEL3);
        info!("booted with {}K chip ram", self.bus.ram().bytes() / 1024);
    }

    /// A 68010 or later with the vector table moved to `vbr`.
    pub fn with_vector_base(mut self, vbr: usize) -> Self {
        let level3 = self.read_vector(self.vbr).unwrap_or(SYSTEM_LEVEL3);
        self.vectors.clear();
        self.vbr = vbr;
        self.install_vector(vbr, level3);
        self
    }

    /// A machine where `graphics.library` cannot be opened.
    pub fn without_graphics(mut self) -> Self {
        self.exec.remove_graphics();
        self
    }

    /// Press the left mouse button at the start of `frame`.
    pub fn click_at(&mut self, frame: u64) -> bool {
        self.bus.cia_mut().click_at(frame)
    }

    pub fn capture_every(&mut self, every: u64) {
        self.bus.capture_every(every);
    }

    pub fn take_captures(&mut self) -> Vec<CapturedFrame> {
        self.bus.take_captures()
    }

    /// Let the system run on its own for `frames` frames.
    pub fn run_frames(&mut self, frames: u32) {
        for _ in 0..frames {
            self.next_frame();
        }
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            intena: self.bus.peek(reg::INTENAR),
            dmacon: self.bus.peek(reg::DMACONR) & DmaFlags::ALL.bits(),
            adkcon: self.bus.peek(reg::ADKCONR),
            cop1lc: self.bus.cop1lc(),
            cop2lc: self.bus.cop2lc(),
            level3: self.read_vector(self.vbr),
            view: self.exec.view(),
            forbid_nest: self.exec.forbid_nest(),
            disable_nest: self.exec.disable_nest(),
            blitter_owned: self.exec.blitter_owned(),
        }
    }

    pub fn bus(&self) -> &CustomBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut CustomBus {
        &mut self.bus
    }

    pub fn exec(&self) -> &Exec {
        &self.exec
    }

    pub fn chip(&self) -> &ChipAllocator {
        &self.chip
    }

    pub fn frame_handler(&self) -> Option<&FrameHandler<ChipBuffer>> {
        self.handler.as_ref()
    }

    /// Level 3 interrupts the system handler took.
    pub fn system_interrupts(&self) -> u32 {
        self.system_interrupts
    }

    fn read_vector(&self, vbr: usize) -> Option<IrqVector> {
        self.vectors.get(&(vbr + LEVEL3_VECTOR_OFFSET)).copied()
    }

    fn install_vector(&mut self, vbr: usize, vector: IrqVector) {
        if self.vectors.insert(vbr + LEVEL3_VECTOR_OFFSET, vector).is_err() {
            warn!("vector table full, {:08x} dropped", vbr + LEVEL3_VECTOR_OFFSET);
        }
    }

    fn next_frame(&mut self) {
        let frame = self.bus.frame();
        while self.bus.frame() == frame {
            self.bus.tick(CCKS_PER_LINE as u32);
            self.service_interrupts();
        }
    }

    /// Take a pending level 3 interrupt, if the CPU would.
    fn service_interrupts(&mut self) {
        let pending = self.bus.pending_level3();
        if pending.is_empty() {
            return;
        }

        let vector = self.read_vector(self.vbr);
        if vector == Some(FRAME_HANDLER_ENTRY) {
            match self.handler.as_mut() {
                Some(handler) if pending.contains(IntFlags::VERTB) => {
                    handler.on_vertical_blank(&mut self.bus);
                    self.bus.note_handler_frame();
                }
                Some(_) => {}
                None => warn!("level 3 vector points at a frame handler that is not installed"),
            }
        } else {
            self.system_interrupts += 1;
        }

        let left = self.bus.pending_level3();
        if !left.is_empty() {
            if vector == Some(FRAME_HANDLER_ENTRY) {
                warn!("level 3 handler left {:04x} pending", left.bits());
            }
            self.bus.poke(reg::INTREQ, left.bits());
        }
    }

    fn os_call(&mut self) {
        self.bus.tick(OS_CALL_CCKS);
        self.service_interrupts();
    }
}

impl Chipset for Amiga {
    fn read(&mut self, offset: u16) -> u16 {
        self.bus.tick(ACCESS_CCKS);
        self.service_interrupts();
        self.bus.peek(offset)
    }

    fn write(&mut self, offset: u16, value: u16) {
        self.bus.tick(ACCESS_CCKS);
        self.bus.poke(offset, value);
        self.service_interrupts();
    }

    fn ciaa_pra(&mut self) -> u8 {
        let pra = self.bus.ciaa_pra();
        self.service_interrupts();
        pra
    }
}

impl Platform for Amiga {
    type Program = ChipBuffer;

    fn open_libraries(&mut self) -> Result<(), Error> {
        self.os_call();
        self.exec.open_graphics()
    }

    fn close_libraries(&mut self) {
        self.os_call();
        self.exec.close_graphics();
    }

    fn forbid(&mut self) {
        self.exec.forbid();
        self.os_call();
    }

    fn permit(&mut self) {
        self.exec.permit();
        self.os_call();
    }

    fn disable(&mut self) {
        if self.exec.disable() {
            self.bus.poke(reg::INTENA, IntFlags::INTEN.bits());
        }
        self.os_call();
    }

    fn enable(&mut self) {
        if self.exec.enable() {
            self.bus.poke(reg::INTENA, (IntFlags::SETCLR | IntFlags::INTEN).bits());
        }
        self.os_call();
    }

    fn active_view(&mut self) -> Option<ViewHandle> {
        self.exec.view()
    }

    fn load_view(&mut self, view: Option<ViewHandle>) {
        debug!("LoadView({view:?})");
        self.exec.load_view(view);
        self.os_call();
    }

    fn wait_tof(&mut self) {
        self.next_frame();
    }

    fn own_blitter(&mut self) {
        self.exec.own_blitter();
        self.os_call();
    }

    fn disown_blitter(&mut self) {
        self.exec.disown_blitter();
        self.os_call();
    }

    fn wait_blit(&mut self) {
        self.wait_blitter();
    }

    fn system_copper_lists(&mut self) -> (u32, u32) {
        (COPINIT, LOF_LIST)
    }

    fn vector_base(&mut self) -> usize {
        self.vbr
    }

    fn level3_vector(&mut self, vbr: usize) -> IrqVector {
        self.read_vector(vbr).unwrap_or(IrqVector(0))
    }

    fn set_level3_vector(&mut self, vbr: usize, vector: IrqVector) {
        debug!("level 3 vector at {:08x} = {:08x}", vbr + LEVEL3_VECTOR_OFFSET, vector.0);
        self.install_vector(vbr, vector);
    }

    fn alloc_chip(&mut self, bytes: usize) -> Option<ChipBlock> {
        self.chip.alloc(self.bus.ram(), bytes)
    }

    fn free_chip(&mut self, block: ChipBlock) {
        self.chip.free(block);
    }

    fn program_memory(&mut self, block: ChipBlock) -> ChipBuffer {
        ChipBuffer::new(self.bus.ram().clone(), block)
    }

    fn install_frame_handler(&mut self, handler: FrameHandler<ChipBuffer>) -> IrqVector {
        if self.handler.replace(handler).is_some() {
            warn!("frame handler replaced while installed");
        }
        FRAME_HANDLER_ENTRY
    }

    fn remove_frame_handler(&mut self) -> Option<FrameHandler<ChipBuffer>> {
        self.handler.take()
    }
}
