//! # Hardware Seams
//!
//! Everything the demo touches outside its own memory goes through two traits:
//!
//! | Trait        | Covers                                                        |
//! |--------------|---------------------------------------------------------------|
//! | [`Chipset`]  | Custom chip registers and the CIA-A port with the left button |
//! | [`Platform`] | exec/graphics services, the CPU vector table, chip memory     |
//!
//! On the machine, [`Mmio`](crate::mmio::Mmio) implements [`Chipset`] over the
//! real register file and the `rom` binary implements [`Platform`] over the
//! library calls. On a host, the `cbemu-core` simulator implements both.
//!
//! All provided waits are tight spin loops over register reads. There is no
//! scheduler to yield to while the system is taken over.

use bit_field::BitField;

use crate::{
    copper::ProgramMemory,
    custom::{reg, Beam, DmaFlags, IntFlags},
    error::Error,
    frame::FrameHandler,
};

/// Bit of CIA-A port A that reads low while the left mouse button is held.
pub const CIAA_PRA_FIR0: usize = 6;

/// Custom chip register access.
pub trait Chipset {
    /// Read a 16-bit register at `reg` bytes from `$DFF000`.
    fn read(&mut self, reg: u16) -> u16;

    /// Write a 16-bit register at `reg` bytes from `$DFF000`.
    fn write(&mut self, reg: u16, value: u16);

    /// Read CIA-A port A (`$BFE001`).
    fn ciaa_pra(&mut self) -> u8;

    /// Write a chip RAM pointer register pair, high word first.
    #[inline]
    fn write_ptr(&mut self, reg: u16, addr: u32) {
        self.write(reg, (addr >> 16) as u16);
        self.write(reg + 2, addr as u16);
    }

    /// The long at `VPOSR`.
    #[inline]
    fn vposr(&mut self) -> u32 {
        let hi = self.read(reg::VPOSR) as u32;
        let lo = self.read(reg::VHPOSR) as u32;
        (hi << 16) | lo
    }

    #[inline]
    fn beam(&mut self) -> Beam {
        Beam::from_vposr(self.vposr())
    }

    /// Spin until the beam is on `line`.
    fn wait_line(&mut self, line: u16) {
        while self.beam().line != line {}
    }

    /// Spin until the beam enters the last line of the frame.
    ///
    /// Leaves the line first, so two calls in a row always span a full frame.
    fn wait_vbl(&mut self) {
        while self.beam().line == crate::config::VBL_LINE {}
        while self.beam().line != crate::config::VBL_LINE {}
    }

    #[inline]
    fn dma(&mut self) -> DmaFlags {
        DmaFlags::from_bits_retain(self.read(reg::DMACONR))
    }

    #[inline]
    fn blitter_busy(&mut self) -> bool {
        self.dma().contains(DmaFlags::BBUSY)
    }

    /// Spin until the blitter is idle.
    fn wait_blitter(&mut self) {
        while self.blitter_busy() {}
    }

    #[inline]
    fn intena(&mut self) -> IntFlags {
        IntFlags::from_bits_retain(self.read(reg::INTENAR))
    }

    #[inline]
    fn intreq(&mut self) -> IntFlags {
        IntFlags::from_bits_retain(self.read(reg::INTREQR))
    }

    /// Clear pending interrupt requests.
    #[inline]
    fn ack(&mut self, irqs: IntFlags) {
        self.write(reg::INTREQ, irqs.difference(IntFlags::SETCLR).bits());
    }

    /// Left mouse button, active low on CIA-A.
    #[inline]
    fn left_button(&mut self) -> bool {
        !self.ciaa_pra().get_bit(CIAA_PRA_FIR0)
    }
}

/// Address of an interrupt handler as stored in the vector table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IrqVector(pub usize);

/// A graphics.library `View`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ViewHandle(pub usize);

/// A block of chip RAM handed out by [`Platform::alloc_chip`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChipBlock {
    pub addr: u32,
    pub bytes: usize,
}

/// Byte offset of the level 3 autovector from the vector base.
pub const LEVEL3_VECTOR_OFFSET: usize = 0x6C;

/// Operating system and CPU services around the chipset.
///
/// The takeover sequence in [`takeover`](crate::takeover) calls these in a
/// fixed order; implementations must not reorder or batch them.
pub trait Platform: Chipset {
    /// Chip RAM the copper reads its program from.
    type Program: ProgramMemory;

    /// Open graphics.library (and whatever else the platform needs).
    fn open_libraries(&mut self) -> Result<(), Error>;
    fn close_libraries(&mut self);

    /// exec `Forbid()`.
    fn forbid(&mut self);
    /// exec `Permit()`.
    fn permit(&mut self);
    /// exec `Disable()`.
    fn disable(&mut self);
    /// exec `Enable()`.
    fn enable(&mut self);

    /// `GfxBase->ActiView`.
    fn active_view(&mut self) -> Option<ViewHandle>;
    /// graphics `LoadView()`.
    fn load_view(&mut self, view: Option<ViewHandle>);
    /// graphics `WaitTOF()`.
    fn wait_tof(&mut self);
    /// graphics `OwnBlitter()`.
    fn own_blitter(&mut self);
    /// graphics `DisownBlitter()`.
    fn disown_blitter(&mut self);
    /// graphics `WaitBlit()`.
    fn wait_blit(&mut self);
    /// `GfxBase->copinit` and `GfxBase->LOFlist`.
    fn system_copper_lists(&mut self) -> (u32, u32);

    /// The 68010+ vector base register, 0 on a 68000.
    fn vector_base(&mut self) -> usize;
    fn level3_vector(&mut self, vbr: usize) -> IrqVector;
    fn set_level3_vector(&mut self, vbr: usize, vector: IrqVector);

    /// `AllocMem(MEMF_CHIP | MEMF_CLEAR)`.
    fn alloc_chip(&mut self, bytes: usize) -> Option<ChipBlock>;
    fn free_chip(&mut self, block: ChipBlock);
    /// Wrap a chip block as copper program memory.
    fn program_memory(&mut self, block: ChipBlock) -> Self::Program;

    /// Park `handler` where the level 3 entry point can reach it and return
    /// that entry point. The vector table itself is left alone.
    fn install_frame_handler(&mut self, handler: FrameHandler<Self::Program>) -> IrqVector;

    /// Take the handler back. Only call with the level 3 vector pointing
    /// elsewhere or interrupts disabled.
    fn remove_frame_handler(&mut self) -> Option<FrameHandler<Self::Program>>;
}
