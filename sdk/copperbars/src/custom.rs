//! # Custom Chip Registers
//!
//! Offsets and flag types for the OCS custom chips (Agnus, Denise, Paula),
//! mapped at `$DFF000`.
//!
//! ## DMA control (`DMACON`, `$096`)
//!
//! | Flag       | Channel                                   |
//! |------------|-------------------------------------------|
//! | `AUD0-3`   | Audio channels                            |
//! | `DISK`     | Floppy                                    |
//! | `SPRITE`   | Sprites                                   |
//! | `BLITTER`  | Blitter                                   |
//! | `COPPER`   | Copper                                    |
//! | `RASTER`   | Bitplanes                                 |
//! | `MASTER`   | Nothing runs unless this is set           |
//!
//! ## Interrupts (`INTENA` `$09A`, `INTREQ` `$09C`)
//!
//! The vertical blank interrupt (`VERTB`) arrives on CPU level 3 together with
//! the copper and blitter interrupts. `INTEN` is the master enable.
//!
//! ## Set/clear writes
//!
//! `DMACON`, `INTENA`, `INTREQ` and `ADKCON` are written with bit 15 (`SETCLR`)
//! selecting whether the other set bits are set or cleared. Writing `0x7FFF`
//! clears everything.

use bit_field::BitField;

/// Register offsets from `$DFF000`.
pub mod reg {
    pub const BLTDDAT: u16 = 0x000;
    pub const DMACONR: u16 = 0x002;
    pub const VPOSR: u16 = 0x004;
    pub const VHPOSR: u16 = 0x006;
    pub const ADKCONR: u16 = 0x010;
    pub const INTENAR: u16 = 0x01C;
    pub const INTREQR: u16 = 0x01E;
    pub const COPCON: u16 = 0x02E;

    pub const BLTCON0: u16 = 0x040;
    pub const BLTCON1: u16 = 0x042;
    pub const BLTAFWM: u16 = 0x044;
    pub const BLTALWM: u16 = 0x046;
    pub const BLTDPTH: u16 = 0x054;
    pub const BLTDPTL: u16 = 0x056;
    pub const BLTSIZE: u16 = 0x058;
    pub const BLTDMOD: u16 = 0x066;

    pub const COP1LCH: u16 = 0x080;
    pub const COP1LCL: u16 = 0x082;
    pub const COP2LCH: u16 = 0x084;
    pub const COP2LCL: u16 = 0x086;
    pub const COPJMP1: u16 = 0x088;
    pub const COPJMP2: u16 = 0x08A;

    pub const DIWSTRT: u16 = 0x08E;
    pub const DIWSTOP: u16 = 0x090;
    pub const DDFSTRT: u16 = 0x092;
    pub const DDFSTOP: u16 = 0x094;
    pub const DMACON: u16 = 0x096;
    pub const INTENA: u16 = 0x09A;
    pub const INTREQ: u16 = 0x09C;
    pub const ADKCON: u16 = 0x09E;

    /// `BPL1PTH`; plane `n` is at `BPLPT + n * 4`.
    pub const BPLPT: u16 = 0x0E0;
    pub const BPLCON0: u16 = 0x100;
    pub const BPLCON1: u16 = 0x102;
    pub const BPLCON2: u16 = 0x104;
    pub const BPL1MOD: u16 = 0x108;
    pub const BPL2MOD: u16 = 0x10A;

    /// `COLOR00`; color `n` is at `COLOR + n * 2`.
    pub const COLOR: u16 = 0x180;

    /// One past the last custom chip register.
    pub const END: u16 = 0x200;

    /// Offset of color register `n`.
    #[inline(always)]
    pub const fn color(n: usize) -> u16 {
        COLOR + (n as u16) * 2
    }

    /// Offset of the high pointer word of bitplane `n`.
    #[inline(always)]
    pub const fn bplpt(n: usize) -> u16 {
        BPLPT + (n as u16) * 4
    }
}

/// Number of color registers on OCS.
pub const NUM_COLOR_REGS: usize = 32;

/// Bit 15 of a set/clear register write.
pub const SETCLR: u16 = 0x8000;

/// Clears every bit of a set/clear register.
pub const CLEAR_ALL: u16 = 0x7FFF;

bitflags::bitflags! {
    /// DMA channel enables, written to `DMACON` and read back from `DMACONR`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct DmaFlags: u16 {
        const SETCLR  = 0x8000;
        /// Blitter busy (read only).
        const BBUSY   = 0x4000;
        /// Blitter logic zero (read only).
        const BZERO   = 0x2000;
        /// Blitter has priority over the CPU.
        const BLITHOG = 0x0400;
        const MASTER  = 0x0200;
        const RASTER  = 0x0100;
        const COPPER  = 0x0080;
        const BLITTER = 0x0040;
        const SPRITE  = 0x0020;
        const DISK    = 0x0010;
        const AUD3    = 0x0008;
        const AUD2    = 0x0004;
        const AUD1    = 0x0002;
        const AUD0    = 0x0001;

        const AUDIO = Self::AUD0.bits() | Self::AUD1.bits() | Self::AUD2.bits() | Self::AUD3.bits();
        /// Every channel that `DMACON` can switch.
        const ALL = 0x07FF;
    }

    /// Interrupt bits shared by `INTENA`/`INTENAR` and `INTREQ`/`INTREQR`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct IntFlags: u16 {
        const SETCLR  = 0x8000;
        /// Master interrupt enable (`INTENA` only).
        const INTEN   = 0x4000;
        const EXTER   = 0x2000;
        const DSKSYN  = 0x1000;
        const RBF     = 0x0800;
        const AUD3    = 0x0400;
        const AUD2    = 0x0200;
        const AUD1    = 0x0100;
        const AUD0    = 0x0080;
        const BLIT    = 0x0040;
        /// Vertical blank. Level 3.
        const VERTB   = 0x0020;
        const COPER   = 0x0010;
        const PORTS   = 0x0008;
        const SOFT    = 0x0004;
        const DSKBLK  = 0x0002;
        const TBE     = 0x0001;

        /// Sources routed to CPU level 3.
        const LEVEL3 = Self::COPER.bits() | Self::VERTB.bits() | Self::BLIT.bits();
        const ALL = 0x7FFF;
    }
}

/// Beam counter position, decoded from the long read at `VPOSR`.
///
/// `VPOSR` holds V8 in bit 0 and the long-frame flag in bit 15;
/// `VHPOSR` holds V7-V0 in its high byte and H8-H1 in its low byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Beam {
    pub line: u16,
    pub hpos: u16,
}

impl Beam {
    /// Decode the 32-bit `VPOSR:VHPOSR` pair.
    #[inline]
    pub fn from_vposr(vposr: u32) -> Self {
        Self {
            line: vposr.get_bits(8..17) as u16,
            hpos: vposr.get_bits(0..8) as u16,
        }
    }

    /// Encode as the 32-bit `VPOSR:VHPOSR` pair.
    #[inline]
    pub fn to_vposr(self) -> u32 {
        let mut v = 0u32;
        v.set_bits(8..17, self.line as u32);
        v.set_bits(0..8, (self.hpos & 0xFF) as u32);
        v
    }
}

/// A 12-bit `0x0RGB` color as written to the color registers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rgb4(pub u16);

impl Rgb4 {
    pub const BLACK: Rgb4 = Rgb4(0x000);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb4((((r & 0xF) as u16) << 8) | (((g & 0xF) as u16) << 4) | ((b & 0xF) as u16))
    }

    #[inline]
    pub fn r(self) -> u8 {
        self.0.get_bits(8..12) as u8
    }

    #[inline]
    pub fn g(self) -> u8 {
        self.0.get_bits(4..8) as u8
    }

    #[inline]
    pub fn b(self) -> u8 {
        self.0.get_bits(0..4) as u8
    }

    /// Expand to 8 bits per channel (`0xF` becomes `0xFF`).
    #[inline]
    pub fn to_rgb888(self) -> (u8, u8, u8) {
        (self.r() * 17, self.g() * 17, self.b() * 17)
    }

    #[inline]
    pub fn bits(self) -> u16 {
        self.0 & 0x0FFF
    }
}
