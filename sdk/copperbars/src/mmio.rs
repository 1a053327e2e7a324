//! # Memory-Mapped Chipset
//!
//! The real register file. Custom chip registers are 16-bit words at
//! `$DFF000 + offset`; the left mouse button is bit 6 of CIA-A port A at
//! `$BFE001`.
//!
//! Only meaningful on the machine itself. Constructing an [`Mmio`] anywhere
//! else and touching it is undefined behavior, which is why [`Mmio::new`] is
//! `unsafe`.

use volatile_register::{RO, RW};

use crate::{
    chipset::Chipset,
    copper::ProgramMemory,
    custom::reg,
};

pub const CUSTOM_BASE: usize = 0xDFF000;
pub const CIAA_PRA: usize = 0xBFE001;

/// `$DFF000-$DFF1FF` as 256 word registers.
///
/// Read-only and write-only registers share the array; reading a write-only
/// register returns bus noise, writing a read-only one does nothing.
#[repr(C)]
pub struct CustomRegs {
    words: [RW<u16>; (reg::END / 2) as usize],
}

impl CustomRegs {
    #[inline(always)]
    fn at(&self, offset: u16) -> &RW<u16> {
        &self.words[(offset >> 1) as usize]
    }
}

pub struct Mmio {
    custom: &'static CustomRegs,
    pra: &'static RO<u8>,
}

impl Mmio {
    /// # Safety
    ///
    /// Only on OCS hardware, and only once the caller has the right to touch
    /// the chipset (see [`takeover`](crate::takeover)).
    pub unsafe fn new() -> Self {
        unsafe {
            Self {
                custom: &*(CUSTOM_BASE as *const CustomRegs),
                pra: &*(CIAA_PRA as *const RO<u8>),
            }
        }
    }
}

impl Chipset for Mmio {
    #[inline(always)]
    fn read(&mut self, reg: u16) -> u16 {
        self.custom.at(reg).read()
    }

    #[inline(always)]
    fn write(&mut self, reg: u16, value: u16) {
        unsafe { self.custom.at(reg).write(value) }
    }

    #[inline(always)]
    fn ciaa_pra(&mut self) -> u8 {
        self.pra.read()
    }
}

/// Copper program words in chip RAM, written with volatile stores so none
/// are elided or reordered past each other while the copper reads them.
pub struct ChipWords {
    ptr: *mut u16,
    len: usize,
}

impl ChipWords {
    /// # Safety
    ///
    /// `ptr` must point to `len` words of chip RAM that nothing else writes
    /// for the lifetime of the value.
    pub unsafe fn from_raw(ptr: *mut u16, len: usize) -> Self {
        Self { ptr, len }
    }

    pub fn as_ptr(&self) -> *mut u16 {
        self.ptr
    }
}

impl ProgramMemory for ChipWords {
    #[inline(always)]
    fn address(&self) -> u32 {
        self.ptr as usize as u32
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    fn read(&self, index: usize) -> u16 {
        assert!(index < self.len);
        unsafe { self.ptr.add(index).read_volatile() }
    }

    #[inline(always)]
    fn write(&mut self, index: usize, word: u16) {
        assert!(index < self.len);
        unsafe { self.ptr.add(index).write_volatile(word) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copper::{instructions, Instruction, Writer};

    #[test]
    fn register_block_covers_the_custom_chips() {
        assert_eq!(core::mem::size_of::<CustomRegs>(), 0x200);
        assert_eq!(core::mem::size_of::<RW<u16>>(), 2);
    }

    #[test]
    fn chip_words_writes_through() {
        let mut backing = [0u16; 8];
        let mut mem = unsafe { ChipWords::from_raw(backing.as_mut_ptr(), backing.len()) };
        let mut w = Writer::at(&mut mem, 0);
        w.mov(reg::COLOR, 0x0F0F);
        w.end();
        assert_eq!(
            instructions(&mem).collect::<Vec<_>>(),
            vec![Instruction::Move { reg: reg::COLOR, value: 0x0F0F }, Instruction::End]
        );
        drop(mem);
        assert_eq!(&backing[..4], &[0x0180, 0x0F0F, 0xFFFF, 0xFFFE]);
    }
}
