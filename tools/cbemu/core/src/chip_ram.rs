//! Chip RAM: the only memory the copper and the blitter can see.
//!
//! The RAM is shared between the bus (copper fetches, blitter writes) and
//! every [`ChipBuffer`] handed out as copper program memory, so it lives
//! behind an `Rc<RefCell<..>>`. Nothing borrows it across a bus cycle.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use copperbars::chipset::ChipBlock;
use copperbars::copper::ProgramMemory;
use log::{trace, warn};

/// 512K, a stock A500.
pub const CHIP_RAM_BYTES: usize = 512 * 1024;

/// Low memory kept for the system: vectors, exec, the system copper lists.
pub const RESERVED_BYTES: usize = 0x1000;

/// `AllocMem` rounds every request up to this.
pub const ALLOC_GRANULE: usize = 8;

pub const MAX_ALLOCATIONS: usize = 16;

#[derive(Clone)]
pub struct ChipRam {
    words: Rc<RefCell<Vec<u16>>>,
}

impl ChipRam {
    pub fn new(bytes: usize) -> Self {
        Self {
            words: Rc::new(RefCell::new(vec![0; bytes / 2])),
        }
    }

    #[inline]
    pub fn bytes(&self) -> usize {
        self.words.borrow().len() * 2
    }

    /// Word at a byte address. Reads past the end return 0.
    #[inline]
    pub fn read_word(&self, addr: u32) -> u16 {
        self.words
            .borrow()
            .get((addr >> 1) as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Word at a byte address. Writes past the end are dropped.
    #[inline]
    pub fn write_word(&self, addr: u32, word: u16) {
        match self.words.borrow_mut().get_mut((addr >> 1) as usize) {
            Some(w) => *w = word,
            None => trace!("chip write past end: {addr:08x}"),
        }
    }

    pub fn fill(&self, addr: u32, bytes: usize, word: u16) {
        let start = (addr >> 1) as usize;
        let mut words = self.words.borrow_mut();
        let end = (start + bytes / 2).min(words.len());
        if start < end {
            words[start..end].fill(word);
        }
    }
}

/// Bump allocator over chip RAM above [`RESERVED_BYTES`].
///
/// Freeing rewinds the top to the end of the highest block still live, so
/// blocks freed in reverse order of allocation are fully reclaimed.
pub struct ChipAllocator {
    base: u32,
    top: u32,
    limit: u32,
    live: heapless::Vec<ChipBlock, MAX_ALLOCATIONS>,
}

impl ChipAllocator {
    pub fn new(ram_bytes: usize) -> Self {
        let base = RESERVED_BYTES.min(ram_bytes) as u32;
        Self {
            base,
            top: base,
            limit: ram_bytes as u32,
            live: heapless::Vec::new(),
        }
    }

    /// `AllocMem(MEMF_CHIP | MEMF_CLEAR)`.
    pub fn alloc(&mut self, ram: &ChipRam, bytes: usize) -> Option<ChipBlock> {
        if bytes == 0 {
            return None;
        }
        let rounded = bytes.div_ceil(ALLOC_GRANULE) * ALLOC_GRANULE;
        let addr = self.top;
        if addr as usize + rounded > self.limit as usize {
            warn!("chip ram exhausted: {bytes} bytes wanted, {} free", self.free_bytes());
            return None;
        }

        let block = ChipBlock { addr, bytes };
        if self.live.push(block).is_err() {
            warn!("too many chip allocations");
            return None;
        }
        self.top += rounded as u32;
        ram.fill(addr, rounded, 0);
        trace!("alloc chip {bytes} bytes at {addr:08x}");
        Some(block)
    }

    pub fn free(&mut self, block: ChipBlock) {
        let Some(idx) = self.live.iter().position(|b| *b == block) else {
            warn!("freeing chip block {:08x} that is not allocated", block.addr);
            return;
        };
        self.live.swap_remove(idx);
        self.top = self
            .live
            .iter()
            .map(|b| b.addr + (b.bytes.div_ceil(ALLOC_GRANULE) * ALLOC_GRANULE) as u32)
            .max()
            .unwrap_or(self.base);
        trace!("free chip {} bytes at {:08x}", block.bytes, block.addr);
    }

    pub fn live(&self) -> &[ChipBlock] {
        &self.live
    }

    pub fn free_bytes(&self) -> usize {
        (self.limit - self.top) as usize
    }
}

/// A chip RAM block seen as copper program words.
#[derive(Clone)]
pub struct ChipBuffer {
    ram: ChipRam,
    addr: u32,
    len: usize,
}

impl ChipBuffer {
    pub fn new(ram: ChipRam, block: ChipBlock) -> Self {
        Self {
            ram,
            addr: block.addr,
            len: block.bytes / 2,
        }
    }
}

impl ProgramMemory for ChipBuffer {
    #[inline]
    fn address(&self) -> u32 {
        self.addr
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn read(&self, index: usize) -> u16 {
        assert!(index < self.len);
        self.ram.read_word(self.addr + 2 * index as u32)
    }

    #[inline]
    fn write(&mut self, index: usize, word: u16) {
        assert!(index < self.len);
        self.ram.write_word(self.addr + 2 * index as u32, word)
    }
}
