//! # Copper Instructions
//!
//! Every copper instruction is two 16-bit words.
//!
//! | Form   | First word                 | Second word                   |
//! |--------|----------------------------|-------------------------------|
//! | `MOVE` | register offset, bit 0 = 0 | value                         |
//! | `WAIT` | `VP << 8 \| HP`, bit 0 = 1 | compare mask, bit 0 = 0       |
//! | `SKIP` | `VP << 8 \| HP`, bit 0 = 1 | compare mask, bit 0 = 1       |
//!
//! The program ends with a WAIT for a position the beam never reaches,
//! `$FFFF,$FFFE`. The copper restarts from `COP1LC` at the next vertical blank.

use bit_field::BitField;

/// Compare mask of a WAIT that checks every VP and HP bit and ignores the
/// blitter-finished flag.
pub const WAIT_MASK: u16 = 0xFFFE;

/// End-of-program sentinel pair.
pub const END: (u16, u16) = (0xFFFF, 0xFFFE);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Write `value` to the custom register at `reg`.
    Move { reg: u16, value: u16 },
    /// Wait until the beam reaches (`vp`, `hp`).
    Wait { vp: u8, hp: u8 },
    /// Skip the next instruction if the beam is at or past (`vp`, `hp`).
    Skip { vp: u8, hp: u8 },
    End,
}

impl Instruction {
    #[inline]
    pub fn encode(self) -> (u16, u16) {
        match self {
            Instruction::Move { reg, value } => (reg & 0x01FE, value),
            Instruction::Wait { vp, hp } => (wait_word(vp, hp), WAIT_MASK),
            Instruction::Skip { vp, hp } => (wait_word(vp, hp), WAIT_MASK | 1),
            Instruction::End => END,
        }
    }

    #[inline]
    pub fn decode(first: u16, second: u16) -> Self {
        if (first, second) == END {
            return Instruction::End;
        }

        if !first.get_bit(0) {
            return Instruction::Move {
                reg: first & 0x01FE,
                value: second,
            };
        }

        let vp = first.get_bits(8..16) as u8;
        let hp = (first.get_bits(1..8) << 1) as u8;
        if second.get_bit(0) {
            Instruction::Skip { vp, hp }
        } else {
            Instruction::Wait { vp, hp }
        }
    }
}

#[inline]
fn wait_word(vp: u8, hp: u8) -> u16 {
    ((vp as u16) << 8) | (hp as u16 & 0xFE) | 1
}

/// Chip RAM holding a copper program, addressed in words.
///
/// Writes go straight to memory the copper may be reading.
pub trait ProgramMemory {
    /// Chip RAM address of word 0, for `COP1LC`.
    fn address(&self) -> u32;
    /// Capacity in words.
    fn len(&self) -> usize;
    fn read(&self, index: usize) -> u16;
    fn write(&mut self, index: usize, word: u16);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Appends instructions to a [`ProgramMemory`] from a word offset.
pub struct Writer<'a, M: ProgramMemory + ?Sized> {
    mem: &'a mut M,
    pos: usize,
}

impl<'a, M: ProgramMemory + ?Sized> Writer<'a, M> {
    #[inline]
    pub fn at(mem: &'a mut M, pos: usize) -> Self {
        Self { mem, pos }
    }

    /// Word offset of the next instruction.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn push(&mut self, ins: Instruction) {
        let (first, second) = ins.encode();
        self.mem.write(self.pos, first);
        self.mem.write(self.pos + 1, second);
        self.pos += 2;
    }

    #[inline]
    pub fn mov(&mut self, reg: u16, value: u16) {
        self.push(Instruction::Move { reg, value });
    }

    #[inline]
    pub fn wait(&mut self, vp: u8, hp: u8) {
        self.push(Instruction::Wait { vp, hp });
    }

    /// Two MOVEs loading a pointer register pair, high word first.
    #[inline]
    pub fn mov_ptr(&mut self, reg: u16, addr: u32) {
        self.mov(reg, (addr >> 16) as u16);
        self.mov(reg + 2, addr as u16);
    }

    #[inline]
    pub fn end(&mut self) {
        self.push(Instruction::End);
    }
}

/// Iterate the instructions of a program until (and including) the first End.
pub fn instructions<M: ProgramMemory + ?Sized>(mem: &M) -> impl Iterator<Item = Instruction> + '_ {
    let mut pos = 0;
    let mut done = false;
    core::iter::from_fn(move || {
        if done || pos + 1 >= mem.len() {
            return None;
        }
        let ins = Instruction::decode(mem.read(pos), mem.read(pos + 1));
        pos += 2;
        done = ins == Instruction::End;
        Some(ins)
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Plain RAM standing in for chip memory.
    pub(crate) struct Words<const N: usize>(pub [u16; N]);

    impl<const N: usize> ProgramMemory for Words<N> {
        fn address(&self) -> u32 {
            0x0001_0000
        }
        fn len(&self) -> usize {
            N
        }
        fn read(&self, index: usize) -> u16 {
            self.0[index]
        }
        fn write(&mut self, index: usize, word: u16) {
            self.0[index] = word;
        }
    }

    #[test]
    fn wait_encoding_matches_hand_assembled_words() {
        // y = 0x2c + 52, hp 0x10: what the bar segment emits for the first bar
        let (a, b) = Instruction::Wait { vp: 0x60, hp: 0x10 }.encode();
        assert_eq!(a, 0x6011);
        assert_eq!(b, 0xFFFE);
    }

    #[test]
    fn move_encoding_masks_register() {
        let (a, b) = Instruction::Move { reg: 0x0181, value: 0x0F00 }.encode();
        assert_eq!((a, b), (0x0180, 0x0F00));
    }

    #[test]
    fn decode_inverts_encode() {
        for ins in [
            Instruction::Move { reg: 0x180, value: 0x0ABC },
            Instruction::Wait { vp: 0xD4, hp: 0x10 },
            Instruction::Skip { vp: 0x40, hp: 0xE2 },
            Instruction::End,
        ] {
            let (a, b) = ins.encode();
            assert_eq!(Instruction::decode(a, b), ins);
        }
    }

    #[test]
    fn writer_and_iterator_agree() {
        let mut mem = Words([0u16; 16]);
        let mut w = Writer::at(&mut mem, 0);
        w.mov(0x100, 0x0200);
        w.wait(0x40, 0x10);
        w.mov_ptr(0x0E0, 0x0002_1000);
        w.end();
        assert_eq!(w.pos(), 10);

        let mut it = instructions(&mem);
        assert_eq!(it.next(), Some(Instruction::Move { reg: 0x100, value: 0x0200 }));
        assert_eq!(it.next(), Some(Instruction::Wait { vp: 0x40, hp: 0x10 }));
        assert_eq!(it.next(), Some(Instruction::Move { reg: 0x0E0, value: 0x0002 }));
        assert_eq!(it.next(), Some(Instruction::Move { reg: 0x0E2, value: 0x1000 }));
        assert_eq!(it.next(), Some(Instruction::End));
        assert_eq!(it.next(), None);
    }
}
