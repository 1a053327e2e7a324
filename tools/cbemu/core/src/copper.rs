//! The copper: fetches instruction pairs from chip RAM and either writes a
//! register or waits for the beam.
//!
//! Timing is coarse. Fetching a pair takes [`FETCH_CCKS`] color clocks; a
//! satisfied WAIT releases on the clock it is satisfied. The blitter-finished
//! flag of WAIT and SKIP is ignored.

use copperbars::copper::Instruction;
use copperbars::custom::Beam;
use log::{trace, warn};

use crate::chip_ram::ChipRam;

/// Two word fetches, two color clocks each.
pub const FETCH_CCKS: u8 = 4;

/// Lowest register the copper may write with `COPCON` danger off.
pub const COPPER_SAFE_REG: u16 = 0x40;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CopperState {
    /// Fetching the pair at `pc`, `ccks` clocks left.
    Fetch { ccks: u8 },
    Wait { vp: u8, hp: u8 },
    /// Stopped until the next restart.
    Halted,
}

#[derive(Clone, Debug)]
pub struct Copper {
    pc: u32,
    state: CopperState,
}

impl Default for Copper {
    fn default() -> Self {
        Self {
            pc: 0,
            state: CopperState::Halted,
        }
    }
}

/// Has the beam reached (`vp`, `hp`)? Only the low eight line bits take part,
/// as on the chip.
#[inline]
pub fn beam_reached(beam: Beam, vp: u8, hp: u8) -> bool {
    let v = (beam.line & 0xFF) as u8;
    v > vp || (v == vp && beam.hpos >= hp as u16)
}

impl Copper {
    /// Start over at `pc`. Vertical blank and `COPJMPx` strobes.
    pub fn jump(&mut self, pc: u32) {
        self.pc = pc;
        self.state = CopperState::Fetch { ccks: FETCH_CCKS };
    }

    #[inline]
    pub fn state(&self) -> CopperState {
        self.state
    }

    #[inline]
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// One color clock with copper DMA on. Returns a register write to perform.
    pub fn cycle(&mut self, beam: Beam, ram: &ChipRam) -> Option<(u16, u16)> {
        match self.state {
            CopperState::Halted => None,
            CopperState::Wait { vp, hp } => {
                if beam_reached(beam, vp, hp) {
                    self.state = CopperState::Fetch { ccks: FETCH_CCKS };
                }
                None
            }
            CopperState::Fetch { ccks } if ccks > 1 => {
                self.state = CopperState::Fetch { ccks: ccks - 1 };
                None
            }
            CopperState::Fetch { .. } => self.execute(beam, ram),
        }
    }

    fn execute(&mut self, beam: Beam, ram: &ChipRam) -> Option<(u16, u16)> {
        let first = ram.read_word(self.pc);
        let second = ram.read_word(self.pc + 2);
        self.pc += 4;
        self.state = CopperState::Fetch { ccks: FETCH_CCKS };

        match Instruction::decode(first, second) {
            Instruction::Move { reg, value } => {
                if reg < COPPER_SAFE_REG {
                    warn!("copper MOVE to {reg:03x} refused at {:08x}, halting", self.pc - 4);
                    self.state = CopperState::Halted;
                    return None;
                }
                Some((reg, value))
            }
            Instruction::Wait { vp, hp } => {
                self.state = CopperState::Wait { vp, hp };
                None
            }
            Instruction::Skip { vp, hp } => {
                if beam_reached(beam, vp, hp) {
                    self.pc += 4;
                }
                None
            }
            Instruction::End => {
                trace!("copper parked at line {}", beam.line);
                self.state = CopperState::Wait { vp: 0xFF, hp: 0xFE };
                None
            }
        }
    }
}
