//! # Vertical Blank Handler
//!
//! Runs once per frame from the level 3 interrupt. It owns the bar table and
//! the copper program for as long as it is installed; the main loop gets them
//! back only through [`Platform::remove_frame_handler`](crate::chipset::Platform::remove_frame_handler).
//!
//! Per frame, in order:
//!
//! 1. acknowledge `VERTB`, before anything else, or the request stays pending
//!    and the interrupt fires again as soon as the handler returns;
//! 2. step every bar, bouncing at the band edges;
//! 3. insertion-sort the bars by position;
//! 4. draw each bar one step ahead of where it is stored;
//! 5. rewrite the bar segment of the copper program in place.
//!
//! Nothing here blocks, waits on the beam, or logs. It has to be done before
//! the beam reaches the first bar WAIT.

use crate::{
    bars::{sort_by_position, Bar, NUM_BARS},
    chipset::Chipset,
    config::AnimationBand,
    copper::ProgramMemory,
    custom::IntFlags,
    program::CopperProgram,
};

pub struct FrameHandler<M: ProgramMemory> {
    bars: [Bar; NUM_BARS],
    band: AnimationBand,
    program: CopperProgram<M>,
    dynamic_start: usize,
    frames: u32,
}

impl<M: ProgramMemory> FrameHandler<M> {
    /// `program` must already carry its static header.
    pub fn new(bars: [Bar; NUM_BARS], band: AnimationBand, program: CopperProgram<M>) -> Self {
        let dynamic_start = program.dynamic_start();
        Self {
            bars,
            band,
            program,
            dynamic_start,
            frames: 0,
        }
    }

    /// The vertical blank interrupt body.
    #[inline]
    pub fn on_vertical_blank<C: Chipset + ?Sized>(&mut self, chips: &mut C) {
        chips.ack(IntFlags::VERTB);
        self.advance();
    }

    /// Steps 2 to 5, without touching the chipset.
    pub fn advance(&mut self) {
        for bar in self.bars.iter_mut() {
            bar.step(&self.band);
        }

        sort_by_position(&mut self.bars);

        self.program
            .regenerate(&self.bars, self.dynamic_start, Bar::lead_position);

        self.frames = self.frames.wrapping_add(1);
    }

    #[inline]
    pub fn bars(&self) -> &[Bar; NUM_BARS] {
        &self.bars
    }

    #[inline]
    pub fn program(&self) -> &CopperProgram<M> {
        &self.program
    }

    /// Interrupts handled so far.
    #[inline]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn into_program(self) -> CopperProgram<M> {
        self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bars::STOCK_BARS,
        config::ScreenConfig,
        copper::{instructions, tests::Words, Instruction},
        custom::reg,
    };

    /// Records register writes, nothing else.
    #[derive(Default)]
    struct Probe {
        writes: Vec<(u16, u16)>,
    }

    impl Chipset for Probe {
        fn read(&mut self, _reg: u16) -> u16 {
            0
        }
        fn write(&mut self, reg: u16, value: u16) {
            self.writes.push((reg, value));
        }
        fn ciaa_pra(&mut self) -> u8 {
            0xFF
        }
    }

    fn handler() -> FrameHandler<Words<512>> {
        let screen = ScreenConfig::PAL_LOWRES;
        let mut program = CopperProgram::new(Words([0; 512]), &screen, NUM_BARS).unwrap();
        program.build_static(&screen, 0);
        FrameHandler::new(STOCK_BARS, AnimationBand::default(), program)
    }

    #[test]
    fn acknowledges_vertb_and_nothing_else() {
        let mut h = handler();
        let mut probe = Probe::default();
        h.on_vertical_blank(&mut probe);
        assert_eq!(probe.writes, vec![(reg::INTREQ, IntFlags::VERTB.bits())]);
        assert_eq!(h.frames(), 1);
    }

    #[test]
    fn first_frame_draws_one_step_ahead() {
        let mut h = handler();
        h.advance();

        // stored: stepped once
        assert_eq!(h.bars()[0].position, 53);

        // drawn: stepped once more
        let first_wait = instructions(h.program().memory())
            .find_map(|ins| match ins {
                Instruction::Wait { vp, .. } => Some(vp as u16),
                _ => None,
            })
            .unwrap();
        assert_eq!(first_wait, 54 + 0x2C);
    }

    #[test]
    fn stays_sorted_and_in_band_for_a_minute() {
        let band = AnimationBand::default();
        let mut h = handler();
        for _ in 0..50 * 60 {
            h.advance();
            for pair in h.bars().windows(2) {
                assert!(pair[0].position <= pair[1].position);
            }
            for bar in h.bars() {
                assert!(bar.position >= band.top && bar.position <= band.bottom_bound(bar.extent));
            }
            assert_eq!(instructions(h.program().memory()).count() * 2, 244);
        }
    }

    #[test]
    fn bars_cross_after_the_lowest_turns_around() {
        let mut h = handler();
        // pink 0x303 starts at 106 and hits 194 after 88 frames
        for _ in 0..100 {
            h.advance();
        }
        let turned = h.bars().iter().filter(|b| b.velocity < 0).count();
        assert!(turned > 0);
        assert!(turned < NUM_BARS);
        // the set of colors is untouched by sorting
        let mut seen: Vec<u16> = h.bars().iter().map(|b| b.color.0).collect();
        let mut stock: Vec<u16> = STOCK_BARS.iter().map(|b| b.color.0).collect();
        seen.sort();
        stock.sort();
        assert_eq!(seen, stock);
    }
}
