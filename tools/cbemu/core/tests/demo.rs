use std::collections::BTreeSet;

use cbemu_core::exec::WORKBENCH_VIEW;
use cbemu_core::machine::{SYSTEM_BACKGROUND, SYSTEM_LEVEL3};
use cbemu_core::Amiga;
use copperbars::bars::{NUM_BARS, STOCK_BARS};
use copperbars::chipset::Chipset;
use copperbars::config::{AnimationBand, DemoConfig, ScreenConfig, LINES_PER_FRAME};
use copperbars::copper::{instructions, Instruction, ProgramMemory};
use copperbars::custom::{reg, IntFlags, Rgb4, SETCLR};
use copperbars::frame::FrameHandler;
use copperbars::program::CopperProgram;
use copperbars::{demo, takeover, Error};

/// Program memory with no chip RAM behind it, for working out what the
/// handler should have drawn.
struct Words(Vec<u16>);

impl ProgramMemory for Words {
    fn address(&self) -> u32 {
        0
    }
    fn len(&self) -> usize {
        self.0.len()
    }
    fn read(&self, index: usize) -> u16 {
        self.0[index]
    }
    fn write(&mut self, index: usize, word: u16) {
        self.0[index] = word;
    }
}

/// `COLOR00` per line for a program produced by `advances` handler frames.
fn expected_raster(advances: u32) -> Vec<Rgb4> {
    let screen = ScreenConfig::PAL_LOWRES;
    let mut program = CopperProgram::new(Words(vec![0; 512]), &screen, NUM_BARS).unwrap();
    program.build_static(&screen, 0);
    let mut handler = FrameHandler::new(STOCK_BARS, AnimationBand::default(), program);
    for _ in 0..advances {
        handler.advance();
    }

    let mut changes = Vec::new();
    let mut line = 0u16;
    for ins in instructions(handler.program().memory()) {
        match ins {
            Instruction::Wait { vp, .. } => line = vp as u16,
            Instruction::Move { reg: r, value } if r == reg::color(0) => {
                changes.push((line, Rgb4(value)))
            }
            _ => {}
        }
    }

    (0..LINES_PER_FRAME)
        .map(|l| {
            changes
                .iter()
                .filter(|(at, _)| *at <= l)
                .last()
                .map_or(Rgb4::BLACK, |(_, c)| *c)
        })
        .collect()
}

#[test]
fn runs_until_clicked_and_restores_the_system() {
    let mut amiga = Amiga::new();
    amiga.run_frames(2);
    let before = amiga.snapshot();
    amiga.click_at(60);

    let summary = demo::run(&mut amiga, &DemoConfig::default()).unwrap();

    assert!(summary.frames > 30, "only {} frames", summary.frames);
    assert!(summary.frames < 60);
    assert_eq!(amiga.snapshot(), before);
    assert_eq!(summary.restored.level3, SYSTEM_LEVEL3);
    assert_eq!(summary.restored.view, Some(WORKBENCH_VIEW));
    assert_eq!(summary.restored.intena.bits(), before.intena);

    assert!(amiga.chip().live().is_empty());
    assert_eq!(amiga.exec().graphics_opens(), 0);
    assert!(amiga.frame_handler().is_none());

    // the system copper list is back in charge
    amiga.run_frames(2);
    assert_eq!(amiga.bus().last_raster().line(150), SYSTEM_BACKGROUND);
}

#[test]
fn raster_shows_the_bars_the_handler_drew() {
    let mut amiga = Amiga::new();
    amiga.capture_every(1);
    amiga.click_at(40);

    let summary = demo::run(&mut amiga, &DemoConfig::default()).unwrap();
    let captures = amiga.take_captures();

    let stock: BTreeSet<u16> = STOCK_BARS.iter().map(|b| b.color.bits()).collect();
    let mut checked = 0;
    for cap in captures
        .iter()
        .filter(|c| c.handler_frames >= 2 && c.handler_frames < summary.frames)
    {
        let expected = expected_raster(cap.handler_frames);
        assert_eq!(cap.raster.lines(), &expected[..], "frame {}", cap.frame);

        let seen: BTreeSet<u16> = cap
            .raster
            .lines()
            .iter()
            .map(|c| c.bits())
            .filter(|&c| c != 0)
            .collect();
        assert_eq!(seen, stock);
        checked += 1;
    }
    assert!(checked > 10, "only {checked} frames checked");
}

#[test]
fn bars_move_between_frames() {
    let mut amiga = Amiga::new();
    amiga.capture_every(1);
    amiga.click_at(30);
    demo::run(&mut amiga, &DemoConfig::default()).unwrap();

    let captures = amiga.take_captures();
    let first_bar = |k: u32| {
        captures
            .iter()
            .find(|c| c.handler_frames == k)
            .and_then(|c| c.raster.lines().iter().position(|l| *l != Rgb4::BLACK))
            .unwrap()
    };
    // the top bar starts at 52 and moves one line a frame, drawn a frame ahead
    assert_eq!(first_bar(3), 52 + 4 + 0x2C);
    assert_eq!(first_bar(4), 52 + 5 + 0x2C);
}

#[test]
fn missing_graphics_library_touches_nothing() {
    let mut amiga = Amiga::new().without_graphics();
    let before = amiga.snapshot();
    amiga.click_at(10);

    let err = demo::run(&mut amiga, &DemoConfig::default()).unwrap_err();

    assert_eq!(err, Error::MissingLibrary("graphics.library"));
    assert_eq!(amiga.snapshot(), before);
    assert!(amiga.chip().live().is_empty());
}

#[test]
fn no_chip_ram_for_the_bitplanes() {
    let mut amiga = Amiga::with_chip_ram(8 * 1024);
    let before = amiga.snapshot();

    let err = demo::run(&mut amiga, &DemoConfig::default()).unwrap_err();

    assert_eq!(err, Error::ChipMemory { bytes: 10240 });
    assert_eq!(amiga.snapshot(), before);
}

#[test]
fn no_chip_ram_for_the_program_frees_the_bitplanes() {
    let mut amiga = Amiga::with_chip_ram(15_000);

    let err = demo::run(&mut amiga, &DemoConfig::default()).unwrap_err();

    assert_eq!(err, Error::ChipMemory { bytes: 1024 });
    assert!(amiga.chip().live().is_empty());
}

#[test]
fn dropping_the_takeover_releases_the_system() {
    let mut amiga = Amiga::new();
    let before = amiga.snapshot();

    {
        let mut hw = takeover::acquire(&mut amiga);
        hw.write(reg::ADKCON, SETCLR | 0x0400);
        hw.write(reg::color(0), 0x0F00);

        let inside = hw.snapshot();
        assert_eq!(inside.intena, 0);
        assert_eq!(inside.dmacon, 0);
        assert_eq!(inside.view, None);
        assert_eq!(inside.forbid_nest, 1);
        assert_eq!(inside.disable_nest, 1);
        assert!(inside.blitter_owned);
    }

    assert_eq!(amiga.snapshot(), before);
}

#[test]
fn takeover_blanks_the_palette() {
    let mut amiga = Amiga::new();
    amiga.run_frames(1);
    let hw = takeover::acquire(&mut amiga);
    for n in 0..32 {
        assert_eq!(hw.bus().color(n), Rgb4::BLACK);
    }
    let saved = hw.release();
    assert!(saved.intena.contains(IntFlags::INTEN | IntFlags::VERTB));
}

#[test]
fn explicit_release_restores_exactly_once() {
    let mut amiga = Amiga::new();
    let before = amiga.snapshot();
    let loads = amiga.exec().view_loads();

    let hw = takeover::acquire(&mut amiga);
    let saved = *hw.saved();
    assert_eq!(hw.release(), saved);

    // one LoadView(NULL) on the way in, one LoadView(saved) on the way out
    assert_eq!(amiga.exec().view_loads(), loads + 2);
    assert_eq!(amiga.snapshot(), before);
    assert_eq!(amiga.snapshot().forbid_nest, 0);
    assert_eq!(amiga.snapshot().disable_nest, 0);
}

#[test]
fn relocated_vector_table_is_used_and_restored() {
    let mut amiga = Amiga::new().with_vector_base(0x0008_0000);
    let before = amiga.snapshot();
    amiga.click_at(30);

    let summary = demo::run(&mut amiga, &DemoConfig::default()).unwrap();

    assert!(summary.frames > 0);
    assert_eq!(summary.restored.vector_base, 0x0008_0000);
    assert_eq!(amiga.snapshot(), before);
    assert_eq!(amiga.snapshot().level3, Some(SYSTEM_LEVEL3));
}
