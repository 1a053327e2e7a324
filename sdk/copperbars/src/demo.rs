//! # Main Loop
//!
//! ```ignore
//! let summary = copperbars::demo::run(&mut platform, &DemoConfig::default())?;
//! ```
//!
//! [`run`] owns the whole life of the effect: chip memory, takeover, copper
//! start, interrupt installation, the exit poll, and teardown. The main loop
//! itself only reads the mouse button and the blitter busy flag. The bar
//! table and program belong to the installed [`FrameHandler`] until the loop
//! exits.

use log::{info, warn};

use crate::{
    bars::{NUM_BARS, STOCK_BARS},
    blit,
    chipset::{ChipBlock, Platform},
    config::{DemoConfig, PROGRAM_BYTES},
    custom::{reg, DmaFlags, IntFlags, CLEAR_ALL},
    error::Error,
    frame::FrameHandler,
    program::CopperProgram,
    takeover::{self, SavedState},
};

/// What a finished run reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    /// Vertical blanks the frame handler ran for.
    pub frames: u32,
    /// State handed back to the system.
    pub restored: SavedState,
}

/// Run the effect until the left mouse button is pressed.
///
/// Fails only before the system is taken over; once it is, the run always
/// ends with the system restored.
pub fn run<P: Platform>(platform: &mut P, config: &DemoConfig) -> Result<Summary, Error> {
    let screen = &config.screen;

    let bitplanes = alloc(platform, screen.bitplane_bytes())?;
    let program_block = match alloc(platform, PROGRAM_BYTES) {
        Ok(block) => block,
        Err(e) => {
            platform.free_chip(bitplanes);
            return Err(e);
        }
    };

    let program = platform.program_memory(program_block);
    let mut program = match CopperProgram::new(program, screen, NUM_BARS) {
        Ok(program) => program,
        Err(e) => {
            platform.free_chip(program_block);
            platform.free_chip(bitplanes);
            return Err(e);
        }
    };

    if let Err(e) = platform.open_libraries() {
        warn!("{e}");
        platform.free_chip(program_block);
        platform.free_chip(bitplanes);
        return Err(e);
    }

    let mut hw = takeover::acquire(platform);
    hw.wait_vbl();

    blit::clear_bitplanes(&mut *hw, screen, bitplanes.addr);
    program.build_static(screen, bitplanes.addr);
    hw.write_ptr(reg::COP1LCH, program.address());

    hw.wait_vbl();

    // a COPJMP strobe with blitter DMA on can corrupt the blitter's first
    // word on some Agnus revisions
    hw.write(reg::DMACON, DmaFlags::BLITTER.bits());
    hw.write(reg::COPJMP1, CLEAR_ALL);
    hw.write(
        reg::DMACON,
        (DmaFlags::SETCLR | DmaFlags::MASTER | DmaFlags::RASTER | DmaFlags::COPPER | DmaFlags::BLITTER).bits(),
    );

    info!("copper running from {:08x}", program.address());

    let handler = FrameHandler::new(STOCK_BARS, config.band, program);
    let entry = hw.install_frame_handler(handler);
    let vbr = hw.saved_vbr();
    hw.set_level3_vector(vbr, entry);

    hw.write(reg::INTENA, (IntFlags::SETCLR | IntFlags::INTEN | IntFlags::VERTB).bits());
    hw.ack(IntFlags::VERTB);

    while !hw.left_button() {
        hw.wait_blitter();
    }

    // stop the copper and the interrupt before taking the handler back
    hw.write(reg::INTENA, IntFlags::VERTB.bits());
    hw.write(reg::DMACON, DmaFlags::COPPER.bits());
    hw.write_ptr(reg::COP1LCH, 0);

    let frames = match hw.remove_frame_handler() {
        Some(handler) => handler.frames(),
        None => {
            warn!("frame handler went missing");
            0
        }
    };
    hw.free_chip(program_block);
    hw.free_chip(bitplanes);

    let restored = hw.release();
    platform.close_libraries();

    info!("ran {frames} frames");
    Ok(Summary { frames, restored })
}

fn alloc<P: Platform>(platform: &mut P, bytes: usize) -> Result<ChipBlock, Error> {
    platform.alloc_chip(bytes).ok_or(Error::ChipMemory { bytes })
}
