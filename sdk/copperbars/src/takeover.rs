//! # System Takeover
//!
//! Taking the machine away from the operating system, and giving it back
//! exactly as it was.
//!
//! ```ignore
//! let mut hw = takeover::acquire(&mut platform);
//! // hw derefs to the platform: bang the hardware here
//! hw.release();
//! ```
//!
//! [`acquire`] returns a [`Takeover`] guard. Dropping the guard releases the
//! system too, so an early return cannot leave interrupts and DMA switched off.
//!
//! ## What gets saved
//!
//! | Saved            | Read from                   | Restored by                     |
//! |------------------|-----------------------------|---------------------------------|
//! | interrupt enables| `INTENAR`                   | `INTENA = saved \| SETCLR`      |
//! | DMA enables      | `DMACONR`                   | `DMACON = saved \| SETCLR`      |
//! | audio/disk ctrl  | `ADKCONR`                   | `ADKCON = saved \| SETCLR`      |
//! | active view      | `GfxBase->ActiView`         | `LoadView(view)`                |
//! | level 3 handler  | `VBR + $6C`                 | written back                    |
//!
//! The system copper lists are not saved; they are fetched from `GfxBase` on
//! release.

use core::{
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
};

use log::info;

use crate::{
    chipset::{IrqVector, Platform, ViewHandle},
    custom::{reg, CLEAR_ALL, DmaFlags, IntFlags, NUM_COLOR_REGS, SETCLR},
};

/// Register and OS state captured by [`acquire`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SavedState {
    pub intena: IntFlags,
    pub dmacon: DmaFlags,
    pub adkcon: u16,
    pub view: Option<ViewHandle>,
    pub vector_base: usize,
    pub level3: IrqVector,
}

/// Exclusive ownership of the chipset.
///
/// Derefs to the platform. Released by [`Takeover::release`] or on drop.
pub struct Takeover<'a, P: Platform> {
    platform: &'a mut P,
    saved: SavedState,
}

/// Take the system over.
///
/// Task switching stays forbidden and interrupts disabled until release.
pub fn acquire<P: Platform>(platform: &mut P) -> Takeover<'_, P> {
    platform.forbid();

    let adkcon = platform.read(reg::ADKCONR);
    let intena = platform.intena();
    let dmacon = platform.dma();
    let view = platform.active_view();

    platform.load_view(None);
    platform.wait_tof();
    platform.wait_tof();

    platform.wait_vbl();
    platform.wait_vbl();

    platform.own_blitter();
    platform.wait_blit();
    platform.disable();

    platform.write(reg::INTENA, CLEAR_ALL);
    platform.write(reg::INTREQ, CLEAR_ALL);
    platform.write(reg::DMACON, CLEAR_ALL);

    for n in 0..NUM_COLOR_REGS {
        platform.write(reg::color(n), 0);
    }

    platform.wait_vbl();
    platform.wait_vbl();

    let vector_base = platform.vector_base();
    let level3 = platform.level3_vector(vector_base);

    let saved = SavedState {
        intena,
        dmacon,
        adkcon,
        view,
        vector_base,
        level3,
    };
    info!(
        "took over system: intena={:04x} dmacon={:04x} adkcon={:04x} vbr={:08x}",
        intena.bits(),
        dmacon.bits(),
        adkcon,
        vector_base
    );

    Takeover { platform, saved }
}

impl<P: Platform> Takeover<'_, P> {
    /// What was captured on the way in.
    pub fn saved(&self) -> &SavedState {
        &self.saved
    }

    /// Vector base register read during takeover.
    pub fn saved_vbr(&self) -> usize {
        self.saved.vector_base
    }

    /// Give the system back. Returns what was restored.
    pub fn release(self) -> SavedState {
        let mut this = ManuallyDrop::new(self);
        let saved = this.saved;
        restore(&mut *this.platform, &saved);
        saved
    }
}

impl<P: Platform> Deref for Takeover<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.platform
    }
}

impl<P: Platform> DerefMut for Takeover<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.platform
    }
}

impl<P: Platform> Drop for Takeover<'_, P> {
    fn drop(&mut self) {
        let saved = self.saved;
        restore(self.platform, &saved);
    }
}

/// The takeover, backwards.
fn restore<P: Platform>(platform: &mut P, saved: &SavedState) {
    platform.wait_vbl();
    platform.wait_blitter();

    platform.write(reg::INTENA, CLEAR_ALL);
    platform.write(reg::INTREQ, CLEAR_ALL);
    platform.write(reg::DMACON, CLEAR_ALL);

    platform.set_level3_vector(saved.vector_base, saved.level3);

    let (copinit, lof_list) = platform.system_copper_lists();
    platform.write_ptr(reg::COP1LCH, copinit);
    platform.write_ptr(reg::COP2LCH, lof_list);
    platform.write(reg::COPJMP1, CLEAR_ALL);

    platform.write(reg::INTENA, saved.intena.bits() | SETCLR);
    platform.write(reg::DMACON, saved.dmacon.bits() | SETCLR);
    // ADKCON is not cleared on the way in; clear here so bits set while we
    // owned the machine do not survive.
    platform.write(reg::ADKCON, CLEAR_ALL);
    platform.write(reg::ADKCON, saved.adkcon | SETCLR);

    platform.wait_blit();
    platform.disown_blitter();
    platform.enable();

    platform.load_view(saved.view);
    platform.wait_tof();
    platform.wait_tof();

    platform.permit();
    info!("released system");
}
