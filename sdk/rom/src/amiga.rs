//! The real machine behind the demo's platform traits.

use core::ptr;

use copperbars::{
    chipset::{ChipBlock, Chipset, IrqVector, Platform, ViewHandle, LEVEL3_VECTOR_OFFSET},
    error::Error,
    frame::FrameHandler,
    mmio::{ChipWords, Mmio},
};

use crate::{
    boot::level3_trampoline,
    os::{self, gfx_base, Library, MemFlags, View, GRAPHICS_NAME},
};

/// The installed handler. Written only with the level 3 interrupt off.
static mut FRAME: Option<FrameHandler<ChipWords>> = None;

/// Body of the level 3 interrupt.
///
/// # Safety
///
/// Only from the interrupt, which nothing else runs concurrently with.
pub unsafe fn on_vertical_blank() {
    unsafe {
        if let Some(handler) = FRAME.as_mut() {
            handler.on_vertical_blank(&mut Mmio::new());
        }
    }
}

pub struct Amiga {
    mmio: Mmio,
    gfx: *mut Library,
}

impl Amiga {
    /// # Safety
    ///
    /// Once per process, on the machine.
    pub unsafe fn new() -> Self {
        Self {
            mmio: unsafe { Mmio::new() },
            gfx: ptr::null_mut(),
        }
    }
}

impl Chipset for Amiga {
    #[inline(always)]
    fn read(&mut self, reg: u16) -> u16 {
        self.mmio.read(reg)
    }

    #[inline(always)]
    fn write(&mut self, reg: u16, value: u16) {
        self.mmio.write(reg, value)
    }

    #[inline(always)]
    fn ciaa_pra(&mut self) -> u8 {
        self.mmio.ciaa_pra()
    }
}

impl Platform for Amiga {
    type Program = ChipWords;

    fn open_libraries(&mut self) -> Result<(), Error> {
        self.gfx = unsafe { os::exec_open_library(GRAPHICS_NAME.as_ptr(), 0) };
        if self.gfx.is_null() {
            return Err(Error::MissingLibrary("graphics.library"));
        }
        Ok(())
    }

    fn close_libraries(&mut self) {
        if !self.gfx.is_null() {
            unsafe { os::exec_close_library(self.gfx) };
            self.gfx = ptr::null_mut();
        }
    }

    fn forbid(&mut self) {
        unsafe { os::exec_forbid() }
    }

    fn permit(&mut self) {
        unsafe { os::exec_permit() }
    }

    fn disable(&mut self) {
        unsafe { os::exec_disable() }
    }

    fn enable(&mut self) {
        unsafe { os::exec_enable() }
    }

    fn active_view(&mut self) -> Option<ViewHandle> {
        match unsafe { os::field(self.gfx, gfx_base::ACTI_VIEW) } {
            0 => None,
            view => Some(ViewHandle(view as usize)),
        }
    }

    fn load_view(&mut self, view: Option<ViewHandle>) {
        let view = view.map_or(ptr::null_mut(), |v| v.0 as *mut View);
        unsafe { os::gfx_load_view(self.gfx, view) }
    }

    fn wait_tof(&mut self) {
        unsafe { os::gfx_wait_tof(self.gfx) }
    }

    fn own_blitter(&mut self) {
        unsafe { os::gfx_own_blitter(self.gfx) }
    }

    fn disown_blitter(&mut self) {
        unsafe { os::gfx_disown_blitter(self.gfx) }
    }

    fn wait_blit(&mut self) {
        unsafe { os::gfx_wait_blit(self.gfx) }
    }

    fn system_copper_lists(&mut self) -> (u32, u32) {
        unsafe {
            (
                os::field(self.gfx, gfx_base::COPINIT),
                os::field(self.gfx, gfx_base::LOF_LIST),
            )
        }
    }

    fn vector_base(&mut self) -> usize {
        unsafe { os::exec_vector_base() }
    }

    fn level3_vector(&mut self, vbr: usize) -> IrqVector {
        let slot = (vbr + LEVEL3_VECTOR_OFFSET) as *const usize;
        IrqVector(unsafe { slot.read_volatile() })
    }

    fn set_level3_vector(&mut self, vbr: usize, vector: IrqVector) {
        let slot = (vbr + LEVEL3_VECTOR_OFFSET) as *mut usize;
        unsafe { slot.write_volatile(vector.0) }
    }

    fn alloc_chip(&mut self, bytes: usize) -> Option<ChipBlock> {
        let flags = MemFlags::CHIP | MemFlags::CLEAR;
        let ptr = unsafe { os::exec_alloc_mem(bytes as u32, flags.bits()) };
        if ptr.is_null() {
            return None;
        }
        Some(ChipBlock {
            addr: ptr as usize as u32,
            bytes,
        })
    }

    fn free_chip(&mut self, block: ChipBlock) {
        unsafe { os::exec_free_mem(block.addr as usize as *mut u8, block.bytes as u32) }
    }

    fn program_memory(&mut self, block: ChipBlock) -> ChipWords {
        unsafe { ChipWords::from_raw(block.addr as usize as *mut u16, block.bytes / 2) }
    }

    fn install_frame_handler(&mut self, handler: FrameHandler<ChipWords>) -> IrqVector {
        unsafe { FRAME = Some(handler) };
        IrqVector(level3_trampoline as usize)
    }

    fn remove_frame_handler(&mut self) -> Option<FrameHandler<ChipWords>> {
        unsafe { FRAME.take() }
    }
}
