//! exec.library and graphics.library, through the register-convention stubs
//! in `asm/glue.asm`.

use bitflags::bitflags;

bitflags! {
    /// `AllocMem` requirements.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct MemFlags: u32 {
        const PUBLIC = 1 << 0;
        const CHIP   = 1 << 1;
        const FAST   = 1 << 2;
        const CLEAR  = 1 << 16;
    }
}

/// Byte offsets into `struct GfxBase`.
pub mod gfx_base {
    pub const ACTI_VIEW: usize = 0x22;
    pub const COPINIT: usize = 0x26;
    pub const LOF_LIST: usize = 0x32;
}

pub const GRAPHICS_NAME: &[u8] = b"graphics.library\0";

#[repr(C)]
pub struct Library {
    _private: [u8; 0],
}

#[repr(C)]
pub struct View {
    _private: [u8; 0],
}

unsafe extern "C" {
    pub unsafe fn exec_forbid();
    pub unsafe fn exec_permit();
    pub unsafe fn exec_disable();
    pub unsafe fn exec_enable();
    pub unsafe fn exec_alloc_mem(bytes: u32, flags: u32) -> *mut u8;
    pub unsafe fn exec_free_mem(ptr: *mut u8, bytes: u32);
    pub unsafe fn exec_open_library(name: *const u8, version: u32) -> *mut Library;
    pub unsafe fn exec_close_library(lib: *mut Library);

    /// `movec vbr,d0` under `Supervisor()`, or 0 on a plain 68000.
    pub unsafe fn exec_vector_base() -> usize;

    pub unsafe fn gfx_load_view(gfx: *mut Library, view: *mut View);
    pub unsafe fn gfx_wait_tof(gfx: *mut Library);
    pub unsafe fn gfx_own_blitter(gfx: *mut Library);
    pub unsafe fn gfx_disown_blitter(gfx: *mut Library);
    pub unsafe fn gfx_wait_blit(gfx: *mut Library);
}

/// Read a longword field of a library base.
///
/// # Safety
///
/// `base` must be an open library with at least `offset + 4` bytes.
#[inline(always)]
pub unsafe fn field(base: *mut Library, offset: usize) -> u32 {
    unsafe { base.cast::<u8>().add(offset).cast::<u32>().read_volatile() }
}
