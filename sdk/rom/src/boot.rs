use copperbars::{config::DemoConfig, demo};

use crate::amiga::Amiga;

/// AmigaDOS return codes.
pub const RETURN_OK: i32 = 0;
pub const RETURN_FAIL: i32 = 20;

#[cfg(target_arch = "m68k")]
#[panic_handler]
fn panic(_panic: &core::panic::PanicInfo<'_>) -> ! {
    loop {}
}

unsafe extern "C" {
    /// Saves the scratch registers, calls [`frame_interrupt`], `rte`.
    pub unsafe fn level3_trampoline();
}

/// Called from [`level3_trampoline`] with registers saved.
#[unsafe(no_mangle)]
extern "C" fn frame_interrupt() {
    unsafe { crate::amiga::on_vertical_blank() }
}

/// Called from `_start` in `asm/glue.asm` once `SysBase` is stored.
#[unsafe(no_mangle)]
pub extern "C" fn __main() -> i32 {
    let mut amiga = unsafe { Amiga::new() };
    match demo::run(&mut amiga, &DemoConfig::default()) {
        Ok(_) => RETURN_OK,
        Err(_) => RETURN_FAIL,
    }
}
