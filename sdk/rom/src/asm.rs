//! Hand-written m68k: the process entry, the level 3 interrupt entry and the
//! register-convention stubs behind [`crate::os`].

#[cfg(target_arch = "m68k")]
core::arch::global_asm!(include_str!("asm/glue.asm"));

#[cfg(test)]
mod tests {
    const GLUE: &str = include_str!("asm/glue.asm");

    /// Every symbol the Rust side declares `extern` or exports to the glue.
    const IMPORTED: &[&str] = &[
        "level3_trampoline",
        "exec_forbid",
        "exec_permit",
        "exec_disable",
        "exec_enable",
        "exec_alloc_mem",
        "exec_free_mem",
        "exec_open_library",
        "exec_close_library",
        "exec_vector_base",
        "gfx_load_view",
        "gfx_wait_tof",
        "gfx_own_blitter",
        "gfx_disown_blitter",
        "gfx_wait_blit",
    ];

    fn lines() -> impl Iterator<Item = &'static str> {
        GLUE.lines().map(|l| l.split(';').next().unwrap().trim())
    }

    fn defined(name: &str) -> bool {
        let global = lines().any(|l| l == format!(".globl {name}"));
        let label = lines().any(|l| l == format!("{name}:"));
        let expanded = lines().any(|l| {
            let mut words = l.split_whitespace();
            matches!(words.next(), Some("exec_void" | "gfx_void"))
                && words.next().map(|w| w.trim_end_matches(',')) == Some(name)
        });
        (global && label) || expanded
    }

    #[test]
    fn every_import_is_defined() {
        for name in IMPORTED {
            assert!(defined(name), "{name} has no definition in glue.asm");
        }
    }

    #[test]
    fn entry_points_call_into_rust() {
        assert!(defined("_start"));
        assert!(lines().any(|l| l == "jsr     __main"));
        assert!(lines().any(|l| l == "jsr     frame_interrupt"));
    }

    #[test]
    fn interrupt_entry_returns_with_rte() {
        let body: Vec<_> = lines()
            .skip_while(|l| *l != "level3_trampoline:")
            .take_while(|l| !l.is_empty())
            .collect();
        assert_eq!(body.last(), Some(&"rte"));
    }

    #[test]
    fn vector_base_is_read_in_supervisor_mode() {
        assert!(lines().any(|l| l == ".short  0x4E7A, 0x0801"));
        assert!(lines().any(|l| l == "jsr     (LVO_Supervisor,%a6)"));
        assert!(lines().any(|l| l == ".set LVO_Supervisor,     -30"));
    }
}
