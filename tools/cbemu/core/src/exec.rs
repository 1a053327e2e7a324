//! Just enough of exec and graphics.library to be taken over and handed
//! back: nesting counts, blitter ownership, the active view and the system
//! copper lists.

use copperbars::chipset::ViewHandle;
use copperbars::error::Error;
use log::warn;

/// The Workbench screen's view.
pub const WORKBENCH_VIEW: ViewHandle = ViewHandle(0x0000_0C00);

pub const GRAPHICS_LIBRARY: &str = "graphics.library";

#[derive(Debug)]
pub struct Exec {
    graphics_present: bool,
    graphics_opens: u32,
    forbid_nest: i32,
    disable_nest: i32,
    blitter_owned: bool,
    view: Option<ViewHandle>,
    view_loads: u32,
}

impl Default for Exec {
    fn default() -> Self {
        Self {
            graphics_present: true,
            graphics_opens: 0,
            forbid_nest: 0,
            disable_nest: 0,
            blitter_owned: false,
            view: Some(WORKBENCH_VIEW),
            view_loads: 0,
        }
    }
}

impl Exec {
    pub fn remove_graphics(&mut self) {
        self.graphics_present = false;
    }

    pub fn open_graphics(&mut self) -> Result<(), Error> {
        if !self.graphics_present {
            return Err(Error::MissingLibrary(GRAPHICS_LIBRARY));
        }
        self.graphics_opens += 1;
        Ok(())
    }

    pub fn close_graphics(&mut self) {
        match self.graphics_opens.checked_sub(1) {
            Some(n) => self.graphics_opens = n,
            None => warn!("CloseLibrary without OpenLibrary"),
        }
    }

    pub fn graphics_opens(&self) -> u32 {
        self.graphics_opens
    }

    pub fn forbid(&mut self) {
        self.forbid_nest += 1;
    }

    pub fn permit(&mut self) {
        self.forbid_nest -= 1;
        if self.forbid_nest < 0 {
            warn!("Permit without Forbid");
        }
    }

    pub fn forbid_nest(&self) -> i32 {
        self.forbid_nest
    }

    /// True when this call takes interrupts away.
    pub fn disable(&mut self) -> bool {
        self.disable_nest += 1;
        self.disable_nest == 1
    }

    /// True when this call gives interrupts back.
    pub fn enable(&mut self) -> bool {
        self.disable_nest -= 1;
        if self.disable_nest < 0 {
            warn!("Enable without Disable");
        }
        self.disable_nest == 0
    }

    pub fn disable_nest(&self) -> i32 {
        self.disable_nest
    }

    pub fn own_blitter(&mut self) {
        if self.blitter_owned {
            warn!("OwnBlitter while already owned");
        }
        self.blitter_owned = true;
    }

    pub fn disown_blitter(&mut self) {
        if !self.blitter_owned {
            warn!("DisownBlitter without OwnBlitter");
        }
        self.blitter_owned = false;
    }

    pub fn blitter_owned(&self) -> bool {
        self.blitter_owned
    }

    pub fn view(&self) -> Option<ViewHandle> {
        self.view
    }

    pub fn load_view(&mut self, view: Option<ViewHandle>) {
        self.view = view;
        self.view_loads += 1;
    }

    pub fn view_loads(&self) -> u32 {
        self.view_loads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_reports_the_outermost_calls() {
        let mut exec = Exec::default();
        assert!(exec.disable());
        assert!(!exec.disable());
        assert!(!exec.enable());
        assert!(exec.enable());
        assert_eq!(exec.disable_nest(), 0);
    }

    #[test]
    fn missing_graphics_fails_to_open() {
        let mut exec = Exec::default();
        exec.remove_graphics();
        assert_eq!(exec.open_graphics(), Err(Error::MissingLibrary("graphics.library")));
        assert_eq!(exec.graphics_opens(), 0);
    }
}
