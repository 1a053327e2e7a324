//! Compile-time configuration: PAL timing, screen geometry and the band the
//! bars bounce in.

/// Lines in a PAL short frame.
pub const LINES_PER_FRAME: u16 = 312;

/// Last line of a PAL frame; beam syncs wait for this line.
pub const VBL_LINE: u16 = 311;

/// Color clocks per scanline.
pub const CCKS_PER_LINE: u16 = 227;

/// First displayed PAL line (`DIWSTRT` vertical start). Bar positions are
/// relative to it.
pub const FRAME_OFFSET: u16 = 0x2C;

/// Horizontal position the bar WAITs compare against.
pub const BAR_WAIT_HPOS: u16 = 0x10;

/// Size of the copper program allocation, in bytes.
pub const PROGRAM_BYTES: usize = 1024;

/// Display geometry, written once into the static copper header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScreenConfig {
    pub width: u16,
    pub height: u16,
    /// Bitplanes fetched by Denise. Zero leaves only COLOR00 visible.
    pub depth: u16,
    pub diwstrt: u16,
    pub diwstop: u16,
    pub ddfstrt: u16,
    pub ddfstop: u16,
}

impl ScreenConfig {
    /// 320×256 lowres PAL, one bitplane.
    pub const PAL_LOWRES: ScreenConfig = ScreenConfig {
        width: 320,
        height: 256,
        depth: 1,
        diwstrt: 0x2C81,
        diwstop: 0x2CC1,
        ddfstrt: 0x0038,
        ddfstop: 0x00D0,
    };

    #[inline]
    pub const fn bytes_per_row(&self) -> usize {
        self.width as usize / 8
    }

    #[inline]
    pub const fn words_per_row(&self) -> u16 {
        self.width / 16
    }

    /// Bytes in one bitplane.
    #[inline]
    pub const fn plane_bytes(&self) -> usize {
        self.bytes_per_row() * self.height as usize
    }

    /// Bytes for all configured bitplanes.
    #[inline]
    pub const fn bitplane_bytes(&self) -> usize {
        self.plane_bytes() * self.depth as usize
    }

    /// `BPLCON0`: plane count in bits 12-14, composite color enable.
    #[inline]
    pub const fn bplcon0(&self) -> u16 {
        ((self.depth & 0x7) << 12) | 0x0200
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self::PAL_LOWRES
    }
}

/// The vertical range bars bounce in, relative to [`FRAME_OFFSET`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AnimationBand {
    /// Smallest position a bar may have.
    pub top: u16,
    /// Line a bar's lower edge may not pass.
    pub floor: u16,
}

impl AnimationBand {
    /// The stock band: 20 lines from the top, 60 lines clear of the bottom.
    pub const fn for_screen(screen: &ScreenConfig) -> Self {
        Self {
            top: 20,
            floor: screen.height - 60,
        }
    }

    /// Largest position a bar of `extent` lines may have.
    #[inline]
    pub const fn bottom_bound(&self, extent: u16) -> u16 {
        self.floor.saturating_sub(extent)
    }
}

impl Default for AnimationBand {
    fn default() -> Self {
        Self::for_screen(&ScreenConfig::PAL_LOWRES)
    }
}

/// Everything the main loop needs to set up a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct DemoConfig {
    pub screen: ScreenConfig,
    pub band: AnimationBand,
}
