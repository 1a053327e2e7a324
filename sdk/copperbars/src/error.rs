use core::fmt;

/// Startup failures. Once the system is taken over nothing can fail.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A library the platform needs could not be opened.
    MissingLibrary(&'static str),
    /// `AllocMem(MEMF_CHIP)` came back empty.
    ChipMemory { bytes: usize },
    /// The copper buffer cannot hold the program.
    ProgramTooSmall { needed: usize, capacity: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingLibrary(name) => write!(f, "could not open {name}"),
            Error::ChipMemory { bytes } => write!(f, "out of chip memory allocating {bytes} bytes"),
            Error::ProgramTooSmall { needed, capacity } => write!(
                f,
                "copper program needs {needed} words, buffer holds {capacity}"
            ),
        }
    }
}

impl core::error::Error for Error {}
