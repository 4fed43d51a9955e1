//! Input acquisition for the convert pipeline.

use crate::error::{Result, SbomError};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Where the SBOM to convert comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Read standard input
    Stdin,
    /// Read a file
    File(PathBuf),
}

impl InputSource {
    /// `-` means stdin; anything else is a path.
    #[must_use]
    pub fn from_arg(arg: &Path) -> Self {
        if arg.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(arg.to_path_buf())
        }
    }

    /// Read the whole input, refusing anything larger than `max_bytes`.
    pub fn read(&self, max_bytes: u64) -> Result<Vec<u8>> {
        match self {
            Self::Stdin => read_limited(std::io::stdin().lock(), max_bytes, self),
            Self::File(path) => {
                let file = std::fs::File::open(path).map_err(|e| SbomError::io(path, e))?;
                read_limited(file, max_bytes, self)
            }
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn read_limited(reader: impl Read, max_bytes: u64, source: &InputSource) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(|e| match source {
            InputSource::File(path) => SbomError::io(path, e),
            InputSource::Stdin => SbomError::from(e),
        })?;

    if buffer.len() as u64 > max_bytes {
        return Err(SbomError::validation(format!(
            "{source} exceeds the input limit of {max_bytes} bytes"
        )));
    }
    Ok(buffer)
}
