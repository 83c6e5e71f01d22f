use std::io;
use std::path::{Path, PathBuf};

use crate::asm::{assemble, AsmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramFormat {
    /// One assembly instruction per line.
    Assembly,
    /// Raw image of big-endian 16-bit words.
    RawImage,
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Error opening program file {}: {source}", path.display())]
    ProgramFileUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Assemble(#[from] AsmError),
    #[error("raw image {} has odd length {len}", path.display())]
    OddImageLength { path: PathBuf, len: usize },
}

pub fn read_program(path: &Path, format: ProgramFormat) -> Result<Vec<u16>, LoadError> {
    let unavailable = |source: io::Error| LoadError::ProgramFileUnavailable {
        path: path.to_path_buf(),
        source,
    };
    match format {
        ProgramFormat::Assembly => {
            let text = std::fs::read_to_string(path).map_err(unavailable)?;
            Ok(assemble(&text)?)
        }
        ProgramFormat::RawImage => {
            let bytes = std::fs::read(path).map_err(unavailable)?;
            words_from_image(&bytes).ok_or_else(|| LoadError::OddImageLength {
                path: path.to_path_buf(),
                len: bytes.len(),
            })
        }
    }
}

/// Big-endian word pairs; `None` if the length is odd.
pub fn words_from_image(bytes: &[u8]) -> Option<Vec<u16>> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect(),
    )
}

pub fn image_from_words(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}
