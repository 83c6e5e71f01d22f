use anyhow::Result;
use std::path::Path;

use pipe8_rs::loader::{read_program, ProgramFormat};

/// A program laid out in instruction-address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub base: u16,
    pub words: Vec<u16>,
    pub kind: &'static str, // "asm" or "raw"
}

impl Image {
    pub fn new(base: u16, words: Vec<u16>) -> Self {
        Self { base, words, kind: "raw" }
    }

    /// One past the last mapped address.
    pub fn end(&self) -> u32 {
        u32::from(self.base) + self.words.len() as u32
    }
}

pub fn load_image(path: &Path, format: ProgramFormat, base: u16) -> Result<Image> {
    let words = read_program(path, format)?;
    let kind = match format {
        ProgramFormat::Assembly => "asm",
        ProgramFormat::RawImage => "raw",
    };
    Ok(Image { base, words, kind })
}

pub fn read_word(img: &Image, addr: u16) -> Option<u16> {
    let off = addr.checked_sub(img.base)?;
    img.words.get(usize::from(off)).copied()
}

pub fn is_mapped(img: &Image, addr: u16) -> bool {
    read_word(img, addr).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_assembly_and_maps_from_base() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "MOVI R1 5\nADD R1 R1").unwrap();
        let img = load_image(file.path(), ProgramFormat::Assembly, 0x10).unwrap();
        assert_eq!(img.kind, "asm");
        assert_eq!(img.words, vec![0x3045, 0x0041]);
        assert_eq!(img.end(), 0x12);
        assert_eq!(read_word(&img, 0x10), Some(0x3045));
        assert_eq!(read_word(&img, 0x11), Some(0x0041));
        assert!(!is_mapped(&img, 0x0F));
        assert!(!is_mapped(&img, 0x12));
    }

    #[test]
    fn loads_raw_big_endian_words() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x30, 0x45, 0xB0, 0xC6]).unwrap();
        let img = load_image(file.path(), ProgramFormat::RawImage, 0).unwrap();
        assert_eq!(img.kind, "raw");
        assert_eq!(img.words, vec![0x3045, 0xB0C6]);
    }
}
