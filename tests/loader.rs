use std::io::Write;

use pipe8_rs::asm::AsmError;
use pipe8_rs::loader::{image_from_words, read_program, words_from_image, LoadError, ProgramFormat};
use tempfile::NamedTempFile;

#[test]
fn reads_assembly_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "MOVI R1 5").unwrap();
    writeln!(file, "MOVI R2 3").unwrap();
    writeln!(file, "ADD R1 R2").unwrap();
    let words = read_program(file.path(), ProgramFormat::Assembly).unwrap();
    assert_eq!(words, vec![0x3045, 0x3083, 0x0042]);
}

#[test]
fn reads_raw_image() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&image_from_words(&[0x3045, 0xA106])).unwrap();
    let words = read_program(file.path(), ProgramFormat::RawImage).unwrap();
    assert_eq!(words, vec![0x3045, 0xA106]);
}

#[test]
fn image_is_big_endian() {
    assert_eq!(image_from_words(&[0x3045]), vec![0x30, 0x45]);
    assert_eq!(words_from_image(&[0xB0, 0xC6]), Some(vec![0xB0C6]));
    assert_eq!(words_from_image(&[0xB0]), None);
}

#[test]
fn odd_raw_image_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[1, 2, 3]).unwrap();
    let err = read_program(file.path(), ProgramFormat::RawImage).unwrap_err();
    assert!(matches!(err, LoadError::OddImageLength { len: 3, .. }));
}

#[test]
fn missing_file_is_program_file_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.asm");
    let err = read_program(&path, ProgramFormat::Assembly).unwrap_err();
    assert!(matches!(err, LoadError::ProgramFileUnavailable { .. }));
    assert!(err.to_string().starts_with("Error opening program file"));
}

#[test]
fn assembly_errors_pass_through() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "MOVI R1 5\nFOO R1 R2").unwrap();
    let err = read_program(file.path(), ProgramFormat::Assembly).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Assemble(AsmError::UnknownMnemonic { line: 2, .. })
    ));
}
