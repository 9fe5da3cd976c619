//! Extracts the raw pclntab from a Go binary's container format.
//!
//! The size attribution itself only needs three things from the container:
//! the pclntab bytes, the file offset of the text section and the total
//! file size. This crate finds the first two in ELF, Mach-O and PE
//! binaries as well as Unix `ar` archives holding a Go object file; the
//! caller supplies the file size.

#![warn(missing_docs)]

use goblin::Object;
use thiserror::Error;

mod archive;
mod elf;
mod macho;
mod pe;

/// An error encountered while locating the pclntab in a container.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// No supported container parser accepted the file.
    #[error("unsupported binary container format")]
    UnsupportedFormat,
    /// The container was recognized but holds no pclntab.
    #[error("no pclntab section found in {0} file")]
    MissingPclntab(&'static str),
    /// A symbol required to locate the pclntab is absent.
    #[error("did not find {0} symbol")]
    MissingSymbol(&'static str),
    /// The archive has no Go object member.
    #[error("archive does not contain a go.o member")]
    MissingGoObject,
    /// A section or symbol points outside the file.
    #[error("{0} section data out of bounds")]
    BadSectionData(&'static str),
    /// The container itself does not parse.
    #[error("malformed {0} file")]
    Malformed(&'static str, #[source] goblin::error::Error),
}

/// The pieces of a binary the size attribution consumes.
#[derive(Debug, Clone, Copy)]
pub struct BinaryInfo<'data> {
    /// The raw pclntab blob.
    pub pclntab: &'data [u8],
    /// File offset of the text section, zero when absent. Carried through
    /// opaquely for PC arithmetic.
    pub text_start: u64,
}

impl<'data> BinaryInfo<'data> {
    /// Sniffs the container format and extracts the pclntab.
    pub fn parse(data: &'data [u8]) -> Result<Self, ObjectError> {
        match Object::parse(data).map_err(|e| ObjectError::Malformed("binary", e))? {
            Object::Elf(elf) => elf::from_elf(&elf, data),
            Object::Mach(mach) => macho::from_mach(&mach, data),
            Object::PE(pe) => pe::from_pe(&pe, data),
            Object::Archive(archive) => archive::from_archive(&archive, data),
            _ => Err(ObjectError::UnsupportedFormat),
        }
    }
}
