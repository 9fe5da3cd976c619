use std::collections::HashMap;
use std::fmt;

use scroll::Endian;
use zerocopy::LayoutVerified;

use crate::error::{FormatError, FormatErrorKind};
use crate::pcvalue::PcValueTable;
use crate::raw;
use crate::read::{read_cstr, read_u32, read_uptr};

/// The format generation of a pclntab, selected by its magic word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Version {
    /// The Go 1.2 layout.
    V12,
    /// The Go 1.16 layout, which introduced the compilation unit table.
    V116,
    /// The Go 1.20 layout, which made function entries text-relative.
    V120,
}

impl Version {
    /// Size in bytes of the leading entry field of a function descriptor.
    pub(crate) fn entry_size(self, ptr_size: u32) -> usize {
        match self {
            Version::V12 | Version::V116 => ptr_size as usize,
            Version::V120 => 4,
        }
    }

    /// Ordinal of the field packing the function ID, flag and funcdata count.
    pub(crate) fn packed_counts_field(self) -> u32 {
        match self {
            Version::V12 => 7,
            Version::V116 => 8,
            Version::V120 => 9,
        }
    }

    /// Size in bytes of one function table slot.
    pub(crate) fn functab_slot_size(self, ptr_size: u32) -> usize {
        match self {
            Version::V12 | Version::V116 => ptr_size as usize,
            Version::V120 => 4,
        }
    }
}

/// A parsed pclntab.
///
/// All sub-tables are borrowed views into the buffer handed to
/// [`LineTable::parse`]; nothing is copied. The file table is resolved
/// eagerly during construction, so a parsed table is immutable and can be
/// shared freely between threads.
pub struct LineTable<'data> {
    /// The whole blob.
    pub(crate) data: &'data [u8],
    /// Base address of the text section, carried through for the caller.
    pub(crate) text: u64,
    /// Start of text from the header; only present in the 1.20 layout.
    pub(crate) text_start: u64,
    pub(crate) version: Version,
    pub(crate) endian: Endian,
    pub(crate) quantum: u32,
    pub(crate) ptr_size: u32,
    pub(crate) nfunctab: u32,
    pub(crate) nfiletab: u32,
    /// Alternating entry/descriptor-offset slots plus a trailing sentinel.
    pub(crate) functab: &'data [u8],
    /// Region holding the function descriptors.
    pub(crate) funcdata: &'data [u8],
    /// Region holding NUL-terminated function names.
    pub(crate) funcnametab: &'data [u8],
    /// File name table; layout differs between generations.
    pub(crate) filetab: &'data [u8],
    /// Compilation unit table; empty before the 1.16 layout.
    pub(crate) cutab: &'data [u8],
    /// Region holding the PC-value tables.
    pub(crate) pctab: &'data [u8],
    /// File name to file number (1.2) or file table offset (1.16+).
    pub(crate) files: HashMap<&'data str, u32>,
}

impl<'data> LineTable<'data> {
    /// Parses a pclntab blob.
    ///
    /// `text` is the base address of the text section the table describes;
    /// it is stored for the caller's PC arithmetic and not interpreted
    /// here.
    pub fn parse(data: &'data [u8], text: u64) -> Result<Self, FormatError> {
        if data.len() < raw::MIN_TABLE_SIZE {
            return Err(FormatErrorKind::UnrecognizedFormat.into());
        }
        let (lv, _) = LayoutVerified::<_, raw::Header>::new_from_prefix(data)
            .ok_or(FormatErrorKind::UnrecognizedFormat)?;
        let header = lv.into_ref();

        if header.pad != [0, 0]
            || !matches!(header.quantum, 1 | 2 | 4)
            || !matches!(header.ptr_size, 4 | 8)
        {
            return Err(FormatErrorKind::UnrecognizedFormat.into());
        }

        let le = u32::from_le_bytes(header.magic);
        let be = u32::from_be_bytes(header.magic);
        let (endian, magic) = if matches!(le, raw::MAGIC_V12 | raw::MAGIC_V116 | raw::MAGIC_V120) {
            (Endian::Little, le)
        } else if matches!(be, raw::MAGIC_V12 | raw::MAGIC_V116 | raw::MAGIC_V120) {
            (Endian::Big, be)
        } else if le == raw::MAGIC_FUTURE || be == raw::MAGIC_FUTURE {
            return Err(FormatErrorKind::UnsupportedVersion.into());
        } else {
            return Err(FormatErrorKind::UnrecognizedFormat.into());
        };
        let version = match magic {
            raw::MAGIC_V12 => Version::V12,
            raw::MAGIC_V116 => Version::V116,
            _ => Version::V120,
        };

        let quantum = u32::from(header.quantum);
        let ptr_size = u32::from(header.ptr_size);
        let p = ptr_size as usize;

        let mut table = LineTable {
            data,
            text,
            text_start: 0,
            version,
            endian,
            quantum,
            ptr_size,
            nfunctab: 0,
            nfiletab: 0,
            functab: &[],
            funcdata: &[],
            funcnametab: &[],
            filetab: &[],
            cutab: &[],
            pctab: &[],
            files: HashMap::new(),
        };

        match version {
            Version::V12 => {
                table.nfunctab = read_uptr(data, 8, ptr_size, endian)? as u32;
                let functab_start = 8 + p;
                let functab_size = table.nfunctab as usize * 2 * p + p;
                table.functab = data
                    .get(functab_start..functab_start + functab_size)
                    .ok_or(FormatErrorKind::Malformed)?;
                let fileoff = read_u32(data, functab_start + functab_size, endian)?;
                let filetab = subslice(data, u64::from(fileoff))?;
                table.nfiletab = read_u32(filetab, 0, endian)?;
                table.filetab = filetab
                    .get(..table.nfiletab as usize * 4)
                    .ok_or(FormatErrorKind::Malformed)?;
                table.funcdata = data;
                table.funcnametab = data;
                table.pctab = data;
            }
            Version::V116 => {
                table.nfunctab = read_uptr(data, 8, ptr_size, endian)? as u32;
                table.nfiletab = read_uptr(data, 8 + p, ptr_size, endian)? as u32;
                table.funcnametab = subslice(data, read_uptr(data, 8 + 2 * p, ptr_size, endian)?)?;
                table.cutab = subslice(data, read_uptr(data, 8 + 3 * p, ptr_size, endian)?)?;
                table.filetab = subslice(data, read_uptr(data, 8 + 4 * p, ptr_size, endian)?)?;
                table.pctab = subslice(data, read_uptr(data, 8 + 5 * p, ptr_size, endian)?)?;
                table.funcdata = subslice(data, read_uptr(data, 8 + 6 * p, ptr_size, endian)?)?;
                let functab_size = table.nfunctab as usize * 2 * p + p;
                table.functab = table
                    .funcdata
                    .get(..functab_size)
                    .ok_or(FormatErrorKind::Malformed)?;
            }
            Version::V120 => {
                table.nfunctab = read_uptr(data, 8, ptr_size, endian)? as u32;
                table.nfiletab = read_uptr(data, 8 + p, ptr_size, endian)? as u32;
                table.text_start = read_uptr(data, 8 + 2 * p, ptr_size, endian)?;
                table.funcnametab = subslice(data, read_uptr(data, 8 + 3 * p, ptr_size, endian)?)?;
                table.cutab = subslice(data, read_uptr(data, 8 + 4 * p, ptr_size, endian)?)?;
                table.filetab = subslice(data, read_uptr(data, 8 + 5 * p, ptr_size, endian)?)?;
                table.pctab = subslice(data, read_uptr(data, 8 + 6 * p, ptr_size, endian)?)?;
                table.funcdata = subslice(data, read_uptr(data, 8 + 7 * p, ptr_size, endian)?)?;
                // Entries shrink to 4-byte pairs in this layout.
                let functab_size = table.nfunctab as usize * 2 * 4 + 4;
                table.functab = table
                    .funcdata
                    .get(..functab_size)
                    .ok_or(FormatErrorKind::Malformed)?;
            }
        }

        table.init_file_map()?;
        Ok(table)
    }

    fn init_file_map(&mut self) -> Result<(), FormatError> {
        match self.version {
            Version::V12 => {
                for number in 1..self.nfiletab {
                    let offset = read_u32(self.filetab, number as usize * 4, self.endian)?;
                    let name = read_cstr(self.data, offset)?;
                    self.files.insert(name, number);
                }
            }
            Version::V116 | Version::V120 => {
                let mut pos = 0u32;
                for _ in 0..self.nfiletab {
                    let name = read_cstr(self.filetab, pos)?;
                    self.files.insert(name, pos);
                    pos += name.len() as u32 + 1;
                }
            }
        }
        Ok(())
    }

    /// The format generation of this table.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Granularity of PC deltas in bytes.
    pub fn quantum(&self) -> u32 {
        self.quantum
    }

    /// Pointer width of the producing target in bytes.
    pub fn ptr_size(&self) -> u32 {
        self.ptr_size
    }

    /// Number of functions described by the table.
    pub fn num_functions(&self) -> u32 {
        self.nfunctab
    }

    /// Number of file table entries.
    pub fn num_files(&self) -> u32 {
        self.nfiletab
    }

    /// The text base address supplied at parse time, unmodified.
    pub fn text_base(&self) -> u64 {
        self.text
    }

    /// A decoder for the PC-value tables of this pclntab.
    pub fn pc_value_table(&self) -> PcValueTable<'data> {
        PcValueTable::new(self.pctab, self.quantum)
    }

    /// Resolves a function name offset into the name table.
    pub fn func_name(&self, offset: u32) -> Result<&'data str, FormatError> {
        read_cstr(self.funcnametab, offset)
    }

    /// Iterates over the file names of the program in no particular order.
    pub fn files(&self) -> impl Iterator<Item = &'data str> + '_ {
        self.files.keys().copied()
    }
}

impl fmt::Debug for LineTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineTable")
            .field("version", &self.version)
            .field("quantum", &self.quantum)
            .field("ptr_size", &self.ptr_size)
            .field("functions", &self.nfunctab)
            .field("files", &self.nfiletab)
            .finish()
    }
}

fn subslice(data: &[u8], offset: u64) -> Result<&[u8], FormatError> {
    data.get(offset as usize..)
        .ok_or_else(|| FormatErrorKind::Malformed.into())
}
