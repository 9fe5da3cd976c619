use crate::error::{FormatError, FormatErrorKind};
use crate::linetable::{LineTable, Version};
use crate::read::{read_u32, read_uptr};

/// A decoded function descriptor.
///
/// Records are plain data: they hold offsets into the owning
/// [`LineTable`](crate::LineTable)'s regions rather than borrowed
/// sub-slices, so a `Vec<FuncRecord>` can outlive intermediate borrows. The
/// function name is the only resolved string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncRecord<'data> {
    /// Entry PC of the function.
    pub entry: u64,
    /// PC one past the last instruction, taken from the successor entry in
    /// the function table.
    pub end: u64,
    /// Offset of the descriptor within the function data region.
    pub desc_offset: u64,
    /// Offset of the name within the function name table.
    pub name_offset: u32,
    /// The function name.
    pub name: &'data str,
    /// Size of the argument frame in bytes.
    pub arg_size: u32,
    /// Offset of the deferreturn call from the entry, if any.
    pub defer_return: u32,
    /// Offset of the stack pointer delta table, zero when absent.
    pub off_pcsp: u32,
    /// Offset of the file number table, zero when absent.
    pub off_pcfile: u32,
    /// Offset of the line number table, zero when absent.
    pub off_pcln: u32,
    /// Number of numbered pcdata tables.
    pub num_pcdata: u32,
    /// Number of funcdata pointers.
    pub num_funcdata: u32,
    /// Runtime function ID for special functions.
    pub func_id: u8,
    /// Per-function flag bits; zero before the 1.16 layout.
    pub flag: u8,
    /// Offset into the compilation unit table; zero before the 1.16 layout.
    pub cu_offset: u32,
    /// Line number of the function declaration; zero before the 1.20 layout.
    pub start_line: i32,
    /// Table offsets for each pcdata index, zero entries meaning absent.
    pub pcdata_offsets: Vec<u32>,
}

/// A view of one packed descriptor inside the function data region.
pub(crate) struct Descriptor<'t, 'data> {
    table: &'t LineTable<'data>,
    offset: usize,
}

impl<'t, 'data> Descriptor<'t, 'data> {
    pub(crate) fn new(table: &'t LineTable<'data>, offset: u64) -> Self {
        Descriptor {
            table,
            offset: offset as usize,
        }
    }

    /// Reads the `n`th 4-byte field following the entry field.
    pub(crate) fn field(&self, n: u32) -> Result<u32, FormatError> {
        let t = self.table;
        let base = self.offset + t.version.entry_size(t.ptr_size);
        read_u32(t.funcdata, base + n as usize * 4, t.endian)
    }

    /// The entry PC encoded in the descriptor.
    pub(crate) fn entry(&self) -> Result<u64, FormatError> {
        let t = self.table;
        match t.version {
            Version::V12 | Version::V116 => {
                read_uptr(t.funcdata, self.offset, t.ptr_size, t.endian)
            }
            Version::V120 => {
                let off = read_u32(t.funcdata, self.offset, t.endian)?;
                Ok(t.text_start.wrapping_add(u64::from(off)))
            }
        }
    }
}

impl<'data> LineTable<'data> {
    /// Decodes every function descriptor in function table order.
    ///
    /// Fails with [`Malformed`](crate::FormatErrorKind::Malformed) if any
    /// descriptor lies outside the function data region, has a reversed PC
    /// range, or points an auxiliary table outside the value table region.
    pub fn functions(&self) -> Result<Vec<FuncRecord<'data>>, FormatError> {
        let mut funcs = Vec::with_capacity(self.nfunctab as usize);
        for index in 0..self.nfunctab as usize {
            funcs.push(self.read_func(index)?);
        }
        Ok(funcs)
    }

    /// Decodes the descriptor of the function at `index` in function table
    /// order.
    pub(crate) fn read_func(&self, index: usize) -> Result<FuncRecord<'data>, FormatError> {
        let (entry, end, desc_offset) = self.functab_entry(index)?;
        if end <= entry {
            return Err(FormatErrorKind::Malformed.into());
        }

        let desc = Descriptor::new(self, desc_offset);
        let name_offset = desc.field(0)?;
        let name = self.func_name(name_offset)?;
        let arg_size = desc.field(1)?;
        let defer_return = desc.field(2)?;
        let off_pcsp = self.checked_table_offset(desc.field(3)?)?;
        let off_pcfile = self.checked_table_offset(desc.field(4)?)?;
        let off_pcln = self.checked_table_offset(desc.field(5)?)?;
        let num_pcdata = desc.field(6)?;
        if num_pcdata as usize > self.funcdata.len() / 4 {
            return Err(FormatErrorKind::Malformed.into());
        }

        let packed = desc.field(self.version.packed_counts_field())?;
        let func_id = (packed >> 24) as u8;
        let flag = match self.version {
            Version::V12 => 0,
            Version::V116 | Version::V120 => (packed >> 8) as u8,
        };
        let num_funcdata = packed & 0xFF;

        let cu_offset = match self.version {
            Version::V12 => 0,
            Version::V116 | Version::V120 => desc.field(7)?,
        };
        let start_line = match self.version {
            Version::V12 | Version::V116 => 0,
            Version::V120 => desc.field(8)? as i32,
        };

        let pcdata_base = self.version.packed_counts_field() + 1;
        let mut pcdata_offsets = Vec::with_capacity(num_pcdata as usize);
        for tab in 0..num_pcdata {
            pcdata_offsets.push(self.checked_table_offset(desc.field(pcdata_base + tab)?)?);
        }

        Ok(FuncRecord {
            entry,
            end,
            desc_offset,
            name_offset,
            name,
            arg_size,
            defer_return,
            off_pcsp,
            off_pcfile,
            off_pcln,
            num_pcdata,
            num_funcdata,
            func_id,
            flag,
            cu_offset,
            start_line,
            pcdata_offsets,
        })
    }

    /// Reads one function table entry: entry PC, end PC (from the successor
    /// slot) and the descriptor offset.
    pub(crate) fn functab_entry(&self, index: usize) -> Result<(u64, u64, u64), FormatError> {
        let slot = self.version.functab_slot_size(self.ptr_size);
        match self.version {
            Version::V12 | Version::V116 => {
                let entry = read_uptr(self.functab, 2 * index * slot, self.ptr_size, self.endian)?;
                let end =
                    read_uptr(self.functab, (2 * index + 2) * slot, self.ptr_size, self.endian)?;
                let desc =
                    read_uptr(self.functab, (2 * index + 1) * slot, self.ptr_size, self.endian)?;
                Ok((entry, end, desc))
            }
            Version::V120 => {
                let entry = read_u32(self.functab, 2 * index * slot, self.endian)?;
                let end = read_u32(self.functab, (2 * index + 2) * slot, self.endian)?;
                let desc = read_u32(self.functab, (2 * index + 1) * slot, self.endian)?;
                Ok((
                    self.text_start.wrapping_add(u64::from(entry)),
                    self.text_start.wrapping_add(u64::from(end)),
                    u64::from(desc),
                ))
            }
        }
    }

    fn checked_table_offset(&self, offset: u32) -> Result<u32, FormatError> {
        if offset != 0 && offset as usize >= self.pctab.len() {
            return Err(FormatErrorKind::Malformed.into());
        }
        Ok(offset)
    }
}
