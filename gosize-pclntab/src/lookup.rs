use crate::error::{FormatError, FormatErrorKind};
use crate::funcs::{Descriptor, FuncRecord};
use crate::linetable::{LineTable, Version};
use crate::pcvalue::Cursor;
use crate::read::{read_cstr, read_u32};

/// Descriptor field holding the file number table offset.
const FIELD_PCFILE: u32 = 4;
/// Descriptor field holding the line number table offset.
const FIELD_PCLN: u32 = 5;
/// Descriptor field holding the compilation unit offset (1.16 and later).
const FIELD_CUOFFSET: u32 = 7;

impl<'data> LineTable<'data> {
    /// Returns the decoded descriptor of the function covering `pc`, found
    /// by binary search over the function table, or `None` when no function
    /// covers it.
    pub fn func_for_pc(&self, pc: u64) -> Result<Option<FuncRecord<'data>>, FormatError> {
        match self.find_func(pc)? {
            Some(index) => Ok(Some(self.read_func(index)?)),
            None => Ok(None),
        }
    }

    /// Returns the line number at `pc`.
    ///
    /// Fails with [`UnknownLine`](FormatErrorKind::UnknownLine) when no
    /// function covers `pc` or its line table has no entry for it.
    pub fn pc_to_line(&self, pc: u64) -> Result<u32, FormatError> {
        let index = self
            .find_func(pc)?
            .ok_or(FormatErrorKind::UnknownLine)?;
        let (_, _, desc_offset) = self.functab_entry(index)?;
        let desc = Descriptor::new(self, desc_offset);
        let entry = desc.entry()?;
        let line_table = desc.field(FIELD_PCLN)?;
        let line = self.pc_value_table().value_at(line_table, entry, pc)?;
        u32::try_from(line).map_err(|_| FormatErrorKind::UnknownLine.into())
    }

    /// Returns the source file name at `pc`.
    ///
    /// Fails with [`UnknownFile`](FormatErrorKind::UnknownFile) when no
    /// function covers `pc` or the file number does not resolve.
    pub fn pc_to_file(&self, pc: u64) -> Result<&'data str, FormatError> {
        let index = self
            .find_func(pc)?
            .ok_or(FormatErrorKind::UnknownFile)?;
        let (_, _, desc_offset) = self.functab_entry(index)?;
        let desc = Descriptor::new(self, desc_offset);
        let entry = desc.entry()?;
        let file_table = desc.field(FIELD_PCFILE)?;
        let file_number = self.pc_value_table().value_at(file_table, entry, pc)?;

        match self.version {
            Version::V12 => {
                // File number zero is reserved in this layout.
                if file_number <= 0 {
                    return Err(FormatErrorKind::UnknownFile.into());
                }
                let offset = read_u32(self.filetab, file_number as usize * 4, self.endian)?;
                read_cstr(self.data, offset)
            }
            Version::V116 | Version::V120 => {
                if file_number < 0 {
                    return Err(FormatErrorKind::UnknownFile.into());
                }
                let cu_offset = desc.field(FIELD_CUOFFSET)?;
                let index = (cu_offset as usize + file_number as usize) * 4;
                let name_offset = read_u32(self.cutab, index, self.endian)?;
                if name_offset == u32::MAX {
                    return Err(FormatErrorKind::UnknownFile.into());
                }
                read_cstr(self.filetab, name_offset)
            }
        }
    }

    /// Returns the first PC of the given line in the named file.
    ///
    /// Fails with [`UnknownFile`](FormatErrorKind::UnknownFile) when the
    /// file is not part of the program and with
    /// [`UnknownLine`](FormatErrorKind::UnknownLine) when no code maps to
    /// the line.
    pub fn line_to_pc(&self, file: &str, line: u32) -> Result<u64, FormatError> {
        let file_number = *self.files.get(file).ok_or_else(|| {
            FormatError::with_detail(FormatErrorKind::UnknownFile, file.to_owned())
        })?;

        // Most functions come from a single file, so their file tables are
        // short; scanning all of them is fine.
        for index in 0..self.nfunctab as usize {
            let (_, _, desc_offset) = self.functab_entry(index)?;
            let desc = Descriptor::new(self, desc_offset);
            let entry = desc.entry()?;
            let file_table = desc.field(FIELD_PCFILE)?;
            let line_table = desc.field(FIELD_PCLN)?;
            let cutab = match self.version {
                Version::V12 => None,
                Version::V116 | Version::V120 => {
                    let cu_offset = desc.field(FIELD_CUOFFSET)? as usize;
                    Some(
                        self.cutab
                            .get(cu_offset * 4..)
                            .ok_or(FormatErrorKind::Malformed)?,
                    )
                }
            };
            if let Some(pc) = self.find_file_line(
                entry,
                file_table,
                line_table,
                file_number as i32,
                line as i32,
                cutab,
            )? {
                return Ok(pc);
            }
        }
        Err(FormatError::with_detail(
            FormatErrorKind::UnknownLine,
            format!("{file}:{line}"),
        ))
    }

    /// Returns the function table index of the function containing `pc`.
    fn find_func(&self, pc: u64) -> Result<Option<usize>, FormatError> {
        let mut lo = 0usize;
        let mut hi = self.nfunctab as usize;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (entry, end, _) = self.functab_entry(mid)?;
            if pc < entry {
                hi = mid;
            } else if pc >= end {
                lo = mid + 1;
            } else {
                return Ok(Some(mid));
            }
        }
        Ok(None)
    }

    /// Scans one function for a PC in `file_number` on `line`.
    ///
    /// Runs the file table and, inside each matching file range, the line
    /// table, both in lockstep.
    fn find_file_line(
        &self,
        entry: u64,
        file_table: u32,
        line_table: u32,
        file_number: i32,
        line: i32,
        cutab: Option<&[u8]>,
    ) -> Result<Option<u64>, FormatError> {
        if file_table == 0 || line_table == 0 {
            return Ok(None);
        }
        let values = self.pc_value_table();
        let mut file_cursor = Cursor::new(&values, file_table, entry)?;
        let mut line_cursor = Cursor::new(&values, line_table, entry)?;
        let mut file_start_pc = entry;
        while file_cursor.step()? {
            let file_index = match cutab {
                None => file_cursor.value,
                Some(cutab) if file_cursor.value >= 0 => {
                    read_u32(cutab, file_cursor.value as usize * 4, self.endian)? as i32
                }
                Some(_) => -1,
            };
            if file_index == file_number && file_start_pc < file_cursor.pc {
                // The file matches from file_start_pc up to but not
                // including the cursor PC; run the line table over that
                // window.
                let mut line_start_pc = line_cursor.pc;
                while line_cursor.pc < file_cursor.pc && line_cursor.step()? {
                    if line_cursor.value == line {
                        if file_start_pc <= line_start_pc {
                            return Ok(Some(line_start_pc));
                        }
                        if file_start_pc < line_cursor.pc {
                            return Ok(Some(file_start_pc));
                        }
                    }
                    line_start_pc = line_cursor.pc;
                }
            }
            file_start_pc = file_cursor.pc;
        }
        Ok(None)
    }
}
