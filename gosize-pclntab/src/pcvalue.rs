use crate::error::{FormatError, FormatErrorKind};
use crate::read::{read_uvarint, read_varint};

/// A decoder for the varint-delta encoded PC-value tables of a pclntab.
///
/// Every auxiliary table of a function (pcsp, pcfile, pcln and the numbered
/// pcdata tables) shares this encoding: a sequence of (value delta,
/// PC delta) varint pairs terminated by a zero value delta. The running
/// value starts at -1 and the running PC at the function entry; PC deltas
/// are scaled by the PC quantum.
///
/// An offset of zero always means "no table".
#[derive(Debug, Clone, Copy)]
pub struct PcValueTable<'data> {
    data: &'data [u8],
    quantum: u32,
}

/// One decoded step of a PC-value table.
///
/// The value is in effect from the previous step's PC (or the function
/// entry) up to but not including [`pc`](Self::pc).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// The running value after applying this step's delta.
    pub value: i32,
    /// Encoded size of the value delta.
    pub value_bytes: usize,
    /// The running PC after applying this step's delta.
    pub pc: u64,
    /// Encoded size of the PC delta.
    pub pc_bytes: usize,
}

impl<'data> PcValueTable<'data> {
    pub(crate) fn new(data: &'data [u8], quantum: u32) -> Self {
        PcValueTable { data, quantum }
    }

    /// Invokes `visit` for every step of the table at `offset`.
    ///
    /// `entry` and `end` are the PC range of the owning function; decoding
    /// stops at the terminator or as soon as the running PC reaches `end`,
    /// whichever comes first.
    pub fn for_each(
        &self,
        offset: u32,
        entry: u64,
        end: u64,
        visit: impl FnMut(Step),
    ) -> Result<(), FormatError> {
        self.walk(offset, entry, end, visit).map(|_| ())
    }

    /// Returns the number of encoded bytes the table at `offset` occupies,
    /// including the terminator when one is read.
    ///
    /// This is the quantity the size attribution charges to a function for
    /// each of its auxiliary tables. An absent table (offset zero) has size
    /// zero.
    pub fn size(&self, offset: u32, entry: u64, end: u64) -> Result<usize, FormatError> {
        self.walk(offset, entry, end, |_| {})
    }

    /// Returns the value in effect at `target`, or -1 if the table does not
    /// cover it.
    pub fn value_at(&self, offset: u32, entry: u64, target: u64) -> Result<i32, FormatError> {
        if offset == 0 {
            return Ok(-1);
        }
        let mut data = self
            .data
            .get(offset as usize..)
            .ok_or(FormatErrorKind::Malformed)?;
        let mut pc = entry;
        let mut value: i32 = -1;
        let mut first = true;
        loop {
            if data.is_empty() {
                if first {
                    return Err(FormatErrorKind::Malformed.into());
                }
                return Ok(-1);
            }
            let (value_delta, value_bytes) = read_varint(data)?;
            if value_delta == 0 && !first {
                return Ok(-1);
            }
            data = &data[value_bytes..];
            let (pc_delta, pc_bytes) = read_uvarint(data)?;
            data = &data[pc_bytes..];
            value = value.wrapping_add(value_delta as i32);
            pc = pc.wrapping_add(pc_delta.wrapping_mul(u64::from(self.quantum)));
            if target < pc {
                return Ok(value);
            }
            first = false;
        }
    }

    fn walk(
        &self,
        offset: u32,
        entry: u64,
        end: u64,
        mut visit: impl FnMut(Step),
    ) -> Result<usize, FormatError> {
        if offset == 0 {
            return Ok(0);
        }
        let mut data = self
            .data
            .get(offset as usize..)
            .ok_or(FormatErrorKind::Malformed)?;
        let mut pc = entry;
        let mut value: i32 = -1;
        let mut first = true;
        let mut consumed = 0;
        while pc < end {
            if data.is_empty() {
                // A table running to the very end of the region terminates
                // without its closing byte.
                if first {
                    return Err(FormatErrorKind::Malformed.into());
                }
                break;
            }
            let (value_delta, value_bytes) = read_varint(data)?;
            consumed += value_bytes;
            if value_delta == 0 && !first {
                break;
            }
            data = &data[value_bytes..];
            let (pc_delta, pc_bytes) = read_uvarint(data)?;
            consumed += pc_bytes;
            data = &data[pc_bytes..];
            value = value.wrapping_add(value_delta as i32);
            pc = pc.wrapping_add(pc_delta.wrapping_mul(u64::from(self.quantum)));
            visit(Step {
                value,
                value_bytes,
                pc,
                pc_bytes,
            });
            first = false;
        }
        Ok(consumed)
    }
}

/// A stepping cursor over one PC-value table, used where two tables have to
/// be advanced in lockstep.
pub(crate) struct Cursor<'data> {
    data: &'data [u8],
    quantum: u32,
    pub(crate) pc: u64,
    pub(crate) value: i32,
    first: bool,
}

impl<'data> Cursor<'data> {
    pub(crate) fn new(
        table: &PcValueTable<'data>,
        offset: u32,
        entry: u64,
    ) -> Result<Self, FormatError> {
        let data = table
            .data
            .get(offset as usize..)
            .ok_or(FormatErrorKind::Malformed)?;
        Ok(Cursor {
            data,
            quantum: table.quantum,
            pc: entry,
            value: -1,
            first: true,
        })
    }

    /// Advances one step; returns false at the terminator or when the table
    /// runs out of bytes.
    pub(crate) fn step(&mut self) -> Result<bool, FormatError> {
        if self.data.is_empty() {
            return Ok(false);
        }
        let (value_delta, value_bytes) = read_varint(self.data)?;
        if value_delta == 0 && !self.first {
            return Ok(false);
        }
        self.data = &self.data[value_bytes..];
        let (pc_delta, pc_bytes) = read_uvarint(self.data)?;
        self.data = &self.data[pc_bytes..];
        self.value = self.value.wrapping_add(value_delta as i32);
        self.pc = self
            .pc
            .wrapping_add(pc_delta.wrapping_mul(u64::from(self.quantum)));
        self.first = false;
        Ok(true)
    }
}
