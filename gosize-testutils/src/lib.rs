//! Fabricates pclntab blobs for tests.
//!
//! Real tables come out of a Go toolchain; the tests in this workspace
//! instead assemble small synthetic tables with known contents. The builder
//! produces all three format generations and both byte orders.

/// The format generation to fabricate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gen {
    /// The Go 1.2 layout.
    V12,
    /// The Go 1.16 layout.
    V116,
    /// The Go 1.20 layout.
    V120,
}

/// One function to place in the fabricated table.
#[derive(Debug, Clone)]
pub struct FuncFixture {
    /// Function name.
    pub name: String,
    /// Entry PC. Must be ascending across fixtures.
    pub entry: u64,
    /// Raw stack delta table bytes, empty for none.
    pub pcsp: Vec<u8>,
    /// Raw file number table bytes, empty for none.
    pub pcfile: Vec<u8>,
    /// Raw line number table bytes, empty for none.
    pub pcln: Vec<u8>,
    /// Raw numbered pcdata tables; an empty entry encodes offset zero.
    pub pcdata: Vec<Vec<u8>>,
    /// Number of funcdata pointers to claim.
    pub num_funcdata: u8,
    /// Runtime function ID byte.
    pub func_id: u8,
    /// Argument frame size.
    pub arg_size: u32,
    /// Deferreturn offset.
    pub defer_return: u32,
    /// Compilation unit offset (1.16 and later layouts).
    pub cu_offset: u32,
    /// Declaration line (1.20 layout).
    pub start_line: i32,
}

impl FuncFixture {
    /// A fixture with the given name and entry and no auxiliary tables.
    pub fn new(name: &str, entry: u64) -> Self {
        FuncFixture {
            name: name.to_owned(),
            entry,
            pcsp: Vec::new(),
            pcfile: Vec::new(),
            pcln: Vec::new(),
            pcdata: Vec::new(),
            num_funcdata: 0,
            func_id: 0,
            arg_size: 0,
            defer_return: 0,
            cu_offset: 0,
            start_line: 0,
        }
    }
}

/// Assembles a pclntab blob from function and file fixtures.
pub struct PclntabBuilder {
    gen: Gen,
    quantum: u8,
    ptr_size: u8,
    big_endian: bool,
    text_start: u64,
    end_pc: u64,
    funcs: Vec<FuncFixture>,
    files: Vec<String>,
}

impl PclntabBuilder {
    /// A little-endian builder with quantum 1 and 8-byte pointers.
    pub fn new(gen: Gen) -> Self {
        PclntabBuilder {
            gen,
            quantum: 1,
            ptr_size: 8,
            big_endian: false,
            text_start: 0,
            end_pc: 0,
            funcs: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Sets the PC quantum byte.
    pub fn quantum(mut self, quantum: u8) -> Self {
        self.quantum = quantum;
        self
    }

    /// Sets the pointer width byte.
    pub fn ptr_size(mut self, ptr_size: u8) -> Self {
        self.ptr_size = ptr_size;
        self
    }

    /// Emits the table in big-endian byte order.
    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    /// Sets the text start address recorded in the 1.20 header.
    pub fn text_start(mut self, text_start: u64) -> Self {
        self.text_start = text_start;
        self
    }

    /// Sets the end-of-text sentinel stored after the last function entry.
    ///
    /// Defaults to the last entry plus 0x100.
    pub fn end_pc(mut self, end_pc: u64) -> Self {
        self.end_pc = end_pc;
        self
    }

    /// Appends a function fixture.
    pub fn func(mut self, func: FuncFixture) -> Self {
        self.funcs.push(func);
        self
    }

    /// Appends a file name to the file table.
    pub fn file(mut self, name: &str) -> Self {
        self.files.push(name.to_owned());
        self
    }

    /// Assembles the blob.
    pub fn build(self) -> Vec<u8> {
        let end_pc = if self.end_pc != 0 {
            self.end_pc
        } else {
            self.funcs.iter().map(|f| f.entry).max().unwrap_or(0) + 0x100
        };
        match self.gen {
            Gen::V12 => self.build_v12(end_pc),
            Gen::V116 | Gen::V120 => self.build_v116plus(end_pc),
        }
    }

    fn magic(&self) -> u32 {
        match self.gen {
            Gen::V12 => 0xFFFF_FFFB,
            Gen::V116 => 0xFFFF_FFFA,
            Gen::V120 => 0xFFFF_FFF0,
        }
    }

    fn header(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_u32(&mut buf, self.magic(), self.big_endian);
        buf.extend([0, 0, self.quantum, self.ptr_size]);
        buf
    }

    fn build_v12(self, end_pc: u64) -> Vec<u8> {
        let be = self.big_endian;
        let p = self.ptr_size;
        let n = self.funcs.len();

        let mut buf = self.header();
        put_uptr(&mut buf, n as u64, p, be);
        let functab_pos = buf.len();
        buf.resize(buf.len() + (2 * n + 1) * p as usize, 0);
        let fileoff_pos = buf.len();
        buf.resize(buf.len() + 4, 0);

        // Auxiliary tables and names first so descriptors can refer to them.
        let mut table_offsets = Vec::new();
        for func in &self.funcs {
            table_offsets.push(append_tables(&mut buf, func));
        }
        let mut name_offsets = Vec::new();
        for func in &self.funcs {
            name_offsets.push(buf.len() as u32);
            buf.extend(func.name.as_bytes());
            buf.push(0);
        }

        let mut desc_offsets = Vec::new();
        for (i, func) in self.funcs.iter().enumerate() {
            desc_offsets.push(buf.len() as u64);
            put_uptr(&mut buf, func.entry, p, be);
            let offsets = &table_offsets[i];
            for value in [
                name_offsets[i],
                func.arg_size,
                func.defer_return,
                offsets.pcsp,
                offsets.pcfile,
                offsets.pcln,
                func.pcdata.len() as u32,
                (u32::from(func.func_id) << 24) | u32::from(func.num_funcdata),
            ] {
                put_u32(&mut buf, value, be);
            }
            for off in &offsets.pcdata {
                put_u32(&mut buf, *off, be);
            }
        }

        for (i, func) in self.funcs.iter().enumerate() {
            patch_uptr(&mut buf, functab_pos + 2 * i * p as usize, func.entry, p, be);
            patch_uptr(
                &mut buf,
                functab_pos + (2 * i + 1) * p as usize,
                desc_offsets[i],
                p,
                be,
            );
        }
        patch_uptr(&mut buf, functab_pos + 2 * n * p as usize, end_pc, p, be);

        // File table: a count, then one offset slot per 1-based file number.
        let fileoff = buf.len() as u32;
        patch_u32(&mut buf, fileoff_pos, fileoff, be);
        put_u32(&mut buf, self.files.len() as u32 + 1, be);
        let slots_pos = buf.len();
        buf.resize(buf.len() + 4 * self.files.len(), 0);
        for (i, file) in self.files.iter().enumerate() {
            let offset = buf.len() as u32;
            patch_u32(&mut buf, slots_pos + 4 * i, offset, be);
            buf.extend(file.as_bytes());
            buf.push(0);
        }

        buf
    }

    fn build_v116plus(self, end_pc: u64) -> Vec<u8> {
        let be = self.big_endian;
        let p = self.ptr_size;
        let n = self.funcs.len();
        let slot = match self.gen {
            Gen::V116 => p as usize,
            _ => 4,
        };

        let mut funcnametab = Vec::new();
        let mut name_offsets = Vec::new();
        for func in &self.funcs {
            name_offsets.push(funcnametab.len() as u32);
            funcnametab.extend(func.name.as_bytes());
            funcnametab.push(0);
        }

        let mut filetab = Vec::new();
        let mut file_offsets = Vec::new();
        for file in &self.files {
            file_offsets.push(filetab.len() as u32);
            filetab.extend(file.as_bytes());
            filetab.push(0);
        }

        // One compilation unit mapping local file indices straight onto the
        // file table.
        let mut cutab = Vec::new();
        for off in &file_offsets {
            put_u32(&mut cutab, *off, be);
        }

        // Offset zero inside the value table region means "no table"; burn
        // the first byte so real tables never land there.
        let mut pctab = vec![0xFF];
        let mut table_offsets = Vec::new();
        for func in &self.funcs {
            table_offsets.push(append_tables(&mut pctab, func));
        }

        let mut funcdata = Vec::new();
        funcdata.resize((2 * n + 1) * slot, 0);
        let mut desc_offsets = Vec::new();
        for (i, func) in self.funcs.iter().enumerate() {
            desc_offsets.push(funcdata.len() as u64);
            match self.gen {
                Gen::V116 => put_uptr(&mut funcdata, func.entry, p, be),
                _ => put_u32(&mut funcdata, (func.entry - self.text_start) as u32, be),
            }
            let offsets = &table_offsets[i];
            let packed = (u32::from(func.func_id) << 24) | u32::from(func.num_funcdata);
            let mut fields = vec![
                name_offsets[i],
                func.arg_size,
                func.defer_return,
                offsets.pcsp,
                offsets.pcfile,
                offsets.pcln,
                func.pcdata.len() as u32,
                func.cu_offset,
            ];
            match self.gen {
                Gen::V116 => fields.push(packed),
                _ => {
                    fields.push(func.start_line as u32);
                    fields.push(packed);
                }
            }
            fields.extend(&offsets.pcdata);
            for value in fields {
                put_u32(&mut funcdata, value, be);
            }
        }

        for (i, func) in self.funcs.iter().enumerate() {
            let (entry_slot, desc_slot) = (2 * i * slot, (2 * i + 1) * slot);
            match self.gen {
                Gen::V116 => {
                    patch_uptr(&mut funcdata, entry_slot, func.entry, p, be);
                    patch_uptr(&mut funcdata, desc_slot, desc_offsets[i], p, be);
                }
                _ => {
                    patch_u32(
                        &mut funcdata,
                        entry_slot,
                        (func.entry - self.text_start) as u32,
                        be,
                    );
                    patch_u32(&mut funcdata, desc_slot, desc_offsets[i] as u32, be);
                }
            }
        }
        match self.gen {
            Gen::V116 => patch_uptr(&mut funcdata, 2 * n * slot, end_pc, p, be),
            _ => patch_u32(
                &mut funcdata,
                2 * n * slot,
                (end_pc - self.text_start) as u32,
                be,
            ),
        }

        // Assemble: header, the pointer-sized words, then the regions.
        let num_words = match self.gen {
            Gen::V116 => 7,
            _ => 8,
        };
        let mut buf = self.header();
        let words_pos = buf.len();
        buf.resize(buf.len() + num_words * p as usize, 0);

        let mut offsets = Vec::new();
        for region in [&funcnametab, &cutab, &filetab, &pctab, &funcdata] {
            offsets.push(buf.len() as u64);
            buf.extend(region.iter());
        }

        let mut words = vec![n as u64, self.files.len() as u64];
        if self.gen == Gen::V120 {
            words.push(self.text_start);
        }
        words.extend(&offsets);
        for (i, word) in words.iter().enumerate() {
            patch_uptr(&mut buf, words_pos + i * p as usize, *word, p, be);
        }

        buf
    }
}

struct TableOffsets {
    pcsp: u32,
    pcfile: u32,
    pcln: u32,
    pcdata: Vec<u32>,
}

fn append_tables(buf: &mut Vec<u8>, func: &FuncFixture) -> TableOffsets {
    let mut append = |bytes: &[u8]| -> u32 {
        if bytes.is_empty() {
            return 0;
        }
        let offset = buf.len() as u32;
        buf.extend(bytes);
        offset
    };
    TableOffsets {
        pcsp: append(&func.pcsp),
        pcfile: append(&func.pcfile),
        pcln: append(&func.pcln),
        pcdata: func.pcdata.iter().map(|t| append(t)).collect(),
    }
}

/// Encodes an unsigned base-128 varint.
pub fn uvarint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
    out
}

/// Encodes a PC-value table from (value delta, PC delta) pairs, appending
/// the zero terminator.
pub fn pcvalue_bytes(pairs: &[(i32, u64)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (value_delta, pc_delta) in pairs {
        let unsigned = if *value_delta < 0 {
            (!(*value_delta as u32) << 1) | 1
        } else {
            (*value_delta as u32) << 1
        };
        out.extend(uvarint(u64::from(unsigned)));
        out.extend(uvarint(*pc_delta));
    }
    out.push(0);
    out
}

fn put_u32(buf: &mut Vec<u8>, value: u32, big_endian: bool) {
    if big_endian {
        buf.extend(value.to_be_bytes());
    } else {
        buf.extend(value.to_le_bytes());
    }
}

fn put_uptr(buf: &mut Vec<u8>, value: u64, ptr_size: u8, big_endian: bool) {
    if ptr_size == 4 {
        put_u32(buf, value as u32, big_endian);
    } else if big_endian {
        buf.extend(value.to_be_bytes());
    } else {
        buf.extend(value.to_le_bytes());
    }
}

fn patch_u32(buf: &mut [u8], pos: usize, value: u32, big_endian: bool) {
    let bytes = if big_endian {
        value.to_be_bytes()
    } else {
        value.to_le_bytes()
    };
    buf[pos..pos + 4].copy_from_slice(&bytes);
}

fn patch_uptr(buf: &mut [u8], pos: usize, value: u64, ptr_size: u8, big_endian: bool) {
    if ptr_size == 4 {
        patch_u32(buf, pos, value as u32, big_endian);
        return;
    }
    let bytes = if big_endian {
        value.to_be_bytes()
    } else {
        value.to_le_bytes()
    };
    buf[pos..pos + 8].copy_from_slice(&bytes);
}
