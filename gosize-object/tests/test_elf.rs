use gosize_object::{BinaryInfo, ObjectError};
use gosize_pclntab::LineTable;
use gosize_testutils::{FuncFixture, Gen, PclntabBuilder};

/// Assembles a minimal 64-bit little-endian ELF with a .text section, a
/// payload section and a section string table. When `named` is false the
/// payload section is not called .gopclntab.
fn minimal_elf(payload: &[u8], named: bool) -> Vec<u8> {
    let text: &[u8] = &[0x90; 16];
    let shstrtab: &[u8] = b"\0.text\0.gopclntab\0.shstrtab\0";
    let text_off = 64usize;
    let payload_off = text_off + text.len();
    let strtab_off = payload_off + payload.len();
    let shoff = strtab_off + shstrtab.len();

    let mut buf = Vec::new();
    buf.extend(*b"\x7FELF");
    buf.extend([2, 1, 1, 0]); // 64-bit, little-endian, current version
    buf.extend([0u8; 8]);
    buf.extend(2u16.to_le_bytes()); // ET_EXEC
    buf.extend(0x3Eu16.to_le_bytes()); // EM_X86_64
    buf.extend(1u32.to_le_bytes());
    buf.extend(0u64.to_le_bytes()); // e_entry
    buf.extend(0u64.to_le_bytes()); // e_phoff
    buf.extend((shoff as u64).to_le_bytes());
    buf.extend(0u32.to_le_bytes()); // e_flags
    buf.extend(64u16.to_le_bytes()); // e_ehsize
    buf.extend(56u16.to_le_bytes()); // e_phentsize
    buf.extend(0u16.to_le_bytes()); // e_phnum
    buf.extend(64u16.to_le_bytes()); // e_shentsize
    buf.extend(4u16.to_le_bytes()); // e_shnum
    buf.extend(3u16.to_le_bytes()); // e_shstrndx
    assert_eq!(buf.len(), 64);

    buf.extend(text);
    buf.extend(payload);
    buf.extend(shstrtab);

    let mut push_shdr = |name: u32, sh_type: u32, offset: usize, size: usize| {
        buf.extend(name.to_le_bytes());
        buf.extend(sh_type.to_le_bytes());
        buf.extend(0u64.to_le_bytes()); // sh_flags
        buf.extend(0u64.to_le_bytes()); // sh_addr
        buf.extend((offset as u64).to_le_bytes());
        buf.extend((size as u64).to_le_bytes());
        buf.extend(0u32.to_le_bytes()); // sh_link
        buf.extend(0u32.to_le_bytes()); // sh_info
        buf.extend(1u64.to_le_bytes()); // sh_addralign
        buf.extend(0u64.to_le_bytes()); // sh_entsize
    };
    push_shdr(0, 0, 0, 0);
    push_shdr(1, 1, text_off, text.len()); // .text
    push_shdr(if named { 7 } else { 1 }, 1, payload_off, payload.len());
    push_shdr(18, 3, strtab_off, shstrtab.len()); // .shstrtab

    buf
}

fn sample_pclntab() -> Vec<u8> {
    PclntabBuilder::new(Gen::V12)
        .func(FuncFixture::new("main.main", 0x1000))
        .build()
}

#[test]
fn test_extract_from_elf() {
    let pclntab = sample_pclntab();
    let elf = minimal_elf(&pclntab, true);
    let info = BinaryInfo::parse(&elf).unwrap();
    assert_eq!(info.pclntab, pclntab.as_slice());
    assert_eq!(info.text_start, 64);

    // The extracted blob decodes end to end.
    let table = LineTable::parse(info.pclntab, info.text_start).unwrap();
    assert_eq!(table.num_functions(), 1);
    assert_eq!(table.functions().unwrap()[0].name, "main.main");
}

#[test]
fn test_elf_without_pclntab() {
    let elf = minimal_elf(&[0xAA; 8], false);
    assert!(matches!(
        BinaryInfo::parse(&elf).unwrap_err(),
        ObjectError::MissingPclntab("ELF")
    ));
}
