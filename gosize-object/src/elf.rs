use goblin::elf::Elf;

use crate::{BinaryInfo, ObjectError};

pub(crate) fn from_elf<'data>(
    elf: &Elf<'_>,
    data: &'data [u8],
) -> Result<BinaryInfo<'data>, ObjectError> {
    let mut text_start = 0;
    let mut pclntab = None;

    for shdr in &elf.section_headers {
        let name = elf.shdr_strtab.get_at(shdr.sh_name).unwrap_or_default();
        match name {
            ".text" => text_start = shdr.sh_offset,
            ".gopclntab" => {
                let start = shdr.sh_offset as usize;
                let end = start
                    .checked_add(shdr.sh_size as usize)
                    .ok_or(ObjectError::BadSectionData(".gopclntab"))?;
                pclntab = Some(
                    data.get(start..end)
                        .ok_or(ObjectError::BadSectionData(".gopclntab"))?,
                );
            }
            _ => {}
        }
    }

    let pclntab = pclntab.ok_or(ObjectError::MissingPclntab("ELF"))?;
    Ok(BinaryInfo {
        pclntab,
        text_start,
    })
}
