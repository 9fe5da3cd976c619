use goblin::pe::PE;

use crate::{BinaryInfo, ObjectError};

/// The pclntab of a PE binary has no section of its own; it sits between
/// two runtime symbols inside a larger section.
pub(crate) fn from_pe<'data>(
    pe: &PE<'_>,
    data: &'data [u8],
) -> Result<BinaryInfo<'data>, ObjectError> {
    let coff = &pe.header.coff_header;
    let symbols = coff
        .symbols(data)
        .map_err(|e| ObjectError::Malformed("PE", e))?;
    let strings = coff
        .strings(data)
        .map_err(|e| ObjectError::Malformed("PE", e))?;

    let mut start = None;
    let mut end = None;
    let mut section_number = 0i16;
    for (_, inline_name, symbol) in symbols.iter() {
        let name = match inline_name {
            Some(name) => name,
            None => match symbol.name(&strings) {
                Ok(name) => name,
                Err(_) => continue,
            },
        };
        match name {
            "runtime.pclntab" => {
                start = Some(u64::from(symbol.value));
                section_number = symbol.section_number;
            }
            "runtime.epclntab" => end = Some(u64::from(symbol.value)),
            _ => {}
        }
    }
    let start = start.ok_or(ObjectError::MissingSymbol("runtime.pclntab"))?;
    let end = end.ok_or(ObjectError::MissingSymbol("runtime.epclntab"))?;
    if section_number < 1 || end < start {
        return Err(ObjectError::BadSectionData("pclntab"));
    }

    // Symbol values are relative to their section; section numbers are
    // 1-based.
    let section = pe
        .sections
        .get(section_number as usize - 1)
        .ok_or(ObjectError::BadSectionData("pclntab"))?;
    let offset = u64::from(section.pointer_to_raw_data) + start;
    let pclntab = data
        .get(offset as usize..(offset + (end - start)) as usize)
        .ok_or(ObjectError::BadSectionData("pclntab"))?;

    let mut text_start = 0;
    for section in &pe.sections {
        if let Ok(".text") = section.name() {
            text_start = u64::from(section.pointer_to_raw_data);
        }
    }

    Ok(BinaryInfo {
        pclntab,
        text_start,
    })
}
