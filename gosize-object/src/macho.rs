use goblin::mach::{Mach, MachO};

use crate::{BinaryInfo, ObjectError};

pub(crate) fn from_mach<'data>(
    mach: &Mach<'data>,
    data: &'data [u8],
) -> Result<BinaryInfo<'data>, ObjectError> {
    match mach {
        Mach::Binary(macho) => from_macho(macho),
        Mach::Fat(fat) => {
            // Take the first slice that yields a pclntab.
            let arches = fat
                .arches()
                .map_err(|e| ObjectError::Malformed("fat Mach-O", e))?;
            for arch in arches {
                let start = arch.offset as usize;
                let end = start
                    .checked_add(arch.size as usize)
                    .ok_or(ObjectError::BadSectionData("fat arch"))?;
                let slice = data
                    .get(start..end)
                    .ok_or(ObjectError::BadSectionData("fat arch"))?;
                if let Ok(info) = BinaryInfo::parse(slice) {
                    return Ok(info);
                }
            }
            Err(ObjectError::MissingPclntab("fat Mach-O"))
        }
    }
}

fn from_macho<'data>(macho: &MachO<'data>) -> Result<BinaryInfo<'data>, ObjectError> {
    let mut text_start = 0;
    let mut pclntab = None;

    for segment in &macho.segments {
        let sections = segment
            .sections()
            .map_err(|e| ObjectError::Malformed("Mach-O", e))?;
        for (section, section_data) in sections {
            let name = match section.name() {
                Ok(name) => name,
                Err(_) => continue,
            };
            match name {
                "__text" => text_start = u64::from(section.offset),
                "__gopclntab" => pclntab = Some(section_data),
                _ => {}
            }
        }
    }

    let pclntab = pclntab.ok_or(ObjectError::MissingPclntab("Mach-O"))?;
    Ok(BinaryInfo {
        pclntab,
        text_start,
    })
}
