use goblin::archive::Archive;

use crate::{BinaryInfo, ObjectError};

/// Buildmode archives place the Go code in a `go.o` member.
pub(crate) fn from_archive<'data>(
    archive: &Archive<'_>,
    data: &'data [u8],
) -> Result<BinaryInfo<'data>, ObjectError> {
    let member = archive
        .extract("go.o", data)
        .map_err(|_| ObjectError::MissingGoObject)?;
    BinaryInfo::parse(member)
}
