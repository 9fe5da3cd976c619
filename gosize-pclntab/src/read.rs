use scroll::{Endian, Pread};

use crate::error::{FormatError, FormatErrorKind};

/// Longest encoding of a 64-bit unsigned varint.
const MAX_UVARINT_LEN: usize = 10;

/// Reads a 32-bit word at `offset`.
pub(crate) fn read_u32(data: &[u8], offset: usize, endian: Endian) -> Result<u32, FormatError> {
    data.pread_with::<u32>(offset, endian)
        .map_err(|_| FormatErrorKind::Malformed.into())
}

/// Reads a pointer-sized word at `offset`, widened to 64 bits.
pub(crate) fn read_uptr(
    data: &[u8],
    offset: usize,
    ptr_size: u32,
    endian: Endian,
) -> Result<u64, FormatError> {
    if ptr_size == 4 {
        Ok(u64::from(read_u32(data, offset, endian)?))
    } else {
        data.pread_with::<u64>(offset, endian)
            .map_err(|_| FormatErrorKind::Malformed.into())
    }
}

/// Decodes an unsigned base-128 varint at the start of `data`, returning the
/// value and the number of bytes consumed.
///
/// Groups are little-endian with the high bit set on continuation. An empty
/// slice or a missing final group is malformed.
pub(crate) fn read_uvarint(data: &[u8]) -> Result<(u64, usize), FormatError> {
    let mut value: u64 = 0;
    for (i, byte) in data.iter().take(MAX_UVARINT_LEN).enumerate() {
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(FormatErrorKind::Malformed.into())
}

/// Decodes a signed varint at the start of `data`, returning the value and
/// the number of bytes consumed.
///
/// The sign lives in the low bit of the unsigned encoding and the magnitude
/// in the remaining bits: an odd encoding `u` decodes to `!(u >> 1)`.
pub(crate) fn read_varint(data: &[u8]) -> Result<(i64, usize), FormatError> {
    let (unsigned, consumed) = read_uvarint(data)?;
    Ok((zigzag(unsigned) as i64, consumed))
}

/// Applies the low-bit sign transform to an unsigned delta.
pub(crate) fn zigzag(unsigned: u64) -> i32 {
    let value = if unsigned & 1 != 0 {
        !(unsigned >> 1)
    } else {
        unsigned >> 1
    };
    value as i32
}

/// Reads the NUL-terminated string starting at `offset`.
///
/// The terminator must be present inside `data`; the returned slice does not
/// include it.
pub(crate) fn read_cstr(data: &[u8], offset: u32) -> Result<&str, FormatError> {
    let tail = data
        .get(offset as usize..)
        .ok_or(FormatErrorKind::Malformed)?;
    let bytes = match tail.iter().position(|b| *b == 0) {
        Some(nul) => &tail[..nul],
        None => return Err(FormatErrorKind::Malformed.into()),
    };
    std::str::from_utf8(bytes).map_err(|e| FormatError::with_detail(FormatErrorKind::Malformed, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_uvarint() {
        let cases: &[(&[u8], u64, usize)] = &[
            (&[0x00], 0, 1),
            (&[0x02], 2, 1),
            (&[0x7F], 0x7F, 1),
            (&[0x80, 0x01], 0x80, 2),
            (&[0xAC, 0x02], 300, 2),
            (&[0xFF, 0xFF, 0x03], 0xFFFF, 3),
            (&[0x05, 0x99], 5, 1),
        ];
        for (input, value, consumed) in cases {
            assert_eq!(read_uvarint(input).unwrap(), (*value, *consumed));
        }
    }

    #[test]
    fn test_read_uvarint_malformed() {
        assert_eq!(
            read_uvarint(&[]).unwrap_err().kind(),
            FormatErrorKind::Malformed
        );
        // Continuation bit set on the last available byte.
        assert_eq!(
            read_uvarint(&[0x80]).unwrap_err().kind(),
            FormatErrorKind::Malformed
        );
        assert_eq!(
            read_uvarint(&[0xFF, 0xFF]).unwrap_err().kind(),
            FormatErrorKind::Malformed
        );
    }

    #[test]
    fn test_read_varint_sign() {
        let cases: &[(&[u8], i64)] = &[
            (&[0x00], 0),
            (&[0x01], -1),
            (&[0x02], 1),
            (&[0x03], -2),
            (&[0x04], 2),
        ];
        for (input, value) in cases {
            assert_eq!(read_varint(input).unwrap(), (*value, 1));
        }
    }

    #[test]
    fn test_read_uptr() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(
            read_uptr(&bytes, 0, 4, Endian::Little).unwrap(),
            0x0403_0201
        );
        assert_eq!(read_uptr(&bytes, 0, 4, Endian::Big).unwrap(), 0x0102_0304);
        assert_eq!(
            read_uptr(&bytes, 0, 8, Endian::Little).unwrap(),
            0x0807_0605_0403_0201
        );
        assert!(read_uptr(&bytes, 4, 8, Endian::Little).is_err());
    }

    #[test]
    fn test_read_cstr() {
        let data = b"main.main\x00runtime.gc\x00";
        assert_eq!(read_cstr(data, 0).unwrap(), "main.main");
        assert_eq!(read_cstr(data, 10).unwrap(), "runtime.gc");
        // No terminator before the end of the region.
        assert!(read_cstr(b"truncated", 0).is_err());
        assert!(read_cstr(data, 64).is_err());
    }
}
