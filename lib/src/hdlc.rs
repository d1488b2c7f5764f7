//! HDLC-like framing used by the diag protocol. Each frame is the escaped
//! payload, followed by an escaped little-endian CRC-16/CCITT of the payload,
//! followed by a single unescaped terminator byte.

use bytes::Buf;
use crc::{Algorithm, Crc};
use thiserror::Error;

pub const MESSAGE_TERMINATOR: u8 = 0x7e;
pub const MESSAGE_ESCAPE_CHAR: u8 = 0x7d;

pub const ESCAPED_MESSAGE_TERMINATOR: u8 = 0x5e;
pub const ESCAPED_MESSAGE_ESCAPE_CHAR: u8 = 0x5d;

// same parameters QCSuper and scat use for diag frames
pub const CRC_CCITT_ALG: Algorithm<u16> = Algorithm {
    poly: 0x1021,
    init: 0xffff,
    refin: true,
    refout: true,
    width: 16,
    xorout: 0xffff,
    check: 0x2189,
    residue: 0x0000,
};

pub const CRC_CCITT: Crc<u16> = Crc::<u16>::new(&CRC_CCITT_ALG);

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HdlcError {
    #[error("Invalid checksum (expected {0:#06x}, got {1:#06x})")]
    InvalidChecksum(u16, u16),
    #[error("Invalid HDLC escape sequence: [0x7d, {0:#04x}]")]
    InvalidEscapeSequence(u8),
    #[error("No trailing character found (expected 0x7e, got {0:#04x})")]
    NoTrailingCharacter(u8),
    #[error("Missing checksum")]
    MissingChecksum,
    #[error("Data too short to be HDLC encapsulated")]
    TooShort,
}

fn push_escaped(out: &mut Vec<u8>, b: u8) {
    match b {
        MESSAGE_TERMINATOR => out.extend([MESSAGE_ESCAPE_CHAR, ESCAPED_MESSAGE_TERMINATOR]),
        MESSAGE_ESCAPE_CHAR => out.extend([MESSAGE_ESCAPE_CHAR, ESCAPED_MESSAGE_ESCAPE_CHAR]),
        _ => out.push(b),
    }
}

pub fn hdlc_encapsulate(data: &[u8], crc: &Crc<u16>) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() + 3);
    let checksum = crc.checksum(data).to_le_bytes();
    for &b in data.iter().chain(checksum.iter()) {
        push_escaped(&mut result, b);
    }
    result.push(MESSAGE_TERMINATOR);
    result
}

pub fn hdlc_decapsulate(data: &[u8], crc: &Crc<u16>) -> Result<Vec<u8>, HdlcError> {
    let Some((&last, body)) = data.split_last() else {
        return Err(HdlcError::TooShort);
    };
    if data.len() < 3 {
        return Err(HdlcError::TooShort);
    }
    if last != MESSAGE_TERMINATOR {
        return Err(HdlcError::NoTrailingCharacter(last));
    }

    let mut unescaped = Vec::with_capacity(body.len());
    let mut bytes = body.iter();
    while let Some(&b) = bytes.next() {
        if b != MESSAGE_ESCAPE_CHAR {
            unescaped.push(b);
            continue;
        }
        match bytes.next() {
            Some(&ESCAPED_MESSAGE_TERMINATOR) => unescaped.push(MESSAGE_TERMINATOR),
            Some(&ESCAPED_MESSAGE_ESCAPE_CHAR) => unescaped.push(MESSAGE_ESCAPE_CHAR),
            Some(&other) => return Err(HdlcError::InvalidEscapeSequence(other)),
            // a dangling escape right before the terminator
            None => return Err(HdlcError::InvalidEscapeSequence(MESSAGE_TERMINATOR)),
        }
    }

    if unescaped.len() < 2 {
        return Err(HdlcError::MissingChecksum);
    }
    let trailer = unescaped.split_off(unescaped.len() - 2);
    let expected = trailer.as_slice().get_u16_le();
    let actual = crc.checksum(&unescaped);
    if expected != actual {
        return Err(HdlcError::InvalidChecksum(expected, actual));
    }

    Ok(unescaped)
}

/// Splits a buffer of concatenated frames on the terminator byte. Each
/// returned slice keeps its terminator; a trailing partial frame (one with no
/// terminator) is returned as-is and will fail decapsulation.
pub fn split_frames(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split_inclusive(|&b| b == MESSAGE_TERMINATOR)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hdlc_encapsulate() {
        let data = vec![0x01, 0x02, 0x03, 0x04];
        let expected = vec![1, 2, 3, 4, 145, 57, 126];
        let encapsulated = hdlc_encapsulate(&data, &CRC_CCITT);
        assert_eq!(&encapsulated, &expected);
        assert_eq!(hdlc_decapsulate(&encapsulated, &CRC_CCITT), Ok(data));
    }

    #[test]
    fn test_escapes_special_bytes() {
        let data = vec![MESSAGE_TERMINATOR, 0x00, MESSAGE_ESCAPE_CHAR];
        let encapsulated = hdlc_encapsulate(&data, &CRC_CCITT);
        assert_eq!(
            &encapsulated[..5],
            &[
                MESSAGE_ESCAPE_CHAR,
                ESCAPED_MESSAGE_TERMINATOR,
                0x00,
                MESSAGE_ESCAPE_CHAR,
                ESCAPED_MESSAGE_ESCAPE_CHAR,
            ]
        );
        // the only unescaped terminator is the last byte
        assert_eq!(
            encapsulated.iter().filter(|&&b| b == MESSAGE_TERMINATOR).count(),
            1
        );
        assert_eq!(hdlc_decapsulate(&encapsulated, &CRC_CCITT), Ok(data));
    }

    #[test]
    fn test_decapsulation_errors() {
        assert_eq!(hdlc_decapsulate(&[], &CRC_CCITT), Err(HdlcError::TooShort));
        assert_eq!(
            hdlc_decapsulate(&[0x01, 0x7e], &CRC_CCITT),
            Err(HdlcError::TooShort)
        );
        assert_eq!(
            hdlc_decapsulate(&[0x01, 0x02, 0x03], &CRC_CCITT),
            Err(HdlcError::NoTrailingCharacter(0x03))
        );
        assert_eq!(
            hdlc_decapsulate(&[0x01, 0x7d, 0x01, 0x7e], &CRC_CCITT),
            Err(HdlcError::InvalidEscapeSequence(0x01))
        );
        assert_eq!(
            hdlc_decapsulate(&[0x7d, 0x5e, 0x7e], &CRC_CCITT),
            Err(HdlcError::MissingChecksum)
        );
        assert_eq!(
            hdlc_decapsulate(&[1, 2, 3, 4, 145, 58, 126], &CRC_CCITT),
            Err(HdlcError::InvalidChecksum(0x3a91, 0x3991))
        );
    }

    #[test]
    fn test_split_frames() {
        let mut data = hdlc_encapsulate(&[1, 2], &CRC_CCITT);
        data.extend(hdlc_encapsulate(&[3, 4, 5], &CRC_CCITT));
        data.extend([9, 9]);
        let frames: Vec<&[u8]> = split_frames(&data).collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(hdlc_decapsulate(frames[0], &CRC_CCITT), Ok(vec![1, 2]));
        assert_eq!(hdlc_decapsulate(frames[1], &CRC_CCITT), Ok(vec![3, 4, 5]));
        assert_eq!(frames[2], &[9, 9]);
    }
}
