//! Diag protocol serialization/deserialization, limited to what a collector
//! needs: the log header carrying the packet type, and the log mask request
//! used to enable packet types on the modem. Log payloads stay opaque bytes.

use chrono::{DateTime, Duration, Utc};
use deku::prelude::*;
use log::warn;
use thiserror::Error;

use crate::filter::PacketFilter;
use crate::hdlc::{self, CRC_CCITT, hdlc_decapsulate};

/// Bytes counted by `inner_length` that precede the payload: the header's own
/// length field, the log type and the timestamp.
pub const LOG_HEADER_INNER_LEN: u16 = 12;

// GPS epoch (1980-01-06T00:00:00Z) as seconds since the unix epoch
const GPS_EPOCH_UNIX_SECONDS: i64 = 315_964_800;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagParsingError {
    #[error("Failed to parse Message: {0}, data: {1:?}")]
    MessageParsingError(deku::DekuError, Vec<u8>),
    #[error("HDLC decapsulation of message failed: {0}, data: {1:?}")]
    HdlcDecapsulationError(hdlc::HdlcError, Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "little")]
pub struct Timestamp {
    pub ts: u64,
}

impl Timestamp {
    pub fn to_datetime(&self) -> DateTime<Utc> {
        // Upper 48 bits: ticks of 1/800s since the GPS epoch
        // Lower 16 bits: time since last tick in 1/32 chip units
        let ts_upper = self.ts >> 16;
        let ts_lower = self.ts & 0xffff;
        let mut delta_millis = ts_upper as f64 * 1.25;
        delta_millis += ts_lower as f64 / 40960.0;
        DateTime::<Utc>::UNIX_EPOCH
            + Duration::seconds(GPS_EPOCH_UNIX_SECONDS)
            + Duration::milliseconds(delta_millis as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead, DekuWrite)]
pub struct LogHeader {
    pub pending_msgs: u8,
    #[deku(endian = "little")]
    pub outer_length: u16,
    #[deku(endian = "little")]
    pub inner_length: u16,
    #[deku(endian = "little")]
    pub log_type: u16,
    pub timestamp: Timestamp,
}

impl LogHeader {
    pub fn payload_len(&self) -> u16 {
        self.inner_length.saturating_sub(LOG_HEADER_INNER_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, DekuRead, DekuWrite)]
#[deku(id_type = "u8")]
pub enum DiagFrame {
    #[deku(id = "0x10")]
    Log {
        header: LogHeader,
        #[deku(count = "header.payload_len()")]
        payload: Vec<u8>,
    },

    // deku hands the id byte to the first field of a catch-all variant
    #[deku(id_pat = "_")]
    Other {
        command: u8,
        #[deku(read_all)]
        data: Vec<u8>,
    },
}

/// A log message whose header has been parsed. The payload is whatever the
/// modem sent after the timestamp, uninterpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct LogPacket {
    pub header: LogHeader,
    pub payload: Vec<u8>,
}

impl LogPacket {
    pub fn log_type(&self) -> u16 {
        self.header.log_type
    }

    pub fn to_frame(&self) -> DiagFrame {
        DiagFrame::Log {
            header: self.header,
            payload: self.payload.clone(),
        }
    }
}

impl DiagFrame {
    pub fn into_log_packet(self) -> Option<LogPacket> {
        match self {
            DiagFrame::Log { header, payload } => Some(LogPacket { header, payload }),
            DiagFrame::Other { .. } => None,
        }
    }
}

/// Parses an already-decapsulated diag message.
pub fn parse_frame(data: &[u8]) -> Result<DiagFrame, DiagParsingError> {
    match DiagFrame::from_bytes((data, 0)) {
        Ok(((leftover_bytes, _), frame)) => {
            if !leftover_bytes.is_empty() {
                warn!(
                    "warning: {} leftover bytes when parsing DiagFrame",
                    leftover_bytes.len()
                );
            }
            Ok(frame)
        }
        Err(e) => Err(DiagParsingError::MessageParsingError(e, data.to_vec())),
    }
}

/// Decapsulates and parses a single HDLC frame, terminator included.
pub fn decode_hdlc_frame(frame: &[u8]) -> Result<DiagFrame, DiagParsingError> {
    let data = hdlc_decapsulate(frame, &CRC_CCITT)
        .map_err(|err| DiagParsingError::HdlcDecapsulationError(err, frame.to_vec()))?;
    parse_frame(&data)
}

#[derive(Debug, Clone, PartialEq, DekuWrite)]
#[deku(id_type = "u32")]
pub enum Request {
    #[deku(id = "115")]
    LogConfig(LogConfigRequest),
}

#[derive(Debug, Clone, PartialEq, DekuWrite)]
#[deku(id_type = "u32", endian = "little")]
pub enum LogConfigRequest {
    #[deku(id = "3")]
    SetMask {
        log_type: u32,
        log_mask_bitsize: u32,
        log_mask: Vec<u8>,
    },
}

impl Request {
    /// Serializes and HDLC encapsulates the request, ready to hand to whatever
    /// transport talks to the modem.
    pub fn to_hdlc_bytes(&self) -> Result<Vec<u8>, DekuError> {
        Ok(hdlc::hdlc_encapsulate(&self.to_bytes()?, &CRC_CCITT))
    }
}

/// Builds the mask for one equipment id ("log type" in diag parlance): bit
/// `i` is set when item `i` of that equipment is accepted by the filter.
pub fn build_log_mask_request(
    log_type: u32,
    log_mask_bitsize: u32,
    filter: &PacketFilter,
) -> Request {
    let mut log_mask = vec![0u8; log_mask_bitsize.div_ceil(8) as usize];
    for packet_type in filter.enabled() {
        if packet_type.equipment_id() != log_type {
            continue;
        }
        let item = packet_type.item_id();
        if item >= log_mask_bitsize {
            warn!(
                "{packet_type} (item {item:#x}) doesn't fit in a {log_mask_bitsize} bit log mask, skipping"
            );
            continue;
        }
        log_mask[(item / 8) as usize] |= 1 << (item % 8);
    }

    Request::LogConfig(LogConfigRequest::SetMask {
        log_type,
        log_mask_bitsize,
        log_mask,
    })
}

/// One `SetMask` request per equipment id with at least one enabled packet
/// type, ordered by equipment id.
pub fn build_log_mask_requests(filter: &PacketFilter, log_mask_bitsize: u32) -> Vec<Request> {
    let mut log_types: Vec<u32> = filter.enabled().map(|t| t.equipment_id()).collect();
    log_types.sort_unstable();
    log_types.dedup();
    log_types
        .into_iter()
        .map(|log_type| build_log_mask_request(log_type, log_mask_bitsize, filter))
        .collect()
}
