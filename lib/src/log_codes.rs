//! Enumerates the diag log packet types the collector understands, along with
//! their canonical names.
//!
//! Codes are assigned by the baseband vendor. The upper nibble of a code is
//! the "equipment id" (0x4 for WCDMA, 0x7 for UMTS, 0xb for LTE) and the lower
//! 12 bits are the item id within that equipment's log mask.

use std::fmt;
use std::str::FromStr;

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::registry::REGISTRY;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive)]
#[repr(u16)]
pub enum LogPacketType {
    // 3G
    WcdmaCellId = 0x4127,
    WcdmaSignalingMessages = 0x412f,
    UmtsNasGmmState = 0x7130,
    UmtsNasMmState = 0x7131,
    UmtsNasOta = 0x713a,

    // 4G RRC
    LteRrcOtaPacket = 0xb0c0,
    LteRrcMibMessage = 0xb0c1,
    LteRrcServCellInfo = 0xb0c2,

    // 4G NAS. The plain OTA codes come in incoming/outgoing pairs.
    LteNasEsmPlainOtaIncoming = 0xb0e2,
    LteNasEsmPlainOtaOutgoing = 0xb0e3,
    LteNasEmmPlainOtaIncoming = 0xb0ec,
    LteNasEmmPlainOtaOutgoing = 0xb0ed,
    LteNasEmmState = 0xb0ee,

    // 4G ML1 measurements
    LteMl1ConnectedModeIntraFreqMeasResults = 0xb179,
    LteMl1IratMeasurementRequest = 0xb187,
    LteMl1ServingCellMeasurementResult = 0xb193,
    LteMl1ConnectedModeNeighborMeasReqResp = 0xb195,
}

/// Which way an OTA message travelled, from the handset's point of view.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum MessageDirection {
    /// Network to handset ("incoming").
    Downlink,
    /// Handset to network ("outgoing").
    Uplink,
}

impl LogPacketType {
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// The canonical name, as used in filter configuration and logs.
    pub const fn name(self) -> &'static str {
        use LogPacketType::*;
        match self {
            WcdmaCellId => "WCDMA_CELL_ID",
            WcdmaSignalingMessages => "WCDMA_Signaling_Messages",
            UmtsNasGmmState => "UMTS_NAS_GMM_State",
            UmtsNasMmState => "UMTS_NAS_MM_State",
            UmtsNasOta => "UMTS_NAS_OTA",
            LteRrcOtaPacket => "LTE_RRC_OTA_Packet",
            LteRrcMibMessage => "LTE_RRC_MIB_Message_Log_Packet",
            LteRrcServCellInfo => "LTE_RRC_Serv_Cell_Info_Log_Packet",
            LteNasEsmPlainOtaIncoming => "LTE_NAS_ESM_Plain_OTA_Incoming_Message",
            LteNasEsmPlainOtaOutgoing => "LTE_NAS_ESM_Plain_OTA_Outgoing_Message",
            LteNasEmmPlainOtaIncoming => "LTE_NAS_EMM_Plain_OTA_Incoming_Message",
            LteNasEmmPlainOtaOutgoing => "LTE_NAS_EMM_Plain_OTA_Outgoing_Message",
            LteNasEmmState => "LTE_NAS_EMM_State",
            LteMl1ConnectedModeIntraFreqMeasResults => {
                "LTE_ML1_Connected_Mode_LTE_Intra_Freq_Meas_Results"
            }
            LteMl1IratMeasurementRequest => "LTE_ML1_IRAT_Measurement_Request",
            LteMl1ServingCellMeasurementResult => "LTE_ML1_Serving_Cell_Measurement_Result",
            LteMl1ConnectedModeNeighborMeasReqResp => {
                "LTE_ML1_Connected_Mode_Neighbor_Meas_Req_Resp"
            }
        }
    }

    pub const fn equipment_id(self) -> u32 {
        (self.code() >> 12) as u32
    }

    pub const fn item_id(self) -> u32 {
        (self.code() & 0xfff) as u32
    }

    // * 0xb0e2: plain ESM NAS message (incoming)
    // * 0xb0e3: plain ESM NAS message (outgoing)
    // * 0xb0ec: plain EMM NAS message (incoming)
    // * 0xb0ed: plain EMM NAS message (outgoing)
    pub fn direction(self) -> Option<MessageDirection> {
        use LogPacketType::*;
        match self {
            LteNasEsmPlainOtaIncoming | LteNasEmmPlainOtaIncoming => {
                Some(MessageDirection::Downlink)
            }
            LteNasEsmPlainOtaOutgoing | LteNasEmmPlainOtaOutgoing => {
                Some(MessageDirection::Uplink)
            }
            _ => None,
        }
    }

    /// For the paired NAS OTA types, the type carrying the opposite
    /// direction of the same protocol.
    pub fn counterpart(self) -> Option<LogPacketType> {
        use LogPacketType::*;
        match self {
            LteNasEsmPlainOtaIncoming => Some(LteNasEsmPlainOtaOutgoing),
            LteNasEsmPlainOtaOutgoing => Some(LteNasEsmPlainOtaIncoming),
            LteNasEmmPlainOtaIncoming => Some(LteNasEmmPlainOtaOutgoing),
            LteNasEmmPlainOtaOutgoing => Some(LteNasEmmPlainOtaIncoming),
            _ => None,
        }
    }
}

impl fmt::Display for LogPacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown log packet type name {0:?}")]
pub struct UnknownPacketTypeName(pub String);

impl FromStr for LogPacketType {
    type Err = UnknownPacketTypeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        REGISTRY
            .code_for_name(s)
            .and_then(|code| LogPacketType::try_from(code).ok())
            .ok_or_else(|| UnknownPacketTypeName(s.to_string()))
    }
}

impl Serialize for LogPacketType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for LogPacketType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A `(code, name)` pair as stored in the registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub code: u16,
    pub name: &'static str,
}

impl NameEntry {
    pub const fn of(log_type: LogPacketType) -> Self {
        NameEntry {
            code: log_type.code(),
            name: log_type.name(),
        }
    }
}

pub const LOG_PACKET_TYPE_NAMES: [NameEntry; 17] = [
    NameEntry::of(LogPacketType::WcdmaCellId), // WCDMA cell status
    NameEntry::of(LogPacketType::WcdmaSignalingMessages),
    NameEntry::of(LogPacketType::UmtsNasGmmState),
    NameEntry::of(LogPacketType::UmtsNasMmState),
    NameEntry::of(LogPacketType::UmtsNasOta),
    NameEntry::of(LogPacketType::LteRrcOtaPacket),
    NameEntry::of(LogPacketType::LteRrcMibMessage),
    NameEntry::of(LogPacketType::LteRrcServCellInfo), // LTE RRC cell status
    NameEntry::of(LogPacketType::LteNasEsmPlainOtaIncoming),
    NameEntry::of(LogPacketType::LteNasEsmPlainOtaOutgoing),
    NameEntry::of(LogPacketType::LteNasEmmPlainOtaIncoming),
    NameEntry::of(LogPacketType::LteNasEmmPlainOtaOutgoing),
    NameEntry::of(LogPacketType::LteNasEmmState),
    NameEntry::of(LogPacketType::LteMl1ConnectedModeIntraFreqMeasResults),
    NameEntry::of(LogPacketType::LteMl1IratMeasurementRequest),
    NameEntry::of(LogPacketType::LteMl1ServingCellMeasurementResult),
    NameEntry::of(LogPacketType::LteMl1ConnectedModeNeighborMeasReqResp),
];
