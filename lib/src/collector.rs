//! Decides what happens to each diag frame coming off the wire: hand it to a
//! decoder, drop it because the session filtered it out, or note it as a
//! packet type we don't support.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::Serialize;

use crate::diag::{DiagFrame, DiagParsingError, LogPacket, decode_hdlc_frame};
use crate::filter::PacketFilter;
use crate::log_codes::LogPacketType;
use crate::registry::{PacketTypeRegistry, REGISTRY};

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// A known, enabled packet type, ready for its decoder.
    Accepted(LogPacketType, LogPacket),
    /// A known packet type the filter doesn't enable.
    Filtered(LogPacketType),
    /// A log packet whose type code isn't registered.
    Unsupported(u16),
    /// A diag frame that isn't a log message (e.g. a command response).
    NotALog(u8),
    Malformed(DiagParsingError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifierStats {
    pub total: u64,
    pub accepted: BTreeMap<LogPacketType, u64>,
    pub filtered: u64,
    pub unsupported: BTreeMap<u16, u64>,
    pub not_a_log: u64,
    pub malformed: u64,
}

impl ClassifierStats {
    fn record(&mut self, classification: &Classification) {
        self.total += 1;
        match classification {
            Classification::Accepted(packet_type, _) => {
                *self.accepted.entry(*packet_type).or_insert(0) += 1
            }
            Classification::Filtered(_) => self.filtered += 1,
            Classification::Unsupported(code) => *self.unsupported.entry(*code).or_insert(0) += 1,
            Classification::NotALog(_) => self.not_a_log += 1,
            Classification::Malformed(_) => self.malformed += 1,
        }
    }

    pub fn total_accepted(&self) -> u64 {
        self.accepted.values().sum()
    }

    pub fn total_unsupported(&self) -> u64 {
        self.unsupported.values().sum()
    }
}

pub struct PacketClassifier<'a> {
    registry: &'a PacketTypeRegistry,
    filter: PacketFilter,
    stats: ClassifierStats,
}

impl PacketClassifier<'static> {
    pub fn new(filter: PacketFilter) -> Self {
        PacketClassifier::with_registry(&REGISTRY, filter)
    }
}

impl<'a> PacketClassifier<'a> {
    pub fn with_registry(registry: &'a PacketTypeRegistry, filter: PacketFilter) -> Self {
        PacketClassifier {
            registry,
            filter,
            stats: ClassifierStats::default(),
        }
    }

    /// Classifies one HDLC encapsulated frame, terminator included.
    pub fn classify(&mut self, frame: &[u8]) -> Classification {
        let classification = match decode_hdlc_frame(frame) {
            Ok(frame) => self.classify_frame(frame),
            Err(err) => {
                warn!("dropping malformed diag frame: {err}");
                Classification::Malformed(err)
            }
        };
        self.stats.record(&classification);
        classification
    }

    fn classify_frame(&self, frame: DiagFrame) -> Classification {
        let packet = match frame {
            DiagFrame::Log { header, payload } => LogPacket { header, payload },
            DiagFrame::Other { command, .. } => return Classification::NotALog(command),
        };
        let code = packet.log_type();
        let Some(name) = self.registry.name_for_code(code) else {
            debug!("unsupported log packet type {code:#06x}");
            return Classification::Unsupported(code);
        };
        // a registry built from a custom table may know codes that have no
        // LogPacketType
        let Ok(packet_type) = LogPacketType::try_from(code) else {
            debug!("{name} ({code:#06x}) has no decoder");
            return Classification::Unsupported(code);
        };
        if !self.filter.accepts(code) {
            debug!("{name} filtered out");
            return Classification::Filtered(packet_type);
        }
        Classification::Accepted(packet_type, packet)
    }

    pub fn stats(&self) -> &ClassifierStats {
        &self.stats
    }

    pub fn into_stats(self) -> ClassifierStats {
        self.stats
    }
}
