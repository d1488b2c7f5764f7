//! Which log packet types a collector session cares about. Filters are usually
//! built from human-readable names out of a config file or CLI flag.

use std::collections::HashSet;

use log::debug;
use thiserror::Error;

use crate::log_codes::LogPacketType;
use crate::registry::REGISTRY;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Unknown log packet type {0:?}")]
    UnknownPacketType(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketFilter {
    enabled: HashSet<u16>,
}

impl Default for PacketFilter {
    fn default() -> Self {
        PacketFilter::all()
    }
}

impl PacketFilter {
    /// Accepts every registered packet type.
    pub fn all() -> Self {
        PacketFilter {
            enabled: REGISTRY.all_codes().collect(),
        }
    }

    pub fn from_types<I>(types: I) -> Self
    where
        I: IntoIterator<Item = LogPacketType>,
    {
        PacketFilter {
            enabled: types.into_iter().map(LogPacketType::code).collect(),
        }
    }

    /// Resolves canonical names (case-sensitive) into a filter. A single
    /// unknown name fails the whole filter, since it's most likely a typo in
    /// the config.
    pub fn from_names<S>(names: &[S]) -> Result<Self, FilterError>
    where
        S: AsRef<str>,
    {
        let mut enabled = HashSet::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let code = REGISTRY
                .code_for_name(name)
                .ok_or_else(|| FilterError::UnknownPacketType(name.to_string()))?;
            if !enabled.insert(code) {
                debug!("{name} listed more than once in packet filter");
            }
        }
        Ok(PacketFilter { enabled })
    }

    pub fn accepts(&self, code: u16) -> bool {
        self.enabled.contains(&code)
    }

    /// The enabled packet types, in registry order.
    pub fn enabled(&self) -> impl Iterator<Item = LogPacketType> + '_ {
        REGISTRY
            .all_codes()
            .filter(|code| self.enabled.contains(code))
            .filter_map(|code| LogPacketType::try_from(code).ok())
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_all_accepts_every_registered_code() {
        let filter = PacketFilter::all();
        assert_eq!(filter.len(), 17);
        for code in REGISTRY.all_codes() {
            assert!(filter.accepts(code));
        }
        assert!(!filter.accepts(0x1234));
    }

    #[test]
    fn test_from_names() {
        let filter =
            PacketFilter::from_names(&["UMTS_NAS_OTA", "LTE_RRC_OTA_Packet", "UMTS_NAS_OTA"])
                .unwrap();
        assert_eq!(filter.len(), 2);
        assert!(filter.accepts(0x713a));
        assert!(filter.accepts(0xb0c0));
        assert!(!filter.accepts(0xb0c1));
        // registry order, not config order
        assert_eq!(
            filter.enabled().collect::<Vec<_>>(),
            vec![LogPacketType::UmtsNasOta, LogPacketType::LteRrcOtaPacket]
        );
    }

    #[test]
    fn test_from_names_rejects_unknown() {
        let err = PacketFilter::from_names(&["LTE_RRC_OTA_Packet", "LTE_RRC_OTA"]).unwrap_err();
        assert_eq!(err, FilterError::UnknownPacketType("LTE_RRC_OTA".to_string()));

        // names are case-sensitive
        assert!(PacketFilter::from_names(&["lte_rrc_ota_packet"]).is_err());
    }

    #[test]
    fn test_empty_filter() {
        let names: [&str; 0] = [];
        let filter = PacketFilter::from_names(&names).unwrap();
        assert!(filter.is_empty());
        assert_eq!(filter, PacketFilter::from_types(std::iter::empty()));
        assert_eq!(filter.enabled().count(), 0);
    }
}
