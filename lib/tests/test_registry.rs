use dm_collector::{
    LogPacketType, REGISTRY, all_codes, code_for_name, is_known, name_for_code,
    registry::PacketTypeRegistry,
};
use std::collections::HashSet;

#[test]
fn test_codes_and_names_are_unique() {
    let codes: HashSet<u16> = all_codes().collect();
    assert_eq!(codes.len(), REGISTRY.len());
    let names: HashSet<&str> = REGISTRY.entries().iter().map(|e| e.name).collect();
    assert_eq!(names.len(), REGISTRY.len());
    assert!(names.iter().all(|name| !name.is_empty() && name.is_ascii()));
}

#[test]
fn test_round_trips() {
    for entry in REGISTRY.entries() {
        let name = name_for_code(entry.code).unwrap();
        assert_eq!(code_for_name(name), Some(entry.code));
        let code = code_for_name(entry.name).unwrap();
        assert_eq!(name_for_code(code), Some(entry.name));

        let packet_type = LogPacketType::try_from(entry.code).unwrap();
        assert_eq!(packet_type.name(), entry.name);
        assert_eq!(entry.name.parse::<LogPacketType>(), Ok(packet_type));
    }
}

#[test]
fn test_absence_for_every_unregistered_code() {
    let registered: HashSet<u16> = all_codes().collect();
    for code in 0..=u16::MAX {
        if registered.contains(&code) {
            continue;
        }
        assert_eq!(name_for_code(code), None, "{code:#06x}");
        assert!(!is_known(code));
        assert!(LogPacketType::try_from(code).is_err());
    }
}

#[test]
fn test_sample_table() {
    assert_eq!(name_for_code(0xB0C0), Some("LTE_RRC_OTA_Packet"));
    assert_eq!(code_for_name("UMTS_NAS_OTA"), Some(0x713A));
    assert!(!is_known(0x1234));

    let codes: Vec<u16> = all_codes().collect();
    assert_eq!(codes.len(), 17);
    assert!(codes.contains(&0xB0EC));
    assert!(codes.contains(&0xB0ED));
    assert_eq!(codes, all_codes().collect::<Vec<_>>());
}

#[test]
fn test_concurrent_lookups() {
    let handles: Vec<_> = (0..8)
        .map(|_| {
            std::thread::spawn(|| {
                all_codes()
                    .map(|code| name_for_code(code).map(str::len).unwrap_or(0))
                    .sum::<usize>()
            })
        })
        .collect();
    let sums: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(sums.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_registry_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PacketTypeRegistry>();
}
