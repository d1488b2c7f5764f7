use dm_collector::filter::FilterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Failed to read config file {0}: {1}")]
    ConfigFileReadError(String, std::io::Error),
    #[error("Config file parsing error: {0}")]
    ConfigFileParsingError(#[from] toml::de::Error),
    #[error("Invalid packet filter: {0}")]
    FilterError(#[from] FilterError),
    #[error("Failed to read QMDL file {0}: {1}")]
    QmdlReadError(String, std::io::Error),
    #[error("Failed to serialize log mask request: {0}")]
    RequestSerializationError(#[from] deku::DekuError),
    #[error("Failed to serialize report: {0}")]
    ReportSerializationError(#[from] serde_json::Error),
    #[error("unknown packet type {0:?}")]
    UnknownPacketType(String),
}
