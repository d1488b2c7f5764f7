use std::path::Path;

use dm_collector::filter::PacketFilter;
use serde::Deserialize;

use crate::error::CheckError;

#[derive(Deserialize)]
struct ConfigFile {
    enabled_packet_types: Option<Vec<String>>,
    show_unsupported: Option<bool>,
    log_mask_bitsize: Option<u32>,
}

#[derive(Debug, PartialEq)]
pub struct Config {
    /// Canonical packet type names to accept. `None` accepts every
    /// registered type.
    pub enabled_packet_types: Option<Vec<String>>,
    pub show_unsupported: bool,
    pub log_mask_bitsize: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            enabled_packet_types: None,
            show_unsupported: false,
            log_mask_bitsize: 4096,
        }
    }
}

impl Config {
    pub fn packet_filter(&self) -> Result<PacketFilter, CheckError> {
        match &self.enabled_packet_types {
            Some(names) => Ok(PacketFilter::from_names(names.as_slice())?),
            None => Ok(PacketFilter::all()),
        }
    }
}

pub fn parse_config_str(config_file: &str) -> Result<Config, CheckError> {
    let mut config = Config::default();
    let parsed_config: ConfigFile = toml::from_str(config_file)?;
    if let Some(v) = parsed_config.enabled_packet_types {
        config.enabled_packet_types = Some(v);
    }
    if let Some(v) = parsed_config.show_unsupported {
        config.show_unsupported = v;
    }
    if let Some(v) = parsed_config.log_mask_bitsize {
        config.log_mask_bitsize = v;
    }
    Ok(config)
}

pub fn parse_config<P>(path: Option<P>) -> Result<Config, CheckError>
where
    P: AsRef<Path>,
{
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let path = path.as_ref();
    let config_file = std::fs::read_to_string(path)
        .map_err(|e| CheckError::ConfigFileReadError(path.display().to_string(), e))?;
    parse_config_str(&config_file)
}
