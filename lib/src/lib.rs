pub mod collector;
pub mod diag;
pub mod filter;
pub mod hdlc;
pub mod log_codes;
pub mod qmdl;
pub mod registry;

pub use log_codes::LogPacketType;
pub use registry::{PacketTypeRegistry, REGISTRY, all_codes, code_for_name, is_known, name_for_code};
