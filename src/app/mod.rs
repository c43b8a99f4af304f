pub mod cleanup_use_case;
pub mod ports;
pub mod extract_use_case;
pub mod publish_use_case;
