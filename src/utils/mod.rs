pub mod address_validator;
pub mod amount;
pub mod lenient_json;

// Re-export commonly used functions
pub use address_validator::{to_checksum_address, AddressValidator};
pub use amount::{format_wei_as_ether, normalize_amount, parse_ether_to_wei, wei_to_hex};
pub use lenient_json::extract_embedded_map;
