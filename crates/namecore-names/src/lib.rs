//! Name and value rules for namecore.
//!
//! This crate holds the consensus-adjacent checks that run on untrusted name
//! operations before they reach the chain state:
//!
//! - **Encodings**: conversions between raw name/value bytes and their ASCII,
//!   UTF-8 or hex string forms.
//! - **Namespaces**: classification of names into `d/`, `dd/`, `id/`, `idd/` or
//!   non-standard, including the label grammar of domains and identities.
//! - **Values**: JSON validity and minimality, and syntax checks for the
//!   IPv4, IPv6, onion and I2P endpoints referenced from domain values.
//!
//! None of the classification or validation functions can fail. Malformed
//! input maps to [`NameNamespace::NonStandard`] or `false`, so that every node
//! reaches the same verdict for the same bytes.

mod encoding;
mod namespace;
pub mod netaddr;
mod value;

pub use encoding::{
    InvalidNameString, NameEncoding, decode_name, decode_value, encode_name,
    encode_name_for_message, encode_value,
};
pub use namespace::{
    DOMAIN_SUFFIX, MAX_DOMAIN_LABEL_LEN, NameNamespace, classify_name, classify_name_bytes,
    describe_name, is_purported_domain, name_from_domain, purported_namespace,
};
pub use value::{
    MAX_JSON_DEPTH, canonicalize_json, is_minimal_json, is_valid_i2p_address, is_valid_ipv4,
    is_valid_ipv6, is_valid_json, is_valid_onion_address,
};
