use crate::Result;
use namecore_names::{
    NameEncoding, canonicalize_json, classify_name_bytes, decode_name, describe_name,
    is_minimal_json, is_valid_i2p_address, is_valid_ipv4, is_valid_ipv6, is_valid_json,
    is_valid_onion_address, name_from_domain,
};

/// Name grammar and value checks
#[derive(Debug, clap::Subcommand)]
pub enum NameCmd {
    /// Classify a name into its namespace and validate its label.
    ///
    /// A human-facing domain such as `example.bit` is accepted as well and
    /// checked as `d/example`.
    Classify {
        #[arg(index = 1)]
        name: String,

        /// Encoding of the name argument (ascii, utf8 or hex).
        #[arg(long, default_value = "ascii")]
        encoding: NameEncoding,
    },

    /// Check that a value is valid and minimal JSON.
    CheckValue {
        #[arg(index = 1)]
        value: String,
    },

    /// Report which endpoint syntaxes accept an address.
    CheckAddress {
        #[arg(index = 1)]
        address: String,
    },
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

pub(crate) fn classify_report(name: &str, encoding: NameEncoding) -> Result<Vec<String>> {
    let name = match encoding {
        NameEncoding::Hex => name.to_string(),
        NameEncoding::Ascii | NameEncoding::Utf8 if !name.contains('/') => {
            name_from_domain(name).unwrap_or_else(|| name.to_string())
        }
        NameEncoding::Ascii | NameEncoding::Utf8 => name.to_string(),
    };

    let bytes = decode_name(&name, encoding)?;
    let namespace = classify_name_bytes(&bytes);

    Ok(vec![
        format!("Namespace: {namespace}"),
        format!("Standard: {}", yes_no(namespace.is_standard())),
        format!("Description: {}", describe_name(&bytes, namespace)),
    ])
}

pub(crate) fn value_report(value: &str) -> Vec<String> {
    let valid = is_valid_json(value);
    let mut report = vec![
        format!("Valid JSON: {}", yes_no(valid)),
        format!("Minimal: {}", yes_no(is_minimal_json(value))),
    ];
    if valid && !value.is_empty() {
        report.push(format!("Canonical: {}", canonicalize_json(value)));
    }
    report
}

pub(crate) fn address_report(address: &str) -> Vec<String> {
    vec![
        format!("IPv4: {}", yes_no(is_valid_ipv4(address))),
        format!("IPv6: {}", yes_no(is_valid_ipv6(address))),
        format!("Onion: {}", yes_no(is_valid_onion_address(address))),
        format!("I2P: {}", yes_no(is_valid_i2p_address(address))),
    ]
}

impl NameCmd {
    pub fn run(self) -> Result<()> {
        let report = match self {
            Self::Classify { name, encoding } => classify_report(&name, encoding)?,
            Self::CheckValue { value } => value_report(&value),
            Self::CheckAddress { address } => address_report(&address),
        };
        for line in report {
            println!("{line}");
        }
        Ok(())
    }
}
