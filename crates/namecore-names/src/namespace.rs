//! Namespace classification of names.
//!
//! Every function here is total: malformed or adversarial input is classified
//! as [`NameNamespace::NonStandard`] instead of producing an error.

use crate::encoding::{NameEncoding, encode_name, encode_name_for_message};
use std::fmt;

/// Maximum length in bytes of a domain label (the part after `d/`).
pub const MAX_DOMAIN_LABEL_LEN: usize = 63;

/// Suffix of the human-facing form of a domain name.
pub const DOMAIN_SUFFIX: &str = ".bit";

const IDN_PREFIX: &str = "xn--";

/// Classification of a name by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameNamespace {
    /// `d/`
    Domain,
    /// `dd/`
    DomainData,
    /// `id/`
    Identity,
    /// `idd/`
    IdentityData,
    /// Anything without a known prefix, or with a label that fails its
    /// namespace's grammar.
    NonStandard,
}

impl NameNamespace {
    /// Looks up the namespace for an exact prefix token such as `"d/"`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "d/" => Self::Domain,
            "dd/" => Self::DomainData,
            "id/" => Self::Identity,
            "idd/" => Self::IdentityData,
            _ => Self::NonStandard,
        }
    }

    /// Returns the prefix token, empty for [`NameNamespace::NonStandard`].
    pub fn token(&self) -> &'static str {
        match self {
            Self::Domain => "d/",
            Self::DomainData => "dd/",
            Self::Identity => "id/",
            Self::IdentityData => "idd/",
            Self::NonStandard => "",
        }
    }

    /// Whether this is one of the four prefixed namespaces.
    pub fn is_standard(&self) -> bool {
        !matches!(self, Self::NonStandard)
    }
}

impl fmt::Display for NameNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = match self {
            Self::Domain => "domain",
            Self::DomainData => "domain data",
            Self::Identity => "identity",
            Self::IdentityData => "identity data",
            Self::NonStandard => "non-standard",
        };
        f.write_str(desc)
    }
}

/// Returns the namespace a name claims through the text up to and including
/// its first `/`, without looking at the label.
pub fn purported_namespace(name: &str) -> NameNamespace {
    match name.find('/') {
        Some(slash) => NameNamespace::from_token(&name[..=slash]),
        None => NameNamespace::NonStandard,
    }
}

/// Matches `[a-z0-9]+(-[a-z0-9]+)*` against the whole input.
fn is_hyphenated_alnum(label: &str) -> bool {
    let is_group = |group: &str| {
        !group.is_empty()
            && group
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    };
    label.split('-').all(is_group)
}

fn is_valid_domain_label(label: &str) -> bool {
    if label.len() > MAX_DOMAIN_LABEL_LEN {
        return false;
    }

    // `(xn--)?` followed by hyphen-separated groups.
    let matches_grammar = is_hyphenated_alnum(label)
        || label
            .strip_prefix(IDN_PREFIX)
            .is_some_and(is_hyphenated_alnum);

    matches_grammar && !label.bytes().all(|b| b.is_ascii_digit())
}

/// Classifies a name string and validates its label against the grammar of
/// the claimed namespace.
pub fn classify_name(name: &str) -> NameNamespace {
    let purported = purported_namespace(name);
    let label = &name[purported.token().len()..];

    if label.is_empty() {
        return NameNamespace::NonStandard;
    }

    match purported {
        NameNamespace::Domain => {
            if is_valid_domain_label(label) {
                NameNamespace::Domain
            } else {
                NameNamespace::NonStandard
            }
        }
        // No length cap and no digits-only rejection here, unlike domains.
        NameNamespace::Identity => {
            if is_hyphenated_alnum(label) {
                NameNamespace::Identity
            } else {
                NameNamespace::NonStandard
            }
        }
        NameNamespace::DomainData | NameNamespace::IdentityData | NameNamespace::NonStandard => {
            purported
        }
    }
}

/// Classifies raw name bytes. Bytes that are not printable ASCII are
/// non-standard.
pub fn classify_name_bytes(name: &[u8]) -> NameNamespace {
    match encode_name(name, NameEncoding::Ascii) {
        Ok(name) => classify_name(&name),
        Err(_) => NameNamespace::NonStandard,
    }
}

/// Human-facing description of a name.
///
/// Domains are shown as `<label>.bit`; everything else uses the quoted or
/// hex message rendering of the full name.
pub fn describe_name(name: &[u8], namespace: NameNamespace) -> String {
    match namespace {
        NameNamespace::Domain => {
            let label = encode_name(name, NameEncoding::Ascii).ok().and_then(|ascii| {
                ascii
                    .strip_prefix(NameNamespace::Domain.token())
                    .map(ToOwned::to_owned)
            });
            match label {
                Some(label) => format!("{label}{DOMAIN_SUFFIX}"),
                None => encode_name_for_message(name),
            }
        }
        NameNamespace::DomainData
        | NameNamespace::Identity
        | NameNamespace::IdentityData
        | NameNamespace::NonStandard => encode_name_for_message(name),
    }
}

/// Whether the text looks like a human-facing domain, i.e. ends in `.bit`.
pub fn is_purported_domain(text: &str) -> bool {
    text.ends_with(DOMAIN_SUFFIX)
}

/// Converts `example.bit` into the name `d/example`.
///
/// The result is not validated; run [`classify_name`] on it.
pub fn name_from_domain(text: &str) -> Option<String> {
    text.strip_suffix(DOMAIN_SUFFIX)
        .map(|label| format!("{}{label}", NameNamespace::Domain.token()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_bijective() {
        for ns in [
            NameNamespace::Domain,
            NameNamespace::DomainData,
            NameNamespace::Identity,
            NameNamespace::IdentityData,
        ] {
            assert_eq!(NameNamespace::from_token(ns.token()), ns);
            assert!(ns.is_standard());
        }
        assert_eq!(NameNamespace::from_token(""), NameNamespace::NonStandard);
        assert_eq!(NameNamespace::from_token("D/"), NameNamespace::NonStandard);
        assert_eq!(NameNamespace::from_token("d"), NameNamespace::NonStandard);
    }

    #[test]
    fn test_purported_namespace() {
        assert_eq!(purported_namespace("d/foo"), NameNamespace::Domain);
        assert_eq!(purported_namespace("dd/foo/bar"), NameNamespace::DomainData);
        assert_eq!(purported_namespace("idd/"), NameNamespace::IdentityData);
        assert_eq!(purported_namespace("x/d/foo"), NameNamespace::NonStandard);
        assert_eq!(purported_namespace("dfoo"), NameNamespace::NonStandard);
    }

    #[test]
    fn test_prefix_only_names_are_non_standard() {
        for name in ["d/", "dd/", "id/", "idd/", ""] {
            assert_eq!(classify_name(name), NameNamespace::NonStandard, "{name}");
        }
    }

    #[test]
    fn test_domain_grammar() {
        assert_eq!(classify_name("d/my-domain2"), NameNamespace::Domain);
        assert_eq!(classify_name("d/a"), NameNamespace::Domain);
        assert_eq!(classify_name("d/xn--bcher-kva"), NameNamespace::Domain);
        assert_eq!(classify_name("d/xn--123"), NameNamespace::Domain);
        assert_eq!(classify_name("d/a1-2b"), NameNamespace::Domain);

        assert_eq!(classify_name("d/12345"), NameNamespace::NonStandard);
        assert_eq!(classify_name("d/-foo"), NameNamespace::NonStandard);
        assert_eq!(classify_name("d/foo-"), NameNamespace::NonStandard);
        assert_eq!(classify_name("d/foo--bar"), NameNamespace::NonStandard);
        assert_eq!(classify_name("d/xn--"), NameNamespace::NonStandard);
        assert_eq!(classify_name("d/xn---foo"), NameNamespace::NonStandard);
        assert_eq!(classify_name("d/Foo"), NameNamespace::NonStandard);
        assert_eq!(classify_name("d/foo.bar"), NameNamespace::NonStandard);
        assert_eq!(classify_name("d/foo/bar"), NameNamespace::NonStandard);
        assert_eq!(classify_name("d/foo_bar"), NameNamespace::NonStandard);
    }

    #[test]
    fn test_domain_label_length() {
        let label_63 = "a".repeat(63);
        let label_64 = "a".repeat(64);
        assert_eq!(classify_name(&format!("d/{label_63}")), NameNamespace::Domain);
        assert_eq!(classify_name(&format!("d/{label_64}")), NameNamespace::NonStandard);
    }

    #[test]
    fn test_identity_grammar() {
        assert_eq!(classify_name("id/alice"), NameNamespace::Identity);
        assert_eq!(classify_name("id/12345"), NameNamespace::Identity);
        assert_eq!(classify_name(&format!("id/{}", "a".repeat(200))), NameNamespace::Identity);

        assert_eq!(classify_name("id/xn--alice"), NameNamespace::NonStandard);
        assert_eq!(classify_name("id/Alice"), NameNamespace::NonStandard);
        assert_eq!(classify_name("id/-alice"), NameNamespace::NonStandard);
    }

    #[test]
    fn test_data_namespaces_accept_any_label() {
        assert_eq!(classify_name("dd/Anything Goes!"), NameNamespace::DomainData);
        assert_eq!(classify_name("idd/--"), NameNamespace::IdentityData);
        assert_eq!(classify_name("foo/bar"), NameNamespace::NonStandard);
        assert_eq!(classify_name("no-slash"), NameNamespace::NonStandard);
    }

    #[test]
    fn test_classify_bytes() {
        assert_eq!(classify_name_bytes(b"d/example"), NameNamespace::Domain);
        assert_eq!(classify_name_bytes(b"d/\xff"), NameNamespace::NonStandard);
        assert_eq!(classify_name_bytes(b"d/\n"), NameNamespace::NonStandard);
        assert_eq!(classify_name_bytes(&[0u8; 300]), NameNamespace::NonStandard);
    }

    #[test]
    fn test_classification_is_total() {
        let mut state = 0x9e37_79b9u32;
        for len in 0..64 {
            let bytes: Vec<u8> = (0..len)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    state as u8
                })
                .collect();
            let _ = classify_name_bytes(&bytes);
            let _ = describe_name(&bytes, NameNamespace::Domain);
        }
    }

    #[test]
    fn test_describe_name() {
        assert_eq!(describe_name(b"d/example", NameNamespace::Domain), "example.bit");
        assert_eq!(describe_name(b"id/alice", NameNamespace::Identity), "'id/alice'");
        assert_eq!(describe_name(&[0x00, 0xff], NameNamespace::NonStandard), "0x00ff");
        // A mislabelled namespace still renders something sensible.
        assert_eq!(describe_name(b"id/alice", NameNamespace::Domain), "'id/alice'");
    }

    #[test]
    fn test_domain_conversion() {
        assert!(is_purported_domain("example.bit"));
        assert!(!is_purported_domain("example.com"));
        assert_eq!(name_from_domain("example.bit").as_deref(), Some("d/example"));
        assert_eq!(name_from_domain("example"), None);

        let name = name_from_domain("example.bit").unwrap();
        assert_eq!(
            describe_name(name.as_bytes(), classify_name(&name)),
            "example.bit"
        );
    }
}
