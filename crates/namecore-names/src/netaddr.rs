//! Parsing of `.onion` and `.b32.i2p` address literals.

use sha3::{Digest, Sha3_256};

/// Suffix of Tor onion service addresses.
pub const ONION_SUFFIX: &str = ".onion";

/// Suffix of I2P base32 destinations.
pub const I2P_SUFFIX: &str = ".b32.i2p";

/// Tor v3 onion service address parts.
mod torv3 {
    pub const PUBKEY_LEN: usize = 32;
    pub const CHECKSUM_LEN: usize = 2;
    pub const VERSION: u8 = 3;
    pub const TOTAL_LEN: usize = PUBKEY_LEN + CHECKSUM_LEN + 1;
    pub const CHECKSUM_PREFIX: &[u8] = b".onion checksum";
}

/// Number of base32 characters in an I2P destination.
const I2P_BASE32_LEN: usize = 52;

/// Size of a decoded I2P destination hash.
const I2P_ADDR_LEN: usize = 32;

/// A network address that has no IP form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialAddr {
    /// Tor v3 onion service, identified by its ed25519 public key.
    TorV3([u8; torv3::PUBKEY_LEN]),
    /// I2P destination hash.
    I2p([u8; I2P_ADDR_LEN]),
}

fn base32_value(c: u8) -> Option<u8> {
    match c {
        b'A'..=b'Z' => Some(c - b'A'),
        b'a'..=b'z' => Some(c - b'a'),
        b'2'..=b'7' => Some(c - b'2' + 26),
        _ => None,
    }
}

/// Decodes RFC 4648 base32 (case-insensitive).
///
/// The padded input length must be a multiple of 8, and the bits left over
/// after the last full byte must be zero.
pub fn decode_base32(input: &str) -> Option<Vec<u8>> {
    let mut bytes = input.as_bytes();
    if bytes.len() % 8 != 0 {
        return None;
    }
    for _ in 0..6 {
        match bytes.split_last() {
            Some((b'=', rest)) => bytes = rest,
            _ => break,
        }
    }

    let mut out = Vec::with_capacity(bytes.len() * 5 / 8);
    let mut acc = 0u32;
    let mut bits = 0u32;
    for &c in bytes {
        acc = ((acc << 5) | u32::from(base32_value(c)?)) & 0xfff;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
    }

    // Anything left must be padding: fewer than five bits, all zero.
    if bits >= 5 || (acc << (8 - bits)) & 0xff != 0 {
        return None;
    }
    Some(out)
}

fn torv3_checksum(pubkey: &[u8]) -> [u8; torv3::CHECKSUM_LEN] {
    let mut hasher = Sha3_256::new();
    hasher.update(torv3::CHECKSUM_PREFIX);
    hasher.update(pubkey);
    hasher.update([torv3::VERSION]);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

fn parse_tor(addr: &str) -> Option<SpecialAddr> {
    let encoded = addr.strip_suffix(ONION_SUFFIX)?;
    let decoded = decode_base32(encoded)?;
    if decoded.len() != torv3::TOTAL_LEN {
        return None;
    }

    let (pubkey, rest) = decoded.split_at(torv3::PUBKEY_LEN);
    let (checksum, version) = rest.split_at(torv3::CHECKSUM_LEN);
    if version != [torv3::VERSION] || checksum != torv3_checksum(pubkey) {
        return None;
    }

    pubkey.try_into().ok().map(SpecialAddr::TorV3)
}

fn parse_i2p(addr: &str) -> Option<SpecialAddr> {
    if addr.len() != I2P_BASE32_LEN + I2P_SUFFIX.len()
        || !addr.is_char_boundary(I2P_BASE32_LEN)
        || !addr[I2P_BASE32_LEN..].eq_ignore_ascii_case(I2P_SUFFIX)
    {
        return None;
    }

    let padded = format!("{}====", &addr[..I2P_BASE32_LEN]);
    let decoded = decode_base32(&padded)?;
    decoded.try_into().ok().map(SpecialAddr::I2p)
}

/// Parses an address literal that is neither IPv4 nor IPv6.
pub fn parse_special(addr: &str) -> Option<SpecialAddr> {
    if addr.contains('\0') {
        return None;
    }
    parse_tor(addr).or_else(|| parse_i2p(addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tor project's own onion service.
    const TOR_V3: &str = "2gzyxa5ihm7nsggfxnu52rck2vv4rvmdlkiu3zzui5du4xyclen53wid.onion";
    const I2P: &str = "ukeu3k5oycgaauneqgtnvselmt4yemvoilkln7jpvamvfx7dnkdq.b32.i2p";

    #[test]
    fn test_decode_base32() {
        assert_eq!(decode_base32("").unwrap(), b"");
        assert_eq!(decode_base32("MY======").unwrap(), b"f");
        assert_eq!(decode_base32("MZXQ====").unwrap(), b"fo");
        assert_eq!(decode_base32("mzxw6===").unwrap(), b"foo");
        assert_eq!(decode_base32("MZXW6YQ=").unwrap(), b"foob");
        assert_eq!(decode_base32("MZXW6YTB").unwrap(), b"fooba");

        // Not a multiple of 8.
        assert!(decode_base32("MZXW6").is_none());
        // Invalid alphabet.
        assert!(decode_base32("MZXW6YT1").is_none());
        // Non-zero trailing bits.
        assert!(decode_base32("MZ======").is_none());
        // Padding in the middle.
        assert!(decode_base32("MZ=W6YTB").is_none());
    }

    #[test]
    fn test_tor_v3() {
        match parse_special(TOR_V3) {
            Some(SpecialAddr::TorV3(pubkey)) => assert_eq!(pubkey.len(), 32),
            other => panic!("unexpected parse result: {other:?}"),
        }
        assert!(parse_special(&TOR_V3.to_uppercase().replace(".ONION", ".onion")).is_some());

        // Flip one character, breaking the checksum.
        let broken = TOR_V3.replacen("2", "3", 1);
        assert!(parse_special(&broken).is_none());

        // Tor v2 addresses are no longer supported.
        assert!(parse_special("expyuzz4wqqyqhjn.onion").is_none());
        assert!(parse_special(".onion").is_none());
        assert!(parse_special("2gzyxa5ihm7nsggfxnu52rck2vv4rvmdlkiu3zzui5du4xyclen53wid").is_none());
    }

    #[test]
    fn test_i2p() {
        assert!(matches!(parse_special(I2P), Some(SpecialAddr::I2p(_))));
        assert!(parse_special(&I2P.replace(".b32.i2p", ".B32.I2P")).is_some());

        // Wrong length.
        assert!(parse_special("ukeu3k5oycgaauneqgtnvselmt4yemvoilkln7jpvamvfx7dnkd.b32.i2p").is_none());
        // Invalid alphabet.
        assert!(parse_special("ukeu3k5oycgaauneqgtnvselmt4yemvoilkln7jpvamvfx7dnk0q.b32.i2p").is_none());
        assert!(parse_special("ukeu3k5oycgaauneqgtnvselmt4yemvoilkln7jpvamvfx7dnkdq.i2p").is_none());
    }

    #[test]
    fn test_nul_is_rejected() {
        let with_nul = format!("{TOR_V3}\0");
        assert!(parse_special(&with_nul).is_none());
    }
}
