use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::{ObjectHash, HASH_LEN};

/// CID version byte.
const CID_V1: u8 = 0x01;
/// Multicodec for raw git objects.
const GIT_RAW_CODEC: u8 = 0x78;
/// Multihash code for SHA-1.
const SHA1_MULTIHASH: u8 = 0x11;

const PREFIX: [u8; 4] = [CID_V1, GIT_RAW_CODEC, SHA1_MULTIHASH, HASH_LEN as u8];
const CID_LEN: usize = PREFIX.len() + HASH_LEN;

/// Multibase prefix for lowercase base16.
const BASE16_PREFIX: char = 'f';

/// Address of a migrated node in the destination store.
///
/// A `ContentId` is a CIDv1 (`git-raw` codec, SHA-1 multihash) wrapping the
/// source [`ObjectHash`]. The prefix is constant, so content ids sort in the
/// same order as the hashes they were derived from, and the source hash can
/// always be recovered with [`ContentId::object_hash`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId([u8; CID_LEN]);

impl ContentId {
    /// Derive the content id of a source object.
    pub fn from_object_hash(hash: &ObjectHash) -> Self {
        let mut bytes = [0u8; CID_LEN];
        bytes[..PREFIX.len()].copy_from_slice(&PREFIX);
        bytes[PREFIX.len()..].copy_from_slice(hash.as_bytes());
        Self(bytes)
    }

    /// Derive the content id from a hex-encoded source hash.
    pub fn from_hex_hash(hex: &str) -> Result<Self, TypeError> {
        Ok(Self::from_object_hash(&ObjectHash::from_hex(hex)?))
    }

    /// The source hash this content id was derived from.
    pub fn object_hash(&self) -> ObjectHash {
        let mut raw = [0u8; HASH_LEN];
        raw.copy_from_slice(&self.0[PREFIX.len()..]);
        ObjectHash::from_raw(raw)
    }

    /// The binary CID.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.object_hash().short_hex())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BASE16_PREFIX}{}", hex::encode(self.0))
    }
}

impl FromStr for ContentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s
            .strip_prefix(BASE16_PREFIX)
            .ok_or_else(|| TypeError::InvalidContentId(format!("{s}: unsupported multibase")))?;
        let bytes = hex::decode(encoded).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != CID_LEN {
            return Err(TypeError::InvalidLength {
                expected: CID_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[..PREFIX.len()] != PREFIX {
            return Err(TypeError::InvalidContentId(format!(
                "{s}: not a git-raw sha1 cid"
            )));
        }
        let mut arr = [0u8; CID_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl From<&ObjectHash> for ContentId {
    fn from(hash: &ObjectHash) -> Self {
        Self::from_object_hash(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "8ab686eafeb1f44702738c8b0f24f2567c36da6d";

    #[test]
    fn display_is_base16_multibase() {
        let cid = ContentId::from_hex_hash(HEX).unwrap();
        assert_eq!(cid.to_string(), format!("f01781114{HEX}"));
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = ContentId::from_hex_hash(HEX).unwrap();
        let b = ContentId::from_hex_hash(HEX).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn recovers_object_hash() {
        let hash = ObjectHash::from_hex(HEX).unwrap();
        assert_eq!(ContentId::from_object_hash(&hash).object_hash(), hash);
    }

    #[test]
    fn parse_display_roundtrip() {
        let cid = ContentId::from_hex_hash(HEX).unwrap();
        let parsed: ContentId = cid.to_string().parse().unwrap();
        assert_eq!(parsed, cid);
    }

    #[test]
    fn ordering_follows_source_hash() {
        let low = ContentId::from_object_hash(&ObjectHash::from_raw([1; 20]));
        let high = ContentId::from_object_hash(&ObjectHash::from_raw([2; 20]));
        assert!(low < high);
    }

    #[test]
    fn rejects_other_multibase() {
        let err = "bafy".parse::<ContentId>().unwrap_err();
        assert!(matches!(err, TypeError::InvalidContentId(_)));
    }

    #[test]
    fn rejects_foreign_codec() {
        let s = format!("f01551114{HEX}");
        let err = s.parse::<ContentId>().unwrap_err();
        assert!(matches!(err, TypeError::InvalidContentId(_)));
    }

    #[test]
    fn rejects_invalid_source_hex() {
        assert!(ContentId::from_hex_hash("not-hex").is_err());
    }
}
