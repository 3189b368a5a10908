//! Fair Random Commitment Protocol
//!
//! The computer commits to a random value before the human contributes
//! theirs, then discloses key and value so the commitment can be checked.
//!
//! ```text
//! computer                                human
//! --------                                -----
//! key   <- 32 random bytes
//! value <- uniform [0, N)
//! digest = HMAC-SHA3-256(key, "value")
//!                      ---- digest ---->
//!                      <--- contribution -
//!                      ---- key, value -->  recompute and compare
//! ```
//!
//! The digest is the decimal string of the value keyed by the raw key,
//! rendered as uppercase hex. Any reimplementation with the same MAC
//! reproduces it bit for bit.

use std::fmt;

use hmac::digest::Key;
use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha3::Sha3_256;
use thiserror::Error;

use crate::core::rng::{generate_key, secure_random_in_range, RangeError, SecretKey, KEY_LEN};

type HmacSha3 = Hmac<Sha3_256>;

/// MAC output length in bytes.
pub const DIGEST_LEN: usize = 32;

/// Commitment digest (HMAC-SHA3-256 output).
pub type MacDigest = [u8; DIGEST_LEN];

/// A committed random value whose key and value are still withheld.
///
/// Only the digest is readable. Key and value become available by
/// consuming the commitment with [`Commitment::disclose`], which the
/// orchestrator does only after the counterpart's input is in.
pub struct Commitment {
    key: SecretKey,
    value: u32,
    range: u32,
    digest: MacDigest,
}

impl Commitment {
    /// Published digest as uppercase hex.
    pub fn digest_hex(&self) -> String {
        hex::encode_upper(self.digest)
    }

    /// Reveal key and value.
    pub fn disclose(self) -> Disclosure {
        Disclosure {
            key: self.key,
            value: self.value,
            range: self.range,
            digest: self.digest,
        }
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commitment")
            .field("range", &self.range)
            .field("digest", &self.digest_hex())
            .finish_non_exhaustive()
    }
}

/// A revealed commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    /// Secret key.
    #[serde(with = "hex_upper")]
    pub key: SecretKey,
    /// Committed value in `[0, range)`.
    pub value: u32,
    /// Exclusive upper bound the value was drawn from.
    pub range: u32,
    /// Digest published at commit time.
    #[serde(with = "hex_upper")]
    pub digest: MacDigest,
}

impl Disclosure {
    /// Secret key as uppercase hex.
    pub fn key_hex(&self) -> String {
        hex::encode_upper(self.key)
    }

    /// Digest as uppercase hex.
    pub fn digest_hex(&self) -> String {
        hex::encode_upper(self.digest)
    }
}

/// Commit to a uniformly random value in `[0, range)`.
pub fn commit<R: RngCore + CryptoRng>(rng: &mut R, range: u32) -> Result<Commitment, RangeError> {
    let key = generate_key(rng);
    let value = secure_random_in_range(rng, range)?;
    let digest = compute_digest(&key, value);

    Ok(Commitment {
        key,
        value,
        range,
        digest,
    })
}

/// Compute `HMAC-SHA3-256(key, decimal(value))`.
pub fn compute_digest(key: &SecretKey, value: u32) -> MacDigest {
    mac_with_key(key, value).finalize().into_bytes().into()
}

/// Verify a disclosed key and value against a published digest.
///
/// Key and digest are accepted in either hex case. A malformed key is
/// reported as an error; a digest that is not 32-byte hex simply never
/// matches.
pub fn verify(key_hex: &str, value: u32, expected_digest: &str) -> Result<bool, KeyError> {
    let key = decode_key(key_hex)?;

    let expected = match hex::decode(expected_digest.trim()) {
        Ok(bytes) if bytes.len() == DIGEST_LEN => bytes,
        _ => return Ok(false),
    };

    Ok(mac_with_key(&key, value).verify_slice(&expected).is_ok())
}

/// Decode a hex secret key, requiring exactly [`KEY_LEN`] bytes.
pub fn decode_key(key_hex: &str) -> Result<SecretKey, KeyError> {
    let bytes = hex::decode(key_hex.trim())?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| KeyError::WrongLength { expected: KEY_LEN, got })
}

fn mac_with_key(key: &SecretKey, value: u32) -> HmacSha3 {
    // HMAC zero-pads keys shorter than the SHA3-256 block
    let mut block = Key::<HmacSha3>::default();
    block[..KEY_LEN].copy_from_slice(key);

    let mut mac = HmacSha3::new(&block);
    mac.update(value.to_string().as_bytes());
    mac
}

/// Malformed secret key supplied for verification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KeyError {
    /// Key is not hexadecimal.
    #[error("key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Key decodes to the wrong number of bytes.
    #[error("key must be {expected} bytes, got {got}")]
    WrongLength {
        /// Required key length.
        expected: usize,
        /// Decoded key length.
        got: usize,
    },
}

/// Serde helpers that write fixed-size byte arrays as uppercase hex.
pub(crate) mod hex_upper {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode_upper(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("expected 32 bytes"))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_rng() -> StdRng {
        StdRng::seed_from_u64(0xC0FFEE)
    }

    #[test]
    fn test_commit_round_trip() {
        let mut rng = test_rng();
        let commitment = commit(&mut rng, 6).unwrap();
        let digest_hex = commitment.digest_hex();

        let disclosure = commitment.disclose();
        assert!(disclosure.value < 6);
        assert_eq!(disclosure.range, 6);
        assert_eq!(disclosure.digest_hex(), digest_hex);
        assert_eq!(verify(&disclosure.key_hex(), disclosure.value, &digest_hex), Ok(true));
    }

    #[test]
    fn test_digest_format() {
        let mut rng = test_rng();
        let digest_hex = commit(&mut rng, 2).unwrap().digest_hex();

        assert_eq!(digest_hex.len(), 64);
        assert!(digest_hex
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut rng = test_rng();
        assert!(matches!(commit(&mut rng, 0), Err(RangeError::Empty)));
    }

    #[test]
    fn test_wrong_value_fails() {
        let mut rng = test_rng();
        let disclosure = commit(&mut rng, 6).unwrap().disclose();
        let digest_hex = disclosure.digest_hex();

        for other in (0..6).filter(|v| *v != disclosure.value) {
            assert_eq!(verify(&disclosure.key_hex(), other, &digest_hex), Ok(false));
        }
    }

    #[test]
    fn test_single_bit_key_flip_fails() {
        let mut rng = test_rng();
        let disclosure = commit(&mut rng, 6).unwrap().disclose();
        let digest_hex = disclosure.digest_hex();

        for bit in 0..(KEY_LEN * 8) {
            let mut key = disclosure.key;
            key[bit / 8] ^= 1 << (bit % 8);
            assert_eq!(
                verify(&hex::encode_upper(key), disclosure.value, &digest_hex),
                Ok(false),
                "flipping bit {} still verified",
                bit
            );
        }
    }

    #[test]
    fn test_case_insensitive() {
        let mut rng = test_rng();
        let disclosure = commit(&mut rng, 2).unwrap().disclose();

        let key_lower = disclosure.key_hex().to_lowercase();
        let digest_lower = disclosure.digest_hex().to_lowercase();
        assert_eq!(verify(&key_lower, disclosure.value, &digest_lower), Ok(true));
        assert_eq!(
            verify(&format!("  {}  ", key_lower), disclosure.value, &disclosure.digest_hex()),
            Ok(true)
        );
    }

    #[test]
    fn test_malformed_key() {
        let digest = hex::encode_upper([0u8; DIGEST_LEN]);

        assert!(matches!(verify("not-hex", 0, &digest), Err(KeyError::InvalidHex(_))));
        assert!(matches!(verify("ABC", 0, &digest), Err(KeyError::InvalidHex(_))));
        assert_eq!(
            verify("ABCD", 0, &digest),
            Err(KeyError::WrongLength { expected: 32, got: 2 })
        );
        assert_eq!(
            verify("", 0, &digest),
            Err(KeyError::WrongLength { expected: 32, got: 0 })
        );
    }

    #[test]
    fn test_malformed_digest_never_matches() {
        let mut rng = test_rng();
        let disclosure = commit(&mut rng, 6).unwrap().disclose();

        assert_eq!(verify(&disclosure.key_hex(), disclosure.value, "zz"), Ok(false));
        let truncated = &disclosure.digest_hex()[..62];
        assert_eq!(verify(&disclosure.key_hex(), disclosure.value, truncated), Ok(false));
    }

    #[test]
    fn test_known_digests() {
        assert_eq!(
            hex::encode_upper(compute_digest(&[0x5A; KEY_LEN], 3)),
            "2854586F6253AF5FAF2A7A5E78F895EF96EF550DB582A6D0D23455AD755BEF89"
        );

        let mut key = [0u8; KEY_LEN];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        assert_eq!(
            hex::encode_upper(compute_digest(&key, 1000)),
            "2D0EC978A48EFDF97ECA2833ECA31C1E1706AD68E671C21F8FB993D2725E6AAA"
        );
    }

    #[test]
    fn test_padded_key_matches_slice_key() {
        let key = [0xC3; KEY_LEN];
        let mut mac = <HmacSha3 as Mac>::new_from_slice(&key).unwrap();
        mac.update(b"5");
        let expected: MacDigest = mac.finalize().into_bytes().into();
        assert_eq!(compute_digest(&key, 5), expected);
    }

    #[test]
    fn test_digest_depends_on_key() {
        let value = 3;
        assert_ne!(compute_digest(&[1; KEY_LEN], value), compute_digest(&[2; KEY_LEN], value));
        assert_eq!(compute_digest(&[1; KEY_LEN], value), compute_digest(&[1; KEY_LEN], value));
    }

    #[test]
    fn test_commitment_debug_redacts_secret() {
        let key = [0xAB; KEY_LEN];
        let commitment = Commitment {
            key,
            value: 4,
            range: 6,
            digest: compute_digest(&key, 4),
        };
        let rendered = format!("{:?}", commitment);
        assert!(!rendered.contains(&hex::encode_upper(key)));
        assert!(rendered.contains(&commitment.digest_hex()));
    }

    #[test]
    fn test_disclosure_serde_hex() {
        let key = [0x0F; KEY_LEN];
        let disclosure = Disclosure {
            key,
            value: 1,
            range: 2,
            digest: compute_digest(&key, 1),
        };

        let json = serde_json::to_string(&disclosure).unwrap();
        assert!(json.contains(&hex::encode_upper(key)));

        let back: Disclosure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, disclosure);
    }

    proptest! {
        #[test]
        fn prop_verify_only_accepts_original(key in any::<[u8; 32]>(), value in 0u32..256, other in 0u32..256) {
            let digest_hex = hex::encode_upper(compute_digest(&key, value));
            let key_hex = hex::encode(key);

            prop_assert_eq!(verify(&key_hex, value, &digest_hex), Ok(true));
            prop_assert_eq!(verify(&key_hex, other, &digest_hex), Ok(other == value));
        }
    }
}
