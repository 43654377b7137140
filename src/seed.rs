//! Seed normalization and share codes

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Share-code format version understood by this build.
pub const SHARE_VERSION: u32 = 1;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A numeric seed and its string form: two views of the same entropy.
///
/// Only `numeric_value` feeds PRNG derivation; the string and timestamp
/// are provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    pub numeric_value: u32,
    pub string_value: String,
    pub timestamp: u64,
}

/// A caller-supplied seed: a 32-bit integer or free-form text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedInput {
    Number(u32),
    Text(String),
}

impl Default for SeedInput {
    fn default() -> Self {
        SeedInput::Number(0)
    }
}

impl From<u32> for SeedInput {
    fn from(n: u32) -> Self {
        SeedInput::Number(n)
    }
}

impl From<&str> for SeedInput {
    fn from(s: &str) -> Self {
        SeedInput::Text(s.to_string())
    }
}

impl Seed {
    /// Normalize caller input into a `Seed`. Strings hash to the numeric
    /// value with FNV-1a.
    #[must_use]
    pub fn normalize(input: &SeedInput) -> Seed {
        let (numeric_value, string_value) = match input {
            SeedInput::Number(n) => (*n, n.to_string()),
            SeedInput::Text(s) => (fnv1a_32(s.as_bytes()), s.clone()),
        };
        Seed {
            numeric_value,
            string_value,
            timestamp: unix_now(),
        }
    }

    /// Rebuild a seed from a decoded share code.
    #[must_use]
    pub fn from_numeric(numeric_value: u32) -> Seed {
        Seed {
            numeric_value,
            string_value: numeric_value.to_string(),
            timestamp: unix_now(),
        }
    }

    /// Encode this seed as a share code: `v1:<base36>`.
    #[must_use]
    pub fn share_code(&self) -> String {
        format!("v{}:{}", SHARE_VERSION, to_base36(self.numeric_value))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// 32-bit FNV-1a.
#[must_use]
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

fn to_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Decode a share code back into its numeric seed.
///
/// Unknown versions are rejected so future formats never silently decode
/// to the wrong seed.
pub fn decode_share_code(code: &str) -> Result<u32> {
    let reject = |reason: &str| Error::SeedDecodeError {
        code: code.to_string(),
        reason: reason.to_string(),
    };

    let rest = code.strip_prefix('v').ok_or_else(|| reject("missing version tag"))?;
    let (version, payload) = rest
        .split_once(':')
        .ok_or_else(|| reject("missing `:` separator"))?;
    let version: u32 = version
        .parse()
        .map_err(|_| reject("version is not a number"))?;
    if version != SHARE_VERSION {
        return Err(reject("unsupported version"));
    }
    if payload.is_empty() {
        return Err(reject("empty payload"));
    }

    let mut value: u64 = 0;
    for c in payload.bytes() {
        let digit = match c {
            b'0'..=b'9' => (c - b'0') as u64,
            b'a'..=b'z' => (c - b'a') as u64 + 10,
            _ => return Err(reject("invalid base36 digit")),
        };
        value = value * 36 + digit;
        if value > u32::MAX as u64 {
            return Err(reject("seed out of range"));
        }
    }
    Ok(value as u32)
}
