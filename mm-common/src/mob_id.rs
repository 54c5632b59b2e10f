//! SMPTE UMID mob identifiers
//!
//! A mob ID is a 32-byte SMPTE 330M UMID. Its canonical text form is the URN
//! used by Avid tooling:
//!
//! `urn:smpte:umid:060a2b34.01010105.01010f20.13000000.xxxxxxxx.xxxxxxxx.xxxxxxxx.xxxxxxxx`

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

const URN_PREFIX: &str = "urn:smpte:umid:";
const UMID_LEN: usize = 32;

/// 32-byte SMPTE UMID identifying an AVB mob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MobId([u8; UMID_LEN]);

impl MobId {
    /// Wrap raw UMID bytes
    pub fn from_bytes(bytes: [u8; UMID_LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, which must be exactly 32 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; UMID_LEN] = bytes.try_into().map_err(|_| {
            Error::Parse(format!(
                "mob id must be {} bytes, got {}",
                UMID_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; UMID_LEN] {
        &self.0
    }
}

impl fmt::Display for MobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(URN_PREFIX)?;
        for (i, group) in self.0.chunks(4).enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&hex::encode(group))?;
        }
        Ok(())
    }
}

impl FromStr for MobId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let body = s
            .trim()
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| Error::Parse(format!("not a UMID urn: '{}'", s)))?;

        let digits: String = body.split('.').collect();
        let bytes = hex::decode(&digits)
            .map_err(|e| Error::Parse(format!("invalid UMID hex in '{}': {}", s, e)))?;

        Self::from_slice(&bytes)
    }
}
