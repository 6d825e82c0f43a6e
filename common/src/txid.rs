use std::fmt;
use std::str::FromStr;

use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

/// A transaction identifier: 16 raw bytes, allocated once by the client at
/// enqueue time and reused across every retry (section 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(pub [u8; 16]);

impl TxId {
    /// Allocate a fresh, random transaction id (negligible collision
    /// probability per section 3).
    pub fn generate() -> Self {
        Self(rand::random())
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", hex::encode(self.0))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TxIdParseError {
    #[error("txid must be 32 hex characters (16 bytes), got {0} bytes")]
    WrongLength(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

impl FromStr for TxId {
    type Err = TxIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let array: [u8; 16] = bytes
            .clone()
            .try_into()
            .map_err(|_| TxIdParseError::WrongLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TxId::from_str(&s).map_err(DeError::custom)
    }
}
