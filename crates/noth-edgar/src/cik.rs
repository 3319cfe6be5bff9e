use crate::error::{Error, Result};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

const WIDTH: usize = 10;

/// Central Index Key; the registry's identifier for a filer, always held as a 10-digit,
/// zero-padded string, e.g. `0000320193`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct Cik(String);

impl Cik {
    /// Parse a CIK from text; `320193`, `0000320193` and `CIK0000320193` are all accepted.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix("CIK").unwrap_or(trimmed);
        if digits.is_empty()
            || digits.len() > WIDTH
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::InvalidInput(format!("malformed CIK: {raw:?}")));
        }
        Ok(Cik(format!("{digits:0>WIDTH$}")))
    }

    pub fn from_number(num: u64) -> Result<Self> {
        if num > 9_999_999_999 {
            return Err(Error::InvalidInput(format!("CIK out of range: {num}")));
        }
        Ok(Cik(format!("{num:0WIDTH$}")))
    }

    /// The padded form, as used by `submissions/CIK##########.json`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading zeros stripped, as used by the archive path scheme.
    pub fn trimmed(&self) -> &str {
        match self.0.trim_start_matches('0') {
            "" => "0",
            t => t,
        }
    }
}

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// CIK code can either be a 10-digit string, or shortened number; both land padded
impl<'de> Deserialize<'de> for Cik {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
        match value {
            serde_json::Value::Number(num) => match num.as_u64() {
                Some(n) => Cik::from_number(n).map_err(de::Error::custom),
                None => Err(de::Error::custom("unable to parse CIK from JSON number")),
            },
            serde_json::Value::String(s) => Cik::new(&s).map_err(de::Error::custom),
            _ => Err(de::Error::custom("invalid type for CIK")),
        }
    }
}
