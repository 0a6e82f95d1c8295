//! Key and value validity rules shared by every store which accepts writes.

use serde::{Deserialize, Serialize};

use super::Error;
use crate::Result;

/// Largest key accepted by default.
pub const MAX_KEY_LEN: usize = (1 << 16) - 1;

/// Largest value accepted by default.
pub const MAX_VALUE_LEN: usize = (1 << 31) - 1;

/// Size limits applied to keys and values on write.
///
/// Deserializes with defaults for missing fields, so it can be embedded in an
/// application's config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_key_len: usize,
    pub max_value_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_key_len: MAX_KEY_LEN,
            max_value_len: MAX_VALUE_LEN,
        }
    }
}

impl Limits {
    /// Fails with [`Error::InvalidKey`] if `key` is longer than `max_key_len`.
    /// Zero-length keys are valid.
    pub fn validate_key(&self, key: &[u8]) -> Result<()> {
        if key.len() > self.max_key_len {
            return Err(Error::InvalidKey(format!(
                "key length {} exceeds maximum of {}",
                key.len(),
                self.max_key_len
            ))
            .into());
        }
        Ok(())
    }

    /// Fails with [`Error::InvalidValue`] if `value` is longer than
    /// `max_value_len`.
    pub fn validate_value(&self, value: &[u8]) -> Result<()> {
        if value.len() > self.max_value_len {
            return Err(Error::InvalidValue(format!(
                "value length {} exceeds maximum of {}",
                value.len(),
                self.max_value_len
            ))
            .into());
        }
        Ok(())
    }

    /// Validates a key/value pair about to be written.
    #[inline]
    pub fn validate(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.validate_key(key)?;
        self.validate_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error as CrateError;

    fn store_err(res: Result<()>) -> Error {
        match res {
            Err(CrateError::StoreErr(err)) => err,
            other => panic!("expected store error, got {:?}", other),
        }
    }

    #[test]
    fn accepts_defaults() {
        let limits = Limits::default();
        limits.validate(b"k", b"").unwrap();
        limits.validate(&[0; MAX_KEY_LEN], b"value").unwrap();
    }

    #[test]
    fn accepts_empty_key() {
        let limits = Limits::default();
        limits.validate_key(b"").unwrap();
        limits.validate(b"", b"").unwrap();
    }

    #[test]
    fn rejects_long_key() {
        let limits = Limits {
            max_key_len: 4,
            ..Default::default()
        };
        limits.validate_key(b"abcd").unwrap();
        let err = store_err(limits.validate_key(b"abcde"));
        assert!(matches!(err, Error::InvalidKey(_)));
    }

    #[test]
    fn rejects_long_value() {
        let limits = Limits {
            max_value_len: 2,
            ..Default::default()
        };
        limits.validate_value(b"ab").unwrap();
        let err = store_err(limits.validate(b"k", b"abc"));
        assert_eq!(
            err,
            Error::InvalidValue("value length 3 exceeds maximum of 2".into())
        );
    }

    #[test]
    fn deserialize_partial_config() {
        let limits: Limits = serde_json::from_str(r#"{ "max_key_len": 32 }"#).unwrap();
        assert_eq!(limits.max_key_len, 32);
        assert_eq!(limits.max_value_len, MAX_VALUE_LEN);

        let json = serde_json::to_string(&Limits::default()).unwrap();
        let limits: Limits = serde_json::from_str(&json).unwrap();
        assert_eq!(limits, Limits::default());
    }
}
