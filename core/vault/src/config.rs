//! Vault configuration.

use serde::{Deserialize, Serialize};

use pinvault_common::{Error, Result};
use pinvault_crypto::KdfParams;
use pinvault_storage::validate_key;

/// Default store key for the authentication record.
pub const AUTH_KEY: &str = "auth";

/// Default store key for the encrypted record collection.
pub const DATA_KEY: &str = "data";

/// Suffix appended to the auth key to name the rotation journal.
pub const JOURNAL_SUFFIX: &str = ".rotation";

/// Runtime configuration for a [`crate::VaultManager`].
///
/// KDF parameters are not persisted. A store must always be opened with the
/// parameters it was created with, or every record will fail to decrypt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Key derivation parameters.
    pub kdf_params: KdfParams,
    /// Store key holding the authentication record.
    pub auth_key: String,
    /// Store key holding the encrypted record collection.
    pub data_key: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_params: KdfParams::standard(),
            auth_key: AUTH_KEY.to_string(),
            data_key: DATA_KEY.to_string(),
        }
    }
}

impl VaultConfig {
    /// Default layout with custom KDF parameters.
    pub fn with_kdf_params(kdf_params: KdfParams) -> Self {
        Self {
            kdf_params,
            ..Self::default()
        }
    }

    /// Store key of the rotation journal.
    pub fn journal_key(&self) -> String {
        format!("{}{}", self.auth_key, JOURNAL_SUFFIX)
    }

    /// Check the configuration before use.
    ///
    /// # Errors
    /// - Store keys invalid or colliding
    /// - Zero KDF iterations
    pub fn validate(&self) -> Result<()> {
        validate_key(&self.auth_key)?;
        validate_key(&self.data_key)?;

        if self.auth_key == self.data_key || self.data_key == self.journal_key() {
            return Err(Error::InvalidInput(
                "Auth, data and journal keys must be distinct".to_string(),
            ));
        }
        if self.kdf_params.iterations == 0 {
            return Err(Error::InvalidInput(
                "KDF iterations must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VaultConfig::default();

        assert_eq!(config.kdf_params.iterations, 100_000);
        assert_eq!(config.auth_key, "auth");
        assert_eq!(config.data_key, "data");
        assert_eq!(config.journal_key(), "auth.rotation");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = VaultConfig::with_kdf_params(KdfParams::testing());

        let json = config.to_json().unwrap();
        let restored = VaultConfig::from_json(&json).unwrap();

        assert_eq!(restored, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = VaultConfig::from_json(r#"{"data_key":"notes"}"#).unwrap();

        assert_eq!(config.auth_key, "auth");
        assert_eq!(config.data_key, "notes");
        assert_eq!(config.kdf_params, KdfParams::standard());
    }

    #[test]
    fn test_colliding_keys_rejected() {
        let config = VaultConfig {
            data_key: "auth".to_string(),
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());

        let config = VaultConfig {
            data_key: "auth.rotation".to_string(),
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config = VaultConfig::with_kdf_params(KdfParams { iterations: 0 });
        assert!(config.validate().is_err());
    }
}
