//! Configuration types for the Huckleberry client
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::records::{BottleType, VolumeUnits};

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HuckleberryConfig {
    /// Document store configuration
    pub store: StoreConfig,

    /// Optional client settings
    #[serde(default)]
    pub client: ClientConfig,
}

impl HuckleberryConfig {
    /// Create a new configuration with defaults
    pub fn new(store: StoreConfig) -> Self {
        Self {
            store,
            client: ClientConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()?;
        self.client.validate()?;
        Ok(())
    }
}

/// Document store configuration
///
/// The Debug implementation does NOT expose the API key or password.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Firestore over REST with Firebase email/password sign-in
    Firestore {
        /// Firebase project id
        project_id: String,
        /// Firebase web API key
        api_key: String,
        /// Account email
        email: String,
        /// Account password
        password: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Firestore {
                project_id, email, ..
            } => f
                .debug_struct("Firestore")
                .field("project_id", project_id)
                .field("api_key", &"<REDACTED>")
                .field("email", email)
                .field("password", &"<REDACTED>")
                .finish(),
            StoreConfig::Memory => f.write_str("Memory"),
            StoreConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .finish_non_exhaustive(),
        }
    }
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Firestore {
                project_id,
                api_key,
                email,
                password,
            } => {
                if project_id.is_empty() {
                    return Err(crate::Error::config("Firestore project id cannot be empty"));
                }
                if api_key.is_empty() {
                    return Err(crate::Error::config("Firebase API key cannot be empty"));
                }
                if email.is_empty() || !email.contains('@') {
                    return Err(crate::Error::config("Account email must be a valid address"));
                }
                if password.is_empty() {
                    return Err(crate::Error::config("Account password cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom store factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom store config cannot be null"));
                }
                Ok(())
            }
            StoreConfig::Memory => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Firestore { .. } => "firestore",
            StoreConfig::Memory => "memory",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Client behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Timezone offset in minutes written on entries
    ///
    /// `None` uses the host's local offset.
    #[serde(default)]
    pub offset_min: Option<i32>,

    /// Bottle contents used when a caller does not pass one
    #[serde(default)]
    pub default_bottle_type: BottleType,

    /// Bottle units used when a caller does not pass one
    #[serde(default)]
    pub default_bottle_units: VolumeUnits,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            offset_min: None,
            default_bottle_type: BottleType::Formula,
            default_bottle_units: VolumeUnits::Ml,
        }
    }
}

impl ClientConfig {
    /// Validate the client settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if let Some(offset) = self.offset_min
            && !(-14 * 60..=14 * 60).contains(&offset)
        {
            return Err(crate::Error::config(format!(
                "Timezone offset must be within ±840 minutes. Got: {}",
                offset
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_config_from_json() {
        let config: HuckleberryConfig = serde_json::from_value(json!({
            "store": {
                "type": "firestore",
                "project_id": "tracker",
                "api_key": "key",
                "email": "parent@example.com",
                "password": "secret"
            }
        }))
        .unwrap();

        assert_eq!(config.store.type_name(), "firestore");
        assert_eq!(config.client.default_bottle_units, VolumeUnits::Ml);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_firestore_config_requires_credentials() {
        let config = StoreConfig::Firestore {
            project_id: "tracker".into(),
            api_key: "key".into(),
            email: "not-an-email".into(),
            password: "secret".into(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = StoreConfig::Firestore {
            project_id: "tracker".into(),
            api_key: "AIza-secret-key".into(),
            email: "parent@example.com".into(),
            password: "hunter2".into(),
        };
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("AIza-secret-key"));
        assert!(!debug_str.contains("hunter2"));
        assert!(debug_str.contains("tracker"));
    }

    #[test]
    fn test_offset_range() {
        let mut client = ClientConfig {
            offset_min: Some(-300),
            ..Default::default()
        };
        assert!(client.validate().is_ok());
        client.offset_min = Some(2000);
        assert!(client.validate().is_err());
    }

    #[test]
    fn test_memory_is_default() {
        let config = HuckleberryConfig::default();
        assert_eq!(config.store.type_name(), "memory");
        assert!(config.validate().is_ok());
    }
}
