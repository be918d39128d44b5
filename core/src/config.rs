//! Application configuration.
//!
//! Describes the identity of an [`App`](crate::App) and which built-in flags
//! it injects. Usually embedded in the binary or shipped next to it as YAML.
//!
//! # Example YAML
//!
//! ```yaml
//! name: deployer
//! version: v1.4.0
//! description: Ships services to the fleet
//! use_help_flag: true
//! use_version_flag: true
//! metadata:
//!   team: platform
//!   retries: 3
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::Metadata;
use crate::error::Result;

/// Identity and built-in switches of an application.
///
/// Every field has a default, so a YAML document only needs the keys it
/// changes.
///
/// # Examples
///
/// ```
/// use cmdtree_core::AppConfig;
///
/// let config = AppConfig::from_yaml_str("name: deployer\nuse_help_flag: true\n").unwrap();
/// assert_eq!(config.name, "deployer");
/// assert_eq!(config.version, "v0.0.0");
/// assert!(config.use_help_flag);
/// assert!(!config.use_version_flag);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Program name shown in usage and version output. Empty means the file
    /// name of the program token.
    pub name: String,
    /// Version string printed by the built-in version flag.
    pub version: String,
    /// One-line description shown at the top of usage output.
    pub description: String,
    /// Inject `-help`/`-h` at the root.
    pub use_help_flag: bool,
    /// Inject `-version`/`-v` at the root.
    pub use_version_flag: bool,
    /// Free-form values available to every hook through the context.
    pub metadata: Metadata,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: "v0.0.0".to_string(),
            description: "A new cli application".to_string(),
            use_help_flag: false,
            use_version_flag: false,
            metadata: Metadata::new(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::Error::Io) if the file cannot be read, or
    /// [`Yaml`](crate::Error::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Parses configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::Error::Io) if the file cannot be written, or
    /// [`Yaml`](crate::Error::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
