//! Lookup of saved properties and their owners.
//!
//! The parcel endpoint only resolves properties the caller owns. The
//! directory is a trait so the file-backed store used here can be swapped
//! for a database without touching the handlers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parcel_map_parcel_models::LocatorInput;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or querying a property directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The properties file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The properties file is not valid TOML.
    #[error("Invalid properties file: {0}")]
    Toml(#[from] toml::de::Error),

    /// The same property ID appears more than once.
    #[error("Duplicate property ID '{id}'")]
    DuplicateId {
        /// The repeated ID.
        id: String,
    },
}

/// A saved property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Property ID used in request paths.
    pub id: String,
    /// ID of the user who saved it.
    pub owner_id: String,
    /// Street address, e.g. `"Lot 45 Winter Street"`.
    #[serde(default)]
    pub street_address: Option<String>,
    /// City or town.
    #[serde(default)]
    pub city: Option<String>,
    /// State name or abbreviation.
    #[serde(default)]
    pub state: Option<String>,
    /// Municipality name when no street address is known.
    #[serde(default)]
    pub place_name: Option<String>,
}

impl Property {
    /// The resolver input for this property.
    #[must_use]
    pub fn locator_input(&self) -> LocatorInput {
        LocatorInput {
            street_address: self.street_address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            place_name: self.place_name.clone(),
        }
    }
}

/// Source of saved properties.
#[async_trait]
pub trait PropertyDirectory: Send + Sync {
    /// Returns the property `id` if it exists and belongs to `owner_id`.
    ///
    /// A property owned by someone else is reported as absent.
    async fn find_owned(&self, id: &str, owner_id: &str) -> Option<Property>;
}

#[derive(Debug, Default, Deserialize)]
struct PropertiesFile {
    #[serde(default)]
    properties: Vec<Property>,
}

/// Properties loaded once from a TOML file of `[[properties]]` tables.
#[derive(Debug, Clone, Default)]
pub struct TomlPropertyDirectory {
    properties: Vec<Property>,
}

impl TomlPropertyDirectory {
    /// Loads the directory from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the file cannot be read or parsed, or
    /// repeats a property ID.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let directory = Self::parse(&contents)?;
        log::info!(
            "Loaded {} properties from {}",
            directory.properties.len(),
            path.display()
        );
        Ok(directory)
    }

    /// Parses a properties document.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the document is not valid or repeats
    /// a property ID.
    pub fn parse(contents: &str) -> Result<Self, DirectoryError> {
        let file: PropertiesFile = toml::de::from_str(contents)?;

        let mut seen = std::collections::BTreeSet::new();
        for property in &file.properties {
            if !seen.insert(property.id.as_str()) {
                return Err(DirectoryError::DuplicateId {
                    id: property.id.clone(),
                });
            }
        }

        Ok(Self {
            properties: file.properties,
        })
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the directory has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[async_trait]
impl PropertyDirectory for TomlPropertyDirectory {
    async fn find_owned(&self, id: &str, owner_id: &str) -> Option<Property> {
        self.properties
            .iter()
            .find(|p| p.id == id && p.owner_id == owner_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        [[properties]]
        id = "camp"
        owner_id = "u-1"
        street_address = "Lot 45 Winter Street"
        city = "Madawaska"
        state = "ME"

        [[properties]]
        id = "woodlot"
        owner_id = "u-2"
        place_name = "T15 R6 WELS"
    "#;

    #[tokio::test]
    async fn finds_only_owned_properties() {
        let directory = TomlPropertyDirectory::parse(DOC).unwrap();
        assert_eq!(directory.len(), 2);

        let camp = directory.find_owned("camp", "u-1").await.unwrap();
        assert_eq!(camp.city.as_deref(), Some("Madawaska"));

        assert!(directory.find_owned("camp", "u-2").await.is_none());
        assert!(directory.find_owned("cabin", "u-1").await.is_none());
    }

    #[test]
    fn maps_to_locator_input() {
        let directory = TomlPropertyDirectory::parse(DOC).unwrap();
        let woodlot = &directory.properties[1];
        let input = woodlot.locator_input();
        assert_eq!(input.place_name(), Some("T15 R6 WELS"));
        assert!(input.full_address().is_none());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let doc = r#"
            [[properties]]
            id = "camp"
            owner_id = "u-1"

            [[properties]]
            id = "camp"
            owner_id = "u-2"
        "#;
        assert!(matches!(
            TomlPropertyDirectory::parse(doc),
            Err(DirectoryError::DuplicateId { .. })
        ));
    }

    #[test]
    fn empty_document() {
        assert!(TomlPropertyDirectory::parse("").unwrap().is_empty());
    }
}
