//! Stream registry
//!
//! Validated, ordered view over the static resource table. The table is
//! checked once per process; lookups afterwards are plain slice scans.

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::connectors::metadata::{ResourceDefinition, StreamMetadata};
use crate::connectors::resources::RESOURCES;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Stream '{name}' not found")]
    StreamNotFound { name: String },
    #[error("Stream '{name}' is declared more than once")]
    DuplicateStream { name: String },
    #[error("Stream '{name}' declares no fields")]
    EmptySchema { name: String },
    #[error("Stream '{name}' declares field '{field}' more than once")]
    DuplicateField { name: String, field: String },
    #[error("Stream '{name}' uses primary key '{field}' which is not a declared field")]
    UndeclaredPrimaryKey { name: String, field: String },
}

/// Global registry instance
static REGISTRY: OnceLock<Result<Registry, RegistryError>> = OnceLock::new();

/// Ordered set of resource definitions
#[derive(Debug, Clone)]
pub struct Registry {
    definitions: Vec<&'static ResourceDefinition>,
}

impl Registry {
    /// Validate a resource table and build a registry over it.
    pub fn new(definitions: &'static [ResourceDefinition]) -> Result<Self, RegistryError> {
        let mut names = HashSet::new();

        for definition in definitions {
            if !names.insert(definition.name) {
                return Err(RegistryError::DuplicateStream {
                    name: definition.name.to_string(),
                });
            }

            if definition.fields.is_empty() {
                return Err(RegistryError::EmptySchema {
                    name: definition.name.to_string(),
                });
            }

            let mut fields = HashSet::new();
            for field in definition.field_names() {
                if !fields.insert(field) {
                    return Err(RegistryError::DuplicateField {
                        name: definition.name.to_string(),
                        field: field.to_string(),
                    });
                }
            }

            if let Some(pk) = definition.primary_key {
                if !fields.contains(pk) {
                    return Err(RegistryError::UndeclaredPrimaryKey {
                        name: definition.name.to_string(),
                        field: pk.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            definitions: definitions.iter().collect(),
        })
    }

    /// Get the global registry built from the compiled-in resource table
    pub fn global() -> Result<&'static Registry, RegistryError> {
        REGISTRY
            .get_or_init(|| Self::new(RESOURCES))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Get a resource definition by stream name
    pub fn get(&self, name: &str) -> Result<&'static ResourceDefinition, RegistryError> {
        self.definitions
            .iter()
            .copied()
            .find(|definition| definition.name == name)
            .ok_or_else(|| RegistryError::StreamNotFound {
                name: name.to_string(),
            })
    }

    /// All definitions in declaration order
    pub fn definitions(&self) -> impl Iterator<Item = &'static ResourceDefinition> + '_ {
        self.definitions.iter().copied()
    }

    /// Stream names in declaration order
    pub fn names(&self) -> Vec<&'static str> {
        self.definitions().map(|definition| definition.name).collect()
    }

    /// Catalog entries for every stream, in declaration order
    pub fn list_metadata(&self) -> Vec<StreamMetadata> {
        self.definitions().map(|definition| definition.metadata()).collect()
    }

    /// Keep only the named streams, preserving declaration order.
    ///
    /// Every requested name must exist.
    pub fn select(&self, names: &[String]) -> Result<Vec<&'static ResourceDefinition>, RegistryError> {
        for name in names {
            self.get(name)?;
        }

        Ok(self
            .definitions()
            .filter(|definition| names.iter().any(|name| name == definition.name))
            .collect())
    }
}
