//! Stream metadata types
//!
//! Declares the shape of a resource (path, envelope key, identifier, fields)
//! and the catalog entry advertised for it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Coarse type of a declared field, as advertised in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Upstream identifier; Jurnal returns these as integers or strings
    Id,
    String,
    Integer,
    /// Monetary or other fractional amount, always decoded as a decimal
    Decimal,
    Boolean,
    /// Calendar date rendered as a string
    Date,
    Object,
    Array,
}

impl FieldKind {
    /// JSON schema fragment for this kind. Every field is nullable.
    pub fn json_schema(self) -> Value {
        match self {
            FieldKind::Id => json!({"type": ["null", "string", "integer"]}),
            FieldKind::String => json!({"type": ["null", "string"]}),
            FieldKind::Integer => json!({"type": ["null", "integer"]}),
            FieldKind::Decimal => json!({"type": ["null", "number"]}),
            FieldKind::Boolean => json!({"type": ["null", "boolean"]}),
            FieldKind::Date => json!({"type": ["null", "string"], "format": "date"}),
            FieldKind::Object => json!({"type": ["null", "object"]}),
            FieldKind::Array => json!({"type": ["null", "array"]}),
        }
    }
}

/// One declared field of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Static description of one extractable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDefinition {
    /// Stream name advertised in the catalog
    pub name: &'static str,
    /// Path relative to the API base URL
    pub path: &'static str,
    /// Key under which the response nests its records, if any
    pub records_key: Option<&'static str>,
    /// Identifier field
    pub primary_key: Option<&'static str>,
    /// Declared fields, in emission order
    pub fields: &'static [FieldSpec],
}

impl ResourceDefinition {
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|field| field.name)
    }

    /// JSON schema describing the records of this resource.
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| (field.name.to_string(), field.kind.json_schema()))
            .collect();

        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": properties,
        })
    }

    /// Catalog entry for this resource.
    pub fn metadata(&self) -> StreamMetadata {
        StreamMetadata {
            name: self.name.to_string(),
            json_schema: self.json_schema(),
            supported_sync_modes: vec![SyncMode::FullRefresh],
            source_defined_cursor: false,
            default_cursor_field: Vec::new(),
            source_defined_primary_key: self
                .primary_key
                .map(|pk| vec![vec![pk.to_string()]])
                .unwrap_or_default(),
        }
    }
}

/// How a stream can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Every run re-reads the complete result set
    FullRefresh,
    /// Cursor-based reads; no stream of this source supports it
    Incremental,
}

/// Catalog entry advertised by `discover`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub name: String,
    pub json_schema: Value,
    pub supported_sync_modes: Vec<SyncMode>,
    pub source_defined_cursor: bool,
    pub default_cursor_field: Vec<String>,
    pub source_defined_primary_key: Vec<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    static FIELDS: &[FieldSpec] = &[
        FieldSpec::new("id", FieldKind::Id),
        FieldSpec::new("name", FieldKind::String),
        FieldSpec::new("balance_amount", FieldKind::Decimal),
    ];

    static DEFINITION: ResourceDefinition = ResourceDefinition {
        name: "accounts",
        path: "accounts",
        records_key: Some("accounts"),
        primary_key: Some("id"),
        fields: FIELDS,
    };

    #[test]
    fn test_json_schema_lists_fields_in_order() {
        let schema = DEFINITION.json_schema();
        let properties = schema["properties"].as_object().unwrap();

        let keys: Vec<_> = properties.keys().cloned().collect();
        assert_eq!(keys, vec!["id", "name", "balance_amount"]);
        assert_eq!(properties["balance_amount"]["type"], json!(["null", "number"]));
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn test_metadata_is_full_refresh_only() {
        let metadata = DEFINITION.metadata();

        assert_eq!(metadata.name, "accounts");
        assert_eq!(metadata.supported_sync_modes, vec![SyncMode::FullRefresh]);
        assert!(!metadata.source_defined_cursor);
        assert!(metadata.default_cursor_field.is_empty());
        assert_eq!(metadata.source_defined_primary_key, vec![vec!["id".to_string()]]);
    }

    #[test]
    fn test_sync_mode_wire_names() {
        assert_eq!(
            serde_json::to_value(SyncMode::FullRefresh).unwrap(),
            json!("full_refresh")
        );
        let mode: SyncMode = serde_json::from_value(json!("incremental")).unwrap();
        assert_eq!(mode, SyncMode::Incremental);
    }
}
