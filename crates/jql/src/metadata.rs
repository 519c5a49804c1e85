//! Field, function and reserved-word metadata.
//!
//! The document is produced by the server that owns the issue schema:
//!
//! ```json
//! {
//!   "fields": [{"value": "status", "displayName": "Status", "operators": ["=", "in"],
//!               "types": ["com.atlassian.jira.issue.status.Status"],
//!               "auto": "true", "orderable": "true", "searchable": "true"}],
//!   "functions": [{"value": "currentUser()", "displayName": "currentUser()",
//!                  "isList": "false", "types": ["com.atlassian.crowd.embedded.api.User"]}],
//!   "reservedWords": ["and", "or", "not", "empty", "null", "order", "by"]
//! }
//! ```
//!
//! Flags arrive either as booleans or as the strings `"true"`/`"false"`.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::JqlConfig;
use crate::errors::JqlError;
use crate::parser::Parser;
use crate::text::{equals_ignore_case, unquote};

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Text(text) => text.eq_ignore_ascii_case("true"),
    })
}

/// A field that may appear on the left of an operator or in `ORDER BY`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Value inserted into the query; quoted when it contains spaces.
    pub value: String,
    pub display_name: String,
    /// Custom field id such as `cf[10001]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfid: Option<String>,
    /// Operators the field supports.
    #[serde(default)]
    pub operators: Vec<String>,
    /// Value types the field accepts.
    #[serde(default)]
    pub types: Vec<String>,
    /// Whether values can be looked up remotely.
    #[serde(default, deserialize_with = "flag")]
    pub auto: bool,
    #[serde(default, deserialize_with = "flag")]
    pub orderable: bool,
    #[serde(default, deserialize_with = "flag")]
    pub searchable: bool,
}

impl FieldDescriptor {
    /// Whether `name` refers to this field, by unquoted value or cfid.
    pub fn matches(&self, name: &str) -> bool {
        equals_ignore_case(&unquote(&self.value), name)
            || self
                .cfid
                .as_deref()
                .is_some_and(|cfid| equals_ignore_case(cfid, name))
    }
}

/// A JQL function usable as an operand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    pub value: String,
    pub display_name: String,
    /// Whether the function returns a list.
    #[serde(default, deserialize_with = "flag")]
    pub is_list: bool,
    /// Value types the function's result can stand for.
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JqlMetadata {
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub functions: Vec<FunctionDescriptor>,
    #[serde(default)]
    pub reserved_words: Vec<String>,
}

impl JqlMetadata {
    pub fn from_json(text: &str) -> Result<Self, JqlError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, JqlError> {
        let text = std::fs::read_to_string(path).map_err(|source| JqlError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Load the document named by `explicit`, else the one the config
    /// points at. With neither, the metadata is empty.
    pub fn discover(explicit: Option<&Path>, config: &JqlConfig) -> Result<Self, JqlError> {
        match explicit.or_else(|| config.metadata_path()) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Fields usable in a where clause.
    pub fn searchable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.searchable)
    }

    /// Fields usable after `ORDER BY`.
    pub fn orderable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.orderable)
    }

    /// Resolve a searchable field by name.
    pub fn find_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.searchable_fields().find(|field| field.matches(name))
    }

    /// A parser that rejects this document's reserved words.
    pub fn parser(&self) -> Parser {
        Parser::new(&self.reserved_words)
    }
}
