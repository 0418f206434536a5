//! Schema definitions and model registration
//!
//! A [`Schema`] describes the fields of one collection. It is registered
//! locally through
//! [`ConnectionManager::create_collection`](crate::ConnectionManager::create_collection)
//! and checked inside the delegated step of create and update operations,
//! after before-hooks have had a chance to fill fields in.

use bson::{Bson, Document as BsonDocument};
use docwright_common::{DocwrightError, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

/// Maximum allowed length for collection names (MongoDB limit is 255, we're more conservative)
const MAX_COLLECTION_NAME_LENGTH: usize = 120;

/// Validated collection name
///
/// # Guarantees
/// - Not empty
/// - Maximum 120 characters
/// - No null bytes
/// - No "system." prefix (system collections)
/// - No $ characters (special operators)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedCollectionName {
    name: String,
}

impl ValidatedCollectionName {
    /// Creates a new validated collection name
    ///
    /// # Errors
    /// Returns ValidationError if:
    /// - Name is empty
    /// - Name exceeds MAX_COLLECTION_NAME_LENGTH
    /// - Name contains null bytes
    /// - Name starts with "system."
    /// - Name contains $ characters
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(DocwrightError::Validation(
                "Collection name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_COLLECTION_NAME_LENGTH {
            return Err(DocwrightError::Validation(format!(
                "Collection name exceeds maximum length of {} characters: '{}'",
                MAX_COLLECTION_NAME_LENGTH, name
            )));
        }

        if name.contains('\0') {
            return Err(DocwrightError::Validation(
                "Collection name cannot contain null bytes".to_string(),
            ));
        }

        if name.starts_with("system.") {
            return Err(DocwrightError::Validation(format!(
                "Collection name cannot start with 'system.' (reserved): '{}'",
                name
            )));
        }

        if name.contains('$') {
            return Err(DocwrightError::Validation(format!(
                "Collection name cannot contain '$' character: '{}'",
                name
            )));
        }

        // Allowed, but worth a look
        if name.contains("..") || name.contains("//") {
            warn!(collection = name, "Collection name contains suspicious pattern");
        }

        Ok(ValidatedCollectionName {
            name: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn into_string(self) -> String {
        self.name
    }
}

impl AsRef<str> for ValidatedCollectionName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedCollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

// =====================
// Field types
// =====================

/// Expected BSON type of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    /// Int32 or Int64
    Int,
    Double,
    /// Any numeric type
    Number,
    Bool,
    ObjectId,
    DateTime,
    /// Array with items of a specific type
    Array(Box<FieldType>),
    /// Embedded document with typed fields (unlisted fields allowed)
    Object(HashMap<String, FieldType>),
    /// Any type (no validation)
    Any,
}

impl FieldType {
    /// Get the human-readable type name
    pub fn type_name(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Int => "int".to_string(),
            FieldType::Double => "double".to_string(),
            FieldType::Number => "number".to_string(),
            FieldType::Bool => "bool".to_string(),
            FieldType::ObjectId => "objectid".to_string(),
            FieldType::DateTime => "datetime".to_string(),
            FieldType::Array(items) => format!("array<{}>", items.type_name()),
            FieldType::Object(_) => "object".to_string(),
            FieldType::Any => "any".to_string(),
        }
    }
}

/// Get the BSON type name for error messages
pub fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "object",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::DateTime(_) => "datetime",
        Bson::ObjectId(_) => "objectid",
        Bson::Binary(_) => "binary",
        Bson::Decimal128(_) => "decimal128",
        _ => "other",
    }
}

fn type_error(field_path: &str, expected: &FieldType, value: &Bson) -> DocwrightError {
    DocwrightError::Validation(format!(
        "field '{}' expected type '{}', got '{}'",
        field_path,
        expected.type_name(),
        bson_type_name(value)
    ))
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(*n as f64),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Validate a single value against an expected type
pub fn validate_value(field_path: &str, value: &Bson, expected: &FieldType) -> Result<()> {
    let ok = match (expected, value) {
        (FieldType::Any, _) => true,
        (FieldType::String, Bson::String(_)) => true,
        (FieldType::Int, Bson::Int32(_) | Bson::Int64(_)) => true,
        (FieldType::Double, Bson::Double(_)) => true,
        (FieldType::Number, v) => as_number(v).is_some(),
        (FieldType::Bool, Bson::Boolean(_)) => true,
        (FieldType::ObjectId, Bson::ObjectId(_)) => true,
        (FieldType::DateTime, Bson::DateTime(_)) => true,
        (FieldType::Array(items), Bson::Array(values)) => {
            for (idx, item) in values.iter().enumerate() {
                validate_value(&format!("{}[{}]", field_path, idx), item, items)?;
            }
            true
        }
        (FieldType::Object(fields), Bson::Document(doc)) => {
            for (name, field_type) in fields {
                if let Some(v) = doc.get(name) {
                    validate_value(&format!("{}.{}", field_path, name), v, field_type)?;
                }
            }
            true
        }
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(type_error(field_path, expected, value))
    }
}

// =====================
// Schema
// =====================

/// Definition of one field in a [`Schema`]
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub required: bool,
    /// Value inserted on create when the field is absent
    pub default: Option<Bson>,
    /// Inclusive lower bound for numeric fields
    pub min: Option<f64>,
    /// Inclusive upper bound for numeric fields
    pub max: Option<f64>,
    /// Maximum length for string fields, in characters
    pub max_length: Option<usize>,
}

impl FieldSpec {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            default: None,
            min: None,
            max: None,
            max_length: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Bson>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    fn validate(&self, name: &str, value: &Bson) -> Result<()> {
        if matches!(value, Bson::Null) {
            if self.required {
                return Err(DocwrightError::Validation(format!(
                    "field '{}' is required",
                    name
                )));
            }
            return Ok(());
        }

        validate_value(name, value, &self.field_type)?;

        if let Some(n) = as_number(value) {
            if let Some(min) = self.min {
                if n < min {
                    return Err(DocwrightError::Validation(format!(
                        "field '{}' must be >= {}, got {}",
                        name, min, n
                    )));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return Err(DocwrightError::Validation(format!(
                        "field '{}' must be <= {}, got {}",
                        name, max, n
                    )));
                }
            }
        }

        if let (Some(limit), Bson::String(s)) = (self.max_length, value) {
            if s.chars().count() > limit {
                return Err(DocwrightError::Validation(format!(
                    "field '{}' exceeds maximum length of {}",
                    name, limit
                )));
            }
        }
        Ok(())
    }
}

/// Field definitions for one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: BTreeMap<String, FieldSpec>,
    strict: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    /// Reject fields the schema does not list (`_id` is always allowed)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fill defaults for absent fields, then validate the whole document
    pub fn prepare_insert(&self, doc: &mut BsonDocument) -> Result<()> {
        for (name, spec) in &self.fields {
            if !doc.contains_key(name) {
                if let Some(default) = &spec.default {
                    doc.insert(name.clone(), default.clone());
                }
            }
        }
        self.validate(doc)
    }

    /// Validate a complete document
    pub fn validate(&self, doc: &BsonDocument) -> Result<()> {
        for (name, spec) in &self.fields {
            match doc.get(name) {
                Some(value) => spec.validate(name, value)?,
                None if spec.required => {
                    return Err(DocwrightError::Validation(format!(
                        "field '{}' is required",
                        name
                    )))
                }
                None => {}
            }
        }
        self.check_unknown(doc.keys())
    }

    /// Validate only the fields present in an update.
    ///
    /// Accepts a plain field document or an operator document; `$set`
    /// bodies are checked, `$unset` of a required field is rejected.
    pub fn validate_partial(&self, update: &BsonDocument) -> Result<()> {
        let has_operators = update.keys().any(|k| k.starts_with('$'));
        if !has_operators {
            return self.validate_fields(update);
        }

        if let Ok(set) = update.get_document("$set") {
            self.validate_fields(set)?;
        }
        if let Ok(unset) = update.get_document("$unset") {
            for name in unset.keys() {
                if self.fields.get(name).is_some_and(|spec| spec.required) {
                    return Err(DocwrightError::Validation(format!(
                        "field '{}' is required and cannot be unset",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_fields(&self, fields: &BsonDocument) -> Result<()> {
        for (name, value) in fields {
            if let Some(spec) = self.fields.get(name) {
                spec.validate(name, value)?;
            }
        }
        self.check_unknown(fields.keys())
    }

    fn check_unknown<'a>(&self, keys: impl Iterator<Item = &'a String>) -> Result<()> {
        if !self.strict {
            return Ok(());
        }
        for key in keys {
            if key != "_id" && !self.fields.contains_key(key) {
                return Err(DocwrightError::Validation(format!(
                    "field '{}' is not defined in the schema",
                    key
                )));
            }
        }
        Ok(())
    }
}

/// A registered model: collection name plus its schema
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRef {
    name: ValidatedCollectionName,
    schema: Arc<Schema>,
}

impl ModelRef {
    pub fn new(name: ValidatedCollectionName, schema: Schema) -> Self {
        Self {
            name,
            schema: Arc::new(schema),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}
