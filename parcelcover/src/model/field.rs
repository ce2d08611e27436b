//! Field definitions and the versioned schema.
//!
//! Schema mutation is guarded by a tagged [`FieldCheck`] rather than ad hoc
//! membership tests: a field that is already present with the same type is a
//! no-op, while a type mismatch surfaces as a schema conflict at the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Double,
    Integer,
    Text,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Double => f.write_str("DOUBLE"),
            FieldType::Integer => f.write_str("INTEGER"),
            FieldType::Text => f.write_str("TEXT"),
        }
    }
}

/// A named, typed attribute field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    /// Shorthand for a DOUBLE field, the measurement field type.
    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Double)
    }

    /// Shorthand for an INTEGER field (keys, back-references).
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Shorthand for a TEXT field (categorical attributes).
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }
}

/// Outcome of checking a field name against a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCheck {
    /// No field of that name exists.
    Absent,
    /// A field of that name exists with the requested type.
    PresentSameType,
    /// A field of that name exists with a different type.
    PresentWrongType(FieldType),
}

/// An ordered, versioned field schema.
///
/// Every mutation bumps the version, so callers can detect concurrent
/// evolution and tests can assert idempotence (same-type `add_field` leaves
/// the version untouched).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    version: u32,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { version: 1, fields }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Positional index of a field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field definition by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Checks a prospective field against the current schema.
    pub fn check_field(&self, name: &str, field_type: FieldType) -> FieldCheck {
        match self.field(name) {
            None => FieldCheck::Absent,
            Some(f) if f.field_type == field_type => FieldCheck::PresentSameType,
            Some(f) => FieldCheck::PresentWrongType(f.field_type),
        }
    }

    /// Adds a field if absent, returning the pre-mutation check.
    ///
    /// `PresentSameType` is a no-op (no version bump). `PresentWrongType`
    /// leaves the schema untouched; the caller maps it to a schema
    /// conflict error with dataset context.
    pub fn add_field(&mut self, field: Field) -> FieldCheck {
        let check = self.check_field(&field.name, field.field_type);
        if check == FieldCheck::Absent {
            self.fields.push(field);
            self.version += 1;
        }
        check
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_field_tags() {
        let schema = Schema::new(vec![Field::text("OWN_TYPE"), Field::double("Parcel_Acres")]);

        assert_eq!(schema.check_field("missing", FieldType::Double), FieldCheck::Absent);
        assert_eq!(
            schema.check_field("Parcel_Acres", FieldType::Double),
            FieldCheck::PresentSameType
        );
        assert_eq!(
            schema.check_field("OWN_TYPE", FieldType::Double),
            FieldCheck::PresentWrongType(FieldType::Text)
        );
    }

    #[test]
    fn test_add_field_is_idempotent() {
        let mut schema = Schema::new(vec![Field::text("OWN_TYPE")]);
        let v0 = schema.version();

        assert_eq!(schema.add_field(Field::double("Forest_Acres")), FieldCheck::Absent);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.version(), v0 + 1);

        // Second add with the same name/type: no new field, no version bump
        assert_eq!(
            schema.add_field(Field::double("Forest_Acres")),
            FieldCheck::PresentSameType
        );
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.version(), v0 + 1);
    }

    #[test]
    fn test_add_field_wrong_type_leaves_schema_untouched() {
        let mut schema = Schema::new(vec![Field::text("OWN_TYPE")]);
        let before = schema.clone();

        let check = schema.add_field(Field::double("OWN_TYPE"));
        assert_eq!(check, FieldCheck::PresentWrongType(FieldType::Text));
        assert_eq!(schema, before);
    }

    #[test]
    fn test_field_index_order() {
        let schema = Schema::new(vec![
            Field::integer("FID"),
            Field::text("OWN_TYPE"),
            Field::double("Parcel_Acres"),
        ]);
        assert_eq!(schema.field_index("FID"), Some(0));
        assert_eq!(schema.field_index("Parcel_Acres"), Some(2));
        assert_eq!(schema.field_index("nope"), None);
    }
}
