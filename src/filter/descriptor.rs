//! Entity filter descriptors
//!
//! A descriptor is the compile-time registry mapping field names to
//! extractor functions and primitive kinds for one entity type. It is
//! purely declarative: the same generic engine walks any descriptor, so
//! adding a record type never means rewriting match or availability logic.

use std::fmt;

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::models::types::FieldValue;

pub use crate::filter::primitives::FilterKind;

/// One declared filter field: name, primitive kind, extractor
pub struct FieldDescriptor<R> {
    /// Field name as exposed to filter specifications and chart options
    pub name: &'static str,
    /// Primitive kind governing match and availability semantics
    pub kind: FilterKind,
    extract: fn(&R) -> FieldValue,
}

impl<R> FieldDescriptor<R> {
    /// Extract this field's value from a record
    #[must_use]
    pub fn extract(&self, record: &R) -> FieldValue {
        (self.extract)(record)
    }
}

impl<R> Clone for FieldDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            kind: self.kind.clone(),
            extract: self.extract,
        }
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// The ordered list of filter fields declared for one entity type
pub struct EntityDescriptor<R> {
    entity: &'static str,
    fields: Vec<FieldDescriptor<R>>,
}

impl<R> EntityDescriptor<R> {
    /// Create an empty descriptor for the named entity type
    #[must_use]
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            fields: Vec::new(),
        }
    }

    /// Declare a filter field
    #[must_use]
    pub fn field(
        mut self,
        name: &'static str,
        kind: FilterKind,
        extract: fn(&R) -> FieldValue,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name,
            kind,
            extract,
        });
        self
    }

    /// The entity type this descriptor describes
    #[must_use]
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Check the descriptor for configuration mistakes
    ///
    /// Duplicate field names are a programming error and are surfaced here,
    /// at startup, rather than at query time.
    pub fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for field in &self.fields {
            if !seen.insert(field.name) {
                return Err(Error::DuplicateField {
                    entity: self.entity.to_string(),
                    field: field.name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Look up a declared field by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor<R>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a declared field, failing with a configuration error
    pub fn require(&self, name: &str) -> Result<&FieldDescriptor<R>> {
        self.get(name).ok_or_else(|| Error::UnknownField {
            entity: self.entity.to_string(),
            field: name.to_string(),
        })
    }

    /// Iterate over the declared fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor<R>> {
        self.fields.iter()
    }

    /// Number of declared fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the descriptor declares no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<R> Clone for EntityDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity,
            fields: self.fields.clone(),
        }
    }
}

impl<R> fmt::Debug for EntityDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("entity", &self.entity)
            .field("fields", &self.fields)
            .finish()
    }
}
