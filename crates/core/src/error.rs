//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, ValidationError>;

/// A required product field that failed validation.
///
/// Fields are checked in declaration order; the first failure wins.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RequiredField {
    Name,
    Sku,
    Categories,
    Price,
}

impl RequiredField {
    pub fn as_str(self) -> &'static str {
        match self {
            RequiredField::Name => "name",
            RequiredField::Sku => "sku",
            RequiredField::Categories => "categories",
            RequiredField::Price => "price",
        }
    }

    /// Stable, machine-readable identifier for the failure (e.g. `sku_required`).
    pub fn code(self) -> &'static str {
        match self {
            RequiredField::Name => "name_required",
            RequiredField::Sku => "sku_required",
            RequiredField::Categories => "categories_required",
            RequiredField::Price => "price_required",
        }
    }
}

impl core::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-level validation failure.
///
/// Raised only while constructing an entity, never by storage. Callers match on
/// [`ValidationError::field`] (or [`ValidationError::code`]) rather than on the
/// message text.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
#[error("{field} is required")]
pub struct ValidationError {
    field: RequiredField,
}

impl ValidationError {
    pub fn required(field: RequiredField) -> Self {
        Self { field }
    }

    pub fn field(&self) -> RequiredField {
        self.field
    }

    pub fn code(&self) -> &'static str {
        self.field.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_field() {
        let codes = [
            RequiredField::Name.code(),
            RequiredField::Sku.code(),
            RequiredField::Categories.code(),
            RequiredField::Price.code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn message_names_the_field() {
        let err = ValidationError::required(RequiredField::Categories);
        assert_eq!(err.to_string(), "categories is required");
        assert_eq!(err.code(), "categories_required");
        assert_eq!(err.field(), RequiredField::Categories);
    }
}
