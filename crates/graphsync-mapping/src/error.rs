//! Mapping parse errors.

use thiserror::Error;

/// Errors raised while normalizing a grouped field declaration.
///
/// Any of these skips the owning index; the run continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    /// The declaration has no groups at all
    #[error("Invalid mapping: declaration is empty")]
    EmptyDeclaration,

    /// A group value is not a sequence of field names
    #[error("Invalid mapping: group '{0}' is not a sequence of field names")]
    InvalidGroup(String),

    /// A declared type is outside the closed field type set
    #[error("Invalid mapping: unknown field type '{0}'")]
    UnknownType(String),

    /// A field name is blank
    #[error("Invalid mapping: blank field name in group '{0}'")]
    BlankField(String),

    /// A leaf field name appears more than once across all scopes
    #[error("Invalid mapping: field '{0}' is declared more than once")]
    DuplicateField(String),

    /// A nested field uses more than one dot level
    #[error("Invalid mapping: field '{0}' nests deeper than one level")]
    TooDeep(String),

    /// A top-level field name collides with a nested parent object
    #[error("Invalid mapping: field '{0}' collides with a nested object of the same name")]
    ParentCollision(String),
}
