//! Error types for relation resolution and resource serialization.
//!
//! Every fallible operation in this crate returns a [`ResourceError`], which
//! carries:
//! - An [`ErrorCode`] for programmatic handling
//! - A human readable message
//! - Context about the operation, entity and relation involved
//! - Suggestions and help text
//!
//! # Error Codes
//!
//! Error codes follow a pattern: R{category}{number}
//! - 1xxx: Relation errors (bad path, undefined relation, not loaded)
//! - 2xxx: Operation errors (unsupported output conversion)
//! - 3xxx: Data errors (casts, serialization)
//! - 4xxx: Configuration errors
//! - 9xxx: Internal and collaborator errors
//!
//! ```rust
//! use apiresource_core::{ErrorCode, ResourceError};
//!
//! let err = ResourceError::invalid_relation_path("author..profile", "empty segment");
//! assert_eq!(err.code, ErrorCode::InvalidRelationPath);
//! assert_eq!(err.code.code(), "R1001");
//! assert!(err.is_relation_error());
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Relation errors (1xxx)
    /// Malformed dotted relation path (R1001).
    InvalidRelationPath = 1001,
    /// Relation is not defined on the entity (R1002).
    MissingRelation = 1002,
    /// Relation is defined but was never loaded (R1003).
    RelationNotLoaded = 1003,
    /// Loaded value disagrees with the declared relation cardinality (R1004).
    CardinalityMismatch = 1004,

    // Operation errors (2xxx)
    /// Output conversion not supported for this resourceable (R2001).
    UnsupportedOperation = 2001,

    // Data errors (3xxx)
    /// Attribute value could not be cast (R3001).
    InvalidCast = 3001,
    /// Output could not be serialized (R3002).
    Serialization = 3002,

    // Configuration errors (4xxx)
    /// Invalid configuration (R4001).
    InvalidConfiguration = 4001,
    /// Configuration file could not be read (R4002).
    Io = 4002,

    // Internal errors (9xxx)
    /// Internal error (R9001).
    Internal = 9001,
    /// Failure reported by an entity or loader collaborator (R9002).
    Collaborator = 9002,
}

impl ErrorCode {
    /// Get the error code string (e.g., "R1001").
    pub fn code(&self) -> String {
        format!("R{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidRelationPath => "Invalid relation path",
            Self::MissingRelation => "Relation not defined",
            Self::RelationNotLoaded => "Relation not loaded",
            Self::CardinalityMismatch => "Relation cardinality mismatch",
            Self::UnsupportedOperation => "Unsupported operation",
            Self::InvalidCast => "Invalid attribute cast",
            Self::Serialization => "Serialization error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Io => "I/O error",
            Self::Internal => "Internal error",
            Self::Collaborator => "Collaborator error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The entity involved.
    pub entity: Option<String>,
    /// The relation path involved.
    pub relation: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while resolving relations or serializing resources.
#[derive(Error, Debug)]
pub struct ResourceError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl ResourceError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the entity.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.context.entity = Some(entity.into());
        self
    }

    /// Set the relation path.
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.context.relation = Some(relation.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create an invalid relation path error.
    pub fn invalid_relation_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::InvalidRelationPath,
            format!("Invalid relation path '{}': {}", path, reason.into()),
        )
        .with_relation(&path)
        .with_suggestion("Relation paths are dot-separated names without empty segments, e.g. 'author.profile'")
    }

    /// Create a missing relation error.
    pub fn missing_relation(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        let entity = entity.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::MissingRelation,
            format!("Relation '{}' is not defined on {}", relation, entity),
        )
        .with_entity(&entity)
        .with_relation(&relation)
        .with_suggestion(format!("Check the relation name against the {} definition", entity))
    }

    /// Create a relation not loaded error.
    pub fn relation_not_loaded(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        let entity = entity.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::RelationNotLoaded,
            format!("Relation '{}' on {} has not been loaded", relation, entity),
        )
        .with_entity(&entity)
        .with_relation(&relation)
        .with_suggestion("Attach a loader to the builder, or load the relation before building")
    }

    /// Create a cardinality mismatch error.
    pub fn cardinality_mismatch(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        let entity = entity.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::CardinalityMismatch,
            format!(
                "Loaded value of '{}' on {} does not match its declared cardinality",
                relation, entity
            ),
        )
        .with_entity(&entity)
        .with_relation(&relation)
    }

    /// Create an unsupported operation error.
    pub fn unsupported_operation(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        let operation = operation.into();
        Self::new(
            ErrorCode::UnsupportedOperation,
            format!("Unsupported operation '{}': {}", operation, reason.into()),
        )
        .with_context(&operation)
    }

    /// Create an invalid cast error.
    pub fn invalid_cast(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidCast,
            format!("Cannot cast attribute '{}': {}", attribute.into(), message.into()),
        )
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Serialization, message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Invalid configuration: {}", message.into()),
        )
    }

    /// Create an I/O error for a configuration path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::new(ErrorCode::Io, format!("Failed to read {}", path.into())).with_source(source)
    }

    /// Wrap a failure reported by a collaborator.
    pub fn collaborator<E: std::error::Error + Send + Sync + 'static>(source: E) -> Self {
        Self::new(ErrorCode::Collaborator, source.to_string()).with_source(source)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message.into()))
            .with_help("This is likely a bug in apiresource - please report it")
    }

    // ============== Error Checks ==============

    /// Check if this is a relation error.
    pub fn is_relation_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidRelationPath
                | ErrorCode::MissingRelation
                | ErrorCode::RelationNotLoaded
                | ErrorCode::CardinalityMismatch
        )
    }

    /// Check if this is an unsupported operation error.
    pub fn is_unsupported(&self) -> bool {
        self.code == ErrorCode::UnsupportedOperation
    }

    /// Check if this is a configuration error.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self.code, ErrorCode::InvalidConfiguration | ErrorCode::Io)
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref entity) = self.context.entity {
            output.push_str(&format!("  → Entity: {}\n", entity));
        }
        if let Some(ref relation) = self.context.relation {
            output.push_str(&format!("  → Relation: {}\n", relation));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::InvalidRelationPath.code(), "R1001");
        assert_eq!(ErrorCode::UnsupportedOperation.code(), "R2001");
        assert_eq!(ErrorCode::Collaborator.code(), "R9002");
    }

    #[test]
    fn test_missing_relation_error() {
        let err = ResourceError::missing_relation("Post", "editor");
        assert!(err.is_relation_error());
        assert!(err.message.contains("editor"));
        assert_eq!(err.context.entity.as_deref(), Some("Post"));
        assert_eq!(err.context.relation.as_deref(), Some("editor"));
    }

    #[test]
    fn test_unsupported_operation() {
        let err = ResourceError::unsupported_operation("to_paginator", "not paginated");
        assert!(err.is_unsupported());
        assert!(!err.is_relation_error());
        assert_eq!(err.to_string(), "[R2001] Unsupported operation 'to_paginator': not paginated");
    }

    #[test]
    fn test_display_full() {
        let err = ResourceError::invalid_relation_path("a..b", "empty segment")
            .with_context("Configuring builder relations");

        let output = err.display_full();
        assert!(output.contains("R1001"));
        assert!(output.contains("a..b"));
        assert!(output.contains("Suggestions"));
        assert!(output.contains("Configuring builder relations"));
    }

    #[test]
    fn test_collaborator_keeps_source() {
        let io = std::io::Error::other("connection reset");
        let err = ResourceError::collaborator(io);
        assert_eq!(err.code, ErrorCode::Collaborator);
        assert!(err.source.is_some());
        assert!(err.message.contains("connection reset"));
    }
}
