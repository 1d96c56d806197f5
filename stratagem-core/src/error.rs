//! Error types for registry operations
//!
//! Every error carries:
//! - A human-readable message
//! - A stable error code (e.g. `IMPLEMENTATION_NOT_FOUND`)
//! - A category for grouping
//!
//! The categories are what consumers branch on. A selection UI maps
//! [`ErrorCategory::NotFound`] to "no such option", [`ErrorCategory::Validation`]
//! to "misconfigured plugin" and [`ErrorCategory::Resolution`] to a deployment
//! error.
//!
//! # Example
//!
//! ```rust
//! use stratagem_core::error::{ErrorCategory, StratagemError};
//!
//! fn describe(err: &StratagemError) -> &'static str {
//!     match err.category() {
//!         ErrorCategory::NotFound => "no such option",
//!         ErrorCategory::Validation => "misconfigured plugin",
//!         ErrorCategory::Resolution => "deployment error",
//!         _ => "internal error",
//!     }
//! }
//!
//! let err = StratagemError::ImplementationNotFound {
//!     registry: "Notifiers".to_string(),
//!     slug: "fax".to_string(),
//! };
//! assert_eq!(describe(&err), "no such option");
//! assert_eq!(err.error_code(), "IMPLEMENTATION_NOT_FOUND");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, StratagemError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Identifier does not resolve to a registered entry
    NotFound,
    /// Candidate implementation or relationship was rejected
    Validation,
    /// A fully-qualified name could not be resolved to a type
    Resolution,
    /// Caller supplied an unusable combination of arguments
    InvalidArgument,
    /// Configuration could not be loaded or parsed
    Configuration,
    /// Something broke inside the library
    Internal,
}

/// Errors that can occur in registry operations
#[derive(Error, Debug)]
pub enum StratagemError {
    // ═══════════════════════════════════════════════════════════════════════
    // Lookup errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Slug is not present in the registry's catalog
    #[error("No implementation exists for slug '{slug}' in registry '{registry}'")]
    ImplementationNotFound { registry: String, slug: String },

    /// Nothing in the registry is available for the given context
    #[error("No implementations available in current context for registry '{registry}'")]
    NoAvailableImplementation { registry: String },

    /// Registry name is not known to the application context
    #[error("Registry not found: '{name}'")]
    RegistryNotFound { name: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Validation errors (registration was rejected)
    // ═══════════════════════════════════════════════════════════════════════

    /// Implementation was submitted without a slug
    #[error("Implementation '{type_name}' must define a non-empty slug")]
    MissingSlug { type_name: String },

    /// Implementation does not declare the registry's required interface
    #[error("Implementation '{type_name}' must implement interface '{interface}'")]
    InterfaceMismatch { type_name: String, interface: String },

    /// A custom validation hook rejected the implementation
    #[error("Implementation '{slug}' rejected: {reason}")]
    Rejected { slug: String, reason: String },

    /// One or more candidate values are not registered
    #[error("{}", invalid_entries_message(.entries))]
    InvalidEntries { entries: Vec<String> },

    /// Declaring the relationship would make the registry graph cyclic
    #[error("Registry relationship '{parent}' -> '{child}' would create a cycle")]
    RelationshipCycle { parent: String, child: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Resolution errors (identifier → type)
    // ═══════════════════════════════════════════════════════════════════════

    /// Name is not a path-qualified type name
    #[error("Invalid value '{name}': must be a fully qualified type name (e.g. 'crate::module::Type')")]
    InvalidName { name: String },

    /// Name is well formed but no such type was declared
    #[error("Unable to resolve '{name}': no type with this name is declared to registry '{registry}'")]
    UnresolvedName { registry: String, name: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Argument errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Neither or both of the mutually exclusive selectors were supplied
    #[error("Invalid selector: {reason}")]
    InvalidSelector { reason: String },

    /// Registry cannot take part in a parent/child relationship as a child
    #[error("Registry '{registry}' is not hierarchical and cannot have a parent registry")]
    NotHierarchical { registry: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Configuration and infrastructure errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Configuration value is out of range or inconsistent
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O operation failed
    #[error("IO error: {message}")]
    Io { message: String },

    /// Cache backend failed
    #[error("Cache backend error: {reason}")]
    Cache { reason: String },
}

fn invalid_entries_message(entries: &[String]) -> String {
    match entries {
        [single] => format!("Invalid entry `{}`", single),
        _ => format!("Invalid entries `{}`", entries.join(", ")),
    }
}

impl From<std::io::Error> for StratagemError {
    fn from(err: std::io::Error) -> Self {
        StratagemError::Io {
            message: err.to_string(),
        }
    }
}

impl StratagemError {
    /// Returns true if the identifier simply does not exist
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Returns true if a name could not be turned into a type
    pub fn is_resolution_error(&self) -> bool {
        self.category() == ErrorCategory::Resolution
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            StratagemError::ImplementationNotFound { .. }
            | StratagemError::NoAvailableImplementation { .. }
            | StratagemError::RegistryNotFound { .. } => ErrorCategory::NotFound,

            StratagemError::MissingSlug { .. }
            | StratagemError::InterfaceMismatch { .. }
            | StratagemError::Rejected { .. }
            | StratagemError::InvalidEntries { .. }
            | StratagemError::RelationshipCycle { .. } => ErrorCategory::Validation,

            StratagemError::InvalidName { .. }
            | StratagemError::UnresolvedName { .. } => ErrorCategory::Resolution,

            StratagemError::InvalidSelector { .. }
            | StratagemError::NotHierarchical { .. } => ErrorCategory::InvalidArgument,

            StratagemError::InvalidConfig { .. }
            | StratagemError::Json(_)
            | StratagemError::Io { .. } => ErrorCategory::Configuration,

            StratagemError::Cache { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the stable error code for this error
    ///
    /// Codes are uppercase, underscore-separated and stable across versions.
    pub fn error_code(&self) -> &'static str {
        match self {
            StratagemError::ImplementationNotFound { .. } => "IMPLEMENTATION_NOT_FOUND",
            StratagemError::NoAvailableImplementation { .. } => "NO_AVAILABLE_IMPLEMENTATION",
            StratagemError::RegistryNotFound { .. } => "REGISTRY_NOT_FOUND",
            StratagemError::MissingSlug { .. } => "MISSING_SLUG",
            StratagemError::InterfaceMismatch { .. } => "INTERFACE_MISMATCH",
            StratagemError::Rejected { .. } => "IMPLEMENTATION_REJECTED",
            StratagemError::InvalidEntries { .. } => "INVALID_ENTRIES",
            StratagemError::RelationshipCycle { .. } => "RELATIONSHIP_CYCLE",
            StratagemError::InvalidName { .. } => "INVALID_NAME",
            StratagemError::UnresolvedName { .. } => "UNRESOLVED_NAME",
            StratagemError::InvalidSelector { .. } => "INVALID_SELECTOR",
            StratagemError::NotHierarchical { .. } => "NOT_HIERARCHICAL",
            StratagemError::InvalidConfig { .. } => "INVALID_CONFIG",
            StratagemError::Json(_) => "JSON_ERROR",
            StratagemError::Io { .. } => "IO_ERROR",
            StratagemError::Cache { .. } => "CACHE_ERROR",
        }
    }

    /// Converts this error to a JSON-serializable response object
    ///
    /// ```json
    /// {
    ///   "error": {
    ///     "code": "IMPLEMENTATION_NOT_FOUND",
    ///     "message": "No implementation exists for slug 'fax' ...",
    ///     "category": "not_found"
    ///   }
    /// }
    /// ```
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
            },
        }
    }
}

/// JSON-serializable error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "IMPLEMENTATION_NOT_FOUND")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
}
