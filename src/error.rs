//! Error handling for procflow
//!
//! Structural problems found while loading are not returned through this type;
//! they are collected in the workspace error sink and the offending entity is
//! skipped. Validation failures are state (`is_valid`), not errors. What
//! remains here are rejected edits and I/O problems, surfaced before the graph
//! is touched.

use thiserror::Error;

/// Main error type for procflow operations
#[derive(Error, Debug)]
pub enum EditorError {
    /// A name collides with an existing type, process, field or path
    #[error("Duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// A required field was left empty
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unknown process: {0}")]
    UnknownProcess(String),

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Unknown return path: {0}")]
    UnknownPath(String),

    /// Outputs write to variables and cannot hold literals
    #[error("Output parameter '{0}' cannot take a fixed value")]
    FixedOutput(String),

    /// A type's validation pattern does not compile
    #[error("Invalid validation pattern for type '{type_name}': {message}")]
    InvalidPattern { type_name: String, message: String },

    /// A literal does not satisfy its type's validation pattern
    #[error("'{value}' is not a valid {type_name} value")]
    InvalidFixedValue { type_name: String, value: String },

    /// A variable cannot be bound to a parameter of an incompatible type
    #[error("Variable '{variable}' cannot be bound to parameter '{parameter}': type mismatch")]
    TypeMismatch { parameter: String, variable: String },

    /// The target is a system process or has a fixed signature
    #[error("Process '{0}' cannot be edited")]
    NotEditable(String),

    /// A gesture ended over a target that cannot accept it
    #[error("Invalid drop target: {0}")]
    InvalidDropTarget(String),

    /// The ID counter of an arena has run out
    #[error("No {0} IDs left")]
    IdsExhausted(&'static str),

    /// Saving was refused because some processes are invalid
    #[error("Cannot save while processes are invalid: {}", .0.join(", "))]
    InvalidProcesses(Vec<String>),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EditorError>,
    },
}

impl EditorError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EditorError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error was caused by user input that can be corrected in place.
    pub fn is_user_input(&self) -> bool {
        match self {
            EditorError::DuplicateName { .. }
            | EditorError::MissingField(_)
            | EditorError::InvalidFixedValue { .. }
            | EditorError::TypeMismatch { .. }
            | EditorError::InvalidPattern { .. }
            | EditorError::FixedOutput(_) => true,
            EditorError::WithContext { source, .. } => source.is_user_input(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        EditorError::Serialization(err.to_string())
    }
}

/// Result type alias for procflow operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Extension trait for adding context to Results
///
/// Implemented for any result whose error converts into [`EditorError`], so
/// `std::io` and `serde_json` failures pick up context in one step.
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<EditorError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EditorError::DuplicateName {
            kind: "process",
            name: "Add".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate process name 'Add'");
    }

    #[test]
    fn test_error_with_context() {
        let err = EditorError::UnknownType("Numbr".to_string());
        let with_ctx = err.with_context("Loading process 'Add'");
        assert!(with_ctx.to_string().contains("Loading process 'Add'"));
        assert!(with_ctx.to_string().contains("Numbr"));
    }

    #[test]
    fn test_context_on_foreign_errors() {
        let io: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let err = io.context("Reading flows.json").unwrap_err();
        assert_eq!(err.to_string(), "Reading flows.json: IO error: gone");
        match err {
            EditorError::WithContext { source, .. } => {
                assert!(matches!(*source, EditorError::Io(_)))
            }
            other => panic!("expected context, got {:?}", other),
        }

        let json = serde_json::from_str::<u32>("x").with_context(|| "Parsing".to_string());
        assert!(matches!(
            json.unwrap_err(),
            EditorError::WithContext { source, .. } if matches!(*source, EditorError::Serialization(_))
        ));
    }

    #[test]
    fn test_invalid_processes_lists_names() {
        let err = EditorError::InvalidProcesses(vec!["Main".to_string(), "Helper".to_string()]);
        assert_eq!(
            err.to_string(),
            "Cannot save while processes are invalid: Main, Helper"
        );
    }

    #[test]
    fn test_user_input_classification() {
        let err = EditorError::InvalidFixedValue {
            type_name: "Number".to_string(),
            value: "abc".to_string(),
        };
        assert!(err.is_user_input());
        assert!(err.with_context("editing").is_user_input());
        assert!(!EditorError::Config("x".to_string()).is_user_input());
    }
}
