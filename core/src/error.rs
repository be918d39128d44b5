//! Error types for flag definition, argument parsing, and dispatch.
//!
//! Errors fall into two classes. Mistakes made by the application author
//! ([`ConfigurationError`]) and failing `before` hooks surface through
//! [`Error`] and are returned from [`App::run`](crate::App::run). Mistakes made
//! by the end user ([`ParseError`], [`MissingRequiredFlags`]) are reported to
//! the error sink next to the usage text and never fail the run.

use std::fmt;

use thiserror::Error;

use crate::value::FlagKind;

/// Error type returned by hook functions.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Return type of `before`, `after`, and `action` hooks.
pub type HookResult = std::result::Result<(), HookError>;

/// A malformed flag definition, detected while building a flag scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The flag was declared without a default value.
    #[error("flag `{flag}` must have value provided")]
    MissingValue { flag: String },

    /// The flag's default value is not one of the supported kinds.
    #[error("flag `{flag}` has unsupported type: {type_name}")]
    UnsupportedType { flag: String, type_name: String },

    /// The destination cell holds a different kind than the default value.
    #[error("flag `{flag}` destination must be {expected}, got {found}")]
    DestinationMismatch {
        flag: String,
        expected: FlagKind,
        found: FlagKind,
    },

    /// Two flags in the same scope claim the same name.
    #[error("flag redefined: {flag}")]
    Redefined { flag: String },
}

/// Required flags that were not supplied on the command line.
///
/// # Examples
///
/// ```
/// use cmdtree_core::MissingRequiredFlags;
///
/// let one = MissingRequiredFlags::new(vec!["flag1".into()]);
/// assert_eq!(one.to_string(), r#"Required flag "flag1" not set"#);
///
/// let two = MissingRequiredFlags::new(vec!["a".into(), "b".into()]);
/// assert_eq!(two.to_string(), r#"Required flags "a, b" not set"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingRequiredFlags {
    names: Vec<String>,
}

impl MissingRequiredFlags {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Canonical names of the missing flags, in collection order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl fmt::Display for MissingRequiredFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.names.as_slice() {
            write!(f, "Required flag \"{single}\" not set")
        } else {
            write!(f, "Required flags \"{}\" not set", self.names.join(", "))
        }
    }
}

impl std::error::Error for MissingRequiredFlags {}

/// An end-user argument that the flag scope could not consume.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("bad flag syntax: {0}")]
    BadSyntax(String),

    #[error("flag provided but not defined: -{0}")]
    UnknownFlag(String),

    #[error("flag needs an argument: -{0}")]
    MissingArgument(String),

    #[error("invalid value {value:?} for flag -{flag}: {reason}")]
    InvalidValue {
        flag: String,
        value: String,
        reason: String,
    },

    /// `-h` or `-help` was given and no such flag is defined.
    #[error("help requested")]
    HelpRequested,
}

/// Which hook produced a [`Error::Hook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Before,
    Action,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::Action => f.write_str("action"),
        }
    }
}

/// Errors returned to the caller of [`App::run`](crate::App::run) and from
/// configuration loading.
#[derive(Debug, Error)]
pub enum Error {
    /// A flag definition is malformed. Always fatal.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A `before` hook or an action returned an error.
    #[error("{command}: {source}")]
    Hook {
        stage: HookStage,
        command: String,
        #[source]
        source: HookError,
    },

    /// File I/O failure while loading or saving configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Returns the hook error's message source, if this is a hook failure.
    pub fn hook_source(&self) -> Option<&HookError> {
        match self {
            Self::Hook { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
