//! Structural checks for command trees.
//!
//! Dispatch tolerates duplicate sibling names (the first match in sorted
//! order wins), so these checks are advisory: call [`App::validate`] from a
//! test or at startup to catch shadowed commands and clashing flags.
//!
//! [`App::validate`]: crate::App::validate

use std::collections::HashSet;

use thiserror::Error;

use crate::command::Command;
use crate::context::CommandPath;
use crate::flag::Flag;

/// A structural problem found in a command tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A command has an empty or whitespace-only name.
    #[error("command name cannot be empty (under {0})")]
    EmptyCommandName(String),
    /// Two sibling commands answer to the same name or alias.
    #[error("duplicate command name in {path}: {name}")]
    DuplicateCommand { path: String, name: String },
    /// Two flags at one level claim the same name or alias.
    #[error("duplicate flag name in {path}: {name}")]
    DuplicateFlag { path: String, name: String },
}

/// Validates `command` and every descendant.
///
/// Reports every problem found rather than stopping at the first.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{Command, CommandPath, ValidationError, validate_command};
///
/// let root = Command::new("git")
///     .with_command(Command::new("remote").with_alias("r"))
///     .with_command(Command::new("rebase").with_alias("r"));
///
/// let errors = validate_command(&root, &CommandPath::root("git"));
/// assert_eq!(
///     errors,
///     vec![ValidationError::DuplicateCommand {
///         path: "git".into(),
///         name: "r".into(),
///     }]
/// );
/// ```
pub fn validate_command(command: &Command, path: &CommandPath) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    collect(command, path, &mut errors);
    errors
}

fn collect(command: &Command, path: &CommandPath, errors: &mut Vec<ValidationError>) {
    errors.extend(validate_flags(command.flags().iter(), path));

    let mut seen: HashSet<&str> = HashSet::new();
    for child in command.commands() {
        if child.name().trim().is_empty() {
            errors.push(ValidationError::EmptyCommandName(path.to_string()));
            continue;
        }
        for name in child.names() {
            if !seen.insert(name) {
                errors.push(ValidationError::DuplicateCommand {
                    path: path.to_string(),
                    name: name.to_string(),
                });
            }
        }
        collect(child, &path.child(child.name()), errors);
    }
}

fn validate_flags<'f>(
    flags: impl Iterator<Item = &'f dyn Flag>,
    path: &CommandPath,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for flag in flags {
        for name in flag.names() {
            if !seen.insert(name.clone()) {
                errors.push(ValidationError::DuplicateFlag {
                    path: path.to_string(),
                    name,
                });
            }
        }
    }
    errors
}
