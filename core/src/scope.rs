//! Per-level flag scope: registered flag slots plus the argument parser.
//!
//! A scope is built fresh for every dispatch level. Each flag occupies one
//! slot that all of its names resolve to, so `-f1 x` and `--flag1 x` write
//! the same value.
//!
//! Parsing rules:
//!
//! - arguments are consumed left to right and parsing stops at the first
//!   argument that is not a flag (`build`, `-`), or right after `--`;
//! - `-name` and `--name` are equivalent, `-name=value` supplies an inline
//!   value;
//! - bool flags never consume the following argument, every other kind does
//!   when no inline value is given.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigurationError, ParseError};
use crate::value::{Destination, FlagKind, FlagValue};

#[derive(Debug)]
struct Slot {
    canonical: String,
    value: FlagValue,
    destination: Option<Destination>,
    set: bool,
}

/// Parsed flag state for one dispatch level.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{FlagScope, FlagValue};
///
/// let mut scope = FlagScope::new("deploy");
/// scope
///     .register(&["region".into(), "r".into()], FlagValue::from("eu"), None)
///     .unwrap();
/// scope
///     .register(&["force".into()], FlagValue::Bool(false), None)
///     .unwrap();
///
/// let args: Vec<String> = ["-r", "us", "--force", "web", "-x"]
///     .iter()
///     .map(|s| s.to_string())
///     .collect();
/// scope.parse(&args).unwrap();
///
/// assert_eq!(scope.lookup("region").and_then(|v| v.as_str()), Some("us"));
/// assert_eq!(scope.lookup("force"), Some(&FlagValue::Bool(true)));
/// assert_eq!(scope.args(), ["web", "-x"]);
/// assert_eq!(scope.num_set(), 2);
/// ```
#[derive(Debug)]
pub struct FlagScope {
    name: String,
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
    args: Vec<String>,
}

impl FlagScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
            index: HashMap::new(),
            args: Vec::new(),
        }
    }

    /// Name of the command level this scope belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a flag under every name in `names`; the first is canonical.
    ///
    /// The destination, if any, is initialised with `default`.
    pub fn register(
        &mut self,
        names: &[String],
        default: FlagValue,
        destination: Option<Destination>,
    ) -> Result<(), ConfigurationError> {
        let Some(canonical) = names.first() else {
            return Ok(());
        };
        if let Some(taken) = names.iter().find(|n| self.index.contains_key(n.as_str())) {
            return Err(ConfigurationError::Redefined {
                flag: taken.clone(),
            });
        }

        if let Some(dest) = &destination {
            dest.store(&default);
        }
        let slot = self.slots.len();
        self.slots.push(Slot {
            canonical: canonical.clone(),
            value: default,
            destination,
            set: false,
        });
        for name in names {
            self.index.insert(name.clone(), slot);
        }
        Ok(())
    }

    /// Parses `args`, which must not include the command's own token.
    ///
    /// On error the remaining arguments are left in [`args`](Self::args).
    pub fn parse(&mut self, args: &[String]) -> Result<(), ParseError> {
        let mut rest = args;
        let outcome = loop {
            match self.parse_one(rest) {
                Ok(Some(remaining)) => rest = remaining,
                Ok(None) => break Ok(()),
                Err((err, remaining)) => {
                    rest = remaining;
                    break Err(err);
                }
            }
        };

        // `--` is consumed by parse_one; everything else left over is positional.
        self.args = rest.to_vec();
        if let Some(first) = rest.first() {
            if first == "--" {
                self.args.remove(0);
            }
        }
        debug!(
            scope = %self.name,
            set = self.num_set(),
            positional = self.args.len(),
            ok = outcome.is_ok(),
            "parsed flags"
        );
        outcome
    }

    /// Consumes one flag. `Ok(None)` means parsing is finished.
    #[allow(clippy::type_complexity)]
    fn parse_one<'a>(
        &mut self,
        args: &'a [String],
    ) -> Result<Option<&'a [String]>, (ParseError, &'a [String])> {
        let Some(arg) = args.first() else {
            return Ok(None);
        };
        if arg.len() < 2 || !arg.starts_with('-') {
            return Ok(None);
        }
        let dashes = if arg.starts_with("--") { 2 } else { 1 };
        if arg == "--" {
            // Leave the terminator for `parse` to strip.
            return Ok(None);
        }
        let body = &arg[dashes..];
        if body.is_empty() || body.starts_with('-') || body.starts_with('=') {
            return Err((ParseError::BadSyntax(arg.clone()), &args[1..]));
        }

        let mut rest = &args[1..];
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        let Some(&slot) = self.index.get(name) else {
            let err = if name == "help" || name == "h" {
                ParseError::HelpRequested
            } else {
                ParseError::UnknownFlag(name.to_string())
            };
            return Err((err, rest));
        };

        let kind = self.slots[slot].value.kind();
        let raw = match (inline, kind.is_bool()) {
            (Some(value), _) => value.to_string(),
            (None, true) => "true".to_string(),
            (None, false) => match rest.split_first() {
                Some((value, remaining)) => {
                    rest = remaining;
                    value.clone()
                }
                None => return Err((ParseError::MissingArgument(name.to_string()), rest)),
            },
        };

        match self.store(slot, name, &raw) {
            Ok(()) => Ok(Some(rest)),
            Err(err) => Err((err, rest)),
        }
    }

    fn store(&mut self, slot: usize, name: &str, raw: &str) -> Result<(), ParseError> {
        let entry = &mut self.slots[slot];
        let value = FlagValue::parse(entry.value.kind(), raw).map_err(|reason| {
            ParseError::InvalidValue {
                flag: name.to_string(),
                value: raw.to_string(),
                reason,
            }
        })?;
        if let Some(dest) = &entry.destination {
            dest.store(&value);
        }
        entry.value = value;
        entry.set = true;
        Ok(())
    }

    /// Sets a flag by any of its names, as if it had been given on the
    /// command line.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), ParseError> {
        let slot = *self
            .index
            .get(name)
            .ok_or_else(|| ParseError::UnknownFlag(name.to_string()))?;
        self.store(slot, name, raw)
    }

    /// Current value of a flag, looked up by any of its names.
    pub fn lookup(&self, name: &str) -> Option<&FlagValue> {
        self.index.get(name).map(|&slot| &self.slots[slot].value)
    }

    /// Kind of a registered flag.
    pub fn kind(&self, name: &str) -> Option<FlagKind> {
        self.lookup(name).map(FlagValue::kind)
    }

    /// Whether the flag was explicitly set, under any of its names.
    pub fn is_set(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|&slot| self.slots[slot].set)
    }

    /// Number of flags explicitly set.
    pub fn num_set(&self) -> usize {
        self.slots.iter().filter(|s| s.set).count()
    }

    /// Canonical names of the flags explicitly set, in registration order.
    pub fn set_names(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|s| s.set)
            .map(|s| s.canonical.as_str())
    }

    /// Positional arguments left after flag parsing.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn scope() -> FlagScope {
        let mut scope = FlagScope::new("test");
        scope
            .register(&strings(&["flag1", "f1"]), FlagValue::from("nothing"), None)
            .unwrap();
        scope
            .register(&strings(&["verbose", "v"]), FlagValue::Bool(false), None)
            .unwrap();
        scope
            .register(&strings(&["count"]), FlagValue::Int64(1), None)
            .unwrap();
        scope
    }

    #[test]
    fn test_alias_shares_slot() {
        let mut scope = scope();
        scope.parse(&strings(&["-f1", "hello"])).unwrap();

        assert_eq!(scope.lookup("flag1").and_then(FlagValue::as_str), Some("hello"));
        assert!(scope.is_set("flag1"));
        assert!(scope.is_set("f1"));
        assert_eq!(scope.set_names().collect::<Vec<_>>(), vec!["flag1"]);
    }

    #[test]
    fn test_inline_and_separate_values() {
        let mut scope = scope();
        scope
            .parse(&strings(&["--count=3", "-v=false", "--flag1", "x", "rest"]))
            .unwrap();

        assert_eq!(scope.lookup("count"), Some(&FlagValue::Int64(3)));
        assert_eq!(scope.lookup("verbose"), Some(&FlagValue::Bool(false)));
        assert!(scope.is_set("verbose"));
        assert_eq!(scope.args(), strings(&["rest"]).as_slice());
        assert_eq!(scope.num_set(), 3);
    }

    #[test]
    fn test_stops_at_first_positional() {
        let mut scope = scope();
        scope.parse(&strings(&["-v", "build", "--count", "2"])).unwrap();

        assert_eq!(scope.lookup("count"), Some(&FlagValue::Int64(1)));
        assert_eq!(scope.args(), strings(&["build", "--count", "2"]).as_slice());
    }

    #[test]
    fn test_double_dash_terminates() {
        let mut scope = scope();
        scope.parse(&strings(&["-v", "--", "-count", "2"])).unwrap();
        assert_eq!(scope.args(), strings(&["-count", "2"]).as_slice());

        let mut scope = self::scope();
        scope.parse(&strings(&["-", "x"])).unwrap();
        assert_eq!(scope.args(), strings(&["-", "x"]).as_slice());
    }

    #[test]
    fn test_parse_errors() {
        let mut s = scope();
        assert_eq!(
            s.parse(&strings(&["-nope", "a"])),
            Err(ParseError::UnknownFlag("nope".to_string()))
        );
        assert_eq!(s.args(), strings(&["a"]).as_slice());

        let mut s = scope();
        assert_eq!(
            s.parse(&strings(&["--count"])),
            Err(ParseError::MissingArgument("count".to_string()))
        );

        let mut s = scope();
        assert!(matches!(
            s.parse(&strings(&["--count", "many"])),
            Err(ParseError::InvalidValue { .. })
        ));

        let mut s = scope();
        assert_eq!(
            s.parse(&strings(&["---x"])),
            Err(ParseError::BadSyntax("---x".to_string()))
        );

        let mut s = scope();
        assert_eq!(s.parse(&strings(&["-help"])), Err(ParseError::HelpRequested));
    }

    #[test]
    fn test_redefinition_is_configuration_error() {
        let mut scope = scope();
        let err = scope
            .register(&strings(&["other", "v"]), FlagValue::Bool(true), None)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::Redefined {
                flag: "v".to_string()
            }
        );
    }

    #[test]
    fn test_destination_receives_default_and_parsed_value() {
        let cell = Arc::new(Mutex::new(Duration::from_secs(99)));
        let mut scope = FlagScope::new("test");
        scope
            .register(
                &strings(&["timeout"]),
                FlagValue::Duration(Duration::from_secs(5)),
                Some(Destination::from(cell.clone())),
            )
            .unwrap();
        assert_eq!(*cell.lock().unwrap(), Duration::from_secs(5));

        scope.parse(&strings(&["-timeout", "2s"])).unwrap();
        assert_eq!(*cell.lock().unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_set_by_name() {
        let mut scope = scope();
        scope.set("f1", "direct").unwrap();
        assert_eq!(scope.lookup("flag1").and_then(FlagValue::as_str), Some("direct"));
        assert_eq!(scope.num_set(), 1);
        assert!(scope.set("missing", "x").is_err());
    }
}
