//! The [`Flag`] capability set and its built-in variant, [`TypedFlag`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigurationError;
use crate::scope::FlagScope;
use crate::value::{Destination, FlagKind, FlagValue};

static NAME_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[, ]+.*").expect("static regex must compile"));

/// A named option that can register itself into a [`FlagScope`].
///
/// Implementations hold no scope state: applying the same flag to two
/// scopes yields two independent registrations.
pub trait Flag: Send + Sync + fmt::Debug {
    /// Canonical name first, then aliases.
    fn names(&self) -> Vec<String>;

    fn is_required(&self) -> bool;

    /// One-line human summary including the default value.
    fn describe(&self) -> String;

    /// Registers this flag into `scope`.
    fn apply(&self, scope: &mut FlagScope) -> Result<(), ConfigurationError>;

    /// Parse kind, when the flag has a well-formed default.
    fn kind(&self) -> Option<FlagKind> {
        None
    }

    fn default_value(&self) -> Option<FlagValue> {
        None
    }

    fn description(&self) -> &str {
        ""
    }
}

#[derive(Debug, Clone)]
enum Declared {
    Missing,
    Value(FlagValue),
    Unsupported { type_name: String, repr: String },
}

/// A flag whose default value selects its parse kind.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{Flag, FlagScope, TypedFlag};
///
/// let flag = TypedFlag::new("flag1", "nothing")
///     .with_aliases(["f1"])
///     .with_description("Flag 1 used for nothing")
///     .required();
///
/// assert_eq!(flag.names(), vec!["flag1", "f1"]);
/// assert_eq!(flag.describe(), "flag1\tf1\tFlag 1 used for nothing (nothing)");
///
/// let mut scope = FlagScope::new("test");
/// flag.apply(&mut scope).unwrap();
/// assert!(scope.lookup("f1").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct TypedFlag {
    name: String,
    aliases: Vec<String>,
    description: String,
    required: bool,
    value: Declared,
    destination: Option<Destination>,
}

impl TypedFlag {
    /// Creates a flag whose kind is taken from `value`.
    pub fn new(name: impl Into<String>, value: impl Into<FlagValue>) -> Self {
        Self::with_declared(name.into(), Declared::Value(value.into()))
    }

    /// Creates a flag with no default; applying it fails.
    pub fn without_value(name: impl Into<String>) -> Self {
        Self::with_declared(name.into(), Declared::Missing)
    }

    /// Creates a flag from a loosely typed JSON default.
    ///
    /// Booleans, strings, and numbers map to `bool`, `string`, and
    /// `int64`/`uint64`/`float64`. `null` is a missing value; arrays and
    /// objects are unsupported. Both are reported when the flag is applied,
    /// not here.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdtree_core::{Flag, FlagKind, FlagScope, TypedFlag};
    ///
    /// let port = TypedFlag::from_json("port", &serde_json::json!(8080));
    /// assert_eq!(port.kind(), Some(FlagKind::Int64));
    ///
    /// let tags = TypedFlag::from_json("tags", &serde_json::json!(["a"]));
    /// assert!(tags.apply(&mut FlagScope::new("test")).is_err());
    /// ```
    pub fn from_json(name: impl Into<String>, value: &serde_json::Value) -> Self {
        use serde_json::Value;

        let declared = match value {
            Value::Null => Declared::Missing,
            Value::Bool(b) => Declared::Value(FlagValue::Bool(*b)),
            Value::String(s) => Declared::Value(FlagValue::String(s.clone())),
            Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => Declared::Value(FlagValue::Int64(i)),
                (None, Some(u), _) => Declared::Value(FlagValue::Uint64(u)),
                (None, None, Some(f)) => Declared::Value(FlagValue::Float64(f)),
                (None, None, None) => Declared::Unsupported {
                    type_name: "number".to_string(),
                    repr: n.to_string(),
                },
            },
            Value::Array(_) => Declared::Unsupported {
                type_name: "array".to_string(),
                repr: value.to_string(),
            },
            Value::Object(_) => Declared::Unsupported {
                type_name: "object".to_string(),
                repr: value.to_string(),
            },
        };
        Self::with_declared(name.into(), declared)
    }

    fn with_declared(name: String, value: Declared) -> Self {
        Self {
            name,
            aliases: Vec::new(),
            description: String::new(),
            required: false,
            value,
            destination: None,
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the flag as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Binds an externally-owned cell that receives the flag's value.
    pub fn with_destination(mut self, destination: impl Into<Destination>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Flag for TypedFlag {
    fn names(&self) -> Vec<String> {
        std::iter::once(&self.name)
            .chain(&self.aliases)
            .map(|part| NAME_TAIL.replace_all(part, "").into_owned())
            .collect()
    }

    fn is_required(&self) -> bool {
        self.required
    }

    fn describe(&self) -> String {
        let default = match &self.value {
            Declared::Value(v) => v.to_string(),
            Declared::Missing => "<nil>".to_string(),
            Declared::Unsupported { repr, .. } => repr.clone(),
        };
        format!(
            "{}\t{}\t{} ({})",
            self.name,
            self.aliases.join(","),
            self.description,
            default
        )
    }

    fn apply(&self, scope: &mut FlagScope) -> Result<(), ConfigurationError> {
        let default = match &self.value {
            Declared::Value(v) => v.clone(),
            Declared::Missing => {
                return Err(ConfigurationError::MissingValue {
                    flag: self.name.clone(),
                });
            }
            Declared::Unsupported { type_name, .. } => {
                return Err(ConfigurationError::UnsupportedType {
                    flag: self.name.clone(),
                    type_name: type_name.clone(),
                });
            }
        };

        if let Some(dest) = &self.destination {
            if dest.kind() != default.kind() {
                return Err(ConfigurationError::DestinationMismatch {
                    flag: self.name.clone(),
                    expected: default.kind(),
                    found: dest.kind(),
                });
            }
        }

        scope.register(&self.names(), default, self.destination.clone())
    }

    fn kind(&self) -> Option<FlagKind> {
        match &self.value {
            Declared::Value(v) => Some(v.kind()),
            _ => None,
        }
    }

    fn default_value(&self) -> Option<FlagValue> {
        match &self.value {
            Declared::Value(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_names_strip_trailing_parts() {
        let flag = TypedFlag::new("flag1, f", "x").with_aliases(["f1 legacy", "one"]);
        assert_eq!(flag.names(), vec!["flag1", "f1", "one"]);
    }

    #[test]
    fn test_describe_formats_defaults() {
        let flag = TypedFlag::new("timeout", Duration::from_secs(30))
            .with_aliases(["t", "wait"])
            .with_description("How long to wait");
        assert_eq!(flag.describe(), "timeout\tt,wait\tHow long to wait (30s)");

        let flag = TypedFlag::without_value("broken");
        assert_eq!(flag.describe(), "broken\t\t (<nil>)");
    }

    #[test]
    fn test_apply_without_value_fails() {
        let flag = TypedFlag::without_value("flag1");
        let err = flag.apply(&mut FlagScope::new("test")).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingValue {
                flag: "flag1".to_string()
            }
        );
    }

    #[test]
    fn test_apply_unsupported_type_fails() {
        let flag = TypedFlag::from_json("labels", &serde_json::json!({"a": 1}));
        let err = flag.apply(&mut FlagScope::new("test")).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnsupportedType {
                flag: "labels".to_string(),
                type_name: "object".to_string()
            }
        );
    }

    #[test]
    fn test_destination_kind_mismatch() {
        let cell = Arc::new(Mutex::new(0i64));
        let flag = TypedFlag::new("name", "x").with_destination(cell);
        let err = flag.apply(&mut FlagScope::new("test")).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DestinationMismatch {
                flag: "name".to_string(),
                expected: FlagKind::String,
                found: FlagKind::Int64,
            }
        );
    }

    #[test]
    fn test_apply_to_two_scopes_is_independent() {
        let flag = TypedFlag::new("count", 1i64).with_aliases(["c"]);
        let mut first = FlagScope::new("a");
        let mut second = FlagScope::new("b");
        flag.apply(&mut first).unwrap();
        flag.apply(&mut second).unwrap();

        first.parse(&["-c".to_string(), "5".to_string()]).unwrap();
        assert_eq!(first.lookup("count"), Some(&FlagValue::Int64(5)));
        assert_eq!(second.lookup("count"), Some(&FlagValue::Int64(1)));
    }

    #[test]
    fn test_from_json_kinds() {
        let cases = [
            (serde_json::json!(true), Some(FlagKind::Bool)),
            (serde_json::json!("x"), Some(FlagKind::String)),
            (serde_json::json!(-3), Some(FlagKind::Int64)),
            (serde_json::json!(u64::MAX), Some(FlagKind::Uint64)),
            (serde_json::json!(0.5), Some(FlagKind::Float64)),
            (serde_json::Value::Null, None),
        ];
        for (json, kind) in cases {
            assert_eq!(TypedFlag::from_json("f", &json).kind(), kind, "{json}");
        }
    }

    fn any_value() -> impl Strategy<Value = FlagValue> {
        prop_oneof![
            any::<bool>().prop_map(FlagValue::Bool),
            (any::<u32>(), 0u32..1_000_000_000)
                .prop_map(|(secs, nanos)| FlagValue::Duration(Duration::new(u64::from(secs), nanos))),
            any::<f64>()
                .prop_filter("finite", |v| v.is_finite())
                .prop_map(FlagValue::Float64),
            any::<isize>().prop_map(FlagValue::Int),
            any::<i64>().prop_map(FlagValue::Int64),
            "\\PC*".prop_map(FlagValue::String),
            any::<usize>().prop_map(FlagValue::Uint),
            any::<u64>().prop_map(FlagValue::Uint64),
        ]
    }

    /// Applies a flag of `value`'s kind to a fresh scope, sets it from the
    /// value's text, and reads it back.
    fn reparse(value: &FlagValue) -> (Option<FlagValue>, bool) {
        let default = FlagValue::parse(value.kind(), "0").unwrap();
        let flag = TypedFlag::new("value", default).with_aliases(["x"]);
        let mut scope = FlagScope::new("test");
        flag.apply(&mut scope).unwrap();
        scope.parse(&[format!("-x={value}")]).unwrap();
        (scope.lookup("value").cloned(), scope.is_set("value"))
    }

    #[test]
    fn test_round_trip_extremes() {
        let values = [
            FlagValue::Bool(true),
            FlagValue::Duration(Duration::new(3600, 1_500)),
            FlagValue::Duration(Duration::from_nanos(1)),
            FlagValue::Float64(-0.1),
            FlagValue::Float64(f64::MAX),
            FlagValue::Int(isize::MIN),
            FlagValue::Int64(i64::MIN),
            FlagValue::String("h\u{e9}llo world=1".to_string()),
            FlagValue::Uint(usize::MAX),
            FlagValue::Uint64(u64::MAX),
        ];
        for value in values {
            assert_eq!(reparse(&value), (Some(value.clone()), true), "{value}");
        }
    }

    proptest! {
        #[test]
        fn prop_display_text_parses_back_for_every_kind(value in any_value()) {
            let (parsed, set) = reparse(&value);
            prop_assert!(set);
            prop_assert_eq!(parsed, Some(value));
        }
    }
}
