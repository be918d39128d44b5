//! Flag value kinds and type coercion.
//!
//! A flag's default value decides how its command-line text is parsed.
//! [`FlagValue`] is a closed set of the eight supported scalar kinds; every
//! parse goes through [`FlagValue::parse`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The scalar kind of a flag.
///
/// # Examples
///
/// ```
/// use cmdtree_core::FlagKind;
///
/// assert_eq!(FlagKind::Float64.to_string(), "float64");
/// assert!(FlagKind::Bool.is_bool());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    Bool,
    Duration,
    Float64,
    Int,
    Int64,
    String,
    Uint,
    Uint64,
}

impl FlagKind {
    /// Returns the lowercase type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Duration => "duration",
            Self::Float64 => "float64",
            Self::Int => "int",
            Self::Int64 => "int64",
            Self::String => "string",
            Self::Uint => "uint",
            Self::Uint64 => "uint64",
        }
    }

    /// Bool flags never consume a separate argument.
    pub fn is_bool(self) -> bool {
        matches!(self, Self::Bool)
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed flag value: a default, or the result of parsing an argument.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cmdtree_core::{FlagKind, FlagValue};
///
/// let v = FlagValue::parse(FlagKind::Duration, "1h30m").unwrap();
/// assert_eq!(v, FlagValue::Duration(Duration::from_secs(5400)));
///
/// let v = FlagValue::parse(FlagKind::Int64, "0x1f").unwrap();
/// assert_eq!(v, FlagValue::Int64(31));
///
/// assert!(FlagValue::parse(FlagKind::Uint, "-1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    Duration(Duration),
    Float64(f64),
    Int(isize),
    Int64(i64),
    String(String),
    Uint(usize),
    Uint64(u64),
}

impl FlagValue {
    pub fn kind(&self) -> FlagKind {
        match self {
            Self::Bool(_) => FlagKind::Bool,
            Self::Duration(_) => FlagKind::Duration,
            Self::Float64(_) => FlagKind::Float64,
            Self::Int(_) => FlagKind::Int,
            Self::Int64(_) => FlagKind::Int64,
            Self::String(_) => FlagKind::String,
            Self::Uint(_) => FlagKind::Uint,
            Self::Uint64(_) => FlagKind::Uint64,
        }
    }

    /// Coerces command-line text into a value of `kind`.
    ///
    /// The error is a short human-readable reason.
    pub fn parse(kind: FlagKind, raw: &str) -> Result<Self, String> {
        match kind {
            FlagKind::Bool => parse_bool(raw).map(Self::Bool),
            FlagKind::Duration => parse_duration(raw).map(Self::Duration),
            FlagKind::Float64 => raw
                .parse::<f64>()
                .map(Self::Float64)
                .map_err(|e| e.to_string()),
            FlagKind::Int => {
                let v = parse_signed(raw)?;
                isize::try_from(v)
                    .map(Self::Int)
                    .map_err(|_| "value out of range".to_string())
            }
            FlagKind::Int64 => parse_signed(raw)
                .and_then(|v| i64::try_from(v).map_err(|_| "value out of range".to_string()))
                .map(Self::Int64),
            FlagKind::String => Ok(Self::String(raw.to_string())),
            FlagKind::Uint => {
                let v = parse_unsigned(raw)?;
                usize::try_from(v)
                    .map(Self::Uint)
                    .map_err(|_| "value out of range".to_string())
            }
            FlagKind::Uint64 => parse_unsigned(raw)
                .and_then(|v| u64::try_from(v).map_err(|_| "value out of range".to_string()))
                .map(Self::Uint64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<isize> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<usize> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Duration(v) if v.is_zero() => f.write_str("0s"),
            Self::Duration(v) => write!(f, "{}", humantime::format_duration(*v)),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Uint64(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Duration> for FlagValue {
    fn from(v: Duration) -> Self {
        Self::Duration(v)
    }
}

impl From<f64> for FlagValue {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<isize> for FlagValue {
    fn from(v: isize) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for FlagValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<String> for FlagValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FlagValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<usize> for FlagValue {
    fn from(v: usize) -> Self {
        Self::Uint(v)
    }
}

impl From<u64> for FlagValue {
    fn from(v: u64) -> Self {
        Self::Uint64(v)
    }
}

/// An externally-owned cell that receives a flag's value.
///
/// The cell is written with the default when the flag is applied to a scope
/// and again every time the flag is set on the command line.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use cmdtree_core::{Destination, FlagKind};
///
/// let port = Arc::new(Mutex::new(0u64));
/// let dest = Destination::from(port.clone());
/// assert_eq!(dest.kind(), FlagKind::Uint64);
/// ```
#[derive(Debug, Clone)]
pub enum Destination {
    Bool(Arc<Mutex<bool>>),
    Duration(Arc<Mutex<Duration>>),
    Float64(Arc<Mutex<f64>>),
    Int(Arc<Mutex<isize>>),
    Int64(Arc<Mutex<i64>>),
    String(Arc<Mutex<String>>),
    Uint(Arc<Mutex<usize>>),
    Uint64(Arc<Mutex<u64>>),
}

impl Destination {
    pub fn kind(&self) -> FlagKind {
        match self {
            Self::Bool(_) => FlagKind::Bool,
            Self::Duration(_) => FlagKind::Duration,
            Self::Float64(_) => FlagKind::Float64,
            Self::Int(_) => FlagKind::Int,
            Self::Int64(_) => FlagKind::Int64,
            Self::String(_) => FlagKind::String,
            Self::Uint(_) => FlagKind::Uint,
            Self::Uint64(_) => FlagKind::Uint64,
        }
    }

    /// Writes `value` into the cell. Kinds are checked at apply time, so a
    /// mismatched value here is ignored.
    pub(crate) fn store(&self, value: &FlagValue) {
        fn put<T: Clone>(cell: &Mutex<T>, v: &T) {
            *cell.lock().unwrap_or_else(PoisonError::into_inner) = v.clone();
        }

        match (self, value) {
            (Self::Bool(c), FlagValue::Bool(v)) => put(c, v),
            (Self::Duration(c), FlagValue::Duration(v)) => put(c, v),
            (Self::Float64(c), FlagValue::Float64(v)) => put(c, v),
            (Self::Int(c), FlagValue::Int(v)) => put(c, v),
            (Self::Int64(c), FlagValue::Int64(v)) => put(c, v),
            (Self::String(c), FlagValue::String(v)) => put(c, v),
            (Self::Uint(c), FlagValue::Uint(v)) => put(c, v),
            (Self::Uint64(c), FlagValue::Uint64(v)) => put(c, v),
            _ => {}
        }
    }
}

macro_rules! destination_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Arc<Mutex<$ty>>> for Destination {
                fn from(cell: Arc<Mutex<$ty>>) -> Self {
                    Self::$variant(cell)
                }
            }
        )*
    };
}

destination_from! {
    bool => Bool,
    Duration => Duration,
    f64 => Float64,
    isize => Int,
    i64 => Int64,
    String => String,
    usize => Uint,
    u64 => Uint64,
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err("invalid boolean".to_string()),
    }
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(trimmed).map_err(|e| e.to_string())
}

/// Splits an optional radix prefix off `digits` (`0x`, `0o`, `0b`).
fn split_radix(digits: &str) -> (u32, &str) {
    let lower = digits.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (16, &digits[2..]),
        Some("0o") => (8, &digits[2..]),
        Some("0b") => (2, &digits[2..]),
        _ => (10, digits),
    }
}

fn parse_magnitude(digits: &str) -> Result<u128, String> {
    let (radix, body) = split_radix(digits);
    let cleaned: String = body.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err("invalid syntax".to_string());
    }
    u128::from_str_radix(&cleaned, radix).map_err(|e| e.to_string())
}

fn parse_signed(raw: &str) -> Result<i128, String> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let magnitude =
        i128::try_from(parse_magnitude(digits)?).map_err(|_| "value out of range".to_string())?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn parse_unsigned(raw: &str) -> Result<u128, String> {
    if raw.starts_with('-') {
        return Err("invalid syntax".to_string());
    }
    parse_magnitude(raw.strip_prefix('+').unwrap_or(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_spellings() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(FlagValue::parse(FlagKind::Bool, raw), Ok(FlagValue::Bool(true)));
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(FlagValue::parse(FlagKind::Bool, raw), Ok(FlagValue::Bool(false)));
        }
        assert!(FlagValue::parse(FlagKind::Bool, "yes").is_err());
    }

    #[test]
    fn test_parse_integers() {
        assert_eq!(FlagValue::parse(FlagKind::Int, "-42"), Ok(FlagValue::Int(-42)));
        assert_eq!(FlagValue::parse(FlagKind::Int64, "1_000"), Ok(FlagValue::Int64(1000)));
        assert_eq!(FlagValue::parse(FlagKind::Int64, "0b101"), Ok(FlagValue::Int64(5)));
        assert_eq!(FlagValue::parse(FlagKind::Uint64, "0o17"), Ok(FlagValue::Uint64(15)));
        assert_eq!(FlagValue::parse(FlagKind::Uint, "+7"), Ok(FlagValue::Uint(7)));
        assert!(FlagValue::parse(FlagKind::Uint64, "-3").is_err());
        assert!(FlagValue::parse(FlagKind::Int64, "12abc").is_err());
        assert!(FlagValue::parse(FlagKind::Int64, "0x").is_err());
        assert!(FlagValue::parse(FlagKind::Int64, "99999999999999999999").is_err());
    }

    #[test]
    fn test_parse_float_and_string() {
        assert_eq!(FlagValue::parse(FlagKind::Float64, "2.5e3"), Ok(FlagValue::Float64(2500.0)));
        assert!(FlagValue::parse(FlagKind::Float64, "two").is_err());
        assert_eq!(
            FlagValue::parse(FlagKind::String, "-not-a-flag"),
            Ok(FlagValue::String("-not-a-flag".to_string()))
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(
            FlagValue::parse(FlagKind::Duration, "300ms"),
            Ok(FlagValue::Duration(Duration::from_millis(300)))
        );
        assert_eq!(
            FlagValue::parse(FlagKind::Duration, "0"),
            Ok(FlagValue::Duration(Duration::ZERO))
        );
        assert!(FlagValue::parse(FlagKind::Duration, "soon").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(FlagValue::Bool(false).to_string(), "false");
        assert_eq!(FlagValue::Duration(Duration::ZERO).to_string(), "0s");
        assert_eq!(FlagValue::Duration(Duration::from_secs(90)).to_string(), "1m 30s");
        assert_eq!(FlagValue::from("nothing").to_string(), "nothing");
    }

    #[test]
    fn test_destination_store_matches_kind() {
        let cell = Arc::new(Mutex::new(String::new()));
        let dest = Destination::from(cell.clone());
        dest.store(&FlagValue::from("hello"));
        assert_eq!(*cell.lock().unwrap(), "hello");

        // Mismatched kinds are ignored.
        dest.store(&FlagValue::Bool(true));
        assert_eq!(*cell.lock().unwrap(), "hello");
    }
}
