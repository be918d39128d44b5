//! The context chain: one [`Context`] per dispatch level.
//!
//! A context owns its level's parsed flags and positional arguments. The
//! application metadata, output sinks, and cancellation token live in a
//! single [`RunState`] that every context in the chain borrows, so none of
//! them is copied or re-created per level.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::scope::FlagScope;
use crate::sink::Sink;
use crate::value::FlagValue;

/// Application metadata shared by the whole tree.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Names from the root application down to one command.
///
/// # Examples
///
/// ```
/// use cmdtree_core::CommandPath;
///
/// let path = CommandPath::root("prog").child("init").child("project");
/// assert_eq!(path.to_string(), "prog init project");
/// assert_eq!(path.leaf(), "project");
/// assert_eq!(path.depth(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPath {
    segments: Vec<String>,
}

impl CommandPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Name of the innermost command.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Number of commands below the root.
    pub fn depth(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .segments
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&joined)
    }
}

/// State shared, read-only, by every context of one run.
#[derive(Debug)]
pub(crate) struct RunState {
    pub(crate) app_name: String,
    pub(crate) app_version: String,
    pub(crate) metadata: Metadata,
    pub(crate) writer: Sink,
    pub(crate) err_writer: Sink,
    pub(crate) cancellation: CancellationToken,
}

/// Per-level view handed to hooks and actions.
pub struct Context<'a> {
    state: &'a RunState,
    parent: Option<&'a Context<'a>>,
    scope: FlagScope,
    path: CommandPath,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        state: &'a RunState,
        parent: Option<&'a Context<'a>>,
        scope: FlagScope,
        path: CommandPath,
    ) -> Self {
        Self {
            state,
            parent,
            scope,
            path,
        }
    }

    /// Value of a flag defined at this level, by any of its names.
    ///
    /// Ancestor levels are not consulted; use [`lineage`](Self::lineage) to
    /// inspect them explicitly.
    pub fn value(&self, name: &str) -> Option<&FlagValue> {
        self.scope.lookup(name)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(FlagValue::as_bool)
    }

    pub fn duration(&self, name: &str) -> Option<Duration> {
        self.value(name).and_then(FlagValue::as_duration)
    }

    pub fn float64(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(FlagValue::as_f64)
    }

    pub fn int(&self, name: &str) -> Option<isize> {
        self.value(name).and_then(FlagValue::as_int)
    }

    pub fn int64(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(FlagValue::as_i64)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(FlagValue::as_str)
    }

    pub fn uint(&self, name: &str) -> Option<usize> {
        self.value(name).and_then(FlagValue::as_uint)
    }

    pub fn uint64(&self, name: &str) -> Option<u64> {
        self.value(name).and_then(FlagValue::as_u64)
    }

    /// Whether the flag was given explicitly at this level.
    pub fn is_set(&self, name: &str) -> bool {
        self.scope.is_set(name)
    }

    /// Number of flags explicitly set at this level.
    pub fn num_flags(&self) -> usize {
        self.scope.num_set()
    }

    /// Positional arguments left after this level's flags.
    pub fn args(&self) -> Args<'_> {
        Args::new(self.scope.args())
    }

    pub fn narg(&self) -> usize {
        self.args().len()
    }

    /// The enclosing level's context; `None` at the root.
    pub fn parent(&self) -> Option<&'a Context<'a>> {
        self.parent
    }

    /// This context followed by each ancestor up to the root.
    ///
    /// Useful for checking whether an option was supplied higher up the tree.
    pub fn lineage(&self) -> impl Iterator<Item = &Context<'a>> {
        std::iter::successors(Some(self), |ctx| ctx.parent)
    }

    pub fn command_path(&self) -> &CommandPath {
        &self.path
    }

    pub fn app_name(&self) -> &str {
        &self.state.app_name
    }

    pub fn app_version(&self) -> &str {
        &self.state.app_version
    }

    pub fn metadata(&self) -> &Metadata {
        &self.state.metadata
    }

    /// The run-wide cancellation token; the same token at every level.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.state.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancellation.is_cancelled()
    }

    pub fn writer(&self) -> Sink {
        self.state.writer.clone()
    }

    pub fn err_writer(&self) -> Sink {
        self.state.err_writer.clone()
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.path.to_string())
            .field("scope", &self.scope)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Positional arguments of one level.
///
/// Cheap to copy; every call starts from the beginning of the sequence.
///
/// # Examples
///
/// ```
/// use cmdtree_core::Args;
///
/// let raw = vec!["build".to_string(), "web".to_string()];
/// let args = Args::new(&raw);
/// assert!(args.present());
/// assert_eq!(args.first(), Some("build"));
/// assert_eq!(args.tail().slice(), ["web"]);
/// assert_eq!(args.get(5), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Args<'a> {
    items: &'a [String],
}

impl<'a> Args<'a> {
    pub fn new(items: &'a [String]) -> Self {
        Self { items }
    }

    pub fn get(&self, n: usize) -> Option<&'a str> {
        self.items.get(n).map(String::as_str)
    }

    pub fn first(&self) -> Option<&'a str> {
        self.get(0)
    }

    /// Everything after the first argument.
    pub fn tail(&self) -> Args<'a> {
        Args::new(self.items.get(1..).unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether there is at least one argument.
    pub fn present(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn slice(&self) -> &'a [String] {
        self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> {
        self.items.iter().map(String::as_str)
    }
}
