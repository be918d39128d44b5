//! The application root: global metadata, output sinks, built-in flags, and
//! the entry point of every dispatch.

use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::command::{Builtins, Command};
use crate::config::AppConfig;
use crate::context::{CommandPath, Context, Metadata, RunState};
use crate::error::{HookResult, Result};
use crate::flag::Flag;
use crate::flags::sort_flags;
use crate::schema::AppSchema;
use crate::sink::Sink;
use crate::usage;
use crate::validate::{ValidationError, validate_command};

/// A command-line application.
///
/// Structurally the root [`Command`] of the tree, plus the state every level
/// shares: version, metadata, output sinks, and the built-in `help`/`version`
/// switches.
///
/// # Examples
///
/// ```
/// use std::io::Write;
/// use cmdtree_core::{App, Command, Sink, TypedFlag};
///
/// let (out, buffer) = Sink::buffer();
/// let app = App::new("greet")
///     .with_writer(out)
///     .with_command(
///         Command::new("hello")
///             .with_flag(TypedFlag::new("name", "world"))
///             .action(|ctx| {
///                 writeln!(ctx.writer(), "hello {}", ctx.string("name").unwrap_or_default())?;
///                 Ok(())
///             }),
///     );
///
/// app.run(["greet", "hello", "-name", "rust"]).unwrap();
/// assert_eq!(buffer.contents(), "hello rust\n");
/// ```
#[derive(Debug, Clone)]
pub struct App {
    root: Command,
    version: String,
    metadata: Metadata,
    writer: Sink,
    err_writer: Sink,
    use_help_flag: bool,
    use_version_flag: bool,
}

impl App {
    /// Creates an application writing to stdout and stderr.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(&AppConfig {
            name: name.into(),
            ..AppConfig::default()
        })
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            root: Command::new(config.name.clone()).with_description(config.description.clone()),
            version: config.version.clone(),
            metadata: config.metadata.clone(),
            writer: Sink::stdout(),
            err_writer: Sink::stderr(),
            use_help_flag: config.use_help_flag,
            use_version_flag: config.use_version_flag,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.root.set_name(name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.root.set_description(description.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_flag(mut self, flag: impl Flag + 'static) -> Self {
        self.root.flags_mut().push(flag);
        self
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.root.commands_mut().push(command);
        self
    }

    pub fn with_writer(mut self, writer: Sink) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_err_writer(mut self, writer: Sink) -> Self {
        self.err_writer = writer;
        self
    }

    /// Enables the built-in `-help`/`-h` switch.
    pub fn with_help_flag(mut self, enabled: bool) -> Self {
        self.use_help_flag = enabled;
        self
    }

    /// Enables the built-in `-version`/`-v` switch.
    pub fn with_version_flag(mut self, enabled: bool) -> Self {
        self.use_version_flag = enabled;
        self
    }

    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Context<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.root = self.root.before(hook);
        self
    }

    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Context<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.root = self.root.after(hook);
        self
    }

    pub fn action<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Context<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.root = self.root.action(hook);
        self
    }

    pub fn name(&self) -> &str {
        self.root.name()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        self.root.description()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The root command: the application's own flags, hooks, and children.
    pub fn root(&self) -> &Command {
        &self.root
    }

    /// Top-level command answering to `name`, if any.
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.root.find_command(name)
    }

    /// Dispatches `args`, whose first element is the program token. An app
    /// without a name takes the token's file name.
    ///
    /// Returns an error only for a malformed flag definition or a failing
    /// `before` hook or action. Missing required flags, unknown flags, and
    /// unmatched commands print usage and return `Ok`.
    pub fn run<I, S>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_with_cancellation(CancellationToken::new(), args)
    }

    /// Like [`run`](Self::run), sharing `cancellation` with every level.
    pub fn run_with_cancellation<I, S>(&self, cancellation: CancellationToken, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let name = self.resolved_name(args.first().map(OsStr::new));
        debug!(app = %name, argc = args.len(), "run");

        let state = RunState {
            app_name: name.clone(),
            app_version: self.version.clone(),
            metadata: self.metadata.clone(),
            writer: self.writer.clone(),
            err_writer: self.err_writer.clone(),
            cancellation,
        };
        let builtins = Builtins::new(self.use_help_flag, self.use_version_flag);

        self.root.run_level(
            &state,
            None,
            CommandPath::root(name),
            &args,
            Some(&builtins),
        )
    }

    /// Writes the full usage tree, built-in flags included.
    pub fn usage(&self, w: &mut dyn Write) {
        let builtins = Builtins::new(self.use_help_flag, self.use_version_flag);
        let mut flags: Vec<&dyn Flag> = self.root.flags().iter().chain(builtins.flags()).collect();
        sort_flags(&mut flags);
        let name = self.resolved_name(std::env::args_os().next().as_deref());
        usage::write_app_usage(w, &self.root, &CommandPath::root(name), &flags);
    }

    pub fn print_version(&self, w: &mut dyn Write) {
        let name = self.resolved_name(std::env::args_os().next().as_deref());
        usage::write_version(w, &name, &self.version);
    }

    /// The configured name, or the file name of `argv0` when none is set.
    fn resolved_name(&self, argv0: Option<&OsStr>) -> String {
        if !self.name().is_empty() {
            return self.name().to_string();
        }
        argv0
            .and_then(|arg| Path::new(arg).file_name())
            .map(|file| file.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Structural problems in the tree, such as duplicate sibling names.
    ///
    /// Dispatch does not require a clean report: duplicates resolve to the
    /// first match in sorted order.
    pub fn validate(&self) -> Vec<ValidationError> {
        validate_command(&self.root, &CommandPath::root(self.name()))
    }

    /// Serializable description of the whole tree.
    pub fn schema(&self) -> AppSchema {
        AppSchema::from_app(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::TypedFlag;

    #[test]
    fn test_defaults() {
        let app = App::new("prog");
        assert_eq!(app.name(), "prog");
        assert_eq!(app.version(), "v0.0.0");
        assert_eq!(app.description(), "A new cli application");
        assert!(app.metadata().is_empty());
    }

    #[test]
    fn test_usage_includes_builtins_sorted() {
        let app = App::new("prog")
            .with_description("A sample application")
            .with_help_flag(true)
            .with_version_flag(true)
            .with_flag(TypedFlag::new("config", "app.yml").with_description("Config file"));

        let mut out = Vec::new();
        app.usage(&mut out);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "A sample application\n\nUsage:\tprog [flags] [args...]\n\
             \t-config\t\tConfig file (app.yml)\n\
             \t-help\th\tPrints application help (false)\n\
             \t-version\tv\tPrints application version (false)\n"
        );
    }

    #[test]
    fn test_print_version() {
        let app = App::new("prog").with_version("v1.4.0");
        let mut out = Vec::new();
        app.print_version(&mut out);
        assert_eq!(String::from_utf8(out).unwrap(), "prog version: v1.4.0\n");
    }

    #[test]
    fn test_empty_name_falls_back_to_program_file_name() {
        let (out, buffer) = Sink::buffer();
        let app = App::from_config(&AppConfig::default())
            .with_writer(out)
            .with_version_flag(true);

        app.run(["/usr/local/bin/tool", "-version"]).unwrap();
        assert_eq!(buffer.contents(), "tool version: v0.0.0\n");

        buffer.clear();
        app.run(["./tool"]).unwrap();
        assert!(
            buffer
                .contents()
                .starts_with("A new cli application\n\nUsage:\ttool [flags] [args...]\n")
        );
    }

    #[test]
    fn test_configured_name_wins_over_program_token() {
        let (out, buffer) = Sink::buffer();
        let app = App::new("prog").with_writer(out).with_version_flag(true);

        app.run(["/usr/bin/other", "-v"]).unwrap();
        assert_eq!(buffer.contents(), "prog version: v0.0.0\n");
    }

    #[test]
    fn test_command_lookup_by_alias() {
        let app = App::new("prog").with_command(Command::new("init").with_alias("i"));
        assert_eq!(app.command("i").map(Command::name), Some("init"));
        assert!(app.command("nope").is_none());
    }
}
