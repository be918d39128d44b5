//! Command nodes and the per-level dispatch algorithm.
//!
//! Every level of a run goes through the same steps: build the flag scope,
//! parse this level's arguments, check required flags, create the level's
//! [`Context`], run `before`, then either descend into the child named by the
//! first positional argument, run the action, or print usage. A configured
//! `after` hook runs on every exit path once the context exists.

use std::fmt;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, debug_span, warn};

use crate::context::{CommandPath, Context, RunState};
use crate::error::{Error, HookResult, HookStage, ParseError, Result};
use crate::flag::{Flag, TypedFlag};
use crate::flags::{Flags, build_scope, check_required_flags, lexicographic_cmp, sort_flags};
use crate::sink::Sink;
use crate::usage;

/// A `before`, `after`, or `action` hook.
pub type HookFn = Arc<dyn Fn(&Context<'_>) -> HookResult + Send + Sync>;

/// A node in the command tree.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{Command, TypedFlag};
///
/// let cmd = Command::new("remote")
///     .with_aliases(["rm"])
///     .with_description("Manage remotes")
///     .with_flag(TypedFlag::new("verbose", false))
///     .with_command(Command::new("add"));
///
/// assert_eq!(cmd.names(), vec!["remote", "rm"]);
/// assert!(cmd.has_name("rm"));
/// assert!(cmd.find_command("add").is_some());
/// ```
#[derive(Clone, Default)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: String,
    flags: Flags,
    commands: Vec<Command>,
    before: Option<HookFn>,
    after: Option<HookFn>,
    action: Option<HookFn>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
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

    pub fn with_flag(mut self, flag: impl Flag + 'static) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Runs before the level dispatches. An error stops the dispatch.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Context<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    /// Runs when the level finishes, including after a failure or panic
    /// below it. Its error is reported but never returned.
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Context<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }

    /// Runs when no child command matches.
    pub fn action<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Context<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub(crate) fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub(crate) fn commands_mut(&mut self) -> &mut Vec<Command> {
        &mut self.commands
    }

    /// Child commands in declaration order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Child commands in display and match order.
    pub fn sorted_commands(&self) -> Vec<&Command> {
        let mut commands: Vec<&Command> = self.commands.iter().collect();
        commands.sort_by(|a, b| lexicographic_cmp(&a.name, &b.name));
        commands
    }

    /// The name followed by every alias.
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .collect()
    }

    /// Whether `name` equals the command's name or one of its aliases.
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// The first child, in sorted order, answering to `name`.
    pub fn find_command(&self, name: &str) -> Option<&Command> {
        self.sorted_commands().into_iter().find(|c| c.has_name(name))
    }

    /// Dispatches one level. `args[0]` is this level's own token.
    pub(crate) fn run_level<'s>(
        &self,
        state: &'s RunState,
        parent: Option<&'s Context<'s>>,
        path: CommandPath,
        args: &[String],
        builtins: Option<&Builtins>,
    ) -> Result<()> {
        let span = debug_span!("dispatch", command = %path);
        let _entered = span.enter();

        let mut flags: Vec<&dyn Flag> = self.flags.iter().collect();
        if let Some(builtins) = builtins {
            flags.extend(builtins.flags());
        }
        sort_flags(&mut flags);

        let mut scope = build_scope(path.leaf(), &flags)?;

        if let Err(err) = scope.parse(args.get(1..).unwrap_or_default()) {
            if err != ParseError::HelpRequested {
                let _ = writeln!(state.err_writer.clone(), "{err}");
            }
            debug!(error = %err, "argument parse failed; showing usage");
            self.write_usage(state, &path, &flags, builtins.is_some());
            return Ok(());
        }

        if let Err(missing) = check_required_flags(&flags, &scope) {
            let _ = writeln!(state.err_writer.clone(), "\n{missing}");
            debug!(missing = ?missing.names(), "required flags missing; showing usage");
            self.write_usage(state, &path, &flags, builtins.is_some());
            return Ok(());
        }

        let ctx = Context::new(state, parent, scope, path);
        let _after = self.after.as_ref().map(|hook| AfterGuard {
            hook,
            ctx: &ctx,
            err_writer: state.err_writer.clone(),
        });

        if let Some(before) = &self.before {
            if let Err(source) = (**before)(&ctx) {
                let _ = writeln!(state.err_writer.clone(), "{source}\n");
                debug!(error = %source, "before hook failed");
                return Err(Error::Hook {
                    stage: HookStage::Before,
                    command: ctx.command_path().to_string(),
                    source,
                });
            }
        }

        if let Some(name) = ctx.args().first() {
            if let Some(child) = self.find_command(name) {
                debug!(child = child.name(), "descending");
                return child.run_level(
                    state,
                    Some(&ctx),
                    ctx.command_path().child(child.name()),
                    ctx.args().slice(),
                    None,
                );
            }
        }

        if let Some(builtins) = builtins {
            if builtins.help_requested(&ctx) {
                self.write_usage(state, ctx.command_path(), &flags, true);
                return Ok(());
            }
            if builtins.version_requested(&ctx) {
                usage::write_version(
                    &mut state.writer.clone(),
                    &state.app_name,
                    &state.app_version,
                );
                return Ok(());
            }
        }

        if let Some(action) = &self.action {
            return (**action)(&ctx).map_err(|source| Error::Hook {
                stage: HookStage::Action,
                command: ctx.command_path().to_string(),
                source,
            });
        }

        debug!("nothing to run; showing usage");
        self.write_usage(state, ctx.command_path(), &flags, builtins.is_some());
        Ok(())
    }

    fn write_usage(&self, state: &RunState, path: &CommandPath, flags: &[&dyn Flag], root: bool) {
        let mut w = state.writer.clone();
        if root {
            usage::write_app_usage(&mut w, self, path, flags);
        } else {
            usage::write_command_usage(&mut w, self, path);
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("description", &self.description)
            .field("flags", &self.flags)
            .field("commands", &self.commands)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// Help and version flags injected at the root level.
#[derive(Debug, Default)]
pub(crate) struct Builtins {
    help: Option<TypedFlag>,
    version: Option<TypedFlag>,
}

impl Builtins {
    pub(crate) fn new(use_help: bool, use_version: bool) -> Self {
        Self {
            help: use_help.then(|| {
                TypedFlag::new("help", false)
                    .with_aliases(["h"])
                    .with_description("Prints application help")
            }),
            version: use_version.then(|| {
                TypedFlag::new("version", false)
                    .with_aliases(["v"])
                    .with_description("Prints application version")
            }),
        }
    }

    pub(crate) fn flags(&self) -> impl Iterator<Item = &dyn Flag> {
        self.help
            .iter()
            .chain(self.version.iter())
            .map(|f| f as &dyn Flag)
    }

    fn help_requested(&self, ctx: &Context<'_>) -> bool {
        self.help.is_some() && ctx.bool("help") == Some(true)
    }

    fn version_requested(&self, ctx: &Context<'_>) -> bool {
        self.version.is_some() && ctx.bool("version") == Some(true)
    }
}

/// Runs a level's `after` hook when the level's scope ends.
struct AfterGuard<'g, 'c> {
    hook: &'g HookFn,
    ctx: &'g Context<'c>,
    err_writer: Sink,
}

impl Drop for AfterGuard<'_, '_> {
    fn drop(&mut self) {
        let outcome = if std::thread::panicking() {
            // A second panic while unwinding would abort the process.
            match panic::catch_unwind(AssertUnwindSafe(|| (**self.hook)(self.ctx))) {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(command = %self.ctx.command_path(), "after hook panicked during unwind");
                    return;
                }
            }
        } else {
            (**self.hook)(self.ctx)
        };

        if let Err(err) = outcome {
            let _ = writeln!(self.err_writer, "{err}\n");
            debug!(command = %self.ctx.command_path(), error = %err, "after hook failed");
        }
    }
}
