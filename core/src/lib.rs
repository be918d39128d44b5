//! Hierarchical command dispatch with typed, per-level flag scopes.
//!
//! An [`App`] is a tree of [`Command`]s. Each level of a run parses only the
//! flags declared at that level, checks the required ones, and then either
//! descends into the child named by the first remaining argument, runs its
//! action, or prints usage. Hooks receive a [`Context`] that exposes the
//! level's parsed values and a link to every ancestor's context.
//!
//! - [`TypedFlag`] declares a flag with a typed default, aliases, and an
//!   optional shared [`Destination`].
//! - [`FlagScope`] is the per-level parser (`-name value`, `--name=value`,
//!   boolean switches, `--` terminator).
//! - [`AppConfig`] loads application identity from YAML.
//! - [`AppSchema`] is a serializable snapshot of the whole tree.
//!
//! # Example
//!
//! ```
//! use std::io::Write;
//! use cmdtree_core::*;
//!
//! let (out, buffer) = Sink::buffer();
//! let app = App::new("deploy")
//!     .with_writer(out)
//!     .with_flag(TypedFlag::new("verbose", false).with_aliases(["V"]))
//!     .with_command(
//!         Command::new("service")
//!             .with_alias("svc")
//!             .with_flag(TypedFlag::new("replicas", 1u64).required())
//!             .action(|ctx| {
//!                 let verbose = ctx.parent().and_then(|p| p.bool("verbose")).unwrap_or(false);
//!                 writeln!(
//!                     ctx.writer(),
//!                     "{} x{} verbose={verbose}",
//!                     ctx.args().first().unwrap_or("-"),
//!                     ctx.uint64("replicas").unwrap_or_default(),
//!                 )?;
//!                 Ok(())
//!             }),
//!     );
//!
//! app.run(["deploy", "-V", "svc", "--replicas=3", "api"]).unwrap();
//! assert_eq!(buffer.contents(), "api x3 verbose=true\n");
//! assert!(app.validate().is_empty());
//! ```

mod app;
mod command;
mod config;
mod context;
mod error;
mod flag;
mod flags;
mod schema;
mod scope;
mod sink;
mod usage;
mod validate;
mod value;

pub use app::App;
pub use command::{Command, HookFn};
pub use config::AppConfig;
pub use context::{Args, CommandPath, Context, Metadata};
pub use error::{
    ConfigurationError, Error, HookError, HookResult, HookStage, MissingRequiredFlags, ParseError,
    Result,
};
pub use flag::{Flag, TypedFlag};
pub use flags::{
    Flags, build_scope, check_required_flags, compare_flags, lexicographic_cmp, sort_flags,
};
pub use schema::{AppSchema, CommandSchema, FlagSchema};
pub use scope::FlagScope;
pub use sink::{Buffer, Sink};
pub use value::{Destination, FlagKind, FlagValue};
pub use validate::{ValidationError, validate_command};
