//! Usage text rendering.
//!
//! Output layout, depth first:
//!
//! ```text
//! <app description>
//!
//! Usage:	prog [flags] [args...]
//! 	-help	h	Prints application help (false)
//!
//! init	Initialise things
//!   Usage:  prog init [flags] [args...]
//! 	-force		Overwrite (false)
//!
//! project
//!   Usage:  prog init project [flags] [args...]
//! ```
//!
//! Rendering never fails; write errors on the sink are ignored.

use std::io::Write;

use crate::command::Command;
use crate::context::CommandPath;
use crate::flag::Flag;

/// Writes the invocation line followed by one line per flag.
pub fn write_invocation(w: &mut dyn Write, path: &CommandPath, flags: &[&dyn Flag]) {
    let _ = writeln!(w, "{path} [flags] [args...]");
    for flag in flags {
        let _ = writeln!(w, "\t-{}", flag.describe());
    }
}

/// Writes root-level usage: description, invocation, then every command.
pub fn write_app_usage(w: &mut dyn Write, root: &Command, path: &CommandPath, flags: &[&dyn Flag]) {
    let _ = writeln!(w, "{}", root.description());
    let _ = write!(w, "\nUsage:\t");
    write_invocation(w, path, flags);
    for child in root.sorted_commands() {
        write_command_usage(w, child, &path.child(child.name()));
    }
}

/// Writes a command's usage, then recurses into its children.
pub fn write_command_usage(w: &mut dyn Write, command: &Command, path: &CommandPath) {
    let _ = writeln!(w, "\n{}\t{}", command.name(), command.description());
    let _ = write!(w, "  Usage:  ");
    write_invocation(w, path, &command.flags().sorted());
    for child in command.sorted_commands() {
        write_command_usage(w, child, &path.child(child.name()));
    }
}

pub fn write_version(w: &mut dyn Write, name: &str, version: &str) {
    let _ = writeln!(w, "{name} version: {version}");
}
