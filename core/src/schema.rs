//! Serializable snapshot of a command tree.
//!
//! [`AppSchema`] mirrors the shape of an [`App`]: its flags and, recursively,
//! every command with its own flags. Useful for documentation generators and
//! for asserting on tree structure in tests.

use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::command::Command;
use crate::flag::Flag;
use crate::value::FlagKind;

/// Schema for one flag.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{FlagKind, FlagSchema, TypedFlag};
///
/// let schema = FlagSchema::from_flag(&TypedFlag::new("port", 8080u64).with_aliases(["p"]));
/// assert_eq!(schema.canonical_name(), "port");
/// assert_eq!(schema.kind, Some(FlagKind::Uint64));
/// assert_eq!(schema.default.as_deref(), Some("8080"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSchema {
    /// Canonical name first, then aliases.
    pub names: Vec<String>,
    pub description: String,
    pub required: bool,
    /// Parse kind; absent for malformed definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FlagKind>,
    /// Default value rendered as text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FlagSchema {
    pub fn from_flag(flag: &dyn Flag) -> Self {
        Self {
            names: flag.names(),
            description: flag.description().to_string(),
            required: flag.is_required(),
            kind: flag.kind(),
            default: flag.default_value().map(|v| v.to_string()),
        }
    }

    /// First declared name, or `"unknown"` for a nameless flag.
    pub fn canonical_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("unknown")
    }
}

/// Schema for a command and its subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub flags: Vec<FlagSchema>,
    #[serde(default)]
    pub subcommands: Vec<CommandSchema>,
}

impl CommandSchema {
    /// Builds the schema in display order: flags and children sorted.
    pub fn from_command(command: &Command) -> Self {
        Self {
            name: command.name().to_string(),
            aliases: command.aliases().to_vec(),
            description: command.description().to_string(),
            flags: command
                .flags()
                .sorted()
                .into_iter()
                .map(FlagSchema::from_flag)
                .collect(),
            subcommands: command
                .sorted_commands()
                .into_iter()
                .map(Self::from_command)
                .collect(),
        }
    }

    /// Finds a direct subcommand by name or alias.
    pub fn find_subcommand(&self, name: &str) -> Option<&CommandSchema> {
        self.subcommands
            .iter()
            .find(|s| s.name == name || s.aliases.iter().any(|a| a == name))
    }
}

/// Schema for a whole application.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{App, Command, TypedFlag};
///
/// let app = App::new("git")
///     .with_version("2.0.0")
///     .with_command(
///         Command::new("commit")
///             .with_flag(TypedFlag::new("message", "").with_aliases(["m"]).required()),
///     );
///
/// let schema = app.schema();
/// assert_eq!(schema.name, "git");
/// assert_eq!(schema.subcommand_names(), vec!["commit"]);
/// let commit = schema.find_command("commit").unwrap();
/// assert!(commit.flags[0].required);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSchema {
    pub name: String,
    pub version: String,
    pub description: String,
    pub flags: Vec<FlagSchema>,
    pub commands: Vec<CommandSchema>,
}

impl AppSchema {
    pub fn from_app(app: &App) -> Self {
        let root = CommandSchema::from_command(app.root());
        Self {
            name: root.name,
            version: app.version().to_string(),
            description: root.description,
            flags: root.flags,
            commands: root.subcommands,
        }
    }

    /// Top-level command names in display order.
    pub fn subcommand_names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name.as_str()).collect()
    }

    /// Finds a top-level command by name or alias.
    pub fn find_command(&self, name: &str) -> Option<&CommandSchema> {
        self.commands
            .iter()
            .find(|c| c.name == name || c.aliases.iter().any(|a| a == name))
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::flag::TypedFlag;

    fn app() -> App {
        App::new("prog")
            .with_version("v1.0.0")
            .with_description("Sample")
            .with_flag(TypedFlag::new("verbose", false))
            .with_command(
                Command::new("init")
                    .with_alias("i")
                    .with_command(Command::new("project").with_flag(
                        TypedFlag::new("timeout", Duration::from_secs(5)).with_description("Wait"),
                    )),
            )
            .with_command(Command::new("build"))
    }

    #[test]
    fn test_schema_mirrors_tree_in_sorted_order() {
        let schema = app().schema();
        assert_eq!(schema.subcommand_names(), vec!["build", "init"]);
        assert_eq!(schema.flags[0].canonical_name(), "verbose");

        let project = schema
            .find_command("i")
            .and_then(|c| c.find_subcommand("project"))
            .unwrap();
        assert_eq!(project.flags[0].kind, Some(FlagKind::Duration));
        assert_eq!(project.flags[0].default.as_deref(), Some("5s"));
        assert_eq!(project.flags[0].description, "Wait");
    }

    #[test]
    fn test_json_roundtrip() {
        let schema = app().schema();
        let json = schema.to_json_pretty().unwrap();
        assert!(json.contains("\"kind\": \"duration\""));

        let parsed: AppSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schema);
    }

    #[test]
    fn test_malformed_flag_has_no_kind() {
        let schema = FlagSchema::from_flag(&TypedFlag::without_value("broken"));
        assert_eq!(schema.kind, None);
        assert_eq!(schema.default, None);

        let json = serde_json::to_value(&schema).unwrap();
        assert!(json.get("kind").is_none());
    }
}
