//! Sample application driven by `cmdtree-core`.
//!
//! ```text
//! cmdtree-demo [-verbose] [-quiet] <command>
//!   init [project [test1 [test2 -flag1 <v>]]]
//!   project -flag1 <v>     echo a required flag
//!   guard [-allow]         fails in its before hook unless -allow is given
//!   about                  print name, version, and metadata
//!   tree                   print the command tree as JSON
//! ```

use std::io::Write;

use cmdtree_core::{App, AppConfig, Command, Context, HookResult, TypedFlag};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

const CONFIG: &str = include_str!("../app.yml");

fn main() {
    let result =
        AppConfig::from_yaml_str(CONFIG).and_then(|config| build_app(&config).run(std::env::args()));

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn build_app(config: &AppConfig) -> App {
    let tree_config = config.clone();

    App::from_config(config)
        .with_flag(TypedFlag::new("verbose", false).with_description("Enable debug logging"))
        .with_flag(
            TypedFlag::new("quiet", false)
                .with_aliases(["q"])
                .with_description("Only log errors"),
        )
        .before(initialize_logging)
        .after(|ctx| {
            debug!(command = %ctx.command_path(), "finished");
            Ok(())
        })
        .with_command(init_command())
        .with_command(
            Command::new("project")
                .with_description("Echo the value of a required flag")
                .with_flag(
                    TypedFlag::new("flag1", "")
                        .with_aliases(["f1"])
                        .with_description("Value to echo")
                        .required(),
                )
                .action(|ctx| {
                    writeln!(ctx.writer(), "{}", ctx.string("flag1").unwrap_or_default())?;
                    Ok(())
                }),
        )
        .with_command(
            Command::new("guard")
                .with_description("Refuse to run unless allowed")
                .with_flag(TypedFlag::new("allow", false).with_description("Let the action run"))
                .before(|ctx| {
                    if ctx.bool("allow") == Some(true) {
                        Ok(())
                    } else {
                        Err("pass -allow to continue".into())
                    }
                })
                .action(|ctx| {
                    writeln!(ctx.writer(), "guard passed")?;
                    Ok(())
                }),
        )
        .with_command(
            Command::new("about")
                .with_description("Print application details")
                .action(print_about),
        )
        .with_command(
            Command::new("tree")
                .with_description("Print the command tree as JSON")
                .action(move |ctx| {
                    let schema = build_app(&tree_config).schema();
                    writeln!(ctx.writer(), "{}", schema.to_json_pretty()?)?;
                    Ok(())
                }),
        )
}

fn init_command() -> Command {
    let test2 = Command::new("test2")
        .with_description("Test 2 description")
        .with_flag(
            TypedFlag::new("flag1", "nothing")
                .with_aliases(["f1"])
                .with_description("Flag 1 used for nothing"),
        )
        .action(|ctx| {
            let mut out = ctx.writer();
            writeln!(out, "flag1 value: {}", ctx.string("flag1").unwrap_or_default())?;
            writeln!(out, "test2 action")?;
            Ok(())
        });

    let test1 = Command::new("test1")
        .with_command(test2)
        .action(|ctx| announce(ctx, "test1 action"));

    let project = Command::new("project")
        .with_command(test1)
        .action(|ctx| announce(ctx, "project action"));

    Command::new("init")
        .with_description("Nested sample commands")
        .with_command(project)
        .action(|ctx| announce(ctx, "init action"))
}

fn announce(ctx: &Context<'_>, line: &str) -> HookResult {
    info!(command = %ctx.command_path(), "action");
    writeln!(ctx.writer(), "{line}")?;
    Ok(())
}

fn print_about(ctx: &Context<'_>) -> HookResult {
    let mut out = ctx.writer();
    writeln!(out, "{} {}", ctx.app_name(), ctx.app_version())?;
    for (key, value) in ctx.metadata() {
        match value.as_str() {
            Some(text) => writeln!(out, "{key}: {text}")?,
            None => writeln!(out, "{key}: {value}")?,
        }
    }
    Ok(())
}

/// Installs the stderr subscriber, level chosen by `-verbose` / `-quiet`.
fn initialize_logging(ctx: &Context<'_>) -> HookResult {
    let level = if ctx.bool("verbose") == Some(true) {
        Level::DEBUG
    } else if ctx.bool("quiet") == Some(true) {
        Level::ERROR
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        debug!(error = %err, "keeping existing subscriber");
    }
    Ok(())
}
