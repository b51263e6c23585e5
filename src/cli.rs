//! CLI argument parsing.
//!
//! Defines the Command enum and parse_args() function for all subcommands.
//! Parsing is hand-rolled (no declarative framework): each subcommand walks
//! its own argument slice with a `while i < args.len()` loop, matching flags
//! one at a time.

use anyhow::Result;
use std::path::PathBuf;

pub fn print_usage() {
    eprintln!("cctop - Real-time file-activity monitor");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cctop <command> [arguments]");
    eprintln!("  cctop --help");
    eprintln!("  cctop --version");
    eprintln!();
    eprintln!("  cctop daemon start [--config <FILE>]");
    eprintln!("  cctop daemon stop [--config <FILE>]");
    eprintln!("  cctop daemon status [--config <FILE>]");
    eprintln!("  cctop view [--config <FILE>]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  daemon start   Start the collector daemon in the foreground");
    eprintln!("  daemon stop    Signal a running collector daemon to shut down");
    eprintln!("  daemon status  Report whether a collector daemon is running");
    eprintln!("  view           Open the interactive terminal viewer");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    DaemonStart { config_path: Option<PathBuf> },
    DaemonStop { config_path: Option<PathBuf> },
    DaemonStatus { config_path: Option<PathBuf> },
    View { config_path: Option<PathBuf> },
}

/// Parse CLI arguments into a Command.
///
/// Handles `--help`/`-h` by printing usage and exiting; everything else is
/// delegated to per-subcommand parsers.
pub fn parse_args() -> Result<Command> {
    parse_args_impl(std::env::args().collect())
}

fn parse_args_impl(args: Vec<String>) -> Result<Command> {
    if args.len() < 2 {
        return Err(anyhow::anyhow!("Missing command"));
    }

    let command = &args[1];

    if command == "--help" || command == "-h" {
        print_usage();
        std::process::exit(0);
    }

    if command == "--version" || command == "-V" {
        println!("{}", crate::version::version());
        std::process::exit(0);
    }

    match command.as_str() {
        "daemon" => parse_daemon_args(&args[2..]),
        "view" => parse_view_args(&args[2..]),
        _ => Err(anyhow::anyhow!("Unknown command: {}", command)),
    }
}

fn parse_daemon_args(args: &[String]) -> Result<Command> {
    if args.is_empty() {
        return Err(anyhow::anyhow!("Missing daemon subcommand: expected start, stop, or status"));
    }

    let subcommand = &args[0];
    let rest = &args[1..];

    match subcommand.as_str() {
        "start" => Ok(Command::DaemonStart {
            config_path: parse_config_flag(rest)?,
        }),
        "stop" => Ok(Command::DaemonStop {
            config_path: parse_config_flag(rest)?,
        }),
        "status" => Ok(Command::DaemonStatus {
            config_path: parse_config_flag(rest)?,
        }),
        other => Err(anyhow::anyhow!("Unknown daemon subcommand: {}", other)),
    }
}

fn parse_view_args(args: &[String]) -> Result<Command> {
    Ok(Command::View {
        config_path: parse_config_flag(args)?,
    })
}

/// All current subcommands take only an optional `--config <FILE>` flag.
fn parse_config_flag(args: &[String]) -> Result<Option<PathBuf>> {
    let mut config_path: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => config_path = Some(parse_path_arg(args, &mut i, "--config")?),
            _ => return Err(anyhow::anyhow!("Unknown argument: {}", args[i])),
        }
    }

    Ok(config_path)
}

fn parse_required_arg(args: &[String], i: &mut usize, flag: &str) -> Result<String> {
    if *i + 1 >= args.len() {
        return Err(anyhow::anyhow!("{} requires an argument", flag));
    }
    let value = args[*i + 1].clone();
    *i += 2;
    Ok(value)
}

fn parse_path_arg(args: &[String], i: &mut usize, flag: &str) -> Result<PathBuf> {
    let value = parse_required_arg(args, i, flag)?;
    Ok(PathBuf::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        std::iter::once("cctop".to_string())
            .chain(v.iter().map(|s| s.to_string()))
            .collect()
    }

    #[test]
    fn daemon_start_with_no_flags() {
        let cmd = parse_args_impl(args(&["daemon", "start"])).unwrap();
        assert_eq!(cmd, Command::DaemonStart { config_path: None });
    }

    #[test]
    fn daemon_start_with_config() {
        let cmd = parse_args_impl(args(&["daemon", "start", "--config", "foo.json"])).unwrap();
        assert_eq!(
            cmd,
            Command::DaemonStart {
                config_path: Some(PathBuf::from("foo.json"))
            }
        );
    }

    #[test]
    fn daemon_stop_and_status() {
        assert_eq!(
            parse_args_impl(args(&["daemon", "stop"])).unwrap(),
            Command::DaemonStop { config_path: None }
        );
        assert_eq!(
            parse_args_impl(args(&["daemon", "status"])).unwrap(),
            Command::DaemonStatus { config_path: None }
        );
    }

    #[test]
    fn view_with_config() {
        let cmd = parse_args_impl(args(&["view", "--config", "v.json"])).unwrap();
        assert_eq!(
            cmd,
            Command::View {
                config_path: Some(PathBuf::from("v.json"))
            }
        );
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(parse_args_impl(args(&["bogus"])).is_err());
    }

    #[test]
    fn unknown_daemon_subcommand_is_an_error() {
        assert!(parse_args_impl(args(&["daemon", "restart"])).is_err());
    }

    #[test]
    fn missing_command_is_an_error() {
        assert!(parse_args_impl(vec!["cctop".to_string()]).is_err());
    }

    #[test]
    fn config_flag_missing_value_is_an_error() {
        assert!(parse_args_impl(args(&["view", "--config"])).is_err());
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(parse_args_impl(args(&["view", "--bogus"])).is_err());
    }
}
