//! cctop CLI - real-time file-activity monitor
//!
//! Usage: cctop <command> [arguments]

use cctop::{cli, config::{CollectorConfig, ViewerConfig}, daemon, logging, marker, platform, viewer};
use cli::Command;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        cli::print_usage();
        return ExitCode::SUCCESS;
    }

    if args.len() >= 2 && (args[1] == "--version" || args[1] == "-V") {
        println!("{}", cctop::version::version());
        return ExitCode::SUCCESS;
    }

    if args.len() < 2 {
        cli::print_usage();
        return ExitCode::from(1);
    }

    match cli::parse_args() {
        Ok(Command::DaemonStart { config_path }) => run_daemon_start(config_path),
        Ok(Command::DaemonStop { config_path }) => run_daemon_stop(config_path),
        Ok(Command::DaemonStatus { config_path }) => run_daemon_status(config_path),
        Ok(Command::View { config_path }) => run_view(config_path),
        Err(e) => {
            eprintln!("Error: {}", e);
            cli::print_usage();
            ExitCode::from(1)
        }
    }
}

fn run_daemon_start(config_path: Option<std::path::PathBuf>) -> ExitCode {
    platform::check_platform_support();
    if !platform::watch_mode_supported() {
        eprintln!("Error: watch mode is not supported on this platform");
        return ExitCode::from(1);
    }

    let config = CollectorConfig::load(config_path.as_deref());

    let _logging_guard = match logging::init_file_logging(&config.log_file, config.log_level) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Error: failed to initialize logging: {}", err);
            None
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    #[cfg(unix)]
    {
        use signal_hook::consts::signal;
        use signal_hook::iterator::Signals;

        let signals = Signals::new([signal::SIGTERM, signal::SIGINT]);
        match signals {
            Ok(mut signals) => {
                std::thread::spawn(move || {
                    for _ in &mut signals {
                        shutdown_clone.store(true, Ordering::SeqCst);
                        break;
                    }
                });
            }
            Err(err) => {
                eprintln!("Error: failed to register signal handlers: {}", err);
                return ExitCode::from(1);
            }
        }
    }

    let runtime = daemon::CollectorRuntime::new(config);
    if let Err(e) = runtime.run(shutdown) {
        eprintln!("Error: {}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run_daemon_stop(config_path: Option<std::path::PathBuf>) -> ExitCode {
    let config = CollectorConfig::load(config_path.as_deref());

    match marker::ProcessMarker::read(&config.pid_file) {
        Ok(Some(m)) if marker::is_pid_live(m.pid) => {
            #[cfg(unix)]
            {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;
                if let Err(err) = kill(Pid::from_raw(m.pid as i32), Signal::SIGTERM) {
                    eprintln!("Error: failed to signal pid {}: {}", m.pid, err);
                    return ExitCode::from(1);
                }
            }
            println!("Sent shutdown signal to collector (pid {})", m.pid);
            ExitCode::SUCCESS
        }
        Ok(Some(_)) => {
            println!("No running collector found; removing stale marker");
            let _ = marker::ProcessMarker::remove(&config.pid_file);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("No running collector found");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: failed to read process marker: {}", err);
            ExitCode::from(1)
        }
    }
}

fn run_daemon_status(config_path: Option<std::path::PathBuf>) -> ExitCode {
    let config = CollectorConfig::load(config_path.as_deref());

    match marker::ProcessMarker::read(&config.pid_file) {
        Ok(Some(m)) if marker::is_pid_live(m.pid) => {
            println!("running (pid {})", m.pid);
            println!("watching: {:?}", m.watch_paths);
            ExitCode::SUCCESS
        }
        Ok(Some(m)) => {
            println!("not running (stale marker for pid {})", m.pid);
            ExitCode::from(1)
        }
        Ok(None) => {
            println!("not running");
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("Error: failed to read process marker: {}", err);
            ExitCode::from(1)
        }
    }
}

fn run_view(config_path: Option<std::path::PathBuf>) -> ExitCode {
    let config = ViewerConfig::load(config_path.as_deref());
    if let Err(e) = viewer::run_viewer(&config.db_path, config) {
        eprintln!("Error: {}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
