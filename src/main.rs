use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cmdflow::command::{parse_line, Params};
use cmdflow::config;
use cmdflow::render::{render_error, render_success};
use cmdflow::{DispatchError, Orchestrator};
use std::io::{self, BufRead};
use std::path::Path;
use std::process::ExitCode;

mod cli;

use cli::{Command, ExecArgs, InitArgs, RootArgs, ShellArgs};

/// Overrides the `-v` derived log filter when set.
const LOG_ENV: &str = "CMDFLOW_LOG";

fn main() -> Result<ExitCode> {
    let RootArgs {
        mut config,
        mut json,
        mut verbose,
        mut command,
    } = RootArgs::parse();
    if let Command::Exec(args) = &mut command {
        let globals = args.take_globals();
        json |= globals.json;
        verbose = verbose.saturating_add(globals.verbose);
        config = globals.config.or(config);
    }
    init_tracing(verbose);

    match command {
        Command::Init(args) => run_init(args),
        Command::Exec(args) => {
            let mut orchestrator = build_orchestrator(config.as_deref())?;
            Ok(run_exec(&mut orchestrator, args, json))
        }
        Command::Shell(args) => {
            let mut orchestrator = build_orchestrator(config.as_deref())?;
            run_shell(&mut orchestrator, args, json)
        }
        Command::Commands => {
            let orchestrator = build_orchestrator(config.as_deref())?;
            for (category, commands) in orchestrator.catalog() {
                println!("{category}: {}", commands.join(", "));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbose >= 2)
        .try_init();
}

fn build_orchestrator(config_path: Option<&Path>) -> Result<Orchestrator> {
    let config = config::load_effective(config_path)?;
    let services = config::build_services(&config).context("wire collaborators")?;
    Ok(Orchestrator::new(services))
}

fn run_init(args: InitArgs) -> Result<ExitCode> {
    let path = args
        .path
        .or_else(config::default_config_path)
        .ok_or_else(|| anyhow!("cannot determine a config directory; pass --path"))?;
    if path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    config::write_config(&path, &config::default_config())?;
    println!("wrote {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn run_exec(orchestrator: &mut Orchestrator, args: ExecArgs, json: bool) -> ExitCode {
    let params = Params::from_tokens(&args.tokens);
    match dispatch_and_print(orchestrator, &args.command, params, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

fn run_shell(orchestrator: &mut Orchestrator, args: ShellArgs, json: bool) -> Result<ExitCode> {
    let stdin = io::stdin();
    let mut failures = 0usize;
    for (index, line) in stdin.lock().lines().enumerate() {
        let line = line.with_context(|| format!("read stdin line {}", index + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let outcome = match parse_line(trimmed) {
            Ok((command, params)) => dispatch_and_print(orchestrator, &command, params, json),
            Err(err) => {
                report_error(&err, json);
                Err(())
            }
        };
        if outcome.is_err() {
            failures += 1;
            if args.fail_fast {
                break;
            }
        }
    }
    if failures > 0 {
        tracing::info!(failures, "shell finished with failures");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Dispatch one command and print its outcome; `Err(())` once reported.
fn dispatch_and_print(
    orchestrator: &mut Orchestrator,
    command: &str,
    params: Params,
    json: bool,
) -> std::result::Result<(), ()> {
    match orchestrator.dispatch_traced(command, params) {
        Ok(trace) => match render_success(&trace, orchestrator.settings(), json) {
            Ok(rendered) => {
                println!("{rendered}");
                Ok(())
            }
            Err(err) => {
                eprintln!("error: {err:#}");
                Err(())
            }
        },
        Err(err) => {
            report_error(&err, json);
            Err(())
        }
    }
}

fn report_error(err: &DispatchError, json: bool) {
    if json {
        println!("{}", render_error(err, true));
    } else {
        eprintln!("{}", render_error(err, false));
    }
}
