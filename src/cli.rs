//! CLI argument parsing for the command engine.
//!
//! The CLI stays thin: it loads config, builds one orchestrator, and feeds it
//! commands. All routing and validation lives in the library.
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cmdflow",
    version,
    about = "Route category:action commands through a five-phase workflow pipeline",
    after_help = "Commands:\n  exec <category:action> [--flag value]... [token]...  Dispatch one command\n  shell                                             Dispatch commands read from stdin, one per line\n  commands                                          List registered commands\n  init                                              Write a default config file\n\nExamples:\n  cmdflow exec message:new --message hi --to discussion-moderator\n  cmdflow exec output:verbosity high\n  cmdflow exec meta:status --save /tmp/status.json\n  printf 'meta:context --add note\\nmeta:context --list\\n' | cmdflow shell",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Config file (default: $CMDFLOW_CONFIG, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Render results as JSON regardless of the session format
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Exec(ExecArgs),
    Shell(ShellArgs),
    Commands,
    Init(InitArgs),
}

/// One command and its tokens.
#[derive(Parser, Debug)]
#[command(about = "Dispatch a single category:action command")]
pub struct ExecArgs {
    /// Command in category:action form
    #[arg(value_name = "COMMAND")]
    pub command: String,

    /// Flags (--name value, --name=value, --name) and positional tokens
    #[arg(
        value_name = "TOKENS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub tokens: Vec<String>,
}

/// Global flags typed after the command. clap hands them over as tokens.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TrailingGlobals {
    pub json: bool,
    pub verbose: u8,
    pub config: Option<PathBuf>,
}

impl ExecArgs {
    /// Move `--json`, `-v`/`--verbose`, and `--config` out of the tokens.
    /// Tokens after `--` are left alone.
    pub fn take_globals(&mut self) -> TrailingGlobals {
        let mut globals = TrailingGlobals::default();
        let mut kept = Vec::with_capacity(self.tokens.len());
        let mut tokens = std::mem::take(&mut self.tokens).into_iter();
        while let Some(token) = tokens.next() {
            match token.as_str() {
                "--" => {
                    kept.push(token);
                    kept.extend(tokens.by_ref());
                }
                "--json" => globals.json = true,
                "--verbose" => globals.verbose = globals.verbose.saturating_add(1),
                "--config" => match tokens.next() {
                    Some(path) => globals.config = Some(PathBuf::from(path)),
                    None => kept.push(token),
                },
                other => {
                    if let Some(path) = other.strip_prefix("--config=") {
                        globals.config = Some(PathBuf::from(path));
                    } else if let Some(count) = verbose_cluster(other) {
                        globals.verbose = globals.verbose.saturating_add(count);
                    } else {
                        kept.push(token);
                    }
                }
            }
        }
        self.tokens = kept;
        globals
    }
}

/// `-v`, `-vv`, ... as a count.
fn verbose_cluster(token: &str) -> Option<u8> {
    let letters = token.strip_prefix('-')?;
    if letters.is_empty() || !letters.chars().all(|letter| letter == 'v') {
        return None;
    }
    Some(u8::try_from(letters.len()).unwrap_or(u8::MAX))
}

/// Line-oriented session over stdin.
#[derive(Parser, Debug)]
#[command(about = "Dispatch commands from stdin, sharing session state across lines")]
pub struct ShellArgs {
    /// Stop at the first failing command
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Write a default config file")]
pub struct InitArgs {
    /// Where to write (default: the user config dir)
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(tokens: &[&str]) -> ExecArgs {
        ExecArgs {
            command: "message:new".to_string(),
            tokens: tokens.iter().map(|token| token.to_string()).collect(),
        }
    }

    #[test]
    fn trailing_globals_are_lifted_out_of_tokens() {
        let mut args = exec(&["--message", "hi", "--json", "-vv", "--config=/tmp/cmdflow.json"]);
        let globals = args.take_globals();
        assert_eq!(
            globals,
            TrailingGlobals {
                json: true,
                verbose: 2,
                config: Some(PathBuf::from("/tmp/cmdflow.json")),
            }
        );
        assert_eq!(args.tokens, vec!["--message", "hi"]);
    }

    #[test]
    fn tokens_after_separator_stay_put() {
        let mut args = exec(&["--config", "/tmp/a.json", "--", "--json", "-v"]);
        let globals = args.take_globals();
        assert_eq!(globals.config, Some(PathBuf::from("/tmp/a.json")));
        assert!(!globals.json);
        assert_eq!(globals.verbose, 0);
        assert_eq!(args.tokens, vec!["--", "--json", "-v"]);
    }

    #[test]
    fn plain_dashes_are_not_verbosity() {
        assert_eq!(verbose_cluster("-"), None);
        assert_eq!(verbose_cluster("-vx"), None);
        assert_eq!(verbose_cluster("-vvv"), Some(3));
    }
}
