mod cmd;
mod logging;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Args, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "wikiport",
    version,
    about = "Rewrite an Obsidian vault's links in place for Wiki.js"
)]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/wikiport/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    convert: ConvertArgs,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Vault root directory; every .md file below it is rewritten in place
    pub vault_root: PathBuf,

    /// Reject files that are not valid UTF-8 instead of dropping bad bytes
    #[arg(long)]
    pub strict: bool,

    /// Leave unresolvable block embeds in place instead of aborting
    #[arg(long)]
    pub keep_going: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) if is_vault_arg_error(&e) => {
            let program = std::env::args().next().unwrap_or_else(|| "wikiport".to_string());
            println!("{program} requires the obsidian vault root dir as an argument.");
            println!("{}", e.render());
            std::process::exit(1);
        }
        Err(e) => {
            eprint!("{}", e.render());
            std::process::exit(1);
        }
    };

    cmd::convert::run(cli.config.as_deref(), &cli.convert);
}

/// A missing vault root, or an extra positional argument next to it.
fn is_vault_arg_error(e: &clap::Error) -> bool {
    match e.kind() {
        ErrorKind::MissingRequiredArgument => true,
        ErrorKind::UnknownArgument => match e.get(ContextKind::InvalidArg) {
            Some(ContextValue::String(arg)) => !arg.starts_with('-'),
            _ => false,
        },
        _ => false,
    }
}
