//! Convert command implementation.

use std::path::Path;

use tracing::{debug, info, warn};
use wikiport_core::config::loader::ConfigLoader;
use wikiport_core::convert::{ConvertError, ConvertReport, Converter, UnresolvedPolicy};
use wikiport_core::vault::{Decoding, expand_tilde};

use crate::ConvertArgs;
use crate::logging;

pub fn run(config: Option<&Path>, args: &ConvertArgs) {
    // Load configuration
    let mut rc = match ConfigLoader::load(config) {
        Ok(rc) => rc,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    // Flags win over the config file
    if args.strict {
        rc.convert.decoding = Decoding::Strict;
    }
    if args.keep_going {
        rc.convert.on_unresolved = UnresolvedPolicy::Skip;
    }

    logging::init(&rc.logging);
    match &rc.source {
        Some(path) => debug!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    let vault_root = expand_tilde(&args.vault_root);
    if !vault_root.is_dir() {
        println!("{} is either not a directory or does not exist.", args.vault_root.display());
        logging::flush();
        std::process::exit(1);
    }

    println!("Recursively editing markdown files in directory {}", args.vault_root.display());

    let result = Converter::new(&vault_root, rc.convert).and_then(|c| c.run());
    match result {
        Ok(report) => {
            print_summary(&report);
            logging::flush();
        }
        Err(e) => {
            print_error(&e);
            logging::flush();
            std::process::exit(1);
        }
    }
}

fn print_error(e: &ConvertError) {
    eprintln!("Error: {}", e);
    if let ConvertError::UnresolvedBlockRef { .. } = e {
        eprintln!("Hint: rerun with --keep-going to leave unresolved embeds in place.");
    }
}

fn print_summary(report: &ConvertReport) {
    info!("Conversion complete in {}ms", report.duration_ms);
    for stats in &report.passes {
        debug!(
            "  {:<10} files: {:>5}  changed: {:>5}  substitutions: {:>5}",
            stats.pass.to_string(),
            stats.files,
            stats.files_changed,
            stats.changes
        );
    }

    let unresolved = report.unresolved();
    if unresolved > 0 {
        warn!("{} block embed(s) could not be resolved and were left in place", unresolved);
    }
}
