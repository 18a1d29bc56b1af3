mod args;
mod json;
mod path;
mod text;

use std::env;
use std::path::Path;

use tile_check_core::{CStyleFrontend, Frontend, RunOptions, load_submissions, run};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::args::{ParsedArgs, Verbosity, parse_args, print_help};
use crate::json::{json_report, write_json};
use crate::path::resolve_path;
use crate::text::format_text;

static C_STYLE: CStyleFrontend = CStyleFrontend;

fn select_frontend(language: &str) -> Option<&'static dyn Frontend> {
    match language.trim().to_ascii_lowercase().as_str() {
        "c-style" | "c" | "cpp" | "java" | "generic" => Some(&C_STYLE),
        _ => None,
    }
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Frontend defaults first, then whatever the command line set explicitly.
fn run_options(parsed: &ParsedArgs, frontend: &dyn Frontend) -> RunOptions {
    let defaults = RunOptions::for_frontend(frontend);
    RunOptions {
        minimum_token_match: parsed.min_tokens.unwrap_or(defaults.minimum_token_match),
        comparison_mode: parsed.comparison_mode.unwrap_or(defaults.comparison_mode),
        ..parsed.options.clone()
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let parsed = match parse_args(&args) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_help();
            return;
        }
        Err(message) => {
            eprintln!("Error: {message}\n");
            print_help();
            std::process::exit(2);
        }
    };

    let Some(frontend) = select_frontend(&parsed.language) else {
        eprintln!("Error: unknown language: {}\n", parsed.language);
        print_help();
        std::process::exit(2);
    };

    init_tracing(parsed.verbosity);
    for warning in &parsed.warnings {
        warn!("{warning}");
    }

    let root = match resolve_path(&parsed.root) {
        Ok(root) => root,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = execute(&parsed, frontend, &root) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn execute(
    parsed: &ParsedArgs,
    frontend: &dyn Frontend,
    root: &Path,
) -> tile_check_core::Result<()> {
    let options = run_options(parsed, frontend);
    options.validate()?;

    let registry = load_submissions(root, frontend, &parsed.load, parsed.base_code.as_deref())?;
    let result = run(&registry, &options)?;
    let report = json_report(
        root.display().to_string(),
        frontend.short_name().to_string(),
        options.similarity_metric,
        &registry,
        &result,
    );

    if parsed.json {
        write_json(&report)?;
    } else {
        print!("{}", format_text(&report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tile_check_core::ComparisonMode;

    use super::*;

    fn parsed(args: &[&str]) -> ParsedArgs {
        let argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_args(&argv).unwrap().unwrap()
    }

    #[test]
    fn frontend_defaults_fill_unset_options() {
        let frontend = select_frontend("c-style").unwrap();
        let options = run_options(&parsed(&["."]), frontend);
        assert_eq!(options.minimum_token_match, frontend.minimum_token_match());
        assert_eq!(options.comparison_mode, ComparisonMode::Normal);
    }

    #[test]
    fn explicit_options_override_frontend_defaults() {
        let frontend = select_frontend("C").unwrap();
        let options = run_options(
            &parsed(&["--min-tokens", "5", "--comparison-mode", "ordered", "."]),
            frontend,
        );
        assert_eq!(options.minimum_token_match, 5);
        assert_eq!(options.comparison_mode, ComparisonMode::Ordered);
    }

    #[test]
    fn unknown_language_has_no_frontend() {
        assert!(select_frontend("cobol").is_none());
    }
}
