// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;
mod session;

use anyhow::{Context, Result, anyhow, bail};
use config::{Config, LOG_ENV};
use pickup_app::{AddressType, PickupWindow, Quote, parse_wire_date};
use runtime::ServiceRuntime;
use session::{SessionInput, SessionReport, run_session};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::{OffsetDateTime, UtcOffset};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // The local offset can only be read before any worker threads exist.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `pickup --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_logging(config.log_filter())?;

    let timeout = config.timeout()?;
    let client = pickup_client::Client::new(config.base_url(), timeout).with_context(|| {
        format!(
            "invalid [service] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;

    let quote = match &options.quote_path {
        Some(path) => Some(load_quote(path)?),
        None => None,
    };
    if options.check_only {
        return Ok(());
    }
    let quote = quote.ok_or_else(|| {
        anyhow!("--quote <file> is required; pass the quote JSON the pickup is scheduled against")
    })?;

    // Allow one extra timeout of slack for worker hand-off.
    let mut runtime = ServiceRuntime::new(Arc::new(client), timeout.saturating_mul(2));
    let today = || OffsetDateTime::now_utc().to_offset(offset).date();
    match run_session(&quote, options.input, &mut runtime, today)? {
        SessionReport::Completed { outcome, quote } => {
            println!("{}", outcome.message());
            if let Some(quote) = quote {
                let body = serde_json::to_string_pretty(&quote).context("encode updated quote")?;
                println!("{body}");
            }
            Ok(())
        }
        SessionReport::Stopped { error } => bail!("{error}"),
    }
}

fn init_logging(config_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(config_filter))
        .with_context(|| format!("invalid log filter {config_filter:?}"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|error| anyhow!("initialize logging: {error}"))
}

fn load_quote(path: &Path) -> Result<Quote> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read quote file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("decode quote JSON {}", path.display()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    quote_path: Option<PathBuf>,
    input: SessionInput,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        quote_path: None,
        input: SessionInput::default(),
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                options.config_path = PathBuf::from(next_value(&mut iter, "--config")?);
            }
            "--quote" => {
                options.quote_path = Some(PathBuf::from(next_value(&mut iter, "--quote")?));
            }
            "--date" => {
                let raw = next_value(&mut iter, "--date")?;
                let date = parse_wire_date(&raw)
                    .ok_or_else(|| anyhow!("--date {raw:?} is not a YYYY-MM-DD date"))?;
                options.input.date = Some(date);
            }
            "--window" => {
                let raw = next_value(&mut iter, "--window")?;
                let window = PickupWindow::parse(&raw).ok_or_else(|| {
                    anyhow!("--window {raw:?} must be one of morning, afternoon, evening")
                })?;
                options.input.window = Some(window);
            }
            "--address-type" => {
                let raw = next_value(&mut iter, "--address-type")?;
                let kind = AddressType::parse(&raw).ok_or_else(|| {
                    anyhow!("--address-type {raw:?} must be residence or business")
                })?;
                options.input.address_type = Some(kind);
            }
            "--street" => options.input.street = Some(next_value(&mut iter, "--street")?),
            "--city" => options.input.city = Some(next_value(&mut iter, "--city")?),
            "--state" => options.input.state = Some(next_value(&mut iter, "--state")?),
            "--zip" => options.input.zip = Some(next_value(&mut iter, "--zip")?),
            "--name" => options.input.name = Some(next_value(&mut iter, "--name")?),
            "--phone" => options.input.phone = Some(next_value(&mut iter, "--phone")?),
            "--instructions" => {
                options.input.instructions = Some(next_value(&mut iter, "--instructions")?);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn next_value<I, S>(iter: &mut I, flag: &str) -> Result<String>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    iter.next()
        .map(|value| value.as_ref().to_owned())
        .ok_or_else(|| anyhow!("{flag} requires a value"))
}

fn print_help() {
    println!("pickup - schedule a pickup against a quote");
    println!("  --config <path>          Use a specific config path");
    println!("  --quote <path>           Quote JSON to schedule against");
    println!("  --date <YYYY-MM-DD>      Pickup date (tomorrow through 30 days out)");
    println!("  --window <name>          morning | afternoon | evening");
    println!("  --street <text>          Street address");
    println!("  --city <text>            City (autofilled from --zip when omitted)");
    println!("  --state <text>           State (autofilled from --zip when omitted)");
    println!("  --zip <code>             ZIP code");
    println!("  --address-type <kind>    residence | business");
    println!("  --name <text>            Contact name (defaults from the quote)");
    println!("  --phone <text>           Contact phone (defaults from the quote)");
    println!("  --instructions <text>    Special instructions for the driver");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and quote, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, load_quote, parse_cli_args};
    use crate::session::SessionInput;
    use anyhow::Result;
    use pickup_app::{AddressType, PickupWindow};
    use pickup_testkit::{PickupFaker, temp_quote_file};
    use std::path::PathBuf;
    use time::{Date, Month};

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/pickup-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                quote_path: None,
                input: SessionInput::default(),
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_and_quote_paths() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml", "--quote", "quote.json"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.quote_path, Some(PathBuf::from("quote.json")));
        Ok(())
    }

    #[test]
    fn parse_cli_args_collects_form_values() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--date",
                "2026-02-21",
                "--window",
                "evening",
                "--street",
                "123 Main St",
                "--zip",
                "97205",
                "--address-type",
                "business",
                "--phone",
                "503-555-1234",
            ],
            default_options_path(),
        )?;
        assert_eq!(
            options.input,
            SessionInput {
                date: Some(
                    Date::from_calendar_date(2026, Month::February, 21).expect("valid date")
                ),
                window: Some(PickupWindow::Evening),
                street: Some("123 Main St".to_owned()),
                zip: Some("97205".to_owned()),
                address_type: Some(AddressType::Business),
                phone: Some("503-555-1234".to_owned()),
                ..SessionInput::default()
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a value"));
    }

    #[test]
    fn parse_cli_args_rejects_bad_enum_values() {
        let error = parse_cli_args(vec!["--window", "night"], default_options_path())
            .expect_err("unknown window should fail");
        assert!(error.to_string().contains("morning, afternoon, evening"));

        let error = parse_cli_args(vec!["--date", "02/21/2026"], default_options_path())
            .expect_err("bad date should fail");
        assert!(error.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn load_quote_reads_json_and_reports_bad_files() -> Result<()> {
        let quote = PickupFaker::new(5).quote();
        let (dir, path) = temp_quote_file(&quote)?;
        assert_eq!(load_quote(&path)?, quote);

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{")?;
        let error = load_quote(&broken).expect_err("broken JSON should fail");
        assert!(error.to_string().contains("decode quote JSON"));
        Ok(())
    }
}
