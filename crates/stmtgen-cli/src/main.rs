//! `stmtgen` command-line driver

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use stmtgen_extract::EngineKind;
use stmtgen_synth::oracle::EXIT_ORACLE_ERROR;
use stmtgen_synth::{RunnerKind, SynthConfig, SynthError, Synthesizer, Workspace};
use stmtgen_table::{to_csv_string, write_table};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("stmtgen")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Synthesize and run bank-statement extraction routines")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Workspace root (overrides config and STMTGEN_ROOT)"),
        )
        .arg(
            Arg::new("engine")
                .long("engine")
                .global(true)
                .value_parser(value_parser!(EngineKind))
                .help("Extraction engine: auto, pdftotext or plain-text"),
        )
        .arg(
            Arg::new("pdftotext")
                .long("pdftotext")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("pdftotext binary"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("info")
                .help("Log filter when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("init")
                .about("Create the workspace directories")
                .arg(
                    Arg::new("target")
                        .long("target")
                        .help("Also create the sample directory for this target"),
                ),
        )
        .subcommand(
            Command::new("synthesize")
                .about("Generate a routine for a target and validate it")
                .arg(target_arg())
                .arg(
                    Arg::new("max-attempts")
                        .long("max-attempts")
                        .value_parser(value_parser!(u32))
                        .help("Attempt budget"),
                )
                .arg(
                    Arg::new("retry-delay-ms")
                        .long("retry-delay-ms")
                        .value_parser(value_parser!(u64))
                        .help("Pause between failed attempts"),
                )
                .arg(
                    Arg::new("runner")
                        .long("runner")
                        .value_parser(value_parser!(RunnerKind))
                        .help("Oracle runner: subprocess or in-process"),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse a statement, synthesizing the routine first if missing")
                .arg(target_arg())
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Statement document"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write CSV here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Show assets and artifacts for a target")
                .arg(target_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("oracle")
                .about("Execute a generated oracle")
                .hide(true)
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn target_arg() -> Arg {
    Arg::new("target")
        .long("target")
        .required(true)
        .help("Target identifier, e.g. icici")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);
    // Keep an already-installed subscriber.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Defaults, then `--config`, then environment, then flags
///
/// The binary validates attempts in child processes unless told otherwise.
fn load_config(matches: &ArgMatches) -> anyhow::Result<SynthConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => SynthConfig::load(path)?,
        None => SynthConfig::default(),
    };
    config = config.apply_env()?;

    if let Some(root) = matches.get_one::<PathBuf>("root") {
        config = config.with_root(root);
    }
    if let Some(engine) = matches.get_one::<EngineKind>("engine") {
        config = config.with_engine(*engine);
    }
    if let Some(bin) = matches.get_one::<PathBuf>("pdftotext") {
        config = config.with_pdftotext_bin(bin);
    }
    if let Some((_, sub)) = matches.subcommand() {
        if let Ok(Some(max)) = sub.try_get_one::<u32>("max-attempts") {
            config = config.with_max_attempts(*max);
        }
        if let Ok(Some(delay)) = sub.try_get_one::<u64>("retry-delay-ms") {
            config = config.with_retry_delay_ms(*delay);
        }
        if let Ok(Some(runner)) = sub.try_get_one::<RunnerKind>("runner") {
            config = config.with_runner(*runner);
        }
    }

    if config.runner.is_none() {
        config = config.with_runner(RunnerKind::Subprocess);
    }

    config.validate()?;
    Ok(config)
}

fn target(args: &ArgMatches) -> anyhow::Result<&str> {
    args.get_one::<String>("target")
        .map(String::as_str)
        .context("--target is required")
}

async fn run(matches: ArgMatches) -> anyhow::Result<i32> {
    let config = load_config(&matches)?;
    let config_file = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);

    match matches.subcommand() {
        Some(("init", args)) => {
            let workspace = Workspace::from_config(&config)?;
            workspace.ensure()?;
            if let Some(raw) = args.get_one::<String>("target") {
                let id = stmtgen_synth::TargetId::new(raw)?;
                let dir = workspace.target_dir(&id);
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
                println!("Sample directory: {}", dir.display());
            }
            println!("Workspace: {}", workspace.root().display());
            println!("  data:     {}", workspace.data_dir().display());
            println!("  routines: {}", workspace.routines_dir().display());
            println!("  oracles:  {}", workspace.oracles_dir().display());
            Ok(0)
        }
        Some(("synthesize", args)) => {
            let synth = Synthesizer::from_config(config, config_file)?;
            let json = args.get_flag("json");
            match synth.synthesize(target(args)?).await {
                Ok(report) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        for a in &report.attempts {
                            println!("Attempt {} ({}): {}", a.attempt, a.variant, a.verdict);
                        }
                        println!("Routine: {}", report.routine_path.display());
                        println!("Oracle:  {}", report.oracle_path.display());
                    }
                    Ok(0)
                }
                Err(SynthError::SynthesisExhausted {
                    target,
                    attempts,
                    last_diagnostic,
                }) => {
                    eprintln!("error: parser generation failed for '{target}' after {attempts} attempts");
                    if !last_diagnostic.is_empty() {
                        eprintln!("{last_diagnostic}");
                    }
                    Ok(1)
                }
                Err(e) => Err(e.into()),
            }
        }
        Some(("parse", args)) => {
            let synth = Synthesizer::from_config(config, config_file)?;
            let input = args
                .get_one::<PathBuf>("input")
                .context("input is required")?;
            let table = synth.parse_document(target(args)?, input).await?;
            if table.is_empty() {
                eprintln!("No data detected in {}", input.display());
                tracing::warn!("Routine produced no rows for {}", input.display());
            }
            match args.get_one::<PathBuf>("out") {
                Some(out) => write_csv(out, &table)?,
                None => print!("{}", to_csv_string(&table)?),
            }
            tracing::info!("Parsed {} rows", table.len());
            Ok(0)
        }
        Some(("status", args)) => {
            let synth = Synthesizer::from_config(config, config_file)?;
            let status = synth.status(target(args)?)?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("Target: {}", status.target);
                match &status.assets {
                    Some(assets) => {
                        println!("  sample:    {}", assets.sample_input.display());
                        println!("  reference: {}", assets.reference_table.display());
                    }
                    None => println!("  assets:    missing"),
                }
                match status.routine_hash {
                    Some(hash) => println!("  routine:   {} ({})", status.routine_path.display(), hash.short()),
                    None => println!("  routine:   absent"),
                }
                println!(
                    "  oracle:    {}",
                    if status.oracle_present { "present" } else { "absent" }
                );
            }
            Ok(0)
        }
        Some(("oracle", args)) => {
            let path = args.get_one::<PathBuf>("path").context("path is required")?;
            let synth = Synthesizer::from_config(config.with_runner(RunnerKind::InProcess), config_file)?;
            match synth.execute_oracle(path) {
                Ok(outcome) => {
                    println!("{}", outcome.report);
                    Ok(outcome.exit_code())
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    Ok(EXIT_ORACLE_ERROR)
                }
            }
        }
        _ => Ok(0),
    }
}

fn write_csv(path: &Path, table: &stmtgen_table::Table) -> anyhow::Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_table(table, file)?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    let level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    init_tracing(level, matches.get_flag("log-json"));

    let code = match run(matches).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}
