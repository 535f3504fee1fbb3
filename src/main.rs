use log::error;
use std::env;
use std::path::Path;
use std::process::ExitCode;

use webflow_sanity_migrate::{Migration, MigrationConfig, Phase};

const USAGE: &str = "\
webflow-sanity-migrate - migrate Webflow CMS content into a Sanity dataset

USAGE:
    webflow-sanity-migrate [OPTIONS]

OPTIONS:
    --dry-run              Extract and map everything, write nothing
    --phase <name>         Run only this phase (repeatable).
                           Phases: discovery, content, references, images
    --collection <name>    Migrate only this collection (display name or slug)
    --report <path>        Report file path (default: migration-report.json)
    --help                 Show this help

Configuration comes from migrate.toml and MIGRATE__ environment variables,
e.g. MIGRATE__WEBFLOW__API_TOKEN, MIGRATE__SANITY__TOKEN.";

struct CliArgs {
    dry_run: bool,
    phases: Vec<Phase>,
    collection: Option<String>,
    report_path: Option<String>,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut parsed = CliArgs {
        dry_run: false,
        phases: Vec::new(),
        collection: None,
        report_path: None,
    };

    let mut position = 0;
    while position < args.len() {
        match args[position].as_str() {
            "--dry-run" => parsed.dry_run = true,
            "--phase" => {
                position += 1;
                let name = args
                    .get(position)
                    .ok_or("--phase requires a value".to_string())?;
                let phase = Phase::parse(name)
                    .ok_or_else(|| format!("Unknown phase '{name}'"))?;
                if !parsed.phases.contains(&phase) {
                    parsed.phases.push(phase);
                }
            }
            "--collection" => {
                position += 1;
                parsed.collection = Some(
                    args.get(position)
                        .ok_or("--collection requires a value".to_string())?
                        .clone(),
                );
            }
            "--report" => {
                position += 1;
                parsed.report_path = Some(
                    args.get(position)
                        .ok_or("--report requires a value".to_string())?
                        .clone(),
                );
            }
            other => return Err(format!("Unknown argument '{other}'")),
        }
        position += 1;
    }

    Ok(parsed)
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}\n\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = match MigrationConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Could not load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = &cli.report_path {
        config.report.path = path.clone();
    }
    let report_path = config.report.path.clone();

    let mut builder = Migration::builder().config(config);
    if cli.dry_run {
        builder = builder.dry_run();
    }
    if !cli.phases.is_empty() {
        builder = builder.phases(cli.phases);
    }
    if let Some(collection) = cli.collection {
        builder = builder.only_collection(collection);
    }

    match builder.run().await {
        Ok(report) => {
            if let Err(e) = report.write(Path::new(&report_path)).await {
                error!("Could not write report: {}", e);
            }
            if report.total_failed() > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
