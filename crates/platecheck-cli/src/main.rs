//! platecheck CLI - contract tests for the recipe API with strict verdicts

mod storage;

use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use platecheck_core::config::{ValidationStatus, validate_config};
use platecheck_core::{
    Config, SuiteReport, VerdictPolicy, generate_schema, to_http_file, write_transcript,
};
use platecheck_runner::{CaseRunner, GoldenLoader, suite};

#[derive(Parser)]
#[command(name = "platecheck")]
#[command(about = "Contract tests for the recipe API with strict verdicts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Strict mode (soft failures escalate the exit code). Use --strict=false to disable.
    #[arg(long, global = true, default_value_t = true, action = ArgAction::Set)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the contract suite
    Run {
        /// Config file (default: .platecheck.toml)
        #[arg(short, long)]
        config: Option<String>,

        /// Only run cases whose name contains this substring
        #[arg(short, long)]
        filter: Option<String>,

        /// Stop on first failed case (fast-fail for CI)
        #[arg(long)]
        stop_on_failure: bool,

        /// Show the case plan and config validations without sending requests
        #[arg(long)]
        dry_run: bool,

        /// Output directory for reproduction files
        #[arg(short, long, default_value = ".platecheck")]
        output_dir: String,

        /// Write a full request/response transcript (JSONL per case group)
        #[arg(long)]
        transcript: bool,
    },

    /// Initialize config file
    Init,

    /// Check config, fixtures and golden documents
    Doctor,

    /// Export JSON Schema for the suite report format
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            ref config,
            ref filter,
            stop_on_failure,
            dry_run,
            ref output_dir,
            transcript,
        } => {
            let cfg = if let Some(path) = config {
                Config::load(std::path::Path::new(&path))?
            } else {
                Config::load_default()?
            };

            let mut cases = suite(&cfg);
            if let Some(needle) = &filter {
                cases.retain(|c| c.name.contains(needle.as_str()));
            }

            if dry_run {
                return dry_run_plan(&cli, &cfg, &cases);
            }

            if cases.is_empty() {
                eprintln!("Error: no cases matched filter.");
                return Ok(3);
            }

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  base_url:    {}", cfg.base_url);
                eprintln!("  fixtures:    {}", cfg.fixtures_dir.display());
                eprintln!("  time budget: {}ms", cfg.time_budget_ms);
                eprintln!();
            }

            let runner = CaseRunner::from_config(&cfg)?.with_stop_on_failure(stop_on_failure);

            let run_start = Instant::now();
            let reports = runner.run_suite(&cases);
            let duration_secs = run_start.elapsed().as_secs_f64();

            let policy = VerdictPolicy {
                strict: cli.strict,
                ..Default::default()
            };

            let all_failures: Vec<_> = reports
                .iter()
                .flat_map(|r| r.failures.iter().cloned())
                .collect();
            let filtered = policy.filter(all_failures);

            let total = reports.len() as u64;
            let passed = reports.iter().filter(|r| r.passed()).count() as u64;
            let verdict = policy.verdict(&filtered, total, passed);

            let report = SuiteReport::from_cases(&cfg.base_url, reports, verdict.clone());

            match cli.output {
                OutputFormat::Terminal => {
                    println!("\n{}: {}", verdict.status, verdict.reason);
                    println!("  Cases: {total} total, {passed} passed");
                    println!("  Exit code: {}", verdict.exit_code);

                    if !filtered.is_empty() {
                        println!("\nFailures ({}):", filtered.len());
                        for f in &filtered {
                            println!("  [{}] {}: {}", f.severity, f.case, f.clause);
                            println!("         {}", f.message);
                            for diff in f.diffs.iter().take(5) {
                                println!("         diff: {diff}");
                            }
                        }

                        let http_path =
                            std::path::Path::new(&output_dir).join("reproductions.http");
                        if let Some(parent) = http_path.parent() {
                            let _ = std::fs::create_dir_all(parent);
                        }
                        let http_content = to_http_file(&filtered, "base_url");
                        if let Err(e) = std::fs::write(&http_path, &http_content) {
                            eprintln!("Warning: failed to write .http file: {e}");
                        } else {
                            println!("Reproductions: {}", http_path.display());
                        }
                    }
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                OutputFormat::Silent => {}
            }

            if transcript || cfg.transcript {
                let transcript_dir = cfg
                    .transcript_dir
                    .clone()
                    .unwrap_or_else(|| std::path::Path::new(&output_dir).join("transcripts"));
                match write_transcript(&report.cases, &transcript_dir, true) {
                    Ok(index) => {
                        if cli.output != OutputFormat::Silent {
                            eprintln!(
                                "Transcript: {} cases in {}",
                                index.total,
                                index.transcript_dir.display()
                            );
                        }
                    }
                    Err(e) => eprintln!("Warning: failed to write transcript: {e}"),
                }
            }

            // Persist report to ~/.platecheck/reports/
            let report_data = storage::ReportData {
                config: &cfg,
                report: &report,
                duration_secs,
            };
            match storage::save_report(&report_data) {
                Ok(path) => {
                    if cli.output != OutputFormat::Silent {
                        eprintln!("Report saved: {}", path.display());
                    }
                }
                Err(e) => eprintln!("Warning: failed to save report: {e}"),
            }

            Ok(verdict.exit_code)
        }

        Commands::Init => {
            let config_path = ".platecheck.toml";
            if std::path::Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - api_key: your API key");
            println!("  - username / user_hash: connected-user credentials for meal-plan cases");
            println!("  - fixtures_dir: golden documents location");
            Ok(0)
        }

        Commands::Doctor => {
            println!("platecheck doctor");
            println!("=================\n");

            let config_result = Config::load_default();
            println!(
                "[{}] Config file (.platecheck.toml)",
                if config_result.is_ok() { "OK" } else { "--" }
            );

            if let Ok(cfg) = &config_result {
                for validation in validate_config(cfg) {
                    println!("[{}] {}", validation.status, validation.message);
                }

                // Every golden the built-in suite references must be readable
                let loader = GoldenLoader::new(&cfg.fixtures_dir);
                for case in suite(cfg) {
                    for (group, resource) in case.contract.golden_refs() {
                        let ok = loader.load(&group, &resource).is_ok();
                        println!(
                            "[{}] Golden {group}/{resource}",
                            if ok { "OK" } else { "NG" }
                        );
                    }
                }
            } else {
                println!("\nCreate config file:");
                println!("  platecheck init");
            }

            Ok(0)
        }

        Commands::Schema => {
            println!("{}", generate_schema());
            Ok(0)
        }
    }
}

fn dry_run_plan(
    cli: &Cli,
    cfg: &Config,
    cases: &[platecheck_runner::TestCase],
) -> Result<i32> {
    let validations = validate_config(cfg);
    let has_errors = validations
        .iter()
        .any(|v| v.status == ValidationStatus::Error);

    match cli.output {
        OutputFormat::Terminal => {
            println!("Plan: {} cases against {}", cases.len(), cfg.base_url);
            for case in cases {
                println!(
                    "  {} {} {} ({} clauses{})",
                    case.name,
                    case.method,
                    case.path,
                    case.contract.clauses().len(),
                    if case.drop_params.is_empty() {
                        String::new()
                    } else {
                        format!(", drops {}", case.drop_params.join(", "))
                    }
                );
            }
            println!("\nValidations:");
            for v in &validations {
                println!("  [{}] {}", v.status, v.message);
            }
        }
        OutputFormat::Json => {
            let plan = serde_json::json!({
                "base_url": cfg.base_url,
                "cases": cases
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "name": c.name,
                            "group": c.group,
                            "method": c.method,
                            "path": c.path,
                            "clauses": c.contract.clauses().len(),
                            "drop_params": c.drop_params,
                        })
                    })
                    .collect::<Vec<_>>(),
                "validations": validations,
            });
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        OutputFormat::Silent => {}
    }

    Ok(i32::from(has_errors))
}
