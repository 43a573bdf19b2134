#![forbid(unsafe_code)]

//! Headless rowclamp scenario runner.

mod cli;

use std::process::ExitCode;

use rowclamp_core::TruncateConfig;
use rowclamp_harness::{FontMetrics, HarnessError, SettledRun, settle_one};
use rowclamp_widgets::TruncateProps;
use serde_json::json;

use cli::{Command, Opts};

fn main() -> ExitCode {
    init_logging();

    let command = match cli::parse(std::env::args().skip(1), |key| std::env::var(key).ok()) {
        Ok(command) => command,
        Err(msg) => {
            eprintln!("error: {msg}");
            eprintln!("Run with --help for usage information.");
            return ExitCode::from(2);
        }
    };

    match command {
        Command::Help => {
            println!("{}", cli::HELP_TEXT);
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("{}", Command::version_line());
            ExitCode::SUCCESS
        }
        Command::Run(opts) => match run(&opts) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "scenario failed");
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(feature = "tracing-json")]
fn init_logging() {
    let _ = rowclamp_core::logging::install_json_subscriber("warn");
}

#[cfg(not(feature = "tracing-json"))]
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(opts: &Opts) -> Result<(), HarnessError> {
    let env_config = TruncateConfig::from_env();
    let trace = opts.trace || env_config.enable_trace;
    let config = env_config.with_trace(trace);
    let props = TruncateProps::new(opts.text.as_str())
        .rows(opts.rows)
        .expanded(opts.expanded);
    let metrics = FontMetrics::new(opts.advance, opts.line_height);

    let run = settle_one(props, opts.width, metrics, config, opts.max_passes)?;
    tracing::info!(passes = run.passes, "settled");

    if opts.json {
        println!("{}", report(opts, &run));
    } else {
        println!("{}", run.widget.output());
    }
    if trace {
        print!("{}", run.widget.trace_jsonl());
    }
    Ok(())
}

fn report(opts: &Opts, run: &SettledRun) -> serde_json::Value {
    let stats = run.widget.stats();
    json!({
        "output": run.widget.output(),
        "rows": opts.rows,
        "width": opts.width,
        "lines": run.host.lines_of(run.widget.output()),
        "height": run.host.height_of(run.widget.output()),
        "budget": run.widget.height_budget(),
        "line_height": run.widget.line_height(),
        "outcome": run.widget.outcome().map(|o| o.as_str()),
        "passes": run.passes,
        "stats": {
            "line_height_measurements": stats.line_height_measurements,
            "candidate_measurements": stats.candidate_measurements,
            "stale_discards": stats.stale_discards,
            "resets": stats.resets,
        },
    })
}
