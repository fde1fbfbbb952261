//! `testdeck-demo`: run the bundled demo suite through the orchestrator.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use testdeck::cli::{DemoOptions, USAGE};
use testdeck::{demo, summary, EnvConfig, Orchestrator, RunAs, RunnerConfig, TracingEventLogger};

fn main() -> ExitCode {
    testdeck::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match DemoOptions::parse(&args) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!();
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };
    if options.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let env = match EnvConfig::from_env() {
        Ok(env) => env,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };
    if env.looks_like_production() {
        eprintln!("error: DB_URL looks like a production database; refusing to run");
        return ExitCode::from(2);
    }
    let run_as = env.run_as();

    let mut config = RunnerConfig::from_env_config(&env)
        .print_to_stdout(options.print_output || run_as == RunAs::Job);
    if let Some(pattern) = &options.pattern {
        config = config.filter(pattern.clone());
    }

    let orchestrator = match Orchestrator::with_config(demo::registry(), &config) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };
    orchestrator.set_event_logger(Some(Arc::new(TracingEventLogger)));
    orchestrator.log_event(&format!("running demo suite as {run_as} in {}", env.env));

    let code = match orchestrator.run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = print_results(&orchestrator, &options) {
        eprintln!("error: could not write results: {err}");
        return ExitCode::FAILURE;
    }

    if code == 0 && orchestrator.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_results(orchestrator: &Orchestrator, options: &DemoOptions) -> io::Result<()> {
    let records = orchestrator.statistics();
    let mut out = io::stdout().lock();
    if options.json {
        serde_json::to_writer_pretty(&mut out, &records)?;
        writeln!(out)?;
    } else {
        summary::write_summary(&mut out, &records)?;
    }
    if options.report {
        orchestrator.report_statistics(&mut out)?;
    }
    out.flush()
}
