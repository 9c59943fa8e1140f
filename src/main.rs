//! Beam CLI - deployment orchestrator
//!
//! Usage: beam [--json] [-v] [--config FILE] <up|down> --remote <NAME> [OPTIONS]
//!
//! Exit codes: 0 on success, 1 on any error, 130 when interrupted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Confirm;
use is_terminal::IsTerminal;

use beam::domain::ports::DeployEventSink;
use beam::domain::value_objects::OutputSink;
use beam::infrastructure::JsonEventSink;
use beam::presentation::cli::{Cli, DeployArgs};
use beam::presentation::create_orchestrator;
use beam::presentation::output::{
    render_changes, render_summary, ConsoleEventSink, ConsoleOutput, TransferOutput,
};
use beam::{resolve_options, BeamConfig, BeamError, CancelToken, Direction};

const EXIT_FAILURE: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_sink = cli.json.then(|| Arc::new(JsonEventSink::stdout()));

    let cancel = CancelToken::new();
    let flag = cancel.flag();
    if let Err(err) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        eprintln!("warning: could not install Ctrl+C handler: {}", err);
    }

    match run(&cli, json_sink.clone(), cancel.clone()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let beam_err = err.downcast_ref::<BeamError>();
            match (&json_sink, beam_err) {
                (Some(sink), Some(e)) => sink.error(e.kind(), &e.to_string()),
                (Some(sink), None) => sink.error("error", &format!("{:#}", err)),
                (None, _) => eprintln!("Error: {:#}", err),
            }

            let cancelled = matches!(beam_err, Some(BeamError::Cancelled)) || cancel.is_cancelled();
            ExitCode::from(if cancelled {
                EXIT_INTERRUPTED
            } else {
                EXIT_FAILURE
            })
        }
    }
}

fn run(cli: &Cli, json_sink: Option<Arc<JsonEventSink>>, cancel: CancelToken) -> Result<()> {
    let direction = cli.command.direction();
    let args = cli.command.args();
    let unicode = std::io::stderr().is_terminal();

    let config = load_config(cli.config.clone(), args)?;
    let options = resolve_options(args.to_raw_options(direction), &config)?;
    let remote = options.remote.clone();
    let dry_run = options.dry_run;

    let events: Arc<dyn DeployEventSink> = match &json_sink {
        Some(sink) => sink.clone(),
        None => Arc::new(ConsoleEventSink::new(unicode, cli.verbose)),
    };
    let mut orchestrator = create_orchestrator(config)
        .events(events)
        .cancel_token(cancel)
        .build(options)?;

    let transfer_text = TransferOutput {
        verbose: cli.verbose,
    };
    let console = ConsoleOutput;
    let deployment_output: &dyn OutputSink = match &json_sink {
        Some(sink) => sink.as_ref(),
        None => &transfer_text,
    };
    let command_output: &dyn OutputSink = match &json_sink {
        Some(sink) => sink.as_ref(),
        None => &console,
    };

    if !dry_run && !args.yes {
        if !std::io::stdin().is_terminal() {
            return Err(BeamError::InvalidArgument(
                "refusing to deploy without confirmation in a non-interactive session; pass --yes"
                    .to_string(),
            )
            .into());
        }

        let preview = orchestrator.changed_files(deployment_output, command_output)?;
        if json_sink.is_none() {
            eprint!("{}", render_summary(&preview, true, unicode));
            if cli.verbose > 0 {
                eprint!("{}", render_changes(&preview, unicode));
            }
        }

        let confirmed = Confirm::new()
            .with_prompt(confirm_prompt(direction, &remote))
            .default(false)
            .interact()?;
        if !confirmed {
            eprintln!("Aborted.");
            return Ok(());
        }
    }

    let result = orchestrator.run(deployment_output, command_output)?;

    if json_sink.is_none() {
        print!("{}", render_summary(&result, dry_run, unicode));
        if dry_run || cli.verbose > 0 {
            print!("{}", render_changes(&result, unicode));
        }
    }
    Ok(())
}

/// `--config`, or the first config file found in the source directory
fn load_config(explicit: Option<PathBuf>, args: &DeployArgs) -> Result<BeamConfig> {
    let path = match explicit {
        Some(path) => path,
        None => BeamConfig::discover(&args.srcdir).ok_or_else(|| BeamError::InvalidConfiguration {
            field: "config".to_string(),
            reason: format!(
                "no beam.json, beam.toml, beam.yaml or beam.yml in {}",
                args.srcdir.display()
            ),
        })?,
    };

    let (config, warnings) = BeamConfig::load_with_warnings(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(config)
}

fn confirm_prompt(direction: Direction, remote: &str) -> String {
    match direction {
        Direction::Up => format!("Deploy these changes to {}?", remote),
        Direction::Down => format!("Pull these changes from {}?", remote),
    }
}
