use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use lockstep65_validation::channel::{CommandChannel, ResponseChannel};
use lockstep65_validation::{
    Connection, DebugServer, DeviceAdapter, DifferentialEngine, HarnessError, ReferenceAdapter,
    RunConfig, ServeEnd,
};

#[derive(Parser, Debug)]
#[command(name = "lockstep65", version, about = "Differential tester for 6502 emulators")]
struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Step random instructions on both emulators until they disagree
    Run(RunArgs),
    /// Serve the reference emulator over the debug protocol
    Serve(ServeArgs),
    /// Compare ADC/SBC immediate over every carry, accumulator and operand
    Sweep(SweepArgs),
}

#[derive(Args, Debug)]
struct DeviceArgs {
    /// FIFO base path; `<BASE>-cmd` and `<BASE>-rsp` must already exist
    #[arg(long, value_name = "BASE", conflicts_with = "spawn")]
    fifo: Option<PathBuf>,

    /// Start the device emulator and talk to it over its stdin/stdout
    #[arg(long, value_name = "CMD")]
    spawn: Option<String>,

    /// Arguments for the spawned device emulator
    #[arg(last = true, requires = "spawn")]
    spawn_args: Vec<String>,

    /// TOML run configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fail if the device takes longer than this to answer a command
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Write the failure report here as JSON (gzip when the name ends in .gz)
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    device: DeviceArgs,

    /// Generator seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Stop cleanly after this many instructions
    #[arg(long)]
    limit: Option<u64>,
}

#[derive(Args, Debug)]
struct SweepArgs {
    #[command(flatten)]
    device: DeviceArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// FIFO base path; stdin/stdout when omitted
    #[arg(long, value_name = "BASE")]
    fifo: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Mode::Run(args) => run(args),
        Mode::Serve(args) => serve(args),
        Mode::Sweep(args) => sweep(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<HarnessError>() {
            Some(HarnessError::StateMismatch(record)) => {
                println!("{record}");
                ExitCode::from(1)
            }
            // Display already carries the cause and the reproduction table.
            Some(fatal @ HarnessError::Fatal { .. }) => {
                eprintln!("error: {fatal}");
                ExitCode::from(2)
            }
            _ => {
                eprintln!("error: {err:#}");
                ExitCode::from(2)
            }
        },
    }
}

fn load_config(args: &DeviceArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(ms) = args.timeout_ms {
        config.response_timeout_ms = Some(ms);
    }
    if let Some(base) = &args.fifo {
        config.fifo_base = base.clone();
    }
    config.validate()?;
    Ok(config)
}

type Device = DeviceAdapter<CommandChannel, ResponseChannel>;

fn connect(args: &DeviceArgs, config: &RunConfig) -> Result<Device> {
    let timeout = config.response_timeout();
    let connection = match &args.spawn {
        Some(program) => Connection::spawn(program, &args.spawn_args, timeout)
            .with_context(|| format!("starting {program}"))?,
        None => Connection::open_fifos(&config.fifo_base, timeout)
            .with_context(|| format!("opening FIFOs at {}", config.fifo_base.display()))?,
    };
    let mut device = DeviceAdapter::connect(connection).context("priming device registers")?;
    let version = device.client_mut().version().context("querying device version")?;
    info!("device: {version}");
    Ok(device)
}

/// Save the report for a failed run, then pass the error on.
fn finish<T>(result: Result<T, HarnessError>, report: Option<&Path>) -> Result<T> {
    if let (Err(err), Some(path)) = (&result, report) {
        let written = match err {
            HarnessError::StateMismatch(record) => Some(record.write_to(path)),
            HarnessError::Fatal { context, .. } => Some(context.write_to(path)),
            _ => None,
        };
        match written {
            Some(Ok(())) => info!("report written to {}", path.display()),
            Some(Err(e)) => error!("writing report to {}: {e}", path.display()),
            None => {}
        }
    }
    Ok(result?)
}

fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args.device)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let device = connect(&args.device, &config)?;
    let mut engine = DifferentialEngine::new(ReferenceAdapter::new(), device, config, seed);

    let summary = finish(engine.run(args.limit), args.device.report.as_deref())?;
    info!(
        "{} instructions matched (seed {})",
        summary.executed, summary.seed
    );
    Ok(())
}

fn sweep(args: SweepArgs) -> Result<()> {
    let config = load_config(&args.device)?;
    let device = connect(&args.device, &config)?;
    let mut engine = DifferentialEngine::new(ReferenceAdapter::new(), device, config, 0);

    let summary = finish(engine.sweep(), args.device.report.as_deref())?;
    info!("sweep passed: {} cases", summary.cases);
    Ok(())
}

fn serve(args: ServeArgs) -> Result<()> {
    let mut server = DebugServer::new(ReferenceAdapter::new());
    let end = match &args.fifo {
        Some(base) => {
            let (cmd_path, rsp_path) = Connection::fifo_paths(base);
            let open = |path: &Path| {
                OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(path)
                    .with_context(|| format!("opening {}", path.display()))
            };
            let commands = open(&cmd_path)?;
            let responses = open(&rsp_path)?;
            info!("serving on {}", base.display());
            server.serve(commands, responses)
        }
        None => server.serve(io::stdin().lock(), io::stdout().lock()),
    }
    .context("serving debug protocol")?;

    match end {
        ServeEnd::Stopped => info!("stopped by client"),
        ServeEnd::Disconnected => info!("client disconnected"),
    }
    Ok(())
}
