// src/main.rs - Robot host entry point
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tokio::sync::broadcast;

use robo_rs::config::{self, Config};
use robo_rs::{engine, host, program, HardwareContext, HostError, Robot};

const DEFAULT_CONFIG: &str = "robot.toml";

#[derive(Debug, Parser)]
#[command(name = "robot-host", version, about = "Drive the robot from text commands")]
struct Cli {
    /// Configuration file (defaults to ./robot.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Accept control sessions and execute their commands
    Serve {
        /// Override the control server port
        #[arg(long)]
        port: Option<u16>,
        /// Also start the HTTP API
        #[arg(long)]
        http: bool,
    },
    /// Compile a program file and execute it
    Run { program: PathBuf },
    /// Compile a program file without executing it
    Check { program: PathBuf },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, HostError> {
    let config = load(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve { port, http } => {
            serve(config, port, http).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run { program } => run_program(config, &program).await,
        Commands::Check { program } => check_program(&program).await,
    }
}

fn load(path: Option<&Path>) -> Result<Config, HostError> {
    let config = match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            config::load_config(path)?
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            tracing::info!("Loading configuration from: {}", DEFAULT_CONFIG);
            config::load_config(DEFAULT_CONFIG)?
        }
        None => {
            tracing::info!("No configuration file, using simulated hardware");
            let config = Config::default();
            config.validate()?;
            config
        }
    };
    Ok(config)
}

async fn serve(mut config: Config, port: Option<u16>, http: bool) -> Result<(), HostError> {
    tracing::info!("Starting robot host {}", env!("CARGO_PKG_VERSION"));
    if let Some(port) = port {
        config.server.port = port;
    }
    config.http.enabled |= http;
    host::serve(&config, || HardwareContext::from_config(&config), shutdown_signal()).await
}

/// Resolve on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received, shutting down");
                result
            }
            _ = terminate.recv() => {
                tracing::info!("Terminate signal received, shutting down");
                Ok(())
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Interrupt received, shutting down");
        Ok(())
    }
}

async fn run_program(config: Config, path: &Path) -> Result<ExitCode, HostError> {
    let source = tokio::fs::read_to_string(path).await?;
    let program = match program::compile_str(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    tracing::info!(
        "Running {}: {} groups, {} actions",
        path.display(),
        program.groups.len(),
        program.action_count()
    );

    let robot = Robot::from_config(&config)?;
    robot.initialize().await?;
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let (queue, engine) = engine::channel(robot, &config.engine);
    queue.enqueue_program(program)?;
    drop(queue);

    let interrupt = shutdown_tx.clone();
    tokio::spawn(async move {
        if shutdown_signal().await.is_ok() {
            tracing::info!("Stopping program");
            let _ = interrupt.send(());
        }
    });

    let stats = engine.run(shutdown_tx.subscribe()).await?;
    if stats.actions_failed > 0 {
        tracing::warn!("{} actions failed", stats.actions_failed);
    }
    Ok(ExitCode::SUCCESS)
}

async fn check_program(path: &Path) -> Result<ExitCode, HostError> {
    let source = tokio::fs::read_to_string(path).await?;
    match program::compile_str(&source) {
        Ok(program) => {
            for (i, group) in program.groups.iter().enumerate() {
                println!("group {} (line #{}): {}", i + 1, group.line(), group);
            }
            for warning in &program.warnings {
                println!("warning: {}", warning);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
