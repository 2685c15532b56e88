use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use tannoy::app::{
    apply_cli_overrides, build_engine, open_device, resolve_request, run_download, run_play,
};
use tannoy::cli::{Cli, Commands, ConfigAction};
use tannoy::config::Config;
use tannoy::engine::Outcome;
use tannoy::error::TannoyError;
use tannoy::stations::describe_missing;
use tannoy::systems::SystemId;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);
    tracing::debug!(version = %tannoy::version_string(), "tannoy starting");

    if let Err(e) = run(cli).await {
        // Name the station instead of printing a raw inventory key.
        if let Some(TannoyError::MissingInventoryEntry { entry }) = e.downcast_ref::<TannoyError>() {
            eprintln!("{} {}", "error:".red().bold(), describe_missing(entry));
            std::process::exit(1);
        }
        return Err(e);
    }
    Ok(())
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise -q shows errors only and each -v adds a level.
fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "tannoy=debug",
        (false, _) => "tannoy=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;

    match cli.command {
        Commands::Systems => {
            for id in SystemId::ALL {
                let system = id.system();
                println!("{}  {} ({})", id.bold(), system.name, system.code.dimmed());
            }
        }
        Commands::Presets => {
            let config = load_config(&cli)?;
            let system = config.system_id()?.system();
            println!("Presets for {}:", system.name.bold());
            for preset in &system.presets {
                println!("  {}  [{}]", preset.name, preset.request.kind().dimmed());
            }
        }
        Commands::Buttons => {
            let config = load_config(&cli)?;
            let system = config.system_id()?.system();
            println!("Announcement buttons for {}:", system.name.bold());
            for button in &system.buttons {
                println!("  {}", button.label);
            }
        }
        Commands::Devices => {
            list_output_devices()?;
        }
        Commands::Segments { ref announcement } => {
            let config = load_config(&cli)?;
            let engine = build_engine(&config)?;
            let request = resolve_request(announcement.clone(), engine.system())?;
            let segments = engine.segments(&request)?;
            if segments.is_empty() {
                println!("{}", "(no segments)".dimmed());
            }
            for segment in &segments {
                let locator = engine.assembler().locator(segment);
                if segment.delay_ms() > 0 {
                    println!(
                        "{:>6}  {}  {}",
                        format!("+{}ms", segment.delay_ms()).dimmed(),
                        segment.id(),
                        locator.dimmed()
                    );
                } else {
                    println!("{:>6}  {}  {}", "", segment.id(), locator.dimmed());
                }
            }
        }
        Commands::Play {
            ref device,
            ref announcement,
        } => {
            let config = load_config(&cli)?;
            let engine = build_engine(&config)?;
            let request = resolve_request(announcement.clone(), engine.system())?;
            let output = open_device(&config, device.as_deref())?;
            if !quiet {
                eprintln!("Playing on {}", output.name().cyan());
            }
            let outcome = run_play(&engine, &request, output.as_ref()).await?;
            report(&outcome, quiet);
        }
        Commands::Download {
            ref output,
            ref announcement,
        } => {
            let config = load_config(&cli)?;
            let engine = build_engine(&config)?;
            let request = resolve_request(announcement.clone(), engine.system())?;
            let outcome = run_download(&engine, &request, output.clone(), &config).await?;
            report(&outcome, quiet);
        }
        Commands::Config { ref action } => match action {
            ConfigAction::Show => {
                let config = load_config(&cli)?;
                print!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Path => {
                let path = cli.config.clone().unwrap_or_else(Config::default_path);
                println!("{}", path.display());
            }
        },
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "tannoy", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Global CLI flags (--system, --audio-root, --base-url, --timeout)
/// 2. Environment variables (TANNOY_*)
/// 3. Custom config path from CLI (--config), or ~/.config/tannoy/config.toml
/// 4. Built-in defaults
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(apply_cli_overrides(config.with_env_overrides(), cli))
}

fn report(outcome: &Outcome, quiet: bool) {
    if quiet {
        return;
    }
    match outcome {
        Outcome::Played(state) => eprintln!("{} {:?}", "Playback".green(), state),
        Outcome::Downloaded(path) => {
            eprintln!("{} {}", "Saved".green(), path.display())
        }
        Outcome::Skipped => eprintln!("{}", "Nothing to announce".yellow()),
    }
}

#[cfg(feature = "cpal-audio")]
fn list_output_devices() -> Result<()> {
    let devices = tannoy::audio::output::list_output_devices()?;

    if devices.is_empty() {
        eprintln!("No audio output devices found");
        std::process::exit(1);
    }

    println!("Available audio output devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
fn list_output_devices() -> Result<()> {
    anyhow::bail!("this build has no audio output support")
}
