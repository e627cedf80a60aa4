use clap::Parser;
use ssmd_momentum::cli::{Cli, Commands};
use ssmd_momentum::config::{Config, ConfigError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing file falls back to defaults; an invalid one is fatal
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    let _telemetry = ssmd_momentum::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Replay(args) => {
            tracing::info!(
                input = %args.input.display(),
                sharded = args.sharded,
                "Starting replay"
            );
            args.execute(config).await?;
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
