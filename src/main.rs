use silkrouter::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig::from_env())?;
    silkrouter::cli::run_cli()
}
