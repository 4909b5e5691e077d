use anyhow::Context;
use clap::Parser;
use sas_inference::Config;
use sas_scraper::{handle_command, init_logging, PipelineCommands};

/// Summarize scientific articles with interchangeable methods.
#[derive(Parser, Debug)]
#[command(name = "sas", author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: PipelineCommands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let logger = init_logging(cli.verbose).with_prefix("sas");

    let config = Config::from_env();
    logger.debug(&format!("Inference config: {:?}", config));

    handle_command(cli.command, &config)
        .await
        .context("sas command failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_summarize_flags() {
        let cli = Cli::try_parse_from([
            "sas", "summarize", "--force", "--storage", "memory", "--cache-dir", "/tmp/pages",
        ])
        .unwrap();
        match cli.command {
            PipelineCommands::Summarize { force, output, cache, .. } => {
                assert!(force);
                assert_eq!(output.storage, sas_storage::StorageKind::Memory);
                assert_eq!(cache.cache_dir, std::path::PathBuf::from("/tmp/pages"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
