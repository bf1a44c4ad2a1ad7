use clap::Parser;

use easyerp_cli::Cli;
use easyerp_infra::AppConfig;
use easyerp_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    easyerp_observability::init_with(LogFormat::from_json_flag(config.logging.json));

    let output = easyerp_cli::run(cli, config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
