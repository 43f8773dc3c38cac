use anyhow::Result;
use clap::Parser;

use checkin_infrastructure::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "checkin-station")]
#[command(about = "Event check-in station server", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref()).await?;
    let _log_guard = checkin_bootstrap::telemetry::init(config.log_dir.as_deref(), config.log_json)?;

    checkin_bootstrap::run(config).await
}
