//! SSM Deploy - 通过 SSM Run Command 重新部署容器
//!
//! Usage:
//! - Deploy: `ssm-deploy` (configuration from environment variables)
//! - Print the request without calling AWS: `ssm-deploy --dry-run`
//! - Custom poll budget: `ssm-deploy --poll-delay 10 --max-attempts 30`

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ssm_deploy::{PollPolicy, RunOptions};

#[derive(Parser)]
#[command(name = "ssm-deploy")]
#[command(about = "Redeploy a container on an EC2 host through SSM Run Command")]
#[command(version)]
struct Cli {
    /// Print the SendCommand request as JSON and exit
    #[arg(long)]
    dry_run: bool,

    /// Seconds between status polls
    #[arg(long, env = "DEPLOY_POLL_DELAY_SECS", default_value_t = 5)]
    poll_delay: u64,

    /// Maximum number of status polls
    #[arg(long, env = "DEPLOY_POLL_MAX_ATTEMPTS", default_value_t = 10)]
    max_attempts: u32,
}

fn main() {
    // stdout 留给 dry-run 输出
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = RunOptions {
        dry_run: cli.dry_run,
        poll: PollPolicy::new(Duration::from_secs(cli.poll_delay), cli.max_attempts),
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(ssm_deploy::run(options)) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
