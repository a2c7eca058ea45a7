//! SSM Deploy - 通过 SSM Run Command 在 EC2 主机上重新部署容器
//!
//! 库入口：配置加载、远程派发与摘要写入

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod services;

use tracing::info;

pub use config::{DeployConfig, PollPolicy};
pub use error::{DeployError, DeployResult};

use config::env::constants::VERSION;
use infra::{SsmExecutor, SummaryWriter};
use services::deploy;

/// 运行时选项（来自命令行）
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// 只输出请求，不调用 AWS
    pub dry_run: bool,
    pub poll: PollPolicy,
}

/// 从环境变量加载配置并执行一次部署
pub async fn run(options: RunOptions) -> DeployResult<()> {
    let config = DeployConfig::from_env()?;

    info!(
        version = VERSION,
        instance_id = %config.instance_id,
        region = %config.region,
        dry_run = options.dry_run,
        "Loaded deploy configuration"
    );

    if options.dry_run {
        let request = deploy::build_request(&config);
        let json = serde_json::to_string_pretty(&request)?;
        println!("{}", json);
        return Ok(());
    }

    let executor = SsmExecutor::from_region(&config.region).await;
    let summary = SummaryWriter::new(config.summary_path.clone());

    deploy::dispatch(&executor, &config, &summary, options.poll).await?;
    Ok(())
}
