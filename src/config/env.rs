//! 环境变量配置加载

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use self::constants::*;

/// 配置错误
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("{name} contains characters that are not allowed in the remote script: {value:?}")]
    UnsafeValue { name: &'static str, value: String },

    #[error("CONTAINER_PORT is not a valid port: {0:?}")]
    InvalidPort(String),
}

/// 部署配置
///
/// 启动时从环境变量读取一次，之后只读
#[derive(Clone, Debug, PartialEq)]
pub struct DeployConfig {
    /// 目标 EC2 实例 ID
    pub instance_id: String,
    /// CI 步骤摘要文件路径
    pub summary_path: PathBuf,
    /// AWS 区域
    pub region: String,
    /// ECR 仓库主机
    pub registry_host: String,
    /// 镜像引用（含 tag）
    pub image_name: String,
    /// 镜像 manifest digest
    pub manifest_digest: String,
    /// 应用根目录
    pub app_dir: String,
    /// 部署目录名
    pub deploy_dirname: String,
    /// 容器名称
    pub container_name: String,
    /// 宿主机端口
    pub container_port: u16,
}

impl DeployConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 通过查找函数加载配置，空值视为未设置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let instance_id = script_safe(INSTANCE_ID_VAR, required(INSTANCE_ID_VAR)?)?;
        let summary_path = PathBuf::from(required(SUMMARY_PATH_VAR)?);
        let region = script_safe(REGION_VAR, required(REGION_VAR)?)?;
        let registry_host = script_safe(REGISTRY_HOST_VAR, required(REGISTRY_HOST_VAR)?)?;
        let image_name = script_safe(IMAGE_NAME_VAR, required(IMAGE_NAME_VAR)?)?;
        let manifest_digest = script_safe(MANIFEST_DIGEST_VAR, required(MANIFEST_DIGEST_VAR)?)?;

        let app_dir = get(APP_DIR_VAR).unwrap_or_else(|| DEFAULT_APP_DIR.to_string());
        let deploy_dirname =
            get(DEPLOY_DIRNAME_VAR).unwrap_or_else(|| DEFAULT_DEPLOY_DIRNAME.to_string());
        let container_name = script_safe(
            CONTAINER_NAME_VAR,
            get(CONTAINER_NAME_VAR).unwrap_or_else(|| DEFAULT_CONTAINER_NAME.to_string()),
        )?;
        let container_port = match get(CONTAINER_PORT_VAR) {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_CONTAINER_PORT,
        };

        Ok(Self {
            instance_id,
            summary_path,
            region,
            registry_host,
            image_name,
            manifest_digest,
            app_dir,
            deploy_dirname,
            container_name,
            container_port,
        })
    }

    /// 部署目录（APP_DIR/DEPLOY_DIRNAME）
    pub fn deploy_path(&self) -> String {
        format!(
            "{}/{}",
            self.app_dir.trim_end_matches('/'),
            self.deploy_dirname
        )
    }
}

/// 轮询策略
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// 两次查询之间的等待时间
    pub delay: Duration,
    /// 最大查询次数（至少 1 次）
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(POLL_DELAY_SECS),
            POLL_MAX_ATTEMPTS,
        )
    }
}

/// 只接受可以原样写进 shell 脚本的值
///
/// 不做转义，含其他字符直接拒绝
fn script_safe(name: &'static str, value: String) -> Result<String, ConfigError> {
    let ok = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || SCRIPT_SAFE_PUNCTUATION.contains(c));
    if ok {
        Ok(value)
    } else {
        Err(ConfigError::UnsafeValue { name, value })
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort(raw.to_string())),
    }
}

/// 常量
pub mod constants {
    pub const INSTANCE_ID_VAR: &str = "EC2_INSTANCE_ID";
    pub const SUMMARY_PATH_VAR: &str = "GITHUB_STEP_SUMMARY";
    pub const REGION_VAR: &str = "AWS_REGION";
    pub const REGISTRY_HOST_VAR: &str = "ECR_REGISTRY_HOST";
    pub const IMAGE_NAME_VAR: &str = "ECR_IMAGE_NAME";
    pub const MANIFEST_DIGEST_VAR: &str = "ECR_MANIFEST_DIGEST";
    pub const APP_DIR_VAR: &str = "APP_DIR";
    pub const DEPLOY_DIRNAME_VAR: &str = "DEPLOY_DIRNAME";
    pub const CONTAINER_NAME_VAR: &str = "CONTAINER_NAME";
    pub const CONTAINER_PORT_VAR: &str = "CONTAINER_PORT";

    pub const DEFAULT_APP_DIR: &str = "/app";
    pub const DEFAULT_DEPLOY_DIRNAME: &str = "angple";
    pub const DEFAULT_CONTAINER_NAME: &str = "angple-web";
    pub const DEFAULT_CONTAINER_PORT: u16 = 3000;

    /// 容器内服务端口（固定）
    pub const SERVICE_PORT: u16 = 3000;

    /// 部署后打印的容器日志行数
    pub const LOG_TAIL_LINES: u32 = 20;

    /// 轮询间隔（秒）
    pub const POLL_DELAY_SECS: u64 = 5;

    /// 最大轮询次数
    pub const POLL_MAX_ATTEMPTS: u32 = 10;

    pub const SCRIPT_SAFE_PUNCTUATION: &str = "._-/:@+=";

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
