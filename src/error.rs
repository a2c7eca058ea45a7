//! 统一错误处理
//!
//! `DeployError` 覆盖一次派发的所有失败路径，`main` 打印后以非零码退出

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::deploy::{CommandId, InvocationStatus};
use crate::infra::ExecutorError;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to submit command: {0}")]
    Submit(#[source] ExecutorError),

    #[error("command {command_id} finished with status {status}")]
    CommandFailed {
        command_id: CommandId,
        status: InvocationStatus,
    },

    #[error("command {command_id} did not finish after {attempts} attempts")]
    WaitTimeout { command_id: CommandId, attempts: u32 },

    #[error("failed to poll command status: {0}")]
    Poll(#[source] ExecutorError),

    #[error("failed to fetch command output: {0}")]
    Fetch(#[source] ExecutorError),

    #[error("failed to write step summary: {0}")]
    Summary(#[from] std::io::Error),

    #[error("failed to serialize request: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 便捷类型别名
pub type DeployResult<T> = Result<T, DeployError>;
