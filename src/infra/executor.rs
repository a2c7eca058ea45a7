//! 远程命令执行接口
//!
//! 部署流程只依赖这个 trait，AWS SSM 实现见 [`super::ssm`]

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::deploy::{CommandId, InvocationOutput, SendCommandRequest};

/// 执行服务错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutorError {
    /// 命令已提交，但在目标主机上还查不到执行记录
    #[error("invocation does not exist yet")]
    InvocationDoesNotExist,

    /// 服务端未返回命令 ID
    #[error("SendCommand response did not include a command id")]
    MissingCommandId,

    #[error("{0}")]
    Api(String),
}

/// 远程命令执行器
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// 提交命令，返回命令 ID
    async fn send_command(&self, request: &SendCommandRequest) -> Result<CommandId, ExecutorError>;

    /// 查询命令在某台主机上的执行状态与输出
    async fn get_invocation(
        &self,
        command_id: &CommandId,
        instance_id: &str,
    ) -> Result<InvocationOutput, ExecutorError>;
}
