//! 远程部署相关领域模型

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SSM 文档名称：在目标主机上执行 shell 脚本
pub const RUN_SHELL_SCRIPT_DOCUMENT: &str = "AWS-RunShellScript";

/// `AWS-RunShellScript` 文档接收脚本的参数名
pub const COMMANDS_PARAMETER: &str = "commands";

/// 远程命令 ID
///
/// 由执行服务在提交后返回，只对应一次远程执行
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(String);

impl CommandId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommandId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// SendCommand 请求
///
/// dry-run 模式下直接序列化输出，正式执行时交给执行器
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SendCommandRequest {
    pub document_name: String,
    pub instance_ids: Vec<String>,
    pub parameters: BTreeMap<String, Vec<String>>,
}

impl SendCommandRequest {
    /// 创建单主机的 shell 脚本执行请求
    pub fn shell_script(instance_id: impl Into<String>, script: impl Into<String>) -> Self {
        let mut parameters = BTreeMap::new();
        parameters.insert(COMMANDS_PARAMETER.to_string(), vec![script.into()]);

        Self {
            document_name: RUN_SHELL_SCRIPT_DOCUMENT.to_string(),
            instance_ids: vec![instance_id.into()],
            parameters,
        }
    }

    /// 目标主机 ID
    pub fn instance_id(&self) -> &str {
        self.instance_ids.first().map(String::as_str).unwrap_or_default()
    }

    /// 待执行脚本
    pub fn script(&self) -> &str {
        self.parameters
            .get(COMMANDS_PARAMETER)
            .and_then(|commands| commands.first())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// 远程命令在单台主机上的执行状态
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum InvocationStatus {
    Pending,
    InProgress,
    Delayed,
    Success,
    Cancelled,
    Cancelling,
    TimedOut,
    Failed,
    /// 未识别的状态，等待期间按未完成处理
    Unknown(String),
}

impl InvocationStatus {
    /// 转换为服务端使用的字符串
    pub fn as_str(&self) -> &str {
        match self {
            InvocationStatus::Pending => "Pending",
            InvocationStatus::InProgress => "InProgress",
            InvocationStatus::Delayed => "Delayed",
            InvocationStatus::Success => "Success",
            InvocationStatus::Cancelled => "Cancelled",
            InvocationStatus::Cancelling => "Cancelling",
            InvocationStatus::TimedOut => "TimedOut",
            InvocationStatus::Failed => "Failed",
            InvocationStatus::Unknown(s) => s.as_str(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InvocationStatus::Success)
    }

    /// 是否为失败终态（Cancelling 也按失败处理）
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            InvocationStatus::Cancelled
                | InvocationStatus::Cancelling
                | InvocationStatus::TimedOut
                | InvocationStatus::Failed
        )
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_failure()
    }
}

impl From<&str> for InvocationStatus {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => InvocationStatus::Pending,
            "InProgress" => InvocationStatus::InProgress,
            "Delayed" => InvocationStatus::Delayed,
            "Success" => InvocationStatus::Success,
            "Cancelled" => InvocationStatus::Cancelled,
            "Cancelling" => InvocationStatus::Cancelling,
            "TimedOut" => InvocationStatus::TimedOut,
            "Failed" => InvocationStatus::Failed,
            other => InvocationStatus::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 远程执行结果
#[derive(Clone, Debug, PartialEq)]
pub struct InvocationOutput {
    pub status: InvocationStatus,
    /// 标准输出
    pub stdout: String,
    /// 标准错误
    pub stderr: String,
}

impl InvocationOutput {
    pub fn new(
        status: InvocationStatus,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// 仅状态，无输出
    pub fn status_only(status: InvocationStatus) -> Self {
        Self::new(status, "", "")
    }

    pub fn has_stderr(&self) -> bool {
        !self.stderr.is_empty()
    }
}

/// 一次成功派发的结果
#[derive(Clone, Debug, Serialize)]
pub struct DispatchReport {
    pub command_id: CommandId,
    pub instance_id: String,
    pub status: InvocationStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// 持续时间（毫秒）
    pub duration_ms: i64,
}

impl DispatchReport {
    pub fn new(
        command_id: CommandId,
        instance_id: impl Into<String>,
        status: InvocationStatus,
        started_at: DateTime<Utc>,
    ) -> Self {
        let finished_at = Utc::now();
        Self {
            command_id,
            instance_id: instance_id.into(),
            status,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
        }
    }
}
