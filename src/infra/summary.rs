//! CI 步骤摘要写入
//!
//! 摘要文件可能同时被流水线其他步骤写入，这里只追加，不截断

use std::fmt::Display;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::domain::deploy::{CommandId, InvocationOutput};

/// 摘要写入器
///
/// 每次写入都重新以追加模式打开文件，写完即关闭
#[derive(Clone, Debug)]
pub struct SummaryWriter {
    path: PathBuf,
}

impl SummaryWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一段文本
    pub async fn append(&self, text: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await
    }

    pub async fn record_command_id(&self, command_id: &CommandId) -> std::io::Result<()> {
        self.append(&command_id_line(command_id)).await
    }

    pub async fn record_error(&self, error: &dyn Display) -> std::io::Result<()> {
        self.append(&error_line(error)).await
    }

    /// 写入执行结果；stderr 非空时追加错误日志段
    pub async fn record_output(&self, output: &InvocationOutput) -> std::io::Result<()> {
        let mut text = results_section(&output.stdout);
        if output.has_stderr() {
            text.push_str(&error_logs_section(&output.stderr));
        }
        self.append(&text).await
    }
}

pub fn command_id_line(command_id: &CommandId) -> String {
    format!("command_id='{}'\n", command_id)
}

pub fn error_line(error: &dyn Display) -> String {
    format!("error: {}\n", error)
}

pub fn results_section(stdout: &str) -> String {
    format!("\n# Execute Results\n\n{}\n", stdout)
}

pub fn error_logs_section(stderr: &str) -> String {
    format!("\n# Error Logs\n\n```\n\n{}\n\n```\n\n", stderr)
}
