//! 远程部署派发
//!
//! 提交脚本 → 轮询 → 拉取输出写入摘要。无论轮询成功与否都会写入输出，
//! 轮询失败在写入之后再返回

pub mod script;
pub mod waiter;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::{DeployConfig, PollPolicy};
use crate::domain::deploy::{CommandId, DispatchReport, SendCommandRequest};
use crate::error::DeployError;
use crate::infra::{RemoteExecutor, SummaryWriter};

pub use script::{RemoteScript, RemoteStep};
pub use waiter::wait_for_command;

/// 根据配置构建 SendCommand 请求
pub fn build_request(config: &DeployConfig) -> SendCommandRequest {
    let script = RemoteScript::for_deploy(config).render();
    SendCommandRequest::shell_script(config.instance_id.as_str(), script)
}

/// 执行一次远程部署
///
/// 命令 ID 提交后立即写入摘要；轮询失败时先写 `error:` 行，
/// 再拉取输出，最后返回轮询错误
pub async fn dispatch<E>(
    executor: &E,
    config: &DeployConfig,
    summary: &SummaryWriter,
    policy: PollPolicy,
) -> Result<DispatchReport, DeployError>
where
    E: RemoteExecutor + ?Sized,
{
    let request = build_request(config);
    let instance_id = config.instance_id.as_str();
    let started_at = Utc::now();

    info!(
        instance_id = %instance_id,
        image = %config.image_name,
        container = %config.container_name,
        deploy_path = %config.deploy_path(),
        "Submitting remote deploy command"
    );

    let command_id = executor
        .send_command(&request)
        .await
        .map_err(DeployError::Submit)?;

    info!(command_id = %command_id, instance_id = %instance_id, "Command submitted");
    summary.record_command_id(&command_id).await?;

    let waited = wait_for_command(executor, &command_id, instance_id, policy).await;

    if let Err(ref e) = waited {
        error!(command_id = %command_id, error = %e, "Remote command did not succeed");
        if let Err(io) = summary.record_error(e).await {
            warn!(error = %io, "Failed to record poll error in step summary");
        }
    }

    let reported = report_output(executor, &command_id, instance_id, summary).await;

    let status = match (waited, reported) {
        (Err(poll_err), reported) => {
            if let Err(e) = reported {
                warn!(command_id = %command_id, error = %e, "Output report also failed");
            }
            return Err(poll_err);
        }
        (Ok(_), Err(e)) => return Err(e),
        (Ok(status), Ok(())) => status,
    };

    let report = DispatchReport::new(command_id, instance_id, status, started_at);
    info!(
        command_id = %report.command_id,
        status = %report.status,
        duration_ms = report.duration_ms,
        "Remote deploy finished"
    );

    Ok(report)
}

/// 拉取一次输出并写入摘要
///
/// 拉取失败时把错误写入摘要后返回
async fn report_output<E>(
    executor: &E,
    command_id: &CommandId,
    instance_id: &str,
    summary: &SummaryWriter,
) -> Result<(), DeployError>
where
    E: RemoteExecutor + ?Sized,
{
    match executor.get_invocation(command_id, instance_id).await {
        Ok(output) => {
            if output.has_stderr() {
                warn!(
                    command_id = %command_id,
                    stderr_bytes = output.stderr.len(),
                    "Remote command wrote to stderr"
                );
            }
            summary.record_output(&output).await?;
            Ok(())
        }
        Err(e) => {
            let err = DeployError::Fetch(e);
            error!(command_id = %command_id, error = %err, "Failed to fetch command output");
            if let Err(io) = summary.record_error(&err).await {
                warn!(error = %io, "Failed to record fetch error in step summary");
            }
            Err(err)
        }
    }
}
