//! Bounded wait for a remote command to reach a terminal state
//!
//! Probes immediately, then sleeps `policy.delay` between probes, for at
//! most `policy.max_attempts` probes. Same acceptors as the SSM
//! `CommandExecuted` waiter.

use tracing::{debug, warn};

use crate::config::PollPolicy;
use crate::domain::deploy::{CommandId, InvocationStatus};
use crate::error::DeployError;
use crate::infra::{ExecutorError, RemoteExecutor};

/// Wait until the command succeeds on `instance_id`
///
/// Returns the final status on success; failure statuses, API errors and
/// an exhausted budget are all errors.
pub async fn wait_for_command<E>(
    executor: &E,
    command_id: &CommandId,
    instance_id: &str,
    policy: PollPolicy,
) -> Result<InvocationStatus, DeployError>
where
    E: RemoteExecutor + ?Sized,
{
    for attempt in 1..=policy.max_attempts {
        match executor.get_invocation(command_id, instance_id).await {
            Ok(invocation) if invocation.status.is_success() => {
                debug!(command_id = %command_id, attempt = attempt, "Command succeeded");
                return Ok(invocation.status);
            }
            Ok(invocation) if invocation.status.is_failure() => {
                warn!(
                    command_id = %command_id,
                    status = %invocation.status,
                    attempt = attempt,
                    "Command reached a failure state"
                );
                return Err(DeployError::CommandFailed {
                    command_id: command_id.clone(),
                    status: invocation.status,
                });
            }
            Ok(invocation) => {
                debug!(
                    command_id = %command_id,
                    status = %invocation.status,
                    attempt = attempt,
                    "Command still running"
                );
            }
            // 刚提交的命令在目标主机上可能还查不到
            Err(ExecutorError::InvocationDoesNotExist) => {
                debug!(command_id = %command_id, attempt = attempt, "Invocation not registered yet");
            }
            Err(e) => return Err(DeployError::Poll(e)),
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(DeployError::WaitTimeout {
        command_id: command_id.clone(),
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deploy::InvocationOutput;
    use crate::infra::executor::fake::ScriptedExecutor;
    use std::time::Duration;

    fn policy() -> PollPolicy {
        PollPolicy::new(Duration::from_secs(5), 10)
    }

    fn status(s: InvocationStatus) -> Result<InvocationOutput, ExecutorError> {
        Ok(InvocationOutput::status_only(s))
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_through_pending_states() {
        let executor = ScriptedExecutor::new("cmd-1")
            .then(Err(ExecutorError::InvocationDoesNotExist))
            .then(status(InvocationStatus::Pending))
            .then(status(InvocationStatus::InProgress))
            .then(status(InvocationStatus::Success));

        let started = tokio::time::Instant::now();
        let result =
            wait_for_command(&executor, &CommandId::new("cmd-1"), "i-123", policy()).await;

        assert_eq!(result.unwrap(), InvocationStatus::Success);
        assert_eq!(executor.invocation_calls(), 4);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(15) && elapsed < Duration::from_secs(16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_budget() {
        let executor = ScriptedExecutor::new("cmd-1").then(status(InvocationStatus::InProgress));

        let started = tokio::time::Instant::now();
        let result =
            wait_for_command(&executor, &CommandId::new("cmd-1"), "i-123", policy()).await;

        assert!(matches!(
            result,
            Err(DeployError::WaitTimeout { attempts: 10, .. })
        ));
        assert_eq!(executor.invocation_calls(), 10);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(45) && elapsed < Duration::from_secs(46));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_status_stops_polling() {
        let executor = ScriptedExecutor::new("cmd-1")
            .then(status(InvocationStatus::InProgress))
            .then(status(InvocationStatus::Failed));

        let result =
            wait_for_command(&executor, &CommandId::new("cmd-1"), "i-123", policy()).await;

        match result {
            Err(DeployError::CommandFailed { status, .. }) => {
                assert_eq!(status, InvocationStatus::Failed)
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(executor.invocation_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_api_error_is_fatal() {
        let executor = ScriptedExecutor::new("cmd-1")
            .then(Err(ExecutorError::Api("AccessDenied".into())));

        let result =
            wait_for_command(&executor, &CommandId::new("cmd-1"), "i-123", policy()).await;

        assert!(matches!(result, Err(DeployError::Poll(ExecutorError::Api(_)))));
        assert_eq!(executor.invocation_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_keeps_polling() {
        let executor = ScriptedExecutor::new("cmd-1")
            .then(status(InvocationStatus::Unknown("Queued".into())))
            .then(status(InvocationStatus::Success));

        let result =
            wait_for_command(&executor, &CommandId::new("cmd-1"), "i-123", policy()).await;
        assert!(result.is_ok());
    }
}
