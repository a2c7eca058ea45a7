//! AWS SSM Run Command 客户端
//!
//! 封装 SendCommand / GetCommandInvocation 两个调用

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ssm::config::Region;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::Client;
use tracing::{debug, info};

use crate::domain::deploy::{CommandId, InvocationOutput, InvocationStatus, SendCommandRequest};

use super::executor::{ExecutorError, RemoteExecutor};

/// SSM 执行器
#[derive(Clone)]
pub struct SsmExecutor {
    client: Client,
}

impl SsmExecutor {
    /// 使用默认凭证链创建客户端
    pub async fn from_region(region: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        info!(region = %region, "SSM client created");

        Self {
            client: Client::new(&sdk_config),
        }
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteExecutor for SsmExecutor {
    async fn send_command(&self, request: &SendCommandRequest) -> Result<CommandId, ExecutorError> {
        let mut builder = self
            .client
            .send_command()
            .document_name(&request.document_name);

        for instance_id in &request.instance_ids {
            builder = builder.instance_ids(instance_id);
        }
        for (name, values) in &request.parameters {
            builder = builder.parameters(name, values.clone());
        }

        let output = builder
            .send()
            .await
            .map_err(|e| ExecutorError::Api(DisplayErrorContext(&e).to_string()))?;

        output
            .command()
            .and_then(|command| command.command_id())
            .map(CommandId::from)
            .ok_or(ExecutorError::MissingCommandId)
    }

    async fn get_invocation(
        &self,
        command_id: &CommandId,
        instance_id: &str,
    ) -> Result<InvocationOutput, ExecutorError> {
        let result = self
            .client
            .get_command_invocation()
            .command_id(command_id.as_str())
            .instance_id(instance_id)
            .send()
            .await;

        match result {
            Ok(output) => {
                let status = output
                    .status()
                    .map(|s| InvocationStatus::from(s.as_str()))
                    .unwrap_or(InvocationStatus::Pending);

                debug!(
                    command_id = %command_id,
                    instance_id = %instance_id,
                    status = %status,
                    "Fetched command invocation"
                );

                Ok(InvocationOutput::new(
                    status,
                    output.standard_output_content().unwrap_or_default(),
                    output.standard_error_content().unwrap_or_default(),
                ))
            }
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_invocation_does_not_exist())
                    .unwrap_or(false);

                if not_found {
                    Err(ExecutorError::InvocationDoesNotExist)
                } else {
                    Err(ExecutorError::Api(DisplayErrorContext(&e).to_string()))
                }
            }
        }
    }
}
