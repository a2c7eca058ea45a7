//! Remote deploy script
//!
//! Builds the shell script that runs on the target host: registry login,
//! image pull, container replacement, and a short status dump.

use crate::config::env::constants::{LOG_TAIL_LINES, SERVICE_PORT};
use crate::config::DeployConfig;

/// One titled group of shell lines
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteStep {
    /// Echoed before the commands run
    pub title: Option<String>,
    pub commands: Vec<String>,
}

impl RemoteStep {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            commands: Vec::new(),
        }
    }

    pub fn untitled() -> Self {
        Self {
            title: None,
            commands: Vec::new(),
        }
    }

    pub fn run(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    /// Run a command whose failure must not abort the script
    pub fn run_allow_failure(self, command: impl Into<String>) -> Self {
        let command = command.into();
        self.run(format!("{} || true", command))
    }
}

/// Ordered list of steps rendered into one `set -e` bash script
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteScript {
    steps: Vec<RemoteStep>,
}

impl RemoteScript {
    pub fn new(steps: Vec<RemoteStep>) -> Self {
        Self { steps }
    }

    /// The pull-and-restart script for one container
    pub fn for_deploy(config: &DeployConfig) -> Self {
        let name = &config.container_name;
        let image = &config.image_name;
        let registry = &config.registry_host;

        let run_container = [
            "docker run -d".to_string(),
            format!("--name {}", name),
            format!("-p {}:{}", config.container_port, SERVICE_PORT),
            "--restart unless-stopped".to_string(),
            image.to_string(),
        ]
        .join(" \\\n  ");

        Self::new(vec![
            RemoteStep::new(format!("## Start deployment script for {}.", name)),
            RemoteStep::new("### docker login...").run(format!(
                "aws ecr get-login-password --region {} | docker login --username AWS --password-stdin {}",
                config.region, registry
            )),
            RemoteStep::new("### docker pull...").run(format!("docker pull {}", image)),
            RemoteStep::new("### Stopping and removing existing container...")
                .run_allow_failure(format!("docker stop {}", name))
                .run_allow_failure(format!("docker rm {}", name)),
            RemoteStep::new("### Starting new container...").run(run_container),
            RemoteStep::new("### Show running containers...")
                .run(format!("docker ps --filter \"name={}\"", name)),
            RemoteStep::new(format!(
                "### Show container logs (last {} lines)...",
                LOG_TAIL_LINES
            ))
            .run(format!("docker logs --tail {} {}", LOG_TAIL_LINES, name)),
            RemoteStep::untitled().run(format!(
                "echo \"Latest image digest: {}\"",
                config.manifest_digest
            )),
            RemoteStep::new("### docker logout...").run(format!("docker logout {}", registry)),
            RemoteStep::new("## Deployment script completed."),
        ])
    }

    pub fn steps(&self) -> &[RemoteStep] {
        &self.steps
    }

    pub fn render(&self) -> String {
        let mut out = String::from("#!/bin/bash\nset -e\n");
        for step in &self.steps {
            out.push('\n');
            if let Some(ref title) = step.title {
                out.push_str(&format!("echo \"{}\"\n", title));
            }
            for command in &step.commands {
                out.push_str(command);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scenario_config() -> DeployConfig {
        DeployConfig {
            instance_id: "i-123".to_string(),
            summary_path: PathBuf::from("/tmp/summary.md"),
            region: "us-east-1".to_string(),
            registry_host: "acct.dkr.ecr.us-east-1.amazonaws.com".to_string(),
            image_name: "acct.dkr.ecr.us-east-1.amazonaws.com/repo:tag".to_string(),
            manifest_digest: "sha256:abcd".to_string(),
            app_dir: "/app".to_string(),
            deploy_dirname: "angple".to_string(),
            container_name: "myapp".to_string(),
            container_port: 8080,
        }
    }

    #[test]
    fn test_script_substitutes_values() {
        let script = RemoteScript::for_deploy(&scenario_config()).render();

        assert!(script.starts_with("#!/bin/bash\nset -e\n"));
        assert!(script.contains(
            "aws ecr get-login-password --region us-east-1 | docker login --username AWS --password-stdin acct.dkr.ecr.us-east-1.amazonaws.com"
        ));
        assert!(script.contains("docker pull acct.dkr.ecr.us-east-1.amazonaws.com/repo:tag\n"));
        assert!(script.contains("--name myapp"));
        assert!(script.contains("-p 8080:3000"));
        assert!(script.contains("--restart unless-stopped"));
        assert!(script.contains("docker ps --filter \"name=myapp\""));
        assert!(script.contains("docker logs --tail 20 myapp"));
        assert!(script.contains("echo \"Latest image digest: sha256:abcd\""));
        assert!(script.contains("docker logout acct.dkr.ecr.us-east-1.amazonaws.com"));
        assert!(!script.contains("${"));
    }

    #[test]
    fn test_docker_run_block() {
        let script = RemoteScript::for_deploy(&scenario_config()).render();
        let expected = "docker run -d \\\n  --name myapp \\\n  -p 8080:3000 \\\n  --restart unless-stopped \\\n  acct.dkr.ecr.us-east-1.amazonaws.com/repo:tag\n";
        assert!(script.contains(expected), "script was:\n{}", script);
    }

    #[test]
    fn test_replacing_absent_container_does_not_abort() {
        let script = RemoteScript::for_deploy(&scenario_config()).render();
        assert!(script.contains("docker stop myapp || true\n"));
        assert!(script.contains("docker rm myapp || true\n"));

        // stop/rm must come before run
        let stop = script.find("docker stop").unwrap();
        let run = script.find("docker run").unwrap();
        assert!(stop < run);
    }

    #[test]
    fn test_step_order() {
        let script = RemoteScript::for_deploy(&scenario_config());
        let titles: Vec<_> = script
            .steps()
            .iter()
            .filter_map(|s| s.title.as_deref())
            .collect();
        assert_eq!(titles.first(), Some(&"## Start deployment script for myapp."));
        assert_eq!(titles.last(), Some(&"## Deployment script completed."));
        assert_eq!(script.steps().len(), 10);
    }

    #[test]
    fn test_render_custom_steps() {
        let script = RemoteScript::new(vec![
            RemoteStep::new("hello").run("true"),
            RemoteStep::untitled().run_allow_failure("false"),
        ]);
        assert_eq!(
            script.render(),
            "#!/bin/bash\nset -e\n\necho \"hello\"\ntrue\n\nfalse || true\n"
        );
    }
}
