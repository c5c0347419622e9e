use kube::Client;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::ExecConfig;
use crate::error::{DispatchError, ExecError};
use crate::executor::{KubePodExecutor, PodExecutor};

/// Runs a command against an ordered list of Alertmanager pods and returns
/// the output of the first one that succeeds.
///
/// Targets are tried one after another, never concurrently. Later targets are
/// only reached when every earlier one has failed.
#[derive(Clone)]
pub struct CommandDispatcher {
    executor: Arc<dyn PodExecutor>,
    targets: Vec<String>,
}

impl CommandDispatcher {
    pub fn new(executor: Arc<dyn PodExecutor>, targets: Vec<String>) -> Self {
        Self { executor, targets }
    }

    pub fn from_config(client: Client, config: &ExecConfig) -> Self {
        let executor = KubePodExecutor::from_config(client, config);
        Self::new(Arc::new(executor), config.targets.clone())
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub async fn dispatch(&self, command: &[String]) -> Result<String, DispatchError> {
        let mut last_error: Option<ExecError> = None;

        for (attempt, pod) in self.targets.iter().enumerate() {
            match self.executor.exec(pod, command).await {
                Ok(output) => {
                    info!(pod = %pod, attempt = attempt + 1, "Command executed successfully.");
                    return Ok(output);
                }
                Err(e) => {
                    warn!(pod = %pod, error = %e, "Exec failed, trying next target.");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(source) => {
                error!(
                    targets = ?self.targets,
                    error = %source,
                    "Exec failed on every target. Please put silence manually."
                );
                Err(DispatchError::AllTargetsFailed {
                    attempts: self.targets.len(),
                    source,
                })
            }
            None => Err(DispatchError::NoTargets),
        }
    }
}
