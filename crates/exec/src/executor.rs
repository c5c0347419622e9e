use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::{Api, AttachParams};
use kube::Client;
use std::future::Future;
use std::time::Duration;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::capture::StreamCapture;
use crate::config::ExecConfig;
use crate::error::ExecError;

/// Runs one command in one pod and returns what it printed on stdout.
#[async_trait]
pub trait PodExecutor: Send + Sync {
    async fn exec(&self, pod: &str, command: &[String]) -> Result<String, ExecError>;
}

/// [`PodExecutor`] backed by the pod `exec` sub-resource of the Kubernetes API.
#[derive(Clone)]
pub struct KubePodExecutor {
    client: Client,
    namespace: String,
    container: String,
    check_exit_status: bool,
    timeout: Option<Duration>,
}

impl KubePodExecutor {
    pub fn new(client: Client, namespace: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            container: container.into(),
            check_exit_status: true,
            timeout: None,
        }
    }

    pub fn from_config(client: Client, config: &ExecConfig) -> Self {
        Self::new(client, &config.namespace, &config.container)
            .with_exit_status_check(config.check_exit_status)
            .with_timeout(config.exec_timeout_secs.map(Duration::from_secs))
    }

    /// When disabled, a command that fails remotely but streams cleanly counts as success.
    pub fn with_exit_status_check(mut self, enabled: bool) -> Self {
        self.check_exit_status = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn attach_params(&self) -> AttachParams {
        AttachParams::default()
            .container(self.container.clone())
            .stdin(false)
            .stdout(true)
            .stderr(true)
            .tty(false)
    }

    async fn run(&self, pod: &str, command: &[String]) -> Result<String, ExecError> {
        let exec_failed = |reason: String| ExecError::Exec {
            pod: pod.to_string(),
            reason,
        };

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
        let mut attached = pods
            .exec(pod, command.to_vec(), &self.attach_params())
            .await
            .map_err(|e| exec_failed(format!("failed to create executor: {e}")))?;

        let mut stdout = StreamCapture::new();
        let mut stderr = StreamCapture::new();
        let stdout_reader = attached.stdout();
        let stderr_reader = attached.stderr();
        let status = attached.take_status();

        tokio::try_join!(
            drain(stdout_reader, &mut stdout),
            drain(stderr_reader, &mut stderr),
        )
        .map_err(|e| exec_failed(format!("failed to stream output: {e}")))?;

        let status = match status {
            Some(status) => status.await,
            None => None,
        };
        attached
            .join()
            .await
            .map_err(|e| exec_failed(format!("exec session ended with error: {e}")))?;

        classify_status(pod, status, self.check_exit_status, stdout, stderr)
    }
}

/// Turns the exec channel's final status into the attempt's result.
///
/// A `Failure` status fails the attempt when `check_exit_status` is set;
/// otherwise stdout is returned and stderr is dropped.
fn classify_status(
    pod: &str,
    status: Option<Status>,
    check_exit_status: bool,
    stdout: StreamCapture,
    stderr: StreamCapture,
) -> Result<String, ExecError> {
    if let Some(status) = status {
        if status.status.as_deref() == Some("Failure") {
            let message = status
                .message
                .or(status.reason)
                .unwrap_or_else(|| "unknown failure".to_string());
            if check_exit_status {
                return Err(ExecError::NonZeroExit {
                    pod: pod.to_string(),
                    message,
                    stderr: stderr.into_string(),
                });
            }
            warn!(pod = %pod, message = %message, "Remote command reported failure, ignoring exit status.");
        }
    }

    if !stderr.is_empty() {
        debug!(pod = %pod, stderr = %stderr.contents(), "Discarding captured stderr.");
    }
    Ok(stdout.into_string())
}

/// Bounds one exec attempt. An elapsed limit is reported as an `Exec` error for `pod`.
pub async fn with_deadline<F>(
    pod: &str,
    limit: Option<Duration>,
    attempt: F,
) -> Result<String, ExecError>
where
    F: Future<Output = Result<String, ExecError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, attempt)
            .await
            .map_err(|_| ExecError::Exec {
                pod: pod.to_string(),
                reason: format!("timed out after {}s", limit.as_secs()),
            })?,
        None => attempt.await,
    }
}

async fn drain<R>(reader: Option<R>, capture: &mut StreamCapture) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(mut reader) => tokio::io::copy(&mut reader, capture).await,
        None => Ok(0),
    }
}

#[async_trait]
impl PodExecutor for KubePodExecutor {
    async fn exec(&self, pod: &str, command: &[String]) -> Result<String, ExecError> {
        info!(pod = %pod, namespace = %self.namespace, container = %self.container, "Executing command in pod.");
        with_deadline(pod, self.timeout, self.run(pod, command)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "stream reset",
            )))
        }
    }

    #[tokio::test]
    async fn test_drain_copies_reader_into_capture() {
        let mut capture = StreamCapture::new();
        let copied = drain(Some(&b"hello"[..]), &mut capture).await.unwrap();

        assert_eq!(copied, 5);
        assert_eq!(capture.contents(), "hello");
    }

    #[tokio::test]
    async fn test_drain_without_reader_leaves_capture_empty() {
        let mut capture = StreamCapture::new();
        let copied = drain(None::<&[u8]>, &mut capture).await.unwrap();

        assert_eq!(copied, 0);
        assert!(capture.is_empty());
    }

    #[tokio::test]
    async fn test_drain_propagates_stream_errors() {
        let mut capture = StreamCapture::new();
        let err = drain(Some(BrokenReader), &mut capture).await.unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn test_exec_error_names_pod() {
        let err = ExecError::NonZeroExit {
            pod: "alertmanager-main-0".to_string(),
            message: "command terminated with non-zero exit code".to_string(),
            stderr: "curl: (7)".to_string(),
        };
        assert_eq!(err.pod(), "alertmanager-main-0");
        assert!(err.to_string().contains("alertmanager-main-0"));
    }

    fn captures(out: &str, err: &str) -> (StreamCapture, StreamCapture) {
        let mut stdout = StreamCapture::new();
        let mut stderr = StreamCapture::new();
        stdout.append(out.as_bytes());
        stderr.append(err.as_bytes());
        (stdout, stderr)
    }

    fn failure_status() -> Status {
        Status {
            status: Some("Failure".to_string()),
            message: Some("command terminated with non-zero exit code: exit status 7".to_string()),
            reason: Some("NonZeroExitCode".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_failure_status_fails_attempt_with_stderr() {
        let (stdout, stderr) = captures("", "curl: (7) Failed to connect to localhost port 9093");

        let err = classify_status("alertmanager-main-0", Some(failure_status()), true, stdout, stderr)
            .unwrap_err();

        match err {
            ExecError::NonZeroExit { pod, message, stderr } => {
                assert_eq!(pod, "alertmanager-main-0");
                assert!(message.contains("exit status 7"));
                assert_eq!(stderr, "curl: (7) Failed to connect to localhost port 9093");
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[test]
    fn test_failure_status_ignored_when_check_disabled() {
        let (stdout, stderr) = captures("partial", "curl: (7)");

        let output = classify_status("alertmanager-main-0", Some(failure_status()), false, stdout, stderr)
            .unwrap();

        assert_eq!(output, "partial");
    }

    #[test]
    fn test_failure_without_message_uses_reason() {
        let status = Status {
            status: Some("Failure".to_string()),
            reason: Some("InternalError".to_string()),
            ..Default::default()
        };
        let (stdout, stderr) = captures("", "");

        let err = classify_status("am-0", Some(status), true, stdout, stderr).unwrap_err();

        assert!(matches!(err, ExecError::NonZeroExit { ref message, .. } if message == "InternalError"));
    }

    #[test]
    fn test_success_or_missing_status_returns_stdout() {
        let success = Status {
            status: Some("Success".to_string()),
            ..Default::default()
        };
        let (stdout, stderr) = captures("[]", "warning: ignored");
        assert_eq!(
            classify_status("am-0", Some(success), true, stdout, stderr).unwrap(),
            "[]"
        );

        let (stdout, stderr) = captures("{\"id\":\"1\"}", "");
        assert_eq!(
            classify_status("am-0", None, true, stdout, stderr).unwrap(),
            "{\"id\":\"1\"}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapsed_names_pod() {
        let never = std::future::pending::<Result<String, ExecError>>();

        let err = with_deadline("alertmanager-main-0", Some(Duration::from_secs(30)), never)
            .await
            .unwrap_err();

        match err {
            ExecError::Exec { pod, reason } => {
                assert_eq!(pod, "alertmanager-main-0");
                assert_eq!(reason, "timed out after 30s");
            }
            other => panic!("expected Exec error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_passes_through_finished_attempt() {
        let bounded = with_deadline("am-0", Some(Duration::from_secs(5)), async {
            Ok("done".to_string())
        })
        .await
        .unwrap();
        let unbounded = with_deadline("am-0", None, async { Ok("done".to_string()) })
            .await
            .unwrap();

        assert_eq!(bounded, "done");
        assert_eq!(unbounded, "done");
    }
}
