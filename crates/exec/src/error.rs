use thiserror::Error;

/// Failure of a single exec attempt against one pod.
#[derive(Error, Debug)]
pub enum ExecError {
    // Covers both "could not start the exec session" and "the stream broke".
    #[error("Exec in pod {pod} failed: {reason}")]
    Exec { pod: String, reason: String },
    #[error("Command in pod {pod} exited with failure: {message}")]
    NonZeroExit {
        pod: String,
        message: String,
        stderr: String,
    },
}

impl ExecError {
    pub fn pod(&self) -> &str {
        match self {
            ExecError::Exec { pod, .. } | ExecError::NonZeroExit { pod, .. } => pod,
        }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("No exec targets configured")]
    NoTargets,
    #[error("Exec failed on all {attempts} targets, last error: {source}")]
    AllTargetsFailed {
        attempts: usize,
        #[source]
        source: ExecError,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}
