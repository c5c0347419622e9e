//! Execute commands inside Alertmanager pods through the Kubernetes exec API,
//! falling back across replicas, and hand back what the command printed.

pub mod capture;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod logging;

pub use amsilence_common as models;
pub use capture::StreamCapture;
pub use config::{ExecConfig, PartialExecConfig};
pub use dispatcher::CommandDispatcher;
pub use error::{ConfigError, DispatchError, ExecError, LoggingError};
pub use executor::{with_deadline, KubePodExecutor, PodExecutor};
pub use logging::init_logging;
