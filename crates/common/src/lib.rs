pub mod models;

pub use models::{
    decode_alerts, decode_silence, decode_silences, Alert, AlertAnnotations, AlertLabels,
    AlertStatus, Silence, SilenceId, SilenceMatcher, SilenceStatus,
};
