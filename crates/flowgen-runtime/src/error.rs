use flowgen_core::{ContractError, SchemaError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("settings resolution failed for {contract}.{field}: {reason}")]
    SettingsResolution {
        contract: String,
        field: String,
        reason: String,
    },

    #[error("handler '{handler}' settings could not be resolved: {source}")]
    HandlerResolution {
        handler: String,
        #[source]
        source: Box<RuntimeError>,
    },

    #[error("artifact already registered: {0}")]
    RegistrationConflict(String),

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("handler not found: {0}")]
    HandlerNotFound(String),

    #[error("{artifact}: cannot {action} while {state}")]
    InvalidTransition {
        artifact: String,
        action: &'static str,
        state: String,
    },

    #[error("evaluation failed: {0}")]
    Eval(String),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
