use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Events that belong to no single subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    Warning {
        message: String,
        context: Option<String>,
    },

    /// A step outside any repository failed, e.g. listing the registry
    OperationFailed {
        operation: String,
        failure: FailureContext,
    },
}
