use thiserror::Error;

use crate::soap::{SoapFault, SoapValueError, error_codes};
use crate::state_variables::StateVariableError;

/// Échec d'une action, converti en fault UPnP à la frontière du service.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Argument error: {0}")]
    InvalidArgs(String),

    #[error(transparent)]
    InvalidValue(#[from] SoapValueError),

    #[error(transparent)]
    Fault(#[from] SoapFault),

    #[error("Action failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Variable(#[from] StateVariableError),
}

impl ActionError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ActionError::Failed(reason.into())
    }

    /// Fault émis sur le réseau.
    ///
    /// Une variable inconnue est un bug du service : elle déclenche une
    /// assertion en debug et devient un 501 générique sinon.
    pub fn to_fault(&self) -> SoapFault {
        match self {
            ActionError::UnknownAction(_) => SoapFault::new(error_codes::INVALID_ACTION),
            ActionError::InvalidArgs(_) => SoapFault::new(error_codes::INVALID_ARGS),
            ActionError::InvalidValue(_) => SoapFault::new(error_codes::ARGUMENT_VALUE_INVALID),
            ActionError::Fault(fault) => fault.clone(),
            ActionError::Failed(_) => SoapFault::new(error_codes::ACTION_FAILED),
            ActionError::Variable(e) => {
                debug_assert!(false, "{}", e);
                SoapFault::new(error_codes::ACTION_FAILED)
            }
        }
    }
}

impl From<std::io::Error> for ActionError {
    fn from(err: std::io::Error) -> Self {
        ActionError::Failed(format!("IO error: {}", err))
    }
}
