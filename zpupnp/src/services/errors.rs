use thiserror::Error;

use crate::state_variables::StateVariableError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Variable(#[from] StateVariableError),

    #[error("XML encoding error: {0}")]
    Xml(#[from] xmltree::Error),
}
