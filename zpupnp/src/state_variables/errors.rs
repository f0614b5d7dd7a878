use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateVariableError {
    /// Nom non déclaré : erreur de programmation, jamais exposée sur le réseau
    #[error("Unknown state variable: {0}")]
    UnknownVariable(String),

    #[error("State variable declared twice: {0}")]
    DuplicateVariable(String),
}
