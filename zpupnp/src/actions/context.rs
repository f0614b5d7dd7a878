use crate::soap::{SoapAction, SoapArgument, SoapValue};
use crate::state_variables::VariableStore;

use super::ActionError;

/// Vue d'un handler sur la requête en cours et sur le store de son service.
///
/// Les conversions d'arguments se font ici : un argument absent donne
/// [`ActionError::InvalidArgs`] (402), une valeur non conforme à son
/// `xsi:type` donne [`ActionError::InvalidValue`] (600).
pub struct ActionContext<'a> {
    request: &'a SoapAction,
    store: &'a mut VariableStore,
}

impl<'a> ActionContext<'a> {
    pub fn new(request: &'a SoapAction, store: &'a mut VariableStore) -> Self {
        Self { request, store }
    }

    pub fn request(&self) -> &SoapAction {
        self.request
    }

    pub fn arg(&self, name: &str) -> Result<&SoapArgument, ActionError> {
        self.request
            .arg(name)
            .ok_or_else(|| ActionError::InvalidArgs(format!("missing argument {}", name)))
    }

    pub fn value(&self, name: &str) -> Result<SoapValue, ActionError> {
        Ok(self.arg(name)?.decode()?)
    }

    /// Texte de l'argument, quel que soit son type déclaré.
    pub fn text(&self, name: &str) -> Result<String, ActionError> {
        Ok(self.value(name)?.to_string())
    }

    pub fn int(&self, name: &str) -> Result<i64, ActionError> {
        match self.value(name)? {
            SoapValue::Int(i) => Ok(i),
            SoapValue::Text(s) => s.trim().parse().map_err(|_| invalid(name, &s, "integer")),
            other => Err(invalid(name, &other.to_string(), "integer")),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, ActionError> {
        match self.value(name)? {
            SoapValue::Bool(b) => Ok(b),
            SoapValue::Int(i) if i == 0 || i == 1 => Ok(i == 1),
            SoapValue::Text(s) => match s.trim() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                _ => Err(invalid(name, &s, "boolean")),
            },
            other => Err(invalid(name, &other.to_string(), "boolean")),
        }
    }

    pub fn get(&self, variable: &str) -> Result<String, ActionError> {
        Ok(self.store.get(variable)?.to_string())
    }

    pub fn set(&mut self, variable: &str, value: impl Into<String>) -> Result<(), ActionError> {
        Ok(self.store.set(variable, value)?)
    }

    pub fn store(&self) -> &VariableStore {
        self.store
    }
}

fn invalid(name: &str, value: &str, expected: &'static str) -> ActionError {
    ActionError::InvalidValue(crate::soap::SoapValueError {
        name: name.to_string(),
        value: value.to_string(),
        expected,
    })
}
