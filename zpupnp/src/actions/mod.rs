//! # Actions UPnP
//!
//! Une [`ActionTable`] associe le nom (en minuscules) de chaque action d'un
//! service à son [`Action`] : nom canonique, arguments d'entrée attendus et
//! handler synchrone.
//!
//! Le dispatch :
//! 1. nom inconnu → [`ActionError::UnknownAction`] (401)
//! 2. arguments manquants ou inattendus, pour une action qui déclare sa
//!    liste → [`ActionError::InvalidArgs`] (402)
//! 3. exécution du handler avec un [`ActionContext`]

mod context;
mod errors;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use context::ActionContext;
pub use errors::ActionError;

use crate::soap::{ResultField, SoapAction};
use crate::state_variables::VariableStore;

/// Handler d'action : lit les arguments, lit/écrit les variables, retourne
/// les champs de la réponse.
pub type ActionHandler =
    Arc<dyn Fn(&mut ActionContext<'_>) -> Result<Vec<ResultField>, ActionError> + Send + Sync>;

#[derive(Clone)]
pub struct Action {
    name: String,
    arguments: Option<Vec<String>>,
    handler: ActionHandler,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

impl Action {
    /// Action sans contrôle de forme : tout jeu d'arguments est accepté.
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut ActionContext<'_>) -> Result<Vec<ResultField>, ActionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            arguments: None,
            handler: Arc::new(handler),
        }
    }

    /// Déclare les arguments d'entrée ; la requête doit fournir exactement
    /// ceux-là.
    pub fn with_arguments(mut self, arguments: &[&str]) -> Self {
        self.arguments = Some(arguments.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> Option<&[String]> {
        self.arguments.as_deref()
    }

    fn check_arguments(&self, request: &SoapAction) -> Result<(), ActionError> {
        let Some(expected) = &self.arguments else {
            return Ok(());
        };

        if let Some(missing) = expected.iter().find(|a| request.arg(a).is_none()) {
            return Err(ActionError::InvalidArgs(format!(
                "{}: missing argument {}",
                self.name, missing
            )));
        }

        if let Some(extra) = request
            .args
            .iter()
            .find(|a| !expected.iter().any(|e| *e == a.name))
        {
            return Err(ActionError::InvalidArgs(format!(
                "{}: unexpected argument {}",
                self.name, extra.name
            )));
        }

        Ok(())
    }

    pub fn invoke(
        &self,
        request: &SoapAction,
        store: &mut VariableStore,
    ) -> Result<Vec<ResultField>, ActionError> {
        self.check_arguments(request)?;
        let mut ctx = ActionContext::new(request, store);
        (self.handler)(&mut ctx)
    }
}

/// Table de dispatch d'un service
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    actions: HashMap<String, Action>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute une action ; une action de même nom (casse ignorée) est remplacée.
    pub fn insert(&mut self, action: Action) {
        self.actions.insert(action.name.to_lowercase(), action);
    }

    pub fn action(mut self, action: Action) -> Self {
        self.insert(action);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.values().map(|a| a.name.as_str())
    }

    /// Résout et exécute l'action décodée.
    ///
    /// Retourne le nom canonique de l'action avec ses champs de réponse.
    pub fn dispatch(
        &self,
        request: &SoapAction,
        store: &mut VariableStore,
    ) -> Result<(&str, Vec<ResultField>), ActionError> {
        let key = request.dispatch_name();
        let action = self
            .actions
            .get(&key)
            .ok_or_else(|| ActionError::UnknownAction(request.name.clone()))?;

        let fields = action.invoke(request, store)?;
        Ok((action.name(), fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soap::{SoapArgument, SoapValue, XsdType, error_codes};
    use crate::state_variables::VariableRegistry;

    fn request(name: &str, args: &[(&str, XsdType, &str)]) -> SoapAction {
        SoapAction {
            name: name.to_string(),
            namespace: None,
            args: args
                .iter()
                .map(|(n, t, v)| SoapArgument {
                    name: n.to_string(),
                    xsd_type: *t,
                    text: v.to_string(),
                })
                .collect(),
        }
    }

    fn table() -> ActionTable {
        ActionTable::new()
            .action(Action::new("GetZoneName", |ctx| {
                Ok(vec![ResultField::new("CurrentZoneName", ctx.get("ZoneName")?)])
            }))
            .action(
                Action::new("SetZoneName", |ctx| {
                    let name = ctx.text("DesiredZoneName")?;
                    ctx.set("ZoneName", name)?;
                    Ok(Vec::new())
                })
                .with_arguments(&["DesiredZoneName"]),
            )
            .action(
                Action::new("SetVolume", |ctx| {
                    let volume = ctx.int("DesiredVolume")?;
                    if !(0..=100).contains(&volume) {
                        return Err(crate::soap::SoapFault::new(
                            error_codes::ARGUMENT_VALUE_OUT_OF_RANGE,
                        )
                        .into());
                    }
                    Ok(vec![ResultField::typed("Volume", SoapValue::Int(volume))])
                })
                .with_arguments(&["DesiredVolume"]),
            )
    }

    fn store() -> VariableStore {
        Arc::new(VariableRegistry::new().evented("ZoneName", "Kitchen")).instantiate()
    }

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let table = table();
        let mut store = store();

        for name in ["GetZoneName", "getzonename", "{urn:x}GETZONENAME"] {
            let (canonical, fields) = table.dispatch(&request(name, &[]), &mut store).unwrap();
            assert_eq!(canonical, "GetZoneName");
            assert_eq!(fields, vec![ResultField::new("CurrentZoneName", "Kitchen")]);
        }
    }

    #[test]
    fn test_unknown_action_maps_to_401() {
        let err = table()
            .dispatch(&request("Play", &[]), &mut store())
            .unwrap_err();
        assert!(matches!(err, ActionError::UnknownAction(_)));
        assert_eq!(err.to_fault().code, 401);
    }

    #[test]
    fn test_argument_shape() {
        let table = table();
        let mut store = store();

        let err = table
            .dispatch(&request("SetZoneName", &[]), &mut store)
            .unwrap_err();
        assert_eq!(err.to_fault().code, 402);

        let err = table
            .dispatch(
                &request(
                    "SetZoneName",
                    &[
                        ("DesiredZoneName", XsdType::String, "Den"),
                        ("Extra", XsdType::String, "1"),
                    ],
                ),
                &mut store,
            )
            .unwrap_err();
        assert_eq!(err.to_fault().code, 402);
        assert!(!store.has_pending());

        table
            .dispatch(
                &request("SetZoneName", &[("DesiredZoneName", XsdType::String, "Den")]),
                &mut store,
            )
            .unwrap();
        assert_eq!(store.get("ZoneName").unwrap(), "Den");
        assert!(store.has_pending());
    }

    #[test]
    fn test_undeclared_arguments_are_accepted() {
        let (_, fields) = table()
            .dispatch(
                &request("GetZoneName", &[("InstanceID", XsdType::Int, "0")]),
                &mut store(),
            )
            .unwrap();
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_value_errors() {
        let table = table();
        let mut store = store();

        let err = table
            .dispatch(
                &request("SetVolume", &[("DesiredVolume", XsdType::Int, "loud")]),
                &mut store,
            )
            .unwrap_err();
        assert_eq!(err.to_fault().code, 600);

        let err = table
            .dispatch(
                &request("SetVolume", &[("DesiredVolume", XsdType::String, "250")]),
                &mut store,
            )
            .unwrap_err();
        assert_eq!(err.to_fault().code, 601);

        let (_, fields) = table
            .dispatch(
                &request("SetVolume", &[("DesiredVolume", XsdType::String, "25")]),
                &mut store,
            )
            .unwrap();
        assert_eq!(fields[0].value, "25");
    }

    #[test]
    fn test_failed_maps_to_501() {
        assert_eq!(ActionError::failed("helper").to_fault().code, 501);
    }
}
