//! # Variables d'état
//!
//! Chaque type de service déclare une fois pour toutes sa table de variables
//! ([`VariableRegistry`]) : nom, caractère évènementiel, valeur par défaut.
//! Chaque instance de service en tire un [`VariableStore`] contenant les
//! valeurs courantes, sous forme textuelle.
//!
//! Écrire une variable évènementielle lève un drapeau de notification en
//! attente ; plusieurs écritures successives ne lèvent qu'un seul drapeau,
//! consommé par [`VariableStore::take_pending`].
//!
//! ```
//! use std::sync::Arc;
//! use zpupnp::state_variables::VariableRegistry;
//!
//! let registry = Arc::new(
//!     VariableRegistry::new()
//!         .evented("ZoneName", "Kitchen")
//!         .variable("TransportState", "STOPPED"),
//! );
//!
//! let mut store = registry.instantiate();
//! store.set("ZoneName", "Bathroom").unwrap();
//! store.set("TransportState", "PLAYING").unwrap();
//!
//! assert!(store.take_pending());
//! assert!(!store.take_pending());
//! assert_eq!(store.evented_values(), vec![("ZoneName", "Bathroom")]);
//! ```

mod errors;

use std::collections::HashMap;
use std::sync::Arc;

pub use errors::StateVariableError;

/// Description statique d'une variable d'état
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDescriptor {
    pub name: String,
    pub evented: bool,
    pub default: String,
}

impl VariableDescriptor {
    pub fn new(name: impl Into<String>, evented: bool, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            evented,
            default: default.into(),
        }
    }
}

/// Table des variables d'un type de service, dans l'ordre de déclaration.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    descriptors: Vec<VariableDescriptor>,
    index: HashMap<String, usize>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Déclare une variable ; un nom déjà présent est refusé.
    pub fn register(&mut self, descriptor: VariableDescriptor) -> Result<(), StateVariableError> {
        if self.index.contains_key(&descriptor.name) {
            return Err(StateVariableError::DuplicateVariable(descriptor.name));
        }
        self.index
            .insert(descriptor.name.clone(), self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Déclaration chaînée d'une variable évènementielle.
    ///
    /// Les tables sont statiques : une double déclaration est un bug du
    /// service, signalé en debug et ignorée en release.
    pub fn evented(self, name: &str, default: impl Into<String>) -> Self {
        self.declare(VariableDescriptor::new(name, true, default))
    }

    /// Déclaration chaînée d'une variable non évènementielle.
    pub fn variable(self, name: &str, default: impl Into<String>) -> Self {
        self.declare(VariableDescriptor::new(name, false, default))
    }

    fn declare(mut self, descriptor: VariableDescriptor) -> Self {
        if let Err(e) = self.register(descriptor) {
            debug_assert!(false, "{}", e);
            tracing::error!("❌ {}", e);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&VariableDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn descriptors(&self) -> &[VariableDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn has_evented(&self) -> bool {
        self.descriptors.iter().any(|d| d.evented)
    }

    /// Crée un store initialisé aux valeurs par défaut.
    pub fn instantiate(self: &Arc<Self>) -> VariableStore {
        VariableStore {
            registry: Arc::clone(self),
            values: self.descriptors.iter().map(|d| d.default.clone()).collect(),
            pending: false,
        }
    }
}

/// Valeurs courantes des variables d'une instance de service
#[derive(Debug, Clone)]
pub struct VariableStore {
    registry: Arc<VariableRegistry>,
    values: Vec<String>,
    pending: bool,
}

impl VariableStore {
    fn position(&self, name: &str) -> Result<usize, StateVariableError> {
        self.registry
            .index
            .get(name)
            .copied()
            .ok_or_else(|| StateVariableError::UnknownVariable(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<&str, StateVariableError> {
        let i = self.position(name)?;
        Ok(&self.values[i])
    }

    /// Remplace la valeur ; une variable évènementielle lève le drapeau de
    /// notification, même si la valeur ne change pas.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), StateVariableError> {
        let i = self.position(name)?;
        self.values[i] = value.into();
        if self.registry.descriptors[i].evented {
            self.pending = true;
        }
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Consomme le drapeau de notification.
    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Valeurs courantes des variables évènementielles, ordre de déclaration.
    pub fn evented_values(&self) -> Vec<(&str, &str)> {
        self.registry
            .descriptors
            .iter()
            .zip(&self.values)
            .filter(|(d, _)| d.evented)
            .map(|(d, v)| (d.name.as_str(), v.as_str()))
            .collect()
    }

    pub fn registry(&self) -> &Arc<VariableRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<VariableRegistry> {
        Arc::new(
            VariableRegistry::new()
                .evented("AudioInputName", "SonosCast")
                .variable("TransportState", "STOPPED")
                .evented("LineInConnected", "1"),
        )
    }

    #[test]
    fn test_instantiate_seeds_defaults() {
        let store = registry().instantiate();
        assert_eq!(store.get("AudioInputName").unwrap(), "SonosCast");
        assert_eq!(store.get("TransportState").unwrap(), "STOPPED");
        assert!(!store.has_pending());
    }

    #[test]
    fn test_unknown_variable() {
        let mut store = registry().instantiate();
        assert_eq!(
            store.get("Volume"),
            Err(StateVariableError::UnknownVariable("Volume".into()))
        );
        assert!(store.set("Volume", "10").is_err());
        assert!(!store.has_pending());
    }

    #[test]
    fn test_duplicate_registration() {
        let mut reg = VariableRegistry::new();
        reg.register(VariableDescriptor::new("Icon", true, "")).unwrap();
        let err = reg
            .register(VariableDescriptor::new("Icon", false, "x"))
            .unwrap_err();
        assert_eq!(err, StateVariableError::DuplicateVariable("Icon".into()));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_non_evented_write_does_not_raise_flag() {
        let mut store = registry().instantiate();
        store.set("TransportState", "PLAYING").unwrap();
        assert!(!store.has_pending());
        assert_eq!(store.get("TransportState").unwrap(), "PLAYING");
    }

    #[test]
    fn test_writes_coalesce() {
        let mut store = registry().instantiate();
        store.set("AudioInputName", "Line").unwrap();
        store.set("LineInConnected", "0").unwrap();
        store.set("AudioInputName", "Line").unwrap();

        assert!(store.take_pending());
        assert!(!store.take_pending());
        assert_eq!(
            store.evented_values(),
            vec![("AudioInputName", "Line"), ("LineInConnected", "0")]
        );
    }

    #[test]
    fn test_stores_are_independent() {
        let reg = registry();
        let mut a = reg.instantiate();
        let b = reg.instantiate();
        a.set("LineInConnected", "0").unwrap();
        assert_eq!(b.get("LineInConnected").unwrap(), "1");
    }
}
