use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// By-type registry for optional integrations.
///
/// Values are keyed by their concrete type and become read-only once the
/// server starts accepting connections; every request carries a cheap clone
/// of the registry.
#[derive(Default, Debug, Clone)]
pub struct Plugins {
    entries: Arc<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl Plugins {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(HashMap::new()),
        }
    }

    pub(crate) fn insert<T: 'static + Send + Sync>(&mut self, value: T) {
        Arc::get_mut(&mut self.entries)
            .expect("plugins are frozen once the server is running")
            .insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker(&'static str);

    #[test]
    fn stores_and_returns_values_by_type() {
        let mut plugins = Plugins::new();
        plugins.insert(Marker("agent"));

        assert_eq!(plugins.get::<Marker>().map(|m| m.0), Some("agent"));
        assert!(plugins.get::<String>().is_none());
    }
}
