//! Policy registry
//!
//! Maps labels to policy definitions so that policies can be checked by
//! name and referenced lazily from other definitions.

use crate::definition::PolicyDefinition;
use crate::error::{AuthorizationError, Result};
use crate::subject::short_type_name;
use convert_case::{Case, Casing};
use std::collections::HashMap;
use tracing::{info, warn};

/// Label to definition map, owned by the [`Manager`](crate::Manager)
#[derive(Debug, Default, Clone)]
pub struct PolicyRegistry {
    policies: HashMap<String, PolicyDefinition>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under its label.
    ///
    /// Unlabeled definitions are not registered and `false` is returned.
    /// A definition registered under a taken label replaces the old one.
    pub fn register(&mut self, definition: &PolicyDefinition) -> bool {
        let Some(label) = definition.label() else {
            return false;
        };

        if let Some(previous) = self.policies.insert(label.to_string(), definition.clone()) {
            if !previous.same_as(definition) {
                warn!(label = %label, "Replacing registered policy");
            }
        } else {
            info!(label = %label, "Policy registered");
        }
        true
    }

    pub fn lookup(&self, label: &str) -> Result<PolicyDefinition> {
        self.get(label)
            .cloned()
            .ok_or_else(|| AuthorizationError::PolicyNotFound {
                label: label.to_string(),
            })
    }

    pub fn get(&self, label: &str) -> Option<&PolicyDefinition> {
        self.policies.get(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.policies.contains_key(label)
    }

    /// Give `definition` a new label and register it under that label.
    ///
    /// If the definition was registered under its previous label, that
    /// entry is removed first.
    pub fn relabel(&mut self, definition: &PolicyDefinition, new_label: impl Into<String>) -> PolicyDefinition {
        let new_label = new_label.into();

        if let Some(old_label) = definition.label() {
            let registered_here = self
                .policies
                .get(old_label)
                .is_some_and(|current| current.same_as(definition));
            if registered_here {
                self.policies.remove(old_label);
            }
        }

        let relabeled = definition.clone().with_label(new_label.clone());
        info!(
            from = definition.label().unwrap_or("<none>"),
            to = %new_label,
            "Policy relabeled"
        );
        self.policies.insert(new_label, relabeled.clone());
        relabeled
    }

    /// Registered labels, sorted
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// Default label for a policy type: its snake-cased short name.
///
/// Closures and other anonymous types yield `None`.
pub(crate) fn derive_label(type_name: &str) -> Option<String> {
    let name = short_type_name(type_name);
    let starts_with_letter = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || name.contains('{') {
        return None;
    }
    Some(name.to_case(Case::Snake))
}
