//! Subject policy maps
//!
//! Each subject type declares, exactly once, which policy guards each of
//! its actions. A `default` entry catches every action without its own
//! entry.

use crate::definition::PolicyDefinition;
use crate::error::{AuthorizationError, Result};
use crate::subject::{short_type_name, Protectable};
use std::any::{type_name, TypeId};
use std::collections::HashMap;

/// Action name of the fallback entry
pub const DEFAULT_ACTION: &str = "default";

/// Action to policy map of one subject type
#[derive(Debug, Clone, Default)]
pub struct PolicyMap {
    actions: HashMap<String, PolicyDefinition>,
}

impl PolicyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style entry for `action`
    pub fn action(mut self, action: impl Into<String>, definition: PolicyDefinition) -> Self {
        self.actions.insert(action.into(), definition);
        self
    }

    /// Builder-style `default` entry
    pub fn default_policy(self, definition: PolicyDefinition) -> Self {
        self.action(DEFAULT_ACTION, definition)
    }

    pub fn get(&self, action: &str) -> Option<&PolicyDefinition> {
        self.actions.get(action)
    }

    pub fn has_default(&self) -> bool {
        self.actions.contains_key(DEFAULT_ACTION)
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Policy responsible for `action`, falling back to `default`
    pub fn resolve(&self, action: &str) -> Option<&PolicyDefinition> {
        self.get(action).or_else(|| self.get(DEFAULT_ACTION))
    }
}

/// A single policy guards every action
impl From<PolicyDefinition> for PolicyMap {
    fn from(definition: PolicyDefinition) -> Self {
        PolicyMap::new().default_policy(definition)
    }
}

impl<K: Into<String>> FromIterator<(K, PolicyDefinition)> for PolicyMap {
    fn from_iter<I: IntoIterator<Item = (K, PolicyDefinition)>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct SubjectEntry {
    type_name: &'static str,
    map: PolicyMap,
}

/// Policy maps of every declared subject type
#[derive(Debug, Clone, Default)]
pub struct SubjectPolicyMaps {
    maps: HashMap<TypeId, SubjectEntry>,
}

impl SubjectPolicyMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the map of subject type `S`; a second declaration fails
    pub fn declare<S: Protectable>(&mut self, map: PolicyMap) -> Result<()> {
        let type_name = type_name::<S>();
        if self.maps.contains_key(&TypeId::of::<S>()) {
            return Err(AuthorizationError::PolicyMapRedeclared {
                subject_type: short_type_name(type_name).to_string(),
            });
        }

        self.maps.insert(TypeId::of::<S>(), SubjectEntry { type_name, map });
        Ok(())
    }

    pub fn is_declared<S: Protectable>(&self) -> bool {
        self.maps.contains_key(&TypeId::of::<S>())
    }

    pub fn map_for(&self, subject: &dyn Protectable) -> Option<&PolicyMap> {
        self.maps.get(&subject.concrete_type_id()).map(|entry| &entry.map)
    }

    /// Policy guarding `action` on `subject`
    pub fn resolve_action(&self, subject: &dyn Protectable, action: &str) -> Result<PolicyDefinition> {
        resolve_in(
            self.maps.get(&subject.concrete_type_id()),
            subject.type_name(),
            action,
        )
    }

    /// Policy guarding `action` on subjects of type `S`
    pub fn resolve_action_for<S: Protectable>(&self, action: &str) -> Result<PolicyDefinition> {
        resolve_in(self.maps.get(&TypeId::of::<S>()), type_name::<S>(), action)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

fn resolve_in(entry: Option<&SubjectEntry>, type_name: &str, action: &str) -> Result<PolicyDefinition> {
    let Some(entry) = entry else {
        return Err(AuthorizationError::ActionsNotDeclared {
            subject_type: short_type_name(type_name).to_string(),
            action: action.to_string(),
        });
    };

    entry
        .map
        .resolve(action)
        .cloned()
        .ok_or_else(|| AuthorizationError::ActionNotFound {
            subject_type: short_type_name(entry.type_name).to_string(),
            action: action.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Verdict;
    use crate::params::Params;

    #[derive(Debug)]
    struct User;

    #[derive(Debug)]
    struct Post;

    impl Protectable for Post {
        fn subject_id(&self) -> String {
            "post".into()
        }
    }

    #[derive(Debug)]
    struct Comment;

    impl Protectable for Comment {
        fn subject_id(&self) -> String {
            "comment".into()
        }
    }

    fn labeled(label: &str) -> PolicyDefinition {
        PolicyDefinition::from_fn(|_: &User, _: &Post, _: &Params| Ok(Verdict::allow())).with_label(label)
    }

    #[test]
    fn test_undeclared_subject_type() {
        let maps = SubjectPolicyMaps::new();
        let err = maps.resolve_action(&Post, "read").unwrap_err();
        assert_eq!(
            err,
            AuthorizationError::ActionsNotDeclared {
                subject_type: "Post".into(),
                action: "read".into(),
            }
        );
    }

    #[test]
    fn test_action_without_default() {
        let mut maps = SubjectPolicyMaps::new();
        maps.declare::<Post>(PolicyMap::new().action("read", labeled("reader")))
            .unwrap();

        assert_eq!(maps.resolve_action(&Post, "read").unwrap().label(), Some("reader"));
        let err = maps.resolve_action(&Post, "write").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Post doesn't have an authorization action called :write nor a :default policy"
        );
    }

    #[test]
    fn test_default_fallback() {
        let mut maps = SubjectPolicyMaps::new();
        maps.declare::<Post>(
            PolicyMap::new()
                .action("read", labeled("reader"))
                .default_policy(labeled("admin")),
        )
        .unwrap();

        assert_eq!(maps.resolve_action(&Post, "read").unwrap().label(), Some("reader"));
        assert_eq!(maps.resolve_action(&Post, "destroy").unwrap().label(), Some("admin"));
    }

    #[test]
    fn test_single_policy_becomes_default() {
        let mut maps = SubjectPolicyMaps::new();
        maps.declare::<Comment>(labeled("moderator").into()).unwrap();

        let def = maps.resolve_action_for::<Comment>("anything").unwrap();
        assert_eq!(def.label(), Some("moderator"));
        assert!(maps.map_for(&Comment).unwrap().has_default());
    }

    #[test]
    fn test_redeclaration_fails() {
        let mut maps = SubjectPolicyMaps::new();
        maps.declare::<Post>(labeled("a").into()).unwrap();

        let err = maps.declare::<Post>(labeled("b").into()).unwrap_err();
        assert_eq!(
            err,
            AuthorizationError::PolicyMapRedeclared {
                subject_type: "Post".into()
            }
        );
        assert_eq!(maps.resolve_action(&Post, "x").unwrap().label(), Some("a"));
    }

    #[test]
    fn test_map_from_iterator() {
        let map: PolicyMap = [("read", labeled("r")), ("write", labeled("w"))]
            .into_iter()
            .collect();
        let mut actions: Vec<_> = map.actions().collect();
        actions.sort_unstable();
        assert_eq!(actions, vec!["read", "write"]);
        assert!(!map.has_default());
    }
}
