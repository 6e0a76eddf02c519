//! Actor and subject roles
//!
//! Any type can take part in an authorization check by implementing
//! [`Authorizable`] (the principal attempting an action) or
//! [`Protectable`] (the resource the action targets). A type may play both
//! roles.

use crate::cache::DecisionCache;
use std::any::{Any, TypeId};
use std::fmt;

/// Runtime type access for trait objects
///
/// Implemented for every `'static` type; policies use it to recover the
/// concrete actor and subject types.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    /// `TypeId` of the concrete type behind the trait object
    fn concrete_type_id(&self) -> TypeId;

    /// Name of the concrete type behind the trait object
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn concrete_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// The actor role: a principal that attempts actions on subjects
pub trait Authorizable: AsAny + fmt::Debug {
    /// Stable identity used in denials and logs
    fn actor_id(&self) -> String;

    /// Per-actor decision memo; actors without one always re-evaluate
    fn decision_cache(&self) -> Option<&DecisionCache> {
        None
    }
}

/// The subject role: a resource protected by a policy map
pub trait Protectable: AsAny + fmt::Debug {
    /// Identity of this subject, unique within its type
    fn subject_id(&self) -> String;

    /// Related object reachable under `key`, used by association lifts
    fn association(&self, _key: &str) -> Option<&dyn Protectable> {
        None
    }
}

/// Short type name (last path segment) for messages
pub(crate) fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Document {
        id: u32,
        folder: Folder,
    }

    #[derive(Debug)]
    struct Folder;

    impl Protectable for Folder {
        fn subject_id(&self) -> String {
            "root".into()
        }
    }

    impl Protectable for Document {
        fn subject_id(&self) -> String {
            self.id.to_string()
        }

        fn association(&self, key: &str) -> Option<&dyn Protectable> {
            match key {
                "folder" => Some(&self.folder),
                _ => None,
            }
        }
    }

    #[test]
    fn test_concrete_type_through_trait_object() {
        let doc = Document { id: 7, folder: Folder };
        let subject: &dyn Protectable = &doc;

        assert_eq!(subject.concrete_type_id(), TypeId::of::<Document>());
        assert!(subject.as_any().downcast_ref::<Document>().is_some());
        assert_eq!(short_type_name(subject.type_name()), "Document");
    }

    #[test]
    fn test_association_lookup() {
        let doc = Document { id: 7, folder: Folder };
        let folder = doc.association("folder").unwrap();
        assert_eq!(folder.concrete_type_id(), TypeId::of::<Folder>());
        assert_eq!(folder.subject_id(), "root");
        assert!(doc.association("owner").is_none());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("app::models::Song"), "Song");
        assert_eq!(short_type_name("app::Wrapper<app::Song>"), "Wrapper");
        assert_eq!(short_type_name("Song"), "Song");
    }
}
