//! Filtering subjects by authorization

use tracing::debug;
use warden_core::{Authorizable, Manager, Protectable, Result};

/// What an item must satisfy to be kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter<'f> {
    /// An action declared in the subject type's policy map
    Action(&'f str),

    /// The label of a registered policy
    Policy(&'f str),
}

/// Keep the items `actor` is authorized for, preserving order.
///
/// Actions are answered through the actor's decision cache. A policy
/// label is resolved once, before any item is checked, so an unknown
/// label fails even for an empty slice.
pub fn filter_authorized<'i, T: Protectable>(
    manager: &Manager,
    actor: &dyn Authorizable,
    items: &'i [T],
    filter: Filter<'_>,
) -> Result<Vec<&'i T>> {
    let mut kept = Vec::new();

    match filter {
        Filter::Action(action) => {
            let query = manager.actor(actor);
            for item in items {
                if query.can(action, item)? {
                    kept.push(item);
                }
            }
        }
        Filter::Policy(label) => {
            let check = manager.predicate(actor, manager.fetch_policy(label)?);
            for item in items {
                if check(item as &dyn Protectable)? {
                    kept.push(item);
                }
            }
        }
    }

    debug!(
        actor = %actor.actor_id(),
        filter = ?filter,
        total = items.len(),
        kept = kept.len(),
        "Filtered collection"
    );
    Ok(kept)
}

/// Slice extension for [`filter_authorized`]
pub trait OnlyAuthorized<T> {
    fn only_authorized(&self, manager: &Manager, actor: &dyn Authorizable, filter: Filter<'_>) -> Result<Vec<&T>>;
}

impl<T: Protectable> OnlyAuthorized<T> for [T] {
    fn only_authorized(&self, manager: &Manager, actor: &dyn Authorizable, filter: Filter<'_>) -> Result<Vec<&T>> {
        filter_authorized(manager, actor, self, filter)
    }
}
