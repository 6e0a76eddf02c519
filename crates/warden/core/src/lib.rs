//! # Warden Core
//!
//! Embeddable authorization decisions built from composable policies.
//!
//! ## Overview
//!
//! An application teaches warden three things:
//!
//! - who acts, by implementing [`Authorizable`] on its principals
//! - what is protected, by implementing [`Protectable`] on its resources
//! - which [`PolicyDefinition`] guards each action of each resource type
//!
//! Checks then go through the [`Manager`], usually via the per-actor
//! [`ActorQuery`] surface, which memoizes answers in the actor's
//! [`DecisionCache`].
//!
//! ## Key Components
//!
//! - [`Policy`] / [`TypedPolicy`]: atomic authorization rules
//! - [`PolicyDefinition`]: policy tree node; combine with [`all`], [`any`],
//!   [`negate`], [`for_subject`] and [`named`]
//! - [`PolicyRegistry`]: label to definition map
//! - [`PolicyMap`] / [`SubjectPolicyMaps`]: per-type action maps with a
//!   `default` fallback
//! - [`Manager`]: declarations and checks
//! - [`Decision`]: normalized `(allowed, params)` answer
//!
//! ## Example
//!
//! ```rust,no_run
//! use warden_core::{any, Authorizable, DecisionCache, Manager, Params, PolicyDefinition, PolicyMap, Protectable, Verdict};
//!
//! #[derive(Debug)]
//! struct User { name: String, cache: DecisionCache }
//!
//! impl Authorizable for User {
//!     fn actor_id(&self) -> String { self.name.clone() }
//!     fn decision_cache(&self) -> Option<&DecisionCache> { Some(&self.cache) }
//! }
//!
//! #[derive(Debug)]
//! struct Post { id: u64, owner: String }
//!
//! impl Protectable for Post {
//!     fn subject_id(&self) -> String { self.id.to_string() }
//! }
//!
//! # fn example() -> warden_core::Result<()> {
//! let mut manager = Manager::new();
//!
//! let owner = manager.declare_policy(
//!     PolicyDefinition::from_fn(|user: &User, post: &Post, _: &Params| {
//!         Ok(Verdict::from(user.name == post.owner))
//!     })
//!     .with_label("user_is_owner"),
//! );
//! manager.declare_policy_map::<Post>(PolicyMap::new().action("edit", owner))?;
//!
//! let john = User { name: "john".into(), cache: DecisionCache::new() };
//! let post = Post { id: 1, owner: "john".into() };
//!
//! assert!(manager.actor(&john).can("edit", &post)?);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod actor;
pub mod cache;
pub mod config;
pub mod decision;
pub mod definition;
pub mod error;
mod evaluator;
pub mod manager;
pub mod mapping;
pub mod params;
pub mod policy;
pub mod registry;
pub mod subject;
pub mod telemetry;

// Re-exports
pub use actor::ActorQuery;
pub use cache::{CacheKey, CacheMode, DecisionCache, Selector};
pub use crate::config::{CacheConfig, ConfigError, EvaluationConfig, LoggingConfig, WardenConfig};
pub use decision::{Decision, Verdict};
pub use definition::{all, any, for_subject, named, negate, AssociationCallback, PolicyDefinition, PolicyKind};
pub use error::{AuthorizationError, Denial, Result};
pub use manager::Manager;
pub use mapping::{PolicyMap, SubjectPolicyMaps, DEFAULT_ACTION};
pub use params::{Params, ERROR_MESSAGE_KEY};
pub use policy::{DynFnPolicy, FnPolicy, Policy, PolicyHalt, PolicyOutcome, Typed, TypedPolicy};
pub use registry::PolicyRegistry;
pub use subject::{AsAny, Authorizable, Protectable};
pub use telemetry::init_tracing;
