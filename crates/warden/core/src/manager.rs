//! Authorization manager
//!
//! The [`Manager`] owns the policy registry, the subject policy maps and
//! the engine configuration. Declarations take `&mut self` and happen at
//! start-up; checks take `&self`, so a fully declared manager can be
//! frozen behind an `Arc` and shared across threads.

use crate::actor::ActorQuery;
use crate::cache::Selector;
use crate::config::WardenConfig;
use crate::decision::Decision;
use crate::definition::PolicyDefinition;
use crate::error::Result;
use crate::evaluator::{Evaluator, Interrupt};
use crate::mapping::{PolicyMap, SubjectPolicyMaps};
use crate::registry::PolicyRegistry;
use crate::subject::{short_type_name, Authorizable, Protectable};
use tracing::{debug, info};

/// Entry point for declaring policies and running checks
#[derive(Debug, Clone, Default)]
pub struct Manager {
    registry: PolicyRegistry,
    subjects: SubjectPolicyMaps,
    config: WardenConfig,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WardenConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    pub fn subjects(&self) -> &SubjectPolicyMaps {
        &self.subjects
    }

    /// Register a definition under its label and hand it back.
    ///
    /// Unlabeled definitions are returned untouched.
    pub fn declare_policy(&mut self, definition: PolicyDefinition) -> PolicyDefinition {
        self.registry.register(&definition);
        definition
    }

    /// Move a definition to a new label in the registry
    pub fn relabel_policy(&mut self, definition: &PolicyDefinition, new_label: impl Into<String>) -> PolicyDefinition {
        self.registry.relabel(definition, new_label)
    }

    /// Declare which policies guard the actions of subject type `S`.
    ///
    /// Accepts a [`PolicyMap`] or a single [`PolicyDefinition`], which
    /// becomes the `default` entry.
    pub fn declare_policy_map<S: Protectable>(&mut self, map: impl Into<PolicyMap>) -> Result<()> {
        let map = map.into();
        let subject_type = short_type_name(std::any::type_name::<S>());
        let mut actions: Vec<&str> = map.actions().collect();
        actions.sort_unstable();

        info!(
            subject_type = %subject_type,
            actions = ?actions,
            "Declaring policy map"
        );
        self.subjects.declare::<S>(map)
    }

    pub fn fetch_policy(&self, label: &str) -> Result<PolicyDefinition> {
        self.registry.lookup(label)
    }

    pub fn resolve_action(&self, subject: &dyn Protectable, action: &str) -> Result<PolicyDefinition> {
        self.subjects.resolve_action(subject, action)
    }

    /// Evaluate the policy guarding `action` on `subject`.
    ///
    /// A halted policy yields a denial carrying its message; resolution
    /// errors propagate unchanged.
    pub fn check_action_authorization(
        &self,
        actor: &dyn Authorizable,
        action: &str,
        subject: &dyn Protectable,
    ) -> Result<Decision> {
        let definition = self.resolve_action(subject, action)?;
        self.run(&definition, actor, subject, Selector::Action, action)
    }

    /// Evaluate the policy registered under `label`
    pub fn check_policy_authorization(
        &self,
        actor: &dyn Authorizable,
        label: &str,
        subject: &dyn Protectable,
    ) -> Result<Decision> {
        let definition = self.fetch_policy(label)?;
        self.run(&definition, actor, subject, Selector::Policy, label)
    }

    /// Evaluate an arbitrary definition, registered or not
    pub fn check_definition(
        &self,
        actor: &dyn Authorizable,
        definition: &PolicyDefinition,
        subject: &dyn Protectable,
    ) -> Result<Decision> {
        let name = definition.label().unwrap_or("<anonymous>");
        self.run(definition, actor, subject, Selector::Policy, name)
    }

    /// Predicate over subjects with the actor fixed, for filtering
    pub fn predicate<'m>(
        &'m self,
        actor: &'m dyn Authorizable,
        definition: PolicyDefinition,
    ) -> impl Fn(&dyn Protectable) -> Result<bool> + 'm {
        move |subject: &dyn Protectable| -> Result<bool> {
            self.check_definition(actor, &definition, subject)
                .map(|decision| decision.allowed)
        }
    }

    /// Query surface for one actor, backed by its decision cache
    pub fn actor<'m, 'a>(&'m self, actor: &'a dyn Authorizable) -> ActorQuery<'m, 'a> {
        ActorQuery::new(self, actor)
    }

    fn run(
        &self,
        definition: &PolicyDefinition,
        actor: &dyn Authorizable,
        subject: &dyn Protectable,
        selector: Selector,
        name: &str,
    ) -> Result<Decision> {
        let evaluator = Evaluator::new(&self.registry, self.config.evaluation.max_depth);

        match evaluator.evaluate(definition, actor, subject) {
            Ok(decision) => {
                if decision.allowed {
                    debug!(
                        actor = %actor.actor_id(),
                        subject_type = short_type_name(subject.type_name()),
                        subject = %subject.subject_id(),
                        selector = ?selector,
                        name = %name,
                        "Authorization granted"
                    );
                } else {
                    debug!(
                        actor = %actor.actor_id(),
                        subject_type = short_type_name(subject.type_name()),
                        subject = %subject.subject_id(),
                        selector = ?selector,
                        name = %name,
                        "Authorization denied"
                    );
                }
                Ok(decision)
            }
            Err(Interrupt::Halt(halt)) => {
                info!(
                    actor = %actor.actor_id(),
                    subject_type = short_type_name(subject.type_name()),
                    subject = %subject.subject_id(),
                    selector = ?selector,
                    name = %name,
                    reason = %halt.message(),
                    "Policy halted evaluation"
                );
                Ok(Decision::halted(halt.message()))
            }
            Err(Interrupt::Fault(err)) => Err(err),
        }
    }
}
