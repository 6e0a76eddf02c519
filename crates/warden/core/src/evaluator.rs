//! Recursive evaluation of policy trees

use crate::decision::Decision;
use crate::definition::{PolicyDefinition, PolicyKind};
use crate::error::AuthorizationError;
use crate::params::Params;
use crate::policy::PolicyHalt;
use crate::registry::PolicyRegistry;
use crate::subject::{Authorizable, Protectable};
use tracing::debug;

/// Why an evaluation stopped before producing a decision
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Interrupt {
    /// A policy halted; becomes a negative decision at the manager
    Halt(PolicyHalt),

    /// Misconfiguration; propagates to the caller
    Fault(AuthorizationError),
}

impl From<PolicyHalt> for Interrupt {
    fn from(halt: PolicyHalt) -> Self {
        Self::Halt(halt)
    }
}

impl From<AuthorizationError> for Interrupt {
    fn from(err: AuthorizationError) -> Self {
        Self::Fault(err)
    }
}

type Evaluation = std::result::Result<Decision, Interrupt>;

pub(crate) struct Evaluator<'r> {
    registry: &'r PolicyRegistry,
    max_depth: usize,
}

impl<'r> Evaluator<'r> {
    pub(crate) fn new(registry: &'r PolicyRegistry, max_depth: usize) -> Self {
        Self { registry, max_depth }
    }

    pub(crate) fn evaluate(
        &self,
        definition: &PolicyDefinition,
        actor: &dyn Authorizable,
        subject: &dyn Protectable,
    ) -> Evaluation {
        self.safe_authorized(definition, actor, subject, &Params::new(), 0)
    }

    /// Evaluate the effective form of `definition` and record its keyword
    fn safe_authorized(
        &self,
        definition: &PolicyDefinition,
        actor: &dyn Authorizable,
        subject: &dyn Protectable,
        inherited: &Params,
        depth: usize,
    ) -> Evaluation {
        if depth > self.max_depth {
            return Err(AuthorizationError::NestingTooDeep {
                limit: self.max_depth,
            }
            .into());
        }

        let effective = definition.effective();
        let mut decision = self.authorized(&effective, actor, subject, inherited, depth)?;
        if let Some(keyword) = effective.keyword() {
            decision.params.insert(keyword, decision.allowed);
        }
        Ok(decision)
    }

    fn authorized(
        &self,
        definition: &PolicyDefinition,
        actor: &dyn Authorizable,
        subject: &dyn Protectable,
        inherited: &Params,
        depth: usize,
    ) -> Evaluation {
        let depth = depth + 1;

        match definition.kind() {
            PolicyKind::Leaf(policy) => Ok(policy.authorized(actor, subject, inherited)?.into_decision()),

            PolicyKind::All(children) => {
                let mut threaded = inherited.clone();
                let mut collected = Params::new();

                for child in children {
                    let decision = self.safe_authorized(child, actor, subject, &threaded, depth)?;
                    threaded.merge(&decision.params);
                    collected.merge(&decision.params);
                    if decision.is_denied() {
                        return Ok(Decision::deny_with(collected));
                    }
                }
                Ok(Decision::allow_with(collected))
            }

            PolicyKind::Any(children) => {
                for child in children {
                    let decision = self.safe_authorized(child, actor, subject, inherited, depth)?;
                    if decision.is_allowed() {
                        return Ok(decision);
                    }
                }
                Ok(Decision::deny())
            }

            PolicyKind::Not(inner) => {
                let decision = self.safe_authorized(inner, actor, subject, inherited, depth)?;
                Ok(Decision::new(!decision.allowed, Params::new()))
            }

            PolicyKind::ForAssociation { key, policy, callback } => {
                let decision = match subject.association(key) {
                    Some(associated) => self.safe_authorized(policy, actor, associated, inherited, depth)?,
                    None => {
                        debug!(
                            association = %key,
                            subject_type = subject.type_name(),
                            subject_id = %subject.subject_id(),
                            "Subject has no such association; denying"
                        );
                        Decision::deny()
                    }
                };

                if let Some(callback) = callback {
                    callback(decision.allowed, &decision.params, actor, subject);
                }
                Ok(decision)
            }

            PolicyKind::Named(label) => {
                let target = self.registry.lookup(label)?;
                self.safe_authorized(&target, actor, subject, inherited, depth)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Verdict;
    use crate::definition::{all, any, for_subject, named, negate};
    use crate::params::Params;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct User;

    impl Authorizable for User {
        fn actor_id(&self) -> String {
            "user".into()
        }
    }

    #[derive(Debug)]
    struct Post {
        blog: Blog,
    }

    #[derive(Debug)]
    struct Blog;

    impl Protectable for Post {
        fn subject_id(&self) -> String {
            "post".into()
        }

        fn association(&self, key: &str) -> Option<&dyn Protectable> {
            (key == "blog").then_some(&self.blog as &dyn Protectable)
        }
    }

    impl Protectable for Blog {
        fn subject_id(&self) -> String {
            "blog".into()
        }
    }

    fn fixed(label: &str, allowed: bool, params: Params) -> PolicyDefinition {
        PolicyDefinition::from_dyn_fn(move |_, _, _| Ok(Verdict::Detailed(allowed, params.clone())))
            .with_label(label)
    }

    fn run(definition: &PolicyDefinition) -> Evaluation {
        let registry = PolicyRegistry::new();
        Evaluator::new(&registry, 16).evaluate(definition, &User, &Post { blog: Blog })
    }

    #[test]
    fn test_leaf_records_keyword_on_both_outcomes() {
        let decision = run(&fixed("yes", true, Params::new())).unwrap();
        assert_eq!(decision.params.get_bool("yes?"), Some(true));

        let decision = run(&fixed("no", false, Params::new())).unwrap();
        assert_eq!(decision.params.get_bool("no?"), Some(false));
    }

    #[test]
    fn test_all_threads_params_forward() {
        let producer = fixed("producer", true, Params::new().with("token", "abc"));
        let consumer = PolicyDefinition::from_dyn_fn(|_, _, params: &Params| {
            Ok((params.get_str("token") == Some("abc")).into())
        })
        .with_label("consumer");

        let decision = run(&all(vec![producer, consumer])).unwrap();
        assert!(decision.is_allowed());
        assert_eq!(decision.params.get_str("token"), Some("abc"));
        assert_eq!(decision.params.get_bool("producer_and_consumer?"), Some(true));
    }

    #[test]
    fn test_all_stops_at_first_denial() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let spy = PolicyDefinition::from_dyn_fn(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Verdict::allow())
        });

        let decision = run(&all(vec![fixed("gate", false, Params::new().with("why", "closed")), spy])).unwrap();

        assert!(decision.is_denied());
        assert_eq!(decision.params.get_str("why"), Some("closed"));
        assert_eq!(decision.params.get_bool("gate?"), Some(false));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_any_returns_first_success_without_leaking() {
        let def = any(vec![
            fixed("first", false, Params::new().with("leak", true)),
            fixed("second", true, Params::new().with("winner", 2)),
            fixed("third", true, Params::new().with("winner", 3)),
        ]);

        let decision = run(&def).unwrap();
        assert!(decision.is_allowed());
        assert!(!decision.params.contains_key("leak"));
        assert!(!decision.params.contains_key("first?"));
        assert_eq!(decision.params.get("winner"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn test_any_with_no_success_is_bare_denial() {
        let decision = run(&any(vec![fixed("a", false, Params::new().with("k", 1))])).unwrap();
        assert_eq!(decision, Decision::deny());
    }

    #[test]
    fn test_not_discards_params() {
        let decision = run(&negate(fixed("inner", false, Params::new().with("k", 1)))).unwrap();
        assert!(decision.is_allowed());
        assert_eq!(decision.params.len(), 1);
        assert_eq!(decision.params.get_bool("not(inner)?"), Some(true));
    }

    #[test]
    fn test_association_lift_and_callback() {
        let seen = Arc::new(AtomicUsize::new(0));
        let hook = seen.clone();
        let blog_only = PolicyDefinition::from_dyn_fn(|_, subject: &dyn Protectable, _| {
            Ok((subject.subject_id() == "blog").into())
        });
        let def = PolicyDefinition::for_subject_with("blog", blog_only, move |allowed, _, _, subject| {
            assert!(allowed);
            assert_eq!(subject.subject_id(), "post");
            hook.fetch_add(1, Ordering::SeqCst);
        });

        assert!(run(&def).unwrap().is_allowed());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_association_denies() {
        let def = for_subject("owner", fixed("any", true, Params::new()));
        assert!(run(&def).unwrap().is_denied());
    }

    #[test]
    fn test_halt_short_circuits_combinators() {
        let halting = PolicyDefinition::from_dyn_fn(|_, _, _| Err(PolicyHalt::new("stop")));
        let def = any(vec![negate(halting), fixed("never", true, Params::new())]);

        assert_eq!(run(&def).unwrap_err(), Interrupt::Halt(PolicyHalt::new("stop")));
    }

    #[test]
    fn test_named_reference_resolves_through_registry() {
        let mut registry = PolicyRegistry::new();
        registry.register(&fixed("admin", true, Params::new()));

        let decision = Evaluator::new(&registry, 16)
            .evaluate(&named("admin"), &User, &Post { blog: Blog })
            .unwrap();
        assert!(decision.is_allowed());
        assert_eq!(decision.params.get_bool("admin?"), Some(true));
    }

    #[test]
    fn test_unknown_named_reference_is_a_fault() {
        let err = run(&named("ghost")).unwrap_err();
        assert_eq!(
            err,
            Interrupt::Fault(AuthorizationError::PolicyNotFound { label: "ghost".into() })
        );
    }

    #[test]
    fn test_self_reference_hits_depth_limit() {
        let mut registry = PolicyRegistry::new();
        registry.register(&named("loop").with_label("loop"));

        let err = Evaluator::new(&registry, 8)
            .evaluate(&named("loop"), &User, &Post { blog: Blog })
            .unwrap_err();
        assert_eq!(err, Interrupt::Fault(AuthorizationError::NestingTooDeep { limit: 8 }));
    }
}
