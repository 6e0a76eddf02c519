//! Policy contract
//!
//! A [`Policy`] is the atomic unit of authorization logic: given an actor,
//! a subject and the parameters inherited from earlier policies in a
//! dependency chain, it answers with a [`Verdict`] or halts with an
//! explanatory [`PolicyHalt`].
//!
//! Most policies are written against concrete types through
//! [`TypedPolicy`]; closures can be lifted with
//! [`PolicyDefinition::from_fn`](crate::PolicyDefinition::from_fn).

use crate::decision::Verdict;
use crate::params::Params;
use crate::subject::{Authorizable, Protectable};
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;
use tracing::debug;

/// Early, explanatory rejection raised from inside a policy.
///
/// A halt skips every enclosing combinator and is turned into a negative
/// decision carrying the message by the [`Manager`](crate::Manager).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("policy halted: {message}")]
pub struct PolicyHalt {
    message: String,
}

impl PolicyHalt {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// What a policy evaluation produces
pub type PolicyOutcome = std::result::Result<Verdict, PolicyHalt>;

/// Atomic authorization rule over type-erased actors and subjects
pub trait Policy: Send + Sync + fmt::Debug {
    /// Decide whether `actor` may act on `subject`.
    ///
    /// `params` holds the merged parameters of the policies that already
    /// succeeded earlier in the same `all` chain.
    fn authorized(
        &self,
        actor: &dyn Authorizable,
        subject: &dyn Protectable,
        params: &Params,
    ) -> PolicyOutcome;
}

/// Policy written against concrete actor and subject types
pub trait TypedPolicy: Send + Sync + fmt::Debug {
    type Actor: 'static;
    type Subject: 'static;

    fn authorized(
        &self,
        actor: &Self::Actor,
        subject: &Self::Subject,
        params: &Params,
    ) -> PolicyOutcome;
}

/// Adapter that exposes a [`TypedPolicy`] as a [`Policy`].
///
/// An actor or subject of another type is denied, never an error.
#[derive(Debug)]
pub struct Typed<P>(pub P);

impl<P: TypedPolicy> Policy for Typed<P> {
    fn authorized(
        &self,
        actor: &dyn Authorizable,
        subject: &dyn Protectable,
        params: &Params,
    ) -> PolicyOutcome {
        let typed_actor = actor.as_any().downcast_ref::<P::Actor>();
        let typed_subject = subject.as_any().downcast_ref::<P::Subject>();

        match (typed_actor, typed_subject) {
            (Some(actor), Some(subject)) => self.0.authorized(actor, subject, params),
            _ => {
                debug!(
                    policy = std::any::type_name::<P>(),
                    actor_type = actor.type_name(),
                    subject_type = subject.type_name(),
                    "Policy does not apply to these types; denying"
                );
                Ok(Verdict::deny())
            }
        }
    }
}

/// Closure policy over concrete types
pub struct FnPolicy<A, S, F> {
    f: F,
    _types: PhantomData<fn(&A, &S)>,
}

impl<A, S, F> FnPolicy<A, S, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _types: PhantomData,
        }
    }
}

impl<A, S, F> fmt::Debug for FnPolicy<A, S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPolicy")
            .field("actor", &std::any::type_name::<A>())
            .field("subject", &std::any::type_name::<S>())
            .finish()
    }
}

impl<A, S, F> TypedPolicy for FnPolicy<A, S, F>
where
    A: 'static,
    S: 'static,
    F: Fn(&A, &S, &Params) -> PolicyOutcome + Send + Sync,
{
    type Actor = A;
    type Subject = S;

    fn authorized(&self, actor: &A, subject: &S, params: &Params) -> PolicyOutcome {
        (self.f)(actor, subject, params)
    }
}

/// Closure policy over type-erased actors and subjects
pub struct DynFnPolicy<F> {
    f: F,
}

impl<F> DynFnPolicy<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for DynFnPolicy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DynFnPolicy")
    }
}

impl<F> Policy for DynFnPolicy<F>
where
    F: Fn(&dyn Authorizable, &dyn Protectable, &Params) -> PolicyOutcome + Send + Sync,
{
    fn authorized(
        &self,
        actor: &dyn Authorizable,
        subject: &dyn Protectable,
        params: &Params,
    ) -> PolicyOutcome {
        (self.f)(actor, subject, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct User {
        admin: bool,
    }

    impl Authorizable for User {
        fn actor_id(&self) -> String {
            "user".into()
        }
    }

    #[derive(Debug)]
    struct Report;

    impl Protectable for Report {
        fn subject_id(&self) -> String {
            "report".into()
        }
    }

    #[derive(Debug)]
    struct Invoice;

    impl Protectable for Invoice {
        fn subject_id(&self) -> String {
            "invoice".into()
        }
    }

    #[derive(Debug)]
    struct ActorIsAdmin;

    impl TypedPolicy for ActorIsAdmin {
        type Actor = User;
        type Subject = Report;

        fn authorized(&self, actor: &User, _subject: &Report, _params: &Params) -> PolicyOutcome {
            Ok(actor.admin.into())
        }
    }

    #[test]
    fn test_typed_policy_downcasts() {
        let policy = Typed(ActorIsAdmin);
        let admin = User { admin: true };
        let guest = User { admin: false };

        let verdict = policy.authorized(&admin, &Report, &Params::new()).unwrap();
        assert!(verdict.is_allowed());

        let verdict = policy.authorized(&guest, &Report, &Params::new()).unwrap();
        assert!(!verdict.is_allowed());
    }

    #[test]
    fn test_typed_policy_denies_other_subject_types() {
        let policy = Typed(ActorIsAdmin);
        let admin = User { admin: true };

        let verdict = policy.authorized(&admin, &Invoice, &Params::new()).unwrap();
        assert_eq!(verdict, Verdict::deny());
    }

    #[test]
    fn test_fn_policy_can_halt() {
        let policy = Typed(FnPolicy::<User, Report, _>::new(|_: &User, _: &Report, _: &Params| {
            Err(PolicyHalt::new("report is archived"))
        }));

        let err = policy
            .authorized(&User { admin: true }, &Report, &Params::new())
            .unwrap_err();
        assert_eq!(err.message(), "report is archived");
    }

    #[test]
    fn test_dyn_fn_policy_reads_inherited_params() {
        let policy = DynFnPolicy::new(|_: &dyn Authorizable, _: &dyn Protectable, params: &Params| {
            Ok(params.get_bool("friend").unwrap_or(false).into())
        });

        let params = Params::new().with("friend", true);
        let verdict = policy.authorized(&User { admin: false }, &Report, &params).unwrap();
        assert!(verdict.is_allowed());
    }
}
