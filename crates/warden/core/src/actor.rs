//! Actor query surface
//!
//! [`ActorQuery`] answers "may this actor do X to that subject?" in the
//! forms callers need: a boolean, the success params, a strict form that
//! fails with [`AuthorizationError::NotAuthorized`], or a callback run
//! only on success. Answers are memoized in the actor's
//! [`DecisionCache`] unless the query is switched to reload mode.

use crate::cache::{CacheKey, CacheMode, DecisionCache};
use crate::decision::Decision;
use crate::error::{AuthorizationError, Denial, Result};
use crate::manager::Manager;
use crate::params::Params;
use crate::subject::{short_type_name, Authorizable, Protectable};

/// Queries on behalf of one actor
#[derive(Debug, Clone, Copy)]
pub struct ActorQuery<'m, 'a> {
    manager: &'m Manager,
    actor: &'a dyn Authorizable,
    mode: CacheMode,
}

impl<'m, 'a> ActorQuery<'m, 'a> {
    pub(crate) fn new(manager: &'m Manager, actor: &'a dyn Authorizable) -> Self {
        Self {
            manager,
            actor,
            mode: CacheMode::Cached,
        }
    }

    /// Re-evaluate every query and overwrite the cached decisions
    pub fn reloading(self) -> Self {
        self.with_mode(CacheMode::Reload)
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn can(&self, action: &str, subject: &dyn Protectable) -> Result<bool> {
        Ok(self.action_decision(action, subject, self.mode)?.allowed)
    }

    /// Params of the decision when allowed, `None` when denied
    pub fn authorize(&self, action: &str, subject: &dyn Protectable) -> Result<Option<Params>> {
        Ok(self.action_decision(action, subject, self.mode)?.into_allowed_params())
    }

    /// Params of the decision, or `NotAuthorized` when denied.
    ///
    /// Always re-evaluates and overwrites the cached decision.
    pub fn authorize_strict(&self, action: &str, subject: &dyn Protectable) -> Result<Params> {
        let decision = self.action_decision(action, subject, CacheMode::Reload)?;
        if decision.allowed {
            return Ok(decision.params);
        }

        let message = decision
            .error_message()
            .map(str::to_string)
            .unwrap_or_else(|| self.manager.config().evaluation.default_denial_message.clone());

        Err(AuthorizationError::NotAuthorized(Denial {
            actor_id: self.actor.actor_id(),
            subject_type: short_type_name(subject.type_name()).to_string(),
            subject_id: subject.subject_id(),
            action: action.to_string(),
            message,
        }))
    }

    /// Whether the policy registered under `label` allows the actor
    pub fn satisfies(&self, label: &str, subject: &dyn Protectable) -> Result<bool> {
        Ok(self.policy_decision(label, subject)?.allowed)
    }

    pub fn satisfies_params(&self, label: &str, subject: &dyn Protectable) -> Result<Option<Params>> {
        Ok(self.policy_decision(label, subject)?.into_allowed_params())
    }

    /// Run `f` with the params when the action is allowed
    pub fn can_then<F>(&self, action: &str, subject: &dyn Protectable, f: F) -> Result<bool>
    where
        F: FnOnce(&Params),
    {
        let decision = self.action_decision(action, subject, self.mode)?;
        Ok(run_if_allowed(&decision, f))
    }

    /// Run `f` with the params when the labeled policy allows
    pub fn satisfies_then<F>(&self, label: &str, subject: &dyn Protectable, f: F) -> Result<bool>
    where
        F: FnOnce(&Params),
    {
        let decision = self.policy_decision(label, subject)?;
        Ok(run_if_allowed(&decision, f))
    }

    fn action_decision(&self, action: &str, subject: &dyn Protectable, mode: CacheMode) -> Result<Decision> {
        self.memoized(CacheKey::action(action, subject), mode, || {
            self.manager.check_action_authorization(self.actor, action, subject)
        })
    }

    fn policy_decision(&self, label: &str, subject: &dyn Protectable) -> Result<Decision> {
        self.memoized(CacheKey::policy(label, subject), self.mode, || {
            self.manager.check_policy_authorization(self.actor, label, subject)
        })
    }

    fn memoized<F>(&self, key: CacheKey, mode: CacheMode, evaluate: F) -> Result<Decision>
    where
        F: FnOnce() -> Result<Decision>,
    {
        match self.cache() {
            Some(cache) => cache.fetch_or_evaluate(key, mode, evaluate),
            None => evaluate(),
        }
    }

    fn cache(&self) -> Option<&'a DecisionCache> {
        if self.manager.config().cache.enabled {
            self.actor.decision_cache()
        } else {
            None
        }
    }
}

fn run_if_allowed<F: FnOnce(&Params)>(decision: &Decision, f: F) -> bool {
    if decision.allowed {
        f(&decision.params);
    }
    decision.allowed
}
