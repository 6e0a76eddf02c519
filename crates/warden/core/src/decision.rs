//! Policy decision types
//!
//! A [`Verdict`] is what a policy returns: a bare boolean or a boolean with
//! parameters. The evaluator normalizes every verdict into a [`Decision`],
//! whose parameters are never absent.

use crate::params::{Params, ERROR_MESSAGE_KEY};
use serde::{Deserialize, Serialize};

/// Normalized outcome of evaluating a policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the action is permitted
    pub allowed: bool,

    /// Metadata produced during evaluation
    #[serde(default)]
    pub params: Params,
}

impl Decision {
    pub fn new(allowed: bool, params: Params) -> Self {
        Self { allowed, params }
    }

    /// Create an allow decision with no parameters
    pub fn allow() -> Self {
        Self::new(true, Params::new())
    }

    /// Create a deny decision with no parameters
    pub fn deny() -> Self {
        Self::new(false, Params::new())
    }

    pub fn allow_with(params: Params) -> Self {
        Self::new(true, params)
    }

    pub fn deny_with(params: Params) -> Self {
        Self::new(false, params)
    }

    /// Terminal negative decision produced from a policy halt
    pub fn halted(message: impl Into<String>) -> Self {
        Self::deny_with(Params::new().with(ERROR_MESSAGE_KEY, message.into()))
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn is_denied(&self) -> bool {
        !self.allowed
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn error_message(&self) -> Option<&str> {
        self.params.error_message()
    }

    /// The parameters when allowed, `None` otherwise
    pub fn into_allowed_params(self) -> Option<Params> {
        self.allowed.then_some(self.params)
    }
}

/// Raw value returned by a policy
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Bare answer, treated as `(answer, {})`
    Bare(bool),

    /// Answer with parameters
    Detailed(bool, Params),
}

impl Verdict {
    pub fn allow() -> Self {
        Self::Bare(true)
    }

    pub fn deny() -> Self {
        Self::Bare(false)
    }

    pub fn allow_with(params: Params) -> Self {
        Self::Detailed(true, params)
    }

    pub fn deny_with(params: Params) -> Self {
        Self::Detailed(false, params)
    }

    pub fn is_allowed(&self) -> bool {
        match self {
            Self::Bare(allowed) | Self::Detailed(allowed, _) => *allowed,
        }
    }

    /// Normalize into a decision with non-absent parameters
    pub fn into_decision(self) -> Decision {
        match self {
            Self::Bare(allowed) => Decision::new(allowed, Params::new()),
            Self::Detailed(allowed, params) => Decision::new(allowed, params),
        }
    }
}

impl From<bool> for Verdict {
    fn from(allowed: bool) -> Self {
        Self::Bare(allowed)
    }
}

impl From<(bool, Params)> for Verdict {
    fn from((allowed, params): (bool, Params)) -> Self {
        Self::Detailed(allowed, params)
    }
}

impl From<Decision> for Verdict {
    fn from(decision: Decision) -> Self {
        Self::Detailed(decision.allowed, decision.params)
    }
}
