//! Error types for authorization checks
//!
//! Configuration errors (`ActionsNotDeclared`, `ActionNotFound`,
//! `PolicyNotFound`, ...) signal caller misuse and always propagate
//! unmodified. `NotAuthorized` is the only variant that represents a
//! business decision, and only the strict query forms produce it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authorization errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthorizationError {
    /// The subject type never declared a policy map
    #[error(
        "{subject_type} has no authorization actions declared; \
         declare a policy map for it before checking :{action}"
    )]
    ActionsNotDeclared {
        subject_type: String,
        action: String,
    },

    /// The requested action is missing and no default policy exists
    #[error("{subject_type} doesn't have an authorization action called :{action} nor a :default policy")]
    ActionNotFound {
        subject_type: String,
        action: String,
    },

    /// No policy is registered under the label
    #[error("There is no Policy with the label {label}")]
    PolicyNotFound { label: String },

    /// The actor is not allowed to perform the action (strict queries only)
    #[error(transparent)]
    NotAuthorized(Denial),

    /// A policy map was declared twice for the same subject type
    #[error("{subject_type} already has a policy map declared")]
    PolicyMapRedeclared { subject_type: String },

    /// Policy nesting exceeded the configured depth
    #[error("policy evaluation exceeded the nesting limit of {limit} levels")]
    NestingTooDeep { limit: usize },
}

impl AuthorizationError {
    /// True for every variant that signals misuse rather than a decision
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::NotAuthorized(_))
    }

    /// The denial carried by a `NotAuthorized` error
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::NotAuthorized(denial) => Some(denial),
            _ => None,
        }
    }
}

/// Context of a rejected strict query
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct Denial {
    /// Identity of the actor that was rejected
    pub actor_id: String,

    /// Type name of the subject
    pub subject_type: String,

    /// Identity of the subject
    pub subject_id: String,

    /// Action that was attempted
    pub action: String,

    /// Message supplied by the policy, or the configured default
    pub message: String,
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthorizationError>;
