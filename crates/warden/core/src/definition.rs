//! Policy definitions
//!
//! A [`PolicyDefinition`] is an immutable, cheaply clonable node of the
//! policy tree: a leaf policy, a combinator (`all`, `any`, `negate`), an
//! association lift, or a by-label reference to a registered policy.
//! Definitions carry an optional label and a list of dependencies that
//! must succeed before the definition itself is evaluated.
//!
//! # Example
//!
//! ```rust,no_run
//! use warden_core::{any, negate, PolicyDefinition};
//! # use warden_core::{Params, PolicyOutcome};
//! # #[derive(Debug)] struct User { admin: bool }
//! # #[derive(Debug)] struct Post;
//! # impl warden_core::Authorizable for User { fn actor_id(&self) -> String { String::new() } }
//! # impl warden_core::Protectable for Post { fn subject_id(&self) -> String { String::new() } }
//!
//! let is_admin = PolicyDefinition::from_fn(|user: &User, _: &Post, _: &Params| -> PolicyOutcome {
//!     Ok(user.admin.into())
//! })
//! .with_label("actor_is_admin");
//!
//! let read = any(vec![is_admin.clone(), negate(is_admin)]);
//! ```

use crate::params::Params;
use crate::policy::{DynFnPolicy, FnPolicy, Policy, PolicyOutcome, Typed, TypedPolicy};
use crate::registry::derive_label;
use crate::subject::{Authorizable, Protectable};
use std::fmt;
use std::sync::Arc;

/// Side-effect hook run after an association lift evaluates
pub type AssociationCallback =
    Arc<dyn Fn(bool, &Params, &dyn Authorizable, &dyn Protectable) + Send + Sync>;

/// Shape of a definition node
#[derive(Clone)]
pub enum PolicyKind {
    /// A user policy
    Leaf(Arc<dyn Policy>),

    /// Every child must allow, evaluated in order
    All(Vec<PolicyDefinition>),

    /// The first allowing child wins
    Any(Vec<PolicyDefinition>),

    /// Inverts the child's answer
    Not(PolicyDefinition),

    /// Evaluates `policy` against the subject's association under `key`
    ForAssociation {
        key: String,
        policy: PolicyDefinition,
        callback: Option<AssociationCallback>,
    },

    /// Reference to a registered policy, resolved at evaluation time
    Named(String),
}

impl fmt::Debug for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(policy) => f.debug_tuple("Leaf").field(policy).finish(),
            Self::All(children) => f.debug_tuple("All").field(children).finish(),
            Self::Any(children) => f.debug_tuple("Any").field(children).finish(),
            Self::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Self::ForAssociation {
                key,
                policy,
                callback,
            } => f
                .debug_struct("ForAssociation")
                .field("key", key)
                .field("policy", policy)
                .field("callback", &callback.is_some())
                .finish(),
            Self::Named(label) => f.debug_tuple("Named").field(label).finish(),
        }
    }
}

#[derive(Debug, Clone)]
struct DefinitionInner {
    label: Option<String>,
    dependencies: Vec<PolicyDefinition>,
    kind: PolicyKind,
}

/// Immutable policy tree node
#[derive(Debug, Clone)]
pub struct PolicyDefinition {
    inner: Arc<DefinitionInner>,
}

impl PolicyDefinition {
    fn from_kind(kind: PolicyKind, label: Option<String>) -> Self {
        Self {
            inner: Arc::new(DefinitionInner {
                label,
                dependencies: Vec::new(),
                kind,
            }),
        }
    }

    /// Wrap a type-erased policy; the label is derived from its type name
    pub fn leaf<P: Policy + 'static>(policy: P) -> Self {
        let label = derive_label(std::any::type_name::<P>());
        Self::from_kind(PolicyKind::Leaf(Arc::new(policy)), label)
    }

    /// Wrap a typed policy; the label is derived from its type name
    pub fn typed<P: TypedPolicy + 'static>(policy: P) -> Self {
        let label = derive_label(std::any::type_name::<P>());
        Self::from_kind(PolicyKind::Leaf(Arc::new(Typed(policy))), label)
    }

    /// Unlabeled leaf from a closure over concrete types
    pub fn from_fn<A, S, F>(f: F) -> Self
    where
        A: 'static,
        S: 'static,
        F: Fn(&A, &S, &Params) -> PolicyOutcome + Send + Sync + 'static,
    {
        let policy = Typed(FnPolicy::<A, S, F>::new(f));
        Self::from_kind(PolicyKind::Leaf(Arc::new(policy)), None)
    }

    /// Unlabeled leaf from a closure over trait objects
    pub fn from_dyn_fn<F>(f: F) -> Self
    where
        F: Fn(&dyn Authorizable, &dyn Protectable, &Params) -> PolicyOutcome + Send + Sync + 'static,
    {
        Self::from_kind(PolicyKind::Leaf(Arc::new(DynFnPolicy::new(f))), None)
    }

    pub fn all(children: impl IntoIterator<Item = PolicyDefinition>) -> Self {
        Self::from_kind(PolicyKind::All(children.into_iter().collect()), None)
    }

    pub fn any(children: impl IntoIterator<Item = PolicyDefinition>) -> Self {
        Self::from_kind(PolicyKind::Any(children.into_iter().collect()), None)
    }

    pub fn negate(inner: PolicyDefinition) -> Self {
        Self::from_kind(PolicyKind::Not(inner), None)
    }

    /// Evaluate `policy` against the association reachable under `key`
    pub fn for_subject(key: impl Into<String>, policy: PolicyDefinition) -> Self {
        Self::from_kind(
            PolicyKind::ForAssociation {
                key: key.into(),
                policy,
                callback: None,
            },
            None,
        )
    }

    /// Like [`for_subject`](Self::for_subject), running `callback` with the
    /// outcome, the params and the original actor and subject.
    pub fn for_subject_with<F>(key: impl Into<String>, policy: PolicyDefinition, callback: F) -> Self
    where
        F: Fn(bool, &Params, &dyn Authorizable, &dyn Protectable) + Send + Sync + 'static,
    {
        Self::from_kind(
            PolicyKind::ForAssociation {
                key: key.into(),
                policy,
                callback: Some(Arc::new(callback)),
            },
            None,
        )
    }

    /// Lazy reference to the policy registered under `label`
    pub fn named(label: impl Into<String>) -> Self {
        Self::from_kind(PolicyKind::Named(label.into()), None)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).label = Some(label.into());
        self
    }

    pub fn without_label(mut self) -> Self {
        Arc::make_mut(&mut self.inner).label = None;
        self
    }

    /// Require `dependencies` to allow, in order, before this definition.
    ///
    /// Replaces any dependencies set earlier.
    pub fn depends_on(mut self, dependencies: impl IntoIterator<Item = PolicyDefinition>) -> Self {
        Arc::make_mut(&mut self.inner).dependencies = dependencies.into_iter().collect();
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    pub fn dependencies(&self) -> &[PolicyDefinition] {
        &self.inner.dependencies
    }

    pub fn kind(&self) -> &PolicyKind {
        &self.inner.kind
    }

    /// Key under which this node records its outcome in the params.
    ///
    /// A label always wins (`label?`). Unlabeled `all` nodes join their
    /// children's keywords with `_and_`, `negate` nodes produce
    /// `not(inner)?`, and references use the referenced label.
    pub fn keyword(&self) -> Option<String> {
        if let Some(label) = &self.inner.label {
            return Some(format!("{label}?"));
        }

        match &self.inner.kind {
            PolicyKind::All(children) => {
                let parts: Vec<String> = children
                    .iter()
                    .filter_map(PolicyDefinition::keyword)
                    .map(|keyword| strip_marker(&keyword).to_string())
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(format!("{}?", parts.join("_and_")))
                }
            }
            PolicyKind::Not(inner) => inner
                .keyword()
                .map(|keyword| format!("not({})?", strip_marker(&keyword))),
            PolicyKind::Named(label) => Some(format!("{label}?")),
            PolicyKind::Leaf(_) | PolicyKind::Any(_) | PolicyKind::ForAssociation { .. } => None,
        }
    }

    /// The definition as evaluated: `all(dependencies.., self)` when it
    /// has dependencies, itself otherwise.
    pub fn effective(&self) -> PolicyDefinition {
        if self.inner.dependencies.is_empty() {
            return self.clone();
        }

        let mut chain = self.inner.dependencies.clone();
        chain.push(self.clone().depends_on(Vec::new()));
        PolicyDefinition::all(chain)
    }

    /// Whether both handles point at the same node
    pub fn same_as(&self, other: &PolicyDefinition) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn strip_marker(keyword: &str) -> &str {
    keyword.strip_suffix('?').unwrap_or(keyword)
}

/// Shorthand for [`PolicyDefinition::all`]
pub fn all(children: impl IntoIterator<Item = PolicyDefinition>) -> PolicyDefinition {
    PolicyDefinition::all(children)
}

/// Shorthand for [`PolicyDefinition::any`]
pub fn any(children: impl IntoIterator<Item = PolicyDefinition>) -> PolicyDefinition {
    PolicyDefinition::any(children)
}

/// Shorthand for [`PolicyDefinition::negate`]
pub fn negate(inner: PolicyDefinition) -> PolicyDefinition {
    PolicyDefinition::negate(inner)
}

/// Shorthand for [`PolicyDefinition::for_subject`]
pub fn for_subject(key: impl Into<String>, policy: PolicyDefinition) -> PolicyDefinition {
    PolicyDefinition::for_subject(key, policy)
}

/// Shorthand for [`PolicyDefinition::named`]
pub fn named(label: impl Into<String>) -> PolicyDefinition {
    PolicyDefinition::named(label)
}
