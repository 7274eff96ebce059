//! Replication policies.

use std::fmt;
use std::sync::Arc;

use crate::relevancy::{OwnerContext, ViewerContext};

/// Which viewers receive the owner's equipment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplicationPolicy {
    /// Every tracked viewer.
    #[default]
    Always,
    /// Only the owner's own connection.
    OwnerOnly,
    /// Viewers whose relevancy score clears the threshold.
    RelevantOnly,
    /// Everyone except the owner's own connection.
    SkipOwner,
    /// Decided by the filter installed with `set_custom_filter`.
    Custom,
}

/// Predicate used by [`ReplicationPolicy::Custom`].
#[derive(Clone)]
pub struct ViewerFilter(Arc<dyn Fn(&ViewerContext, &OwnerContext) -> bool + Send + Sync>);

impl ViewerFilter {
    pub fn new(filter: impl Fn(&ViewerContext, &OwnerContext) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(filter))
    }

    #[must_use]
    pub fn allows(&self, viewer: &ViewerContext, owner: &OwnerContext) -> bool {
        (self.0)(viewer, owner)
    }
}

impl fmt::Debug for ViewerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ViewerFilter(..)")
    }
}

/// Inputs for one policy decision.
pub(crate) struct PolicyInput<'a> {
    pub viewer: &'a ViewerContext,
    pub owner: Option<&'a OwnerContext>,
    pub relevant: bool,
    pub filter: Option<&'a ViewerFilter>,
}

impl ReplicationPolicy {
    /// Applies the policy. A `Custom` policy with no filter installed
    /// replicates to nobody.
    pub(crate) fn allows(self, input: &PolicyInput<'_>) -> bool {
        let is_owner = input
            .owner
            .is_some_and(|owner| owner.is_owner(input.viewer.id));
        match self {
            Self::Always => true,
            Self::OwnerOnly => is_owner,
            Self::RelevantOnly => is_owner || input.relevant,
            Self::SkipOwner => !is_owner,
            Self::Custom => match (input.filter, input.owner) {
                (Some(filter), Some(owner)) => filter.allows(input.viewer, owner),
                (Some(_), None) => false,
                (None, _) => {
                    log::warn!("custom replication policy without a filter, skipping viewer");
                    false
                }
            },
        }
    }
}
