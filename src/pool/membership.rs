//! Active-endpoint membership tracking.

// ============================================================================
// Imports
// ============================================================================

use crate::identifiers::EndpointUrl;

// ============================================================================
// Membership
// ============================================================================

/// Ordered set of endpoints currently considered active.
///
/// Membership reflects only the most recent `connected`/`disconnected`
/// signal per endpoint, not queue state. An endpoint appears at most once.
/// Read by monitoring and diagnostics consumers; the statistics engine does
/// not consult it.
#[derive(Debug, Default)]
pub struct Membership {
    active: Vec<EndpointUrl>,
}

impl Membership {
    /// Creates an empty membership set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an endpoint active or inactive.
    ///
    /// Activating an already-active endpoint and deactivating an absent one
    /// are both no-ops.
    pub fn set_active(&mut self, url: &EndpointUrl, active: bool) {
        let index = self.active.iter().position(|member| member == url);

        match (active, index) {
            (true, None) => self.active.push(url.clone()),
            (false, Some(index)) => {
                self.active.remove(index);
            }
            _ => {}
        }
    }

    /// Returns whether the endpoint is currently active.
    #[inline]
    #[must_use]
    pub fn contains(&self, url: &EndpointUrl) -> bool {
        self.active.iter().any(|member| member == url)
    }

    /// Returns the active endpoints in insertion order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[EndpointUrl] {
        &self.active
    }

    /// Returns the number of active endpoints.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns whether no endpoint is active.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn url(n: u16) -> EndpointUrl {
        EndpointUrl::parse(format!("tcp://host-{n}:9000")).unwrap()
    }

    #[test]
    fn test_activate_is_idempotent() {
        let mut membership = Membership::new();
        let a = url(1);

        membership.set_active(&a, true);
        membership.set_active(&a, true);

        assert_eq!(membership.as_slice(), [a]);
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let mut membership = Membership::new();
        let a = url(1);

        membership.set_active(&a, true);
        membership.set_active(&a, false);
        membership.set_active(&a, false);

        assert!(membership.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut membership = Membership::new();
        let (a, b, c) = (url(1), url(2), url(3));

        membership.set_active(&a, true);
        membership.set_active(&b, true);
        membership.set_active(&c, true);
        membership.set_active(&b, false);

        assert_eq!(membership.as_slice(), [a, c]);
    }

    proptest! {
        // Any interleaving of activate/deactivate leaves each endpoint
        // appearing at most once.
        #[test]
        fn prop_no_duplicates(ops in prop::collection::vec((0u16..8, any::<bool>()), 0..64)) {
            let mut membership = Membership::new();

            for (n, active) in ops {
                membership.set_active(&url(n), active);
            }

            let mut seen = membership.as_slice().to_vec();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), membership.len());
        }
    }
}
