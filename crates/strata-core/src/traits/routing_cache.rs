use crate::models::{RoutingCacheKey, RoutingResult};

/// Bounded, TTL-evicted cache of routing results, injected into the router.
pub trait RoutingCache: Send + Sync {
    fn get(&self, key: &RoutingCacheKey) -> Option<RoutingResult>;

    /// Insert unless an unexpired entry already exists for `key`.
    /// Returns `true` if the value was stored.
    fn insert_if_absent(&self, key: RoutingCacheKey, value: RoutingResult) -> bool;

    fn invalidate_all(&self);

    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
