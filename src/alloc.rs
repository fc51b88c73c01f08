//! Handling of refused allocations.
use std::collections::TryReserveError;
use std::process;

use {ErrorKind, Result};

/// What happens when an allocation sized by caller input is refused.
///
/// A registry consults its policy for every copy of a name, help text or
/// label, and for every bucket array and accumulator it allocates.
/// Families, series and instances inherit the policy of their registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationPolicy {
    /// Logs the failure and aborts the process.
    Abort,

    /// Returns an `ErrorKind::ResourceExhausted` error to the caller.
    Fail,
}
impl AllocationPolicy {
    pub(crate) fn vec_with_capacity<T>(self, capacity: usize) -> Result<Vec<T>> {
        let mut vec = Vec::new();
        if let Err(e) = vec.try_reserve_exact(capacity) {
            return self.exhausted(e);
        }
        Ok(vec)
    }

    pub(crate) fn copy_str(self, s: &str) -> Result<String> {
        let mut copy = String::new();
        if let Err(e) = copy.try_reserve_exact(s.len()) {
            return self.exhausted(e);
        }
        copy.push_str(s);
        Ok(copy)
    }

    fn exhausted<T>(self, e: TryReserveError) -> Result<T> {
        match self {
            AllocationPolicy::Abort => {
                error!(reason = %e, "allocation failed; aborting");
                process::abort()
            }
            AllocationPolicy::Fail => track_panic!(ErrorKind::ResourceExhausted, "{}", e),
        }
    }
}
impl Default for AllocationPolicy {
    fn default() -> Self {
        AllocationPolicy::Abort
    }
}
