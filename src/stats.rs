//! Pool statistics for monitoring and health checks.
//!
//! This module provides [`PoolStats`], a point-in-time snapshot of the
//! browser pool's idle queue, outstanding leases, and total tracked
//! instances. Use it for monitoring, logging, and readiness checks.
//!
//! # Example
//!
//! ```rust
//! use docrender_core::PoolStats;
//!
//! let stats = PoolStats { idle: 3, active: 2, tracked: 5 };
//! println!("Idle: {}, Active: {}", stats.idle, stats.active);
//! ```

/// Snapshot of pool statistics at a point in time.
///
/// # Fields
///
/// | Field | Description |
/// |-------|-------------|
/// | `idle` | Browsers sitting in the idle queue, ready for a lease |
/// | `active` | Outstanding leases (browsers currently checked out) |
/// | `tracked` | All browsers known to the pool (`idle` + `active`) |
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Browsers in the idle queue, ready for checkout.
    ///
    /// This value can change immediately after reading if another thread
    /// acquires or returns a lease.
    pub idle: usize,

    /// Outstanding leases (browsers currently checked out).
    pub active: usize,

    /// Total browsers tracked by the pool right now (`idle + active`).
    pub tracked: usize,
}

impl PoolStats {
    /// Whether the idle queue has a browser ready for immediate checkout.
    #[inline]
    pub fn has_idle(&self) -> bool {
        self.idle > 0
    }

    /// Whether the pool is tracking no browsers at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracked == 0
    }
}

impl std::fmt::Display for PoolStats {
    /// Format stats for logging.
    ///
    /// ```rust
    /// use docrender_core::PoolStats;
    ///
    /// let stats = PoolStats { idle: 3, active: 2, tracked: 5 };
    /// assert_eq!(stats.to_string(), "PoolStats { idle: 3, active: 2, tracked: 5 }");
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PoolStats {{ idle: {}, active: {}, tracked: {} }}",
            self.idle, self.active, self.tracked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_stats_structure() {
        let stats = PoolStats {
            idle: 5,
            active: 3,
            tracked: 8,
        };

        assert_eq!(stats.idle, 5);
        assert_eq!(stats.active, 3);
        assert_eq!(stats.tracked, 8);
    }

    #[test]
    fn test_has_idle() {
        let with_idle = PoolStats { idle: 1, active: 1, tracked: 2 };
        assert!(with_idle.has_idle());

        let without_idle = PoolStats { idle: 0, active: 1, tracked: 1 };
        assert!(!without_idle.has_idle());
    }

    #[test]
    fn test_is_empty() {
        let empty = PoolStats { idle: 0, active: 0, tracked: 0 };
        assert!(empty.is_empty());

        let not_empty = PoolStats { idle: 0, active: 1, tracked: 1 };
        assert!(!not_empty.is_empty());
    }

    #[test]
    fn test_display() {
        let stats = PoolStats { idle: 3, active: 5, tracked: 8 };
        assert_eq!(stats.to_string(), "PoolStats { idle: 3, active: 5, tracked: 8 }");
    }

    #[test]
    fn test_clone_and_debug() {
        let stats = PoolStats { idle: 3, active: 5, tracked: 8 };
        let cloned = stats.clone();
        assert_eq!(cloned.idle, stats.idle);
        let debug_str = format!("{:?}", stats);
        assert!(debug_str.contains("PoolStats"));
    }
}
