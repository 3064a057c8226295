//! Identifier allocator: project-scoped pools of bus addresses, device ids
//! and unit ids.
//!
//! Allocation is deterministic: a preferred value is honoured when free,
//! otherwise the pool is scanned upward from its floor. Recompiling an
//! unchanged snapshot therefore yields the same values.

use std::collections::{BTreeSet, HashMap};

use panelforge_domain::error::AllocationError;

/// An identifier namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    /// HSNET bus address (one byte on the wire).
    Hsnet,
    DeviceId,
    /// Internal unit id of every bus value.
    UnitId,
}

impl Pool {
    /// First value handed out by a scan.
    #[must_use]
    pub fn floor(self) -> u32 {
        match self {
            Self::Hsnet => 101,
            Self::DeviceId | Self::UnitId => 1,
        }
    }

    /// Highest value the pool can hold.
    #[must_use]
    pub fn ceiling(self) -> u32 {
        match self {
            Self::Hsnet => 254,
            Self::DeviceId => u32::from(u16::MAX),
            Self::UnitId => u32::MAX,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Hsnet => "hsnet",
            Self::DeviceId => "device id",
            Self::UnitId => "unit id",
        }
    }
}

#[derive(Debug, Default)]
struct PoolState {
    reserved: BTreeSet<u32>,
    /// Every value in `floor..next_free` is reserved.
    next_free: Option<u32>,
}

/// Reservation sets of every pool for one compilation.
#[derive(Debug, Default)]
pub struct IdentifierPools {
    pools: HashMap<Pool, PoolState>,
}

impl IdentifierPools {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `preferred` when it is valid and free, otherwise the lowest
    /// free value at or above the pool's floor.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::PoolExhausted`] when no value is left.
    pub fn allocate(&mut self, pool: Pool, preferred: Option<u32>) -> Result<u32, AllocationError> {
        if let Some(value) = preferred
            && (1..=pool.ceiling()).contains(&value)
            && !self.is_reserved(pool, value)
        {
            self.state(pool).reserved.insert(value);
            return Ok(value);
        }

        let state = self.state(pool);
        let mut candidate = state.next_free.unwrap_or(pool.floor());
        while state.reserved.contains(&candidate) {
            candidate = candidate
                .checked_add(1)
                .filter(|c| *c <= pool.ceiling())
                .ok_or(AllocationError::PoolExhausted { pool: pool.name() })?;
        }
        if candidate > pool.ceiling() {
            return Err(AllocationError::PoolExhausted { pool: pool.name() });
        }
        state.reserved.insert(candidate);
        state.next_free = candidate.checked_add(1);
        Ok(candidate)
    }

    /// Reserve exactly `value`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::DuplicateIdentifier`] when `value` is
    /// already taken, and [`AllocationError::PoolExhausted`] when it lies
    /// outside the pool.
    pub fn reserve(&mut self, pool: Pool, value: u32) -> Result<(), AllocationError> {
        if value == 0 || value > pool.ceiling() {
            return Err(AllocationError::PoolExhausted { pool: pool.name() });
        }
        if !self.state(pool).reserved.insert(value) {
            return Err(AllocationError::DuplicateIdentifier {
                pool: pool.name(),
                value,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn is_reserved(&self, pool: Pool, value: u32) -> bool {
        self.pools
            .get(&pool)
            .is_some_and(|s| s.reserved.contains(&value))
    }

    /// Number of values reserved in `pool`.
    #[must_use]
    pub fn len(&self, pool: Pool) -> usize {
        self.pools.get(&pool).map_or(0, |s| s.reserved.len())
    }

    fn state(&mut self, pool: Pool) -> &mut PoolState {
        self.pools.entry(pool).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_scan_from_floor_when_no_preference() {
        let mut pools = IdentifierPools::new();
        assert_eq!(pools.allocate(Pool::Hsnet, None).unwrap(), 101);
        assert_eq!(pools.allocate(Pool::Hsnet, None).unwrap(), 102);
        assert_eq!(pools.allocate(Pool::DeviceId, None).unwrap(), 1);
    }

    #[test]
    fn should_honour_free_preferred_value() {
        let mut pools = IdentifierPools::new();
        assert_eq!(pools.allocate(Pool::Hsnet, Some(245)).unwrap(), 245);
        assert!(pools.is_reserved(Pool::Hsnet, 245));
    }

    #[test]
    fn should_fall_back_to_scan_when_preferred_is_taken() {
        let mut pools = IdentifierPools::new();
        pools.allocate(Pool::Hsnet, Some(101)).unwrap();
        assert_eq!(pools.allocate(Pool::Hsnet, Some(101)).unwrap(), 102);
    }

    #[test]
    fn should_skip_values_reserved_above_the_cursor() {
        let mut pools = IdentifierPools::new();
        pools.reserve(Pool::UnitId, 2).unwrap();
        pools.reserve(Pool::UnitId, 3).unwrap();
        assert_eq!(pools.allocate(Pool::UnitId, None).unwrap(), 1);
        assert_eq!(pools.allocate(Pool::UnitId, None).unwrap(), 4);
    }

    #[test]
    fn should_ignore_preferred_value_outside_pool() {
        let mut pools = IdentifierPools::new();
        assert_eq!(pools.allocate(Pool::Hsnet, Some(300)).unwrap(), 101);
        assert_eq!(pools.allocate(Pool::Hsnet, Some(0)).unwrap(), 102);
    }

    #[test]
    fn should_fail_when_reserving_twice() {
        let mut pools = IdentifierPools::new();
        pools.reserve(Pool::DeviceId, 7).unwrap();
        assert_eq!(
            pools.reserve(Pool::DeviceId, 7),
            Err(AllocationError::DuplicateIdentifier {
                pool: "device id",
                value: 7
            })
        );
    }

    #[test]
    fn should_fail_with_pool_exhausted_when_bus_is_full() {
        let mut pools = IdentifierPools::new();
        for _ in 101..=254 {
            pools.allocate(Pool::Hsnet, None).unwrap();
        }
        assert_eq!(
            pools.allocate(Pool::Hsnet, None),
            Err(AllocationError::PoolExhausted { pool: "hsnet" })
        );
        assert_eq!(pools.len(Pool::Hsnet), 154);
    }

    #[test]
    fn should_still_accept_free_low_preferred_value_when_scan_range_is_full() {
        let mut pools = IdentifierPools::new();
        for _ in 101..=254 {
            pools.allocate(Pool::Hsnet, None).unwrap();
        }
        assert_eq!(pools.allocate(Pool::Hsnet, Some(12)).unwrap(), 12);
    }
}
