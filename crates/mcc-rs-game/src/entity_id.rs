//! Per-world pool of small entity ids.

use mcc_rs_proto::types::EntityId;

use crate::error::AllocError;

/// Largest pool a world can have; ids must fit in a positive `i8`.
pub const MAX_CAPACITY: usize = 127;

/// Hands out ids `0..capacity`, lowest free first.
///
/// Each id is either free or assigned; callers pair every successful
/// [`allocate`](Self::allocate) with exactly one [`release`](Self::release).
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    assigned: Vec<bool>,
    in_use: usize,
}

impl EntityAllocator {
    pub fn new(capacity: usize) -> Result<Self, AllocError> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(AllocError::InvalidCapacity(capacity));
        }
        Ok(Self {
            assigned: vec![false; capacity],
            in_use: 0,
        })
    }

    pub fn allocate(&mut self) -> Result<EntityId, AllocError> {
        let slot = self
            .assigned
            .iter()
            .position(|used| !used)
            .ok_or(AllocError::CapacityExceeded {
                capacity: self.capacity(),
            })?;
        self.assigned[slot] = true;
        self.in_use += 1;
        Ok(EntityId(slot as i8))
    }

    pub fn release(&mut self, id: EntityId) -> Result<(), AllocError> {
        let slot = usize::try_from(id.0).map_err(|_| AllocError::NotAssigned(id))?;
        match self.assigned.get_mut(slot) {
            Some(used) if *used => {
                *used = false;
                self.in_use -= 1;
                Ok(())
            }
            _ => Err(AllocError::NotAssigned(id)),
        }
    }

    pub fn is_assigned(&self, id: EntityId) -> bool {
        usize::try_from(id.0)
            .ok()
            .and_then(|slot| self.assigned.get(slot).copied())
            .unwrap_or(false)
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn capacity(&self) -> usize {
        self.assigned.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_lowest_free() {
        let mut pool = EntityAllocator::new(4).unwrap();
        assert_eq!(pool.allocate().unwrap(), EntityId(0));
        assert_eq!(pool.allocate().unwrap(), EntityId(1));
        assert_eq!(pool.allocate().unwrap(), EntityId(2));
        pool.release(EntityId(1)).unwrap();
        assert_eq!(pool.allocate().unwrap(), EntityId(1));
        assert_eq!(pool.in_use(), 3);
    }

    #[test]
    fn exhaustion() {
        let mut pool = EntityAllocator::new(2).unwrap();
        pool.allocate().unwrap();
        pool.allocate().unwrap();
        assert!(matches!(
            pool.allocate(),
            Err(AllocError::CapacityExceeded { capacity: 2 })
        ));
    }

    #[test]
    fn release_unassigned_fails() {
        let mut pool = EntityAllocator::new(3).unwrap();
        assert!(matches!(
            pool.release(EntityId(0)),
            Err(AllocError::NotAssigned(EntityId(0)))
        ));
        assert!(pool.release(EntityId::SELF).is_err());
        assert!(pool.release(EntityId(100)).is_err());
        let id = pool.allocate().unwrap();
        pool.release(id).unwrap();
        assert!(pool.release(id).is_err());
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn never_hands_out_self() {
        let mut pool = EntityAllocator::new(MAX_CAPACITY).unwrap();
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..MAX_CAPACITY {
            let id = pool.allocate().unwrap();
            assert!(!id.is_self());
            assert!(id.0 >= 0);
            assert!(seen.insert(id));
        }
        assert!(pool.allocate().is_err());
    }

    #[test]
    fn capacity_bounds() {
        assert!(EntityAllocator::new(0).is_err());
        assert!(EntityAllocator::new(128).is_err());
        assert_eq!(EntityAllocator::new(127).unwrap().capacity(), 127);
    }
}
