//! # Requirement Pool
//!
//! Fixed arena of `REQUIREMENT_MAX` requirement slots. Dynamic allocation is
//! not available in the firmware, so every master/slave pair the system can
//! ever form must fit here.
//!
//! Slots are addressed by [`ReqHandle`]: a slot index plus the generation
//! the slot had when it was handed out. Freeing a slot bumps its generation,
//! so a handle kept past teardown no longer resolves and a second free of
//! the same handle is refused. The generation is 32 bits wide; a stale
//! handle could only alias again after 2^32 reuses of its slot.
//!
//! ```text
//!  free_head ─▶ [7] ─▶ [3] ─▶ [9] ─▶ None        (free slots)
//!  [0] Occupied(gen 2)   [1] Occupied(gen 0)      (live records)
//! ```

use core::fmt;

use crate::error::{RequirementError, RequirementResult};
use crate::requirement::Requirement;
use crate::REQUIREMENT_MAX;

static_assertions::const_assert!(REQUIREMENT_MAX <= u16::MAX as usize);
static_assertions::assert_eq_size!(ReqHandle, u64);

// ============================================================================
// Handle
// ============================================================================

/// Stable reference to a pooled requirement
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReqHandle {
    index: u16,
    generation: u32,
}

impl ReqHandle {
    /// Slot index in the pool
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Generation of the slot this handle was issued for
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ReqHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReqHandle({}v{})", self.index, self.generation)
    }
}

// ============================================================================
// Slots
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum SlotState {
    /// Slot is on the free list
    Free { next: Option<u16> },
    /// Slot holds a live record
    Occupied(Requirement),
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    state: SlotState,
}

// ============================================================================
// Pool
// ============================================================================

/// Fixed-capacity requirement arena
#[derive(Debug)]
pub struct RequirementPool {
    slots: [Slot; REQUIREMENT_MAX],
    free_head: Option<u16>,
    used: usize,
}

impl RequirementPool {
    /// Create a pool with every slot free
    pub fn new() -> Self {
        let mut pool = Self {
            slots: [Slot {
                generation: 0,
                state: SlotState::Free { next: None },
            }; REQUIREMENT_MAX],
            free_head: None,
            used: 0,
        };
        pool.relink_free_list();
        pool
    }

    /// Chain every slot into the free list, lowest index first
    fn relink_free_list(&mut self) {
        let mut next = None;
        for index in (0..REQUIREMENT_MAX).rev() {
            self.slots[index].state = SlotState::Free { next };
            next = Some(index as u16);
        }
        self.free_head = next;
        self.used = 0;
    }

    /// Number of live records
    #[inline]
    pub const fn len(&self) -> usize {
        self.used
    }

    /// Whether no record is live
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Number of free slots
    #[inline]
    pub const fn available(&self) -> usize {
        REQUIREMENT_MAX - self.used
    }

    /// Total number of slots
    #[inline]
    pub const fn capacity(&self) -> usize {
        REQUIREMENT_MAX
    }

    /// Take a free slot and store `record` in it
    pub(crate) fn allocate(&mut self, record: Requirement) -> RequirementResult<ReqHandle> {
        let index = self.free_head.ok_or(RequirementError::PoolExhausted)?;
        let slot = &mut self.slots[index as usize];

        let SlotState::Free { next } = slot.state else {
            // Free list pointed at a live slot; refuse rather than overwrite.
            return Err(RequirementError::PoolExhausted);
        };

        self.free_head = next;
        slot.state = SlotState::Occupied(record);
        self.used += 1;

        Ok(ReqHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Return a slot to the pool
    ///
    /// Only the graph calls this, after the record left both index
    /// structures.
    pub(crate) fn free(&mut self, handle: ReqHandle) -> RequirementResult<Requirement> {
        let record = *self.get(handle).ok_or(RequirementError::InvalidPair)?;
        let slot = &mut self.slots[handle.index()];

        slot.generation = slot.generation.wrapping_add(1);
        slot.state = SlotState::Free {
            next: self.free_head,
        };
        self.free_head = Some(handle.index);
        self.used -= 1;

        Ok(record)
    }

    /// Release every slot at once; all outstanding handles go stale
    pub(crate) fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            if matches!(slot.state, SlotState::Occupied(_)) {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.relink_free_list();
    }

    /// Resolve a handle
    pub fn get(&self, handle: ReqHandle) -> Option<&Requirement> {
        let slot = self.slots.get(handle.index())?;
        match &slot.state {
            SlotState::Occupied(record) if slot.generation == handle.generation => Some(record),
            _ => None,
        }
    }

    /// Resolve a handle mutably
    pub(crate) fn get_mut(&mut self, handle: ReqHandle) -> Option<&mut Requirement> {
        let slot = self.slots.get_mut(handle.index())?;
        match &mut slot.state {
            SlotState::Occupied(record) if slot.generation == handle.generation => Some(record),
            _ => None,
        }
    }

    /// Whether `handle` names a live record
    #[inline]
    pub fn contains(&self, handle: ReqHandle) -> bool {
        self.get(handle).is_some()
    }
}

impl Default for RequirementPool {
    fn default() -> Self {
        Self::new()
    }
}
