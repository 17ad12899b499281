//! # Requirement Graph
//!
//! Many-to-many relation between masters and slaves, built over the pool.
//! Every record is a member of two singly-linked lists at once:
//!
//! ```text
//!   master_heads[M1] ─▶ (M1,S3) ─▶ (M1,S1) ─▶ None      (master_next)
//!                          │          │
//!   slave_heads[S1] ─▶ (M2,S1) ─▶ (M1,S1) ─▶ None      (slave_next)
//! ```
//!
//! The links are not stored in the records. They live in two arrays indexed
//! by pool slot, so walking one list while mutating a record never aliases
//! the record through the other list. A record leaves both lists before its
//! slot goes back to the pool.

use heapless::FnvIndexMap;

use crate::error::{RequirementError, RequirementResult};
use crate::pool::{ReqHandle, RequirementPool};
use crate::requirement::Requirement;
use crate::types::{MasterId, SlaveId};
use crate::{MAX_MASTERS, MAX_SLAVES, REQUIREMENT_MAX};

// Every node in a head map owns at least one record, so the maps can never
// fill up before the pool does.
static_assertions::const_assert!(MAX_MASTERS >= REQUIREMENT_MAX);
static_assertions::const_assert!(MAX_SLAVES >= REQUIREMENT_MAX);

/// Dual-indexed set of requirement records
#[derive(Debug)]
pub struct RequirementGraph {
    pool: RequirementPool,
    /// Next record of the same master, by slot index
    master_next: [Option<ReqHandle>; REQUIREMENT_MAX],
    /// Next record of the same slave, by slot index
    slave_next: [Option<ReqHandle>; REQUIREMENT_MAX],
    master_heads: FnvIndexMap<MasterId, ReqHandle, MAX_MASTERS>,
    slave_heads: FnvIndexMap<SlaveId, ReqHandle, MAX_SLAVES>,
}

impl RequirementGraph {
    /// Create an empty graph over a fresh pool
    pub fn new() -> Self {
        Self {
            pool: RequirementPool::new(),
            master_next: [None; REQUIREMENT_MAX],
            slave_next: [None; REQUIREMENT_MAX],
            master_heads: FnvIndexMap::new(),
            slave_heads: FnvIndexMap::new(),
        }
    }

    /// Underlying pool
    #[inline]
    pub fn pool(&self) -> &RequirementPool {
        &self.pool
    }

    /// Resolve a handle
    #[inline]
    pub fn record(&self, handle: ReqHandle) -> Option<&Requirement> {
        self.pool.get(handle)
    }

    #[inline]
    pub(crate) fn record_mut(&mut self, handle: ReqHandle) -> RequirementResult<&mut Requirement> {
        self.pool.get_mut(handle).ok_or(RequirementError::InvalidPair)
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    /// Find the record for a pair
    pub fn get(&self, master: MasterId, slave: SlaveId) -> Option<ReqHandle> {
        self.master_list(master)
            .find(|&handle| self.pool.get(handle).is_some_and(|r| r.slave() == slave))
    }

    /// First requester in the slave's list, if anyone requires it
    pub fn any_master_for(&self, slave: SlaveId) -> Option<ReqHandle> {
        self.slave_heads.get(&slave).copied()
    }

    /// First record of the master's list
    #[inline]
    pub fn master_head(&self, master: MasterId) -> Option<ReqHandle> {
        self.master_heads.get(&master).copied()
    }

    /// Record following `handle` in its master's list
    ///
    /// `None` for a stale handle as well as for the last record.
    #[inline]
    pub fn next_of_master(&self, handle: ReqHandle) -> Option<ReqHandle> {
        self.pool.contains(handle).then(|| self.master_next[handle.index()])?
    }

    /// Record following `handle` in its slave's list
    ///
    /// `None` for a stale handle as well as for the last record.
    #[inline]
    pub fn next_of_slave(&self, handle: ReqHandle) -> Option<ReqHandle> {
        self.pool.contains(handle).then(|| self.slave_next[handle.index()])?
    }

    /// Records of a master, most recently added first
    pub fn master_list(&self, master: MasterId) -> ListIter<'_> {
        ListIter {
            links: &self.master_next,
            cursor: self.master_head(master),
        }
    }

    /// Records naming a slave, most recently added first
    pub fn slave_list(&self, slave: SlaveId) -> ListIter<'_> {
        ListIter {
            links: &self.slave_next,
            cursor: self.any_master_for(slave),
        }
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    /// Record for a pair, creating it on first use
    pub fn add(&mut self, master: MasterId, slave: SlaveId) -> RequirementResult<ReqHandle> {
        if let Some(handle) = self.get(master, slave) {
            return Ok(handle);
        }

        let handle = self.pool.allocate(Requirement::new(master, slave))?;
        let master_head = self.master_head(master);
        let slave_head = self.any_master_for(slave);

        if self.master_heads.insert(master, handle).is_err()
            || self.slave_heads.insert(slave, handle).is_err()
        {
            // Roll back whichever head was installed; the slot was never
            // linked anywhere else.
            self.restore_head_master(master, master_head);
            self.restore_head_slave(slave, slave_head);
            if self.pool.free(handle).is_err() {
                log::warn!("requirement: rollback could not free {:?}", handle);
            }
            return Err(RequirementError::PoolExhausted);
        }

        self.master_next[handle.index()] = master_head;
        self.slave_next[handle.index()] = slave_head;
        Ok(handle)
    }

    fn restore_head_master(&mut self, master: MasterId, head: Option<ReqHandle>) {
        match head {
            Some(head) => {
                if self.master_heads.insert(master, head).is_err() {
                    log::warn!("requirement: lost list head of {}", master);
                }
            },
            None => {
                self.master_heads.remove(&master);
            },
        }
    }

    fn restore_head_slave(&mut self, slave: SlaveId, head: Option<ReqHandle>) {
        match head {
            Some(head) => {
                if self.slave_heads.insert(slave, head).is_err() {
                    log::warn!("requirement: lost list head of {}", slave);
                }
            },
            None => {
                self.slave_heads.remove(&slave);
            },
        }
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    /// Take `handle` out of its slave's list
    fn unlink_from_slave(&mut self, slave: SlaveId, handle: ReqHandle) -> bool {
        let next = self.slave_next[handle.index()];
        self.slave_next[handle.index()] = None;

        if self.any_master_for(slave) == Some(handle) {
            match next {
                Some(next) => {
                    if self.slave_heads.insert(slave, next).is_err() {
                        log::warn!("requirement: lost list head of {}", slave);
                    }
                },
                None => {
                    self.slave_heads.remove(&slave);
                },
            }
            return true;
        }

        let mut cursor = self.any_master_for(slave);
        while let Some(current) = cursor {
            let following = self.slave_next[current.index()];
            if following == Some(handle) {
                self.slave_next[current.index()] = next;
                return true;
            }
            cursor = following;
        }
        false
    }

    /// Tear down every record of a master
    ///
    /// Each record leaves its slave's list before its slot is freed.
    /// Returns the number of slots given back to the pool.
    pub fn remove_all(&mut self, master: MasterId) -> usize {
        let mut cursor = self.master_heads.remove(&master);
        let mut freed = 0;

        while let Some(handle) = cursor {
            cursor = self.master_next[handle.index()];
            self.master_next[handle.index()] = None;

            let Some(slave) = self.pool.get(handle).map(Requirement::slave) else {
                continue;
            };
            if !self.unlink_from_slave(slave, handle) {
                log::warn!("requirement: {:?} missing from {} list", handle, slave);
            }
            if self.pool.free(handle).is_ok() {
                freed += 1;
            }
        }

        freed
    }

    /// Drop every record of every master
    pub fn clear(&mut self) {
        self.pool.reset();
        self.master_next = [None; REQUIREMENT_MAX];
        self.slave_next = [None; REQUIREMENT_MAX];
        self.master_heads.clear();
        self.slave_heads.clear();
    }
}

impl Default for RequirementGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk over one intrusive list of handles
#[derive(Debug, Clone)]
pub struct ListIter<'a> {
    links: &'a [Option<ReqHandle>; REQUIREMENT_MAX],
    cursor: Option<ReqHandle>,
}

impl Iterator for ListIter<'_> {
    type Item = ReqHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        self.cursor = self.links[handle.index()];
        Some(handle)
    }
}
