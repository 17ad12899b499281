//! # Requirement Manager
//!
//! The context object every requirement operation goes through. It owns the
//! graph (and through it the pool) and the handle to the slave state
//! machine. The firmware builds one at init and keeps it for its lifetime;
//! tests build a fresh one per case.
//!
//! Operations are split by concern:
//!
//! | Concern              | Module       |
//! |----------------------|--------------|
//! | Pairing, config      | this module  |
//! | Request / release    | `release`    |
//! | Schedule / commit    | `schedule`   |
//! | Boot and wake hooks  | `hooks`      |

use crate::control::{SlaveControl, SlaveDemand};
use crate::error::{RequirementError, RequirementResult};
use crate::graph::{ListIter, RequirementGraph};
use crate::pool::ReqHandle;
use crate::requirement::Requirement;
#[cfg(feature = "stats")]
use crate::stats::RequirementStats;
use crate::types::{Capabilities, MasterId, ReqFlags, SlaveId};

/// Requirement tracking context
#[derive(Debug)]
pub struct RequirementManager<C: SlaveControl> {
    pub(crate) graph: RequirementGraph,
    pub(crate) control: C,
    #[cfg(feature = "stats")]
    pub(crate) stats: RequirementStats,
}

impl<C: SlaveControl> RequirementManager<C> {
    /// Create an empty context driving `control`
    pub fn new(control: C) -> Self {
        Self {
            graph: RequirementGraph::new(),
            control,
            #[cfg(feature = "stats")]
            stats: RequirementStats::new(),
        }
    }

    /// Underlying graph
    #[inline]
    pub fn graph(&self) -> &RequirementGraph {
        &self.graph
    }

    /// Slave state machine
    #[inline]
    pub fn control(&self) -> &C {
        &self.control
    }

    /// Slave state machine, mutably
    #[inline]
    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    /// Counters
    #[cfg(feature = "stats")]
    #[inline]
    pub fn stats(&self) -> &RequirementStats {
        &self.stats
    }

    /// Resolve a handle
    #[inline]
    pub fn requirement(&self, handle: ReqHandle) -> Option<&Requirement> {
        self.graph.record(handle)
    }

    #[inline]
    pub(crate) fn record_mut(&mut self, handle: ReqHandle) -> RequirementResult<&mut Requirement> {
        self.graph.record_mut(handle)
    }

    // ========================================================================
    // Pairing
    // ========================================================================

    /// Requirement for a pair, created on first use
    pub fn add(&mut self, master: MasterId, slave: SlaveId) -> RequirementResult<ReqHandle> {
        let existing = self.graph.get(master, slave);
        let result = self.graph.add(master, slave);

        match result {
            Ok(handle) if existing.is_none() => {
                log::debug!("requirement: paired {} with {}", master, slave);
                #[cfg(feature = "stats")]
                self.stats.record_alloc(self.graph.pool().len());
                Ok(handle)
            },
            Ok(handle) => Ok(handle),
            Err(err) => {
                log::warn!(
                    "requirement: cannot pair {} with {}: {}",
                    master,
                    slave,
                    err
                );
                #[cfg(feature = "stats")]
                self.stats.record_exhausted();
                Err(err)
            },
        }
    }

    /// Requirement for a pair, if it was added
    #[inline]
    pub fn get(&self, master: MasterId, slave: SlaveId) -> Option<ReqHandle> {
        self.graph.get(master, slave)
    }

    /// Some requirement naming the slave, if any master requires it
    #[inline]
    pub fn get_any_master_for(&self, slave: SlaveId) -> Option<ReqHandle> {
        self.graph.any_master_for(slave)
    }

    /// Handles of a master's requirements
    #[inline]
    pub fn master_requirements(&self, master: MasterId) -> ListIter<'_> {
        self.graph.master_list(master)
    }

    /// Tear down every requirement of a master
    ///
    /// Returns the number of slots given back to the pool. Slaves are not
    /// notified; the caller shuts the master's slaves down through the
    /// state machine itself.
    pub fn remove_all(&mut self, master: MasterId) -> usize {
        let freed = self.graph.remove_all(master);
        log::debug!("requirement: {} released {} slot(s)", master, freed);
        #[cfg(feature = "stats")]
        self.stats.record_free(freed);
        freed
    }

    /// Return every requirement of every master to the pool
    pub fn free_all(&mut self) {
        let live = self.graph.pool().len();
        self.graph.clear();
        log::info!("requirement: pool reset, {} record(s) dropped", live);
        #[cfg(feature = "stats")]
        self.stats.record_free(live);
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// One-time initial shape of a freshly added requirement
    ///
    /// Must be called before any runtime traffic on the record; calling it
    /// later overwrites whatever is in flight.
    pub fn set_config(
        &mut self,
        handle: ReqHandle,
        flags: ReqFlags,
        current: Capabilities,
        default_req: Capabilities,
    ) -> RequirementResult<()> {
        self.record_mut(handle)?.configure(flags, current, default_req);
        Ok(())
    }

    /// Capabilities the master needs before it can request anything
    pub fn set_pre_requirement(
        &mut self,
        handle: ReqHandle,
        caps: Capabilities,
    ) -> RequirementResult<()> {
        self.record_mut(handle)?.set_pre_requirement(caps);
        Ok(())
    }

    /// Floor the requirement never drops below while the master runs
    pub fn set_default_requirement(
        &mut self,
        handle: ReqHandle,
        caps: Capabilities,
    ) -> RequirementResult<()> {
        self.record_mut(handle)?.set_default_requirement(caps);
        Ok(())
    }

    /// Latency bound of the master for the slave
    pub fn set_latency(&mut self, handle: ReqHandle, latency: u32) -> RequirementResult<()> {
        let record = self.record_mut(handle)?;
        let changed = record.latency_bound() != Some(latency);
        record.set_latency(latency);
        let slave = record.slave();
        if changed {
            self.notify(slave)
        } else {
            Ok(())
        }
    }

    /// Flag or unflag the slave as a wake-up source of the master
    pub fn set_wakeup(&mut self, handle: ReqHandle, enable: bool) -> RequirementResult<()> {
        let record = self.record_mut(handle)?;
        let changed = record.wakeup_requested() != enable;
        record.set_wakeup(enable);
        let slave = record.slave();
        if changed {
            self.notify(slave)
        } else {
            Ok(())
        }
    }

    /// Forget a record's runtime and configured state, keeping the pair
    pub fn clear(&mut self, handle: ReqHandle) -> RequirementResult<()> {
        self.record_mut(handle)?.clear();
        Ok(())
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    /// What all requesters of a slave demand together
    pub fn slave_demand(&self, slave: SlaveId) -> SlaveDemand {
        self.graph
            .slave_list(slave)
            .filter_map(|handle| self.graph.record(handle))
            .fold(SlaveDemand::IDLE, |mut demand, record| {
                demand.capabilities |= record.current();
                if let Some(latency) = record.latency_bound() {
                    demand.latency = demand.latency.min(latency);
                }
                demand.wakeup |= record.wakeup_requested();
                demand
            })
    }

    /// Push the slave's aggregate demand to the state machine
    pub(crate) fn notify(&mut self, slave: SlaveId) -> RequirementResult<()> {
        let demand = self.slave_demand(slave);
        match self.control.update_slave(slave, demand) {
            Ok(()) => Ok(()),
            Err(cause) => {
                log::warn!("requirement: {} refused {:?}: {}", slave, demand, cause);
                #[cfg(feature = "stats")]
                self.stats.record_rejected();
                Err(RequirementError::TransitionRejected { slave, cause })
            },
        }
    }

    /// Fail unless the slave can offer `caps`
    pub(crate) fn check_capabilities(
        &self,
        slave: SlaveId,
        caps: Capabilities,
    ) -> RequirementResult<()> {
        if self.control.check_capabilities(slave, caps) {
            Ok(())
        } else {
            Err(RequirementError::UnsupportedCapabilities {
                slave,
                capabilities: caps,
            })
        }
    }

    /// Run `op` on every record of a master, reporting the first error
    ///
    /// `op` returns the slave to notify when the record changed.
    pub(crate) fn for_each_of_master<F>(&mut self, master: MasterId, mut op: F) -> RequirementResult<()>
    where
        F: FnMut(&C, &mut Requirement) -> RequirementResult<Option<SlaveId>>,
    {
        let mut status = Ok(());
        let mut cursor = self.graph.master_head(master);

        while let Some(handle) = cursor {
            cursor = self.graph.next_of_master(handle);

            let Ok(record) = self.graph.record_mut(handle) else {
                continue;
            };
            let result = match op(&self.control, record) {
                Ok(Some(slave)) => self.notify(slave),
                Ok(None) => Ok(()),
                Err(err) => Err(err),
            };
            crate::error::keep_first(&mut status, result);
        }

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::mock::MockControl;
    use crate::MAX_LATENCY;

    const M1: MasterId = MasterId::new(1);
    const M2: MasterId = MasterId::new(2);
    const S1: SlaveId = SlaveId::new(10);
    const S2: SlaveId = SlaveId::new(11);

    fn manager() -> RequirementManager<MockControl> {
        RequirementManager::new(MockControl::new())
    }

    #[test]
    fn test_add_get() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        assert_eq!(mgr.add(M1, S1).unwrap(), handle);
        assert_eq!(mgr.get(M1, S1), Some(handle));
        assert_eq!(mgr.get(M2, S1), None);
        assert_eq!(mgr.get_any_master_for(S1), Some(handle));
        assert_eq!(mgr.get_any_master_for(S2), None);
    }

    #[test]
    fn test_set_config_on_stale_handle() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        assert_eq!(mgr.remove_all(M1), 1);
        assert_eq!(
            mgr.set_config(handle, ReqFlags::empty(), Capabilities::empty(), Capabilities::empty()),
            Err(RequirementError::InvalidPair)
        );
    }

    #[test]
    fn test_set_config_does_not_notify() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        mgr.set_config(handle, ReqFlags::REQUESTED, Capabilities::ACCESS, Capabilities::ACCESS)
            .unwrap();

        let record = mgr.requirement(handle).unwrap();
        assert!(record.is_requested());
        assert_eq!(record.current(), Capabilities::ACCESS);
        assert!(mgr.control().updates.is_empty());
    }

    #[test]
    fn test_slave_demand_aggregates_requesters() {
        let mut mgr = manager();
        let a = mgr.add(M1, S1).unwrap();
        let b = mgr.add(M2, S1).unwrap();
        mgr.set_config(a, ReqFlags::empty(), Capabilities::ACCESS, Capabilities::empty())
            .unwrap();
        mgr.set_config(b, ReqFlags::empty(), Capabilities::CONTEXT, Capabilities::empty())
            .unwrap();
        mgr.set_latency(a, 500).unwrap();
        mgr.set_latency(b, 200).unwrap();
        mgr.set_wakeup(b, true).unwrap();

        let demand = mgr.slave_demand(S1);
        assert_eq!(demand.capabilities, Capabilities::ACCESS | Capabilities::CONTEXT);
        assert_eq!(demand.latency, 200);
        assert!(demand.wakeup);
        assert!(mgr.slave_demand(S2).is_idle());
    }

    #[test]
    fn test_set_latency_notifies_once() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        mgr.set_latency(handle, 1000).unwrap();
        mgr.set_latency(handle, 1000).unwrap();
        assert_eq!(mgr.control().calls_for(S1), 1);
        assert_eq!(mgr.control().last_demand(S1).unwrap().latency, 1000);
    }

    #[test]
    fn test_clear_resets_record() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        mgr.set_config(handle, ReqFlags::REQUESTED, Capabilities::ACCESS, Capabilities::ACCESS)
            .unwrap();
        mgr.set_latency(handle, 10).unwrap();
        mgr.clear(handle).unwrap();

        let record = mgr.requirement(handle).unwrap();
        assert!(record.current().is_empty());
        assert!(record.flags().is_empty());
        assert_eq!(record.latency(), MAX_LATENCY);
        assert_eq!(mgr.get(M1, S1), Some(handle));
    }

    #[test]
    fn test_remove_all_then_get() {
        let mut mgr = manager();
        mgr.add(M1, S1).unwrap();
        mgr.add(M1, S2).unwrap();
        let other = mgr.add(M2, S1).unwrap();

        assert_eq!(mgr.remove_all(M1), 2);
        assert_eq!(mgr.graph().pool().len(), 1);
        assert!(mgr.get(M1, S1).is_none());
        assert!(mgr.get(M1, S2).is_none());
        assert_eq!(mgr.get_any_master_for(S1), Some(other));
        assert_eq!(mgr.get_any_master_for(S2), None);
        assert_eq!(mgr.master_requirements(M1).count(), 0);
    }

    #[test]
    fn test_free_all() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        mgr.add(M2, S2).unwrap();
        mgr.free_all();

        assert!(mgr.graph().pool().is_empty());
        assert!(mgr.requirement(handle).is_none());
        assert!(mgr.get_any_master_for(S1).is_none());
    }

    #[cfg(feature = "stats")]
    #[test]
    fn test_stats_track_pool() {
        let mut mgr = manager();
        mgr.add(M1, S1).unwrap();
        mgr.add(M1, S1).unwrap();
        mgr.add(M1, S2).unwrap();
        mgr.remove_all(M1);

        assert_eq!(mgr.stats().allocations, 2);
        assert_eq!(mgr.stats().frees, 2);
        assert_eq!(mgr.stats().peak, 2);
    }
}
