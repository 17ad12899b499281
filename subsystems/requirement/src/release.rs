//! # Request / Release Engine
//!
//! Immediate-effect changes of a master's requirements. A request replaces
//! the current capabilities outright. A release drops them back to the
//! master's default floor, never below.
//!
//! The bookkeeping change always stands. If the slave's state machine
//! refuses the new aggregate, the refusal is handed back to the caller and
//! the record keeps describing what the master wants.

use crate::control::SlaveControl;
use crate::error::{RequirementError, RequirementResult};
use crate::manager::RequirementManager;
use crate::pool::ReqHandle;
use crate::types::{Capabilities, ReleaseScope};

impl<C: SlaveControl> RequirementManager<C> {
    /// Master requests `caps` from the slave
    pub fn request(&mut self, handle: ReqHandle, caps: Capabilities) -> RequirementResult<()> {
        let record = self.record_mut(handle)?;
        let wakeup_dropped = record.mark_requested();
        let caps_changed = record.update_current(caps);
        let slave = record.slave();
        log::trace!("requirement: {} requests {:#x} from {}", record.master(), caps.bits(), slave);

        if caps_changed || wakeup_dropped {
            self.notify(slave)
        } else {
            Ok(())
        }
    }

    /// Change the current capabilities without touching the request state
    ///
    /// The slave must offer `caps`; otherwise nothing is recorded.
    pub fn update(&mut self, handle: ReqHandle, caps: Capabilities) -> RequirementResult<()> {
        let slave = self
            .requirement(handle)
            .ok_or(RequirementError::InvalidPair)?
            .slave();
        self.check_capabilities(slave, caps)?;

        if self.record_mut(handle)?.update_current(caps) {
            self.notify(slave)
        } else {
            Ok(())
        }
    }

    /// Release requirements, starting from `first`
    ///
    /// With [`ReleaseScope::All`] and [`ReleaseScope::Unrequested`] the
    /// whole list of `first`'s master is walked, including `first`.
    pub fn release(&mut self, first: ReqHandle, scope: ReleaseScope) -> RequirementResult<()> {
        let record = self.record_mut(first)?;
        let master = record.master();

        match scope {
            ReleaseScope::One => {
                let slave = record.slave();
                log::trace!("requirement: {} releases {}", master, slave);
                if record.release() {
                    self.notify(slave)
                } else {
                    Ok(())
                }
            },
            ReleaseScope::All => {
                log::trace!("requirement: {} releases all slaves", master);
                self.for_each_of_master(master, |_, record| {
                    Ok(record.release().then_some(record.slave()))
                })
            },
            ReleaseScope::Unrequested => {
                log::trace!("requirement: {} releases unrequested slaves", master);
                self.for_each_of_master(master, |_, record| {
                    if record.is_requested() {
                        return Ok(None);
                    }
                    Ok(record.release().then_some(record.slave()))
                })
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::control::mock::MockControl;
    use crate::control::TransitionError;
    use crate::error::RequirementError;
    use crate::manager::RequirementManager;
    use crate::types::{Capabilities, CommitMode, MasterId, ReleaseScope, ReqFlags, SlaveId};

    const M1: MasterId = MasterId::new(1);
    const M2: MasterId = MasterId::new(2);
    const S1: SlaveId = SlaveId::new(10);
    const S2: SlaveId = SlaveId::new(11);
    const S3: SlaveId = SlaveId::new(12);

    const ACCESS: Capabilities = Capabilities::ACCESS;
    const FULL: Capabilities = Capabilities::from_bits_retain(0b0111);

    fn manager() -> RequirementManager<MockControl> {
        RequirementManager::new(MockControl::new())
    }

    #[test]
    fn test_request_replaces_current() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        mgr.request(handle, FULL).unwrap();
        mgr.request(handle, ACCESS).unwrap();

        let record = mgr.requirement(handle).unwrap();
        assert_eq!(record.current(), ACCESS);
        assert!(record.is_requested());
        assert_eq!(mgr.control().last_demand(S1).unwrap().capabilities, ACCESS);
    }

    #[test]
    fn test_request_clears_wakeup() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        mgr.set_wakeup(handle, true).unwrap();
        mgr.request(handle, Capabilities::empty()).unwrap();

        assert!(!mgr.requirement(handle).unwrap().wakeup_requested());
        assert!(!mgr.control().last_demand(S1).unwrap().wakeup);
    }

    #[test]
    fn test_request_then_release_keeps_default() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        mgr.set_config(handle, ReqFlags::empty(), Capabilities::empty(), ACCESS)
            .unwrap();

        mgr.request(handle, FULL).unwrap();
        mgr.release(handle, ReleaseScope::One).unwrap();

        let record = mgr.requirement(handle).unwrap();
        assert_eq!(record.current(), ACCESS);
        assert!(!record.is_requested());
    }

    #[test]
    fn test_rejected_request_is_recorded() {
        let mut mgr = RequirementManager::new(MockControl::rejecting(S1));
        let handle = mgr.add(M1, S1).unwrap();

        let err = mgr.request(handle, FULL).unwrap_err();
        assert_eq!(
            err,
            RequirementError::TransitionRejected {
                slave: S1,
                cause: TransitionError::Busy,
            }
        );
        assert_eq!(mgr.requirement(handle).unwrap().current(), FULL);
        assert!(mgr.requirement(handle).unwrap().is_requested());
    }

    #[test]
    fn test_release_all() {
        let mut mgr = manager();
        let a = mgr.add(M1, S1).unwrap();
        let b = mgr.add(M1, S2).unwrap();
        let other = mgr.add(M2, S1).unwrap();
        mgr.request(a, FULL).unwrap();
        mgr.request(b, FULL).unwrap();
        mgr.request(other, ACCESS).unwrap();

        mgr.release(b, ReleaseScope::All).unwrap();

        assert!(mgr.requirement(a).unwrap().current().is_empty());
        assert!(mgr.requirement(b).unwrap().current().is_empty());
        assert_eq!(mgr.requirement(other).unwrap().current(), ACCESS);
        assert_eq!(mgr.control().last_demand(S1).unwrap().capabilities, ACCESS);
        assert!(mgr.control().last_demand(S2).unwrap().is_idle());
    }

    #[test]
    fn test_release_unrequested_skips_requested() {
        let mut mgr = manager();
        let confirmed = mgr.add(M1, S1).unwrap();
        let speculative = mgr.add(M1, S2).unwrap();
        let floor = mgr.add(M1, S3).unwrap();

        mgr.request(confirmed, FULL).unwrap();
        mgr.set_config(speculative, ReqFlags::empty(), FULL, Capabilities::empty())
            .unwrap();
        mgr.set_config(floor, ReqFlags::empty(), FULL, ACCESS).unwrap();

        mgr.release(confirmed, ReleaseScope::Unrequested).unwrap();

        assert_eq!(mgr.requirement(confirmed).unwrap().current(), FULL);
        assert!(mgr.requirement(confirmed).unwrap().is_requested());
        assert!(mgr.requirement(speculative).unwrap().current().is_empty());
        assert_eq!(mgr.requirement(floor).unwrap().current(), ACCESS);
    }

    #[test]
    fn test_release_all_reports_first_rejection() {
        let mut mgr = manager();
        let a = mgr.add(M1, S1).unwrap();
        let b = mgr.add(M1, S2).unwrap();
        mgr.request(a, FULL).unwrap();
        mgr.request(b, FULL).unwrap();
        mgr.control_mut().reject = Some(S2);

        let err = mgr.release(a, ReleaseScope::All).unwrap_err();
        assert!(matches!(err, RequirementError::TransitionRejected { slave, .. } if slave == S2));

        // The other slave was still released.
        assert!(mgr.requirement(a).unwrap().current().is_empty());
        assert!(mgr.requirement(b).unwrap().current().is_empty());
        assert!(mgr.control().last_demand(S1).unwrap().is_idle());
    }

    #[test]
    fn test_release_without_change_is_silent() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        mgr.release(handle, ReleaseScope::One).unwrap();
        assert_eq!(mgr.control().calls_for(S1), 0);
    }

    #[test]
    fn test_update_checks_capabilities() {
        let mut mgr = manager();
        mgr.control_mut().unsupported = Capabilities::WAKEUP;
        let handle = mgr.add(M1, S1).unwrap();

        assert_eq!(
            mgr.update(handle, FULL),
            Err(RequirementError::UnsupportedCapabilities {
                slave: S1,
                capabilities: FULL,
            })
        );
        assert!(mgr.requirement(handle).unwrap().current().is_empty());

        mgr.update(handle, ACCESS).unwrap();
        let record = mgr.requirement(handle).unwrap();
        assert_eq!(record.current(), ACCESS);
        assert!(!record.is_requested());
    }

    #[test]
    fn test_request_after_swap_survives_later_commit() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        let other = mgr.add(M1, S2).unwrap();
        mgr.request(handle, ACCESS).unwrap();
        mgr.schedule(handle, Capabilities::CONTEXT).unwrap();
        mgr.update_scheduled(M1, CommitMode::Swap).unwrap();

        mgr.request(handle, ACCESS | Capabilities::WAKEUP).unwrap();
        assert!(!mgr.requirement(handle).unwrap().has_scheduled());

        mgr.schedule(other, ACCESS).unwrap();
        mgr.update_scheduled(M1, CommitMode::Replace).unwrap();

        assert_eq!(
            mgr.requirement(handle).unwrap().current(),
            ACCESS | Capabilities::WAKEUP
        );
        assert_eq!(mgr.requirement(other).unwrap().current(), ACCESS);
    }

    #[test]
    fn test_update_drops_staged_value() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        mgr.schedule(handle, FULL).unwrap();
        mgr.update(handle, ACCESS).unwrap();

        let calls = mgr.control().calls_for(S1);
        mgr.update_scheduled(M1, CommitMode::Replace).unwrap();
        assert_eq!(mgr.requirement(handle).unwrap().current(), ACCESS);
        assert_eq!(mgr.control().calls_for(S1), calls);
    }

    #[test]
    fn test_stale_handle() {
        let mut mgr = manager();
        let handle = mgr.add(M1, S1).unwrap();
        mgr.remove_all(M1);

        assert_eq!(mgr.request(handle, ACCESS), Err(RequirementError::InvalidPair));
        assert_eq!(
            mgr.release(handle, ReleaseScope::All),
            Err(RequirementError::InvalidPair)
        );
        assert_eq!(mgr.update(handle, ACCESS), Err(RequirementError::InvalidPair));
    }
}
