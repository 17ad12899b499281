//! # Requirement Record
//!
//! One record exists per (master, slave) pair. It holds three horizons of
//! what the master needs from the slave:
//!
//! ```text
//!   pre_req ──(pre-request)──▶ current ◀──(commit)── scheduled
//!                                 │
//!                           (release)
//!                                 ▼
//!                              default
//! ```
//!
//! The methods here only touch the record itself. Pushing the new aggregate
//! to the slave's state machine is done by the manager.

use crate::types::{Capabilities, CommitMode, MasterId, ReqFlags, SlaveId, MAX_LATENCY};

/// Requirement of one master for one slave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    /// Slave the requirement is for
    slave: SlaveId,
    /// Master holding the requirement
    master: MasterId,
    /// Capabilities needed before the master can issue requests itself
    pre_req: Capabilities,
    /// Capabilities the master cannot run without
    default_req: Capabilities,
    /// Capabilities currently in force
    current: Capabilities,
    /// Capabilities staged for the next commit
    scheduled: Capabilities,
    /// Tolerated slave wake-up latency
    latency: u32,
    /// Request information
    flags: ReqFlags,
}

impl Requirement {
    /// Fresh record with every numeric field zeroed
    pub(crate) const fn new(master: MasterId, slave: SlaveId) -> Self {
        Self {
            slave,
            master,
            pre_req: Capabilities::empty(),
            default_req: Capabilities::empty(),
            current: Capabilities::empty(),
            scheduled: Capabilities::empty(),
            latency: MAX_LATENCY,
            flags: ReqFlags::empty(),
        }
    }

    /// Slave of this pair
    #[inline]
    pub const fn slave(&self) -> SlaveId {
        self.slave
    }

    /// Master of this pair
    #[inline]
    pub const fn master(&self) -> MasterId {
        self.master
    }

    /// Boot-mandatory capabilities
    #[inline]
    pub const fn pre_requirement(&self) -> Capabilities {
        self.pre_req
    }

    /// Default capabilities
    #[inline]
    pub const fn default_requirement(&self) -> Capabilities {
        self.default_req
    }

    /// Capabilities currently in force
    #[inline]
    pub const fn current(&self) -> Capabilities {
        self.current
    }

    /// Capabilities staged for the next commit
    #[inline]
    pub const fn scheduled(&self) -> Capabilities {
        self.scheduled
    }

    /// Latency bound, `MAX_LATENCY` when unset
    #[inline]
    pub const fn latency(&self) -> u32 {
        self.latency
    }

    /// Request information flags
    #[inline]
    pub const fn flags(&self) -> ReqFlags {
        self.flags
    }

    /// Whether the master confirmed its need with a request
    #[inline]
    pub const fn is_requested(&self) -> bool {
        self.flags.contains(ReqFlags::REQUESTED)
    }

    /// Whether a scheduled value waits for commit
    #[inline]
    pub const fn has_scheduled(&self) -> bool {
        self.flags.contains(ReqFlags::SCHEDULED)
    }

    /// Whether the master asked the slave to wake it up
    #[inline]
    pub const fn wakeup_requested(&self) -> bool {
        self.flags.contains(ReqFlags::WAKEUP_REQ)
    }

    /// Latency this record imposes on its slave, if any
    #[inline]
    pub fn latency_bound(&self) -> Option<u32> {
        self.flags
            .contains(ReqFlags::SET_LATENCY)
            .then_some(self.latency)
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Initial shape of the requirement, before any runtime traffic
    pub(crate) fn configure(
        &mut self,
        flags: ReqFlags,
        current: Capabilities,
        default_req: Capabilities,
    ) {
        self.flags = flags & ReqFlags::CONFIGURABLE;
        self.current = current;
        self.default_req = default_req;
        self.scheduled = Capabilities::empty();
        self.latency = MAX_LATENCY;
    }

    pub(crate) fn set_pre_requirement(&mut self, caps: Capabilities) {
        self.pre_req = caps;
    }

    pub(crate) fn set_default_requirement(&mut self, caps: Capabilities) {
        self.default_req = caps;
    }

    pub(crate) fn set_latency(&mut self, latency: u32) {
        self.latency = latency;
        self.flags.insert(ReqFlags::SET_LATENCY);
    }

    pub(crate) fn set_wakeup(&mut self, enable: bool) {
        self.flags.set(ReqFlags::WAKEUP_REQ, enable);
    }

    /// Forget everything except the pair itself
    pub(crate) fn clear(&mut self) {
        *self = Self::new(self.master, self.slave);
    }

    // ------------------------------------------------------------------------
    // Runtime transitions
    //
    // Each returns whether something the slave aggregates over changed.
    // ------------------------------------------------------------------------

    /// Absolute change of the current capabilities
    pub(crate) fn set_current(&mut self, caps: Capabilities) -> bool {
        let changed = self.current != caps;
        self.current = caps;
        changed
    }

    /// Change made while the master runs
    ///
    /// Anything still staged, including the value a swap commit preserved,
    /// is superseded and will not be committed.
    pub(crate) fn update_current(&mut self, caps: Capabilities) -> bool {
        self.unstage();
        self.set_current(caps)
    }

    /// Confirmed request from the master
    pub(crate) fn mark_requested(&mut self) -> bool {
        let had_wakeup = self.flags.contains(ReqFlags::WAKEUP_REQ);
        self.flags.insert(ReqFlags::REQUESTED);
        self.flags.remove(ReqFlags::WAKEUP_REQ);
        had_wakeup
    }

    /// Drop back to the default floor
    pub(crate) fn release(&mut self) -> bool {
        let latency_changed = self.flags.contains(ReqFlags::SET_LATENCY);
        self.flags.remove(ReqFlags::REQUESTED | ReqFlags::SET_LATENCY);
        self.latency = MAX_LATENCY;
        let caps_changed = self.set_current(self.default_req);
        caps_changed || latency_changed
    }

    /// OR the boot-mandatory capabilities into the current ones
    pub(crate) fn apply_pre_requirement(&mut self) -> bool {
        let caps = self.current | self.pre_req;
        self.set_current(caps)
    }

    /// Stage a value for the next commit
    pub(crate) fn stage(&mut self, caps: Capabilities) {
        self.scheduled = caps;
        self.flags.insert(ReqFlags::SCHEDULED);
    }

    /// Drop any staged value
    pub(crate) fn unstage(&mut self) {
        self.scheduled = Capabilities::empty();
        self.flags.remove(ReqFlags::SCHEDULED);
    }

    /// Value `current` will take on commit, or `None` when nothing is staged
    pub(crate) fn commit_target(&self) -> Option<Capabilities> {
        self.has_scheduled().then_some(self.scheduled)
    }

    /// Finish a commit once `current` holds the staged value
    ///
    /// `previous` is what `current` held before the commit.
    pub(crate) fn finish_commit(&mut self, mode: CommitMode, previous: Capabilities) {
        match mode {
            CommitMode::Replace => self.unstage(),
            CommitMode::Swap => self.scheduled = previous,
        }
    }
}
