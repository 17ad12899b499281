//! # Node Identities, Capabilities and Flags
//!
//! Masters and slaves are owned by the topology module. This crate only
//! ever sees them through the opaque identifiers below and never mutates
//! or frees the nodes they name.

use core::fmt;

// ============================================================================
// Node Identifiers
// ============================================================================

/// Identifier of a requesting processor (master)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct MasterId(u32);

impl MasterId {
    /// Create from the topology module's node id
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw node id
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for MasterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterId({})", self.0)
    }
}

impl fmt::Display for MasterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "master#{}", self.0)
    }
}

/// Identifier of a controlled resource (slave)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SlaveId(u32);

impl SlaveId {
    /// Create from the topology module's node id
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw node id
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SlaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlaveId({})", self.0)
    }
}

impl fmt::Display for SlaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slave#{}", self.0)
    }
}

// ============================================================================
// Capabilities
// ============================================================================

bitflags::bitflags! {
    /// Slave capabilities requested by a master
    ///
    /// Only the common bits are named. Anything else is decoded by the
    /// slave's own state machine and carried here untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        /// Slave is accessible (powered and clocked)
        const ACCESS = 1 << 0;
        /// Slave keeps its context (retention)
        const CONTEXT = 1 << 1;
        /// Slave may wake the master up
        const WAKEUP = 1 << 2;

        const _ = !0;
    }
}

// ============================================================================
// Requirement Flags
// ============================================================================

bitflags::bitflags! {
    /// Per-record information about what kind of requirement is active
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ReqFlags: u8 {
        /// Master asked this slave to wake it up
        const WAKEUP_REQ = 0x01;
        /// Master holds an active request for the slave
        const REQUESTED = 0x02;
        /// Master set a latency bound for the slave
        const SET_LATENCY = 0x04;
        /// Firmware itself is using the slave on the master's behalf
        const SYSTEM_USING = 0x08;
        /// A scheduled value is staged and waits for the next commit
        const SCHEDULED = 0x10;
    }
}

impl ReqFlags {
    /// Flags a caller may hand to `set_config`
    pub const CONFIGURABLE: Self = Self::WAKEUP_REQ
        .union(Self::REQUESTED)
        .union(Self::SYSTEM_USING);
}

// ============================================================================
// Latency
// ============================================================================

/// Latency value meaning "no constraint"
pub const MAX_LATENCY: u32 = u32::MAX;

// ============================================================================
// Scopes and Modes
// ============================================================================

/// Which of a master's requirements a release applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseScope {
    /// Only the record passed in
    One,
    /// Every record of the record's master
    All,
    /// Every record of the master that was never confirmed by a request
    Unrequested,
}

/// How staged values are committed on a power transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Staged value becomes current and the stage is emptied (sleep commit)
    Replace,
    /// Current and staged values are exchanged (wake commit)
    Swap,
}
