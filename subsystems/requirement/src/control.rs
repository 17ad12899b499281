//! # Resource State Machine Interface
//!
//! The slave state machine lives outside this crate. It decides whether a
//! slave may actually change state; the requirement layer only tells it
//! what the slave's masters now demand in aggregate.

use core::fmt;

use crate::types::{Capabilities, SlaveId, MAX_LATENCY};

/// Aggregate demand of all masters on one slave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaveDemand {
    /// Union of the current capabilities of every requester
    pub capabilities: Capabilities,
    /// Tightest latency bound among requesters that set one
    pub latency: u32,
    /// Whether any requester asked the slave to wake it up
    pub wakeup: bool,
}

impl SlaveDemand {
    /// Demand of a slave nobody requires
    pub const IDLE: Self = Self {
        capabilities: Capabilities::empty(),
        latency: MAX_LATENCY,
        wakeup: false,
    };

    /// Whether nothing at all is demanded
    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }
}

impl Default for SlaveDemand {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Error reported by the resource state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Slave is in the middle of another transition
    Busy,
    /// A slave this one depends on cannot follow
    DependencyViolation,
    /// No state of the slave satisfies the demand
    NoMatchingState,
    /// Slave did not reach the target state in time
    Timeout,
    /// Firmware status code without a dedicated variant
    Status(u32),
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "Slave busy"),
            Self::DependencyViolation => write!(f, "Dependency violation"),
            Self::NoMatchingState => write!(f, "No state matches the demand"),
            Self::Timeout => write!(f, "Transition timed out"),
            Self::Status(code) => write!(f, "Status {:#x}", code),
        }
    }
}

/// Slave state machine as seen by the requirement layer
pub trait SlaveControl {
    /// Reconfigure `slave` for the new aggregate demand
    fn update_slave(&mut self, slave: SlaveId, demand: SlaveDemand) -> Result<(), TransitionError>;

    /// Whether `slave` has a state offering all of `caps`
    fn check_capabilities(&self, _slave: SlaveId, _caps: Capabilities) -> bool {
        true
    }

    /// Re-apply clock configuration of `slave` after a wake-up
    fn restore_clock(&mut self, _slave: SlaveId) -> Result<(), TransitionError> {
        Ok(())
    }
}

impl<T: SlaveControl + ?Sized> SlaveControl for &mut T {
    fn update_slave(&mut self, slave: SlaveId, demand: SlaveDemand) -> Result<(), TransitionError> {
        (**self).update_slave(slave, demand)
    }

    fn check_capabilities(&self, slave: SlaveId, caps: Capabilities) -> bool {
        (**self).check_capabilities(slave, caps)
    }

    fn restore_clock(&mut self, slave: SlaveId) -> Result<(), TransitionError> {
        (**self).restore_clock(slave)
    }
}

// ============================================================================
// Test Double
// ============================================================================
