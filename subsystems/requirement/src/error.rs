//! # Requirement Errors
//!
//! Every failure path of the requirement layer ends up here. Nothing in this
//! crate panics; callers get one of these values and decide what to do with
//! the master whose request triggered it.

use core::fmt;

use crate::control::TransitionError;
use crate::types::{Capabilities, SlaveId};

/// Result type for requirement operations
pub type RequirementResult<T> = Result<T, RequirementError>;

/// Requirement layer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "requirement errors must be handled"]
pub enum RequirementError {
    /// No free requirement slot for a new master/slave pairing
    PoolExhausted,

    /// Handle does not name a live requirement
    ///
    /// Either the pair was never added, or the record was torn down and
    /// the handle outlived it.
    InvalidPair,

    /// Slave does not support the requested capabilities
    UnsupportedCapabilities {
        /// Slave that was asked
        slave: SlaveId,
        /// Capabilities it refused
        capabilities: Capabilities,
    },

    /// Resource state machine refused the implied reconfiguration
    ///
    /// The requirement bookkeeping has already been updated when this is
    /// returned.
    TransitionRejected {
        /// Slave whose transition failed
        slave: SlaveId,
        /// Error reported by the state machine, unchanged
        cause: TransitionError,
    },
}

impl RequirementError {
    /// Whether the bookkeeping change was recorded despite the error
    pub const fn is_recorded(&self) -> bool {
        matches!(self, Self::TransitionRejected { .. })
    }
}

impl fmt::Display for RequirementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolExhausted => write!(f, "Requirement pool exhausted"),
            Self::InvalidPair => write!(f, "No such master/slave requirement"),
            Self::UnsupportedCapabilities {
                slave,
                capabilities,
            } => write!(
                f,
                "{} does not support capabilities {:#x}",
                slave,
                capabilities.bits()
            ),
            Self::TransitionRejected { slave, cause } => {
                write!(f, "{} transition rejected: {}", slave, cause)
            },
        }
    }
}

/// Keep the first error of a multi-record operation
///
/// Multi-record operations visit every record even after a failure; only
/// the first failure is reported back.
#[inline]
pub(crate) fn keep_first(first: &mut RequirementResult<()>, next: RequirementResult<()>) {
    if first.is_ok() {
        *first = next;
    }
}
