//! # Power Management Requirements
//!
//! Bookkeeping of what every requesting processor (master) needs from every
//! controlled resource (slave) of the SoC. The slave state machine reads the
//! aggregate of these requirements to decide whether a memory, clock, power
//! island or peripheral may drop to a lower-power state.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     REQUIREMENT MANAGER                          │
//! │                                                                  │
//! │  request / release ──┐    schedule / commit ──┐   pre-request    │
//! │                      ▼                        ▼   clock restore  │
//! │  ┌────────────────────────────────────────────────────────────┐  │
//! │  │                  REQUIREMENT GRAPH                          │  │
//! │  │   per-master lists        per-slave lists                   │  │
//! │  │  ┌──────────────────────────────────────────────────────┐   │  │
//! │  │  │          REQUIREMENT POOL  [200 slots]               │   │  │
//! │  │  └──────────────────────────────────────────────────────┘   │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! │                      │ aggregate demand                          │
//! │                      ▼                                           │
//! │              SlaveControl (slave state machine)                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Requirement Horizons
//!
//! | Field       | Meaning                                         |
//! |-------------|-------------------------------------------------|
//! | `pre_req`   | Needed before the master can issue requests     |
//! | `default`   | Floor kept while the master runs                |
//! | `current`   | In force now, honoured by the state machine     |
//! | `scheduled` | Takes effect at the next committed transition   |
//!
//! ## Memory
//!
//! No heap is used. Every master/slave pair lives in a fixed pool of
//! [`REQUIREMENT_MAX`] slots, and the lists over it are bounded index maps.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod control;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod manager;
pub mod pool;
pub mod release;
pub mod requirement;
pub mod schedule;
pub mod shared;
#[cfg(feature = "stats")]
pub mod stats;
pub mod types;

pub use control::{SlaveControl, SlaveDemand, TransitionError};
pub use error::{RequirementError, RequirementResult};
pub use graph::RequirementGraph;
pub use manager::RequirementManager;
pub use pool::{ReqHandle, RequirementPool};
pub use requirement::Requirement;
pub use shared::SharedRequirements;
#[cfg(feature = "stats")]
pub use stats::RequirementStats;
pub use types::{
    Capabilities, CommitMode, MasterId, ReleaseScope, ReqFlags, SlaveId, MAX_LATENCY,
};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Maximum number of master/slave pairs that can exist at runtime
pub const REQUIREMENT_MAX: usize = 200;

/// Capacity of the per-master head index (power of two)
pub const MAX_MASTERS: usize = 256;

/// Capacity of the per-slave head index (power of two)
pub const MAX_SLAVES: usize = 256;

static_assertions::const_assert!(MAX_MASTERS.is_power_of_two());
static_assertions::const_assert!(MAX_SLAVES.is_power_of_two());
