//! # Shared Requirement Context
//!
//! The firmware event loop reaches the requirement context from several
//! entry points (mailbox requests, power-event callbacks). They never run
//! concurrently, but they do run from different call stacks, so the single
//! context sits behind a spin lock. Each entry point locks, runs one
//! operation to completion and unlocks.

use spin::Mutex;

use crate::control::SlaveControl;
use crate::manager::RequirementManager;

/// Lock-wrapped requirement context
#[derive(Debug)]
pub struct SharedRequirements<C: SlaveControl> {
    inner: Mutex<RequirementManager<C>>,
}

impl<C: SlaveControl> SharedRequirements<C> {
    /// Wrap a context
    pub fn new(manager: RequirementManager<C>) -> Self {
        Self {
            inner: Mutex::new(manager),
        }
    }

    /// Run one operation on the context
    pub fn with<R>(&self, f: impl FnOnce(&mut RequirementManager<C>) -> R) -> R {
        let mut manager = self.inner.lock();
        f(&mut manager)
    }

    /// Run one operation unless the context is already held
    ///
    /// A handler re-entered from within an operation gets `None` instead
    /// of spinning forever.
    pub fn try_with<R>(&self, f: impl FnOnce(&mut RequirementManager<C>) -> R) -> Option<R> {
        let mut manager = self.inner.try_lock()?;
        Some(f(&mut manager))
    }

    /// Unwrap the context
    pub fn into_inner(self) -> RequirementManager<C> {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::mock::MockControl;
    use crate::types::{Capabilities, MasterId, SlaveId};

    #[test]
    fn test_with_runs_operation() {
        let shared = SharedRequirements::new(RequirementManager::new(MockControl::new()));
        let handle = shared
            .with(|mgr| mgr.add(MasterId::new(1), SlaveId::new(2)))
            .unwrap();
        shared
            .with(|mgr| mgr.request(handle, Capabilities::ACCESS))
            .unwrap();

        let mgr = shared.into_inner();
        assert_eq!(mgr.requirement(handle).unwrap().current(), Capabilities::ACCESS);
    }

    #[test]
    fn test_try_with_refuses_reentry() {
        let shared = SharedRequirements::new(RequirementManager::new(MockControl::new()));
        let nested = shared.with(|_| shared.try_with(|_| ()));
        assert!(nested.is_none());
        assert!(shared.try_with(|_| ()).is_some());
    }
}
