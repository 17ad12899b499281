//! # Scheduled Requirements
//!
//! A master going to sleep (or about to wake) announces what it will need
//! in its target state while it is still running on the current
//! configuration. The staged values take effect only when the transition
//! is committed:
//!
//! ```text
//!  schedule(r, X) ──▶ scheduled = X          current untouched
//!  cancel(m)      ──▶ scheduled = 0          nothing to commit
//!  commit(m, Replace) ──▶ current = X, scheduled = 0
//!  commit(m, Swap)    ──▶ current = X, scheduled = old current
//! ```
//!
//! Records are committed independently: a refused transition on one slave
//! does not undo or stop the commit of the others.

use crate::control::SlaveControl;
use crate::error::{RequirementError, RequirementResult};
use crate::manager::RequirementManager;
use crate::pool::ReqHandle;
use crate::types::{Capabilities, CommitMode, MasterId};

impl<C: SlaveControl> RequirementManager<C> {
    /// Stage `caps` for the next commit of the record's master
    pub fn schedule(&mut self, handle: ReqHandle, caps: Capabilities) -> RequirementResult<()> {
        let slave = self
            .requirement(handle)
            .ok_or(RequirementError::InvalidPair)?
            .slave();
        self.check_capabilities(slave, caps)?;

        self.record_mut(handle)?.stage(caps);
        Ok(())
    }

    /// Drop every staged value of a master
    pub fn cancel_scheduled(&mut self, master: MasterId) {
        let mut cursor = self.graph.master_head(master);
        while let Some(handle) = cursor {
            cursor = self.graph.next_of_master(handle);
            if let Ok(record) = self.graph.record_mut(handle) {
                record.unstage();
            }
        }
        log::trace!("requirement: {} cancelled scheduled requirements", master);
    }

    /// Commit every staged value of a master
    ///
    /// Records without a staged value are left alone. Every staged record is
    /// committed even if an earlier one was refused; the first refusal is
    /// returned.
    pub fn update_scheduled(&mut self, master: MasterId, mode: CommitMode) -> RequirementResult<()> {
        let status = self.for_each_of_master(master, |_, record| {
            let Some(target) = record.commit_target() else {
                return Ok(None);
            };
            let previous = record.current();
            let changed = record.set_current(target);
            record.finish_commit(mode, previous);
            Ok(changed.then_some(record.slave()))
        });

        log::trace!("requirement: {} committed scheduled ({:?})", master, mode);
        #[cfg(feature = "debug")]
        self.dump_master(master);

        status
    }

    #[cfg(feature = "debug")]
    fn dump_master(&self, master: MasterId) {
        for handle in self.graph.master_list(master) {
            if let Some(record) = self.graph.record(handle) {
                log::trace!(
                    "  {}: current={:#x} scheduled={:#x} flags={:?}",
                    record.slave(),
                    record.current().bits(),
                    record.scheduled().bits(),
                    record.flags()
                );
            }
        }
    }
}
