//! # Boot and Wake Hooks

use crate::control::SlaveControl;
use crate::error::{keep_first, RequirementError, RequirementResult};
use crate::manager::RequirementManager;
use crate::types::MasterId;

impl<C: SlaveControl> RequirementManager<C> {
    /// Grant a master its boot-mandatory capabilities
    ///
    /// Called once before the master boots, for resources it touches before
    /// it is able to request them (memories, mostly).
    pub fn pre_request(&mut self, master: MasterId) -> RequirementResult<()> {
        log::debug!("requirement: applying pre-requirements of {}", master);
        self.for_each_of_master(master, |_, record| {
            if record.pre_requirement().is_empty() {
                return Ok(None);
            }
            Ok(record.apply_pre_requirement().then_some(record.slave()))
        })
    }

    /// Re-apply clocks of the slaves a master holds, after it woke up
    ///
    /// Clock gating can happen behind the requirement layer's back while the
    /// master sleeps, so every slave the master still holds capabilities on
    /// gets its clocks restored.
    pub fn clock_restore(&mut self, master: MasterId) -> RequirementResult<()> {
        let mut status = Ok(());
        let mut cursor = self.graph.master_head(master);

        while let Some(handle) = cursor {
            cursor = self.graph.next_of_master(handle);

            let Some(record) = self.graph.record(handle) else {
                continue;
            };
            if record.current().is_empty() {
                continue;
            }

            let slave = record.slave();
            let result = self.control.restore_clock(slave).map_err(|cause| {
                log::warn!("requirement: clock restore of {} failed: {}", slave, cause);
                RequirementError::TransitionRejected { slave, cause }
            });
            keep_first(&mut status, result);
        }

        status
    }
}
