//! Claim/dispatch engine.
//!
//! Run once per machine external trap. The loop claims the top interrupt,
//! dispatches it, and re-reads `topi`:
//!
//! * zero: the queue is drained and the trap is done;
//! * a different interrupt: it arrived (or was already queued) behind the one
//!   just handled, so it is claimed in the same trap;
//! * the same interrupt: the handler did not quiet its source. The loop keeps
//!   going, but only for a bounded number of consecutive repeats.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::common::DispatchError;
use crate::dispatch::handler::HandlerTable;
use crate::drivers::aplic::{Aplic, ClaimView};
use crate::hal::RegisterAccess;

/// What one drain did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Source ids whose handlers ran, in dispatch order.
    pub dispatched: Vec<u32>,
    /// Claims that returned identity 0 (forced or spurious).
    pub spurious: u32,
    /// Total re-appearances of a just-dispatched claim.
    pub repeats: u32,
}

/// Claims and dispatches every interrupt pending for a hart.
#[derive(Debug, Clone)]
pub struct ClaimEngine<R> {
    aplic: Aplic<R>,
    table: Arc<HandlerTable>,
    max_repeats: u32,
}

impl<R: RegisterAccess> ClaimEngine<R> {
    /// Creates an engine dispatching through `table`.
    ///
    /// `max_repeats` bounds how many times in a row the same claim may re-appear
    /// before the drain is abandoned.
    pub const fn new(aplic: Aplic<R>, table: Arc<HandlerTable>, max_repeats: u32) -> Self {
        Self {
            aplic,
            table,
            max_repeats,
        }
    }

    /// Handler table the engine dispatches through.
    pub const fn table(&self) -> &Arc<HandlerTable> {
        &self.table
    }

    /// Drains `hart`'s queue.
    ///
    /// # Returns
    ///
    /// The dispatch report, or `RepeatedClaimSuspected` once the same claim has
    /// re-appeared more than `max_repeats` times in a row.
    pub fn drain(&self, hart: usize) -> Result<DrainReport, DispatchError> {
        let mut report = DrainReport::default();
        let mut consecutive = 0;

        loop {
            let claim = self.aplic.claim(hart)?;
            self.dispatch(hart, claim, &mut report);

            let next = self.aplic.top_of_queue(hart)?;
            if next.is_empty() {
                return Ok(report);
            }

            if next == claim {
                consecutive += 1;
                report.repeats += 1;
                warn!(hart, id = claim.id(), consecutive, "claim re-asserted after dispatch");
                if consecutive > self.max_repeats {
                    return Err(DispatchError::RepeatedClaimSuspected {
                        id: claim.id(),
                        repeats: consecutive,
                    });
                }
            } else {
                consecutive = 0;
                trace!(hart, id = next.id(), "another interrupt queued");
            }
        }
    }

    fn dispatch(&self, hart: usize, claim: ClaimView, report: &mut DrainReport) {
        let id = claim.id();
        if id == 0 {
            report.spurious += 1;
            warn!(hart, raw = claim.raw(), "spurious claim");
            return;
        }

        trace!(hart, id, priority = claim.priority(), "dispatch");
        if self.table.dispatch(id) {
            report.dispatched.push(id);
        } else {
            warn!(hart, id, "claimed id has no handler slot");
        }
    }
}
