//! Test sequencer.
//!
//! Runs on the boot hart after global bring-up. Each scenario resets a counter,
//! asserts an interrupt, busy-waits with a bounded budget, and classifies the
//! result:
//!
//! * counter still 0 when the budget runs out: `DeliveryTimeout`;
//! * counter above 1 after a settle window: `SpuriousRedelivery`;
//! * otherwise the scenario passes.
//!
//! Every scenario runs even if an earlier one failed; the report keeps them all.

/// Boot barrier and secondary hart parking.
pub mod boot;

/// Scenario identifiers, outcomes, and the run report.
pub mod scenario;

/// Bounded busy-waiting.
pub mod wait;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info, warn};

use crate::arch::csr;
use crate::common::{AplicError, HarnessError};
use crate::config::{BusErrorConfig, HarnessConfig};
use crate::dispatch::{Counter, HandlerTable, HartCounters};
use crate::drivers::{Aplic, BusErrorBridge, Clint, Privilege, TriggerMode};
use crate::hal::{Hart, RegisterAccess};

pub use boot::{BootBarrier, park_secondary};
pub use scenario::{Report, Scenario, ScenarioOutcome, ScenarioStatus};
pub use wait::{BoundedWait, WaitOutcome};

/// Relax steps used to estimate the timer rate before programming MTIMECMP.
const TIMER_CALIBRATION_STEPS: u32 = 5;

/// MTIMECMP is set this many calibration intervals ahead.
const TIMER_LEAD_FACTOR: u64 = 20;

/// Drives the scenarios on one hart.
pub struct Sequencer<'h, R> {
    hart: &'h dyn Hart,
    aplic: Aplic<R>,
    clint: Clint<R>,
    bridge: BusErrorBridge<R>,
    table: Arc<HandlerTable>,
    counters: Arc<HartCounters>,
    harness: HarnessConfig,
    bus_error: BusErrorConfig,
}

impl<R: fmt::Debug> fmt::Debug for Sequencer<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("hart", &self.hart.hart_id())
            .field("aplic", &self.aplic)
            .field("harness", &self.harness)
            .finish_non_exhaustive()
    }
}

impl<'h, R> Sequencer<'h, R>
where
    R: RegisterAccess + Clone + 'static,
{
    /// Creates a sequencer for `hart`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hart: &'h dyn Hart,
        aplic: Aplic<R>,
        clint: Clint<R>,
        bridge: BusErrorBridge<R>,
        table: Arc<HandlerTable>,
        counters: Arc<HartCounters>,
        harness: HarnessConfig,
        bus_error: BusErrorConfig,
    ) -> Self {
        Self {
            hart,
            aplic,
            clint,
            bridge,
            table,
            counters,
            harness,
            bus_error,
        }
    }

    /// Hart the sequencer runs on.
    pub fn hart(&self) -> &'h dyn Hart {
        self.hart
    }

    /// Counters of the sequencer's hart.
    pub const fn counters(&self) -> &Arc<HartCounters> {
        &self.counters
    }

    /// One-time global configuration, performed by the boot hart before the
    /// secondary harts are released.
    ///
    /// Resets the handler table, enables the domain and this hart's delivery,
    /// programs the threshold, and finally unmasks machine external interrupts.
    pub fn bring_up(&self) -> Result<(), HarnessError> {
        let hart = self.hart.hart_id();
        self.hart.clear_csr_bits(csr::MSTATUS, csr::MSTATUS_MIE);

        self.table.default_all();
        self.aplic.enable_domain();
        self.aplic.enable_delivery(hart)?;
        self.aplic
            .set_priority_threshold(hart, self.harness.priority_threshold)?;

        self.hart.set_csr_bits(csr::MIE, csr::MIE_MEIP);
        self.hart.set_csr_bits(csr::MSTATUS, csr::MSTATUS_MIE);
        info!(hart, "interrupt controller brought up");
        Ok(())
    }

    /// Runs `scenarios` in order and collects every verdict.
    pub fn run(&self, scenarios: &[Scenario]) -> Report {
        let outcomes = scenarios
            .iter()
            .map(|&scenario| {
                let status = match self.run_scenario(scenario) {
                    Ok(status) => status,
                    Err(err) => {
                        error!(%scenario, %err, code = err.exit_code(), "scenario failed");
                        ScenarioStatus::Failed(err)
                    }
                };
                if status == ScenarioStatus::Passed {
                    info!(%scenario, "OK");
                }
                ScenarioOutcome { scenario, status }
            })
            .collect();
        Report { outcomes }
    }

    /// Runs a single scenario.
    pub fn run_scenario(&self, scenario: Scenario) -> Result<ScenarioStatus, HarnessError> {
        info!(%scenario, "running");
        match scenario {
            Scenario::BusError => self.bus_error_scenario(),
            Scenario::Software => self.software_scenario().map(|()| ScenarioStatus::Passed),
            Scenario::Timer => self.timer_scenario().map(|()| ScenarioStatus::Passed),
            Scenario::Forced => self.forced_scenario().map(|()| ScenarioStatus::Passed),
            Scenario::SetPendingByNumber => self.set_pending_scenario(),
            Scenario::PriorityDrain => self.priority_drain_scenario().map(|()| ScenarioStatus::Passed),
        }
    }

    /// Waits for `counter` to become non-zero, then settles and checks it is exactly 1.
    fn await_delivery(
        &self,
        scenario: Scenario,
        counter: Counter,
        budget: u32,
    ) -> Result<(), HarnessError> {
        let outcome =
            BoundedWait::new(budget).spin_until(self.hart, || self.counters.get(counter) != 0)?;
        if outcome == WaitOutcome::TimedOut {
            return Err(HarnessError::DeliveryTimeout { scenario });
        }

        BoundedWait::new(self.harness.settle_iterations).settle(self.hart)?;
        match self.counters.get(counter) {
            1 => Ok(()),
            count => Err(HarnessError::SpuriousRedelivery { scenario, count }),
        }
    }

    fn bus_error_scenario(&self) -> Result<ScenarioStatus, HarnessError> {
        let hart = self.hart.hart_id();
        let Some(unit) = self.bridge.unit_for_hart(hart) else {
            warn!("no bus-error units configured");
            return Ok(ScenarioStatus::Skipped("no bus-error units configured"));
        };

        self.bridge.install_handlers(&self.table, &self.counters)?;
        self.bridge.arm(self.bus_error.watch_classes());
        for u in self.bridge.units() {
            self.aplic.configure_source(
                hart,
                u.source_id(),
                TriggerMode::RisingEdge,
                self.harness.source_priority,
                Privilege::Machine,
            )?;
        }

        self.counters.reset(Counter::External);
        self.counters.reset(Counter::BusErrorValue);
        unit.simulate(self.bus_error.simulated_error);
        self.await_delivery(
            Scenario::BusError,
            Counter::External,
            self.harness.external_wait_budget,
        )?;

        info!(
            hart,
            source = unit.source_id(),
            accrued = format_args!("{:#x}", self.counters.get(Counter::BusErrorValue)),
            "bus error reported"
        );
        Ok(ScenarioStatus::Passed)
    }

    fn software_scenario(&self) -> Result<(), HarnessError> {
        let hart = self.hart.hart_id();
        self.hart.set_csr_bits(csr::MIE, csr::MIE_MSIP);
        for iteration in 0..self.harness.iterations {
            self.counters.reset(Counter::Software);
            self.clint.trigger_software(hart);
            self.await_delivery(Scenario::Software, Counter::Software, self.harness.wait_budget)?;
            info!(hart, iteration, "software interrupt handled");
        }
        Ok(())
    }

    fn timer_scenario(&self) -> Result<(), HarnessError> {
        let hart = self.hart.hart_id();
        self.hart.set_csr_bits(csr::MIE, csr::MIE_MTIE);
        for iteration in 0..self.harness.iterations {
            self.counters.reset(Counter::Timer);

            let start = self.clint.mtime();
            BoundedWait::new(TIMER_CALIBRATION_STEPS).settle(self.hart)?;
            let step = self.clint.mtime().wrapping_sub(start).max(1);
            let deadline = self.clint.mtime().wrapping_add(step * TIMER_LEAD_FACTOR);
            self.clint.set_timecmp(hart, deadline);

            self.await_delivery(Scenario::Timer, Counter::Timer, self.harness.wait_budget)?;
            info!(hart, iteration, deadline, "timer interrupt handled");
        }
        Ok(())
    }

    fn forced_scenario(&self) -> Result<(), HarnessError> {
        let hart = self.hart.hart_id();
        self.counters.reset(Counter::External);
        match self.aplic.force(hart) {
            Ok(()) => {}
            Err(AplicError::ForceWhileClaimOutstanding { topi, .. }) => {
                return Err(HarnessError::ForceRejected { topi });
            }
            Err(err) => return Err(err.into()),
        }
        self.await_delivery(
            Scenario::Forced,
            Counter::External,
            self.harness.external_wait_budget,
        )
    }

    fn set_pending_scenario(&self) -> Result<ScenarioStatus, HarnessError> {
        let hart = self.hart.hart_id();
        let id = self.harness.set_pending_id;
        if self.aplic.is_pending(id) {
            warn!(id, "already pending; set-pending scenario skipped");
            return Ok(ScenarioStatus::Skipped("source already pending"));
        }

        let aplic = self.aplic.clone();
        let counters = Arc::clone(&self.counters);
        self.table.install_fn(id, move || {
            counters.increment(Counter::SetPendingMarker);
            if let Err(err) = aplic.clear_pending_by_number(id) {
                warn!(id, %err, "clear pending failed");
            }
        })?;
        self.aplic.configure_source(
            hart,
            id,
            TriggerMode::RisingEdge,
            self.harness.source_priority,
            Privilege::Machine,
        )?;

        self.counters.reset(Counter::SetPendingMarker);
        self.aplic.set_pending_by_number(id)?;
        // Traps are only taken while relaxing, so the bit must read back set here.
        if !self.aplic.is_pending(id) {
            error!(id, "set-pending write did not latch");
            return Err(HarnessError::DeliveryTimeout {
                scenario: Scenario::SetPendingByNumber,
            });
        }
        self.await_delivery(
            Scenario::SetPendingByNumber,
            Counter::SetPendingMarker,
            self.harness.external_wait_budget,
        )?;

        if self.aplic.is_pending(id) {
            return Err(HarnessError::PendingNotCleared(id));
        }
        if self.hart.read_csr(csr::MIP) & csr::MIP_MEIP != 0 {
            warn!(hart, "external interrupt line still pending");
        }
        Ok(ScenarioStatus::Passed)
    }

    fn priority_drain_scenario(&self) -> Result<(), HarnessError> {
        let hart = self.hart.hart_id();
        let drain = self.harness.drain;
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in [drain.low_id, drain.high_id] {
            let order = Arc::clone(&order);
            self.table.install_fn(id, move || {
                order
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(id);
            })?;
        }

        // Both sources must be pending before the hart can take the trap.
        self.hart.clear_csr_bits(csr::MSTATUS, csr::MSTATUS_MIE);
        let staged = self.stage_drain_sources(hart);
        self.hart.set_csr_bits(csr::MSTATUS, csr::MSTATUS_MIE);
        staged?;

        self.await_delivery(
            Scenario::PriorityDrain,
            Counter::External,
            self.harness.external_wait_budget,
        )?;

        let observed = order.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let expected = vec![drain.high_id, drain.low_id];
        if observed != expected {
            return Err(HarnessError::DrainOrderMismatch { expected, observed });
        }
        Ok(())
    }

    fn stage_drain_sources(&self, hart: usize) -> Result<(), HarnessError> {
        let drain = self.harness.drain;
        for (id, priority) in [
            (drain.low_id, drain.low_priority),
            (drain.high_id, drain.high_priority),
        ] {
            self.aplic.configure_source(
                hart,
                id,
                TriggerMode::RisingEdge,
                priority,
                Privilege::Machine,
            )?;
        }
        self.counters.reset(Counter::External);
        self.aplic.set_pending_by_number(drain.low_id)?;
        self.aplic.set_pending_by_number(drain.high_id)?;
        Ok(())
    }
}
