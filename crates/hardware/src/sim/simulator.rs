//! Simulator: owns the platform, the harts, and the shared dispatch state side-by-side.
//!
//! Every hart runs on its own scoped thread. Secondary harts park at the boot
//! barrier; the boot hart performs global bring-up, releases them, and then runs
//! the requested scenarios. All harts are shut down before `run` returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::{error, info, warn};

use crate::common::{FatalTrap, HarnessError};
use crate::config::{Config, ConfigError};
use crate::dispatch::{ClaimEngine, CounterBank, HandlerTable, HartCounters};
use crate::drivers::{Aplic, BusErrorBridge, Clint};
use crate::hal::Hart;
use crate::sequencer::{BootBarrier, Report, Scenario, Sequencer, park_secondary};
use crate::soc::{SimHart, System};
use crate::trap::TrapVector;

/// Register backend shared by every driver in the simulator.
pub type SimBus = Arc<System>;

/// Top-level simulator: platform model, harts, handler table, and counters.
#[derive(Debug)]
pub struct Simulator {
    config: Config,
    system: SimBus,
    harts: Vec<SimHart>,
    table: Arc<HandlerTable>,
    counters: CounterBank,
}

impl Simulator {
    /// Validates `config`, builds the platform, and installs the trap vector on every hart.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let platform = &config.platform;

        let system = Arc::new(System::new(&config));
        let table = Arc::new(HandlerTable::new(platform.num_sources));
        let counters = CounterBank::new(platform.num_harts);

        let vector = Arc::new(TrapVector::new(
            ClaimEngine::new(
                Aplic::from_config(Arc::clone(&system), platform),
                Arc::clone(&table),
                config.harness.max_claim_repeats,
            ),
            Clint::new(Arc::clone(&system), platform.clint_base),
            counters.clone(),
        ));
        let harts = (0..platform.num_harts)
            .map(|id| {
                let hart = SimHart::new(id, Arc::clone(&system));
                if !hart.install_vector(vector.clone()) {
                    warn!(hart = id, "trap vector already installed");
                }
                hart
            })
            .collect();

        info!(
            harts = platform.num_harts,
            sources = platform.num_sources,
            units = config.bus_error.units.len(),
            "simulator ready"
        );
        Ok(Self {
            config,
            system,
            harts,
            table,
            counters,
        })
    }

    /// Configuration the simulator was built from.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The simulated platform.
    pub const fn system(&self) -> &SimBus {
        &self.system
    }

    /// Hart `id`, if it exists.
    pub fn hart(&self, id: usize) -> Option<&SimHart> {
        self.harts.get(id)
    }

    /// The boot hart.
    pub fn boot_hart(&self) -> Result<&SimHart, HarnessError> {
        let id = self.config.platform.boot_hart;
        self.hart(id).ok_or(HarnessError::Fatal(FatalTrap::UnknownHart(id)))
    }

    /// APLIC driver over the simulated platform.
    pub fn aplic(&self) -> Aplic<SimBus> {
        Aplic::from_config(Arc::clone(&self.system), &self.config.platform)
    }

    /// CLINT driver over the simulated platform.
    pub fn clint(&self) -> Clint<SimBus> {
        Clint::new(Arc::clone(&self.system), self.config.platform.clint_base)
    }

    /// Handler table shared by every hart.
    pub const fn table(&self) -> &Arc<HandlerTable> {
        &self.table
    }

    /// Counters of hart `id`, if it exists.
    pub fn counters(&self, id: usize) -> Option<&Arc<HartCounters>> {
        self.counters.hart(id)
    }

    /// Builds the sequencer for the boot hart.
    pub fn sequencer(&self) -> Result<Sequencer<'_, SimBus>, HarnessError> {
        let hart = self.boot_hart()?;
        let id = hart.hart_id();
        let counters = self
            .counters(id)
            .ok_or(HarnessError::Fatal(FatalTrap::UnknownHart(id)))?;
        Ok(Sequencer::new(
            hart,
            self.aplic(),
            self.clint(),
            BusErrorBridge::from_config(&self.system, &self.config.bus_error),
            Arc::clone(&self.table),
            Arc::clone(counters),
            self.config.harness.clone(),
            self.config.bus_error.clone(),
        ))
    }

    /// Runs `scenarios` with every hart on its own thread.
    ///
    /// # Returns
    ///
    /// The report of the boot hart, or the first fatal error seen on any hart.
    pub fn run(&self, scenarios: &[Scenario]) -> Result<Report, HarnessError> {
        let barrier = BootBarrier::new();
        let shutdown = AtomicBool::new(false);
        let boot = self.config.platform.boot_hart;

        thread::scope(|scope| {
            let (barrier, shutdown) = (&barrier, &shutdown);
            let secondaries: Vec<_> = self
                .harts
                .iter()
                .filter(|hart| hart.hart_id() != boot)
                .map(|hart| scope.spawn(move || park_secondary(hart, barrier, shutdown)))
                .collect();

            let result = self.drive(scenarios, barrier);
            shutdown.store(true, Ordering::Release);

            let mut secondary_fatal = None;
            for handle in secondaries {
                match handle.join() {
                    Ok(Ok(())) => {}
                    Ok(Err(fatal)) => {
                        error!(%fatal, "secondary hart stopped");
                        if secondary_fatal.is_none() {
                            secondary_fatal = Some(fatal);
                        }
                    }
                    Err(_) => error!("secondary hart thread panicked"),
                }
            }

            match (result, secondary_fatal) {
                (Ok(_), Some(fatal)) => Err(fatal.into()),
                (result, _) => result,
            }
        })
    }

    fn drive(&self, scenarios: &[Scenario], barrier: &BootBarrier) -> Result<Report, HarnessError> {
        let sequencer = self.sequencer()?;
        sequencer.bring_up()?;
        barrier.release();
        Ok(sequencer.run(scenarios))
    }
}
