use std::sync::{Arc, Once};

use aplic_core::Simulator;
use aplic_core::config::Config;
use aplic_core::dispatch::HartCounters;
use aplic_core::drivers::{Aplic, Clint};
use aplic_core::sim::SimBus;
use aplic_core::soc::SimHart;

/// A simulator built from a test-sized configuration.
pub struct TestContext {
    pub sim: Simulator,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Builds a context after letting `tweak` adjust the test configuration.
    pub fn with_config(tweak: impl FnOnce(&mut Config)) -> Self {
        init_tracing();
        let mut config = test_config();
        tweak(&mut config);
        Self {
            sim: Simulator::new(config).expect("test configuration is valid"),
        }
    }

    pub fn aplic(&self) -> Aplic<SimBus> {
        self.sim.aplic()
    }

    pub fn clint(&self) -> Clint<SimBus> {
        self.sim.clint()
    }

    pub fn boot_hart(&self) -> &SimHart {
        self.sim.boot_hart().expect("boot hart exists")
    }

    pub fn counters(&self) -> &Arc<HartCounters> {
        let id = self.sim.config().platform.boot_hart;
        self.sim.counters(id).expect("boot hart has counters")
    }
}

/// Default platform with budgets small enough to keep failing tests fast.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.harness.wait_budget = 2_000;
    config.harness.external_wait_budget = 2_000;
    config.harness.settle_iterations = 32;
    config.harness.iterations = 3;
    config
}

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    });
}
