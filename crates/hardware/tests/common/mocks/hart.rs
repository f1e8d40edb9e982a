use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use aplic_core::arch::csr;
use aplic_core::common::FatalTrap;
use aplic_core::hal::Hart;
use mockall::mock;

mock! {
    pub ScriptedHart {}
    impl Hart for ScriptedHart {
        fn hart_id(&self) -> usize;
        fn read_csr(&self, csr: u32) -> u64;
        fn write_csr(&self, csr: u32, val: u64);
        fn set_csr_bits(&self, csr: u32, mask: u64);
        fn clear_csr_bits(&self, csr: u32, mask: u64);
        fn relax(&self) -> Result<(), FatalTrap>;
    }
}

/// Hart with plain CSR storage that never takes traps.
///
/// `relax` counts steps and runs the optional hook, which tests use to make
/// a waited-for condition come true after a number of steps.
pub struct FakeHart {
    id: usize,
    csrs: Mutex<HashMap<u32, u64>>,
    relaxes: AtomicU32,
    hook: Option<Box<dyn Fn(u32) -> Result<(), FatalTrap> + Send + Sync>>,
}

impl FakeHart {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            csrs: Mutex::new(HashMap::new()),
            relaxes: AtomicU32::new(0),
            hook: None,
        }
    }

    /// Runs `hook` with the 1-based step number on every relax.
    pub fn with_hook(
        mut self,
        hook: impl Fn(u32) -> Result<(), FatalTrap> + Send + Sync + 'static,
    ) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn relaxes(&self) -> u32 {
        self.relaxes.load(Ordering::SeqCst)
    }

    pub fn set(&self, csr: u32, val: u64) {
        *self.csrs.lock().unwrap().entry(csr).or_default() = val;
    }
}

impl Hart for FakeHart {
    fn hart_id(&self) -> usize {
        self.id
    }

    fn read_csr(&self, csr: u32) -> u64 {
        if csr == csr::MHARTID {
            return self.id as u64;
        }
        self.csrs.lock().unwrap().get(&csr).copied().unwrap_or(0)
    }

    fn write_csr(&self, csr: u32, val: u64) {
        self.set(csr, val);
    }

    fn relax(&self) -> Result<(), FatalTrap> {
        let step = self.relaxes.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.hook {
            Some(hook) => hook(step),
            None => Ok(()),
        }
    }
}
