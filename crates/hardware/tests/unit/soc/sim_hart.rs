//! Simulated Hart Tests.
//!
//! Verifies interrupt sampling into `mip`, trap priority, and the emulated
//! trap entry and return around the installed vector.

use std::sync::{Arc, Mutex};

use aplic_core::arch::{cause, csr};
use aplic_core::common::FatalTrap;
use aplic_core::config::Config;
use aplic_core::hal::{Hart, RegisterAccess, TrapEntry};
use aplic_core::soc::{SimHart, System};

const CLINT: u64 = 0x0200_0000;

/// Records every `mcause` and quiets the CLINT so each interrupt traps once.
struct Quieting {
    system: Arc<System>,
    seen: Mutex<Vec<u64>>,
}

impl TrapEntry for Quieting {
    fn on_trap(&self, hart: &dyn Hart) -> Result<(), FatalTrap> {
        let mcause = hart.read_csr(csr::MCAUSE);
        self.seen.lock().unwrap().push(mcause);
        match mcause {
            cause::interrupt::MACHINE_SOFTWARE => self.system.write_u32(CLINT, 0),
            cause::interrupt::MACHINE_TIMER => self.system.write_u64(CLINT + 0x4000, u64::MAX),
            _ => {}
        }
        Ok(())
    }
}

fn setup() -> (Arc<System>, SimHart, Arc<Quieting>) {
    let system = Arc::new(System::new(&Config::default()));
    let hart = SimHart::new(0, Arc::clone(&system));
    let vector = Arc::new(Quieting {
        system: Arc::clone(&system),
        seen: Mutex::new(Vec::new()),
    });
    assert!(hart.install_vector(vector.clone()));
    (system, hart, vector)
}

#[test]
fn software_before_timer() {
    let (system, hart, vector) = setup();
    system.write_u32(CLINT, 1);
    system.write_u64(CLINT + 0x4000, 0);
    hart.set_csr_bits(csr::MIE, csr::MIE_MSIP | csr::MIE_MTIE);
    hart.set_csr_bits(csr::MSTATUS, csr::MSTATUS_MIE);

    hart.relax().unwrap();
    hart.relax().unwrap();
    hart.relax().unwrap();
    assert_eq!(
        *vector.seen.lock().unwrap(),
        vec![cause::interrupt::MACHINE_SOFTWARE, cause::interrupt::MACHINE_TIMER]
    );
}

#[test]
fn masked_interrupt_visible_in_mip_only() {
    let (system, hart, vector) = setup();
    system.write_u32(CLINT, 1);
    hart.set_csr_bits(csr::MSTATUS, csr::MSTATUS_MIE);
    hart.relax().unwrap();
    assert!(vector.seen.lock().unwrap().is_empty());
    assert_eq!(hart.read_csr(csr::MIP) & csr::MIP_MSIP, csr::MIP_MSIP);
}

#[test]
fn mhartid_and_steps() {
    let system = Arc::new(System::new(&Config::default()));
    let hart = SimHart::new(3, system);
    assert_eq!(hart.read_csr(csr::MHARTID), 3);
    hart.relax().unwrap();
    hart.relax().unwrap();
    assert_eq!(hart.steps(), 2);
}

#[test]
fn exception_reaches_vector_with_tval() {
    let (_system, hart, vector) = setup();
    hart.raise_exception(cause::exception::LOAD_ACCESS_FAULT, 0xDEAD).unwrap();
    assert_eq!(*vector.seen.lock().unwrap(), vec![cause::exception::LOAD_ACCESS_FAULT]);
    assert_eq!(hart.read_csr(csr::MTVAL), 0xDEAD);
}
