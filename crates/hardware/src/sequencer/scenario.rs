//! Scenario identifiers and outcomes.

use std::fmt;
use std::str::FromStr;

use crate::common::HarnessError;

/// One test scenario run by the sequencer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Bus-error unit raises its platform interrupt through the APLIC.
    BusError,
    /// CLINT machine software interrupt.
    Software,
    /// CLINT machine timer interrupt.
    Timer,
    /// Forced interrupt through the delivery control `iforce` register.
    Forced,
    /// Pending bit set by number through `setipnum`.
    SetPendingByNumber,
    /// Two sources pending together must drain in priority order in one trap.
    PriorityDrain,
}

impl Scenario {
    /// Every scenario, in run order.
    pub const ALL: [Self; 6] = [
        Self::BusError,
        Self::Software,
        Self::Timer,
        Self::Forced,
        Self::SetPendingByNumber,
        Self::PriorityDrain,
    ];

    /// Short name used on the command line and in reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::BusError => "bus-error",
            Self::Software => "software",
            Self::Timer => "timer",
            Self::Forced => "forced",
            Self::SetPendingByNumber => "set-pending",
            Self::PriorityDrain => "priority-drain",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|sc| sc.name()).collect();
                format!("unknown scenario '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Verdict of one scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScenarioStatus {
    /// The scenario passed.
    Passed,
    /// The scenario could not run on this platform.
    Skipped(&'static str),
    /// The scenario failed.
    Failed(HarnessError),
}

/// Scenario and its verdict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioOutcome {
    /// Scenario that ran.
    pub scenario: Scenario,
    /// Its verdict.
    pub status: ScenarioStatus,
}

/// Verdicts of a full run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Outcomes in run order.
    pub outcomes: Vec<ScenarioOutcome>,
}

impl Report {
    /// First failure in run order.
    pub fn first_failure(&self) -> Option<&HarnessError> {
        self.outcomes.iter().find_map(|o| match &o.status {
            ScenarioStatus::Failed(err) => Some(err),
            _ => None,
        })
    }

    /// Returns `true` if no scenario failed.
    pub fn all_passed(&self) -> bool {
        self.first_failure().is_none()
    }

    /// Process exit code: 0 on a full pass, else the first failure's code.
    pub fn exit_code(&self) -> i32 {
        self.first_failure().map_or(0, HarnessError::exit_code)
    }

    /// Status of `scenario`, if it ran.
    pub fn status(&self, scenario: Scenario) -> Option<&ScenarioStatus> {
        self.outcomes
            .iter()
            .find(|o| o.scenario == scenario)
            .map(|o| &o.status)
    }
}
