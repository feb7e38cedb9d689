use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    #[default]
    Peace,
    Crisis,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::Peace, Scenario::Crisis];

    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Peace => "peace",
            Scenario::Crisis => "crisis",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scenario::Peace => "Peace",
            Scenario::Crisis => "Crisis",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = InputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "peace" => Ok(Scenario::Peace),
            "crisis" => Ok(Scenario::Crisis),
            other => Err(InputError::UnknownScenario {
                value: other.to_string(),
            }),
        }
    }
}

/// One of the four mental-health compartments, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compartment {
    Healthy,
    Mild,
    Moderate,
    Severe,
}

impl Compartment {
    pub const ALL: [Compartment; 4] = [
        Compartment::Healthy,
        Compartment::Mild,
        Compartment::Moderate,
        Compartment::Severe,
    ];

    pub fn index(self) -> usize {
        match self {
            Compartment::Healthy => 0,
            Compartment::Mild => 1,
            Compartment::Moderate => 2,
            Compartment::Severe => 3,
        }
    }

    pub fn field_name(self) -> &'static str {
        match self {
            Compartment::Healthy => "healthy",
            Compartment::Mild => "mild",
            Compartment::Moderate => "moderate",
            Compartment::Severe => "severe",
        }
    }
}

/// Initial compartment counts; travels as `[healthy, mild, moderate, severe]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u64; 4]", into = "[u64; 4]")]
pub struct InitialState {
    pub healthy: u64,
    pub mild: u64,
    pub moderate: u64,
    pub severe: u64,
}

impl InitialState {
    pub fn new(healthy: u64, mild: u64, moderate: u64, severe: u64) -> Self {
        Self {
            healthy,
            mild,
            moderate,
            severe,
        }
    }

    pub fn get(&self, compartment: Compartment) -> u64 {
        match compartment {
            Compartment::Healthy => self.healthy,
            Compartment::Mild => self.mild,
            Compartment::Moderate => self.moderate,
            Compartment::Severe => self.severe,
        }
    }

    pub fn total(&self) -> u64 {
        self.healthy
            .saturating_add(self.mild)
            .saturating_add(self.moderate)
            .saturating_add(self.severe)
    }
}

impl Default for InitialState {
    fn default() -> Self {
        Self::new(800_000, 20_000, 5_000, 3_000)
    }
}

impl From<[u64; 4]> for InitialState {
    fn from([healthy, mild, moderate, severe]: [u64; 4]) -> Self {
        Self::new(healthy, mild, moderate, severe)
    }
}

impl From<InitialState> for [u64; 4] {
    fn from(value: InitialState) -> Self {
        [value.healthy, value.mild, value.moderate, value.severe]
    }
}
