//! Physical constant table

use serde::Serialize;

use super::ToolError;

/// A named physical constant with its SI unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhysicalConstant {
    pub name: &'static str,
    pub value: f64,
    pub unit: &'static str,
}

/// CODATA values for the constants the physics specialist recognizes
pub const PHYSICAL_CONSTANTS: &[PhysicalConstant] = &[
    PhysicalConstant {
        name: "speed of light",
        value: 299_792_458.0,
        unit: "m/s",
    },
    PhysicalConstant {
        name: "gravitational constant",
        value: 6.67430e-11,
        unit: "m^3 kg^-1 s^-2",
    },
    PhysicalConstant {
        name: "planck constant",
        value: 6.62607015e-34,
        unit: "J s",
    },
    PhysicalConstant {
        name: "elementary charge",
        value: 1.602176634e-19,
        unit: "C",
    },
    PhysicalConstant {
        name: "boltzmann constant",
        value: 1.380649e-23,
        unit: "J/K",
    },
    PhysicalConstant {
        name: "avogadro constant",
        value: 6.02214076e23,
        unit: "mol^-1",
    },
];

/// Look up a constant by (partial, case-insensitive) name
pub fn get_constant(name: &str) -> Result<PhysicalConstant, ToolError> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return Err(ToolError::UnknownConstant(needle));
    }

    PHYSICAL_CONSTANTS
        .iter()
        .find(|c| c.name.contains(&needle))
        .copied()
        .ok_or(ToolError::UnknownConstant(needle))
}

/// Find the first constant whose full name appears in `text`
pub fn find_constant_in(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    PHYSICAL_CONSTANTS
        .iter()
        .map(|c| c.name)
        .find(|name| lowered.contains(name))
}
