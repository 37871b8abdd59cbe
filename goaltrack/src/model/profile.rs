//! Health profile characteristics read from the health store.

use serde::{Deserialize, Serialize};

use crate::error::{GoalTrackError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiologicalSex {
    Female,
    Male,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodType {
    pub fn label(self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

/// Characteristics and latest samples. Every field may be unknown.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthProfile {
    pub age: Option<u32>,
    pub biological_sex: Option<BiologicalSex>,
    pub blood_type: Option<BloodType>,
    pub weight_kg: Option<f64>,
    pub height_m: Option<f64>,
}

impl HealthProfile {
    pub fn body_mass_index(&self) -> Option<f64> {
        match (self.weight_kg, self.height_m) {
            (Some(weight), Some(height)) if height > 0.0 => Some(weight / (height * height)),
            _ => None,
        }
    }

    /// BMI for saving back to the health store.
    pub fn require_body_mass_index(&self) -> Result<f64> {
        self.body_mass_index()
            .ok_or(GoalTrackError::MissingBodyMassIndex)
    }
}
