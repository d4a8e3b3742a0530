//! JSON shapes exchanged with the hand backend.
//!
//! Decoding is lenient: absent, `null` or mistyped numeric fields become
//! `None` instead of failing the whole reply.

use {
    serde::{Deserialize, Deserializer},
    serde_json::Value,
    std::{collections::BTreeMap, convert::TryFrom as _},
};

/// Number of actuated degrees of freedom reported by the backend.
pub const DOF_COUNT: u8 = 6;

/// Force value the sensor board reports when it has no reading.
pub const FORCE_SENTINEL: f64 = -1.0;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DofStatus {
    #[serde(rename = "temperature_C", default, deserialize_with = "lenient_f64")]
    pub temperature_c: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_position: Option<f64>,

    #[serde(default, deserialize_with = "lenient_u32")]
    pub error_code: Option<u32>,
}

/// Reply of `GET /status`, keyed `DOF1` to `DOF6` on the wire.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusReport {
    dofs: BTreeMap<u8, DofStatus>,
}

impl StatusReport {
    pub fn get(&self, dof: u8) -> Option<&DofStatus> {
        self.dofs.get(&dof)
    }

    pub fn insert(&mut self, dof: u8, status: DofStatus) {
        self.dofs.insert(dof, status);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &DofStatus)> + '_ {
        self.dofs.iter().map(|(&dof, status)| (dof, status))
    }

    pub fn is_empty(&self) -> bool {
        self.dofs.is_empty()
    }
}

impl<'de> Deserialize<'de> for StatusReport {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut report = StatusReport::default();

        for dof in 1..=DOF_COUNT {
            let key = format!("DOF{}", dof);
            if let Some(value) = raw.get(&key) {
                match DofStatus::deserialize(value) {
                    Ok(status) => report.insert(dof, status),
                    Err(err) => {
                        tracing::debug!("Skipping malformed {}: {}", key, err)
                    }
                }
            }
        }

        Ok(report)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SensorReading {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fx: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub fy: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub fz: Option<f64>,

    #[serde(default, deserialize_with = "lenient_u32")]
    pub error_code: Option<u32>,
}

impl SensorReading {
    /// Force components with missing and sentinel readings zeroed.
    pub fn components(&self) -> [f64; 3] {
        [
            force_component(self.fx),
            force_component(self.fy),
            force_component(self.fz),
        ]
    }

    pub fn magnitude(&self) -> f64 {
        let [fx, fy, fz] = self.components();
        (fx * fx + fy * fy + fz * fz).sqrt()
    }
}

/// Zero for absent or sentinel readings.
pub fn force_component(value: Option<f64>) -> f64 {
    match value {
        Some(value) if value != FORCE_SENTINEL && value.is_finite() => value,
        _ => 0.0,
    }
}

/// Reply of `GET /force_data`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ForceReport {
    #[serde(default)]
    pub sensors: Vec<SensorReading>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraspState {
    Grasped,
    Grasping,
    Waiting,
    /// Grasp status could not be fetched.
    Unknown,
}

impl GraspState {
    /// Maps a backend status string onto a state.
    /// Anything unrecognized means the grasper is idle.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "已抓取" | "grasped" => GraspState::Grasped,
            "抓取中" | "grasping" => GraspState::Grasping,
            _ => GraspState::Waiting,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GraspState::Grasped => "grasped",
            GraspState::Grasping => "grasping...",
            GraspState::Waiting => "waiting",
            GraspState::Unknown => "unknown",
        }
    }
}

/// Reply of `GET /grasp_status`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraspStatusReply {
    #[serde(default)]
    pub status: String,
}

impl GraspStatusReply {
    pub fn state(&self) -> GraspState {
        GraspState::from_label(&self.status)
    }
}

/// Reply of `POST /command` and `POST /grasp`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CommandReply {
    pub status: String,

    #[serde(default)]
    pub msg: Option<String>,

    #[serde(default)]
    pub is_grasping: Option<bool>,
}

impl CommandReply {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Clears a hardware fault on all actuators.
pub const CLEAR_FAULT: &str = "clear_fault";

/// Stops the grasp thread and opens the hand.
pub const RESET_GRASP: &str = "reset_grasp";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraspCommand {
    Start,
    Stop,
}

impl GraspCommand {
    pub fn token(self) -> &'static str {
        match self {
            GraspCommand::Start => "start_grasp",
            GraspCommand::Stop => "stop_grasp",
        }
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|code| u32::try_from(code).ok()))
}
