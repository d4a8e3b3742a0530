use {
    crate::{drive::DriveBinding, poller::Endpoint},
    eyre::{Report, WrapErr as _},
    handrig_animate::{
        CompositionPolicy, Finger, FingerMap, FingerProfile, HandProfile,
        WeightTable,
    },
    nalgebra as na,
    std::{path::PathBuf, time::Duration},
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Axis `{axis:?}` of {what} has zero length")]
    DegenerateAxis { what: String, axis: [f32; 3] },

    #[error("Drive binding of DOF{dof} has an empty position range")]
    EmptyRange { dof: u8 },
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub poll: PollConfig,
    pub model: ModelConfig,
    pub profile: ProfileConfig,
    pub panel: PanelConfig,
    pub grasp_cycle: GraspCycleConfig,
    pub live_drive: Vec<DriveBinding>,
}

impl Config {
    pub fn load_default() -> Result<Self, Report> {
        // Explicit path must exist, default one is optional.
        if let Some(path) = std::env::var_os("HANDRIG_CONFIG_PATH") {
            return Self::load(PathBuf::from(path));
        }

        let path = PathBuf::from("./cfg.ron");
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    #[tracing::instrument]
    pub fn load(path: PathBuf) -> Result<Self, Report> {
        let file = std::fs::File::open(&path).wrap_err_with(|| {
            format!("Failed to open config '{}'", path.display())
        })?;
        let config = ron::de::from_reader(file).wrap_err_with(|| {
            format!("Failed to parse config '{}'", path.display())
        })?;
        Ok(config)
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            url: "http://127.0.0.1:5000".to_owned(),
            timeout_ms: 2000,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub status_interval_ms: u64,
    pub force_interval_ms: u64,
    pub grasp_interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            status_interval_ms: 100,
            force_interval_ms: 300,
            grasp_interval_ms: 500,
        }
    }
}

impl PollConfig {
    pub fn interval(&self, endpoint: Endpoint) -> Duration {
        let ms = match endpoint {
            Endpoint::Status => self.status_interval_ms,
            Endpoint::Force => self.force_interval_ms,
            Endpoint::GraspStatus => self.grasp_interval_ms,
        };
        Duration::from_millis(ms.max(1))
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: Option<PathBuf>,
    pub policy: CompositionPolicy,
    pub frames_per_second: f32,
    /// Joint names overriding the stock `thumb01`.. naming.
    pub joints: Vec<FingerJoints>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            path: None,
            policy: CompositionPolicy::Independent,
            frames_per_second: 60.0,
            joints: Vec::new(),
        }
    }
}

impl ModelConfig {
    pub fn frame_time(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.frames_per_second.max(1.0))
    }

    pub fn finger_map(&self) -> FingerMap {
        let mut map = FingerMap::default();
        for entry in &self.joints {
            map.set_names(entry.finger, entry.names.clone());
        }
        map
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct FingerJoints {
    pub finger: Finger,
    pub names: Vec<String>,
}

/// Overrides on top of the stock hand profile.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub fingers: Vec<FingerProfileConfig>,
    pub swing_axis: Option<[f32; 3]>,
    pub swing_scale: Option<f32>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct FingerProfileConfig {
    pub finger: Finger,
    #[serde(default)]
    pub axis: Option<[f32; 3]>,
    #[serde(default)]
    pub weights: Option<Vec<f32>>,
}

impl ProfileConfig {
    pub fn build(&self) -> Result<HandProfile, ConfigError> {
        let mut profile = HandProfile::default();

        for entry in &self.fingers {
            let stock = profile.finger(entry.finger).clone();
            let axis = match entry.axis {
                Some(axis) => unit_axis(axis, entry.finger.as_str())?,
                None => stock.axis,
            };
            let weights = match &entry.weights {
                Some(weights) => WeightTable::new(weights.iter().copied()),
                None => stock.weights,
            };
            profile.set_finger(entry.finger, FingerProfile { axis, weights });
        }

        if let Some(axis) = self.swing_axis {
            profile.swing_axis = unit_axis(axis, "thumb swing")?;
        }
        if let Some(scale) = self.swing_scale {
            profile.swing_scale = scale;
        }

        Ok(profile)
    }
}

fn unit_axis(
    axis: [f32; 3],
    what: &str,
) -> Result<na::Unit<na::Vector3<f32>>, ConfigError> {
    let [x, y, z] = axis;
    na::Unit::try_new(na::Vector3::new(x, y, z), 1.0e-6).ok_or_else(|| {
        ConfigError::DegenerateAxis {
            what: what.to_owned(),
            axis,
        }
    })
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Any force component at or above this marks a sensor overloaded.
    pub force_threshold: f64,
    /// Multiplier from raw force magnitude to displayed total.
    pub force_scale: f64,
    pub redraw_interval_ms: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            force_threshold: 10.0,
            force_scale: 0.1,
            redraw_interval_ms: 500,
        }
    }
}

impl PanelConfig {
    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.redraw_interval_ms)
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct GraspCycleConfig {
    /// How long to hold a grasp before resetting.
    pub grasp_ms: u64,
    /// How long to stay open before grasping again.
    pub reset_ms: u64,
}

impl Default for GraspCycleConfig {
    fn default() -> Self {
        GraspCycleConfig {
            grasp_ms: 5000,
            reset_ms: 7000,
        }
    }
}
