//! Text rendition of the hand status panel.

use {
    crate::{
        config::PanelConfig,
        poller::Update,
        protocol::{
            DofStatus, ForceReport, GraspState, SensorReading, StatusReport,
            FORCE_SENTINEL,
        },
    },
    std::fmt::{self, Write as _},
};

/// Formats an actuator error code as two uppercase hex digits.
pub fn format_error_code(code: Option<u32>) -> String {
    match code {
        Some(code) => format!("{:02X}", code),
        None => "--".to_owned(),
    }
}

/// Formats a raw force component, showing absent and sentinel readings as 0.
pub fn format_force(value: Option<f64>) -> String {
    match value {
        None => "0".to_owned(),
        Some(value) if value == FORCE_SENTINEL => "0".to_owned(),
        Some(value) => format!("{:.2}", value),
    }
}

fn format_number(value: Option<f64>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "--".to_owned(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForceRow {
    pub sensor: usize,
    pub fx: String,
    pub fy: String,
    pub fz: String,
    pub total: String,
    pub overloaded: bool,
}

/// Last known state of everything the backend reports.
#[derive(Debug)]
pub struct Panel {
    config: PanelConfig,
    status: StatusReport,
    force: ForceReport,
    grasp: Option<GraspState>,
}

impl Panel {
    pub fn new(config: PanelConfig) -> Self {
        Panel {
            config,
            status: StatusReport::default(),
            force: ForceReport::default(),
            grasp: None,
        }
    }

    /// Folds a poll reply into the panel.
    /// Failed status and force replies keep the previous values.
    /// Returns whether anything visible changed.
    pub fn apply(&mut self, update: &Update) -> bool {
        match update {
            Update::Status(Ok(status)) => {
                self.status = status.clone();
                true
            }
            Update::Force(Ok(force)) => {
                // Empty replies carry nothing to show.
                if force.sensors.is_empty() {
                    return false;
                }
                self.force = force.clone();
                true
            }
            Update::GraspStatus(Ok(state)) => {
                self.grasp.replace(*state) != Some(*state)
            }
            Update::Status(Err(err)) => {
                tracing::warn!("Failed to fetch status: {}", err);
                false
            }
            Update::Force(Err(err)) => {
                tracing::warn!("Failed to fetch force data: {}", err);
                false
            }
            Update::GraspStatus(Err(err)) => {
                tracing::warn!("Failed to fetch grasp status: {}", err);
                self.grasp.replace(GraspState::Unknown)
                    != Some(GraspState::Unknown)
            }
        }
    }

    pub fn status(&self) -> &StatusReport {
        &self.status
    }

    pub fn grasp(&self) -> GraspState {
        self.grasp.unwrap_or(GraspState::Waiting)
    }

    pub fn is_overloaded(&self, sensor: &SensorReading) -> bool {
        let threshold = self.config.force_threshold;
        sensor.components().iter().any(|c| c.abs() >= threshold)
    }

    pub fn force_rows(&self) -> Vec<ForceRow> {
        self.force
            .sensors
            .iter()
            .enumerate()
            .map(|(index, sensor)| ForceRow {
                sensor: index + 1,
                fx: format_force(sensor.fx),
                fy: format_force(sensor.fy),
                fz: format_force(sensor.fz),
                total: format!(
                    "{:.2}",
                    sensor.magnitude() * self.config.force_scale
                ),
                overloaded: self.is_overloaded(sensor),
            })
            .collect()
    }

    fn write_status_row(
        f: &mut fmt::Formatter<'_>,
        dof: u8,
        status: &DofStatus,
    ) -> fmt::Result {
        writeln!(
            f,
            "{:<5}{:>10}{:>10}{:>7}",
            dof,
            format_number(status.temperature_c),
            format_number(status.current_position),
            format_error_code(status.error_code),
        )
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<5}{:>10}{:>10}{:>7}", "DOF", "Temp(C)", "Position", "Error")?;
        for (dof, status) in self.status.iter() {
            Panel::write_status_row(f, dof, status)?;
        }

        let rows = self.force_rows();
        if !rows.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{:<8}{:>9}{:>9}{:>9}{:>9}  {}",
                "Sensor", "Fx", "Fy", "Fz", "Total", "State"
            )?;
            for row in rows {
                let mut line = String::new();
                let _ = write!(
                    line,
                    "{:<8}{:>9}{:>9}{:>9}{:>9}  {}",
                    row.sensor,
                    row.fx,
                    row.fy,
                    row.fz,
                    row.total,
                    if row.overloaded { "OVERLOAD" } else { "ok" }
                );
                writeln!(f, "{}", line.trim_end())?;
            }
        }

        writeln!(f)?;
        write!(f, "Grasp: {}", self.grasp().label())
    }
}
