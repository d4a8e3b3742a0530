use {
    crate::{config::ConfigError, protocol::StatusReport},
    handrig_animate::{Finger, BEND_MAX},
};

/// Maps a DOF position range onto a finger's bend.
///
/// `min_position` maps to a straight finger and `max_position` to full bend.
/// Inverted ranges are allowed.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct DriveBinding {
    pub finger: Finger,
    pub dof: u8,
    pub min_position: f64,
    pub max_position: f64,
}

impl DriveBinding {
    pub fn bend(&self, position: f64) -> f32 {
        let t = (position - self.min_position)
            / (self.max_position - self.min_position);
        (t.max(0.0).min(1.0) as f32) * BEND_MAX
    }
}

/// Drives finger bends from live DOF positions.
#[derive(Clone, Debug, Default)]
pub struct LiveDrive {
    bindings: Vec<DriveBinding>,
}

impl LiveDrive {
    pub fn new(bindings: Vec<DriveBinding>) -> Result<Self, ConfigError> {
        for binding in &bindings {
            let span = binding.max_position - binding.min_position;
            if !span.is_normal() {
                return Err(ConfigError::EmptyRange { dof: binding.dof });
            }
        }
        Ok(LiveDrive { bindings })
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bend targets for every bound DOF present in the report.
    pub fn targets<'a>(
        &'a self,
        status: &'a StatusReport,
    ) -> impl Iterator<Item = (Finger, f32)> + 'a {
        self.bindings.iter().filter_map(move |binding| {
            let position = status.get(binding.dof)?.current_position?;
            Some((binding.finger, binding.bend(position)))
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::protocol::DofStatus};

    fn binding(finger: Finger, dof: u8, min: f64, max: f64) -> DriveBinding {
        DriveBinding {
            finger,
            dof,
            min_position: min,
            max_position: max,
        }
    }

    fn position(value: f64) -> DofStatus {
        DofStatus {
            current_position: Some(value),
            ..DofStatus::default()
        }
    }

    #[test]
    fn positions_map_linearly_and_clamp() {
        let straight = binding(Finger::Index, 4, 0.0, 1000.0);
        assert_eq!(straight.bend(0.0), 0.0);
        assert_eq!(straight.bend(500.0), 1.0);
        assert_eq!(straight.bend(1000.0), 2.0);
        assert_eq!(straight.bend(1500.0), 2.0);
        assert_eq!(straight.bend(-20.0), 0.0);

        let inverted = binding(Finger::Thumb, 5, 1000.0, 0.0);
        assert_eq!(inverted.bend(250.0), 1.5);
    }

    #[test]
    fn targets_skip_unreported_dofs() {
        let drive = LiveDrive::new(vec![
            binding(Finger::Index, 4, 0.0, 1000.0),
            binding(Finger::Pinky, 1, 0.0, 1000.0),
            binding(Finger::Ring, 2, 0.0, 1000.0),
        ])
        .unwrap();

        let mut status = StatusReport::default();
        status.insert(4, position(250.0));
        status.insert(2, DofStatus::default());

        let targets: Vec<_> = drive.targets(&status).collect();
        assert_eq!(targets, vec![(Finger::Index, 0.5)]);
    }

    #[test]
    fn empty_range_is_rejected() {
        let err =
            LiveDrive::new(vec![binding(Finger::Middle, 3, 10.0, 10.0)])
                .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRange { dof: 3 }));
    }
}
