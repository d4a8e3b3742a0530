use {crate::finger::Finger, nalgebra as na, smallvec::SmallVec};

pub const DEFAULT_SWING_SCALE: f32 = 0.5;

/// Bend multipliers indexed by joint position along a finger.
/// Positions past the end reuse the last weight.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightTable {
    weights: SmallVec<[f32; 4]>,
}

impl WeightTable {
    pub fn new<I>(weights: I) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        WeightTable {
            weights: weights.into_iter().collect(),
        }
    }

    pub fn weight(&self, position: usize) -> f32 {
        match self.weights.get(position) {
            Some(&weight) => weight,
            None => self.weights.last().copied().unwrap_or(0.0),
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.weights
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FingerProfile {
    pub axis: na::Unit<na::Vector3<f32>>,
    pub weights: WeightTable,
}

/// Bend axes and weights of every finger, plus the thumb swing setup.
#[derive(Clone, Debug, PartialEq)]
pub struct HandProfile {
    fingers: [FingerProfile; 5],
    pub swing_axis: na::Unit<na::Vector3<f32>>,
    pub swing_scale: f32,
}

impl Default for HandProfile {
    fn default() -> Self {
        let thumb = FingerProfile {
            axis: na::Vector3::x_axis(),
            weights: WeightTable::new(vec![0.5, 0.35, 0.25, 0.15]),
        };
        let finger = FingerProfile {
            axis: na::Vector3::z_axis(),
            weights: WeightTable::new(vec![0.5, 0.8, 0.3]),
        };

        HandProfile {
            fingers: [
                thumb,
                finger.clone(),
                finger.clone(),
                finger.clone(),
                finger,
            ],
            swing_axis: na::Vector3::z_axis(),
            swing_scale: DEFAULT_SWING_SCALE,
        }
    }
}

impl HandProfile {
    pub fn finger(&self, finger: Finger) -> &FingerProfile {
        &self.fingers[finger.index()]
    }

    pub fn set_finger(&mut self, finger: Finger, profile: FingerProfile) {
        self.fingers[finger.index()] = profile;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_weight_is_reused() {
        let table = WeightTable::new(vec![0.5, 0.8]);
        assert_eq!(table.weight(0), 0.5);
        assert_eq!(table.weight(1), 0.8);
        assert_eq!(table.weight(2), 0.8);
        assert_eq!(table.weight(9), 0.8);
    }

    #[test]
    fn empty_table_does_not_bend() {
        let table = WeightTable::new(Vec::new());
        assert_eq!(table.weight(0), 0.0);
    }

    #[test]
    fn default_profile_matches_stock_rig() {
        let profile = HandProfile::default();
        assert_eq!(
            profile.finger(Finger::Thumb).weights.as_slice(),
            &[0.5, 0.35, 0.25, 0.15]
        );
        assert_eq!(profile.finger(Finger::Thumb).axis, na::Vector3::x_axis());
        assert_eq!(
            profile.finger(Finger::Pinky).weights.as_slice(),
            &[0.5, 0.8, 0.3]
        );
        assert_eq!(profile.finger(Finger::Middle).axis, na::Vector3::z_axis());
        assert_eq!(profile.swing_scale, 0.5);
    }
}
