use {
    crate::{
        finger::{Finger, FingerMap},
        profile::HandProfile,
        skeleton::{JointId, Skeleton},
    },
    nalgebra as na,
    smallvec::SmallVec,
};

/// Upper bound of the bend control.
pub const BEND_MAX: f32 = 2.0;

/// Upper bound of the thumb swing control.
pub const SWING_MAX: f32 = 3.0;

/// How bend rotations of consecutive joints relate to each other.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CompositionPolicy {
    /// Every joint receives only its own bend on top of its rest orientation.
    Independent,

    /// Joint `i` is set to `rest_i * B_0 * .. * B_i`, where `B_k` is the
    /// bend of joint `k`. Each joint keeps its own rest orientation, only
    /// the bends accumulate along the finger.
    Chained,
}

impl Default for CompositionPolicy {
    fn default() -> Self {
        CompositionPolicy::Independent
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandParams {
    bend: [f32; 5],
    pub thumb_swing: f32,
}

impl HandParams {
    pub fn bend(&self, finger: Finger) -> f32 {
        self.bend[finger.index()]
    }

    pub fn set_bend(&mut self, finger: Finger, value: f32) {
        self.bend[finger.index()] = value;
    }

    pub fn with_bend(mut self, finger: Finger, value: f32) -> Self {
        self.set_bend(finger, value);
        self
    }

    pub fn with_swing(mut self, value: f32) -> Self {
        self.thumb_swing = value;
        self
    }
}

/// Joints of one finger that were found in the skeleton.
#[derive(Clone, Debug, Default)]
struct FingerChain {
    joints: SmallVec<[JointId; 4]>,
}

/// Posing context for a loaded hand.
///
/// Built once after the skeleton is loaded. Holds name lookups resolved
/// against that skeleton, the hand profile and the current parameters.
#[derive(Clone, Debug)]
pub struct HandRig {
    chains: [FingerChain; 5],
    profile: HandProfile,
    policy: CompositionPolicy,
    params: HandParams,
}

impl HandRig {
    pub fn new(
        skeleton: &Skeleton,
        map: &FingerMap,
        profile: HandProfile,
        policy: CompositionPolicy,
    ) -> Self {
        let resolve = |finger: Finger| {
            let joints: SmallVec<[JointId; 4]> = map
                .names(finger)
                .iter()
                .filter_map(|name| {
                    let id = skeleton.find(name);
                    if id.is_none() {
                        tracing::debug!(
                            "Joint '{}' of {} finger not found",
                            name,
                            finger
                        );
                    }
                    id
                })
                .collect();

            if joints.is_empty() {
                tracing::warn!("No joints found for {} finger", finger);
            }
            FingerChain { joints }
        };

        HandRig {
            chains: [
                resolve(Finger::Thumb),
                resolve(Finger::Index),
                resolve(Finger::Middle),
                resolve(Finger::Ring),
                resolve(Finger::Pinky),
            ],
            profile,
            policy,
            params: HandParams::default(),
        }
    }

    /// Resolved joints of the finger, proximal to distal.
    pub fn chain(&self, finger: Finger) -> &[JointId] {
        &self.chains[finger.index()].joints
    }

    pub fn params(&self) -> &HandParams {
        &self.params
    }

    pub fn profile(&self) -> &HandProfile {
        &self.profile
    }

    pub fn policy(&self) -> CompositionPolicy {
        self.policy
    }

    /// Control surface entry for a finger's bend.
    /// Bounds the value to `0..=BEND_MAX` and reposes the finger.
    pub fn set_bend(&mut self, skeleton: &mut Skeleton, finger: Finger, value: f32) {
        self.params.set_bend(finger, value.max(0.0).min(BEND_MAX));
        self.update_finger(skeleton, finger);
    }

    /// Control surface entry for the thumb swing.
    /// Bounds the value to `0..=SWING_MAX` and reposes the thumb.
    pub fn set_swing(&mut self, skeleton: &mut Skeleton, value: f32) {
        self.params.thumb_swing = value.max(0.0).min(SWING_MAX);
        self.update_finger(skeleton, Finger::Thumb);
    }

    /// Replaces all parameters as given and reposes the hand.
    pub fn apply(&mut self, skeleton: &mut Skeleton, params: HandParams) {
        self.params = params;
        self.update_all(skeleton);
    }

    /// Zeroes all parameters, which brings every finger to rest.
    pub fn reset(&mut self, skeleton: &mut Skeleton) {
        self.apply(skeleton, HandParams::default());
    }

    pub fn update_all(&self, skeleton: &mut Skeleton) {
        for &finger in &Finger::ALL {
            self.update_finger(skeleton, finger);
        }
    }

    /// Recomputes orientation of every joint of the finger from its rest
    /// orientation and the current parameters.
    pub fn update_finger(&self, skeleton: &mut Skeleton, finger: Finger) {
        let joints = self.chain(finger);
        let profile = self.profile.finger(finger);
        let bend = self.params.bend(finger);
        let distal = joints.len().checked_sub(1);

        let mut chained = na::UnitQuaternion::identity();

        for (position, &joint) in joints.iter().enumerate() {
            let step = na::UnitQuaternion::from_axis_angle(
                &profile.axis,
                bend * profile.weights.weight(position),
            );

            let bend_rotation = match self.policy {
                CompositionPolicy::Independent => step,
                CompositionPolicy::Chained => {
                    chained *= step;
                    chained
                }
            };

            let mut rotation = skeleton.rest(joint) * bend_rotation;

            if finger == Finger::Thumb && Some(position) == distal {
                rotation *= na::UnitQuaternion::from_axis_angle(
                    &self.profile.swing_axis,
                    self.params.thumb_swing * self.profile.swing_scale,
                );
            }

            skeleton.set_rotation(joint, rotation);
        }
    }
}
