//! Skeleton posing for a rigged hand model.
//!
//! Fingers are bent by a single scalar each, distributed over the finger's
//! joints by a weight table and applied on top of rest orientations
//! captured when the skeleton was loaded.

pub mod finger;
pub mod pose;
pub mod profile;
pub mod rig;
pub mod skeleton;

pub use self::{
    finger::{Finger, FingerMap, UnknownFinger},
    pose::Pose,
    profile::{FingerProfile, HandProfile, WeightTable, DEFAULT_SWING_SCALE},
    rig::{CompositionPolicy, HandParams, HandRig, BEND_MAX, SWING_MAX},
    skeleton::{Joint, JointDesc, JointId, Skeleton, SkeletonBuilder, SkeletonError},
};
