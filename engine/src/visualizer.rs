use {
    crate::{
        config::Config, drive::LiveDrive, fps_counter::FpsCounter,
        model::load_skeleton, protocol::StatusReport,
    },
    eyre::{Report, WrapErr as _},
    handrig_animate::{Finger, HandParams, HandRig, JointId, Pose, Skeleton},
    nalgebra as na,
    std::{
        path::Path,
        time::{Duration, Instant},
    },
};

/// Loaded hand model together with its posing state.
///
/// Control changes only touch joint rotations. World matrices are
/// recomputed once per frame.
pub struct Visualizer {
    skeleton: Skeleton,
    rig: HandRig,
    pose: Pose,
    fps: FpsCounter,
    last_frame: Option<Instant>,
}

impl Visualizer {
    /// Resolves finger chains of `config` against the skeleton and brings
    /// the hand to rest.
    pub fn new(mut skeleton: Skeleton, config: &Config) -> Result<Self, Report> {
        let profile = config.profile.build()?;
        let mut rig = HandRig::new(
            &skeleton,
            &config.model.finger_map(),
            profile,
            config.model.policy,
        );
        rig.reset(&mut skeleton);

        let pose = Pose::compute(&skeleton);
        Ok(Visualizer {
            skeleton,
            rig,
            pose,
            fps: FpsCounter::new(Duration::from_secs(1)),
            last_frame: None,
        })
    }

    /// Loads the model at `path`.
    pub fn load(config: &Config, path: &Path) -> Result<Self, Report> {
        let skeleton = load_skeleton(path).wrap_err_with(|| {
            format!("Failed to load hand model '{}'", path.display())
        })?;
        Visualizer::new(skeleton, config)
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Joints of the finger that were found in the model.
    pub fn chain(&self, finger: Finger) -> &[JointId] {
        self.rig.chain(finger)
    }

    pub fn params(&self) -> &HandParams {
        self.rig.params()
    }

    pub fn set_bend(&mut self, finger: Finger, value: f32) {
        self.rig.set_bend(&mut self.skeleton, finger, value);
    }

    pub fn set_swing(&mut self, value: f32) {
        self.rig.set_swing(&mut self.skeleton, value);
    }

    pub fn reset(&mut self) {
        self.rig.reset(&mut self.skeleton);
    }

    /// Sets bends of bound fingers from reported DOF positions.
    /// Returns whether any finger was driven.
    pub fn drive(&mut self, drive: &LiveDrive, status: &StatusReport) -> bool {
        let mut driven = false;
        for (finger, bend) in drive.targets(status) {
            self.rig.set_bend(&mut self.skeleton, finger, bend);
            driven = true;
        }
        driven
    }

    /// Advances one frame and returns the up to date pose.
    pub fn frame(&mut self, now: Instant) -> &Pose {
        if let Some(last) = self.last_frame.replace(now) {
            self.fps.add_sample(now.saturating_duration_since(last));
        }
        self.pose.update(&self.skeleton);
        &self.pose
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }

    /// World positions of the last resolved joint of every finger.
    pub fn fingertips(&self) -> Vec<(Finger, na::Point3<f32>)> {
        Finger::ALL
            .iter()
            .filter_map(|&finger| {
                let tip = *self.rig.chain(finger).last()?;
                Some((finger, self.pose.position(tip)))
            })
            .collect()
    }
}
