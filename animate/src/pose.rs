use {
    crate::skeleton::{JointId, Skeleton},
    nalgebra as na,
};

/// Model-space transforms of every joint.
#[derive(Clone, Debug)]
pub struct Pose {
    pub matrices: Box<[na::Matrix4<f32>]>,
}

impl Pose {
    pub fn identity(size: usize) -> Pose {
        Pose {
            matrices: (0..size).map(|_| na::Matrix4::identity()).collect(),
        }
    }

    pub fn compute(skeleton: &Skeleton) -> Pose {
        let mut pose = Pose::identity(skeleton.len());
        pose.update(skeleton);
        pose
    }

    /// Recomputes transforms from the live joint rotations.
    pub fn update(&mut self, skeleton: &Skeleton) {
        if self.matrices.len() != skeleton.len() {
            *self = Pose::identity(skeleton.len());
        }

        for (index, joint) in skeleton.joints().iter().enumerate() {
            let local = joint.local_matrix();
            self.matrices[index] = match joint.parent() {
                // Parents precede children, so the parent is already done.
                Some(parent) => self.matrices[parent.index()] * local,
                None => local,
            };
        }
    }

    pub fn matrices(&self) -> &[na::Matrix4<f32>] {
        &self.matrices
    }

    pub fn position(&self, joint: JointId) -> na::Point3<f32> {
        let m = &self.matrices[joint.index()];
        na::Point3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::skeleton::JointDesc};

    #[test]
    fn children_follow_parent_rotation() {
        let mut builder = Skeleton::builder();
        let root = builder.add(JointDesc::new("wrist")).unwrap();
        let tip = builder
            .add(
                JointDesc::new("index01")
                    .with_parent(root)
                    .with_translation(na::Translation3::new(1.0, 0.0, 0.0)),
            )
            .unwrap();
        let mut skeleton = builder.build();

        let pose = Pose::compute(&skeleton);
        assert!((pose.position(tip) - na::Point3::new(1.0, 0.0, 0.0)).norm() < 1e-6);

        skeleton.set_rotation(
            root,
            na::UnitQuaternion::from_axis_angle(
                &na::Vector3::z_axis(),
                std::f32::consts::FRAC_PI_2,
            ),
        );
        let pose = Pose::compute(&skeleton);
        assert!((pose.position(tip) - na::Point3::new(0.0, 1.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn update_resizes_to_skeleton() {
        let mut builder = Skeleton::builder();
        builder.add(JointDesc::new("wrist")).unwrap();
        let skeleton = builder.build();

        let mut pose = Pose::identity(4);
        pose.update(&skeleton);
        assert_eq!(pose.matrices().len(), 1);
    }
}
