use {nalgebra as na, std::collections::HashMap};

/// Index of a joint within its skeleton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(usize);

impl JointId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct Joint {
    name: Option<Box<str>>,
    parent: Option<JointId>,
    translation: na::Translation3<f32>,
    scale: na::Vector3<f32>,
    rest: na::UnitQuaternion<f32>,
    rotation: na::UnitQuaternion<f32>,
}

impl Joint {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<JointId> {
        self.parent
    }

    /// Orientation captured when the skeleton was built.
    pub fn rest(&self) -> na::UnitQuaternion<f32> {
        self.rest
    }

    pub fn rotation(&self) -> na::UnitQuaternion<f32> {
        self.rotation
    }

    pub fn translation(&self) -> na::Translation3<f32> {
        self.translation
    }

    pub fn scale(&self) -> na::Vector3<f32> {
        self.scale
    }

    /// Parent-relative transform with the live rotation.
    pub fn local_matrix(&self) -> na::Matrix4<f32> {
        na::Isometry3::from_parts(self.translation, self.rotation)
            .to_homogeneous()
            * na::Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

/// Tree-like structure of joints.
/// Parents always precede their children.
#[derive(Clone, Debug)]
pub struct Skeleton {
    joints: Box<[Joint]>,
    names: HashMap<Box<str>, JointId>,
}

impl Skeleton {
    pub fn builder() -> SkeletonBuilder {
        SkeletonBuilder::default()
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, id: JointId) -> &Joint {
        &self.joints[id.0]
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<JointId> {
        self.names.get(name).copied()
    }

    pub fn rest(&self, id: JointId) -> na::UnitQuaternion<f32> {
        self.joints[id.0].rest
    }

    pub fn rotation(&self, id: JointId) -> na::UnitQuaternion<f32> {
        self.joints[id.0].rotation
    }

    pub fn set_rotation(
        &mut self,
        id: JointId,
        rotation: na::UnitQuaternion<f32>,
    ) {
        self.joints[id.0].rotation = rotation;
    }

    /// Puts every joint back to its rest orientation.
    pub fn reset_to_rest(&mut self) {
        for joint in self.joints.iter_mut() {
            joint.rotation = joint.rest;
        }
    }
}

/// Description of a joint to append to a [`SkeletonBuilder`].
#[derive(Clone, Debug)]
pub struct JointDesc {
    pub name: Option<String>,
    pub parent: Option<JointId>,
    pub translation: na::Translation3<f32>,
    pub rotation: na::UnitQuaternion<f32>,
    pub scale: na::Vector3<f32>,
}

impl JointDesc {
    pub fn new(name: impl Into<String>) -> Self {
        JointDesc {
            name: Some(name.into()),
            ..JointDesc::unnamed()
        }
    }

    pub fn unnamed() -> Self {
        JointDesc {
            name: None,
            parent: None,
            translation: na::Translation3::identity(),
            rotation: na::UnitQuaternion::identity(),
            scale: na::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_parent(mut self, parent: JointId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_translation(mut self, translation: na::Translation3<f32>) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: na::UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: na::Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SkeletonError {
    #[error("Joint references parent `{parent}` but only {count} joints are defined")]
    UnknownParent { parent: usize, count: usize },
}

#[derive(Debug, Default)]
pub struct SkeletonBuilder {
    joints: Vec<Joint>,
    names: HashMap<Box<str>, JointId>,
}

impl SkeletonBuilder {
    pub fn add(&mut self, desc: JointDesc) -> Result<JointId, SkeletonError> {
        if let Some(parent) = desc.parent {
            if parent.0 >= self.joints.len() {
                return Err(SkeletonError::UnknownParent {
                    parent: parent.0,
                    count: self.joints.len(),
                });
            }
        }

        let id = JointId(self.joints.len());
        let name = desc.name.map(String::into_boxed_str);

        if let Some(name) = &name {
            if self.names.contains_key(name) {
                tracing::warn!(
                    "Duplicate joint name '{}', keeping the first one",
                    name
                );
            } else {
                self.names.insert(name.clone(), id);
            }
        }

        self.joints.push(Joint {
            name,
            parent: desc.parent,
            translation: desc.translation,
            scale: desc.scale,
            rest: desc.rotation,
            rotation: desc.rotation,
        });

        Ok(id)
    }

    /// Finishes the skeleton.
    /// Current orientations become the rest orientations.
    pub fn build(self) -> Skeleton {
        Skeleton {
            joints: self.joints.into_boxed_slice(),
            names: self.names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parents_must_precede_children() {
        let mut builder = Skeleton::builder();
        let root = builder.add(JointDesc::new("wrist")).unwrap();
        builder
            .add(JointDesc::new("index01").with_parent(root))
            .unwrap();

        let err = builder
            .add(JointDesc::new("index02").with_parent(JointId(7)))
            .unwrap_err();
        assert!(matches!(
            err,
            SkeletonError::UnknownParent { parent: 7, count: 2 }
        ));
    }

    #[test]
    fn duplicate_names_resolve_to_first_joint() {
        let mut builder = Skeleton::builder();
        let first = builder.add(JointDesc::new("thumb01")).unwrap();
        builder.add(JointDesc::new("thumb01")).unwrap();
        let skeleton = builder.build();

        assert_eq!(skeleton.len(), 2);
        assert_eq!(skeleton.find("thumb01"), Some(first));
        assert_eq!(skeleton.find("thumb02"), None);
    }

    #[test]
    fn reset_restores_captured_rest() {
        let rest = na::UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let mut builder = Skeleton::builder();
        let id = builder
            .add(JointDesc::new("ring01").with_rotation(rest))
            .unwrap();
        let mut skeleton = builder.build();

        skeleton.set_rotation(id, na::UnitQuaternion::identity());
        assert_ne!(skeleton.rotation(id), rest);

        skeleton.reset_to_rest();
        assert_eq!(skeleton.rotation(id), rest);
        assert_eq!(skeleton.rest(id), rest);
    }
}
