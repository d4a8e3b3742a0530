//! Hand skeleton extraction from glTF assets.
//!
//! Only the node hierarchy is read. Meshes, skins and buffers are left to
//! whatever renders the model.

use {
    gltf::Node,
    handrig_animate::{JointDesc, JointId, Skeleton, SkeletonBuilder, SkeletonError},
    nalgebra as na,
    std::path::Path,
};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Gltf {
        #[from]
        source: gltf::Error,
    },

    #[error("GLTF with no scenes")]
    NoScenes,

    #[error(transparent)]
    Skeleton {
        #[from]
        source: SkeletonError,
    },
}

#[tracing::instrument]
pub fn load_skeleton(path: &Path) -> Result<Skeleton, ModelError> {
    let gltf = gltf::Gltf::open(path)?;
    skeleton_from_document(&gltf)
}

pub fn skeleton_from_slice(bytes: &[u8]) -> Result<Skeleton, ModelError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    skeleton_from_document(&gltf)
}

/// Builds skeleton from the default scene, or the first one when no
/// default is set. Node transforms become rest poses.
pub fn skeleton_from_document(
    document: &gltf::Document,
) -> Result<Skeleton, ModelError> {
    let scene = match document.default_scene() {
        Some(scene) => scene,
        None => document.scenes().next().ok_or(ModelError::NoScenes)?,
    };

    let mut builder = Skeleton::builder();
    for node in scene.nodes() {
        add_node(None, node, &mut builder)?;
    }

    let skeleton = builder.build();
    tracing::info!("Skeleton with {} joints loaded", skeleton.len());
    Ok(skeleton)
}

fn add_node(
    parent: Option<JointId>,
    node: Node<'_>,
    builder: &mut SkeletonBuilder,
) -> Result<(), ModelError> {
    let (translation, rotation, scale) = node_transform(&node);

    let mut desc = match node.name() {
        Some(name) => JointDesc::new(name),
        None => JointDesc::unnamed(),
    }
    .with_translation(translation)
    .with_rotation(rotation)
    .with_scale(scale);
    desc.parent = parent;

    let id = builder.add(desc)?;
    for child in node.children() {
        add_node(Some(id), child, builder)?;
    }
    Ok(())
}

fn node_transform(
    node: &Node,
) -> (
    na::Translation3<f32>,
    na::UnitQuaternion<f32>,
    na::Vector3<f32>,
) {
    let (t, r, s) = node.transform().decomposed();
    let [tx, ty, tz] = t;
    let [rx, ry, rz, rw] = r;
    (
        na::Translation3::new(tx, ty, tz),
        na::Unit::new_normalize(na::Quaternion::new(rw, rx, ry, rz)),
        s.into(),
    )
}
