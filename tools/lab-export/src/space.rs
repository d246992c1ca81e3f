//! Coordinate-space and unit reconciliation
//!
//! `.lab` assets are authored Z-up, right-handed, one unit per meter. The
//! converter applies a single change of basis `B` (plus a uniform unit
//! scale) to every transform in the asset:
//!
//! - translations: `B * t * unit_scale`
//! - rotations: `B * q * B⁻¹`
//! - scales: re-ordered to follow the axis swap, never multiplied by
//!   `unit_scale` (that would compound down the bone chain)
//!
//! Bind poses, dummies, keyframes and mesh data all go through the same
//! mapping, so skinning and playback stay consistent.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use lab_common::{
    AnimationClip, AnimationTrack, Bone, Dummy, Keyframe, MeshData, SkeletalAsset, Transform,
};
use serde::{Deserialize, Serialize};

/// Up axis of the converted asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UpAxis {
    /// Y-up, the common animation-tool convention
    #[default]
    Y,
    /// Z-up, the engine's native convention (no axis change)
    Z,
}

impl UpAxis {
    /// Rotation taking engine (Z-up) coordinates to this convention
    pub fn basis(self) -> Quat {
        match self {
            // (x, y, z) -> (x, z, -y)
            UpAxis::Y => Quat::from_rotation_x(-FRAC_PI_2),
            UpAxis::Z => Quat::IDENTITY,
        }
    }

    /// Value of the COLLADA `<up_axis>` element
    pub fn collada_name(self) -> &'static str {
        match self {
            UpAxis::Y => "Y_UP",
            UpAxis::Z => "Z_UP",
        }
    }
}

/// Space conversion settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceConfig {
    pub up_axis: UpAxis,
    /// Multiplier for translations and mesh positions; finite and > 0
    pub unit_scale: f32,
    /// Reverse triangle winding order
    pub flip_winding: bool,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            up_axis: UpAxis::Y,
            unit_scale: 1.0,
            flip_winding: false,
        }
    }
}

impl SpaceConfig {
    /// Meters per converted unit, for the COLLADA `<unit>` element
    pub fn meter(&self) -> f32 {
        1.0 / self.unit_scale
    }
}

/// Change of basis applied to every transform
#[derive(Debug, Clone, Copy)]
struct Basis {
    rotation: Quat,
    inverse: Quat,
    unit_scale: f32,
}

impl Basis {
    fn new(config: &SpaceConfig) -> Self {
        let rotation = config.up_axis.basis();
        Self {
            rotation,
            inverse: rotation.inverse(),
            unit_scale: config.unit_scale,
        }
    }

    fn point(&self, p: Vec3) -> Vec3 {
        self.rotation * p * self.unit_scale
    }

    fn direction(&self, d: Vec3) -> Vec3 {
        self.rotation * d
    }

    fn transform(&self, t: &Transform) -> Transform {
        Transform {
            translation: self.point(t.translation),
            rotation: (self.rotation * t.rotation * self.inverse).normalize(),
            scale: (self.rotation * t.scale).abs(),
        }
    }
}

/// Produce a new asset expressed in the target convention.
///
/// Pure: the input is left untouched.
pub fn convert(asset: &SkeletalAsset, config: &SpaceConfig) -> SkeletalAsset {
    let basis = Basis::new(config);
    tracing::debug!(
        "space conversion: up axis {:?}, unit scale {}, flip winding {}",
        config.up_axis,
        config.unit_scale,
        config.flip_winding
    );

    let bones = asset
        .bones
        .iter()
        .map(|bone| Bone {
            local_bind_transform: basis.transform(&bone.local_bind_transform),
            ..bone.clone()
        })
        .collect();

    let dummies = asset
        .dummies
        .iter()
        .map(|dummy| Dummy {
            transform: basis.transform(&dummy.transform),
            ..dummy.clone()
        })
        .collect();

    let clips = asset
        .clips
        .iter()
        .map(|clip| AnimationClip {
            name: clip.name.clone(),
            frame_rate: clip.frame_rate,
            tracks: clip
                .tracks
                .iter()
                .map(|track| AnimationTrack {
                    bone_index: track.bone_index,
                    keyframes: track
                        .keyframes
                        .iter()
                        .map(|key| Keyframe {
                            time: key.time,
                            transform: basis.transform(&key.transform),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    let mesh = asset
        .mesh
        .as_ref()
        .map(|mesh| convert_mesh(mesh, &basis, config.flip_winding));

    SkeletalAsset {
        bones,
        dummies,
        clips,
        mesh,
    }
}

fn convert_mesh(mesh: &MeshData, basis: &Basis, flip_winding: bool) -> MeshData {
    let mut indices = mesh.indices.clone();
    if flip_winding {
        for triangle in indices.chunks_exact_mut(3) {
            triangle.swap(1, 2);
        }
    }

    MeshData {
        positions: mesh.positions.iter().map(|&p| basis.point(p)).collect(),
        normals: mesh
            .normals
            .iter()
            .map(|&n| basis.direction(n).normalize_or_zero())
            .collect(),
        indices,
        weights: mesh.weights.clone(),
    }
}
