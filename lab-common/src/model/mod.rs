//! Format-independent skeletal data model
//!
//! Bones live in a flat, index-ordered arena. A bone refers to its parent by
//! index, and every parent index is strictly lower than the child's, so the
//! hierarchy is a forest and absolute transforms can be computed in a single
//! forward pass.
//!
//! [`SkeletalAsset::new`] enforces every invariant; [`SkeletalAsset::validate`]
//! re-runs the same checks on an asset assembled by other means.

mod transform;

#[cfg(test)]
mod tests;

pub use transform::{ROTATION_TOLERANCE, Transform};

use glam::{Mat4, Vec3};
use hashbrown::{HashMap, HashSet};

use crate::error::ModelError;

/// Allowed deviation of a vertex's weight sum from 1.0
pub const WEIGHT_TOLERANCE: f32 = 1e-3;

/// Maximum number of bone influences per vertex
pub const MAX_INFLUENCES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Position of the bone in [`SkeletalAsset::bones`]
    pub index: u32,
    /// Unique within an asset
    pub name: String,
    /// `None` for root bones, otherwise strictly less than `index`
    pub parent_index: Option<u32>,
    pub local_bind_transform: Transform,
}

/// Attachment point hanging off a bone (weapon slots, effect anchors, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct Dummy {
    pub id: u32,
    pub parent_bone: u32,
    /// Transform relative to the parent bone
    pub transform: Transform,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Seconds, >= 0
    pub time: f32,
    pub transform: Transform,
}

/// Keyframes for one bone within one clip
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTrack {
    pub bone_index: u32,
    /// Non-empty, strictly increasing in time
    pub keyframes: Vec<Keyframe>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub frame_rate: f32,
    /// At most one track per bone; bones without a track hold their bind pose
    pub tracks: Vec<AnimationTrack>,
}

impl AnimationClip {
    /// Earliest and latest keyframe time across all tracks
    pub fn time_range(&self) -> (f32, f32) {
        let mut start = f32::INFINITY;
        let mut end = f32::NEG_INFINITY;
        for track in &self.tracks {
            if let (Some(first), Some(last)) = (track.keyframes.first(), track.keyframes.last()) {
                start = start.min(first.time);
                end = end.max(last.time);
            }
        }
        if start > end { (0.0, 0.0) } else { (start, end) }
    }

    pub fn keyframe_count(&self) -> usize {
        self.tracks.iter().map(|t| t.keyframes.len()).sum()
    }
}

/// Up to [`MAX_INFLUENCES`] bone influences for one vertex
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexWeights {
    pub bones: [u32; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl VertexWeights {
    /// Influences with a non-zero weight
    pub fn influences(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.bones
            .iter()
            .copied()
            .zip(self.weights.iter().copied())
            .filter(|&(_, w)| w != 0.0)
    }

    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

/// Skinned triangle mesh. Population is best-effort; an asset may have none.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Triangle list
    pub indices: Vec<u32>,
    /// One entry per vertex
    pub weights: Vec<VertexWeights>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkeletalAsset {
    /// `bones[i].index == i`
    pub bones: Vec<Bone>,
    pub dummies: Vec<Dummy>,
    pub clips: Vec<AnimationClip>,
    pub mesh: Option<MeshData>,
}

impl SkeletalAsset {
    /// Assemble an asset, checking every invariant
    pub fn new(
        bones: Vec<Bone>,
        dummies: Vec<Dummy>,
        clips: Vec<AnimationClip>,
        mesh: Option<MeshData>,
    ) -> Result<Self, ModelError> {
        let asset = Self {
            bones,
            dummies,
            clips,
            mesh,
        };
        asset.validate()?;
        Ok(asset)
    }

    pub fn bone(&self, index: u32) -> Option<&Bone> {
        self.bones.get(index as usize)
    }

    pub fn root_bones(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter().filter(|b| b.parent_index.is_none())
    }

    /// Child bone indices of every bone, indexed like [`Self::bones`]
    pub fn child_indices(&self) -> Vec<Vec<u32>> {
        let mut children = vec![Vec::new(); self.bones.len()];
        for bone in &self.bones {
            if let Some(list) = bone.parent_index.and_then(|p| children.get_mut(p as usize)) {
                list.push(bone.index);
            }
        }
        children
    }

    /// Dummies attached to a bone, with their position in [`Self::dummies`]
    pub fn dummies_of(&self, bone_index: u32) -> impl Iterator<Item = (usize, &Dummy)> {
        self.dummies
            .iter()
            .enumerate()
            .filter(move |(_, d)| d.parent_bone == bone_index)
    }

    /// Model-space bind matrix of every bone, indexed like [`Self::bones`].
    ///
    /// `absolute[i] = absolute[parent] * local[i]`, computed in ascending
    /// index order; relies on parents preceding their children.
    pub fn absolute_bind_transforms(&self) -> Vec<Mat4> {
        let mut absolute: Vec<Mat4> = Vec::with_capacity(self.bones.len());
        for bone in &self.bones {
            let local = bone.local_bind_transform.to_matrix();
            let world = match bone.parent_index.and_then(|p| absolute.get(p as usize)) {
                Some(parent) => *parent * local,
                None => local,
            };
            absolute.push(world);
        }
        absolute
    }

    /// Inverse of each bone's absolute bind matrix (skinning reference pose)
    pub fn inverse_bind_matrices(&self) -> Vec<Mat4> {
        self.absolute_bind_transforms()
            .into_iter()
            .map(|m| m.inverse())
            .collect()
    }

    /// Check all invariants: dense indices, parent-before-child ordering,
    /// unique names, valid transforms, resolvable tracks and dummies,
    /// monotonic keyframes and normalized skin weights.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.validate_bones()?;
        self.validate_dummies()?;
        for clip in &self.clips {
            self.validate_clip(clip)?;
        }
        if let Some(mesh) = &self.mesh {
            self.validate_mesh(mesh)?;
        }
        Ok(())
    }

    fn validate_bones(&self) -> Result<(), ModelError> {
        let mut names: HashMap<&str, u32> = HashMap::with_capacity(self.bones.len());

        for (position, bone) in self.bones.iter().enumerate() {
            if bone.index as usize != position {
                return Err(ModelError::BoneIndexMismatch {
                    position,
                    index: bone.index,
                });
            }
            if let Some(parent) = bone.parent_index {
                if parent >= bone.index {
                    return Err(ModelError::InvalidBoneHierarchy {
                        bone_index: bone.index,
                        parent_index: parent,
                    });
                }
            }
            if let Some(&first) = names.get(bone.name.as_str()) {
                return Err(ModelError::DuplicateBoneName {
                    name: bone.name.clone(),
                    first,
                    second: bone.index,
                });
            }
            names.insert(bone.name.as_str(), bone.index);

            bone.local_bind_transform
                .check()
                .map_err(|reason| ModelError::InvalidTransform {
                    location: format!("bone {} '{}'", bone.index, bone.name),
                    reason,
                })?;
        }

        // Skinning needs every bind pose to be invertible in f32
        for (bone, inverse) in self.bones.iter().zip(self.inverse_bind_matrices()) {
            if !inverse.is_finite() {
                return Err(ModelError::InvalidTransform {
                    location: format!("bone {} '{}'", bone.index, bone.name),
                    reason: "absolute bind transform is not invertible".to_string(),
                });
            }
        }
        Ok(())
    }

    fn validate_dummies(&self) -> Result<(), ModelError> {
        for dummy in &self.dummies {
            if self.bone(dummy.parent_bone).is_none() {
                return Err(ModelError::InvalidDummyParent {
                    dummy_id: dummy.id,
                    parent_bone: dummy.parent_bone,
                });
            }
            dummy
                .transform
                .check()
                .map_err(|reason| ModelError::InvalidTransform {
                    location: format!("dummy {}", dummy.id),
                    reason,
                })?;
        }
        Ok(())
    }

    fn validate_clip(&self, clip: &AnimationClip) -> Result<(), ModelError> {
        if !(clip.frame_rate.is_finite() && clip.frame_rate > 0.0) {
            return Err(ModelError::InvalidFrameRate {
                clip: clip.name.clone(),
                frame_rate: clip.frame_rate,
            });
        }
        if clip.tracks.is_empty() {
            return Err(ModelError::EmptyClip {
                clip: clip.name.clone(),
            });
        }

        let mut seen = HashSet::with_capacity(clip.tracks.len());
        for track in &clip.tracks {
            let bone_index = track.bone_index;
            if self.bone(bone_index).is_none() {
                return Err(ModelError::UnknownTrackBone {
                    clip: clip.name.clone(),
                    bone_index,
                });
            }
            if !seen.insert(bone_index) {
                return Err(ModelError::DuplicateTrack {
                    clip: clip.name.clone(),
                    bone_index,
                });
            }
            if track.keyframes.is_empty() {
                return Err(ModelError::EmptyTrack {
                    clip: clip.name.clone(),
                    bone_index,
                });
            }

            let mut previous: Option<f32> = None;
            for (key_index, key) in track.keyframes.iter().enumerate() {
                if !(key.time.is_finite() && key.time >= 0.0) {
                    return Err(ModelError::InvalidKeyTime {
                        clip: clip.name.clone(),
                        bone_index,
                        time: key.time,
                    });
                }
                if previous.is_some_and(|p| key.time <= p) {
                    return Err(ModelError::NonMonotonicKeyframes {
                        clip: clip.name.clone(),
                        bone_index,
                        time: key.time,
                    });
                }
                previous = Some(key.time);

                key.transform
                    .check()
                    .map_err(|reason| ModelError::InvalidTransform {
                        location: format!(
                            "clip '{}' bone {} key {}",
                            clip.name, bone_index, key_index
                        ),
                        reason,
                    })?;
            }
        }
        Ok(())
    }

    fn validate_mesh(&self, mesh: &MeshData) -> Result<(), ModelError> {
        let vertex_count = mesh.vertex_count();

        for (attribute, count) in [("normal", mesh.normals.len()), ("weight", mesh.weights.len())] {
            if count != vertex_count {
                return Err(ModelError::MeshAttributeMismatch {
                    attribute,
                    count,
                    vertex_count,
                });
            }
        }

        if mesh.indices.len() % 3 != 0 {
            return Err(ModelError::IncompleteTriangle {
                count: mesh.indices.len(),
            });
        }
        for (position, &index) in mesh.indices.iter().enumerate() {
            if index as usize >= vertex_count {
                return Err(ModelError::IndexOutOfRange {
                    position,
                    index,
                    vertex_count,
                });
            }
        }

        for (vertex, weights) in mesh.weights.iter().enumerate() {
            let sum = weights.sum();
            if !sum.is_finite()
                || (sum - 1.0).abs() > WEIGHT_TOLERANCE
                || weights.weights.iter().any(|&w| w < 0.0)
            {
                return Err(ModelError::InvalidWeights { vertex, sum });
            }
            for (bone_index, _) in weights.influences() {
                if self.bone(bone_index).is_none() {
                    return Err(ModelError::WeightBoneOutOfRange { vertex, bone_index });
                }
            }
        }
        Ok(())
    }
}
