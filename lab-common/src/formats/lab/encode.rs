//! `.lab` writer
//!
//! Serializes a [`SkeletalAsset`] in the layout read by [`super::decode`].
//! The asset is written as-is without running the invariant check, which
//! makes the writer usable for producing deliberately malformed fixtures.

use std::io::Write;

use super::header::{KeyFormat, LabHeader};
use super::{BONE_NAME_SIZE, FLAG_MESH, LAB_VERSION_1001, LAB_VERSION_CURRENT, NO_PARENT};
use crate::error::EncodeError;
use crate::model::SkeletalAsset;

/// Target version and key encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabWriteOptions {
    pub version: u32,
    pub key_format: KeyFormat,
}

impl Default for LabWriteOptions {
    fn default() -> Self {
        Self {
            version: LAB_VERSION_CURRENT,
            key_format: KeyFormat::Trs,
        }
    }
}

/// Write a complete `.lab` file
pub fn write_lab<W: Write>(
    w: &mut W,
    asset: &SkeletalAsset,
    options: LabWriteOptions,
) -> Result<(), EncodeError> {
    let bytes = encode(asset, options)?;
    w.write_all(&bytes)?;
    Ok(())
}

/// Encode an asset into `.lab` bytes
pub fn encode(asset: &SkeletalAsset, options: LabWriteOptions) -> Result<Vec<u8>, EncodeError> {
    let LabWriteOptions {
        version,
        key_format,
    } = options;
    let unrepresentable = |reason: String| EncodeError::Unrepresentable { version, reason };

    if !LabHeader::is_supported_version(version) {
        return Err(unrepresentable("unknown version".to_string()));
    }
    if version < LAB_VERSION_1001 {
        if !asset.dummies.is_empty() {
            return Err(unrepresentable("dummies need version 0x1001".to_string()));
        }
        if key_format == KeyFormat::Trs && has_non_unit_scale(asset) {
            return Err(unrepresentable(
                "TRS keys without scale cannot hold a non-unit scale".to_string(),
            ));
        }
    }

    let header = LabHeader {
        version,
        bone_count: asset.bones.len() as u32,
        clip_count: asset.clips.len() as u32,
        key_format,
        flags: if asset.mesh.is_some() { FLAG_MESH } else { 0 },
        dummy_count: asset.dummies.len() as u32,
    };
    let mut out = header.to_bytes();

    for bone in &asset.bones {
        let name = bone.name.as_bytes();
        if name.len() >= BONE_NAME_SIZE {
            return Err(unrepresentable(format!(
                "bone name '{}' exceeds {} bytes",
                bone.name,
                BONE_NAME_SIZE - 1
            )));
        }
        let mut name_field = [0u8; BONE_NAME_SIZE];
        name_field[..name.len()].copy_from_slice(name);
        out.extend_from_slice(&name_field);
        out.extend_from_slice(&bone.index.to_le_bytes());
        out.extend_from_slice(&bone.parent_index.unwrap_or(NO_PARENT).to_le_bytes());
        key_format.write_transform(&mut out, &bone.local_bind_transform, version);
    }

    if version >= LAB_VERSION_1001 {
        for dummy in &asset.dummies {
            out.extend_from_slice(&dummy.id.to_le_bytes());
            out.extend_from_slice(&dummy.parent_bone.to_le_bytes());
            key_format.write_transform(&mut out, &dummy.transform, version);
        }
    }

    for clip in &asset.clips {
        if clip.name.as_bytes().contains(&0) {
            return Err(unrepresentable(format!("clip name {:?} contains NUL", clip.name)));
        }
        out.extend_from_slice(clip.name.as_bytes());
        out.push(0);
        out.extend_from_slice(&clip.frame_rate.to_le_bytes());
        out.extend_from_slice(&(clip.tracks.len() as u32).to_le_bytes());
        for track in &clip.tracks {
            out.extend_from_slice(&track.bone_index.to_le_bytes());
            out.extend_from_slice(&(track.keyframes.len() as u32).to_le_bytes());
            for key in &track.keyframes {
                out.extend_from_slice(&key.time.to_le_bytes());
                key_format.write_transform(&mut out, &key.transform, version);
            }
        }
    }

    if let Some(mesh) = &asset.mesh {
        out.extend_from_slice(&(mesh.positions.len() as u32).to_le_bytes());
        out.extend_from_slice(&(mesh.indices.len() as u32).to_le_bytes());
        for (vertex, position) in mesh.positions.iter().enumerate() {
            let normal = mesh.normals.get(vertex).copied().unwrap_or_default();
            let weights = mesh.weights.get(vertex).copied().unwrap_or_default();

            for v in position.to_array().into_iter().chain(normal.to_array()) {
                out.extend_from_slice(&v.to_le_bytes());
            }
            for bone in weights.bones {
                let bone = u8::try_from(bone).map_err(|_| {
                    unrepresentable(format!("vertex {} bone index {} exceeds 255", vertex, bone))
                })?;
                out.push(bone);
            }
            for w in weights.weights {
                out.extend_from_slice(&w.to_le_bytes());
            }
        }
        for index in &mesh.indices {
            out.extend_from_slice(&index.to_le_bytes());
        }
    }

    Ok(out)
}

fn has_non_unit_scale(asset: &SkeletalAsset) -> bool {
    let non_unit = |s: glam::Vec3| !s.abs_diff_eq(glam::Vec3::ONE, 1e-6);
    asset
        .bones
        .iter()
        .any(|b| non_unit(b.local_bind_transform.scale))
        || asset
            .clips
            .iter()
            .flat_map(|c| &c.tracks)
            .flat_map(|t| &t.keyframes)
            .any(|k| non_unit(k.transform.scale))
}
