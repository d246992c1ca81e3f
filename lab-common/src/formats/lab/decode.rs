//! `.lab` decoder

use glam::Vec3;
use hashbrown::HashSet;
use tracing::{debug, warn};

use super::header::LabHeader;
use super::{BONE_NAME_SIZE, MESH_VERTEX_SIZE, NO_PARENT};
use crate::error::{DecodeError, ReadContext};
use crate::model::{
    AnimationClip, AnimationTrack, Bone, Dummy, Keyframe, MAX_INFLUENCES, MeshData,
    SkeletalAsset, VertexWeights, WEIGHT_TOLERANCE,
};
use crate::reader::BinaryReader;

/// Decode a `.lab` byte buffer into a validated [`SkeletalAsset`].
///
/// Structural problems are reported at the offending record (bone, track,
/// vertex). The assembled asset then goes through the full invariant check,
/// so a successful result is always valid.
pub fn decode(bytes: &[u8]) -> Result<SkeletalAsset, DecodeError> {
    let mut reader = BinaryReader::new(bytes);
    let header = LabHeader::read(&mut reader)?;
    debug!(
        "lab header: version {:#06x}, {} bones, {} clips, {} dummies, {:?} keys, mesh: {}",
        header.version,
        header.bone_count,
        header.clip_count,
        header.dummy_count,
        header.key_format,
        header.has_mesh()
    );

    let bones = read_bones(&mut reader, &header)?;
    let dummies = read_dummies(&mut reader, &header)?;
    let clips = read_clips(&mut reader, &header)?;
    let mesh = if header.has_mesh() {
        Some(read_mesh(&mut reader)?)
    } else {
        None
    };

    if reader.remaining() > 0 {
        warn!(
            "{} trailing bytes after offset {} ignored",
            reader.remaining(),
            reader.position()
        );
    }

    Ok(SkeletalAsset::new(bones, dummies, clips, mesh)?)
}

/// Cap a declared element count by what the remaining bytes could hold,
/// so a corrupt count can't trigger a huge allocation.
fn bounded_capacity(count: u32, min_entry_size: usize, remaining: usize) -> usize {
    (count as usize).min(remaining / min_entry_size.max(1))
}

fn read_bones(reader: &mut BinaryReader<'_>, header: &LabHeader) -> Result<Vec<Bone>, DecodeError> {
    let transform_size = header.key_format.transform_size(header.version);
    let entry_size = BONE_NAME_SIZE + 8 + transform_size;
    let mut bones = Vec::with_capacity(bounded_capacity(
        header.bone_count,
        entry_size,
        reader.remaining(),
    ));

    for position in 0..header.bone_count {
        let name = reader.read_fixed_string(BONE_NAME_SIZE).field("bone name")?;
        let index = reader.read_u32().field("bone index")?;
        let parent = reader.read_u32().field("bone parent")?;
        let local_bind_transform =
            header
                .key_format
                .read_transform(reader, header.version, "bone bind transform")?;

        if index != position {
            return Err(DecodeError::BoneIndexMismatch { position, index });
        }
        let parent_index = match parent {
            NO_PARENT => None,
            p if p < index => Some(p),
            p => {
                return Err(DecodeError::InvalidBoneHierarchy {
                    bone_index: index,
                    parent_index: p,
                });
            }
        };

        bones.push(Bone {
            index,
            name,
            parent_index,
            local_bind_transform,
        });
    }

    Ok(bones)
}

fn read_dummies(
    reader: &mut BinaryReader<'_>,
    header: &LabHeader,
) -> Result<Vec<Dummy>, DecodeError> {
    let entry_size = 8 + header.key_format.transform_size(header.version);
    let mut dummies = Vec::with_capacity(bounded_capacity(
        header.dummy_count,
        entry_size,
        reader.remaining(),
    ));

    for _ in 0..header.dummy_count {
        let id = reader.read_u32().field("dummy id")?;
        let parent_bone = reader.read_u32().field("dummy parent bone")?;
        let transform = header
            .key_format
            .read_transform(reader, header.version, "dummy transform")?;
        dummies.push(Dummy {
            id,
            parent_bone,
            transform,
        });
    }

    Ok(dummies)
}

fn read_clips(
    reader: &mut BinaryReader<'_>,
    header: &LabHeader,
) -> Result<Vec<AnimationClip>, DecodeError> {
    // name terminator + frame rate + track count
    let min_clip_size = 1 + 4 + 4;
    let mut clips = Vec::with_capacity(bounded_capacity(
        header.clip_count,
        min_clip_size,
        reader.remaining(),
    ));

    for _ in 0..header.clip_count {
        let clip = read_clip(reader, header)?;
        debug!(
            "clip '{}': {} tracks, {} keys at {} fps",
            clip.name,
            clip.tracks.len(),
            clip.keyframe_count(),
            clip.frame_rate
        );
        clips.push(clip);
    }

    Ok(clips)
}

fn read_clip(reader: &mut BinaryReader<'_>, header: &LabHeader) -> Result<AnimationClip, DecodeError> {
    let name = reader.read_cstring().field("clip name")?;
    let frame_rate = reader.read_f32().field("clip frame rate")?;
    let track_count = reader.read_u32().field("clip track count")?;

    let key_size = 4 + header.key_format.transform_size(header.version);
    let mut tracks = Vec::with_capacity(bounded_capacity(track_count, 8, reader.remaining()));
    let mut seen = HashSet::new();

    for _ in 0..track_count {
        let bone_index = reader.read_u32().field("track bone index")?;
        let key_count = reader.read_u32().field("track key count")?;

        if !seen.insert(bone_index) {
            return Err(DecodeError::DuplicateTrack {
                clip: name.clone(),
                bone_index,
            });
        }

        let mut keyframes: Vec<Keyframe> =
            Vec::with_capacity(bounded_capacity(key_count, key_size, reader.remaining()));
        for _ in 0..key_count {
            let time = reader.read_f32().field("keyframe time")?;
            let transform =
                header
                    .key_format
                    .read_transform(reader, header.version, "keyframe transform")?;

            if keyframes.last().is_some_and(|prev| time <= prev.time) {
                return Err(DecodeError::NonMonotonicKeyframes {
                    clip: name.clone(),
                    bone_index,
                    time,
                });
            }
            keyframes.push(Keyframe { time, transform });
        }

        tracks.push(AnimationTrack {
            bone_index,
            keyframes,
        });
    }

    Ok(AnimationClip {
        name,
        frame_rate,
        tracks,
    })
}

fn read_mesh(reader: &mut BinaryReader<'_>) -> Result<MeshData, DecodeError> {
    let vertex_count = reader.read_u32().field("mesh vertex count")?;
    let index_count = reader.read_u32().field("mesh index count")?;

    let capacity = bounded_capacity(vertex_count, MESH_VERTEX_SIZE, reader.remaining());
    let mut mesh = MeshData {
        positions: Vec::with_capacity(capacity),
        normals: Vec::with_capacity(capacity),
        indices: Vec::with_capacity(bounded_capacity(index_count, 4, reader.remaining())),
        weights: Vec::with_capacity(capacity),
    };

    for vertex in 0..vertex_count as usize {
        let position = reader.read_f32_array::<3>().field("vertex position")?;
        let normal = reader.read_f32_array::<3>().field("vertex normal")?;
        let bone_bytes = reader.read_bytes(MAX_INFLUENCES).field("vertex bone indices")?;
        let weights = reader.read_f32_array::<4>().field("vertex weights")?;

        let sum: f32 = weights.iter().sum();
        if !sum.is_finite()
            || (sum - 1.0).abs() > WEIGHT_TOLERANCE
            || weights.iter().any(|&w| w < 0.0)
        {
            return Err(DecodeError::InvalidWeights { vertex, sum });
        }

        let mut bones = [0u32; MAX_INFLUENCES];
        for (slot, &b) in bones.iter_mut().zip(bone_bytes) {
            *slot = u32::from(b);
        }

        mesh.positions.push(Vec3::from_array(position));
        mesh.normals.push(Vec3::from_array(normal));
        mesh.weights.push(VertexWeights { bones, weights });
    }

    for _ in 0..index_count {
        mesh.indices.push(reader.read_u32().field("mesh index")?);
    }

    debug!(
        "mesh: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}
