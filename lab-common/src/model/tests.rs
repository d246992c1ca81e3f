//! Tests for the skeletal model invariants

use super::*;
use glam::{Quat, Vec3};

fn bone(index: u32, name: &str, parent: Option<u32>, transform: Transform) -> Bone {
    Bone {
        index,
        name: name.to_string(),
        parent_index: parent,
        local_bind_transform: transform,
    }
}

fn key(time: f32) -> Keyframe {
    Keyframe {
        time,
        transform: Transform::IDENTITY,
    }
}

fn clip(name: &str, tracks: Vec<AnimationTrack>) -> AnimationClip {
    AnimationClip {
        name: name.to_string(),
        frame_rate: 25.0,
        tracks,
    }
}

fn track(bone_index: u32, times: &[f32]) -> AnimationTrack {
    AnimationTrack {
        bone_index,
        keyframes: times.iter().map(|&t| key(t)).collect(),
    }
}

/// Branching skeleton with non-trivial transforms:
/// 0 -> {1 -> {3}, 2 -> {4 -> {5}}}
fn branching_bones() -> Vec<Bone> {
    vec![
        bone(0, "Bip01", None, Transform::from_translation(Vec3::new(0.0, 0.0, 1.0))),
        bone(
            1,
            "Bip01 Spine",
            Some(0),
            Transform::new(
                Vec3::new(0.0, 0.2, 0.5),
                Quat::from_rotation_x(0.4),
                Vec3::ONE,
            ),
        ),
        bone(
            2,
            "Bip01 L Thigh",
            Some(0),
            Transform::new(
                Vec3::new(0.3, 0.0, -0.1),
                Quat::from_rotation_z(-1.1),
                Vec3::new(1.0, 1.5, 1.0),
            ),
        ),
        bone(
            3,
            "Bip01 Head",
            Some(1),
            Transform::new(
                Vec3::new(0.0, 0.0, 0.6),
                Quat::from_rotation_y(0.25),
                Vec3::splat(0.9),
            ),
        ),
        bone(
            4,
            "Bip01 L Calf",
            Some(2),
            Transform::new(
                Vec3::new(0.0, -0.45, 0.0),
                Quat::from_rotation_x(-0.8),
                Vec3::ONE,
            ),
        ),
        bone(
            5,
            "Bip01 L Foot",
            Some(4),
            Transform::from_translation(Vec3::new(0.0, -0.4, 0.05)),
        ),
    ]
}

fn naive_absolute(bones: &[Bone], index: usize) -> Mat4 {
    let local = bones[index].local_bind_transform.to_matrix();
    match bones[index].parent_index {
        Some(parent) => naive_absolute(bones, parent as usize) * local,
        None => local,
    }
}

// ========================================================================
// Hierarchy
// ========================================================================

#[test]
fn test_valid_asset_constructs() {
    let asset = SkeletalAsset::new(
        branching_bones(),
        vec![],
        vec![clip("idle", vec![track(0, &[0.0, 0.04]), track(3, &[0.1])])],
        None,
    )
    .unwrap();

    assert_eq!(asset.root_bones().count(), 1);
    let children = asset.child_indices();
    assert_eq!(children[0], vec![1, 2]);
    assert_eq!(children.iter().map(Vec::len).sum::<usize>(), asset.bones.len() - 1);
    for bone in &asset.bones {
        if let Some(parent) = bone.parent_index {
            assert!(parent < bone.index);
        }
    }
}

#[test]
fn test_self_parent_is_rejected() {
    let mut bones = branching_bones();
    bones[2].parent_index = Some(2);
    let err = SkeletalAsset::new(bones, vec![], vec![], None).unwrap_err();
    assert_eq!(
        err,
        ModelError::InvalidBoneHierarchy {
            bone_index: 2,
            parent_index: 2
        }
    );
}

#[test]
fn test_forward_parent_is_rejected() {
    let mut bones = branching_bones();
    bones[1].parent_index = Some(4);
    assert!(matches!(
        SkeletalAsset::new(bones, vec![], vec![], None),
        Err(ModelError::InvalidBoneHierarchy {
            bone_index: 1,
            parent_index: 4
        })
    ));
}

#[test]
fn test_index_gap_is_rejected() {
    let mut bones = branching_bones();
    bones.remove(3);
    assert!(matches!(
        SkeletalAsset::new(bones, vec![], vec![], None),
        Err(ModelError::BoneIndexMismatch {
            position: 3,
            index: 4
        })
    ));
}

#[test]
fn test_duplicate_bone_name_is_rejected() {
    let mut bones = branching_bones();
    bones[4].name = "Bip01 Spine".to_string();
    assert!(matches!(
        SkeletalAsset::new(bones, vec![], vec![], None),
        Err(ModelError::DuplicateBoneName {
            first: 1,
            second: 4,
            ..
        })
    ));
}

#[test]
fn test_unnormalized_bind_rotation_is_rejected() {
    let mut bones = branching_bones();
    bones[0].local_bind_transform.rotation = Quat::from_xyzw(0.0, 0.0, 0.5, 0.5);
    assert!(matches!(
        SkeletalAsset::new(bones, vec![], vec![], None),
        Err(ModelError::InvalidTransform { .. })
    ));
}

#[test]
fn test_singular_bind_pose_is_rejected() {
    // Positive, but the inverse overflows f32
    let mut bones = branching_bones();
    bones[3].local_bind_transform.scale = Vec3::splat(1e-13);
    let err = SkeletalAsset::new(bones, vec![], vec![], None).unwrap_err();
    match err {
        ModelError::InvalidTransform { location, reason } => {
            assert_eq!(location, "bone 3 'Bip01 Head'");
            assert!(reason.contains("not invertible"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ========================================================================
// Absolute transforms
// ========================================================================

#[test]
fn test_absolute_transforms_match_recursive_reference() {
    let bones = branching_bones();
    let asset = SkeletalAsset::new(bones.clone(), vec![], vec![], None).unwrap();
    let absolute = asset.absolute_bind_transforms();

    assert_eq!(absolute.len(), bones.len());
    for (i, matrix) in absolute.iter().enumerate() {
        let expected = naive_absolute(&bones, i);
        assert!(
            matrix.abs_diff_eq(expected, 1e-5),
            "bone {} absolute transform mismatch: {:?} vs {:?}",
            i,
            matrix,
            expected
        );
    }
}

#[test]
fn test_inverse_bind_matrices_invert_absolute() {
    let asset = SkeletalAsset::new(branching_bones(), vec![], vec![], None).unwrap();
    let absolute = asset.absolute_bind_transforms();
    let inverse = asset.inverse_bind_matrices();

    for (a, inv) in absolute.iter().zip(&inverse) {
        assert!((*a * *inv).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }
}

// ========================================================================
// Clips
// ========================================================================

#[test]
fn test_duplicate_track_is_rejected() {
    let err = SkeletalAsset::new(
        branching_bones(),
        vec![],
        vec![clip("walk", vec![track(1, &[0.0]), track(1, &[0.5])])],
        None,
    )
    .unwrap_err();
    assert_eq!(
        err,
        ModelError::DuplicateTrack {
            clip: "walk".to_string(),
            bone_index: 1
        }
    );
}

#[test]
fn test_non_monotonic_keys_are_rejected() {
    let err = SkeletalAsset::new(
        branching_bones(),
        vec![],
        vec![clip("walk", vec![track(0, &[0.0, 0.5, 0.5])])],
        None,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ModelError::NonMonotonicKeyframes { bone_index: 0, time, .. } if time == 0.5
    ));
}

#[test]
fn test_first_key_may_start_late() {
    assert!(
        SkeletalAsset::new(
            branching_bones(),
            vec![],
            vec![clip("late", vec![track(0, &[1.5, 2.0])])],
            None,
        )
        .is_ok()
    );
}

#[test]
fn test_negative_key_time_is_rejected() {
    assert!(matches!(
        SkeletalAsset::new(
            branching_bones(),
            vec![],
            vec![clip("walk", vec![track(0, &[-0.1, 0.0])])],
            None,
        ),
        Err(ModelError::InvalidKeyTime { .. })
    ));
}

#[test]
fn test_clip_shape_errors() {
    let bones = branching_bones();

    let empty = SkeletalAsset::new(bones.clone(), vec![], vec![clip("empty", vec![])], None);
    assert!(matches!(empty, Err(ModelError::EmptyClip { .. })));

    let unknown = SkeletalAsset::new(
        bones.clone(),
        vec![],
        vec![clip("walk", vec![track(17, &[0.0])])],
        None,
    );
    assert!(matches!(
        unknown,
        Err(ModelError::UnknownTrackBone { bone_index: 17, .. })
    ));

    let no_keys = SkeletalAsset::new(
        bones.clone(),
        vec![],
        vec![clip("walk", vec![track(0, &[])])],
        None,
    );
    assert!(matches!(no_keys, Err(ModelError::EmptyTrack { .. })));

    let mut bad_rate = clip("walk", vec![track(0, &[0.0])]);
    bad_rate.frame_rate = 0.0;
    assert!(matches!(
        SkeletalAsset::new(bones, vec![], vec![bad_rate], None),
        Err(ModelError::InvalidFrameRate { .. })
    ));
}

#[test]
fn test_clip_time_range() {
    let c = clip("walk", vec![track(0, &[0.2, 1.0]), track(1, &[0.0, 0.4, 0.8])]);
    assert_eq!(c.time_range(), (0.0, 1.0));
    assert_eq!(c.keyframe_count(), 5);
}

// ========================================================================
// Dummies and mesh
// ========================================================================

#[test]
fn test_dummy_must_reference_existing_bone() {
    let dummy = Dummy {
        id: 0,
        parent_bone: 9,
        transform: Transform::IDENTITY,
    };
    assert!(matches!(
        SkeletalAsset::new(branching_bones(), vec![dummy], vec![], None),
        Err(ModelError::InvalidDummyParent {
            dummy_id: 0,
            parent_bone: 9
        })
    ));
}

#[test]
fn test_dummies_of_keeps_table_positions() {
    let dummy = |id, parent_bone| Dummy {
        id,
        parent_bone,
        transform: Transform::IDENTITY,
    };
    let asset = SkeletalAsset::new(
        branching_bones(),
        vec![dummy(10, 3), dummy(11, 0), dummy(12, 3)],
        vec![],
        None,
    )
    .unwrap();

    let on_head: Vec<(usize, u32)> = asset.dummies_of(3).map(|(i, d)| (i, d.id)).collect();
    assert_eq!(on_head, vec![(0, 10), (2, 12)]);
    assert_eq!(asset.dummies_of(4).count(), 0);
}

fn triangle_mesh(weights: [f32; 4]) -> MeshData {
    let vw = VertexWeights {
        bones: [0, 1, 0, 0],
        weights,
    };
    MeshData {
        positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        normals: vec![Vec3::Z; 3],
        indices: vec![0, 1, 2],
        weights: vec![vw; 3],
    }
}

#[test]
fn test_mesh_weights_must_sum_to_one() {
    let bones = branching_bones();
    assert!(
        SkeletalAsset::new(bones.clone(), vec![], vec![], Some(triangle_mesh([0.75, 0.25, 0.0, 0.0])))
            .is_ok()
    );

    let err = SkeletalAsset::new(
        bones,
        vec![],
        vec![],
        Some(triangle_mesh([0.5, 0.25, 0.0, 0.0])),
    )
    .unwrap_err();
    assert!(matches!(err, ModelError::InvalidWeights { vertex: 0, .. }));
}

#[test]
fn test_mesh_index_errors() {
    let bones = branching_bones();

    let mut out_of_range = triangle_mesh([1.0, 0.0, 0.0, 0.0]);
    out_of_range.indices[2] = 3;
    assert!(matches!(
        SkeletalAsset::new(bones.clone(), vec![], vec![], Some(out_of_range)),
        Err(ModelError::IndexOutOfRange { index: 3, .. })
    ));

    let mut partial = triangle_mesh([1.0, 0.0, 0.0, 0.0]);
    partial.indices.push(0);
    assert!(matches!(
        SkeletalAsset::new(bones, vec![], vec![], Some(partial)),
        Err(ModelError::IncompleteTriangle { count: 4 })
    ));
}

#[test]
fn test_weight_influences_skip_zero() {
    let vw = VertexWeights {
        bones: [3, 1, 7, 0],
        weights: [0.6, 0.4, 0.0, 0.0],
    };
    let influences: Vec<_> = vw.influences().collect();
    assert_eq!(influences, vec![(3, 0.6), (1, 0.4)]);
}
