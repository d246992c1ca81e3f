//! Element ids for joints, dummies and clips
//!
//! Bone names become XML ids and joint sids, so they are reduced to
//! `[A-Za-z0-9_]` (plus a leading `_` when they would start with a digit).
//! Generated ids for derived elements append `-suffix` or join with `.`,
//! characters a sanitized name never contains, so they cannot collide with
//! a joint id.
//!
//! The table is built once per document and shared by the scene, the
//! animations and the skin, which all have to agree on every joint id.

use hashbrown::HashSet;
use lab_common::SkeletalAsset;

/// Plain ids used by fixed scene nodes
const RESERVED: [&str; 3] = ["Scene", "Skeleton", "Skin"];

#[derive(Debug, Clone)]
pub(crate) struct NameTable {
    joints: Vec<String>,
    dummies: Vec<String>,
    clips: Vec<String>,
}

impl NameTable {
    pub fn new(asset: &SkeletalAsset) -> Self {
        let mut used: HashSet<String> = RESERVED.iter().map(|s| s.to_string()).collect();

        let joints = asset
            .bones
            .iter()
            .map(|bone| unique(&mut used, sanitize(&bone.name), bone.index))
            .collect();

        let dummies = asset
            .dummies
            .iter()
            .enumerate()
            .map(|(i, dummy)| unique(&mut used, format!("Dummy_{}", dummy.id), i as u32))
            .collect();

        // Clip ids live in their own namespace; they only appear composed
        let mut used_clips = HashSet::new();
        let clips = asset
            .clips
            .iter()
            .enumerate()
            .map(|(i, clip)| unique(&mut used_clips, sanitize(&clip.name), i as u32))
            .collect();

        Self {
            joints,
            dummies,
            clips,
        }
    }

    /// Node id and sid of a bone
    pub fn joint(&self, bone_index: u32) -> Option<&str> {
        self.joints.get(bone_index as usize).map(String::as_str)
    }

    pub fn joints(&self) -> impl Iterator<Item = &str> {
        self.joints.iter().map(String::as_str)
    }

    /// Node id of the dummy at a position in the dummy table
    pub fn dummy(&self, position: usize) -> Option<&str> {
        self.dummies.get(position).map(String::as_str)
    }

    pub fn clip(&self, clip_index: usize) -> Option<&str> {
        self.clips.get(clip_index).map(String::as_str)
    }
}

/// Reduce a name to characters valid in an XML id and free of whitespace
pub(crate) fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    match out.chars().next() {
        None => out.push_str("unnamed"),
        Some(c) if c.is_ascii_digit() => out.insert(0, '_'),
        Some(_) => {}
    }
    out
}

fn unique(used: &mut HashSet<String>, candidate: String, index: u32) -> String {
    let mut id = candidate;
    while used.contains(&id) {
        id = format!("{}_{}", id, index);
    }
    used.insert(id.clone());
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_common::{AnimationClip, AnimationTrack, Bone, Dummy, Keyframe, Transform};

    fn bone(index: u32, name: &str) -> Bone {
        Bone {
            index,
            name: name.to_string(),
            parent_index: index.checked_sub(1),
            local_bind_transform: Transform::IDENTITY,
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Bip01 L Hand"), "Bip01_L_Hand");
        assert_eq!(sanitize("arm.left-1"), "arm_left_1");
        assert_eq!(sanitize("01"), "_01");
        assert_eq!(sanitize(""), "unnamed");
        assert_eq!(sanitize("épaule"), "_paule");
    }

    #[test]
    fn test_collisions_get_index_suffix() {
        let asset = SkeletalAsset {
            bones: vec![
                bone(0, "Bip01 Spine"),
                bone(1, "Bip01_Spine"),
                bone(2, "Skeleton"),
                bone(3, "Dummy_4"),
            ],
            dummies: vec![Dummy {
                id: 4,
                parent_bone: 0,
                transform: Transform::IDENTITY,
            }],
            clips: vec![AnimationClip {
                name: "walk cycle".to_string(),
                frame_rate: 30.0,
                tracks: vec![AnimationTrack {
                    bone_index: 0,
                    keyframes: vec![Keyframe {
                        time: 0.0,
                        transform: Transform::IDENTITY,
                    }],
                }],
            }],
            mesh: None,
        };

        let names = NameTable::new(&asset);
        assert_eq!(names.joint(0), Some("Bip01_Spine"));
        assert_eq!(names.joint(1), Some("Bip01_Spine_1"));
        assert_eq!(names.joint(2), Some("Skeleton_2"));
        assert_eq!(names.joint(3), Some("Dummy_4"));
        assert_eq!(names.dummy(0), Some("Dummy_4_0"));
        assert_eq!(names.clip(0), Some("walk_cycle"));
        assert_eq!(names.joint(4), None);

        let unique: HashSet<&str> = names.joints().collect();
        assert_eq!(unique.len(), 4);
    }
}
