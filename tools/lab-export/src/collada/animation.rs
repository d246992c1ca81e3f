//! `<library_animations>` and `<library_animation_clips>`
//!
//! One flat `<animation>` per (clip, animated bone) with INPUT, OUTPUT and
//! INTERPOLATION sources. `.lab` carries no interpolation mode, so every
//! sample is `LINEAR`.

use lab_common::SkeletalAsset;

use super::SerializationError;
use super::document::{ColladaWriter, row_major};
use super::names::NameTable;

/// Id of the `<animation>` for one clip/joint pair
pub(crate) fn animation_id(clip: &str, joint: &str) -> String {
    format!("{}.{}", clip, joint)
}

pub(crate) fn write_animations(
    w: &mut ColladaWriter,
    asset: &SkeletalAsset,
    names: &NameTable,
) -> Result<(), SerializationError> {
    if asset.clips.is_empty() {
        return Ok(());
    }

    w.start("library_animations");
    for (clip_index, clip) in asset.clips.iter().enumerate() {
        let clip_id = clip_name(names, clip_index)?;
        for track in &clip.tracks {
            let joint = names.joint(track.bone_index).ok_or_else(|| {
                SerializationError::Internal(format!(
                    "clip '{}' animates missing bone {}",
                    clip.name, track.bone_index
                ))
            })?;
            let id = animation_id(clip_id, joint);
            let count = track.keyframes.len();

            let times: Vec<f32> = track.keyframes.iter().map(|k| k.time).collect();
            let matrices: Vec<f32> = track
                .keyframes
                .iter()
                .flat_map(|k| row_major(&k.transform.to_matrix()))
                .collect();
            let interpolation = vec!["LINEAR"; count];

            w.start("animation");
            w.attr("id", &id);
            w.attr_text("name", &format!("{} {}", clip.name, joint));

            let input = format!("{}-input", id);
            let output = format!("{}-output", id);
            let interp = format!("{}-interpolation", id);
            let sampler = format!("{}-sampler", id);

            w.float_source(&input, &times, 1, &[("TIME", "float")]);
            w.float_source(&output, &matrices, 16, &[("TRANSFORM", "float4x4")]);
            w.name_source(&interp, &interpolation, ("INTERPOLATION", "name"));

            w.start("sampler");
            w.attr("id", &sampler);
            w.input("INPUT", &input, None);
            w.input("OUTPUT", &output, None);
            w.input("INTERPOLATION", &interp, None);
            w.end();

            w.start("channel");
            w.attr("source", &format!("#{}", sampler));
            w.attr("target", &format!("{}/transform", joint));
            w.end();

            w.end();
        }
    }
    w.end();

    w.start("library_animation_clips");
    for (clip_index, clip) in asset.clips.iter().enumerate() {
        let clip_id = clip_name(names, clip_index)?;
        let (start, end) = clip.time_range();

        w.start("animation_clip");
        w.attr("id", &format!("{}-clip", clip_id));
        w.attr_text("name", &clip.name);
        w.attr("start", &start);
        w.attr("end", &end);
        for track in &clip.tracks {
            if let Some(joint) = names.joint(track.bone_index) {
                w.start("instance_animation");
                w.attr("url", &format!("#{}", animation_id(clip_id, joint)));
                w.end();
            }
        }
        w.end();
    }
    w.end();

    Ok(())
}

fn clip_name(names: &NameTable, clip_index: usize) -> Result<&str, SerializationError> {
    names
        .clip(clip_index)
        .ok_or_else(|| SerializationError::Internal(format!("no id for clip {}", clip_index)))
}
