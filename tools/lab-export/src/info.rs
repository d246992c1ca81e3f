//! `.lab` inspection (the `info` command)

use anyhow::{Context, Result};
use lab_common::formats::LabHeader;
use lab_common::{BinaryReader, DecodeError, SkeletalAsset};
use std::path::Path;

/// Header plus decoded contents of one file
#[derive(Debug, Clone)]
pub struct AssetInfo {
    pub header: LabHeader,
    pub asset: SkeletalAsset,
}

/// Decode a buffer, keeping the header for display
pub fn inspect_bytes(bytes: &[u8]) -> Result<AssetInfo, DecodeError> {
    let header = LabHeader::read(&mut BinaryReader::new(bytes))?;
    let asset = lab_common::decode(bytes)?;
    Ok(AssetInfo { header, asset })
}

impl AssetInfo {
    /// Human-readable listing, one entry per line
    pub fn lines(&self) -> Vec<String> {
        let header = &self.header;
        let asset = &self.asset;
        let mut lines = vec![format!(
            "version {:#06x}, {:?} keys, {} bones, {} dummies, {} clips",
            header.version,
            header.key_format,
            asset.bones.len(),
            asset.dummies.len(),
            asset.clips.len()
        )];

        lines.push("Bones:".to_string());
        for bone in &asset.bones {
            let parent = match bone.parent_index {
                Some(p) => p.to_string(),
                None => "-".to_string(),
            };
            lines.push(format!("  [{}] '{}' parent {}", bone.index, bone.name, parent));
        }

        if !asset.dummies.is_empty() {
            lines.push("Dummies:".to_string());
            for dummy in &asset.dummies {
                lines.push(format!("  [{}] on bone {}", dummy.id, dummy.parent_bone));
            }
        }

        if !asset.clips.is_empty() {
            lines.push("Clips:".to_string());
            for clip in &asset.clips {
                let (start, end) = clip.time_range();
                lines.push(format!(
                    "  '{}': {} tracks, {} keys, {}s - {}s @ {} fps",
                    clip.name,
                    clip.tracks.len(),
                    clip.keyframe_count(),
                    start,
                    end,
                    clip.frame_rate
                ));
            }
        }

        if let Some(mesh) = &asset.mesh {
            lines.push(format!(
                "Mesh: {} vertices, {} triangles",
                mesh.vertex_count(),
                mesh.triangle_count()
            ));
        }
        lines
    }
}

/// Log the contents of a `.lab` file
pub fn list_asset(input: &Path) -> Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
    let info = inspect_bytes(&bytes).with_context(|| format!("Failed to decode {:?}", input))?;

    tracing::info!("{:?}:", input);
    for line in info.lines() {
        tracing::info!("{}", line);
    }
    Ok(())
}
