//! COLLADA 1.4.1 document builder
//!
//! Serializes a converted [`SkeletalAsset`] into:
//! - `<asset>` (contributor, timestamps, unit, up axis)
//! - `<library_geometries>` / `<library_controllers>` when a mesh is present
//! - `<library_animations>` + `<library_animation_clips>` when clips are present
//! - `<library_visual_scenes>` with the joint hierarchy under a `Skeleton` node
//! - `<scene>` instancing the visual scene
//!
//! The builder expects a validated asset. Inconsistencies it runs into are
//! bugs upstream and come back as [`SerializationError::Internal`].

mod animation;
mod asset;
mod document;
mod names;
mod scene;
mod skin;


pub use document::XmlDocument;

use chrono::{DateTime, Utc};
use lab_common::SkeletalAsset;
use thiserror::Error;

use crate::space::UpAxis;
use document::ColladaWriter;
use names::NameTable;

pub const COLLADA_NAMESPACE: &str = "http://www.collada.org/2005/11/COLLADASchema";
pub const COLLADA_VERSION: &str = "1.4.1";

/// File extension (without dot)
pub const DAE_EXT: &str = "dae";

pub(crate) const GEOMETRY_ID: &str = "Mesh-mesh";
pub(crate) const CONTROLLER_ID: &str = "Mesh-skin";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    /// The asset broke an invariant the decoder is supposed to guarantee
    #[error("internal serialization error (this is a bug): {0}")]
    Internal(String),
}

/// Settings for the `<asset>` block
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    pub author: String,
    pub authoring_tool: String,
    /// Creation timestamp; `None` uses the current time
    pub created: Option<DateTime<Utc>>,
    /// Up axis the asset was converted to
    pub up_axis: UpAxis,
    /// Meters per unit
    pub meter: f32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            author: "lab-export".to_string(),
            authoring_tool: format!("lab-export {}", env!("CARGO_PKG_VERSION")),
            created: None,
            up_axis: UpAxis::default(),
            meter: 1.0,
        }
    }
}

/// Build a document with default [`BuildOptions`]
pub fn build(asset: &SkeletalAsset) -> Result<XmlDocument, SerializationError> {
    build_with(asset, &BuildOptions::default())
}

pub fn build_with(
    asset: &SkeletalAsset,
    options: &BuildOptions,
) -> Result<XmlDocument, SerializationError> {
    let names = NameTable::new(asset);
    let mut w = ColladaWriter::new();

    w.start("COLLADA");
    w.attr("xmlns", COLLADA_NAMESPACE);
    w.attr("version", COLLADA_VERSION);

    asset::write_asset(&mut w, options);

    if let Some(mesh) = &asset.mesh {
        skin::write_geometry(&mut w, mesh);
        skin::write_controller(&mut w, asset, mesh, &names)?;
    }

    animation::write_animations(&mut w, asset, &names)?;
    scene::write_visual_scenes(&mut w, asset, &names)?;

    w.start("scene");
    w.start("instance_visual_scene");
    w.attr("url", "#Scene");
    w.end();
    w.end();

    w.end(); // COLLADA

    let document = w.finish();
    tracing::debug!(
        "COLLADA document: {} joints, {} clips, {} bytes",
        asset.bones.len(),
        asset.clips.len(),
        document.as_str().len()
    );
    Ok(document)
}
