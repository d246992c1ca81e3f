//! Conversion orchestrator (.lab -> .dae)
//!
//! Runs decode -> space conversion -> re-validation -> COLLADA build for one
//! file. Any failing stage aborts the conversion; no partial document is
//! ever returned.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lab_common::{DecodeError, ModelError};
use thiserror::Error;

use crate::collada::{self, BuildOptions, SerializationError, XmlDocument};
use crate::space::{self, SpaceConfig};

/// Pipeline stage a conversion failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Decode,
    Validate,
    Serialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Read => "read",
            Stage::Decode => "decode",
            Stage::Validate => "validate",
            Stage::Serialize => "serialize",
        })
    }
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("converted asset from {} is invalid: {source}", path.display())]
    Validation {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("failed to build COLLADA for {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: SerializationError,
    },
}

impl ConversionError {
    pub fn stage(&self) -> Stage {
        match self {
            ConversionError::Read { .. } => Stage::Read,
            ConversionError::Decode { .. } => Stage::Decode,
            ConversionError::Validation { .. } => Stage::Validate,
            ConversionError::Serialization { .. } => Stage::Serialize,
        }
    }

    /// Input the failure belongs to
    pub fn path(&self) -> &Path {
        match self {
            ConversionError::Read { path, .. }
            | ConversionError::Decode { path, .. }
            | ConversionError::Validation { path, .. }
            | ConversionError::Serialization { path, .. } => path,
        }
    }
}

/// Everything a conversion can be configured with
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub space: SpaceConfig,
    pub collada: BuildOptions,
}

impl ConvertOptions {
    /// Build options with the unit and up axis taken from the space config
    fn build_options(&self) -> BuildOptions {
        BuildOptions {
            up_axis: self.space.up_axis,
            meter: self.space.meter(),
            ..self.collada.clone()
        }
    }
}

/// Convert a `.lab` file with default options
pub fn convert_file(path: &Path) -> Result<XmlDocument, ConversionError> {
    convert_file_with(path, &ConvertOptions::default())
}

pub fn convert_file_with(
    path: &Path,
    options: &ConvertOptions,
) -> Result<XmlDocument, ConversionError> {
    let bytes = std::fs::read(path).map_err(|source| ConversionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    convert_bytes(&bytes, path, options)
}

/// Convert an in-memory `.lab` buffer. `origin` only labels errors and logs.
pub fn convert_bytes(
    bytes: &[u8],
    origin: &Path,
    options: &ConvertOptions,
) -> Result<XmlDocument, ConversionError> {
    let asset = lab_common::decode(bytes).map_err(|source| ConversionError::Decode {
        path: origin.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        "decoded {:?}: {} bones, {} dummies, {} clips, mesh: {}",
        origin,
        asset.bones.len(),
        asset.dummies.len(),
        asset.clips.len(),
        asset.mesh.is_some()
    );

    let converted = space::convert(&asset, &options.space);
    converted
        .validate()
        .map_err(|source| ConversionError::Validation {
            path: origin.to_path_buf(),
            source,
        })?;

    collada::build_with(&converted, &options.build_options()).map_err(|source| {
        ConversionError::Serialization {
            path: origin.to_path_buf(),
            source,
        }
    })
}

/// Default output path: the input with a `.dae` extension
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension(collada::DAE_EXT)
}

/// Convert `input` and write the document to `output`
pub fn convert_to_file(input: &Path, output: &Path, options: &ConvertOptions) -> Result<()> {
    let document = convert_file_with(input, options)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    document
        .save(output)
        .with_context(|| format!("Failed to write output: {:?}", output))?;

    tracing::info!(
        "Converted {:?} -> {:?} ({} bytes)",
        input,
        output,
        document.as_str().len()
    );
    Ok(())
}
