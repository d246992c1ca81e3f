//! Shared types for the `.lab` asset pipeline
//!
//! This crate is the pure, I/O-free half of the converter:
//!
//! - [`reader`] - Bounds-checked little-endian byte cursor
//! - [`formats`] - `.lab` layout, decoder and writer
//! - [`model`] - Skeletal data model and its invariants
//! - [`error`] - Read, decode, model and encode errors

pub mod error;
pub mod formats;
pub mod model;
pub mod reader;

pub use error::{DecodeError, EncodeError, ModelError, ReadError};
pub use formats::lab::{decode, encode, write_lab};
pub use model::{
    AnimationClip, AnimationTrack, Bone, Dummy, Keyframe, MeshData, SkeletalAsset, Transform,
    VertexWeights,
};
pub use reader::BinaryReader;
