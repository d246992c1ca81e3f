//! Legacy `.lab` skeletal animation format
//!
//! Bone hierarchy, dummy attachment points, animation clips and an optional
//! skinned mesh. All values little-endian.
//!
//! This container is self-describing (magic, per-key times, clip table) and
//! is not byte-compatible with the game's own `.lab` files.
//!
//! # Layout
//! ```text
//! Header (24 bytes, 28 on 0x1001):
//! 0x00: magic        [u8; 4]  b"LAB\0"
//! 0x04: version      u32      0x1000 | 0x1001
//! 0x08: bone_count   u32
//! 0x0C: clip_count   u32
//! 0x10: key_format   u32      1 = MAT43, 2 = MAT44, 3 = TRS
//! 0x14: flags        u32      bit 0 = mesh block present
//! 0x18: dummy_count  u32      (0x1001 only)
//!
//! Bone table (bone_count entries):
//!   name [u8; 64] (NUL padded), index u32, parent u32 (0xFFFFFFFF = root),
//!   bind transform
//!
//! Dummy table (0x1001 only, dummy_count entries):
//!   id u32, parent_bone u32, transform
//!
//! Clip table (clip_count entries):
//!   name (NUL terminated), frame_rate f32, track_count u32,
//!   per track: bone_index u32, key_count u32, key_count × (time f32, transform)
//!
//! Mesh block (flags bit 0):
//!   vertex_count u32, index_count u32,
//!   per vertex: position 3×f32, normal 3×f32, bone_indices [u8; 4], weights 4×f32
//!   index_count × u32 (triangle list)
//! ```
//!
//! Transforms are encoded according to `key_format`:
//! - `TRS`: translation 3×f32, rotation 4×f32 (x, y, z, w), scale 3×f32
//!   (scale only on 0x1001; 0x1000 implies 1.0)
//! - `MAT43`: 4 rows × 3 f32, row-vector convention, last row = translation
//! - `MAT44`: 4 rows × 4 f32, row-vector convention

mod decode;
mod encode;
mod header;


pub use decode::decode;
pub use encode::{LabWriteOptions, encode, write_lab};
pub use header::{KeyFormat, LabHeader};

/// File magic
pub const LAB_MAGIC: [u8; 4] = *b"LAB\0";

/// First layout: TRS keys carry no scale, no dummy table
pub const LAB_VERSION_1000: u32 = 0x1000;

/// Adds TRS scale and the dummy table
pub const LAB_VERSION_1001: u32 = 0x1001;

pub const LAB_VERSION_CURRENT: u32 = LAB_VERSION_1001;

/// File extension (without dot)
pub const LAB_EXT: &str = "lab";

/// Fixed size of a bone name field
pub const BONE_NAME_SIZE: usize = 64;

/// Parent index of a root bone
pub const NO_PARENT: u32 = 0xFFFF_FFFF;

/// Header flag: mesh block follows the clip table
pub const FLAG_MESH: u32 = 0x1;

/// Bytes per mesh vertex (position + normal + bone indices + weights)
pub const MESH_VERTEX_SIZE: usize = 12 + 12 + 4 + 16;
