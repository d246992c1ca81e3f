//! Error types for reading, decoding and validating skeletal assets

use thiserror::Error;

/// Primitive read failure from [`crate::BinaryReader`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("truncated input: needed {requested} bytes at offset {offset}, {available} available")]
    TruncatedInput {
        requested: usize,
        available: usize,
        offset: usize,
    },

    #[error("offset {offset} is outside the buffer (length {len})")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidString { offset: usize },
}

/// Invariant violation in a [`crate::SkeletalAsset`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("bone at position {position} has index {index} (indices must be 0..N-1 in order)")]
    BoneIndexMismatch { position: usize, index: u32 },

    #[error("bone {bone_index} has invalid parent {parent_index} (parent must precede child)")]
    InvalidBoneHierarchy { bone_index: u32, parent_index: u32 },

    #[error("bone name '{name}' is used by bones {first} and {second}")]
    DuplicateBoneName { name: String, first: u32, second: u32 },

    #[error("invalid transform on {location}: {reason}")]
    InvalidTransform { location: String, reason: String },

    #[error("dummy {dummy_id} is attached to missing bone {parent_bone}")]
    InvalidDummyParent { dummy_id: u32, parent_bone: u32 },

    #[error("clip '{clip}' has no tracks")]
    EmptyClip { clip: String },

    #[error("clip '{clip}' has invalid frame rate {frame_rate}")]
    InvalidFrameRate { clip: String, frame_rate: f32 },

    #[error("clip '{clip}' has a track for missing bone {bone_index}")]
    UnknownTrackBone { clip: String, bone_index: u32 },

    #[error("clip '{clip}' has more than one track for bone {bone_index}")]
    DuplicateTrack { clip: String, bone_index: u32 },

    #[error("clip '{clip}' track for bone {bone_index} has no keyframes")]
    EmptyTrack { clip: String, bone_index: u32 },

    #[error("clip '{clip}' track for bone {bone_index}: keyframe time {time} is not after the previous one")]
    NonMonotonicKeyframes {
        clip: String,
        bone_index: u32,
        time: f32,
    },

    #[error("clip '{clip}' track for bone {bone_index}: keyframe time {time} is negative or not finite")]
    InvalidKeyTime {
        clip: String,
        bone_index: u32,
        time: f32,
    },

    #[error("mesh has {count} {attribute} entries for {vertex_count} vertices")]
    MeshAttributeMismatch {
        attribute: &'static str,
        count: usize,
        vertex_count: usize,
    },

    #[error("mesh index count {count} is not a multiple of 3")]
    IncompleteTriangle { count: usize },

    #[error("mesh index {index} at position {position} is out of range ({vertex_count} vertices)")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("vertex {vertex} weights sum to {sum} (expected 1.0)")]
    InvalidWeights { vertex: usize, sum: f32 },

    #[error("vertex {vertex} references missing bone {bone_index}")]
    WeightBoneOutOfRange { vertex: usize, bone_index: u32 },
}

/// Failure to decode a `.lab` byte stream
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("failed to read {field}: {source}")]
    Read {
        field: &'static str,
        #[source]
        source: ReadError,
    },

    #[error("bad magic {found:02X?} (expected {expected:02X?})")]
    BadMagic { found: [u8; 4], expected: [u8; 4] },

    #[error("unsupported .lab version {version:#06x}")]
    UnsupportedVersion { version: u32 },

    #[error("unsupported key format {format}")]
    UnsupportedKeyFormat { format: u32 },

    #[error("unsupported header flags {flags:#x}")]
    UnsupportedFlags { flags: u32 },

    #[error("bone table entry {position} declares index {index}")]
    BoneIndexMismatch { position: u32, index: u32 },

    #[error("bone {bone_index} has invalid parent {parent_index} (parent must precede child)")]
    InvalidBoneHierarchy { bone_index: u32, parent_index: u32 },

    #[error("clip '{clip}' track for bone {bone_index}: keyframe time {time} is not after the previous one")]
    NonMonotonicKeyframes {
        clip: String,
        bone_index: u32,
        time: f32,
    },

    #[error("clip '{clip}' has more than one track for bone {bone_index}")]
    DuplicateTrack { clip: String, bone_index: u32 },

    #[error("vertex {vertex} has invalid skin weights (sum {sum})")]
    InvalidWeights { vertex: usize, sum: f32 },

    #[error("decoded asset is invalid: {0}")]
    Invalid(#[from] ModelError),
}

impl DecodeError {
    /// True when the input ended before a declared table or field did
    pub fn is_truncated(&self) -> bool {
        matches!(
            self,
            DecodeError::Read {
                source: ReadError::TruncatedInput { .. },
                ..
            }
        )
    }
}

/// Attach a field name to a [`ReadError`]
pub(crate) trait ReadContext<T> {
    fn field(self, field: &'static str) -> Result<T, DecodeError>;
}

impl<T> ReadContext<T> for Result<T, ReadError> {
    fn field(self, field: &'static str) -> Result<T, DecodeError> {
        self.map_err(|source| DecodeError::Read { field, source })
    }
}

/// Failure to write an asset in `.lab` form
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("asset cannot be written as .lab {version:#06x}: {reason}")]
    Unrepresentable { version: u32, reason: String },
}
