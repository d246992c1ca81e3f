//! `.lab` header and transform key encoding

use glam::{Mat4, Vec4};

use super::{FLAG_MESH, LAB_MAGIC, LAB_VERSION_1000, LAB_VERSION_1001};
use crate::error::{DecodeError, ReadContext};
use crate::model::Transform;
use crate::reader::BinaryReader;

/// How transforms are stored in the bone, dummy and keyframe tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum KeyFormat {
    /// 4×3 matrix (rotation/scale rows + translation row)
    Mat43 = 1,
    /// Full 4×4 matrix
    Mat44 = 2,
    /// Translation + quaternion (+ scale on 0x1001)
    Trs = 3,
}

impl KeyFormat {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Mat43),
            2 => Some(Self::Mat44),
            3 => Some(Self::Trs),
            _ => None,
        }
    }

    /// Encoded size of one transform in bytes
    pub fn transform_size(self, version: u32) -> usize {
        match self {
            Self::Mat43 => 12 * 4,
            Self::Mat44 => 16 * 4,
            Self::Trs if version >= LAB_VERSION_1001 => (3 + 4 + 3) * 4,
            Self::Trs => (3 + 4) * 4,
        }
    }

    /// Read one transform in this encoding
    pub(crate) fn read_transform(
        self,
        reader: &mut BinaryReader<'_>,
        version: u32,
        field: &'static str,
    ) -> Result<Transform, DecodeError> {
        match self {
            Self::Trs => {
                let t = reader.read_f32_array::<3>().field(field)?;
                let r = reader.read_f32_array::<4>().field(field)?;
                let s = if version >= LAB_VERSION_1001 {
                    reader.read_f32_array::<3>().field(field)?
                } else {
                    [1.0; 3]
                };
                Ok(Transform::new(t.into(), glam::Quat::from_array(r), s.into()))
            }
            Self::Mat43 => {
                let m = reader.read_f32_array::<12>().field(field)?;
                // Row-vector rows are column-vector columns
                let matrix = Mat4::from_cols(
                    Vec4::new(m[0], m[1], m[2], 0.0),
                    Vec4::new(m[3], m[4], m[5], 0.0),
                    Vec4::new(m[6], m[7], m[8], 0.0),
                    Vec4::new(m[9], m[10], m[11], 1.0),
                );
                Ok(Transform::from_matrix(matrix))
            }
            Self::Mat44 => {
                let m = reader.read_f32_array::<16>().field(field)?;
                Ok(Transform::from_matrix(Mat4::from_cols_array(&m)))
            }
        }
    }

    /// Append one transform in this encoding
    pub(crate) fn write_transform(self, out: &mut Vec<u8>, transform: &Transform, version: u32) {
        let mut push = |values: &[f32]| {
            for v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        };
        match self {
            Self::Trs => {
                push(&transform.translation.to_array());
                push(&transform.rotation.to_array());
                if version >= LAB_VERSION_1001 {
                    push(&transform.scale.to_array());
                }
            }
            Self::Mat43 => {
                let cols = transform.to_matrix().to_cols_array_2d();
                for col in cols {
                    push(&col[..3]);
                }
            }
            Self::Mat44 => push(&transform.to_matrix().to_cols_array()),
        }
    }
}

/// Parsed `.lab` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabHeader {
    pub version: u32,
    pub bone_count: u32,
    pub clip_count: u32,
    pub key_format: KeyFormat,
    pub flags: u32,
    /// Always 0 on version 0x1000
    pub dummy_count: u32,
}

impl LabHeader {
    /// Header size for a given version
    pub fn size(version: u32) -> usize {
        if version >= LAB_VERSION_1001 { 28 } else { 24 }
    }

    pub fn has_mesh(&self) -> bool {
        self.flags & FLAG_MESH != 0
    }

    pub fn is_supported_version(version: u32) -> bool {
        matches!(version, LAB_VERSION_1000 | LAB_VERSION_1001)
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::size(self.version));
        bytes.extend_from_slice(&LAB_MAGIC);
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.bone_count.to_le_bytes());
        bytes.extend_from_slice(&self.clip_count.to_le_bytes());
        bytes.extend_from_slice(&(self.key_format as u32).to_le_bytes());
        bytes.extend_from_slice(&self.flags.to_le_bytes());
        if self.version >= LAB_VERSION_1001 {
            bytes.extend_from_slice(&self.dummy_count.to_le_bytes());
        }
        bytes
    }

    /// Read and validate the header at the reader's cursor.
    ///
    /// Magic and version are checked before anything else is read.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self, DecodeError> {
        let magic = reader.read_bytes(4).field("magic")?;
        if magic != LAB_MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(magic);
            return Err(DecodeError::BadMagic {
                found,
                expected: LAB_MAGIC,
            });
        }

        let version = reader.read_u32().field("version")?;
        if !Self::is_supported_version(version) {
            return Err(DecodeError::UnsupportedVersion { version });
        }

        let bone_count = reader.read_u32().field("bone count")?;
        let clip_count = reader.read_u32().field("clip count")?;
        let format = reader.read_u32().field("key format")?;
        let key_format =
            KeyFormat::from_u32(format).ok_or(DecodeError::UnsupportedKeyFormat { format })?;
        let flags = reader.read_u32().field("flags")?;
        if flags & !FLAG_MESH != 0 {
            return Err(DecodeError::UnsupportedFlags { flags });
        }
        let dummy_count = if version >= LAB_VERSION_1001 {
            reader.read_u32().field("dummy count")?
        } else {
            0
        };

        Ok(Self {
            version,
            bone_count,
            clip_count,
            key_format,
            flags,
            dummy_count,
        })
    }
}
