//! lab-export library
//!
//! Converts legacy `.lab` skeletal animation assets to COLLADA (`.dae`):
//! decode ([`lab_common`]) -> [`space`] conversion -> [`collada`] build,
//! sequenced by [`convert`].

pub mod batch;
pub mod collada;
pub mod config;
pub mod convert;
pub mod info;
pub mod space;

pub use collada::{BuildOptions, SerializationError, XmlDocument, build, build_with};
pub use convert::{
    ConversionError, ConvertOptions, Stage, convert_bytes, convert_file, convert_file_with,
    convert_to_file,
};
pub use space::{SpaceConfig, UpAxis};
