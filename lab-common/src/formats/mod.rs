//! Binary asset formats
//!
//! Only the legacy `.lab` skeletal animation format lives here for now.

pub mod lab;

pub use lab::{
    KeyFormat, LAB_EXT, LAB_MAGIC, LAB_VERSION_1000, LAB_VERSION_1001, LAB_VERSION_CURRENT,
    LabHeader, LabWriteOptions,
};
