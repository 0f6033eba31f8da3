//! Per-frame semantic segmentation.
//!
//! A [`Segmenter`] is bound to one resolution. Each call to
//! [`Segmenter::process`] converts a host [`frame::Frame`] into a device
//! tensor, runs the network, and renders a full-resolution colour overlay
//! and a half-resolution class mask into buffers allocated once up front.

pub mod arena;
pub mod classmap;
pub mod config;
pub mod convert;
pub mod device;
pub mod error;
pub mod network;
pub mod onnx;
pub mod palette;
pub mod pipeline;
pub mod postprocess;
pub mod profiler;

pub use arena::{DeviceArena, DeviceBuffer};
pub use classmap::ClassMap;
pub use config::NetworkConfig;
pub use convert::{DeviceTensor, FormatConverter};
pub use device::{Accelerator, Device};
pub use error::{
    AllocationError, ConversionError, InferError, LifecycleError, PostProcessError, SegnetError,
};
pub use network::Network;
pub use onnx::OnnxNetwork;
pub use palette::{ClassColor, ClassPalette, DEFAULT_OVERLAY_ALPHA};
pub use pipeline::{FrameOutput, FrameReport, PipelineState, Segmenter};
pub use postprocess::{FilterMode, SegmentationPostProcessor};
pub use profiler::{Profiler, Stage};
