use {crate::Device, std::fmt};

/// Device memory could not be handed out.
#[derive(Debug, Clone, PartialEq)]
pub enum AllocationError {
    InvalidSize { bytes: usize },
    DimensionOverflow { width: usize, height: usize },
    OutOfMemory { requested: usize, available: usize },
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationError::InvalidSize { bytes } => {
                write!(f, "invalid allocation size: {bytes} bytes")
            }
            AllocationError::DimensionOverflow { width, height } => {
                write!(f, "buffer for {width}x{height} overflows the address space")
            }
            AllocationError::OutOfMemory {
                requested,
                available,
            } => write!(
                f,
                "out of device memory: requested {requested} bytes, {available} available"
            ),
        }
    }
}

impl std::error::Error for AllocationError {}

/// A frame could not be turned into a device tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    EmptyFrame,
    UnsupportedChannels(usize),
    Malformed(String),
    DimensionMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    Allocation(AllocationError),
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::EmptyFrame => write!(f, "frame is empty"),
            ConversionError::UnsupportedChannels(channels) => {
                write!(f, "unsupported channel count: {channels} (expected 3 or 4)")
            }
            ConversionError::Malformed(msg) => write!(f, "malformed frame: {msg}"),
            ConversionError::DimensionMismatch { expected, got } => write!(
                f,
                "frame is {}x{}, pipeline is bound to {}x{}",
                got.0, got.1, expected.0, expected.1
            ),
            ConversionError::Allocation(err) => write!(f, "tensor allocation failed: {err}"),
        }
    }
}

impl std::error::Error for ConversionError {}

impl From<AllocationError> for ConversionError {
    fn from(err: AllocationError) -> Self {
        ConversionError::Allocation(err)
    }
}

impl From<base::TensorError> for ConversionError {
    fn from(err: base::TensorError) -> Self {
        ConversionError::Malformed(err.to_string())
    }
}

/// The inference engine could not be loaded or run.
#[derive(Debug, Clone, PartialEq)]
pub enum InferError {
    UnknownNetwork(String),
    Config(String),
    ModelLoad(String),
    UnsupportedDevice(Device),
    MissingInput,
    Shape(String),
    Runtime(String),
    Io(String),
}

impl fmt::Display for InferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferError::UnknownNetwork(name) => write!(f, "unknown network: {name}"),
            InferError::Config(msg) => write!(f, "config error: {msg}"),
            InferError::ModelLoad(msg) => write!(f, "model load error: {msg}"),
            InferError::UnsupportedDevice(device) => write!(f, "unsupported device: {device}"),
            InferError::MissingInput => write!(f, "no converted input tensor for this frame"),
            InferError::Shape(msg) => write!(f, "shape error: {msg}"),
            InferError::Runtime(msg) => write!(f, "runtime error: {msg}"),
            InferError::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl std::error::Error for InferError {}

impl From<candle_core::Error> for InferError {
    fn from(err: candle_core::Error) -> Self {
        InferError::Runtime(err.to_string())
    }
}

impl From<ort::Error> for InferError {
    fn from(err: ort::Error) -> Self {
        InferError::Runtime(err.to_string())
    }
}

impl From<ndarray::ShapeError> for InferError {
    fn from(err: ndarray::ShapeError) -> Self {
        InferError::Shape(err.to_string())
    }
}

impl From<base::TensorError> for InferError {
    fn from(err: base::TensorError) -> Self {
        InferError::Shape(err.to_string())
    }
}

impl From<std::io::Error> for InferError {
    fn from(err: std::io::Error) -> Self {
        InferError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for InferError {
    fn from(err: serde_json::Error) -> Self {
        InferError::Config(err.to_string())
    }
}

/// Overlay or mask generation was refused. Nothing is written when this is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum PostProcessError {
    NoClassMap,
    ZeroDimension { width: usize, height: usize },
    BufferTooSmall { needed: usize, capacity: usize },
}

impl fmt::Display for PostProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostProcessError::NoClassMap => write!(f, "no class map from a completed inference"),
            PostProcessError::ZeroDimension { width, height } => {
                write!(f, "target size {width}x{height} has a zero dimension")
            }
            PostProcessError::BufferTooSmall { needed, capacity } => write!(
                f,
                "output buffer too small: needs {needed} elements, holds {capacity}"
            ),
        }
    }
}

impl std::error::Error for PostProcessError {}

/// The pipeline was used outside the `Ready` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    ShutDown,
    Reentrant,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::ShutDown => write!(f, "pipeline has been shut down"),
            LifecycleError::Reentrant => {
                write!(f, "pipeline is already processing a frame")
            }
        }
    }
}

impl std::error::Error for LifecycleError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SegnetError {
    Allocation(AllocationError),
    Conversion(ConversionError),
    Infer(InferError),
    PostProcess(PostProcessError),
    Lifecycle(LifecycleError),
}

impl fmt::Display for SegnetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegnetError::Allocation(err) => write!(f, "{err}"),
            SegnetError::Conversion(err) => write!(f, "{err}"),
            SegnetError::Infer(err) => write!(f, "{err}"),
            SegnetError::PostProcess(err) => write!(f, "{err}"),
            SegnetError::Lifecycle(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SegnetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SegnetError::Allocation(err) => Some(err),
            SegnetError::Conversion(err) => Some(err),
            SegnetError::Infer(err) => Some(err),
            SegnetError::PostProcess(err) => Some(err),
            SegnetError::Lifecycle(err) => Some(err),
        }
    }
}

impl From<AllocationError> for SegnetError {
    fn from(err: AllocationError) -> Self {
        SegnetError::Allocation(err)
    }
}

impl From<ConversionError> for SegnetError {
    fn from(err: ConversionError) -> Self {
        SegnetError::Conversion(err)
    }
}

impl From<InferError> for SegnetError {
    fn from(err: InferError) -> Self {
        SegnetError::Infer(err)
    }
}

impl From<PostProcessError> for SegnetError {
    fn from(err: PostProcessError) -> Self {
        SegnetError::PostProcess(err)
    }
}

impl From<LifecycleError> for SegnetError {
    fn from(err: LifecycleError) -> Self {
        SegnetError::Lifecycle(err)
    }
}
