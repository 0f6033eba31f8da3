use std::fmt;

/// Failure turning encoded bytes into a [`crate::Frame`] or a float buffer back into PNG.
#[derive(Debug)]
pub enum FrameError {
    /// The bytes are not an image `image` can read.
    Decode(crates_image::ImageError),
    /// The float buffer holds fewer samples than `width * height * 4`.
    ShortBuffer {
        width: u32,
        height: u32,
        needed: usize,
        got: usize,
    },
    /// The PNG encoder rejected the buffer.
    Encode(crates_image::ImageError),
    /// The blocking worker panicked or was cancelled.
    Worker(String),
    Tensor(base::TensorError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Decode(err) => write!(f, "cannot decode frame: {err}"),
            FrameError::ShortBuffer {
                width,
                height,
                needed,
                got,
            } => write!(
                f,
                "{width}x{height} RGBA frame needs {needed} samples, buffer holds {got}"
            ),
            FrameError::Encode(err) => write!(f, "cannot encode frame as PNG: {err}"),
            FrameError::Worker(msg) => write!(f, "frame worker failed: {msg}"),
            FrameError::Tensor(err) => write!(f, "decoded pixels do not fit the frame shape: {err}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Decode(err) | FrameError::Encode(err) => Some(err),
            FrameError::Tensor(err) => Some(err),
            _ => None,
        }
    }
}

impl From<base::TensorError> for FrameError {
    fn from(err: base::TensorError) -> Self {
        FrameError::Tensor(err)
    }
}
