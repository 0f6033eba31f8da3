use base::Tensor;

/// Host-resident image in HWC layout: `[height, width, channels]`.
///
/// `U8` and `U16` carry raw integer samples. `F32` samples are normalized
/// to 0.0..1.0.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    U8(Tensor<u8>),
    U16(Tensor<u16>),
    F32(Tensor<f32>),
}

impl Frame {
    pub fn rgb8(width: usize, height: usize, data: Vec<u8>) -> Result<Self, base::TensorError> {
        Ok(Frame::U8(Tensor::new(vec![height, width, 3], data)?))
    }

    pub fn rgba8(width: usize, height: usize, data: Vec<u8>) -> Result<Self, base::TensorError> {
        Ok(Frame::U8(Tensor::new(vec![height, width, 4], data)?))
    }

    /// Frame of one repeated pixel; the channel count is `pixel.len()`.
    pub fn solid(width: usize, height: usize, pixel: &[u8]) -> Result<Self, base::TensorError> {
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(width * height * pixel.len())
            .collect();
        Ok(Frame::U8(Tensor::new(vec![height, width, pixel.len()], data)?))
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Frame::U8(t) => &t.shape,
            Frame::U16(t) => &t.shape,
            Frame::F32(t) => &t.shape,
        }
    }

    fn dim(&self, index: usize) -> usize {
        self.shape().get(index).copied().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.dim(0)
    }

    pub fn width(&self) -> usize {
        self.dim(1)
    }

    pub fn channels(&self) -> usize {
        self.dim(2)
    }

    /// Number of samples actually held, independent of the declared shape.
    pub fn len(&self) -> usize {
        match self {
            Frame::U8(t) => t.len(),
            Frame::U16(t) => t.len(),
            Frame::F32(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Frame::U8(t) => t.is_empty(),
            Frame::U16(t) => t.is_empty(),
            Frame::F32(t) => t.is_empty(),
        }
    }

    /// Bits per sample.
    pub fn depth(&self) -> usize {
        match self {
            Frame::U8(_) => 8,
            Frame::U16(_) => 16,
            Frame::F32(_) => 32,
        }
    }
}
