use {
    crate::{AllocationError, ConversionError, DeviceArena, DeviceBuffer},
    frame::Frame,
    num_traits::ToPrimitive,
};

/// Channels in a device tensor (interleaved RGBA).
pub const TENSOR_CHANNELS: usize = 4;

/// Alpha written for frames that carry none.
pub const OPAQUE: f32 = 255.0;

/// Normalized float RGBA image resident in device memory.
///
/// Layout is `[height, width, 4]` on the 0..255 scale with the mean pixel
/// already subtracted from RGB.
#[derive(Debug)]
pub struct DeviceTensor {
    buffer: DeviceBuffer,
    width: usize,
    height: usize,
    mean_pixel: [f32; 3],
}

impl DeviceTensor {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mean_pixel(&self) -> [f32; 3] {
        self.mean_pixel
    }

    pub fn as_slice(&self) -> &[f32] {
        self.buffer.as_slice()
    }

    /// Stored (mean-subtracted) sample at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 4] {
        let index = (y * self.width + x) * TENSOR_CHANNELS;
        let data = self.buffer.as_slice();
        [data[index], data[index + 1], data[index + 2], data[index + 3]]
    }

    /// Original colour at `(x, y)`, with the mean added back.
    pub fn rgba_at(&self, x: usize, y: usize) -> [f32; 4] {
        let [r, g, b, a] = self.pixel(x, y);
        [
            r + self.mean_pixel[0],
            g + self.mean_pixel[1],
            b + self.mean_pixel[2],
            a,
        ]
    }
}

/// Turns host frames into the device tensor the network consumes.
///
/// One tensor is kept and overwritten in place while the frame size stays
/// the same. A failed conversion invalidates it, so inference can never see
/// a partially written or stale tensor.
#[derive(Debug)]
pub struct FormatConverter {
    arena: DeviceArena,
    tensor: Option<DeviceTensor>,
    valid: bool,
}

impl FormatConverter {
    pub fn new(arena: DeviceArena) -> Self {
        Self {
            arena,
            tensor: None,
            valid: false,
        }
    }

    /// Tensor from the last successful conversion.
    pub fn tensor(&self) -> Option<&DeviceTensor> {
        if self.valid { self.tensor.as_ref() } else { None }
    }

    /// Mark the current tensor stale without releasing its memory.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Drop the tensor and give its memory back to the arena.
    pub fn release(&mut self) {
        self.valid = false;
        self.tensor = None;
    }

    pub fn convert(
        &mut self,
        frame: &Frame,
        mean_pixel: [f32; 3],
    ) -> Result<&DeviceTensor, ConversionError> {
        self.valid = false;
        self.upload(frame, mean_pixel)?;
        self.valid = true;
        self.tensor
            .as_ref()
            .ok_or_else(|| ConversionError::Malformed("device tensor missing".to_string()))
    }

    fn upload(&mut self, frame: &Frame, mean_pixel: [f32; 3]) -> Result<(), ConversionError> {
        let (width, height, channels) = validate(frame)?;

        let reuse = matches!(&self.tensor, Some(t) if t.width == width && t.height == height);
        if !reuse {
            // free the old tensor first so a size change never holds both
            self.tensor = None;
            let bytes = width
                .checked_mul(height)
                .and_then(|pixels| pixels.checked_mul(TENSOR_CHANNELS * std::mem::size_of::<f32>()))
                .ok_or(AllocationError::DimensionOverflow { width, height })?;
            let buffer = self.arena.allocate(bytes)?;
            base::log_debug!("device tensor allocated for {}x{}", width, height);
            self.tensor = Some(DeviceTensor {
                buffer,
                width,
                height,
                mean_pixel,
            });
        }

        let Some(tensor) = self.tensor.as_mut() else {
            return Err(ConversionError::Malformed("device tensor missing".to_string()));
        };
        tensor.mean_pixel = mean_pixel;
        let dst = tensor.buffer.as_mut_slice();
        match frame {
            Frame::U8(t) => write_rgba(&t.data, channels, 1.0, mean_pixel, dst),
            Frame::U16(t) => write_rgba(&t.data, channels, 1.0 / 257.0, mean_pixel, dst),
            Frame::F32(t) => write_rgba(&t.data, channels, 255.0, mean_pixel, dst),
        }
        Ok(())
    }
}

fn validate(frame: &Frame) -> Result<(usize, usize, usize), ConversionError> {
    let [height, width, channels] = match frame.shape() {
        &[h, w, c] => [h, w, c],
        other => {
            return Err(ConversionError::Malformed(format!(
                "expected [H, W, C] shape, got {other:?}"
            )));
        }
    };
    let samples = base::element_count(frame.shape())?;
    if samples != frame.len() {
        return Err(ConversionError::Malformed(format!(
            "shape {:?} describes {samples} samples, frame holds {}",
            frame.shape(),
            frame.len()
        )));
    }
    if frame.is_empty() || width == 0 || height == 0 {
        return Err(ConversionError::EmptyFrame);
    }
    if channels != 3 && channels != 4 {
        return Err(ConversionError::UnsupportedChannels(channels));
    }
    Ok((width, height, channels))
}

fn write_rgba<T: ToPrimitive>(
    src: &[T],
    channels: usize,
    scale: f32,
    mean_pixel: [f32; 3],
    dst: &mut [f32],
) {
    let sample = |value: &T| value.to_f32().unwrap_or(0.0) * scale;
    for (pixel, out) in src
        .chunks_exact(channels)
        .zip(dst.chunks_exact_mut(TENSOR_CHANNELS))
    {
        out[0] = sample(&pixel[0]) - mean_pixel[0];
        out[1] = sample(&pixel[1]) - mean_pixel[1];
        out[2] = sample(&pixel[2]) - mean_pixel[2];
        out[3] = if channels == 4 { sample(&pixel[3]) } else { OPAQUE };
    }
}
