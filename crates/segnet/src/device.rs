use {
    crate::{DeviceArena, InferError, NetworkConfig, Segmenter, SegnetError},
    std::fmt,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Device {
    Cpu,
    Cuda { ordinal: usize },
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "CPU"),
            Device::Cuda { ordinal } => write!(f, "CUDA(ordinal={ordinal})"),
        }
    }
}

/// The accelerator a pipeline issues work to.
///
/// Owns the candle device used as the host/device synchronization point and
/// hands out arenas and segmenters bound to it.
#[derive(Debug, Clone)]
pub struct Accelerator {
    device: Device,
    candle: candle_core::Device,
}

impl Accelerator {
    pub fn cpu() -> Self {
        base::log_info!("Segmentation device: CPU");
        Self {
            device: Device::Cpu,
            candle: candle_core::Device::Cpu,
        }
    }

    #[cfg(feature = "cuda")]
    pub fn cuda(ordinal: usize) -> Result<Self, InferError> {
        let candle = candle_core::Device::new_cuda(ordinal)?;
        if candle.is_cuda() {
            base::log_info!("Segmentation device: CUDA (ordinal {})", ordinal);
        } else {
            base::log_warn!(
                "Segmentation device: requested CUDA ordinal {} but device reports non-CUDA",
                ordinal
            );
        }
        Ok(Self {
            device: Device::Cuda { ordinal },
            candle,
        })
    }

    #[cfg(not(feature = "cuda"))]
    pub fn cuda(ordinal: usize) -> Result<Self, InferError> {
        Err(InferError::UnsupportedDevice(Device::Cuda { ordinal }))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Block until all work queued on the device has completed.
    pub fn synchronize(&self) -> Result<(), InferError> {
        self.candle.synchronize()?;
        Ok(())
    }

    pub fn arena(&self) -> DeviceArena {
        DeviceArena::new(self.device.clone())
    }

    /// Load the network described by `config` and bind a segmenter to `width` x `height`.
    pub fn use_segmenter(
        &self,
        width: usize,
        height: usize,
        config: &NetworkConfig,
    ) -> Result<Segmenter, SegnetError> {
        Segmenter::new(width, height, config, self)
    }
}
