use {
    crate::{AllocationError, Device},
    std::{
        fmt,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    },
};

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

#[derive(Debug, Default)]
struct Accounting {
    live_bytes: AtomicUsize,
    live_buffers: AtomicUsize,
}

/// Hands out float buffers addressable from both host and accelerator.
///
/// Clones share one budget and one set of counters. Buffers return their
/// bytes to the arena when dropped.
#[derive(Debug, Clone)]
pub struct DeviceArena {
    device: Device,
    budget: Option<usize>,
    accounting: Arc<Accounting>,
}

impl DeviceArena {
    pub fn new(device: Device) -> Self {
        Self {
            device,
            budget: None,
            accounting: Arc::new(Accounting::default()),
        }
    }

    /// Arena that refuses to hold more than `bytes` at once.
    pub fn with_budget(device: Device, bytes: usize) -> Self {
        Self {
            budget: Some(bytes),
            ..Self::new(device)
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn budget(&self) -> Option<usize> {
        self.budget
    }

    pub fn live_bytes(&self) -> usize {
        self.accounting.live_bytes.load(Ordering::SeqCst)
    }

    pub fn live_buffers(&self) -> usize {
        self.accounting.live_buffers.load(Ordering::SeqCst)
    }

    /// Allocate a zeroed buffer of `byte_size` bytes.
    ///
    /// Either the whole buffer is handed out or nothing is reserved.
    pub fn allocate(&self, byte_size: usize) -> Result<DeviceBuffer, AllocationError> {
        if byte_size == 0 || byte_size % FLOAT_SIZE != 0 {
            return Err(AllocationError::InvalidSize { bytes: byte_size });
        }

        let budget = self.budget;
        self.accounting
            .live_bytes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                live.checked_add(byte_size)
                    .filter(|&next| budget.is_none_or(|limit| next <= limit))
            })
            .map_err(|live| AllocationError::OutOfMemory {
                requested: byte_size,
                available: budget.unwrap_or(usize::MAX).saturating_sub(live),
            })?;

        let len = byte_size / FLOAT_SIZE;
        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            self.accounting
                .live_bytes
                .fetch_sub(byte_size, Ordering::SeqCst);
            return Err(AllocationError::OutOfMemory {
                requested: byte_size,
                available: 0,
            });
        }
        data.resize(len, 0.0);

        self.accounting.live_buffers.fetch_add(1, Ordering::SeqCst);
        base::log_debug!(
            "allocated {} bytes on {} ({} live)",
            byte_size,
            self.device,
            self.live_bytes()
        );

        Ok(DeviceBuffer {
            data,
            byte_size,
            accounting: Arc::clone(&self.accounting),
        })
    }

    /// Return a buffer to the arena. Dropping the buffer does the same.
    pub fn release(&self, buffer: DeviceBuffer) {
        drop(buffer);
    }
}

/// Buffer handed out by a [`DeviceArena`], released exactly once on drop.
pub struct DeviceBuffer {
    data: Vec<f32>,
    byte_size: usize,
    accounting: Arc<Accounting>,
}

impl DeviceBuffer {
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Length in floats.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn byte_size(&self) -> usize {
        self.byte_size
    }
}

impl fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("byte_size", &self.byte_size)
            .finish()
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        self.accounting
            .live_bytes
            .fetch_sub(self.byte_size, Ordering::SeqCst);
        self.accounting.live_buffers.fetch_sub(1, Ordering::SeqCst);
        base::log_debug!("released {} bytes", self.byte_size);
    }
}
