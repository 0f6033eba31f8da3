use crate::{ClassMap, DeviceTensor, InferError};

/// Handle to a loaded segmentation network.
///
/// The class map returned by [`Network::forward`] stays valid until the next
/// `forward` call; the borrow on `self` enforces that. After a failed
/// `forward`, [`Network::class_map`] must return `None`.
pub trait Network: Send {
    fn name(&self) -> &str;

    fn num_classes(&self) -> usize;

    /// Run a forward pass over a fully written RGBA device tensor.
    fn forward(&mut self, input: &DeviceTensor) -> Result<&ClassMap, InferError>;

    /// Class map from the last successful forward pass.
    fn class_map(&self) -> Option<&ClassMap>;

    /// Wait for any outstanding device work issued by the network.
    fn synchronize(&mut self) -> Result<(), InferError> {
        Ok(())
    }

    /// Timing summary printed at shutdown.
    fn profiler_report(&self) -> Option<String> {
        None
    }
}
