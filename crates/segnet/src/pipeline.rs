use {
    crate::{
        Accelerator, AllocationError, ClassMap, ClassPalette, ConversionError, DeviceArena,
        DeviceBuffer, FilterMode, FormatConverter, InferError, LifecycleError, Network,
        NetworkConfig, OnnxNetwork, PostProcessError, Profiler, SegmentationPostProcessor,
        SegnetError, Stage, postprocess::OUTPUT_CHANNELS,
    },
    frame::Frame,
    std::time::Instant,
};

/// Lifecycle of a [`Segmenter`].
///
/// There is no uninitialized state: a failed construction yields no object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Ready,
    Processing,
    Shutdown,
}

/// Outcome of every stage of one `process` call.
///
/// All four stages are attempted on every frame. A stage whose input was not
/// produced by this frame fails on its own rather than reading stale data.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub conversion: Result<(), ConversionError>,
    pub inference: Result<(), InferError>,
    pub overlay: Result<(), PostProcessError>,
    pub mask: Result<(), PostProcessError>,
}

impl FrameReport {
    pub fn is_ok(&self) -> bool {
        self.failed_stages().is_empty()
    }

    pub fn overlay_succeeded(&self) -> bool {
        self.overlay.is_ok()
    }

    pub fn mask_succeeded(&self) -> bool {
        self.mask.is_ok()
    }

    pub fn failed_stages(&self) -> Vec<Stage> {
        let results = [
            (Stage::Conversion, self.conversion.is_ok()),
            (Stage::Inference, self.inference.is_ok()),
            (Stage::Overlay, self.overlay.is_ok()),
            (Stage::Mask, self.mask.is_ok()),
        ];
        results
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(stage, _)| stage)
            .collect()
    }
}

/// Result of [`Segmenter::process`].
///
/// The buffers are read-only views into the segmenter's own memory and stay
/// valid until the next call.
#[derive(Debug)]
pub struct FrameOutput<'a> {
    pub report: FrameReport,
    pub overlay: &'a [f32],
    pub mask: &'a [f32],
}

impl FrameOutput<'_> {
    pub fn overlay_succeeded(&self) -> bool {
        self.report.overlay_succeeded()
    }

    pub fn mask_succeeded(&self) -> bool {
        self.report.mask_succeeded()
    }
}

fn rgba_bytes(width: usize, height: usize) -> Result<usize, AllocationError> {
    if width == 0 || height == 0 {
        return Err(AllocationError::InvalidSize { bytes: 0 });
    }
    width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(OUTPUT_CHANNELS * std::mem::size_of::<f32>()))
        .ok_or(AllocationError::DimensionOverflow { width, height })
}

/// Frame pipeline bound to one fixed resolution.
///
/// Converts each frame, runs the network, and renders a full-resolution
/// overlay plus a half-resolution mask into buffers allocated once at
/// construction.
pub struct Segmenter {
    width: usize,
    height: usize,
    state: PipelineState,
    accelerator: Accelerator,
    converter: FormatConverter,
    network: Option<Box<dyn Network>>,
    postprocessor: SegmentationPostProcessor,
    overlay_buffer: Option<DeviceBuffer>,
    mask_buffer: Option<DeviceBuffer>,
    mean_pixel: [f32; 3],
    overlay_filter: FilterMode,
    mask_filter: FilterMode,
    profiler: Profiler,
}

impl Segmenter {
    /// Load the ONNX network described by `config` and allocate the output buffers.
    pub fn new(
        width: usize,
        height: usize,
        config: &NetworkConfig,
        accelerator: &Accelerator,
    ) -> Result<Self, SegnetError> {
        rgba_bytes(width, height)?;
        let network = OnnxNetwork::load(config, accelerator.device())?;
        let mut segmenter = Self::from_network(
            width,
            height,
            Box::new(network),
            config.palette(),
            accelerator.arena(),
            accelerator.clone(),
        )?;
        segmenter.set_mean_pixel(config.mean_pixel);
        segmenter.set_overlay_filter(config.filter);
        segmenter.set_mask_filter(config.filter);
        Ok(segmenter)
    }

    /// Bind an already loaded network.
    pub fn from_network(
        width: usize,
        height: usize,
        network: Box<dyn Network>,
        palette: ClassPalette,
        arena: DeviceArena,
        accelerator: Accelerator,
    ) -> Result<Self, SegnetError> {
        let overlay_buffer = arena.allocate(rgba_bytes(width, height)?)?;

        let (mask_width, mask_height) = (width / 2, height / 2);
        let mask_buffer = if mask_width == 0 || mask_height == 0 {
            base::log_warn!(
                "segnet: {}x{} is too small for a half-resolution mask",
                width,
                height
            );
            None
        } else {
            Some(arena.allocate(rgba_bytes(mask_width, mask_height)?)?)
        };

        if palette.len() < network.num_classes() {
            base::log_warn!(
                "segnet: palette has {} colours for {} classes, the rest render transparent",
                palette.len(),
                network.num_classes()
            );
        }

        base::log_info!(
            "segnet: {} bound to {}x{} (mask {}x{})",
            network.name(),
            width,
            height,
            mask_width,
            mask_height
        );

        Ok(Self {
            width,
            height,
            state: PipelineState::Ready,
            accelerator,
            converter: FormatConverter::new(arena),
            network: Some(network),
            postprocessor: SegmentationPostProcessor::new(palette),
            overlay_buffer: Some(overlay_buffer),
            mask_buffer,
            mean_pixel: [0.0; 3],
            overlay_filter: FilterMode::Point,
            mask_filter: FilterMode::Point,
            profiler: Profiler::default(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mask_size(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn network_name(&self) -> Option<&str> {
        self.network.as_ref().map(|network| network.name())
    }

    pub fn palette(&self) -> &ClassPalette {
        self.postprocessor.palette()
    }

    /// Alpha for classes without an explicit one.
    pub fn set_overlay_alpha(&mut self, alpha: f32) {
        self.postprocessor.palette_mut().set_overlay_alpha(alpha);
    }

    pub fn set_mean_pixel(&mut self, mean_pixel: [f32; 3]) {
        self.mean_pixel = mean_pixel;
    }

    pub fn set_overlay_filter(&mut self, filter: FilterMode) {
        self.overlay_filter = filter;
    }

    pub fn set_mask_filter(&mut self, filter: FilterMode) {
        self.mask_filter = filter;
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    pub fn overlay(&self) -> &[f32] {
        self.overlay_buffer
            .as_ref()
            .map(DeviceBuffer::as_slice)
            .unwrap_or(&[])
    }

    pub fn mask(&self) -> &[f32] {
        self.mask_buffer
            .as_ref()
            .map(DeviceBuffer::as_slice)
            .unwrap_or(&[])
    }

    /// Class map of the last successful inference.
    pub fn class_map(&self) -> Option<&ClassMap> {
        self.network.as_ref().and_then(|network| network.class_map())
    }

    /// Write one class id per pixel of a `width` x `height` grid.
    pub fn class_ids(
        &self,
        output: &mut [u8],
        width: usize,
        height: usize,
    ) -> Result<(), PostProcessError> {
        self.postprocessor
            .class_ids(self.class_map(), output, width, height)
    }

    /// Run every stage on `frame`.
    ///
    /// Returns `Err` only for lifecycle violations. Per-stage failures are
    /// logged and reported in [`FrameOutput::report`].
    pub fn process(&mut self, frame: &Frame) -> Result<FrameOutput<'_>, SegnetError> {
        match self.state {
            PipelineState::Ready => {}
            PipelineState::Processing => return Err(LifecycleError::Reentrant.into()),
            PipelineState::Shutdown => return Err(LifecycleError::ShutDown.into()),
        }

        self.state = PipelineState::Processing;
        let report = self.run_stages(frame);
        self.state = PipelineState::Ready;
        self.profiler.finish_frame();

        if !report.is_ok() {
            base::log_warn!(
                "segnet: frame {} finished with failed stages {:?}",
                self.profiler.frames(),
                report.failed_stages()
            );
        }

        Ok(FrameOutput {
            report,
            overlay: self.overlay(),
            mask: self.mask(),
        })
    }

    fn run_stages(&mut self, frame: &Frame) -> FrameReport {
        let (width, height) = (self.width, self.height);
        let (mask_width, mask_height) = self.mask_size();

        let started = Instant::now();
        let conversion = if !frame.is_empty() && (frame.width(), frame.height()) != (width, height)
        {
            self.converter.invalidate();
            Err(ConversionError::DimensionMismatch {
                expected: (width, height),
                got: (frame.width(), frame.height()),
            })
        } else {
            self.converter.convert(frame, self.mean_pixel).map(|_| ())
        };
        self.profiler
            .record(Stage::Conversion, started.elapsed(), conversion.is_ok());
        if let Err(error) = &conversion {
            base::log_error!("segnet: failed to convert frame: {}", error);
        }

        let started = Instant::now();
        let inference = match (self.network.as_mut(), self.converter.tensor()) {
            (Some(network), Some(tensor)) => {
                let forwarded = network.forward(tensor).map(|_| ());
                // the class map must not be read before device work completes
                forwarded.and_then(|()| network.synchronize())
            }
            (None, _) => Err(InferError::Runtime("network released".to_string())),
            (Some(_), None) => Err(InferError::MissingInput),
        };
        self.profiler
            .record(Stage::Inference, started.elapsed(), inference.is_ok());
        if let Err(error) = &inference {
            base::log_error!("segnet: failed to process segmentation: {}", error);
        }

        let class_map = match (&inference, self.network.as_ref()) {
            (Ok(()), Some(network)) => network.class_map(),
            _ => None,
        };

        let started = Instant::now();
        let overlay = match (self.converter.tensor(), self.overlay_buffer.as_mut()) {
            (Some(source), Some(buffer)) => self.postprocessor.overlay(
                class_map,
                source,
                buffer.as_mut_slice(),
                width,
                height,
                self.overlay_filter,
            ),
            _ => Err(PostProcessError::NoClassMap),
        };
        self.profiler
            .record(Stage::Overlay, started.elapsed(), overlay.is_ok());
        if let Err(error) = &overlay {
            base::log_error!("segnet: failed to process segmentation overlay: {}", error);
        }

        let started = Instant::now();
        let mask = match self.mask_buffer.as_mut() {
            Some(buffer) => self.postprocessor.mask(
                class_map,
                buffer.as_mut_slice(),
                mask_width,
                mask_height,
                self.mask_filter,
            ),
            None => Err(PostProcessError::ZeroDimension {
                width: mask_width,
                height: mask_height,
            }),
        };
        self.profiler
            .record(Stage::Mask, started.elapsed(), mask.is_ok());
        if let Err(error) = &mask {
            base::log_error!("segnet: failed to process segmentation mask: {}", error);
        }

        FrameReport {
            conversion,
            inference,
            overlay,
            mask,
        }
    }

    /// Wait for device work, report timings, and release the network and buffers.
    ///
    /// Safe to call more than once; later calls do nothing.
    pub fn shutdown(&mut self) -> Result<(), SegnetError> {
        if self.state == PipelineState::Shutdown {
            return Ok(());
        }
        self.state = PipelineState::Shutdown;

        let mut result = self.accelerator.synchronize();
        if let Some(mut network) = self.network.take() {
            if let Err(error) = network.synchronize() {
                result = result.and(Err(error));
            }
            if let Some(report) = network.profiler_report() {
                base::log_info!("segnet: {}", report);
            }
        }
        base::log_info!("segnet: {}", self.profiler.report());

        self.converter.release();
        self.overlay_buffer = None;
        self.mask_buffer = None;

        result.map_err(SegnetError::from)
    }
}

impl Drop for Segmenter {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            base::log_error!("segnet: shutdown failed: {}", error);
        }
    }
}
