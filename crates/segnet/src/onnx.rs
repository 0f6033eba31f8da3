use {
    crate::{
        ClassMap, Device, DeviceTensor, InferError, Network, NetworkConfig, convert::TENSOR_CHANNELS,
    },
    base::Tensor,
    ndarray::{ArrayD, IxDyn},
    ort::{inputs, session::Session as OrtSession, value::TensorRef},
    std::time::{Duration, Instant},
};

/// Pack an RGBA device tensor into NCHW RGB at `width` x `height`.
///
/// Nearest-neighbour resampling; alpha is dropped, each colour channel is
/// multiplied by its `scale`.
pub fn pack_input(input: &DeviceTensor, width: usize, height: usize, scale: [f32; 3]) -> Vec<f32> {
    let plane = width * height;
    let mut packed = vec![0.0; 3 * plane];
    let src = input.as_slice();
    for y in 0..height {
        let src_y = (y * input.height() / height).min(input.height() - 1);
        for x in 0..width {
            let src_x = (x * input.width() / width).min(input.width() - 1);
            let src_idx = (src_y * input.width() + src_x) * TENSOR_CHANNELS;
            for ch in 0..3 {
                packed[ch * plane + y * width + x] = src[src_idx + ch] * scale[ch];
            }
        }
    }
    packed
}

/// Segmentation network executed by ONNX Runtime.
///
/// Expects one image input `[1, 3, H, W]` and a score output `[1, C, h, w]`.
pub struct OnnxNetwork {
    session: OrtSession,
    name: String,
    output_name: String,
    input_width: usize,
    input_height: usize,
    input_scale: [f32; 3],
    num_classes: usize,
    class_map: Option<ClassMap>,
    runs: u64,
    total: Duration,
}

impl OnnxNetwork {
    pub fn load(config: &NetworkConfig, device: &Device) -> Result<Self, InferError> {
        config.validate()?;
        if !config.model.exists() {
            return Err(InferError::ModelLoad(format!(
                "model file not found: {}",
                config.model.display()
            )));
        }

        let mut builder = OrtSession::builder().map_err(|e| {
            InferError::ModelLoad(format!("failed to create session builder: {}", e))
        })?;

        builder = match device {
            Device::Cpu => builder,
            #[cfg(feature = "cuda")]
            Device::Cuda { ordinal } => {
                use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
                builder
                    .with_execution_providers([
                        CUDAExecutionProvider::default()
                            .with_device_id(*ordinal as i32)
                            .build(),
                        CPUExecutionProvider::default().build(),
                    ])
                    .map_err(|_| InferError::UnsupportedDevice(device.clone()))?
            }
            #[cfg(not(feature = "cuda"))]
            Device::Cuda { .. } => {
                return Err(InferError::UnsupportedDevice(device.clone()));
            }
        };

        let session = builder.commit_from_file(&config.model).map_err(|e| {
            InferError::ModelLoad(format!(
                "failed to load {}: {}",
                config.model.display(),
                e
            ))
        })?;

        let output_name = session
            .outputs()
            .first()
            .map(|output| output.name().to_string())
            .ok_or_else(|| InferError::ModelLoad("model has no outputs".to_string()))?;

        base::log_info!(
            "loaded {} ({}x{}, {} classes) on {}",
            config.name,
            config.input_width,
            config.input_height,
            config.num_classes,
            device
        );

        Ok(Self {
            session,
            name: config.name.clone(),
            output_name,
            input_width: config.input_width,
            input_height: config.input_height,
            input_scale: config.input_scale,
            num_classes: config.num_classes,
            class_map: None,
            runs: 0,
            total: Duration::ZERO,
        })
    }

    fn run(&mut self, input: &DeviceTensor) -> Result<ClassMap, InferError> {
        let (width, height) = (self.input_width, self.input_height);
        let packed = pack_input(input, width, height, self.input_scale);
        let array = ArrayD::from_shape_vec(IxDyn(&[1, 3, height, width]), packed)?;
        let tensor_ref = TensorRef::from_array_view(array.view())?;

        let outputs = self.session.run(inputs![tensor_ref])?;
        let scores = outputs[self.output_name.as_str()].try_extract_array::<f32>()?;
        let scores = Tensor::new(scores.shape().to_vec(), scores.iter().copied().collect())?;

        let class_map = ClassMap::from_scores(&scores)?;
        if class_map.num_classes() != self.num_classes {
            return Err(InferError::Shape(format!(
                "{} produced {} classes, configured for {}",
                self.name,
                class_map.num_classes(),
                self.num_classes
            )));
        }
        Ok(class_map)
    }
}

impl Network for OnnxNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn forward(&mut self, input: &DeviceTensor) -> Result<&ClassMap, InferError> {
        self.class_map = None;
        let started = Instant::now();
        let class_map = self.run(input)?;
        self.total += started.elapsed();
        self.runs += 1;
        Ok(self.class_map.insert(class_map))
    }

    fn class_map(&self) -> Option<&ClassMap> {
        self.class_map.as_ref()
    }

    fn profiler_report(&self) -> Option<String> {
        if self.runs == 0 {
            return None;
        }
        Some(format!(
            "{}: {} forward passes, {:.2} ms average",
            self.name,
            self.runs,
            self.total.as_secs_f64() * 1000.0 / self.runs as f64
        ))
    }
}
