use {
    crate::{
        ClassColor, ClassPalette, FilterMode, InferError,
        palette::{DEFAULT_OVERLAY_ALPHA, voc_color},
    },
    serde::{Deserialize, Serialize},
    std::path::{Path, PathBuf},
};

/// Directory the builtin networks are looked up in.
pub const DEFAULT_MODEL_DIR: &str = "networks";

const MODEL_FILE: &str = "fcn_resnet18.onnx";

// ImageNet statistics the FCN-ResNet18 models were trained with, on the 0..255 scale
const IMAGENET_MEAN: [f32; 3] = [123.675, 116.28, 103.53];
const IMAGENET_STD: [f32; 3] = [58.395, 57.12, 57.375];

struct Builtin {
    name: &'static str,
    dir: &'static str,
    width: usize,
    height: usize,
    classes: usize,
}

#[rustfmt::skip]
const BUILTINS: &[Builtin] = &[
    Builtin { name: "fcn-resnet18-cityscapes-512x256", dir: "FCN-ResNet18-Cityscapes-512x256", width: 512, height: 256, classes: 21 },
    Builtin { name: "fcn-resnet18-cityscapes-1024x512", dir: "FCN-ResNet18-Cityscapes-1024x512", width: 1024, height: 512, classes: 21 },
    Builtin { name: "fcn-resnet18-cityscapes-2048x1024", dir: "FCN-ResNet18-Cityscapes-2048x1024", width: 2048, height: 1024, classes: 21 },
    Builtin { name: "fcn-resnet18-deepscene-576x320", dir: "FCN-ResNet18-DeepScene-576x320", width: 576, height: 320, classes: 5 },
    Builtin { name: "fcn-resnet18-deepscene-864x480", dir: "FCN-ResNet18-DeepScene-864x480", width: 864, height: 480, classes: 5 },
    Builtin { name: "fcn-resnet18-mhp-512x320", dir: "FCN-ResNet18-MHP-512x320", width: 512, height: 320, classes: 21 },
    Builtin { name: "fcn-resnet18-mhp-640x360", dir: "FCN-ResNet18-MHP-640x360", width: 640, height: 360, classes: 21 },
    Builtin { name: "fcn-resnet18-voc-320x320", dir: "FCN-ResNet18-Pascal-VOC-320x320", width: 320, height: 320, classes: 21 },
    Builtin { name: "fcn-resnet18-voc-512x320", dir: "FCN-ResNet18-Pascal-VOC-512x320", width: 512, height: 320, classes: 21 },
    Builtin { name: "fcn-resnet18-sun-512x400", dir: "FCN-ResNet18-SUN-RGBD-512x400", width: 512, height: 400, classes: 21 },
    Builtin { name: "fcn-resnet18-sun-640x512", dir: "FCN-ResNet18-SUN-RGBD-640x512", width: 640, height: 512, classes: 21 },
];

const ALIASES: &[(&str, &str)] = &[
    ("fcn-resnet18-cityscapes", "fcn-resnet18-cityscapes-512x256"),
    ("fcn-resnet18-deepscene", "fcn-resnet18-deepscene-576x320"),
    ("fcn-resnet18-mhp", "fcn-resnet18-mhp-512x320"),
    ("fcn-resnet18-voc", "fcn-resnet18-voc-320x320"),
    ("fcn-resnet18-sun", "fcn-resnet18-sun-512x400"),
];

const VOC_LABELS: &[&str] = &[
    "background", "aeroplane", "bicycle", "bird", "boat", "bottle", "bus", "car", "cat",
    "chair", "cow", "diningtable", "dog", "horse", "motorbike", "person", "pottedplant",
    "sheep", "sofa", "train", "tvmonitor",
];

const DEEPSCENE_LABELS: &[&str] = &["trail", "grass", "vegetation", "obstacle", "sky"];

fn default_input_scale() -> [f32; 3] {
    [1.0 / 255.0; 3]
}

fn default_overlay_alpha() -> f32 {
    DEFAULT_OVERLAY_ALPHA
}

/// Everything needed to load a segmentation network and colour its output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub model: PathBuf,
    /// Native input resolution of the network.
    pub input_width: usize,
    pub input_height: usize,
    pub num_classes: usize,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Per-class colours; the VOC colormap is used when empty.
    #[serde(default)]
    pub colors: Vec<ClassColor>,
    /// Subtracted from RGB (0..255 scale) during conversion.
    #[serde(default)]
    pub mean_pixel: [f32; 3],
    /// Per-channel multiplier applied when packing the network input.
    #[serde(default = "default_input_scale")]
    pub input_scale: [f32; 3],
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: f32,
    #[serde(default)]
    pub filter: FilterMode,
}

impl NetworkConfig {
    /// Names accepted by [`NetworkConfig::builtin`], aliases included.
    pub fn builtin_names() -> Vec<&'static str> {
        BUILTINS
            .iter()
            .map(|b| b.name)
            .chain(ALIASES.iter().map(|(alias, _)| *alias))
            .collect()
    }

    /// One of the pretrained FCN-ResNet18 networks, resolved under [`DEFAULT_MODEL_DIR`].
    pub fn builtin(name: &str) -> Result<Self, InferError> {
        let lowered = name.trim().to_ascii_lowercase();
        let resolved = ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map_or(lowered.as_str(), |(_, target)| target);
        let builtin = BUILTINS
            .iter()
            .find(|b| b.name == resolved)
            .ok_or_else(|| InferError::UnknownNetwork(name.to_string()))?;

        let labels = if builtin.name.contains("-voc-") {
            VOC_LABELS.iter().map(|s| s.to_string()).collect()
        } else if builtin.name.contains("-deepscene-") {
            DEEPSCENE_LABELS.iter().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            name: builtin.name.to_string(),
            model: Path::new(DEFAULT_MODEL_DIR).join(builtin.dir).join(MODEL_FILE),
            input_width: builtin.width,
            input_height: builtin.height,
            num_classes: builtin.classes,
            labels,
            colors: Vec::new(),
            mean_pixel: IMAGENET_MEAN,
            input_scale: IMAGENET_STD.map(|std| 1.0 / std),
            overlay_alpha: DEFAULT_OVERLAY_ALPHA,
            filter: FilterMode::Point,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, InferError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, InferError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Accepts a builtin name, `--network=NAME`, or a path to a `.json` config.
    pub fn from_arg(arg: &str) -> Result<Self, InferError> {
        let value = arg.strip_prefix("--network=").unwrap_or(arg);
        if value.ends_with(".json") {
            Self::from_json_file(value)
        } else {
            Self::builtin(value)
        }
    }

    /// Re-root the model path under `dir`, keeping the network's own subdirectory.
    pub fn with_model_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let relative = self
            .model
            .strip_prefix(DEFAULT_MODEL_DIR)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.model.file_name().map(PathBuf::from).unwrap_or_default());
        self.model = dir.as_ref().join(relative);
        self
    }

    pub fn validate(&self) -> Result<(), InferError> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(InferError::Config(format!(
                "{}: input size {}x{} has a zero dimension",
                self.name, self.input_width, self.input_height
            )));
        }
        if self.num_classes == 0 {
            return Err(InferError::Config(format!("{}: no classes", self.name)));
        }
        if !self.colors.is_empty() && self.colors.len() < self.num_classes {
            return Err(InferError::Config(format!(
                "{}: {} colours for {} classes",
                self.name,
                self.colors.len(),
                self.num_classes
            )));
        }
        Ok(())
    }

    pub fn palette(&self) -> ClassPalette {
        let colors = if self.colors.is_empty() {
            (0..self.num_classes)
                .map(|class| {
                    let [r, g, b] = voc_color(class);
                    ClassColor::rgb(r, g, b)
                })
                .collect()
        } else {
            self.colors.clone()
        };
        ClassPalette::new(colors, self.labels.clone()).with_overlay_alpha(self.overlay_alpha)
    }
}
