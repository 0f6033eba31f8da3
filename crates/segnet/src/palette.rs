use serde::{Deserialize, Serialize};

/// Alpha applied to classes without an explicit one (0..255 scale).
pub const DEFAULT_OVERLAY_ALPHA: f32 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassColor {
    pub rgb: [u8; 3],
    /// Explicit alpha. Classes without one follow the palette's overlay alpha.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<u8>,
}

impl ClassColor {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            rgb: [r, g, b],
            alpha: None,
        }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            rgb: [r, g, b],
            alpha: Some(a),
        }
    }
}

/// Colour for `index` in the PASCAL VOC colormap.
///
/// Bits of the index are spread over the high bits of R, G and B.
pub fn voc_color(index: usize) -> [u8; 3] {
    let mut rgb = [0u8; 3];
    let mut c = index;
    for shift in (0..8).rev() {
        for (channel, value) in rgb.iter_mut().enumerate() {
            *value |= (((c >> channel) & 1) as u8) << shift;
        }
        c >>= 3;
    }
    rgb
}

/// Fixed colour and label assignment for every class of a network.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPalette {
    colors: Vec<ClassColor>,
    labels: Vec<String>,
    overlay_alpha: f32,
}

impl ClassPalette {
    /// Palette from explicit colours. Missing labels become `class-N`.
    pub fn new(colors: Vec<ClassColor>, labels: Vec<String>) -> Self {
        let labels = (0..colors.len())
            .map(|i| labels.get(i).cloned().unwrap_or_else(|| format!("class-{i}")))
            .collect();
        Self {
            colors,
            labels,
            overlay_alpha: DEFAULT_OVERLAY_ALPHA,
        }
    }

    /// VOC colormap for `num_classes` classes.
    pub fn voc(num_classes: usize) -> Self {
        let colors = (0..num_classes)
            .map(|i| {
                let [r, g, b] = voc_color(i);
                ClassColor::rgb(r, g, b)
            })
            .collect();
        Self::new(colors, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn overlay_alpha(&self) -> f32 {
        self.overlay_alpha
    }

    /// Set the alpha of every class that has no explicit one.
    ///
    /// Clamped to 0..255; non-finite values leave the alpha unchanged.
    pub fn set_overlay_alpha(&mut self, alpha: f32) {
        if !alpha.is_finite() {
            base::log_warn!("ignoring non-finite overlay alpha {}", alpha);
            return;
        }
        self.overlay_alpha = alpha.clamp(0.0, 255.0);
    }

    pub fn with_overlay_alpha(mut self, alpha: f32) -> Self {
        self.set_overlay_alpha(alpha);
        self
    }

    pub fn class_color(&self, class: u32) -> Option<&ClassColor> {
        self.colors.get(class as usize)
    }

    pub fn label(&self, class: u32) -> Option<&str> {
        self.labels.get(class as usize).map(String::as_str)
    }

    /// Resolved RGBA for `class`; unknown classes are transparent black.
    pub fn color(&self, class: u32) -> [f32; 4] {
        match self.colors.get(class as usize) {
            Some(color) => [
                color.rgb[0] as f32,
                color.rgb[1] as f32,
                color.rgb[2] as f32,
                color.alpha.map_or(self.overlay_alpha, f32::from),
            ],
            None => [0.0; 4],
        }
    }
}
