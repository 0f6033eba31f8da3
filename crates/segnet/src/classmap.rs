use {crate::InferError, base::Tensor};

/// Per-cell class prediction at the network's native output resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMap {
    width: usize,
    height: usize,
    num_classes: usize,
    classes: Vec<u32>,
    confidence: Vec<f32>,
}

impl ClassMap {
    pub fn new(
        width: usize,
        height: usize,
        num_classes: usize,
        classes: Vec<u32>,
        confidence: Vec<f32>,
    ) -> Result<Self, InferError> {
        let cells = width.checked_mul(height).ok_or_else(|| {
            InferError::Shape(format!("class map {width}x{height} overflows"))
        })?;
        if cells == 0 {
            return Err(InferError::Shape(format!(
                "class map {width}x{height} is empty"
            )));
        }
        if classes.len() != cells || confidence.len() != cells {
            return Err(InferError::Shape(format!(
                "class map {width}x{height} needs {cells} cells, got {} classes and {} confidences",
                classes.len(),
                confidence.len()
            )));
        }
        if let Some(&class) = classes.iter().find(|&&c| c as usize >= num_classes) {
            return Err(InferError::Shape(format!(
                "class id {class} out of range for {num_classes} classes"
            )));
        }
        Ok(Self {
            width,
            height,
            num_classes,
            classes,
            confidence,
        })
    }

    /// Every cell set to `class` with full confidence.
    pub fn uniform(
        width: usize,
        height: usize,
        num_classes: usize,
        class: u32,
    ) -> Result<Self, InferError> {
        let cells = width.checked_mul(height).ok_or_else(|| {
            InferError::Shape(format!("class map {width}x{height} overflows"))
        })?;
        Self::new(
            width,
            height,
            num_classes,
            vec![class; cells],
            vec![1.0; cells],
        )
    }

    /// Reduce raw `[1, C, H, W]` scores to argmax class and its softmax probability.
    pub fn from_scores(scores: &Tensor<f32>) -> Result<Self, InferError> {
        let [batch, num_classes, height, width] = scores.dims4()?;
        if batch != 1 {
            return Err(InferError::Shape(format!(
                "expected batch of 1, got {batch}"
            )));
        }
        if num_classes == 0 {
            return Err(InferError::Shape("score tensor has no classes".to_string()));
        }
        let expected = base::element_count(&scores.shape)?;
        if expected != scores.data.len() {
            return Err(InferError::Shape(format!(
                "score shape {:?} needs {expected} values, got {}",
                scores.shape,
                scores.data.len()
            )));
        }

        let plane = width * height;
        let mut classes = Vec::with_capacity(plane);
        let mut confidence = Vec::with_capacity(plane);
        for cell in 0..plane {
            let score = |class: usize| scores.data[class * plane + cell];
            let mut best = 0;
            for class in 1..num_classes {
                if score(class) > score(best) {
                    best = class;
                }
            }
            let max = score(best);
            let sum: f32 = (0..num_classes).map(|class| (score(class) - max).exp()).sum();
            classes.push(best as u32);
            confidence.push(1.0 / sum);
        }

        Self::new(width, height, num_classes, classes, confidence)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn classes(&self) -> &[u32] {
        &self.classes
    }

    pub fn class_at(&self, x: usize, y: usize) -> u32 {
        self.classes[y * self.width + x]
    }

    pub fn confidence_at(&self, x: usize, y: usize) -> f32 {
        self.confidence[y * self.width + x]
    }

    /// Number of cells assigned to each class.
    pub fn histogram(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_classes];
        for &class in &self.classes {
            counts[class as usize] += 1;
        }
        counts
    }
}
