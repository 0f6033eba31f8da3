#![allow(dead_code)]

use segnet::{
    Accelerator, ClassMap, ClassPalette, DeviceArena, DeviceTensor, InferError, Network,
    Segmenter,
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

pub const BACKGROUND: u32 = 0;
pub const RED: u32 = 1;
pub const GREEN: u32 = 2;
pub const BLUE: u32 = 3;
pub const NUM_CLASSES: usize = 4;
pub const GRID: usize = 4;

/// Shared handles for observing and steering a [`ColorNetwork`].
#[derive(Clone, Default)]
pub struct Probe {
    pub forwards: Arc<AtomicUsize>,
    pub syncs: Arc<AtomicUsize>,
    pub fail: Arc<AtomicBool>,
    pub panic: Arc<AtomicBool>,
}

impl Probe {
    pub fn forwards(&self) -> usize {
        self.forwards.load(Ordering::SeqCst)
    }

    pub fn syncs(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_panic(&self, panic: bool) {
        self.panic.store(panic, Ordering::SeqCst);
    }
}

/// Classifies each cell of a 4x4 grid by its dominant colour channel.
pub struct ColorNetwork {
    probe: Probe,
    class_map: Option<ClassMap>,
}

impl ColorNetwork {
    pub fn new(probe: Probe) -> Self {
        Self {
            probe,
            class_map: None,
        }
    }
}

pub fn classify(pixel: [f32; 4]) -> u32 {
    let [r, g, b, _] = pixel;
    let max = r.max(g).max(b);
    if max < 64.0 {
        BACKGROUND
    } else if r == max {
        RED
    } else if g == max {
        GREEN
    } else {
        BLUE
    }
}

impl Network for ColorNetwork {
    fn name(&self) -> &str {
        "color-dominance"
    }

    fn num_classes(&self) -> usize {
        NUM_CLASSES
    }

    fn forward(&mut self, input: &DeviceTensor) -> Result<&ClassMap, InferError> {
        self.class_map = None;
        self.probe.forwards.fetch_add(1, Ordering::SeqCst);
        if self.probe.panic.load(Ordering::SeqCst) {
            panic!("injected panic");
        }
        if self.probe.fail.load(Ordering::SeqCst) {
            return Err(InferError::Runtime("injected failure".to_string()));
        }

        let mut classes = Vec::with_capacity(GRID * GRID);
        for gy in 0..GRID {
            let y = ((2 * gy + 1) * input.height() / (2 * GRID)).min(input.height() - 1);
            for gx in 0..GRID {
                let x = ((2 * gx + 1) * input.width() / (2 * GRID)).min(input.width() - 1);
                classes.push(classify(input.pixel(x, y)));
            }
        }
        let class_map = ClassMap::new(GRID, GRID, NUM_CLASSES, classes, vec![1.0; GRID * GRID])?;
        Ok(self.class_map.insert(class_map))
    }

    fn class_map(&self) -> Option<&ClassMap> {
        self.class_map.as_ref()
    }

    fn synchronize(&mut self) -> Result<(), InferError> {
        self.probe.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn profiler_report(&self) -> Option<String> {
        Some(format!("color-dominance: {} forward passes", self.probe.forwards()))
    }
}

pub fn segmenter_with_arena(
    width: usize,
    height: usize,
    arena: DeviceArena,
) -> Result<(Segmenter, Probe), segnet::SegnetError> {
    let probe = Probe::default();
    let segmenter = Segmenter::from_network(
        width,
        height,
        Box::new(ColorNetwork::new(probe.clone())),
        ClassPalette::voc(NUM_CLASSES),
        arena,
        Accelerator::cpu(),
    )?;
    Ok((segmenter, probe))
}

pub fn segmenter(width: usize, height: usize) -> (Segmenter, Probe) {
    segmenter_with_arena(width, height, Accelerator::cpu().arena()).unwrap()
}

/// Expected overlay pixel for `class` blended over a solid `under` colour.
pub fn blended(palette: &ClassPalette, class: u32, under: [f32; 3]) -> [f32; 4] {
    let color = palette.color(class);
    let alpha = color[3] / 255.0;
    [
        color[0] * alpha + under[0] * (1.0 - alpha),
        color[1] * alpha + under[1] * (1.0 - alpha),
        color[2] * alpha + under[2] * (1.0 - alpha),
        255.0,
    ]
}

pub fn opaque(palette: &ClassPalette, class: u32) -> [f32; 4] {
    let [r, g, b, _] = palette.color(class);
    [r, g, b, 255.0]
}

pub fn all_pixels_equal(buffer: &[f32], expected: [f32; 4]) -> bool {
    buffer.chunks_exact(4).all(|pixel| pixel == expected)
}
