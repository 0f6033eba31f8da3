use {
    crate::{ClassMap, ClassPalette, DeviceTensor, PostProcessError},
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
};

/// Channels written per output pixel.
pub const OUTPUT_CHANNELS: usize = 4;

/// Resampling between the class map grid and the output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Nearest cell.
    #[default]
    Point,
    /// Bilinear blend of the four neighbouring cell colours.
    Linear,
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Point => write!(f, "point"),
            FilterMode::Linear => write!(f, "linear"),
        }
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "point" => Ok(FilterMode::Point),
            "linear" => Ok(FilterMode::Linear),
            other => Err(format!("unknown filter mode: {other}")),
        }
    }
}

fn lerp(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

/// Map an output coordinate onto the grid: `(lower cell, upper cell, weight)`.
fn grid_coord(out: usize, out_size: usize, grid_size: usize) -> (usize, usize, f32) {
    let max = (grid_size - 1) as f32;
    let g = ((out as f32 + 0.5) * grid_size as f32 / out_size as f32 - 0.5).clamp(0.0, max);
    let lower = g.floor() as usize;
    let upper = (lower + 1).min(grid_size - 1);
    (lower, upper, g - lower as f32)
}

fn nearest(out: usize, out_size: usize, size: usize) -> usize {
    (out * size / out_size).min(size - 1)
}

/// Derives colour visualizations from a class map.
#[derive(Debug, Clone)]
pub struct SegmentationPostProcessor {
    palette: ClassPalette,
}

impl SegmentationPostProcessor {
    pub fn new(palette: ClassPalette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &ClassPalette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut ClassPalette {
        &mut self.palette
    }

    /// Class colours blended over `source` at each class's alpha.
    ///
    /// Writes `width * height` RGBA pixels with opaque alpha. `source` is
    /// sampled nearest-neighbour when its size differs from the target.
    pub fn overlay(
        &self,
        class_map: Option<&ClassMap>,
        source: &DeviceTensor,
        output: &mut [f32],
        width: usize,
        height: usize,
        filter: FilterMode,
    ) -> Result<(), PostProcessError> {
        let class_map = check(class_map, output.len(), width, height, OUTPUT_CHANNELS)?;
        for y in 0..height {
            let src_y = nearest(y, height, source.height());
            for x in 0..width {
                let src_x = nearest(x, width, source.width());
                let color = self.sample(class_map, x, y, width, height, filter);
                let under = source.rgba_at(src_x, src_y);
                let alpha = color[3] / 255.0;
                let idx = (y * width + x) * OUTPUT_CHANNELS;
                output[idx] = color[0] * alpha + under[0] * (1.0 - alpha);
                output[idx + 1] = color[1] * alpha + under[1] * (1.0 - alpha);
                output[idx + 2] = color[2] * alpha + under[2] * (1.0 - alpha);
                output[idx + 3] = 255.0;
            }
        }
        Ok(())
    }

    /// Class colours alone, opaque.
    pub fn mask(
        &self,
        class_map: Option<&ClassMap>,
        output: &mut [f32],
        width: usize,
        height: usize,
        filter: FilterMode,
    ) -> Result<(), PostProcessError> {
        let class_map = check(class_map, output.len(), width, height, OUTPUT_CHANNELS)?;
        for y in 0..height {
            for x in 0..width {
                let color = self.sample(class_map, x, y, width, height, filter);
                let idx = (y * width + x) * OUTPUT_CHANNELS;
                output[idx..idx + 3].copy_from_slice(&color[..3]);
                output[idx + 3] = 255.0;
            }
        }
        Ok(())
    }

    /// One class id byte per pixel, nearest cell.
    pub fn class_ids(
        &self,
        class_map: Option<&ClassMap>,
        output: &mut [u8],
        width: usize,
        height: usize,
    ) -> Result<(), PostProcessError> {
        let class_map = check(class_map, output.len(), width, height, 1)?;
        for y in 0..height {
            let gy = nearest(y, height, class_map.height());
            for x in 0..width {
                let gx = nearest(x, width, class_map.width());
                output[y * width + x] = class_map.class_at(gx, gy).min(u8::MAX as u32) as u8;
            }
        }
        Ok(())
    }

    fn sample(
        &self,
        class_map: &ClassMap,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        filter: FilterMode,
    ) -> [f32; 4] {
        let (grid_w, grid_h) = (class_map.width(), class_map.height());
        match filter {
            FilterMode::Point => {
                let gx = nearest(x, width, grid_w);
                let gy = nearest(y, height, grid_h);
                self.palette.color(class_map.class_at(gx, gy))
            }
            FilterMode::Linear => {
                let (x0, x1, fx) = grid_coord(x, width, grid_w);
                let (y0, y1, fy) = grid_coord(y, height, grid_h);
                let color = |gx, gy| self.palette.color(class_map.class_at(gx, gy));
                let top = lerp(color(x0, y0), color(x1, y0), fx);
                let bottom = lerp(color(x0, y1), color(x1, y1), fx);
                lerp(top, bottom, fy)
            }
        }
    }
}

fn check<'a>(
    class_map: Option<&'a ClassMap>,
    capacity: usize,
    width: usize,
    height: usize,
    channels: usize,
) -> Result<&'a ClassMap, PostProcessError> {
    if width == 0 || height == 0 {
        return Err(PostProcessError::ZeroDimension { width, height });
    }
    let class_map = class_map.ok_or(PostProcessError::NoClassMap)?;
    let needed = width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(channels))
        .unwrap_or(usize::MAX);
    if needed > capacity {
        return Err(PostProcessError::BufferTooSmall { needed, capacity });
    }
    Ok(class_map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_coord_clamps_edges() {
        // 4 output pixels over a 2-cell grid: centres at -0.25, 0.25, 0.75, 1.25
        assert_eq!(grid_coord(0, 4, 2), (0, 1, 0.0));
        assert_eq!(grid_coord(1, 4, 2), (0, 1, 0.25));
        assert_eq!(grid_coord(2, 4, 2), (0, 1, 0.75));
        assert_eq!(grid_coord(3, 4, 2), (1, 1, 0.0));
    }

    #[test]
    fn test_nearest_scales_down() {
        assert_eq!(nearest(0, 8, 2), 0);
        assert_eq!(nearest(3, 8, 2), 0);
        assert_eq!(nearest(4, 8, 2), 1);
        assert_eq!(nearest(7, 8, 2), 1);
    }

    #[test]
    fn test_lerp_equal_endpoints_is_exact() {
        let c = [128.0, 64.0, 3.0, 120.0];
        assert_eq!(lerp(c, c, 0.37), c);
    }
}
