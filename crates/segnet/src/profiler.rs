use std::{fmt, time::Duration};

/// Sub-steps of one `process` call, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Conversion,
    Inference,
    Overlay,
    Mask,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Conversion, Stage::Inference, Stage::Overlay, Stage::Mask];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Conversion => write!(f, "conversion"),
            Stage::Inference => write!(f, "inference"),
            Stage::Overlay => write!(f, "overlay"),
            Stage::Mask => write!(f, "mask"),
        }
    }
}

/// Wall-clock totals per stage.
#[derive(Debug, Clone, Default)]
pub struct Profiler {
    totals: [Duration; 4],
    failures: [u64; 4],
    frames: u64,
}

impl Profiler {
    pub fn record(&mut self, stage: Stage, elapsed: Duration, succeeded: bool) {
        self.totals[stage.index()] += elapsed;
        if !succeeded {
            self.failures[stage.index()] += 1;
        }
    }

    pub fn finish_frame(&mut self) {
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn total(&self, stage: Stage) -> Duration {
        self.totals[stage.index()]
    }

    pub fn failures(&self, stage: Stage) -> u64 {
        self.failures[stage.index()]
    }

    pub fn average(&self, stage: Stage) -> Duration {
        if self.frames == 0 {
            return Duration::ZERO;
        }
        self.total(stage).div_f64(self.frames as f64)
    }

    pub fn report(&self) -> String {
        let mut report = format!("{} frames", self.frames);
        for stage in Stage::ALL {
            report.push_str(&format!(
                ", {} {:.2} ms avg ({} failed)",
                stage,
                self.average(stage).as_secs_f64() * 1000.0,
                self.failures(stage)
            ));
        }
        report
    }
}
