use facecascade_core::IntegralImage;
use serde::{Deserialize, Serialize};

use crate::classifier::Stage;

pub const DEFAULT_BASE_SIZE: u32 = 24;

/// Ordered stages plus the training window size.
///
/// A cascade is read-only once built. It counts as loaded only when it has at
/// least one stage and every stage has at least one classifier; detection is
/// refused otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cascade {
    stages: Vec<Stage>,
    base_width: u32,
    base_height: u32,
}

impl Default for Cascade {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_SIZE, DEFAULT_BASE_SIZE)
    }
}

impl Cascade {
    pub fn new(base_width: u32, base_height: u32) -> Self {
        Self {
            stages: Vec::new(),
            base_width,
            base_height,
        }
    }

    pub fn with_stages(base_width: u32, base_height: u32, stages: Vec<Stage>) -> Self {
        Self {
            stages,
            base_width,
            base_height,
        }
    }

    pub fn add_stage(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    #[inline]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[inline]
    pub fn base_width(&self) -> u32 {
        self.base_width
    }

    #[inline]
    pub fn base_height(&self) -> u32 {
        self.base_height
    }

    pub fn is_loaded(&self) -> bool {
        !self.stages.is_empty()
            && self.base_width > 0
            && self.stages.iter().all(|s| !s.is_empty())
    }

    pub fn classifier_count(&self) -> usize {
        self.stages.iter().map(|s| s.classifiers().len()).sum()
    }

    /// Index of the first stage the window fails, `None` when it passes all.
    ///
    /// Evaluation stops at the first failing stage.
    pub fn first_rejecting_stage(
        &self,
        integral: &IntegralImage,
        x: i32,
        y: i32,
        scale: f32,
    ) -> Option<usize> {
        self.stages
            .iter()
            .position(|stage| !stage.passes(integral, x, y, scale))
    }

    pub fn accepts(&self, integral: &IntegralImage, x: i32, y: i32, scale: f32) -> bool {
        self.first_rejecting_stage(integral, x, y, scale).is_none()
    }
}
