//! Composable image transforms.
//!
//! A [`Stage`] is one primitive (normalisation, stretch, filter, threshold or
//! crop). A [`Transform`] is an ordered chain of stages applied left to right;
//! composing transforms concatenates their chains, so composition is
//! associative and the empty chain is the identity.
//!
//! Every stage is total: NaN and infinite pixels are replaced by zero before
//! the stage runs and every stage returns finite values.

pub mod filter;
pub mod geometry;
pub mod normalize;
pub mod stretch;
pub mod threshold;


use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Plane;

/// Default `a` of the logarithmic stretch.
pub const DEFAULT_LOG_A: f32 = 1000.0;

/// Default `a` of the inverse hyperbolic sine stretch.
pub const DEFAULT_ASINH_A: f32 = 0.1;

fn default_log_a() -> f32 {
    DEFAULT_LOG_A
}

fn default_asinh_a() -> f32 {
    DEFAULT_ASINH_A
}

// ============================================================================
// Stage
// ============================================================================

/// A primitive pure image transform with its construction-time parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stage {
    /// Rescale to [0, 1] by the observed min and max.
    MinMaxNormalize,
    /// Clip to the 1st..99th percentile range, then rescale to [0, 1].
    AdaptiveNormalize,
    /// `ln(a·x + 1) / ln(a + 1)`.
    Log {
        #[serde(default = "default_log_a")]
        a: f32,
    },
    Sqrt,
    Power {
        exponent: f32,
    },
    Square,
    /// `asinh(x / a) / asinh(1 / a)`.
    Asinh {
        #[serde(default = "default_asinh_a")]
        a: f32,
    },
    GaussianBlur {
        kernel_size: usize,
    },
    MedianBlur {
        kernel_size: usize,
    },
    /// Edge-preserving smoothing. A zero diameter derives the window from `sigma_space`.
    Bilateral {
        diameter: usize,
        sigma_color: f32,
        sigma_space: f32,
    },
    /// 1 where the pixel is above `value`, 0 elsewhere.
    Threshold {
        value: f32,
    },
    /// 1 where the pixel is above its local `block_size` mean minus `constant`.
    AdaptiveThreshold {
        block_size: usize,
        constant: f32,
    },
    /// Keep the central `1 / factor` of each dimension.
    CenterCrop {
        factor: f32,
    },
}

impl Stage {
    pub fn apply(&self, image: &Plane) -> Plane {
        let image = normalize::sanitize(image);
        let output = match *self {
            Stage::MinMaxNormalize => normalize::min_max(&image),
            Stage::AdaptiveNormalize => normalize::adaptive(&image),
            Stage::Log { a } => stretch::log(&image, a),
            Stage::Sqrt => stretch::sqrt(&image),
            Stage::Power { exponent } => stretch::power(&image, exponent),
            Stage::Square => stretch::square(&image),
            Stage::Asinh { a } => stretch::asinh(&image, a),
            Stage::GaussianBlur { kernel_size } => filter::gaussian_blur(&image, kernel_size),
            Stage::MedianBlur { kernel_size } => filter::median_blur(&image, kernel_size),
            Stage::Bilateral {
                diameter,
                sigma_color,
                sigma_space,
            } => filter::bilateral(&image, diameter, sigma_color, sigma_space),
            Stage::Threshold { value } => threshold::binary(&image, value),
            Stage::AdaptiveThreshold {
                block_size,
                constant,
            } => threshold::adaptive_mean(&image, block_size, constant),
            Stage::CenterCrop { factor } => geometry::center_crop(&image, factor),
        };
        // Extreme finite inputs can still overflow inside a filter.
        normalize::sanitize(&output)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::MinMaxNormalize => write!(f, "min_max_normalize"),
            Stage::AdaptiveNormalize => write!(f, "adaptive_normalize"),
            Stage::Log { a } => write!(f, "log({})", a),
            Stage::Sqrt => write!(f, "sqrt"),
            Stage::Power { exponent } => write!(f, "power({})", exponent),
            Stage::Square => write!(f, "square"),
            Stage::Asinh { a } => write!(f, "asinh({})", a),
            Stage::GaussianBlur { kernel_size } => write!(f, "gaussian_blur({})", kernel_size),
            Stage::MedianBlur { kernel_size } => write!(f, "median_blur({})", kernel_size),
            Stage::Bilateral {
                diameter,
                sigma_color,
                sigma_space,
            } => write!(f, "bilateral({}, {}, {})", diameter, sigma_color, sigma_space),
            Stage::Threshold { value } => write!(f, "threshold({})", value),
            Stage::AdaptiveThreshold {
                block_size,
                constant,
            } => write!(f, "adaptive_threshold({}, {})", block_size, constant),
            Stage::CenterCrop { factor } => write!(f, "center_crop({})", factor),
        }
    }
}

// ============================================================================
// Transform
// ============================================================================

type PlaneFn = dyn Fn(&Plane) -> Plane + Send + Sync;

#[derive(Clone)]
enum Step {
    Stage(Stage),
    Custom { name: String, func: Arc<PlaneFn> },
}

impl Step {
    fn apply(&self, image: &Plane) -> Plane {
        match self {
            Step::Stage(stage) => stage.apply(image),
            Step::Custom { func, .. } => normalize::sanitize(&func(&normalize::sanitize(image))),
        }
    }

    fn name(&self) -> String {
        match self {
            Step::Stage(stage) => stage.to_string(),
            Step::Custom { name, .. } => name.clone(),
        }
    }
}

/// An ordered chain of stages; itself a pure plane-to-plane function.
#[derive(Clone, Default)]
pub struct Transform {
    steps: Vec<Step>,
}

impl Transform {
    /// The empty chain. Returns its input unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Wraps a caller-provided pure function as a single step.
    ///
    /// The function sees sanitised input and its output is sanitised too.
    pub fn from_fn(
        name: impl Into<String>,
        func: impl Fn(&Plane) -> Plane + Send + Sync + 'static,
    ) -> Self {
        Self {
            steps: vec![Step::Custom {
                name: name.into(),
                func: Arc::new(func),
            }],
        }
    }

    /// Appends `next` after this chain.
    pub fn then(mut self, next: impl Into<Transform>) -> Self {
        self.steps.extend(next.into().steps);
        self
    }

    pub fn apply(&self, image: &Plane) -> Plane {
        let Some((first, rest)) = self.steps.split_first() else {
            return image.clone();
        };
        rest.iter()
            .fold(first.apply(image), |current, step| step.apply(&current))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// Stage names joined by `->`.
    pub fn describe(&self) -> String {
        if self.steps.is_empty() {
            return "identity".to_string();
        }
        self.steps
            .iter()
            .map(Step::name)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transform").field(&self.describe()).finish()
    }
}

impl From<Stage> for Transform {
    fn from(stage: Stage) -> Self {
        Self {
            steps: vec![Step::Stage(stage)],
        }
    }
}

impl FromIterator<Stage> for Transform {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().map(Step::Stage).collect(),
        }
    }
}

/// Chains `transforms` in order: the result applies the first, then the second, and so on.
pub fn compose<T, I>(transforms: I) -> Transform
where
    T: Into<Transform>,
    I: IntoIterator<Item = T>,
{
    transforms
        .into_iter()
        .fold(Transform::identity(), |acc, next| acc.then(next))
}

// ============================================================================
// Stage constructors with reference parameters
// ============================================================================

pub fn min_max_normalize() -> Stage {
    Stage::MinMaxNormalize
}

pub fn adaptive_normalize() -> Stage {
    Stage::AdaptiveNormalize
}

pub fn log_stretch() -> Stage {
    Stage::Log { a: DEFAULT_LOG_A }
}

pub fn sqrt_stretch() -> Stage {
    Stage::Sqrt
}

pub fn power_stretch(exponent: f32) -> Stage {
    Stage::Power { exponent }
}

pub fn square_stretch() -> Stage {
    Stage::Square
}

pub fn asinh_stretch() -> Stage {
    Stage::Asinh { a: DEFAULT_ASINH_A }
}

pub fn gaussian_blur(kernel_size: usize) -> Stage {
    Stage::GaussianBlur { kernel_size }
}

pub fn median_blur(kernel_size: usize) -> Stage {
    Stage::MedianBlur { kernel_size }
}

/// Bilateral filter with a 9 pixel window and sigmas of 75.
pub fn bilateral_filter() -> Stage {
    Stage::Bilateral {
        diameter: 9,
        sigma_color: 75.0,
        sigma_space: 75.0,
    }
}

pub fn threshold(value: f32) -> Stage {
    Stage::Threshold { value }
}

pub fn adaptive_threshold(block_size: usize, constant: f32) -> Stage {
    Stage::AdaptiveThreshold {
        block_size,
        constant,
    }
}

pub fn center_crop(factor: f32) -> Stage {
    Stage::CenterCrop { factor }
}
