//! Dicing and tessellation options.

use std::ops::BitOr;

use nalgebra::{Matrix4, Vector3};

use crate::algo::subdivide::MAX_SUBDIVISION_LEVEL;
use crate::error::{Result, SubdivError};

/// Standard variables a shader needs on a diced grid or bicubic patch.
///
/// Variables missing from the mesh are synthesised when requested: colour
/// and opacity from [`DiceOptions`], `s`/`t` from object-space x/y, `u`/`v`
/// from the parametric position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uses(u32);

impl Uses {
    /// Position.
    pub const P: Uses = Uses(1);
    /// First texture coordinate.
    pub const S: Uses = Uses(1 << 1);
    /// Second texture coordinate.
    pub const T: Uses = Uses(1 << 2);
    /// First surface parameter.
    pub const U: Uses = Uses(1 << 3);
    /// Second surface parameter.
    pub const V: Uses = Uses(1 << 4);
    /// Surface colour.
    pub const CS: Uses = Uses(1 << 5);
    /// Surface opacity.
    pub const OS: Uses = Uses(1 << 6);

    /// No variables.
    pub const fn none() -> Self {
        Uses(0)
    }

    /// Every standard variable.
    pub const fn all() -> Self {
        Uses(0x7f)
    }

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Uses) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any texture or surface parameter is requested.
    pub const fn any_parametric(self) -> bool {
        self.0 & (Self::S.0 | Self::T.0 | Self::U.0 | Self::V.0) != 0
    }
}

impl BitOr for Uses {
    type Output = Uses;

    fn bitor(self, rhs: Uses) -> Uses {
        Uses(self.0 | rhs.0)
    }
}

impl Default for Uses {
    fn default() -> Self {
        Self::all()
    }
}

/// Options for [`diceable`](super::SubdivisionPatch::diceable) and
/// [`dice`](super::SubdivisionPatch::dice).
#[derive(Debug, Clone, PartialEq)]
pub struct DiceOptions {
    /// Object-to-raster transform used to estimate screen extents.
    pub raster_transform: Matrix4<f64>,

    /// Target area of one micropolygon, in square pixels (default: 1.0).
    pub shading_rate: f64,

    /// Largest grid edge, in micropolygons (default: 16). Patches that
    /// need more are split instead.
    pub sqrt_grid_size: u32,

    /// Standard variables to produce.
    pub uses: Uses,

    /// Colour used when the mesh has no `Cs` (default: white).
    pub color: Option<Vector3<f64>>,

    /// Opacity used when the mesh has no `Os` (default: opaque).
    pub opacity: Option<Vector3<f64>>,

    /// Whether to gather time samples in parallel (default: true).
    pub parallel: bool,
}

impl Default for DiceOptions {
    fn default() -> Self {
        Self {
            raster_transform: Matrix4::identity(),
            shading_rate: 1.0,
            sqrt_grid_size: 16,
            uses: Uses::default(),
            color: None,
            opacity: None,
            parallel: true,
        }
    }
}

impl DiceOptions {
    /// Create options for the given object-to-raster transform.
    pub fn new(raster_transform: Matrix4<f64>) -> Self {
        Self {
            raster_transform,
            ..Default::default()
        }
    }

    /// Set the shading rate.
    pub fn with_shading_rate(mut self, rate: f64) -> Self {
        self.shading_rate = rate;
        self
    }

    /// Set the grid size cap.
    pub fn with_sqrt_grid_size(mut self, size: u32) -> Self {
        self.sqrt_grid_size = size;
        self
    }

    /// Set the requested standard variables.
    pub fn with_uses(mut self, uses: Uses) -> Self {
        self.uses = uses;
        self
    }

    /// Set the fallback colour.
    pub fn with_color(mut self, color: Vector3<f64>) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the fallback opacity.
    pub fn with_opacity(mut self, opacity: Vector3<f64>) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Reject option values no patch can work with.
    pub fn validate(&self) -> Result<()> {
        if !self.shading_rate.is_finite() || self.shading_rate <= 0.0 {
            return Err(SubdivError::invalid_param(
                "shading_rate",
                self.shading_rate,
                "must be finite and positive",
            ));
        }
        if self.sqrt_grid_size < 2 {
            return Err(SubdivError::invalid_param(
                "sqrt_grid_size",
                self.sqrt_grid_size,
                "must be at least 2",
            ));
        }
        if self.dice_depth() > MAX_SUBDIVISION_LEVEL {
            return Err(SubdivError::invalid_param(
                "sqrt_grid_size",
                self.sqrt_grid_size,
                "needs more refinement levels than a facet supports",
            ));
        }
        Ok(())
    }

    /// Refinement levels a grid at the size cap consumes.
    pub fn dice_depth(&self) -> u32 {
        self.sqrt_grid_size.max(2).ilog2()
    }
}

/// Options for [`tessellate`](super::tessellate).
#[derive(Debug, Clone, PartialEq)]
pub struct TessellateOptions {
    /// Options passed to every patch.
    pub dice: DiceOptions,

    /// Number of split generations after which remaining quads are diced at
    /// the grid size cap (default: 8).
    pub max_depth: u32,
}

impl Default for TessellateOptions {
    fn default() -> Self {
        Self {
            dice: DiceOptions::default(),
            max_depth: 8,
        }
    }
}

impl TessellateOptions {
    /// Create options with the given dice options.
    pub fn new(dice: DiceOptions) -> Self {
        Self {
            dice,
            ..Default::default()
        }
    }

    /// Set the maximum number of split generations.
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// The generation at which quads are force-diced.
    ///
    /// `max_depth`, lowered so that a forced grid at the size cap still fits
    /// under [`MAX_SUBDIVISION_LEVEL`].
    pub fn split_depth(&self) -> u32 {
        self.max_depth
            .min(MAX_SUBDIVISION_LEVEL.saturating_sub(self.dice.dice_depth()))
    }
}
