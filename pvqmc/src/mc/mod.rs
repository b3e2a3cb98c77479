//! Sub-pixel motion-compensated prediction.
//!
//! Luma vectors are in quarter-pel units, chroma vectors in eighth-pel units.
//! A kernel set (scalar or lanes) is chosen once when the [`InterPredictor`]
//! is built; both produce byte-identical output.

use tracing::debug;

use crate::config::{Accel, CodecConfig, LumaFilter, MvResolution};
use crate::error::Result;

pub mod accel;
pub mod lanes;
pub mod scalar;
pub mod taps;

pub use accel::LaneKernels;
pub use scalar::ScalarKernels;

pub static SCALAR_KERNELS: ScalarKernels = ScalarKernels;
pub static LANE_KERNELS: LaneKernels = LaneKernels;

/// Components are limited to the 16-bit range the bitstream can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionVector {
    pub x: i32,
    pub y: i32,
}

/// A vector split into a whole-pixel displacement and a filter phase per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpelOffset {
    pub int_x: i32,
    pub int_y: i32,
    pub frac_x: usize,
    pub frac_y: usize,
}

impl SubpelOffset {
    pub fn is_full_pel(&self) -> bool {
        self.frac_x == 0 && self.frac_y == 0
    }
}

impl MotionVector {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn split(self, bits: u32) -> SubpelOffset {
        assert!(
            i16::try_from(self.x).is_ok() && i16::try_from(self.y).is_ok(),
            "motion vector {self:?} outside the 16-bit range"
        );
        let mask = (1 << bits) - 1;
        SubpelOffset {
            int_x: self.x >> bits,
            int_y: self.y >> bits,
            frac_x: (self.x & mask) as usize,
            frac_y: (self.y & mask) as usize,
        }
    }

    /// Decomposes a quarter-pel luma vector.
    pub fn luma(self) -> SubpelOffset {
        self.split(2)
    }

    /// Decomposes an eighth-pel chroma vector.
    pub fn chroma(self) -> SubpelOffset {
        self.split(3)
    }

    /// Rounds a quarter-pel luma vector to the nearest multiple of `res`.
    pub fn round_to(self, res: MvResolution) -> Self {
        let step = luma_step(res);
        let round = |v: i32| (v + step / 2).div_euclid(step) * step;
        Self {
            x: round(self.x),
            y: round(self.y),
        }
    }
}

/// `res` in quarter-pel units. Luma has no eighth-pel phases.
fn luma_step(res: MvResolution) -> i32 {
    i32::max(1, res.step_eighths() / 2)
}

/// Read-only view of a reference plane, positioned at an origin pixel.
///
/// Kernels address pixels relative to the origin, including the negative
/// offsets a filter support needs. Reads that fall outside the backing slice
/// panic; callers supply a plane padded by at least the filter reach.
#[derive(Debug, Clone, Copy)]
pub struct PlaneRef<'a> {
    data: &'a [u8],
    stride: isize,
    origin: isize,
}

impl<'a> PlaneRef<'a> {
    pub fn new(data: &'a [u8], stride: usize, x: usize, y: usize) -> Self {
        assert!(stride > 0, "zero plane stride");
        Self {
            data,
            stride: stride as isize,
            origin: (y * stride + x) as isize,
        }
    }

    /// The same plane with its origin moved by (dx, dy).
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            origin: self.origin + dy as isize * self.stride + dx as isize,
            ..self
        }
    }

    /// Views the plane upside down: row `y` of the result is row
    /// `height - y` of `self`.
    pub(crate) fn flipped(self, height: usize) -> Self {
        Self {
            origin: self.origin + height as isize * self.stride,
            stride: -self.stride,
            ..self
        }
    }

    #[inline]
    pub fn at(&self, x: i32, y: i32) -> u8 {
        self.row(x, y, 1)[0]
    }

    /// `len` pixels of row `y` starting at column `x`, with a single bounds check.
    #[inline]
    pub fn row(&self, x: i32, y: i32, len: usize) -> &'a [u8] {
        let start = self.origin + y as isize * self.stride + x as isize;
        assert!(start >= 0, "reference read before the start of the plane");
        &self.data[start as usize..start as usize + len]
    }
}

/// Geometry and filter phase of one interpolation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subpel {
    pub width: usize,
    pub height: usize,
    pub frac_x: usize,
    pub frac_y: usize,
}

/// Intermediate buffers for the separable filters, sized once for the
/// largest block a caller will predict. Not shared between threads.
#[derive(Debug, Clone)]
pub struct McScratch {
    max_block: usize,
    pub(crate) wide: Vec<i32>,
    pub(crate) narrow: Vec<i16>,
}

impl McScratch {
    pub fn new(max_block: usize) -> Self {
        let side = max_block + 8;
        Self {
            max_block,
            wide: vec![0; side * side],
            narrow: vec![0; side * side],
        }
    }

    pub fn max_block(&self) -> usize {
        self.max_block
    }
}

/// A complete set of interpolation kernels. The full-pel case is handled by
/// the caller, so at least one phase is non-zero.
pub trait SubpelKernels: Sync {
    fn name(&self) -> &'static str;

    fn luma(
        &self,
        filter: LumaFilter,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        job: Subpel,
        scratch: &mut McScratch,
    );

    fn chroma(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        job: Subpel,
        scratch: &mut McScratch,
    );
}

pub fn kernels_for(accel: Accel) -> &'static dyn SubpelKernels {
    match accel.resolve() {
        Accel::Lanes => &LANE_KERNELS,
        _ => &SCALAR_KERNELS,
    }
}

pub struct InterPredictor {
    kernels: &'static dyn SubpelKernels,
    luma_filter: LumaFilter,
    max_block: usize,
    mv_res_min: MvResolution,
}

impl std::fmt::Debug for InterPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterPredictor")
            .field("kernels", &self.kernels.name())
            .field("luma_filter", &self.luma_filter)
            .field("max_block", &self.max_block)
            .field("mv_res_min", &self.mv_res_min)
            .finish()
    }
}

impl InterPredictor {
    pub fn new(config: &CodecConfig) -> Result<Self> {
        config.validate()?;
        let kernels = kernels_for(config.accel);
        debug!(
            kernels = kernels.name(),
            luma_filter = ?config.luma_filter,
            max_block = config.max_block,
            "inter predictor ready"
        );
        Ok(Self {
            kernels,
            luma_filter: config.luma_filter,
            max_block: config.max_block,
            mv_res_min: config.mv_res_min,
        })
    }

    pub fn kernels_name(&self) -> &'static str {
        self.kernels.name()
    }

    pub fn luma_filter(&self) -> LumaFilter {
        self.luma_filter
    }

    /// A scratch arena large enough for any block this predictor accepts.
    pub fn scratch(&self) -> McScratch {
        McScratch::new(self.max_block)
    }

    /// Fills the `width` x `height` block at `dst` with the luma prediction
    /// from `src` displaced by the quarter-pel vector `mv`.
    #[allow(clippy::too_many_arguments)]
    pub fn predict_luma(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        width: usize,
        height: usize,
        mv: MotionVector,
        scratch: &mut McScratch,
    ) {
        self.check_geometry(width, height, 4, dst_stride, scratch);
        assert_eq!(
            mv.round_to(self.mv_res_min),
            mv,
            "vector finer than the configured resolution"
        );
        let off = mv.luma();
        let src = src.offset(off.int_x, off.int_y);
        if off.is_full_pel() {
            copy_block(dst, dst_stride, src, width, height);
            return;
        }
        let job = Subpel {
            width,
            height,
            frac_x: off.frac_x,
            frac_y: off.frac_y,
        };
        self.kernels
            .luma(self.luma_filter, dst, dst_stride, src, job, scratch);
    }

    /// Chroma counterpart of [`predict_luma`](Self::predict_luma) with an
    /// eighth-pel vector.
    #[allow(clippy::too_many_arguments)]
    pub fn predict_chroma(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        width: usize,
        height: usize,
        mv: MotionVector,
        scratch: &mut McScratch,
    ) {
        self.check_geometry(width, height, 2, dst_stride, scratch);
        let off = mv.chroma();
        let src = src.offset(off.int_x, off.int_y);
        if off.is_full_pel() {
            copy_block(dst, dst_stride, src, width, height);
            return;
        }
        let job = Subpel {
            width,
            height,
            frac_x: off.frac_x,
            frac_y: off.frac_y,
        };
        self.kernels.chroma(dst, dst_stride, src, job, scratch);
    }

    fn check_geometry(
        &self,
        width: usize,
        height: usize,
        min_width: usize,
        dst_stride: usize,
        scratch: &McScratch,
    ) {
        assert!(
            width.is_power_of_two() && (min_width..=self.max_block).contains(&width),
            "unsupported block width {width}"
        );
        assert!(
            height.is_power_of_two() && (2..=self.max_block).contains(&height),
            "unsupported block height {height}"
        );
        assert!(dst_stride >= width, "destination stride narrower than block");
        assert!(
            scratch.max_block >= self.max_block,
            "scratch arena smaller than the predictor's block bound"
        );
    }
}

fn copy_block(dst: &mut [u8], dst_stride: usize, src: PlaneRef<'_>, width: usize, height: usize) {
    for y in 0..height {
        dst[y * dst_stride..y * dst_stride + width].copy_from_slice(src.row(0, y as i32, width));
    }
}
