//! Lane kernels. Each routine restructures the reference filters around
//! 16-bit lanes and produces the same bytes as the scalar kernels.
//!
//! Luma is split by phase: the half/half center kernel, edge kernels (one
//! phase zero) and inner kernels (both phases non-zero). The 3/4 vertical
//! phase is the mirror image of the 1/4 phase, so it runs the 1/4 kernel on a
//! vertically flipped view and writes rows bottom-up.

use super::lanes::{I16x8, I32x8, LANES, store_u8};
use super::scalar::ScalarKernels;
use super::taps::{
    CENTER_SHIFT, CHROMA_4TAP, CHROMA_SHIFT, LUMA_6TAP, LUMA_6TAP_SHIFT, LUMA_8TAP,
    LUMA_8TAP_SHIFT,
};
use super::{McScratch, PlaneRef, Subpel, SubpelKernels};
use crate::config::LumaFilter;

/// Destination rows in output order, optionally bottom-up.
struct RowMap {
    height: usize,
    stride: usize,
    flip: bool,
}

impl RowMap {
    #[inline]
    fn offset(&self, y: usize) -> usize {
        let row = if self.flip { self.height - 1 - y } else { y };
        row * self.stride
    }
}

fn luma_center(dst: &mut [u8], dst_stride: usize, src: PlaneRef<'_>, job: Subpel) {
    let round = I16x8::splat(1 << (CENTER_SHIFT - 1));
    for y in 0..job.height {
        let yi = y as i32;
        for x0 in (0..job.width).step_by(LANES) {
            let n = LANES.min(job.width - x0);
            let ld = |dx: i32, dy: i32| I16x8::load_u8(&src, x0 as i32 + dx, yi + dy, n);
            let mut r = ld(0, -1) + ld(1, -1);
            r = r + ld(-1, 0) + ld(-1, 1);
            r = r + ld(2, 1) + ld(0, 2);
            r = r + ld(1, 2) + ld(2, 0);
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let s = ld(dx, dy);
                r = r + s + s;
            }
            let r = (r + round) >> CENTER_SHIFT;
            store_u8(dst, y * dst_stride + x0, r.pack_u8(), n);
        }
    }
}

/// One phase is zero. With the center tap reduced by 128 the 16-bit sum stays
/// small, and the center pixel is added back after the shift.
fn luma_edge(dst: &mut [u8], rows: &RowMap, src: PlaneRef<'_>, job: Subpel) {
    let (phase, sx, sy) = if job.frac_y == 0 {
        (job.frac_x, 1, 0)
    } else {
        (job.frac_y, 0, 1)
    };
    let mut coeffs = [I16x8::ZERO; 6];
    for (c, &t) in coeffs.iter_mut().zip(LUMA_6TAP[phase].iter()) {
        *c = I16x8::splat(t as i16);
    }
    coeffs[2] = I16x8::splat(LUMA_6TAP[phase][2] as i16 - 128);
    let half = I16x8::splat(64);

    for y in 0..job.height {
        let yi = y as i32;
        for x0 in (0..job.width).step_by(LANES) {
            let n = LANES.min(job.width - x0);
            let xi = x0 as i32;
            let center = I16x8::load_u8(&src, xi, yi, n);
            let mut rs = half;
            for (t, &c) in coeffs.iter().enumerate() {
                let o = t as i32 - 2;
                let p = if o == 0 {
                    center
                } else {
                    I16x8::load_u8(&src, xi + o * sx, yi + o * sy, n)
                };
                rs = rs + c * p;
            }
            let rs = (rs >> 7) + center;
            store_u8(dst, rows.offset(y) + x0, rs.pack_u8(), n);
        }
    }
}

/// Both phases non-zero. The vertical pass keeps the center tap reduced by
/// 128 so it fits 16-bit lanes; the horizontal pass adds the source row back
/// at full weight.
fn luma_inner(dst: &mut [u8], rows: &RowMap, src: PlaneRef<'_>, job: Subpel, ax: &mut [i16]) {
    let mut cv = [I16x8::ZERO; 6];
    for (c, &t) in cv.iter_mut().zip(LUMA_6TAP[job.frac_y].iter()) {
        *c = I16x8::splat(t as i16);
    }
    cv[2] = I16x8::splat(LUMA_6TAP[job.frac_y][2] as i16 - 128);
    let ch = LUMA_6TAP[job.frac_x].map(I32x8::splat);

    // Columns -2..width+2 feed the horizontal taps; the row is padded with
    // zeros so every output can read a full register.
    let needed = job.width + 5;
    let span = job.width + LANES;
    let round = I32x8::splat(1 << (LUMA_6TAP_SHIFT - 1));

    for y in 0..job.height {
        let yi = y as i32;
        let a = &mut ax[y * span..(y + 1) * span];
        a.fill(0);
        for i0 in (0..needed).step_by(LANES) {
            let n = LANES.min(needed - i0);
            let xi = i0 as i32 - 2;
            let mut acc = I16x8::ZERO;
            for (t, &c) in cv.iter().enumerate() {
                acc = acc + c * I16x8::load_u8(&src, xi, yi + t as i32 - 2, n);
            }
            a[i0..i0 + n].copy_from_slice(&acc.0[..n]);
        }

        let row = src.row(-2, yi, needed);
        let a = &ax[y * span..y * span + needed];
        for x0 in (0..job.width).step_by(LANES) {
            let n = LANES.min(job.width - x0);
            let mut res = I32x8::ZERO;
            for (t, &c) in ch.iter().enumerate() {
                let hi = (x0 + t + LANES).min(needed);
                let filtered = I16x8::from_slice(&a[x0 + t..hi]).widen();
                let center = I16x8::from_u8(&row[x0 + t..hi]).widen();
                res = res + (filtered + center * I32x8::splat(128)) * c;
            }
            let out = ((res + round) >> LUMA_6TAP_SHIFT).pack_i16();
            store_u8(dst, rows.offset(y) + x0, out.pack_u8(), n);
        }
    }
}

fn luma_6tap(dst: &mut [u8], dst_stride: usize, src: PlaneRef<'_>, job: Subpel, ax: &mut [i16]) {
    if job.frac_x == 2 && job.frac_y == 2 {
        luma_center(dst, dst_stride, src, job);
        return;
    }
    let mut rows = RowMap {
        height: job.height,
        stride: dst_stride,
        flip: false,
    };
    let mut src = src;
    let mut job = job;
    if job.frac_y == 3 {
        src = src.flipped(job.height);
        rows.flip = true;
        job.frac_y = 1;
    }
    if job.frac_x == 0 || job.frac_y == 0 {
        luma_edge(dst, &rows, src, job);
    } else {
        luma_inner(dst, &rows, src, job, ax);
    }
}

/// HEVC filter: vertical pass in 16-bit lanes, horizontal pass in 32-bit lanes.
fn luma_8tap(dst: &mut [u8], dst_stride: usize, src: PlaneRef<'_>, job: Subpel, ax: &mut [i16]) {
    let cv = LUMA_8TAP[job.frac_y].map(|t| I16x8::splat(t as i16));
    let ch = LUMA_8TAP[job.frac_x].map(I32x8::splat);
    let needed = job.width + 7;
    let span = job.width + LANES;
    let round = I32x8::splat(1 << (LUMA_8TAP_SHIFT - 1));

    for y in 0..job.height {
        let yi = y as i32;
        let a = &mut ax[y * span..(y + 1) * span];
        a.fill(0);
        for i0 in (0..needed).step_by(LANES) {
            let n = LANES.min(needed - i0);
            let xi = i0 as i32 - 3;
            let mut acc = I16x8::ZERO;
            for (t, &c) in cv.iter().enumerate() {
                acc = acc + c * I16x8::load_u8(&src, xi, yi + t as i32 - 3, n);
            }
            a[i0..i0 + n].copy_from_slice(&acc.0[..n]);
        }

        let a = &ax[y * span..y * span + needed];
        for x0 in (0..job.width).step_by(LANES) {
            let n = LANES.min(job.width - x0);
            let mut res = I32x8::ZERO;
            for (t, &c) in ch.iter().enumerate() {
                let hi = (x0 + t + LANES).min(needed);
                res = res + I16x8::from_slice(&a[x0 + t..hi]).widen() * c;
            }
            let out = ((res + round) >> LUMA_8TAP_SHIFT).pack_i16();
            store_u8(dst, y * dst_stride + x0, out.pack_u8(), n);
        }
    }
}

/// Chroma for widths of 4 and up: vertical pass first over a rolling window
/// of four source rows, then the horizontal pass in 32-bit lanes.
fn chroma(dst: &mut [u8], dst_stride: usize, src: PlaneRef<'_>, job: Subpel) {
    let cv = CHROMA_4TAP[job.frac_y].map(|t| I16x8::splat(t as i16));
    let ch = CHROMA_4TAP[job.frac_x].map(I32x8::splat);
    let round = I32x8::splat(1 << (CHROMA_SHIFT - 1));

    for x0 in (0..job.width).step_by(LANES) {
        let n = LANES.min(job.width - x0);
        let xi = x0 as i32 - 1;
        // Columns x0-1..x0+n+2 split over two registers.
        let lo_n = LANES.min(n + 3);
        let hi_n = (n + 3).saturating_sub(LANES);
        let load = |y: i32| {
            (
                I16x8::load_u8(&src, xi, y, lo_n),
                I16x8::load_u8(&src, xi + LANES as i32, y, hi_n),
            )
        };
        let mut window = [load(-1), load(0), load(1), (I16x8::ZERO, I16x8::ZERO)];

        for y in 0..job.height {
            window[3] = load(y as i32 + 2);
            let mut lo = I16x8::ZERO;
            let mut hi = I16x8::ZERO;
            for (c, row) in cv.iter().zip(window.iter()) {
                lo = lo + *c * row.0;
                hi = hi + *c * row.1;
            }

            let mut cols = [0i16; 2 * LANES];
            cols[..LANES].copy_from_slice(&lo.0);
            cols[LANES..].copy_from_slice(&hi.0);
            let mut res = I32x8::ZERO;
            for (t, &c) in ch.iter().enumerate() {
                res = res + I16x8::from_slice(&cols[t..t + LANES]).widen() * c;
            }
            let out = ((res + round) >> CHROMA_SHIFT).pack_i16();
            store_u8(dst, y * dst_stride + x0, out.pack_u8(), n);

            window.rotate_left(1);
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LaneKernels;

impl SubpelKernels for LaneKernels {
    fn name(&self) -> &'static str {
        "lanes"
    }

    fn luma(
        &self,
        filter: LumaFilter,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        job: Subpel,
        scratch: &mut McScratch,
    ) {
        match filter {
            LumaFilter::Thor6Tap => luma_6tap(dst, dst_stride, src, job, &mut scratch.narrow),
            LumaFilter::Hevc8Tap => luma_8tap(dst, dst_stride, src, job, &mut scratch.narrow),
        }
    }

    fn chroma(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: PlaneRef<'_>,
        job: Subpel,
        scratch: &mut McScratch,
    ) {
        // Two-pixel rows don't fill a register.
        if job.width <= 2 {
            ScalarKernels.chroma(dst, dst_stride, src, job, scratch);
        } else {
            chroma(dst, dst_stride, src, job);
        }
    }
}
