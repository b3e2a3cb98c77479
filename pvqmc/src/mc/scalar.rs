use super::taps::{
    CENTER_SHIFT, CHROMA_4TAP, CHROMA_SHIFT, LUMA_6TAP, LUMA_6TAP_SHIFT, LUMA_8TAP,
    LUMA_8TAP_SHIFT, LUMA_CENTER,
};
use super::{McScratch, PlaneRef, Subpel, SubpelKernels};
use crate::config::LumaFilter;

#[inline]
fn clip255(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

fn luma_separable<const N: usize>(
    taps: &[[i32; N]; 4],
    shift: u32,
    dst: &mut [u8],
    dst_stride: usize,
    src: PlaneRef<'_>,
    job: Subpel,
    tmp: &mut [i32],
) {
    let before = N as i32 / 2 - 1;
    let span = job.width + N - 1;
    let fv = &taps[job.frac_y];
    let fh = &taps[job.frac_x];

    for y in 0..job.height {
        let row = &mut tmp[y * span..(y + 1) * span];
        for (i, t) in row.iter_mut().enumerate() {
            let x = i as i32 - before;
            let mut sum = 0;
            for (m, &c) in fv.iter().enumerate() {
                sum += c * src.at(x, y as i32 + m as i32 - before) as i32;
            }
            *t = sum;
        }
    }

    let round = 1 << (shift - 1);
    for y in 0..job.height {
        let row = &tmp[y * span..(y + 1) * span];
        for x in 0..job.width {
            let mut sum = 0;
            for (m, &c) in fh.iter().enumerate() {
                sum += c * row[x + m];
            }
            dst[y * dst_stride + x] = clip255((sum + round) >> shift);
        }
    }
}

/// Half/half phase of the 6-tap configuration: a 4x4 low-pass kernel.
fn luma_center(dst: &mut [u8], dst_stride: usize, src: PlaneRef<'_>, job: Subpel) {
    for y in 0..job.height {
        for x in 0..job.width {
            let mut sum = 0;
            for (dy, weights) in LUMA_CENTER.iter().enumerate() {
                for (dx, &w) in weights.iter().enumerate() {
                    sum += w * src.at(x as i32 + dx as i32 - 1, y as i32 + dy as i32 - 1) as i32;
                }
            }
            dst[y * dst_stride + x] = clip255((sum + (1 << (CENTER_SHIFT - 1))) >> CENTER_SHIFT);
        }
    }
}

fn chroma(dst: &mut [u8], dst_stride: usize, src: PlaneRef<'_>, job: Subpel, tmp: &mut [i16]) {
    let fh = &CHROMA_4TAP[job.frac_x];
    let fv = &CHROMA_4TAP[job.frac_y];
    let w = job.width;

    for i in 0..job.height + 3 {
        let y = i as i32 - 1;
        for x in 0..w {
            let mut sum = 0;
            for (m, &c) in fh.iter().enumerate() {
                sum += c * src.at(x as i32 + m as i32 - 1, y) as i32;
            }
            tmp[i * w + x] = sum as i16;
        }
    }

    let round = 1 << (CHROMA_SHIFT - 1);
    for y in 0..job.height {
        for x in 0..w {
            let mut sum = 0;
            for (m, &c) in fv.iter().enumerate() {
                sum += c * tmp[(y + m) * w + x] as i32;
            }
            dst[y * dst_stride + x] = clip255((sum + round) >> CHROMA_SHIFT);
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarKernels;

impl SubpelKernels for ScalarKernels {
    fn name(&self) -> &'static str {
        "scalar"
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
            LumaFilter::Thor6Tap if job.frac_x == 2 && job.frac_y == 2 => {
                luma_center(dst, dst_stride, src, job)
            }
            LumaFilter::Thor6Tap => luma_separable(
                &LUMA_6TAP,
                LUMA_6TAP_SHIFT,
                dst,
                dst_stride,
                src,
                job,
                &mut scratch.wide,
            ),
            LumaFilter::Hevc8Tap => luma_separable(
                &LUMA_8TAP,
                LUMA_8TAP_SHIFT,
                dst,
                dst_stride,
                src,
                job,
                &mut scratch.wide,
            ),
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
        chroma(dst, dst_stride, src, job, &mut scratch.narrow);
    }
}
