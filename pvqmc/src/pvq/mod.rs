//! Gain-shape (pyramid vector) quantization of transform coefficient bands.
//!
//! A band is coded as a companded gain, an optional angle `theta` against a
//! predictor and a pulse vector of fixed L1 norm `k`. Everything in this
//! module is shared by the encoder and the decoder: both sides must derive
//! the same `max_theta`, `theta` and `k` from the same coded values.

use std::f64::consts::PI;

use crate::householder::{Reflection, apply_householder};
use crate::qm::NBSIZES;

pub mod decoder;
pub mod encoder;
pub mod search;

pub use decoder::{decode_block, dequantize_band};
pub use encoder::{BandParams, BlockCode, BlockParams, encode_block, quantize_band};

pub const COEFF_SHIFT: u32 = 4;
pub const COMPAND_SCALE: f64 = (256 << COEFF_SHIFT) as f64;
pub const COMPAND_SCALE_1: f64 = 1.0 / COMPAND_SCALE;

/// Normalized lambda. Gains are normalized by the quantizer, so distortion is
/// already in units of q^2.
pub const PVQ_LAMBDA: f64 = 0.147;

pub const NPLANES_MAX: usize = 3;
pub const PVQ_MAX_PARTITIONS: usize = 1 + 3 * (NBSIZES - 1);

/// Largest band: half the coefficients of a 32x32 block.
pub const MAXN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PvqSkip {
    /// The band quantizes to zero.
    Zero = 1,
    /// The band is a verbatim copy of the predictor.
    Copy = 2,
}

/// What the entropy coder receives for one band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandCode {
    pub skip: Option<PvqSkip>,
    pub noref: bool,
    /// `qg` when `noref`, otherwise `qg` interleaved around the predictor gain.
    pub gain: i32,
    /// -1 when `noref`.
    pub itheta: i32,
    pub max_theta: i32,
    pub k: i32,
    pub pulses: Vec<i32>,
}

impl BandCode {
    pub(crate) fn skipped(skip: PvqSkip) -> Self {
        Self {
            skip: Some(skip),
            noref: skip == PvqSkip::Zero,
            gain: 0,
            itheta: if skip == PvqSkip::Zero { -1 } else { 0 },
            max_theta: 0,
            k: 0,
            pulses: Vec::new(),
        }
    }
}

#[rustfmt::skip]
const BAND_OFFSETS_4: [usize; 2] = [1, 16];
#[rustfmt::skip]
const BAND_OFFSETS_8: [usize; 5] = [1, 16, 24, 32, 64];
#[rustfmt::skip]
const BAND_OFFSETS_16: [usize; 8] = [1, 16, 24, 32, 64, 96, 128, 256];
#[rustfmt::skip]
const BAND_OFFSETS_32: [usize; 11] = [1, 16, 24, 32, 64, 96, 128, 256, 384, 512, 1024];

/// Band boundaries of a `4 << bs` block in band (scan) order. Coefficient 0
/// is DC and is not part of any band.
pub fn band_offsets(bs: usize) -> &'static [usize] {
    match bs {
        0 => &BAND_OFFSETS_4,
        1 => &BAND_OFFSETS_8,
        2 => &BAND_OFFSETS_16,
        3 => &BAND_OFFSETS_32,
        _ => panic!("unsupported block size index {bs}"),
    }
}

const BETA4_FLAT: [f64; 1] = [1.0];
const BETA8_FLAT: [f64; 4] = [1.0; 4];
const BETA16_FLAT: [f64; 7] = [1.0; 7];
const BETA32_FLAT: [f64; 10] = [1.0; 10];

const BETA4_MASKING: [f64; 1] = [1.5];
const BETA8_MASKING: [f64; 4] = [1.5; 4];
const BETA16_MASKING: [f64; 7] = [1.5; 7];
const BETA32_MASKING: [f64; 10] = [1.5; 10];

const BETA_FLAT: [&[f64]; NBSIZES] = [&BETA4_FLAT, &BETA8_FLAT, &BETA16_FLAT, &BETA32_FLAT];
const BETA_MASKING: [&[f64]; NBSIZES] = [
    &BETA4_MASKING,
    &BETA8_MASKING,
    &BETA16_MASKING,
    &BETA32_MASKING,
];

/// Per-band shape parameter, indexed [intra][plane][block size].
pub static PVQ_BETA: [[[&[f64]; NBSIZES]; NPLANES_MAX]; 2] = [
    [BETA_FLAT, BETA_FLAT, BETA_FLAT],
    [BETA_MASKING, BETA_FLAT, BETA_FLAT],
];

pub fn beta(intra: bool, plane: usize, bs: usize, band: usize) -> f64 {
    assert!(plane < NPLANES_MAX, "plane {plane} out of range");
    assert!(bs < NBSIZES, "unsupported block size index {bs}");
    PVQ_BETA[intra as usize][plane][bs][band]
}

/// Raises the normalized gain to the power 1/beta.
pub fn gain_compand(g: f64, q0: i32, beta: f64) -> f64 {
    if beta == 1.0 {
        g / q0 as f64
    } else {
        COMPAND_SCALE * (g * COMPAND_SCALE_1).powf(1.0 / beta) / q0 as f64
    }
}

/// Inverse of [`gain_compand`].
pub fn gain_expand(cg: f64, q0: i32, beta: f64) -> f64 {
    if beta == 1.0 {
        cg * q0 as f64
    } else if beta == 1.5 {
        let c = cg * q0 as f64 * COMPAND_SCALE_1;
        COMPAND_SCALE * c * c.sqrt()
    } else {
        COMPAND_SCALE * (cg * q0 as f64 * COMPAND_SCALE_1).powf(beta)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain {
    pub raw: f64,
    pub companded: f64,
}

pub fn compute_gain(x: &[i32], q0: i32, beta: f64) -> Gain {
    let mut acc = 0.0;
    for &v in x {
        acc += v as f64 * v as f64;
    }
    let raw = acc.sqrt();
    Gain {
        raw,
        companded: gain_compand(raw, q0, beta),
    }
}

/// Number of angle steps available at quantized companded gain `qcg`.
pub fn compute_max_theta(qcg: f64, beta: f64) -> i32 {
    if qcg < 1.4 {
        return 1;
    }
    (0.5 + qcg * PI / 2.0 / beta).floor() as i32
}

/// Angle (radians) of theta index `t`.
pub fn compute_theta(t: i32, max_theta: i32) -> f64 {
    assert!(
        (0..=max_theta).contains(&t),
        "theta index {t} outside 0..={max_theta}"
    );
    if max_theta != 0 {
        t.min(max_theta - 1) as f64 * 0.5 * PI / max_theta as f64
    } else {
        0.0
    }
}

/// Pulse budget for a band. `nodesync` derives it from the theta index only,
/// so a decoder that lost the exact gain still parses the same number of pulses.
pub fn compute_k(
    qcg: f64,
    itheta: i32,
    theta: f64,
    noref: bool,
    n: usize,
    beta: f64,
    nodesync: bool,
) -> i32 {
    if noref {
        if qcg == 0.0 {
            return 0;
        }
        if n == 15 && qcg == 1.0 && beta > 1.25 {
            return 1;
        }
        let dims = ((n + 3) / 2) as f64;
        i32::max(1, (0.5 + (qcg - 0.2) * dims.sqrt() / beta).floor() as i32)
    } else {
        if itheta == 0 {
            return 0;
        }
        let dims = ((n + 2) / 2) as f64;
        if nodesync {
            i32::max(1, (0.5 + (itheta as f64 - 0.2) * dims.sqrt()).floor() as i32)
        } else {
            i32::max(1, (0.5 + (qcg * theta.sin() - 0.2) * dims.sqrt() / beta).floor() as i32)
        }
    }
}

/// Rebuilds a band from its gain, angle and pulses. `r` is the reflection
/// vector of the predictor (ignored when `noref`), and `pulses` has `n - 1`
/// entries in reference mode, `n` otherwise.
pub fn synthesis_partial(
    out: &mut [i32],
    pulses: &[i32],
    r: &[f64],
    noref: bool,
    g: f64,
    theta: f64,
    refl: Reflection,
) {
    assert!(g != 0.0, "synthesis of a zero gain band");
    let n = out.len();
    let nn = if noref { n } else { n - 1 };
    assert_eq!(pulses.len(), nn, "pulse vector length mismatch");

    let mut yy = 0i64;
    for &p in pulses {
        yy += p as i64 * p as i64;
    }
    let mut scale = if yy == 0 { 0.0 } else { g / (yy as f64).sqrt() };

    if noref {
        for (o, &p) in out.iter_mut().zip(pulses.iter()) {
            *o = (0.5 + p as f64 * scale).floor() as i32;
        }
        return;
    }

    assert_eq!(r.len(), n, "reflection length mismatch");
    scale *= theta.sin();
    let m = refl.axis;
    let mut x = vec![0.0f64; n];
    for i in 0..m {
        x[i] = pulses[i] as f64 * scale;
    }
    x[m] = -(refl.sign as f64) * g * theta.cos();
    for i in m..nn {
        x[i + 1] = pulses[i] as f64 * scale;
    }
    apply_householder(&mut x, r);
    for (o, &v) in out.iter_mut().zip(x.iter()) {
        *o = (0.5 + v).floor() as i32;
    }
}

pub fn vector_is_null(x: &[i32]) -> bool {
    x.iter().all(|&v| v == 0)
}

/// Maps `x` to a non-negative code that is small when `x` is close to `reference`.
pub fn neg_interleave(x: i32, reference: i32) -> i32 {
    if x < reference {
        2 * (reference - x) - 1
    } else if x < 2 * reference {
        2 * (x - reference)
    } else {
        x
    }
}

pub fn neg_deinterleave(code: i32, reference: i32) -> i32 {
    if code < 2 * reference {
        if code & 1 == 1 {
            reference - (code + 1) / 2
        } else {
            reference + code / 2
        }
    } else {
        code
    }
}
