use std::f64::consts::PI;

use tracing::trace;

use super::search::pvq_search;
use super::{
    BandCode, MAXN, PVQ_LAMBDA, PvqSkip, band_offsets, compute_gain, compute_k, compute_max_theta,
    compute_theta, gain_compand, gain_expand, neg_interleave, synthesis_partial, vector_is_null,
};
use crate::config::CodecConfig;
use crate::householder::{Reflection, apply_householder, compute_householder, l2_norm};
use crate::qm::{QM_SHIFT, band_count};

const GAIN_WEIGHT: f64 = 1.0;
const SKIP_FLAG_BITS: f64 = 1.0;
const NO_REFLECTION: Reflection = Reflection { axis: 0, sign: 1 };

/// Quantizer inputs for a single band.
#[derive(Debug, Clone, Copy)]
pub struct BandParams {
    /// Quantizer step for this band, already scaled by the band weight.
    pub q0: i32,
    pub beta: f64,
    pub intra: bool,
    pub plane: usize,
    /// Derive `k` from the theta index alone.
    pub nodesync: bool,
}

impl BandParams {
    /// Theta-only pulse budgets are forced on intra frames, which must stay
    /// decodable without any prior state.
    pub(crate) fn robust_k(&self) -> bool {
        self.nodesync || self.intra
    }
}

fn log2_binomial(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);
    let mut acc = 0.0;
    for i in 0..k {
        acc += ((n - i) as f64).ln() - ((i + 1) as f64).ln();
    }
    acc / std::f64::consts::LN_2
}

/// Approximate cost of the pulse vector: a multiset of `k` positions among
/// `n` plus one sign per occupied position.
fn pulse_bits(n: usize, k: i32) -> f64 {
    if k <= 0 {
        return 0.0;
    }
    let k = k as usize;
    log2_binomial(n + k - 1, k) + k.min(n) as f64
}

/// Exp-Golomb style length of a non-negative symbol.
fn symbol_bits(code: i32) -> f64 {
    1.0 + 2.0 * ((code + 1) as f64).log2().floor()
}

fn theta_bits(max_theta: i32) -> f64 {
    if max_theta > 1 {
        (max_theta as f64).log2()
    } else {
        0.0
    }
}

struct Candidate {
    qg: i32,
    noref: bool,
    itheta: i32,
    max_theta: i32,
    k: i32,
    qtheta: f64,
    pulses: Vec<i32>,
    dist: f64,
    cost: f64,
}

/// Quantizes the band `x0` against the optional predictor `r0` and writes
/// the decoder-identical reconstruction to `out`.
pub fn quantize_band(
    x0: &[i32],
    r0: Option<&[f64]>,
    out: &mut [i32],
    params: &BandParams,
) -> BandCode {
    let n = x0.len();
    assert!((2..=MAXN).contains(&n), "unsupported band length {n}");
    assert_eq!(out.len(), n, "output band length mismatch");
    assert!(params.q0 > 0, "quantizer must be positive");
    if let Some(r) = r0 {
        assert_eq!(r.len(), n, "predictor length mismatch");
    }
    let has_ref = r0.is_some_and(|r| r.iter().any(|&v| v != 0.0));

    if vector_is_null(x0) {
        out.fill(0);
        trace!(n, "band skipped: zero");
        return BandCode::skipped(PvqSkip::Zero);
    }
    if let Some(r) = r0.filter(|_| has_ref) {
        if x0.iter().zip(r.iter()).all(|(&a, &b)| a as f64 == b) {
            out.copy_from_slice(x0);
            trace!(n, "band skipped: copy");
            return BandCode::skipped(PvqSkip::Copy);
        }
    }

    let beta = params.beta;
    let q0 = params.q0;
    let robust = params.robust_k();
    let x: Vec<f64> = x0.iter().map(|&v| v as f64).collect();
    let r: Vec<f64> = match r0 {
        Some(r) => r.to_vec(),
        None => vec![0.0; n],
    };

    let gain = compute_gain(x0, q0, beta);
    let (g, cg) = (gain.raw, gain.companded);
    let gr = l2_norm(&r);
    let cgr = gain_compand(gr, q0, beta);
    // Offset that lets one quantized gain hit the predictor gain exactly.
    let icgr = (0.5 + cgr).floor() as i32;
    let gain_offset = cgr - icgr as f64;

    let mut corr = 0.0;
    for (&a, &b) in x.iter().zip(r.iter()) {
        corr += a * b;
    }
    let corr = (corr / (1e-100 + g * gr)).clamp(-1.0, 1.0);

    // Null case: gain 0 and no pulses.
    let mut best = Candidate {
        qg: 0,
        noref: true,
        itheta: -1,
        max_theta: 0,
        k: 0,
        qtheta: 0.0,
        pulses: Vec::new(),
        dist: GAIN_WEIGHT * cg * cg,
        cost: 0.0,
    };
    if !params.intra {
        // On inter frames a zero gain is signaled as a skip against the predictor.
        let scgr = gain_offset.max(0.0);
        if icgr == 0 {
            best.dist = GAIN_WEIGHT * (cg - scgr) * (cg - scgr) + scgr * cg * (2.0 - 2.0 * corr);
        }
        best.noref = false;
        best.itheta = 0;
    }
    best.cost = best.dist + PVQ_LAMBDA * SKIP_FLAG_BITS;

    let mut reflection: Option<(Vec<f64>, Reflection)> = None;
    if has_ref && corr > 0.0 {
        let theta = corr.acos();
        let mut rr = r.clone();
        let refl = compute_householder(&mut rr, gr);
        let mut xr = x.clone();
        apply_householder(&mut xr, &rr);
        xr.remove(refl.axis);

        let mut y_tmp = vec![0i32; n - 1];
        let mut prev_k = -1;
        let mut cos_dist = 0.0;
        let lo = i32::max(1, (cg - gain_offset).floor() as i32);
        let hi = (cg - gain_offset).ceil() as i32;
        for i in lo..=hi {
            let qcg = i as f64 + gain_offset;
            let ts = compute_max_theta(qcg, beta);
            let theta_lower = i32::max(0, (0.5 + theta * 2.0 / PI * ts as f64).floor() as i32 - 2);
            let theta_upper = (ts - 1).min((theta * 2.0 / PI * ts as f64).ceil() as i32);
            for j in theta_lower..=theta_upper {
                let qtheta = compute_theta(j, ts);
                let k = compute_k(qcg, j, qtheta, false, n, beta, robust);
                if k != prev_k {
                    cos_dist = pvq_search(
                        &xr,
                        k,
                        &mut y_tmp,
                        qcg * cg * theta.sin() * qtheta.sin(),
                    );
                    prev_k = k;
                }
                let dist_theta = 2.0 - 2.0 * (theta - qtheta).cos()
                    + theta.sin() * qtheta.sin() * (2.0 - 2.0 * cos_dist);
                let dist = GAIN_WEIGHT * (qcg - cg) * (qcg - cg) + qcg * cg * dist_theta;
                let bits = SKIP_FLAG_BITS
                    + symbol_bits(neg_interleave(i, icgr))
                    + theta_bits(ts)
                    + pulse_bits(n - 1, k);
                let cost = dist + PVQ_LAMBDA * bits;
                if cost < best.cost {
                    best = Candidate {
                        qg: i,
                        noref: false,
                        itheta: j,
                        max_theta: ts,
                        k,
                        qtheta,
                        pulses: y_tmp.clone(),
                        dist,
                        cost,
                    };
                }
            }
        }
        reflection = Some((rr, refl));
    }

    // The no-reference mode is only worth trying when the prediction is poor.
    // Intra luma always tries it.
    if (params.intra && params.plane == 0) || corr < 0.5 || cg < 2.0 {
        let mut y_tmp = vec![0i32; n];
        let mut prev_k = -1;
        let mut cos_dist = 0.0;
        for i in i32::max(1, cg.floor() as i32)..=cg.ceil() as i32 {
            let qcg = i as f64;
            let k = compute_k(qcg, -1, -1.0, true, n, beta, robust);
            let gain_dist = GAIN_WEIGHT * (qcg - cg) * (qcg - cg);
            if gain_dist > best.dist {
                continue;
            }
            if k != prev_k {
                cos_dist = pvq_search(&x, k, &mut y_tmp, qcg * cg);
                prev_k = k;
            }
            let dist = gain_dist + qcg * cg * (2.0 - 2.0 * cos_dist);
            let bits = SKIP_FLAG_BITS + symbol_bits(i) + pulse_bits(n, k);
            let cost = dist + PVQ_LAMBDA * bits;
            if cost <= best.cost {
                best = Candidate {
                    qg: i,
                    noref: true,
                    itheta: -1,
                    max_theta: 0,
                    k,
                    qtheta: 0.0,
                    pulses: y_tmp.clone(),
                    dist,
                    cost,
                };
            }
        }
    }

    let mut skip = None;
    if best.noref {
        if best.qg == 0 {
            skip = Some(PvqSkip::Zero);
        }
    } else {
        if !params.intra && best.qg == 0 {
            skip = Some(if icgr != 0 {
                PvqSkip::Zero
            } else {
                PvqSkip::Copy
            });
        }
        if best.qg == icgr && best.itheta == 0 {
            skip = Some(PvqSkip::Copy);
        }
    }
    if skip == Some(PvqSkip::Copy) && !has_ref {
        skip = Some(PvqSkip::Zero);
    }

    trace!(
        n,
        skip = ?skip,
        noref = best.noref,
        qg = best.qg,
        itheta = best.itheta,
        max_theta = best.max_theta,
        k = best.k,
        "band quantized"
    );

    match skip {
        Some(PvqSkip::Zero) => {
            out.fill(0);
            BandCode::skipped(PvqSkip::Zero)
        }
        Some(PvqSkip::Copy) => {
            round_into(out, &r);
            BandCode::skipped(PvqSkip::Copy)
        }
        None => {
            let qcg = if best.noref {
                best.qg as f64
            } else {
                best.qg as f64 + gain_offset
            };
            let g = gain_expand(qcg, q0, beta);
            match reflection.as_ref().filter(|_| !best.noref) {
                Some((rr, refl)) => {
                    synthesis_partial(out, &best.pulses, rr, false, g, best.qtheta, *refl)
                }
                None => synthesis_partial(out, &best.pulses, &[], true, g, 0.0, NO_REFLECTION),
            }
            BandCode {
                skip: None,
                noref: best.noref,
                gain: if best.noref {
                    best.qg
                } else {
                    neg_interleave(best.qg, icgr)
                },
                itheta: best.itheta,
                max_theta: best.max_theta,
                k: best.k,
                pulses: best.pulses,
            }
        }
    }
}

pub(crate) fn round_into(out: &mut [i32], r: &[f64]) {
    for (o, &v) in out.iter_mut().zip(r.iter()) {
        *o = (0.5 + v).floor() as i32;
    }
}

/// Block-level quantizer inputs.
#[derive(Debug, Clone, Copy)]
pub struct BlockParams {
    pub q0: i32,
    /// Block size index: the block is `4 << bs` square.
    pub bs: usize,
    pub plane: usize,
    pub intra: bool,
    pub nodesync: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCode {
    /// Scalar-quantized DC residual against the predictor's DC.
    pub dc: i32,
    pub bands: Vec<BandCode>,
}

pub(crate) fn band_q(q0: i32, scale: u16) -> i32 {
    i32::max(1, (q0 * scale as i32) >> QM_SHIFT)
}

pub(crate) fn predicted_dc(pred: Option<&[f64]>) -> i32 {
    pred.map_or(0, |p| (0.5 + p[0]).floor() as i32)
}

/// Quantizes a whole block of coefficients in band order: scalar DC plus
/// one PVQ band per partition.
pub fn encode_block(
    x: &[i32],
    pred: Option<&[f64]>,
    out: &mut [i32],
    params: &BlockParams,
    config: &CodecConfig,
) -> BlockCode {
    let offsets = band_offsets(params.bs);
    let len = *offsets.last().unwrap_or(&0);
    assert_eq!(x.len(), len, "block length mismatch");
    assert_eq!(out.len(), len, "output block length mismatch");
    if let Some(p) = pred {
        assert_eq!(p.len(), len, "predictor block length mismatch");
    }

    let dc_pred = predicted_dc(pred);
    let dc_q = params.q0.max(1);
    let diff = (x[0] - dc_pred) as f64;
    let dc = (diff / dc_q as f64).round() as i32;
    out[0] = dc_pred + dc * dc_q;

    let mut bands = Vec::with_capacity(band_count(params.bs));
    for band in 0..band_count(params.bs) {
        let range = offsets[band]..offsets[band + 1];
        let band_params = BandParams {
            q0: band_q(params.q0, config.qm.band_scale(params.bs, band)),
            beta: config.band_beta(params.intra, params.plane, params.bs, band),
            intra: params.intra,
            plane: params.plane,
            nodesync: params.nodesync,
        };
        let code = quantize_band(
            &x[range.clone()],
            pred.map(|p| &p[range.clone()]),
            &mut out[range],
            &band_params,
        );
        bands.push(code);
    }
    BlockCode { dc, bands }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pvq::search::l1_norm;

    fn params(intra: bool) -> BandParams {
        BandParams {
            q0: 16,
            beta: 1.0,
            intra,
            plane: 0,
            nodesync: false,
        }
    }

    #[test]
    fn zero_band_is_skip_zero() {
        let x = [0i32; 15];
        let r = [3.0f64; 15];
        let mut out = [9i32; 15];
        let code = quantize_band(&x, Some(&r), &mut out, &params(false));
        assert_eq!(code.skip, Some(PvqSkip::Zero));
        assert_eq!(out, [0; 15]);
    }

    #[test]
    fn band_equal_to_predictor_is_skip_copy() {
        let x: Vec<i32> = (0..15).map(|i| i * 11 - 70).collect();
        let r: Vec<f64> = x.iter().map(|&v| v as f64).collect();
        let mut out = vec![0i32; 15];
        let code = quantize_band(&x, Some(&r), &mut out, &params(true));
        assert_eq!(code.skip, Some(PvqSkip::Copy));
        assert_eq!(out, x);
    }

    #[test]
    fn noref_band_has_matching_pulse_count() {
        let x: Vec<i32> = (0..15).map(|i| ((i * 7) % 11) * 20 - 90).collect();
        let mut out = vec![0i32; 15];
        let code = quantize_band(&x, None, &mut out, &params(true));
        assert_eq!(code.skip, None);
        assert!(code.noref);
        assert_eq!(code.pulses.len(), 15);
        assert_eq!(l1_norm(&code.pulses), code.k);
        assert_eq!(
            code.k,
            compute_k(code.gain as f64, -1, -1.0, true, 15, 1.0, true)
        );
    }

    #[test]
    fn good_predictor_uses_reference_mode() {
        let r: Vec<f64> = (0..32).map(|i| ((i * 5) % 9) as f64 * 30.0 - 120.0).collect();
        let x: Vec<i32> = r
            .iter()
            .enumerate()
            .map(|(i, &v)| v as i32 + if i % 7 == 0 { 9 } else { 0 })
            .collect();
        let mut out = vec![0i32; 32];
        let code = quantize_band(&x, Some(&r), &mut out, &params(false));
        assert!(!code.noref);
        if code.skip.is_none() {
            assert_eq!(code.pulses.len(), 31);
            assert!((0..=code.max_theta).contains(&code.itheta));
            assert_eq!(l1_norm(&code.pulses), code.k);
        }
        let err: i64 = x
            .iter()
            .zip(out.iter())
            .map(|(&a, &b)| ((a - b) as i64).pow(2))
            .sum();
        let energy: i64 = x.iter().map(|&a| (a as i64).pow(2)).sum();
        assert!(err * 10 < energy);
    }

    #[test]
    fn reconstruction_energy_tracks_input() {
        let x: Vec<i32> = (0..64).map(|i| ((i * 13) % 17) * 25 - 200).collect();
        let mut out = vec![0i32; 64];
        quantize_band(&x, None, &mut out, &params(true));
        let ex: f64 = x.iter().map(|&v| (v as f64).powi(2)).sum::<f64>().sqrt();
        let eo: f64 = out.iter().map(|&v| (v as f64).powi(2)).sum::<f64>().sqrt();
        assert!((ex - eo).abs() < 0.1 * ex, "{} vs {}", ex, eo);
    }

    #[test]
    fn block_encode_fills_every_band() {
        let config = CodecConfig::default();
        let x: Vec<i32> = (0..64)
            .map(|i| if i < 16 { 200 - i * 9 } else { (i % 5) * 4 - 8 })
            .collect();
        let mut out = vec![0i32; 64];
        let params = BlockParams {
            q0: 12,
            bs: 1,
            plane: 0,
            intra: true,
            nodesync: false,
        };
        let code = encode_block(&x, None, &mut out, &params, &config);
        assert_eq!(code.bands.len(), 4);
        assert_eq!(code.dc, (200.0f64 / 12.0).round() as i32);
        assert_eq!(out[0], code.dc * 12);
    }

    #[test]
    fn band_quantizer_scales_with_weight() {
        assert_eq!(band_q(20, 16), 20);
        assert_eq!(band_q(20, 24), 30);
        assert_eq!(band_q(0, 16), 1);
    }

    #[test]
    fn binomial_bits() {
        assert!((log2_binomial(4, 2) - 6f64.log2()).abs() < 1e-12);
        assert_eq!(pulse_bits(10, 0), 0.0);
    }
}
