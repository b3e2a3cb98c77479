use tracing::trace;

use super::encoder::{BandParams, BlockCode, BlockParams, band_q, predicted_dc, round_into};
use super::search::l1_norm;
use super::{
    BandCode, PvqSkip, band_offsets, compute_k, compute_max_theta, compute_theta, gain_compand,
    gain_expand, neg_deinterleave, synthesis_partial,
};
use crate::config::CodecConfig;
use crate::householder::{Reflection, compute_householder, l2_norm};
use crate::qm::band_count;

/// Rebuilds a band from its coded values. Given the same predictor and
/// parameters, the output is identical to the reconstruction produced by
/// [`quantize_band`](super::quantize_band).
pub fn dequantize_band(code: &BandCode, r0: Option<&[f64]>, out: &mut [i32], params: &BandParams) {
    let n = out.len();
    if let Some(r) = r0 {
        assert_eq!(r.len(), n, "predictor length mismatch");
    }
    match code.skip {
        Some(PvqSkip::Zero) => {
            out.fill(0);
            return;
        }
        Some(PvqSkip::Copy) => {
            match r0 {
                Some(r) => round_into(out, r),
                None => out.fill(0),
            }
            return;
        }
        None => {}
    }

    let beta = params.beta;
    let robust = params.robust_k();
    if code.noref {
        let qcg = code.gain as f64;
        let k = compute_k(qcg, -1, -1.0, true, n, beta, robust);
        assert_eq!(l1_norm(&code.pulses), k, "pulse count does not match gain");
        let g = gain_expand(qcg, params.q0, beta);
        synthesis_partial(
            out,
            &code.pulses,
            &[],
            true,
            g,
            0.0,
            Reflection { axis: 0, sign: 1 },
        );
        trace!(n, qg = code.gain, k, "noref band rebuilt");
        return;
    }

    let Some(r) = r0 else {
        panic!("reference-mode band without a predictor");
    };
    let mut rr = r.to_vec();
    let gr = l2_norm(&rr);
    let cgr = gain_compand(gr, params.q0, beta);
    let icgr = (0.5 + cgr).floor() as i32;
    let gain_offset = cgr - icgr as f64;
    let qg = neg_deinterleave(code.gain, icgr);
    let qcg = qg as f64 + gain_offset;
    let max_theta = compute_max_theta(qcg, beta);
    let theta = compute_theta(code.itheta, max_theta);
    let k = compute_k(qcg, code.itheta, theta, false, n, beta, robust);
    assert_eq!(l1_norm(&code.pulses), k, "pulse count does not match theta");

    let refl = compute_householder(&mut rr, gr);
    let g = gain_expand(qcg, params.q0, beta);
    synthesis_partial(out, &code.pulses, &rr, false, g, theta, refl);
    trace!(n, qg, itheta = code.itheta, max_theta, k, "reference band rebuilt");
}

pub fn decode_block(
    code: &BlockCode,
    pred: Option<&[f64]>,
    out: &mut [i32],
    params: &BlockParams,
    config: &CodecConfig,
) {
    let offsets = band_offsets(params.bs);
    let nbands = band_count(params.bs);
    assert_eq!(code.bands.len(), nbands, "band count mismatch");
    assert_eq!(out.len(), offsets[nbands], "output block length mismatch");

    out[0] = predicted_dc(pred) + code.dc * params.q0.max(1);
    for (band, band_code) in code.bands.iter().enumerate() {
        let range = offsets[band]..offsets[band + 1];
        let band_params = BandParams {
            q0: band_q(params.q0, config.qm.band_scale(params.bs, band)),
            beta: config.band_beta(params.intra, params.plane, params.bs, band),
            intra: params.intra,
            plane: params.plane,
            nodesync: params.nodesync,
        };
        dequantize_band(
            band_code,
            pred.map(|p| &p[range.clone()]),
            &mut out[range],
            &band_params,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pvq::{encode_block, quantize_band};

    fn band_params(intra: bool, beta: f64) -> BandParams {
        BandParams {
            q0: 10,
            beta,
            intra,
            plane: 0,
            nodesync: false,
        }
    }

    #[test]
    fn decoder_matches_encoder_reconstruction() {
        let r: Vec<f64> = (0..24).map(|i| ((i * 7) % 10) as f64 * 12.0 - 50.0).collect();
        let x: Vec<i32> = r
            .iter()
            .enumerate()
            .map(|(i, &v)| v as i32 + ((i * 3) % 5) as i32 * 6 - 12)
            .collect();
        for intra in [false, true] {
            for beta in [1.0, 1.5] {
                let p = band_params(intra, beta);
                let mut enc = vec![0i32; 24];
                let code = quantize_band(&x, Some(&r), &mut enc, &p);
                let mut dec = vec![0i32; 24];
                dequantize_band(&code, Some(&r), &mut dec, &p);
                assert_eq!(enc, dec, "intra {} beta {}", intra, beta);
            }
        }
    }

    #[test]
    fn skip_zero_clears_band() {
        let mut out = [5i32; 8];
        dequantize_band(
            &BandCode::skipped(PvqSkip::Zero),
            Some(&[1.0; 8]),
            &mut out,
            &band_params(false, 1.0),
        );
        assert_eq!(out, [0; 8]);
    }

    #[test]
    fn skip_copy_rounds_predictor() {
        let r = [1.4, -2.6, 0.5, 7.0];
        let mut out = [0i32; 4];
        dequantize_band(
            &BandCode::skipped(PvqSkip::Copy),
            Some(&r),
            &mut out,
            &band_params(false, 1.0),
        );
        assert_eq!(out, [1, -3, 1, 7]);
    }

    #[test]
    #[should_panic]
    fn wrong_pulse_count_panics() {
        let code = BandCode {
            skip: None,
            noref: true,
            gain: 3,
            itheta: -1,
            max_theta: 0,
            k: 1,
            pulses: vec![1, 0, 0, 0],
        };
        let mut out = [0i32; 4];
        dequantize_band(&code, None, &mut out, &band_params(true, 1.0));
    }

    #[test]
    fn block_round_trip_with_predictor() {
        let config = CodecConfig::default();
        let params = BlockParams {
            q0: 8,
            bs: 2,
            plane: 0,
            intra: false,
            nodesync: false,
        };
        let pred: Vec<f64> = (0..256).map(|i| (((i * 29) % 41) as f64 - 20.0) * 3.0).collect();
        let x: Vec<i32> = pred
            .iter()
            .enumerate()
            .map(|(i, &v)| v as i32 + if i % 9 == 0 { 7 } else { 0 })
            .collect();
        let mut enc = vec![0i32; 256];
        let code = encode_block(&x, Some(&pred), &mut enc, &params, &config);
        let mut dec = vec![0i32; 256];
        decode_block(&code, Some(&pred), &mut dec, &params, &config);
        assert_eq!(enc, dec);
    }
}
