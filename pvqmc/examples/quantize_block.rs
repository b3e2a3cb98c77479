//! Quantizes a synthetic 16x16 coefficient block against a predictor and
//! builds a sub-pixel prediction with both kernel sets.
//!
//! Run with `RUST_LOG=pvqmc=trace` to see every band decision.

use pvqmc::pvq::{BlockParams, band_offsets, decode_block, encode_block};
use pvqmc::{Accel, CodecConfig, InterPredictor, MotionVector, PlaneRef};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let config = CodecConfig::default();
    config.validate()?;

    let params = BlockParams {
        q0: 10,
        bs: 2,
        plane: 0,
        intra: false,
        nodesync: false,
    };
    let len = *band_offsets(params.bs).last().unwrap_or(&0);
    let pred: Vec<f64> = (0..len)
        .map(|i| 600.0 / (1.0 + i as f64) * if i % 3 == 0 { -1.0 } else { 1.0 })
        .collect();
    let coeffs: Vec<i32> = pred
        .iter()
        .enumerate()
        .map(|(i, &p)| p as i32 + ((i * 13) % 7) as i32 - 3)
        .collect();

    let mut recon = vec![0i32; len];
    let code = encode_block(&coeffs, Some(&pred), &mut recon, &params, &config);
    let mut decoded = vec![0i32; len];
    decode_block(&code, Some(&pred), &mut decoded, &params, &config);

    let sse: i64 = coeffs
        .iter()
        .zip(recon.iter())
        .map(|(&a, &b)| ((a - b) as i64).pow(2))
        .sum();
    println!("dc residual: {}", code.dc);
    for (band, b) in code.bands.iter().enumerate() {
        println!(
            "band {band:2}: skip {:?} noref {} gain {} theta {}/{} k {}",
            b.skip, b.noref, b.gain, b.itheta, b.max_theta, b.k
        );
    }
    println!("sse {sse}, decoder matches: {}", decoded == recon);

    let side = 96;
    let plane: Vec<u8> = (0..side * side)
        .map(|i| ((i % side) * 2 + (i / side) * 3) as u8)
        .collect();
    let src = PlaneRef::new(&plane, side, 16, 16);
    let mv = MotionVector::new(7, -5);
    let mut blocks = Vec::new();
    for accel in [Accel::Scalar, Accel::Lanes] {
        let predictor = InterPredictor::new(&CodecConfig {
            accel,
            ..config.clone()
        })?;
        let mut scratch = predictor.scratch();
        let mut dst = vec![0u8; 16 * 16];
        predictor.predict_luma(&mut dst, 16, src, 16, 16, mv, &mut scratch);
        println!("{:>6} luma row 0: {:?}", predictor.kernels_name(), &dst[..8]);
        blocks.push(dst);
    }
    println!("kernel sets agree: {}", blocks[0] == blocks[1]);
    Ok(())
}
