use crate::error::ConfigError;

pub const NBSIZES: usize = 4;
pub const QM_SIZE: usize = NBSIZES * (NBSIZES + 1);

pub const QM_SHIFT: u32 = 4;
pub const QM_UNITY: i32 = 1 << QM_SHIFT;

#[rustfmt::skip]
pub const QM8_Q4_FLAT: [i32; 64] = [
    16, 16, 16, 16, 16, 16, 16, 16,
    16, 16, 16, 16, 16, 16, 16, 16,
    16, 16, 16, 16, 16, 16, 16, 16,
    16, 16, 16, 16, 16, 16, 16, 16,
    16, 16, 16, 16, 16, 16, 16, 16,
    16, 16, 16, 16, 16, 16, 16, 16,
    16, 16, 16, 16, 16, 16, 16, 16,
    16, 16, 16, 16, 16, 16, 16, 16,
];

#[rustfmt::skip]
pub const QM8_Q4_HVS: [i32; 64] = [
    16, 16, 18, 21, 24, 28, 32, 36,
    16, 17, 20, 21, 24, 27, 31, 35,
    18, 20, 24, 25, 27, 31, 33, 38,
    21, 21, 25, 28, 30, 34, 37, 42,
    24, 24, 27, 30, 34, 38, 43, 49,
    28, 27, 31, 34, 38, 44, 50, 58,
    32, 31, 33, 37, 43, 50, 58, 68,
    36, 35, 38, 42, 49, 58, 68, 78,
];

// Per-band scales, laid out as NBSIZES runs of 2*(bs + 1) entries. Entries
// past the last band of a size are padding.
#[rustfmt::skip]
const PVQ_QM_FLAT: [u16; QM_SIZE] = [
    16, 16,
    16, 16, 16, 16,
    16, 16, 16, 16, 16, 16,
    16, 16, 16, 16, 16, 16, 16, 16,
];

#[rustfmt::skip]
const PVQ_QM_HVS: [u16; QM_SIZE] = [
    16, 16,
    16, 19, 24, 24,
    16, 17, 21, 25, 30, 30,
    16, 17, 19, 22, 26, 31, 36, 36,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QmKind {
    Flat,
    #[default]
    Hvs,
}

impl QmKind {
    pub fn matrix8(self) -> &'static [i32; 64] {
        match self {
            QmKind::Flat => &QM8_Q4_FLAT,
            QmKind::Hvs => &QM8_Q4_HVS,
        }
    }

    pub fn band_scale(self, bs: usize, band: usize) -> u16 {
        let table = match self {
            QmKind::Flat => &PVQ_QM_FLAT,
            QmKind::Hvs => &PVQ_QM_HVS,
        };
        table[qm_get_index(bs, band)]
    }
}

impl TryFrom<u8> for QmKind {
    type Error = ConfigError;

    fn try_from(v: u8) -> Result<Self, ConfigError> {
        match v {
            0 => Ok(QmKind::Flat),
            1 => Ok(QmKind::Hvs),
            _ => Err(ConfigError::InvalidQm(v)),
        }
    }
}

pub fn band_count(bs: usize) -> usize {
    1 + 3 * bs
}

/// Index of a band's scale in the per-band tables. Horizontal and vertical
/// bands of the same level share one entry.
pub fn qm_get_index(bs: usize, band: usize) -> usize {
    assert!(bs < NBSIZES, "unsupported block size index {bs}");
    assert!(
        band < band_count(bs),
        "band {band} out of range for block size index {bs}"
    );
    bs * (bs + 1) + band - (band + 1) / 3
}

fn qm_coord(i: usize, bs: usize, dec: u32) -> usize {
    (i << 3) >> (bs as u32 + 2 + dec)
}

fn div_round(num: i64, den: i64) -> i32 {
    let half = den / 2;
    let q = if num >= 0 {
        (num + half) / den
    } else {
        -((-num + half) / den)
    };
    q as i32
}

/// Weights a `4 << bs` square block by the 8x8 Q4 matrix `qm`. The forward
/// direction multiplies by the weight, the inverse divides it back out. `dec`
/// is the decimation shift of a subsampled plane, so its coefficients map to
/// the same frequencies as the full-resolution block.
#[allow(clippy::too_many_arguments)]
pub fn apply_qm(
    out: &mut [i32],
    out_stride: usize,
    input: &[i32],
    in_stride: usize,
    bs: usize,
    dec: u32,
    inverse: bool,
    qm: &[i32; 64],
) {
    assert!(bs < NBSIZES, "unsupported block size index {bs}");
    let n = 4 << bs;
    for i in 0..n {
        let qi = qm_coord(i, bs, dec);
        for j in 0..n {
            let scale = qm[qi * 8 + qm_coord(j, bs, dec)] as i64;
            assert!(scale > 0, "zero quantization matrix entry");
            let v = input[i * in_stride + j] as i64;
            out[i * out_stride + j] = if inverse {
                div_round(v * QM_UNITY as i64, scale)
            } else {
                div_round(v * scale, QM_UNITY as i64)
            };
        }
    }
}
