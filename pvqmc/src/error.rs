use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("illegal quantization matrix {0}: expected 0 (flat) or 1 (hvs)")]
    InvalidQm(u8),

    #[error("illegal motion vector resolution {0}: expected 0 (1/8), 1 (1/4) or 2 (1/2)")]
    InvalidMvResolution(u8),

    #[error("illegal motion vector level {0}: must be in 0..=6")]
    InvalidMvLevel(u8),

    #[error("motion vector level range is inverted: min {min} > max {max}")]
    InvertedMvLevels { min: u8, max: u8 },

    #[error("unsupported scratch block size {0}: must be a power of two in 4..=64")]
    InvalidBlockSize(usize),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
