use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::qm::QmKind;

pub const MAX_MV_LEVEL: u8 = 6;
pub const MAX_BLOCK_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MvResolution {
    #[default]
    Eighth,
    Quarter,
    Half,
}

impl MvResolution {
    pub fn step_eighths(self) -> i32 {
        match self {
            MvResolution::Eighth => 1,
            MvResolution::Quarter => 2,
            MvResolution::Half => 4,
        }
    }
}

impl TryFrom<u8> for MvResolution {
    type Error = ConfigError;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(MvResolution::Eighth),
            1 => Ok(MvResolution::Quarter),
            2 => Ok(MvResolution::Half),
            _ => Err(ConfigError::InvalidMvResolution(v)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accel {
    #[default]
    Auto,
    Scalar,
    Lanes,
}

impl Accel {
    /// `Auto` runs the scalar kernels. Lanes must be asked for.
    pub fn resolve(self) -> Accel {
        match self {
            Accel::Auto => Accel::Scalar,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LumaFilter {
    Thor6Tap,
    Hevc8Tap,
}

impl LumaFilter {
    pub fn taps(self) -> usize {
        match self {
            LumaFilter::Thor6Tap => 6,
            LumaFilter::Hevc8Tap => 8,
        }
    }
}

impl Default for LumaFilter {
    fn default() -> Self {
        if cfg!(feature = "hevc-interpolation") {
            LumaFilter::Hevc8Tap
        } else {
            LumaFilter::Thor6Tap
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodecConfig {
    pub qm: QmKind,
    pub activity_masking: bool,
    pub mv_res_min: MvResolution,
    pub mv_level_min: u8,
    pub mv_level_max: u8,
    pub accel: Accel,
    pub luma_filter: LumaFilter,
    pub max_block: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            qm: QmKind::Hvs,
            activity_masking: true,
            mv_res_min: MvResolution::Eighth,
            mv_level_min: 0,
            mv_level_max: MAX_MV_LEVEL,
            accel: Accel::Auto,
            luma_filter: LumaFilter::default(),
            max_block: MAX_BLOCK_SIZE,
        }
    }
}

impl CodecConfig {
    pub fn validate(&self) -> Result<()> {
        for level in [self.mv_level_min, self.mv_level_max] {
            if level > MAX_MV_LEVEL {
                return Err(ConfigError::InvalidMvLevel(level));
            }
        }
        if self.mv_level_min > self.mv_level_max {
            return Err(ConfigError::InvertedMvLevels {
                min: self.mv_level_min,
                max: self.mv_level_max,
            });
        }
        if !self.max_block.is_power_of_two() || !(4..=MAX_BLOCK_SIZE).contains(&self.max_block) {
            return Err(ConfigError::InvalidBlockSize(self.max_block));
        }
        debug!(
            qm = ?self.qm,
            activity_masking = self.activity_masking,
            mv_res_min = ?self.mv_res_min,
            mv_levels = ?(self.mv_level_min..=self.mv_level_max),
            "codec configuration validated"
        );
        Ok(())
    }

    pub fn band_beta(&self, intra: bool, plane: usize, bs: usize, band: usize) -> f64 {
        if self.activity_masking {
            crate::pvq::beta(intra, plane, bs, band)
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(CodecConfig::default().validate(), Ok(()));
    }

    #[test]
    fn mv_resolution_from_option_id() {
        assert_eq!(MvResolution::try_from(0), Ok(MvResolution::Eighth));
        assert_eq!(MvResolution::try_from(2), Ok(MvResolution::Half));
        assert_eq!(
            MvResolution::try_from(3),
            Err(ConfigError::InvalidMvResolution(3))
        );
    }

    #[test]
    fn inverted_levels_rejected() {
        let config = CodecConfig {
            mv_level_min: 4,
            mv_level_max: 2,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedMvLevels { min: 4, max: 2 })
        );
    }

    #[test]
    fn level_above_six_rejected() {
        let config = CodecConfig {
            mv_level_max: 7,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidMvLevel(7)));
    }

    #[test]
    fn arena_bound_must_be_power_of_two() {
        for bad in [0, 3, 12, 128] {
            let config = CodecConfig {
                max_block: bad,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::InvalidBlockSize(bad)));
        }
    }

    #[test]
    fn auto_accel_resolves_to_scalar() {
        assert_eq!(Accel::Auto.resolve(), Accel::Scalar);
        assert_eq!(Accel::Scalar.resolve(), Accel::Scalar);
        assert_eq!(Accel::Lanes.resolve(), Accel::Lanes);
    }

    #[test]
    fn masking_off_forces_unit_beta() {
        let config = CodecConfig {
            activity_masking: false,
            ..Default::default()
        };
        assert_eq!(config.band_beta(true, 0, 3, 9), 1.0);
    }
}
