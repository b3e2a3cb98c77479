#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod householder;
pub mod mc;
pub mod pvq;
pub mod qm;

pub use config::{Accel, CodecConfig, LumaFilter, MvResolution};
pub use error::ConfigError;
pub use mc::{InterPredictor, McScratch, MotionVector, PlaneRef};
pub use pvq::{BandCode, BlockCode, PvqSkip};
pub use qm::QmKind;
