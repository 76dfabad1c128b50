pub mod calibrate;
pub mod kind;
pub mod params;
pub mod path;

pub use calibrate::{calibrate, Calibration};
pub use kind::ModelKind;
pub use params::{CalibratedParameters, GarchParams, GbmParams, HestonParams};
pub use path::{simulate_path, SimulatedPath};
