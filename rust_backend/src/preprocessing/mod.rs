pub mod pipeline;
pub mod validator;

pub use pipeline::{preprocess_lightcurve, PreprocessConfig, PreprocessPipeline, PreprocessResult};
pub use validator::{is_accepted_flag, LightCurveValidator, ValidationResult, ValidationStats};
