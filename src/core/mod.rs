pub mod config;
pub mod error;
pub mod output;
pub mod utils;

pub use config::{GlobalConfig, ReportConfig, SampleSheetConfig};
pub use error::{Result, SnakeError, SnakeErrorKind};
pub use utils::{format_metric, params_to_cli};
