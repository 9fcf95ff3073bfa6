pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{FileConfig, Settings};

pub use adapters::http::RemoteAnalysisClient;
pub use crate::core::{AdvisoryDesk, FallbackAdvisoryResolver, ProgressiveOrchestrator};
pub use domain::model::{BasicResult, DailyFortune, DirectionAdvice, InterpretiveResult, Query};
pub use domain::ports::{AnalysisService, ConfigProvider};
pub use utils::error::{ErrorKind, Result};
