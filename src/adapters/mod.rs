pub mod envelope;
pub mod http;

pub use http::RemoteAnalysisClient;
