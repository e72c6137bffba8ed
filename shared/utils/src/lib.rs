pub mod logging;
pub mod metrics;

pub use logging::{LogFormat, LoggingInitializer, LoggingOptions};
pub use metrics::AppMetrics;
