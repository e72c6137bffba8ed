use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingOptions {
    pub format: LogFormat,
    /// `RUST_LOG` 未设置时使用的过滤规则
    pub level: String,
    /// 设置后按天滚动写入该目录，否则输出到 stdout
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "info".to_string(),
            directory: None,
            file_prefix: "service.log".to_string(),
        }
    }
}

impl LoggingOptions {
    pub fn build_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => Ok(EnvFilter::try_new(&self.level)?),
        }
    }
}

/// 全局日志初始化
pub struct LoggingInitializer;

impl LoggingInitializer {
    /// 按配置初始化
    ///
    /// 写文件时返回的 guard 必须存活到进程退出，否则缓冲的日志会丢失。
    pub fn init(options: &LoggingOptions) -> Result<Option<WorkerGuard>> {
        let filter = options.build_filter()?;

        let (writer, guard) = match &options.directory {
            Some(dir) => {
                let appender = tracing_appender::rolling::daily(dir, &options.file_prefix);
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                (BoxMakeWriter::new(non_blocking), Some(guard))
            }
            None => (BoxMakeWriter::new(std::io::stdout), None),
        };

        let fmt_layer = match options.format {
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_writer(writer)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(writer)
                .boxed(),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_deserializes_lowercase() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
        let format: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_default_options_write_to_stdout() {
        let options = LoggingOptions::default();
        assert_eq!(options.format, LogFormat::Pretty);
        assert!(options.directory.is_none());
        assert!(options.build_filter().is_ok());
    }

    #[test]
    fn test_file_output_returns_guard_and_installs_once() {
        let dir = std::env::temp_dir().join(format!("expense-tracker-logs-{}", std::process::id()));
        let options = LoggingOptions {
            format: LogFormat::Json,
            directory: Some(dir.clone()),
            ..Default::default()
        };

        let guard = LoggingInitializer::init(&options).unwrap();
        assert!(guard.is_some());

        // 全局订阅者只能安装一次
        assert!(LoggingInitializer::init(&LoggingOptions::default()).is_err());

        drop(guard);
        let _ = std::fs::remove_dir_all(dir);
    }
}
