//! 服务端设置
//!
//! 设置保存在 `<配置目录>/connect-four/settings.json`，
//! 文件缺失或格式错误时使用默认设置。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use protocol::{BoardConfig, Color, DEFAULT_QUEUE_CAPACITY};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// 对应的 EnvFilter 级别
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// 构建日志过滤器，设置了 `RUST_LOG` 时以其为准
    pub fn env_filter(self) -> EnvFilter {
        filter_from(std::env::var("RUST_LOG").ok().as_deref(), self)
    }
}

fn filter_from(rust_log: Option<&str>, level: LogLevel) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|s| !s.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => tracing::warn!("RUST_LOG 无效: {}，使用设置中的日志级别", e),
        }
    }
    EnvFilter::new(format!("game_server={0},protocol={0}", level.as_filter()))
}

/// 服务端设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// 棋盘配置
    pub board: BoardConfig,
    /// 没有上一局时的先手
    pub default_first_player: Color,
    /// 每个会话的请求队列长度
    pub queue_capacity: usize,
    /// 日志级别
    pub log_level: LogLevel,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            default_first_player: Color::Red,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_level: LogLevel::default(),
        }
    }
}

impl ServerSettings {
    /// 获取设置文件路径
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("connect-four");
            path.push("settings.json");
            path
        })
    }

    /// 从默认位置加载设置
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            tracing::warn!("无法获取配置目录，使用默认设置");
            return Self::default();
        };

        if !path.exists() {
            tracing::info!("设置文件不存在，使用默认设置");
            return Self::default();
        }

        Self::load_or_default(&path)
    }

    /// 从指定文件加载，失败时使用默认设置
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(settings) => {
                tracing::info!("已加载设置: {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("设置文件无效: {:#}，使用默认设置", e);
                Self::default()
            }
        }
    }

    /// 从指定文件加载并校验
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取设置文件失败: {:?}", path))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("解析设置文件失败: {:?}", path))?;
        settings.validate()?;
        Ok(settings)
    }

    /// 保存到指定文件
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("序列化设置失败")?;
        fs::write(path, content).with_context(|| format!("写入设置文件失败: {:?}", path))?;

        tracing::info!("设置已保存: {:?}", path);
        Ok(())
    }

    /// 校验设置
    pub fn validate(&self) -> Result<()> {
        self.board.validate()?;
        ensure!(self.queue_capacity > 0, "queue_capacity must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// 收集日志输出
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");

        let settings = ServerSettings {
            board: BoardConfig {
                rows: 8,
                columns: 9,
                win_length: 5,
                gravity: true,
            },
            default_first_player: Color::Yellow,
            queue_capacity: 8,
            log_level: LogLevel::Debug,
        };
        settings.save_to(&path).unwrap();

        let loaded = ServerSettings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{ "default_first_player": "Yellow" }"#).unwrap();

        let loaded = ServerSettings::load_from(&path).unwrap();
        assert_eq!(loaded.default_first_player, Color::Yellow);
        assert_eq!(loaded.board, BoardConfig::default());
        assert_eq!(loaded.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        // 格式错误
        fs::write(&path, "not json").unwrap();
        assert!(ServerSettings::load_from(&path).is_err());
        assert_eq!(ServerSettings::load_or_default(&path), ServerSettings::default());

        // 连子数超过棋盘
        fs::write(
            &path,
            r#"{ "board": { "rows": 3, "columns": 3, "win_length": 4, "gravity": true } }"#,
        )
        .unwrap();
        assert!(ServerSettings::load_from(&path).is_err());

        // 队列长度为 0
        fs::write(&path, r#"{ "queue_capacity": 0 }"#).unwrap();
        assert!(ServerSettings::load_from(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");
        assert!(ServerSettings::load_from(&path).is_err());
        assert_eq!(ServerSettings::load_or_default(&path), ServerSettings::default());
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::default().as_filter(), "info");
        assert_eq!(LogLevel::Trace.as_filter(), "trace");
    }

    #[test]
    fn test_filter_uses_settings_level() {
        let filter = filter_from(None, LogLevel::Warn).to_string();
        assert!(filter.contains("game_server=warn"));
        assert!(filter.contains("protocol=warn"));

        let filter = filter_from(Some("  "), LogLevel::Debug).to_string();
        assert!(filter.contains("game_server=debug"));
    }

    #[test]
    fn test_filter_prefers_rust_log() {
        let filter = filter_from(Some("game_server=debug"), LogLevel::Info).to_string();
        assert!(filter.contains("game_server=debug"));
        assert!(!filter.contains("info"));

        // 无法解析时回退到设置中的级别
        let filter = filter_from(Some("game_server=loud"), LogLevel::Error).to_string();
        assert!(filter.contains("game_server=error"));
    }

    #[test]
    fn test_invalid_file_warning_is_logged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let loaded = tracing::subscriber::with_default(subscriber, || {
            ServerSettings::load_or_default(&path)
        });
        assert_eq!(loaded, ServerSettings::default());

        let text = logs.text();
        assert!(text.contains("WARN"));
        assert!(text.contains("使用默认设置"));
    }
}
