// 日志工具模块
// 统一初始化 tracing：终端输出 + 追加写入日志文件，方便调试和问题排查

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "prompt_tree=info,tower_http=info";

/// 日志文件路径：~/.prompt-tree/logs/prompt-tree.log
pub fn log_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".prompt-tree").join("logs").join("prompt-tree.log"))
}

/// 初始化日志，`RUST_LOG` 可覆盖默认过滤规则
///
/// 日志文件打不开时只输出到终端。
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let log_path = log_file_path();
    let file_layer = log_path.as_ref().and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
            .map(|file| fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
    });
    let file_enabled = file_layer.is_some();

    let initialized = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    if initialized.is_ok() && file_enabled {
        if let Some(path) = log_path {
            tracing::info!(path = %path.display(), "📝 日志文件已初始化");
        }
    }
}
