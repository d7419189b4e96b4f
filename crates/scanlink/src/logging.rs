use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` with a full filter, e.g. `scanlink_frame=trace`.
pub const LOG_ENV: &str = "SCANLINK_LOG";

/// Targets `--log-level` applies to. Everything else logs at `warn`.
const SCANLINK_TARGETS: [&str; 4] = [
    "scanlink",
    "scanlink_transport",
    "scanlink_frame",
    "scanlink_node",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn default_filter(level: LogLevel) -> EnvFilter {
    let mut directives = String::from("warn");
    for target in SCANLINK_TARGETS {
        directives.push_str(&format!(",{target}={}", level.as_directive()));
    }
    EnvFilter::new(directives)
}

/// Status and diagnostics go to stderr; stdout carries records only.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| default_filter(level));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
