use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Environment variable holding `EnvFilter` directives, e.g.
/// `mmwstream_frame=trace,warn`.
pub const LOG_ENV: &str = "MMWSTREAM_LOG";

/// Crates whose events follow `--log-level`. Everything else stays at `warn`.
const OWN_TARGETS: [&str; 3] = ["mmwstream", "mmwstream_frame", "mmwstream_transport"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Filter directives in precedence order: an explicit `--log-level`, then
/// `MMWSTREAM_LOG`, then `info` for our crates.
fn directives(level: Option<LogLevel>, env: Option<&str>) -> String {
    let level = match (level, env.map(str::trim)) {
        (None, Some(env)) if !env.is_empty() => return env.to_string(),
        (level, _) => level.unwrap_or(LogLevel::Info),
    };

    let mut spec = String::from("warn");
    for target in OWN_TARGETS {
        spec.push_str(&format!(",{target}={}", level.as_str()));
    }
    spec
}

/// Install the stderr subscriber. Stdout carries only packet output, so
/// piping `--format json` into another tool never mixes in log lines.
pub fn init_logging(format: LogFormat, level: Option<LogLevel>) {
    let env = std::env::var(LOG_ENV).ok();
    // Invalid directives are skipped rather than aborting the capture.
    let filter = EnvFilter::new(directives(level, env.as_deref()));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false);

    let _ = match format {
        LogFormat::Text => builder.with_target(false).try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_our_crates_at_info() {
        let spec = directives(None, None);
        assert!(spec.starts_with("warn,"));
        assert!(spec.contains("mmwstream_frame=info"));
        assert!(spec.contains("mmwstream_transport=info"));
    }

    #[test]
    fn env_directives_replace_default() {
        assert_eq!(
            directives(None, Some("mmwstream_frame=trace")),
            "mmwstream_frame=trace"
        );
        assert!(directives(None, Some("  ")).contains("mmwstream=info"));
    }

    #[test]
    fn explicit_level_beats_env() {
        let spec = directives(Some(LogLevel::Debug), Some("trace"));
        assert!(spec.contains("mmwstream=debug"));
        assert!(!spec.contains("trace"));
    }
}
