use std::env;

use tracing::level_filters::LevelFilter;

/// Log configuration taken from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    pub level: LevelFilter,
}

impl LogOptions {
    pub const DEFAULT: Self = Self {
        level: LevelFilter::WARN,
    };

    /// Reads `MJC_LOG_LEVEL`; unknown values keep the default.
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var_os("MJC_LOG_LEVEL").map(|value| value.to_string_lossy().to_string());
        apply_env_overrides(Self::DEFAULT, level.as_deref())
    }
}

impl Default for LogOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Accepts the `tracing` level names (`off` through `trace`) in any case.
fn parse_level(spec: &str) -> Option<LevelFilter> {
    let spec = spec.trim();
    if spec.is_empty() {
        return None;
    }
    spec.parse().ok()
}

fn apply_env_overrides(mut options: LogOptions, level: Option<&str>) -> LogOptions {
    if let Some(level) = level.and_then(parse_level) {
        options.level = level;
    }
    options
}

/// Stage tracing needs at least `info` events to be visible.
pub fn resolve_effective_level(options: &LogOptions, trace_stages: bool) -> LevelFilter {
    if trace_stages && options.level < LevelFilter::INFO {
        LevelFilter::INFO
    } else {
        options.level
    }
}

/// Installs a stderr `fmt` subscriber once per process. Directives in
/// `RUST_LOG` are layered over the configured level.
pub fn init_logging(options: &LogOptions, trace_stages: bool) {
    use std::io::IsTerminal;
    use std::sync::OnceLock;
    use tracing_subscriber::{fmt, EnvFilter};

    static INITIALISED: OnceLock<()> = OnceLock::new();

    let level = resolve_effective_level(options, trace_stages);
    let _ = INITIALISED.get_or_init(|| {
        let use_ansi = env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();

        let subscriber = fmt::fmt()
            .with_env_filter(filter)
            .with_ansi(use_ansi)
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_follow_tracing() {
        assert_eq!(parse_level("off"), Some(LevelFilter::OFF));
        assert_eq!(parse_level("error"), Some(LevelFilter::ERROR));
        assert_eq!(parse_level("INFO"), Some(LevelFilter::INFO));
        assert_eq!(parse_level(" trace "), Some(LevelFilter::TRACE));
        assert_eq!(parse_level(""), None);
        assert_eq!(parse_level("verbose"), None);
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn env_override_replaces_only_valid_levels() {
        let options = apply_env_overrides(LogOptions::DEFAULT, Some("debug"));
        assert_eq!(options.level, LevelFilter::DEBUG);

        let options = apply_env_overrides(LogOptions::DEFAULT, Some("nonsense"));
        assert_eq!(options, LogOptions::DEFAULT);

        let options = apply_env_overrides(LogOptions::DEFAULT, None);
        assert_eq!(options, LogOptions::DEFAULT);
    }

    #[test]
    fn stage_tracing_raises_quiet_levels_to_info() {
        let quiet = LogOptions {
            level: LevelFilter::ERROR,
        };
        assert_eq!(resolve_effective_level(&quiet, true), LevelFilter::INFO);
        assert_eq!(resolve_effective_level(&quiet, false), LevelFilter::ERROR);

        let silent = LogOptions {
            level: LevelFilter::OFF,
        };
        assert_eq!(resolve_effective_level(&silent, true), LevelFilter::INFO);

        let verbose = LogOptions {
            level: LevelFilter::TRACE,
        };
        assert_eq!(resolve_effective_level(&verbose, true), LevelFilter::TRACE);
    }
}
