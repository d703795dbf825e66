use std::env;

use crate::errors::errors::ErrorPolicy;

/// Options shared by every stage of one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileOptions {
    pub error_policy: ErrorPolicy,
    /// Log one `info` event with the elapsed time after each stage.
    pub trace_stages: bool,
}

impl CompileOptions {
    /// Reads `MJC_ERROR_POLICY` and `MJC_TRACE_STAGES`.
    #[must_use]
    pub fn from_env() -> Self {
        let policy = env::var_os("MJC_ERROR_POLICY").map(|value| value.to_string_lossy().to_string());
        let trace = env::var_os("MJC_TRACE_STAGES").map(|value| value.to_string_lossy().to_string());
        apply_env_overrides(Self::default(), policy.as_deref(), trace.as_deref())
    }
}

fn apply_env_overrides(
    mut options: CompileOptions,
    policy: Option<&str>,
    trace: Option<&str>,
) -> CompileOptions {
    if let Some(policy) = policy.and_then(ErrorPolicy::parse) {
        options.error_policy = policy;
    }
    if let Some(trace) = trace.and_then(parse_flag) {
        options.trace_stages = trace;
    }
    options
}

fn parse_flag(spec: &str) -> Option<bool> {
    match spec.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fail_fast_without_tracing() {
        let options = CompileOptions::default();
        assert_eq!(options.error_policy, ErrorPolicy::FailFast);
        assert!(!options.trace_stages);
    }

    #[test]
    fn env_values_override_defaults() {
        let options = apply_env_overrides(CompileOptions::default(), Some("collect-all"), Some("on"));
        assert_eq!(options.error_policy, ErrorPolicy::CollectAll);
        assert!(options.trace_stages);
    }

    #[test]
    fn unknown_env_values_are_ignored() {
        let options = apply_env_overrides(CompileOptions::default(), Some("sometimes"), Some("maybe"));
        assert_eq!(options, CompileOptions::default());
    }
}
