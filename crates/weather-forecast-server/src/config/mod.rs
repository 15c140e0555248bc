//! Configuration loading and resolution.
//!
//! Every setting resolves in the same order: explicit CLI flag, then
//! environment variable, then a default derived from the base directory.

use std::path::{Path, PathBuf};

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";

const ENV_HOME: &str = "WEATHER_FORECAST_HOME";
const ENV_MODEL: &str = "WEATHER_MODEL_PATH";
const ENV_HISTORY: &str = "WEATHER_HISTORY_PATH";
const ENV_METADATA: &str = "WEATHER_METADATA_PATH";
const ENV_STATIC: &str = "WEATHER_STATIC_DIR";
const ENV_ADDR: &str = "WEATHER_ADDR";
const ENV_PORT: &str = "PORT";
const ENV_ORIGINS: &str = "ALLOWED_ORIGINS";

/// Locations of the artifacts produced by the offline training job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub history: PathBuf,
    pub metadata: PathBuf,
    pub static_dir: PathBuf,
}

impl ArtifactPaths {
    /// Standard layout under a project directory.
    pub fn under(base: &Path) -> Self {
        Self {
            model: base.join("models").join("ensemble_forecaster.wfm"),
            history: base.join("data").join("historical_temps.csv"),
            metadata: base.join("models").join("feature_metadata.json"),
            static_dir: base.join("static"),
        }
    }
}

/// Path flags as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub base_dir: Option<String>,
    pub model: Option<String>,
    pub history: Option<String>,
    pub metadata: Option<String>,
    pub static_dir: Option<String>,
}

/// Resolve artifact paths from flags and the process environment.
pub fn resolve_artifact_paths(overrides: &PathOverrides) -> ArtifactPaths {
    resolve_artifact_paths_with(overrides, |key| std::env::var(key).ok())
}

/// Resolve artifact paths with a custom environment lookup.
pub fn resolve_artifact_paths_with<F>(overrides: &PathOverrides, env: F) -> ArtifactPaths
where
    F: Fn(&str) -> Option<String>,
{
    let base = overrides
        .base_dir
        .clone()
        .or_else(|| env(ENV_HOME))
        .unwrap_or_else(|| ".".to_string());
    let defaults = ArtifactPaths::under(Path::new(&base));

    let pick = |explicit: &Option<String>, key: &str, default: PathBuf| {
        explicit
            .clone()
            .or_else(|| env(key))
            .map(PathBuf::from)
            .unwrap_or(default)
    };

    ArtifactPaths {
        model: pick(&overrides.model, ENV_MODEL, defaults.model),
        history: pick(&overrides.history, ENV_HISTORY, defaults.history),
        metadata: pick(&overrides.metadata, ENV_METADATA, defaults.metadata),
        static_dir: pick(&overrides.static_dir, ENV_STATIC, defaults.static_dir),
    }
}

/// Resolve the listen address.
pub fn resolve_addr(explicit: Option<&str>) -> String {
    resolve_addr_with(explicit, |key| std::env::var(key).ok())
}

/// Flag > `WEATHER_ADDR` > `0.0.0.0:$PORT` > [`DEFAULT_ADDR`].
pub fn resolve_addr_with<F>(explicit: Option<&str>, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = explicit {
        return addr.to_string();
    }
    if let Some(addr) = env(ENV_ADDR) {
        return addr;
    }
    if let Some(port) = env(ENV_PORT).filter(|p| p.parse::<u16>().is_ok()) {
        return format!("0.0.0.0:{port}");
    }
    DEFAULT_ADDR.to_string()
}

/// Resolve the CORS origin list.
pub fn resolve_allowed_origins(explicit: Option<&str>) -> Vec<String> {
    let raw = explicit
        .map(str::to_string)
        .or_else(|| std::env::var(ENV_ORIGINS).ok())
        .unwrap_or_else(|| "*".to_string());
    parse_origins(&raw)
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_under_cwd() {
        let paths = resolve_artifact_paths_with(&PathOverrides::default(), env_of(&[]));
        assert_eq!(paths, ArtifactPaths::under(Path::new(".")));
        assert!(paths.model.ends_with("models/ensemble_forecaster.wfm"));
    }

    #[test]
    fn test_env_base_dir() {
        let paths = resolve_artifact_paths_with(
            &PathOverrides::default(),
            env_of(&[("WEATHER_FORECAST_HOME", "/srv/forecast")]),
        );
        assert_eq!(
            paths.history,
            PathBuf::from("/srv/forecast/data/historical_temps.csv")
        );
    }

    #[test]
    fn test_flag_beats_env() {
        let overrides = PathOverrides {
            model: Some("/tmp/flag.wfm".to_string()),
            ..Default::default()
        };
        let paths = resolve_artifact_paths_with(
            &overrides,
            env_of(&[
                ("WEATHER_MODEL_PATH", "/tmp/env.wfm"),
                ("WEATHER_METADATA_PATH", "/tmp/meta.json"),
            ]),
        );
        assert_eq!(paths.model, PathBuf::from("/tmp/flag.wfm"));
        assert_eq!(paths.metadata, PathBuf::from("/tmp/meta.json"));
    }

    #[test]
    fn test_addr_resolution() {
        assert_eq!(resolve_addr_with(Some("127.0.0.1:9"), env_of(&[])), "127.0.0.1:9");
        assert_eq!(
            resolve_addr_with(None, env_of(&[("PORT", "10000")])),
            "0.0.0.0:10000"
        );
        assert_eq!(
            resolve_addr_with(None, env_of(&[("PORT", "10000"), ("WEATHER_ADDR", "[::]:80")])),
            "[::]:80"
        );
        assert_eq!(
            resolve_addr_with(None, env_of(&[("PORT", "not-a-port")])),
            DEFAULT_ADDR
        );
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("https://a.example, https://b.example ,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(parse_origins(" , "), vec!["*"]);
    }
}
