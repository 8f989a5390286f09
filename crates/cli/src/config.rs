use anyhow::Context as _;
use serde::Deserialize;
use specbridge_http_tools::config::RuntimeConfig;
use specbridge_openapi_tools::config::{SpecSource, ToolOverridePolicy};
use std::path::Path;

/// Everything the binary needs: where the spec is, how to reach the API, and operator overrides.
///
/// ```yaml
/// source:
///   spec: ./petstore.yaml
///   specHash: sha256:...
/// server:
///   baseUrl: https://api.example.com
///   auth: { mode: bearer, token: ... }
/// overrides:
///   exclude: [deletePet]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub source: SpecSource,
    #[serde(default)]
    pub server: RuntimeConfig,
    #[serde(default)]
    pub overrides: ToolOverridePolicy,
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: AppConfig =
        serde_yaml::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use specbridge_http_tools::config::AuthMode;
    use std::io::Write as _;

    #[test]
    fn loads_full_config() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(
            br"
source:
  spec: https://example.com/openapi.json
  specHashPolicy: fail
server:
  auth:
    mode: bearer
    token: abc
  network:
    timeoutSecs: 5
overrides:
  includeOnly: [listPets]
",
        )
        .expect("write");

        let cfg = load_config(file.path()).expect("loads");
        assert!(cfg.source.is_url());
        assert_eq!(cfg.server.auth.mode, AuthMode::Bearer);
        assert_eq!(cfg.server.network.timeout_secs, 5);
        assert!(cfg.server.base_url.is_none());
        assert!(cfg.overrides.include_only.contains("listPets"));
    }

    #[test]
    fn server_and_overrides_are_optional() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"source: { spec: ./petstore.yaml }\n")
            .expect("write");
        let cfg = load_config(file.path()).expect("loads");
        assert_eq!(cfg.server.auth.mode, AuthMode::None);
        assert!(cfg.overrides.tools.is_empty());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_config(Path::new("/no/such/specbridge.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("/no/such/specbridge.yaml"));
    }
}
