use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Supports ${ENV_VAR} substitution. Absent or empty means the
    /// feedback collaborator is never invoked.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SandboxConfig {
    /// Interpreter used to run submitted code
    #[serde(default = "default_interpreter")]
    pub interpreter: PathBuf,
    /// Wall-clock bound on one execution, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Directory for ephemeral script files (system temp dir when unset)
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_interpreter() -> PathBuf {
    PathBuf::from("python3")
}

fn default_timeout_seconds() -> u64 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout_seconds: default_timeout_seconds(),
            work_dir: None,
        }
    }
}

impl LlmConfig {
    /// The feedback collaborator only runs when a non-empty key is set
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // Expand environment variables like ${GEMINI_API_KEY}. Unset
        // variables expand to empty: a missing key must degrade to the
        // "feedback not configured" path, not abort startup.
        let expanded = shellexpand::env_with_context_no_errors(&content, |var| {
            Some(std::env::var(var).unwrap_or_default())
        });
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.llm.max_output_tokens, 2048);
        assert_eq!(config.sandbox.interpreter, PathBuf::from("python3"));
        assert_eq!(config.sandbox.timeout_seconds, 5);
        assert!(config.sandbox.work_dir.is_none());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sandbox]
            timeout_seconds = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.sandbox.timeout_seconds, 2);
        assert_eq!(config.sandbox.interpreter, PathBuf::from("python3"));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [llm]
            model = "gemini-2.0-flash"
            api_key = "test-key"
            max_output_tokens = 1024

            [sandbox]
            interpreter = "/usr/bin/python3"
            timeout_seconds = 10
            work_dir = "/tmp/pytutor"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.llm.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.llm.max_output_tokens, 1024);
        assert_eq!(config.sandbox.work_dir, Some(PathBuf::from("/tmp/pytutor")));
    }

    // ── load / env expansion tests ──────────────────────

    #[test]
    fn test_load_unset_env_var_expands_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pytutor.toml");
        std::fs::write(
            &path,
            "[llm]\napi_key = \"${PYTUTOR_TEST_UNSET_VAR}\"\n",
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some(""));
        assert!(!config.llm.is_configured());
    }

    #[test]
    fn test_load_set_env_var_is_substituted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pytutor.toml");
        // PATH is always present
        std::fs::write(&path, "[llm]\nmodel = \"${PATH}\"\n").unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.llm.model, std::env::var("PATH").unwrap());
    }

    #[test]
    fn test_shipped_config_loads_without_key_exported() {
        // The default config references ${GEMINI_API_KEY} (and mentions
        // ${ENV_VAR} in a comment); it must parse whether or not the
        // variable is exported.
        let config = Config::load("config/pytutor.toml").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sandbox.timeout_seconds, 5);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(Config::load("config/does-not-exist.toml").is_err());
    }

    // ── is_configured tests ─────────────────────────────

    #[test]
    fn test_is_configured_with_key() {
        let llm = LlmConfig {
            api_key: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(llm.is_configured());
    }

    #[test]
    fn test_is_configured_missing_key() {
        assert!(!LlmConfig::default().is_configured());
    }

    #[test]
    fn test_is_configured_empty_key() {
        let llm = LlmConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(!llm.is_configured());
    }
}
