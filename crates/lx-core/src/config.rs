//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. lx-gateway.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::schema::DEFAULT_FIELDS;

/// Oracle provider type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    /// Google Generative Language API
    #[default]
    Gemini,
    /// OpenAI-compatible API
    OpenAi,
}

/// Oracle (generative extraction) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// API key
    pub api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API provider
    #[serde(default)]
    pub provider: OracleProvider,

    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            provider: OracleProvider::Gemini,
            base_url: None,
            timeout_secs: default_oracle_timeout(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_oracle_timeout() -> u64 {
    120
}

/// Mailbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// IMAP host
    #[serde(default = "default_mail_host")]
    pub host: String,

    /// IMAP port
    #[serde(default = "default_mail_port")]
    pub port: u16,

    /// Mailbox account address
    #[serde(default)]
    pub user: String,

    /// Path to a JSON token file maintained by the external OAuth flow
    pub token_file: Option<String>,

    /// Cap on candidate messages per run
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Recency window in hours
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,

    /// Per-operation timeout in seconds
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            host: default_mail_host(),
            port: default_mail_port(),
            user: String::new(),
            token_file: None,
            max_candidates: default_max_candidates(),
            window_hours: default_window_hours(),
            timeout_secs: default_mail_timeout(),
        }
    }
}

fn default_mail_host() -> String {
    "imap.gmail.com".to_string()
}

fn default_mail_port() -> u16 {
    993
}

fn default_max_candidates() -> usize {
    10
}

fn default_window_hours() -> i64 {
    24
}

fn default_mail_timeout() -> u64 {
    30
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API key for HTTP API authentication
    pub key: Option<String>,

    /// Port for HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            port: default_api_port(),
            allowed_origins: None,
        }
    }
}

fn default_api_port() -> u16 {
    3000
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the persisted JSON record file
    #[serde(default = "default_data_path")]
    pub data_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
        }
    }
}

fn default_data_path() -> String {
    "data/records.json".to_string()
}

/// Extraction field configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsConfig {
    /// Field names extracted by default
    #[serde(default = "default_field_names")]
    pub default_fields: Vec<String>,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            default_fields: default_field_names(),
        }
    }
}

fn default_field_names() -> Vec<String> {
    DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
}

/// Main configuration for lx-gateway
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Oracle configuration
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Mailbox configuration
    #[serde(default)]
    pub mailbox: MailboxConfig,

    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Extraction field configuration
    #[serde(default)]
    pub fields: FieldsConfig,
}

/// TOML 設定ファイルのミラー構造
#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    oracle: Option<TomlOracle>,
    mailbox: Option<TomlMailbox>,
    api: Option<TomlApi>,
    store: Option<TomlStore>,
    fields: Option<TomlFields>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlOracle {
    api_key: Option<String>,
    model: Option<String>,
    provider: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlMailbox {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    token_file: Option<String>,
    max_candidates: Option<usize>,
    window_hours: Option<i64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlApi {
    key: Option<String>,
    port: Option<u16>,
    allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlStore {
    data_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlFields {
    default_fields: Option<Vec<String>>,
}

impl Config {
    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '}' {
                        chars.next(); // '}' を消費
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換され、
    /// 既存の環境変数が最終的に優先されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let config: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {e}")))?;

        let mut cfg = Self::from_toml_config(config);
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// カレントディレクトリの `lx-gateway.toml` を試し、
    /// 見つからない場合は環境変数のみから読み込みます。
    pub fn load() -> crate::Result<Self> {
        if Path::new("lx-gateway.toml").exists() {
            return Self::from_toml_file("lx-gateway.toml");
        }

        Self::from_env()
    }

    /// TOML 構造から Config を構築
    fn from_toml_config(toml: TomlConfig) -> Self {
        let oracle = toml.oracle.unwrap_or_default();
        let oracle_config = OracleConfig {
            api_key: oracle.api_key.unwrap_or_default(),
            model: oracle.model.unwrap_or_else(default_model),
            provider: parse_provider(oracle.provider.as_deref()),
            base_url: oracle.base_url,
            timeout_secs: oracle.timeout_secs.unwrap_or_else(default_oracle_timeout),
        };

        let mailbox = toml.mailbox.unwrap_or_default();
        let mailbox_config = MailboxConfig {
            host: mailbox.host.unwrap_or_else(default_mail_host),
            port: mailbox.port.unwrap_or_else(default_mail_port),
            user: mailbox.user.unwrap_or_default(),
            token_file: mailbox.token_file,
            max_candidates: mailbox.max_candidates.unwrap_or_else(default_max_candidates),
            window_hours: mailbox.window_hours.unwrap_or_else(default_window_hours),
            timeout_secs: mailbox.timeout_secs.unwrap_or_else(default_mail_timeout),
        };

        let api = toml.api.unwrap_or_default();
        let api_config = ApiConfig {
            key: api.key,
            port: api.port.unwrap_or_else(default_api_port),
            allowed_origins: api.allowed_origins,
        };

        let store = toml.store.unwrap_or_default();
        let store_config = StoreConfig {
            data_path: store.data_path.unwrap_or_else(default_data_path),
        };

        let fields = toml.fields.unwrap_or_default();
        let fields_config = FieldsConfig {
            default_fields: fields.default_fields.unwrap_or_else(default_field_names),
        };

        Config {
            oracle: oracle_config,
            mailbox: mailbox_config,
            api: api_config,
            store: store_config,
            fields: fields_config,
        }
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var("ORACLE_API_KEY") {
            self.oracle.api_key = api_key;
        } else if let Ok(api_key) = std::env::var("LLM_API_KEY") {
            self.oracle.api_key = api_key;
        }

        if let Ok(model) = std::env::var("ORACLE_MODEL") {
            if !model.is_empty() {
                self.oracle.model = model;
            }
        }

        if let Ok(provider) = std::env::var("ORACLE_PROVIDER") {
            if !provider.is_empty() {
                self.oracle.provider = parse_provider(Some(&provider));
            }
        }

        if let Ok(base_url) = std::env::var("ORACLE_BASE_URL") {
            if !base_url.is_empty() {
                self.oracle.base_url = Some(base_url);
            }
        }

        if let Ok(host) = std::env::var("MAILBOX_HOST") {
            self.mailbox.host = host;
        }
        if let Ok(port) = std::env::var("MAILBOX_PORT") {
            if let Ok(p) = port.parse() {
                self.mailbox.port = p;
            }
        }
        if let Ok(user) = std::env::var("MAILBOX_USER") {
            self.mailbox.user = user;
        }
        if let Ok(path) = std::env::var("MAIL_TOKEN_FILE") {
            self.mailbox.token_file = Some(path);
        }
        if let Ok(max) = std::env::var("MAILBOX_MAX_CANDIDATES") {
            if let Ok(m) = max.parse() {
                self.mailbox.max_candidates = m;
            }
        }

        if let Ok(key) = std::env::var("API_KEY") {
            self.api.key = Some(key);
        }
        if let Ok(port) = std::env::var("API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Ok(origins) = std::env::var("API_ALLOWED_ORIGINS") {
            self.api.allowed_origins =
                Some(origins.split(',').map(|s| s.trim().to_string()).collect());
        }

        if let Ok(path) = std::env::var("RECORDS_PATH") {
            self.store.data_path = path;
        }

        if let Ok(fields) = std::env::var("EXTRACT_FIELDS") {
            let fields: Vec<String> = fields
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !fields.is_empty() {
                self.fields.default_fields = fields;
            }
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let api_key = std::env::var("ORACLE_API_KEY")
            .or_else(|_| std::env::var("LLM_API_KEY"))
            .map_err(|_| Error::Config("ORACLE_API_KEY or LLM_API_KEY not set".to_string()))?;

        let mut config = Config {
            oracle: OracleConfig {
                api_key,
                ..OracleConfig::default()
            },
            ..Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }
}

fn parse_provider(value: Option<&str>) -> OracleProvider {
    match value.unwrap_or_default().to_lowercase().as_str() {
        "openai" | "glm" | "zai" => OracleProvider::OpenAi,
        _ => OracleProvider::Gemini,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: 並列テストと衝突しないユニークな変数名を使う
        unsafe { std::env::set_var("LX_TEST_EXPAND_VAR", "secret") };
        let expanded = Config::expand_env_vars("key = \"${LX_TEST_EXPAND_VAR}\"");
        assert_eq!(expanded, "key = \"secret\"");
    }

    #[test]
    fn test_expand_missing_var_becomes_empty() {
        let expanded = Config::expand_env_vars("key = \"${LX_TEST_NO_SUCH_VAR}\"");
        assert_eq!(expanded, "key = \"\"");
    }

    #[test]
    fn test_from_toml_config_defaults() {
        let config = Config::from_toml_config(TomlConfig::default());
        assert_eq!(config.oracle.model, "gemini-2.0-flash");
        assert_eq!(config.oracle.provider, OracleProvider::Gemini);
        assert_eq!(config.mailbox.host, "imap.gmail.com");
        assert_eq!(config.mailbox.max_candidates, 10);
        assert_eq!(config.mailbox.window_hours, 24);
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.store.data_path, "data/records.json");
        assert_eq!(config.fields.default_fields.len(), 5);
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!(parse_provider(Some("openai")), OracleProvider::OpenAi);
        assert_eq!(parse_provider(Some("gemini")), OracleProvider::Gemini);
        assert_eq!(parse_provider(None), OracleProvider::Gemini);
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_src = r#"
            [oracle]
            api_key = "test-key"
            provider = "openai"

            [mailbox]
            user = "dispatch@example.com"
            max_candidates = 5

            [fields]
            default_fields = ["shipment_id", "carrier"]
        "#;
        let parsed: TomlConfig = toml::from_str(toml_src).unwrap();
        let config = Config::from_toml_config(parsed);
        assert_eq!(config.oracle.api_key, "test-key");
        assert_eq!(config.oracle.provider, OracleProvider::OpenAi);
        assert_eq!(config.mailbox.user, "dispatch@example.com");
        assert_eq!(config.mailbox.max_candidates, 5);
        assert_eq!(config.fields.default_fields, vec!["shipment_id", "carrier"]);
    }
}
