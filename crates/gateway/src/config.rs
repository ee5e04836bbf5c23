//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//! 設定は起動時に一度だけ読み込まれ、以降は不変。

use std::fmt;
use std::path::Path;
use std::time::Duration;

use s3url_types::{DEFAULT_EXPIRY_SECS, MAX_PRESIGN_EXPIRY_SECS};

use crate::auth::TokenVerifier;
use crate::signer::UrlSigner;

/// サーバー名（起動ログに使用）
pub const SERVICE_NAME: &str = "s3-url-service";

/// JWTシークレットの既定値。本番環境では必ず上書きすること。
pub const DEFAULT_JWT_SECRET: &str = "secret";

/// 既定の待ち受けポート
pub const DEFAULT_PORT: u16 = 8080;

/// 署名処理の既定タイムアウト（秒）
pub const DEFAULT_SIGNING_TIMEOUT_SECS: u64 = 10;

/// 起動時に読み込む環境変数ファイル（作業ディレクトリからの相対パス）
pub const ENV_FILE: &str = "env/.env";

/// Debug出力で秘密値の代わりに表示する文字列
const REDACTED: &str = "<redacted>";

/// 設定エラー。起動時にのみ発生する。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 値の形式が不正
    #[error("{name}の値が不正です: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    /// 有効期限がSigV4の上限を超えている
    #[error("EXPIRESは{max}秒以下である必要があります: {value}")]
    ExpiryTooLong { value: u64, max: u32 },
}

/// S3署名用の接続設定。
#[derive(Clone)]
pub struct StorageConfig {
    /// リージョン（AWS_DEFAULT_REGION）
    pub region: String,
    /// S3互換エンドポイント（MinIO等）。Noneの場合はAWS S3
    pub endpoint: Option<String>,
    /// アクセスキーID
    pub access_key_id: Option<String>,
    /// シークレットアクセスキー
    pub secret_access_key: Option<String>,
    /// セッショントークン（一時クレデンシャル用）
    pub session_token: Option<String>,
}

/// Gatewayの設定。
#[derive(Clone)]
pub struct GatewayConfig {
    /// ベアラートークン検証用シークレット
    pub jwt_secret: String,
    /// trueの場合、トークンのないリクエストを拒否する
    pub credentials_required: bool,
    /// S3署名用の接続設定
    pub storage: StorageConfig,
    /// 署名付きURLおよびキャッシュの有効期限（秒）
    pub expiry_secs: u32,
    /// アップロード時に付与するSSE-KMSキーID
    pub sse_kms_key_id: Option<String>,
    /// 署名処理のタイムアウト
    pub signing_timeout: Duration,
    /// 待ち受けポート
    pub port: u16,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .finish()
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("jwt_secret", &REDACTED)
            .field("credentials_required", &self.credentials_required)
            .field("storage", &self.storage)
            .field("expiry_secs", &self.expiry_secs)
            .field("sse_kms_key_id", &self.sse_kms_key_id)
            .field("signing_timeout", &self.signing_timeout)
            .field("port", &self.port)
            .finish()
    }
}

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| REDACTED)
}

/// 環境変数ファイルを読み込む。ファイルがなければ何もしない。
///
/// 既にプロセス環境に設定されている変数は上書きしない。
/// 読み込めた場合に `true` を返す。
pub fn load_env_file(path: impl AsRef<Path>) -> bool {
    dotenv::from_path(path.as_ref()).is_ok()
}

impl GatewayConfig {
    /// 環境変数から構築する。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の変数ソースから構築する。空文字列は未設定として扱う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let credentials_required = match var("JWT_CREDENTIALS_REQUIRED") {
            Some(value) => parse_bool("JWT_CREDENTIALS_REQUIRED", &value)?,
            None => false,
        };

        let expiry_secs = match var("EXPIRES") {
            Some(value) => parse_expiry(&value)?,
            None => DEFAULT_EXPIRY_SECS,
        };

        let signing_timeout_secs = match var("SIGNING_TIMEOUT_SECS") {
            Some(value) => parse_positive("SIGNING_TIMEOUT_SECS", &value)?,
            None => DEFAULT_SIGNING_TIMEOUT_SECS,
        };

        let port = match var("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                value: value.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            credentials_required,
            storage: StorageConfig {
                region: var("AWS_DEFAULT_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                endpoint: var("S3_ENDPOINT"),
                access_key_id: var("AWS_ACCESS_KEY_ID"),
                secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
                session_token: var("AWS_SESSION_TOKEN"),
            },
            expiry_secs,
            sse_kms_key_id: var("AWS_SSE_KMS_KEY_ID"),
            signing_timeout: Duration::from_secs(signing_timeout_secs),
            port,
        })
    }

    /// 既定のJWTシークレットのまま起動しようとしているか。
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "true/false を指定してください".to_string(),
        }),
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    let parsed = value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if parsed == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "1以上である必要があります".to_string(),
        });
    }
    Ok(parsed)
}

fn parse_expiry(value: &str) -> Result<u32, ConfigError> {
    let secs = parse_positive("EXPIRES", value)?;
    if secs > u64::from(MAX_PRESIGN_EXPIRY_SECS) {
        return Err(ConfigError::ExpiryTooLong {
            value: secs,
            max: MAX_PRESIGN_EXPIRY_SECS,
        });
    }
    Ok(secs as u32)
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// 起動時に確定した設定
    pub config: GatewayConfig,
    /// 署名付きURL生成器（S3等、トレイトで抽象化）
    pub signer: Box<dyn UrlSigner>,
    /// ベアラートークン検証器
    pub verifier: Box<dyn TokenVerifier>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.jwt_secret, "secret");
        assert!(config.uses_default_secret());
        assert!(!config.credentials_required);
        assert_eq!(config.storage.region, "us-east-1");
        assert!(config.storage.endpoint.is_none());
        assert_eq!(config.expiry_secs, 604_800);
        assert!(config.sse_kms_key_id.is_none());
        assert_eq!(config.signing_timeout, Duration::from_secs(10));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_full_environment() {
        let config = config_from(&[
            ("JWT_SECRET", "s3cr3t"),
            ("JWT_CREDENTIALS_REQUIRED", "TRUE"),
            ("AWS_DEFAULT_REGION", "eu-west-1"),
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMI"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("EXPIRES", "3600"),
            ("AWS_SSE_KMS_KEY_ID", "alias/uploads"),
            ("SIGNING_TIMEOUT_SECS", "3"),
            ("PORT", "9090"),
        ])
        .unwrap();
        assert!(!config.uses_default_secret());
        assert!(config.credentials_required);
        assert_eq!(config.storage.region, "eu-west-1");
        assert_eq!(config.storage.access_key_id.as_deref(), Some("AKIDEXAMPLE"));
        assert_eq!(config.storage.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.expiry_secs, 3600);
        assert_eq!(config.sse_kms_key_id.as_deref(), Some("alias/uploads"));
        assert_eq!(config.signing_timeout, Duration::from_secs(3));
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = config_from(&[("AWS_SSE_KMS_KEY_ID", ""), ("EXPIRES", " ")]).unwrap();
        assert!(config.sse_kms_key_id.is_none());
        assert_eq!(config.expiry_secs, 604_800);
    }

    #[test]
    fn test_expiry_bounds() {
        assert_eq!(config_from(&[("EXPIRES", "604800")]).unwrap().expiry_secs, 604_800);
        assert!(matches!(
            config_from(&[("EXPIRES", "604801")]),
            Err(ConfigError::ExpiryTooLong { value: 604_801, .. })
        ));
        assert!(matches!(
            config_from(&[("EXPIRES", "0")]),
            Err(ConfigError::Invalid { name: "EXPIRES", .. })
        ));
        assert!(matches!(
            config_from(&[("EXPIRES", "one week")]),
            Err(ConfigError::Invalid { name: "EXPIRES", .. })
        ));
    }

    #[test]
    fn test_credentials_required_parsing() {
        for (value, expected) in [("true", true), ("Yes", true), ("1", true), ("false", false), ("0", false)] {
            let config = config_from(&[("JWT_CREDENTIALS_REQUIRED", value)]).unwrap();
            assert_eq!(config.credentials_required, expected, "value = {value}");
        }
        assert!(config_from(&[("JWT_CREDENTIALS_REQUIRED", "maybe")]).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = config_from(&[
            ("JWT_SECRET", "jwt-s3cr3t-value"),
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMI-secret"),
            ("AWS_SESSION_TOKEN", "FwoGZXIvYXdzEXAMPLE"),
        ])
        .unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("jwt-s3cr3t-value"), "debug = {debug}");
        assert!(!debug.contains("wJalrXUtnFEMI-secret"), "debug = {debug}");
        assert!(!debug.contains("FwoGZXIvYXdzEXAMPLE"), "debug = {debug}");
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("AKIDEXAMPLE"));

        // 未設定の秘密値はNoneのまま表示する
        let debug = format!("{:?}", config_from(&[]).unwrap().storage);
        assert!(debug.contains("session_token: None"), "debug = {debug}");
    }

    #[test]
    fn test_load_env_file() {
        let dir = std::env::temp_dir().join(format!("s3url-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        std::fs::write(
            &path,
            "S3URL_TEST_ENV_FILE_VALUE=from-file\nS3URL_TEST_ENV_FILE_PRESET=from-file\n",
        )
        .unwrap();
        std::env::set_var("S3URL_TEST_ENV_FILE_PRESET", "from-process");

        assert!(load_env_file(&path));
        assert_eq!(std::env::var("S3URL_TEST_ENV_FILE_VALUE").unwrap(), "from-file");
        // プロセス環境の値が優先される
        assert_eq!(
            std::env::var("S3URL_TEST_ENV_FILE_PRESET").unwrap(),
            "from-process"
        );

        assert!(!load_env_file(dir.join("missing.env")));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
