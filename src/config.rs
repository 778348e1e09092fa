//! 起動時の設定解決
//!
//! 接続文字列は次の優先順位で決める。
//! 1. `DATABASE_URL`
//! 2. `POSTGRESQL_HOST`などの個別の環境変数
//! 3. 設定ファイル（`APP_SETTINGS`、既定は`appsettings.json`）の`PostgreSQL`セクション
//! 4. ローカル開発用の既定値

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_DB_PORT: u16 = 5432;

/// 設定のエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    /// URLの内容はパスワードを含みうるためメッセージに出さない
    #[error("Invalid DATABASE_URL")]
    InvalidDatabaseUrl(#[source] sqlx::Error),

    #[error("Failed to read settings file {path}")]
    ReadSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}")]
    ParseSettings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// PostgreSQLの接続設定
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostgresSettings {
    pub host: String,
    pub database: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
}

fn default_db_port() -> u16 {
    DEFAULT_DB_PORT
}

impl PostgresSettings {
    fn local_default() -> Self {
        Self {
            host: "localhost".to_string(),
            database: "booklendingdb".to_string(),
            username: "postgres".to_string(),
            password: String::new(),
            port: DEFAULT_DB_PORT,
        }
    }

    /// 接続オプションを組み立てる
    ///
    /// URLを経由しないので、ユーザー名やパスワードに`@`や`/`が含まれていてもよい。
    pub fn to_connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .database(&self.database);

        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(rename = "PostgreSQL")]
    postgresql: Option<PostgresSettings>,
}

/// 接続文字列の取得元（ログ出力用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSource {
    DatabaseUrl,
    Environment,
    SettingsFile,
    Default,
}

/// データベース接続の設定
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    connect_options: PgConnectOptions,
    pub source: ConnectionSource,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// プールに渡す接続オプション
    pub fn connect_options(&self) -> &PgConnectOptions {
        &self.connect_options
    }

    /// パスワードを含まない接続先の表記（ログ出力用）
    pub fn redacted(&self) -> String {
        let options = &self.connect_options;
        format!(
            "postgres://{}@{}:{}/{}",
            options.get_username(),
            options.get_host(),
            options.get_port(),
            options.get_database().unwrap_or_default()
        )
    }
}

/// アプリケーション全体の設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub port: u16,
    pub run_migrations: bool,
}

impl AppConfig {
    /// プロセスの環境変数から設定を解決する
    pub fn from_env() -> Result<Self> {
        Self::resolve(|name| std::env::var(name).ok())
    }

    /// 変数の取得方法を差し替えて設定を解決する
    pub fn resolve(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let (connect_options, source) = resolve_connection(&var)?;

        let max_connections = parse_or(&var, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let port = parse_or(&var, "PORT", DEFAULT_PORT)?;
        let run_migrations = parse_or(&var, "RUN_MIGRATIONS", false)?;

        Ok(Self {
            database: DatabaseConfig {
                connect_options,
                source,
                max_connections,
            },
            port,
            run_migrations,
        })
    }
}

fn resolve_connection(
    var: &impl Fn(&str) -> Option<String>,
) -> Result<(PgConnectOptions, ConnectionSource)> {
    if let Some(url) = non_empty(var("DATABASE_URL")) {
        let options = url
            .trim()
            .parse::<PgConnectOptions>()
            .map_err(ConfigError::InvalidDatabaseUrl)?;
        return Ok((options, ConnectionSource::DatabaseUrl));
    }

    if let Some(host) = non_empty(var("POSTGRESQL_HOST")) {
        let settings = PostgresSettings {
            host,
            database: non_empty(var("POSTGRESQL_DATABASE")).unwrap_or_else(|| "postgres".into()),
            username: non_empty(var("POSTGRESQL_USERNAME")).unwrap_or_else(|| "postgres".into()),
            password: var("POSTGRESQL_PASSWORD").unwrap_or_default(),
            port: parse_or(var, "POSTGRESQL_PORT", DEFAULT_DB_PORT)?,
        };
        return Ok((settings.to_connect_options(), ConnectionSource::Environment));
    }

    let path = non_empty(var("APP_SETTINGS"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));

    if let Some(settings) = load_settings_file(&path)? {
        return Ok((settings.to_connect_options(), ConnectionSource::SettingsFile));
    }

    Ok((
        PostgresSettings::local_default().to_connect_options(),
        ConnectionSource::Default,
    ))
}

/// 設定ファイルの`PostgreSQL`セクションを読む
///
/// ファイルが存在しない場合とセクションがない場合は`None`。
pub fn load_settings_file(path: &Path) -> Result<Option<PostgresSettings>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::ReadSettings {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let file: SettingsFile =
        serde_json::from_str(&contents).map_err(|source| ConfigError::ParseSettings {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(file.postgresql)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T> {
    match non_empty(var(name)) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn missing_settings_file() -> (&'static str, &'static str) {
        ("APP_SETTINGS", "/nonexistent/book-lending/appsettings.json")
    }

    #[test]
    fn test_database_url_takes_precedence() {
        let config = AppConfig::resolve(lookup(&[
            ("DATABASE_URL", "postgres://app@db/books"),
            ("POSTGRESQL_HOST", "ignored"),
        ]))
        .unwrap();

        let options = config.database.connect_options();
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_username(), "app");
        assert_eq!(options.get_database(), Some("books"));
        assert_eq!(config.database.source, ConnectionSource::DatabaseUrl);
    }

    #[test]
    fn test_unparseable_database_url_is_reported() {
        let result = AppConfig::resolve(lookup(&[("DATABASE_URL", "not a url")]));

        assert!(matches!(result, Err(ConfigError::InvalidDatabaseUrl(_))));
    }

    #[test]
    fn test_postgresql_variables_with_defaults() {
        let config = AppConfig::resolve(lookup(&[
            ("POSTGRESQL_HOST", "db.internal"),
            ("POSTGRESQL_PASSWORD", "secret"),
        ]))
        .unwrap();

        assert_eq!(
            config.database.redacted(),
            "postgres://postgres@db.internal:5432/postgres"
        );
        assert_eq!(config.database.source, ConnectionSource::Environment);
    }

    #[test]
    fn test_password_with_reserved_characters_keeps_host() {
        let config = AppConfig::resolve(lookup(&[
            ("POSTGRESQL_HOST", "db.internal"),
            ("POSTGRESQL_USERNAME", "lib:rary"),
            ("POSTGRESQL_PASSWORD", "p@ss/w#rd:1"),
        ]))
        .unwrap();

        let options = config.database.connect_options();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_username(), "lib:rary");
        assert_eq!(options.get_database(), Some("postgres"));
        assert!(!config.database.redacted().contains("p@ss"));
    }

    #[test]
    fn test_falls_back_to_local_default() {
        let config = AppConfig::resolve(lookup(&[missing_settings_file()])).unwrap();

        assert_eq!(
            config.database.redacted(),
            "postgres://postgres@localhost:5432/booklendingdb"
        );
        assert_eq!(config.database.source, ConnectionSource::Default);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_settings_file_section() {
        let path = std::env::temp_dir().join(format!(
            "book-lending-settings-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"PostgreSQL": {"Host": "files", "Database": "lib", "Username": "reader", "Password": "pw"}}"#,
        )
        .unwrap();

        let path_str = path.to_string_lossy().to_string();
        let config = AppConfig::resolve(lookup(&[("APP_SETTINGS", path_str.as_str())])).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            config.database.redacted(),
            "postgres://reader@files:5432/lib"
        );
        assert_eq!(config.database.source, ConnectionSource::SettingsFile);
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let result = AppConfig::resolve(lookup(&[missing_settings_file(), ("PORT", "http")]));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
    }

    #[test]
    fn test_numeric_and_flag_overrides() {
        let config = AppConfig::resolve(lookup(&[
            missing_settings_file(),
            ("PORT", "8080"),
            ("DATABASE_MAX_CONNECTIONS", "20"),
            ("RUN_MIGRATIONS", "true"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database.max_connections, 20);
        assert!(config.run_migrations);
    }
}
