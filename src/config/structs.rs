use chrono::{FixedOffset, Offset};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumMessage};

/// Cookie SameSite policy for the session cookie.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    EnumIter,
    AsRefStr,
    EnumMessage,
)]
#[serde(rename_all = "PascalCase")]
#[strum(serialize_all = "PascalCase")]
pub enum SameSitePolicy {
    #[strum(message = "Only same-site requests carry the session cookie")]
    Strict,
    #[default]
    #[strum(message = "Top-level navigation carries the session cookie")]
    Lax,
    #[strum(message = "No restrictions, requires Secure")]
    None,
}

impl std::fmt::Display for SameSitePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl std::str::FromStr for SameSitePolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            _ => Err(format!(
                "Invalid SameSite policy: '{}'. Valid: Strict, Lax, None",
                s
            )),
        }
    }
}

/// Where outgoing mail goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmailBackend {
    Smtp,
    /// Messages are written to the log instead of being sent.
    #[default]
    Console,
}

/// Transport security for the SMTP backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SmtpTls {
    None,
    #[default]
    StartTls,
    Tls,
}

/// Static configuration, loaded once from TOML and environment.
///
/// Values that staff may change while the server runs (reward amounts,
/// page sizes, token lifetimes) live in the database instead and are read
/// through [`crate::config::RuntimeConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StaticConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub email: EmailConfig,
    pub site: SiteConfig,
    pub auth: AuthConfig,
}

impl StaticConfig {
    /// Load configuration from `config.toml` and the environment.
    ///
    /// Priority: ENV > config.toml > defaults. Environment variables use
    /// the `MJ` prefix and `__` as separator, e.g. `MJ__SERVER__PORT=9999`.
    pub fn load() -> Self {
        use config::{Config, Environment, File};

        let path = "config.toml";

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("MJ")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Every section falls back field by field to its `Default`, so a
/// `config.toml` only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Worker threads for the HTTP server.
    pub cpu_count: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            cpu_count: num_cpus::get(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `sqlite://`, `mysql://`, `mariadb://` or `postgres://`; a bare
    /// `*.db` path means SQLite.
    pub database_url: String,
    pub pool_size: u32,
    /// Connect and acquire timeout, in seconds.
    pub timeout: u64,
    pub retry_count: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "majazamooz.db".into(),
            pool_size: 10,
            timeout: 30,
            retry_count: 3,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
    pub file: Option<String>,
    pub max_backups: u32,
    pub enable_rotation: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
            file: None,
            max_backups: 5,
            enable_rotation: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub backend: EmailBackend,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub tls: SmtpTls,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            backend: EmailBackend::Console,
            host: "localhost".into(),
            port: 587,
            username: None,
            password: None,
            from: "Majazamooz <no-reply@localhost>".into(),
            tls: SmtpTls::StartTls,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute origin used in links inside e-mails.
    pub base_url: String,
    /// Offset of the site's wall clock from UTC. Tehran is +03:30.
    pub utc_offset_minutes: i32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            utc_offset_minutes: 210,
        }
    }
}

impl SiteConfig {
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| chrono::Utc.fix())
    }

    /// Join a site-relative path onto `base_url`.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_secure: bool,
    pub cookie_same_site: SameSitePolicy,
    pub cookie_domain: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_secure: true,
            cookie_same_site: SameSitePolicy::Lax,
            cookie_domain: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_timezone_defaults_to_tehran() {
        let site = SiteConfig::default();
        assert_eq!(site.timezone().local_minus_utc(), 210 * 60);
    }

    #[test]
    fn absolute_url_joins_without_double_slash() {
        let site = SiteConfig {
            base_url: "https://majazamooz.ir/".to_string(),
            utc_offset_minutes: 0,
        };
        assert_eq!(
            site.absolute_url("/tutorial/rust"),
            "https://majazamooz.ir/tutorial/rust"
        );
    }

    #[test]
    fn sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.email.backend, EmailBackend::Console);
        assert_eq!(parsed.email.tls, SmtpTls::StartTls);
        assert_eq!(parsed.site.utc_offset_minutes, 210);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let parsed: StaticConfig = toml::from_str(
            "[database]\nretry_count = 9\n\n[site]\nbase_url = \"https://majazamooz.ir\"\n",
        )
        .unwrap();
        assert_eq!(parsed.database.retry_count, 9);
        assert_eq!(parsed.database.pool_size, 10);
        assert_eq!(parsed.site.utc_offset_minutes, 210);
        assert!(parsed.auth.cookie_secure);
    }

    #[test]
    fn same_site_parses_case_insensitively() {
        assert_eq!("strict".parse::<SameSitePolicy>(), Ok(SameSitePolicy::Strict));
        assert!("bogus".parse::<SameSitePolicy>().is_err());
    }
}
