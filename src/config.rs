use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub stats: StatsConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Connection to the management server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Skip TLS certificate verification (self-signed lab servers).
    pub insecure: bool,
    pub timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 443,
            username: String::new(),
            password: String::new(),
            insecure: true,
            timeout_secs: 30,
        }
    }
}

/// Stats query tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Historical sampling interval used by reports, seconds.
    pub historical_interval_secs: i32,
    /// Provider aggregation lag compensation (accepts "4h", "14400").
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub historical_delay_secs: u64,
    /// Counter ids pulled as historical series in VM reports.
    pub vm_historical_counters: Vec<i32>,
    /// Counter ids pulled as historical series in host reports.
    pub host_historical_counters: Vec<i32>,
    /// Directory for counter catalog exports.
    pub export_dir: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            historical_interval_secs: 7200,
            historical_delay_secs: 4 * 3600,
            // Disk throughput counters observed on the test server.
            vm_historical_counters: vec![266, 267, 268, 269],
            host_historical_counters: vec![215, 216],
            export_dir: "metrics".to_string(),
        }
    }
}

/// Periodic report loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Seconds between report rounds (accepts "20s", "5m").
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub interval_secs: u64,
    pub enabled: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { interval_secs: 20, enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,vsphere_monitor=debug".to_string(), file: None }
    }
}

/// Command line arguments for configuration overrides
#[derive(Parser, Debug, Clone)]
#[command(name = "vigil")]
#[command(version, about = "Vigil - vSphere Infrastructure Monitor")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Management server hostname (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Management server port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Login username (overrides config file)
    #[arg(long, value_name = "USER")]
    pub username: Option<String>,

    /// Login password (overrides config file)
    #[arg(long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Skip TLS certificate verification (overrides config file)
    #[arg(long, value_name = "BOOL")]
    pub insecure: Option<bool>,

    /// Logging level (overrides config file, e.g., "info,vsphere_monitor=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Report round interval (overrides config file, e.g., "20s", "5m")
    #[arg(long, value_name = "DURATION")]
    pub report_interval: Option<String>,

    /// Enable/disable the periodic report loop (overrides config file)
    #[arg(long, value_name = "BOOL")]
    pub report_enabled: Option<bool>,
}

impl Config {
    /// Load configuration with command line, environment variable, and file
    /// support.
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with VIGIL_)
    /// 3. Configuration file (config.toml)
    /// 4. Default values
    pub fn load() -> Result<Self, anyhow::Error> {
        let cli_args = CommandLineArgs::parse();

        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.apply_cli_overrides(&cli_args);
        config.validate()?;

        Ok(config)
    }

    fn find_config_file() -> Option<String> {
        for candidate in ["config.toml", "conf/config.toml"] {
            if Path::new(candidate).exists() {
                return Some(candidate.to_string());
            }
        }
        None
    }

    pub fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        let config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path, e))?;
        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VIGIL_HOST: Management server hostname
    /// - VIGIL_PORT: Management server port (default: 443)
    /// - VIGIL_USERNAME: Login username
    /// - VIGIL_PASSWORD: Login password
    /// - VIGIL_INSECURE: Skip TLS verification (true/false)
    /// - VIGIL_LOG_LEVEL: Logging level
    /// - VIGIL_REPORT_INTERVAL: Report interval (accepts "20s", "5m")
    /// - VIGIL_REPORT_ENABLED: Enable the report loop (true/false)
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("VIGIL_HOST") {
            self.connection.host = host;
        }
        if let Ok(port) = std::env::var("VIGIL_PORT")
            && let Ok(port) = port.parse()
        {
            self.connection.port = port;
        }
        if let Ok(username) = std::env::var("VIGIL_USERNAME") {
            self.connection.username = username;
        }
        if let Ok(password) = std::env::var("VIGIL_PASSWORD") {
            self.connection.password = password;
        }
        if let Ok(insecure) = std::env::var("VIGIL_INSECURE")
            && let Ok(insecure) = insecure.parse()
        {
            self.connection.insecure = insecure;
        }
        if let Ok(level) = std::env::var("VIGIL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(interval) = std::env::var("VIGIL_REPORT_INTERVAL")
            && let Ok(secs) = parse_duration_to_secs(&interval)
        {
            self.report.interval_secs = secs;
        }
        if let Ok(enabled) = std::env::var("VIGIL_REPORT_ENABLED")
            && let Ok(enabled) = enabled.parse()
        {
            self.report.enabled = enabled;
        }
    }

    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(host) = &args.host {
            self.connection.host = host.clone();
        }
        if let Some(port) = args.port {
            self.connection.port = port;
        }
        if let Some(username) = &args.username {
            self.connection.username = username.clone();
        }
        if let Some(password) = &args.password {
            self.connection.password = password.clone();
        }
        if let Some(insecure) = args.insecure {
            self.connection.insecure = insecure;
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if let Some(interval) = &args.report_interval
            && let Ok(secs) = parse_duration_to_secs(interval)
        {
            self.report.interval_secs = secs;
        }
        if let Some(enabled) = args.report_enabled {
            self.report.enabled = enabled;
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.connection.host.is_empty() {
            anyhow::bail!("connection.host must be set (VIGIL_HOST or --host)");
        }
        if self.connection.username.is_empty() {
            anyhow::bail!("connection.username must be set (VIGIL_USERNAME or --username)");
        }
        if self.report.interval_secs == 0 {
            anyhow::bail!("report.interval_secs must be greater than zero");
        }
        if self.stats.historical_interval_secs <= 0 {
            anyhow::bail!("stats.historical_interval_secs must be greater than zero");
        }
        Ok(())
    }
}

fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Ok(n),
        "m" | "min" | "mins" | "minute" | "minutes" => Ok(n * 60),
        "h" | "hr" | "hour" | "hours" => Ok(n * 60 * 60),
        "d" | "day" | "days" => Ok(n * 60 * 60 * 24),
        _ => Err(format!("unsupported unit: {}", unit)),
    }
}

fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '30s', '5m', '1h'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
        fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(&v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_strings() {
        assert_eq!(parse_duration_to_secs("30").unwrap(), 30);
        assert_eq!(parse_duration_to_secs("20s").unwrap(), 20);
        assert_eq!(parse_duration_to_secs("5m").unwrap(), 300);
        assert_eq!(parse_duration_to_secs("4h").unwrap(), 4 * 3600);
        assert!(parse_duration_to_secs("soon").is_err());
    }

    #[test]
    fn test_toml_sections_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [connection]
            host = "vcenter.lab"
            username = "monitor"
            password = "secret"

            [report]
            interval_secs = "1m"
            "#,
        )
        .unwrap();

        assert_eq!(config.connection.host, "vcenter.lab");
        assert_eq!(config.connection.port, 443);
        assert_eq!(config.report.interval_secs, 60);
        assert_eq!(config.stats.historical_interval_secs, 7200);
        assert_eq!(config.stats.vm_historical_counters, vec![266, 267, 268, 269]);
    }
}
