//! Configuration surface, realized as a single `clap::Parser` struct so
//! every field is settable from either a CLI flag or its `env` name —
//! the process may run under a supervisor that only sets environment
//! variables, never passes argv.

use clap::{Parser, ValueEnum};
use geoscan_domain_models::{Account, Proxy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EncounterMode {
    None,
    Notifying,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "scanner", about = "Distributed map-scanning engine")]
pub struct ScannerConfig {
    /// Local libSQL file path, `file::memory:?cache=shared`, or a
    /// `libsql://`/`https://` remote endpoint.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, env = "TURSO_AUTH_TOKEN")]
    pub database_access_token: Option<String>,

    #[arg(long, env = "GRID_ROWS", default_value_t = 4)]
    pub grid_rows: usize,

    #[arg(long, env = "GRID_COLS", default_value_t = 4)]
    pub grid_cols: usize,

    #[arg(long, env = "MAP_START_LAT", allow_hyphen_values = true)]
    pub map_start_lat: f64,
    #[arg(long, env = "MAP_START_LON", allow_hyphen_values = true)]
    pub map_start_lon: f64,
    #[arg(long, env = "MAP_END_LAT", allow_hyphen_values = true)]
    pub map_end_lat: f64,
    #[arg(long, env = "MAP_END_LON", allow_hyphen_values = true)]
    pub map_end_lon: f64,

    /// `username:password:provider` triplets.
    #[arg(long, env = "ACCOUNTS", value_delimiter = ',')]
    pub accounts: Vec<String>,

    #[arg(long, env = "PROXIES", value_delimiter = ',')]
    pub proxies: Vec<String>,

    #[arg(long, env = "NOTIFY_IDS", value_delimiter = ',')]
    pub notify_ids: Vec<u32>,

    #[arg(long, env = "MAX_CAPTCHAS", default_value_t = 0)]
    pub max_captchas: usize,

    #[arg(long, env = "ENCOUNTER", value_enum, default_value_t = EncounterMode::None)]
    pub encounter: EncounterMode,

    #[arg(long, env = "NOTIFY", default_value_t = false)]
    pub notify: bool,

    #[arg(long, env = "SPIN_POKESTOPS", default_value_t = false)]
    pub spin_pokestops: bool,

    #[arg(long, env = "SPIN_COOLDOWN", default_value_t = 300)]
    pub spin_cooldown_seconds: i64,

    #[arg(long, env = "MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    #[arg(long, env = "GIVE_UP_KNOWN", default_value_t = 60)]
    pub give_up_known_seconds: u64,

    #[arg(long, env = "GIVE_UP_UNKNOWN", default_value_t = 20)]
    pub give_up_unknown_seconds: u64,

    #[arg(long, env = "SKIP_SPAWN", default_value_t = 90)]
    pub skip_spawn_seconds: i64,

    #[arg(long, env = "SCAN_DELAY", default_value_t = 10)]
    pub scan_delay_seconds: u64,

    #[arg(long, env = "SPEED_LIMIT", default_value_t = 19.0)]
    pub speed_limit_mph: f64,

    #[arg(long, env = "SIMULTANEOUS_LOGINS", default_value_t = 2)]
    pub simultaneous_logins: usize,

    /// Open question (a): exact shuffle cadence was a heuristic in the
    /// source; kept, exposed as a knob.
    #[arg(long, env = "MATCHER_SHUFFLE_PERIOD", default_value_t = 500)]
    pub matcher_shuffle_period: usize,

    #[arg(long, env = "DESIRED_FREQUENCY_LOW", default_value_t = 5.0)]
    pub desired_frequency_low_seconds: f64,
    #[arg(long, env = "DESIRED_FREQUENCY_HIGH", default_value_t = 30.0)]
    pub desired_frequency_high_seconds: f64,

    #[arg(long, env = "VIEWER_BIND_ADDR", default_value = "127.0.0.1:9001")]
    pub viewer_bind_addr: String,

    #[arg(long, env = "VIEWER_AUTH_KEY")]
    pub viewer_auth_key: Option<String>,

    /// Base URL of the sidecar process that actually speaks the
    /// upstream geospatial API's wire protocol.
    #[arg(long, env = "UPSTREAM_BASE_URL", default_value = "http://127.0.0.1:17050")]
    pub upstream_base_url: String,

    #[arg(long, env = "SPAWN_SNAPSHOT_PATH", default_value = "spawns.snapshot.json")]
    pub spawn_snapshot_path: String,

    #[arg(long, env = "ACCOUNTS_SNAPSHOT_PATH", default_value = "accounts.snapshot.json")]
    pub accounts_snapshot_path: String,

    #[arg(long, env = "BOOTSTRAP_DENSITY", default_value_t = 2)]
    pub bootstrap_density_multiplier: usize,

    #[arg(long, default_value_t = false)]
    pub no_status_bar: bool,

    #[arg(long, value_enum, env = "LOG_LEVEL", default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[arg(long, default_value_t = false)]
    pub bootstrap: bool,

    #[arg(long, default_value_t = false)]
    pub no_pickle: bool,
}

impl LogLevel {
    fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl ScannerConfig {
    /// Sets `RUST_LOG` from `--log-level` unless the operator already
    /// set it explicitly, in which case the explicit value wins.
    pub fn apply_log_level(&self) {
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", format!("geoscan_scanner={}", self.log_level.as_filter_str()));
        }
    }

    pub fn desired_frequency(&self) -> (f64, f64) {
        (self.desired_frequency_low_seconds, self.desired_frequency_high_seconds)
    }

    pub fn network_threads(&self) -> usize {
        (self.grid_rows * self.grid_cols).div_ceil(15) + 1
    }

    /// MAP_START and MAP_END must differ in both axes.
    pub fn validate(&self) -> Result<(), String> {
        if self.map_start_lat == self.map_end_lat || self.map_start_lon == self.map_end_lon {
            return Err("MAP_START and MAP_END must differ in both latitude and longitude".into());
        }
        if self.accounts.is_empty() {
            return Err("at least one account is required".into());
        }
        if self.speed_limit_mph <= 0.0 || self.speed_limit_mph > 25.0 {
            return Err("SPEED_LIMIT must be in (0, 25]".into());
        }
        if self.simultaneous_logins == 0 {
            return Err("SIMULTANEOUS_LOGINS must be >= 1".into());
        }
        if self.scan_delay_seconds < 10 {
            return Err("SCAN_DELAY must be >= 10".into());
        }
        for raw in &self.accounts {
            if raw.splitn(3, ':').count() != 3 {
                return Err(format!("malformed account entry, expected username:password:provider: {raw}"));
            }
        }
        Ok(())
    }

    /// Parses the `username:password:provider` triplets. `validate()`
    /// already rejected malformed entries, so this never fails in
    /// practice; callers should still call `validate()` first.
    pub fn parsed_accounts(&self) -> Vec<Account> {
        self.accounts
            .iter()
            .filter_map(|raw| {
                let mut parts = raw.splitn(3, ':');
                let username = parts.next()?;
                let password = parts.next()?;
                let provider = parts.next()?;
                Some(Account::new(username, password, provider))
            })
            .collect()
    }

    pub fn parsed_proxies(&self) -> Vec<Proxy> {
        self.proxies.iter().map(|url| Proxy::new(url.clone())).collect()
    }
}
