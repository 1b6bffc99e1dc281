use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountAuthState {
    Fresh,
    LoggedIn,
    BadCredentials,
    Banned,
}

/// A single credential set. Lives in exactly one of: assigned to a
/// worker, the ready pool, or the captcha pool — the pool membership
/// itself is tracked by the scheduler, not by this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub provider: String,
    pub captcha_flag: bool,
    pub last_used: Option<i64>,
    pub auth_state: AccountAuthState,
    pub device_info: Option<String>,
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            provider: provider.into(),
            captcha_flag: false,
            last_used: None,
            auth_state: AccountAuthState::Fresh,
            device_info: None,
        }
    }
}
