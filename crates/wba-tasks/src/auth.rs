//! Identity headers supplied by the Telegram WebApp host

use std::collections::BTreeMap;
use std::fmt;

/// Header carrying the signed WebApp `initData` string
pub const TELEGRAM_INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";

/// Opaque request headers, forwarded unchanged on every call
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders {
    headers: BTreeMap<String, String>,
}

impl AuthHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers for a Telegram Mini App session
    pub fn telegram(init_data: &str) -> Self {
        Self::new().with(TELEGRAM_INIT_DATA_HEADER, init_data)
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // values are session secrets
        f.debug_map()
            .entries(self.headers.keys().map(|k| (k, "<redacted>")))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_headers() {
        let headers = AuthHeaders::telegram("query_id=AAH&user=%7B%7D&hash=ff");
        assert_eq!(
            headers.get(TELEGRAM_INIT_DATA_HEADER),
            Some("query_id=AAH&user=%7B%7D&hash=ff")
        );
    }

    #[test]
    fn test_debug_redacts_values() {
        let headers = AuthHeaders::telegram("secret-hash").with("X-Client", "mini-app");
        let printed = format!("{:?}", headers);
        assert!(!printed.contains("secret-hash"));
        assert!(printed.contains("X-Client"));
    }
}
