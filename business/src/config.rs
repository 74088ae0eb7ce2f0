use std::env::vars;
use std::time::Duration;

use log::info;
use serde::Deserialize;

use crate::{FeedbackError, NotificationKind};

/// Longest auto-dismiss delay accepted from the environment.
pub const MAX_TIMEOUT_MS: u64 = 60 * 60 * 1000;

const DEFAULT_SUCCESS: Option<Duration> = Some(Duration::from_secs(3));
const DEFAULT_INFO: Option<Duration> = Some(Duration::from_secs(3));
const DEFAULT_WARNING: Option<Duration> = Some(Duration::from_secs(5));
// Errors stay until the operator dismisses them.
const DEFAULT_ERROR: Option<Duration> = None;

/// Auto-dismiss policy for toasts, per kind.
///
/// `None` keeps a toast on screen until it is dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackConfig {
    success_timeout: Option<Duration>,
    info_timeout: Option<Duration>,
    warning_timeout: Option<Duration>,
    error_timeout: Option<Duration>,
}

// Intermediate struct for deserializing environment variables.
// `0` means sticky, an unset variable keeps the default.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    toast_success_ms: Option<u64>,
    toast_info_ms: Option<u64>,
    toast_warning_ms: Option<u64>,
    toast_error_ms: Option<u64>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            success_timeout: DEFAULT_SUCCESS,
            info_timeout: DEFAULT_INFO,
            warning_timeout: DEFAULT_WARNING,
            error_timeout: DEFAULT_ERROR,
        }
    }
}

impl FeedbackConfig {
    /// Reads `TOAST_{SUCCESS,INFO,WARNING,ERROR}_MS` from the environment.
    pub fn init() -> Result<Self, FeedbackError> {
        info!("Loading feedback configuration from environment variables");
        let raw: RawConfig = serde_env::from_iter(vars())?;
        Self::from_raw(raw)
    }

    /// Same as [`FeedbackConfig::init`] with explicit variables, for hosts
    /// that keep settings somewhere other than the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, FeedbackError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs: Vec<(String, String)> = vars
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned()))
            .collect();
        let raw: RawConfig = serde_env::from_iter(pairs)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, FeedbackError> {
        let RawConfig {
            toast_success_ms,
            toast_info_ms,
            toast_warning_ms,
            toast_error_ms,
        } = raw;

        Ok(Self {
            success_timeout: resolve(NotificationKind::Success, toast_success_ms, DEFAULT_SUCCESS)?,
            info_timeout: resolve(NotificationKind::Info, toast_info_ms, DEFAULT_INFO)?,
            warning_timeout: resolve(NotificationKind::Warning, toast_warning_ms, DEFAULT_WARNING)?,
            error_timeout: resolve(NotificationKind::Error, toast_error_ms, DEFAULT_ERROR)?,
        })
    }

    /// Auto-dismiss delay for `kind`.
    pub fn timeout_for(&self, kind: NotificationKind) -> Option<Duration> {
        match kind {
            NotificationKind::Success => self.success_timeout,
            NotificationKind::Info => self.info_timeout,
            NotificationKind::Warning => self.warning_timeout,
            NotificationKind::Error => self.error_timeout,
        }
    }

    /// Overrides the delay for one kind.
    pub fn with_timeout(mut self, kind: NotificationKind, timeout: Option<Duration>) -> Self {
        match kind {
            NotificationKind::Success => self.success_timeout = timeout,
            NotificationKind::Info => self.info_timeout = timeout,
            NotificationKind::Warning => self.warning_timeout = timeout,
            NotificationKind::Error => self.error_timeout = timeout,
        }
        self
    }
}

fn resolve(
    kind: NotificationKind,
    millis: Option<u64>,
    default: Option<Duration>,
) -> Result<Option<Duration>, FeedbackError> {
    match millis {
        None => Ok(default),
        Some(0) => {
            info!("{kind} toasts set to stay until dismissed");
            Ok(None)
        }
        Some(millis) if millis > MAX_TIMEOUT_MS => Err(FeedbackError::timeout_too_long(
            kind,
            millis,
            MAX_TIMEOUT_MS,
        )),
        Some(millis) => {
            info!("{kind} toasts dismiss after {millis}ms");
            Ok(Some(Duration::from_millis(millis)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FeedbackConfig::default();
        assert_eq!(
            config.timeout_for(NotificationKind::Success),
            Some(Duration::from_secs(3))
        );
        assert_eq!(
            config.timeout_for(NotificationKind::Info),
            Some(Duration::from_secs(3))
        );
        assert_eq!(
            config.timeout_for(NotificationKind::Warning),
            Some(Duration::from_secs(5))
        );
        assert_eq!(config.timeout_for(NotificationKind::Error), None);
    }

    #[test]
    fn test_unset_vars_keep_defaults() {
        let config = FeedbackConfig::from_vars(vec![("HOME", "/root")])
            .expect("config should build without toast vars");
        assert_eq!(config, FeedbackConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = FeedbackConfig::from_vars(vec![
            ("TOAST_SUCCESS_MS", "1500"),
            ("TOAST_ERROR_MS", "10000"),
            ("TOAST_WARNING_MS", "0"),
        ])
        .expect("config should build");

        assert_eq!(
            config.timeout_for(NotificationKind::Success),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(
            config.timeout_for(NotificationKind::Error),
            Some(Duration::from_secs(10))
        );
        assert_eq!(config.timeout_for(NotificationKind::Warning), None);
        assert_eq!(
            config.timeout_for(NotificationKind::Info),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn test_rejects_too_long_timeout() {
        let result = FeedbackConfig::from_vars(vec![("TOAST_INFO_MS", "3600001")]);
        let err = result.expect_err("one hour and a millisecond is too long");
        assert!(matches!(
            err,
            FeedbackError::TimeoutTooLong {
                kind: NotificationKind::Info,
                millis: 3_600_001,
                ..
            }
        ));
        assert!(err.to_string().contains("info"));
    }

    #[test]
    fn test_rejects_non_numeric_timeout() {
        let result = FeedbackConfig::from_vars(vec![("TOAST_SUCCESS_MS", "soon")]);
        assert!(matches!(result, Err(FeedbackError::Config(_))));
    }

    #[test]
    fn test_with_timeout_overrides_one_kind() {
        let config = FeedbackConfig::default()
            .with_timeout(NotificationKind::Error, Some(Duration::from_secs(8)));
        assert_eq!(
            config.timeout_for(NotificationKind::Error),
            Some(Duration::from_secs(8))
        );
        assert_eq!(
            config.timeout_for(NotificationKind::Success),
            Some(Duration::from_secs(3))
        );
    }
}
