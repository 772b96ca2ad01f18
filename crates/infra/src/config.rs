//! Ledger tuning knobs, read from the environment.

use chrono::Duration;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use depot_transfers::LineSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Canonical quantity at or below which managers get a low-stock notice.
    pub low_stock_threshold: i64,
    /// Maximum units of one product returned by customers within the window.
    pub customer_return_cap: i64,
    #[serde(deserialize_with = "window_hours")]
    pub customer_return_window_hours: i64,
    /// Lines valued by the ledger entry written on `Completed`.
    pub completed_valuation: LineSelection,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
            customer_return_cap: 10,
            customer_return_window_hours: 24,
            completed_valuation: LineSelection::AllLines,
        }
    }
}

impl LedgerConfig {
    /// Load from `DEPOT_*` environment variables. Invalid values fall back to
    /// the default and are logged.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            low_stock_threshold: read_i64(&lookup, "DEPOT_LOW_STOCK_THRESHOLD", defaults.low_stock_threshold),
            customer_return_cap: read_i64(&lookup, "DEPOT_CUSTOMER_RETURN_CAP", defaults.customer_return_cap),
            customer_return_window_hours: read_window_hours(
                &lookup,
                "DEPOT_CUSTOMER_RETURN_WINDOW_HOURS",
                defaults.customer_return_window_hours,
            ),
            completed_valuation: match lookup("DEPOT_COMPLETED_VALUATION").as_deref() {
                None => defaults.completed_valuation,
                Some("all_lines") => LineSelection::AllLines,
                Some("accepted_lines") => LineSelection::AcceptedLines,
                Some(other) => {
                    tracing::warn!(
                        key = "DEPOT_COMPLETED_VALUATION",
                        value = other,
                        "expected all_lines or accepted_lines; using default"
                    );
                    defaults.completed_valuation
                }
            },
        }
    }

    /// Out-of-range hours (only reachable by setting the field directly)
    /// saturate to an unbounded window.
    pub fn customer_return_window(&self) -> Duration {
        Duration::try_hours(self.customer_return_window_hours).unwrap_or(Duration::MAX)
    }
}

fn valid_window_hours(hours: i64) -> bool {
    hours >= 0 && Duration::try_hours(hours).is_some()
}

fn window_hours<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let hours = i64::deserialize(deserializer)?;
    if !valid_window_hours(hours) {
        return Err(D::Error::custom(format!(
            "customer_return_window_hours out of range: {hours}"
        )));
    }
    Ok(hours)
}

fn read_window_hours(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: i64) -> i64 {
    let hours = read_i64(lookup, key, default);
    if valid_window_hours(hours) {
        hours
    } else {
        tracing::warn!(key, value = hours, default, "window out of range; using default");
        default
    }
}

fn read_i64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: i64) -> i64 {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= 0 => v,
        _ => {
            tracing::warn!(key, value = %raw, default, "invalid config value; using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(LedgerConfig::from_lookup(|_| None), LedgerConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = LedgerConfig::from_lookup(lookup_from(&[
            ("DEPOT_LOW_STOCK_THRESHOLD", "3"),
            ("DEPOT_CUSTOMER_RETURN_CAP", "20"),
            ("DEPOT_COMPLETED_VALUATION", "accepted_lines"),
        ]));
        assert_eq!(config.low_stock_threshold, 3);
        assert_eq!(config.customer_return_cap, 20);
        assert_eq!(config.customer_return_window_hours, 24);
        assert_eq!(config.completed_valuation, LineSelection::AcceptedLines);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = LedgerConfig::from_lookup(lookup_from(&[
            ("DEPOT_LOW_STOCK_THRESHOLD", "lots"),
            ("DEPOT_CUSTOMER_RETURN_WINDOW_HOURS", "-4"),
            ("DEPOT_COMPLETED_VALUATION", "some_lines"),
        ]));
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn unrepresentable_window_falls_back() {
        let config = LedgerConfig::from_lookup(lookup_from(&[(
            "DEPOT_CUSTOMER_RETURN_WINDOW_HOURS",
            "9000000000000",
        )]));
        assert_eq!(config.customer_return_window_hours, 24);
        assert_eq!(config.customer_return_window(), Duration::hours(24));
    }

    #[test]
    fn oversized_window_saturates() {
        let config = LedgerConfig {
            customer_return_window_hours: i64::MAX,
            ..LedgerConfig::default()
        };
        assert_eq!(config.customer_return_window(), Duration::MAX);
    }

    #[test]
    fn deserialize_rejects_bad_window() {
        assert!(serde_json::from_str::<LedgerConfig>(r#"{"customer_return_window_hours": 9000000000000}"#).is_err());
        assert!(serde_json::from_str::<LedgerConfig>(r#"{"customer_return_window_hours": -1}"#).is_err());
        let config: LedgerConfig = serde_json::from_str(r#"{"customer_return_window_hours": 48}"#).unwrap();
        assert_eq!(config.customer_return_window_hours, 48);
    }

    #[test]
    fn deserializes_partial_json() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"customer_return_cap": 4, "completed_valuation": "accepted_lines"}"#)
                .unwrap();
        assert_eq!(config.customer_return_cap, 4);
        assert_eq!(config.low_stock_threshold, 10);
        assert_eq!(config.completed_valuation, LineSelection::AcceptedLines);
    }
}
