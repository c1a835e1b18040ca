//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory, shared with
//! whatever other front end writes there:
//! ```json
//! {
//!   "sms": {
//!     "monitoredSenders": [{ "id": "MPESA", "name": "M-PESA", "enabled": true }],
//!     "reviewThreshold": 0.7,
//!     "initialScanDays": 30,
//!     "backlogLimit": 50,
//!     "realtimeMonitoring": true,
//!     "showNotifications": true
//!   }
//! }
//! ```
//! Top-level sections other than `sms` are kept as-is when saving.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::institution::GENERIC_BANK_ID;
use crate::domain::InstitutionRegistry;

/// Institutions monitored out of the box
pub const DEFAULT_ENABLED_SENDERS: &[&str] = &["MPESA", "KCB", "EQUITY", "COOP", "ABSA"];

pub const DEFAULT_REVIEW_THRESHOLD: f64 = 0.7;
pub const DEFAULT_INITIAL_SCAN_DAYS: u32 = 30;
pub const DEFAULT_BACKLOG_LIMIT: usize = 50;

/// Comma-separated sender ids that replace the enabled list (CI/testing)
pub const SENDERS_ENV: &str = "SMSFIN_SENDERS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    sms: Option<SmsSettings>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SmsSettings {
    #[serde(default = "default_monitored_senders")]
    monitored_senders: Vec<MonitoredSender>,
    #[serde(default = "default_review_threshold")]
    review_threshold: f64,
    #[serde(default = "default_initial_scan_days")]
    initial_scan_days: u32,
    #[serde(default = "default_backlog_limit")]
    backlog_limit: usize,
    #[serde(default = "default_true")]
    realtime_monitoring: bool,
    #[serde(default = "default_true")]
    show_notifications: bool,
}

impl Default for SmsSettings {
    fn default() -> Self {
        Self {
            monitored_senders: default_monitored_senders(),
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
            initial_scan_days: DEFAULT_INITIAL_SCAN_DAYS,
            backlog_limit: DEFAULT_BACKLOG_LIMIT,
            realtime_monitoring: true,
            show_notifications: true,
        }
    }
}

fn default_monitored_senders() -> Vec<MonitoredSender> {
    InstitutionRegistry::builtin()
        .iter()
        .filter(|i| i.id != GENERIC_BANK_ID)
        .map(|i| MonitoredSender {
            id: i.id.clone(),
            name: i.display_name.clone(),
            enabled: DEFAULT_ENABLED_SENDERS.contains(&i.id.as_str()),
            custom: false,
        })
        .collect()
}

fn default_review_threshold() -> f64 {
    DEFAULT_REVIEW_THRESHOLD
}

fn default_initial_scan_days() -> u32 {
    DEFAULT_INITIAL_SCAN_DAYS
}

fn default_backlog_limit() -> usize {
    DEFAULT_BACKLOG_LIMIT
}

fn default_true() -> bool {
    true
}

/// One entry of the monitored-sender whitelist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredSender {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// Added by the user rather than shipped with the app
    #[serde(default)]
    pub custom: bool,
}

/// Id for a user-added sender: trimmed, uppercased, whitespace runs as `_`
pub fn custom_sender_id(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Parse an `SMSFIN_SENDERS` value; None when it names no sender
pub fn parse_sender_override(value: &str) -> Option<Vec<String>> {
    let ids: Vec<String> = value
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    (!ids.is_empty()).then_some(ids)
}

/// SMS detection settings (simplified view of settings.json)
#[derive(Debug, Clone)]
pub struct Config {
    pub monitored_senders: Vec<MonitoredSender>,
    pub review_threshold: f64,
    pub initial_scan_days: u32,
    pub backlog_limit: usize,
    pub realtime_monitoring: bool,
    pub show_notifications: bool,
    /// Set from the environment; never written back
    sender_override: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(SmsSettings::default(), None)
    }
}

impl Config {
    fn from_settings(sms: SmsSettings, sender_override: Option<Vec<String>>) -> Self {
        Self {
            monitored_senders: sms.monitored_senders,
            review_threshold: sms.review_threshold,
            initial_scan_days: sms.initial_scan_days,
            backlog_limit: sms.backlog_limit,
            realtime_monitoring: sms.realtime_monitoring,
            show_notifications: sms.show_notifications,
            sender_override,
        }
    }

    fn to_settings(&self) -> SmsSettings {
        SmsSettings {
            monitored_senders: self.monitored_senders.clone(),
            review_threshold: self.review_threshold,
            initial_scan_days: self.initial_scan_days,
            backlog_limit: self.backlog_limit,
            realtime_monitoring: self.realtime_monitoring,
            show_notifications: self.show_notifications,
        }
    }

    fn read_settings(settings_path: &Path) -> Result<SettingsFile> {
        if !settings_path.exists() {
            return Ok(SettingsFile::default());
        }
        let content = std::fs::read_to_string(settings_path)
            .with_context(|| format!("Failed to read {}", settings_path.display()))?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    /// Load config from the data directory
    ///
    /// The enabled sender list can be replaced via the `SMSFIN_SENDERS`
    /// environment variable (for CI/testing).
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = Self::read_settings(&data_dir.join("settings.json"))?;
        let sender_override = std::env::var(SENDERS_ENV)
            .ok()
            .and_then(|v| parse_sender_override(&v));
        Ok(Self::from_settings(raw.sms.unwrap_or_default(), sender_override))
    }

    /// Save config to the data directory, preserving sections we don't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join("settings.json");
        let mut settings = Self::read_settings(&settings_path)?;
        settings.sms = Some(self.to_settings());

        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }

    /// Ids fed to the message source as its sender filter
    pub fn enabled_sender_ids(&self) -> Vec<String> {
        if let Some(ids) = &self.sender_override {
            return ids.clone();
        }
        self.monitored_senders
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.id.clone())
            .collect()
    }

    /// `(id, name)` of user-added senders, for the institution registry
    pub fn custom_senders(&self) -> Vec<(String, String)> {
        self.monitored_senders
            .iter()
            .filter(|s| s.custom)
            .map(|s| (s.id.clone(), s.name.clone()))
            .collect()
    }

    pub fn sender(&self, id: &str) -> Option<&MonitoredSender> {
        self.monitored_senders.iter().find(|s| s.id.eq_ignore_ascii_case(id))
    }

    fn sender_mut(&mut self, id: &str) -> Result<&mut MonitoredSender> {
        match self.monitored_senders.iter_mut().find(|s| s.id.eq_ignore_ascii_case(id)) {
            Some(sender) => Ok(sender),
            None => bail!("Unknown sender: {}", id),
        }
    }

    /// Flip a sender's enabled flag; returns the new value
    pub fn toggle_sender(&mut self, id: &str) -> Result<bool> {
        let sender = self.sender_mut(id)?;
        sender.enabled = !sender.enabled;
        Ok(sender.enabled)
    }

    pub fn set_sender_enabled(&mut self, id: &str, enabled: bool) -> Result<()> {
        self.sender_mut(id)?.enabled = enabled;
        Ok(())
    }

    pub fn enable_all(&mut self) {
        self.monitored_senders.iter_mut().for_each(|s| s.enabled = true);
    }

    pub fn disable_all(&mut self) {
        self.monitored_senders.iter_mut().for_each(|s| s.enabled = false);
    }

    /// Add a user-defined sender, enabled; returns its id
    pub fn add_custom_sender(&mut self, name: &str) -> Result<String> {
        let id = custom_sender_id(name);
        if id.is_empty() {
            bail!("Sender name cannot be empty");
        }
        if self.sender(&id).is_some() {
            bail!("Sender {} already exists", id);
        }
        self.monitored_senders.push(MonitoredSender {
            id: id.clone(),
            name: name.trim().to_string(),
            enabled: true,
            custom: true,
        });
        Ok(id)
    }

    /// Remove a user-defined sender; built-in senders can only be disabled
    pub fn remove_custom_sender(&mut self, id: &str) -> Result<()> {
        let Some(pos) = self.monitored_senders.iter().position(|s| s.id.eq_ignore_ascii_case(id)) else {
            bail!("Unknown sender: {}", id);
        };
        if !self.monitored_senders[pos].custom {
            bail!("{} is a built-in sender; disable it instead", self.monitored_senders[pos].id);
        }
        self.monitored_senders.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.enabled_sender_ids(), vec!["MPESA", "KCB", "EQUITY", "COOP", "ABSA"]);
        assert!(config.sender("BANK").is_none());
        assert!(config.sender("GTB").is_some_and(|s| !s.enabled));
        assert_eq!(config.review_threshold, 0.7);
    }

    #[test]
    fn test_custom_sender_id() {
        assert_eq!(custom_sender_id("  my   sacco "), "MY_SACCO");
        assert_eq!(custom_sender_id(" "), "");
    }

    #[test]
    fn test_sender_override_parsing() {
        assert_eq!(parse_sender_override("mpesa, kcb,"), Some(vec!["MPESA".to_string(), "KCB".to_string()]));
        assert_eq!(parse_sender_override(" , "), None);
    }
}
