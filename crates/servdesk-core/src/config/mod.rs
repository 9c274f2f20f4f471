//! Attachment limits for the service-desk edit forms.
//!
//! Each form (job, issue, parts request) shares one lifecycle manager and
//! differs only in the limits it injects. Built-in defaults can be
//! overridden per form through a small JSON settings file.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::media::mime_essence;
use crate::{Error, Result};

const SETTINGS_SCHEMA_VERSION: u32 = 1;
const MIB_BYTES: u64 = 1024 * 1024;

/// The edit forms that carry attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormKind {
    Job,
    Issue,
    PartsRequest,
}

impl FormKind {
    pub const ALL: [Self; 3] = [Self::Job, Self::Issue, Self::PartsRequest];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Job => "job",
            Self::Issue => "issue",
            Self::PartsRequest => "parts-request",
        }
    }

    /// Limits used when no override is configured.
    pub fn default_limits(self) -> AttachmentLimits {
        match self {
            Self::Job => AttachmentLimits {
                accepted_mime_types: mime_list(&["image/*", "application/pdf", "text/plain"]),
                max_file_size_bytes: 10 * MIB_BYTES,
                max_files: 10,
            },
            Self::Issue => AttachmentLimits {
                accepted_mime_types: mime_list(&["image/*", "application/pdf"]),
                max_file_size_bytes: 5 * MIB_BYTES,
                max_files: 5,
            },
            Self::PartsRequest => AttachmentLimits {
                accepted_mime_types: mime_list(&[
                    "image/*",
                    "application/pdf",
                    "text/csv",
                    "application/vnd.ms-excel",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                ]),
                max_file_size_bytes: 10 * MIB_BYTES,
                max_files: 5,
            },
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "job" => Ok(Self::Job),
            "issue" => Ok(Self::Issue),
            "parts-request" => Ok(Self::PartsRequest),
            other => Err(Error::InvalidInput(format!("Unknown form kind: {other}"))),
        }
    }
}

fn mime_list(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Constraints injected into one form's attachment manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentLimits {
    /// Exact MIME types or `type/*` wildcards.
    pub accepted_mime_types: Vec<String>,
    pub max_file_size_bytes: u64,
    pub max_files: usize,
}

impl AttachmentLimits {
    pub fn validate(&self) -> Result<()> {
        if self.max_files == 0 {
            return Err(Error::InvalidConfig(
                "max_files must be greater than zero".to_string(),
            ));
        }
        if self.max_file_size_bytes == 0 {
            return Err(Error::InvalidConfig(
                "max_file_size_bytes must be greater than zero".to_string(),
            ));
        }
        if self.accepted_mime_types.is_empty() {
            return Err(Error::InvalidConfig(
                "accepted_mime_types must not be empty".to_string(),
            ));
        }
        for pattern in &self.accepted_mime_types {
            if !is_well_formed_pattern(pattern) {
                return Err(Error::InvalidConfig(format!(
                    "accepted MIME type '{pattern}' must look like type/subtype or type/*"
                )));
            }
        }
        Ok(())
    }
}

fn is_well_formed_pattern(pattern: &str) -> bool {
    let essence = mime_essence(pattern);
    essence.split_once('/').is_some_and(|(kind, subtype)| {
        !kind.is_empty()
            && !subtype.is_empty()
            && !subtype.contains('/')
            && (kind != "*" || subtype == "*")
    })
}

/// Partial limits read from the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_mime_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,
}

impl LimitsOverride {
    fn apply(&self, mut limits: AttachmentLimits) -> AttachmentLimits {
        if let Some(types) = &self.accepted_mime_types {
            limits.accepted_mime_types = types.iter().map(|value| mime_essence(value)).collect();
        }
        if let Some(size) = self.max_file_size_bytes {
            limits.max_file_size_bytes = size;
        }
        if let Some(count) = self.max_files {
            limits.max_files = count;
        }
        limits
    }

    const fn is_empty(&self) -> bool {
        self.accepted_mime_types.is_none()
            && self.max_file_size_bytes.is_none()
            && self.max_files.is_none()
    }
}

/// Persisted per-form overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentSettings {
    #[serde(default = "default_settings_version")]
    pub version: u32,
    #[serde(default)]
    pub forms: BTreeMap<FormKind, LimitsOverride>,
}

const fn default_settings_version() -> u32 {
    SETTINGS_SCHEMA_VERSION
}

impl Default for AttachmentSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_SCHEMA_VERSION,
            forms: BTreeMap::new(),
        }
    }
}

impl AttachmentSettings {
    /// Load settings; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str::<Self>(&raw)?;
        if settings.version != SETTINGS_SCHEMA_VERSION {
            return Err(Error::InvalidConfig(format!(
                "unsupported settings version {} in {} (expected {})",
                settings.version,
                path.display(),
                SETTINGS_SCHEMA_VERSION
            )));
        }
        for form in FormKind::ALL {
            settings.limits_for(form).validate().map_err(|error| {
                Error::InvalidConfig(format!("{form} limits in {}: {error}", path.display()))
            })?;
        }
        Ok(settings)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.forms.retain(|_, value| !value.is_empty());
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Effective limits for a form: defaults with any override applied.
    pub fn limits_for(&self, form: FormKind) -> AttachmentLimits {
        let defaults = form.default_limits();
        match self.forms.get(&form) {
            Some(value) => value.apply(defaults),
            None => defaults,
        }
    }

    pub fn override_mut(&mut self, form: FormKind) -> &mut LimitsOverride {
        self.forms.entry(form).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_limits_are_valid_for_every_form() {
        for form in FormKind::ALL {
            form.default_limits().validate().unwrap();
        }
    }

    #[test]
    fn form_kind_parses_aliases() {
        assert_eq!("job".parse::<FormKind>().unwrap(), FormKind::Job);
        assert_eq!(" Issue ".parse::<FormKind>().unwrap(), FormKind::Issue);
        assert_eq!(
            "parts_request".parse::<FormKind>().unwrap(),
            FormKind::PartsRequest
        );
        assert!("customer".parse::<FormKind>().is_err());
        assert_eq!(FormKind::PartsRequest.to_string(), "parts-request");
    }

    #[test]
    fn validate_rejects_unusable_limits() {
        let mut limits = FormKind::Issue.default_limits();
        limits.max_files = 0;
        assert!(limits.validate().is_err());

        let mut limits = FormKind::Issue.default_limits();
        limits.max_file_size_bytes = 0;
        assert!(limits.validate().is_err());

        let mut limits = FormKind::Issue.default_limits();
        limits.accepted_mime_types.clear();
        assert!(limits.validate().is_err());

        for bad in ["png", "image/", "/png", "*/png", "a/b/c"] {
            let mut limits = FormKind::Issue.default_limits();
            limits.accepted_mime_types = vec![bad.to_string()];
            assert!(limits.validate().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn overrides_merge_over_defaults() {
        let mut settings = AttachmentSettings::default();
        settings.override_mut(FormKind::Issue).max_files = Some(2);
        settings.override_mut(FormKind::Issue).accepted_mime_types =
            Some(vec![" Image/PNG ".to_string()]);

        let limits = settings.limits_for(FormKind::Issue);
        assert_eq!(limits.max_files, 2);
        assert_eq!(limits.accepted_mime_types, vec!["image/png".to_string()]);
        assert_eq!(
            limits.max_file_size_bytes,
            FormKind::Issue.default_limits().max_file_size_bytes
        );
        assert_eq!(
            settings.limits_for(FormKind::Job),
            FormKind::Job.default_limits()
        );
    }

    #[test]
    fn settings_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("attachments.json");

        let mut settings = AttachmentSettings::default();
        settings.override_mut(FormKind::PartsRequest).max_file_size_bytes = Some(1024);
        settings.override_mut(FormKind::Job);
        settings.save_to_path(&path).unwrap();

        let loaded = AttachmentSettings::load_from_path(&path).unwrap();
        assert_eq!(loaded.forms.len(), 1);
        assert_eq!(loaded.limits_for(FormKind::PartsRequest).max_file_size_bytes, 1024);
    }

    #[test]
    fn missing_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AttachmentSettings::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, AttachmentSettings::default());
    }

    #[test]
    fn load_rejects_invalid_override_and_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attachments.json");

        std::fs::write(&path, r#"{"version":1,"forms":{"job":{"max_files":0}}}"#).unwrap();
        let error = AttachmentSettings::load_from_path(&path).unwrap_err();
        assert!(error.to_string().contains("max_files"));

        std::fs::write(&path, r#"{"version":1,"forms":{"job":{"max_count":3}}}"#).unwrap();
        assert!(matches!(
            AttachmentSettings::load_from_path(&path),
            Err(Error::Serialization(_))
        ));

        std::fs::write(&path, r#"{"version":7}"#).unwrap();
        assert!(matches!(
            AttachmentSettings::load_from_path(&path),
            Err(Error::InvalidConfig(_))
        ));
    }
}
