use std::collections::BTreeMap;
use std::path::Path;

use servdesk_core::attachments::{AttachmentRow, EntryStatus};
use servdesk_core::util::{format_size, normalize_text_option};
use servdesk_core::AttachmentSettings;

use crate::error::CliError;

/// Parse repeated `key=value` arguments; later keys win.
pub fn parse_fields(raw: &[String]) -> Result<BTreeMap<String, String>, CliError> {
    let mut fields = BTreeMap::new();
    for item in raw {
        let Some((key, value)) = item.split_once('=') else {
            return Err(CliError::InvalidField(item.clone()));
        };
        let Some(key) = normalize_text_option(Some(key.to_string())) else {
            return Err(CliError::InvalidField(item.clone()));
        };
        fields.insert(key, value.trim().to_string());
    }
    Ok(fields)
}

pub fn load_settings(path: &Path) -> Result<AttachmentSettings, CliError> {
    AttachmentSettings::load_from_path(path).map_err(|error| {
        CliError::Config(format!(
            "Failed to load settings at {}: {error}",
            path.display()
        ))
    })
}

pub fn format_attachment_lines(rows: &[AttachmentRow]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            let server_id = row.server_id.as_deref().unwrap_or("-");
            format!(
                "{:<16} {} ({}, {}) [{}]",
                row.status.label(),
                row.name,
                row.kind,
                row.size_label,
                server_id
            )
        })
        .collect()
}

/// Counts only attachments that will remain after submission.
pub fn format_attachment_summary(rows: &[AttachmentRow], max_files: usize) -> String {
    let kept: Vec<_> = rows
        .iter()
        .filter(|row| row.status != EntryStatus::PendingDeletion)
        .collect();
    let total_bytes: u64 = kept.iter().map(|row| row.size_bytes).sum();
    let pending_deletion = rows.len() - kept.len();

    let mut summary = format!(
        "{} of {max_files} attachment(s), {}",
        kept.len(),
        format_size(total_bytes)
    );
    if pending_deletion > 0 {
        summary.push_str(&format!(", {pending_deletion} pending deletion"));
    }
    summary
}
