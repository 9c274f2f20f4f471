//! Directory-backed record store.
//!
//! Stands in for the service-desk API as the submission collaborator: each
//! record lives in `records/<id>/record.json` next to a `files/` directory of
//! uploaded blobs. A change-set is either fully applied or rejected; deleted
//! blobs are only removed once the updated record has been written.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use servdesk_core::{ChangeSet, FormKind, ServerAttachment};
use uuid::Uuid;

use crate::error::CliError;

const RECORD_FILE_NAME: &str = "record.json";
const FILE_URL_PREFIX: &str = "file://";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub form: FormKind,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub attachments: Vec<ServerAttachment>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn create(
        &self,
        form: FormKind,
        fields: BTreeMap<String, String>,
    ) -> Result<StoredRecord, CliError> {
        let now = Utc::now().timestamp_millis();
        let record = StoredRecord {
            id: Uuid::now_v7().to_string(),
            form,
            fields,
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        tokio::fs::create_dir_all(self.files_dir(&record.id)).await?;
        self.write_record(&record).await?;
        tracing::debug!(record_id = %record.id, form = %form, "Created record");
        Ok(record)
    }

    pub async fn load(&self, id: &str) -> Result<StoredRecord, CliError> {
        let raw = match tokio::fs::read_to_string(self.record_file(id)).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(CliError::RecordNotFound(id.to_string()));
            }
            Err(error) => return Err(error.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    /// Resolve a full record id or a unique prefix of one.
    pub async fn resolve_id(&self, query: &str) -> Result<String, CliError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CliError::EmptyRecordId);
        }

        let mut dir = match tokio::fs::read_dir(self.records_dir()).await {
            Ok(dir) => dir,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(CliError::RecordNotFound(query.to_string()));
            }
            Err(error) => return Err(error.into()),
        };

        let mut matching_ids = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name == query {
                return Ok(name);
            }
            if name.starts_with(query) {
                matching_ids.push(name);
            }
        }
        matching_ids.sort();

        match matching_ids.len() {
            0 => Err(CliError::RecordNotFound(query.to_string())),
            1 => Ok(matching_ids.remove(0)),
            _ => {
                let options = matching_ids
                    .iter()
                    .take(3)
                    .map(|id| id.chars().take(13).collect::<String>())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(CliError::AmbiguousRecordId(format!(
                    "Record ID prefix '{query}' is ambiguous. Matches: {options}"
                )))
            }
        }
    }

    /// Apply a change-set and return the record's new attachment list.
    pub async fn apply(
        &self,
        id: &str,
        change_set: ChangeSet,
        fields: BTreeMap<String, String>,
    ) -> Result<Vec<ServerAttachment>, CliError> {
        let mut record = self.load(id).await?;

        if let Some(unknown) = change_set.ids_to_delete.iter().find(|server_id| {
            !record
                .attachments
                .iter()
                .any(|attachment| &attachment.server_id == *server_id)
        }) {
            return Err(CliError::AttachmentNotFound(unknown.clone()));
        }

        let files_dir = self.files_dir(id);
        tokio::fs::create_dir_all(&files_dir).await?;

        let mut written = Vec::with_capacity(change_set.files_to_upload.len());
        let mut uploaded = Vec::with_capacity(change_set.files_to_upload.len());
        for file in &change_set.files_to_upload {
            let server_id = Uuid::now_v7().to_string();
            let path = files_dir.join(stored_file_name(&server_id, file.name()));
            if let Err(error) = tokio::fs::write(&path, file.bytes()).await {
                remove_blobs(&written).await;
                return Err(CliError::Store(format!(
                    "Failed to store {}: {error}",
                    file.name()
                )));
            }
            uploaded.push(ServerAttachment {
                server_id,
                name: file.name().to_string(),
                mime_type: file.mime_type().to_string(),
                size_bytes: file.size_bytes(),
                url: file_url(&path),
            });
            written.push(path);
        }

        let (deleted, mut kept): (Vec<_>, Vec<_>) = record
            .attachments
            .into_iter()
            .partition(|attachment| change_set.ids_to_delete.contains(&attachment.server_id));
        kept.extend(uploaded);
        record.attachments = kept;
        record.fields.extend(fields);
        record.updated_at = Utc::now().timestamp_millis();

        if let Err(error) = self.write_record(&record).await {
            remove_blobs(&written).await;
            return Err(error);
        }

        let deleted_paths: Vec<PathBuf> = deleted
            .iter()
            .filter_map(|attachment| local_path(&attachment.url))
            .collect();
        remove_blobs(&deleted_paths).await;

        tracing::info!(
            record_id = id,
            uploaded = written.len(),
            deleted = deleted.len(),
            "Applied attachment change-set"
        );
        Ok(record.attachments)
    }

    async fn write_record(&self, record: &StoredRecord) -> Result<(), CliError> {
        let path = self.record_file(&record.id);
        let staging = path.with_extension("json.tmp");
        let serialized = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&staging, serialized).await?;
        tokio::fs::rename(&staging, &path).await?;
        Ok(())
    }

    fn records_dir(&self) -> PathBuf {
        self.root.join("records")
    }

    fn record_dir(&self, id: &str) -> PathBuf {
        self.records_dir().join(id)
    }

    fn record_file(&self, id: &str) -> PathBuf {
        self.record_dir(id).join(RECORD_FILE_NAME)
    }

    fn files_dir(&self, id: &str) -> PathBuf {
        self.record_dir(id).join("files")
    }
}

async fn remove_blobs(paths: &[PathBuf]) {
    for path in paths {
        if let Err(error) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), "Failed to remove attachment blob: {error}");
        }
    }
}

fn file_url(path: &Path) -> String {
    format!("{FILE_URL_PREFIX}{}", path.display())
}

fn local_path(url: &str) -> Option<PathBuf> {
    url.strip_prefix(FILE_URL_PREFIX).map(PathBuf::from)
}

pub fn stored_file_name(server_id: &str, file_name: &str) -> String {
    let trimmed = file_name.trim();
    let (stem, ext) = trimmed.rsplit_once('.').unwrap_or((trimmed, ""));

    let safe_stem = sanitize_file_token(stem);
    let safe_stem = if safe_stem.is_empty() {
        "file".to_string()
    } else {
        safe_stem
    };
    let safe_ext = sanitize_file_token(ext);
    if safe_ext.is_empty() {
        format!("{server_id}-{safe_stem}")
    } else {
        format!("{server_id}-{safe_stem}.{safe_ext}")
    }
}

fn sanitize_file_token(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }

    out.trim_matches('-').to_string()
}
