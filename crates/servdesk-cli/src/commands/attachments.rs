use std::path::{Path, PathBuf};

use serde::Serialize;
use servdesk_core::attachments::AttachmentRow;
use servdesk_core::{
    AttachmentEntry, AttachmentLifecycleManager, AttachmentSettings, FileRejection, LocalFile,
};

use crate::cli::AttachmentCommands;
use crate::commands::common::{
    format_attachment_lines, format_attachment_summary, load_settings, parse_fields,
};
use crate::error::CliError;
use crate::store::{RecordStore, StoredRecord};

#[derive(Debug, Clone, Default)]
pub struct EditRequest {
    pub record: String,
    pub add: Vec<PathBuf>,
    pub remove: Vec<String>,
    pub fields: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct EditReport {
    pub record_id: String,
    pub dry_run: bool,
    pub submitted: bool,
    pub rejected: Vec<FileRejection>,
    pub uploaded: Vec<String>,
    pub deleted: Vec<String>,
    pub max_files: usize,
    pub attachments: Vec<AttachmentRow>,
}

pub async fn run_attachments(
    command: AttachmentCommands,
    store: &RecordStore,
    settings_path: &Path,
) -> Result<(), CliError> {
    match command {
        AttachmentCommands::List { record, json } => {
            let id = store.resolve_id(&record).await?;
            let record = store.load(&id).await?;
            let settings = load_settings(settings_path)?;
            let manager = open_manager(&record, &settings)?;
            let rows = manager.rows();

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for line in format_attachment_lines(&rows) {
                    println!("{line}");
                }
                println!(
                    "{}",
                    format_attachment_summary(&rows, manager.registry().limits().max_files)
                );
            }
            Ok(())
        }
        AttachmentCommands::Edit {
            record,
            add,
            remove,
            fields,
            dry_run,
            json,
        } => {
            let request = EditRequest {
                record,
                add,
                remove,
                fields,
                dry_run,
            };
            let report = edit_attachments(store, settings_path, request).await?;
            print_edit_report(&report, json)
        }
    }
}

/// Hydrate a manager with the record's stored attachments under its form's limits.
pub fn open_manager(
    record: &StoredRecord,
    settings: &AttachmentSettings,
) -> Result<AttachmentLifecycleManager, CliError> {
    let limits = settings.limits_for(record.form);
    let mut manager = AttachmentLifecycleManager::new(record.form, limits)?;
    manager.open(record.attachments.clone())?;
    Ok(manager)
}

pub async fn edit_attachments(
    store: &RecordStore,
    settings_path: &Path,
    request: EditRequest,
) -> Result<EditReport, CliError> {
    let id = store.resolve_id(&request.record).await?;
    let record = store.load(&id).await?;
    let settings = load_settings(settings_path)?;
    let fields = parse_fields(&request.fields)?;
    let files = request
        .add
        .iter()
        .map(|path| LocalFile::from_path(path))
        .collect::<servdesk_core::Result<Vec<_>>>()?;

    let mut manager = open_manager(&record, &settings)?;

    // Removals free capacity for files added in the same edit.
    for server_id in &request.remove {
        let entry_id = manager
            .registry()
            .find_by_server_id(server_id.trim())
            .map(AttachmentEntry::id)
            .ok_or_else(|| CliError::AttachmentNotFound(server_id.clone()))?;
        manager.remove_entry(entry_id)?;
    }
    let outcome = manager.add_files(files)?;

    let change_set = manager.assemble();
    let uploaded = change_set
        .files_to_upload
        .iter()
        .map(|file| file.name().to_string())
        .collect();
    let deleted = change_set.ids_to_delete.clone();
    let submitted = !request.dry_run && (!change_set.is_empty() || !fields.is_empty());

    if submitted {
        manager
            .submit(|change_set| store.apply(&id, change_set, fields))
            .await?;
    }

    Ok(EditReport {
        record_id: id,
        dry_run: request.dry_run,
        submitted,
        rejected: outcome.rejected,
        uploaded,
        deleted,
        max_files: manager.registry().limits().max_files,
        attachments: manager.rows(),
    })
}

fn print_edit_report(report: &EditReport, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for rejection in &report.rejected {
        eprintln!("Skipped {rejection}");
    }
    for line in format_attachment_lines(&report.attachments) {
        println!("{line}");
    }
    println!(
        "{}",
        format_attachment_summary(&report.attachments, report.max_files)
    );

    if report.dry_run {
        println!(
            "Dry run: would upload {} and delete {} attachment(s)",
            report.uploaded.len(),
            report.deleted.len()
        );
    } else if report.submitted {
        println!(
            "Uploaded {}, deleted {} attachment(s)",
            report.uploaded.len(),
            report.deleted.len()
        );
    } else {
        println!("No changes to submit");
    }
    Ok(())
}
