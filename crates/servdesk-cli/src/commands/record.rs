use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use servdesk_core::attachments::AttachmentRow;
use servdesk_core::FormKind;

use crate::cli::RecordCommands;
use crate::commands::attachments::open_manager;
use crate::commands::common::{format_attachment_lines, load_settings, parse_fields};
use crate::error::CliError;
use crate::store::RecordStore;

#[derive(Debug, Serialize)]
pub struct RecordView {
    pub id: String,
    pub form: FormKind,
    pub fields: BTreeMap<String, String>,
    pub attachments: Vec<AttachmentRow>,
    pub updated_at: i64,
}

pub async fn run_record(
    command: RecordCommands,
    store: &RecordStore,
    settings_path: &Path,
) -> Result<(), CliError> {
    match command {
        RecordCommands::Create { form, fields } => {
            let fields = parse_fields(&fields)?;
            let record = store.create(form.into(), fields).await?;
            println!("{}", record.id);
            Ok(())
        }
        RecordCommands::Show { id, json } => {
            let view = show_record(&id, store, settings_path).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{} ({})", view.id, view.form);
                for (key, value) in &view.fields {
                    println!("  {key}: {value}");
                }
                for line in format_attachment_lines(&view.attachments) {
                    println!("  {line}");
                }
            }
            Ok(())
        }
    }
}

pub async fn show_record(
    query: &str,
    store: &RecordStore,
    settings_path: &Path,
) -> Result<RecordView, CliError> {
    let id = store.resolve_id(query).await?;
    let record = store.load(&id).await?;
    let settings = load_settings(settings_path)?;
    let manager = open_manager(&record, &settings)?;

    Ok(RecordView {
        id: record.id,
        form: record.form,
        fields: record.fields,
        attachments: manager.rows(),
        updated_at: record.updated_at,
    })
}
