use std::path::Path;

use serde::Serialize;
use servdesk_core::{AttachmentLimits, AttachmentSettings, FormKind};

use crate::cli::{ConfigCommands, FormArg};
use crate::commands::common::load_settings;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct FormLimitsView {
    pub form: FormKind,
    #[serde(flatten)]
    pub limits: AttachmentLimits,
}

pub fn run_config(command: ConfigCommands, settings_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            form,
            max_files,
            max_file_size,
            accept,
        } => {
            let settings = init_settings(settings_path, form, max_files, max_file_size, accept)?;
            println!("Settings written to {}", settings_path.display());
            for line in format_limits_lines(&effective_limits(&settings)) {
                println!("{line}");
            }
            Ok(())
        }
        ConfigCommands::Show { json } => {
            let settings = load_settings(settings_path)?;
            let views = effective_limits(&settings);
            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                for line in format_limits_lines(&views) {
                    println!("{line}");
                }
            }
            Ok(())
        }
    }
}

pub fn init_settings(
    settings_path: &Path,
    form: Option<FormArg>,
    max_files: Option<usize>,
    max_file_size: Option<u64>,
    accept: Vec<String>,
) -> Result<AttachmentSettings, CliError> {
    let mut settings = load_settings(settings_path)?;
    let has_overrides = max_files.is_some() || max_file_size.is_some() || !accept.is_empty();

    match form {
        Some(form) => {
            let form = FormKind::from(form);
            let value = settings.override_mut(form);
            if max_files.is_some() {
                value.max_files = max_files;
            }
            if max_file_size.is_some() {
                value.max_file_size_bytes = max_file_size;
            }
            if !accept.is_empty() {
                value.accepted_mime_types = Some(accept);
            }
            settings.limits_for(form).validate().map_err(|error| {
                CliError::Config(format!("Rejected {form} limits: {error}"))
            })?;
        }
        None if has_overrides => {
            return Err(CliError::Config(
                "--form is required when overriding limits".to_string(),
            ));
        }
        None => {}
    }

    settings.save_to_path(settings_path)?;
    Ok(settings)
}

pub fn effective_limits(settings: &AttachmentSettings) -> Vec<FormLimitsView> {
    FormKind::ALL
        .into_iter()
        .map(|form| FormLimitsView {
            form,
            limits: settings.limits_for(form),
        })
        .collect()
}

pub fn format_limits_lines(views: &[FormLimitsView]) -> Vec<String> {
    views
        .iter()
        .map(|view| {
            format!(
                "{:<14} max {} file(s), {} each, accepts {}",
                view.form.as_str(),
                view.limits.max_files,
                servdesk_core::util::format_size(view.limits.max_file_size_bytes),
                view.limits.accepted_mime_types.join(", ")
            )
        })
        .collect()
}
