use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use servdesk_core::FormKind;

#[derive(Parser)]
#[command(name = "servdesk")]
#[command(about = "Manage service-desk record attachments from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding records and uploaded files
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Attachment limits settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create and inspect job, issue, and parts-request records
    Record {
        #[command(subcommand)]
        command: RecordCommands,
    },
    /// List or change a record's attachments
    #[command(alias = "att")]
    Attachments {
        #[command(subcommand)]
        command: AttachmentCommands,
    },
    /// Configure per-form attachment limits
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum RecordCommands {
    /// Create an empty record
    Create {
        /// Form the record belongs to
        #[arg(long, value_enum)]
        form: FormArg,
        /// Form field as key=value (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// Show a record's fields and attachments
    Show {
        /// Record ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AttachmentCommands {
    /// List attachments stored on a record
    List {
        /// Record ID or unique ID prefix
        record: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add and remove attachments in one submission
    Edit {
        /// Record ID or unique ID prefix
        record: String,
        /// Local file to upload (repeatable)
        #[arg(long = "add", value_name = "PATH")]
        add: Vec<PathBuf>,
        /// Server ID of a stored attachment to delete (repeatable)
        #[arg(long = "remove", value_name = "SERVER_ID")]
        remove: Vec<String>,
        /// Form field to update as key=value (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        fields: Vec<String>,
        /// Show the change-set without submitting it
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the settings file, optionally overriding one form's limits
    Init {
        /// Form whose limits to override
        #[arg(long, value_enum)]
        form: Option<FormArg>,
        /// Maximum attachments per record
        #[arg(long, value_name = "COUNT")]
        max_files: Option<usize>,
        /// Maximum size of a single file in bytes
        #[arg(long, value_name = "BYTES")]
        max_file_size: Option<u64>,
        /// Accepted MIME type or type/* wildcard (repeatable, replaces the list)
        #[arg(long = "accept", value_name = "MIME")]
        accept: Vec<String>,
    },
    /// Show effective limits for every form
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum FormArg {
    Job,
    Issue,
    PartsRequest,
}

impl From<FormArg> for FormKind {
    fn from(value: FormArg) -> Self {
        match value {
            FormArg::Job => Self::Job,
            FormArg::Issue => Self::Issue,
            FormArg::PartsRequest => Self::PartsRequest,
        }
    }
}
