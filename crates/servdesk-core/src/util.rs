//! Shared utility functions used across multiple modules.

const KIB_BYTES: u64 = 1024;
const MIB_BYTES: u64 = KIB_BYTES * 1024;
const GIB_BYTES: u64 = MIB_BYTES * 1024;

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Human-readable size label with one decimal above the byte range.
pub fn format_size(size_bytes: u64) -> String {
    if size_bytes < KIB_BYTES {
        format!("{size_bytes} B")
    } else if size_bytes < MIB_BYTES {
        format_scaled_one_decimal(size_bytes, KIB_BYTES, "KB")
    } else if size_bytes < GIB_BYTES {
        format_scaled_one_decimal(size_bytes, MIB_BYTES, "MB")
    } else {
        format_scaled_one_decimal(size_bytes, GIB_BYTES, "GB")
    }
}

fn format_scaled_one_decimal(bytes: u64, unit: u64, suffix: &str) -> String {
    let mut whole = bytes / unit;
    let mut tenth = ((bytes % unit) * 10 + (unit / 2)) / unit;

    if tenth == 10 {
        whole += 1;
        tenth = 0;
    }

    format!("{whole}.{tenth} {suffix}")
}

/// Converts an in-memory length to the `u64` used for attachment sizes.
pub fn byte_len(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}
