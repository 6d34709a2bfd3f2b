//! Human-readable byte sizes.

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with base-1024 units and two decimals, e.g. `1.50 KB`.
///
/// Values past the last unit stay in TB.
pub fn format_size(num_bytes: u64) -> String {
    let mut size = num_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}
