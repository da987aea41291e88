const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Render a byte count with 1024-based units and at most two decimals.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered} {}", UNITS[unit])
}

/// Like [`format_bytes`], keeping a leading `-` for negative counts.
pub fn format_signed_bytes(bytes: i64) -> String {
    let rendered = format_bytes(bytes.unsigned_abs());
    if bytes < 0 {
        format!("-{rendered}")
    } else {
        rendered
    }
}
