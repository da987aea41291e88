/// Longest accepted entry name or filename, in characters.
pub const MAX_NAME_CHARS: usize = 255;

/// Reasons an uploaded filename or entry name is rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Name is empty or whitespace-only.
    Empty,
    /// Name is longer than [`MAX_NAME_CHARS`].
    TooLong,
    /// Name is `.` or `..` once directories are stripped.
    PathTraversal,
    NullByte,
    /// Name contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::TooLong => "Name must be at most 255 characters",
            Self::PathTraversal => "Invalid filename: '.' and '..' are not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

fn check_characters(name: &str) -> Result<(), FilenameError> {
    if name.contains('\0') {
        return Err(FilenameError::NullByte);
    }
    // Filenames end up in Content-Disposition headers.
    if name.chars().any(|c| c.is_control()) {
        return Err(FilenameError::ControlCharacter);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(FilenameError::TooLong);
    }
    Ok(())
}

/// Reduce a client-supplied upload filename to its last path component.
///
/// Some clients send full local paths (`C:\Users\me\report.pdf`).
pub fn sanitize_upload_filename(raw: &str) -> Result<String, FilenameError> {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() {
        return Err(FilenameError::Empty);
    }
    if base == "." || base == ".." {
        return Err(FilenameError::PathTraversal);
    }
    check_characters(base)?;

    Ok(base.to_string())
}

/// Validate an optional entry name, falling back to the upload filename.
pub fn resolve_entry_name(name: Option<&str>, filename: &str) -> Result<String, FilenameError> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => {
            check_characters(name)?;
            Ok(name.to_string())
        }
        None => Ok(filename.to_string()),
    }
}
