/// Content-Type resolution for uploaded objects
///
/// Only the raster formats the pipeline writes are mapped; everything else is
/// stored as an opaque binary object.

/// Content type for objects whose extension is not in the table
pub const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
];

/// Resolve the MIME type for an object key or file name.
///
/// The extension is whatever follows the last `.` of the final path segment,
/// matched case-insensitively. Names without an extension (and dotfiles such
/// as `.png`) fall back to [`DEFAULT_CONTENT_TYPE`].
pub fn content_type_for(name: &str) -> &'static str {
    let file_name = name.rsplit('/').next().unwrap_or(name);

    let extension = match file_name.rfind('.') {
        Some(0) | None => return DEFAULT_CONTENT_TYPE,
        Some(idx) => &file_name[idx + 1..],
    };

    CONTENT_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, content_type)| *content_type)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
