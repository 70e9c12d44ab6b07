use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Generates ballot ids from the line numbers of a file.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Drops the empty choices. They are left by blank cells.
pub fn clean_choices(raw: &[String]) -> Vec<String> {
    raw.iter().filter(|s| !s.is_empty()).cloned().collect()
}
