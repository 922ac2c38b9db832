//! `/`-separated path helpers for local module identifiers.
//!
//! Paths here are document paths handed to the `DocumentService`, not
//! necessarily file system paths, so they are handled as plain strings.

/// `./x` and `../x` name files relative to the importing document.
pub fn is_relative(module: &str) -> bool {
    module.starts_with("./") || module.starts_with("../")
}

/// Directory part of `path`; empty for a bare file name.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Resolves `.` and `..` segments and repeated separators.
///
/// `..` above the root of an absolute path is dropped; in a relative path
/// it is kept.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = vec![];
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last().copied() {
                Some(last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            s => segments.push(s),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

pub fn join(base: &str, relative: &str) -> String {
    if base.is_empty() || relative.starts_with('/') {
        normalize(relative)
    } else {
        normalize(&format!("{}/{}", base, relative))
    }
}

/// Path of `module` imported from the document at `base_path`.
pub fn resolve_relative(base_path: &str, module: &str) -> String {
    join(dirname(base_path), module)
}

/// Whether a document at `path` holds plugin source code.
pub fn is_script(path: &str) -> bool {
    let file = &path[path.rfind('/').map(|i| i + 1).unwrap_or(0)..];
    match file.rfind('.') {
        Some(0) | None => true,
        Some(idx) => matches!(&file[idx + 1..], "js" | "mjs" | "ts"),
    }
}
