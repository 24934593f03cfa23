use std::collections::BTreeMap;

use regex::Regex;

use crate::models::{CdnFile, HeaderRule};

pub const CONTENT_TYPE: &str = "content-type";
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Extensions the MIME database does not know, or knows differently
/// from what browsers expect.
const EXTENDED_MIME_TYPES: &[(&str, &str)] = &[
    ("webmanifest", "application/manifest+json"),
    ("map", "application/json"),
    ("mjs", "text/javascript"),
    ("wasm", "application/wasm"),
    ("glb", "model/gltf-binary"),
    ("gltf", "model/gltf+json"),
    ("avif", "image/avif"),
    ("md", "text/markdown; charset=utf-8"),
];

/// Headers per static file: explicit keys are lower-cased and a missing
/// content type is derived from the file name.
pub fn normalize_headers(files: &[CdnFile]) -> BTreeMap<String, BTreeMap<String, String>> {
    files
        .iter()
        .map(|file| (file.name.clone(), normalize_file_headers(file)))
        .collect()
}

pub fn normalize_file_headers(file: &CdnFile) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = file
        .headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
        .collect();

    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE.to_string(), content_type_for(&file.name));
    }

    headers
}

/// Content type for a file name: MIME database first, then the extended
/// table, then html.
pub fn content_type_for(file_name: &str) -> String {
    let Some(extension) = extension(file_name) else {
        return DEFAULT_CONTENT_TYPE.to_string();
    };

    if let Some(mime) = mime_guess::from_ext(&extension).first() {
        if mime.type_() == mime_guess::mime::TEXT && mime.get_param("charset").is_none() {
            return format!("{}; charset=utf-8", mime.essence_str());
        }
        return mime.essence_str().to_string();
    }

    EXTENDED_MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| mime.to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

/// An environment header rule with its location compiled. `*` in a location
/// matches any run of characters, everything else is literal.
#[derive(Debug, Clone)]
pub struct CompiledHeaderRule {
    location: Regex,
    headers: BTreeMap<String, String>,
}

impl CompiledHeaderRule {
    pub fn compile(rule: &HeaderRule) -> Option<Self> {
        let pattern = format!("^{}$", regex::escape(&rule.location).replace(r"\*", ".*"));

        match Regex::new(&pattern) {
            Ok(location) => Some(Self {
                location,
                headers: rule
                    .headers
                    .iter()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                    .collect(),
            }),
            Err(e) => {
                tracing::warn!(location = %rule.location, error = %e, "Skipping header rule");
                None
            }
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.location.is_match(path)
    }
}

/// Response headers for a request path: the static file's own headers, then
/// those of every matching rule in order, later rules overriding earlier
/// values. `None` when neither applies.
pub fn headers_for_path(
    file_headers: Option<&BTreeMap<String, String>>,
    rules: &[CompiledHeaderRule],
    path: &str,
) -> Option<BTreeMap<String, String>> {
    let mut matched = rules.iter().filter(|r| r.matches(path)).peekable();
    if file_headers.is_none() && matched.peek().is_none() {
        return None;
    }

    let mut headers = file_headers.cloned().unwrap_or_default();
    for rule in matched {
        headers.extend(rule.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    Some(headers)
}

fn extension(file_name: &str) -> Option<String> {
    let base = file_name.rsplit('/').next().unwrap_or(file_name);
    let (stem, ext) = base.rsplit_once('.')?;

    if stem.is_empty() || ext.is_empty() {
        return None;
    }

    Some(ext.to_ascii_lowercase())
}
