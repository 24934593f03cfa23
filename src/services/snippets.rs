//! Snippet selection and snippet-driven cache key calculation.

use fancy_regex::Regex;
use serde::Serialize;

use crate::models::{Snippet, SnippetLocation, DEV_HOSTS_SENTINEL};
use crate::services::cache_invalidator::dev_host_pattern;

/// A snippet attached to a resolved config, with its path rule compiled.
#[derive(Debug, Clone)]
pub struct ResolvedSnippet {
    pub id: i64,
    pub content: String,
    pub location: SnippetLocation,
    pub prepend: bool,
    pub enabled: bool,
    pub path_rule: Option<Regex>,
}

impl ResolvedSnippet {
    /// Compile the snippet's path rule. A rule that fails to compile is
    /// logged and treated as no restriction.
    pub fn compile(snippet: &Snippet) -> Self {
        let path_rule = snippet.path_rule().and_then(|rule| match Regex::new(rule) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(
                    snippet_id = snippet.id,
                    rule = %rule,
                    error = %e,
                    "Ignoring snippet path rule that does not compile"
                );
                None
            }
        });

        Self {
            id: snippet.id,
            content: snippet.content.clone(),
            location: snippet.location,
            prepend: snippet.prepend,
            enabled: snippet.enabled,
            path_rule,
        }
    }

    fn matches_path(&self, path: &str) -> bool {
        match &self.path_rule {
            None => true,
            Some(re) => match re.is_match(path) {
                Ok(matched) => matched,
                Err(e) => {
                    // Backtrack limit exceeded
                    tracing::warn!(snippet_id = self.id, error = %e, "Snippet path rule failed to run");
                    false
                }
            },
        }
    }
}

/// HTML fragments to inject, per insertion point
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectedSnippets {
    pub head_append: String,
    pub head_prepend: String,
    pub body_append: String,
    pub body_prepend: String,
}

impl InjectedSnippets {
    pub fn is_empty(&self) -> bool {
        self.head_append.is_empty()
            && self.head_prepend.is_empty()
            && self.body_append.is_empty()
            && self.body_prepend.is_empty()
    }
}

/// Bucket enabled snippets whose path rule matches `request_path`,
/// preserving insertion order within each bucket.
pub fn select_snippets(snippets: &[ResolvedSnippet], request_path: &str) -> InjectedSnippets {
    let mut injected = InjectedSnippets::default();

    for snippet in snippets
        .iter()
        .filter(|s| s.enabled && s.matches_path(request_path))
    {
        let bucket = match (snippet.location, snippet.prepend) {
            (SnippetLocation::Head, false) => &mut injected.head_append,
            (SnippetLocation::Head, true) => &mut injected.head_prepend,
            (SnippetLocation::Body, false) => &mut injected.body_append,
            (SnippetLocation::Body, true) => &mut injected.body_prepend,
        };
        bucket.push_str(&snippet.content);
    }

    injected
}

/// Cache keys a mutation of `snippets` should invalidate.
///
/// `None` means every key of the environment must be reset (at least one
/// snippet applies to all hosts); `Some(vec![])` means nothing to reset.
pub fn calculate_reset_domains(display_name: &str, snippets: &[Snippet]) -> Option<Vec<String>> {
    let mut keys: Vec<String> = Vec::new();

    for snippet in snippets {
        let hosts = snippet.hosts();

        if hosts.is_empty() {
            return None;
        }

        for host in hosts {
            let key = if host == DEV_HOSTS_SENTINEL {
                dev_host_pattern(display_name)
            } else {
                host.clone()
            };

            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }

    Some(keys)
}
