//! Redirect rule evaluation.
//!
//! Rules are evaluated in order and the first match wins. A match is one of:
//! - an internal rewrite (same host, different path)
//! - an HTTP redirect (3xx status)
//! - a reverse proxy to an absolute URL

use std::borrow::Cow;
use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::models::Redirect;

const DEFAULT_DOMAIN_REDIRECT_STATUS: u16 = 301;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RedirectMatch {
    Rewrite {
        path: String,
    },
    Redirect {
        location: String,
        status: u16,
    },
    Proxy {
        target: String,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
}

/// Inputs of a single match
#[derive(Debug, Clone, Copy)]
pub struct MatchArgs<'a> {
    pub url: &'a Url,
    pub host_name: &'a str,
    pub rules: &'a [Redirect],
    pub api_path_prefix: &'a str,
    pub api_location: Option<&'a str>,
}

/// 3xx check as applied to configured statuses
fn is_redirect_status(status: u16) -> bool {
    status != 0 && status % 300 < 8
}

fn is_absolute(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// A path with a dot that is not an html page is served as a static asset
fn looks_like_asset(path: &str) -> bool {
    path.contains('.') && !path.ends_with(".html")
}

fn under_api_prefix(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() || prefix == "/" {
        return false;
    }

    let prefix = prefix.trim_end_matches('/');
    path == prefix || path.starts_with(&format!("{}/", prefix))
}

/// Decoded request path, the form rules and file names are written in
pub fn request_path(url: &Url) -> Cow<'_, str> {
    percent_decode_str(url.path()).decode_utf8_lossy()
}

/// Offset of the `?` opening the query part of a rule's `from`: written
/// escaped (`\?`) or followed by a `key=` pair. Any other `?` is a regex
/// quantifier.
fn query_start(from: &str) -> Option<usize> {
    from.match_indices('?').map(|(i, _)| i).find(|&i| {
        if from[..i].ends_with('\\') {
            return true;
        }

        let rest = &from[i + 1..];
        match rest.split_once('=') {
            Some((key, _)) => {
                !key.is_empty()
                    && key
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            }
            None => false,
        }
    })
}

/// Anchored pattern for a rule's `from`, with `*` as a capturing wildcard
fn rule_pattern(from: &str, query_start: Option<usize>) -> String {
    let from = match query_start {
        Some(i) if !from[..i].ends_with('\\') => format!("{}\\?{}", &from[..i], &from[i + 1..]),
        _ => from.to_string(),
    };

    format!("^{}$", from.replace('*', "(.*)"))
}

fn with_query(target: String, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() && !target.contains('?') => format!("{}?{}", target, q),
        _ => target,
    }
}

fn origin(url: &Url, host: &str) -> String {
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

/// Bare domain redirect (`from` equals the host, e.g. apex → www)
fn domain_redirect(url: &Url, rule: &Redirect) -> RedirectMatch {
    let status = rule
        .status
        .filter(|s| is_redirect_status(*s))
        .unwrap_or(DEFAULT_DOMAIN_REDIRECT_STATUS);

    let base = if is_absolute(&rule.to) {
        rule.to.trim_end_matches('/').to_string()
    } else {
        format!("{}://{}", url.scheme(), rule.to.trim_end_matches('/'))
    };

    RedirectMatch::Redirect {
        location: with_query(format!("{}{}", base, url.path()), url.query()),
        status,
    }
}

/// Compute the target of a matching rule: literal wildcard substitution when
/// `to` contains `*`, capture-group expansion (`$1`) otherwise.
fn substitute(re: &Regex, subject: &str, to: &str) -> Option<String> {
    let caps = re.captures(subject)?;

    if to.contains('*') {
        let wildcard = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        return Some(to.replace('*', wildcard));
    }

    let mut target = String::new();
    caps.expand(to, &mut target);
    Some(target)
}

pub fn match_redirect(args: MatchArgs<'_>) -> Option<RedirectMatch> {
    let decoded = request_path(args.url);
    let path: &str = &decoded;
    let query = args.url.query();
    let has_api = args.api_location.is_some_and(|l| !l.is_empty());

    for rule in args.rules {
        if rule.from.is_empty() || rule.to.is_empty() {
            continue;
        }

        if !rule.hosts.is_empty()
            && !rule
                .hosts
                .iter()
                .any(|h| h.eq_ignore_ascii_case(args.host_name))
        {
            continue;
        }

        if looks_like_asset(path) && !rule.assets {
            continue;
        }

        if has_api && under_api_prefix(path, args.api_path_prefix) {
            continue;
        }

        if rule.from.eq_ignore_ascii_case(args.host_name) {
            return Some(domain_redirect(args.url, rule));
        }

        let query_start = query_start(&rule.from);
        let pattern = rule_pattern(&rule.from, query_start);
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!(from = %rule.from, error = %e, "Skipping redirect with invalid pattern");
                continue;
            }
        };

        // Rules that mention a query string are matched against it too
        let subject = match query {
            Some(q) if query_start.is_some() => format!("{}?{}", path, q),
            _ => path.to_string(),
        };

        let Some(target) = substitute(&re, &subject, &rule.to) else {
            continue;
        };

        let carried_query = if subject.contains('?') { None } else { query };

        if let Some(status) = rule.status.filter(|s| is_redirect_status(*s)) {
            let location = if is_absolute(&target) {
                target
            } else {
                format!("{}{}", origin(args.url, args.host_name), target)
            };

            return Some(RedirectMatch::Redirect {
                location: with_query(location, carried_query),
                status,
            });
        }

        if is_absolute(&rule.to) {
            return Some(RedirectMatch::Proxy {
                target: with_query(target, carried_query),
                headers: rule.headers.clone(),
            });
        }

        return Some(RedirectMatch::Rewrite {
            path: with_query(target, carried_query),
        });
    }

    None
}
