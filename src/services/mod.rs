pub mod cache_invalidator;
pub mod env_vars;
pub mod headers;
pub mod host_parser;
pub mod hosting_cache;
pub mod redirects;
pub mod resolver;
pub mod snippets;
pub mod webhook;

pub use cache_invalidator::{dev_host_pattern, CacheInvalidator};
pub use host_parser::{normalize_host, parse_host, DevTarget, HostIdentity};
pub use hosting_cache::HostingCache;
pub use headers::{headers_for_path, CompiledHeaderRule};
pub use redirects::{match_redirect, request_path, MatchArgs, RedirectMatch};
pub use resolver::{pick_weighted, rollout_total, ConfigResolver, HostingConfig};
pub use snippets::{calculate_reset_domains, select_snippets, InjectedSnippets, ResolvedSnippet};
pub use webhook::{HttpWebhookSender, WebhookSender};
