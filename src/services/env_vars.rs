//! Environment variable interpolation for resolved configs.
//!
//! User variables may reference other variables with `$NAME` or `${NAME}`.
//! References resolve against user variables first, then system variables.
//! A reference back into the variable being expanded (directly or through a
//! cycle) resolves to the system variable of that name.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("reference pattern is valid")
});

/// Variables the platform injects into every deployment
#[derive(Debug, Clone)]
pub struct SystemVars<'a> {
    pub app_id: i64,
    pub env_id: i64,
    pub env_name: &'a str,
    pub deployment_id: i64,
    pub display_name: &'a str,
    pub dev_domain: &'a str,
    pub default_env_name: &'a str,
}

impl SystemVars<'_> {
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let env_host = if self.env_name == self.default_env_name {
            format!("{}.{}", self.display_name, self.dev_domain)
        } else {
            format!("{}--{}.{}", self.display_name, self.env_name, self.dev_domain)
        };

        BTreeMap::from([
            ("HP_APP_ID".to_string(), self.app_id.to_string()),
            ("HP_ENV".to_string(), self.env_name.to_string()),
            ("HP_ENV_ID".to_string(), self.env_id.to_string()),
            ("HP_DEPLOYMENT_ID".to_string(), self.deployment_id.to_string()),
            (
                "HP_DEPLOYMENT_URL".to_string(),
                format!(
                    "https://{}--{}.{}",
                    self.display_name, self.deployment_id, self.dev_domain
                ),
            ),
            ("HP_ENV_URL".to_string(), format!("https://{}", env_host)),
        ])
    }
}

struct Interpolator<'a> {
    user: &'a BTreeMap<String, String>,
    system: &'a BTreeMap<String, String>,
    stack: Vec<String>,
}

impl<'a> Interpolator<'a> {
    fn expand_key(&mut self, key: &str) -> String {
        let user = self.user;
        let Some(raw) = user.get(key) else {
            return self.system.get(key).cloned().unwrap_or_default();
        };

        self.stack.push(key.to_string());
        let value = self.expand_value(raw);
        self.stack.pop();

        value
    }

    fn expand_value(&mut self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut last = 0;

        for caps in REFERENCE.captures_iter(raw) {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            out.push_str(&raw[last..whole.start]);
            out.push_str(&self.reference(&caps));
            last = whole.end;
        }

        out.push_str(&raw[last..]);
        out
    }

    fn reference(&mut self, caps: &Captures<'_>) -> String {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();

        if self.stack.iter().any(|k| k == name) {
            return self.system.get(name).cloned().unwrap_or_default();
        }

        if self.user.contains_key(name) {
            return self.expand_key(name);
        }

        match self.system.get(name) {
            Some(value) => value.clone(),
            None => caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default(),
        }
    }
}

/// Merge system and user variables, expanding references in user values.
/// User variables override system variables of the same name.
pub fn interpolate(
    system: &BTreeMap<String, String>,
    user: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut interpolator = Interpolator {
        user,
        system,
        stack: Vec::new(),
    };

    let mut merged = system.clone();
    for key in user.keys() {
        let value = interpolator.expand_key(key);
        merged.insert(key.clone(), value);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_system_vars() {
        let system = SystemVars {
            app_id: 1,
            env_id: 2,
            env_name: "staging",
            deployment_id: 3,
            display_name: "my-app",
            dev_domain: "hostplane.dev",
            default_env_name: "production",
        }
        .to_map();

        assert_eq!(system["HP_ENV"], "staging");
        assert_eq!(system["HP_DEPLOYMENT_URL"], "https://my-app--3.hostplane.dev");
        assert_eq!(system["HP_ENV_URL"], "https://my-app--staging.hostplane.dev");
    }

    #[test]
    fn test_production_env_url_has_no_suffix() {
        let system = SystemVars {
            app_id: 1,
            env_id: 2,
            env_name: "production",
            deployment_id: 3,
            display_name: "my-app",
            dev_domain: "hostplane.dev",
            default_env_name: "production",
        }
        .to_map();

        assert_eq!(system["HP_ENV_URL"], "https://my-app.hostplane.dev");
    }

    #[test]
    fn test_references_to_other_keys() {
        let merged = interpolate(
            &vars(&[("HP_ENV", "staging")]),
            &vars(&[
                ("API_HOST", "api.example.org"),
                ("API_URL", "https://${API_HOST}/v1"),
                ("LABEL", "$HP_ENV-build"),
            ]),
        );

        assert_eq!(merged["API_URL"], "https://api.example.org/v1");
        assert_eq!(merged["LABEL"], "staging-build");
        assert_eq!(merged["HP_ENV"], "staging");
    }

    #[test]
    fn test_self_reference_falls_back_to_system() {
        let merged = interpolate(
            &vars(&[("HP_ENV", "staging")]),
            &vars(&[("HP_ENV", "$HP_ENV-custom")]),
        );
        assert_eq!(merged["HP_ENV"], "staging-custom");

        let merged = interpolate(&vars(&[]), &vars(&[("PATH_X", "$PATH_X:/bin")]));
        assert_eq!(merged["PATH_X"], ":/bin");
    }

    #[test]
    fn test_cycles_terminate() {
        let merged = interpolate(
            &vars(&[("B", "system-b")]),
            &vars(&[("A", "a:$B"), ("B", "b:$A")]),
        );

        assert_eq!(merged["A"], "a:b:");
        assert_eq!(merged["B"], "b:a:system-b");
    }

    #[test]
    fn test_unknown_references_are_kept() {
        let merged = interpolate(&vars(&[]), &vars(&[("PASSWORD", "pa$$word$SECRET")]));
        assert_eq!(merged["PASSWORD"], "pa$$word$SECRET");
    }
}
