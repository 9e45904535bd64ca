//! `${NAME}` placeholder substitution for step parameters.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Runtime variables supplied by the caller for one test run.
pub type VariableMap = HashMap<String, String>;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("placeholder pattern"));

/// Replace every `${key}` in `template` whose key is present in `vars`.
///
/// Unmatched placeholders are left verbatim. The scan runs once over the
/// original template, so replacement values are never re-expanded.
pub fn substitute(template: &str, vars: &VariableMap) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
