//! `--include` / `-F` clause parsing for export.
//!
//! clap cannot express "every following token until the next flag, grouped
//! per occurrence", so export re-reads the raw argv with
//! [`parse_includes_from_argv`].

use super::types::ElementKind;

/// `type=` value matching every element kind.
pub const TYPE_ALL: &str = "all";

/// One parsed include clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSpec {
    /// `dashboard`, `event`, `entity`, `smart-alert` or `all`.
    pub type_name: String,
    /// Remaining `key=value` tokens, verbatim and in order.
    pub conditions: Vec<String>,
    /// Whether the clause carried a `type=` token.
    ///
    /// Not-found ids in an explicitly typed clause are logged as errors;
    /// otherwise they are debug noise.
    pub explicitly_typed: bool,
}

impl Default for IncludeSpec {
    fn default() -> Self {
        Self {
            type_name: TYPE_ALL.to_string(),
            conditions: Vec::new(),
            explicitly_typed: false,
        }
    }
}

impl IncludeSpec {
    /// Whether this clause selects elements of `kind`.
    #[must_use]
    pub fn applies_to(&self, kind: ElementKind) -> bool {
        self.type_name == TYPE_ALL || self.type_name == kind.include_type()
    }

    /// Values of the clause's `id=` conditions.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.conditions
            .iter()
            .filter_map(|c| split_condition(c))
            .filter(|(key, _)| key.eq_ignore_ascii_case("id"))
            .map(|(_, value)| value)
            .collect()
    }

    /// True if the clause selects by id only (and so needs no list fetch).
    #[must_use]
    pub fn is_id_only(&self) -> bool {
        !self.ids().is_empty()
    }
}

/// Split `key=value` on the first `=`. The value may itself contain `=`.
#[must_use]
pub fn split_condition(condition: &str) -> Option<(&str, &str)> {
    condition
        .split_once('=')
        .map(|(key, value)| (key.trim(), unquote(value.trim())))
}

/// Strip one pair of surrounding double or single quotes.
#[must_use]
pub fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Parse every `--include` / `-F` clause in `argv`.
///
/// Tokens after the flag are collected until the next token starting with
/// `-`. A `type=X` token sets the clause type (the last one wins); everything
/// else is kept as a condition. No clause at all yields one default
/// `type=all` spec.
#[must_use]
pub fn parse_includes_from_argv<S: AsRef<str>>(argv: &[S]) -> Vec<IncludeSpec> {
    let mut specs = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let token = argv[i].as_ref();
        if token != "--include" && token != "-F" {
            i += 1;
            continue;
        }

        let mut spec = IncludeSpec::default();
        i += 1;
        while i < argv.len() && !argv[i].as_ref().starts_with('-') {
            let part = argv[i].as_ref();
            match part.strip_prefix("type=") {
                Some(type_name) => {
                    spec.type_name = unquote(type_name.trim()).to_string();
                    spec.explicitly_typed = true;
                }
                None => spec.conditions.push(part.to_string()),
            }
            i += 1;
        }
        specs.push(spec);
    }

    if specs.is_empty() {
        specs.push(IncludeSpec::default());
    }
    specs
}
