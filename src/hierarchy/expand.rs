// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Environment expression resolution for hierarchy fields.
//!
//! A field whose value contains `${{ env.NAME }}` is replaced, as a whole,
//! by the value of the environment variable `NAME`. This is whole-field
//! substitution rather than inline templating: any text around the token is
//! discarded.

use tracing::warn;

const OPEN_TOKEN: &str = "${{";
const CLOSE_TOKEN: &str = "}}";
const ENV_PREFIX: &str = "env.";

/// Outcome of resolving one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Resolved field value.
    pub value: String,

    /// Name of the variable that resolved to an empty value, if any.
    pub empty_variable: Option<String>,
}

impl Expansion {
    fn unchanged(input: &str) -> Self {
        Self {
            value: input.to_string(),
            empty_variable: None,
        }
    }

    /// Returns true if resolution produced a warning.
    pub fn has_warning(&self) -> bool {
        self.empty_variable.is_some()
    }
}

/// Extract the variable name from an `${{ env.NAME }}` expression.
///
/// Returns `None` when the input has no opening token, no closing token,
/// a reference outside the `env.` namespace, or an empty name.
pub fn parse_env_expression(input: &str) -> Option<&str> {
    let open = input.find(OPEN_TOKEN)?;
    let rest = &input[open + OPEN_TOKEN.len()..];
    let close = rest.find(CLOSE_TOKEN)?;
    let name = rest[..close].trim().strip_prefix(ENV_PREFIX)?;

    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return None;
    }

    Some(name)
}

/// Resolve an environment expression using a custom variable lookup.
///
/// A variable that is unset or set to an empty value resolves to an empty
/// string and is reported through [`Expansion::empty_variable`].
pub fn resolve_env_expression_with<F>(input: &str, lookup: F) -> Expansion
where
    F: Fn(&str) -> Option<String>,
{
    let Some(name) = parse_env_expression(input) else {
        return Expansion::unchanged(input);
    };

    let value = lookup(name).unwrap_or_default();
    if value.is_empty() {
        warn!(
            "The environment variable {} is empty, the value will be replaced with an empty string",
            name
        );
        return Expansion {
            value,
            empty_variable: Some(name.to_string()),
        };
    }

    Expansion {
        value,
        empty_variable: None,
    }
}

/// Resolve an environment expression against the process environment.
pub fn resolve_env_expression(input: &str) -> Expansion {
    resolve_env_expression_with(input, |name| std::env::var(name).ok())
}

/// Resolve a field in place, returning the resolved string.
///
/// # Examples
///
/// ```
/// use pki_hierarchy::hierarchy::replace_env;
///
/// assert_eq!(replace_env("plain"), "plain");
/// assert_eq!(replace_env("${{ notenv.FOO }}"), "${{ notenv.FOO }}");
/// ```
pub fn replace_env(input: &str) -> String {
    resolve_env_expression(input).value
}
