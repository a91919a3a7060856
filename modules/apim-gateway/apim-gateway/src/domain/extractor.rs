//! Supported-model scraping for policy fragment bodies.
//!
//! The `set-backend-pools` fragment builds its backend list with a C#
//! policy expression along the lines of
//! `{ "supportedModels", new JArray("gpt-4o", "gpt-4o-mini") }`. Inside the
//! XML container the quotes are usually rendered as `&quot;`. This is a
//! best-effort scraper over that text, not a parser for the policy language.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use apim_gateway_sdk::ModelExtractor;
use regex::{Captures, Regex};

const SUPPORTED_MODELS_KEY: &str = "supportedModels";

/// Patterns locating the `JArray(...)` argument list that follows the
/// `supportedModels` key. Applied in order; overlapping matches are expected.
#[allow(clippy::expect_used)] // good regex, it doesn't panic
static ARRAY_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // Plain quotes around the key
        Regex::new(r#"(?is)"supportedModels"\s*,\s*new\s+JArray\s*\((.*?)\)"#)
            .expect("static regex should not panic"),
        // Entity-quoted key that survived one round of unescaping
        Regex::new(r"(?is)&quot;supportedModels&quot;\s*,\s*new\s+JArray\s*\((.*?)\)")
            .expect("static regex should not panic"),
        // Loose quoting and whitespace
        Regex::new(r#"(?is)supportedModels["\s]*,\s*new\s+JArray\s*\((.*?)\)"#)
            .expect("static regex should not panic"),
    ]
});

/// Patterns pulling quoted tokens out of a captured argument list.
#[allow(clippy::expect_used)] // good regex, it doesn't panic
static TOKEN_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r#""([^"]+)""#).expect("static regex should not panic"),
        Regex::new(r"&quot;([^&]+)&quot;").expect("static regex should not panic"),
    ]
});

/// Any character reference, terminated or not.
#[allow(clippy::expect_used)] // good regex, it doesn't panic
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[0-9]+;?|#[xX][0-9a-fA-F]+;?|[A-Za-z][A-Za-z0-9]*;?)")
        .expect("static regex should not panic")
});

/// Named references that HTML still honours without a trailing `;`.
const LEGACY_ENTITIES: [(&str, char); 9] = [
    ("quot", '"'),
    ("QUOT", '"'),
    ("amp", '&'),
    ("AMP", '&'),
    ("lt", '<'),
    ("LT", '<'),
    ("gt", '>'),
    ("GT", '>'),
    ("nbsp", '\u{a0}'),
];

/// Regex-based [`ModelExtractor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexModelExtractor;

impl ModelExtractor for RegexModelExtractor {
    fn extract(&self, policy_body: &str) -> Vec<String> {
        extract_supported_models(policy_body)
    }
}

/// Extract the supported model names from a policy fragment body.
///
/// Returns a case-sensitive, deduplicated, sorted list. Emits a warning and
/// returns an empty list when nothing matches.
#[must_use]
pub fn extract_supported_models(policy_body: &str) -> Vec<String> {
    let decoded = decode_entities(policy_body);

    let mut models = BTreeSet::new();
    for pattern in ARRAY_PATTERNS.iter() {
        for caps in pattern.captures_iter(&decoded) {
            let Some(args) = caps.get(1) else {
                continue;
            };
            collect_tokens(args.as_str(), &mut models);
        }
    }

    if models.is_empty() {
        tracing::warn!(
            "No supported models found in policy fragment. Check if the policy format matches expected pattern."
        );
    }

    models.into_iter().collect()
}

/// Decode character references in one pass, including legacy named ones
/// written without `;` (`&quot` followed by text).
fn decode_entities(text: &str) -> Cow<'_, str> {
    ENTITY.replace_all(text, |caps: &Captures<'_>| {
        let reference = &caps[0];
        let name = &reference[1..];
        if name.starts_with('#') {
            let terminated = if name.ends_with(';') {
                Cow::Borrowed(reference)
            } else {
                Cow::Owned(format!("{reference};"))
            };
            return html_escape::decode_html_entities(&terminated).into_owned();
        }
        if name.ends_with(';') {
            let decoded = html_escape::decode_html_entities(reference);
            if decoded != reference {
                return decoded.into_owned();
            }
        }
        LEGACY_ENTITIES
            .iter()
            .find(|(entity, _)| name.starts_with(entity))
            .map_or_else(
                || reference.to_owned(),
                |(entity, ch)| format!("{ch}{}", &name[entity.len()..]),
            )
    })
}

fn collect_tokens(args: &str, models: &mut BTreeSet<String>) {
    for pattern in TOKEN_PATTERNS.iter() {
        let tokens = pattern
            .captures_iter(args)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|token| !token.is_empty() && *token != SUPPORTED_MODELS_KEY);
        models.extend(tokens.map(str::to_owned));
    }
}
