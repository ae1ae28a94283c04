//! Wildcard URI patterns.
//!
//! # Tokens
//! | token | regex |
//! |---|---|
//! | `(:num)` | `([0-9]+)` |
//! | `(:any)` | `([a-zA-Z0-9\.\-_%=]+)` |
//! | `(:segment)` | `([^/]+)` |
//! | `(:all)` | `(.*)` |
//!
//! Each token also has an optional form, `/(:num?)` etc., which opens a
//! `(?:/(...)` group. The closing `)?` of every optional group is appended
//! at the very end of the pattern so trailing optional segments nest:
//! `a/(:any?)/(:any?)` matches `a`, `a/x` and `a/x/y`.

use regex::Regex;

const OPTIONAL: [(&str, &str); 4] = [
    ("/(:num?)", r"(?:/([0-9]+)"),
    ("/(:any?)", r"(?:/([a-zA-Z0-9\.\-_%=]+)"),
    ("/(:segment?)", r"(?:/([^/]+)"),
    ("/(:all?)", r"(?:/(.*)"),
];

const REQUIRED: [(&str, &str); 4] = [
    ("(:num)", r"([0-9]+)"),
    ("(:any)", r"([a-zA-Z0-9\.\-_%=]+)"),
    ("(:segment)", r"([^/]+)"),
    ("(:all)", r"(.*)"),
];

/// True when `uri` must be matched by regex rather than exact lookup.
pub fn is_pattern(uri: &str) -> bool {
    uri.contains('(')
}

/// True when `uri` is filed after every literal-list route. Only a leading
/// `(` does this; `users/(:num)` stays in the literal list and is scanned
/// in registration order alongside it.
pub fn is_fallback(uri: &str) -> bool {
    uri.starts_with('(')
}

/// Translate wildcard tokens into an (unanchored) regex source.
pub fn translate(pattern: &str) -> String {
    let mut translated = pattern.to_string();
    let mut optional = 0;

    // Optional forms first: `/(:any?)` would otherwise be left half-replaced.
    for (token, fragment) in OPTIONAL {
        optional += translated.matches(token).count();
        translated = translated.replace(token, fragment);
    }
    translated.push_str(&")?".repeat(optional));

    for (token, fragment) in REQUIRED {
        translated = translated.replace(token, fragment);
    }
    translated
}

/// Compile a pattern into a regex anchored at both ends.
pub fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^{}$", translate(pattern)))
}
