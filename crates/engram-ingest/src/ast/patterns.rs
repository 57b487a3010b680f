//! Architectural pattern table and complexity heuristic (spec §4.4 "AST
//! ingestion"), shared by every language backend.

use once_cell::sync::Lazy;
use regex::Regex;

/// `(suffix, detected_pattern)`, checked in order — `detect_pattern` returns
/// the first match, matching the original's dict-iteration-order behavior.
static ARCHITECTURAL_PATTERNS: &[(&str, &str)] = &[
    ("Controller", "Controller"),
    ("Service", "Service"),
    ("Repository", "Repository"),
    ("Factory", "Factory"),
    ("Builder", "Builder"),
    ("Adapter", "Adapter"),
    ("Strategy", "Strategy"),
    ("Observer", "Observer"),
    ("Handler", "Handler"),
    ("Middleware", "Middleware"),
    ("Validator", "Validator"),
    ("Serializer", "Serializer"),
    ("Presenter", "Presenter"),
    ("ViewModel", "ViewModel"),
    ("UseCase", "UseCase"),
    ("Interactor", "Interactor"),
    ("Provider", "Provider"),
    ("Manager", "Manager"),
    ("Client", "Client"),
    ("Gateway", "Gateway"),
    ("Command", "Command"),
    ("Query", "Query"),
    ("Event", "Event"),
    ("Listener", "Listener"),
    ("Subscriber", "Subscriber"),
    ("DTO", "DTO"),
    ("Model", "Model"),
    ("Entity", "Entity"),
    ("Spec", "Test"),
    ("Test", "Test"),
    ("Mock", "Test"),
];

/// Matches `name` against the architectural pattern table, returning the
/// first matching suffix's label (empty string if none match).
pub fn detect_pattern(name: &str) -> String {
    for (suffix, label) in ARCHITECTURAL_PATTERNS {
        if name.ends_with(suffix) {
            return label.to_string();
        }
    }
    String::new()
}

static BRANCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(if|elif|else|case|match|for|while|try|catch|except|rescue)\b").unwrap());

/// Branch-count + max-nesting-depth heuristic (spec §4.4 "Complexity is
/// estimated from branch count + max indent-depth").
pub fn estimate_complexity(body_lines: &[&str]) -> &'static str {
    let mut branch_count = 0usize;
    let mut max_nesting = 0usize;
    let mut current_nesting = 0usize;

    for line in body_lines {
        let stripped = line.trim_start();
        if BRANCH_RE.is_match(stripped) {
            branch_count += 1;
        }
        let indent = line.len() - stripped.len();
        let nesting = indent / 4;
        if nesting > current_nesting {
            current_nesting = nesting;
        }
        max_nesting = max_nesting.max(current_nesting);
    }

    if branch_count <= 2 && max_nesting <= 2 {
        "simple"
    } else if branch_count <= 5 && max_nesting <= 3 {
        "moderate"
    } else {
        "complex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_suffixes() {
        assert_eq!(detect_pattern("UserController"), "Controller");
        assert_eq!(detect_pattern("PaymentService"), "Service");
        assert_eq!(detect_pattern("LoginSpec"), "Test");
        assert_eq!(detect_pattern("Plain"), "");
    }

    #[test]
    fn complexity_scales_with_branches_and_nesting() {
        let simple = ["    return 1"];
        assert_eq!(estimate_complexity(&simple), "simple");

        let complex = [
            "    if a:",
            "        if b:",
            "            if c:",
            "                for x in y:",
            "                    while z:",
            "                        try:",
            "                            pass",
        ];
        assert_eq!(estimate_complexity(&complex), "complex");
    }
}
