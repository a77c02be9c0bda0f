use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use super::{Makefile, PHONY_TARGET};

static CLEAN_RE: OnceLock<Regex> = OnceLock::new();

fn clean_re() -> &'static Regex {
    CLEAN_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_/.-]+$").expect("valid regex"))
}

/// Renders rules back into makefile text that an external `make` accepts.
///
/// An `all` umbrella rule listing every target is prepended (and declared
/// phony) unless the makefile already defines `all`.
pub fn marshal(mf: &Makefile) -> String {
    let mut out = String::new();

    let all: Vec<&str> = mf
        .rules
        .iter()
        .map(|r| r.target.as_str())
        .filter(|t| !t.starts_with('.'))
        .collect();
    if !all.is_empty() && mf.rule("all").is_none() {
        let _ = writeln!(out, "{PHONY_TARGET}: all");
        let _ = writeln!(out, "all: {}", all.join(" "));
    }

    for rule in &mf.rules {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "{}:", rule.target);
        for prereq in &rule.prereqs {
            let _ = write!(out, " {prereq}");
        }
        out.push('\n');
        for recipe in &rule.recipes {
            let _ = writeln!(out, "\t{recipe}");
        }
    }

    out
}

/// Quotes `s` for a POSIX shell unless it only holds path-safe characters.
///
/// Special characters are escaped and single quotes are dropped, so the
/// result is always safe inside `'...'`.
pub fn quote(s: &str) -> String {
    if clean_re().is_match(s) {
        return s.to_string();
    }
    let escaped = format!("{s:?}");
    let inner = &escaped[1..escaped.len() - 1];
    format!("'{}'", inner.replace('\'', ""))
}

pub fn quote_list<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items.iter().map(|s| quote(s.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::makefile::{parse, Rule};
    use pretty_assertions::assert_eq;

    #[test]
    fn marshal_adds_phony_umbrella() {
        let mf = Makefile::new(vec![
            Rule::new("a").with_prereqs(["b", "c"]).with_recipes(["touch a"]),
            Rule::new("b"),
        ]);
        assert_eq!(
            marshal(&mf),
            ".PHONY: all\nall: a b\n\na: b c\n\ttouch a\n\nb:\n"
        );
    }

    #[test]
    fn marshal_keeps_existing_all_rule() {
        let mf = Makefile::new(vec![Rule::new("all").with_prereqs(["x"]), Rule::new("x")]);
        assert_eq!(marshal(&mf), "all: x\n\nx:\n");
    }

    #[test]
    fn marshal_output_parses_back() {
        let mf = Makefile::new(vec![
            Rule::new("out").with_prereqs(["in"]).with_recipes(["cp in out"]),
            Rule::new("in").with_recipes(["echo hi > in"]),
        ]);
        let reparsed = parse(&marshal(&mf)).unwrap();
        assert_eq!(reparsed.rule("out"), mf.rule("out"));
        assert_eq!(reparsed.rule("in"), mf.rule("in"));
        assert_eq!(reparsed.default_goal(), Some("all"));
    }

    #[test]
    fn quote_leaves_clean_names_alone() {
        assert_eq!(quote("src/main.c"), "src/main.c");
        assert_eq!(quote("a_b-c.d"), "a_b-c.d");
    }

    #[test]
    fn quote_wraps_and_strips_single_quotes() {
        assert_eq!(quote("my file"), "'my file'");
        assert_eq!(quote("it's"), "'its'");
        assert_eq!(quote("a\"b"), "'a\\\"b'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn non_ascii_names_are_quoted() {
        assert_eq!(quote("café"), "'café'");
        assert_eq!(quote("файл.txt"), "'файл.txt'");
    }
}
