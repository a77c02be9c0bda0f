//! Makefile model
//!
//! A [`Makefile`] is an ordered list of [`Rule`]s. Rules are plain data; the
//! text format lives in [`parser`], its inverse in [`marshal`], and glob
//! expansion of prerequisites in [`expand`].

use std::collections::HashMap;

mod expand;
mod marshal;
mod parser;

pub use expand::{expand_globs, is_glob_pattern};
pub use marshal::{marshal, quote, quote_list};
pub use parser::parse;

/// First-match lookup table built by [`Makefile::index`].
pub type RuleIndex<'a> = HashMap<&'a str, &'a Rule>;

/// Name of the special rule whose prerequisites are always rebuilt.
pub const PHONY_TARGET: &str = ".PHONY";

/// A target, the targets it depends on, and the commands that produce it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    pub target: String,
    pub prereqs: Vec<String>,
    pub recipes: Vec<String>,
}

impl Rule {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            prereqs: Vec::new(),
            recipes: Vec::new(),
        }
    }

    pub fn with_prereqs<I, S>(mut self, prereqs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prereqs = prereqs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_recipes<I, S>(mut self, recipes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipes = recipes.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Makefile {
    pub rules: Vec<Rule>,
}

impl Makefile {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Returns the first rule for `target`.
    ///
    /// This is a linear scan; use [`Makefile::index`] for repeated lookups.
    pub fn rule(&self, target: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.target == target)
    }

    /// Target -> first rule defining it.
    pub fn index(&self) -> RuleIndex<'_> {
        let mut rules: HashMap<&str, &Rule> = HashMap::with_capacity(self.rules.len());
        for rule in &self.rules {
            rules.entry(rule.target.as_str()).or_insert(rule);
        }
        rules
    }

    /// The first rule whose target does not start with `.`.
    pub fn default_goal(&self) -> Option<&str> {
        self.rules
            .iter()
            .map(|r| r.target.as_str())
            .find(|t| !t.starts_with('.'))
    }

    /// Targets declared as prerequisites of `.PHONY`.
    pub fn phony_targets(&self) -> impl Iterator<Item = &str> {
        self.rule(PHONY_TARGET)
            .into_iter()
            .flat_map(|r| r.prereqs.iter().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_first_match() {
        let mf = Makefile::new(vec![
            Rule::new("x").with_recipes(["first"]),
            Rule::new("x").with_recipes(["second"]),
        ]);
        assert_eq!(mf.rule("x").unwrap().recipes, vec!["first"]);
        assert!(mf.rule("y").is_none());

        let index = mf.index();
        assert_eq!(index.len(), 1);
        assert_eq!(index["x"].recipes, vec!["first"]);
    }

    #[test]
    fn default_goal_skips_dot_targets() {
        let mf = Makefile::new(vec![
            Rule::new(".PHONY").with_prereqs(["all"]),
            Rule::new("all").with_prereqs(["a"]),
            Rule::new("a"),
        ]);
        assert_eq!(mf.default_goal(), Some("all"));
        assert_eq!(mf.phony_targets().collect::<Vec<_>>(), vec!["all"]);
        assert_eq!(Makefile::default().default_goal(), None);
    }
}
