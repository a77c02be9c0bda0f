//! Build plans: which targets need building, in what order.

use std::collections::HashSet;
use std::io::Write;

use crate::config::Config;
use crate::error::MakeError;
use crate::executor::{write_dry_run, BuildSummary, ExecutionEngine};
use crate::graph::BuildGraph;
use crate::makefile::{Makefile, RuleIndex, PHONY_TARGET};

/// A makefile, a goal list and the dependency graph between them.
///
/// The graph is computed once in [`Plan::new`]. Only the staleness check in
/// [`Plan::levels_needing_build`] looks at the filesystem, so a plan can be
/// re-run as files change.
#[derive(Debug)]
pub struct Plan {
    config: Config,
    makefile: Makefile,
    graph: BuildGraph,
    phony: HashSet<String>,
}

impl Plan {
    pub fn new<S: AsRef<str>>(config: Config, makefile: Makefile, goals: &[S]) -> Self {
        let graph = BuildGraph::new(&makefile, goals);
        let phony = makefile.phony_targets().map(str::to_string).collect();
        tracing::debug!(
            goals = ?graph.goals(),
            targets = graph.len(),
            levels = graph.levels().len(),
            "plan created"
        );
        Self {
            config,
            makefile,
            graph,
            phony,
        }
    }

    /// Levels of targets that must be built, prerequisites first.
    ///
    /// Fails before anything runs if a goal has no rule, a goal cannot be
    /// ordered because of a cycle, or a prerequisite without a rule does not
    /// exist on disk.
    pub fn levels_needing_build(&self) -> Result<Vec<Vec<String>>, MakeError> {
        let rules = self.makefile.index();
        for goal in self.graph.goals() {
            if !rules.contains_key(goal.as_str()) {
                return Err(MakeError::undefined(goal.clone()));
            }
            let unresolved = self
                .graph
                .cycles()
                .get(goal)
                .or_else(|| self.graph.blocked().get(goal));
            if let Some(deps) = unresolved {
                return Err(MakeError::CircularDependency {
                    target: goal.clone(),
                    deps: deps.clone(),
                });
            }
        }

        let mut levels = Vec::with_capacity(self.graph.levels().len());
        for level in self.graph.levels() {
            let mut stale = Vec::with_capacity(level.len());
            for target in level {
                if self.needs_build(&rules, target)? {
                    stale.push(target.clone());
                }
            }
            if !stale.is_empty() {
                levels.push(stale);
            }
        }
        Ok(levels)
    }

    fn needs_build(&self, rules: &RuleIndex<'_>, target: &str) -> Result<bool, MakeError> {
        if target == PHONY_TARGET {
            return Ok(false);
        }
        if !rules.contains_key(target) {
            // An input file: fine if present, unbuildable otherwise.
            if self.config.fs.exists(target)? {
                return Ok(false);
            }
            return Err(MakeError::UndefinedTarget {
                target: target.to_string(),
                needed_by: self.graph.dependents(target).first().cloned(),
            });
        }
        if self.phony.contains(target) {
            return Ok(true);
        }
        Ok(!self.config.fs.exists(target)?)
    }

    /// Builds every stale target.
    pub async fn run(&self) -> Result<BuildSummary, MakeError> {
        let levels = self.levels_needing_build()?;
        let rules = self.makefile.index();
        let engine = ExecutionEngine::new(&self.config, &rules, &self.phony);
        let summary = engine.execute_levels(&levels).await?;
        Ok(summary)
    }

    /// Writes the levels `run` would build, without running anything.
    pub fn dry_run<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), MakeError> {
        let levels = self.levels_needing_build()?;
        write_dry_run(w, &levels)?;
        Ok(())
    }

    pub fn goals(&self) -> &[String] {
        self.graph.goals()
    }

    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    pub fn makefile(&self) -> &Makefile {
        &self.makefile
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_phony(&self, target: &str) -> bool {
        self.phony.contains(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::makefile::{parse, Rule};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn rule(target: &str, prereqs: &[&str]) -> Rule {
        Rule::new(target).with_prereqs(prereqs.iter().copied())
    }

    fn plan(rules: Vec<Rule>, files: &[&str], goals: &[&str]) -> Plan {
        let fs = Arc::new(MemoryFileSystem::with_files(files));
        Plan::new(Config::new(fs), Makefile::new(rules), goals)
    }

    fn levels(plan: &Plan) -> Vec<Vec<String>> {
        plan.levels_needing_build().unwrap()
    }

    #[test]
    fn chain_without_recipes() {
        let p = plan(vec![rule("x0", &["x1"]), rule("x1", &[])], &[], &["x0"]);
        assert_eq!(levels(&p), vec![vec!["x1"], vec!["x0"]]);
    }

    #[test]
    fn shared_prereq_is_built_once() {
        let rules = vec![rule("x0", &["y"]), rule("x1", &["y"]), rule("y", &[])];
        let p = plan(rules, &[], &["x0", "x1"]);
        let got = levels(&p);
        assert_eq!(got[0], vec!["y"]);
        let mut second = got[1].clone();
        second.sort();
        assert_eq!(second, vec!["x0", "x1"]);
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn duplicate_goals_collapse() {
        let p = plan(vec![rule("x", &[])], &[], &["x", "x"]);
        assert_eq!(p.goals(), &["x".to_string()]);
        assert_eq!(levels(&p), vec![vec!["x"]]);
    }

    #[test]
    fn existing_goal_is_skipped() {
        let p = plan(vec![rule("x", &[])], &["x"], &["x"]);
        assert!(levels(&p).is_empty());
    }

    #[test]
    fn existing_target_leaves_gap_without_empty_level() {
        let rules = vec![rule("a", &["b"]), rule("b", &["c"]), rule("c", &[])];
        let p = plan(rules, &["b"], &["a"]);
        assert_eq!(levels(&p), vec![vec!["c"], vec!["a"]]);
    }

    #[test]
    fn self_cycle_names_the_goal() {
        let p = plan(vec![rule("x", &["x"])], &[], &["x"]);
        match p.levels_needing_build().unwrap_err() {
            MakeError::CircularDependency { target, deps } => {
                assert_eq!(target, "x");
                assert_eq!(deps, vec!["x"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mutual_cycle_names_goal_and_other() {
        let p = plan(vec![rule("x0", &["x1"]), rule("x1", &["x0"])], &[], &["x0"]);
        match p.levels_needing_build().unwrap_err() {
            MakeError::CircularDependency { target, deps } => {
                assert_eq!(target, "x0");
                assert_eq!(deps, vec!["x1"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn goal_blocked_behind_cycle_fails() {
        let rules = vec![rule("g", &["a"]), rule("a", &["b"]), rule("b", &["a"])];
        let p = plan(rules, &[], &["g"]);
        assert!(matches!(
            p.levels_needing_build(),
            Err(MakeError::CircularDependency { target, .. }) if target == "g"
        ));
    }

    #[test]
    fn undefined_goal() {
        let p = plan(vec![rule("x", &[])], &[], &["nope"]);
        match p.levels_needing_build().unwrap_err() {
            MakeError::UndefinedTarget { target, needed_by } => {
                assert_eq!(target, "nope");
                assert_eq!(needed_by, None);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_input_file_names_its_dependent() {
        let p = plan(vec![rule("app", &["main.c"])], &[], &["app"]);
        let err = p.levels_needing_build().unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"no rule to make target "main.c", needed by "app""#
        );
        assert!(err.is_planning());
    }

    #[test]
    fn present_input_file_is_not_built() {
        let p = plan(vec![rule("app", &["main.c"])], &["main.c"], &["app"]);
        assert_eq!(levels(&p), vec![vec!["app"]]);
    }

    #[test]
    fn phony_targets_always_rebuild() {
        let mf = parse(".PHONY: clean\nclean:\n\trm -f out\n").unwrap();
        let fs = Arc::new(MemoryFileSystem::with_files(["clean"]));
        let p = Plan::new(Config::new(fs), mf, &["clean"]);
        assert!(p.is_phony("clean"));
        assert_eq!(levels(&p), vec![vec!["clean"]]);
    }

    #[test]
    fn levels_respect_dependencies() {
        let rules = vec![
            rule("all", &["a", "b"]),
            rule("a", &["c"]),
            rule("b", &["c", "d"]),
            rule("c", &["e"]),
            rule("d", &[]),
            rule("e", &[]),
        ];
        let p = plan(rules, &["d"], &["all"]);
        let got = levels(&p);

        let mut level_of = std::collections::HashMap::new();
        for (i, level) in got.iter().enumerate() {
            for t in level {
                assert!(level_of.insert(t.clone(), i).is_none(), "{t} twice");
            }
        }
        assert!(!level_of.contains_key("d"));
        for (target, level) in &level_of {
            for dep in p.graph().dependencies(target) {
                if let Some(dep_level) = level_of.get(dep) {
                    assert!(dep_level < level, "{dep} must precede {target}");
                }
            }
        }
    }

    #[test]
    fn dry_run_is_repeatable_and_read_only() {
        let fs = Arc::new(MemoryFileSystem::with_files(["y"]));
        let rules = vec![rule("x0", &["y"]), rule("x1", &["y"]), rule("y", &[])];
        let p = Plan::new(Config::new(fs.clone()), Makefile::new(rules), &["x0", "x1"]);

        let mut first = Vec::new();
        let mut second = Vec::new();
        p.dry_run(&mut first).unwrap();
        p.dry_run(&mut second).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            String::from_utf8(first).unwrap(),
            "========= TARGET SET 0 (2 targets)\n -  x0\n -  x1\n"
        );
        assert_eq!(fs.paths(), vec!["y"]);
    }

    #[test]
    fn long_chain_plans_in_linear_time() {
        let n = 30_000;
        let mut rules = vec![rule("t0", &[])];
        for i in 1..n {
            let prev = format!("t{}", i - 1);
            rules.push(rule(&format!("t{i}"), &[prev.as_str()]));
        }
        let goal = format!("t{}", n - 1);

        let start = std::time::Instant::now();
        let p = plan(rules, &[], &[goal.as_str()]);
        let got = levels(&p);
        let elapsed = start.elapsed();

        assert_eq!(got.len(), n);
        assert_eq!(got[0], vec!["t0"]);
        assert_eq!(got[n - 1], vec![goal.as_str()]);
        // A per-lookup scan of the rule list takes minutes here in debug builds.
        assert!(elapsed < std::time::Duration::from_secs(10), "took {elapsed:?}");
    }

    /// Filesystem whose every call fails with `PermissionDenied`.
    struct DeniedFileSystem;

    impl crate::fs::FileSystem for DeniedFileSystem {
        fn exists(&self, _path: &str) -> std::io::Result<bool> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))
        }

        fn remove(&self, _path: &str) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))
        }

        fn list_files(&self, _root: &str) -> std::io::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn filesystem_errors_propagate_from_staleness_check() {
        let p = Plan::new(
            Config::new(Arc::new(DeniedFileSystem)),
            Makefile::new(vec![rule("out", &[])]),
            &["out"],
        );
        match p.levels_needing_build().unwrap_err() {
            MakeError::Fs(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::PermissionDenied);
                assert_eq!(e.to_string(), "denied");
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut out = Vec::new();
        assert!(matches!(p.dry_run(&mut out), Err(MakeError::Fs(_))));
        assert!(out.is_empty());
    }
}
