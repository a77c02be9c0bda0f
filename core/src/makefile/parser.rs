use crate::error::ParseError;

use super::marshal::{quote, quote_list};
use super::{Makefile, Rule};

/// Parses makefile text into rules.
///
/// Supported syntax is deliberately small:
///
/// ```text
/// target: prereq1 prereq2
/// <TAB>recipe using $@ and $^
/// ```
///
/// `$@` expands to the quoted target and `$^` to the quoted prerequisites,
/// both at parse time. Any line that is neither a rule header nor a recipe
/// (blank lines and `#` comments included) ends the current rule. Line numbers in errors are 1-based.
pub fn parse(input: &str) -> Result<Makefile, ParseError> {
    let mut rules: Vec<Rule> = Vec::new();
    let mut in_rule = false;

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;

        if let Some(recipe) = line.strip_prefix('\t') {
            let rule = match rules.last_mut() {
                Some(rule) if in_rule => rule,
                _ => return Err(ParseError::RecipeOutsideRule { line: line_no }),
            };
            let recipe = recipe
                .replace("$@", &quote(&rule.target))
                .replace("$^", &quote_list(&rule.prereqs).join(" "));
            rule.recipes.push(recipe);
            continue;
        }

        if line.trim_start().starts_with('#') {
            in_rule = false;
            continue;
        }

        if let Some(sep) = line.find(':') {
            let targets: Vec<&str> = line[..sep].split_whitespace().collect();
            let target = match targets.as_slice() {
                [one] => *one,
                [] => return Err(ParseError::MissingTarget { line: line_no }),
                _ => return Err(ParseError::MultipleTargets { line: line_no }),
            };
            let prereqs = line[sep + 1..].split_whitespace();
            rules.push(Rule::new(target).with_prereqs(prereqs));
            in_rule = true;
            continue;
        }

        in_rule = false;
    }

    Ok(Makefile::new(rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_rules_and_recipes() {
        let input = "all: a b\n\ta: echo $@\n\ncc: main.c\n\tcc -o $@ $^\n\tstrip $@\n";
        let mf = parse(input).unwrap();
        assert_eq!(
            mf.rules,
            vec![
                Rule::new("all")
                    .with_prereqs(["a", "b"])
                    .with_recipes(["a: echo all"]),
                Rule::new("cc")
                    .with_prereqs(["main.c"])
                    .with_recipes(["cc -o cc main.c", "strip cc"]),
            ]
        );
    }

    #[test]
    fn quotes_unusual_names_in_automatic_variables() {
        let mf = parse("out file: in$put\n\tcp $^ $@\n");
        assert_eq!(mf, Err(ParseError::MultipleTargets { line: 1 }));

        let mf = parse("out: my file\n\tcat $^ > $@\n").unwrap();
        assert_eq!(mf.rules[0].recipes, vec!["cat my file > out"]);

        let mf = parse("out: we'ird\n\tcat $^\n").unwrap();
        assert_eq!(mf.rules[0].recipes, vec!["cat 'weird'"]);
    }

    #[test]
    fn recipe_outside_rule_is_an_error() {
        assert_eq!(
            parse("\techo hi\n"),
            Err(ParseError::RecipeOutsideRule { line: 1 })
        );
        assert_eq!(
            parse("a:\n\ttrue\n# comment ends the rule\n\tfalse\n"),
            Err(ParseError::RecipeOutsideRule { line: 4 })
        );
    }

    #[test]
    fn empty_target_is_an_error() {
        assert_eq!(parse(": x\n"), Err(ParseError::MissingTarget { line: 1 }));
    }

    #[test]
    fn empty_input_has_no_rules() {
        assert!(parse("").unwrap().is_empty());
    }
}
