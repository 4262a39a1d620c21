//! Inline lint-waiver comments.
//!
//! Recognized anywhere on a comment line:
//!
//! - `tclint-disable [rules]` opens a disabled region
//! - `tclint-enable [rules]` closes it
//! - `tclint-disable-line [rules]` disables on the comment's line
//! - `tclint-disable-next-line [rules]` disables on the following line
//!
//! An empty rule list means all rules.

use std::collections::{HashMap, HashSet};

use regex_lite::Regex;

use crate::ast::types::{Comment, Script};
use crate::ast::visitor::{walk_script, Visitor};
use crate::lint::violations::{Rule, Violation};

/// Per-rule sets of suppressed source lines.
#[derive(Debug, Default)]
pub struct Suppressions {
    lines: HashMap<usize, HashSet<Rule>>,
}

impl Suppressions {
    pub fn is_suppressed(&self, rule: Rule, line: usize) -> bool {
        self.lines.get(&line).is_some_and(|rules| rules.contains(&rule))
    }

    fn add(&mut self, line: usize, rules: &[Rule]) {
        self.lines.entry(line).or_default().extend(rules.iter().copied());
    }
}

/// Scans the tree for waiver comments and resolves them to suppressed line
/// ranges. Unknown rule ids are returned as warnings.
pub fn resolve(tree: &Script) -> (Suppressions, Vec<String>) {
    let mut visitor = DirectiveVisitor {
        re: Regex::new(r"tclint-(disable-next-line|disable-line|disable|enable)\b")
            .expect("valid regex"),
        suppressions: Suppressions::default(),
        disable_regions: HashMap::new(),
        warnings: Vec::new(),
    };
    walk_script(&mut visitor, tree);

    // resolve regions still open at end of file
    let last_line = tree.span.end.line;
    let regions: Vec<(Rule, usize)> = visitor.disable_regions.drain().collect();
    for (rule, start_line) in regions {
        for line in start_line..=last_line {
            visitor.suppressions.add(line, &[rule]);
        }
    }

    (visitor.suppressions, visitor.warnings)
}

/// Drops violations that fall in a suppressed range for their rule.
pub fn filter_violations(violations: Vec<Violation>, suppressions: &Suppressions) -> Vec<Violation> {
    violations
        .into_iter()
        .filter(|v| !suppressions.is_suppressed(v.rule, v.span.start.line))
        .collect()
}

struct DirectiveVisitor {
    re: Regex,
    suppressions: Suppressions,
    disable_regions: HashMap<Rule, usize>,
    warnings: Vec<String>,
}

impl DirectiveVisitor {
    fn parse_rules(&mut self, rest: &str, line: usize) -> Vec<Rule> {
        // the rule list ends at `--`, which introduces prose
        let list = rest.split("--").next().unwrap_or("").trim();
        if list.is_empty() {
            return Rule::ALL.to_vec();
        }

        let mut rules = Vec::new();
        for id in list.split(',') {
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            match Rule::from_id(id) {
                Some(rule) => rules.push(rule),
                None => self
                    .warnings
                    .push(format!("line {line}: unknown rule id in lint directive: {id}")),
            }
        }
        if rules.is_empty() {
            Rule::ALL.to_vec()
        } else {
            rules
        }
    }
}

impl Visitor for DirectiveVisitor {
    fn visit_comment(&mut self, comment: &Comment) {
        let Some(found) = self.re.captures(&comment.text) else {
            return;
        };
        let directive = found.get(1).expect("group 1 exists");
        let rest = &comment.text[directive.end()..];
        let line = comment.span.start.line;
        let rules = self.parse_rules(rest, line);

        match directive.as_str() {
            "disable" => {
                for rule in rules {
                    // already-disabled rules keep their original start
                    self.disable_regions.entry(rule).or_insert(line);
                }
            }
            "enable" => {
                for rule in rules {
                    if let Some(start_line) = self.disable_regions.remove(&rule) {
                        for l in start_line..=line {
                            self.suppressions.add(l, &[rule]);
                        }
                    }
                }
            }
            "disable-line" => self.suppressions.add(line, &rules),
            "disable-next-line" => self.suppressions.add(line + 1, &rules),
            _ => unreachable!("regex only matches known directives"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandRegistry, Dialect};
    use crate::parser::Parser;

    fn resolve_source(source: &str) -> (Suppressions, Vec<String>) {
        let registry = CommandRegistry::new(Dialect::Tcl);
        let mut parser = Parser::new(&registry);
        let tree = parser.parse(source);
        resolve(&tree)
    }

    #[test]
    fn test_disable_next_line() {
        let (suppressions, warnings) =
            resolve_source("# tclint-disable-next-line command-args\nputs a b c d e\nputs f\n");
        assert!(warnings.is_empty());
        assert!(suppressions.is_suppressed(Rule::CommandArgs, 2));
        assert!(!suppressions.is_suppressed(Rule::CommandArgs, 3));
        assert!(!suppressions.is_suppressed(Rule::Spacing, 2));
    }

    #[test]
    fn test_disable_enable_region() {
        let source = "\
# tclint-disable spacing
puts a
# tclint-enable spacing
puts b
";
        let (suppressions, _) = resolve_source(source);
        assert!(suppressions.is_suppressed(Rule::Spacing, 2));
        assert!(suppressions.is_suppressed(Rule::Spacing, 3));
        assert!(!suppressions.is_suppressed(Rule::Spacing, 4));
    }

    #[test]
    fn test_disable_to_end_of_file() {
        let (suppressions, _) = resolve_source("# tclint-disable\nputs a\nputs b\n");
        assert!(suppressions.is_suppressed(Rule::Spacing, 3));
        assert!(suppressions.is_suppressed(Rule::CommandArgs, 2));
    }

    #[test]
    fn test_disable_line_with_rule_list() {
        let (suppressions, _) =
            resolve_source("puts x ;# tclint-disable-line spacing, line-length\n");
        assert!(suppressions.is_suppressed(Rule::Spacing, 1));
        assert!(suppressions.is_suppressed(Rule::LineLength, 1));
        assert!(!suppressions.is_suppressed(Rule::Indent, 1));
    }

    #[test]
    fn test_unknown_rule_warns() {
        let (_, warnings) = resolve_source("# tclint-disable-line no-such-rule\n");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("no-such-rule"));
    }

    #[test]
    fn test_directive_in_nested_script() {
        let source = "\
proc foo {} {
    # tclint-disable-next-line spacing
    puts  a
}
";
        let (suppressions, _) = resolve_source(source);
        assert!(suppressions.is_suppressed(Rule::Spacing, 3));
    }
}
