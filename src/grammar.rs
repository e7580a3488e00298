// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use crate::{
    ast::{Assertion, GrammarDecl, Node, RuleDecl, RuleKind, RuleRef},
    charset::named_class,
    context::Context,
    error::{CompileError, Error},
    grammarparser::parse_grammars_from_str,
    input::Input,
    location::Location,
    matchresult::MatchResult,
    modifier::Modifiers,
    parser::parse_from_str,
    process::start_process,
    regex::Regex,
};

/// The rule `parse` and `subparse` start from.
pub const TOP_RULE_NAME: &str = "TOP";

#[derive(Debug, PartialEq, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    pub name: String,
    pub body: Node,
}

impl Rule {
    pub fn new(kind: RuleKind, name: &str, body: Node) -> Self {
        Self {
            kind,
            name: name.to_owned(),
            body,
        }
    }
}

#[derive(Debug)]
pub struct Grammar {
    name: String,
    parent: Option<String>,
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl Grammar {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// A rule declared in this grammar itself, parents are not consulted.
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).map(|idx| &self.rules[*idx])
    }

    /// The declared rules, in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Collects grammar declarations, `finalize` checks them and produces
/// the immutable registry.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    decls: Vec<GrammarDecl>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a grammar from `(kind, name, body)` triples.
    pub fn define(
        &mut self,
        name: &str,
        parent: Option<&str>,
        rules: &[(RuleKind, &str, &str)],
    ) -> Result<&mut Self, CompileError> {
        let mut rule_decls = vec![];
        for (kind, rule_name, body) in rules {
            rule_decls.push(RuleDecl {
                kind: *kind,
                name: (*rule_name).to_owned(),
                body: parse_from_str(body, kind.sigspace())?,
                location: Location::new_position(0, 0, 0),
            });
        }

        self.decls.push(GrammarDecl {
            name: name.to_owned(),
            parent: parent.map(|p| p.to_owned()),
            rules: rule_decls,
        });
        Ok(self)
    }

    /// Declares every grammar found in the grammar source text.
    pub fn add_source(&mut self, source: &str) -> Result<&mut Self, CompileError> {
        let decls = parse_grammars_from_str(source)?;
        self.decls.extend(decls);
        Ok(self)
    }

    pub fn finalize(self) -> Result<Arc<GrammarRegistry>, CompileError> {
        let mut registry = GrammarRegistry {
            grammars: vec![],
            index: HashMap::new(),
        };

        for decl in self.decls {
            if registry.index.contains_key(&decl.name) {
                return Err(CompileError::DuplicateGrammarName(decl.name));
            }

            let mut rules = vec![];
            let mut index = HashMap::new();
            for rule_decl in decl.rules {
                if index.contains_key(&rule_decl.name) {
                    return Err(CompileError::DuplicateRuleName {
                        grammar: decl.name,
                        rule: rule_decl.name,
                    });
                }
                index.insert(rule_decl.name.clone(), rules.len());
                rules.push(Rule {
                    kind: rule_decl.kind,
                    name: rule_decl.name,
                    body: rule_decl.body,
                });
            }

            registry
                .index
                .insert(decl.name.clone(), registry.grammars.len());
            registry.grammars.push(Grammar {
                name: decl.name,
                parent: decl.parent,
                rules,
                index,
            });
        }

        registry.check_inheritance()?;
        registry.check_references()?;

        Ok(Arc::new(registry))
    }
}

/// Finalized grammars. Never changes once built, so it can be shared by
/// any number of concurrent match attempts.
#[derive(Debug)]
pub struct GrammarRegistry {
    grammars: Vec<Grammar>,
    index: HashMap<String, usize>,
}

impl GrammarRegistry {
    /// Builds a registry from grammar source text.
    pub fn from_source(source: &str) -> Result<Arc<GrammarRegistry>, CompileError> {
        let mut builder = GrammarBuilder::new();
        builder.add_source(source)?;
        builder.finalize()
    }

    pub fn grammar(&self, name: &str) -> Option<&Grammar> {
        self.index.get(name).map(|idx| &self.grammars[*idx])
    }

    pub fn grammars(&self) -> &[Grammar] {
        &self.grammars
    }

    /// Finds a rule the way a rule call does: in the named grammar and its
    /// ancestors, then among the builtin rules. Without a grammar only the
    /// builtin rules are visible.
    pub fn resolve(&self, grammar: Option<&str>, rule: &str) -> Result<&Rule, CompileError> {
        let found = match grammar {
            Some(name) => {
                if self.grammar(name).is_none() {
                    return Err(CompileError::UnknownGrammar(name.to_owned()));
                }
                self.lookup(name, rule).or_else(|| builtin_rule(rule))
            }
            None => builtin_rule(rule),
        };

        found.ok_or_else(|| CompileError::UnknownRule {
            grammar: grammar.map(|g| g.to_owned()),
            rule: rule.to_owned(),
        })
    }

    // searches the grammar, then its parent, and so on
    pub(crate) fn lookup(&self, grammar: &str, rule: &str) -> Option<&Rule> {
        let mut current = self.grammar(grammar);
        let mut steps = 0;

        while let Some(g) = current {
            if let Some(found) = g.rule(rule) {
                return Some(found);
            }

            steps += 1;
            if steps > self.grammars.len() {
                break;
            }
            current = g.parent().and_then(|p| self.grammar(p));
        }

        None
    }

    /// A stand-alone pattern matching one rule of a grammar.
    pub fn regex(self: &Arc<Self>, grammar: &str, rule: &str) -> Result<Regex, CompileError> {
        let found = self.resolve(Some(grammar), rule)?;
        let modifiers = Modifiers::new()
            .with_ratchet(found.kind.ratchet())
            .with_sigspace(found.kind.sigspace());

        Ok(Regex::from_parts(
            found.body.clone(),
            modifiers,
            Some(Arc::clone(self)),
            Some(grammar.to_owned()),
        ))
    }

    /// Matches the whole text against the `TOP` rule of a grammar.
    pub fn parse(&self, grammar: &str, text: &str) -> Result<Option<MatchResult>, Error> {
        self.parse_with(grammar, text, &Modifiers::default())
    }

    pub fn parse_with(
        &self,
        grammar: &str,
        text: &str,
        modifiers: &Modifiers,
    ) -> Result<Option<MatchResult>, Error> {
        self.match_top(grammar, text, modifiers, true)
    }

    /// Like `parse`, but the match may end before the end of the text.
    pub fn subparse(&self, grammar: &str, text: &str) -> Result<Option<MatchResult>, Error> {
        self.match_top(grammar, text, &Modifiers::default(), false)
    }

    fn match_top(
        &self,
        grammar: &str,
        text: &str,
        modifiers: &Modifiers,
        to_end: bool,
    ) -> Result<Option<MatchResult>, Error> {
        let top = self.resolve(Some(grammar), TOP_RULE_NAME)?;

        let mut nodes = vec![top.body.clone()];
        if to_end {
            nodes.push(Node::Assertion(Assertion::End));
        }
        let root = Node::Sequence(nodes);

        let mut modifiers = modifiers.clone();
        modifiers.ratchet |= top.kind.ratchet();

        let input = Input::new(text, modifiers.granularity);
        let context = Context::new(&input, &modifiers, Some(self), Some(grammar));
        let start = modifiers.pos.unwrap_or(0);
        Ok(start_process(&context, &root, start, true)?)
    }

    fn check_inheritance(&self) -> Result<(), CompileError> {
        for grammar in &self.grammars {
            let mut current = grammar.parent();
            let mut steps = 0;

            while let Some(name) = current {
                let parent = match self.grammar(name) {
                    Some(parent) => parent,
                    None => return Err(CompileError::UnknownGrammar(name.to_owned())),
                };

                steps += 1;
                if parent.name == grammar.name || steps > self.grammars.len() {
                    return Err(CompileError::InheritanceCycle(grammar.name.clone()));
                }
                current = parent.parent();
            }
        }
        Ok(())
    }

    // every call in every rule body has to reach a rule
    fn check_references(&self) -> Result<(), CompileError> {
        for grammar in &self.grammars {
            for rule in &grammar.rules {
                for rule_ref in rule.body.rule_refs() {
                    self.check_reference(&grammar.name, rule_ref)?;
                }
            }
        }
        Ok(())
    }

    fn check_reference(&self, current: &str, rule_ref: &RuleRef) -> Result<(), CompileError> {
        let grammar = rule_ref.grammar.as_deref().unwrap_or(current);
        self.resolve(Some(grammar), &rule_ref.name).map(|_| ())
    }
}

fn builtin_rules() -> &'static HashMap<&'static str, Rule> {
    static BUILTIN_RULES: OnceLock<HashMap<&'static str, Rule>> = OnceLock::new();

    BUILTIN_RULES.get_or_init(|| {
        let classes = [
            "alpha", "digit", "alnum", "upper", "lower", "space", "xdigit", "punct",
        ]
        .into_iter()
        .filter_map(|name| {
            named_class(name)
                .map(|class| (name, Rule::new(RuleKind::Regex, name, Node::CharClass(class))))
        });

        let patterns = [
            (RuleKind::Token, "ident", "<+alpha + [_]> \\w*"),
            (RuleKind::Token, "ws", "\\s*"),
            (RuleKind::Regex, "wb", "<< || >>"),
        ]
        .into_iter()
        .filter_map(|(kind, name, source)| {
            parse_from_str(source, false)
                .ok()
                .map(|body| (name, Rule::new(kind, name, body)))
        });

        classes.chain(patterns).collect()
    })
}

/// A rule every pattern can call without a grammar, e.g. `<alpha>` or `<.ws>`.
///
/// Grammars may override them by declaring a rule of the same name.
pub fn builtin_rule(name: &str) -> Option<&'static Rule> {
    builtin_rules().get(name)
}
