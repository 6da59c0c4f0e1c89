//! Structural checks run before a grammar is lowered.
//!
//! Catches duplicate rule names, references to rules that were never defined,
//! and a start rule that does not exist. Lowering relies on all three.

use std::collections::BTreeSet;

use crate::syntax::grammar::{Expr, GrammarError};

pub(crate) fn check_definitions(
    definitions: &[(String, Expr)],
    start: &str,
) -> Result<(), GrammarError> {
    let mut defined = BTreeSet::new();
    for (name, _) in definitions {
        if !defined.insert(name.as_str()) {
            return Err(GrammarError::DuplicateRule(name.clone()));
        }
    }

    for (name, body) in definitions {
        let mut references = Vec::new();
        collect_references(body, &mut references);
        if let Some(target) = references.into_iter().find(|t| !defined.contains(t)) {
            return Err(GrammarError::UndefinedReference {
                rule: name.clone(),
                target: target.to_string(),
            });
        }
    }

    if !defined.contains(start) {
        return Err(GrammarError::MissingStart(start.to_string()));
    }
    Ok(())
}

fn collect_references<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
    match expr {
        Expr::Ref(target) => out.push(target),
        Expr::Seq(items) | Expr::Choice(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        Expr::Opt(item) | Expr::Many(item) | Expr::Many1(item) | Expr::Not(item) => {
            collect_references(item, out)
        }
        Expr::Lit(_) | Expr::Re(_) | Expr::Eof => {}
    }
}
