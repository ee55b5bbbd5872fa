//! Alias rename: scope-local renaming of FROM/JOIN aliases.

use tracing::debug;

use crate::ast::{ColumnRef, SelectQuery, SourceExpr, Statement, Visit, visitor};
use crate::base::Span;
use crate::error::{Result, SchemaError};
use crate::parser::parse;

use super::cte::RenameResult;
use super::splice;

/// Rename the alias at the cursor together with every reference to it inside
/// its scope, and nothing outside. The cursor may sit on the alias token
/// itself or on an alias-qualified column reference.
pub fn rename_alias(sql: &str, line: u32, column: u32, new: &str) -> Result<RenameResult> {
    let statement = parse(sql)?;
    let index = AliasIndex::build(&statement);

    let Some((alias, scope)) = index.target_at(line, column) else {
        return Err(SchemaError::UnsupportedRoot("no renameable alias at cursor").into());
    };

    let mut edits: Vec<(Span, String)> = Vec::new();
    let render = |quoted: bool| {
        if quoted {
            format!("\"{}\"", new.replace('"', "\"\""))
        } else {
            new.to_string()
        }
    };

    for def in &index.defs {
        if def.text == alias && def.scope == scope {
            edits.push((def.span, render(def.quoted)));
        }
    }
    for qual in &index.quals {
        if qual.text == alias && index.resolve(qual) == Some(scope) {
            edits.push((qual.span, render(qual.quoted)));
        }
    }

    let replaced = edits.len();
    debug!(alias = %alias, new, replaced, "renamed alias");
    Ok(RenameResult {
        sql: splice(sql, edits),
        replaced,
    })
}

/// An alias definition site (`FROM t AS x` / `JOIN t x`).
struct AliasDef {
    text: String,
    quoted: bool,
    span: Span,
    /// Span of the enclosing select query; `None` for statement-level DML
    /// sources.
    scope: Option<Span>,
}

/// An alias-qualified column reference (`x.col`).
struct Qual {
    text: String,
    quoted: bool,
    span: Span,
    /// Enclosing select spans, innermost last.
    stack: Vec<Span>,
}

pub(crate) struct AliasIndex {
    defs: Vec<AliasDef>,
    quals: Vec<Qual>,
}

impl AliasIndex {
    pub(crate) fn build(statement: &Statement) -> Self {
        let mut builder = IndexBuilder {
            index: AliasIndex {
                defs: Vec::new(),
                quals: Vec::new(),
            },
            stack: Vec::new(),
        };
        builder.visit_statement(statement);
        builder.index
    }

    /// The alias and scope at a cursor position, from a definition token or
    /// a qualifier token.
    pub(crate) fn target_at(&self, line: u32, column: u32) -> Option<(String, Option<Span>)> {
        if let Some(def) = self.defs.iter().find(|d| d.span.contains(line, column)) {
            return Some((def.text.clone(), def.scope));
        }
        let qual = self
            .quals
            .iter()
            .find(|q| q.span.contains(line, column))?;
        self.resolve(qual).map(|scope| (qual.text.clone(), scope))
    }

    /// Resolve a qualifier to its innermost defining scope.
    fn resolve(&self, qual: &Qual) -> Option<Option<Span>> {
        for scope in qual.stack.iter().rev() {
            if self
                .defs
                .iter()
                .any(|d| d.text == qual.text && d.scope == Some(*scope))
            {
                return Some(Some(*scope));
            }
        }
        // Statement-level DML sources.
        if self
            .defs
            .iter()
            .any(|d| d.text == qual.text && d.scope.is_none())
        {
            return Some(None);
        }
        None
    }
}

struct IndexBuilder {
    index: AliasIndex,
    stack: Vec<Span>,
}

impl Visit for IndexBuilder {
    fn visit_select_query(&mut self, query: &SelectQuery) {
        let pushed = query.span.is_some();
        if let Some(span) = query.span {
            self.stack.push(span);
        }
        visitor::walk_select_query(self, query);
        if pushed {
            self.stack.pop();
        }
    }

    fn visit_source_expr(&mut self, source: &SourceExpr) {
        if let Some(alias) = &source.alias
            && let Some(span) = alias.name.span
        {
            self.index.defs.push(AliasDef {
                text: alias.name.text.to_string(),
                quoted: alias.name.quoted,
                span,
                scope: self.stack.last().copied(),
            });
        }
        visitor::walk_source_expr(self, source);
    }

    fn visit_column_ref(&mut self, column: &ColumnRef) {
        if column.name.parts.len() >= 2 {
            let qualifier = &column.name.parts[0];
            if let Some(span) = qualifier.span {
                self.index.quals.push(Qual {
                    text: qualifier.text.to_string(),
                    quoted: qualifier.quoted,
                    span,
                    stack: self.stack.clone(),
                });
            }
        }
        visitor::walk_column_ref(self, column);
    }
}
