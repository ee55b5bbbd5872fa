//! Position-aware parsing for editor tooling.
//!
//! [`parse_to_position`] parses up to a cursor, patching unbalanced
//! parentheses with synthetic closers so a partial AST can still be built,
//! and reports the innermost clause context plus the identifiers in scope.
//! This is the substrate completion engines build on.

use smol_str::SmolStr;

use crate::ast::{CommonTable, Statement, Visit, visitor};
use crate::base::{LineIndex, Position, Span, TextSize};
use crate::error::Result;
use crate::lexer::{Keyword, Lexeme, LexemeKind, Punct, tokenize_lossy};

use super::{Parser, ParserOptions, parse};

/// The innermost clause the cursor sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClauseContext {
    #[default]
    None,
    With,
    SelectList,
    From,
    JoinCondition,
    Where,
    GroupBy,
    Having,
    Window,
    OrderBy,
    Limit,
    Offset,
    InsertTarget,
    InsertValues,
    UpdateSet,
    Returning,
}

/// Result of [`parse_to_position`].
#[derive(Debug, Clone)]
pub struct PositionParse {
    /// The partial AST, when the prefix (possibly patched) parses.
    pub statement: Option<Statement>,
    /// The lexeme immediately before the cursor.
    pub before_cursor: Option<Lexeme>,
    /// The innermost clause context at the cursor.
    pub context: ClauseContext,
    /// CTE names, table names, and aliases visible at the cursor.
    pub scope_idents: Vec<SmolStr>,
    /// Synthetic tokens appended to complete the prefix (never part of
    /// round-trip formatting).
    pub inserted: Vec<&'static str>,
}

/// Parse up to a `(line, column)` cursor.
pub fn parse_to_position(
    sql: &str,
    line: u32,
    column: u32,
    options: &ParserOptions,
) -> PositionParse {
    let index = LineIndex::new(sql);
    let cursor = index
        .offset_at(line, column)
        .unwrap_or_else(|| TextSize::of(sql));

    let (lexemes, _) = tokenize_lossy(sql, &options.lexer_options());
    let prefix: Vec<Lexeme> = lexemes
        .into_iter()
        .take_while(|l| l.span.start.offset < cursor)
        .collect();

    let before_cursor = prefix.last().cloned();
    let context = clause_context(&prefix);
    let scope_idents = scope_idents(&prefix);

    // Try the raw prefix first, then patch unclosed parentheses.
    let mut inserted = Vec::new();
    let statement = match try_parse(sql, &prefix) {
        Some(statement) => Some(statement),
        None => {
            let open = prefix.iter().filter(|l| l.is_punct(Punct::LParen)).count();
            let close = prefix.iter().filter(|l| l.is_punct(Punct::RParen)).count();
            let missing = open.saturating_sub(close);
            if missing > 0 {
                let mut patched = prefix.clone();
                let end = patched
                    .last()
                    .map(|l| l.span.end)
                    .unwrap_or_else(Position::start);
                for _ in 0..missing {
                    inserted.push(")");
                    patched.push(Lexeme::new(
                        LexemeKind::Punct(Punct::RParen),
                        ")",
                        ")",
                        Span::new(end, end),
                    ));
                }
                try_parse(sql, &patched)
            } else {
                None
            }
        }
    };

    PositionParse {
        statement,
        before_cursor,
        context,
        scope_idents,
        inserted,
    }
}

fn try_parse(sql: &str, lexemes: &[Lexeme]) -> Option<Statement> {
    if lexemes.is_empty() {
        return None;
    }
    let mut parser = Parser::new(sql, lexemes, 0);
    parser.parse_statement().ok()
}

/// One stack frame per unclosed parenthesis; clause keywords overwrite the
/// innermost frame.
fn clause_context(lexemes: &[Lexeme]) -> ClauseContext {
    let mut stack = vec![ClauseContext::None];
    let mut in_join = false;

    for lexeme in lexemes {
        match &lexeme.kind {
            LexemeKind::Punct(Punct::LParen) => stack.push(*stack.last().expect("nonempty")),
            LexemeKind::Punct(Punct::RParen) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            LexemeKind::Keyword(kw) => {
                let top = stack.last_mut().expect("nonempty");
                match kw {
                    Keyword::WITH => *top = ClauseContext::With,
                    Keyword::SELECT => {
                        *top = ClauseContext::SelectList;
                        in_join = false;
                    }
                    Keyword::FROM => *top = ClauseContext::From,
                    Keyword::JOIN => {
                        *top = ClauseContext::From;
                        in_join = true;
                    }
                    Keyword::ON if in_join => *top = ClauseContext::JoinCondition,
                    Keyword::WHERE => {
                        *top = ClauseContext::Where;
                        in_join = false;
                    }
                    Keyword::GROUP => *top = ClauseContext::GroupBy,
                    Keyword::HAVING => *top = ClauseContext::Having,
                    Keyword::WINDOW => *top = ClauseContext::Window,
                    Keyword::ORDER => *top = ClauseContext::OrderBy,
                    Keyword::LIMIT => *top = ClauseContext::Limit,
                    Keyword::OFFSET => *top = ClauseContext::Offset,
                    Keyword::INSERT => *top = ClauseContext::InsertTarget,
                    Keyword::VALUES => *top = ClauseContext::InsertValues,
                    Keyword::SET => *top = ClauseContext::UpdateSet,
                    Keyword::RETURNING => *top = ClauseContext::Returning,
                    _ => {}
                }
            }
            _ => {}
        }
    }
    *stack.last().expect("nonempty")
}

/// Identifiers visible at the cursor: CTE names plus FROM/JOIN table names
/// and aliases seen in the prefix.
fn scope_idents(lexemes: &[Lexeme]) -> Vec<SmolStr> {
    let mut idents = Vec::new();
    let mut push = |text: &SmolStr| {
        if !idents.contains(text) {
            idents.push(text.clone());
        }
    };

    let mut i = 0;
    while i < lexemes.len() {
        match lexemes[i].keyword() {
            // `WITH name AS (`, plus each `, name AS (` at the same level.
            Some(Keyword::WITH) => {
                let mut j = i + 1;
                if lexemes.get(j).is_some_and(|l| l.is_keyword(Keyword::RECURSIVE)) {
                    j += 1;
                }
                if let Some(name) = lexemes.get(j).and_then(|l| l.as_ident()) {
                    push(&SmolStr::new(name));
                }
            }
            Some(Keyword::FROM) | Some(Keyword::JOIN) => {
                // Qualified table name: last component plus trailing alias.
                let mut j = i + 1;
                let mut last_ident: Option<SmolStr> = None;
                while let Some(lexeme) = lexemes.get(j) {
                    if let Some(text) = lexeme.as_ident() {
                        last_ident = Some(SmolStr::new(text));
                        j += 1;
                        if lexemes.get(j).is_some_and(|l| l.is_punct(Punct::Dot)) {
                            j += 1;
                            continue;
                        }
                        break;
                    }
                    break;
                }
                if let Some(name) = &last_ident {
                    push(name);
                }
                // `AS alias` or implicit alias.
                if lexemes.get(j).is_some_and(|l| l.is_keyword(Keyword::AS)) {
                    j += 1;
                }
                if let Some(alias) = lexemes.get(j).and_then(|l| {
                    if l.keyword().is_none_or(|k| !k.stops_alias()) {
                        l.as_ident()
                    } else {
                        None
                    }
                }) {
                    push(&SmolStr::new(alias));
                }
            }
            Some(Keyword::AS) => {
                // `, name AS (` inside a WITH list.
                if i >= 1
                    && lexemes.get(i + 1).is_some_and(|l| l.is_punct(Punct::LParen))
                    && let Some(name) = lexemes[i - 1].as_ident()
                {
                    push(&SmolStr::new(name));
                }
            }
            _ => {}
        }
        i += 1;
    }
    idents
}

// ============================================================================
// CTE regions
// ============================================================================

/// A common table definition's location in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct CteRegion {
    pub name: String,
    /// The span of the whole definition (`name AS (…)`).
    pub span: Span,
}

struct RegionCollector {
    regions: Vec<CteRegion>,
}

impl Visit for RegionCollector {
    fn visit_common_table(&mut self, table: &CommonTable) {
        if let Some(span) = table.span {
            self.regions.push(CteRegion {
                name: table.name.text.to_string(),
                span,
            });
        }
        visitor::walk_common_table(self, table);
    }
}

/// Every CTE definition region in the statement, outermost first.
pub fn get_cte_regions(sql: &str) -> Result<Vec<CteRegion>> {
    let statement = parse(sql)?;
    let mut collector = RegionCollector {
        regions: Vec::new(),
    };
    collector.visit_statement(&statement);
    Ok(collector.regions)
}

/// The innermost CTE whose definition contains the cursor, if any.
pub fn detect_cte_at_cursor(sql: &str, line: u32, column: u32) -> Result<Option<String>> {
    let regions = get_cte_regions(sql)?;
    Ok(regions
        .into_iter()
        .filter(|r| r.span.contains(line, column))
        .min_by_key(|r| u32::from(r.span.len()))
        .map(|r| r.name))
}
