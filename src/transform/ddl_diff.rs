//! DDL generalizer and differ.
//!
//! The generalizer moves inline column/table constraints out of CREATE TABLE
//! into equivalent ALTER TABLE ADD CONSTRAINT statements (order preserved,
//! PostgreSQL-style names synthesized when missing), giving two scripts a
//! comparable shape. The differ then emits a forward migration between a
//! current and a target script.

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{
    AlterAction, AlterTable, ColumnConstraintKind, ColumnDef, CommentSet, CreateTable, Ident,
    Statement, StatementBody, TableConstraint, TableConstraintKind, strip_metadata,
};
use crate::error::Result;

/// Normalize DDL: every extractable constraint becomes an
/// `ALTER TABLE … ADD CONSTRAINT` immediately after its CREATE TABLE.
pub fn generalize_ddl(statements: &[Statement]) -> Result<Vec<Statement>> {
    let mut out = Vec::new();
    for stmt in statements {
        match &stmt.body {
            StatementBody::CreateTable(create) => {
                let (create, alters) = generalize_create(create);
                out.push(Statement::new(StatementBody::CreateTable(create)));
                out.extend(
                    alters
                        .into_iter()
                        .map(|alter| Statement::new(StatementBody::AlterTable(alter))),
                );
            }
            _ => out.push(stmt.clone()),
        }
    }
    Ok(out)
}

fn generalize_create(create: &CreateTable) -> (CreateTable, Vec<AlterTable>) {
    let table_name = create.name.name().text.to_string();
    let mut constraints: Vec<TableConstraint> = Vec::new();
    let mut columns = Vec::new();

    for column in &create.columns {
        let mut kept = column.clone();
        kept.constraints.clear();
        for constraint in &column.constraints {
            match &constraint.kind {
                // NOT NULL, defaults, and identity stay on the column.
                ColumnConstraintKind::NotNull
                | ColumnConstraintKind::Null
                | ColumnConstraintKind::Default(_)
                | ColumnConstraintKind::Generated { .. } => {
                    kept.constraints.push(constraint.clone())
                }
                ColumnConstraintKind::PrimaryKey => constraints.push(TableConstraint {
                    name: named(constraint, || format!("{table_name}_pkey")),
                    kind: TableConstraintKind::PrimaryKey(vec![column.name.clone()]),
                    comments: CommentSet::new(),
                }),
                ColumnConstraintKind::Unique => constraints.push(TableConstraint {
                    name: named(constraint, || {
                        format!("{table_name}_{}_key", column.name.text)
                    }),
                    kind: TableConstraintKind::Unique(vec![column.name.clone()]),
                    comments: CommentSet::new(),
                }),
                ColumnConstraintKind::References(reference) => constraints.push(TableConstraint {
                    name: named(constraint, || {
                        format!("{table_name}_{}_fkey", column.name.text)
                    }),
                    kind: TableConstraintKind::ForeignKey {
                        columns: vec![column.name.clone()],
                        reference: reference.clone(),
                    },
                    comments: CommentSet::new(),
                }),
                ColumnConstraintKind::Check(expr) => constraints.push(TableConstraint {
                    name: named(constraint, || {
                        format!("{table_name}_{}_check", column.name.text)
                    }),
                    kind: TableConstraintKind::Check(expr.clone()),
                    comments: CommentSet::new(),
                }),
            }
        }
        columns.push(kept);
    }

    // Table-level constraints follow the column-derived ones, still in
    // declaration order.
    for (i, constraint) in create.constraints.iter().enumerate() {
        let mut cloned = constraint.clone();
        if cloned.name.is_none() {
            cloned.name = Some(Ident::new(synthesize_table_constraint_name(
                &table_name,
                &cloned.kind,
                i,
            )));
        }
        constraints.push(cloned);
    }

    let stripped = CreateTable {
        columns,
        constraints: Vec::new(),
        ..create.clone()
    };
    let alters = constraints
        .into_iter()
        .map(|constraint| AlterTable {
            table: create.name.clone(),
            if_exists: false,
            actions: vec![AlterAction::AddConstraint(constraint)],
            comments: CommentSet::new(),
        })
        .collect();
    (stripped, alters)
}

fn named(
    constraint: &crate::ast::ColumnConstraint,
    fallback: impl FnOnce() -> String,
) -> Option<Ident> {
    Some(
        constraint
            .name
            .clone()
            .unwrap_or_else(|| Ident::new(fallback())),
    )
}

fn synthesize_table_constraint_name(
    table: &str,
    kind: &TableConstraintKind,
    index: usize,
) -> String {
    match kind {
        TableConstraintKind::PrimaryKey(_) => format!("{table}_pkey"),
        TableConstraintKind::Unique(columns) => match columns.first() {
            Some(first) => format!("{table}_{}_key", first.text),
            None => format!("{table}_{index}_key"),
        },
        TableConstraintKind::ForeignKey { columns, .. } => match columns.first() {
            Some(first) => format!("{table}_{}_fkey", first.text),
            None => format!("{table}_{index}_fkey"),
        },
        TableConstraintKind::Check(_) => format!("{table}_check{index}"),
    }
}

// ============================================================================
// Differ
// ============================================================================

#[derive(Default)]
struct TableShape {
    create: Option<CreateTable>,
    columns: IndexMap<String, ColumnDef>,
    constraints: IndexMap<String, TableConstraint>,
}

fn collect_shapes(statements: &[Statement]) -> Result<IndexMap<String, TableShape>> {
    let generalized = generalize_ddl(statements)?;
    let mut shapes: IndexMap<String, TableShape> = IndexMap::new();

    for stmt in &generalized {
        // Positions differ between scripts; compare structure only.
        let mut stmt = stmt.clone();
        strip_metadata(&mut stmt);
        match stmt.body {
            StatementBody::CreateTable(create) => {
                let shape = shapes.entry(create.name.key()).or_default();
                for column in &create.columns {
                    shape.columns.insert(column.name.text.to_string(), column.clone());
                }
                shape.create = Some(create);
            }
            StatementBody::AlterTable(alter) => {
                let shape = shapes.entry(alter.table.key()).or_default();
                for action in alter.actions {
                    match action {
                        AlterAction::AddConstraint(constraint) => {
                            let name = constraint
                                .name
                                .as_ref()
                                .expect("generalized constraints are named")
                                .text
                                .to_string();
                            shape.constraints.insert(name, constraint);
                        }
                        AlterAction::AddColumn { column, .. } => {
                            shape.columns.insert(column.name.text.to_string(), column);
                        }
                        AlterAction::DropColumn { name, .. } => {
                            shape.columns.shift_remove(name.text.as_str());
                        }
                        AlterAction::DropConstraint { name, .. } => {
                            shape.constraints.shift_remove(name.text.as_str());
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Ok(shapes)
}

/// A forward migration from `current` to `target`: creates and adds first,
/// then drops.
pub fn diff_ddl(current: &[Statement], target: &[Statement]) -> Result<Vec<Statement>> {
    let current_shapes = collect_shapes(current)?;
    let target_shapes = collect_shapes(target)?;
    let mut out = Vec::new();

    // New tables, new columns, new constraints.
    for (table, shape) in &target_shapes {
        match current_shapes.get(table) {
            None => {
                if let Some(create) = &shape.create {
                    out.push(Statement::new(StatementBody::CreateTable(create.clone())));
                }
                for constraint in shape.constraints.values() {
                    out.push(alter_one(
                        shape,
                        AlterAction::AddConstraint(constraint.clone()),
                    ));
                }
            }
            Some(existing) => {
                for (name, column) in &shape.columns {
                    if !existing.columns.contains_key(name) {
                        out.push(alter_one(
                            shape,
                            AlterAction::AddColumn {
                                if_not_exists: false,
                                column: column.clone(),
                            },
                        ));
                    }
                }
                for (name, constraint) in &shape.constraints {
                    let changed = existing.constraints.get(name) != Some(constraint);
                    if existing.constraints.contains_key(name) && changed {
                        out.push(alter_one(
                            shape,
                            AlterAction::DropConstraint {
                                name: Ident::new(name.as_str()),
                                if_exists: false,
                                cascade: false,
                            },
                        ));
                    }
                    if changed {
                        out.push(alter_one(
                            shape,
                            AlterAction::AddConstraint(constraint.clone()),
                        ));
                    }
                }
            }
        }
    }

    // Dropped constraints, columns, tables.
    for (table, existing) in &current_shapes {
        match target_shapes.get(table) {
            None => {
                out.push(Statement::new(StatementBody::DropTable(
                    crate::ast::DropTable {
                        names: vec![existing
                            .create
                            .as_ref()
                            .map(|c| c.name.clone())
                            .unwrap_or_else(|| crate::ast::QualifiedName::bare(table.as_str()))],
                        if_exists: false,
                        cascade: false,
                        comments: CommentSet::new(),
                    },
                )));
            }
            Some(shape) => {
                for name in existing.constraints.keys() {
                    if !shape.constraints.contains_key(name) {
                        out.push(alter_one(
                            existing,
                            AlterAction::DropConstraint {
                                name: Ident::new(name.as_str()),
                                if_exists: false,
                                cascade: false,
                            },
                        ));
                    }
                }
                for name in existing.columns.keys() {
                    if !shape.columns.contains_key(name) {
                        out.push(alter_one(
                            existing,
                            AlterAction::DropColumn {
                                name: Ident::new(name.as_str()),
                                if_exists: false,
                                cascade: false,
                            },
                        ));
                    }
                }
            }
        }
    }

    debug!(statements = out.len(), "computed DDL diff");
    Ok(out)
}

fn alter_one(shape: &TableShape, action: AlterAction) -> Statement {
    let table = shape
        .create
        .as_ref()
        .map(|c| c.name.clone())
        .expect("diffed tables have a CREATE");
    Statement::new(StatementBody::AlterTable(AlterTable {
        table,
        if_exists: false,
        actions: vec![action],
        comments: CommentSet::new(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::to_sql;
    use crate::parser::parse_multi;

    fn statements(sql: &str) -> Vec<Statement> {
        parse_multi(sql).unwrap()
    }

    fn rendered(statements: &[Statement]) -> Vec<String> {
        statements.iter().map(|s| to_sql(s).unwrap()).collect()
    }

    #[test]
    fn test_generalize_moves_inline_constraints_out() {
        let input = statements(
            "CREATE TABLE users (\
               id int PRIMARY KEY, \
               email text UNIQUE NOT NULL, \
               org_id int REFERENCES orgs (id), \
               CHECK (id > 0)\
             )",
        );
        let result = rendered(&generalize_ddl(&input).unwrap());
        assert_eq!(result.len(), 5);
        assert_eq!(
            result[0],
            "CREATE TABLE users (id int, email text NOT NULL, org_id int)"
        );
        assert_eq!(
            result[1],
            "ALTER TABLE users ADD CONSTRAINT users_pkey PRIMARY KEY (id)"
        );
        assert_eq!(
            result[2],
            "ALTER TABLE users ADD CONSTRAINT users_email_key UNIQUE (email)"
        );
        assert_eq!(
            result[3],
            "ALTER TABLE users ADD CONSTRAINT users_org_id_fkey \
             FOREIGN KEY (org_id) REFERENCES orgs (id)"
        );
        assert_eq!(
            result[4],
            "ALTER TABLE users ADD CONSTRAINT users_check0 CHECK (id > 0)"
        );
    }

    #[test]
    fn test_generalize_keeps_named_constraints() {
        let input = statements(
            "CREATE TABLE t (id int CONSTRAINT my_pk PRIMARY KEY, CONSTRAINT my_check CHECK (id > 0))",
        );
        let result = rendered(&generalize_ddl(&input).unwrap());
        assert!(result[1].contains("ADD CONSTRAINT my_pk"));
        assert!(result[2].contains("ADD CONSTRAINT my_check"));
    }

    #[test]
    fn test_diff_creates_missing_table() {
        let current = statements("CREATE TABLE a (id int)");
        let target = statements("CREATE TABLE a (id int); CREATE TABLE b (id int PRIMARY KEY)");
        let result = rendered(&diff_ddl(&current, &target).unwrap());
        assert!(result.iter().any(|s| s.starts_with("CREATE TABLE b")));
        assert!(result.iter().any(|s| s.contains("ADD CONSTRAINT b_pkey")));
    }

    #[test]
    fn test_diff_drops_removed_table() {
        let current = statements("CREATE TABLE a (id int); CREATE TABLE old (id int)");
        let target = statements("CREATE TABLE a (id int)");
        let result = rendered(&diff_ddl(&current, &target).unwrap());
        assert_eq!(result, vec!["DROP TABLE old"]);
    }

    #[test]
    fn test_diff_adds_and_drops_columns() {
        let current = statements("CREATE TABLE t (id int, legacy text)");
        let target = statements("CREATE TABLE t (id int, shiny text NOT NULL)");
        let result = rendered(&diff_ddl(&current, &target).unwrap());
        assert!(result.contains(&"ALTER TABLE t ADD COLUMN shiny text NOT NULL".to_string()));
        assert!(result.contains(&"ALTER TABLE t DROP COLUMN legacy".to_string()));
    }

    #[test]
    fn test_diff_constraint_changes() {
        let current = statements("CREATE TABLE t (id int PRIMARY KEY)");
        let target = statements("CREATE TABLE t (id int, CONSTRAINT t_pkey PRIMARY KEY (id))");
        // Same generalized shape: no migration needed.
        let result = diff_ddl(&current, &target).unwrap();
        assert!(result.is_empty(), "got {:?}", rendered(&result));

        let target = statements("CREATE TABLE t (id int UNIQUE)");
        let result = rendered(&diff_ddl(&current, &target).unwrap());
        assert!(result.iter().any(|s| s.contains("ADD CONSTRAINT t_id_key UNIQUE (id)")));
        assert!(result.iter().any(|s| s.contains("DROP CONSTRAINT t_pkey")));
    }

    #[test]
    fn test_identical_scripts_empty_diff() {
        let script = "CREATE TABLE t (id int PRIMARY KEY, v text DEFAULT 'x')";
        let diff = diff_ddl(&statements(script), &statements(script)).unwrap();
        assert!(diff.is_empty());
    }
}
