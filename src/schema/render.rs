//! Render a schema back to canonical DDL accepted by the parser.

use super::{ColumnDef, EnumCheckConstraint, ForeignKeyConstraint, Schema, TableDef};
use std::fmt::Write;

impl Schema {
    /// Render every table as a CREATE block followed by one ALTER block per
    /// table carrying constraints.
    pub fn to_ddl(&self) -> String {
        let mut out = String::new();

        for table in self.tables.values() {
            render_create(&mut out, table);
        }

        let constrained = self
            .foreign_keys
            .keys()
            .chain(self.checks.keys())
            .fold(Vec::<&String>::new(), |mut acc, name| {
                if !acc.contains(&name) {
                    acc.push(name);
                }
                acc
            });

        for table in constrained {
            let fks = self.foreign_keys_for(table);
            let checks = self.checks_for(table);
            if fks.is_empty() && checks.is_empty() {
                continue;
            }
            render_alter(&mut out, table, fks, checks);
        }

        out
    }
}

fn render_create(out: &mut String, table: &TableDef) {
    let _ = writeln!(out, "CREATE TABLE {} (", table.name);

    let mut lines: Vec<String> = table.columns.iter().map(render_column).collect();
    if !table.primary_key.is_empty() {
        lines.push(format!("PRIMARY KEY ({})", table.primary_key.join(", ")));
    }

    let last = lines.len().saturating_sub(1);
    for (i, line) in lines.iter().enumerate() {
        let sep = if i < last { "," } else { "" };
        let _ = writeln!(out, "{}{}", line, sep);
    }
    out.push_str(");\n");
}

fn render_column(column: &ColumnDef) -> String {
    let mut line = format!("{} {}", column.name, column.datatype.name());
    if !column.type_args.is_empty() {
        let args: Vec<String> = column.type_args.iter().map(u32::to_string).collect();
        let _ = write!(line, "({})", args.join(","));
    }
    match column.signed {
        Some(true) => line.push_str(" SIGNED"),
        Some(false) => line.push_str(" UNSIGNED"),
        None => {}
    }
    match column.nullable {
        Some(true) => line.push_str(" NULL"),
        Some(false) => line.push_str(" NOT NULL"),
        None => {}
    }
    if let Some(default) = &column.default {
        let _ = write!(line, " DEFAULT {}", default);
    }
    line
}

fn render_alter(
    out: &mut String,
    table: &str,
    fks: &[ForeignKeyConstraint],
    checks: &[EnumCheckConstraint],
) {
    let _ = writeln!(out, "ALTER TABLE {}", table);

    let mut clauses: Vec<String> = fks
        .iter()
        .map(|fk| {
            format!(
                "ADD CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {}({})",
                table, fk.column, fk.column, fk.referenced_table, fk.referenced_column
            )
        })
        .collect();

    clauses.extend(checks.iter().map(|check| {
        let values: Vec<String> = check
            .allowed_values
            .iter()
            .map(|v| format!("'{}'", v.replace('\'', "''")))
            .collect();
        format!(
            "ADD CONSTRAINT chk_{}_{} CHECK ({} IN ({}))",
            table,
            check.column,
            check.column,
            values.join(", ")
        )
    }));

    let last = clauses.len().saturating_sub(1);
    for (i, clause) in clauses.iter().enumerate() {
        let sep = if i < last { "," } else { ";" };
        let _ = writeln!(out, "{}{}", clause, sep);
    }
}
