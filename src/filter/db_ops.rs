use super::models::{Clause, Field, Filter};
use crate::models::Value;
use sqlx::{types::Json, Postgres, QueryBuilder};

/// `body` is the jsonb column holding the document. Field names and
/// values are always bound, never spliced into the SQL text.
fn push_number(qb: &mut QueryBuilder<'_, Postgres>, field: Field) {
    // A CASE keeps the cast from running on non-numeric values.
    qb.push("(case when jsonb_typeof(body -> ");
    qb.push_bind(field.as_str());
    qb.push(") = 'number' then (body ->> ");
    qb.push_bind(field.as_str());
    qb.push(")::float8 end)");
}

fn to_json(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn push_clause(qb: &mut QueryBuilder<'_, Postgres>, clause: &Clause) {
    match clause {
        Clause::Equals { field, value } => {
            qb.push("(body -> ");
            qb.push_bind(field.as_str());
            qb.push(") = ");
            qb.push_bind(Json(to_json(value)));
        }
        Clause::Range { field, min, max } => {
            qb.push("(");
            match (min, max) {
                (Some(min), Some(max)) => {
                    push_number(qb, *field);
                    qb.push(" >= ");
                    qb.push_bind(*min);
                    qb.push(" and ");
                    push_number(qb, *field);
                    qb.push(" <= ");
                    qb.push_bind(*max);
                }
                (Some(min), None) => {
                    push_number(qb, *field);
                    qb.push(" >= ");
                    qb.push_bind(*min);
                }
                (None, Some(max)) => {
                    push_number(qb, *field);
                    qb.push(" <= ");
                    qb.push_bind(*max);
                }
                (None, None) => {
                    qb.push("true");
                }
            }
            qb.push(")");
        }
        Clause::Contains { field, needle } => {
            qb.push("strpos(lower(body ->> ");
            qb.push_bind(field.as_str());
            qb.push("), lower(");
            qb.push_bind(needle.clone());
            qb.push("::text)) > 0");
        }
        Clause::Or(clauses) => {
            if clauses.is_empty() {
                qb.push("false");
                return;
            }
            qb.push("(");
            for (i, inner) in clauses.iter().enumerate() {
                if i > 0 {
                    qb.push(" or ");
                }
                push_clause(qb, inner);
            }
            qb.push(")");
        }
    }
}

/// Appends the filter as one parenthesized boolean expression.
pub fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    if filter.is_empty() {
        qb.push("true");
        return;
    }
    qb.push("(");
    for (i, clause) in filter.clauses.iter().enumerate() {
        if i > 0 {
            qb.push(" and ");
        }
        push_clause(qb, clause);
    }
    qb.push(")");
}
