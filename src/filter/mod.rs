//! Listing search. Query-string parameters become a [`models::Filter`], which
//! is a conjunction of clauses; `db_ops` compiles a filter into a SQL
//! predicate over the document body.

pub mod db_ops;
pub mod models;
