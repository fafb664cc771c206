use super::*;

#[test]
fn test_quote_ident_simple() {
    assert_eq!(quote_ident("owners"), r#""owners""#);
}

#[test]
fn test_quote_ident_with_embedded_quotes() {
    assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
}

#[test]
fn test_quote_qualified_two_parts() {
    assert_eq!(quote_qualified("clinic.owners"), r#""clinic"."owners""#);
}

#[test]
fn test_escape_sql_string() {
    assert_eq!(escape_sql_string("therapist"), "therapist");
    assert_eq!(escape_sql_string("O'Brien's"), "O''Brien''s");
}

#[test]
fn test_split_qualified_name() {
    assert_eq!(split_qualified_name("owners"), ("main", "owners"));
    assert_eq!(split_qualified_name("clinic.owners"), ("clinic", "owners"));
}

#[test]
fn test_is_valid_identifier() {
    assert!(is_valid_identifier("applied_migrations"));
    assert!(is_valid_identifier("ops.bootstrap_lock"));
    assert!(is_valid_identifier("_private"));
    assert!(!is_valid_identifier(""));
    assert!(!is_valid_identifier("1table"));
    assert!(!is_valid_identifier("a.b.c"));
    assert!(!is_valid_identifier("drop table; --"));
    assert!(!is_valid_identifier("owners."));
}

#[test]
fn test_split_statements_basic() {
    let stmts = split_statements("CREATE TABLE a (id INT); CREATE TABLE b (id INT);");
    assert_eq!(stmts, vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]);
}

#[test]
fn test_split_statements_without_trailing_semicolon() {
    let stmts = split_statements("SELECT 1;\nSELECT 2");
    assert_eq!(stmts, vec!["SELECT 1", "SELECT 2"]);
}

#[test]
fn test_split_statements_semicolon_in_literal() {
    let stmts = split_statements(
        "INSERT INTO admin_roles (name, description) VALUES ('admin', 'full; access'); SELECT 1",
    );
    assert_eq!(stmts.len(), 2);
    assert!(stmts[0].ends_with("'full; access')"));
}

#[test]
fn test_split_statements_escaped_quote() {
    let stmts = split_statements("INSERT INTO t VALUES ('it''s; fine'); SELECT 2");
    assert_eq!(stmts.len(), 2);
    assert_eq!(stmts[0], "INSERT INTO t VALUES ('it''s; fine')");
}

#[test]
fn test_split_statements_quoted_identifier() {
    let stmts = split_statements(r#"CREATE TABLE "odd;name" (id INT); SELECT 1"#);
    assert_eq!(stmts.len(), 2);
    assert_eq!(stmts[0], r#"CREATE TABLE "odd;name" (id INT)"#);
}

#[test]
fn test_split_statements_comments() {
    let sql = "-- leading comment; not a split\nCREATE TABLE a (id INT);\n/* block; comment */\nCREATE TABLE b (id INT);\n-- trailing only\n";
    let stmts = split_statements(sql);
    assert_eq!(stmts.len(), 2);
    assert!(stmts[0].ends_with("CREATE TABLE a (id INT)"));
    assert!(stmts[1].ends_with("CREATE TABLE b (id INT)"));
}

#[test]
fn test_split_statements_nested_block_comment() {
    let stmts = split_statements("/* outer /* inner; */ still; */ SELECT 1; SELECT 2");
    assert_eq!(stmts.len(), 2);
}

#[test]
fn test_split_statements_dollar_quoted() {
    let sql = "CREATE MACRO m() AS $body$ SELECT 1; $body$; SELECT 2";
    let stmts = split_statements(sql);
    assert_eq!(stmts.len(), 2);
    assert!(stmts[0].contains("SELECT 1; $body$"));
}

#[test]
fn test_split_statements_positional_placeholder_is_not_dollar_quote() {
    let stmts = split_statements("SELECT $1; SELECT $2");
    assert_eq!(stmts, vec!["SELECT $1", "SELECT $2"]);
}

#[test]
fn test_split_statements_empty_fragments_dropped() {
    assert!(split_statements(" ;; \n -- nothing\n ;").is_empty());
    assert!(split_statements("").is_empty());
}
