//! SQL identifier quoting and statement splitting utilities
//!
//! Provides safe quoting for SQL identifiers and qualified names, literal
//! escaping for values embedded in generated statements, and a splitter that
//! breaks a migration script into individually executable statements.

/// Quote a SQL identifier to prevent injection.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use vp_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("owners"), r#""owners""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `schema.table`).
///
/// Splits on `.` and individually quotes each component.
///
/// # Examples
/// ```
/// use vp_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("owners"), r#""owners""#);
/// assert_eq!(quote_qualified("clinic.owners"), r#""clinic"."owners""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a potentially schema-qualified table name into (schema, table).
///
/// Uses the last `.` as the separator. If no `.` is present, returns
/// `("main", name)` as the default schema.
///
/// # Examples
/// ```
/// use vp_core::sql_utils::split_qualified_name;
/// assert_eq!(split_qualified_name("owners"), ("main", "owners"));
/// assert_eq!(split_qualified_name("clinic.owners"), ("clinic", "owners"));
/// ```
pub fn split_qualified_name(name: &str) -> (&str, &str) {
    if let Some(pos) = name.rfind('.') {
        (&name[..pos], &name[pos + 1..])
    } else {
        ("main", name)
    }
}

/// Escape a SQL string literal value by doubling single quotes.
///
/// This is for use inside single-quoted SQL string literals, not identifiers.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Check that `name` is a plain identifier, optionally schema-qualified.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*` with at most one `.` separator. Used to
/// validate configured bookkeeping table names before they reach DDL.
pub fn is_valid_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return false;
    }
    parts.iter().all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}

/// Split a SQL script into statements on top-level `;`.
///
/// Semicolons inside single-quoted literals, double-quoted identifiers,
/// `--` line comments, nested `/* */` block comments and `$tag$` dollar-quoted
/// bodies do not terminate a statement. Fragments that contain only
/// whitespace and comments are dropped. Returned statements are trimmed and
/// carry no trailing `;`.
pub fn split_statements(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut start = 0;
    let mut has_code = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i = skip_quoted(bytes, i + 1, quote);
                has_code = true;
                continue;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = skip_line_comment(bytes, i + 2);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i + 2);
                continue;
            }
            b'$' => {
                has_code = true;
                if let Some(end) = skip_dollar_quoted(bytes, i) {
                    i = end;
                    continue;
                }
            }
            b';' => {
                if has_code {
                    statements.push(sql[start..i].trim().to_string());
                }
                start = i + 1;
                has_code = false;
            }
            c if !c.is_ascii_whitespace() => has_code = true,
            _ => {}
        }
        i += 1;
    }

    if has_code {
        statements.push(sql[start..].trim().to_string());
    }
    statements
}

/// Return the index just past the closing `quote`, honouring doubled quotes.
fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_line_comment(bytes: &[u8], i: usize) -> usize {
    match bytes[i..].iter().position(|&b| b == b'\n') {
        Some(offset) => i + offset + 1,
        None => bytes.len(),
    }
}

fn skip_block_comment(bytes: &[u8], mut i: usize) -> usize {
    let mut depth = 1;
    while i < bytes.len() {
        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return i;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// If a `$tag$` opener starts at `i`, return the index past its closer.
fn skip_dollar_quoted(bytes: &[u8], i: usize) -> Option<usize> {
    let mut j = i + 1;
    while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
        j += 1;
    }
    if j >= bytes.len() || bytes[j] != b'$' {
        return None;
    }
    // `$1` style placeholders are not openers.
    if bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    let tag = &bytes[i..=j];
    let body = j + 1;
    let close = bytes[body..]
        .windows(tag.len())
        .position(|w| w == tag)
        .map(|offset| body + offset + tag.len());
    Some(close.unwrap_or(bytes.len()))
}

#[cfg(test)]
#[path = "sql_utils_test.rs"]
mod tests;
