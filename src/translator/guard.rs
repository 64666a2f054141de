//! Read-only gate over generated statements.
//!
//! The model output is executed verbatim against the production schema, so
//! everything that is not a single SELECT is refused here. Comments are
//! stripped before keyword scanning; string literals and quoted identifiers
//! are left untouched so a flat value like `'update casa'` never trips the
//! scan.

use crate::error::ResqError;
use crate::llm::types::strip_code_fences;

/// Keywords that have no place in a read-only statement. Matched as whole
/// words, case-insensitive, outside quotes.
static FORBIDDEN_KEYWORDS: &[&str] = &[
    // data modification
    "INSERT", "UPDATE", "DELETE", "REPLACE", "MERGE", "LOAD",
    // DDL
    "DROP", "ALTER", "CREATE", "TRUNCATE", "RENAME",
    // accounts and session state
    "GRANT", "REVOKE", "SET", "USE",
    // server-side execution
    "CALL", "DO", "HANDLER", "PREPARE", "EXECUTE", "DEALLOCATE",
    // file access
    "INTO", "OUTFILE", "DUMPFILE", "INFILE",
    // locking and administration
    "LOCK", "UNLOCK", "KILL", "SHUTDOWN", "FLUSH", "RESET", "PURGE",
    // transaction control
    "START", "BEGIN", "COMMIT", "ROLLBACK", "SAVEPOINT", "XA",
];

/// Validate a generated statement and return its cleaned form: fences and
/// comments removed, whitespace trimmed, trailing semicolon dropped.
pub fn check(raw: &str) -> Result<String, ResqError> {
    let stripped = strip_comments(strip_code_fences(raw.trim()));
    let sql = stripped
        .trim()
        .trim_end_matches(';')
        .trim_end()
        .to_string();

    if sql.is_empty() {
        return Err(reject(raw, "empty statement"));
    }
    if scan_chars(&sql).any(|c| c == ';') {
        return Err(reject(&sql, "multiple SQL statements are not allowed"));
    }

    let words: Vec<String> = scan_words(&sql).collect();
    match words.first().map(|w| w.as_str()) {
        Some("SELECT") => {}
        Some("WITH") if words.iter().any(|w| w == "SELECT") => {}
        _ => return Err(reject(&sql, "generated statement is not a read-only SELECT")),
    }
    for word in &words {
        if FORBIDDEN_KEYWORDS.contains(&word.as_str()) {
            return Err(reject(&sql, &format!("forbidden keyword {word}")));
        }
    }
    Ok(sql)
}

fn reject(sql: &str, reason: &str) -> ResqError {
    ResqError::RejectedSql {
        reason: reason.to_string(),
        sql: sql.to_string(),
    }
}

/// Uppercased identifier-like words outside quotes.
fn scan_words(sql: &str) -> impl Iterator<Item = String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in scan_chars(sql) {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            current.push(c.to_ascii_uppercase());
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.into_iter()
}

/// Characters of `sql` outside string literals and quoted identifiers.
/// Quoted content is replaced by nothing; the quotes themselves are skipped.
fn scan_chars(sql: &str) -> impl Iterator<Item = char> {
    let mut out = Vec::new();
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => consume_quoted(&mut chars, c),
            _ => out.push(c),
        }
    }
    out.into_iter()
}

fn consume_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) {
    while let Some(c) = chars.next() {
        if c == '\\' && quote != '`' {
            let _ = chars.next();
        } else if c == quote {
            // Doubled quote is an escaped quote inside the literal.
            if chars.peek() == Some(&quote) {
                let _ = chars.next();
            } else {
                return;
            }
        }
    }
}

/// Remove `-- `, `#` and `/* */` comments, leaving quoted text alone.
fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;
    while i < sql.len() {
        let rest = &sql[i..];
        let line_comment = rest.starts_with('#')
            || (rest.starts_with("--")
                && matches!(
                    rest.as_bytes().get(2).copied(),
                    None | Some(b' ') | Some(b'\t') | Some(b'\n')
                ));
        if let Some(quote) = rest.chars().next().filter(|c| matches!(c, '\'' | '"' | '`')) {
            let end = end_of_quoted(sql, i, quote);
            out.push_str(&sql[i..end]);
            i = end;
        } else if line_comment {
            // Keep the newline so adjacent tokens stay separated.
            i += rest.find('\n').unwrap_or(rest.len());
        } else if rest.starts_with("/*") {
            out.push(' ');
            i += rest.find("*/").map(|p| p + 2).unwrap_or(rest.len());
        } else if let Some(c) = rest.chars().next() {
            out.push(c);
            i += c.len_utf8();
        } else {
            break;
        }
    }
    out
}

fn end_of_quoted(sql: &str, start: usize, quote: char) -> usize {
    let mut iter = sql[start + 1..].char_indices().peekable();
    while let Some((offset, c)) = iter.next() {
        if c == '\\' && quote != '`' {
            let _ = iter.next();
        } else if c == quote {
            if let Some(&(_, next)) = iter.peek()
                && next == quote
            {
                let _ = iter.next();
                continue;
            }
            return start + 1 + offset + c.len_utf8();
        }
    }
    sql.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(raw: &str) -> String {
        match check(raw).unwrap_err() {
            ResqError::RejectedSql { reason, .. } => reason,
            other => panic!("expected RejectedSql, got {other:?}"),
        }
    }

    #[test]
    fn accepts_plain_select() {
        let sql = check("SELECT * FROM viviendas WHERE precio < 300000").unwrap();
        assert_eq!(sql, "SELECT * FROM viviendas WHERE precio < 300000");
    }

    #[test]
    fn accepts_cte_select() {
        assert!(check("WITH caras AS (SELECT * FROM v WHERE precio > 1000000) SELECT COUNT(*) FROM caras").is_ok());
    }

    #[test]
    fn cleans_fences_and_trailing_semicolon() {
        let sql = check("```sql\nSELECT 1;\n```").unwrap();
        assert_eq!(sql, "SELECT 1");
    }

    #[test]
    fn rejects_data_modification_any_case() {
        assert!(reason("UPDATE v SET precio = 0").contains("not a read-only SELECT"));
        assert!(reason("delete from v").contains("not a read-only SELECT"));
        assert!(reason("SELECT * FROM v FOR UPDATE").contains("UPDATE"));
    }

    #[test]
    fn rejects_stacked_statements() {
        assert_eq!(
            reason("SELECT 1; DROP TABLE v"),
            "multiple SQL statements are not allowed"
        );
    }

    #[test]
    fn rejects_select_into_outfile() {
        assert!(reason("SELECT * FROM v INTO OUTFILE '/tmp/x'").contains("INTO"));
    }

    #[test]
    fn string_literals_do_not_trip_the_scan() {
        assert!(check("SELECT * FROM v WHERE tipo = 'casa update'").is_ok());
        assert!(check("SELECT * FROM v WHERE nota = 'dos; tres'").is_ok());
    }

    #[test]
    fn identifiers_containing_keywords_are_fine() {
        assert!(check("SELECT update_time FROM v").is_ok());
        assert!(check("SELECT `set` FROM v").is_ok());
    }

    #[test]
    fn keywords_hidden_in_comments_are_inert() {
        assert!(check("SELECT 1 /* DROP TABLE v */").is_ok());
        assert!(check("SELECT 1 -- DROP TABLE v").is_ok());
    }

    #[test]
    fn rejects_empty_and_non_sql_content() {
        assert_eq!(reason("   "), "empty statement");
        assert!(reason("no tengo una respuesta").contains("not a read-only SELECT"));
    }
}
