//! Coarse statement classification.
//!
//! The synchronizer only needs to know whether a statement added or removed
//! rows, and from which table.  It looks at the leading keyword (after any
//! whitespace, comments or opening parentheses) and at the identifier
//! following `INTO`, `FROM` or `UPDATE`.  Nothing else in a query is parsed.

/// What a statement did, as far as entity counts are concerned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatementShape {
    Insert { table: Option<String> },
    Delete { table: Option<String> },
    Update { table: Option<String> },
    Select { table: Option<String> },
    Other,
}

impl StatementShape {
    pub fn classify(query: &str) -> Self {
        let tokens = tokenize(strip_leading_noise(query));
        let Some(first) = tokens.first() else {
            return StatementShape::Other;
        };

        match first.to_ascii_uppercase().as_str() {
            "INSERT" | "REPLACE" => StatementShape::Insert { table: table_after(&tokens, "INTO") },
            "DELETE"             => StatementShape::Delete { table: table_after(&tokens, "FROM") },
            "UPDATE"             => StatementShape::Update { table: tokens.get(1).and_then(|t| clean_identifier(t)) },
            "SELECT" | "WITH"    => StatementShape::Select { table: table_after(&tokens, "FROM") },
            _ => StatementShape::Other,
        }
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            StatementShape::Insert { table }
            | StatementShape::Delete { table }
            | StatementShape::Update { table }
            | StatementShape::Select { table } => table.as_deref(),
            StatementShape::Other => None,
        }
    }
}

/// Skip whitespace, `--` line comments, `/* */` block comments and `(`.
fn strip_leading_noise(mut s: &str) -> &str {
    loop {
        let trimmed = s.trim_start().trim_start_matches('(');
        if let Some(rest) = trimmed.strip_prefix("--") {
            s = rest.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            s = rest.split_once("*/").map_or("", |(_, tail)| tail);
        } else if trimmed.len() != s.len() {
            s = trimmed;
        } else {
            return s;
        }
    }
}

fn tokenize(s: &str) -> Vec<&str> {
    s.split(|c: char| c.is_whitespace() || c == '(' || c == ',' || c == ';')
        .filter(|t| !t.is_empty())
        .collect()
}

fn table_after(tokens: &[&str], keyword: &str) -> Option<String> {
    let pos = tokens.iter().position(|t| t.eq_ignore_ascii_case(keyword))?;
    tokens.get(pos + 1).and_then(|t| clean_identifier(t))
}

/// Strip quoting and any schema prefix; lowercase the rest.
fn clean_identifier(raw: &str) -> Option<String> {
    let unquoted: String = raw
        .chars()
        .filter(|c| !matches!(c, '"' | '`' | '[' | ']' | ')'))
        .collect();
    let name = unquoted.rsplit('.').next().unwrap_or("").trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        None
    } else {
        Some(name.to_ascii_lowercase())
    }
}
