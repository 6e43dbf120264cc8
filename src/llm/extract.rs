//! SQL extraction from LLM responses.
//!
//! Models wrap their SQL in markdown fences, `SQLQuery:` markers, or
//! nothing at all. This module pulls the statement out of whichever shape
//! arrives; when nothing SQL-like is present the response stays plain text.

/// Result of scanning an LLM response for a SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSql {
    /// Explanatory text around the SQL (the whole response when no SQL).
    pub text: String,

    /// The SQL statement, if one was found.
    pub sql: Option<String>,
}

/// Extracts a SQL statement from an LLM response.
///
/// Tried in order: a ```` ```sql ```` fence, an untagged fence whose content
/// starts with a query keyword, a `SQLQuery:` marker, and finally a bare
/// statement. Anything else is treated as a refusal or explanation.
pub fn extract_sql(response: &str) -> ExtractedSql {
    if let Some((block, text)) = take_code_block(response, "sql") {
        if let Some(sql) = clean_sql(&block) {
            return ExtractedSql {
                text,
                sql: Some(sql),
            };
        }
    }

    if let Some((block, text)) = take_code_block(response, "") {
        if let Some(sql) = clean_sql(&block) {
            if looks_like_sql(&sql) {
                return ExtractedSql {
                    text,
                    sql: Some(sql),
                };
            }
        }
    }

    if let Some(idx) = response.find("SQLQuery:") {
        if let Some(sql) = clean_sql(&response[idx + "SQLQuery:".len()..]) {
            return ExtractedSql {
                text: response[..idx].trim().to_string(),
                sql: Some(sql),
            };
        }
    }

    let trimmed = response.trim();
    if looks_like_sql(trimmed) {
        return ExtractedSql {
            text: String::new(),
            sql: clean_sql(trimmed),
        };
    }

    ExtractedSql {
        text: trimmed.to_string(),
        sql: None,
    }
}

/// Finds the first code block with the given language tag (empty for
/// untagged) and returns its content plus the surrounding text.
fn take_code_block(text: &str, lang: &str) -> Option<(String, String)> {
    let fence = format!("```{}", lang);
    let mut search_from = 0;

    loop {
        let start = text[search_from..].find(&fence)? + search_from;
        let header_end = start + text[start..].find('\n')?;
        let header = text[start + 3..header_end].trim();

        let matches = if lang.is_empty() {
            header.is_empty()
        } else {
            header == lang
        };

        let content_start = header_end + 1;
        let close = text[content_start..].find("```")?;

        if !matches {
            // A differently tagged block; skip past it entirely.
            search_from = content_start + close + 3;
            continue;
        }

        let content = text[content_start..content_start + close].to_string();

        let before = text[..start].trim_end();
        let after = text[content_start + close + 3..].trim_start();
        let remaining = if before.is_empty() || after.is_empty() {
            format!("{}{}", before, after)
        } else {
            format!("{}\n{}", before, after)
        };

        return Some((content, remaining));
    }
}

/// Strips `SQLQuery:` prefixes and `SQLResult:` tails, then trims.
fn clean_sql(candidate: &str) -> Option<String> {
    let mut sql = candidate;
    if let Some(idx) = sql.find("SQLResult:") {
        sql = &sql[..idx];
    }

    let sql = sql.trim();
    let sql = sql.strip_prefix("SQLQuery:").map(str::trim).unwrap_or(sql);

    if sql.is_empty() {
        None
    } else {
        Some(sql.to_string())
    }
}

fn looks_like_sql(text: &str) -> bool {
    let first = text
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();
    matches!(first.as_str(), "select" | "with" | "values")
}
