use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::PlaceholderStyle;
use super::bindings::Bindings;
use crate::error::SqlBuilderError;
use crate::types::{SqlValue, TypeHint};

/// SQL parameter mark of the `:param` form.
///
/// This is a plain text scan: colons inside string literals or comments are
/// not distinguished from real placeholders. Callers embedding `:word`
/// sequences in literals should bind them or quote them differently.
static SQL_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z0-9_]+)").expect("placeholder pattern"));

static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n+\s*").expect("line-break pattern"));

/// Executable rewrite of a template: positional SQL plus the flattened
/// value list, in left-to-right occurrence order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rewrite {
    pub(crate) sql: String,
    pub(crate) values: Vec<(SqlValue, TypeHint)>,
}

/// Rewrite `template` for execution against the current bindings.
///
/// Every occurrence of a bound placeholder becomes its expanded positional
/// markers; the flattened values line up with the markers one to one.
///
/// # Errors
///
/// Returns [`SqlBuilderError::MissingParameters`] listing every placeholder
/// name without a binding, sorted, if any occurrence is unresolved.
pub(crate) fn rewrite(
    template: &str,
    bindings: &Bindings,
    style: PlaceholderStyle,
) -> Result<Rewrite, SqlBuilderError> {
    let (sql, values, missing) = walk(template, bindings, true, style);
    if missing.is_empty() {
        Ok(Rewrite { sql, values })
    } else {
        Err(SqlBuilderError::MissingParameters(
            missing.into_iter().collect(),
        ))
    }
}

/// Render `template` for diagnostics, inlining bound values as `[v]`
/// (comma-joined for multi-value bindings) and leaving unresolved
/// placeholders untouched. Never fails.
pub(crate) fn render(template: &str, bindings: &Bindings) -> String {
    let (sql, _, _) = walk(template, bindings, false, PlaceholderStyle::Question);
    sql
}

/// Collapse line breaks and their surrounding whitespace to single spaces.
pub(crate) fn single_line(sql: &str) -> String {
    LINE_BREAKS.replace_all(sql, " ").into_owned()
}

fn walk(
    template: &str,
    bindings: &Bindings,
    executable: bool,
    style: PlaceholderStyle,
) -> (String, Vec<(SqlValue, TypeHint)>, BTreeSet<String>) {
    let mut sql = String::with_capacity(template.len() + 16);
    let mut values = Vec::new();
    let mut missing = BTreeSet::new();
    let mut tail = 0;

    for captures in SQL_MARK.captures_iter(template) {
        // Group 0 always exists for a match.
        let Some(mark) = captures.get(0) else { continue };
        let name = &captures[1];
        sql.push_str(&template[tail..mark.start()]);
        tail = mark.end();

        match bindings.get(name) {
            Some(binding) => {
                for (i, value) in binding.values().iter().enumerate() {
                    if i > 0 {
                        sql.push(',');
                    }
                    if executable {
                        style.push_marker(&mut sql, values.len() + 1);
                    } else {
                        sql.push('[');
                        sql.push_str(&value.to_string());
                        sql.push(']');
                    }
                    values.push((value.clone(), binding.hint()));
                }
            }
            None => {
                // Unresolved occurrences stay verbatim so diagnostic output
                // shows what is still unbound.
                sql.push_str(mark.as_str());
                missing.insert(name.to_string());
            }
        }
    }
    sql.push_str(&template[tail..]);

    (sql, values, missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SqlValue, TypeHint};

    fn bound(pairs: &[(&str, Vec<SqlValue>)]) -> Bindings {
        let mut bindings = Bindings::default();
        for (name, values) in pairs {
            bindings.set(*name, TypeHint::Unspecified, values.clone());
        }
        bindings
    }

    #[test]
    fn expands_multi_value_occurrences_in_order() {
        let bindings = bound(&[
            ("a", vec![SqlValue::Int(1), SqlValue::Int(2)]),
            ("b", vec![SqlValue::Int(3)]),
        ]);
        let rewrite = rewrite(":a,:b (:a)", &bindings, PlaceholderStyle::Question).unwrap();
        assert_eq!(rewrite.sql, "?,?,? (?,?)");
        let flattened: Vec<&SqlValue> = rewrite.values.iter().map(|(v, _)| v).collect();
        assert_eq!(
            flattened,
            [
                &SqlValue::Int(1),
                &SqlValue::Int(2),
                &SqlValue::Int(3),
                &SqlValue::Int(1),
                &SqlValue::Int(2)
            ]
        );
    }

    #[test]
    fn multi_row_insert_flattens_left_to_right() {
        let date = SqlValue::Text("2018-09-12".into());
        let bindings = bound(&[
            ("id1", vec![SqlValue::Int(2)]),
            ("id2", vec![SqlValue::Int(3)]),
            ("code", vec![SqlValue::Text("T".into())]),
            ("created", vec![date.clone()]),
        ]);
        let rewrite = rewrite(
            "INSERT INTO employee (id,code,created) VALUES (:id1,:code,:created),(:id2,:code,:created)",
            &bindings,
            PlaceholderStyle::Question,
        )
        .unwrap();
        assert_eq!(
            rewrite.sql,
            "INSERT INTO employee (id,code,created) VALUES (?,?,?),(?,?,?)"
        );
        let flattened: Vec<&SqlValue> = rewrite.values.iter().map(|(v, _)| v).collect();
        assert_eq!(
            flattened,
            [
                &SqlValue::Int(2),
                &SqlValue::Text("T".into()),
                &date,
                &SqlValue::Int(3),
                &SqlValue::Text("T".into()),
                &date,
            ]
        );
    }

    #[test]
    fn missing_names_are_reported_sorted_and_deduplicated() {
        let bindings = bound(&[("id", vec![SqlValue::Int(10)])]);
        let err = rewrite(
            "WHERE id > :id AND code = :code OR z = :z OR code = :code",
            &bindings,
            PlaceholderStyle::Question,
        )
        .unwrap_err();
        match err {
            SqlBuilderError::MissingParameters(names) => {
                assert_eq!(names, vec!["code".to_string(), "z".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_parameter_message_shape() {
        let err = rewrite(
            "WHERE t.id > :id AND t.code = :code",
            &Bindings::default(),
            PlaceholderStyle::Question,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Missing SQL parameter: [code, id]");
    }

    #[test]
    fn numbered_styles_count_markers_globally() {
        let bindings = bound(&[
            ("a", vec![SqlValue::Int(1), SqlValue::Int(2)]),
            ("b", vec![SqlValue::Int(3)]),
        ]);
        let dollar = rewrite(":a :b", &bindings, PlaceholderStyle::NumberedDollar).unwrap();
        assert_eq!(dollar.sql, "$1,$2 $3");
        let question = rewrite(":a :b", &bindings, PlaceholderStyle::NumberedQuestion).unwrap();
        assert_eq!(question.sql, "?1,?2 ?3");
    }

    #[test]
    fn render_inlines_values_and_keeps_unresolved_names() {
        let bindings = bound(&[
            ("id", vec![SqlValue::Int(10)]),
            (
                "code",
                vec![SqlValue::Text("T".into()), SqlValue::Text("V".into())],
            ),
        ]);
        let rendered = render(
            "WHERE t.id < :id AND t.code IN (:code) AND t.name = :name",
            &bindings,
        );
        assert_eq!(
            rendered,
            "WHERE t.id < [10] AND t.code IN ([T],[V]) AND t.name = :name"
        );
    }

    #[test]
    fn render_single_binding_pair() {
        let bindings = bound(&[
            ("id", vec![SqlValue::Int(10)]),
            ("code", vec![SqlValue::Text("w".into())]),
        ]);
        assert_eq!(
            render("WHERE id > :id AND code = :code", &bindings),
            "WHERE id > [10] AND code = [w]"
        );
    }

    #[test]
    fn text_scan_substitutes_inside_string_literals() {
        // Known limitation: the scan is not SQL-grammar-aware.
        let bindings = bound(&[("code", vec![SqlValue::Text("x".into())])]);
        assert_eq!(
            render("SELECT ':code' AS quoted, :code AS real", &bindings),
            "SELECT '[x]' AS quoted, [x] AS real"
        );
    }

    #[test]
    fn replacement_values_are_not_rescanned() {
        let bindings = bound(&[("code", vec![SqlValue::Text("x:code$1\\{y}".into())])]);
        assert_eq!(
            render("t.code = :code", &bindings),
            "t.code = [x:code$1\\{y}]"
        );
    }

    #[test]
    fn identifier_charset_is_alphanumeric_and_underscore() {
        let bindings = bound(&[("id_2x", vec![SqlValue::Int(5)])]);
        let rewrite = rewrite("a = :id_2x, b = ::id_2x", &bindings, PlaceholderStyle::Question)
            .unwrap();
        // The second occurrence still matches after the extra colon.
        assert_eq!(rewrite.sql, "a = ?, b = :?");
        assert_eq!(rewrite.values.len(), 2);
    }

    #[test]
    fn single_line_collapses_breaks() {
        assert_eq!(
            single_line("SELECT a\n  FROM t \n\nWHERE b = [1]"),
            "SELECT a FROM t WHERE b = [1]"
        );
    }
}
