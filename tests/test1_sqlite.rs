#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use sql_param_builder::prelude::*;

#[derive(Debug, PartialEq)]
struct Employee {
    id: i64,
    name: String,
    created: NaiveDate,
}

fn employee(row: &SqlRow) -> Result<Employee, SqlBuilderError> {
    let id = row
        .get("id")
        .and_then(SqlValue::as_int)
        .copied()
        .ok_or_else(|| SqlBuilderError::ExecutionError("id column".into()))?;
    let name = row
        .get("name")
        .and_then(SqlValue::as_text)
        .ok_or_else(|| SqlBuilderError::ExecutionError("name column".into()))?
        .to_string();
    let created = row
        .get("created")
        .and_then(SqlValue::as_date)
        .ok_or_else(|| SqlBuilderError::ExecutionError("created column".into()))?;
    Ok(Employee { id, name, created })
}

fn first_int(row: &SqlRow) -> Result<i64, SqlBuilderError> {
    row.get_by_index(0)
        .and_then(SqlValue::as_int)
        .copied()
        .ok_or_else(|| SqlBuilderError::ExecutionError("integer column".into()))
}

#[test]
fn full_walkthrough_over_sqlite() -> Result<(), Box<dyn std::error::Error>> {
    let some_date = NaiveDate::from_ymd_opt(2018, 9, 12).unwrap();
    let connection = rusqlite::Connection::open_in_memory()?;
    let mut builder = SqlParamBuilder::new(&connection);

    builder
        .sql_lines(&[
            "CREATE TABLE employee",
            "( id INTEGER PRIMARY KEY",
            ", name TEXT DEFAULT 'test'",
            ", code TEXT",
            ", created DATE NOT NULL",
            ")",
        ])?
        .execute()?;

    // Single insert; the disabled bind is a no-op.
    let inserted = builder
        .sql_lines(&[
            "INSERT INTO employee",
            "( id, code, created ) VALUES",
            "( :id, :code, :created )",
        ])?
        .bind("id", 1)
        .bind("code", "T")
        .bind("created", some_date)
        .bind_if(false, "unused_argument", TypeHint::Date, [some_date])
        .execute()?;
    assert_eq!(inserted, 1);

    // Multi-row insert, then read the generated key back.
    let next_date = some_date.succ_opt().unwrap();
    let inserted = builder
        .sql_lines(&[
            "INSERT INTO employee",
            "(id,code,created) VALUES",
            "(:id1,:code,:created),",
            "(:id2,:code,:created)",
        ])?
        .bind("id1", 2)
        .bind("id2", 3)
        .bind("code", "T")
        .bind("created", next_date)
        .execute_insert()?;
    assert_eq!(inserted, 2);
    assert_eq!(builder.generated_last_key(first_int)?, 3);

    // Same prepared statement, new parameters.
    let affected = builder
        .bind("id1", 11)
        .bind("id2", 12)
        .bind("code", "V")
        .execute()?;
    assert_eq!(affected, 2);

    // Select with a multi-value IN expansion.
    let employees: Vec<Employee> = builder
        .sql_lines(&[
            "SELECT t.id, t.name, t.created",
            "FROM employee t",
            "WHERE t.id < :id",
            "  AND t.code IN (:code)",
            "ORDER BY t.id",
        ])?
        .bind("id", 10)
        .bind_all("code", ["T", "V"])
        .stream_map(employee)?
        .collect::<Result<_, _>>()?;
    assert_eq!(employees.len(), 3);
    assert_eq!(
        employees[0],
        Employee {
            id: 1,
            name: "test".into(),
            created: some_date,
        }
    );

    // Reuse the same select with a wider bound.
    let employees2: Vec<Employee> = builder
        .bind("id", 100)
        .stream_map(employee)?
        .collect::<Result<_, _>>()?;
    assert_eq!(employees2.len(), 5);

    // Push-style consumption of the same query.
    let mut counted = 0;
    builder.for_each(|row| {
        assert!(row.get("id").is_some());
        counted += 1;
        Ok(())
    })?;
    assert_eq!(counted, 5);

    assert_eq!(
        builder.render_line(),
        "SELECT t.id, t.name, t.created FROM employee t \
         WHERE t.id < [100] AND t.code IN ([T],[V]) ORDER BY t.id"
    );

    // Close is idempotent and leaves the builder reusable.
    builder.close()?;
    builder.close()?;
    let remaining: Vec<i64> = builder
        .sql("SELECT COUNT(*) AS cnt FROM employee")?
        .stream_map(first_int)?
        .collect::<Result<_, _>>()?;
    assert_eq!(remaining, [5]);

    Ok(())
}

#[test]
fn abandoned_stream_releases_the_cursor() -> Result<(), Box<dyn std::error::Error>> {
    let connection = rusqlite::Connection::open_in_memory()?;
    let mut builder = SqlParamBuilder::new(&connection);

    builder
        .sql("CREATE TABLE t (id INTEGER PRIMARY KEY)")?
        .execute()?;
    builder
        .sql("INSERT INTO t (id) VALUES (:a),(:b),(:c)")?
        .bind("a", 1)
        .bind("b", 2)
        .bind("c", 3)
        .execute()?;

    builder.sql("SELECT id FROM t ORDER BY id")?;
    {
        let mut stream = builder.stream_map(first_int)?;
        let first = stream.next().transpose()?;
        assert_eq!(first, Some(1));
        // Dropped here with two rows unread.
    }

    // The statement is immediately usable again.
    let all: Vec<i64> = builder.stream_map(first_int)?.collect::<Result<_, _>>()?;
    assert_eq!(all, [1, 2, 3]);
    Ok(())
}

#[test]
fn file_backed_database_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("builder.db");

    let connection = rusqlite::Connection::open(&path)?;
    let mut builder = SqlParamBuilder::new(&connection);
    builder
        .sql("CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT)")?
        .execute()?;
    builder
        .sql("INSERT INTO kv (k, v) VALUES (:k, :v)")?
        .bind("k", "alpha")
        .bind("v", "1")
        .execute()?;
    builder.close()?;
    drop(builder);
    drop(connection);

    // Reopen and observe the committed row.
    let connection = rusqlite::Connection::open(&path)?;
    let mut builder = SqlParamBuilder::new(&connection);
    let values: Vec<String> = builder
        .sql("SELECT v FROM kv WHERE k IN (:k)")?
        .bind_all("k", ["alpha", "beta"])
        .stream_map(|row| {
            row.get("v")
                .and_then(SqlValue::as_text)
                .map(ToString::to_string)
                .ok_or_else(|| SqlBuilderError::ExecutionError("v column".into()))
        })?
        .collect::<Result<_, _>>()?;
    assert_eq!(values, ["1"]);
    Ok(())
}

#[test]
fn missing_binding_fails_before_touching_the_database() -> Result<(), Box<dyn std::error::Error>>
{
    let connection = rusqlite::Connection::open_in_memory()?;
    let mut builder = SqlParamBuilder::new(&connection);

    builder
        .sql("CREATE TABLE t (id INTEGER, code TEXT)")?
        .execute()?;
    builder.sql("SELECT id FROM t WHERE id > :id AND code = :code")?;
    builder.bind("id", 10);
    let err = builder.execute().unwrap_err();
    match err {
        SqlBuilderError::MissingParameters(names) => assert_eq!(names, ["code"]),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}
