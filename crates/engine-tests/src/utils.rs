use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio_postgres::Client;

/// Integer-keyed table: the default select query groups it by partition.
pub const SAMPLE_TABLE_DDL: &str = r#"
    DROP TABLE IF EXISTS sample_table;
    CREATE TABLE sample_table (
        id BIGINT PRIMARY KEY,
        partition_key INT NOT NULL
    );
    INSERT INTO sample_table (id, partition_key) VALUES
        (1, 1000),
        (2, 1000),
        (3, 2000);
"#;

/// UUIDv7-keyed table, so ids sort by insertion time.
pub const UUID_TABLE_DDL: &str = r#"
    DROP TABLE IF EXISTS uuid_table;
    CREATE TABLE uuid_table (
        id UUID PRIMARY KEY,
        partition_key UUID NOT NULL
    );
    INSERT INTO uuid_table (id, partition_key) VALUES
        ('01926cc4-51a2-7b5e-9d8c-2f1e0a3b4c5d', '8afb5e31-d8a6-4d92-b964-6ad8cc296050'),
        ('01926cc4-cece-72d3-b801-abcb74b68556', '65e6690c-80a6-4c76-95c7-2bbb686e4074'),
        ('01926cc6-6430-7359-8ba1-02f348b55d36', '8afb5e31-d8a6-4d92-b964-6ad8cc296050');
"#;

pub const UUID_SELECT_QUERY: &str = "SELECT MAX(id::text) as id, partition_key::text \
    FROM uuid_table WHERE id > $1 GROUP BY partition_key";

pub async fn execute(client: &Client, sql: &str) {
    client.batch_execute(sql).await.expect("execute sql");
}

pub async fn insert(client: &Client, table: &str, id: i64, partition_key: i32) {
    let sql = format!(
        "INSERT INTO {table} (id, partition_key) VALUES ($1, $2) ON CONFLICT DO NOTHING"
    );
    client
        .execute(&sql, &[&id, &partition_key])
        .await
        .expect("insert row");
}

pub async fn get_value(conn: &mut MultiplexedConnection, key: &str) -> Option<String> {
    conn.get(key).await.expect("redis get")
}

pub async fn set_value(conn: &mut MultiplexedConnection, key: &str, value: &str) {
    let _: () = conn.set(key, value).await.expect("redis set");
}

pub async fn delete_keys(conn: &mut MultiplexedConnection, keys: &[&str]) {
    let _: () = conn.del(keys).await.expect("redis del");
}

pub async fn assert_value(conn: &mut MultiplexedConnection, key: &str, expected: &str) {
    let actual = get_value(conn, key).await;
    assert_eq!(
        actual.as_deref(),
        Some(expected),
        "redis value for key {key}"
    );
}

pub async fn assert_missing(conn: &mut MultiplexedConnection, keys: &[&str]) {
    let found: i64 = conn.exists(keys).await.expect("redis exists");
    assert_eq!(found, 0, "expected keys {keys:?} to be absent");
}
