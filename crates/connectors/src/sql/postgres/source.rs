use crate::{
    error::ConnectorError,
    sql::postgres::{params::PgParam, row::to_row_data, utils::connect_client},
};
use async_trait::async_trait;
use engine_core::{connectors::source::RowSource, error::SourceError};
use model::{core::value::Value, records::row::RowData};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tokio_postgres::{Client, types::ToSql};
use tracing::{debug, error, info, warn};

/// PostgreSQL-backed [`RowSource`].
///
/// The client is replaced transparently when the server closes the
/// connection, so a retried iteration gets a fresh session.
pub struct PgRowSource {
    conn_str: String,
    root_cert: Option<PathBuf>,
    client: RwLock<Client>,
}

impl PgRowSource {
    pub async fn connect(
        conn_str: &str,
        root_cert: Option<PathBuf>,
    ) -> Result<Self, ConnectorError> {
        let client = connect_client(conn_str, root_cert.as_deref()).await?;
        Ok(PgRowSource {
            conn_str: conn_str.to_string(),
            root_cert,
            client: RwLock::new(client),
        })
    }

    pub async fn ping(&self) -> Result<(), ConnectorError> {
        let client = self.client.read().await;
        let row = client.query_one("SELECT 1", &[]).await?;
        let val: i32 = row.get(0);
        if val != 1 {
            return Err(ConnectorError::Ping {
                service: "postgres".to_string(),
                response: val.to_string(),
            });
        }
        Ok(())
    }

    async fn reconnect_if_closed(&self) -> Result<(), SourceError> {
        if !self.client.read().await.is_closed() {
            return Ok(());
        }

        let mut client = self.client.write().await;
        if client.is_closed() {
            warn!("Postgres connection closed, reconnecting");
            *client = connect_client(&self.conn_str, self.root_cert.as_deref())
                .await
                .map_err(|e| SourceError::Connection(Box::new(e)))?;
            info!("Reconnected to Postgres");
        }
        Ok(())
    }
}

#[async_trait]
impl RowSource for PgRowSource {
    async fn query(&self, sql: &str, cursor: &Value) -> Result<Vec<RowData>, SourceError> {
        self.reconnect_if_closed().await?;
        let client = self.client.read().await;

        let statement = client.prepare(sql).await.map_err(|e| {
            error!(error = %e, query = sql, "Unable to prepare query");
            SourceError::Query(Box::new(e))
        })?;

        let param_type = statement.params().first().ok_or_else(|| {
            SourceError::Other(format!("query has no parameter to bind the cursor to: {sql}"))
        })?;
        let param = PgParam::for_type(cursor, param_type)?;
        let params: [&(dyn ToSql + Sync); 1] = [param.as_ref()];

        debug!(cursor = %cursor, param_type = %param_type, "Running source query");
        let rows = client.query(&statement, &params).await.map_err(|e| {
            error!(error = %e, query = sql, "Unable to query db");
            SourceError::Query(Box::new(e))
        })?;

        rows.iter().map(to_row_data).collect()
    }

    fn name(&self) -> &str {
        "postgres"
    }
}
