use crate::error::SourceError;
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData};

/// Relational source the sync loop reads from.
///
/// The query text owns its predicate, ordering and `LIMIT`; the loop only
/// binds the cursor value as the sole parameter. Implementations are expected
/// to return rows whose progress column sorts strictly after `cursor`.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn query(&self, sql: &str, cursor: &Value) -> Result<Vec<RowData>, SourceError>;

    /// Name used in log lines.
    fn name(&self) -> &str;
}
