use crate::error::CacheError;
use async_trait::async_trait;
use model::core::value::Value;

/// A queued `SET key value` with no expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOp {
    pub key: String,
    pub value: Value,
}

/// Writes staged in memory and sent to the cache as one exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    ops: Vec<SetOp>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.ops.push(SetOp {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn ops(&self) -> &[SetOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<SetOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Key/value cache the sync loop writes projections and the cursor into.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Executes every queued operation as one atomic exchange: either all
    /// writes become visible or none do.
    async fn exec(&self, pipeline: Pipeline) -> Result<(), CacheError>;

    fn pipeline(&self) -> Pipeline {
        Pipeline::new()
    }

    /// Name used in log lines.
    fn name(&self) -> &str;
}
