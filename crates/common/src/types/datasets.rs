use crate::types::entity::Identified;
use serde::{Deserialize, Serialize};

/// A SQL-backed dataset. The query text is never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub sql: String,
    /// Name of the [`DataSource`](crate::types::DataSource) the query runs against.
    pub data_source: String,
}

impl Identified for Dataset {
    fn identifier(&self) -> &str {
        &self.id
    }
}

impl Dataset {
    pub fn has_query(&self) -> bool {
        !self.sql.trim().is_empty()
    }
}
