use crate::types::entity::Identified;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A connection the remote service reads from (e.g. an Athena catalog).
///
/// `connection` is opaque to the provisioner: keys such as `catalog`,
/// `database`, `table` and `workgroup` are forwarded untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    #[serde(default)]
    pub connection: BTreeMap<String, String>,
}

impl Identified for DataSource {
    fn identifier(&self) -> &str {
        &self.name
    }
}
