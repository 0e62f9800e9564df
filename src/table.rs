use crate::error::MetatreeError;
use crate::node::Value;
use crate::view::{Item, NodeRef};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum Columns {
    /// Every string key seen on any mapping node, in first-seen order.
    All,
    Include(Vec<String>),
    Exclude(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|row| row.get(index)).collect())
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut records = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut record = serde_json::Map::new();
            for (column, value) in self.columns.iter().zip(row) {
                record.insert(column.clone(), serde_json::to_value(value)?);
            }
            records.push(serde_json::Value::Object(record));
        }
        Ok(serde_json::Value::Array(records))
    }
}

/// Projects nodes into a table, resolving each column as an (inherited)
/// property of every node. A node missing a column fails the projection.
pub fn to_table(nodes: &[NodeRef<'_>], columns: &Columns) -> Result<Table, MetatreeError> {
    let columns = match columns {
        Columns::Include(names) => names.clone(),
        Columns::All => observed_keys(nodes),
        Columns::Exclude(names) => observed_keys(nodes)
            .into_iter()
            .filter(|k| !names.contains(k))
            .collect(),
    };

    let rows = nodes
        .iter()
        .map(|node| {
            node.get_properties(columns.as_slice())
                .map(|items| items.iter().map(Item::to_value).collect::<Vec<Value>>())
        })
        .collect::<Result<Vec<Vec<Value>>, MetatreeError>>()?;

    tracing::debug!(rows = rows.len(), columns = columns.len(), "projected table");
    Ok(Table { columns, rows })
}

fn observed_keys(nodes: &[NodeRef<'_>]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in nodes.iter().flat_map(|n| n.keys()) {
        if let Some(k) = key.as_str() {
            if !keys.iter().any(|seen| seen == k) {
                keys.push(k.to_string());
            }
        }
    }
    keys
}
