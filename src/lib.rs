pub mod config;
pub mod error;
pub mod history;
pub mod node;
pub mod query;
pub mod selector;
pub mod storage;
pub mod table;
pub mod tree;
pub mod view;

pub use config::HistoryConfig;
pub use error::MetatreeError;
pub use node::{Mapping, NodeId, NodeType, Value, classify};
pub use query::Query;
pub use selector::Selector;
pub use tree::{Concat, Tree, build_tree, concat};
pub use view::{Item, NodeRef};
