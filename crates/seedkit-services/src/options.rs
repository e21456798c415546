use seedkit_dependencies::InsertOrder;
use serde::{Deserialize, Serialize};

/// Options for a [`Seeder`](crate::Seeder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeederOptions {
    /// Order in which insert buckets run
    pub insert_order: InsertOrder,
    /// Whether `reset` clears the cascade set before inserting
    pub delete_before_insert: bool,
}

impl Default for SeederOptions {
    fn default() -> Self {
        Self {
            insert_order: InsertOrder::ParentsFirst,
            delete_before_insert: true,
        }
    }
}

impl SeederOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_insert_order(mut self, order: InsertOrder) -> Self {
        self.insert_order = order;
        self
    }

    pub fn with_delete_before_insert(mut self, enabled: bool) -> Self {
        self.delete_before_insert = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_fields_use_defaults() {
        let options: SeederOptions =
            serde_json::from_str(r#"{"insert_order": "level_ascending"}"#).unwrap();
        assert_eq!(
            options,
            SeederOptions::new().with_insert_order(InsertOrder::LevelAscending)
        );
        assert!(options.delete_before_insert);
    }

    #[test]
    fn test_builder() {
        let options = SeederOptions::new().with_delete_before_insert(false);
        assert_eq!(options.insert_order, InsertOrder::ParentsFirst);
        assert!(!options.delete_before_insert);
    }
}
