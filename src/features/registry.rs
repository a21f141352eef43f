//! Feature table-set registry
//!
//! Declarative mapping from a feature key to the additive schema objects
//! that feature requires inside a tenant's target database. Features absent
//! from this registry need no schema objects; adding a new gated feature
//! means adding an entry here, not touching control flow.
//!
//! DDL is intentionally `CREATE TABLE IF NOT EXISTS` so a racing duplicate
//! attempt is a safe no-op on every supported backend.

/// One table a feature requires, with its guarded creation DDL
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub ddl: &'static str,
}

/// The full set of schema objects a gated feature requires
#[derive(Debug, Clone, Copy)]
pub struct FeatureTableSet {
    pub feature_key: &'static str,
    pub tables: &'static [TableSpec],
}

const FUND_MANAGEMENT_TABLES: &[TableSpec] = &[
    TableSpec {
        name: "funds",
        ddl: "CREATE TABLE IF NOT EXISTS funds (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            target_amount NUMERIC(14,2),
            balance NUMERIC(14,2) NOT NULL DEFAULT 0,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    },
    TableSpec {
        name: "fund_transactions",
        ddl: "CREATE TABLE IF NOT EXISTS fund_transactions (
            id TEXT PRIMARY KEY,
            fund_id TEXT NOT NULL REFERENCES funds(id),
            amount NUMERIC(14,2) NOT NULL,
            direction TEXT NOT NULL,
            reference TEXT,
            recorded_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    },
];

const INVENTORY_MANAGEMENT_TABLES: &[TableSpec] = &[
    TableSpec {
        name: "inventory_items",
        ddl: "CREATE TABLE IF NOT EXISTS inventory_items (
            id TEXT PRIMARY KEY,
            sku TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            quantity BIGINT NOT NULL DEFAULT 0,
            unit TEXT,
            location TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    },
    TableSpec {
        name: "inventory_movements",
        ddl: "CREATE TABLE IF NOT EXISTS inventory_movements (
            id TEXT PRIMARY KEY,
            item_id TEXT NOT NULL REFERENCES inventory_items(id),
            delta BIGINT NOT NULL,
            reason TEXT,
            moved_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    },
];

/// Every feature whose enablement requires schema objects
const REGISTRY: &[FeatureTableSet] = &[
    FeatureTableSet {
        feature_key: "fund_management",
        tables: FUND_MANAGEMENT_TABLES,
    },
    FeatureTableSet {
        feature_key: "inventory_management",
        tables: INVENTORY_MANAGEMENT_TABLES,
    },
];

/// Look up the table set a feature requires, if any.
pub fn table_set(feature_key: &str) -> Option<&'static FeatureTableSet> {
    REGISTRY.iter().find(|set| set.feature_key == feature_key)
}

/// Keys of all features that require schema objects.
pub fn gated_feature_keys() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|set| set.feature_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(table_set("fund_management").is_some());
        assert!(table_set("inventory_management").is_some());
        assert!(table_set("member_portal").is_none());
        assert!(table_set("").is_none());
    }

    #[test]
    fn test_every_table_has_guarded_ddl() {
        for set in [
            table_set("fund_management").unwrap(),
            table_set("inventory_management").unwrap(),
        ] {
            assert!(!set.tables.is_empty());
            for table in set.tables {
                assert!(table.ddl.contains("IF NOT EXISTS"));
                assert!(table.ddl.contains(table.name));
            }
        }
    }

    #[test]
    fn test_gated_keys_are_unique() {
        let keys: Vec<_> = gated_feature_keys().collect();
        let mut deduped = keys.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(keys.len(), deduped.len());
    }
}
