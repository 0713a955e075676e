#![allow(dead_code)]

use lightning_route::features::encrypt::{EncryptColumn, EncryptRule, EncryptTable};
use lightning_route::features::readwrite_splitting::{ReadwriteSplittingGroup, ReadwriteSplittingRule};
use lightning_route::features::shadow::{ShadowAlgorithm, ShadowDataSource, ShadowOperation, ShadowRule, ShadowTable};
use lightning_route::features::sharding::{ShardingAlgorithm, ShardingRule, ShardingStrategy, ShardingTableRule};
use lightning_route::metadata::{ColumnMetadata, TableMetadata};
use lightning_route::route::Condition;
use lightning_route::{
    DatabaseType, LogicDatabase, PhysicalInstanceIndex, QueryContext, RuleConfiguration, RuleSet, SchemaMetadata,
    StatementKind,
};
use std::sync::Arc;

pub fn index(descriptors: &[(&str, &str)], database_type: DatabaseType) -> PhysicalInstanceIndex {
    PhysicalInstanceIndex::build(descriptors.iter().copied(), database_type).expect("Failed to build instance index")
}

/// `ds0` on its own host, `ds1` and `ds2` sharing `10.0.0.1:5432`.
pub fn three_postgres_sources() -> PhysicalInstanceIndex {
    index(
        &[
            ("ds0", "jdbc:postgresql://10.0.0.2:5432/db0"),
            ("ds1", "jdbc:postgresql://10.0.0.1:5432/db1"),
            ("ds2", "jdbc:postgresql://10.0.0.1:5432/db2"),
        ],
        DatabaseType::PostgreSQL,
    )
}

pub fn order_schema() -> SchemaMetadata {
    SchemaMetadata::new("logic_db")
        .with_table(TableMetadata::new(
            "t_order",
            vec![
                ColumnMetadata::new("order_id", "BIGINT").primary_key(),
                ColumnMetadata::new("user_id", "INT"),
                ColumnMetadata::new("user_name", "VARCHAR"),
            ],
        ))
        .with_table(TableMetadata::new(
            "t_dict",
            vec![ColumnMetadata::new("code", "VARCHAR").primary_key()],
        ))
}

pub fn database_with_rules(
    instances: PhysicalInstanceIndex,
    schema: SchemaMetadata,
    rules: Vec<Arc<dyn RuleConfiguration>>,
) -> LogicDatabase {
    let rules = rules.into_iter().fold(RuleSet::new(), |set, rule| set.with_rule(rule));
    LogicDatabase::new("logic_db", schema, instances, rules)
}

pub fn sharding_rule() -> ShardingRule {
    ShardingRule::new()
        .with_table(
            ShardingTableRule::from_expression("t_order", "ds_${0..1}.t_order_${0..1}")
                .unwrap()
                .with_database_strategy(ShardingStrategy::new(
                    "user_id",
                    ShardingAlgorithm::Modulo { sharding_count: 2 },
                ))
                .unwrap()
                .with_table_strategy(ShardingStrategy::new(
                    "order_id",
                    ShardingAlgorithm::Modulo { sharding_count: 2 },
                ))
                .unwrap(),
        )
        .with_broadcast_table("t_dict")
}

/// Sharded `t_order` over two replica groups, encrypted `user_name` and a
/// shadow copy of the first primary.
pub fn full_stack_database() -> LogicDatabase {
    let instances = index(
        &[
            ("primary_0", "jdbc:mysql://10.0.0.1:3306/order_db"),
            ("replica_0", "jdbc:mysql://10.0.1.1:3306/order_db"),
            ("primary_1", "jdbc:mysql://10.0.0.2:3306/order_db"),
            ("replica_1", "jdbc:mysql://10.0.1.2:3306/order_db"),
            ("shadow_0", "jdbc:mysql://10.0.9.1:3306/order_db"),
        ],
        DatabaseType::MySQL,
    );

    let readwrite = ReadwriteSplittingRule::new()
        .with_group(ReadwriteSplittingGroup::new("ds_0", "primary_0", ["replica_0"]))
        .unwrap()
        .with_group(ReadwriteSplittingGroup::new("ds_1", "primary_1", ["replica_1"]))
        .unwrap();

    let encrypt = EncryptRule::new().with_table(EncryptTable::new(
        "t_order",
        vec![EncryptColumn::new("user_name", "user_name_cipher", "aes")],
    ));

    let shadow = ShadowRule::new()
        .with_data_source(ShadowDataSource::new("shadow_group", "primary_0", "shadow_0"))
        .unwrap()
        .with_algorithm(
            "user_id_insert",
            ShadowAlgorithm::column_value("user_id", ShadowOperation::Insert, 0),
        )
        .with_algorithm("hint", ShadowAlgorithm::Hint)
        .with_table(ShadowTable::new("t_order", ["user_id_insert"]))
        .unwrap()
        .with_default_algorithm("hint")
        .unwrap();

    database_with_rules(
        instances,
        order_schema(),
        vec![
            Arc::new(sharding_rule()),
            Arc::new(readwrite),
            Arc::new(encrypt),
            Arc::new(shadow),
        ],
    )
}

pub fn order_insert(user_id: i64, order_id: i64) -> QueryContext {
    QueryContext::new(
        "INSERT INTO t_order (order_id, user_id, user_name) VALUES (?, ?, ?)",
        StatementKind::Insert,
        DatabaseType::MySQL,
    )
    .with_table("t_order")
    .with_condition(Condition::equal("t_order", "user_id", user_id))
    .with_condition(Condition::equal("t_order", "order_id", order_id))
}

pub fn order_select(user_id: i64, order_id: i64) -> QueryContext {
    QueryContext::new(
        "SELECT * FROM t_order WHERE user_id = ? AND order_id = ?",
        StatementKind::Select,
        DatabaseType::MySQL,
    )
    .with_table("t_order")
    .with_condition(Condition::equal("t_order", "user_id", user_id))
    .with_condition(Condition::equal("t_order", "order_id", order_id))
}
