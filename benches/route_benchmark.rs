use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lightning_route::features::readwrite_splitting::{ReadwriteSplittingGroup, ReadwriteSplittingRule};
use lightning_route::features::sharding::{ShardingAlgorithm, ShardingRule, ShardingStrategy, ShardingTableRule};
use lightning_route::metadata::{ColumnMetadata, TableMetadata};
use lightning_route::route::Condition;
use lightning_route::{
    ConfigurationProperties, ConnectionContext, DatabaseType, LogicDatabase, PhysicalInstanceIndex, QueryContext,
    RouterRegistry, RoutingPipeline, RuleSet, SchemaMetadata, StatementKind,
};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

fn descriptors(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| (format!("ds_{}", i), format!("jdbc:mysql://10.0.{}.{}:3306/db_{}", i / 250, i % 250, i)))
        .collect()
}

fn sharded_database(shards: usize) -> LogicDatabase {
    let instances = PhysicalInstanceIndex::build(descriptors(shards), DatabaseType::MySQL).unwrap();
    let expression = format!("ds_${{0..{}}}.t_order_${{0..3}}", shards - 1);
    let sharding = ShardingRule::new().with_table(
        ShardingTableRule::from_expression("t_order", &expression)
            .unwrap()
            .with_database_strategy(ShardingStrategy::new(
                "user_id",
                ShardingAlgorithm::Modulo {
                    sharding_count: shards as u64,
                },
            ))
            .unwrap()
            .with_table_strategy(ShardingStrategy::new(
                "order_id",
                ShardingAlgorithm::Hash { sharding_count: 4 },
            ))
            .unwrap(),
    );
    let schema = SchemaMetadata::new("logic_db").with_table(TableMetadata::new(
        "t_order",
        vec![
            ColumnMetadata::new("order_id", "BIGINT").primary_key(),
            ColumnMetadata::new("user_id", "INT"),
        ],
    ));
    LogicDatabase::new("logic_db", schema, instances, RuleSet::new().with_rule(Arc::new(sharding)))
}

fn bench_instance_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("instance_index");

    for size in [8, 64, 512].iter() {
        let descriptors = descriptors(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("build", size), &descriptors, |b, descriptors| {
            b.iter(|| PhysicalInstanceIndex::build(black_box(descriptors.clone()), DatabaseType::MySQL).unwrap());
        });

        let index = PhysicalInstanceIndex::build(descriptors.clone(), DatabaseType::MySQL).unwrap();
        group.bench_with_input(BenchmarkId::new("representative_names", size), &index, |b, index| {
            b.iter(|| black_box(index.representative_names(None)));
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing_pipeline");
    group.measurement_time(Duration::from_secs(5));

    let registry = RouterRegistry::with_builtin_routers();
    let props = ConfigurationProperties::default();
    let connection = ConnectionContext::new(1);

    for shards in [2, 16, 64].iter() {
        let database = sharded_database(*shards);
        let precise = QueryContext::new(
            "SELECT * FROM t_order WHERE user_id = ? AND order_id = ?",
            StatementKind::Select,
            DatabaseType::MySQL,
        )
        .with_table("t_order")
        .with_condition(Condition::equal("t_order", "user_id", 7))
        .with_condition(Condition::equal("t_order", "order_id", 42));
        let full = QueryContext::new("SELECT * FROM t_order", StatementKind::Select, DatabaseType::MySQL)
            .with_table("t_order");

        group.bench_with_input(BenchmarkId::new("sharded_precise", shards), &precise, |b, query| {
            let pipeline = RoutingPipeline::new(&registry);
            b.iter(|| pipeline.route(black_box(query), &database, &props, &connection).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("sharded_full_route", shards), &full, |b, query| {
            let pipeline = RoutingPipeline::new(&registry);
            b.iter(|| pipeline.route(black_box(query), &database, &props, &connection).unwrap());
        });
    }

    let instances = PhysicalInstanceIndex::build(
        vec![
            ("primary", "jdbc:mysql://10.0.0.1:3306/db"),
            ("replica_0", "jdbc:mysql://10.0.0.2:3306/db"),
            ("replica_1", "jdbc:mysql://10.0.0.3:3306/db"),
        ],
        DatabaseType::MySQL,
    )
    .unwrap();
    let readwrite = ReadwriteSplittingRule::new()
        .with_group(ReadwriteSplittingGroup::new("rw", "primary", ["replica_0", "replica_1"]))
        .unwrap();
    let database = LogicDatabase::new(
        "logic_db",
        SchemaMetadata::new("logic_db"),
        instances,
        RuleSet::new().with_rule(Arc::new(readwrite)),
    );
    let query = QueryContext::new("SELECT * FROM t_user", StatementKind::Select, DatabaseType::MySQL).with_table("t_user");
    group.bench_function("readwrite_splitting_read", |b| {
        let pipeline = RoutingPipeline::new(&registry);
        b.iter(|| pipeline.route(black_box(&query), &database, &props, &connection).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_instance_index, bench_pipeline);
criterion_main!(benches);
