use super::rule::{EncryptRule, EncryptTable};
use crate::config::ConfigurationProperties;
use crate::error::{Error, Result};
use crate::metadata::LogicDatabase;
use crate::route::{fallback_route_context, ConnectionContext, QueryContext, RouteContext, RuleRouter};
use crate::rule::{downcast_rule, RuleConfiguration, RuleKind};

/// Annotations are keyed `encrypt.<table>` and list `logic:cipher` pairs.
pub const ANNOTATION_PREFIX: &str = "encrypt.";

#[derive(Debug, Clone, Copy)]
pub struct EncryptRouter {
    order: i32,
}

impl EncryptRouter {
    pub const DEFAULT_ORDER: i32 = 30;

    pub fn new() -> Self {
        Self {
            order: Self::DEFAULT_ORDER,
        }
    }

    pub fn with_order(self, order: i32) -> Self {
        Self { order }
    }

    fn annotate_tables(context: &mut RouteContext, query: &QueryContext, database: &LogicDatabase, rule: &EncryptRule) -> Result<()> {
        for table in &query.tables {
            let Some(encrypt_table) = rule.find_table(table) else {
                continue;
            };
            check_schema(database, encrypt_table)?;

            let pairs: Vec<String> = encrypt_table
                .columns
                .iter()
                .map(|column| format!("{}:{}", column.logic, column.cipher))
                .collect();
            context.annotate(format!("{}{}", ANNOTATION_PREFIX, encrypt_table.name), pairs.join(","));
        }
        Ok(())
    }
}

/// Encrypted tables and their logic columns must exist in schema metadata.
fn check_schema(database: &LogicDatabase, encrypt_table: &EncryptTable) -> Result<()> {
    let rule_name = RuleKind::Encrypt.name();
    let table = database.schema.table(&encrypt_table.name).ok_or_else(|| {
        Error::route_decision(
            rule_name,
            encrypt_table.name.as_str(),
            "encrypted table is not present in schema metadata",
        )
    })?;

    match encrypt_table
        .columns
        .iter()
        .find(|column| !table.has_column(&column.logic))
    {
        Some(column) => Err(Error::route_decision(
            rule_name,
            encrypt_table.name.as_str(),
            format!("encrypted column '{}' is not present in schema metadata", column.logic),
        )),
        None => Ok(()),
    }
}

impl Default for EncryptRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRouter for EncryptRouter {
    fn rule_kind(&self) -> RuleKind {
        RuleKind::Encrypt
    }

    fn order(&self) -> i32 {
        self.order
    }

    /// Encryption does not pick targets: seed the default route.
    fn create_route_context(
        &self,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &dyn RuleConfiguration,
        _props: &ConfigurationProperties,
        _connection: &ConnectionContext,
    ) -> Result<RouteContext> {
        let rule = downcast_rule::<EncryptRule>(rule)?;
        let mut context = fallback_route_context(query, database);
        Self::annotate_tables(&mut context, query, database, rule)?;
        Ok(context)
    }

    fn decorate_route_context(
        &self,
        context: &mut RouteContext,
        query: &QueryContext,
        database: &LogicDatabase,
        rule: &dyn RuleConfiguration,
        _props: &ConfigurationProperties,
        _connection: &ConnectionContext,
    ) -> Result<()> {
        let rule = downcast_rule::<EncryptRule>(rule)?;
        Self::annotate_tables(context, query, database, rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::encrypt::{EncryptColumn, EncryptTable};
    use crate::metadata::{ColumnMetadata, DatabaseType, PhysicalInstanceIndex, SchemaMetadata, TableMetadata};
    use crate::route::StatementKind;
    use crate::rule::RuleSet;
    use std::sync::Arc;

    fn database(rule: EncryptRule) -> LogicDatabase {
        let instances = PhysicalInstanceIndex::build(
            vec![
                ("ds_0", "jdbc:mysql://10.0.0.1:3306/db0"),
                ("ds_1", "jdbc:mysql://10.0.0.1:3306/db1"),
                ("ds_2", "jdbc:mysql://10.0.0.2:3306/db2"),
            ],
            DatabaseType::MySQL,
        )
        .unwrap();
        let schema = SchemaMetadata::new("logic_db").with_table(TableMetadata::new(
            "t_user",
            vec![
                ColumnMetadata::new("user_id", "INT").primary_key(),
                ColumnMetadata::new("pwd", "VARCHAR"),
            ],
        ));
        LogicDatabase::new("logic_db", schema, instances, RuleSet::new().with_rule(Arc::new(rule)))
    }

    fn create(database: &LogicDatabase, query: &QueryContext) -> Result<RouteContext> {
        EncryptRouter::new().create_route_context(
            query,
            database,
            database.rules.find(RuleKind::Encrypt).unwrap(),
            &ConfigurationProperties::default(),
            &ConnectionContext::default(),
        )
    }

    #[test]
    fn test_create_seeds_default_route_and_annotates() {
        let rule = EncryptRule::new().with_table(EncryptTable::new(
            "t_user",
            vec![EncryptColumn::new("pwd", "pwd_cipher", "aes").with_assisted_query("pwd_assisted")],
        ));
        let database = database(rule);
        let query = QueryContext::new("SELECT pwd FROM t_user", StatementKind::Select, DatabaseType::MySQL)
            .with_table("t_user");

        let context = create(&database, &query).unwrap();
        assert_eq!(context.actual_data_source_names(), vec!["ds_0", "ds_2"]);
        assert_eq!(context.annotation("encrypt.t_user"), Some("pwd:pwd_cipher"));
    }

    #[test]
    fn test_missing_column_is_route_decision_error() {
        let rule = EncryptRule::new().with_table(EncryptTable::new(
            "t_user",
            vec![EncryptColumn::new("phone", "phone_cipher", "aes")],
        ));
        let database = database(rule);
        let query = QueryContext::new("SELECT * FROM t_user", StatementKind::Select, DatabaseType::MySQL)
            .with_table("T_USER");

        assert!(matches!(
            create(&database, &query),
            Err(Error::RouteDecision { rule, table, reason })
                if rule == "encrypt" && table == "t_user" && reason.contains("phone")
        ));
    }

    #[test]
    fn test_decorate_keeps_targets() {
        let rule = EncryptRule::new().with_table(EncryptTable::new(
            "t_missing",
            vec![EncryptColumn::new("pwd", "pwd_cipher", "aes")],
        ));
        let database = database(rule);
        let query = QueryContext::new("SELECT * FROM t_user", StatementKind::Select, DatabaseType::MySQL)
            .with_table("t_user");
        let mut context = fallback_route_context(&query, &database);
        let before = context.clone();

        EncryptRouter::new()
            .decorate_route_context(
                &mut context,
                &query,
                &database,
                database.rules.find(RuleKind::Encrypt).unwrap(),
                &ConfigurationProperties::default(),
                &ConnectionContext::default(),
            )
            .unwrap();
        assert_eq!(context, before);
    }
}
