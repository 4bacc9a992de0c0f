//! MariaDB instance list data source

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};

use super::{ids_hash, number_list, object_type, object_value};
use crate::api::mariadb::instance::{DBInstance, DescribeDBInstancesRequest};
use crate::helper::{log_elapsed, string_list, string_opt};
use crate::resources::{api_error, downcast_provider_data, not_configured};
use crate::TencentCloudProviderData;

const INSTANCE_STRINGS: [&str; 8] = [
    "instance_id",
    "instance_name",
    "region",
    "zone",
    "vpc_id",
    "subnet_id",
    "vip",
    "db_version_id",
];

const INSTANCE_NUMBERS: [&str; 6] = [
    "project_id",
    "status",
    "vport",
    "memory",
    "storage",
    "node_count",
];

#[derive(Default)]
pub struct MariadbDbInstancesDataSource {
    provider_data: Option<TencentCloudProviderData>,
}

impl MariadbDbInstancesDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn build_filter(config: &DynamicValue) -> DescribeDBInstancesRequest {
    let instance_ids = string_list(config, &AttributePath::new("instance_ids"));
    DescribeDBInstancesRequest {
        instance_ids: (!instance_ids.is_empty()).then_some(instance_ids),
        search_name: string_opt(config, &AttributePath::new("search_name")),
        project_ids: number_list(config, "project_ids"),
        vpc_id: string_opt(config, &AttributePath::new("vpc_id")),
        subnet_id: string_opt(config, &AttributePath::new("subnet_id")),
        ..Default::default()
    }
}

fn flatten_instance(instance: &DBInstance) -> Dynamic {
    let string = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(Dynamic::from);
    let number = |v: Option<i64>| v.map(Dynamic::from);

    object_value([
        ("instance_id", string(&instance.instance_id)),
        ("instance_name", string(&instance.instance_name)),
        ("project_id", number(instance.project_id)),
        ("region", string(&instance.region)),
        ("zone", string(&instance.zone)),
        ("vpc_id", string(&instance.unique_vpc_id)),
        ("subnet_id", string(&instance.unique_subnet_id)),
        ("status", number(instance.status)),
        ("vip", string(&instance.vip)),
        ("vport", number(instance.vport)),
        ("memory", number(instance.memory)),
        ("storage", number(instance.storage)),
        ("node_count", number(instance.node_count)),
        ("db_version_id", string(&instance.db_version_id)),
        ("create_time", string(&instance.create_time)),
    ])
}

#[async_trait]
impl DataSource for MariadbDbInstancesDataSource {
    fn type_name(&self) -> &str {
        "tencentcloud_mariadb_db_instances"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let mut fields: Vec<(&str, AttributeType)> = INSTANCE_STRINGS
            .iter()
            .map(|name| (*name, AttributeType::String))
            .collect();
        fields.extend(INSTANCE_NUMBERS.iter().map(|name| (*name, AttributeType::Number)));
        fields.push(("create_time", AttributeType::String));

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Lists MariaDB instances matching the given filters")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Hash of the returned instance ids")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("instance_ids", AttributeType::list_of(AttributeType::String))
                    .description("Only return these instances")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("search_name", AttributeType::String)
                    .description("Search field: instancename, vip or all")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("project_ids", AttributeType::list_of(AttributeType::Number))
                    .description("Only return instances in these projects")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vpc_id", AttributeType::String)
                    .description("Only return instances in this VPC")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("subnet_id", AttributeType::String)
                    .description("Only return instances in this subnet")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("instances", AttributeType::list_of(object_type(&fields)))
                    .description("Matching instances")
                    .computed()
                    .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let _elapsed = log_elapsed(&ctx, "data_source.tencentcloud_mariadb_db_instances.read");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                    deferred: None,
                };
            }
        };

        let filter = build_filter(&request.config);
        tracing::debug!(?filter, "listing MariaDB instances");
        let instances = match provider_data
            .client
            .mariadb()
            .instances()
            .list(&ctx, &filter)
            .await
        {
            Ok(instances) => instances,
            Err(e) => {
                diagnostics.push(api_error("Failed to list MariaDB instances", e));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                    deferred: None,
                };
            }
        };

        let ids: Vec<&str> = instances
            .iter()
            .filter_map(|i| i.instance_id.as_deref())
            .collect();
        let mut state = request.config;
        state.value.unknowns_to_null();
        let _ = state.set_string(&AttributePath::new("id"), ids_hash(&ids));
        let _ = state.set_list(
            &AttributePath::new("instances"),
            instances.iter().map(flatten_instance).collect(),
        );

        ReadDataSourceResponse {
            state,
            diagnostics,
            deferred: None,
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for MariadbDbInstancesDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];
        match downcast_provider_data(request.provider_data, "data source") {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }
        ConfigureDataSourceResponse { diagnostics }
    }
}

#[cfg(test)]
#[path = "./data_source_mariadb_db_instances_test.rs"]
mod data_source_mariadb_db_instances_test;
