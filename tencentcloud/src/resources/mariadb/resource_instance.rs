//! MariaDB (TDSQL) instance resource implementation

use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, NestingMode, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use crate::api::mariadb::instance::{CreateDBInstanceRequest, DBInstance, DBParamValue};
use crate::api::tag::{build_resource_name, Tag};
use crate::api::{ApiError, Client};
use crate::helper::{
    diff_tags, i64_opt, immutable_args_changed, log_elapsed, set_i64_opt, set_string_opt,
    string_list, string_map, string_opt,
};
use crate::resources::{api_error, downcast_provider_data, not_configured};
use crate::TencentCloudProviderData;

const TAG_SERVICE: &str = "mariadb";
const TAG_RESOURCE_PREFIX: &str = "instance";

/// Arguments the API cannot change once the instance exists.
const IMMUTABLE_ARGS: &[&str] = &[
    "zones",
    "node_count",
    "memory",
    "storage",
    "vpc_id",
    "subnet_id",
    "project_id",
    "db_version_id",
    "security_group_ids",
    "auto_renew_flag",
    "ipv6_flag",
];

/// Computed-only string attributes, in API field order.
const COMPUTED_STRINGS: &[&str] = &[
    "instance_id",
    "region",
    "vip",
    "wan_domain",
    "wan_vip",
    "create_time",
    "update_time",
    "period_end_time",
    "uin",
    "tdsql_version",
    "excluster_id",
    "paymode",
    "status_desc",
    "machine",
    "vipv6",
    "wan_vipv6",
    "db_engine",
    "db_version",
];

const COMPUTED_NUMBERS: &[&str] = &[
    "app_id",
    "status",
    "vport",
    "wan_port",
    "is_tmp",
    "pid",
    "qps",
    "locker",
    "wan_status",
    "is_audit_supported",
    "is_encrypt_supported",
    "cpu",
    "wan_port_ipv6",
    "wan_status_ipv6",
    "dcn_flag",
    "dcn_status",
    "dcn_dst_num",
    "instance_type",
];

#[derive(Default)]
pub struct MariadbInstanceResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl MariadbInstanceResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for MariadbInstanceResource {
    fn type_name(&self) -> &str {
        "tencentcloud_mariadb_instance"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Provides a TDSQL for MariaDB instance")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("ID of the instance")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("zones", AttributeType::set_of(AttributeType::String))
                    .description("Availability zones of the instance nodes")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("node_count", AttributeType::Number)
                    .description("Number of nodes")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("memory", AttributeType::Number)
                    .description("Memory size in GB")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("storage", AttributeType::Number)
                    .description("Storage size in GB")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("period", AttributeType::Number)
                    .description("Purchase period in months")
                    .optional()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("auto_voucher", AttributeType::Bool)
                    .description("Whether to use vouchers automatically")
                    .optional()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("voucher_ids", AttributeType::set_of(AttributeType::String))
                    .description("Voucher IDs; only one voucher can be used at a time")
                    .optional()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("dcn_region", AttributeType::String)
                    .description("Region of the DCN source instance")
                    .optional()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("dcn_instance_id", AttributeType::String)
                    .description("ID of the DCN source instance")
                    .optional()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("instance_name", AttributeType::String)
                    .description("Name of the instance")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vpc_id", AttributeType::String)
                    .description("VPC ID, e.g. vpc-xxxx")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("subnet_id", AttributeType::String)
                    .description("Subnet ID, required when vpc_id is set")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("project_id", AttributeType::Number)
                    .description("Project ID")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("db_version_id", AttributeType::String)
                    .description("Database engine version: 10.0.10, 10.1.9 or 5.7.17")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("auto_renew_flag", AttributeType::Number)
                    .description("Renewal flag: 0 manual, 1 automatic, 2 no renewal")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ipv6_flag", AttributeType::Number)
                    .description("Whether IPv6 is supported: 0 no, 1 yes")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "security_group_ids",
                    AttributeType::set_of(AttributeType::String),
                )
                .description("Security groups bound at creation")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("tags", AttributeType::map_of(AttributeType::String))
                    .description("Tags of the instance")
                    .optional()
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("init_params", NestingMode::List)
                    .description("Parameters applied when the instance is initialized")
                    .attribute(
                        AttributeBuilder::new("param", AttributeType::String)
                            .description("Parameter name")
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("value", AttributeType::String)
                            .description("Parameter value")
                            .required()
                            .build(),
                    )
                    .requires_replace()
                    .build(),
            );

        for name in COMPUTED_STRINGS {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .computed()
                    .build(),
            );
        }
        for name in COMPUTED_NUMBERS {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::Number)
                    .computed()
                    .build(),
            );
        }

        ResourceSchemaResponse {
            schema: builder.build(),
            diagnostics: vec![],
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_instance.create");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };
        let client = &provider_data.client;

        let create_request = match build_create_request(&request.config) {
            Ok(create_request) => create_request,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let mut state = request.planned_state;

        let instance_id = match client.mariadb().instances().create(&ctx, &create_request).await {
            Ok(id) => id,
            Err(e) => {
                diagnostics.push(api_error("Failed to create MariaDB instance", e));
                return CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                };
            }
        };
        tracing::info!(instance_id = %instance_id, "MariaDB instance created");

        let _ = state.set_string(&AttributePath::new("id"), instance_id.clone());
        let _ = state.set_string(&AttributePath::new("instance_id"), instance_id.clone());

        let wait_timeout = client.retry_config().read_timeout * 7;
        if let Err(e) = client
            .mariadb()
            .instances()
            .wait_running(&ctx, &instance_id, wait_timeout)
            .await
        {
            diagnostics.push(api_error("MariaDB instance did not become ready", e));
            state.value.unknowns_to_null();
            return CreateResourceResponse {
                new_state: state,
                private: vec![],
                diagnostics,
            };
        }

        let tags = string_map(&state, &AttributePath::new("tags"));
        if !tags.is_empty() {
            let resource_name =
                build_resource_name(TAG_SERVICE, TAG_RESOURCE_PREFIX, client.region(), &instance_id);
            if let Err(e) = client
                .tag()
                .modify_tags(&ctx, &resource_name, &tags, &[])
                .await
            {
                diagnostics.push(api_error("Failed to tag MariaDB instance", e));
                state.value.unknowns_to_null();
                return CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                };
            }
        }

        match read_instance(&ctx, client, &instance_id, &mut state).await {
            Ok(true) => {}
            Ok(false) => {
                diagnostics.push(Diagnostic::error(
                    "MariaDB instance disappeared",
                    format!("instance {} was not found right after creation", instance_id),
                ));
                state.value.unknowns_to_null();
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read MariaDB instance", e));
                state.value.unknowns_to_null();
            }
        }

        CreateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_instance.read");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                };
            }
        };

        let instance_id = match request.current_state.get_string(&AttributePath::new("id")) {
            Ok(id) => id,
            Err(_) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                    deferred: None,
                };
            }
        };

        let mut state = request.current_state.clone();
        match read_instance(&ctx, &provider_data.client, &instance_id, &mut state).await {
            Ok(true) => ReadResourceResponse {
                new_state: Some(state),
                diagnostics,
                private: request.private,
                deferred: None,
            },
            Ok(false) => {
                tracing::warn!(instance_id = %instance_id, "MariaDB instance not found, removing from state");
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                    deferred: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read MariaDB instance", e));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_instance.update");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };
        let client = &provider_data.client;

        let changed = immutable_args_changed(&request.prior_state, &request.planned_state, IMMUTABLE_ARGS);
        if !changed.is_empty() {
            return UpdateResourceResponse {
                new_state: request.prior_state,
                private: vec![],
                diagnostics: changed,
            };
        }

        let instance_id = match request.prior_state.get_string(&AttributePath::new("id")) {
            Ok(id) => id,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Missing instance ID", e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let name_path = AttributePath::new("instance_name");
        let old_name = string_opt(&request.prior_state, &name_path);
        let new_name = string_opt(&request.config, &name_path);
        if let Some(name) = new_name.filter(|n| Some(n) != old_name.as_ref()) {
            if let Err(e) = client
                .mariadb()
                .instances()
                .modify_name(&ctx, &instance_id, &name)
                .await
            {
                diagnostics.push(api_error("Failed to rename MariaDB instance", e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        }

        let tags_path = AttributePath::new("tags");
        let (replace, delete) = diff_tags(
            &string_map(&request.prior_state, &tags_path),
            &string_map(&request.planned_state, &tags_path),
        );
        let resource_name =
            build_resource_name(TAG_SERVICE, TAG_RESOURCE_PREFIX, client.region(), &instance_id);
        if let Err(e) = client
            .tag()
            .modify_tags(&ctx, &resource_name, &replace, &delete)
            .await
        {
            diagnostics.push(api_error("Failed to update MariaDB instance tags", e));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                private: vec![],
                diagnostics,
            };
        }

        let mut state = request.planned_state;
        if let Err(e) = read_instance(&ctx, client, &instance_id, &mut state).await {
            diagnostics.push(api_error("Failed to read MariaDB instance", e));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                private: vec![],
                diagnostics,
            };
        }

        UpdateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_instance.delete");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return DeleteResourceResponse { diagnostics };
            }
        };
        let client = &provider_data.client;

        let instance_id = match request.prior_state.get_string(&AttributePath::new("id")) {
            Ok(id) => id,
            Err(_) => return DeleteResourceResponse { diagnostics },
        };

        let instances = client.mariadb().instances();
        let wait_timeout = client.retry_config().read_timeout * 2;

        if let Err(e) = instances.isolate(&ctx, &instance_id).await {
            if !e.is_not_found() {
                diagnostics.push(api_error("Failed to isolate MariaDB instance", e));
                return DeleteResourceResponse { diagnostics };
            }
        }

        if let Err(e) = instances.wait_isolated(&ctx, &instance_id, wait_timeout).await {
            diagnostics.push(api_error("MariaDB instance was not isolated", e));
            return DeleteResourceResponse { diagnostics };
        }

        match instances.destroy(&ctx, &instance_id).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return DeleteResourceResponse { diagnostics },
            Err(e) => {
                diagnostics.push(api_error("Failed to destroy MariaDB instance", e));
                return DeleteResourceResponse { diagnostics };
            }
        }

        if let Err(e) = instances.wait_destroyed(&ctx, &instance_id, wait_timeout).await {
            diagnostics.push(api_error("MariaDB instance was not destroyed", e));
        }

        DeleteResourceResponse { diagnostics }
    }
}

fn build_create_request(config: &DynamicValue) -> Result<CreateDBInstanceRequest, Diagnostic> {
    let required = |name: &str| {
        config.get_i64(&AttributePath::new(name)).map_err(|_| {
            Diagnostic::error(
                format!("Missing {}", name),
                format!("The '{}' attribute is required", name),
            )
            .with_attribute(AttributePath::new(name))
        })
    };

    let zones = string_list(config, &AttributePath::new("zones"));
    if zones.is_empty() {
        return Err(
            Diagnostic::error("Missing zones", "At least one zone is required")
                .with_attribute(AttributePath::new("zones")),
        );
    }

    let init_params = config
        .get_list(&AttributePath::new("init_params"))
        .unwrap_or_default()
        .iter()
        .filter_map(|item| {
            Some(DBParamValue {
                param: item.get("param")?.as_str()?.to_string(),
                value: item.get("value")?.as_str()?.to_string(),
            })
        })
        .collect::<Vec<_>>();

    let voucher_ids = string_list(config, &AttributePath::new("voucher_ids"));
    let security_group_ids = string_list(config, &AttributePath::new("security_group_ids"));
    let mut resource_tags: Vec<Tag> = string_map(config, &AttributePath::new("tags"))
        .into_iter()
        .map(|(tag_key, tag_value)| Tag { tag_key, tag_value })
        .collect();
    resource_tags.sort_by(|a, b| a.tag_key.cmp(&b.tag_key));

    Ok(CreateDBInstanceRequest {
        zones,
        node_count: required("node_count")?,
        memory: required("memory")?,
        storage: required("storage")?,
        period: i64_opt(config, &AttributePath::new("period")),
        count: Some(1),
        auto_voucher: config
            .get_bool_opt(&AttributePath::new("auto_voucher"))
            .ok()
            .flatten(),
        voucher_ids: (!voucher_ids.is_empty()).then_some(voucher_ids),
        vpc_id: string_opt(config, &AttributePath::new("vpc_id")),
        subnet_id: string_opt(config, &AttributePath::new("subnet_id")),
        project_id: i64_opt(config, &AttributePath::new("project_id")),
        db_version_id: string_opt(config, &AttributePath::new("db_version_id")),
        instance_name: string_opt(config, &AttributePath::new("instance_name")),
        security_group_ids: (!security_group_ids.is_empty()).then_some(security_group_ids),
        auto_renew_flag: i64_opt(config, &AttributePath::new("auto_renew_flag")),
        ipv6_flag: i64_opt(config, &AttributePath::new("ipv6_flag")),
        resource_tags: (!resource_tags.is_empty()).then_some(resource_tags),
        init_params: (!init_params.is_empty()).then_some(init_params),
        dcn_region: string_opt(config, &AttributePath::new("dcn_region")),
        dcn_instance_id: string_opt(config, &AttributePath::new("dcn_instance_id")),
    })
}

/// Refresh `state` from the API. `Ok(false)` when the instance is gone.
async fn read_instance(
    ctx: &Context,
    client: &Client,
    instance_id: &str,
    state: &mut DynamicValue,
) -> Result<bool, ApiError> {
    let Some(instance) = client.mariadb().instances().get(ctx, instance_id).await? else {
        return Ok(false);
    };

    let tags = client
        .tag()
        .describe_resource_tags(ctx, TAG_SERVICE, TAG_RESOURCE_PREFIX, client.region(), instance_id)
        .await?;

    flatten_instance(state, instance_id, &instance, tags);
    Ok(true)
}

fn flatten_instance(
    state: &mut DynamicValue,
    instance_id: &str,
    instance: &DBInstance,
    tags: HashMap<String, String>,
) {
    let _ = state.set_string(&AttributePath::new("id"), instance_id);

    let zones = string_list(state, &AttributePath::new("zones"));
    if zones.is_empty() {
        if let Some(zone) = &instance.zone {
            let _ = state.set_value(&AttributePath::new("zones"), Dynamic::string_list([zone.as_str()]));
        }
    }

    set_i64_opt(state, "node_count", instance.node_count);
    set_i64_opt(state, "memory", instance.memory);
    set_i64_opt(state, "storage", instance.storage);
    set_string_opt(state, "instance_name", instance.instance_name.as_deref());
    set_string_opt(state, "vpc_id", instance.unique_vpc_id.as_deref());
    set_string_opt(state, "subnet_id", instance.unique_subnet_id.as_deref());
    set_i64_opt(state, "project_id", instance.project_id);
    set_string_opt(state, "db_version_id", instance.db_version_id.as_deref());
    set_i64_opt(state, "auto_renew_flag", instance.auto_renew_flag);
    set_i64_opt(state, "ipv6_flag", instance.ipv6_flag);

    set_string_opt(state, "instance_id", instance.instance_id.as_deref());
    set_string_opt(state, "region", instance.region.as_deref());
    set_string_opt(state, "vip", instance.vip.as_deref());
    set_string_opt(state, "wan_domain", instance.wan_domain.as_deref());
    set_string_opt(state, "wan_vip", instance.wan_vip.as_deref());
    set_string_opt(state, "create_time", instance.create_time.as_deref());
    set_string_opt(state, "update_time", instance.update_time.as_deref());
    set_string_opt(state, "period_end_time", instance.period_end_time.as_deref());
    set_string_opt(state, "uin", instance.uin.as_deref());
    set_string_opt(state, "tdsql_version", instance.tdsql_version.as_deref());
    set_string_opt(state, "excluster_id", instance.excluster_id.as_deref());
    set_string_opt(state, "paymode", instance.paymode.as_deref());
    set_string_opt(state, "status_desc", instance.status_desc.as_deref());
    set_string_opt(state, "machine", instance.machine.as_deref());
    set_string_opt(state, "vipv6", instance.vipv6.as_deref());
    set_string_opt(state, "wan_vipv6", instance.wan_vipv6.as_deref());
    set_string_opt(state, "db_engine", instance.db_engine.as_deref());
    set_string_opt(state, "db_version", instance.db_version.as_deref());

    set_i64_opt(state, "app_id", instance.app_id);
    set_i64_opt(state, "status", instance.status);
    set_i64_opt(state, "vport", instance.vport);
    set_i64_opt(state, "wan_port", instance.wan_port);
    set_i64_opt(state, "is_tmp", instance.is_tmp);
    set_i64_opt(state, "pid", instance.pid);
    set_i64_opt(state, "qps", instance.qps);
    set_i64_opt(state, "locker", instance.locker);
    set_i64_opt(state, "wan_status", instance.wan_status);
    set_i64_opt(state, "is_audit_supported", instance.is_audit_supported);
    set_i64_opt(state, "is_encrypt_supported", instance.is_encrypt_supported);
    set_i64_opt(state, "cpu", instance.cpu);
    set_i64_opt(state, "wan_port_ipv6", instance.wan_port_ipv6);
    set_i64_opt(state, "wan_status_ipv6", instance.wan_status_ipv6);
    set_i64_opt(state, "dcn_flag", instance.dcn_flag);
    set_i64_opt(state, "dcn_status", instance.dcn_status);
    set_i64_opt(state, "dcn_dst_num", instance.dcn_dst_num);
    set_i64_opt(state, "instance_type", instance.instance_type);

    // Keep an unset tags argument unset when the instance has no tags
    let tags_path = AttributePath::new("tags");
    if !tags.is_empty() || state.get_map(&tags_path).is_ok() {
        let _ = state.set_value(&tags_path, Dynamic::string_map(tags));
    }
}

#[async_trait]
impl ResourceWithConfigure for MariadbInstanceResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];
        match downcast_provider_data(request.provider_data, "resource") {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }
        ConfigureResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithImportState for MariadbInstanceResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
            deferred: None,
        };
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[cfg(test)]
#[path = "./resource_instance_test.rs"]
mod resource_instance_test;
