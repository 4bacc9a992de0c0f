//! MPS workflow list data source

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};
use tfplug::validator::StringOneOf;

use super::{ids_hash, number_list, object_type, object_value};
use crate::api::mps::workflow::{DescribeWorkflowsRequest, WorkflowInfo};
use crate::helper::{log_elapsed, string_opt};
use crate::resources::{api_error, downcast_provider_data, not_configured};
use crate::TencentCloudProviderData;

#[derive(Default)]
pub struct MpsWorkflowsDataSource {
    provider_data: Option<TencentCloudProviderData>,
}

impl MpsWorkflowsDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn build_filter(config: &DynamicValue) -> DescribeWorkflowsRequest {
    DescribeWorkflowsRequest {
        workflow_ids: number_list(config, "workflow_ids"),
        status: string_opt(config, &AttributePath::new("status")),
        ..Default::default()
    }
}

fn workflow_type() -> AttributeType {
    let cos_trigger = object_type(&[
        ("bucket", AttributeType::String),
        ("region", AttributeType::String),
        ("dir", AttributeType::String),
        ("formats", AttributeType::list_of(AttributeType::String)),
    ]);
    let trigger = object_type(&[
        ("type", AttributeType::String),
        ("cos_file_upload_trigger", AttributeType::list_of(cos_trigger)),
    ]);
    let cos_output = object_type(&[
        ("bucket", AttributeType::String),
        ("region", AttributeType::String),
    ]);
    let output_storage = object_type(&[
        ("type", AttributeType::String),
        ("cos_output_storage", AttributeType::list_of(cos_output)),
    ]);

    object_type(&[
        ("workflow_id", AttributeType::Number),
        ("workflow_name", AttributeType::String),
        ("status", AttributeType::String),
        ("trigger", AttributeType::list_of(trigger)),
        ("output_storage", AttributeType::list_of(output_storage)),
        ("output_dir", AttributeType::String),
        ("task_priority", AttributeType::Number),
        ("create_time", AttributeType::String),
        ("update_time", AttributeType::String),
    ])
}

fn flatten_workflow(workflow: &WorkflowInfo) -> Dynamic {
    let string = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(Dynamic::from);
    let single = |value: Option<Dynamic>| Dynamic::List(value.into_iter().collect());

    let trigger = workflow.trigger.as_ref().map(|t| {
        let cos = t.cos_file_upload_trigger.as_ref().map(|cos| {
            object_value([
                ("bucket", Some(Dynamic::from(cos.bucket.as_str()))),
                ("region", Some(Dynamic::from(cos.region.as_str()))),
                ("dir", string(&cos.dir)),
                (
                    "formats",
                    Some(Dynamic::string_list(
                        cos.formats.iter().flatten().map(String::as_str),
                    )),
                ),
            ])
        });
        object_value([
            ("type", Some(Dynamic::from(t.trigger_type.as_str()))),
            ("cos_file_upload_trigger", Some(single(cos))),
        ])
    });
    let output_storage = workflow.output_storage.as_ref().map(|o| {
        let cos = o.cos_output_storage.as_ref().map(|cos| {
            object_value([("bucket", string(&cos.bucket)), ("region", string(&cos.region))])
        });
        object_value([
            ("type", Some(Dynamic::from(o.storage_type.as_str()))),
            ("cos_output_storage", Some(single(cos))),
        ])
    });

    object_value([
        ("workflow_id", Some(Dynamic::from(workflow.workflow_id))),
        ("workflow_name", Some(Dynamic::from(workflow.workflow_name.as_str()))),
        ("status", string(&workflow.status)),
        ("trigger", Some(single(trigger))),
        ("output_storage", Some(single(output_storage))),
        ("output_dir", string(&workflow.output_dir)),
        ("task_priority", workflow.task_priority.map(Dynamic::from)),
        ("create_time", string(&workflow.create_time)),
        ("update_time", string(&workflow.update_time)),
    ])
}

#[async_trait]
impl DataSource for MpsWorkflowsDataSource {
    fn type_name(&self) -> &str {
        "tencentcloud_mps_workflows"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Lists MPS workflows matching the given filters")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Hash of the returned workflow IDs")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workflow_ids", AttributeType::list_of(AttributeType::Number))
                    .description("Only return these workflows, at most 100")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::String)
                    .description("Workflow state: Enabled or Disabled")
                    .optional()
                    .validator(StringOneOf::create(["Enabled", "Disabled"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("total_count", AttributeType::Number)
                    .description("Number of matching workflows")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workflow_info_set", AttributeType::list_of(workflow_type()))
                    .description("Matching workflows")
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
        let _elapsed = log_elapsed(&ctx, "data_source.tencentcloud_mps_workflows.read");
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
        let workflows = match provider_data.client.mps().workflows().list(&ctx, &filter).await {
            Ok(workflows) => workflows,
            Err(e) => {
                diagnostics.push(api_error("Failed to list MPS workflows", e));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                    deferred: None,
                };
            }
        };
        tracing::debug!(count = workflows.len(), "listed MPS workflows");

        let ids: Vec<String> = workflows.iter().map(|w| w.workflow_id.to_string()).collect();
        let mut state = request.config;
        state.value.unknowns_to_null();
        let _ = state.set_string(&AttributePath::new("id"), ids_hash(&ids));
        let _ = state.set_i64(&AttributePath::new("total_count"), workflows.len() as i64);
        let _ = state.set_list(
            &AttributePath::new("workflow_info_set"),
            workflows.iter().map(flatten_workflow).collect(),
        );

        ReadDataSourceResponse {
            state,
            diagnostics,
            deferred: None,
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for MpsWorkflowsDataSource {
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
#[path = "./data_source_mps_workflows_test.rs"]
mod data_source_mps_workflows_test;
