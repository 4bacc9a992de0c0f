//! MPS transcode template list data source

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
use crate::api::mps::transcode::{DescribeTranscodeTemplatesRequest, TranscodeTemplate};
use crate::helper::{log_elapsed, string_opt};
use crate::resources::{api_error, downcast_provider_data, not_configured};
use crate::TencentCloudProviderData;

#[derive(Default)]
pub struct MpsTranscodeTemplatesDataSource {
    provider_data: Option<TencentCloudProviderData>,
}

impl MpsTranscodeTemplatesDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn build_filter(config: &DynamicValue) -> DescribeTranscodeTemplatesRequest {
    DescribeTranscodeTemplatesRequest {
        definitions: number_list(config, "definitions"),
        template_type: string_opt(config, &AttributePath::new("type")),
        container_type: string_opt(config, &AttributePath::new("container_type")),
        tehd_type: string_opt(config, &AttributePath::new("tehd_type")),
        transcode_type: string_opt(config, &AttributePath::new("transcode_type")),
        ..Default::default()
    }
}

fn flatten_template(template: &TranscodeTemplate) -> Dynamic {
    let string = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(Dynamic::from);

    object_value([
        ("definition", Some(Dynamic::from(template.definition))),
        ("container", string(&template.container)),
        ("name", string(&template.name)),
        ("comment", string(&template.comment)),
        ("type", string(&template.template_type)),
        ("remove_video", template.remove_video.map(Dynamic::from)),
        ("remove_audio", template.remove_audio.map(Dynamic::from)),
        ("container_type", string(&template.container_type)),
        ("create_time", string(&template.create_time)),
        ("update_time", string(&template.update_time)),
    ])
}

fn optional_string(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
}

#[async_trait]
impl DataSource for MpsTranscodeTemplatesDataSource {
    fn type_name(&self) -> &str {
        "tencentcloud_mps_transcode_templates"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let template = object_type(&[
            ("definition", AttributeType::Number),
            ("container", AttributeType::String),
            ("name", AttributeType::String),
            ("comment", AttributeType::String),
            ("type", AttributeType::String),
            ("remove_video", AttributeType::Number),
            ("remove_audio", AttributeType::Number),
            ("container_type", AttributeType::String),
            ("create_time", AttributeType::String),
            ("update_time", AttributeType::String),
        ]);

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Lists MPS transcode templates matching the given filters")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Hash of the returned template definitions")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("definitions", AttributeType::list_of(AttributeType::Number))
                    .description("Only return these template IDs")
                    .optional()
                    .build(),
            )
            .attribute(
                optional_string("type", "Template source: Preset or Custom")
                    .validator(StringOneOf::create(["Preset", "Custom"]))
                    .build(),
            )
            .attribute(
                optional_string("container_type", "Container kind: Video, PureAudio or All")
                    .validator(StringOneOf::create(["Video", "PureAudio", "All"]))
                    .build(),
            )
            .attribute(
                optional_string("tehd_type", "TESHD type: Common, TEHD or TEHD-100")
                    .build(),
            )
            .attribute(
                optional_string("transcode_type", "Transcode kind: Common, Enhance or *")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("transcode_template_set", AttributeType::list_of(template))
                    .description("Matching transcode templates")
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
        let _elapsed = log_elapsed(&ctx, "data_source.tencentcloud_mps_transcode_templates.read");
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
        let templates = match provider_data
            .client
            .mps()
            .transcode_templates()
            .list(&ctx, &filter)
            .await
        {
            Ok(templates) => templates,
            Err(e) => {
                diagnostics.push(api_error("Failed to list MPS transcode templates", e));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                    deferred: None,
                };
            }
        };
        tracing::debug!(count = templates.len(), "listed MPS transcode templates");

        let ids: Vec<String> = templates.iter().map(|t| t.definition.to_string()).collect();
        let mut state = request.config;
        state.value.unknowns_to_null();
        let _ = state.set_string(&AttributePath::new("id"), ids_hash(&ids));
        let _ = state.set_list(
            &AttributePath::new("transcode_template_set"),
            templates.iter().map(flatten_template).collect(),
        );

        ReadDataSourceResponse {
            state,
            diagnostics,
            deferred: None,
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for MpsTranscodeTemplatesDataSource {
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
#[path = "./data_source_mps_transcode_templates_test.rs"]
mod data_source_mps_transcode_templates_test;
