//! MPS watermark template resource implementation

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
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
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedBlockBuilder, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{NumberBetween, StringOneOf};

use super::parse_numeric_id;
use crate::api::mps::watermark::{
    CreateWatermarkTemplateRequest, ImageWatermarkInput, ModifyWatermarkTemplateRequest,
    SvgWatermarkInput, TextWatermarkTemplateInput, WatermarkTemplate,
};
use crate::api::{ApiError, Client};
use crate::helper::{
    block_value, field_f64, field_string, log_elapsed, set_string_opt, single_block, string_opt,
};
use crate::resources::{api_error, downcast_provider_data, not_configured};
use crate::TencentCloudProviderData;

const WATERMARK_TYPES: [&str; 3] = ["image", "text", "svg"];

/// Top-level string arguments that can be changed in place.
const MUTABLE_STRINGS: [(&str, &str); 5] = [
    ("name", "Template name, at most 64 characters"),
    ("comment", "Template description, at most 256 characters"),
    (
        "coordinate_origin",
        "Origin position: TopLeft, TopRight, BottomLeft or BottomRight",
    ),
    ("x_pos", "Horizontal offset from the origin, in px or %"),
    ("y_pos", "Vertical offset from the origin, in px or %"),
];

#[derive(Default)]
pub struct MpsWatermarkTemplateResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl MpsWatermarkTemplateResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn optional_computed(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .computed()
        .build()
}

fn image_input(block: &Dynamic) -> ImageWatermarkInput {
    ImageWatermarkInput {
        image_content: field_string(block, "image_content"),
        width: field_string(block, "width"),
        height: field_string(block, "height"),
        repeat_type: field_string(block, "repeat_type"),
    }
}

fn text_input(block: &Dynamic) -> TextWatermarkTemplateInput {
    TextWatermarkTemplateInput {
        font_type: field_string(block, "font_type"),
        font_size: field_string(block, "font_size"),
        font_color: field_string(block, "font_color"),
        font_alpha: field_f64(block, "font_alpha"),
    }
}

fn svg_input(block: &Dynamic) -> SvgWatermarkInput {
    SvgWatermarkInput {
        width: field_string(block, "width"),
        height: field_string(block, "height"),
    }
}

fn build_create_request(config: &DynamicValue) -> Result<CreateWatermarkTemplateRequest, Diagnostic> {
    let watermark_type = string_opt(config, &AttributePath::new("type")).ok_or_else(|| {
        Diagnostic::error("Missing type", "The 'type' attribute is required")
            .with_attribute(AttributePath::new("type"))
    })?;

    let image_template = single_block(config, "image_template").map(image_input);
    if watermark_type == "image"
        && image_template
            .as_ref()
            .and_then(|t| t.image_content.as_ref())
            .is_none()
    {
        return Err(Diagnostic::error(
            "Missing image_template",
            "An `image_template` block with `image_content` is required for image watermarks",
        )
        .with_attribute(AttributePath::new("image_template")));
    }

    let field = |name: &str| string_opt(config, &AttributePath::new(name));
    Ok(CreateWatermarkTemplateRequest {
        watermark_type,
        name: field("name"),
        comment: field("comment"),
        coordinate_origin: field("coordinate_origin"),
        x_pos: field("x_pos"),
        y_pos: field("y_pos"),
        image_template,
        text_template: single_block(config, "text_template").map(text_input),
        svg_template: single_block(config, "svg_template").map(svg_input),
    })
}

/// Only the arguments that differ between `prior` and `config` are sent.
fn build_modify_request(
    definition: i64,
    prior: &DynamicValue,
    config: &DynamicValue,
) -> ModifyWatermarkTemplateRequest {
    let changed = |name: &str| {
        let path = AttributePath::new(name);
        string_opt(config, &path).filter(|new| string_opt(prior, &path).as_ref() != Some(new))
    };
    let block_changed = |name: &str| {
        single_block(config, name).filter(|new| single_block(prior, name) != Some(*new))
    };

    ModifyWatermarkTemplateRequest {
        definition,
        name: changed("name"),
        comment: changed("comment"),
        coordinate_origin: changed("coordinate_origin"),
        x_pos: changed("x_pos"),
        y_pos: changed("y_pos"),
        image_template: block_changed("image_template").map(image_input),
        text_template: block_changed("text_template").map(text_input),
        svg_template: block_changed("svg_template").map(svg_input),
    }
}

/// Refresh `state` from the API. `Ok(false)` when the template is gone.
async fn read_template(
    ctx: &Context,
    client: &Client,
    definition: i64,
    state: &mut DynamicValue,
) -> Result<bool, ApiError> {
    let Some(template) = client.mps().watermark_templates().get(ctx, definition).await? else {
        return Ok(false);
    };

    let image_content = match template
        .image_template
        .as_ref()
        .and_then(|t| t.image_url.as_deref())
    {
        Some(url) => Some(STANDARD.encode(client.download(url).await?)),
        None => None,
    };
    flatten_template(&template, image_content, state);
    Ok(true)
}

fn flatten_template(
    template: &WatermarkTemplate,
    image_content: Option<String>,
    state: &mut DynamicValue,
) {
    let _ = state.set_string(&AttributePath::new("id"), template.definition.to_string());
    set_string_opt(state, "type", template.watermark_type.as_deref());
    set_string_opt(state, "name", template.name.as_deref());
    set_string_opt(state, "comment", template.comment.as_deref());
    set_string_opt(state, "coordinate_origin", template.coordinate_origin.as_deref());
    set_string_opt(state, "x_pos", template.x_pos.as_deref());
    set_string_opt(state, "y_pos", template.y_pos.as_deref());
    set_string_opt(state, "create_time", template.create_time.as_deref());
    set_string_opt(state, "update_time", template.update_time.as_deref());

    let string = |v: &Option<String>| v.as_deref().map(Dynamic::from);

    let image = template.image_template.as_ref().map(|t| {
        block_value([
            ("image_content", image_content.map(Dynamic::from)),
            ("width", string(&t.width)),
            ("height", string(&t.height)),
            ("repeat_type", string(&t.repeat_type)),
        ])
    });
    let text = template.text_template.as_ref().map(|t| {
        block_value([
            ("font_type", string(&t.font_type)),
            ("font_size", string(&t.font_size)),
            ("font_color", string(&t.font_color)),
            ("font_alpha", t.font_alpha.map(Dynamic::Number)),
        ])
    });
    let svg = template.svg_template.as_ref().map(|t| {
        block_value([("width", string(&t.width)), ("height", string(&t.height))])
    });

    for (name, value) in [("image_template", image), ("text_template", text), ("svg_template", svg)] {
        let _ = state.set_value(
            &AttributePath::new(name),
            value.unwrap_or_else(|| Dynamic::List(vec![])),
        );
    }
}

#[async_trait]
impl Resource for MpsWatermarkTemplateResource {
    fn type_name(&self) -> &str {
        "tencentcloud_mps_watermark_template"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Provides an MPS watermark template")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Template definition")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Watermark type: image, text or svg")
                    .required()
                    .validator(StringOneOf::create(WATERMARK_TYPES))
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            );

        for (name, description) in MUTABLE_STRINGS {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .description(description)
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            );
        }
        for name in ["create_time", "update_time"] {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .computed()
                    .build(),
            );
        }

        let schema = builder
            .block(
                NestedBlockBuilder::single_list("image_template")
                    .description("Image watermark settings, required when type is image")
                    .attribute(
                        AttributeBuilder::new("image_content", AttributeType::String)
                            .description("Base64 encoded watermark image, jpeg or png")
                            .required()
                            .build(),
                    )
                    .attribute(optional_computed("width", "Watermark width, in px or %"))
                    .attribute(optional_computed("height", "Watermark height, in px or %"))
                    .attribute(optional_computed(
                        "repeat_type",
                        "Repeat mode: once, repeat_last_frame or repeat",
                    ))
                    .build(),
            )
            .block(
                NestedBlockBuilder::single_list("text_template")
                    .description("Text watermark settings, required when type is text")
                    .attribute(optional_computed("font_type", "Font file, e.g. arial.ttf"))
                    .attribute(optional_computed("font_size", "Font size, in px"))
                    .attribute(optional_computed("font_color", "Font color, e.g. 0xFFFFFF"))
                    .attribute(
                        AttributeBuilder::new("font_alpha", AttributeType::Number)
                            .description("Text opacity in (0, 1]")
                            .optional()
                            .computed()
                            .validator(NumberBetween::create(0.0, 1.0))
                            .build(),
                    )
                    .build(),
            )
            .block(
                NestedBlockBuilder::single_list("svg_template")
                    .description("SVG watermark settings, required when type is svg")
                    .attribute(optional_computed("width", "Watermark width, in px, W% or H%"))
                    .attribute(optional_computed("height", "Watermark height, in px, W% or H%"))
                    .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_watermark_template.create");
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

        let client = &provider_data.client;
        let definition = match client
            .mps()
            .watermark_templates()
            .create(&ctx, &create_request)
            .await
        {
            Ok(definition) => definition,
            Err(e) => {
                diagnostics.push(api_error("Failed to create watermark template", e));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };
        tracing::info!(definition, "created watermark template");

        let mut state = request.planned_state;
        let _ = state.set_string(&AttributePath::new("id"), definition.to_string());

        match read_template(&ctx, client, definition, &mut state).await {
            Ok(true) => {}
            Ok(false) => diagnostics.push(Diagnostic::error(
                "Watermark template not found after create",
                format!("Template {} disappeared right after it was created", definition),
            )),
            Err(e) => diagnostics.push(api_error("Failed to read watermark template", e)),
        }
        if !diagnostics.is_empty() {
            state.value.unknowns_to_null();
        }

        CreateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_watermark_template.read");
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

        let definition = match request
            .current_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| parse_numeric_id(&id))
        {
            Ok(definition) => definition,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                };
            }
        };

        let mut state = request.current_state.clone();
        match read_template(&ctx, &provider_data.client, definition, &mut state).await {
            Ok(true) => ReadResourceResponse {
                new_state: Some(state),
                diagnostics,
                private: request.private,
                deferred: None,
            },
            Ok(false) => {
                tracing::warn!(definition, "watermark template not found, removing from state");
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                    deferred: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read watermark template", e));
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
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_watermark_template.update");
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

        let definition = match request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| parse_numeric_id(&id))
        {
            Ok(definition) => definition,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let client = &provider_data.client;
        let modify = build_modify_request(definition, &request.prior_state, &request.config);
        if !modify.is_empty() {
            if let Err(e) = client.mps().watermark_templates().modify(&ctx, &modify).await {
                diagnostics.push(api_error("Failed to update watermark template", e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        }

        let mut state = request.planned_state;
        if let Err(e) = read_template(&ctx, client, definition, &mut state).await {
            diagnostics.push(api_error("Failed to read watermark template", e));
        }

        UpdateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_watermark_template.delete");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return DeleteResourceResponse { diagnostics };
            }
        };

        let definition = match request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| parse_numeric_id(&id))
        {
            Ok(definition) => definition,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        match provider_data
            .client
            .mps()
            .watermark_templates()
            .delete(&ctx, definition)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("Failed to delete watermark template", e)),
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for MpsWatermarkTemplateResource {
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
impl ResourceWithImportState for MpsWatermarkTemplateResource {
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
        if let Err(diag) = parse_numeric_id(&request.id) {
            response.diagnostics.push(diag);
            return response;
        }
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[cfg(test)]
#[path = "./resource_watermark_template_test.rs"]
mod resource_watermark_template_test;
