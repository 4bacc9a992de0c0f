//! MPS transcode template resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfplug::schema::{
    Attribute, AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, SchemaBuilder,
};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{NumberBetween, StringOneOf};

use super::parse_numeric_id;
use crate::api::mps::transcode::{
    AudioTemplateInfo, CreateTranscodeTemplateRequest, EnhanceConfig, EnhanceItem,
    ModifyTranscodeTemplateRequest, TehdConfig, TranscodeTemplate, VideoEnhanceConfig,
    VideoTemplateInfo,
};
use crate::api::{ApiError, Client};
use crate::helper::{
    block_value, field_block, field_f64, field_i64, field_string, i64_opt, log_elapsed,
    set_i64_opt, set_string_opt, single_block, string_opt,
};
use crate::resources::{api_error, downcast_provider_data, not_configured};
use crate::TencentCloudProviderData;

#[derive(Default)]
pub struct MpsTranscodeTemplateResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl MpsTranscodeTemplateResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn string_attr(name: &str, description: &str, required: bool) -> Attribute {
    let builder = AttributeBuilder::new(name, AttributeType::String).description(description);
    if required {
        builder.required().build()
    } else {
        builder.optional().computed().build()
    }
}

fn number_attr(name: &str, description: &str, required: bool) -> Attribute {
    let builder = AttributeBuilder::new(name, AttributeType::Number).description(description);
    if required {
        builder.required().build()
    } else {
        builder.optional().computed().build()
    }
}

fn video_input(block: &Dynamic) -> VideoTemplateInfo {
    VideoTemplateInfo {
        codec: field_string(block, "codec"),
        fps: field_i64(block, "fps"),
        bitrate: field_i64(block, "bitrate"),
        resolution_adaptive: field_string(block, "resolution_adaptive"),
        width: field_i64(block, "width"),
        height: field_i64(block, "height"),
        gop: field_i64(block, "gop"),
        fill_type: field_string(block, "fill_type"),
        vcrf: field_i64(block, "vcrf"),
    }
}

fn audio_input(block: &Dynamic) -> AudioTemplateInfo {
    AudioTemplateInfo {
        codec: field_string(block, "codec"),
        bitrate: field_i64(block, "bitrate"),
        sample_rate: field_i64(block, "sample_rate"),
        audio_channel: field_i64(block, "audio_channel"),
    }
}

fn tehd_input(block: &Dynamic) -> TehdConfig {
    TehdConfig {
        tehd_type: field_string(block, "type"),
        max_video_bitrate: field_i64(block, "max_video_bitrate"),
    }
}

/// Video enhancement capabilities and the fields each one takes besides
/// `switch`.
const VIDEO_ENHANCEMENTS: &[(&str, &str, &[&str])] = &[
    ("frame_rate", "Frame interpolation", &["fps"]),
    ("super_resolution", "Super resolution", &["type", "size"]),
    ("hdr", "HDR", &["type"]),
    ("denoise", "Video denoising", &["type"]),
    ("image_quality_enhance", "Overall image enhancement", &["type"]),
    ("color_enhance", "Color enhancement", &["type"]),
    ("sharp_enhance", "Detail enhancement", &["intensity"]),
    ("face_enhance", "Face enhancement", &["intensity"]),
    ("low_light_enhance", "Low light enhancement", &["type"]),
    ("scratch_repair", "Scratch removal", &["intensity"]),
    ("artifact_repair", "Artifact removal", &["type"]),
];

fn enhance_fields(name: &str) -> &'static [&'static str] {
    VIDEO_ENHANCEMENTS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, _, fields)| *fields)
        .unwrap_or(&[])
}

fn enhance_input(block: &Dynamic) -> EnhanceConfig {
    let video_enhance = field_block(block, "video_enhance").map(|video| {
        let mut config = VideoEnhanceConfig::default();
        for (name, slot) in config.items_mut() {
            *slot = field_block(video, name).map(|item| EnhanceItem {
                switch: field_string(item, "switch"),
                item_type: field_string(item, "type"),
                intensity: field_f64(item, "intensity"),
                fps: field_i64(item, "fps"),
                size: field_i64(item, "size"),
            });
        }
        config
    });
    EnhanceConfig { video_enhance }
}

fn flatten_enhance(config: &EnhanceConfig) -> Option<Dynamic> {
    let video = config.video_enhance.as_ref()?;
    let items = video.items().map(|(name, item)| {
        let value = item.as_ref().map(|item| {
            let mut fields = vec![("switch", item.switch.as_deref().map(Dynamic::from))];
            for field in enhance_fields(name) {
                let value = match *field {
                    "type" => item.item_type.as_deref().map(Dynamic::from),
                    "intensity" => item.intensity.map(Dynamic::from),
                    "fps" => item.fps.map(Dynamic::from),
                    "size" => item.size.map(Dynamic::from),
                    _ => None,
                };
                fields.push((*field, value));
            }
            block_value(fields)
        });
        (name, Some(value.unwrap_or_else(|| Dynamic::List(vec![]))))
    });
    Some(block_value([("video_enhance", Some(block_value(items)))]))
}

fn enhance_config_block() -> NestedBlock {
    let mut video = NestedBlockBuilder::single_list("video_enhance")
        .description("Video enhancement capabilities");
    for (name, description, fields) in VIDEO_ENHANCEMENTS {
        let mut item = NestedBlockBuilder::single_list(name)
            .description(description)
            .attribute(
                AttributeBuilder::new("switch", AttributeType::String)
                    .description("ON or OFF")
                    .optional()
                    .validator(StringOneOf::create(["ON", "OFF"]))
                    .build(),
            );
        for field in fields.iter() {
            let (kind, description) = match *field {
                "type" => (AttributeType::String, "Capability variant"),
                "intensity" => (AttributeType::Number, "Strength between 0.0 and 1.0"),
                "fps" => (AttributeType::Number, "Target frame rate"),
                _ => (AttributeType::Number, "Upscale factor"),
            };
            item = item.attribute(
                AttributeBuilder::new(field, kind)
                    .description(description)
                    .optional()
                    .build(),
            );
        }
        video = video.block(item.build());
    }

    NestedBlockBuilder::single_list("enhance_config")
        .description("Audio and video enhancement")
        .block(video.build())
        .build()
}

fn build_create_request(config: &DynamicValue) -> Result<CreateTranscodeTemplateRequest, Diagnostic> {
    let container = string_opt(config, &AttributePath::new("container")).ok_or_else(|| {
        Diagnostic::error("Missing container", "The 'container' attribute is required")
            .with_attribute(AttributePath::new("container"))
    })?;

    Ok(CreateTranscodeTemplateRequest {
        container,
        name: string_opt(config, &AttributePath::new("name")),
        comment: string_opt(config, &AttributePath::new("comment")),
        remove_video: i64_opt(config, &AttributePath::new("remove_video")),
        remove_audio: i64_opt(config, &AttributePath::new("remove_audio")),
        video_template: single_block(config, "video_template").map(video_input),
        audio_template: single_block(config, "audio_template").map(audio_input),
        tehd_config: single_block(config, "tehd_config").map(tehd_input),
        enhance_config: single_block(config, "enhance_config").map(enhance_input),
    })
}

fn build_modify_request(
    definition: i64,
    prior: &DynamicValue,
    config: &DynamicValue,
) -> ModifyTranscodeTemplateRequest {
    let string_changed = |name: &str| {
        let path = AttributePath::new(name);
        string_opt(config, &path).filter(|new| string_opt(prior, &path).as_ref() != Some(new))
    };
    let number_changed = |name: &str| {
        let path = AttributePath::new(name);
        i64_opt(config, &path).filter(|new| i64_opt(prior, &path) != Some(*new))
    };
    let block_changed = |name: &str| {
        single_block(config, name).filter(|new| single_block(prior, name) != Some(*new))
    };

    ModifyTranscodeTemplateRequest {
        definition,
        container: string_changed("container"),
        name: string_changed("name"),
        comment: string_changed("comment"),
        remove_video: number_changed("remove_video"),
        remove_audio: number_changed("remove_audio"),
        video_template: block_changed("video_template").map(video_input),
        audio_template: block_changed("audio_template").map(audio_input),
        tehd_config: block_changed("tehd_config").map(tehd_input),
        enhance_config: block_changed("enhance_config").map(enhance_input),
    }
}

async fn read_template(
    ctx: &Context,
    client: &Client,
    definition: i64,
    state: &mut DynamicValue,
) -> Result<bool, ApiError> {
    match client.mps().transcode_templates().get(ctx, definition).await? {
        Some(template) => {
            flatten_template(&template, state);
            Ok(true)
        }
        None => Ok(false),
    }
}

fn flatten_template(template: &TranscodeTemplate, state: &mut DynamicValue) {
    let _ = state.set_string(&AttributePath::new("id"), template.definition.to_string());
    set_string_opt(state, "container", template.container.as_deref());
    set_string_opt(state, "name", template.name.as_deref());
    set_string_opt(state, "comment", template.comment.as_deref());
    set_i64_opt(state, "remove_video", template.remove_video);
    set_i64_opt(state, "remove_audio", template.remove_audio);
    set_string_opt(state, "type", template.template_type.as_deref());
    set_string_opt(state, "create_time", template.create_time.as_deref());
    set_string_opt(state, "update_time", template.update_time.as_deref());

    let string = |v: &Option<String>| v.as_deref().map(Dynamic::from);
    let number = |v: Option<i64>| v.map(Dynamic::from);

    let video = template.video_template.as_ref().map(|v| {
        block_value([
            ("codec", string(&v.codec)),
            ("fps", number(v.fps)),
            ("bitrate", number(v.bitrate)),
            ("resolution_adaptive", string(&v.resolution_adaptive)),
            ("width", number(v.width)),
            ("height", number(v.height)),
            ("gop", number(v.gop)),
            ("fill_type", string(&v.fill_type)),
            ("vcrf", number(v.vcrf)),
        ])
    });
    let audio = template.audio_template.as_ref().map(|a| {
        block_value([
            ("codec", string(&a.codec)),
            ("bitrate", number(a.bitrate)),
            ("sample_rate", number(a.sample_rate)),
            ("audio_channel", number(a.audio_channel)),
        ])
    });
    // The API reports TEHD as type "None" when it is off.
    let tehd = template
        .tehd_config
        .as_ref()
        .filter(|t| t.tehd_type.as_deref().is_some_and(|kind| kind != "None"))
        .map(|t| {
            block_value([
                ("type", string(&t.tehd_type)),
                ("max_video_bitrate", number(t.max_video_bitrate)),
            ])
        });

    for (name, value) in [
        ("video_template", video),
        ("audio_template", audio),
        ("tehd_config", tehd),
        (
            "enhance_config",
            template.enhance_config.as_ref().and_then(flatten_enhance),
        ),
    ] {
        let _ = state.set_value(
            &AttributePath::new(name),
            value.unwrap_or_else(|| Dynamic::List(vec![])),
        );
    }
}

#[async_trait]
impl Resource for MpsTranscodeTemplateResource {
    fn type_name(&self) -> &str {
        "tencentcloud_mps_transcode_template"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Provides an MPS transcode template")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Template definition")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("container", AttributeType::String)
                    .description("Container format, e.g. mp4, flv, hls, mp3, flac, ogg, m4a")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Template name, at most 64 characters")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("comment", AttributeType::String)
                    .description("Template description, at most 256 characters")
                    .optional()
                    .build(),
            );

        for (name, description) in [
            ("remove_video", "Whether to drop the video stream: 0 keep, 1 remove"),
            ("remove_audio", "Whether to drop the audio stream: 0 keep, 1 remove"),
        ] {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::Number)
                    .description(description)
                    .optional()
                    .computed()
                    .validator(NumberBetween::create(0.0, 1.0))
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            );
        }
        for (name, description) in [
            ("type", "Template type, Preset or Custom"),
            ("create_time", "Creation time in ISO 8601"),
            ("update_time", "Last modification time in ISO 8601"),
        ] {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .description(description)
                    .computed()
                    .build(),
            );
        }

        let schema = builder
            .block(
                NestedBlockBuilder::single_list("video_template")
                    .description("Video stream settings")
                    .attribute(string_attr("codec", "Video codec: libx264, libx265, av1", true))
                    .attribute(number_attr("fps", "Frame rate in Hz, 0 keeps the source", true))
                    .attribute(number_attr("bitrate", "Bitrate in kbps, 0 keeps the source", true))
                    .attribute(string_attr(
                        "resolution_adaptive",
                        "Adaptive resolution: open or close",
                        false,
                    ))
                    .attribute(number_attr("width", "Maximum width in px", false))
                    .attribute(number_attr("height", "Maximum height in px", false))
                    .attribute(number_attr("gop", "Keyframe interval in frames", false))
                    .attribute(string_attr(
                        "fill_type",
                        "Fill mode when the aspect ratio differs: stretch, black, white, gauss",
                        false,
                    ))
                    .attribute(number_attr("vcrf", "Constant rate factor, 0 disables it", false))
                    .build(),
            )
            .block(
                NestedBlockBuilder::single_list("audio_template")
                    .description("Audio stream settings")
                    .attribute(string_attr("codec", "Audio codec, e.g. libfdk_aac, libmp3lame", true))
                    .attribute(number_attr("bitrate", "Bitrate in kbps, 0 keeps the source", true))
                    .attribute(number_attr("sample_rate", "Sample rate in Hz", true))
                    .attribute(number_attr(
                        "audio_channel",
                        "Channel layout: 1 mono, 2 dual, 6 stereo",
                        false,
                    ))
                    .build(),
            )
            .block(
                NestedBlockBuilder::single_list("tehd_config")
                    .description("Top speed codec settings")
                    .attribute(
                        AttributeBuilder::new("type", AttributeType::String)
                            .description("TEHD type: TEHD-100 or TEHD-200")
                            .required()
                            .validator(StringOneOf::create(["TEHD-100", "TEHD-200"]))
                            .build(),
                    )
                    .attribute(number_attr(
                        "max_video_bitrate",
                        "Video bitrate cap in kbps",
                        false,
                    ))
                    .build(),
            )
            .block(enhance_config_block())
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_transcode_template.create");
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
            .transcode_templates()
            .create(&ctx, &create_request)
            .await
        {
            Ok(definition) => definition,
            Err(e) => {
                diagnostics.push(api_error("Failed to create transcode template", e));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };
        tracing::info!(definition, "created transcode template");

        let mut state = request.planned_state;
        let _ = state.set_string(&AttributePath::new("id"), definition.to_string());

        match read_template(&ctx, client, definition, &mut state).await {
            Ok(true) => {}
            Ok(false) => diagnostics.push(Diagnostic::error(
                "Transcode template not found after create",
                format!("Template {} disappeared right after it was created", definition),
            )),
            Err(e) => diagnostics.push(api_error("Failed to read transcode template", e)),
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
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_transcode_template.read");
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
                tracing::warn!(definition, "transcode template not found, removing from state");
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                    deferred: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read transcode template", e));
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
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_transcode_template.update");
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
            if let Err(e) = client.mps().transcode_templates().modify(&ctx, &modify).await {
                diagnostics.push(api_error("Failed to update transcode template", e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        }

        let mut state = request.planned_state;
        if let Err(e) = read_template(&ctx, client, definition, &mut state).await {
            diagnostics.push(api_error("Failed to read transcode template", e));
        }

        UpdateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_transcode_template.delete");
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
            .transcode_templates()
            .delete(&ctx, definition)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("Failed to delete transcode template", e)),
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for MpsTranscodeTemplateResource {
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
impl ResourceWithImportState for MpsTranscodeTemplateResource {
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
#[path = "./resource_transcode_template_test.rs"]
mod resource_transcode_template_test;
