//! MPS workflow resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
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
    Attribute, AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, NestingMode,
    SchemaBuilder,
};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{NumberBetween, StringOneOf};

use super::parse_numeric_id;
use crate::api::mps::workflow::{
    AnimatedGraphicTaskInput, CosFileUploadTrigger, CosOutputStorage, ImageSpriteTaskInput,
    MediaProcessTaskInput, SampleSnapshotTaskInput, SnapshotByTimeOffsetTaskInput,
    TaskNotifyConfig, TaskOutputStorage, TranscodeTaskInput, WorkflowDefinition, WorkflowInfo,
    WorkflowTrigger,
};
use crate::api::{ApiError, Client};
use crate::helper::{
    block_value, field_block, field_f64, field_i64, field_string, field_string_list, i64_opt,
    log_elapsed, set_i64_opt, set_string_opt, single_block, string_opt,
};
use crate::resources::{api_error, downcast_provider_data, not_configured};
use crate::TencentCloudProviderData;

const NOTIFY_FIELDS: [(&str, &str); 7] = [
    ("cmq_model", "CMQ model: Queue or Topic"),
    ("cmq_region", "CMQ region, e.g. sh or bj"),
    ("topic_name", "Topic name, used when cmq_model is Topic"),
    ("queue_name", "Queue name, used when cmq_model is Queue"),
    ("notify_mode", "Notify mode: Change or Finish"),
    ("notify_type", "Notify type: CMQ, TDMQ-CMQ or URL"),
    ("notify_url", "HTTP callback address, used when notify_type is URL"),
];

#[derive(Default)]
pub struct MpsWorkflowResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl MpsWorkflowResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn string_attr(name: &str, description: &str, required: bool) -> Attribute {
    let builder = AttributeBuilder::new(name, AttributeType::String).description(description);
    if required {
        builder.required().build()
    } else {
        builder.optional().build()
    }
}

fn build_trigger(block: &Dynamic) -> WorkflowTrigger {
    WorkflowTrigger {
        trigger_type: field_string(block, "type").unwrap_or_default(),
        cos_file_upload_trigger: field_block(block, "cos_file_upload_trigger").map(|cos| {
            let formats = field_string_list(cos, "formats");
            CosFileUploadTrigger {
                bucket: field_string(cos, "bucket").unwrap_or_default(),
                region: field_string(cos, "region").unwrap_or_default(),
                dir: field_string(cos, "dir"),
                formats: (!formats.is_empty()).then_some(formats),
            }
        }),
    }
}

fn build_output_storage(block: &Dynamic) -> TaskOutputStorage {
    TaskOutputStorage {
        storage_type: field_string(block, "type").unwrap_or_default(),
        cos_output_storage: field_block(block, "cos_output_storage").map(|cos| CosOutputStorage {
            bucket: field_string(cos, "bucket"),
            region: field_string(cos, "region"),
        }),
    }
}

/// Tasks of one kind; entries without a definition are skipped and an
/// empty set is left out of the request.
fn build_tasks<T>(block: &Dynamic, name: &str, build: impl Fn(&Dynamic, i64) -> T) -> Option<Vec<T>> {
    let tasks: Vec<T> = block
        .get(name)
        .and_then(Dynamic::as_list)
        .map(|tasks| {
            tasks
                .iter()
                .filter_map(|task| field_i64(task, "definition").map(|d| build(task, d)))
                .collect()
        })
        .unwrap_or_default();
    (!tasks.is_empty()).then_some(tasks)
}

fn build_media_process_task(block: &Dynamic) -> MediaProcessTaskInput {
    let task_storage = |task: &Dynamic| field_block(task, "output_storage").map(build_output_storage);

    MediaProcessTaskInput {
        transcode_task_set: build_tasks(block, "transcode_task_set", |_, definition| {
            TranscodeTaskInput { definition }
        }),
        animated_graphic_task_set: build_tasks(block, "animated_graphic_task_set", |task, definition| {
            AnimatedGraphicTaskInput {
                definition,
                start_time_offset: field_f64(task, "start_time_offset"),
                end_time_offset: field_f64(task, "end_time_offset"),
                output_storage: task_storage(task),
                output_object_path: field_string(task, "output_object_path"),
            }
        }),
        snapshot_by_time_offset_task_set: build_tasks(
            block,
            "snapshot_by_time_offset_task_set",
            |task, definition| {
                let ext_offsets = field_string_list(task, "ext_time_offset_set");
                let offsets: Vec<f64> = task
                    .get("time_offset_set")
                    .and_then(Dynamic::as_list)
                    .map(|items| items.iter().filter_map(Dynamic::as_f64).collect())
                    .unwrap_or_default();
                SnapshotByTimeOffsetTaskInput {
                    definition,
                    ext_time_offset_set: (!ext_offsets.is_empty()).then_some(ext_offsets),
                    time_offset_set: (!offsets.is_empty()).then_some(offsets),
                    output_storage: task_storage(task),
                    output_object_path: field_string(task, "output_object_path"),
                }
            },
        ),
        sample_snapshot_task_set: build_tasks(block, "sample_snapshot_task_set", |task, definition| {
            SampleSnapshotTaskInput {
                definition,
                output_storage: task_storage(task),
                output_object_path: field_string(task, "output_object_path"),
            }
        }),
        image_sprite_task_set: build_tasks(block, "image_sprite_task_set", |task, definition| {
            ImageSpriteTaskInput {
                definition,
                output_storage: task_storage(task),
                output_object_path: field_string(task, "output_object_path"),
                web_vtt_object_name: field_string(task, "web_vtt_object_name"),
            }
        }),
    }
}

fn build_notify_config(block: &Dynamic) -> TaskNotifyConfig {
    TaskNotifyConfig {
        cmq_model: field_string(block, "cmq_model"),
        cmq_region: field_string(block, "cmq_region"),
        topic_name: field_string(block, "topic_name"),
        queue_name: field_string(block, "queue_name"),
        notify_mode: field_string(block, "notify_mode"),
        notify_type: field_string(block, "notify_type"),
        notify_url: field_string(block, "notify_url"),
    }
}

/// The full workflow described by `value`, a config or a state.
fn build_definition(value: &DynamicValue) -> Result<WorkflowDefinition, Diagnostic> {
    let workflow_name = string_opt(value, &AttributePath::new("workflow_name")).ok_or_else(|| {
        Diagnostic::error("Missing workflow_name", "The 'workflow_name' attribute is required")
            .with_attribute(AttributePath::new("workflow_name"))
    })?;
    let trigger = single_block(value, "trigger").map(build_trigger).ok_or_else(|| {
        Diagnostic::error("Missing trigger", "A `trigger` block is required")
            .with_attribute(AttributePath::new("trigger"))
    })?;

    Ok(WorkflowDefinition {
        workflow_name,
        trigger,
        output_storage: single_block(value, "output_storage").map(build_output_storage),
        output_dir: string_opt(value, &AttributePath::new("output_dir")),
        media_process_task: single_block(value, "media_process_task").map(build_media_process_task),
        task_notify_config: single_block(value, "task_notify_config").map(build_notify_config),
        task_priority: i64_opt(value, &AttributePath::new("task_priority")),
    })
}

async fn read_workflow(
    ctx: &Context,
    client: &Client,
    workflow_id: i64,
    state: &mut DynamicValue,
) -> Result<bool, ApiError> {
    match client.mps().workflows().get(ctx, workflow_id).await? {
        Some(workflow) => {
            flatten_workflow(&workflow, state);
            Ok(true)
        }
        None => Ok(false),
    }
}

fn flatten_workflow(workflow: &WorkflowInfo, state: &mut DynamicValue) {
    let string = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(Dynamic::from);

    let _ = state.set_string(&AttributePath::new("id"), workflow.workflow_id.to_string());
    let _ = state.set_string(
        &AttributePath::new("workflow_name"),
        workflow.workflow_name.as_str(),
    );
    set_string_opt(state, "output_dir", workflow.output_dir.as_deref());
    set_i64_opt(state, "task_priority", workflow.task_priority);
    set_string_opt(state, "status", workflow.status.as_deref());
    set_string_opt(state, "create_time", workflow.create_time.as_deref());
    set_string_opt(state, "update_time", workflow.update_time.as_deref());

    let trigger = workflow.trigger.as_ref().map(|t| {
        let cos = t.cos_file_upload_trigger.as_ref().map(|cos| {
            block_value([
                ("bucket", Some(Dynamic::from(cos.bucket.as_str()))),
                ("region", Some(Dynamic::from(cos.region.as_str()))),
                ("dir", string(&cos.dir)),
                (
                    "formats",
                    cos.formats
                        .as_ref()
                        .filter(|f| !f.is_empty())
                        .map(|f| Dynamic::string_list(f.iter().map(String::as_str))),
                ),
            ])
        });
        block_value([
            ("type", Some(Dynamic::from(t.trigger_type.as_str()))),
            ("cos_file_upload_trigger", Some(cos.unwrap_or_else(|| Dynamic::List(vec![])))),
        ])
    });

    let output_storage = workflow.output_storage.as_ref().map(flatten_output_storage);

    let media_process_task = workflow
        .media_process_task
        .as_ref()
        .and_then(flatten_media_process_task);

    // An unset notify config comes back with every field empty.
    let task_notify_config = workflow
        .task_notify_config
        .as_ref()
        .filter(|n| {
            [
                &n.cmq_model,
                &n.cmq_region,
                &n.topic_name,
                &n.queue_name,
                &n.notify_mode,
                &n.notify_type,
                &n.notify_url,
            ]
            .iter()
            .any(|field| string(*field).is_some())
        })
        .map(|n| {
            block_value([
                ("cmq_model", string(&n.cmq_model)),
                ("cmq_region", string(&n.cmq_region)),
                ("topic_name", string(&n.topic_name)),
                ("queue_name", string(&n.queue_name)),
                ("notify_mode", string(&n.notify_mode)),
                ("notify_type", string(&n.notify_type)),
                ("notify_url", string(&n.notify_url)),
            ])
        });

    for (name, value) in [
        ("trigger", trigger),
        ("output_storage", output_storage),
        ("media_process_task", media_process_task),
        ("task_notify_config", task_notify_config),
    ] {
        let _ = state.set_value(
            &AttributePath::new(name),
            value.unwrap_or_else(|| Dynamic::List(vec![])),
        );
    }
}

fn flatten_output_storage(storage: &TaskOutputStorage) -> Dynamic {
    let string = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(Dynamic::from);
    let cos = storage.cos_output_storage.as_ref().map(|cos| {
        block_value([("bucket", string(&cos.bucket)), ("region", string(&cos.region))])
    });
    block_value([
        ("type", Some(Dynamic::from(storage.storage_type.as_str()))),
        ("cos_output_storage", Some(cos.unwrap_or_else(|| Dynamic::List(vec![])))),
    ])
}

/// One element of a task set list.
fn task_value<'a, I>(fields: I) -> Dynamic
where
    I: IntoIterator<Item = (&'a str, Option<Dynamic>)>,
{
    Dynamic::Map(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.unwrap_or(Dynamic::Null)))
            .collect(),
    )
}

fn task_list<T>(tasks: &Option<Vec<T>>, flatten: impl Fn(&T) -> Dynamic) -> Dynamic {
    Dynamic::List(tasks.iter().flatten().map(flatten).collect())
}

/// `None` when the workflow runs no media processing task at all.
fn flatten_media_process_task(task: &MediaProcessTaskInput) -> Option<Dynamic> {
    if *task == MediaProcessTaskInput::default() {
        return None;
    }
    let string = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(Dynamic::from);
    let storage = |v: &Option<TaskOutputStorage>| {
        Some(v.as_ref().map(flatten_output_storage).unwrap_or_else(|| Dynamic::List(vec![])))
    };

    Some(block_value([
        (
            "transcode_task_set",
            Some(task_list(&task.transcode_task_set, |t| {
                task_value([("definition", Some(Dynamic::from(t.definition)))])
            })),
        ),
        (
            "animated_graphic_task_set",
            Some(task_list(&task.animated_graphic_task_set, |t| {
                task_value([
                    ("definition", Some(Dynamic::from(t.definition))),
                    ("start_time_offset", t.start_time_offset.map(Dynamic::from)),
                    ("end_time_offset", t.end_time_offset.map(Dynamic::from)),
                    ("output_storage", storage(&t.output_storage)),
                    ("output_object_path", string(&t.output_object_path)),
                ])
            })),
        ),
        (
            "snapshot_by_time_offset_task_set",
            Some(task_list(&task.snapshot_by_time_offset_task_set, |t| {
                task_value([
                    ("definition", Some(Dynamic::from(t.definition))),
                    (
                        "ext_time_offset_set",
                        t.ext_time_offset_set
                            .as_ref()
                            .filter(|v| !v.is_empty())
                            .map(|v| Dynamic::string_list(v.iter().map(String::as_str))),
                    ),
                    (
                        "time_offset_set",
                        t.time_offset_set
                            .as_ref()
                            .filter(|v| !v.is_empty())
                            .map(|v| Dynamic::List(v.iter().copied().map(Dynamic::from).collect())),
                    ),
                    ("output_storage", storage(&t.output_storage)),
                    ("output_object_path", string(&t.output_object_path)),
                ])
            })),
        ),
        (
            "sample_snapshot_task_set",
            Some(task_list(&task.sample_snapshot_task_set, |t| {
                task_value([
                    ("definition", Some(Dynamic::from(t.definition))),
                    ("output_storage", storage(&t.output_storage)),
                    ("output_object_path", string(&t.output_object_path)),
                ])
            })),
        ),
        (
            "image_sprite_task_set",
            Some(task_list(&task.image_sprite_task_set, |t| {
                task_value([
                    ("definition", Some(Dynamic::from(t.definition))),
                    ("output_storage", storage(&t.output_storage)),
                    ("output_object_path", string(&t.output_object_path)),
                    ("web_vtt_object_name", string(&t.web_vtt_object_name)),
                ])
            })),
        ),
    ]))
}

fn output_storage_block(description: &str) -> NestedBlock {
    NestedBlockBuilder::single_list("output_storage")
        .description(description)
        .attribute(
            AttributeBuilder::new("type", AttributeType::String)
                .description("Storage type, only COS is supported")
                .required()
                .validator(StringOneOf::create(["COS"]))
                .build(),
        )
        .block(
            NestedBlockBuilder::single_list("cos_output_storage")
                .description("COS bucket for outputs")
                .attribute(string_attr("bucket", "Output bucket name", false))
                .attribute(string_attr("region", "Output bucket region", false))
                .build(),
        )
        .build()
}

/// A `*_task_set` list block keyed by template `definition`.
fn task_set_block(name: &str, description: &str) -> NestedBlockBuilder {
    NestedBlockBuilder::new(name, NestingMode::List)
        .description(description)
        .attribute(
            AttributeBuilder::new("definition", AttributeType::Number)
                .description("Template ID")
                .required()
                .build(),
        )
}

fn media_process_task_block() -> NestedBlock {
    let output_path = || string_attr("output_object_path", "Output object path", false);
    let task_output = || output_storage_block("Overrides the workflow output storage for this task");

    NestedBlockBuilder::single_list("media_process_task")
        .description("Media processing tasks run by the workflow")
        .block(task_set_block("transcode_task_set", "Transcode tasks").build())
        .block(
            task_set_block("animated_graphic_task_set", "Animated image tasks")
                .attribute(
                    AttributeBuilder::new("start_time_offset", AttributeType::Number)
                        .description("Start of the clip in seconds")
                        .required()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("end_time_offset", AttributeType::Number)
                        .description("End of the clip in seconds")
                        .required()
                        .build(),
                )
                .attribute(output_path())
                .block(task_output())
                .build(),
        )
        .block(
            task_set_block("snapshot_by_time_offset_task_set", "Snapshots at given offsets")
                .attribute(
                    AttributeBuilder::new(
                        "ext_time_offset_set",
                        AttributeType::list_of(AttributeType::String),
                    )
                    .description("Offsets such as 10s or 10%")
                    .optional()
                    .build(),
                )
                .attribute(
                    AttributeBuilder::new(
                        "time_offset_set",
                        AttributeType::list_of(AttributeType::Number),
                    )
                    .description("Offsets in seconds")
                    .optional()
                    .build(),
                )
                .attribute(output_path())
                .block(task_output())
                .build(),
        )
        .block(
            task_set_block("sample_snapshot_task_set", "Sampled snapshot tasks")
                .attribute(output_path())
                .block(task_output())
                .build(),
        )
        .block(
            task_set_block("image_sprite_task_set", "Image sprite tasks")
                .attribute(output_path())
                .attribute(string_attr("web_vtt_object_name", "WebVTT index object name", false))
                .block(task_output())
                .build(),
        )
        .build()
}

#[async_trait]
impl Resource for MpsWorkflowResource {
    fn type_name(&self) -> &str {
        "tencentcloud_mps_workflow"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Provides an MPS workflow triggered by COS uploads")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Workflow ID")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(string_attr(
                "workflow_name",
                "Workflow name, at most 128 characters",
                true,
            ))
            .attribute(
                AttributeBuilder::new("output_dir", AttributeType::String)
                    .description("Output directory, e.g. /movie/201907/")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("task_priority", AttributeType::Number)
                    .description("Task priority in [-10, 10], higher runs first")
                    .optional()
                    .validator(NumberBetween::create(-10.0, 10.0))
                    .default(StaticDefault::number(0.0))
                    .build(),
            );
        for (name, description) in [
            ("status", "Workflow status: Enabled or Disabled"),
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

        let mut notify = NestedBlockBuilder::single_list("task_notify_config")
            .description("Event notification settings");
        for (name, description) in NOTIFY_FIELDS {
            notify = notify.attribute(string_attr(name, description, false));
        }

        let schema = builder
            .block(
                NestedBlockBuilder::single_list("trigger")
                    .description("What starts the workflow")
                    .attribute(
                        AttributeBuilder::new("type", AttributeType::String)
                            .description("Trigger type, only CosFileUpload is supported")
                            .required()
                            .validator(StringOneOf::create(["CosFileUpload"]))
                            .build(),
                    )
                    .block(
                        NestedBlockBuilder::single_list("cos_file_upload_trigger")
                            .description("COS upload that starts the workflow")
                            .attribute(string_attr("bucket", "Watched bucket name", true))
                            .attribute(string_attr("region", "Watched bucket region", true))
                            .attribute(string_attr("dir", "Watched directory, ending with /", false))
                            .attribute(
                                AttributeBuilder::new(
                                    "formats",
                                    AttributeType::list_of(AttributeType::String),
                                )
                                .description("File extensions that trigger the workflow")
                                .optional()
                                .build(),
                            )
                            .build(),
                    )
                    .min_items(1)
                    .build(),
            )
            .block(output_storage_block("Where outputs are written"))
            .block(media_process_task_block())
            .block(notify.build())
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_workflow.create");
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

        let definition = match build_definition(&request.planned_state) {
            Ok(definition) => definition,
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
        let workflow_id = match client.mps().workflows().create(&ctx, &definition).await {
            Ok(workflow_id) => workflow_id,
            Err(e) => {
                diagnostics.push(api_error("Failed to create MPS workflow", e));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };
        tracing::info!(workflow_id, "created MPS workflow");

        let mut state = request.planned_state;
        let _ = state.set_string(&AttributePath::new("id"), workflow_id.to_string());

        match read_workflow(&ctx, client, workflow_id, &mut state).await {
            Ok(true) => {}
            Ok(false) => diagnostics.push(Diagnostic::error(
                "MPS workflow not found after create",
                format!("Workflow {} disappeared right after it was created", workflow_id),
            )),
            Err(e) => diagnostics.push(api_error("Failed to read MPS workflow", e)),
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
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_workflow.read");
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

        let workflow_id = match request
            .current_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| parse_numeric_id(&id))
        {
            Ok(workflow_id) => workflow_id,
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
        match read_workflow(&ctx, &provider_data.client, workflow_id, &mut state).await {
            Ok(true) => ReadResourceResponse {
                new_state: Some(state),
                diagnostics,
                private: request.private,
                deferred: None,
            },
            Ok(false) => {
                tracing::warn!(workflow_id, "MPS workflow not found, removing from state");
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                    deferred: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read MPS workflow", e));
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
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_workflow.update");
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

        let target = request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| parse_numeric_id(&id))
            .and_then(|id| build_definition(&request.planned_state).map(|d| (id, d)));
        let (workflow_id, definition) = match target {
            Ok(target) => target,
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
        let unchanged = build_definition(&request.prior_state)
            .map(|prior| prior == definition)
            .unwrap_or(false);
        if !unchanged {
            if let Err(e) = client.mps().workflows().reset(&ctx, workflow_id, &definition).await {
                diagnostics.push(api_error("Failed to reset MPS workflow", e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        }

        let mut state = request.planned_state;
        if let Err(e) = read_workflow(&ctx, client, workflow_id, &mut state).await {
            diagnostics.push(api_error("Failed to read MPS workflow", e));
        }

        UpdateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mps_workflow.delete");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return DeleteResourceResponse { diagnostics };
            }
        };

        let workflow_id = match request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| parse_numeric_id(&id))
        {
            Ok(workflow_id) => workflow_id,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        match provider_data
            .client
            .mps()
            .workflows()
            .delete(&ctx, workflow_id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("Failed to delete MPS workflow", e)),
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for MpsWorkflowResource {
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
impl ResourceWithImportState for MpsWorkflowResource {
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
#[path = "./resource_workflow_test.rs"]
mod resource_workflow_test;
