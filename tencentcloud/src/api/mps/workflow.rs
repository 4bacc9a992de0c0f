//! Media processing workflows triggered by COS uploads

use serde::{Deserialize, Serialize};
use tfplug::Context;

use super::{PAGE_LIMIT, SERVICE};
use crate::api::error::ApiError;
use crate::api::{Client, EmptyResponse};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct CosFileUploadTrigger {
    pub bucket: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct WorkflowTrigger {
    #[serde(rename = "Type")]
    pub trigger_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cos_file_upload_trigger: Option<CosFileUploadTrigger>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct CosOutputStorage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskOutputStorage {
    #[serde(rename = "Type")]
    pub storage_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cos_output_storage: Option<CosOutputStorage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct TranscodeTaskInput {
    pub definition: i64,
}

/// Animated image (GIF/WebP) cut from a time range of the input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct AnimatedGraphicTaskInput {
    pub definition: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time_offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time_offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_storage: Option<TaskOutputStorage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_object_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct SnapshotByTimeOffsetTaskInput {
    pub definition: i64,
    /// Offsets such as `"10s"` or `"10%"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_time_offset_set: Option<Vec<String>>,
    /// Offsets in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_offset_set: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_storage: Option<TaskOutputStorage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_object_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct SampleSnapshotTaskInput {
    pub definition: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_storage: Option<TaskOutputStorage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_object_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ImageSpriteTaskInput {
    pub definition: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_storage: Option<TaskOutputStorage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_object_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_vtt_object_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct MediaProcessTaskInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcode_task_set: Option<Vec<TranscodeTaskInput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animated_graphic_task_set: Option<Vec<AnimatedGraphicTaskInput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_by_time_offset_task_set: Option<Vec<SnapshotByTimeOffsetTaskInput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_snapshot_task_set: Option<Vec<SampleSnapshotTaskInput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_sprite_task_set: Option<Vec<ImageSpriteTaskInput>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskNotifyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmq_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmq_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
}

/// Everything that describes a workflow. CreateWorkflow takes it as is and
/// ResetWorkflow takes it alongside the workflow id.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct WorkflowDefinition {
    pub workflow_name: String,
    pub trigger: WorkflowTrigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_storage: Option<TaskOutputStorage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_process_task: Option<MediaProcessTaskInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_notify_config: Option<TaskNotifyConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_priority: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateWorkflowResponse {
    pub workflow_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResetWorkflowRequest<'a> {
    workflow_id: i64,
    #[serde(flatten)]
    definition: &'a WorkflowDefinition,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WorkflowIdRequest {
    workflow_id: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeWorkflowsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeWorkflowsResponse {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub workflow_info_set: Vec<WorkflowInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WorkflowInfo {
    pub workflow_id: i64,
    pub workflow_name: String,
    pub status: Option<String>,
    pub trigger: Option<WorkflowTrigger>,
    pub output_storage: Option<TaskOutputStorage>,
    pub output_dir: Option<String>,
    pub media_process_task: Option<MediaProcessTaskInput>,
    pub task_notify_config: Option<TaskNotifyConfig>,
    pub task_priority: Option<i64>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

/// Workflow operations
pub struct WorkflowsApi<'a> {
    client: &'a Client,
}

impl<'a> WorkflowsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, ctx: &Context, definition: &WorkflowDefinition) -> Result<i64, ApiError> {
        let response: CreateWorkflowResponse =
            self.client.write(ctx, SERVICE, "CreateWorkflow", definition).await?;
        Ok(response.workflow_id)
    }

    pub async fn get(&self, ctx: &Context, workflow_id: i64) -> Result<Option<WorkflowInfo>, ApiError> {
        let request = DescribeWorkflowsRequest {
            workflow_ids: Some(vec![workflow_id]),
            ..Default::default()
        };
        match self
            .client
            .read::<_, DescribeWorkflowsResponse>(ctx, SERVICE, "DescribeWorkflows", &request)
            .await
        {
            Ok(response) => Ok(response
                .workflow_info_set
                .into_iter()
                .find(|w| w.workflow_id == workflow_id)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Every workflow matching `filter`, following pagination.
    pub async fn list(
        &self,
        ctx: &Context,
        filter: &DescribeWorkflowsRequest,
    ) -> Result<Vec<WorkflowInfo>, ApiError> {
        let mut workflows = Vec::new();
        let mut offset = 0;

        loop {
            let request = DescribeWorkflowsRequest {
                offset: Some(offset),
                limit: Some(PAGE_LIMIT),
                ..filter.clone()
            };
            let response: DescribeWorkflowsResponse = self
                .client
                .read(ctx, SERVICE, "DescribeWorkflows", &request)
                .await?;

            let page = response.workflow_info_set.len() as i64;
            workflows.extend(response.workflow_info_set);
            offset += page;
            if page < PAGE_LIMIT || offset >= response.total_count {
                break;
            }
        }

        Ok(workflows)
    }

    /// Replace the whole definition of an existing workflow.
    pub async fn reset(
        &self,
        ctx: &Context,
        workflow_id: i64,
        definition: &WorkflowDefinition,
    ) -> Result<(), ApiError> {
        let request = ResetWorkflowRequest {
            workflow_id,
            definition,
        };
        let _: EmptyResponse = self.client.write(ctx, SERVICE, "ResetWorkflow", &request).await?;
        Ok(())
    }

    pub async fn delete(&self, ctx: &Context, workflow_id: i64) -> Result<(), ApiError> {
        let request = WorkflowIdRequest { workflow_id };
        let _: EmptyResponse = self.client.write(ctx, SERVICE, "DeleteWorkflow", &request).await?;
        Ok(())
    }
}
