#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::test_helpers::{create_test_client, error_body, response_body};
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use tfplug::types::ClientCapabilities;

    fn configured(server_url: &str) -> MpsWorkflowResource {
        MpsWorkflowResource {
            provider_data: Some(TencentCloudProviderData {
                client: Arc::new(create_test_client(server_url)),
            }),
        }
    }

    fn object(fields: Vec<(&str, Dynamic)>) -> DynamicValue {
        DynamicValue::new(Dynamic::Map(
            fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        ))
    }

    fn task(definition: i64) -> Dynamic {
        Dynamic::Map(
            [("definition".to_string(), Dynamic::from(definition))]
                .into_iter()
                .collect(),
        )
    }

    fn planned(id: Dynamic, name: &str, definitions: &[i64]) -> DynamicValue {
        object(vec![
            ("id", id),
            ("workflow_name", Dynamic::from(name)),
            ("output_dir", Dynamic::from("/output/")),
            ("task_priority", Dynamic::Number(0.0)),
            ("status", Dynamic::Unknown),
            (
                "trigger",
                block_value([
                    ("type", Some(Dynamic::from("CosFileUpload"))),
                    (
                        "cos_file_upload_trigger",
                        Some(block_value([
                            ("bucket", Some(Dynamic::from("media-1250000000"))),
                            ("region", Some(Dynamic::from("ap-guangzhou"))),
                            ("dir", Some(Dynamic::from("/upload/"))),
                            ("formats", Some(Dynamic::string_list(["mp4", "flv"]))),
                        ])),
                    ),
                ]),
            ),
            (
                "output_storage",
                block_value([
                    ("type", Some(Dynamic::from("COS"))),
                    (
                        "cos_output_storage",
                        Some(block_value([
                            ("bucket", Some(Dynamic::from("media-out-1250000000"))),
                            ("region", Some(Dynamic::from("ap-guangzhou"))),
                        ])),
                    ),
                ]),
            ),
            (
                "media_process_task",
                block_value([(
                    "transcode_task_set",
                    Some(Dynamic::List(definitions.iter().map(|d| task(*d)).collect())),
                )]),
            ),
            ("task_notify_config", Dynamic::List(vec![])),
        ])
    }

    fn workflow_body(name: &str, definitions: &[i64]) -> String {
        let tasks: Vec<_> = definitions
            .iter()
            .map(|d| serde_json::json!({"Definition": d}))
            .collect();
        response_body(serde_json::json!({
            "TotalCount": 1,
            "WorkflowInfoSet": [{
                "WorkflowId": 40001,
                "WorkflowName": name,
                "Status": "Disabled",
                "Trigger": {
                    "Type": "CosFileUpload",
                    "CosFileUploadTrigger": {
                        "Bucket": "media-1250000000",
                        "Region": "ap-guangzhou",
                        "Dir": "/upload/",
                        "Formats": ["mp4", "flv"]
                    }
                },
                "OutputStorage": {
                    "Type": "COS",
                    "CosOutputStorage": {"Bucket": "media-out-1250000000", "Region": "ap-guangzhou"}
                },
                "OutputDir": "/output/",
                "MediaProcessTask": {"TranscodeTaskSet": tasks},
                "TaskNotifyConfig": {
                    "CmqModel": "", "CmqRegion": "", "TopicName": "", "QueueName": "",
                    "NotifyMode": "", "NotifyType": "", "NotifyUrl": ""
                },
                "TaskPriority": 0,
                "CreateTime": "2024-01-01T00:00:00Z",
                "UpdateTime": "2024-01-01T00:00:00Z"
            }]
        }))
    }

    #[tokio::test]
    async fn test_resource_schema() {
        let response = MpsWorkflowResource::new()
            .schema(Context::new(), ResourceSchemaRequest)
            .await;
        let block = &response.schema.block;
        assert!(block.attribute("workflow_name").unwrap().required);
        assert!(block.attribute("task_priority").unwrap().optional);
        let trigger = block.nested_block("trigger").unwrap();
        assert_eq!(trigger.min_items, 1);
        assert!(trigger.block.nested_block("cos_file_upload_trigger").is_some());
        let tasks = block.nested_block("media_process_task").unwrap();
        assert!(tasks.block.nested_block("transcode_task_set").is_some());
        let snapshots = tasks.block.nested_block("snapshot_by_time_offset_task_set").unwrap();
        assert!(snapshots.block.attribute("time_offset_set").is_some());
        assert_eq!(snapshots.block.nested_block("output_storage").unwrap().max_items, 1);
        assert!(tasks.block.nested_block("animated_graphic_task_set").is_some());
        assert!(tasks.block.nested_block("sample_snapshot_task_set").is_some());
        assert!(tasks
            .block
            .nested_block("image_sprite_task_set")
            .unwrap()
            .block
            .attribute("web_vtt_object_name")
            .is_some());
        assert_eq!(
            block.nested_block("task_notify_config").unwrap().block.attributes.len(),
            7
        );
    }

    #[test]
    fn test_build_definition() {
        let definition = build_definition(&planned(Dynamic::Unknown, "flow", &[10, 20])).unwrap();
        assert_eq!(definition.workflow_name, "flow");
        assert_eq!(definition.trigger.trigger_type, "CosFileUpload");
        let cos = definition.trigger.cos_file_upload_trigger.unwrap();
        assert_eq!(cos.formats, Some(vec!["mp4".to_string(), "flv".to_string()]));
        let tasks = definition.media_process_task.unwrap().transcode_task_set.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].definition, 20);
        assert!(definition.task_notify_config.is_none());

        let err = build_definition(&object(vec![("workflow_name", Dynamic::from("x"))])).unwrap_err();
        assert_eq!(err.summary, "Missing trigger");
    }

    #[test]
    fn test_build_definition_with_snapshot_and_gif_tasks() {
        let mut plan = planned(Dynamic::Unknown, "flow", &[10]);
        let tasks = AttributePath::new("media_process_task").index(0);
        plan.set_number(
            &tasks.clone().attribute("snapshot_by_time_offset_task_set").index(0).attribute("definition"),
            10.0,
        )
        .unwrap();
        plan.set_value(
            &tasks.clone().attribute("snapshot_by_time_offset_task_set").index(0).attribute("ext_time_offset_set"),
            Dynamic::string_list(["1s", "50%"]),
        )
        .unwrap();
        plan.set_value(
            &tasks.clone().attribute("snapshot_by_time_offset_task_set").index(0).attribute("time_offset_set"),
            Dynamic::List(vec![]),
        )
        .unwrap();
        let gif = tasks.clone().attribute("animated_graphic_task_set").index(0);
        plan.set_number(&gif.clone().attribute("definition"), 20000.0).unwrap();
        plan.set_number(&gif.clone().attribute("start_time_offset"), 0.0).unwrap();
        plan.set_number(&gif.clone().attribute("end_time_offset"), 2.5).unwrap();
        plan.set_string(&gif.clone().attribute("output_storage").index(0).attribute("type"), "COS")
            .unwrap();
        plan.set_string(
            &gif.clone()
                .attribute("output_storage")
                .index(0)
                .attribute("cos_output_storage")
                .index(0)
                .attribute("bucket"),
            "gif-1250000000",
        )
        .unwrap();

        let media = build_definition(&plan).unwrap().media_process_task.unwrap();
        let snapshot = &media.snapshot_by_time_offset_task_set.unwrap()[0];
        assert_eq!(
            snapshot.ext_time_offset_set,
            Some(vec!["1s".to_string(), "50%".to_string()])
        );
        assert_eq!(snapshot.time_offset_set, None);
        let gif = &media.animated_graphic_task_set.unwrap()[0];
        assert_eq!(gif.definition, 20000);
        assert_eq!(gif.end_time_offset, Some(2.5));
        let storage = gif.output_storage.as_ref().unwrap();
        assert_eq!(storage.storage_type, "COS");
        assert_eq!(
            storage.cos_output_storage.as_ref().unwrap().bucket.as_deref(),
            Some("gif-1250000000")
        );
        assert!(media.sample_snapshot_task_set.is_none());
        assert!(media.image_sprite_task_set.is_none());
    }

    #[test]
    fn test_flatten_keeps_every_task_set() {
        let workflow: WorkflowInfo = serde_json::from_value(serde_json::json!({
            "WorkflowId": 40001,
            "WorkflowName": "flow",
            "MediaProcessTask": {
                "SampleSnapshotTaskSet": [{"Definition": 10}],
                "ImageSpriteTaskSet": [{
                    "Definition": 10,
                    "OutputObjectPath": "/sprite/{inputName}",
                    "WebVttObjectName": "index"
                }],
                "SnapshotByTimeOffsetTaskSet": [{"Definition": 10, "TimeOffsetSet": [1.5, 3]}]
            }
        }))
        .unwrap();
        let mut state = DynamicValue::new(Dynamic::Map(Default::default()));
        flatten_workflow(&workflow, &mut state);

        let tasks = AttributePath::new("media_process_task").index(0);
        assert_eq!(
            state.get_list(&tasks.clone().attribute("transcode_task_set")).unwrap().len(),
            0
        );
        assert_eq!(
            state
                .get_i64(&tasks.clone().attribute("sample_snapshot_task_set").index(0).attribute("definition"))
                .unwrap(),
            10
        );
        let sprite = tasks.clone().attribute("image_sprite_task_set").index(0);
        assert_eq!(
            state.get_string(&sprite.clone().attribute("web_vtt_object_name")).unwrap(),
            "index"
        );
        assert_eq!(state.get_list(&sprite.attribute("output_storage")).unwrap().len(), 0);
        assert_eq!(
            state
                .get_number(
                    &tasks
                        .attribute("snapshot_by_time_offset_task_set")
                        .index(0)
                        .attribute("time_offset_set")
                        .index(0)
                )
                .unwrap(),
            1.5
        );
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/")
            .match_header("x-tc-action", "CreateWorkflow")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "WorkflowName": "flow",
                "Trigger": {
                    "Type": "CosFileUpload",
                    "CosFileUploadTrigger": {"Bucket": "media-1250000000", "Region": "ap-guangzhou"}
                },
                "MediaProcessTask": {"TranscodeTaskSet": [{"Definition": 10}]},
                "TaskPriority": 0
            })))
            .with_body(response_body(serde_json::json!({"WorkflowId": 40001})))
            .create_async()
            .await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeWorkflows")
            .match_body(Matcher::PartialJson(serde_json::json!({"WorkflowIds": [40001]})))
            .with_body(workflow_body("flow", &[10]))
            .create_async()
            .await;

        let plan = planned(Dynamic::Unknown, "flow", &[10]);
        let response = configured(&server.url())
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "tencentcloud_mps_workflow".to_string(),
                    planned_state: plan.clone(),
                    config: plan,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = response.new_state;
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "40001");
        assert_eq!(state.get_string(&AttributePath::new("status")).unwrap(), "Disabled");
        assert_eq!(
            state.get_list(&AttributePath::new("task_notify_config")).unwrap().len(),
            0
        );
        assert_eq!(
            state
                .get_i64(
                    &AttributePath::new("media_process_task")
                        .index(0)
                        .attribute("transcode_task_set")
                        .index(0)
                        .attribute("definition")
                )
                .unwrap(),
            10
        );
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_resets_full_definition() {
        let mut server = Server::new_async().await;
        let reset = server
            .mock("POST", "/")
            .match_header("x-tc-action", "ResetWorkflow")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "WorkflowId": 40001,
                "WorkflowName": "flow",
                "Trigger": {"Type": "CosFileUpload"},
                "MediaProcessTask": {"TranscodeTaskSet": [{"Definition": 10}, {"Definition": 20}]}
            })))
            .with_body(response_body(serde_json::json!({})))
            .create_async()
            .await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeWorkflows")
            .with_body(workflow_body("flow", &[10, 20]))
            .create_async()
            .await;

        let prior = planned(Dynamic::from("40001"), "flow", &[10]);
        let plan = planned(Dynamic::from("40001"), "flow", &[10, 20]);
        let response = configured(&server.url())
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "tencentcloud_mps_workflow".to_string(),
                    prior_state: prior,
                    planned_state: plan.clone(),
                    config: plan,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        reset.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_without_changes_only_reads() {
        let mut server = Server::new_async().await;
        let reset = server
            .mock("POST", "/")
            .match_header("x-tc-action", "ResetWorkflow")
            .expect(0)
            .create_async()
            .await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeWorkflows")
            .with_body(workflow_body("flow", &[10]))
            .create_async()
            .await;

        let state = planned(Dynamic::from("40001"), "flow", &[10]);
        let response = configured(&server.url())
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "tencentcloud_mps_workflow".to_string(),
                    prior_state: state.clone(),
                    planned_state: state.clone(),
                    config: state,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        reset.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_missing_workflow_removes_state() {
        let mut server = Server::new_async().await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeWorkflows")
            .with_body(response_body(serde_json::json!({
                "TotalCount": 0,
                "WorkflowInfoSet": []
            })))
            .create_async()
            .await;

        let response = configured(&server.url())
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "tencentcloud_mps_workflow".to_string(),
                    current_state: planned(Dynamic::from("40001"), "flow", &[10]),
                    private: vec![],
                    provider_meta: None,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_api_error() {
        let mut server = Server::new_async().await;
        let _delete = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DeleteWorkflow")
            .with_body(error_body("FailedOperation.InvalidMpsUser", "not an MPS user"))
            .create_async()
            .await;

        let response = configured(&server.url())
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "tencentcloud_mps_workflow".to_string(),
                    prior_state: planned(Dynamic::from("40001"), "flow", &[10]),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Failed to delete MPS workflow");
    }
}
