#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::test_helpers::{create_test_client, error_body, response_body};
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use tfplug::types::ClientCapabilities;

    fn configured(server_url: &str) -> MpsTranscodeTemplateResource {
        MpsTranscodeTemplateResource {
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

    fn config(bitrate: i64) -> DynamicValue {
        object(vec![
            ("container", Dynamic::from("mp4")),
            ("name", Dynamic::from("hd")),
            ("remove_video", Dynamic::from(0i64)),
            ("remove_audio", Dynamic::from(0i64)),
            (
                "video_template",
                block_value([
                    ("codec", Some(Dynamic::from("libx264"))),
                    ("fps", Some(Dynamic::from(25i64))),
                    ("bitrate", Some(Dynamic::from(bitrate))),
                    ("resolution_adaptive", Some(Dynamic::from("open"))),
                    ("width", Some(Dynamic::from(1280i64))),
                    ("height", Some(Dynamic::from(0i64))),
                    ("gop", None),
                    ("fill_type", None),
                    ("vcrf", None),
                ]),
            ),
            (
                "audio_template",
                block_value([
                    ("codec", Some(Dynamic::from("libfdk_aac"))),
                    ("bitrate", Some(Dynamic::from(128i64))),
                    ("sample_rate", Some(Dynamic::from(44100i64))),
                    ("audio_channel", Some(Dynamic::from(2i64))),
                ]),
            ),
            ("tehd_config", Dynamic::List(vec![])),
        ])
    }

    fn with_id(mut value: DynamicValue, id: Dynamic) -> DynamicValue {
        value.set_value(&AttributePath::new("id"), id).unwrap();
        value
    }

    fn template_body(bitrate: i64) -> String {
        response_body(serde_json::json!({
            "TotalCount": 1,
            "TranscodeTemplateSet": [{
                "Definition": "30001",
                "Container": "mp4",
                "Name": "hd",
                "Comment": "",
                "Type": "Custom",
                "RemoveVideo": 0,
                "RemoveAudio": 0,
                "VideoTemplate": {
                    "Codec": "libx264",
                    "Fps": 25,
                    "Bitrate": bitrate,
                    "ResolutionAdaptive": "open",
                    "Width": 1280,
                    "Height": 0,
                    "Gop": 250,
                    "FillType": "black",
                    "Vcrf": 0
                },
                "AudioTemplate": {
                    "Codec": "libfdk_aac",
                    "Bitrate": 128,
                    "SampleRate": 44100,
                    "AudioChannel": 2
                },
                "TEHDConfig": {"Type": "None"},
                "ContainerType": "Video",
                "CreateTime": "2024-01-01T00:00:00Z",
                "UpdateTime": "2024-01-01T00:00:00Z"
            }]
        }))
    }

    #[tokio::test]
    async fn test_resource_schema() {
        let response = MpsTranscodeTemplateResource::new()
            .schema(Context::new(), ResourceSchemaRequest)
            .await;
        let block = &response.schema.block;
        assert!(block.attribute("container").unwrap().required);
        assert!(block.attribute("type").unwrap().computed);
        let video = block.nested_block("video_template").unwrap();
        assert_eq!(video.max_items, 1);
        assert!(video.block.attribute("codec").unwrap().required);
        assert!(video.block.attribute("gop").unwrap().computed);
        assert!(block.nested_block("tehd_config").is_some());
        let enhance = block.nested_block("enhance_config").unwrap();
        let video_enhance = enhance.block.nested_block("video_enhance").unwrap();
        assert_eq!(video_enhance.block.block_types.len(), 11);
        let super_resolution = video_enhance.block.nested_block("super_resolution").unwrap();
        assert!(super_resolution.block.attribute("size").is_some());
        assert!(super_resolution.block.attribute("intensity").is_none());
    }

    #[test]
    fn test_build_create_request() {
        let request = build_create_request(&config(2000)).unwrap();
        assert_eq!(request.container, "mp4");
        let video = request.video_template.unwrap();
        assert_eq!(video.bitrate, Some(2000));
        assert_eq!(video.gop, None);
        assert_eq!(request.audio_template.unwrap().sample_rate, Some(44100));
        assert!(request.tehd_config.is_none());

        let err = build_create_request(&object(vec![])).unwrap_err();
        assert_eq!(err.summary, "Missing container");
    }

    #[test]
    fn test_enhance_config_builds_and_reads_back() {
        let mut plan = config(2000);
        let video = AttributePath::new("enhance_config").index(0).attribute("video_enhance").index(0);
        plan.set_string(&video.clone().attribute("hdr").index(0).attribute("switch"), "ON")
            .unwrap();
        plan.set_string(&video.clone().attribute("hdr").index(0).attribute("type"), "HDR10")
            .unwrap();
        plan.set_number(
            &video.clone().attribute("sharp_enhance").index(0).attribute("intensity"),
            0.5,
        )
        .unwrap();

        let request = build_create_request(&plan).unwrap();
        let enhance = request.enhance_config.unwrap().video_enhance.unwrap();
        let hdr = enhance.hdr.as_ref().unwrap();
        assert_eq!(hdr.switch.as_deref(), Some("ON"));
        assert_eq!(hdr.item_type.as_deref(), Some("HDR10"));
        assert_eq!(enhance.sharp_enhance.as_ref().unwrap().intensity, Some(0.5));
        assert!(enhance.denoise.is_none());

        let template: TranscodeTemplate = serde_json::from_value(serde_json::json!({
            "Definition": "30001",
            "EnhanceConfig": {"VideoEnhance": {
                "Hdr": {"Switch": "ON", "Type": "HDR10"},
                "FrameRate": {"Switch": "ON", "Fps": 60}
            }}
        }))
        .unwrap();
        let mut state = DynamicValue::new(Dynamic::Map(Default::default()));
        flatten_template(&template, &mut state);
        assert_eq!(
            state.get_string(&video.clone().attribute("hdr").index(0).attribute("type")).unwrap(),
            "HDR10"
        );
        assert_eq!(
            state.get_i64(&video.clone().attribute("frame_rate").index(0).attribute("fps")).unwrap(),
            60
        );
        assert_eq!(state.get_list(&video.attribute("denoise")).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_create_and_flatten() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/")
            .match_header("x-tc-action", "CreateTranscodeTemplate")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "Container": "mp4",
                "VideoTemplate": {"Codec": "libx264", "Bitrate": 2000}
            })))
            .with_body(response_body(serde_json::json!({"Definition": 30001})))
            .create_async()
            .await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeTranscodeTemplates")
            .with_body(template_body(2000))
            .create_async()
            .await;

        let response = configured(&server.url())
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "tencentcloud_mps_transcode_template".to_string(),
                    planned_state: with_id(config(2000), Dynamic::Unknown),
                    config: config(2000),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = response.new_state;
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "30001");
        assert_eq!(state.get_string(&AttributePath::new("type")).unwrap(), "Custom");
        assert!(state.get(&AttributePath::new("comment")).unwrap().is_null());
        assert_eq!(
            state
                .get_i64(&AttributePath::new("video_template").index(0).attribute("gop"))
                .unwrap(),
            250
        );
        assert_eq!(
            state.get_list(&AttributePath::new("tehd_config")).unwrap().len(),
            0
        );
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_modifies_changed_video_block() {
        let mut server = Server::new_async().await;
        let modify = server
            .mock("POST", "/")
            .match_header("x-tc-action", "ModifyTranscodeTemplate")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "Definition": 30001,
                "VideoTemplate": {"Bitrate": 4000}
            })))
            .with_body(response_body(serde_json::json!({})))
            .create_async()
            .await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeTranscodeTemplates")
            .with_body(template_body(4000))
            .create_async()
            .await;

        let prior = with_id(config(2000), Dynamic::from("30001"));
        let planned = with_id(config(4000), Dynamic::from("30001"));
        let response = configured(&server.url())
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "tencentcloud_mps_transcode_template".to_string(),
                    prior_state: prior,
                    planned_state: planned.clone(),
                    config: config(4000),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response
                .new_state
                .get_i64(&AttributePath::new("video_template").index(0).attribute("bitrate"))
                .unwrap(),
            4000
        );
        modify.assert_async().await;
    }

    #[test]
    fn test_modify_request_skips_unchanged_blocks() {
        let prior = config(2000);
        let modify = build_modify_request(30001, &prior, &config(2000));
        assert!(modify.is_empty());
    }

    #[tokio::test]
    async fn test_read_missing_template_removes_state() {
        let mut server = Server::new_async().await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeTranscodeTemplates")
            .with_body(error_body("ResourceNotFound.TemplateNotExist", "gone"))
            .create_async()
            .await;

        let response = configured(&server.url())
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "tencentcloud_mps_transcode_template".to_string(),
                    current_state: with_id(config(2000), Dynamic::from("30001")),
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
            .match_header("x-tc-action", "DeleteTranscodeTemplate")
            .with_body(error_body("InvalidParameterValue.Definition", "preset template"))
            .create_async()
            .await;

        let response = configured(&server.url())
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "tencentcloud_mps_transcode_template".to_string(),
                    prior_state: with_id(config(2000), Dynamic::from("30001")),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0]
            .detail
            .contains("InvalidParameterValue.Definition"));
    }
}
