#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::test_helpers::{create_test_client, error_body, response_body};
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use tfplug::types::ClientCapabilities;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    fn configured(server_url: &str) -> MpsWatermarkTemplateResource {
        MpsWatermarkTemplateResource {
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

    fn image_config() -> DynamicValue {
        object(vec![
            ("type", Dynamic::from("image")),
            ("name", Dynamic::from("logo")),
            ("coordinate_origin", Dynamic::from("TopLeft")),
            ("x_pos", Dynamic::from("10%")),
            ("y_pos", Dynamic::from("10%")),
            (
                "image_template",
                block_value([
                    ("image_content", Some(Dynamic::from(STANDARD.encode(PNG)))),
                    ("width", Some(Dynamic::from("10%"))),
                    ("height", None),
                    ("repeat_type", None),
                ]),
            ),
        ])
    }

    fn text_state(font_size: &str) -> DynamicValue {
        object(vec![
            ("id", Dynamic::from("20001")),
            ("type", Dynamic::from("text")),
            ("name", Dynamic::from("caption")),
            ("comment", Dynamic::Null),
            ("coordinate_origin", Dynamic::from("TopLeft")),
            ("x_pos", Dynamic::from("0px")),
            ("y_pos", Dynamic::from("0px")),
            ("image_template", Dynamic::List(vec![])),
            (
                "text_template",
                block_value([
                    ("font_type", Some(Dynamic::from("arial.ttf"))),
                    ("font_size", Some(Dynamic::from(font_size))),
                    ("font_color", Some(Dynamic::from("0xFFFFFF"))),
                    ("font_alpha", Some(Dynamic::Number(1.0))),
                ]),
            ),
            ("svg_template", Dynamic::List(vec![])),
        ])
    }

    fn image_template_body(url: &str) -> String {
        response_body(serde_json::json!({
            "TotalCount": 1,
            "WatermarkTemplateSet": [{
                "Definition": 10086,
                "Type": "image",
                "Name": "logo",
                "CoordinateOrigin": "TopLeft",
                "XPos": "10%",
                "YPos": "10%",
                "ImageTemplate": {
                    "ImageUrl": url,
                    "Width": "10%",
                    "Height": "0px",
                    "RepeatType": "repeat"
                },
                "CreateTime": "2024-01-01T00:00:00Z",
                "UpdateTime": "2024-01-01T00:00:00Z"
            }]
        }))
    }

    #[tokio::test]
    async fn test_resource_schema() {
        let response = MpsWatermarkTemplateResource::new()
            .schema(Context::new(), ResourceSchemaRequest)
            .await;
        let block = &response.schema.block;
        let watermark_type = block.attribute("type").unwrap();
        assert!(watermark_type.required);
        assert_eq!(watermark_type.plan_modifiers.len(), 1);
        for name in ["name", "comment", "coordinate_origin", "x_pos", "y_pos"] {
            let attr = block.attribute(name).unwrap();
            assert!(attr.optional && attr.computed, "{} should be optional+computed", name);
        }
        for name in ["image_template", "text_template", "svg_template"] {
            assert_eq!(block.nested_block(name).unwrap().max_items, 1);
        }
    }

    #[test]
    fn test_image_watermark_requires_content() {
        let config = object(vec![("type", Dynamic::from("image"))]);
        let err = build_create_request(&config).unwrap_err();
        assert_eq!(err.summary, "Missing image_template");

        let request = build_create_request(&image_config()).unwrap();
        assert_eq!(request.watermark_type, "image");
        let image = request.image_template.unwrap();
        assert_eq!(image.image_content, Some(STANDARD.encode(PNG)));
        assert_eq!(image.height, None);
        assert!(request.text_template.is_none());
    }

    #[test]
    fn test_modify_request_carries_only_changes() {
        let prior = text_state("16px");
        let unchanged = build_modify_request(20001, &prior, &prior);
        assert!(unchanged.is_empty());

        let config = text_state("24px");
        let modify = build_modify_request(20001, &prior, &config);
        assert!(modify.name.is_none());
        assert_eq!(
            modify.text_template.unwrap().font_size.as_deref(),
            Some("24px")
        );
    }

    #[tokio::test]
    async fn test_create_reads_back_image_content() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/")
            .match_header("x-tc-action", "CreateWatermarkTemplate")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "Type": "image",
                "Name": "logo",
                "ImageTemplate": {"ImageContent": STANDARD.encode(PNG), "Width": "10%"}
            })))
            .with_body(response_body(serde_json::json!({"Definition": 10086})))
            .create_async()
            .await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeWatermarkTemplates")
            .with_body(image_template_body(&format!("{}/watermark/logo.png", server.url())))
            .create_async()
            .await;
        let image = server
            .mock("GET", "/watermark/logo.png")
            .with_body(PNG)
            .create_async()
            .await;

        let mut planned = image_config();
        planned.set_value(&AttributePath::new("id"), Dynamic::Unknown).unwrap();
        let response = configured(&server.url())
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "tencentcloud_mps_watermark_template".to_string(),
                    planned_state: planned,
                    config: image_config(),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = response.new_state;
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "10086");
        assert_eq!(
            state
                .get_string(&AttributePath::new("image_template").index(0).attribute("image_content"))
                .unwrap(),
            STANDARD.encode(PNG)
        );
        assert_eq!(
            state
                .get_string(&AttributePath::new("image_template").index(0).attribute("repeat_type"))
                .unwrap(),
            "repeat"
        );
        create.assert_async().await;
        image.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_keeps_id_when_read_back_fails() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/")
            .match_header("x-tc-action", "CreateWatermarkTemplate")
            .with_body(response_body(serde_json::json!({"Definition": 10086})))
            .create_async()
            .await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeWatermarkTemplates")
            .with_body(error_body("AuthFailure.UnauthorizedOperation", "denied"))
            .create_async()
            .await;

        let mut planned = image_config();
        planned.set_value(&AttributePath::new("id"), Dynamic::Unknown).unwrap();
        planned.set_value(&AttributePath::new("comment"), Dynamic::Unknown).unwrap();
        let response = configured(&server.url())
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "tencentcloud_mps_watermark_template".to_string(),
                    planned_state: planned,
                    config: image_config(),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.new_state.get_string(&AttributePath::new("id")).unwrap(),
            "10086"
        );
        assert!(!response.new_state.contains_unknown());
    }

    #[tokio::test]
    async fn test_read_missing_template_removes_state() {
        let mut server = Server::new_async().await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeWatermarkTemplates")
            .with_body(response_body(serde_json::json!({
                "TotalCount": 0,
                "WatermarkTemplateSet": []
            })))
            .create_async()
            .await;

        let response = configured(&server.url())
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "tencentcloud_mps_watermark_template".to_string(),
                    current_state: text_state("16px"),
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
    async fn test_update_sends_changed_text_template() {
        let mut server = Server::new_async().await;
        let modify = server
            .mock("POST", "/")
            .match_header("x-tc-action", "ModifyWatermarkTemplate")
            .match_body(Matcher::Json(serde_json::json!({
                "Definition": 20001,
                "TextTemplate": {
                    "FontType": "arial.ttf",
                    "FontSize": "24px",
                    "FontColor": "0xFFFFFF",
                    "FontAlpha": 1.0
                }
            })))
            .with_body(response_body(serde_json::json!({})))
            .create_async()
            .await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeWatermarkTemplates")
            .with_body(response_body(serde_json::json!({
                "TotalCount": 1,
                "WatermarkTemplateSet": [{
                    "Definition": "20001",
                    "Type": "text",
                    "Name": "caption",
                    "CoordinateOrigin": "TopLeft",
                    "XPos": "0px",
                    "YPos": "0px",
                    "TextTemplate": {
                        "FontType": "arial.ttf",
                        "FontSize": "24px",
                        "FontColor": "0xFFFFFF",
                        "FontAlpha": 1.0
                    }
                }]
            })))
            .create_async()
            .await;

        let planned = text_state("24px");
        let response = configured(&server.url())
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "tencentcloud_mps_watermark_template".to_string(),
                    prior_state: text_state("16px"),
                    planned_state: planned.clone(),
                    config: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response
                .new_state
                .get_string(&AttributePath::new("text_template").index(0).attribute("font_size"))
                .unwrap(),
            "24px"
        );
        modify.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_ignores_missing_template() {
        let mut server = Server::new_async().await;
        let _delete = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DeleteWatermarkTemplate")
            .with_body(error_body("ResourceNotFound.TemplateNotExist", "gone"))
            .create_async()
            .await;

        let response = configured(&server.url())
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "tencentcloud_mps_watermark_template".to_string(),
                    prior_state: text_state("16px"),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    }

    #[tokio::test]
    async fn test_import_rejects_non_numeric_id() {
        let response = MpsWatermarkTemplateResource::new()
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "tencentcloud_mps_watermark_template".to_string(),
                    id: "logo".to_string(),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert_eq!(response.diagnostics[0].summary, "Invalid resource ID");
    }
}
