//! Watermark templates

use serde::{Deserialize, Serialize};
use tfplug::Context;

use super::{deserialize_definition, SERVICE};
use crate::api::error::ApiError;
use crate::api::{Client, EmptyResponse};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ImageWatermarkInput {
    /// Base64 image, only sent on create or when it changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ImageWatermarkTemplate {
    pub image_url: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub repeat_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct TextWatermarkTemplateInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_alpha: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct SvgWatermarkInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateWatermarkTemplateRequest {
    #[serde(rename = "Type")]
    pub watermark_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_pos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_pos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_template: Option<ImageWatermarkInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_template: Option<TextWatermarkTemplateInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg_template: Option<SvgWatermarkInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateWatermarkTemplateResponse {
    pub definition: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Only the fields that changed are set.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyWatermarkTemplateRequest {
    pub definition: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_pos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_pos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_template: Option<ImageWatermarkInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_template: Option<TextWatermarkTemplateInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg_template: Option<SvgWatermarkInput>,
}

impl ModifyWatermarkTemplateRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.comment.is_none()
            && self.coordinate_origin.is_none()
            && self.x_pos.is_none()
            && self.y_pos.is_none()
            && self.image_template.is_none()
            && self.text_template.is_none()
            && self.svg_template.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeWatermarkTemplatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Vec<i64>>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub watermark_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeWatermarkTemplatesResponse {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub watermark_template_set: Vec<WatermarkTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WatermarkTemplate {
    #[serde(deserialize_with = "deserialize_definition")]
    pub definition: i64,
    #[serde(rename = "Type", default)]
    pub watermark_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub x_pos: Option<String>,
    #[serde(default)]
    pub y_pos: Option<String>,
    #[serde(default)]
    pub coordinate_origin: Option<String>,
    #[serde(default)]
    pub image_template: Option<ImageWatermarkTemplate>,
    #[serde(default)]
    pub text_template: Option<TextWatermarkTemplateInput>,
    #[serde(default)]
    pub svg_template: Option<SvgWatermarkInput>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteWatermarkTemplateRequest {
    definition: i64,
}

/// Watermark template operations
pub struct WatermarkTemplatesApi<'a> {
    client: &'a Client,
}

impl<'a> WatermarkTemplatesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Returns the new template's definition.
    pub async fn create(
        &self,
        ctx: &Context,
        request: &CreateWatermarkTemplateRequest,
    ) -> Result<i64, ApiError> {
        let response: CreateWatermarkTemplateResponse =
            self.client.write(ctx, SERVICE, "CreateWatermarkTemplate", request).await?;
        Ok(response.definition)
    }

    pub async fn get(&self, ctx: &Context, definition: i64) -> Result<Option<WatermarkTemplate>, ApiError> {
        let request = DescribeWatermarkTemplatesRequest {
            definitions: Some(vec![definition]),
            ..Default::default()
        };
        match self
            .client
            .read::<_, DescribeWatermarkTemplatesResponse>(ctx, SERVICE, "DescribeWatermarkTemplates", &request)
            .await
        {
            Ok(response) => Ok(response
                .watermark_template_set
                .into_iter()
                .find(|t| t.definition == definition)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn modify(
        &self,
        ctx: &Context,
        request: &ModifyWatermarkTemplateRequest,
    ) -> Result<(), ApiError> {
        let _: EmptyResponse = self.client.write(ctx, SERVICE, "ModifyWatermarkTemplate", request).await?;
        Ok(())
    }

    pub async fn delete(&self, ctx: &Context, definition: i64) -> Result<(), ApiError> {
        let request = DeleteWatermarkTemplateRequest { definition };
        let _: EmptyResponse = self.client.write(ctx, SERVICE, "DeleteWatermarkTemplate", &request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, response_body};
    use mockito::{Matcher, Server};

    #[test]
    fn create_request_uses_vendor_field_names() {
        let request = CreateWatermarkTemplateRequest {
            watermark_type: "text".to_string(),
            x_pos: Some("10%".to_string()),
            text_template: Some(TextWatermarkTemplateInput {
                font_type: Some("arial.ttf".to_string()),
                font_size: Some("16px".to_string()),
                font_color: Some("0xFF0000".to_string()),
                font_alpha: Some(0.8),
            }),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "Type": "text",
                "XPos": "10%",
                "TextTemplate": {
                    "FontType": "arial.ttf",
                    "FontSize": "16px",
                    "FontColor": "0xFF0000",
                    "FontAlpha": 0.8
                }
            })
        );
    }

    #[test]
    fn empty_modify_request_is_detected() {
        let mut request = ModifyWatermarkTemplateRequest {
            definition: 1,
            ..Default::default()
        };
        assert!(request.is_empty());
        request.comment = Some("new".to_string());
        assert!(!request.is_empty());
    }

    #[tokio::test]
    async fn get_finds_template_by_definition() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeWatermarkTemplates")
            .match_body(Matcher::Json(serde_json::json!({"Definitions": [505]})))
            .with_body(response_body(serde_json::json!({
                "TotalCount": 1,
                "WatermarkTemplateSet": [{
                    "Definition": 505,
                    "Type": "image",
                    "Name": "logo",
                    "XPos": "10px",
                    "YPos": "20px",
                    "CoordinateOrigin": "TopLeft",
                    "ImageTemplate": {
                        "ImageUrl": "https://example.com/logo.png",
                        "Width": "10%",
                        "Height": "0px",
                        "RepeatType": "repeat"
                    }
                }]
            })))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let template = client
            .mps()
            .watermark_templates()
            .get(&Context::new(), 505)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(template.watermark_type.as_deref(), Some("image"));
        let image = template.image_template.unwrap();
        assert_eq!(image.image_url.as_deref(), Some("https://example.com/logo.png"));
        assert_eq!(image.repeat_type.as_deref(), Some("repeat"));
    }

    #[tokio::test]
    async fn get_missing_template_is_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(response_body(serde_json::json!({
                "TotalCount": 0,
                "WatermarkTemplateSet": []
            })))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let template = client
            .mps()
            .watermark_templates()
            .get(&Context::new(), 1)
            .await
            .unwrap();
        assert!(template.is_none());
    }
}
