//! Transcode templates

use serde::{Deserialize, Serialize};
use tfplug::Context;

use super::{deserialize_definition, PAGE_LIMIT, SERVICE};
use crate::api::error::ApiError;
use crate::api::{Client, EmptyResponse};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct VideoTemplateInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_adaptive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gop: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcrf: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct AudioTemplateInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_channel: Option<i64>,
}

/// Top speed codec settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct TehdConfig {
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub tehd_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_video_bitrate: Option<i64>,
}

/// One enhancement capability. Each capability uses `switch` plus a subset
/// of the remaining fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct EnhanceItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<String>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct VideoEnhanceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<EnhanceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub super_resolution: Option<EnhanceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdr: Option<EnhanceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denoise: Option<EnhanceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_quality_enhance: Option<EnhanceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_enhance: Option<EnhanceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharp_enhance: Option<EnhanceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_enhance: Option<EnhanceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_light_enhance: Option<EnhanceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_repair: Option<EnhanceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_repair: Option<EnhanceItem>,
}

impl VideoEnhanceConfig {
    /// Capabilities keyed by their snake_case name.
    pub fn items(&self) -> [(&'static str, &Option<EnhanceItem>); 11] {
        [
            ("frame_rate", &self.frame_rate),
            ("super_resolution", &self.super_resolution),
            ("hdr", &self.hdr),
            ("denoise", &self.denoise),
            ("image_quality_enhance", &self.image_quality_enhance),
            ("color_enhance", &self.color_enhance),
            ("sharp_enhance", &self.sharp_enhance),
            ("face_enhance", &self.face_enhance),
            ("low_light_enhance", &self.low_light_enhance),
            ("scratch_repair", &self.scratch_repair),
            ("artifact_repair", &self.artifact_repair),
        ]
    }

    pub fn items_mut(&mut self) -> [(&'static str, &mut Option<EnhanceItem>); 11] {
        [
            ("frame_rate", &mut self.frame_rate),
            ("super_resolution", &mut self.super_resolution),
            ("hdr", &mut self.hdr),
            ("denoise", &mut self.denoise),
            ("image_quality_enhance", &mut self.image_quality_enhance),
            ("color_enhance", &mut self.color_enhance),
            ("sharp_enhance", &mut self.sharp_enhance),
            ("face_enhance", &mut self.face_enhance),
            ("low_light_enhance", &mut self.low_light_enhance),
            ("scratch_repair", &mut self.scratch_repair),
            ("artifact_repair", &mut self.artifact_repair),
        ]
    }
}

/// Audio and video enhancement settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct EnhanceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_enhance: Option<VideoEnhanceConfig>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTranscodeTemplateRequest {
    pub container: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_video: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_audio: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_template: Option<VideoTemplateInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_template: Option<AudioTemplateInfo>,
    #[serde(rename = "TEHDConfig", skip_serializing_if = "Option::is_none")]
    pub tehd_config: Option<TehdConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhance_config: Option<EnhanceConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTranscodeTemplateResponse {
    pub definition: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyTranscodeTemplateRequest {
    pub definition: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_video: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_audio: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_template: Option<VideoTemplateInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_template: Option<AudioTemplateInfo>,
    #[serde(rename = "TEHDConfig", skip_serializing_if = "Option::is_none")]
    pub tehd_config: Option<TehdConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhance_config: Option<EnhanceConfig>,
}

impl ModifyTranscodeTemplateRequest {
    pub fn is_empty(&self) -> bool {
        self.container.is_none()
            && self.name.is_none()
            && self.comment.is_none()
            && self.remove_video.is_none()
            && self.remove_audio.is_none()
            && self.video_template.is_none()
            && self.audio_template.is_none()
            && self.tehd_config.is_none()
            && self.enhance_config.is_none()
    }
}

/// Filters for listing templates; offset and limit are managed by `list`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeTranscodeTemplatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Vec<i64>>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub template_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_type: Option<String>,
    #[serde(rename = "TEHDType", skip_serializing_if = "Option::is_none")]
    pub tehd_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcode_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeTranscodeTemplatesResponse {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub transcode_template_set: Vec<TranscodeTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TranscodeTemplate {
    #[serde(deserialize_with = "deserialize_definition")]
    pub definition: i64,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(rename = "Type", default)]
    pub template_type: Option<String>,
    #[serde(default)]
    pub remove_video: Option<i64>,
    #[serde(default)]
    pub remove_audio: Option<i64>,
    #[serde(default)]
    pub video_template: Option<VideoTemplateInfo>,
    #[serde(default)]
    pub audio_template: Option<AudioTemplateInfo>,
    #[serde(rename = "TEHDConfig", default)]
    pub tehd_config: Option<TehdConfig>,
    #[serde(default)]
    pub enhance_config: Option<EnhanceConfig>,
    #[serde(default)]
    pub container_type: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteTranscodeTemplateRequest {
    definition: i64,
}

/// Transcode template operations
pub struct TranscodeTemplatesApi<'a> {
    client: &'a Client,
}

impl<'a> TranscodeTemplatesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        ctx: &Context,
        request: &CreateTranscodeTemplateRequest,
    ) -> Result<i64, ApiError> {
        let response: CreateTranscodeTemplateResponse =
            self.client.write(ctx, SERVICE, "CreateTranscodeTemplate", request).await?;
        Ok(response.definition)
    }

    /// Every template matching the filters, one page of 100 at a time.
    pub async fn list(
        &self,
        ctx: &Context,
        filter: &DescribeTranscodeTemplatesRequest,
    ) -> Result<Vec<TranscodeTemplate>, ApiError> {
        let mut templates = Vec::new();
        let mut offset = 0;

        loop {
            let request = DescribeTranscodeTemplatesRequest {
                offset: Some(offset),
                limit: Some(PAGE_LIMIT),
                ..filter.clone()
            };
            let response: DescribeTranscodeTemplatesResponse =
                self.client.read(ctx, SERVICE, "DescribeTranscodeTemplates", &request).await?;

            let page = response.transcode_template_set.len() as i64;
            templates.extend(response.transcode_template_set);
            offset += page;
            if page < PAGE_LIMIT || offset >= response.total_count {
                break;
            }
        }

        Ok(templates)
    }

    pub async fn get(&self, ctx: &Context, definition: i64) -> Result<Option<TranscodeTemplate>, ApiError> {
        let filter = DescribeTranscodeTemplatesRequest {
            definitions: Some(vec![definition]),
            ..Default::default()
        };
        match self.list(ctx, &filter).await {
            Ok(templates) => Ok(templates.into_iter().find(|t| t.definition == definition)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn modify(
        &self,
        ctx: &Context,
        request: &ModifyTranscodeTemplateRequest,
    ) -> Result<(), ApiError> {
        let _: EmptyResponse = self.client.write(ctx, SERVICE, "ModifyTranscodeTemplate", request).await?;
        Ok(())
    }

    pub async fn delete(&self, ctx: &Context, definition: i64) -> Result<(), ApiError> {
        let request = DeleteTranscodeTemplateRequest { definition };
        let _: EmptyResponse = self.client.write(ctx, SERVICE, "DeleteTranscodeTemplate", &request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, response_body};
    use mockito::{Matcher, Server};

    #[test]
    fn tehd_fields_use_upper_case_names() {
        let request = CreateTranscodeTemplateRequest {
            container: "mp4".to_string(),
            tehd_config: Some(TehdConfig {
                tehd_type: Some("TEHD-100".to_string()),
                max_video_bitrate: Some(2000),
            }),
            ..Default::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["TEHDConfig"]["Type"], "TEHD-100");
        assert_eq!(value["TEHDConfig"]["MaxVideoBitrate"], 2000);

        let filter = DescribeTranscodeTemplatesRequest {
            tehd_type: Some("TEHD".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            serde_json::json!({"TEHDType": "TEHD"})
        );
    }

    #[test]
    fn enhance_config_nests_video_capabilities() {
        let request = ModifyTranscodeTemplateRequest {
            definition: 1001,
            enhance_config: Some(EnhanceConfig {
                video_enhance: Some(VideoEnhanceConfig {
                    super_resolution: Some(EnhanceItem {
                        switch: Some("ON".to_string()),
                        item_type: Some("lq".to_string()),
                        size: Some(2),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        };
        assert!(!request.is_empty());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "Definition": 1001,
                "EnhanceConfig": {"VideoEnhance": {
                    "SuperResolution": {"Switch": "ON", "Type": "lq", "Size": 2}
                }}
            })
        );

        let template: TranscodeTemplate = serde_json::from_value(serde_json::json!({
            "Definition": 1001,
            "EnhanceConfig": {"VideoEnhance": {"Hdr": {"Switch": "ON", "Type": "HDR10"}, "Denoise": null}}
        }))
        .unwrap();
        let video = template.enhance_config.unwrap().video_enhance.unwrap();
        let enabled: Vec<_> = video
            .items()
            .into_iter()
            .filter(|(_, item)| item.is_some())
            .map(|(name, _)| name)
            .collect();
        assert_eq!(enabled, vec!["hdr"]);
    }

    #[tokio::test]
    async fn list_walks_every_page() {
        let mut server = Server::new_async().await;
        let first: Vec<serde_json::Value> = (0..100)
            .map(|i| serde_json::json!({"Definition": format!("{}", 1000 + i), "Container": "mp4"}))
            .collect();
        let _first = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeTranscodeTemplates")
            .match_body(Matcher::PartialJson(serde_json::json!({"Offset": 0, "Limit": 100})))
            .with_body(response_body(serde_json::json!({
                "TotalCount": 101,
                "TranscodeTemplateSet": first
            })))
            .create_async()
            .await;
        let _second = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeTranscodeTemplates")
            .match_body(Matcher::PartialJson(serde_json::json!({"Offset": 100})))
            .with_body(response_body(serde_json::json!({
                "TotalCount": 101,
                "TranscodeTemplateSet": [{"Definition": "2000", "Container": "hls"}]
            })))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let templates = client
            .mps()
            .transcode_templates()
            .list(&Context::new(), &DescribeTranscodeTemplatesRequest::default())
            .await
            .unwrap();

        assert_eq!(templates.len(), 101);
        assert_eq!(templates[100].definition, 2000);
        assert_eq!(templates[100].container.as_deref(), Some("hls"));
    }

    #[tokio::test]
    async fn delete_sends_definition() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DeleteTranscodeTemplate")
            .match_body(Matcher::Json(serde_json::json!({"Definition": 1234})))
            .with_body(response_body(serde_json::json!({})))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        client
            .mps()
            .transcode_templates()
            .delete(&Context::new(), 1234)
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
