//! Tag service: resource tags shared by every product.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tfplug::Context;

use super::error::ApiError;
use super::{Client, EmptyResponse, Service};

pub const SERVICE: Service = Service {
    name: "tag",
    version: "2018-08-13",
};

const PAGE_LIMIT: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub tag_key: String,
    pub tag_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct TagKeyObject {
    pub tag_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyResourceTagsRequest {
    pub resource: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replace_tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub delete_tags: Vec<TagKeyObject>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeResourceTagsByResourceIdsRequest {
    pub service_type: String,
    pub resource_prefix: String,
    pub resource_ids: Vec<String>,
    pub resource_region: String,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeResourceTagsByResourceIdsResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub tags: Vec<ResourceTag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceTag {
    pub tag_key: String,
    pub tag_value: String,
    #[serde(default)]
    pub resource_id: String,
}

/// Six-segment resource name, `qcs::<service>:<region>:uin/:<type>/<id>`.
pub fn build_resource_name(service: &str, resource_type: &str, region: &str, id: &str) -> String {
    format!("qcs::{}:{}:uin/:{}/{}", service, region, resource_type, id)
}

pub struct TagApi<'a> {
    client: &'a Client,
}

impl<'a> TagApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Apply replacements and deletions to a resource; no call when both are empty.
    pub async fn modify_tags(
        &self,
        ctx: &Context,
        resource_name: &str,
        replace: &HashMap<String, String>,
        delete: &[String],
    ) -> Result<(), ApiError> {
        if replace.is_empty() && delete.is_empty() {
            return Ok(());
        }

        let mut replace_tags: Vec<Tag> = replace
            .iter()
            .map(|(k, v)| Tag {
                tag_key: k.clone(),
                tag_value: v.clone(),
            })
            .collect();
        replace_tags.sort_by(|a, b| a.tag_key.cmp(&b.tag_key));

        let request = ModifyResourceTagsRequest {
            resource: resource_name.to_string(),
            replace_tags,
            delete_tags: delete
                .iter()
                .map(|k| TagKeyObject { tag_key: k.clone() })
                .collect(),
        };

        let _: EmptyResponse = self
            .client
            .write(ctx, SERVICE, "ModifyResourceTags", &request)
            .await?;
        Ok(())
    }

    /// All tags on one resource.
    pub async fn describe_resource_tags(
        &self,
        ctx: &Context,
        service_type: &str,
        resource_prefix: &str,
        region: &str,
        resource_id: &str,
    ) -> Result<HashMap<String, String>, ApiError> {
        let mut tags = HashMap::new();
        let mut offset = 0;

        loop {
            let request = DescribeResourceTagsByResourceIdsRequest {
                service_type: service_type.to_string(),
                resource_prefix: resource_prefix.to_string(),
                resource_ids: vec![resource_id.to_string()],
                resource_region: region.to_string(),
                offset,
                limit: PAGE_LIMIT,
            };
            let response: DescribeResourceTagsByResourceIdsResponse = self
                .client
                .read(ctx, SERVICE, "DescribeResourceTagsByResourceIds", &request)
                .await?;

            let page = response.tags.len() as u64;
            for tag in response.tags {
                if tag.resource_id.is_empty() || tag.resource_id == resource_id {
                    tags.insert(tag.tag_key, tag.tag_value);
                }
            }

            offset += page;
            if page < PAGE_LIMIT || offset >= response.total_count {
                break;
            }
        }

        Ok(tags)
    }
}
