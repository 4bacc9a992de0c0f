//! Security group bindings

use serde::{Deserialize, Serialize};
use tfplug::Context;

use super::SERVICE;
use crate::api::error::ApiError;
use crate::api::{Client, EmptyResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupsBindingRequest {
    pub product: String,
    pub security_group_id: String,
    pub instance_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDBSecurityGroupsRequest {
    pub product: String,
    pub instance_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDBSecurityGroupsResponse {
    #[serde(default)]
    pub groups: Vec<SecurityGroup>,
    #[serde(rename = "VIP", default)]
    pub vip: Option<String>,
    #[serde(rename = "VPort", default)]
    pub vport: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SecurityGroup {
    pub project_id: Option<i64>,
    pub create_time: Option<String>,
    pub security_group_id: String,
    pub security_group_name: Option<String>,
    pub security_group_remark: Option<String>,
}

/// Security group operations
pub struct SecurityGroupsApi<'a> {
    client: &'a Client,
}

impl<'a> SecurityGroupsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn associate(
        &self,
        ctx: &Context,
        product: &str,
        security_group_id: &str,
        instance_id: &str,
    ) -> Result<(), ApiError> {
        let request = binding(product, security_group_id, instance_id);
        let _: EmptyResponse = self.client.write(ctx, SERVICE, "AssociateSecurityGroups", &request).await?;
        Ok(())
    }

    pub async fn disassociate(
        &self,
        ctx: &Context,
        product: &str,
        security_group_id: &str,
        instance_id: &str,
    ) -> Result<(), ApiError> {
        let request = binding(product, security_group_id, instance_id);
        let _: EmptyResponse =
            self.client.write(ctx, SERVICE, "DisassociateSecurityGroups", &request).await?;
        Ok(())
    }

    /// Groups bound to an instance; empty when the instance is gone.
    pub async fn list(
        &self,
        ctx: &Context,
        product: &str,
        instance_id: &str,
    ) -> Result<Vec<SecurityGroup>, ApiError> {
        let request = DescribeDBSecurityGroupsRequest {
            product: product.to_string(),
            instance_id: instance_id.to_string(),
        };
        match self
            .client
            .read::<_, DescribeDBSecurityGroupsResponse>(ctx, SERVICE, "DescribeDBSecurityGroups", &request)
            .await
        {
            Ok(response) => Ok(response.groups),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

fn binding(product: &str, security_group_id: &str, instance_id: &str) -> SecurityGroupsBindingRequest {
    SecurityGroupsBindingRequest {
        product: product.to_string(),
        security_group_id: security_group_id.to_string(),
        instance_ids: vec![instance_id.to_string()],
    }
}
