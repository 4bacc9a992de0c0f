//! Database accounts

use serde::{Deserialize, Serialize};
use tfplug::Context;

use super::SERVICE;
use crate::api::error::ApiError;
use crate::api::{Client, EmptyResponse};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAccountRequest {
    pub instance_id: String,
    pub user_name: String,
    pub host: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeAccountsRequest {
    pub instance_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeAccountsResponse {
    #[serde(default)]
    pub users: Vec<DBAccount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DBAccount {
    pub user_name: String,
    pub host: String,
    pub description: Option<String>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
    pub read_only: Option<i64>,
    pub delay_thresh: Option<i64>,
}

/// Identifies one account on one instance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountKey {
    pub instance_id: String,
    pub user_name: String,
    pub host: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ModifyAccountDescriptionRequest<'a> {
    #[serde(flatten)]
    key: &'a AccountKey,
    description: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResetAccountPasswordRequest<'a> {
    #[serde(flatten)]
    key: &'a AccountKey,
    password: &'a str,
}

/// Account operations
pub struct AccountsApi<'a> {
    client: &'a Client,
}

impl<'a> AccountsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, ctx: &Context, request: &CreateAccountRequest) -> Result<(), ApiError> {
        let _: EmptyResponse = self.client.write(ctx, SERVICE, "CreateAccount", request).await?;
        Ok(())
    }

    pub async fn list(&self, ctx: &Context, instance_id: &str) -> Result<Vec<DBAccount>, ApiError> {
        let request = DescribeAccountsRequest {
            instance_id: instance_id.to_string(),
        };
        let response: DescribeAccountsResponse =
            self.client.read(ctx, SERVICE, "DescribeAccounts", &request).await?;
        Ok(response.users)
    }

    /// `None` when either the account or its instance is gone.
    pub async fn get(&self, ctx: &Context, key: &AccountKey) -> Result<Option<DBAccount>, ApiError> {
        match self.list(ctx, &key.instance_id).await {
            Ok(users) => Ok(users
                .into_iter()
                .find(|u| u.user_name == key.user_name && u.host == key.host)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn modify_description(
        &self,
        ctx: &Context,
        key: &AccountKey,
        description: &str,
    ) -> Result<(), ApiError> {
        let request = ModifyAccountDescriptionRequest { key, description };
        let _: EmptyResponse =
            self.client.write(ctx, SERVICE, "ModifyAccountDescription", &request).await?;
        Ok(())
    }

    pub async fn reset_password(
        &self,
        ctx: &Context,
        key: &AccountKey,
        password: &str,
    ) -> Result<(), ApiError> {
        let request = ResetAccountPasswordRequest { key, password };
        let _: EmptyResponse = self.client.write(ctx, SERVICE, "ResetAccountPassword", &request).await?;
        Ok(())
    }

    pub async fn delete(&self, ctx: &Context, key: &AccountKey) -> Result<(), ApiError> {
        let _: EmptyResponse = self.client.write(ctx, SERVICE, "DeleteAccount", key).await?;
        Ok(())
    }
}
