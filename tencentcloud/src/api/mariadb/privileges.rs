//! Account privileges

use serde::{Deserialize, Serialize};
use tfplug::Context;

use super::SERVICE;
use crate::api::error::ApiError;
use crate::api::Client;

/// Wildcard used for database, object type and object when reading
/// global privileges.
pub const ALL: &str = "*";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    pub user: String,
    pub host: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyAccountPrivilegesRequest {
    pub instance_ids: Vec<String>,
    pub accounts: Vec<Account>,
    pub global_privileges: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyAccountPrivilegesResponse {
    pub flow_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeAccountPrivilegesRequest {
    pub instance_id: String,
    pub user_name: String,
    pub host: String,
    pub db_name: String,
    #[serde(rename = "Type")]
    pub object_type: String,
    pub object: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeAccountPrivilegesResponse {
    #[serde(default)]
    pub privileges: Vec<String>,
}

/// Privilege operations
pub struct PrivilegesApi<'a> {
    client: &'a Client,
}

impl<'a> PrivilegesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Replace an account's global privileges. Returns the flow to wait on;
    /// an empty list revokes everything.
    pub async fn modify_global(
        &self,
        ctx: &Context,
        instance_id: &str,
        account: &Account,
        privileges: &[String],
    ) -> Result<i64, ApiError> {
        let request = ModifyAccountPrivilegesRequest {
            instance_ids: vec![instance_id.to_string()],
            accounts: vec![account.clone()],
            global_privileges: privileges.to_vec(),
        };
        let response: ModifyAccountPrivilegesResponse =
            self.client.write(ctx, SERVICE, "ModifyAccountPrivileges", &request).await?;
        Ok(response.flow_id)
    }

    /// Global privileges of an account; `None` when the account or instance is gone.
    pub async fn describe_global(
        &self,
        ctx: &Context,
        instance_id: &str,
        account: &Account,
    ) -> Result<Option<Vec<String>>, ApiError> {
        let request = DescribeAccountPrivilegesRequest {
            instance_id: instance_id.to_string(),
            user_name: account.user.clone(),
            host: account.host.clone(),
            db_name: ALL.to_string(),
            object_type: ALL.to_string(),
            object: ALL.to_string(),
        };
        match self
            .client
            .read::<_, DescribeAccountPrivilegesResponse>(ctx, SERVICE, "DescribeAccountPrivileges", &request)
            .await
        {
            Ok(response) => Ok(Some(response.privileges)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, error_body, response_body};
    use mockito::{Matcher, Server};

    fn account() -> Account {
        Account {
            user: "app".to_string(),
            host: "%".to_string(),
        }
    }

    #[tokio::test]
    async fn modify_global_returns_flow_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "ModifyAccountPrivileges")
            .match_body(Matcher::Json(serde_json::json!({
                "InstanceIds": ["tdsql-1"],
                "Accounts": [{"User": "app", "Host": "%"}],
                "GlobalPrivileges": ["SELECT", "INSERT"]
            })))
            .with_body(response_body(serde_json::json!({"FlowId": 1234})))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let flow_id = client
            .mariadb()
            .privileges()
            .modify_global(
                &Context::new(),
                "tdsql-1",
                &account(),
                &["SELECT".to_string(), "INSERT".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(flow_id, 1234);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn describe_global_uses_wildcards() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeAccountPrivileges")
            .match_body(Matcher::Json(serde_json::json!({
                "InstanceId": "tdsql-1",
                "UserName": "app",
                "Host": "%",
                "DbName": "*",
                "Type": "*",
                "Object": "*"
            })))
            .with_body(response_body(serde_json::json!({"Privileges": ["SELECT"]})))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let privileges = client
            .mariadb()
            .privileges()
            .describe_global(&Context::new(), "tdsql-1", &account())
            .await
            .unwrap();

        assert_eq!(privileges, Some(vec!["SELECT".to_string()]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn describe_global_missing_account_is_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(error_body("ResourceNotFound.AccountNotFound", "no account"))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let privileges = client
            .mariadb()
            .privileges()
            .describe_global(&Context::new(), "tdsql-1", &account())
            .await
            .unwrap();
        assert!(privileges.is_none());
    }
}
