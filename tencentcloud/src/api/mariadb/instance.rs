//! MariaDB instance lifecycle

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tfplug::Context;

use super::SERVICE;
use crate::api::error::ApiError;
use crate::api::retry::{poll_until, PollStatus};
use crate::api::tag::Tag;
use crate::api::{Client, EmptyResponse};

const PAGE_LIMIT: i64 = 100;

/// Instance status values reported by `DescribeDBInstances`.
pub const STATUS_ISOLATED: i64 = -1;
pub const STATUS_CREATING: i64 = 0;
pub const STATUS_PROCESSING: i64 = 1;
pub const STATUS_RUNNING: i64 = 2;
pub const STATUS_INITIALIZING: i64 = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DBParamValue {
    pub param: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDBInstanceRequest {
    pub zones: Vec<String>,
    pub node_count: i64,
    pub memory: i64,
    pub storage: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_voucher: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_version_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_group_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_renew_flag: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_flag: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_tags: Option<Vec<Tag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_params: Option<Vec<DBParamValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dcn_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dcn_instance_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDBInstanceResponse {
    #[serde(default)]
    pub deal_name: Option<String>,
    #[serde(default)]
    pub instance_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDBInstancesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_filter_vpc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDBInstancesResponse {
    #[serde(default)]
    pub instances: Vec<DBInstance>,
    #[serde(default)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DBInstance {
    pub instance_id: Option<String>,
    pub instance_name: Option<String>,
    pub app_id: Option<i64>,
    pub project_id: Option<i64>,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub vpc_id: Option<i64>,
    pub subnet_id: Option<i64>,
    pub status: Option<i64>,
    pub vip: Option<String>,
    pub vport: Option<i64>,
    pub wan_domain: Option<String>,
    pub wan_vip: Option<String>,
    pub wan_port: Option<i64>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
    pub auto_renew_flag: Option<i64>,
    pub period_end_time: Option<String>,
    pub uin: Option<String>,
    pub tdsql_version: Option<String>,
    pub memory: Option<i64>,
    pub storage: Option<i64>,
    pub unique_vpc_id: Option<String>,
    pub unique_subnet_id: Option<String>,
    pub origin_serial_id: Option<String>,
    pub node_count: Option<i64>,
    pub is_tmp: Option<i64>,
    pub excluster_id: Option<String>,
    pub id: Option<i64>,
    pub pid: Option<i64>,
    pub qps: Option<i64>,
    pub paymode: Option<String>,
    pub locker: Option<i64>,
    pub status_desc: Option<String>,
    pub wan_status: Option<i64>,
    pub is_audit_supported: Option<i64>,
    pub machine: Option<String>,
    pub is_encrypt_supported: Option<i64>,
    pub cpu: Option<i64>,
    pub ipv6_flag: Option<i64>,
    pub vipv6: Option<String>,
    pub wan_vipv6: Option<String>,
    pub wan_port_ipv6: Option<i64>,
    pub wan_status_ipv6: Option<i64>,
    pub db_engine: Option<String>,
    pub db_version: Option<String>,
    pub db_version_id: Option<String>,
    pub dcn_flag: Option<i64>,
    pub dcn_status: Option<i64>,
    pub dcn_dst_num: Option<i64>,
    pub instance_type: Option<i64>,
    pub resource_tags: Option<Vec<Tag>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyDBInstanceNameRequest {
    pub instance_id: String,
    pub instance_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IsolateDBInstanceRequest {
    pub instance_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IsolateDBInstanceResponse {
    pub success_instance_ids: Vec<String>,
    pub failed_instance_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DestroyDBInstanceRequest {
    pub instance_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DestroyDBInstanceResponse {
    #[serde(default)]
    pub flow_id: Option<i64>,
}

/// Instance operations
pub struct InstancesApi<'a> {
    client: &'a Client,
}

impl<'a> InstancesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Returns the id of the new instance.
    pub async fn create(
        &self,
        ctx: &Context,
        request: &CreateDBInstanceRequest,
    ) -> Result<String, ApiError> {
        let response: CreateDBInstanceResponse =
            self.client.write(ctx, SERVICE, "CreateDBInstance", request).await?;
        response.instance_ids.into_iter().next().ok_or_else(|| {
            ApiError::Failed("CreateDBInstance returned no instance id".to_string())
        })
    }

    pub async fn describe(
        &self,
        ctx: &Context,
        request: &DescribeDBInstancesRequest,
    ) -> Result<DescribeDBInstancesResponse, ApiError> {
        self.client.read(ctx, SERVICE, "DescribeDBInstances", request).await
    }

    /// `None` when the instance does not exist.
    pub async fn get(&self, ctx: &Context, instance_id: &str) -> Result<Option<DBInstance>, ApiError> {
        let request = DescribeDBInstancesRequest {
            instance_ids: Some(vec![instance_id.to_string()]),
            ..Default::default()
        };
        match self.describe(ctx, &request).await {
            Ok(response) => Ok(response
                .instances
                .into_iter()
                .find(|i| i.instance_id.as_deref() == Some(instance_id))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Every instance matching `filter`, following pagination.
    pub async fn list(
        &self,
        ctx: &Context,
        filter: &DescribeDBInstancesRequest,
    ) -> Result<Vec<DBInstance>, ApiError> {
        let mut instances = Vec::new();
        let mut offset = 0;

        loop {
            let request = DescribeDBInstancesRequest {
                offset: Some(offset),
                limit: Some(PAGE_LIMIT),
                ..filter.clone()
            };
            let response = self.describe(ctx, &request).await?;
            let page = response.instances.len() as i64;
            instances.extend(response.instances);

            offset += page;
            if page < PAGE_LIMIT || offset >= response.total_count {
                break;
            }
        }

        Ok(instances)
    }

    pub async fn modify_name(
        &self,
        ctx: &Context,
        instance_id: &str,
        instance_name: &str,
    ) -> Result<(), ApiError> {
        let request = ModifyDBInstanceNameRequest {
            instance_id: instance_id.to_string(),
            instance_name: instance_name.to_string(),
        };
        let _: EmptyResponse = self.client.write(ctx, SERVICE, "ModifyDBInstanceName", &request).await?;
        Ok(())
    }

    pub async fn isolate(&self, ctx: &Context, instance_id: &str) -> Result<(), ApiError> {
        let request = IsolateDBInstanceRequest {
            instance_ids: vec![instance_id.to_string()],
        };
        let response: IsolateDBInstanceResponse =
            self.client.write(ctx, SERVICE, "IsolateDBInstance", &request).await?;
        if response.failed_instance_ids.iter().any(|id| id == instance_id) {
            return Err(ApiError::Failed(format!(
                "IsolateDBInstance failed for {}",
                instance_id
            )));
        }
        Ok(())
    }

    pub async fn destroy(&self, ctx: &Context, instance_id: &str) -> Result<Option<i64>, ApiError> {
        let request = DestroyDBInstanceRequest {
            instance_id: instance_id.to_string(),
        };
        let response: DestroyDBInstanceResponse =
            self.client.write(ctx, SERVICE, "DestroyDBInstance", &request).await?;
        Ok(response.flow_id)
    }

    /// Wait for a new instance to reach running. Creating, processing and
    /// initializing count as pending; a vanished instance is an error.
    pub async fn wait_running(
        &self,
        ctx: &Context,
        instance_id: &str,
        timeout: Duration,
    ) -> Result<DBInstance, ApiError> {
        poll_until(ctx, timeout, self.client.retry_config().poll_interval, || async {
            let Some(instance) = self.get(ctx, instance_id).await? else {
                return Ok(PollStatus::Failed(format!(
                    "instance {} not found while waiting for it to run",
                    instance_id
                )));
            };
            Ok::<_, ApiError>(match instance.status {
                Some(STATUS_RUNNING) => PollStatus::Done(instance),
                Some(STATUS_CREATING | STATUS_PROCESSING | STATUS_INITIALIZING) => {
                    PollStatus::Pending(format!(
                        "instance {} status {}",
                        instance_id,
                        instance.status.unwrap_or_default()
                    ))
                }
                status => PollStatus::Failed(format!(
                    "instance {} entered unexpected status {:?}",
                    instance_id, status
                )),
            })
        })
        .await
    }

    /// Wait for isolation: running is pending, isolated or gone is done.
    pub async fn wait_isolated(
        &self,
        ctx: &Context,
        instance_id: &str,
        timeout: Duration,
    ) -> Result<(), ApiError> {
        poll_until(ctx, timeout, self.client.retry_config().poll_interval, || async {
            let status = self.get(ctx, instance_id).await?.map(|i| i.status);
            Ok::<_, ApiError>(match status {
                None | Some(Some(STATUS_ISOLATED)) => PollStatus::Done(()),
                Some(Some(STATUS_RUNNING)) => {
                    PollStatus::Pending(format!("instance {} is still running", instance_id))
                }
                Some(status) => PollStatus::Failed(format!(
                    "instance {} entered unexpected status {:?} while isolating",
                    instance_id, status
                )),
            })
        })
        .await
    }

    /// Wait for an isolated instance to disappear.
    pub async fn wait_destroyed(
        &self,
        ctx: &Context,
        instance_id: &str,
        timeout: Duration,
    ) -> Result<(), ApiError> {
        poll_until(ctx, timeout, self.client.retry_config().poll_interval, || async {
            let status = self.get(ctx, instance_id).await?.map(|i| i.status);
            Ok::<_, ApiError>(match status {
                None => PollStatus::Done(()),
                Some(Some(STATUS_ISOLATED)) => {
                    PollStatus::Pending(format!("instance {} is still isolated", instance_id))
                }
                Some(status) => PollStatus::Failed(format!(
                    "instance {} entered unexpected status {:?} while destroying",
                    instance_id, status
                )),
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, error_body, response_body};
    use mockito::{Matcher, Server};

    fn instance_json(id: &str, status: i64) -> serde_json::Value {
        serde_json::json!({
            "InstanceId": id,
            "InstanceName": "orders",
            "Status": status,
            "Memory": 8,
            "Storage": 100,
            "NodeCount": 2,
            "UniqueVpcId": "vpc-1",
            "Vport": 3306,
            "ResourceTags": [{"TagKey": "env", "TagValue": "prod"}]
        })
    }

    #[test]
    fn create_request_omits_unset_fields() {
        let request = CreateDBInstanceRequest {
            zones: vec!["ap-guangzhou-3".to_string()],
            node_count: 2,
            memory: 8,
            storage: 100,
            instance_name: Some("orders".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "Zones": ["ap-guangzhou-3"],
                "NodeCount": 2,
                "Memory": 8,
                "Storage": 100,
                "InstanceName": "orders"
            })
        );
    }

    #[test]
    fn db_instance_tolerates_missing_fields() {
        let instance: DBInstance = serde_json::from_value(serde_json::json!({
            "InstanceId": "tdsql-1",
            "WanPortIpv6": 0,
            "Vipv6": "",
            "DcnDstNum": 1
        }))
        .unwrap();
        assert_eq!(instance.instance_id.as_deref(), Some("tdsql-1"));
        assert_eq!(instance.dcn_dst_num, Some(1));
        assert!(instance.status.is_none());
    }

    #[tokio::test]
    async fn create_returns_first_instance_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "CreateDBInstance")
            .match_body(Matcher::PartialJson(serde_json::json!({"NodeCount": 2})))
            .with_body(response_body(serde_json::json!({
                "DealName": "deal-1",
                "InstanceIds": ["tdsql-new"]
            })))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let id = client
            .mariadb()
            .instances()
            .create(
                &Context::new(),
                &CreateDBInstanceRequest {
                    zones: vec!["ap-guangzhou-3".to_string()],
                    node_count: 2,
                    memory: 8,
                    storage: 100,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(id, "tdsql-new");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_missing_instance_is_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(response_body(serde_json::json!({"Instances": [], "TotalCount": 0})))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let instance = client
            .mariadb()
            .instances()
            .get(&Context::new(), "tdsql-gone")
            .await
            .unwrap();
        assert!(instance.is_none());
    }

    #[tokio::test]
    async fn get_treats_not_found_code_as_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(error_body("ResourceNotFound.InstanceNotFound", "gone"))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let instance = client
            .mariadb()
            .instances()
            .get(&Context::new(), "tdsql-gone")
            .await
            .unwrap();
        assert!(instance.is_none());
    }

    #[tokio::test]
    async fn list_follows_pagination() {
        let mut server = Server::new_async().await;
        let page_one: Vec<serde_json::Value> = (0..100)
            .map(|i| instance_json(&format!("tdsql-{}", i), 2))
            .collect();
        let first = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(serde_json::json!({"Offset": 0, "Limit": 100})))
            .with_body(response_body(serde_json::json!({
                "Instances": page_one,
                "TotalCount": 101
            })))
            .create_async()
            .await;
        let second = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(serde_json::json!({"Offset": 100, "Limit": 100})))
            .with_body(response_body(serde_json::json!({
                "Instances": [instance_json("tdsql-100", 2)],
                "TotalCount": 101
            })))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let instances = client
            .mariadb()
            .instances()
            .list(
                &Context::new(),
                &DescribeDBInstancesRequest {
                    search_name: Some("orders".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(instances.len(), 101);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn wait_running_fails_on_unexpected_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(response_body(serde_json::json!({
                "Instances": [instance_json("tdsql-1", 3)],
                "TotalCount": 1
            })))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client
            .mariadb()
            .instances()
            .wait_running(&Context::new(), "tdsql-1", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Failed(ref msg) if msg.contains("unexpected status")));
    }

    #[tokio::test]
    async fn wait_running_returns_running_instance() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(response_body(serde_json::json!({
                "Instances": [instance_json("tdsql-1", 2)],
                "TotalCount": 1
            })))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let instance = client
            .mariadb()
            .instances()
            .wait_running(&Context::new(), "tdsql-1", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(instance.status, Some(STATUS_RUNNING));
        assert_eq!(instance.unique_vpc_id.as_deref(), Some("vpc-1"));
    }

    #[tokio::test]
    async fn wait_destroyed_finishes_when_instance_disappears() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(response_body(serde_json::json!({"Instances": [], "TotalCount": 0})))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        client
            .mariadb()
            .instances()
            .wait_destroyed(&Context::new(), "tdsql-1", Duration::from_secs(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wait_isolated_times_out_while_running() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(response_body(serde_json::json!({
                "Instances": [instance_json("tdsql-1", 2)],
                "TotalCount": 1
            })))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client
            .mariadb()
            .instances()
            .wait_isolated(&Context::new(), "tdsql-1", Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Timeout { .. }));
    }
}
