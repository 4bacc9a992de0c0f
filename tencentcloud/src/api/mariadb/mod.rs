//! MariaDB (TDSQL) API, version 2017-03-12

pub mod account;
pub mod instance;
pub mod privileges;
pub mod security_group;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tfplug::Context;

use crate::api::error::ApiError;
use crate::api::retry::{poll_until, PollStatus};
use crate::api::{Client, Service};

pub const SERVICE: Service = Service {
    name: "mariadb",
    version: "2017-03-12",
};

/// `DescribeFlow` status values.
pub const FLOW_STATUS_SUCCESS: i64 = 0;
pub const FLOW_STATUS_FAILED: i64 = 1;
pub const FLOW_STATUS_RUNNING: i64 = 2;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeFlowRequest {
    pub flow_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeFlowResponse {
    pub status: i64,
}

/// MariaDB API operations
pub struct MariadbApi<'a> {
    client: &'a Client,
}

impl<'a> MariadbApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn instances(&self) -> instance::InstancesApi<'a> {
        instance::InstancesApi::new(self.client)
    }

    pub fn accounts(&self) -> account::AccountsApi<'a> {
        account::AccountsApi::new(self.client)
    }

    pub fn privileges(&self) -> privileges::PrivilegesApi<'a> {
        privileges::PrivilegesApi::new(self.client)
    }

    pub fn security_groups(&self) -> security_group::SecurityGroupsApi<'a> {
        security_group::SecurityGroupsApi::new(self.client)
    }

    pub async fn describe_flow(&self, ctx: &Context, flow_id: i64) -> Result<i64, ApiError> {
        let response: DescribeFlowResponse =
            self.client.read(ctx, SERVICE, "DescribeFlow", &DescribeFlowRequest { flow_id }).await?;
        Ok(response.status)
    }

    /// Poll `DescribeFlow` until the flow succeeds. A failed flow, or any
    /// status other than running, ends the wait with [`ApiError::Flow`].
    pub async fn wait_flow(
        &self,
        ctx: &Context,
        flow_id: i64,
        timeout: Duration,
    ) -> Result<(), ApiError> {
        poll_until(ctx, timeout, self.client.retry_config().poll_interval, || async {
            match self.describe_flow(ctx, flow_id).await? {
                FLOW_STATUS_SUCCESS => Ok(PollStatus::Done(())),
                FLOW_STATUS_RUNNING => Ok(PollStatus::Pending(format!(
                    "flow {} is still running",
                    flow_id
                ))),
                status => Err(ApiError::Flow { flow_id, status }),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, error_body, response_body};
    use mockito::{Matcher, Server};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn wait_flow_returns_once_flow_succeeds() {
        let mut server = Server::new_async().await;
        let polls = Arc::new(AtomicUsize::new(0));
        let seen = polls.clone();
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeFlow")
            .match_body(Matcher::Json(serde_json::json!({"FlowId": 11})))
            .with_body_from_request(move |_| {
                // running twice, then done
                let status = if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                    FLOW_STATUS_RUNNING
                } else {
                    FLOW_STATUS_SUCCESS
                };
                response_body(serde_json::json!({ "Status": status })).into_bytes()
            })
            .expect(3)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        client
            .mariadb()
            .wait_flow(&Context::new(), 11, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(polls.load(Ordering::SeqCst), 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn wait_flow_reports_failed_flow() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeFlow")
            .with_body(response_body(serde_json::json!({"Status": 1})))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client
            .mariadb()
            .wait_flow(&Context::new(), 5, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Flow { flow_id: 5, status: 1 }));
    }

    #[tokio::test]
    async fn wait_flow_times_out_while_running() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(response_body(serde_json::json!({"Status": 2})))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client
            .mariadb()
            .wait_flow(&Context::new(), 9, Duration::from_millis(30))
            .await
            .unwrap_err();
        match err {
            ApiError::Timeout { last, .. } => assert!(last.contains("flow 9")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn terminal_errors_abort_flow_wait() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_body(error_body("InvalidParameter", "no such flow"))
            .expect(1)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client
            .mariadb()
            .wait_flow(&Context::new(), 1, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("InvalidParameter"));
        mock.assert_async().await;
    }
}
