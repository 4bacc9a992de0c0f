#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::test_helpers::{create_test_client, error_body, response_body};
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use tfplug::types::ClientCapabilities;

    fn configured(server_url: &str) -> MariadbDbInstancesDataSource {
        MariadbDbInstancesDataSource {
            provider_data: Some(TencentCloudProviderData {
                client: Arc::new(create_test_client(server_url)),
            }),
        }
    }

    fn read_request(config: DynamicValue) -> ReadDataSourceRequest {
        ReadDataSourceRequest {
            type_name: "tencentcloud_mariadb_db_instances".to_string(),
            config,
            provider_meta: None,
            client_capabilities: ClientCapabilities::default(),
        }
    }

    fn config() -> DynamicValue {
        DynamicValue::new(Dynamic::Map(
            [
                ("id".to_string(), Dynamic::Unknown),
                (
                    "instance_ids".to_string(),
                    Dynamic::string_list(["tdsql-abc123"]),
                ),
                ("search_name".to_string(), Dynamic::Null),
                (
                    "project_ids".to_string(),
                    Dynamic::List(vec![Dynamic::Number(0.0)]),
                ),
                ("vpc_id".to_string(), Dynamic::from("vpc-1")),
                ("subnet_id".to_string(), Dynamic::Null),
                ("instances".to_string(), Dynamic::Unknown),
            ]
            .into_iter()
            .collect(),
        ))
    }

    #[test]
    fn test_build_filter() {
        let filter = build_filter(&config());
        assert_eq!(filter.instance_ids, Some(vec!["tdsql-abc123".to_string()]));
        assert_eq!(filter.project_ids, Some(vec![0]));
        assert_eq!(filter.vpc_id.as_deref(), Some("vpc-1"));
        assert!(filter.search_name.is_none());
        assert!(filter.subnet_id.is_none());
        assert!(filter.offset.is_none());
    }

    #[tokio::test]
    async fn test_schema_marks_filters_optional() {
        let response = MariadbDbInstancesDataSource::new()
            .schema(Context::new(), DataSourceSchemaRequest)
            .await;
        let block = &response.schema.block;
        for name in ["instance_ids", "search_name", "project_ids", "vpc_id", "subnet_id"] {
            assert!(block.attribute(name).unwrap().optional, "{} should be optional", name);
        }
        assert!(block.attribute("instances").unwrap().computed);
    }

    #[tokio::test]
    async fn test_read_flattens_instances() {
        let mut server = Server::new_async().await;
        let describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeDBInstances")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "InstanceIds": ["tdsql-abc123"],
                "ProjectIds": [0],
                "VpcId": "vpc-1",
                "Offset": 0,
                "Limit": 100
            })))
            .with_body(response_body(serde_json::json!({
                "TotalCount": 1,
                "Instances": [{
                    "InstanceId": "tdsql-abc123",
                    "InstanceName": "orders",
                    "ProjectId": 0,
                    "Region": "ap-guangzhou",
                    "Zone": "ap-guangzhou-3",
                    "VpcId": 1234,
                    "UniqueVpcId": "vpc-1",
                    "UniqueSubnetId": "subnet-1",
                    "Status": 2,
                    "Vip": "10.0.0.8",
                    "Vport": 3306,
                    "Memory": 2,
                    "Storage": 10,
                    "NodeCount": 2,
                    "DbVersionId": "10.1",
                    "CreateTime": "2024-01-01 00:00:00"
                }]
            })))
            .create_async()
            .await;

        let response = configured(&server.url())
            .read(Context::new(), read_request(config()))
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = response.state;
        assert!(!state.contains_unknown());
        assert_eq!(
            state.get_string(&AttributePath::new("id")).unwrap(),
            ids_hash(&["tdsql-abc123"])
        );
        let instance = AttributePath::new("instances").index(0);
        assert_eq!(
            state.get_string(&instance.clone().attribute("vpc_id")).unwrap(),
            "vpc-1"
        );
        assert_eq!(state.get_i64(&instance.clone().attribute("vport")).unwrap(), 3306);
        assert_eq!(
            state.get_string(&instance.clone().attribute("db_version_id")).unwrap(),
            "10.1"
        );
        assert_eq!(state.get_i64(&instance.attribute("node_count")).unwrap(), 2);
        describe.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_empty_result() {
        let mut server = Server::new_async().await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeDBInstances")
            .with_body(response_body(serde_json::json!({
                "TotalCount": 0,
                "Instances": []
            })))
            .create_async()
            .await;

        let response = configured(&server.url())
            .read(Context::new(), read_request(config()))
            .await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(
            response
                .state
                .get_list(&AttributePath::new("instances"))
                .unwrap()
                .len(),
            0
        );
    }

    #[tokio::test]
    async fn test_read_reports_api_error() {
        let mut server = Server::new_async().await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeDBInstances")
            .with_body(error_body("AuthFailure.SignatureFailure", "bad signature"))
            .create_async()
            .await;

        let response = configured(&server.url())
            .read(Context::new(), read_request(config()))
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].summary,
            "Failed to list MariaDB instances"
        );
    }

    #[tokio::test]
    async fn test_read_without_configure() {
        let response = MariadbDbInstancesDataSource::new()
            .read(Context::new(), read_request(config()))
            .await;
        assert_eq!(response.diagnostics[0].summary, "Provider not configured");
    }
}
