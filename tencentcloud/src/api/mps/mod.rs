//! Media Processing Service API, version 2019-06-12

pub mod transcode;
pub mod watermark;
pub mod workflow;

use serde::{Deserialize, Deserializer};

use crate::api::{Client, Service};

pub const SERVICE: Service = Service {
    name: "mps",
    version: "2019-06-12",
};

pub(crate) const PAGE_LIMIT: i64 = 100;

/// MPS API operations
pub struct MpsApi<'a> {
    client: &'a Client,
}

impl<'a> MpsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn watermark_templates(&self) -> watermark::WatermarkTemplatesApi<'a> {
        watermark::WatermarkTemplatesApi::new(self.client)
    }

    pub fn transcode_templates(&self) -> transcode::TranscodeTemplatesApi<'a> {
        transcode::TranscodeTemplatesApi::new(self.client)
    }

    pub fn workflows(&self) -> workflow::WorkflowsApi<'a> {
        workflow::WorkflowsApi::new(self.client)
    }
}

/// Template definitions come back as numbers from some actions and as
/// strings from others.
pub(crate) fn deserialize_definition<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        String(String),
    }

    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(n) => Ok(n),
        IntOrString::String(s) => s
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid definition {:?}", s))),
    }
}
