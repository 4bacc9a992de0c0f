//! Media Processing Service resources

pub mod resource_transcode_template;
pub mod resource_watermark_template;
pub mod resource_workflow;

pub use resource_transcode_template::MpsTranscodeTemplateResource;
pub use resource_watermark_template::MpsWatermarkTemplateResource;
pub use resource_workflow::MpsWorkflowResource;

use tfplug::types::Diagnostic;

/// MPS templates and workflows are addressed by their numeric ID.
pub(crate) fn parse_numeric_id(id: &str) -> Result<i64, Diagnostic> {
    id.parse::<i64>().map_err(|_| {
        Diagnostic::error(
            "Invalid resource ID",
            format!("Expected a numeric ID, got '{}'", id),
        )
    })
}
