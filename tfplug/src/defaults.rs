//! Default value providers for optional+computed attributes.
//!
//! ```rust,ignore
//! let priority = AttributeBuilder::new("task_priority", AttributeType::Number)
//!     .optional()
//!     .default(StaticDefault::number(0.0))
//!     .build();
//! ```

use crate::schema::{Default, DefaultRequest, DefaultResponse};
use crate::types::{Dynamic, DynamicValue};

/// StaticDefault provides a fixed default value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Box<dyn Default> {
        Box::new(Self { value })
    }

    pub fn string(value: &str) -> Box<dyn Default> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Box<dyn Default> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Box<dyn Default> {
        Self::create(Dynamic::Bool(value))
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        match &self.value {
            Dynamic::String(s) => format!("defaults to \"{}\"", s),
            Dynamic::Number(n) => format!("defaults to {}", n),
            Dynamic::Bool(b) => format!("defaults to {}", b),
            other => format!("defaults to {:?}", other),
        }
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: DynamicValue::new(self.value.clone()),
        }
    }
}
