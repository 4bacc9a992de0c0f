//! Stock attribute validators.

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{AttributePath, Diagnostic, Dynamic};

fn error_at(path: &AttributePath, summary: String, detail: String) -> Diagnostic {
    Diagnostic::error(summary, detail).with_attribute(path.clone())
}

/// Value must be one of a fixed set of strings.
pub struct StringOneOf {
    allowed: Vec<String>,
}

impl StringOneOf {
    pub fn create<I, S>(allowed: I) -> Box<dyn Validator>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Box::new(Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        })
    }
}

impl Validator for StringOneOf {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.allowed.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if let Dynamic::String(s) = &request.config_value.value {
            if !self.allowed.iter().any(|a| a == s) {
                response.diagnostics.push(error_at(
                    &request.path,
                    format!("Invalid value for {}", request.path),
                    format!("Got \"{}\", {}", s, self.description()),
                ));
            }
        }
        response
    }
}

pub struct StringLength {
    min: Option<usize>,
    max: Option<usize>,
}

impl StringLength {
    pub fn create(min: Option<usize>, max: Option<usize>) -> Box<dyn Validator> {
        Box::new(Self { min, max })
    }

    pub fn at_most(max: usize) -> Box<dyn Validator> {
        Self::create(None, Some(max))
    }
}

impl Validator for StringLength {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("length must be between {} and {}", min, max),
            (Some(min), None) => format!("length must be at least {}", min),
            (None, Some(max)) => format!("length must be at most {}", max),
            (None, None) => "any length".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if let Dynamic::String(s) = &request.config_value.value {
            let len = s.chars().count();
            let too_short = self.min.is_some_and(|min| len < min);
            let too_long = self.max.is_some_and(|max| len > max);
            if too_short || too_long {
                response.diagnostics.push(error_at(
                    &request.path,
                    format!("Invalid length for {}", request.path),
                    format!("Got length {}, {}", len, self.description()),
                ));
            }
        }
        response
    }
}

pub struct StringPattern {
    pattern: regex::Regex,
    description: String,
}

impl StringPattern {
    /// Fails on an invalid regular expression so schemas surface the mistake
    /// at construction rather than at validate time.
    pub fn create(pattern: &str, description: &str) -> Result<Box<dyn Validator>, regex::Error> {
        Ok(Box::new(Self {
            pattern: regex::Regex::new(pattern)?,
            description: description.to_string(),
        }))
    }
}

impl Validator for StringPattern {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if let Dynamic::String(s) = &request.config_value.value {
            if !self.pattern.is_match(s) {
                response.diagnostics.push(error_at(
                    &request.path,
                    format!("{} must match {}", request.path, self.description),
                    format!("Value '{}' does not match pattern {}", s, self.pattern),
                ));
            }
        }
        response
    }
}

pub struct NumberBetween {
    min: f64,
    max: f64,
}

impl NumberBetween {
    pub fn create(min: f64, max: f64) -> Box<dyn Validator> {
        Box::new(Self { min, max })
    }
}

impl Validator for NumberBetween {
    fn description(&self) -> String {
        format!("value must be between {} and {}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if let Dynamic::Number(n) = request.config_value.value {
            if n < self.min || n > self.max {
                response.diagnostics.push(error_at(
                    &request.path,
                    format!("Value out of range for {}", request.path),
                    format!("Got {}, {}", n, self.description()),
                ));
            }
        }
        response
    }
}

/// Bounds the number of elements of a list or set attribute.
pub struct ListLength {
    min: Option<usize>,
    max: Option<usize>,
}

impl ListLength {
    pub fn create(min: Option<usize>, max: Option<usize>) -> Box<dyn Validator> {
        Box::new(Self { min, max })
    }
}

impl Validator for ListLength {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("must have between {} and {} items", min, max),
            (Some(min), None) => format!("must have at least {} items", min),
            (None, Some(max)) => format!("must have at most {} items", max),
            (None, None) => "any number of items".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if let Dynamic::List(items) = &request.config_value.value {
            let len = items.len();
            if self.min.is_some_and(|min| len < min) || self.max.is_some_and(|max| len > max) {
                response.diagnostics.push(error_at(
                    &request.path,
                    format!("Invalid number of items for {}", request.path),
                    format!("Got {} items, {}", len, self.description()),
                ));
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DynamicValue;

    fn run(validator: &dyn Validator, value: Dynamic) -> Vec<Diagnostic> {
        validator
            .validate(ValidatorRequest {
                config_value: DynamicValue::new(value),
                path: AttributePath::new("field"),
            })
            .diagnostics
    }

    #[test]
    fn string_one_of() {
        let v = StringOneOf::create(["image", "text", "svg"]);
        assert!(run(v.as_ref(), Dynamic::from("text")).is_empty());

        let diags = run(v.as_ref(), Dynamic::from("gif"));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("image, text, svg"));
        assert_eq!(diags[0].attribute, Some(AttributePath::new("field")));
    }

    #[test]
    fn string_length_counts_characters() {
        let v = StringLength::at_most(4);
        assert!(run(v.as_ref(), Dynamic::from("水印模板")).is_empty());
        assert_eq!(run(v.as_ref(), Dynamic::from("watermark")).len(), 1);
    }

    #[test]
    fn string_pattern() {
        let v = StringPattern::create(r"^[a-z][a-z0-9_]*$", "a lowercase identifier").unwrap();
        assert!(run(v.as_ref(), Dynamic::from("db_user")).is_empty());
        assert_eq!(run(v.as_ref(), Dynamic::from("1user")).len(), 1);
        assert!(StringPattern::create("(", "broken").is_err());
    }

    #[test]
    fn number_between_is_inclusive() {
        let v = NumberBetween::create(0.0, 100.0);
        assert!(run(v.as_ref(), Dynamic::Number(0.0)).is_empty());
        assert!(run(v.as_ref(), Dynamic::Number(100.0)).is_empty());
        assert_eq!(run(v.as_ref(), Dynamic::Number(101.0)).len(), 1);
    }

    #[test]
    fn list_length() {
        let v = ListLength::create(Some(1), Some(2));
        assert_eq!(run(v.as_ref(), Dynamic::List(vec![])).len(), 1);
        assert!(run(v.as_ref(), Dynamic::string_list(["a"])).is_empty());
        assert_eq!(run(v.as_ref(), Dynamic::string_list(["a", "b", "c"])).len(), 1);
    }

    #[test]
    fn wrong_types_are_ignored() {
        let v = NumberBetween::create(0.0, 1.0);
        assert!(run(v.as_ref(), Dynamic::from("x")).is_empty());
    }
}
