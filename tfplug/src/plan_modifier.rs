//! Stock attribute plan modifiers.
//!
//! Modifiers only run while planning an update of an existing resource;
//! creates and destroys never consult them.

use crate::schema::{PlanModifier, PlanModifierRequest, PlanModifierResponse};
use crate::types::{Diagnostic, Dynamic};

/// Any change to the attribute forces a new resource.
pub struct RequiresReplace;

impl RequiresReplace {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        "changing this value forces a new resource".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let requires_replace = value_changed(&request.state_value.value, &request.plan_value.value);
        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics: vec![],
        }
    }
}

type ReplacePredicate = dyn Fn(&PlanModifierRequest) -> bool + Send + Sync;

/// Forces replacement only when the value changed and the predicate agrees,
/// e.g. only when a number decreases.
pub struct RequiresReplaceIf {
    predicate: Box<ReplacePredicate>,
    description: String,
}

impl RequiresReplaceIf {
    pub fn create<F>(predicate: F, description: impl Into<String>) -> Box<dyn PlanModifier>
    where
        F: Fn(&PlanModifierRequest) -> bool + Send + Sync + 'static,
    {
        Box::new(Self {
            predicate: Box::new(predicate),
            description: description.into(),
        })
    }
}

impl PlanModifier for RequiresReplaceIf {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let requires_replace =
            value_changed(&request.state_value.value, &request.plan_value.value)
                && (self.predicate)(&request);

        let mut diagnostics = vec![];
        if requires_replace {
            diagnostics.push(
                Diagnostic::warning(
                    format!("Attribute '{}' requires resource replacement", request.path),
                    self.description.clone(),
                )
                .with_attribute(request.path.clone()),
            );
        }

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics,
        }
    }
}

/// Keep the prior state value for a computed attribute instead of showing
/// "known after apply" on every update.
pub struct UseStateForUnknown;

impl UseStateForUnknown {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "value does not change after creation".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let keep_state = request.plan_value.is_unknown()
            && !request.state_value.is_null()
            && request.config_value.is_null();

        PlanModifierResponse {
            plan_value: if keep_state {
                request.state_value
            } else {
                request.plan_value
            },
            requires_replace: false,
            diagnostics: vec![],
        }
    }
}

/// Unknown planned values are never a change: they may resolve to the prior value.
pub(crate) fn value_changed(state: &Dynamic, plan: &Dynamic) -> bool {
    if state.is_unknown() || plan.is_unknown() {
        return false;
    }
    !values_equal(state, plan)
}

pub(crate) fn values_equal(a: &Dynamic, b: &Dynamic) -> bool {
    match (a, b) {
        (Dynamic::Null, Dynamic::Null) | (Dynamic::Unknown, Dynamic::Unknown) => true,
        (Dynamic::Bool(a), Dynamic::Bool(b)) => a == b,
        (Dynamic::Number(a), Dynamic::Number(b)) => (a - b).abs() < f64::EPSILON,
        (Dynamic::String(a), Dynamic::String(b)) => a == b,
        (Dynamic::List(a), Dynamic::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Dynamic::Map(a), Dynamic::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|v2| values_equal(v, v2)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributePath, DynamicValue};

    fn request(state: Dynamic, plan: Dynamic, config: Dynamic) -> PlanModifierRequest {
        PlanModifierRequest {
            config_value: DynamicValue::new(config),
            state_value: DynamicValue::new(state),
            plan_value: DynamicValue::new(plan),
            path: AttributePath::new("zones"),
        }
    }

    #[test]
    fn requires_replace_ignores_unchanged_value() {
        let response = RequiresReplace.modify(request(
            Dynamic::from("ap-guangzhou-3"),
            Dynamic::from("ap-guangzhou-3"),
            Dynamic::from("ap-guangzhou-3"),
        ));
        assert!(!response.requires_replace);
    }

    #[test]
    fn requires_replace_triggers_on_change() {
        let response = RequiresReplace.modify(request(
            Dynamic::from("ap-guangzhou-3"),
            Dynamic::from("ap-guangzhou-4"),
            Dynamic::from("ap-guangzhou-4"),
        ));
        assert!(response.requires_replace);
        assert!(response.diagnostics.is_empty());
    }

    #[test]
    fn requires_replace_ignores_unknown_plan() {
        let response = RequiresReplace.modify(request(
            Dynamic::from("a"),
            Dynamic::Unknown,
            Dynamic::Null,
        ));
        assert!(!response.requires_replace);
    }

    #[test]
    fn requires_replace_if_consults_predicate() {
        let shrink_only = RequiresReplaceIf::create(
            |req| {
                let before = req.state_value.value.as_f64().unwrap_or(0.0);
                let after = req.plan_value.value.as_f64().unwrap_or(0.0);
                after < before
            },
            "storage can only grow in place",
        );

        let grow = shrink_only.modify(request(
            Dynamic::Number(100.0),
            Dynamic::Number(200.0),
            Dynamic::Number(200.0),
        ));
        assert!(!grow.requires_replace);

        let shrink = shrink_only.modify(request(
            Dynamic::Number(200.0),
            Dynamic::Number(100.0),
            Dynamic::Number(100.0),
        ));
        assert!(shrink.requires_replace);
        assert_eq!(shrink.diagnostics.len(), 1);
    }

    #[test]
    fn use_state_for_unknown_copies_prior_value() {
        let response = UseStateForUnknown.modify(request(
            Dynamic::from("10.0.0.5"),
            Dynamic::Unknown,
            Dynamic::Null,
        ));
        assert_eq!(response.plan_value.value, Dynamic::from("10.0.0.5"));

        let response = UseStateForUnknown.modify(request(Dynamic::Null, Dynamic::Unknown, Dynamic::Null));
        assert!(response.plan_value.is_unknown());
    }

    #[test]
    fn map_equality_is_order_independent() {
        let a = Dynamic::string_map([("env", "prod"), ("team", "db")]);
        let b = Dynamic::string_map([("team", "db"), ("env", "prod")]);
        assert!(values_equal(&a, &b));
        assert!(!value_changed(&a, &b));
    }
}
