//! Resource schemas as data.
//!
//! A [`ResourceSchema`] is a static table of [`AttrSpec`] entries: one
//! per attribute, carrying the value type, the mutability class, any
//! cross-field constraints, an optional default and a description. The
//! same table drives validation, default application, and change
//! planning, so the rules are declared exactly once.
//!
//! Mutability classes:
//! - [`Mutability::Computed`] - server-assigned, never sent in requests
//! - [`Mutability::ForceNew`] - settable once; a change requires
//!   destroy+recreate
//! - [`Mutability::Mutable`] - updatable in place

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::state::ResourceData;

// ════════════════════════════════════════════════════════════════════════════════
// Attribute Specification
// ════════════════════════════════════════════════════════════════════════════════

/// Value type of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    /// UTF-8 string.
    String,

    /// 64-bit signed integer.
    Int,

    /// Double-precision float (integer literals are accepted).
    Float,

    /// Boolean.
    Bool,

    /// Ordered list of strings.
    StringList,

    /// String-keyed map of strings.
    StringMap,
}

impl AttrType {
    /// Check whether a JSON value has the shape this type requires.
    /// `null` is handled by the caller (it always means "absent").
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            AttrType::String => value.is_string(),
            AttrType::Int => value.as_i64().is_some(),
            AttrType::Float => value.is_number(),
            AttrType::Bool => value.is_boolean(),
            AttrType::StringList => value
                .as_array()
                .map_or(false, |items| items.iter().all(Value::is_string)),
            AttrType::StringMap => value
                .as_object()
                .map_or(false, |entries| entries.values().all(Value::is_string)),
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttrType::String => "string",
            AttrType::Int => "integer",
            AttrType::Float => "float",
            AttrType::Bool => "bool",
            AttrType::StringList => "list of strings",
            AttrType::StringMap => "map of strings",
        };
        write!(f, "{}", s)
    }
}

/// Mutability class of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// Server-computed; never part of requests or diffs.
    Computed,

    /// Settable at creation only; a change forces replacement.
    ForceNew,

    /// Updatable in place.
    Mutable,
}

/// A cross-field or format constraint, evaluated only when the
/// constrained attribute is actually set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// This attribute and the named one cannot both be set.
    ConflictsWith(&'static str),

    /// The named attribute must also be set.
    RequiresAttr(&'static str),

    /// The named attribute must hold exactly this string value.
    RequiresValue {
        attr: &'static str,
        value: &'static str,
    },

    /// The value must be one of the listed strings.
    OneOf(&'static [&'static str]),

    /// The value must parse as an RFC3339 timestamp.
    Rfc3339,
}

/// Specification of a single schema attribute.
#[derive(Debug, Clone)]
pub struct AttrSpec {
    name: &'static str,
    attr_type: AttrType,
    mutability: Mutability,
    default: Option<Value>,
    constraints: Vec<Constraint>,
    description: &'static str,
}

impl AttrSpec {
    /// Create a new attribute specification.
    pub fn new(name: &'static str, attr_type: AttrType, mutability: Mutability) -> Self {
        Self {
            name,
            attr_type,
            mutability,
            default: None,
            constraints: Vec::new(),
            description: "",
        }
    }

    /// Set the default applied when the attribute is absent.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Declare mutual exclusion with another attribute.
    pub fn conflicts_with(mut self, other: &'static str) -> Self {
        self.constraints.push(Constraint::ConflictsWith(other));
        self
    }

    /// Require another attribute to be set whenever this one is.
    pub fn requires_attr(mut self, other: &'static str) -> Self {
        self.constraints.push(Constraint::RequiresAttr(other));
        self
    }

    /// Require another attribute to hold a specific value whenever this
    /// one is set.
    pub fn requires_value(mut self, attr: &'static str, value: &'static str) -> Self {
        self.constraints.push(Constraint::RequiresValue { attr, value });
        self
    }

    /// Restrict the value to a fixed set of strings.
    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.constraints.push(Constraint::OneOf(allowed));
        self
    }

    /// Require the value to parse as RFC3339.
    pub fn rfc3339(mut self) -> Self {
        self.constraints.push(Constraint::Rfc3339);
        self
    }

    /// Attach a human-readable description for the host.
    pub fn describe(mut self, text: &'static str) -> Self {
        self.description = text;
        self
    }

    /// Attribute name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Attribute value type.
    pub fn attr_type(&self) -> AttrType {
        self.attr_type
    }

    /// Mutability class.
    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    /// Default value, if declared.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Declared constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Whether the attribute is server-computed.
    pub fn is_computed(&self) -> bool {
        self.mutability == Mutability::Computed
    }

    /// Whether a change to the attribute forces replacement.
    pub fn is_force_new(&self) -> bool {
        self.mutability == Mutability::ForceNew
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Validation Errors
// ════════════════════════════════════════════════════════════════════════════════

/// A single constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    /// Two mutually exclusive attributes are both set.
    #[error("`{attr}` cannot be combined with `{other}`")]
    Conflict {
        attr: &'static str,
        other: &'static str,
    },

    /// An attribute is set without the attribute it depends on.
    #[error("`{attr}` requires `{requires}` to be set")]
    MissingRequirement {
        attr: &'static str,
        requires: &'static str,
    },

    /// An attribute is set while its gating attribute holds the wrong
    /// value.
    #[error("`{attr}` is only valid when `{other}` is \"{expected}\"")]
    ConditionNotMet {
        attr: &'static str,
        other: &'static str,
        expected: &'static str,
    },

    /// A value falls outside its allowed set.
    #[error("`{attr}` must be one of [{allowed}], got \"{got}\"")]
    NotInSet {
        attr: &'static str,
        allowed: String,
        got: String,
    },

    /// A timestamp value is not RFC3339-compliant.
    #[error("`{attr}` value \"{got}\" is not an RFC3339 timestamp")]
    MalformedTimestamp { attr: &'static str, got: String },
}

/// All constraint violations found in one validation pass.
///
/// Validation collects every violation before reporting, so a caller
/// sees the full picture rather than one failure at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<ConstraintViolation>,
}

impl ValidationError {
    /// Wrap a non-empty list of violations.
    pub fn new(violations: Vec<ConstraintViolation>) -> Self {
        Self { violations }
    }

    /// The individual violations.
    pub fn violations(&self) -> &[ConstraintViolation] {
        &self.violations
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for ValidationError {}

// ════════════════════════════════════════════════════════════════════════════════
// Change Planning
// ════════════════════════════════════════════════════════════════════════════════

/// Outcome of diffing prior state against desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangePlan {
    /// Nothing to do.
    NoOp,

    /// Only in-place-updatable attributes changed.
    UpdateInPlace { changed: Vec<&'static str> },

    /// At least one force-new attribute changed; the resource must be
    /// destroyed and recreated.
    Replace { changed: Vec<&'static str> },
}

impl ChangePlan {
    /// Whether the plan requires no action.
    pub fn is_noop(&self) -> bool {
        matches!(self, ChangePlan::NoOp)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Resource Schema
// ════════════════════════════════════════════════════════════════════════════════

/// The full attribute table for one resource type.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    resource: &'static str,
    attrs: Vec<AttrSpec>,
}

impl ResourceSchema {
    /// Build a schema from its attribute table.
    pub fn new(resource: &'static str, attrs: Vec<AttrSpec>) -> Self {
        debug_assert!(
            attrs
                .iter()
                .map(AttrSpec::name)
                .collect::<HashSet<_>>()
                .len()
                == attrs.len(),
            "duplicate attribute name in schema"
        );
        Self { resource, attrs }
    }

    /// The resource type name (e.g. `stripe_coupon`).
    pub fn resource(&self) -> &'static str {
        self.resource
    }

    /// All attribute specifications, in declaration order.
    pub fn attrs(&self) -> &[AttrSpec] {
        &self.attrs
    }

    /// Look up one attribute by name.
    pub fn attr(&self, name: &str) -> Option<&AttrSpec> {
        self.attrs.iter().find(|spec| spec.name == name)
    }

    /// Write declared defaults into the handle for every absent
    /// attribute.
    pub fn apply_defaults(&self, data: &mut ResourceData) -> Result<(), crate::state::StateError> {
        for spec in &self.attrs {
            if let Some(default) = &spec.default {
                if !data.is_set(spec.name) {
                    data.set(spec.name, default.clone())?;
                }
            }
        }
        Ok(())
    }

    /// Evaluate every constraint against the handle, collecting all
    /// violations. Constraints fire only for attributes that are set.
    pub fn validate(&self, data: &ResourceData) -> Result<(), ValidationError> {
        let mut violations = Vec::new();
        // A conflict between a and b is one violation, not two, even
        // when both sides declare it.
        let mut reported_conflicts: HashSet<(&str, &str)> = HashSet::new();

        for spec in &self.attrs {
            if !data.is_set(spec.name) {
                continue;
            }

            for constraint in &spec.constraints {
                match *constraint {
                    Constraint::ConflictsWith(other) => {
                        if data.is_set(other) {
                            let pair = if spec.name < other {
                                (spec.name, other)
                            } else {
                                (other, spec.name)
                            };
                            if reported_conflicts.insert(pair) {
                                violations.push(ConstraintViolation::Conflict {
                                    attr: spec.name,
                                    other,
                                });
                            }
                        }
                    }
                    Constraint::RequiresAttr(other) => {
                        if !data.is_set(other) {
                            violations.push(ConstraintViolation::MissingRequirement {
                                attr: spec.name,
                                requires: other,
                            });
                        }
                    }
                    Constraint::RequiresValue { attr, value } => {
                        let holds = matches!(
                            data.raw(attr).and_then(Value::as_str),
                            Some(actual) if actual == value
                        );
                        if !holds {
                            violations.push(ConstraintViolation::ConditionNotMet {
                                attr: spec.name,
                                other: attr,
                                expected: value,
                            });
                        }
                    }
                    Constraint::OneOf(allowed) => {
                        if let Some(got) = data.raw(spec.name).and_then(Value::as_str) {
                            if !allowed.iter().any(|candidate| *candidate == got) {
                                violations.push(ConstraintViolation::NotInSet {
                                    attr: spec.name,
                                    allowed: allowed.join(", "),
                                    got: got.to_string(),
                                });
                            }
                        }
                    }
                    Constraint::Rfc3339 => {
                        if let Some(got) = data.raw(spec.name).and_then(Value::as_str) {
                            if chrono::DateTime::parse_from_rfc3339(got).is_err() {
                                violations.push(ConstraintViolation::MalformedTimestamp {
                                    attr: spec.name,
                                    got: got.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// Diff prior state against desired state.
    ///
    /// Computed attributes never participate; absent attributes compare
    /// as their default (or null). Any changed force-new attribute turns
    /// the whole plan into a replacement.
    pub fn plan(&self, prior: &ResourceData, desired: &ResourceData) -> ChangePlan {
        let mut changed = Vec::new();
        let mut replace = false;

        for spec in &self.attrs {
            if spec.is_computed() {
                continue;
            }

            let effective = |data: &ResourceData| -> Value {
                match data.raw(spec.name) {
                    Some(value) if !value.is_null() => value.clone(),
                    _ => spec.default.clone().unwrap_or(Value::Null),
                }
            };

            if effective(prior) != effective(desired) {
                changed.push(spec.name);
                if spec.is_force_new() {
                    replace = true;
                }
            }
        }

        if changed.is_empty() {
            ChangePlan::NoOp
        } else if replace {
            ChangePlan::Replace { changed }
        } else {
            ChangePlan::UpdateInPlace { changed }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ResourceData;
    use once_cell::sync::Lazy;
    use serde_json::json;

    static TEST_SCHEMA: Lazy<ResourceSchema> = Lazy::new(|| {
        ResourceSchema::new(
            "test_widget",
            vec![
                AttrSpec::new("label", AttrType::String, Mutability::Mutable)
                    .describe("Display label."),
                AttrSpec::new("size", AttrType::Int, Mutability::ForceNew)
                    .conflicts_with("ratio"),
                AttrSpec::new("ratio", AttrType::Float, Mutability::ForceNew)
                    .conflicts_with("size"),
                AttrSpec::new("unit", AttrType::String, Mutability::ForceNew)
                    .requires_attr("size"),
                AttrSpec::new("mode", AttrType::String, Mutability::ForceNew)
                    .default_value("plain")
                    .one_of(&["plain", "fancy"]),
                AttrSpec::new("fancy_level", AttrType::Int, Mutability::ForceNew)
                    .requires_value("mode", "fancy"),
                AttrSpec::new("expires", AttrType::String, Mutability::ForceNew).rfc3339(),
                AttrSpec::new("generation", AttrType::Int, Mutability::Computed),
            ],
        )
    });

    fn schema() -> &'static ResourceSchema {
        &TEST_SCHEMA
    }

    fn data() -> ResourceData {
        ResourceData::new(schema())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Attribute Specification Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn attr_lookup_by_name() {
        assert!(schema().attr("label").is_some());
        assert!(schema().attr("nonexistent").is_none());
    }

    #[test]
    fn attr_type_matching() {
        assert!(AttrType::String.matches(&json!("x")));
        assert!(AttrType::Int.matches(&json!(42)));
        assert!(!AttrType::Int.matches(&json!(4.2)));
        assert!(AttrType::Float.matches(&json!(4.2)));
        assert!(AttrType::Float.matches(&json!(42)));
        assert!(AttrType::Bool.matches(&json!(true)));
        assert!(AttrType::StringList.matches(&json!(["a", "b"])));
        assert!(!AttrType::StringList.matches(&json!(["a", 1])));
        assert!(AttrType::StringMap.matches(&json!({"k": "v"})));
        assert!(!AttrType::StringMap.matches(&json!({"k": 1})));
    }

    #[test]
    fn mutability_predicates() {
        assert!(schema().attr("generation").unwrap().is_computed());
        assert!(schema().attr("size").unwrap().is_force_new());
        assert!(!schema().attr("label").unwrap().is_force_new());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Default Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn apply_defaults_fills_absent_attrs() {
        let mut d = data();
        schema().apply_defaults(&mut d).unwrap();
        assert_eq!(d.get_string("mode").unwrap(), Some("plain".to_string()));
    }

    #[test]
    fn apply_defaults_keeps_explicit_values() {
        let mut d = data();
        d.set("mode", "fancy").unwrap();
        schema().apply_defaults(&mut d).unwrap();
        assert_eq!(d.get_string("mode").unwrap(), Some("fancy".to_string()));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Validation Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn validate_empty_data_passes() {
        assert!(schema().validate(&data()).is_ok());
    }

    #[test]
    fn validate_conflict_reported_once() {
        let mut d = data();
        d.set("size", 3).unwrap();
        d.set("ratio", 0.5).unwrap();
        let err = schema().validate(&d).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert!(matches!(
            err.violations()[0],
            ConstraintViolation::Conflict { .. }
        ));
    }

    #[test]
    fn validate_missing_requirement() {
        let mut d = data();
        d.set("unit", "px").unwrap();
        let err = schema().validate(&d).unwrap_err();
        assert_eq!(
            err.violations(),
            &[ConstraintViolation::MissingRequirement {
                attr: "unit",
                requires: "size",
            }]
        );
    }

    #[test]
    fn validate_requirement_satisfied() {
        let mut d = data();
        d.set("size", 3).unwrap();
        d.set("unit", "px").unwrap();
        assert!(schema().validate(&d).is_ok());
    }

    #[test]
    fn validate_condition_not_met() {
        let mut d = data();
        d.set("mode", "plain").unwrap();
        d.set("fancy_level", 2).unwrap();
        let err = schema().validate(&d).unwrap_err();
        assert!(matches!(
            err.violations()[0],
            ConstraintViolation::ConditionNotMet {
                attr: "fancy_level",
                other: "mode",
                expected: "fancy",
            }
        ));
    }

    #[test]
    fn validate_condition_not_met_when_gate_absent() {
        let mut d = data();
        d.set("fancy_level", 2).unwrap();
        assert!(schema().validate(&d).is_err());
    }

    #[test]
    fn validate_one_of() {
        let mut d = data();
        d.set("mode", "weird").unwrap();
        let err = schema().validate(&d).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("must be one of"));
        assert!(message.contains("weird"));
    }

    #[test]
    fn validate_rfc3339() {
        let mut d = data();
        d.set("expires", "not-a-date").unwrap();
        let err = schema().validate(&d).unwrap_err();
        assert!(err.to_string().contains("RFC3339"));

        let mut ok = data();
        ok.set("expires", "2030-06-01T12:00:00Z").unwrap();
        assert!(schema().validate(&ok).is_ok());
    }

    #[test]
    fn validate_collects_every_violation() {
        let mut d = data();
        d.set("size", 3).unwrap();
        d.set("ratio", 0.5).unwrap();
        d.set("mode", "weird").unwrap();
        d.set("expires", "nope").unwrap();
        let err = schema().validate(&d).unwrap_err();
        assert_eq!(err.violations().len(), 3);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Planning Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn plan_identical_states_is_noop() {
        let mut prior = data();
        prior.set("label", "a").unwrap();
        let desired = prior.clone();
        assert!(schema().plan(&prior, &desired).is_noop());
    }

    #[test]
    fn plan_mutable_change_updates_in_place() {
        let mut prior = data();
        prior.set("label", "a").unwrap();
        let mut desired = data();
        desired.set("label", "b").unwrap();
        assert_eq!(
            schema().plan(&prior, &desired),
            ChangePlan::UpdateInPlace {
                changed: vec!["label"]
            }
        );
    }

    #[test]
    fn plan_force_new_change_replaces() {
        let mut prior = data();
        prior.set("size", 3).unwrap();
        let mut desired = data();
        desired.set("size", 4).unwrap();
        desired.set("label", "b").unwrap();
        assert_eq!(
            schema().plan(&prior, &desired),
            ChangePlan::Replace {
                changed: vec!["label", "size"]
            }
        );
    }

    #[test]
    fn plan_ignores_computed_drift() {
        let mut prior = data();
        prior.set("generation", 1).unwrap();
        let mut desired = data();
        desired.set("generation", 9).unwrap();
        assert!(schema().plan(&prior, &desired).is_noop());
    }

    #[test]
    fn plan_absent_equals_default() {
        let prior = data();
        let mut desired = data();
        desired.set("mode", "plain").unwrap();
        // "plain" is the default, so an explicit "plain" is not a change.
        assert!(schema().plan(&prior, &desired).is_noop());
    }
}
