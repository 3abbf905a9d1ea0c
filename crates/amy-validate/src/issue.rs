//! Validation findings.
//!
//! Issues are data, never errors: mutations that produce them still
//! succeed, and the engine surfaces them asynchronously. Each variant
//! carries exactly the data its message needs.

use serde::{Deserialize, Serialize};

/// Issue severity, ordered. Element and tree levels aggregate by maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Severity {
    /// No finding.
    #[default]
    None,
    /// Worth knowing, nothing broken.
    Advice,
    /// The level loads but will likely misbehave.
    Warning,
    /// The level is broken; playing it is refused.
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Advice => "advice",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// The check group an issue came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueCategory {
    Attribute,
    Cardinality,
    Rule,
    Resource,
}

/// One validation finding on one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Issue {
    /// A mandatory attribute has no value, explicit or default.
    MandatoryMissing { attribute: String },

    /// An attribute that rejects empty values is empty.
    EmptyValue { attribute: String },

    /// A value failed its kind's parse or range check.
    InvalidValue {
        attribute: String,
        value: String,
        detail: String,
    },

    /// A reference names an identifier that is not registered in scope.
    DanglingReference {
        attribute: String,
        family: String,
        value: String,
    },

    /// More than one element in scope claims this identifier value.
    DuplicateIdentifier { attribute: String, value: String },

    /// A declared child kind occurs outside its cardinality bounds.
    CardinalityMismatch {
        child: String,
        count: u32,
        min: u32,
        max: u32,
    },

    /// A dynamic shape has no positive mass.
    MissingMass,

    /// A part of a dynamic composite body has no positive mass.
    PartMissingMass,

    /// A motor or hinge drives a static body.
    StaticBodyDriven { attribute: String, body: String },

    /// A shape rotates but no hinge holds it.
    RotatingWithoutHinge,

    /// A force field declares a size but no center.
    FieldSizeWithoutCenter,

    /// The exit lies outside the scene bounds.
    ExitOutOfBounds,

    /// A declared camera aspect is covered by zero or several cameras.
    CameraAspectCount { aspect: String, count: u32 },

    /// A referenced resource file does not exist on disk.
    ResourceMissing { path: String },

    /// A resource file exists but its extension casing is wrong.
    ResourceCasing { path: String },

    /// A manifest entry no element references.
    ResourceUnused { identifier: String },
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::MandatoryMissing { .. }
            | Issue::EmptyValue { .. }
            | Issue::InvalidValue { .. }
            | Issue::DanglingReference { .. }
            | Issue::DuplicateIdentifier { .. }
            | Issue::MissingMass
            | Issue::PartMissingMass => Severity::Critical,

            Issue::CardinalityMismatch { .. }
            | Issue::ResourceMissing { .. }
            | Issue::StaticBodyDriven { .. }
            | Issue::FieldSizeWithoutCenter
            | Issue::ExitOutOfBounds
            | Issue::CameraAspectCount { .. }
            | Issue::ResourceCasing { .. } => Severity::Warning,

            Issue::RotatingWithoutHinge | Issue::ResourceUnused { .. } => Severity::Advice,
        }
    }

    pub fn category(&self) -> IssueCategory {
        match self {
            Issue::MandatoryMissing { .. }
            | Issue::EmptyValue { .. }
            | Issue::InvalidValue { .. }
            | Issue::DanglingReference { .. }
            | Issue::DuplicateIdentifier { .. } => IssueCategory::Attribute,

            Issue::CardinalityMismatch { .. } => IssueCategory::Cardinality,

            Issue::MissingMass
            | Issue::PartMissingMass
            | Issue::StaticBodyDriven { .. }
            | Issue::RotatingWithoutHinge
            | Issue::FieldSizeWithoutCenter
            | Issue::ExitOutOfBounds
            | Issue::CameraAspectCount { .. } => IssueCategory::Rule,

            Issue::ResourceMissing { .. }
            | Issue::ResourceCasing { .. }
            | Issue::ResourceUnused { .. } => IssueCategory::Resource,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Issue::MandatoryMissing { attribute } => {
                format!("mandatory attribute '{attribute}' is missing")
            }
            Issue::EmptyValue { attribute } => {
                format!("attribute '{attribute}' must not be empty")
            }
            Issue::InvalidValue {
                attribute,
                value,
                detail,
            } => format!("attribute '{attribute}' value '{value}' is invalid: {detail}"),
            Issue::DanglingReference {
                attribute,
                family,
                value,
            } => format!("attribute '{attribute}' references unknown {family} '{value}'"),
            Issue::DuplicateIdentifier { attribute, value } => {
                format!("identifier '{value}' in attribute '{attribute}' is used more than once")
            }
            Issue::CardinalityMismatch {
                child,
                count,
                min,
                max,
            } => {
                let expected = match (*min, *max) {
                    (min, max) if min == max => format!("exactly {min}"),
                    (min, u32::MAX) => format!("at least {min}"),
                    (0, max) => format!("at most {max}"),
                    (min, max) => format!("between {min} and {max}"),
                };
                format!("expected {expected} '{child}' children, found {count}")
            }
            Issue::MissingMass => "dynamic shape needs a positive mass".to_string(),
            Issue::PartMissingMass => {
                "part of a dynamic composite body needs a positive mass".to_string()
            }
            Issue::StaticBodyDriven { attribute, body } => {
                format!("'{attribute}' drives static body '{body}'")
            }
            Issue::RotatingWithoutHinge => {
                "shape rotates but no hinge holds it in place".to_string()
            }
            Issue::FieldSizeWithoutCenter => {
                "force field has a size but no center".to_string()
            }
            Issue::ExitOutOfBounds => "exit lies outside the scene bounds".to_string(),
            Issue::CameraAspectCount { aspect, count } => {
                format!("expected exactly one '{aspect}' camera, found {count}")
            }
            Issue::ResourceMissing { path } => {
                format!("resource file '{path}' does not exist")
            }
            Issue::ResourceCasing { path } => {
                format!("resource file '{path}' has wrong extension casing")
            }
            Issue::ResourceUnused { identifier } => {
                format!("resource '{identifier}' is never used")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_correctly() {
        assert!(Severity::None < Severity::Advice);
        assert!(Severity::Advice < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn cardinality_messages_distinguish_bounds() {
        let exactly = Issue::CardinalityMismatch {
            child: "exit".into(),
            count: 0,
            min: 1,
            max: 1,
        };
        assert!(exactly.message().contains("exactly 1"));

        let at_least = Issue::CardinalityMismatch {
            child: "shape".into(),
            count: 0,
            min: 2,
            max: u32::MAX,
        };
        assert!(at_least.message().contains("at least 2"));

        let at_most = Issue::CardinalityMismatch {
            child: "camera".into(),
            count: 3,
            min: 0,
            max: 2,
        };
        assert!(at_most.message().contains("at most 2"));

        let between = Issue::CardinalityMismatch {
            child: "camera".into(),
            count: 3,
            min: 1,
            max: 2,
        };
        assert!(between.message().contains("between 1 and 2"));
    }

    #[test]
    fn categories_match_groups() {
        assert_eq!(
            Issue::MissingMass.category(),
            IssueCategory::Rule
        );
        assert_eq!(
            Issue::EmptyValue {
                attribute: "id".into()
            }
            .category(),
            IssueCategory::Attribute
        );
        assert_eq!(
            Issue::ResourceUnused {
                identifier: "bg".into()
            }
            .severity(),
            Severity::Advice
        );
    }
}
