//! The closed sum of attribute kinds.
//!
//! Each variant implements the same contract: check a textual value and
//! report why it is unacceptable. Kind-specific parameters (numeric bounds,
//! enumeration values, reference families) live on the variant itself
//! rather than on parallel fields of the attribute declaration.

use serde::{Deserialize, Serialize};

use crate::value::{Argb, Rgb, Xy, parse_real};

/// Why a textual value does not satisfy an [`AttributeKind`].
///
/// This is deliberately not an `Error`: kind checks feed the validation
/// engine, which turns them into issues rather than failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueError {
    /// Not `true` or `false`.
    NotBoolean,
    /// Not a decimal integer.
    NotInteger,
    /// Not a finite real.
    NotReal,
    /// Numeric value below the declared minimum.
    BelowMinimum { min: String },
    /// Numeric value above the declared maximum.
    AboveMaximum { max: String },
    /// Value (or one list entry) outside the declared enumeration.
    NotInEnumeration { value: String },
    /// Not a comma-separated pair of reals.
    NotPair,
    /// Not 3 (RGB) or 4 (ARGB) integers in `[0, 255]`.
    NotColor,
    /// Radius must be a strictly positive real.
    NotPositive,
    /// Path kind requires a non-empty string.
    EmptyPath,
    /// Path kind stores bare names but the value carries an extension.
    PathHasExtension { extension: String },
}

impl ValueError {
    /// Short description used in issue messages.
    pub fn describe(&self) -> String {
        match self {
            Self::NotBoolean => "expected 'true' or 'false'".to_string(),
            Self::NotInteger => "expected an integer".to_string(),
            Self::NotReal => "expected a real number".to_string(),
            Self::BelowMinimum { min } => format!("below minimum {min}"),
            Self::AboveMaximum { max } => format!("above maximum {max}"),
            Self::NotInEnumeration { value } => {
                format!("'{value}' is not an allowed value")
            }
            Self::NotPair => "expected two comma-separated reals".to_string(),
            Self::NotColor => "expected color components in [0, 255]".to_string(),
            Self::NotPositive => "expected a positive real".to_string(),
            Self::EmptyPath => "expected a non-empty path".to_string(),
            Self::PathHasExtension { extension } => {
                format!("expected a path without the '.{extension}' extension")
            }
        }
    }
}

/// Attribute type, a closed sum.
///
/// `Reference` and `Identifier` carry a *family* (the identifier namespace
/// they target or populate) and the name of the world kind that scopes the
/// namespace. Reference validity itself is checked by the reference
/// tracker, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    Boolean,
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Real {
        min: Option<f64>,
        max: Option<f64>,
    },
    Enumerated {
        values: Vec<String>,
        /// When set, the value is a comma-separated list and every entry
        /// must belong to the enumeration.
        is_list: bool,
    },
    String,
    RgbColor,
    ArgbColor,
    /// A scene-space point, two reals.
    Xy,
    /// A width/height pair, two reals.
    Size,
    /// An x/y scale pair, two reals.
    Scale,
    AngleDegrees,
    AngleRadians,
    /// A strictly positive real.
    Radius,
    /// Consumes an identifier from a family's namespace.
    Reference {
        family: String,
        world_kind: String,
    },
    /// Contributes an identifier to a family's namespace.
    Identifier {
        family: String,
        world_kind: String,
    },
    /// A resource path, relative to the level directory.
    Path {
        /// When set, values are stored without a file extension; the
        /// consumer appends the format's own, so a value carrying one
        /// fails the check.
        strip_extension: bool,
    },
}

impl AttributeKind {
    /// Unbounded integer kind.
    pub fn integer() -> Self {
        Self::Integer {
            min: None,
            max: None,
        }
    }

    /// Unbounded real kind.
    pub fn real() -> Self {
        Self::Real {
            min: None,
            max: None,
        }
    }

    /// Single-valued enumeration.
    pub fn enumerated<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enumerated {
            values: values.into_iter().map(Into::into).collect(),
            is_list: false,
        }
    }

    /// Reference kind targeting `family`, scoped by `world_kind`.
    pub fn reference(family: impl Into<String>, world_kind: impl Into<String>) -> Self {
        Self::Reference {
            family: family.into(),
            world_kind: world_kind.into(),
        }
    }

    /// Identifier kind populating `family`, scoped by `world_kind`.
    pub fn identifier(family: impl Into<String>, world_kind: impl Into<String>) -> Self {
        Self::Identifier {
            family: family.into(),
            world_kind: world_kind.into(),
        }
    }

    /// Path kind keeping its extension.
    pub fn path() -> Self {
        Self::Path {
            strip_extension: false,
        }
    }

    /// True for the `Identifier` variant.
    pub fn is_identifier(&self) -> bool {
        matches!(self, Self::Identifier { .. })
    }

    /// True for the `Reference` variant.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }

    /// The identifier family, for Reference and Identifier kinds.
    pub fn family(&self) -> Option<&str> {
        match self {
            Self::Reference { family, .. } | Self::Identifier { family, .. } => Some(family),
            _ => None,
        }
    }

    /// The scoping world kind name, for Reference and Identifier kinds.
    pub fn world_kind(&self) -> Option<&str> {
        match self {
            Self::Reference { world_kind, .. } | Self::Identifier { world_kind, .. } => {
                Some(world_kind)
            }
            _ => None,
        }
    }

    /// Check a non-empty textual value against this kind.
    ///
    /// Emptiness and mandatory-ness are attribute-level policies checked by
    /// the validation engine before this is consulted; reference validity
    /// needs the tracker and is likewise checked elsewhere.
    pub fn check(&self, value: &str) -> Result<(), ValueError> {
        match self {
            Self::Boolean => match value.trim() {
                "true" | "false" => Ok(()),
                _ => Err(ValueError::NotBoolean),
            },
            Self::Integer { min, max } => {
                let parsed: i64 = value.trim().parse().map_err(|_| ValueError::NotInteger)?;
                if let Some(min) = min
                    && parsed < *min
                {
                    return Err(ValueError::BelowMinimum {
                        min: min.to_string(),
                    });
                }
                if let Some(max) = max
                    && parsed > *max
                {
                    return Err(ValueError::AboveMaximum {
                        max: max.to_string(),
                    });
                }
                Ok(())
            }
            Self::Real { min, max } => {
                let parsed = parse_real(value).ok_or(ValueError::NotReal)?;
                if let Some(min) = min
                    && parsed < *min
                {
                    return Err(ValueError::BelowMinimum {
                        min: min.to_string(),
                    });
                }
                if let Some(max) = max
                    && parsed > *max
                {
                    return Err(ValueError::AboveMaximum {
                        max: max.to_string(),
                    });
                }
                Ok(())
            }
            Self::Enumerated { values, is_list } => {
                if *is_list {
                    for entry in value.split(',') {
                        let entry = entry.trim();
                        if !values.iter().any(|v| v == entry) {
                            return Err(ValueError::NotInEnumeration {
                                value: entry.to_string(),
                            });
                        }
                    }
                    Ok(())
                } else if values.iter().any(|v| v == value.trim()) {
                    Ok(())
                } else {
                    Err(ValueError::NotInEnumeration {
                        value: value.trim().to_string(),
                    })
                }
            }
            Self::String => Ok(()),
            Self::RgbColor => Rgb::parse(value).map(|_| ()).ok_or(ValueError::NotColor),
            Self::ArgbColor => Argb::parse(value).map(|_| ()).ok_or(ValueError::NotColor),
            Self::Xy | Self::Size | Self::Scale => {
                Xy::parse(value).map(|_| ()).ok_or(ValueError::NotPair)
            }
            Self::AngleDegrees | Self::AngleRadians => {
                parse_real(value).map(|_| ()).ok_or(ValueError::NotReal)
            }
            Self::Radius => {
                let parsed = parse_real(value).ok_or(ValueError::NotReal)?;
                if parsed > 0.0 {
                    Ok(())
                } else {
                    Err(ValueError::NotPositive)
                }
            }
            // Reference and Identifier values are free-form tokens; their
            // resolvability is the tracker's concern.
            Self::Reference { .. } | Self::Identifier { .. } => Ok(()),
            Self::Path { strip_extension } => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValueError::EmptyPath);
                }
                if *strip_extension
                    && let Some((_, extension)) = trimmed.rsplit_once('.')
                    && !extension.contains('/')
                {
                    return Err(ValueError::PathHasExtension {
                        extension: extension.to_string(),
                    });
                }
                Ok(())
            }
        }
    }
}
