use std::fmt;
use std::str::FromStr;

/// The directed, typed relation between two nodes (spec §3 "Edge").
///
/// Structural types connect content to people/domains and are excluded from
/// calibration and activation fan-out weighting differences; semantic types
/// participate in spreading activation, calibration, and cluster formation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeType {
    // Structural
    AuthoredBy,
    BelongsTo,
    Defines,
    MemberOf,
    Imports,
    Inherits,
    Implements,
    // Semantic
    References,
    InformedBy,
    Applies,
    RelatedTo,
    SameScope,
    ModifiesSame,
    BelongsToTheme,
    ClusteredIn,
    CoAccessed,
}

impl EdgeType {
    pub const ALL: [EdgeType; 16] = [
        EdgeType::AuthoredBy,
        EdgeType::BelongsTo,
        EdgeType::Defines,
        EdgeType::MemberOf,
        EdgeType::Imports,
        EdgeType::Inherits,
        EdgeType::Implements,
        EdgeType::References,
        EdgeType::InformedBy,
        EdgeType::Applies,
        EdgeType::RelatedTo,
        EdgeType::SameScope,
        EdgeType::ModifiesSame,
        EdgeType::BelongsToTheme,
        EdgeType::ClusteredIn,
        EdgeType::CoAccessed,
    ];

    /// `AUTHORED_BY` and `BELONGS_TO` are structural; everything else is
    /// semantic (glossary: "Edge type (semantic vs structural)").
    pub fn is_structural(self) -> bool {
        matches!(self, EdgeType::AuthoredBy | EdgeType::BelongsTo)
    }

    pub fn is_semantic(self) -> bool {
        !self.is_structural()
    }

    /// Does this edge type participate in spreading activation / result
    /// `connections` (spec §4.5 step 5: "semantic types").
    pub fn is_activation_type(self) -> bool {
        matches!(
            self,
            EdgeType::References
                | EdgeType::InformedBy
                | EdgeType::Applies
                | EdgeType::RelatedTo
                | EdgeType::SameScope
                | EdgeType::ModifiesSame
                | EdgeType::BelongsToTheme
                | EdgeType::ClusteredIn
        )
    }

    /// Typed default weight (spec §3).
    ///
    /// `RelatedTo` has no fixed default — its weight is always the
    /// similarity score at creation time — so callers must supply it
    /// explicitly rather than relying on this default.
    pub fn default_weight(self) -> f64 {
        match self {
            EdgeType::AuthoredBy => 0.5,
            EdgeType::BelongsTo => 0.5,
            EdgeType::References => 0.6,
            EdgeType::InformedBy => 0.7,
            EdgeType::Applies => 0.6,
            EdgeType::SameScope => 0.4,
            EdgeType::ModifiesSame => 0.5,
            EdgeType::CoAccessed => 0.3,
            EdgeType::RelatedTo => 0.5,
            EdgeType::Defines => 0.8,
            EdgeType::Inherits => 0.7,
            EdgeType::MemberOf => 0.8,
            EdgeType::Imports => 0.5,
            EdgeType::ClusteredIn => 0.5,
            EdgeType::BelongsToTheme => 0.6,
            EdgeType::Implements => 0.7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::AuthoredBy => "AUTHORED_BY",
            EdgeType::BelongsTo => "BELONGS_TO",
            EdgeType::Defines => "DEFINES",
            EdgeType::MemberOf => "MEMBER_OF",
            EdgeType::Imports => "IMPORTS",
            EdgeType::Inherits => "INHERITS",
            EdgeType::Implements => "IMPLEMENTS",
            EdgeType::References => "REFERENCES",
            EdgeType::InformedBy => "INFORMED_BY",
            EdgeType::Applies => "APPLIES",
            EdgeType::RelatedTo => "RELATED_TO",
            EdgeType::SameScope => "SAME_SCOPE",
            EdgeType::ModifiesSame => "MODIFIES_SAME",
            EdgeType::BelongsToTheme => "BELONGS_TO_THEME",
            EdgeType::ClusteredIn => "CLUSTERED_IN",
            EdgeType::CoAccessed => "CO_ACCESSED",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown edge type: {0}")]
pub struct ParseEdgeTypeError(String);

impl FromStr for EdgeType {
    type Err = ParseEdgeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for variant in EdgeType::ALL {
            if variant.as_str() == s {
                return Ok(variant);
            }
        }
        Err(ParseEdgeTypeError(s.to_string()))
    }
}

impl serde::Serialize for EdgeType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for EdgeType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_str() {
        for variant in EdgeType::ALL {
            assert_eq!(variant.as_str().parse::<EdgeType>().unwrap(), variant);
        }
    }

    #[test]
    fn only_authored_by_and_belongs_to_are_structural() {
        let structural: Vec<_> = EdgeType::ALL.iter().copied().filter(|e| e.is_structural()).collect();
        assert_eq!(structural, vec![EdgeType::AuthoredBy, EdgeType::BelongsTo]);
    }
}
