use std::fmt;

/// Closed set of widget property value kinds.
///
/// Wire tags that name none of these land in `Unknown` so the decoder can
/// report them instead of failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    Enumeration,
    Boolean,
    EntityRef,
    EntityPathRef,
    EntityConstraint,
    MicroflowRef,
    TranslatableText,
    AttributeRef,
    AttributePathRef,
    ObjectList,
    Unknown(String),
}

impl ValueKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "String" => Self::String,
            "Integer" => Self::Integer,
            "Enumeration" => Self::Enumeration,
            "Boolean" => Self::Boolean,
            "Entity" | "EntityRef" => Self::EntityRef,
            "EntityPath" | "EntityPathRef" => Self::EntityPathRef,
            "EntityConstraint" => Self::EntityConstraint,
            "Microflow" | "MicroflowRef" => Self::MicroflowRef,
            "TranslatableString" | "TranslatableText" => Self::TranslatableText,
            "Attribute" | "AttributeRef" => Self::AttributeRef,
            "AttributePath" | "AttributePathRef" => Self::AttributePathRef,
            "Object" | "ObjectList" => Self::ObjectList,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Enumeration => "Enumeration",
            Self::Boolean => "Boolean",
            Self::EntityRef => "EntityRef",
            Self::EntityPathRef => "EntityPathRef",
            Self::EntityConstraint => "EntityConstraint",
            Self::MicroflowRef => "MicroflowRef",
            Self::TranslatableText => "TranslatableText",
            Self::AttributeRef => "AttributeRef",
            Self::AttributePathRef => "AttributePathRef",
            Self::ObjectList => "ObjectList",
            Self::Unknown(tag) => tag,
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tags_and_aliases() {
        assert_eq!(ValueKind::from_tag("Entity"), ValueKind::EntityRef);
        assert_eq!(ValueKind::from_tag("EntityRef"), ValueKind::EntityRef);
        assert_eq!(ValueKind::from_tag("TranslatableString"), ValueKind::TranslatableText);
        assert_eq!(ValueKind::from_tag("Object"), ValueKind::ObjectList);
        assert_eq!(ValueKind::from_tag("Icon"), ValueKind::Unknown("Icon".into()));
        assert_eq!(ValueKind::from_tag("Icon").to_string(), "Icon");
    }
}
