//! Attribute schema for the groups data source and the primitive value
//! type stored in host state.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::WritebackError;

/// Host state field and resource identifier for the groups data source.
pub const GROUPS_KEY: &str = "groups";

/// OAuth scope the directory client needs for group listings.
pub const GROUPS_OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/admin.directory.group";

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A primitive value in host state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    String(String),
    Bool(bool),
    Int(i64),
    List(Vec<AttrValue>),
    Object(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values.into_iter().map(Self::String).collect())
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Declared type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "elem", rename_all = "snake_case")]
pub enum AttrType {
    String,
    Bool,
    Int,
    List(Box<AttrType>),
    Object(Vec<Attribute>),
}

impl AttrType {
    fn describe(&self) -> String {
        match self {
            Self::String => "string".into(),
            Self::Bool => "bool".into(),
            Self::Int => "int".into(),
            Self::List(elem) => format!("list of {}", elem.describe()),
            Self::Object(_) => "object".into(),
        }
    }

    /// Check that `value` conforms to this type. `path` names the value in
    /// error messages.
    pub fn check(&self, value: &AttrValue, path: &str) -> Result<(), WritebackError> {
        match (self, value) {
            (Self::String, AttrValue::String(_))
            | (Self::Bool, AttrValue::Bool(_))
            | (Self::Int, AttrValue::Int(_)) => Ok(()),
            (Self::List(elem), AttrValue::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    elem.check(item, &format!("{}.{}", path, i))?;
                }
                Ok(())
            }
            (Self::Object(attrs), AttrValue::Object(fields)) => {
                for (key, field) in fields {
                    let nested = format!("{}.{}", path, key);
                    let attr = attrs
                        .iter()
                        .find(|a| a.name == key.as_str())
                        .ok_or_else(|| WritebackError::UnknownAttribute(nested.clone()))?;
                    attr.attr_type.check(field, &nested)?;
                }
                Ok(())
            }
            _ => Err(WritebackError::TypeMismatch {
                path: path.to_string(),
                expected: self.describe(),
                actual: value.type_name().to_string(),
            }),
        }
    }
}

/// One named attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    #[serde(flatten)]
    pub attr_type: AttrType,
    pub description: &'static str,
    pub computed: bool,
}

impl Attribute {
    fn computed(name: &'static str, attr_type: AttrType, description: &'static str) -> Self {
        Self {
            name,
            attr_type,
            description,
            computed: true,
        }
    }
}

/// Schema of a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub description: String,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Fields of a single group element, in projection order.
pub fn group_attributes() -> Vec<Attribute> {
    vec![
        Attribute::computed(
            "email",
            AttrType::String,
            "The group's email address. Unique within the customer account.",
        ),
        Attribute::computed(
            "id",
            AttrType::String,
            "The unique ID of the group. Usable as the group key in request URIs.",
        ),
        Attribute::computed(
            "admin_created",
            AttrType::Bool,
            "True if the group was created by an administrator rather than a user.",
        ),
        Attribute::computed(
            "aliases",
            AttrType::List(Box::new(AttrType::String)),
            "The group's alias email addresses.",
        ),
        Attribute::computed(
            "description",
            AttrType::String,
            "An extended description to help users determine the purpose of the group.",
        ),
        Attribute::computed(
            "direct_members_count",
            AttrType::Int,
            "The number of users that are direct members of the group. Members of \
             nested groups are not counted.",
        ),
        Attribute::computed("etag", AttrType::String, "ETag of the resource."),
        Attribute::computed("name", AttrType::String, "The group's display name."),
        Attribute::computed(
            "non_editable_aliases",
            AttrType::List(Box::new(AttrType::String)),
            "The group's non-editable alias addresses outside the account's primary \
             domain or subdomains.",
        ),
    ]
}

/// Schema of the groups data source.
pub fn groups_data_source_schema() -> Schema {
    Schema {
        description: format!(
            "Groups data source. Groups are listed under the `{}` client scope.",
            GROUPS_OAUTH_SCOPE
        ),
        attributes: vec![Attribute::computed(
            GROUPS_KEY,
            AttrType::List(Box::new(AttrType::Object(group_attributes()))),
            "A list of Group resources.",
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_type() -> AttrType {
        AttrType::Object(group_attributes())
    }

    #[test]
    fn test_group_attributes_are_the_nine_fields() {
        let names: Vec<_> = group_attributes().iter().map(|a| a.name).collect();
        assert_eq!(
            names,
            vec![
                "email",
                "id",
                "admin_created",
                "aliases",
                "description",
                "direct_members_count",
                "etag",
                "name",
                "non_editable_aliases",
            ]
        );
        assert!(group_attributes().iter().all(|a| a.computed));
    }

    #[test]
    fn test_check_accepts_conforming_object() {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), AttrValue::from("g1"));
        fields.insert("admin_created".to_string(), AttrValue::from(true));
        fields.insert(
            "aliases".to_string(),
            AttrValue::from(vec!["a@x.com".to_string()]),
        );
        assert!(group_type()
            .check(&AttrValue::Object(fields), "groups.0")
            .is_ok());
    }

    #[test]
    fn test_check_reports_type_mismatch_path() {
        let mut fields = BTreeMap::new();
        fields.insert("direct_members_count".to_string(), AttrValue::from("3"));
        let err = group_type()
            .check(&AttrValue::Object(fields), "groups.0")
            .unwrap_err();
        assert_eq!(
            err,
            WritebackError::TypeMismatch {
                path: "groups.0.direct_members_count".into(),
                expected: "int".into(),
                actual: "string".into(),
            }
        );
    }

    #[test]
    fn test_check_rejects_unknown_field() {
        let mut fields = BTreeMap::new();
        fields.insert("kind".to_string(), AttrValue::from("admin#directory#group"));
        let err = group_type()
            .check(&AttrValue::Object(fields), "groups.0")
            .unwrap_err();
        assert_eq!(
            err,
            WritebackError::UnknownAttribute("groups.0.kind".into())
        );
    }

    #[test]
    fn test_list_elements_checked() {
        let list = AttrType::List(Box::new(AttrType::String));
        let value = AttrValue::List(vec![AttrValue::from("a"), AttrValue::from(1i64)]);
        let err = list.check(&value, "aliases").unwrap_err();
        assert!(matches!(err, WritebackError::TypeMismatch { ref path, .. } if path == "aliases.1"));
    }

    #[test]
    fn test_data_source_schema_mentions_scope() {
        let schema = groups_data_source_schema();
        assert!(schema.description.contains(GROUPS_OAUTH_SCOPE));
        let groups = schema.attribute(GROUPS_KEY).unwrap();
        assert!(matches!(groups.attr_type, AttrType::List(_)));
        assert!(schema.attribute("missing").is_none());
    }

    #[test]
    fn test_values_serialize_as_plain_json() {
        let value = AttrValue::List(vec![AttrValue::from("a"), AttrValue::from(2i64)]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"["a",2]"#);
    }
}
