//! Flattening of directory group records into host state values.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::directory::GroupRecord;
use crate::schema::AttrValue;

/// One group flattened into the fixed nine-field mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProjectedGroup(BTreeMap<String, AttrValue>);

impl ProjectedGroup {
    pub fn get(&self, field: &str) -> Option<&AttrValue> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ProjectedGroup> for AttrValue {
    fn from(group: ProjectedGroup) -> Self {
        AttrValue::Object(group.0)
    }
}

/// Project a single record. Total: every field is always present.
pub fn flatten_group(group: &GroupRecord) -> ProjectedGroup {
    let mut result = BTreeMap::new();
    result.insert("email".to_string(), AttrValue::from(group.email.as_str()));
    result.insert("id".to_string(), AttrValue::from(group.id.as_str()));
    result.insert(
        "admin_created".to_string(),
        AttrValue::from(group.admin_created),
    );
    result.insert("aliases".to_string(), AttrValue::from(group.aliases.clone()));
    result.insert(
        "description".to_string(),
        AttrValue::from(group.description.as_str()),
    );
    result.insert(
        "direct_members_count".to_string(),
        AttrValue::from(group.direct_members_count),
    );
    result.insert("etag".to_string(), AttrValue::from(group.etag.as_str()));
    result.insert("name".to_string(), AttrValue::from(group.name.as_str()));
    result.insert(
        "non_editable_aliases".to_string(),
        AttrValue::from(group.non_editable_aliases.clone()),
    );
    ProjectedGroup(result)
}

/// Project a sequence of records, preserving order.
pub fn flatten_groups(groups: &[GroupRecord]) -> Vec<ProjectedGroup> {
    groups.iter().map(flatten_group).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{group_attributes, AttrType};

    fn record(id: &str, aliases: &[&str]) -> GroupRecord {
        GroupRecord {
            id: id.into(),
            email: format!("{}@x.com", id),
            name: format!("Group {}", id),
            description: "desc".into(),
            admin_created: true,
            direct_members_count: 4,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            non_editable_aliases: Vec::new(),
            etag: "\"e1\"".into(),
        }
    }

    #[test]
    fn test_flatten_copies_every_field() {
        let projected = flatten_group(&record("g1", &["b@x.com", "a@x.com"]));
        assert_eq!(projected.len(), 9);
        assert_eq!(projected.get("id"), Some(&AttrValue::from("g1")));
        assert_eq!(projected.get("email"), Some(&AttrValue::from("g1@x.com")));
        assert_eq!(projected.get("name"), Some(&AttrValue::from("Group g1")));
        assert_eq!(projected.get("description"), Some(&AttrValue::from("desc")));
        assert_eq!(projected.get("admin_created"), Some(&AttrValue::Bool(true)));
        assert_eq!(projected.get("direct_members_count"), Some(&AttrValue::Int(4)));
        assert_eq!(projected.get("etag"), Some(&AttrValue::from("\"e1\"")));
        // Source order, not sorted.
        assert_eq!(
            projected.get("aliases"),
            Some(&AttrValue::List(vec![
                AttrValue::from("b@x.com"),
                AttrValue::from("a@x.com")
            ]))
        );
    }

    #[test]
    fn test_keys_match_schema_exactly() {
        let projected = flatten_group(&GroupRecord::default());
        let mut expected: Vec<_> = group_attributes().iter().map(|a| a.name).collect();
        expected.sort_unstable();
        let actual: Vec<_> = projected.fields().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_zero_record_degrades_to_zero_values() {
        let projected = flatten_group(&GroupRecord::default());
        assert_eq!(projected.get("email"), Some(&AttrValue::from("")));
        assert_eq!(projected.get("admin_created"), Some(&AttrValue::Bool(false)));
        assert_eq!(projected.get("direct_members_count"), Some(&AttrValue::Int(0)));
        assert_eq!(projected.get("aliases"), Some(&AttrValue::List(vec![])));
        assert_eq!(
            projected.get("non_editable_aliases"),
            Some(&AttrValue::List(vec![]))
        );
    }

    #[test]
    fn test_projection_conforms_to_schema() {
        let group_type = AttrType::Object(group_attributes());
        let value = AttrValue::from(flatten_group(&record("g1", &["a@x.com"])));
        group_type.check(&value, "groups.0").unwrap();
    }

    #[test]
    fn test_flatten_groups_preserves_order_and_length() {
        let records = vec![record("g3", &[]), record("g1", &[]), record("g2", &[])];
        let projected = flatten_groups(&records);
        let ids: Vec<_> = projected
            .iter()
            .map(|p| p.get("id").and_then(AttrValue::as_str).unwrap())
            .collect();
        assert_eq!(ids, vec!["g3", "g1", "g2"]);
        assert!(flatten_groups(&[]).is_empty());
    }

    #[test]
    fn test_projection_is_idempotent() {
        let r = record("g1", &["a@x.com"]);
        assert_eq!(flatten_group(&r), flatten_group(&r));
    }
}
