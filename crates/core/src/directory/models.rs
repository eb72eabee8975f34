//! Wire types for the directory API `groups` collection.

use serde::{Deserialize, Deserializer, Serialize};

/// One directory group as returned by the API.
///
/// Every field defaults when absent so a sparse record still decodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub admin_created: bool,
    #[serde(deserialize_with = "int64_from_string_or_number")]
    pub direct_members_count: i64,
    #[serde(deserialize_with = "string_list")]
    pub aliases: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub non_editable_aliases: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub etag: String,
}

/// One page of a group listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupsPage {
    pub kind: String,
    pub etag: String,
    #[serde(deserialize_with = "null_as_default")]
    pub groups: Vec<GroupRecord>,
    pub next_page_token: Option<String>,
}

impl GroupsPage {
    /// The token for the following page, or `None` on the last page.
    ///
    /// The API signals the end either by omitting the token or by sending
    /// an empty one.
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Error envelope returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A string array where both the array and its elements may be null.
/// Null elements are dropped.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<Option<String>>>::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

/// int64 values arrive as JSON strings; accept bare numbers and null too.
fn int64_from_string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64Repr {
        Number(i64),
        Text(String),
    }

    match Option::<Int64Repr>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Int64Repr::Number(n)) => Ok(n),
        Some(Int64Repr::Text(s)) if s.is_empty() => Ok(0),
        Some(Int64Repr::Text(s)) => s.parse().map_err(serde::de::Error::custom),
    }
}
