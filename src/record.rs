//! The domain record stored in the table, and its hand-written attribute translation.
//!
//! The translation here and the serde mapping used by
//! [`crate::gateway::mapped::MappedTable`] produce identical items, so a record written
//! through one gateway flavor reads back through any other.

use crate::error;

use aws_sdk_dynamodb::types;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections;

/// Partition key attribute.
pub const ID: &str = "id";
/// Attribute holding [`Record::name`].
pub const NAME: &str = "custName";
/// Attribute holding [`Record::email`].
pub const EMAIL: &str = "email";
/// Attribute holding [`Record::registration_timestamp`].
pub const REGISTRATION_DATE: &str = "registrationDate";
/// Attribute holding [`Record::attributes`].
pub const ATTRIBUTES: &str = "attributes";
/// Attribute holding [`Record::tags`].
pub const TAGS: &str = "tags";

/// A customer record, addressed by `id`.
///
/// Every field other than `id` is optional. `None` is stored as an absent attribute,
/// while `Some` of an empty value is stored as a present, empty attribute.
///
/// ```rust
/// use dynamodb_harness::record::Record;
///
/// let record = Record {
///     id: "id146".to_string(),
///     email: Some("sred@noserver.com".to_string()),
///     ..Default::default()
/// };
/// let lookup = Record::key_only("id146");
/// assert_eq!(lookup.id, record.id);
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Record {
    /// Unique identifier, the partition key.
    pub id: String,
    /// Customer name.
    #[serde(rename = "custName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// When the customer registered.
    #[serde(rename = "registrationDate", skip_serializing_if = "Option::is_none")]
    pub registration_timestamp: Option<DateTime<Utc>>,
    /// Free-form nested data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<collections::BTreeMap<String, String>>,
    /// Ordered labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Record {
    /// A record carrying only its key.
    pub fn key_only(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// The key item addressing `id`.
pub fn key(id: &str) -> collections::HashMap<String, types::AttributeValue> {
    collections::HashMap::from([(ID.to_string(), types::AttributeValue::S(id.to_string()))])
}

/// Translate a record into its item.
pub fn to_item(record: &Record) -> collections::HashMap<String, types::AttributeValue> {
    let mut item = key(&record.id);
    if let Some(name) = &record.name {
        item.insert(NAME.to_string(), types::AttributeValue::S(name.clone()));
    }
    if let Some(email) = &record.email {
        item.insert(EMAIL.to_string(), types::AttributeValue::S(email.clone()));
    }
    if let Some(timestamp) = &record.registration_timestamp {
        item.insert(
            REGISTRATION_DATE.to_string(),
            types::AttributeValue::S(timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
    }
    if let Some(attributes) = &record.attributes {
        let map = attributes
            .iter()
            .map(|(key, value)| (key.clone(), types::AttributeValue::S(value.clone())))
            .collect();
        item.insert(ATTRIBUTES.to_string(), types::AttributeValue::M(map));
    }
    if let Some(tags) = &record.tags {
        let list = tags
            .iter()
            .map(|tag| types::AttributeValue::S(tag.clone()))
            .collect();
        item.insert(TAGS.to_string(), types::AttributeValue::L(list));
    }
    item
}

/// Translate an item back into a record.
///
/// Absent attributes come back as `None`. Attributes the record does not know are ignored.
pub fn from_item(
    mut item: collections::HashMap<String, types::AttributeValue>,
) -> error::Result<Record> {
    let id = take_string(&mut item, ID)?
        .ok_or_else(|| error::Error::Conversion(format!("missing key attribute `{ID}`")))?;
    let registration_timestamp = take_string(&mut item, REGISTRATION_DATE)?
        .map(|value| {
            DateTime::parse_from_rfc3339(&value)
                .map(|timestamp| timestamp.with_timezone(&Utc))
                .map_err(|error| {
                    error::Error::Conversion(format!("`{REGISTRATION_DATE}`=`{value}`: {error}"))
                })
        })
        .transpose()?;
    let attributes: Option<collections::BTreeMap<String, String>> = match item.remove(ATTRIBUTES) {
        None | Some(types::AttributeValue::Null(true)) => None,
        Some(types::AttributeValue::M(map)) => Some(
            map.into_iter()
                .map(|(key, value)| {
                    let name = format!("{ATTRIBUTES}.{key}");
                    expect_string(&name, value).map(|value| (key, value))
                })
                .collect::<error::Result<_>>()?,
        ),
        Some(other) => return Err(unexpected_type(ATTRIBUTES, "M", &other)),
    };
    let tags: Option<Vec<String>> = match item.remove(TAGS) {
        None | Some(types::AttributeValue::Null(true)) => None,
        Some(types::AttributeValue::L(list)) => Some(
            list.into_iter()
                .enumerate()
                .map(|(index, value)| expect_string(&format!("{TAGS}[{index}]"), value))
                .collect::<error::Result<_>>()?,
        ),
        Some(other) => return Err(unexpected_type(TAGS, "L", &other)),
    };
    let record = Record {
        id,
        name: take_string(&mut item, NAME)?,
        email: take_string(&mut item, EMAIL)?,
        registration_timestamp,
        attributes,
        tags,
    };
    Ok(record)
}

fn take_string(
    item: &mut collections::HashMap<String, types::AttributeValue>,
    name: &str,
) -> error::Result<Option<String>> {
    match item.remove(name) {
        None | Some(types::AttributeValue::Null(true)) => Ok(None),
        Some(value) => expect_string(name, value).map(Some),
    }
}

fn expect_string(name: &str, value: types::AttributeValue) -> error::Result<String> {
    match value {
        types::AttributeValue::S(value) => Ok(value),
        other => Err(unexpected_type(name, "S", &other)),
    }
}

fn unexpected_type(name: &str, expected: &str, actual: &types::AttributeValue) -> error::Error {
    error::Error::Conversion(format!(
        "attribute `{name}` should be of type {expected}, found {actual:?}"
    ))
}
