//! Argument records for the CRM operations.
//!
//! # Design
//! Each multi-argument operation gets its own struct whose field names
//! serialize to the remote PascalCase names. Optional arguments are `Option`s
//! and always serialize (as `null` when unset); whether a null is sent or
//! dropped is decided later by the operation's suppression mode, not here.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::params::to_object;

/// A multi-valued contact collection keyed by position: `"0"`, `"1"`, ...
pub type Indexed<T> = BTreeMap<String, T>;

/// Key a sequence of entries by position, the shape the CRM expects for
/// Email, Phone, Address, and Website.
pub fn indexed<T>(entries: impl IntoIterator<Item = T>) -> Indexed<T> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| (i.to_string(), entry))
        .collect()
}

/// An email address or phone number. `kind` is Work, Personal, or Other.
///
/// Values pass through as given; keys beyond these two are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContactMethod {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContactMethod {
    pub fn new(text: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            text: Some(Value::String(text.into())),
            kind: Some(Value::String(kind.into())),
            ..Self::default()
        }
    }
}

/// A postal address. `kind` is Work, Billing, Shipping, Home, or Other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Value>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Website {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Website {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(Value::String(text.into())),
            ..Self::default()
        }
    }
}

/// A contact or company, as sent to CreateContact and EditContact.
///
/// No field is validated. EditContact needs `contact_id` set. Fields the CRM
/// accepts as either a number or a string are held as raw JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Contact {
    pub full_name: Option<String>,
    pub salutation: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    pub company_name: Option<String>,
    pub company_id: Option<String>,
    pub title: Option<String>,
    pub industry: Option<String>,
    pub num_employees: Option<Value>,
    pub background_info: Option<String>,
    pub email: Option<Indexed<ContactMethod>>,
    pub phone: Option<Indexed<ContactMethod>>,
    pub address: Option<Indexed<Address>>,
    pub website: Option<Indexed<Website>>,
    pub birthday: Option<String>,
    pub custom_fields: Option<Map<String, Value>>,
    pub assigned_to: Option<Value>,
    pub contact_id: Option<String>,
}

impl Contact {
    /// Read a field by its remote name, e.g. `"ContactId"`.
    ///
    /// Unset fields read as `Value::Null`.
    pub fn get(&self, field: &str) -> Result<Value, ApiError> {
        let mut fields = to_object(self)?;
        fields
            .remove(field)
            .ok_or_else(|| ApiError::UnknownField(field.to_string()))
    }

    /// Overwrite a field by its remote name.
    pub fn set(&mut self, field: &str, value: impl Serialize) -> Result<(), ApiError> {
        let mut fields = to_object(self)?;
        let slot = fields
            .get_mut(field)
            .ok_or_else(|| ApiError::UnknownField(field.to_string()))?;
        *slot = serde_json::to_value(value)?;
        *self = serde_json::from_value(Value::Object(fields))?;
        Ok(())
    }

    /// Iterate over the fields that are set, by remote name.
    pub fn fields(&self) -> Result<impl Iterator<Item = (String, Value)>, ApiError> {
        Ok(to_object(self)?.into_iter().filter(|(_, v)| !v.is_null()))
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields().map_err(|_| fmt::Error)?;
        let mut list = f.debug_map();
        for (name, value) in fields {
            list.entry(&name, &format_args!("{value}"));
        }
        list.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchContacts {
    pub search_terms: String,
    /// FirstName, LastName, DateEntered, DateEdited, or Relevance.
    pub sort: Option<String>,
    /// Between 1 and 500.
    pub num_rows: Option<u32>,
    pub page: Option<u32>,
    /// Contacts or Companies; both when unset.
    pub record_type: Option<String>,
}

impl SearchContacts {
    pub fn new(search_terms: impl Into<String>) -> Self {
        Self {
            search_terms: search_terms.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTask {
    /// YYYY-MM-DD. A past date shows up as overdue.
    pub due_date: String,
    pub name: String,
    pub description: Option<String>,
    pub contact_id: Option<String>,
    /// UserId of another user to assign the task to.
    pub assigned_to: Option<u64>,
}

impl CreateTask {
    pub fn new(due_date: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            due_date: due_date.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEvent {
    /// YYYY-MM-DD.
    pub date: String,
    pub name: String,
    /// hh:mm, 24 hour, in the account's timezone.
    pub start_time: String,
    pub end_time: String,
    pub description: Option<String>,
    pub contacts: Option<Vec<String>>,
    /// When set, the event is only assigned to the caller if their own id is listed.
    pub users: Option<Vec<String>>,
}

impl CreateEvent {
    pub fn new(
        date: impl Into<String>,
        name: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            name: name.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatePipeline {
    pub contact_id: String,
    pub pipeline_id: String,
    pub status_id: String,
    /// 1 (low), 2 (medium), or 3 (high).
    pub priority: Option<u8>,
    pub custom_fields: Option<Map<String, Value>>,
    pub note: Option<String>,
}

impl CreatePipeline {
    pub fn new(
        contact_id: impl Into<String>,
        pipeline_id: impl Into<String>,
        status_id: impl Into<String>,
    ) -> Self {
        Self {
            contact_id: contact_id.into(),
            pipeline_id: pipeline_id.into(),
            status_id: status_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdatePipelineItem {
    pub pipeline_item_id: String,
    pub status_id: String,
    pub priority: Option<u8>,
    /// Only the custom fields listed here are updated.
    pub custom_fields: Option<Map<String, Value>>,
    pub note: Option<String>,
}

impl UpdatePipelineItem {
    pub fn new(pipeline_item_id: impl Into<String>, status_id: impl Into<String>) -> Self {
        Self {
            pipeline_item_id: pipeline_item_id.into(),
            status_id: status_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineReport {
    pub pipeline_id: String,
    /// Priority, DateNote, ContactName, or Status.
    pub sort_by: Option<String>,
    pub num_rows: Option<u32>,
    pub page: Option<u32>,
    /// ASC or DESC.
    pub sort_direction: Option<String>,
    pub user_filter: Option<String>,
    /// all, closed, or a specific StatusId. Open statuses only when unset.
    pub status_filter: Option<String>,
}

impl PipelineReport {
    pub fn new(pipeline_id: impl Into<String>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ContactIdArgs<'a> {
    pub contact_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct NoteArgs<'a> {
    pub contact_id: &'a str,
    pub note: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GroupArgs<'a> {
    pub contact_id: &'a str,
    /// Spaces must already be replaced with underscores.
    pub group_name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contact_serializes_every_field_in_pascal_case() {
        let fields = to_object(&Contact::default()).unwrap();
        assert_eq!(fields.len(), 20);
        for name in [
            "FullName", "Salutation", "FirstName", "MiddleName", "LastName", "Suffix",
            "CompanyName", "CompanyId", "Title", "Industry", "NumEmployees", "BackgroundInfo",
            "Email", "Phone", "Address", "Website", "Birthday", "CustomFields", "AssignedTo",
            "ContactId",
        ] {
            assert_eq!(fields.get(name), Some(&Value::Null), "{name}");
        }
    }

    #[test]
    fn indexed_keys_entries_by_position() {
        let emails = indexed([
            ContactMethod::new("a@example.com", "Work"),
            ContactMethod::new("b@example.com", "Personal"),
        ]);
        assert_eq!(
            serde_json::to_value(&emails).unwrap(),
            json!({
                "0": {"Text": "a@example.com", "Type": "Work"},
                "1": {"Text": "b@example.com", "Type": "Personal"}
            })
        );
    }

    #[test]
    fn address_omits_unset_parts() {
        let address = Address {
            city: Some("St. Example".into()),
            kind: Some("Shipping".into()),
            ..Address::default()
        };
        assert_eq!(
            serde_json::to_value(&address).unwrap(),
            json!({"City": "St. Example", "Type": "Shipping"})
        );
    }

    #[test]
    fn get_and_set_by_remote_name() {
        let mut contact = Contact {
            full_name: Some("API Test Client".to_string()),
            ..Contact::default()
        };
        assert_eq!(contact.get("ContactId").unwrap(), Value::Null);

        contact.set("ContactId", "3715").unwrap();
        contact.set("FullName", "API Test Client Jr").unwrap();
        assert_eq!(contact.contact_id.as_deref(), Some("3715"));
        assert_eq!(contact.get("FullName").unwrap(), json!("API Test Client Jr"));
    }

    #[test]
    fn set_can_clear_a_field() {
        let mut contact = Contact {
            title: Some("CEO".to_string()),
            ..Contact::default()
        };
        contact.set("Title", Value::Null).unwrap();
        assert!(contact.title.is_none());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut contact = Contact::default();
        assert!(matches!(contact.get("Nickname"), Err(ApiError::UnknownField(_))));
        assert!(matches!(contact.set("Nickname", "x"), Err(ApiError::UnknownField(_))));
        assert_eq!(contact, Contact::default());
    }

    #[test]
    fn set_with_wrong_shape_leaves_contact_unchanged() {
        let mut contact = Contact::default();
        let err = contact.set("Email", "not-a-map").unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
        assert_eq!(contact, Contact::default());
    }

    #[test]
    fn numeric_fields_are_accepted_as_numbers() {
        let mut contact = Contact::default();
        contact.set("NumEmployees", 50).unwrap();
        contact.set("AssignedTo", 42).unwrap();
        assert_eq!(contact.num_employees, Some(json!(50)));
        assert_eq!(contact.get("AssignedTo").unwrap(), json!(42));

        contact.set("NumEmployees", "50-100").unwrap();
        assert_eq!(contact.get("NumEmployees").unwrap(), json!("50-100"));
    }

    #[test]
    fn partial_collection_entries_are_accepted() {
        let mut contact = Contact::default();
        contact.set("Email", json!({"0": {"Type": "Work"}})).unwrap();
        assert_eq!(contact.get("Email").unwrap(), json!({"0": {"Type": "Work"}}));

        let entry = json!({"0": {"Street": 12, "Type": "Home", "Label": "cabin"}});
        contact.set("Address", &entry).unwrap();
        let address = &contact.address.as_ref().unwrap()["0"];
        assert_eq!(address.street, Some(json!(12)));
        assert_eq!(address.extra["Label"], "cabin");
        assert_eq!(contact.get("Address").unwrap(), entry);
    }

    #[test]
    fn display_lists_only_set_fields() {
        let contact = Contact {
            full_name: Some("Ann".to_string()),
            ..Contact::default()
        };
        let shown = contact.to_string();
        assert!(shown.contains("FullName"));
        assert!(shown.contains("Ann"));
        assert!(!shown.contains("Email"));
    }
}
