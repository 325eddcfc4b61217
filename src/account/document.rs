//! Firestore typed-value encoding for the `users` collection.
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::models::{ProfileFields, UserProfile};

pub(crate) const COLLECTION: &str = "users";

/// Fields an update is allowed to touch, in update-mask order.
pub(crate) const MUTABLE_FIELDS: [&str; 3] = ["name", "phone", "address"];

#[derive(Debug, Deserialize)]
pub(crate) struct Document {
    #[serde(default)]
    fields: HashMap<String, FieldValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldValue {
    string_value: Option<String>,
    timestamp_value: Option<String>,
}

impl FieldValue {
    fn as_text(&self) -> Option<&str> {
        self.string_value
            .as_deref()
            .or(self.timestamp_value.as_deref())
    }
}

impl Document {
    fn text(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .and_then(FieldValue::as_text)
            .map(str::to_string)
    }

    pub(crate) fn into_profile(self, subject: &str) -> UserProfile {
        UserProfile {
            id: subject.to_string(),
            name: self.text("name").unwrap_or_default(),
            email: self.text("email").unwrap_or_default(),
            phone: self.text("phone").unwrap_or_default(),
            address: self.text("address").unwrap_or_default(),
            created_at: self.text("createdAt"),
        }
    }
}

fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

/// Body for the full document written at sign-up.
pub(crate) fn profile_document(profile: &UserProfile) -> Value {
    let mut fields = Map::new();
    fields.insert("name".to_string(), string_value(&profile.name));
    fields.insert("email".to_string(), string_value(&profile.email));
    fields.insert("phone".to_string(), string_value(&profile.phone));
    fields.insert("address".to_string(), string_value(&profile.address));
    if let Some(created_at) = &profile.created_at {
        fields.insert("createdAt".to_string(), string_value(created_at));
    }
    json!({ "fields": fields })
}

/// Body for a partial update. Carries [`MUTABLE_FIELDS`] only.
pub(crate) fn update_document(update: &ProfileFields) -> Value {
    let values = [&update.name, &update.phone, &update.address];
    let fields: Map<String, Value> = MUTABLE_FIELDS
        .iter()
        .zip(values)
        .map(|(key, value)| (key.to_string(), string_value(value)))
        .collect();
    json!({ "fields": fields })
}

pub(crate) fn update_mask_query() -> String {
    let mut query: Vec<String> = MUTABLE_FIELDS
        .iter()
        .map(|f| format!("updateMask.fieldPaths={f}"))
        .collect();
    query.push("currentDocument.exists=true".to_string());
    query.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_profile_document() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/users/uid-1",
            "fields": {
                "name": { "stringValue": "Ana" },
                "email": { "stringValue": "ana@example.com" },
                "phone": { "stringValue": "1199999" },
                "createdAt": { "stringValue": "2024-05-01T10:00:00.000Z" }
            },
            "createTime": "2024-05-01T10:00:00.123456Z"
        }))
        .expect("document deserialize");
        let profile = doc.into_profile("uid-1");
        assert_eq!(profile.id, "uid-1");
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.address, "");
        assert_eq!(
            profile.created_at.as_deref(),
            Some("2024-05-01T10:00:00.000Z")
        );
    }

    #[test]
    fn update_body_never_carries_email() {
        let body = update_document(&ProfileFields {
            name: "Ana".to_string(),
            phone: "1".to_string(),
            address: "Rua A".to_string(),
        });
        let fields = body["fields"].as_object().expect("fields object");
        assert_eq!(fields.len(), 3);
        assert!(!fields.contains_key("email"));
        assert_eq!(body["fields"]["address"]["stringValue"], "Rua A");
        assert_eq!(
            update_mask_query(),
            "updateMask.fieldPaths=name&updateMask.fieldPaths=phone&updateMask.fieldPaths=address&currentDocument.exists=true"
        );
    }
}
