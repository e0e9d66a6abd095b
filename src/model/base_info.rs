//! Personal information and the order in which its fields render.

use crate::error::DocumentError;
use crate::model::document::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The single personal-info record of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaseInfo {
    pub name: String,
    /// Job title shown under the name.
    pub title: String,
    pub phone: String,
    pub email: String,
    pub location: String,
    pub birth_date: String,
    pub employment_status: String,
    /// Photo URL; `None` hides the photo.
    pub photo: Option<String>,
    /// User-defined contact channels (blog, GitHub, …).
    pub custom_fields: Vec<CustomField>,
}

impl BaseInfo {
    /// Look up the value of a built-in field by its [`FieldDescriptor::key`].
    ///
    /// Returns `None` for unknown keys and for empty values.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        let v = match key {
            "name" => &self.name,
            "title" => &self.title,
            "phone" => &self.phone,
            "email" => &self.email,
            "location" => &self.location,
            "birthDate" => &self.birth_date,
            "employmentStatus" => &self.employment_status,
            _ => return None,
        };
        if v.trim().is_empty() {
            None
        } else {
            Some(v.as_str())
        }
    }

    /// Append a new custom contact field with a fresh id.
    pub fn add_custom_field(&mut self, label: impl Into<String>, value: impl Into<String>) -> ItemId {
        let field = CustomField {
            id: ItemId::generate(),
            label: label.into(),
            value: value.into(),
            visible: true,
        };
        let id = field.id.clone();
        self.custom_fields.push(field);
        id
    }
}

/// A user-defined contact entry in [`BaseInfo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: ItemId,
    pub label: String,
    pub value: String,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

fn visible_default() -> bool {
    true
}

/// Kind of value a base-info field holds; drives link rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Date,
    Email,
    Phone,
    Link,
}

/// One entry of the [`FieldOrder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: String,
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

impl FieldDescriptor {
    fn new(key: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            id: key.to_string(),
            key: key.to_string(),
            label: label.to_string(),
            field_type,
            visible: true,
        }
    }
}

/// Ordered base-info field descriptors. Ids and keys are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldOrder(Vec<FieldDescriptor>);

impl FieldOrder {
    /// Validate and wrap a descriptor sequence.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, DocumentError> {
        let mut ids = HashSet::new();
        let mut keys = HashSet::new();
        for f in &fields {
            if !ids.insert(f.id.as_str()) {
                return Err(DocumentError::DuplicateField {
                    what: "id",
                    value: f.id.clone(),
                });
            }
            if !keys.insert(f.key.as_str()) {
                return Err(DocumentError::DuplicateField {
                    what: "key",
                    value: f.key.clone(),
                });
            }
        }
        Ok(Self(fields))
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.0
    }

    /// Visible descriptors in render order.
    pub fn visible(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.0.iter().filter(|f| f.visible)
    }

    /// Flip visibility of the field with the given key.
    pub fn toggle(&mut self, key: &str) -> Result<bool, DocumentError> {
        let field = self
            .0
            .iter_mut()
            .find(|f| f.key == key)
            .ok_or_else(|| DocumentError::UnknownId {
                kind: "field",
                id: key.to_string(),
            })?;
        field.visible = !field.visible;
        Ok(field.visible)
    }
}

impl Default for FieldOrder {
    fn default() -> Self {
        Self(vec![
            FieldDescriptor::new("title", "Job title", FieldType::Text),
            FieldDescriptor::new("employmentStatus", "Status", FieldType::Text),
            FieldDescriptor::new("birthDate", "Birth date", FieldType::Date),
            FieldDescriptor::new("email", "Email", FieldType::Email),
            FieldDescriptor::new("phone", "Phone", FieldType::Phone),
            FieldDescriptor::new("location", "Location", FieldType::Text),
        ])
    }
}

impl<'de> Deserialize<'de> for FieldOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let fields = Vec::<FieldDescriptor>::deserialize(deserializer)?;
        FieldOrder::new(fields).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_is_valid() {
        let order = FieldOrder::default();
        assert!(FieldOrder::new(order.fields().to_vec()).is_ok());
        assert_eq!(order.visible().count(), order.fields().len());
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut fields = FieldOrder::default().fields().to_vec();
        let mut dup = fields[0].clone();
        dup.id = "other".into();
        fields.push(dup);
        let err = FieldOrder::new(fields).unwrap_err();
        assert_eq!(
            err,
            DocumentError::DuplicateField {
                what: "key",
                value: "title".into()
            }
        );
    }

    #[test]
    fn duplicate_id_rejected_on_deserialize() {
        let json = r#"[
            {"id": "a", "key": "email", "label": "Email", "type": "email"},
            {"id": "a", "key": "phone", "label": "Phone", "type": "phone"}
        ]"#;
        let err = serde_json::from_str::<FieldOrder>(json).unwrap_err();
        assert!(err.to_string().contains("Duplicate field id"));
    }

    #[test]
    fn toggle_hides_field() {
        let mut order = FieldOrder::default();
        assert!(!order.toggle("email").unwrap());
        assert!(order.visible().all(|f| f.key != "email"));
        assert!(order.toggle("nope").is_err());
    }

    #[test]
    fn value_of_skips_blank() {
        let info = BaseInfo {
            email: "ada@example.com".into(),
            phone: "   ".into(),
            ..BaseInfo::default()
        };
        assert_eq!(info.value_of("email"), Some("ada@example.com"));
        assert_eq!(info.value_of("phone"), None);
        assert_eq!(info.value_of("unknown"), None);
    }
}
