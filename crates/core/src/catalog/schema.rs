use super::client::CatalogColumn;
use serde::{Deserialize, Serialize};

/// `{"type": "struct", "fields": [...]}`, fields in catalog column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl SchemaDocument {
    pub fn from_columns(columns: &[CatalogColumn]) -> Self {
        Self {
            kind: "struct".to_string(),
            fields: columns
                .iter()
                .map(|c| SchemaField {
                    name: c.name.clone(),
                    data_type: c.data_type.clone(),
                    comment: c.comment.clone().filter(|s| !s.is_empty()),
                })
                .collect(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_document_shape() {
        let mut total = CatalogColumn::new("total", "double");
        total.comment = Some("gross amount".into());
        let doc = SchemaDocument::from_columns(&[CatalogColumn::new("id", "bigint"), total]);

        let value: serde_json::Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["type"], "struct");
        assert_eq!(value["fields"][0]["name"], "id");
        assert_eq!(value["fields"][0]["type"], "bigint");
        assert!(value["fields"][0].get("comment").is_none());
        assert_eq!(value["fields"][1]["comment"], "gross amount");
    }
}
