use serde::{Deserialize, Serialize};

/// Profile of the signed-in user. Lives in memory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "usercode", alias = "identifier", default)]
    pub identifier: String,
    /// Whatever else the backend sent with the profile
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl UserRecord {
    /// Minimal record built from the identifier submitted at sign-in
    pub fn from_identifier(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            fields: serde_json::Map::new(),
        }
    }

    /// A string field from the backend profile
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    pub fn display_name(&self) -> &str {
        self.field_str("username")
            .or_else(|| self.field_str("name"))
            .unwrap_or(&self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_record_from_profile() {
        let user: UserRecord = serde_json::from_value(json!({
            "usercode": "u1",
            "username": "Nguyen Van A",
            "roles": ["admin"]
        }))
        .unwrap();

        assert_eq!(user.identifier, "u1");
        assert_eq!(user.display_name(), "Nguyen Van A");
        assert_eq!(user.fields.get("roles"), Some(&json!(["admin"])));
    }

    #[test]
    fn test_user_record_minimal() {
        let user = UserRecord::from_identifier("u1");
        assert_eq!(user.display_name(), "u1");
        assert_eq!(serde_json::to_value(&user).unwrap(), json!({"usercode": "u1"}));
    }
}
