use serde::{Deserialize, Serialize};

/// An organization the user can sign in to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Organization {
    #[serde(alias = "orgcode")]
    pub code: String,
    #[serde(alias = "orgname", default)]
    pub name: String,
}

impl Organization {
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.code.clone()
        } else {
            format!("{} - {}", self.code, self.name)
        }
    }
}
