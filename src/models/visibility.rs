use serde::{Deserialize, Serialize};

/// Hidden-set for catalog entries defined outside the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticVisibility {
    pub hidden: Vec<String>,
}

impl StaticVisibility {
    /// Hides `id` if it is visible, un-hides it otherwise.
    pub fn toggle(&mut self, id: &str) {
        if let Some(pos) = self.hidden.iter().position(|h| h == id) {
            self.hidden.remove(pos);
        } else {
            self.hidden.push(id.to_string());
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub product_id: String,
}
