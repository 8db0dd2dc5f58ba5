//! Contact search and creation.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::models::{u64_from_any, ObjectRef};
use crate::SevdeskApi;

/// Contact categories SevDesk ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactCategory {
    Supplier,
    Customer,
    Partner,
    ProspectCustomer,
}

impl ContactCategory {
    pub fn id(self) -> u64 {
        match self {
            ContactCategory::Supplier => 2,
            ContactCategory::Customer => 3,
            ContactCategory::Partner => 4,
            ContactCategory::ProspectCustomer => 28,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    #[serde(deserialize_with = "u64_from_any")]
    pub id: u64,
    /// Organization name; persons use `surename`/`familyname` instead.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surename: Option<String>,
    #[serde(default)]
    pub familyname: Option<String>,
    #[serde(rename = "customerNumber", default)]
    pub customer_number: Option<String>,
    #[serde(default)]
    pub category: Option<ObjectRef>,
}

impl Contact {
    /// Organization name, or the person's full name.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            if !name.is_empty() {
                return name.clone();
            }
        }
        let full = format!(
            "{} {}",
            self.surename.as_deref().unwrap_or(""),
            self.familyname.as_deref().unwrap_or("")
        );
        let full = full.trim();
        if full.is_empty() {
            format!("contact {}", self.id)
        } else {
            full.to_string()
        }
    }
}

/// A team member of the SevDesk account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SevUser {
    #[serde(deserialize_with = "u64_from_any")]
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub fullname: Option<String>,
}

impl SevdeskApi {
    /// The user the API token belongs to.
    pub async fn get_current_user(&self) -> Result<SevUser> {
        self.get_single("SevUser", &[]).await
    }

    /// Contacts whose name equals `name`; SevDesk matches exactly, not
    /// by substring.
    pub async fn search_contacts_by_name(&self, name: &str) -> Result<Vec<Contact>> {
        debug!("Searching contacts named {name:?}");
        self.get_list(
            "Contact",
            &[("depth", "1".to_string()), ("name", name.to_string())],
        )
        .await
    }

    pub async fn search_contacts_by_customer_number(&self, number: &str) -> Result<Vec<Contact>> {
        debug!("Searching contacts with customer number {number:?}");
        self.get_list(
            "Contact",
            &[
                ("depth", "1".to_string()),
                ("customerNumber", number.to_string()),
            ],
        )
        .await
    }

    pub async fn get_contact(&self, id: u64) -> Result<Contact> {
        self.get_single(&format!("Contact/{id}"), &[]).await
    }

    /// Creates an organization contact.
    pub async fn create_organization(
        &self,
        name: &str,
        customer_number: Option<&str>,
        category: ContactCategory,
    ) -> Result<Contact> {
        let mut body = json!({
            "name": name,
            "category": { "id": category.id(), "objectName": "Category" },
        });
        if let Some(number) = customer_number {
            body["customerNumber"] = json!(number);
        }
        let contact: Contact = self.post_json("Contact", &body).await?;
        info!("Created contact {name:?} with id {}", contact.id);
        Ok(contact)
    }
}
