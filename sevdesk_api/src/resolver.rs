//! Cached name-to-object lookup for small enumerable collections.
//!
//! SevDesk models units, tax rules, and similar lookups as regular
//! objects; resolving "the hour unit" therefore needs a list call. The
//! index of each collection is cached, and a miss refreshes the index
//! once before giving up.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SevdeskError};
use crate::models::u64_from_any;
use crate::SevdeskApi;

pub(crate) type ObjectCache = HashMap<String, HashMap<String, ResolvedObject>>;

/// A lookup object with the fields all collections share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedObject {
    pub id: u64,
    pub name: String,
    #[serde(rename = "objectName")]
    pub object_name: String,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    #[serde(deserialize_with = "u64_from_any")]
    id: u64,
    #[serde(rename = "objectName")]
    object_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(rename = "translationCode", default)]
    translation_code: Option<String>,
}

impl RawObject {
    /// Keys the object is reachable under. Units use their translation
    /// code ("UNITY_HOUR"); tax rules answer to code, name, and id.
    fn keys(&self, object: &str) -> Vec<String> {
        let mut keys = Vec::new();
        match object {
            "Unity" => {
                if let Some(code) = &self.translation_code {
                    keys.push(code.clone());
                }
            }
            "TaxRule" => {
                if let Some(code) = &self.code {
                    keys.push(code.clone());
                }
                if let Some(name) = &self.name {
                    keys.push(name.clone());
                }
                keys.push(self.id.to_string());
            }
            _ => {
                if let Some(name) = &self.name {
                    keys.push(name.clone());
                }
                keys.push(self.id.to_string());
            }
        }
        keys
    }

    fn into_resolved(self) -> ResolvedObject {
        ResolvedObject {
            id: self.id,
            name: self.name.unwrap_or_default(),
            object_name: self.object_name,
            code: self.code,
        }
    }
}

impl SevdeskApi {
    /// Everything in one lookup collection.
    pub async fn list_objects(&self, object: &str) -> Result<Vec<ResolvedObject>> {
        let raw: Vec<RawObject> = self
            .get_list(object, &[("limit", "1000".to_string())])
            .await?;
        Ok(raw.into_iter().map(RawObject::into_resolved).collect())
    }

    /// All tax rules, sorted by id.
    pub async fn tax_rules(&self) -> Result<Vec<ResolvedObject>> {
        let mut rules = self.list_objects("TaxRule").await?;
        rules.sort_by_key(|rule| rule.id);
        Ok(rules)
    }

    /// Unit of quantity by its translation code, e.g. "UNITY_HOUR".
    pub async fn resolve_unity(&self, translation_code: &str) -> Result<ResolvedObject> {
        self.resolve_object("Unity", translation_code).await
    }

    /// Tax rule by code, name, or numeric id.
    pub async fn resolve_tax_rule(&self, key: &str) -> Result<ResolvedObject> {
        self.resolve_object("TaxRule", key).await
    }

    /// Resolves `key` within a lookup collection, refreshing the cached
    /// index once on a miss.
    pub async fn resolve_object(&self, object: &str, key: &str) -> Result<ResolvedObject> {
        {
            let cache = self.object_cache.read().await;
            if let Some(found) = cache.get(object).and_then(|index| index.get(key)) {
                return Ok(found.clone());
            }
        }

        debug!("{object} {key:?} not cached, refreshing the index");
        let index = self.refresh_object_index(object).await?;
        let mut cache = self.object_cache.write().await;
        let entry = cache.entry(object.to_string()).or_default();
        *entry = index;
        if let Some(found) = entry.get(key) {
            return Ok(found.clone());
        }

        let mut available: Vec<String> = entry.keys().cloned().collect();
        available.sort();
        Err(SevdeskError::UnknownKey {
            object: object.to_string(),
            key: key.to_string(),
            available,
        })
    }

    async fn refresh_object_index(&self, object: &str) -> Result<HashMap<String, ResolvedObject>> {
        let raw: Vec<RawObject> = self
            .get_list(object, &[("limit", "1000".to_string())])
            .await?;
        debug!("Indexed {} {object} objects", raw.len());
        let mut index = HashMap::new();
        for entry in raw {
            let keys = entry.keys(object);
            let resolved = entry.into_resolved();
            for key in keys {
                index.insert(key, resolved.clone());
            }
        }
        Ok(index)
    }
}
