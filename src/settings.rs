use crate::barcode::{CodeType, Platform};
use crate::error::Result;
use crate::storage::{KeyValueStore, SETTINGS_KEY};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsDocument {
    #[serde(default)]
    enabled_types: Option<Vec<CodeType>>,
}

/// Persisted list of code types the detector should look for.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    platform: Platform,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>, platform: Platform) -> Self {
        Self { store, platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// `Ok(None)` when nothing usable is persisted.
    fn read_enabled_types(&self) -> Result<Option<Vec<CodeType>>> {
        let Some(data) = self.store.get(SETTINGS_KEY)? else {
            return Ok(None);
        };
        let document: SettingsDocument = serde_json::from_str(&data)?;
        Ok(document.enabled_types)
    }

    pub fn get_enabled_types(&self) -> Vec<CodeType> {
        match self.read_enabled_types() {
            Ok(Some(types)) => types,
            Ok(None) => self.platform.supported_types(),
            Err(e) => {
                warn!("Failed to read scanner settings, using defaults: {}", e);
                self.platform.supported_types()
            }
        }
    }

    /// Current set for a read-modify-write. Storage errors are returned so
    /// a failed read never replaces the saved set with the defaults.
    fn enabled_types_for_update(&self) -> Result<Vec<CodeType>> {
        let Some(data) = self.store.get(SETTINGS_KEY)? else {
            return Ok(self.platform.supported_types());
        };
        let types = match serde_json::from_str::<SettingsDocument>(&data) {
            Ok(document) => document.enabled_types,
            Err(e) => {
                warn!("Replacing unreadable scanner settings: {}", e);
                None
            }
        };
        Ok(types.unwrap_or_else(|| self.platform.supported_types()))
    }

    pub fn set_enabled_types(&self, types: &[CodeType]) -> Result<()> {
        let document = SettingsDocument {
            enabled_types: Some(types.to_vec()),
        };
        self.store
            .set(SETTINGS_KEY, &serde_json::to_string(&document)?)?;
        info!(count = types.len(), "updated enabled code types");
        Ok(())
    }

    /// Fails open: a type counts as enabled when settings cannot be read.
    pub fn is_type_enabled(&self, code_type: &CodeType) -> bool {
        match self.read_enabled_types() {
            Ok(Some(types)) => types.contains(code_type),
            Ok(None) => self.platform.supported_types().contains(code_type),
            Err(e) => {
                warn!("Failed to check {} setting, treating as enabled: {}", code_type, e);
                true
            }
        }
    }

    pub fn enable_type(&self, code_type: CodeType) -> Result<()> {
        let mut types = self.enabled_types_for_update()?;
        if types.contains(&code_type) {
            return Ok(());
        }
        types.push(code_type);
        self.set_enabled_types(&types)
    }

    pub fn disable_type(&self, code_type: &CodeType) -> Result<()> {
        let types: Vec<CodeType> = self
            .enabled_types_for_update()?
            .into_iter()
            .filter(|t| t != code_type)
            .collect();
        self.set_enabled_types(&types)
    }

    pub fn enable_all_types(&self) -> Result<()> {
        self.set_enabled_types(&self.platform.supported_types())
    }

    pub fn disable_all_types(&self) -> Result<()> {
        self.set_enabled_types(&[])
    }
}
