//! Settings as a single key/value entity.

use crate::db::{Database, Store, Table};
use crate::errors::AppResult;
use crate::hooks::Optimistic;
use crate::models::Setting;
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

pub type SettingsMap = BTreeMap<String, Value>;

pub fn load_settings(db: &Database) -> AppResult<SettingsMap> {
    Ok(db
        .repo::<Setting>()
        .list()?
        .into_iter()
        .map(|s| (s.key, s.value))
        .collect())
}

/// Background image for the active theme. Theme-specific images apply only
/// while `useThemeBackgrounds` is true; otherwise the global image does, even
/// when the theme images were edited in the meantime. Nothing is copied back.
pub fn background_image(settings: &SettingsMap, dark: bool) -> Option<&str> {
    let global = settings.get("backgroundImage").and_then(Value::as_str);
    if settings.get("useThemeBackgrounds") != Some(&Value::Bool(true)) {
        return global;
    }
    let key = if dark {
        "darkBackgroundImage"
    } else {
        "lightBackgroundImage"
    };
    settings
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or(global)
}

pub struct SettingsHook {
    inner: Optimistic<SettingsMap>,
}

impl SettingsHook {
    pub fn new(db: Rc<Database>) -> Self {
        Self {
            inner: Optimistic::new(db, (), |db, _| load_settings(db)),
        }
    }

    pub fn value(&mut self) -> Option<&SettingsMap> {
        self.inner.value()
    }

    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.inner.value().and_then(|m| m.get(key).cloned())
    }

    pub fn is_loading(&self) -> bool {
        self.inner.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.inner.error()
    }

    /// Merge `patch` into the settings. Returns whether anything changed.
    pub fn update(&mut self, patch: SettingsMap) -> bool {
        let mut next = self.inner.value().cloned().unwrap_or_default();
        next.extend(patch.clone());

        self.inner.apply(next, move |db| {
            db.transaction(&[Table::Settings], |tx| {
                let repo = tx.repo::<Setting>();
                for (key, value) in patch {
                    repo.put(&Setting { key, value })?;
                }
                Ok(())
            })
        })
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        self.update(BTreeMap::from([(key.into(), value.into())]))
    }

    pub fn settle(&mut self) -> AppResult<()> {
        self.inner.settle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> SettingsMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn theme_backgrounds_only_apply_when_enabled() {
        let mut settings = map(&[
            ("backgroundImage", json!("beach.jpg")),
            ("useThemeBackgrounds", json!(false)),
            ("lightBackgroundImage", json!("dawn.jpg")),
            ("darkBackgroundImage", json!("")),
        ]);
        assert_eq!(background_image(&settings, false), Some("beach.jpg"));

        settings.insert("useThemeBackgrounds".into(), json!(true));
        assert_eq!(background_image(&settings, false), Some("dawn.jpg"));
        assert_eq!(background_image(&settings, true), Some("beach.jpg"));
    }
}
