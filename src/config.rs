use crate::context::{NarrowContext, RealmSettings};
use crate::people::{People, Person};
use crate::streams::{Streams, Subscription};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Current user '{0}' is not listed under [[people]]")]
    UnknownCurrentUser(String),
}

/// Organization snapshot the CLI evaluates narrows against
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrowConfig {
    pub realm: RealmSettings,
    /// Email of the current user
    pub me: Option<String>,
    pub people: Vec<Person>,
    pub streams: Vec<Subscription>,
}

impl NarrowConfig {
    /// Build the directories and realm settings for filter evaluation
    pub fn context(&self) -> Result<NarrowContext, ConfigError> {
        let mut people = People::new();
        for person in &self.people {
            people.add(person.clone());
        }

        if let Some(me) = &self.me {
            let my_id = self
                .people
                .iter()
                .find(|p| p.email.eq_ignore_ascii_case(me))
                .map(|p| p.user_id)
                .ok_or_else(|| ConfigError::UnknownCurrentUser(me.clone()))?;
            people.set_my_user_id(Some(my_id));
        }

        let mut streams = Streams::new();
        for sub in &self.streams {
            streams.add(sub.clone());
        }

        tracing::debug!(
            people = people.len(),
            streams = streams.len(),
            zephyr = self.realm.is_zephyr_mirror_realm,
            "built narrow context"
        );

        Ok(NarrowContext::new(
            Arc::new(people),
            Arc::new(streams),
            self.realm.clone(),
        ))
    }
}

pub fn load_config(path: Option<&Path>) -> Result<NarrowConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<NarrowConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<NarrowConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static NarrowConfig {
    static DEFAULT_CONFIG: LazyLock<NarrowConfig> = LazyLock::new(NarrowConfig::default);
    &DEFAULT_CONFIG
}
