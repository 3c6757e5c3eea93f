use crate::people::{People, PeopleDirectory};
use crate::streams::{StreamDirectory, Streams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Organization-level settings that change how narrows match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmSettings {
    /// Zephyr mirror realms treat `un`-prefixed and `.d`-suffixed stream and
    /// topic names as their base name
    pub is_zephyr_mirror_realm: bool,
    /// Stream the client is embedded in, if any
    pub narrow_stream: Option<String>,
}

/// Everything a filter needs from the outside world
#[derive(Clone)]
pub struct NarrowContext {
    people: Arc<dyn PeopleDirectory>,
    streams: Arc<dyn StreamDirectory>,
    realm: RealmSettings,
}

impl NarrowContext {
    pub fn new(
        people: Arc<dyn PeopleDirectory>,
        streams: Arc<dyn StreamDirectory>,
        realm: RealmSettings,
    ) -> Self {
        Self {
            people,
            streams,
            realm,
        }
    }

    pub fn with_people(mut self, people: impl PeopleDirectory + 'static) -> Self {
        self.people = Arc::new(people);
        self
    }

    pub fn with_streams(mut self, streams: impl StreamDirectory + 'static) -> Self {
        self.streams = Arc::new(streams);
        self
    }

    pub fn with_realm(mut self, realm: RealmSettings) -> Self {
        self.realm = realm;
        self
    }

    pub fn people(&self) -> &dyn PeopleDirectory {
        self.people.as_ref()
    }

    pub fn streams(&self) -> &dyn StreamDirectory {
        self.streams.as_ref()
    }

    pub fn realm(&self) -> &RealmSettings {
        &self.realm
    }

    pub(crate) fn is_narrow_stream(&self, stream: &str) -> bool {
        self.realm
            .narrow_stream
            .as_deref()
            .is_some_and(|narrow| narrow.to_lowercase() == stream.to_lowercase())
    }
}

impl Default for NarrowContext {
    fn default() -> Self {
        Self::new(
            Arc::new(People::new()),
            Arc::new(Streams::new()),
            RealmSettings::default(),
        )
    }
}

impl fmt::Debug for NarrowContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrowContext")
            .field("my_user_id", &self.people.my_user_id())
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}
