use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type StreamId = u64;

/// A stream the current user knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub stream_id: StreamId,
    pub name: String,
    /// Whether messages of this stream show up in the home view
    #[serde(default = "default_in_home_view")]
    pub in_home_view: bool,
}

fn default_in_home_view() -> bool {
    true
}

impl Subscription {
    pub fn new(stream_id: StreamId, name: impl Into<String>) -> Self {
        Self {
            stream_id,
            name: name.into(),
            in_home_view: true,
        }
    }

    pub fn muted(mut self) -> Self {
        self.in_home_view = false;
        self
    }
}

/// Lookup of stream subscriptions. Name lookups are case-insensitive.
pub trait StreamDirectory: Send + Sync {
    fn get_sub(&self, name: &str) -> Option<&Subscription>;

    fn get_sub_by_id(&self, stream_id: StreamId) -> Option<&Subscription>;

    fn in_home_view(&self, stream_id: StreamId) -> bool {
        self.get_sub_by_id(stream_id)
            .is_some_and(|sub| sub.in_home_view)
    }

    fn get_stream_id(&self, name: &str) -> Option<StreamId> {
        self.get_sub(name).map(|sub| sub.stream_id)
    }

    /// Canonical display name for `name`, or `name` itself when unknown
    fn get_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.get_sub(name).map_or(name, |sub| sub.name.as_str())
    }
}

/// In-memory stream directory
#[derive(Debug, Clone, Default)]
pub struct Streams {
    by_name: HashMap<String, StreamId>,
    by_id: HashMap<StreamId, Subscription>,
}

impl Streams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sub: Subscription) {
        self.by_name.insert(sub.name.to_lowercase(), sub.stream_id);
        self.by_id.insert(sub.stream_id, sub);
    }

    pub fn with_sub(mut self, sub: Subscription) -> Self {
        self.add(sub);
        self
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl StreamDirectory for Streams {
    fn get_sub(&self, name: &str) -> Option<&Subscription> {
        self.by_name
            .get(&name.to_lowercase())
            .and_then(|id| self.by_id.get(id))
    }

    fn get_sub_by_id(&self, stream_id: StreamId) -> Option<&Subscription> {
        self.by_id.get(&stream_id)
    }
}
