use crate::message::{Message, MessageKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type UserId = u64;

/// A known user of the organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub user_id: UserId,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

/// Lookup of users by email or id.
///
/// Email lookups are case-insensitive.
pub trait PeopleDirectory: Send + Sync {
    fn get_by_email(&self, email: &str) -> Option<&Person>;

    fn get_by_user_id(&self, user_id: UserId) -> Option<&Person>;

    /// Id of the user the narrow is evaluated for, if known
    fn my_user_id(&self) -> Option<UserId>;

    fn my_current_email(&self) -> Option<&str> {
        self.my_user_id()
            .and_then(|id| self.get_by_user_id(id))
            .map(|person| person.email.as_str())
    }

    fn is_my_user_id(&self, user_id: UserId) -> bool {
        self.my_user_id() == Some(user_id)
    }
}

/// In-memory people directory
#[derive(Debug, Clone, Default)]
pub struct People {
    by_email: HashMap<String, UserId>,
    by_id: HashMap<UserId, Person>,
    my_user_id: Option<UserId>,
}

impl People {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, person: Person) {
        self.by_email
            .insert(person.email.to_lowercase(), person.user_id);
        self.by_id.insert(person.user_id, person);
    }

    pub fn with_person(mut self, person: Person) -> Self {
        self.add(person);
        self
    }

    /// Register `person` and mark them as the current user
    pub fn with_me(mut self, person: Person) -> Self {
        self.my_user_id = Some(person.user_id);
        self.add(person);
        self
    }

    pub fn set_my_user_id(&mut self, user_id: Option<UserId>) {
        self.my_user_id = user_id;
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl PeopleDirectory for People {
    fn get_by_email(&self, email: &str) -> Option<&Person> {
        self.by_email
            .get(&email.to_lowercase())
            .and_then(|id| self.by_id.get(id))
    }

    fn get_by_user_id(&self, user_id: UserId) -> Option<&Person> {
        self.by_id.get(&user_id)
    }

    fn my_user_id(&self) -> Option<UserId> {
        self.my_user_id
    }
}

/// Resolve a comma separated `pm-with` operand to sorted user ids.
///
/// The current user is dropped from multi-address operands. Returns `None`
/// when any address is unknown.
pub fn pm_with_operand_ids(people: &dyn PeopleDirectory, operand: &str) -> Option<Vec<UserId>> {
    let mut persons: Vec<Option<&Person>> = operand
        .split(',')
        .map(|email| people.get_by_email(email.trim()))
        .collect();

    if persons.len() > 1 {
        persons.retain(|person| !person.is_some_and(|p| people.is_my_user_id(p.user_id)));
    }

    let mut user_ids = persons
        .into_iter()
        .map(|person| person.map(|p| p.user_id))
        .collect::<Option<Vec<_>>>()?;
    user_ids.sort_unstable();
    Some(user_ids)
}

fn recipient_ids(message: &Message) -> Option<Vec<UserId>> {
    if message.kind != Some(MessageKind::Private) {
        return None;
    }
    let ids: Vec<UserId> = message
        .display_recipient
        .users()
        .iter()
        .map(|r| r.id)
        .collect();
    if ids.is_empty() {
        tracing::debug!(message_id = message.id, "private message without recipients");
        return None;
    }
    Some(ids)
}

/// Recipients of a private message other than the current user, sorted.
///
/// A message the current user sent to themselves yields just their id.
pub fn pm_with_user_ids(people: &dyn PeopleDirectory, message: &Message) -> Option<Vec<UserId>> {
    let user_ids = recipient_ids(message)?;
    let mut others: Vec<UserId> = user_ids
        .iter()
        .copied()
        .filter(|id| !people.is_my_user_id(*id))
        .collect();

    if others.is_empty() {
        others = vec![people.my_user_id()?];
    }
    others.sort_unstable();
    Some(others)
}

/// All recipients of a private message, sorted. `None` unless the current
/// user is one of them.
pub fn group_pm_with_user_ids(
    people: &dyn PeopleDirectory,
    message: &Message,
) -> Option<Vec<UserId>> {
    let mut user_ids = recipient_ids(message)?;
    if !user_ids.iter().any(|id| people.is_my_user_id(*id)) {
        tracing::debug!(
            message_id = message.id,
            "current user missing from group private message recipients"
        );
        return None;
    }
    user_ids.sort_unstable();
    Some(user_ids)
}

/// Replace every address in a comma separated list that belongs to
/// `user_id` with `new_email`.
pub fn update_email_in_reply_to(
    people: &dyn PeopleDirectory,
    reply_to: &str,
    user_id: UserId,
    new_email: &str,
) -> String {
    reply_to
        .split(',')
        .map(|email| {
            let email = email.trim();
            match people.get_by_email(email) {
                Some(person) if person.user_id == user_id => new_email,
                _ => email,
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
