//! Session state fields and the flows that populate them
//!
//! PATTERN: the store never talks to the network. Flows call the remote
//! collaborator, then translate its tagged outcome into state through a
//! batch (one logical transition) or a single dispatch.

use serde::{Deserialize, Serialize};
use unistore::{BatchUpdate, RemoteClient, RemoteOutcome, Snapshot, UniversalStore};

pub const AUTHENTICATED: &str = "authenticated";
pub const USER: &str = "user";
pub const TOKEN: &str = "token";
pub const ROLE: &str = "role";
pub const FOLDERS: &str = "folders";
pub const ERROR: &str = "error";

/// Value type for the session store fields.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl Value {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// The session field set; fixed for the lifetime of the store.
pub fn initial_state() -> Snapshot<Value> {
    Snapshot::new([
        (AUTHENTICATED, Value::Flag(false)),
        (USER, Value::Null),
        (TOKEN, Value::Null),
        (ROLE, Value::Null),
        (FOLDERS, Value::List(Vec::new())),
        (ERROR, Value::Null),
    ])
}

#[derive(Serialize)]
struct LoginPayload<'a> {
    username: &'a str,
    password: &'a str,
}

/// Session grant returned by a successful login.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionGrant {
    pub user: String,
    pub token: String,
    pub role: String,
}

#[derive(Clone, Debug, Deserialize)]
struct FolderListing {
    folders: Vec<String>,
}

/// Log in and write the grant into the store as one transition.
///
/// Identity, token, role, and the authenticated flag form one logical
/// state change; a listener of any of them must already see the others
/// applied, hence the batch.
pub async fn login(
    store: &mut UniversalStore<Value>,
    client: &RemoteClient,
    username: &str,
    password: &str,
) -> bool {
    let payload = LoginPayload { username, password };
    match client
        .call::<_, SessionGrant>("session.login", &payload, None)
        .await
    {
        RemoteOutcome::Success {
            payload: Some(grant),
            ..
        } => {
            tracing::info!(user = %grant.user, role = %grant.role, "logged in");
            let update = BatchUpdate::new()
                .set(AUTHENTICATED, Value::Flag(true))
                .set(USER, Value::Text(grant.user))
                .set(TOKEN, Value::Text(grant.token))
                .set(ROLE, Value::Text(grant.role))
                .set(ERROR, Value::Null);
            if let Err(e) = store.batch_update(update) {
                tracing::error!(error = %e, "session fields out of sync with store");
                return false;
            }
            true
        }
        RemoteOutcome::Success { payload: None, message } => {
            let message = message.unwrap_or_else(|| "login response carried no grant".to_string());
            fail(store, message);
            false
        }
        RemoteOutcome::Failure { message } => {
            fail(store, message);
            false
        }
    }
}

/// Fetch mailbox folders with the bearer credential read from store state.
pub async fn load_folders(store: &mut UniversalStore<Value>, client: &RemoteClient) -> bool {
    let bearer = store
        .field(TOKEN)
        .and_then(Value::as_text)
        .map(str::to_string);
    match client
        .call::<_, FolderListing>("mailbox.folders", &(), bearer.as_deref())
        .await
    {
        RemoteOutcome::Success {
            payload: Some(listing),
            ..
        } => {
            tracing::info!(count = listing.folders.len(), "folders loaded");
            let _ = store.dispatch(FOLDERS, Value::List(listing.folders));
            true
        }
        RemoteOutcome::Success { payload: None, message } => {
            fail(
                store,
                message.unwrap_or_else(|| "folder response carried no listing".to_string()),
            );
            false
        }
        RemoteOutcome::Failure { message } => {
            fail(store, message);
            false
        }
    }
}

fn fail(store: &mut UniversalStore<Value>, message: String) {
    tracing::warn!(%message, "session flow failed");
    let _ = store.dispatch(ERROR, Value::Text(message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_field_set() {
        let state = initial_state();
        assert_eq!(state.len(), 6);
        assert_eq!(
            state.get(AUTHENTICATED).and_then(Value::as_flag),
            Some(false)
        );
        assert_eq!(state.get(FOLDERS).and_then(Value::as_list), Some(&[][..]));
        assert_eq!(state.get(TOKEN), Some(&Value::Null));
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Flag(true).as_flag(), Some(true));
        assert_eq!(Value::Text("abc".into()).as_text(), Some("abc"));
        assert_eq!(Value::Null.as_flag(), None);
        assert_eq!(Value::Flag(true).as_text(), None);
    }

    #[test]
    fn test_grant_batch_is_one_transition() {
        let mut store = UniversalStore::new(initial_state());
        let auth = store.bind_field(AUTHENTICATED).unwrap();
        let view = store.bind_selector(|s: &Snapshot<Value>| {
            (
                s.get(AUTHENTICATED).and_then(Value::as_flag),
                s.get(TOKEN).and_then(Value::as_text).map(str::to_string),
            )
        });

        let update = BatchUpdate::new()
            .set(AUTHENTICATED, Value::Flag(true))
            .set(USER, Value::Text("kim".into()))
            .set(TOKEN, Value::Text("abc".into()))
            .set(ROLE, Value::Text("admin".into()));
        store.batch_update(update).unwrap();

        assert_eq!(auth.get(), Value::Flag(true));
        assert_eq!(view.get(), (Some(true), Some("abc".to_string())));

        view.dispose(&mut store);
        auth.dispose(&mut store);
    }
}
