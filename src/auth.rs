//! Session handling at the HTTP boundary. The session set is an injected
//! capability owned by the server state, not a process-wide global, so the
//! read API stays a function of (parameters, store state, auth verdict).

use axum::http::HeaderMap;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_token";

/// The set of currently valid session tokens for the single shared credential.
#[derive(Default)]
pub struct SessionSet {
    tokens: Mutex<HashSet<String>>,
}

impl SessionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.lock().unwrap().insert(token.clone());
        token
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.tokens.lock().unwrap().contains(token)
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.lock().unwrap().remove(token);
    }
}

/// Pull the session token out of the request's Cookie header, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}
