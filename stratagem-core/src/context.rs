//! Evaluation context for conditions
//!
//! A [`Context`] is a JSON object with a few well-known keys:
//!
//! ```json
//! {
//!   "feature_flags": { "beta": true },
//!   "settings": { "REGION": "eu" },
//!   "user": {
//!     "is_authenticated": true,
//!     "is_active": true,
//!     "is_staff": false,
//!     "is_superuser": false,
//!     "permissions": ["notify.send_sms"],
//!     "groups": ["support"]
//!   }
//! }
//! ```
//!
//! Any other keys are carried untouched for [`Callable`](crate::condition::Condition::Callable)
//! and custom predicates. The evaluation clock defaults to local time and can be
//! pinned with [`Context::with_now`].

use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};

/// Key holding boolean feature flags
pub const FEATURE_FLAGS_KEY: &str = "feature_flags";
/// Key holding application settings
pub const SETTINGS_KEY: &str = "settings";
/// Key holding the current user
pub const USER_KEY: &str = "user";

static NULL: Value = Value::Null;

/// Key/value context that conditions are evaluated against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: Map<String, Value>,
    now: Option<NaiveDateTime>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value (builder form)
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Pin the evaluation clock
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    /// Insert a value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    /// Get a top-level value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// All top-level values
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Current time for time-based conditions
    pub fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }

    /// Whether `feature_flags.<name>` is exactly `true`
    pub fn feature_flag(&self, name: &str) -> bool {
        self.values
            .get(FEATURE_FLAGS_KEY)
            .and_then(|flags| flags.get(name))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Value of `settings.<name>`, `null` when missing
    pub fn setting(&self, name: &str) -> &Value {
        self.values
            .get(SETTINGS_KEY)
            .and_then(|settings| settings.get(name))
            .unwrap_or(&NULL)
    }

    /// The current user, if the context carries one
    pub fn user(&self) -> Option<User<'_>> {
        self.values
            .get(USER_KEY)
            .and_then(Value::as_object)
            .map(|fields| User { fields })
    }
}

impl From<Value> for Context {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values, now: None },
            _ => Self::default(),
        }
    }
}

impl From<Map<String, Value>> for Context {
    fn from(values: Map<String, Value>) -> Self {
        Self { values, now: None }
    }
}

/// Borrowed view over the `user` object of a context
#[derive(Debug, Clone, Copy)]
pub struct User<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> User<'a> {
    fn flag(&self, key: &str, default: bool) -> bool {
        self.fields.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    fn strings(&self, key: &str) -> impl Iterator<Item = &'a str> {
        self.fields
            .get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    pub fn is_authenticated(&self) -> bool {
        self.flag("is_authenticated", false)
    }

    /// Missing `is_active` counts as active
    pub fn is_active(&self) -> bool {
        self.flag("is_active", true)
    }

    pub fn is_staff(&self) -> bool {
        self.flag("is_staff", false)
    }

    pub fn is_superuser(&self) -> bool {
        self.flag("is_superuser", false)
    }

    /// Active superusers hold every permission
    pub fn has_perm(&self, permission: &str) -> bool {
        if !self.is_active() {
            return false;
        }
        if self.is_superuser() {
            return true;
        }
        self.strings("permissions").any(|p| p == permission)
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.strings("groups").any(|g| g == group)
    }
}
