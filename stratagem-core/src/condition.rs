//! Condition system - composable availability predicates
//!
//! A [`Condition`] is a stateless boolean predicate evaluated against a
//! [`Context`]. Leaves test one thing (a feature flag, a permission, a time
//! window); compounds combine them and own their children.
//!
//! ```text
//!   FeatureFlag(beta) & (Staff | Permission(sms.send))
//!
//!            All
//!           /   \
//!   FeatureFlag  Any
//!               /   \
//!           Staff   Permission
//! ```
//!
//! `&`, `|` and `!` build compounds. Chaining the same operator extends the
//! existing compound instead of nesting: `a & b & c` is one `All` with three
//! children.
//!
//! ```rust
//! use serde_json::json;
//! use stratagem_core::condition::Condition;
//! use stratagem_core::context::Context;
//!
//! let cond = Condition::feature_flag("beta") & !Condition::Staff;
//! assert_eq!(cond.explain(), "(FeatureFlag(beta) AND NOT(Staff))");
//!
//! let ctx = Context::from(json!({"feature_flags": {"beta": true}}));
//! assert!(cond.is_met(&ctx));
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde_json::Value;
use tracing::debug;

use crate::context::Context;

/// User-defined predicate usable as a condition leaf
pub trait Predicate: Send + Sync + fmt::Debug {
    /// Whether the predicate holds in this context
    fn is_met(&self, context: &Context) -> bool;

    /// Human-readable description
    fn explain(&self) -> String {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full).to_string()
    }
}

/// Check function carried by [`Condition::Callable`]
pub type CheckFn = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Boolean predicate tree
#[derive(Clone)]
pub enum Condition {
    /// `feature_flags.<name>` is `true`
    FeatureFlag(String),
    /// Authenticated user holds the permission (active superusers hold all)
    Permission(String),
    /// `settings.<name>` equals the value; a missing setting compares as `null`
    Setting { name: String, value: Value },
    /// Named check function
    Callable { name: String, check: CheckFn },
    /// User-defined predicate
    Custom(Arc<dyn Predicate>),
    /// User is authenticated
    Authenticated,
    /// User is staff
    Staff,
    /// User is a superuser
    Superuser,
    /// User belongs to the group
    Group(String),
    /// Time of day within `[start, end]`, wrapping past midnight when
    /// `start > end`. `days` restricts weekdays (0 = Monday).
    TimeWindow {
        start: NaiveTime,
        end: NaiveTime,
        days: Option<Vec<u32>>,
    },
    /// Date within `[start, end]`; a missing bound is open
    DateRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// Environment variable is non-empty, or equals `expected` exactly
    Environment { var: String, expected: Option<String> },
    /// Every child holds
    All(Vec<Condition>),
    /// At least one child holds
    Any(Vec<Condition>),
    /// Child does not hold
    Not(Box<Condition>),
}

impl Condition {
    pub fn feature_flag(name: impl Into<String>) -> Self {
        Condition::FeatureFlag(name.into())
    }

    pub fn permission(permission: impl Into<String>) -> Self {
        Condition::Permission(permission.into())
    }

    pub fn setting(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Setting {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn callable<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        Condition::Callable {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn custom(predicate: impl Predicate + 'static) -> Self {
        Condition::Custom(Arc::new(predicate))
    }

    pub fn group(name: impl Into<String>) -> Self {
        Condition::Group(name.into())
    }

    /// Time window on every day of the week
    pub fn time_window(start: NaiveTime, end: NaiveTime) -> Self {
        Condition::TimeWindow {
            start,
            end,
            days: None,
        }
    }

    /// Time window restricted to weekdays (0 = Monday .. 6 = Sunday)
    pub fn time_window_on(start: NaiveTime, end: NaiveTime, days: impl IntoIterator<Item = u32>) -> Self {
        Condition::TimeWindow {
            start,
            end,
            days: Some(days.into_iter().collect()),
        }
    }

    pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Condition::DateRange { start, end }
    }

    /// Environment variable is set and non-empty
    pub fn env_present(var: impl Into<String>) -> Self {
        Condition::Environment {
            var: var.into(),
            expected: None,
        }
    }

    /// Environment variable equals `expected`
    pub fn env_equals(var: impl Into<String>, expected: impl Into<String>) -> Self {
        Condition::Environment {
            var: var.into(),
            expected: Some(expected.into()),
        }
    }

    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::All(conditions.into_iter().collect())
    }

    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Any(conditions.into_iter().collect())
    }

    /// Evaluate the condition
    pub fn is_met(&self, context: &Context) -> bool {
        match self {
            Condition::FeatureFlag(name) => context.feature_flag(name),
            Condition::Permission(permission) => context
                .user()
                .map(|u| u.is_authenticated() && u.has_perm(permission))
                .unwrap_or(false),
            Condition::Setting { name, value } => context.setting(name) == value,
            Condition::Callable { check, .. } => check(context),
            Condition::Custom(predicate) => predicate.is_met(context),
            Condition::Authenticated => context.user().map(|u| u.is_authenticated()).unwrap_or(false),
            Condition::Staff => context.user().map(|u| u.is_staff()).unwrap_or(false),
            Condition::Superuser => context.user().map(|u| u.is_superuser()).unwrap_or(false),
            Condition::Group(group) => context.user().map(|u| u.in_group(group)).unwrap_or(false),
            Condition::TimeWindow { start, end, days } => {
                let now = context.now();
                if let Some(days) = days {
                    if !days.contains(&now.weekday().num_days_from_monday()) {
                        return false;
                    }
                }
                let current = now.time();
                if start <= end {
                    *start <= current && current <= *end
                } else {
                    // Overnight window, e.g. 22:00 - 06:00
                    current >= *start || current <= *end
                }
            }
            Condition::DateRange { start, end } => {
                let today = context.now().date();
                start.map_or(true, |s| today >= s) && end.map_or(true, |e| today <= e)
            }
            Condition::Environment { var, expected } => {
                let value = std::env::var(var).ok();
                match expected {
                    Some(expected) => value.as_deref() == Some(expected.as_str()),
                    None => value.map_or(false, |v| !v.is_empty()),
                }
            }
            Condition::All(children) => children.iter().all(|c| c.is_met(context)),
            Condition::Any(children) => children.iter().any(|c| c.is_met(context)),
            Condition::Not(inner) => !inner.is_met(context),
        }
    }

    /// Human-readable description of the predicate tree
    pub fn explain(&self) -> String {
        match self {
            Condition::FeatureFlag(name) => format!("FeatureFlag({})", name),
            Condition::Permission(permission) => format!("Permission({})", permission),
            Condition::Setting { name, value } => format!("Setting({}={})", name, literal(value)),
            Condition::Callable { name, .. } => format!("Callable({})", name),
            Condition::Custom(predicate) => predicate.explain(),
            Condition::Authenticated => "Authenticated".to_string(),
            Condition::Staff => "Staff".to_string(),
            Condition::Superuser => "Superuser".to_string(),
            Condition::Group(group) => format!("Group({})", group),
            Condition::TimeWindow { start, end, days } => match days {
                Some(days) => {
                    let days: Vec<String> = days.iter().map(u32::to_string).collect();
                    format!("TimeWindow({}-{}, days=[{}])", start, end, days.join(", "))
                }
                None => format!("TimeWindow({}-{})", start, end),
            },
            Condition::DateRange { start, end } => {
                let bound = |d: &Option<NaiveDate>| d.map_or_else(|| "*".to_string(), |d| d.to_string());
                format!("DateRange({} to {})", bound(start), bound(end))
            }
            Condition::Environment { var, expected } => match expected {
                Some(expected) => format!("Environment({}='{}')", var, expected),
                None => format!("Environment({})", var),
            },
            Condition::All(children) => format!("({})", join_explained(children, " AND ")),
            Condition::Any(children) => format!("({})", join_explained(children, " OR ")),
            Condition::Not(inner) => format!("NOT({})", inner.explain()),
        }
    }

    /// Evaluate and describe how every part of the tree evaluated
    ///
    /// Compounds evaluate all children, even after the outcome is decided, so
    /// the explanation is complete.
    pub fn check_with_details(&self, context: &Context) -> (bool, String) {
        let (result, explanation) = match self {
            Condition::All(children) => {
                let (results, details) = check_children(children, context);
                let met = results.iter().all(|r| *r);
                (met, format!("AllConditions({}): [{}]", status(met), details.join(", ")))
            }
            Condition::Any(children) => {
                let (results, details) = check_children(children, context);
                let met = results.iter().any(|r| *r);
                (met, format!("AnyCondition({}): [{}]", status(met), details.join(", ")))
            }
            Condition::Not(inner) => {
                let (inner_met, detail) = inner.check_with_details(context);
                let met = !inner_met;
                (met, format!("NotCondition({}): [{}]", status(met), detail))
            }
            leaf => {
                let met = leaf.is_met(context);
                (met, format!("{} -> {}", leaf.explain(), status(met)))
            }
        };
        debug!(condition = %explanation, "Condition check");
        (result, explanation)
    }

    /// Short name of the condition variant
    pub fn kind(&self) -> &'static str {
        match self {
            Condition::FeatureFlag(_) => "FeatureFlag",
            Condition::Permission(_) => "Permission",
            Condition::Setting { .. } => "Setting",
            Condition::Callable { .. } => "Callable",
            Condition::Custom(_) => "Custom",
            Condition::Authenticated => "Authenticated",
            Condition::Staff => "Staff",
            Condition::Superuser => "Superuser",
            Condition::Group(_) => "Group",
            Condition::TimeWindow { .. } => "TimeWindow",
            Condition::DateRange { .. } => "DateRange",
            Condition::Environment { .. } => "Environment",
            Condition::All(_) => "All",
            Condition::Any(_) => "Any",
            Condition::Not(_) => "Not",
        }
    }
}

fn status(met: bool) -> &'static str {
    if met {
        "passed"
    } else {
        "failed"
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

fn join_explained(children: &[Condition], separator: &str) -> String {
    children
        .iter()
        .map(Condition::explain)
        .collect::<Vec<_>>()
        .join(separator)
}

fn check_children(children: &[Condition], context: &Context) -> (Vec<bool>, Vec<String>) {
    children.iter().map(|c| c.check_with_details(context)).unzip()
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.explain())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.explain())
    }
}

impl BitAnd for Condition {
    type Output = Condition;

    fn bitand(self, rhs: Condition) -> Condition {
        match self {
            Condition::All(mut children) => {
                children.push(rhs);
                Condition::All(children)
            }
            lhs => Condition::All(vec![lhs, rhs]),
        }
    }
}

impl BitOr for Condition {
    type Output = Condition;

    fn bitor(self, rhs: Condition) -> Condition {
        match self {
            Condition::Any(mut children) => {
                children.push(rhs);
                Condition::Any(children)
            }
            lhs => Condition::Any(vec![lhs, rhs]),
        }
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }
}
