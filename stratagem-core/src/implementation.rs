//! Implementation declarations
//!
//! An [`Implementation`] is the registry's view of one concrete type that
//! satisfies a capability `I` (usually a trait object such as `dyn Notifier`).
//! It carries identity (slug, type id, path-qualified type name), display
//! metadata, an optional availability [`Condition`], an optional
//! [`ParentConstraint`] and a factory that produces fresh instances.
//!
//! Declaring a type alias per capability keeps the builder readable:
//!
//! ```rust
//! use stratagem_core::implementation::Implementation;
//!
//! trait Notifier: Send + Sync {
//!     fn send(&self, to: &str) -> String;
//! }
//!
//! struct EmailNotifier;
//!
//! impl Notifier for EmailNotifier {
//!     fn send(&self, to: &str) -> String {
//!         format!("mail to {}", to)
//!     }
//! }
//!
//! type NotifierImpl = Implementation<dyn Notifier>;
//!
//! let email = NotifierImpl::new::<EmailNotifier>("email", || Box::new(EmailNotifier))
//!     .with_priority(10)
//!     .implements("Notifier");
//!
//! assert_eq!(email.label(), "Email Notifier");
//! assert_eq!(email.instantiate().send("ops"), "mail to ops");
//! ```

use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::context::Context;

/// Produces a fresh boxed instance
pub type Factory<I> = Arc<dyn Fn() -> Box<I> + Send + Sync>;

/// Function placed in a static slice to declare one implementation
pub type Declaration<I> = fn() -> Implementation<I>;

/// Which parent selections an implementation is valid for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentConstraint {
    /// Valid under every parent
    #[default]
    Any,
    /// Valid only under this parent slug
    One(String),
    /// Valid under any of these parent slugs
    Many(Vec<String>),
}

impl ParentConstraint {
    /// Whether a parent slug satisfies the constraint
    pub fn accepts(&self, parent_slug: &str) -> bool {
        match self {
            ParentConstraint::Any => true,
            ParentConstraint::One(slug) => slug == parent_slug,
            ParentConstraint::Many(slugs) => slugs.iter().any(|s| s == parent_slug),
        }
    }

    /// Declared parent slugs, empty when unconstrained
    pub fn slugs(&self) -> Vec<&str> {
        match self {
            ParentConstraint::Any => Vec::new(),
            ParentConstraint::One(slug) => vec![slug.as_str()],
            ParentConstraint::Many(slugs) => slugs.iter().map(String::as_str).collect(),
        }
    }
}

/// One concrete type registered for capability `I`
pub struct Implementation<I: ?Sized> {
    slug: String,
    type_id: TypeId,
    type_name: &'static str,
    label: Option<String>,
    description: String,
    icon: String,
    priority: i32,
    interfaces: Vec<&'static str>,
    condition: Option<Condition>,
    parent: ParentConstraint,
    factory: Factory<I>,
}

impl<I: ?Sized> Implementation<I> {
    /// Declare concrete type `T` under `slug`
    ///
    /// An empty slug marks the declaration as abstract: discovery records
    /// its name and skips it.
    pub fn new<T: 'static>(
        slug: impl Into<String>,
        factory: impl Fn() -> Box<I> + Send + Sync + 'static,
    ) -> Self {
        Self {
            slug: slug.into(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            label: None,
            description: String::new(),
            icon: String::new(),
            priority: 0,
            interfaces: Vec::new(),
            condition: None,
            parent: ParentConstraint::Any,
            factory: Arc::new(factory),
        }
    }

    /// Explicit display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Ordering key for choices (lower first)
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Declare that the type satisfies a named interface
    pub fn implements(mut self, interface: &'static str) -> Self {
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
        self
    }

    /// Gate availability on a condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Restrict to a single parent slug
    pub fn parent_slug(mut self, slug: impl Into<String>) -> Self {
        self.parent = ParentConstraint::One(slug.into());
        self
    }

    /// Restrict to a set of parent slugs
    pub fn parent_slugs<S: Into<String>>(mut self, slugs: impl IntoIterator<Item = S>) -> Self {
        self.parent = ParentConstraint::Many(slugs.into_iter().map(Into::into).collect());
        self
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn concrete_type_id(&self) -> TypeId {
        self.type_id
    }

    /// Path-qualified type name, used for resolve-by-name
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }

    /// Explicit label, or the short type name split into words
    pub fn label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => camel_to_title(self.short_name()),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn interfaces(&self) -> &[&'static str] {
        &self.interfaces
    }

    pub fn declares(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| *i == interface)
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn parent_constraint(&self) -> &ParentConstraint {
        &self.parent
    }

    /// Available when no condition is set or the condition holds
    pub fn is_available(&self, context: &Context) -> bool {
        self.condition.as_ref().map_or(true, |c| c.is_met(context))
    }

    pub fn is_valid_for_parent(&self, parent_slug: &str) -> bool {
        self.parent.accepts(parent_slug)
    }

    /// Build a fresh instance
    pub fn instantiate(&self) -> Box<I> {
        (self.factory)()
    }
}

impl<I: ?Sized> Clone for Implementation<I> {
    fn clone(&self) -> Self {
        Self {
            slug: self.slug.clone(),
            type_id: self.type_id,
            type_name: self.type_name,
            label: self.label.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            priority: self.priority,
            interfaces: self.interfaces.clone(),
            condition: self.condition.clone(),
            parent: self.parent.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<I: ?Sized> fmt::Debug for Implementation<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("slug", &self.slug)
            .field("type_name", &self.type_name)
            .field("priority", &self.priority)
            .field("interfaces", &self.interfaces)
            .field("condition", &self.condition)
            .field("parent", &self.parent)
            .finish()
    }
}

/// Whether a name is path-qualified (`crate::module::Type`)
pub fn is_qualified_name(name: &str) -> bool {
    name.contains("::") && !name.starts_with("::") && !name.ends_with("::")
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Split a camel-case identifier into title-cased words
///
/// Runs of capitals stay together: `HTTPServer` becomes `HTTP Server`.
pub fn camel_to_title(text: &str) -> String {
    static ACRONYM: OnceLock<Regex> = OnceLock::new();
    static WORD: OnceLock<Regex> = OnceLock::new();

    let acronym = ACRONYM.get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("acronym pattern compiles"));
    let word = WORD.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").expect("word pattern compiles"));

    let text = acronym.replace_all(text, "$1 $2");
    let text = word.replace_all(&text, "$1 $2");

    text.split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
