//! Destination-field semantics.
//!
//! A ROUTE's destination field name decides what an incoming event does to the
//! bound animation. The mapping is a table of rules rather than string checks in
//! dispatch, so hosts can extend or replace it.

use serde::{Deserialize, Serialize};

/// What an event arriving at a destination field does to its animation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAction {
    /// Truthy event starts the animation.
    Enable,
    /// Truthy event stops the animation.
    Disable,
    /// Boolean event sets running to its value.
    Toggle,
    /// Time event moves the playhead.
    SetTime,
    /// No executable effect; such routes are kept inert.
    Ignore,
}

/// Value carried by a fired event.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum EventValue {
    /// SFBool outputs such as `isActive` / `isOver`.
    Bool(bool),
    /// SFTime outputs such as `touchTime`, in seconds.
    Time(f64),
}

impl EventValue {
    /// An SFTime event is always truthy: it reports when it fired.
    #[inline]
    pub fn is_truthy(self) -> bool {
        match self {
            EventValue::Bool(b) => b,
            EventValue::Time(_) => true,
        }
    }
}

/// Effect on an animation handle after applying an action to a value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Effect {
    SetRunning(bool),
    Seek(f64),
}

impl FieldAction {
    /// Decide the handle call, if any, for `value`.
    pub fn effect(self, value: EventValue) -> Option<Effect> {
        match (self, value) {
            (FieldAction::Enable, v) if v.is_truthy() => Some(Effect::SetRunning(true)),
            (FieldAction::Disable, v) if v.is_truthy() => Some(Effect::SetRunning(false)),
            (FieldAction::Toggle, EventValue::Bool(b)) => Some(Effect::SetRunning(b)),
            (FieldAction::Toggle, EventValue::Time(_)) => Some(Effect::SetRunning(true)),
            (FieldAction::SetTime, EventValue::Time(t)) => Some(Effect::Seek(t)),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMatch {
    /// Case-sensitive equality.
    Exact,
    /// Case-insensitive suffix, the way transform fields are matched.
    Suffix,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub pattern: String,
    #[serde(default = "default_match")]
    pub matcher: FieldMatch,
    pub action: FieldAction,
}

fn default_match() -> FieldMatch {
    FieldMatch::Exact
}

impl FieldRule {
    pub fn exact(pattern: impl Into<String>, action: FieldAction) -> Self {
        Self {
            pattern: pattern.into(),
            matcher: FieldMatch::Exact,
            action,
        }
    }

    pub fn suffix(pattern: impl Into<String>, action: FieldAction) -> Self {
        Self {
            pattern: pattern.into(),
            matcher: FieldMatch::Suffix,
            action,
        }
    }

    pub fn matches(&self, field: &str) -> bool {
        match self.matcher {
            FieldMatch::Exact => field == self.pattern,
            FieldMatch::Suffix => ends_with_ignore_case(field, &self.pattern),
        }
    }
}

pub(crate) fn ends_with_ignore_case(haystack: &str, suffix: &str) -> bool {
    let (h, s) = (haystack.as_bytes(), suffix.as_bytes());
    h.len() >= s.len() && h[h.len() - s.len()..].eq_ignore_ascii_case(s)
}

/// Ordered field-name rules; first match wins, no match means `Ignore`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionTable {
    rules: Vec<FieldRule>,
}

impl ActionTable {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule. Earlier rules take precedence.
    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Insert a rule ahead of every existing one.
    pub fn with_override(mut self, rule: FieldRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    pub fn action_for(&self, field: &str) -> FieldAction {
        self.rules
            .iter()
            .find(|r| r.matches(field))
            .map(|r| r.action)
            .unwrap_or(FieldAction::Ignore)
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

impl Default for ActionTable {
    /// TimeSensor input fields.
    fn default() -> Self {
        use FieldAction::*;
        let mut table = Self::empty();
        for (field, action) in [
            ("startTime", Enable),
            ("set_startTime", Enable),
            ("resumeTime", Enable),
            ("set_resumeTime", Enable),
            ("stopTime", Disable),
            ("set_stopTime", Disable),
            ("pauseTime", Disable),
            ("set_pauseTime", Disable),
            ("enabled", Toggle),
            ("set_enabled", Toggle),
        ] {
            table = table.with_rule(FieldRule::exact(field, action));
        }
        table
    }
}
