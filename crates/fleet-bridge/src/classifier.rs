// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic classification.
//!
//! Maps inbound topic names to a closed set of message kinds using an
//! ordered rule list that is fixed at startup and never mutated. The first
//! matching rule wins: the exact `announcements` match is evaluated before
//! the reading rule so a pathological broker configuration cannot
//! double-classify a topic.

/// Kind of an inbound message, derived from its topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Device announcement (`announcements` topic).
    Announcement,
    /// Sensor reading (`sensors/<id>/data` family).
    Reading,
    /// No rule matched; the message is dropped with a diagnostic.
    Unrecognized,
}

impl MessageKind {
    /// Lowercase label for log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Announcement => "announcement",
            Self::Reading => "reading",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// MQTT subscription filters covering the recognized topic shapes.
pub const SUBSCRIPTION_FILTERS: &[&str] = &["announcements", "sensors/+/data"];

/// A single classification rule.
#[derive(Debug, Clone)]
enum TopicRule {
    /// Topic equals the pattern exactly.
    Exact(&'static str),
    /// Topic starts with the prefix and the remainder contains the token.
    ///
    /// Looser than a full path-segment parse: deployed sensors publish on
    /// `sensors/<id>/data`, but any remainder containing the token is
    /// accepted.
    PrefixWithToken {
        prefix: &'static str,
        token: &'static str,
    },
}

impl TopicRule {
    fn matches(&self, topic: &str) -> bool {
        match self {
            TopicRule::Exact(name) => topic == *name,
            TopicRule::PrefixWithToken { prefix, token } => topic
                .strip_prefix(prefix)
                .map_or(false, |rest| rest.contains(token)),
        }
    }
}

/// Ordered topic classifier. First matching rule wins.
#[derive(Debug, Clone)]
pub struct TopicClassifier {
    rules: Vec<(TopicRule, MessageKind)>,
}

impl TopicClassifier {
    /// Build the fixed fleet-monitoring rule set.
    pub fn new() -> Self {
        Self {
            rules: vec![
                (TopicRule::Exact("announcements"), MessageKind::Announcement),
                (
                    TopicRule::PrefixWithToken {
                        prefix: "sensors/",
                        token: "data",
                    },
                    MessageKind::Reading,
                ),
            ],
        }
    }

    /// Classify a topic.
    ///
    /// Pure function of the topic string; the rule set never changes after
    /// startup.
    pub fn classify(&self, topic: &str) -> MessageKind {
        for (rule, kind) in &self.rules {
            if rule.matches(topic) {
                return *kind;
            }
        }
        MessageKind::Unrecognized
    }
}

impl Default for TopicClassifier {
    fn default() -> Self {
        Self::new()
    }
}
