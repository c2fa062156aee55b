//! Disposition state machine.
//!
//! Defines the closed set of 17 dispositions a verification call can end in,
//! the category each one belongs to, and the graph of legal transitions
//! between them. Everything in this module is pure: no I/O, no clocks.

mod config;
mod error;
mod graph;
#[cfg(test)]
mod tests;

pub use config::*;
pub use error::*;
pub use graph::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of dispositions in the closed set.
pub const DISPOSITION_COUNT: usize = 17;

/// Outcome of a verification call, and therefore the lifecycle state of an order.
///
/// Serialized as `SCREAMING_SNAKE_CASE` (e.g. `"NO_ANSWER"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    /// Ingested, not yet worked. The only initial state.
    New,
    /// Phone rang out
    NoAnswer,
    LineBusy,
    CallDeclined,
    CallNotConnected,
    /// Incoming calls not available on the customer's number
    NotReachable,
    CallForwarded,
    LanguageBarrier,
    /// Message delivered on a chat channel but never answered
    SeenNoReply,
    /// Customer asked to be called back at a later time
    Callback,
    Rescheduled,
    /// Held for a second caller to review
    FraudSuspected,
    Confirmed,
    ConfirmedOnWhatsapp,
    Cancelled,
    CancelledOnWhatsapp,
    InvalidNumber,
}

impl Disposition {
    /// Every disposition, in declaration order.
    pub const ALL: [Disposition; DISPOSITION_COUNT] = [
        Disposition::New,
        Disposition::NoAnswer,
        Disposition::LineBusy,
        Disposition::CallDeclined,
        Disposition::CallNotConnected,
        Disposition::NotReachable,
        Disposition::CallForwarded,
        Disposition::LanguageBarrier,
        Disposition::SeenNoReply,
        Disposition::Callback,
        Disposition::Rescheduled,
        Disposition::FraudSuspected,
        Disposition::Confirmed,
        Disposition::ConfirmedOnWhatsapp,
        Disposition::Cancelled,
        Disposition::CancelledOnWhatsapp,
        Disposition::InvalidNumber,
    ];

    /// Position of this disposition in [`Disposition::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical name, as used in configuration and serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::New => "NEW",
            Disposition::NoAnswer => "NO_ANSWER",
            Disposition::LineBusy => "LINE_BUSY",
            Disposition::CallDeclined => "CALL_DECLINED",
            Disposition::CallNotConnected => "CALL_NOT_CONNECTED",
            Disposition::NotReachable => "NOT_REACHABLE",
            Disposition::CallForwarded => "CALL_FORWARDED",
            Disposition::LanguageBarrier => "LANGUAGE_BARRIER",
            Disposition::SeenNoReply => "SEEN_NO_REPLY",
            Disposition::Callback => "CALLBACK",
            Disposition::Rescheduled => "RESCHEDULED",
            Disposition::FraudSuspected => "FRAUD_SUSPECTED",
            Disposition::Confirmed => "CONFIRMED",
            Disposition::ConfirmedOnWhatsapp => "CONFIRMED_ON_WHATSAPP",
            Disposition::Cancelled => "CANCELLED",
            Disposition::CancelledOnWhatsapp => "CANCELLED_ON_WHATSAPP",
            Disposition::InvalidNumber => "INVALID_NUMBER",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Disposition {
    type Err = String;

    /// Case-insensitive; spaces and hyphens are accepted in place of underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
        Disposition::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| format!("Unknown disposition: {}", s))
    }
}

/// How the allocator treats an order sitting in a given disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Eligible for a caller's queue
    Active,
    /// Closed; no further transitions
    Terminal,
    /// Waiting for a scheduled follow-up before it is requeued
    PendingAction,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Active => "ACTIVE",
            Category::Terminal => "TERMINAL",
            Category::PendingAction => "PENDING_ACTION",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "ACTIVE" => Ok(Category::Active),
            "TERMINAL" => Ok(Category::Terminal),
            "PENDING_ACTION" => Ok(Category::PendingAction),
            _ => Err(format!("Unknown disposition category: {}", s)),
        }
    }
}

/// Result of an accepted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub from: Disposition,
    pub to: Disposition,
    /// Category of `to`; drives requeue decisions.
    pub category: Category,
    /// Caller who requested the change
    pub actor: String,
}
