//! Event type literals for the status topic.

pub const PROPOSAL_CREATED: &str = "PROPOSAL_CREATED";
pub const PROPOSAL_ACCEPTED: &str = "PROPOSAL_ACCEPTED";
pub const PROPOSAL_DECLINED: &str = "PROPOSAL_DECLINED";
pub const PROPOSAL_EXPIRED: &str = "PROPOSAL_EXPIRED";
pub const PROPOSAL_CANCELLED: &str = "PROPOSAL_CANCELLED";

pub const MARRIAGE_CREATED: &str = "MARRIAGE_CREATED";
pub const MARRIAGE_DIVORCED: &str = "MARRIAGE_DIVORCED";
pub const MARRIAGE_DELETED: &str = "MARRIAGE_DELETED";

pub const CEREMONY_SCHEDULED: &str = "CEREMONY_SCHEDULED";
pub const CEREMONY_STARTED: &str = "CEREMONY_STARTED";
pub const CEREMONY_COMPLETED: &str = "CEREMONY_COMPLETED";
pub const CEREMONY_POSTPONED: &str = "CEREMONY_POSTPONED";
pub const CEREMONY_CANCELLED: &str = "CEREMONY_CANCELLED";
pub const CEREMONY_RESCHEDULED: &str = "CEREMONY_RESCHEDULED";

pub const INVITEE_ADDED: &str = "INVITEE_ADDED";
pub const INVITEE_REMOVED: &str = "INVITEE_REMOVED";

pub const MARRIAGE_ERROR: &str = "MARRIAGE_ERROR";
