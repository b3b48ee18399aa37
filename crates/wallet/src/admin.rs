//! Administrative actions carried by self-calls
//!
//! A transaction addressed to the wallet itself carries one JSON-encoded
//! `AdminAction` as its payload. Executing the transaction applies the action.

use custody_core::{Address, Amount, Payload};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAction {
    AddOwner { owner: Address },
    RemoveOwner { owner: Address },
    ReplaceOwner { old: Address, new: Address },
    ChangeRequirement { required: usize },
    AddGuardian { guardian: Address },
    RemoveGuardian { guardian: Address },
    SetDailyLimit { limit: Amount },
    SetWeeklyLimit { limit: Amount },
    SetTimeLockPeriod { period_secs: u64 },
}

impl AdminAction {
    /// Encode as a self-call payload
    pub fn encode(&self) -> Result<Payload, serde_json::Error> {
        serde_json::to_vec(self).map(Payload::new)
    }

    pub fn decode(payload: &Payload) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload.as_bytes())
    }

    /// Operation name used in errors and logs
    pub fn operation(&self) -> &'static str {
        match self {
            AdminAction::AddOwner { .. } => "add_owner",
            AdminAction::RemoveOwner { .. } => "remove_owner",
            AdminAction::ReplaceOwner { .. } => "replace_owner",
            AdminAction::ChangeRequirement { .. } => "change_requirement",
            AdminAction::AddGuardian { .. } => "add_guardian",
            AdminAction::RemoveGuardian { .. } => "remove_guardian",
            AdminAction::SetDailyLimit { .. } => "set_daily_limit",
            AdminAction::SetWeeklyLimit { .. } => "set_weekly_limit",
            AdminAction::SetTimeLockPeriod { .. } => "set_time_lock_period",
        }
    }

    /// Owner set and threshold changes
    pub fn is_membership_change(&self) -> bool {
        matches!(
            self,
            AdminAction::AddOwner { .. }
                | AdminAction::RemoveOwner { .. }
                | AdminAction::ReplaceOwner { .. }
                | AdminAction::ChangeRequirement { .. }
        )
    }
}
