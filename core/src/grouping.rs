//! Folding existing cards into a new card group.
//!
//! # Design
//! `group_cards` runs four requests strictly in order:
//!
//! 1. `FindParent`: look up the group the cards currently live in
//!    (`ws-activity` unless named) for its id and membership.
//! 2. `CreateGroup`: create the new group holding the cards.
//! 3. `CreateGroupCard`: create a group card displaying the new group.
//! 4. `UpdateParent`: replace the parent's membership with its old members,
//!    minus the grouped cards, plus the group card.
//!
//! The first step whose status is not the expected one stops the run and is
//! reported as `GroupOutcome::Failed` with that step's raw response. Nothing
//! is rolled back: a failure at step 3 or 4 leaves the new group (and at step
//! 4 the group card) on the server while the parent is unchanged.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::client::WatershedClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::ApiResponse;

/// Group new cards land in when created by an admin or owner.
pub const DEFAULT_PARENT_GROUP: &str = "ws-activity";

/// A step of `group_cards`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupStep {
    FindParent,
    CreateGroup,
    CreateGroupCard,
    UpdateParent,
}

impl fmt::Display for GroupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupStep::FindParent => "find parent group",
            GroupStep::CreateGroup => "create card group",
            GroupStep::CreateGroupCard => "create group card",
            GroupStep::UpdateParent => "update parent group",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum GroupOutcome {
    #[serde(rename_all = "camelCase")]
    Grouped { group_id: u64, card_id: u64 },
    Failed { step: GroupStep, response: ApiResponse },
}

impl GroupOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GroupOutcome::Grouped { .. })
    }

    pub fn failed_step(&self) -> Option<GroupStep> {
        match self {
            GroupOutcome::Failed { step, .. } => Some(*step),
            GroupOutcome::Grouped { .. } => None,
        }
    }
}

/// Parent membership after grouping: the starting cards in their original
/// order minus the grouped ones, then the group card.
pub fn reconcile_membership(starting: &[u64], grouped: &[u64], group_card_id: u64) -> Vec<u64> {
    let mut cards: Vec<u64> = starting
        .iter()
        .copied()
        .filter(|id| !grouped.contains(id))
        .collect();
    cards.push(group_card_id);
    cards
}

/// A stopped step is never reported as a success, even when the server
/// answered 2xx without a usable body.
fn failed(step: GroupStep, mut response: ApiResponse) -> GroupOutcome {
    response.success = false;
    warn!(%step, status = response.status, "card grouping stopped");
    GroupOutcome::Failed { step, response }
}

impl<T: Transport> WatershedClient<T> {
    /// Move `card_ids` into a new group named `group_name`, shown in the
    /// parent group through a single group card titled `group_title`.
    ///
    /// Transport errors abort with `Err`; unexpected statuses come back as
    /// `GroupOutcome::Failed`.
    pub fn group_cards(
        &self,
        card_ids: &[u64],
        org_id: u64,
        group_name: &str,
        group_title: &str,
        parent_name: Option<&str>,
    ) -> Result<GroupOutcome, ApiError> {
        let parent_name = parent_name.unwrap_or(DEFAULT_PARENT_GROUP);

        let lookup = self.find_card_group(parent_name, org_id)?;
        let parent = match lookup.group {
            Some(group) if lookup.response.success => group,
            _ => return Ok(failed(GroupStep::FindParent, lookup.response)),
        };

        let created = self.create_card_group(group_name, card_ids, org_id)?;
        let group_id = match created.group_id {
            Some(id) if created.response.success => id,
            _ => return Ok(failed(GroupStep::CreateGroup, created.response)),
        };

        let card = self.create_group_card(group_id, group_title, org_id)?;
        let card_id = match card.card_id {
            Some(id) if card.response.success => id,
            _ => return Ok(failed(GroupStep::CreateGroupCard, card.response)),
        };

        let updated = self.hide_grouped_cards(
            &parent.card_ids,
            card_ids,
            card_id,
            parent.id,
            parent_name,
            org_id,
        )?;
        if !updated.success {
            return Ok(failed(GroupStep::UpdateParent, updated));
        }

        info!(group_id, card_id, parent = parent_name, "cards grouped");
        Ok(GroupOutcome::Grouped { group_id, card_id })
    }

    /// Remove `grouped` from a parent group's `starting` membership and add
    /// `group_card_id`, replacing the parent's membership. Expects 204.
    pub fn hide_grouped_cards(
        &self,
        starting: &[u64],
        grouped: &[u64],
        group_card_id: u64,
        parent_id: u64,
        parent_name: &str,
        org_id: u64,
    ) -> Result<ApiResponse, ApiError> {
        let cards = reconcile_membership(starting, grouped, group_card_id);
        self.edit_card_group(parent_id, parent_name, &cards, org_id)
    }
}
