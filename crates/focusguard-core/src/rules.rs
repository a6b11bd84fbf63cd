//! Rule synchronizer.
//!
//! Projects (blocklist, session state) into the blocking ruleset installed
//! in the rule table. The projection is a pure function; synchronization is
//! a full replace of the reserved identifier range so no stale rule can
//! survive a blocklist edit or a session flip.

use serde::{Deserialize, Serialize};

use crate::blocklist::Blocklist;
use crate::error::StorageError;
use crate::session::{FocusState, SessionType};

/// First identifier owned by the synchronizer.
pub const RULE_BASE: u32 = 1000;
/// Size of the reserved identifier range. Other rule producers must stay
/// outside `[RULE_BASE, RULE_BASE + RULE_RANGE)`.
pub const RULE_RANGE: u32 = 5000;

const RULE_PRIORITY: u32 = 1;

/// Internal page a blocked navigation is redirected to.
pub const BLOCKED_PAGE: &str = "/blocked.html";

/// One match→redirect rule for top-level navigations.
///
/// `url_filter` is a substring filter over the request URL, not an exact
/// host match: `example.com` also matches lookalike hosts that merely
/// contain it. That imprecision is part of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRule {
    pub id: u32,
    pub priority: u32,
    /// Substring matched against main-frame request URLs.
    pub url_filter: String,
    /// Redirect target, carrying the blocked domain as a query parameter.
    pub redirect_url: String,
}

/// Redirect target for a blocked domain, e.g.
/// `/blocked.html?site=example.com`.
pub fn blocked_page_url(domain: &str) -> String {
    format!("{BLOCKED_PAGE}?site={}", urlencoding::encode(domain))
}

/// Pure projection of the blocklist and session state into rules.
///
/// Empty unless a focus session is active and the blocklist is non-empty.
/// Identifiers are derived from list position only, so identical inputs
/// always yield identical rules.
pub fn compute_rules(
    blocklist: &Blocklist,
    focusing: bool,
    session_type: Option<SessionType>,
) -> Vec<BlockRule> {
    let should_block = focusing && session_type == Some(SessionType::Focus);
    if !should_block {
        return Vec::new();
    }
    blocklist
        .domains()
        .iter()
        .enumerate()
        .map(|(idx, domain)| BlockRule {
            id: RULE_BASE + idx as u32,
            priority: RULE_PRIORITY,
            url_filter: domain.clone(),
            redirect_url: blocked_page_url(domain),
        })
        .collect()
}

/// Rules derived from a full state record.
pub fn compute_rules_for(state: &FocusState) -> Vec<BlockRule> {
    compute_rules(&state.blocklist, state.focusing, state.session_type)
}

/// The rule table the host network layer consumes: bulk add/remove keyed by
/// integer identifier, plus enumeration for diffing.
pub trait RuleTable {
    fn installed(&self) -> Result<Vec<BlockRule>, StorageError>;

    /// Remove `remove_ids`, then install `add`, as one bulk update.
    fn update(&self, remove_ids: &[u32], add: &[BlockRule]) -> Result<(), StorageError>;
}

/// Replace everything in the synchronizer's reserved range with `rules`.
pub fn sync(table: &dyn RuleTable, rules: &[BlockRule]) -> Result<(), StorageError> {
    let owned_range = RULE_BASE..RULE_BASE + RULE_RANGE;
    let remove_ids: Vec<u32> = table
        .installed()?
        .iter()
        .map(|r| r.id)
        .filter(|id| owned_range.contains(id))
        .collect();
    if remove_ids.is_empty() && rules.is_empty() {
        return Ok(());
    }
    table.update(&remove_ids, rules)
}
