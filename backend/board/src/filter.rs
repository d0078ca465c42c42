//! # Visibility
//!
//! Community moderation without accounts: once enough people have voted on a
//! code, a high share of downvotes hides it behind the "N hidden codes" banner.
//!
//! - Flagged: at least [`MIN_VOTES_FOR_FLAG`] votes and a downvote share of at
//!   least [`DOWNVOTE_THRESHOLD`]
//! - The app filter only narrows the visible list, the hidden count always
//!   covers every referral
use crate::referral::Referral;

pub const MIN_VOTES_FOR_FLAG: u64 = 3;

pub const DOWNVOTE_THRESHOLD: f64 = 0.4;

pub fn is_flagged(referral: &Referral) -> bool {
    let total = referral.total_votes();
    if total == 0 || total < MIN_VOTES_FOR_FLAG {
        return false;
    }

    referral.downvotes as f64 / total as f64 >= DOWNVOTE_THRESHOLD
}

#[derive(Debug, Clone, PartialEq)]
pub struct Visibility<R> {
    pub visible: Vec<R>,
    pub hidden_count: usize,
}

impl<R> Visibility<R> {
    /// Banner text, `None` when nothing is hidden.
    pub fn banner(&self, show_hidden: bool) -> Option<String> {
        if self.hidden_count == 0 {
            return None;
        }

        let action = if show_hidden { "Hide" } else { "Show" };
        let plural = if self.hidden_count == 1 { "" } else { "s" };

        Some(format!(
            "{action} {} hidden code{plural} (flagged by community)",
            self.hidden_count
        ))
    }
}

pub fn visible<'a>(
    referrals: &'a [Referral],
    selected_app: Option<&str>,
    show_hidden: bool,
) -> Visibility<&'a Referral> {
    let mut hidden_count = 0;
    let mut visible = Vec::new();

    for referral in referrals {
        let flagged = is_flagged(referral);
        if flagged {
            hidden_count += 1;
        }

        let app_matches = selected_app.is_none_or(|app| referral.app_name == app);
        if app_matches && (show_hidden || !flagged) {
            visible.push(referral);
        }
    }

    Visibility {
        visible,
        hidden_count,
    }
}
