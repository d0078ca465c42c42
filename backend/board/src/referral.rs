use std::{fmt, str::FromStr, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ParseDirectionError, ValidationError},
    filter::MIN_VOTES_FOR_FLAG,
};

pub const MAX_DESCRIPTION_CHARS: usize = 200;

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid link pattern"));

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("valid space pattern"));

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteDirection::Up => f.write_str("up"),
            VoteDirection::Down => f.write_str("down"),
        }
    }
}

impl FromStr for VoteDirection {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: String,
    pub app_name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
    pub created_at: DateTime<Utc>,
}

impl Referral {
    /// Fresh record as a store creates it: zero votes.
    pub fn from_draft(id: String, draft: ReferralDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            app_name: draft.app_name,
            code: draft.code,
            referral_link: draft.referral_link,
            description: draft.description,
            upvotes: 0,
            downvotes: 0,
            created_at,
        }
    }

    pub fn total_votes(&self) -> u64 {
        self.upvotes as u64 + self.downvotes as u64
    }

    /// Counts after one more vote in `direction`. `None` once that counter is full.
    pub fn counts_after(&self, direction: VoteDirection) -> Option<(u32, u32)> {
        match direction {
            VoteDirection::Up => Some((self.upvotes.checked_add(1)?, self.downvotes)),
            VoteDirection::Down => Some((self.upvotes, self.downvotes.checked_add(1)?)),
        }
    }

    /// Percentage of upvotes, rounded. `None` before the first vote.
    pub fn trust_score(&self) -> Option<u8> {
        let total = self.total_votes();
        if total == 0 {
            return None;
        }

        Some((self.upvotes as f64 / total as f64 * 100.0).round() as u8)
    }

    pub fn trust_level(&self) -> TrustLevel {
        if self.total_votes() < MIN_VOTES_FOR_FLAG {
            return TrustLevel::New;
        }

        match self.trust_score().unwrap_or_default() {
            80.. => TrustLevel::Trusted,
            60.. => TrustLevel::Good,
            40.. => TrustLevel::Mixed,
            _ => TrustLevel::Flagged,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustLevel {
    New,
    Trusted,
    Good,
    Mixed,
    Flagged,
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrustLevel::New => "New",
            TrustLevel::Trusted => "Trusted",
            TrustLevel::Good => "Good",
            TrustLevel::Mixed => "Mixed",
            TrustLevel::Flagged => "Flagged",
        };

        f.write_str(label)
    }
}

/// User input for a new referral, before the store assigns id and time.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralDraft {
    pub app_name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ReferralDraft {
    pub fn new(app_name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.referral_link = Some(link.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Trims every field, drops blank optionals and checks the form rules.
    pub fn normalize(self) -> Result<Self, ValidationError> {
        let app_name = SPACES
            .replace_all(self.app_name.trim(), " ")
            .into_owned();
        let code = self.code.trim().to_string();

        if app_name.is_empty() {
            return Err(ValidationError::MissingAppName);
        }

        if code.is_empty() {
            return Err(ValidationError::MissingCode);
        }

        let referral_link = non_blank(self.referral_link);
        if let Some(link) = &referral_link {
            if !LINK.is_match(link) {
                return Err(ValidationError::InvalidLink(link.clone()));
            }
        }

        let description = non_blank(self.description);
        if let Some(description) = &description {
            let chars = description.chars().count();
            if chars > MAX_DESCRIPTION_CHARS {
                return Err(ValidationError::DescriptionTooLong(chars));
            }
        }

        Ok(Self {
            app_name,
            code,
            referral_link,
            description,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
