use board::{Referral, Visibility, VoteDirection, catalog};

pub fn card(referral: &Referral, user_vote: Option<VoteDirection>) -> String {
    let app = catalog::lookup(&referral.app_name);

    let trust = match referral.trust_score() {
        Some(score) => format!("{} {score}%", referral.trust_level()),
        None => referral.trust_level().to_string(),
    };
    let mut out = format!(
        "{} {}  [{trust}]\n  code: {}\n",
        app.icon, referral.app_name, referral.code
    );

    if let Some(link) = &referral.referral_link {
        out.push_str(&format!("  link: {link}\n"));
    }

    if let Some(description) = &referral.description {
        out.push_str(&format!("  {description}\n"));
    }

    let hint = match user_vote {
        Some(direction) => format!("Thanks for voting! (you voted {direction})"),
        None => "Did it work?".to_string(),
    };
    out.push_str(&format!(
        "  👍 {}  👎 {}  {hint}\n  id: {}\n",
        referral.upvotes, referral.downvotes, referral.id
    ));

    out
}

pub fn listing(
    visibility: &Visibility<Referral>,
    show_hidden: bool,
    has_filter: bool,
    user_vote: impl Fn(&str) -> Option<VoteDirection>,
) -> String {
    let mut out = String::new();

    if let Some(banner) = visibility.banner(show_hidden) {
        out.push_str(&format!("{banner}\n\n"));
    }

    if visibility.visible.is_empty() {
        out.push_str(empty_state(has_filter));
        out.push('\n');
        return out;
    }

    for referral in &visibility.visible {
        out.push_str(&card(referral, user_vote(&referral.id)));
        out.push('\n');
    }

    out
}

pub fn empty_state(has_filter: bool) -> &'static str {
    if has_filter {
        "No codes found for this app. Try a different app or drop --app."
    } else {
        "No referral codes yet. Be the first to share one!"
    }
}

pub fn apps(referrals: &[Referral]) -> String {
    let in_use = catalog::apps_in_use(referrals);
    if in_use.is_empty() {
        return "No referrals yet. Be the first to add one!\n".to_string();
    }

    in_use
        .into_iter()
        .map(|app| {
            let count = referrals.iter().filter(|r| r.app_name == app.name).count();
            format!("{} {} ({count})\n", app.icon, app.name)
        })
        .collect()
}

pub fn vote_thanks(direction: VoteDirection) -> &'static str {
    match direction {
        VoteDirection::Up => "👍 Thanks for the feedback!",
        VoteDirection::Down => "👎 Thanks for reporting!",
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn referral(id: &str, app_name: &str, upvotes: u32, downvotes: u32) -> Referral {
        Referral {
            id: id.to_string(),
            app_name: app_name.to_string(),
            code: "JOHN2024".to_string(),
            referral_link: Some("https://example.com/r/john".to_string()),
            description: Some("Both get $10 off".to_string()),
            upvotes,
            downvotes,
            created_at: DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_card() {
        let out = card(&referral("a", "Uber", 5, 1), None);
        assert!(out.starts_with("🚗 Uber  [Trusted 83%]"));
        assert!(out.contains("code: JOHN2024"));
        assert!(out.contains("link: https://example.com/r/john"));
        assert!(out.contains("Both get $10 off"));
        assert!(out.contains("👍 5  👎 1  Did it work?"));
    }

    #[test]
    fn test_card_new_and_voted() {
        let out = card(&referral("a", "My Gym", 0, 0), Some(VoteDirection::Down));
        assert!(out.starts_with("📱 My Gym  [New]"));
        assert!(out.contains("you voted down"));
    }

    #[test]
    fn test_card_without_extras() {
        let mut bare = referral("x", "Lyft", 1, 0);
        bare.referral_link = None;
        bare.description = None;

        assert_eq!(
            card(&bare, None),
            "🚙 Lyft  [New 100%]\n  code: JOHN2024\n  👍 1  👎 0  Did it work?\n  id: x\n"
        );
    }

    #[test]
    fn test_listing_banner_and_empty() {
        let visibility = Visibility {
            visible: vec![],
            hidden_count: 2,
        };

        let out = listing(&visibility, false, true, |_| None);
        assert!(out.starts_with("Show 2 hidden codes"));
        assert!(out.contains("No codes found for this app"));
    }

    #[test]
    fn test_listing_cards() {
        let visibility = Visibility {
            visible: vec![referral("a", "Uber", 0, 0), referral("b", "Lyft", 0, 0)],
            hidden_count: 0,
        };

        let out = listing(&visibility, false, false, |id| {
            (id == "b").then_some(VoteDirection::Up)
        });
        assert!(out.find("id: a").unwrap() < out.find("id: b").unwrap());
        assert_eq!(out.matches("Thanks for voting").count(), 1);
    }

    #[test]
    fn test_apps() {
        assert!(apps(&[]).starts_with("No referrals yet"));

        let referrals = vec![
            referral("1", "Lyft", 0, 0),
            referral("2", "Uber", 0, 0),
            referral("3", "Lyft", 0, 0),
        ];
        assert_eq!(apps(&referrals), "🚗 Uber (1)\n🚙 Lyft (2)\n");
    }
}
