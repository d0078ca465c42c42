//! # App Catalog
//!
//! Fixed list of apps a referral can belong to.
//!
//! - Ordered as shown on the filter chips and the submit form
//! - `Other` lets the caller supply any free-text app name
//! - Unknown names render with the neutral fallback entry
use serde::Serialize;

use crate::referral::Referral;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct App {
    pub name: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

pub const OTHER_APP: &str = "Other";

pub const FALLBACK_APP: App = App {
    name: OTHER_APP,
    color: "#6B7280",
    icon: "📱",
};

pub const POPULAR_APPS: [App; 16] = [
    app("Uber", "#000000", "🚗"),
    app("Lyft", "#FF00BF", "🚙"),
    app("DoorDash", "#FF3008", "🍔"),
    app("Uber Eats", "#06C167", "🍕"),
    app("Instacart", "#43B02A", "🛒"),
    app("Robinhood", "#00C805", "📈"),
    app("Coinbase", "#0052FF", "₿"),
    app("Cash App", "#00D632", "💵"),
    app("Venmo", "#3D95CE", "💸"),
    app("PayPal", "#003087", "💳"),
    app("Dropbox", "#0061FF", "📦"),
    app("Airbnb", "#FF5A5F", "🏠"),
    app("Tesla", "#CC0000", "⚡"),
    app("Rakuten", "#BF0000", "💰"),
    app("Honey", "#FF6801", "🍯"),
    app("Other", "#6B7280", "📱"),
];

const fn app(name: &'static str, color: &'static str, icon: &'static str) -> App {
    App { name, color, icon }
}

/// Exact-name lookup, `None` for free-text names.
pub fn find(name: &str) -> Option<&'static App> {
    POPULAR_APPS.iter().find(|app| app.name == name)
}

/// Display info for a referral's app name.
pub fn lookup(name: &str) -> &'static App {
    find(name).unwrap_or(&FALLBACK_APP)
}

/// Catalog entries with at least one referral, in catalog order.
pub fn apps_in_use(referrals: &[Referral]) -> Vec<&'static App> {
    POPULAR_APPS
        .iter()
        .filter(|app| referrals.iter().any(|referral| referral.app_name == app.name))
        .collect()
}
