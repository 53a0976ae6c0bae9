//! # Sidebar Menu
//!
//! What the sidebar shows for a given path and session. Navigation links are
//! fixed; the footer depends on the session: nothing while it loads, a
//! sign-in action when signed out, and the profile link, user name and
//! sign-out action when signed in.

use super::SessionState;

pub const SIGN_IN_PROVIDER: &str = "google";
pub const SIGN_IN_CALLBACK: &str = "/profile";
pub const SIGN_OUT_CALLBACK: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub href: &'static str,
    pub label: &'static str,
}

pub const NAV_ITEMS: [NavItem; 3] = [
    NavItem {
        href: "/",
        label: "Dashboard",
    },
    NavItem {
        href: "/posts",
        label: "Posts",
    },
    NavItem {
        href: "/users",
        label: "Users",
    },
];

const PROFILE_ITEM: NavItem = NavItem {
    href: "/profile",
    label: "Profile",
};

/// `/` is active only on itself; other links also cover their sub-paths.
pub fn is_active(href: &str, pathname: &str) -> bool {
    pathname == href || (href != "/" && pathname.starts_with(href))
}

/// Links that need a signed-in user.
pub fn auth_items(session: &SessionState) -> Vec<NavItem> {
    match session {
        SessionState::Authenticated(_) => vec![PROFILE_ITEM],
        SessionState::Loading | SessionState::Unauthenticated => Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFooter {
    /// Placeholder while the session loads.
    Pending,
    SignIn {
        provider_id: &'static str,
        callback_url: &'static str,
    },
    SignOut {
        user_name: String,
        image: Option<String>,
        callback_url: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLink {
    pub item: NavItem,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidebar {
    pub nav: Vec<MenuLink>,
    pub auth: Vec<MenuLink>,
    pub footer: AuthFooter,
}

pub fn sidebar(pathname: &str, session: &SessionState) -> Sidebar {
    let nav = NAV_ITEMS
        .iter()
        .map(|item| MenuLink {
            item: *item,
            active: is_active(item.href, pathname),
        })
        .collect();
    // Auth links match the path exactly
    let auth = auth_items(session)
        .into_iter()
        .map(|item| MenuLink {
            item,
            active: pathname == item.href,
        })
        .collect();
    let footer = match session {
        SessionState::Loading => AuthFooter::Pending,
        SessionState::Unauthenticated => AuthFooter::SignIn {
            provider_id: SIGN_IN_PROVIDER,
            callback_url: SIGN_IN_CALLBACK,
        },
        SessionState::Authenticated(user) => AuthFooter::SignOut {
            user_name: user.display_name().to_string(),
            image: user.image.clone(),
            callback_url: SIGN_OUT_CALLBACK,
        },
    };
    Sidebar { nav, auth, footer }
}
