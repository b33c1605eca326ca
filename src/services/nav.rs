use crate::core::state::StoredUser;

pub const DEFAULT_AVATAR: &str =
    "https://gd-hbimg.huaban.com/a0dcd065b11ba0951ae66436130cc6800671632a8bc0-9IxOal_fw236";

const HOME_PAGES: [&str; 2] = ["index.html", "主页.html"];
const PROCESS_PAGES: [&str; 2] = ["lawsuit-process.html", "诉讼流程.html"];

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

pub fn display_name(user: &StoredUser) -> &str {
    non_empty(&user.nickname)
        .or_else(|| non_empty(&user.display_name))
        .or_else(|| Some(user.username.as_str()).filter(|s| !s.is_empty()))
        .unwrap_or("用户")
}

pub fn role_label(user: &StoredUser) -> &str {
    let raw = non_empty(&user.identity)
        .or_else(|| non_empty(&user.role))
        .or_else(|| non_empty(&user.user_role))
        .unwrap_or("普通用户");
    match raw {
        "owner" => "业主方",
        "property" => "物业方",
        "lawyer" => "律师",
        other => other,
    }
}

pub fn state_label(user: &StoredUser) -> &str {
    non_empty(&user.state).unwrap_or("未知")
}

pub fn avatar_url(user: &StoredUser) -> &str {
    non_empty(&user.avatar).unwrap_or(DEFAULT_AVATAR)
}

/// What the user chip shows for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavUser {
    pub display_name: String,
    pub role_label: String,
    pub state_label: String,
    pub avatar: String,
    pub avatar_alt: String,
}

impl NavUser {
    pub fn from_user(user: &StoredUser) -> Self {
        let name = display_name(user);
        Self {
            display_name: name.to_string(),
            role_label: role_label(user).to_string(),
            state_label: state_label(user).to_string(),
            avatar: avatar_url(user).to_string(),
            avatar_alt: format!("{}头像", name),
        }
    }
}

/// Signed out shows the login/register link, signed in shows the chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavModel {
    SignedOut,
    SignedIn(NavUser),
}

impl NavModel {
    pub fn from_user(user: Option<&StoredUser>) -> Self {
        match user {
            Some(user) => NavModel::SignedIn(NavUser::from_user(user)),
            None => NavModel::SignedOut,
        }
    }

    pub fn shows_auth_link(&self) -> bool {
        matches!(self, NavModel::SignedOut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    ChipClick,
    /// A click inside the nav container but outside the chip.
    InsideClick,
    OutsideClick,
    Escape,
}

/// Open/closed state of one user dropdown.
#[derive(Debug, Default, Clone)]
pub struct UserMenu {
    open: bool,
    chip_visible: bool,
}

impl UserMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-render: the dropdown always starts closed.
    pub fn render(&mut self, model: &NavModel) {
        self.chip_visible = !model.shows_auth_link();
        self.open = false;
    }

    pub fn handle(&mut self, event: MenuEvent) {
        match event {
            MenuEvent::ChipClick if self.chip_visible => self.open = !self.open,
            MenuEvent::ChipClick | MenuEvent::InsideClick => {}
            MenuEvent::OutsideClick | MenuEvent::Escape => self.open = false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Value for the chip's `aria-expanded` attribute.
    pub fn aria_expanded(&self) -> &'static str {
        if self.open {
            "true"
        } else {
            "false"
        }
    }
}

/// Last path segment of a location pathname.
pub fn current_page(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

pub fn is_active_link(href: &str, page: &str) -> bool {
    href == page
        || (page.is_empty() && HOME_PAGES.contains(&href))
        || (page.contains("step") && PROCESS_PAGES.contains(&href))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> StoredUser {
        StoredUser {
            username: "alice".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_display_name_precedence() {
        let mut u = user();
        assert_eq!(display_name(&u), "alice");
        u.display_name = Some("Alice L.".into());
        assert_eq!(display_name(&u), "Alice L.");
        u.nickname = Some("小爱".into());
        assert_eq!(display_name(&u), "小爱");
        assert_eq!(display_name(&StoredUser::default()), "用户");
    }

    #[test]
    fn test_role_label_mapping() {
        let mut u = user();
        assert_eq!(role_label(&u), "普通用户");
        u.user_role = Some("lawyer".into());
        assert_eq!(role_label(&u), "律师");
        u.role = Some("property".into());
        assert_eq!(role_label(&u), "物业方");
        u.identity = Some("owner".into());
        assert_eq!(role_label(&u), "业主方");
        u.identity = Some("管理员".into());
        assert_eq!(role_label(&u), "管理员");
    }

    #[test]
    fn test_nav_user_fallbacks() {
        let nav = NavUser::from_user(&user());
        assert_eq!(nav.state_label, "未知");
        assert_eq!(nav.avatar, DEFAULT_AVATAR);
        assert_eq!(nav.avatar_alt, "alice头像");

        let mut u = user();
        u.state = Some("online".into());
        u.avatar = Some("https://example.com/a.png".into());
        let nav = NavUser::from_user(&u);
        assert_eq!(nav.state_label, "online");
        assert_eq!(nav.avatar, "https://example.com/a.png");
    }

    #[test]
    fn test_menu_toggle_and_close() {
        let mut menu = UserMenu::new();
        menu.render(&NavModel::from_user(Some(&user())));
        assert_eq!(menu.aria_expanded(), "false");

        menu.handle(MenuEvent::ChipClick);
        assert!(menu.is_open());
        assert_eq!(menu.aria_expanded(), "true");

        menu.handle(MenuEvent::InsideClick);
        assert!(menu.is_open());

        menu.handle(MenuEvent::Escape);
        assert!(!menu.is_open());

        menu.handle(MenuEvent::ChipClick);
        menu.handle(MenuEvent::OutsideClick);
        assert!(!menu.is_open());

        menu.handle(MenuEvent::ChipClick);
        menu.handle(MenuEvent::ChipClick);
        assert!(!menu.is_open());
    }

    #[test]
    fn test_signed_out_menu_never_opens() {
        let mut menu = UserMenu::new();
        let model = NavModel::from_user(None);
        assert!(model.shows_auth_link());
        menu.render(&model);
        menu.handle(MenuEvent::ChipClick);
        assert!(!menu.is_open());
    }

    #[test]
    fn test_render_closes_open_menu() {
        let mut menu = UserMenu::new();
        let model = NavModel::from_user(Some(&user()));
        menu.render(&model);
        menu.handle(MenuEvent::ChipClick);
        menu.render(&model);
        assert!(!menu.is_open());
    }

    #[test]
    fn test_active_links() {
        assert_eq!(current_page("/site/主页.html"), "主页.html");
        assert_eq!(current_page("/"), "");

        assert!(is_active_link("login.html", current_page("/login.html")));
        assert!(is_active_link("index.html", ""));
        assert!(is_active_link("主页.html", ""));
        assert!(is_active_link("诉讼流程.html", "step2.html"));
        assert!(is_active_link("lawsuit-process.html", "step1.html"));
        assert!(!is_active_link("index.html", "login.html"));
        assert!(!is_active_link("诉讼流程.html", "login.html"));
    }
}
