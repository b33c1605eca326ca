pub mod app;
pub mod dom;
pub mod platform;

use crate::core::config::Config;
use crate::core::io::WebStore;
use crate::services::auth::{HttpAuthClient, Session};
use crate::services::nav::{self, MenuEvent, NavModel, NavUser, UserMenu};
use leptos::*;
use std::rc::Rc;
use std::sync::Arc;
use wasm_bindgen::JsCast;

pub(crate) fn create_session(config: &Config) -> anyhow::Result<Session> {
    let store = Arc::new(WebStore::new()?);
    let api = Arc::new(HttpAuthClient::new(config));
    Ok(Session::new(store, api))
}

#[component]
pub fn UserNav(session: Rc<Session>) -> impl IntoView {
    let (user, set_user) = create_signal(session.current_user());
    let menu = create_rw_signal(UserMenu::new());

    create_effect(move |_| {
        let model = NavModel::from_user(user.get().as_ref());
        menu.update(|m| m.render(&model));
    });

    let session_for_sync = session.clone();
    spawn_local(async move {
        match session_for_sync.sync_state().await {
            Ok(synced) => set_user.set(synced),
            Err(e) => log::warn!("State sync failed: {}", e),
        }
    });

    let click_handle = window_event_listener(ev::click, move |e| {
        let inside = e
            .target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            .and_then(|el| el.closest("[data-user-nav]").ok().flatten())
            .is_some();
        if !inside {
            menu.update(|m| m.handle(MenuEvent::OutsideClick));
        }
    });
    let key_handle = window_event_listener(ev::keydown, move |e| {
        if e.key() == "Escape" {
            menu.update(|m| m.handle(MenuEvent::Escape));
        }
    });
    on_cleanup(move || {
        click_handle.remove();
        key_handle.remove();
    });

    let on_logout = move |_| {
        let session = session.clone();
        spawn_local(async move {
            if let Err(e) = session.logout().await {
                log::warn!("{}", e);
            }
            set_user.set(None);
        });
    };

    let signed_in = move || user.with(Option::is_some);
    let nav_user = move || user.with(|u| u.as_ref().map(NavUser::from_user));
    let field = move |pick: fn(NavUser) -> String| move || nav_user().map(pick).unwrap_or_default();

    view! {
        <a class="nav-auth-link" href="login.html" style:display=move || if signed_in() { "none" } else { "flex" }>
            "登录/注册"
        </a>
        <button
            class="user-chip"
            style:display=move || if signed_in() { "flex" } else { "none" }
            aria-expanded=move || menu.with(UserMenu::aria_expanded)
            on:click=move |_| menu.update(|m| m.handle(MenuEvent::ChipClick))
        >
            <img class="user-avatar" src=field(|u| u.avatar) alt=field(|u| u.avatar_alt)/>
            <span class="user-name">{field(|u| u.display_name)}</span>
            <span class="user-role">{field(|u| u.role_label)}</span>
        </button>
        <div class="user-dropdown" hidden=move || !menu.with(UserMenu::is_open)>
            <img class="user-avatar" src=field(|u| u.avatar) alt=field(|u| u.avatar_alt)/>
            <div class="user-dropdown-name">{field(|u| u.display_name)}</div>
            <div class="user-dropdown-role">{field(|u| u.role_label)}</div>
            <div class="user-state">{field(|u| u.state_label)}</div>
            <button class="logout-btn" on:click=on_logout>"退出登录"</button>
        </div>
    }
}

/// Replaces every `[data-user-nav]` container with a live [`UserNav`].
pub fn mount_user_nav() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Ok(containers) = document.query_selector_all("[data-user-nav]") else {
        return;
    };
    if containers.length() == 0 {
        return;
    }

    let session = match create_session(&Config::default()) {
        Ok(session) => Rc::new(session),
        Err(e) => {
            log::error!("Failed to open session: {:#}", e);
            return;
        }
    };

    for i in 0..containers.length() {
        let Some(container) = containers
            .item(i)
            .and_then(|n| n.dyn_into::<web_sys::HtmlElement>().ok())
        else {
            continue;
        };
        container.set_inner_html("");
        let session = session.clone();
        mount_to(container, move || view! { <UserNav session=session/> });
    }
}

/// Marks the `.nav-menu` link for the current page.
pub fn highlight_active_nav_link() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(path) = window.location().pathname() else {
        return;
    };
    let Some(links) = window
        .document()
        .and_then(|d| d.query_selector_all(".nav-menu a").ok())
    else {
        return;
    };

    let page = nav::current_page(&path);
    for i in 0..links.length() {
        let Some(link) = links.item(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok()) else {
            continue;
        };
        let href = link.get_attribute("href").unwrap_or_default();
        let _ = if nav::is_active_link(&href, page) {
            link.class_list().add_1("active")
        } else {
            link.class_list().remove_1("active")
        };
    }
}
