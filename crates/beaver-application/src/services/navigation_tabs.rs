//! Navigation Tabs Service
//!
//! Open tabs and per-user selection history, both auto-saved. Each tab is
//! owned by a [`TabHandler`] identified by `Tab::handler_id`.
//!
//! Tabs loaded from storage start unrestored; they become visible once their
//! handler accepted them in [`NavigationTabsService::restore_tabs`].

use crate::services::auto_save::{AutoSave, LocalStorageSaveService};
use async_trait::async_trait;
use beaver_domain::constants::{
    ANONYMOUS_USER_ID, NAVIGATION_TABS_BASE_KEY, NAVIGATION_TABS_MAP_KEY,
    TAB_EVENT_CHANNEL_CAPACITY,
};
use beaver_domain::di::{Dependencies, Injectable, Service, Token};
use beaver_domain::error::{Error, Result};
use beaver_domain::ports::Loadable;
use beaver_domain::value_objects::{Tab, TabsState};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

type TabsMap = BTreeMap<String, Tab>;
type UserStates = HashMap<String, TabsState>;

/// Behaviour attached to a kind of tab
#[async_trait]
pub trait TabHandler: Send + Sync {
    /// Matches `Tab::handler_id`
    fn key(&self) -> &str;

    async fn on_select(&self, _tab: &Tab) -> Result<()> {
        Ok(())
    }

    async fn on_close(&self, _tab: &Tab) -> Result<()> {
        Ok(())
    }

    /// `false` drops the tab during restore
    async fn on_restore(&self, _tab: &Tab) -> Result<bool> {
        Ok(true)
    }
}

pub struct NavigationTabsService {
    handlers: RwLock<HashMap<String, Arc<dyn TabHandler>>>,
    tabs: AutoSave<TabsMap>,
    state: AutoSave<UserStates>,
    user_id: RwLock<String>,
    select_sender: broadcast::Sender<Tab>,
    close_sender: broadcast::Sender<Tab>,
}

impl NavigationTabsService {
    pub fn new(save_service: &LocalStorageSaveService) -> Self {
        let (select_sender, _) = broadcast::channel(TAB_EVENT_CHANNEL_CAPACITY);
        let (close_sender, _) = broadcast::channel(TAB_EVENT_CHANNEL_CAPACITY);

        Self {
            handlers: RwLock::new(HashMap::new()),
            tabs: save_service.with_auto_save(NAVIGATION_TABS_MAP_KEY, sanitize_tabs),
            state: save_service.with_auto_save(NAVIGATION_TABS_BASE_KEY, sanitize_states),
            user_id: RwLock::new(ANONYMOUS_USER_ID.to_string()),
            select_sender,
            close_sender,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn current_user(&self) -> String {
        self.user_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_tab_id(&self) -> String {
        self.user_tabs_state().current_id
    }

    /// Restored tabs of the current user
    pub fn tab_id_list(&self) -> Vec<String> {
        self.find_tabs(|_| true).map(|tab| tab.id).collect()
    }

    /// Tabs state of the current user
    pub fn user_tabs_state(&self) -> TabsState {
        let user = self.current_user();
        self.state
            .read(|states| states.get(&user).cloned())
            .unwrap_or_default()
    }

    pub fn get_tab(&self, tab_id: &str) -> Option<Tab> {
        self.tabs.read(|tabs| tabs.get(tab_id).cloned())
    }

    pub fn get_tab_handler(&self, handler_id: &str) -> Option<Arc<dyn TabHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(handler_id)
            .cloned()
    }

    /// Handler state of a tab, if present and of type `S`
    pub fn get_handler_state<S: DeserializeOwned>(&self, tab_id: &str) -> Option<S> {
        let tab = self.get_tab(tab_id)?;
        serde_json::from_value(tab.handler_state).ok()
    }

    /// First restored tab of the current user matching `predicate`
    pub fn find_tab<P>(&self, predicate: P) -> Option<Tab>
    where
        P: FnMut(&Tab) -> bool,
    {
        self.find_tabs(predicate).next()
    }

    /// Restored tabs of the current user matching `predicate`
    ///
    /// Every call yields a fresh iterator over a snapshot of the tabs.
    pub fn find_tabs<P>(&self, mut predicate: P) -> impl Iterator<Item = Tab> + use<P>
    where
        P: FnMut(&Tab) -> bool,
    {
        let user = self.current_user();
        let snapshot: Vec<Tab> = self.tabs.read(|tabs| tabs.values().cloned().collect());

        snapshot
            .into_iter()
            .filter(move |tab| tab.restored && tab.user_id == user && predicate(tab))
    }

    pub fn subscribe_select(&self) -> broadcast::Receiver<Tab> {
        self.select_sender.subscribe()
    }

    pub fn subscribe_close(&self) -> broadcast::Receiver<Tab> {
        self.close_sender.subscribe()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn register_tab_handler(&self, handler: Arc<dyn TabHandler>) {
        let key = handler.key().to_string();
        debug!(handler = %key, "Registering tab handler");
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, handler);
    }

    pub async fn open_tab(&self, tab: Tab, select: bool) -> Result<()> {
        let tab_id = tab.id.clone();
        self.tabs.update(|tabs| tabs.insert(tab_id.clone(), tab));
        self.update_user_state(|state| {
            if !state.tabs.contains(&tab_id) {
                state.tabs.push(tab_id.clone());
            }
        });

        if select {
            self.select_tab(&tab_id, false).await?;
        }
        Ok(())
    }

    /// Select a tab of the current user; an empty id clears the selection
    pub async fn select_tab(&self, tab_id: &str, skip_handlers: bool) -> Result<()> {
        if tab_id.is_empty() {
            self.update_user_state(|state| state.current_id.clear());
            return Ok(());
        }
        if !self.user_has_tab(tab_id) {
            return Ok(());
        }
        let Some(tab) = self.get_tab(tab_id) else {
            return Ok(());
        };

        self.update_user_state(|state| {
            if state.current_id != tab_id {
                state.history.retain(|id| id != tab_id);
                state.history.insert(0, tab_id.to_string());
                state.current_id = tab_id.to_string();
            }
        });

        if !skip_handlers {
            if let Some(handler) = self.get_tab_handler(&tab.handler_id) {
                handler.on_select(&tab).await?;
            }
        }

        let _ = self.select_sender.send(tab);
        Ok(())
    }

    /// Close a tab; when it was selected the previous one from history is selected
    pub async fn close_tab(&self, tab_id: &str, skip_handlers: bool) -> Result<()> {
        if !self.user_has_tab(tab_id) {
            return Ok(());
        }

        if let Some(tab) = self.get_tab(tab_id) {
            if !skip_handlers {
                if let Some(handler) = self.get_tab_handler(&tab.handler_id) {
                    handler.on_close(&tab).await?;
                }
            }
            let _ = self.close_sender.send(tab);
        }

        self.tabs.update(|tabs| tabs.remove(tab_id));
        let next = self.update_user_state(|state| {
            state.history.retain(|id| id != tab_id);
            state.tabs.retain(|id| id != tab_id);
            (state.current_id == tab_id).then(|| {
                if state.history.is_empty() {
                    String::new()
                } else {
                    state.history.remove(0)
                }
            })
        });

        if let Some(next) = next {
            self.select_tab(&next, skip_handlers).await?;
        }
        Ok(())
    }

    pub fn update_handler_state<S: Serialize>(&self, tab_id: &str, handler_state: &S) -> Result<()> {
        let value = serde_json::to_value(handler_state)?;
        let updated = self.tabs.update(|tabs| match tabs.get_mut(tab_id) {
            Some(tab) => {
                tab.handler_state = value;
                true
            }
            None => false,
        });

        if updated {
            Ok(())
        } else {
            Err(Error::not_found(format!("tab {tab_id}")))
        }
    }

    /// Change the signed-in user, unloading foreign tabs and restoring theirs
    pub async fn switch_user(&self, user_id: impl Into<String>) -> Result<()> {
        let user_id = user_id.into();
        info!(user = %user_id, "Switching navigation tabs user");
        *self.user_id.write().unwrap_or_else(PoisonError::into_inner) = user_id;

        self.unload_tabs().await;
        self.restore_tabs().await
    }

    /// Ask handlers to restore the current user's tabs, closing the rejected ones
    pub async fn restore_tabs(&self) -> Result<()> {
        let mut removed = Vec::new();

        for tab_id in self.user_tabs_state().tabs {
            let Some(tab) = self.get_tab(&tab_id) else {
                removed.push(tab_id);
                continue;
            };

            if self.restore_tab(&tab).await {
                self.tabs.update(|tabs| {
                    if let Some(tab) = tabs.get_mut(&tab_id) {
                        tab.restored = true;
                    }
                });
            } else {
                removed.push(tab_id);
            }
        }

        if !removed.is_empty() {
            warn!(count = removed.len(), "Some tabs cannot be restored properly");
        }
        for tab_id in &removed {
            self.close_tab(tab_id, true).await?;
        }

        let current = self.current_tab_id();
        if self.get_tab(&current).is_some() {
            self.select_tab(&current, false).await?;
        }
        Ok(())
    }

    async fn unload_tabs(&self) {
        let user = self.current_user();
        let foreign: Vec<Tab> = self.tabs.read(|tabs| {
            tabs.values()
                .filter(|tab| tab.user_id != user && tab.restored)
                .cloned()
                .collect()
        });

        for tab in foreign {
            if let Some(handler) = self.get_tab_handler(&tab.handler_id) {
                if let Err(err) = handler.on_close(&tab).await {
                    warn!(tab = %tab.id, error = %err, "Tab handler failed to unload tab");
                }
            }
            self.tabs.update(|tabs| {
                if let Some(tab) = tabs.get_mut(&tab.id) {
                    tab.restored = false;
                }
            });
        }
    }

    async fn restore_tab(&self, tab: &Tab) -> bool {
        let Some(handler) = self.get_tab_handler(&tab.handler_id) else {
            return false;
        };

        match handler.on_restore(tab).await {
            Ok(restored) => restored,
            Err(err) => {
                debug!(tab = %tab.id, error = %err, "Tab restore failed");
                false
            }
        }
    }

    fn user_has_tab(&self, tab_id: &str) -> bool {
        self.user_tabs_state().tabs.iter().any(|id| id == tab_id)
    }

    fn update_user_state<R>(&self, f: impl FnOnce(&mut TabsState) -> R) -> R {
        let user = self.current_user();
        self.state.update(|states| f(states.entry(user).or_default()))
    }
}

fn sanitize_tabs(json: Value) -> TabsMap {
    let Value::Object(entries) = json else {
        return TabsMap::new();
    };

    entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<Tab>(value) {
            Ok(mut tab) => {
                tab.restored = false;
                Some((key, tab))
            }
            Err(err) => {
                debug!(tab = %key, error = %err, "Dropping malformed saved tab");
                None
            }
        })
        .collect()
}

fn sanitize_states(json: Value) -> UserStates {
    let Value::Object(entries) = json else {
        return UserStates::new();
    };

    entries
        .into_iter()
        .filter_map(|(user, value)| serde_json::from_value::<TabsState>(value).ok().map(|s| (user, s)))
        .collect()
}

impl Service for NavigationTabsService {
    fn as_loadable(self: Arc<Self>) -> Option<Arc<dyn Loadable>> {
        Some(self)
    }
}

#[async_trait]
impl Loadable for NavigationTabsService {
    async fn load(&self) -> Result<()> {
        self.restore_tabs().await
    }
}

impl Injectable for NavigationTabsService {
    fn dependencies() -> Vec<Token> {
        vec![Token::of::<LocalStorageSaveService>()]
    }

    fn inject(deps: &Dependencies) -> Result<Self> {
        let save_service = deps.get::<LocalStorageSaveService>()?;
        Ok(Self::new(&save_service))
    }
}
