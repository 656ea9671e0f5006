//! Tab Navigator
//!
//! Routes open/select/close requests through an [`Executor`], so an action
//! referencing a tab always runs after the action that created it.

use crate::executor::{ExecutionContext, ExecutionReport, Executor, ExecutorHandler};
use crate::services::navigation_tabs::NavigationTabsService;
use async_trait::async_trait;
use beaver_domain::di::{Dependencies, Injectable, Service, Token};
use beaver_domain::error::Result;
use beaver_domain::value_objects::Tab;
use std::sync::Arc;

/// Navigation request
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationAction {
    Open { tab: Tab, select: bool },
    Select { tab_id: String },
    Close { tab_id: String },
}

/// Discriminant of a [`NavigationAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationKind {
    Open,
    Select,
    Close,
}

impl NavigationAction {
    pub fn kind(&self) -> NavigationKind {
        match self {
            Self::Open { .. } => NavigationKind::Open,
            Self::Select { .. } => NavigationKind::Select,
            Self::Close { .. } => NavigationKind::Close,
        }
    }
}

struct NavigateHandler {
    tabs: Arc<NavigationTabsService>,
}

#[async_trait]
impl ExecutorHandler<NavigationAction> for NavigateHandler {
    async fn handle(&self, action: &NavigationAction, _context: &ExecutionContext) -> Result<()> {
        match action {
            NavigationAction::Open { tab, select } => {
                self.tabs.open_tab(tab.clone(), *select).await
            }
            NavigationAction::Select { tab_id } => self.tabs.select_tab(tab_id, false).await,
            NavigationAction::Close { tab_id } => self.tabs.close_tab(tab_id, false).await,
        }
    }
}

pub struct TabNavigator {
    tabs: Arc<NavigationTabsService>,
    executor: Executor<NavigationAction>,
}

impl TabNavigator {
    /// Repeated requests of the kind currently executing are dropped
    pub fn new(tabs: Arc<NavigationTabsService>) -> Self {
        let executor = Executor::<NavigationAction>::new()
            .with_active_comparator(|active, candidate| active.kind() == candidate.kind());
        executor.add_named_handler(
            "navigate",
            Arc::new(NavigateHandler {
                tabs: Arc::clone(&tabs),
            }),
        );

        Self { tabs, executor }
    }

    /// Pipeline used for navigation, for plugins adding their own handlers
    pub fn executor(&self) -> &Executor<NavigationAction> {
        &self.executor
    }

    pub fn tabs(&self) -> &Arc<NavigationTabsService> {
        &self.tabs
    }

    pub async fn open(&self, tab: Tab, select: bool) -> Result<ExecutionReport> {
        self.executor
            .execute(NavigationAction::Open { tab, select })
            .await
    }

    pub async fn select(&self, tab_id: impl Into<String>) -> Result<ExecutionReport> {
        self.executor
            .execute(NavigationAction::Select {
                tab_id: tab_id.into(),
            })
            .await
    }

    pub async fn close(&self, tab_id: impl Into<String>) -> Result<ExecutionReport> {
        self.executor
            .execute(NavigationAction::Close {
                tab_id: tab_id.into(),
            })
            .await
    }
}

impl Service for TabNavigator {}

impl Injectable for TabNavigator {
    fn dependencies() -> Vec<Token> {
        vec![Token::of::<NavigationTabsService>()]
    }

    fn inject(deps: &Dependencies) -> Result<Self> {
        Ok(Self::new(deps.get::<NavigationTabsService>()?))
    }
}
