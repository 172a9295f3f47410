//! Per-connection explorer with four tabs. Everything that decides what is on
//! screen lives in [`ExplorerQuery`], which round-trips through the location
//! string so a view can be reopened from a link.

use crate::route::Route;
use linkdeck_api::{
    Comment, Container, Envelope, EnvelopeError, Item, NewComment, NewItem, ResourceClient,
};
use serde_json::Value;
use std::fmt;
use tracing::debug;
use url::form_urlencoded;

pub const MISSING_ITEM_TITLE: &str = "MISSING_ITEM_TITLE";
pub const MISSING_COMMENT_BODY: &str = "MISSING_COMMENT_BODY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExplorerTab {
    #[default]
    Containers,
    Items,
    Item,
    Raw,
}

impl ExplorerTab {
    pub const ALL: [ExplorerTab; 4] = [
        ExplorerTab::Containers,
        ExplorerTab::Items,
        ExplorerTab::Item,
        ExplorerTab::Raw,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExplorerTab::Containers => "containers",
            ExplorerTab::Items => "items",
            ExplorerTab::Item => "item",
            ExplorerTab::Raw => "raw",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.as_str() == value)
    }

    pub fn title(self) -> &'static str {
        match self {
            ExplorerTab::Containers => "Containers",
            ExplorerTab::Items => "Items",
            ExplorerTab::Item => "Item",
            ExplorerTab::Raw => "Raw",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplorerQuery {
    pub tab: ExplorerTab,
    pub item_id: Option<String>,
    pub search: Option<String>,
    pub container_id: Option<String>,
}

impl ExplorerQuery {
    /// Unknown keys are ignored and an unknown tab falls back to the first one.
    pub fn parse(query: &str) -> Self {
        let mut parsed = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "tab" => parsed.tab = ExplorerTab::parse(value).unwrap_or_default(),
                "itemId" => parsed.item_id = Some(value.to_string()),
                "q" => parsed.search = Some(value.to_string()),
                "containerId" => parsed.container_id = Some(value.to_string()),
                _ => {}
            }
        }
        parsed
    }

    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        out.append_pair("tab", self.tab.as_str());
        if let Some(ref item_id) = self.item_id {
            out.append_pair("itemId", item_id);
        }
        if let Some(ref search) = self.search {
            out.append_pair("q", search);
        }
        if let Some(ref container_id) = self.container_id {
            out.append_pair("containerId", container_id);
        }
        out.finish()
    }

    fn items_key(&self) -> ItemsKey {
        ItemsKey {
            container_id: self.container_id.clone(),
            search: self.search.clone(),
        }
    }
}

impl fmt::Display for ExplorerQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// What an item list was requested for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemsKey {
    pub container_id: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Load<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(EnvelopeError),
}

impl<T> Load<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Load::Loading)
    }

    fn needs_fetch(&self) -> bool {
        matches!(self, Load::Idle | Load::Failed(_))
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Load::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Envelope<T>> for Load<T> {
    fn from(envelope: Envelope<T>) -> Self {
        match envelope {
            Envelope::Ok(value) => Load::Loaded(value),
            Envelope::Err(error) => Load::Failed(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerRequest {
    LoadConnection,
    LoadContainers,
    LoadItems(ItemsKey),
    LoadItem { item_id: String },
    LoadComments { item_id: String },
    CreateItem(NewItem),
    AddComment { item_id: String, body: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerEffect {
    pub connection_id: String,
    pub request: ExplorerRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerEvent {
    ConnectionLoaded(Envelope<Value>),
    ContainersLoaded(Envelope<Vec<Container>>),
    ItemsLoaded {
        key: ItemsKey,
        items: Envelope<Vec<Item>>,
    },
    ItemLoaded {
        item_id: String,
        item: Envelope<Item>,
        comments: Envelope<Vec<Comment>>,
    },
    CommentsLoaded {
        item_id: String,
        comments: Envelope<Vec<Comment>>,
    },
    ItemCreated(Envelope<Item>),
    CommentAdded {
        item_id: String,
        comment: Envelope<Comment>,
    },
}

impl ExplorerEvent {
    pub fn reached_backend(&self) -> bool {
        match self {
            ExplorerEvent::ConnectionLoaded(e) => e.reached_backend(),
            ExplorerEvent::ContainersLoaded(e) => e.reached_backend(),
            ExplorerEvent::ItemsLoaded { items, .. } => items.reached_backend(),
            ExplorerEvent::ItemLoaded { item, .. } => item.reached_backend(),
            ExplorerEvent::CommentsLoaded { comments, .. } => comments.reached_backend(),
            ExplorerEvent::ItemCreated(e) => e.reached_backend(),
            ExplorerEvent::CommentAdded { comment, .. } => comment.reached_backend(),
        }
    }
}

impl ExplorerEffect {
    pub async fn run(self, client: &ResourceClient) -> ExplorerEvent {
        let id = self.connection_id.as_str();
        match self.request {
            ExplorerRequest::LoadConnection => {
                ExplorerEvent::ConnectionLoaded(client.get_connection(id).await)
            }
            ExplorerRequest::LoadContainers => {
                ExplorerEvent::ContainersLoaded(client.list_containers(id).await)
            }
            ExplorerRequest::LoadItems(key) => {
                let items = client
                    .list_items(id, key.container_id.as_deref(), key.search.as_deref())
                    .await;
                ExplorerEvent::ItemsLoaded { key, items }
            }
            ExplorerRequest::LoadItem { item_id } => {
                let (item, comments) = tokio::join!(
                    client.get_item(id, &item_id),
                    client.list_comments(id, &item_id)
                );
                ExplorerEvent::ItemLoaded {
                    item_id,
                    item,
                    comments,
                }
            }
            ExplorerRequest::LoadComments { item_id } => {
                let comments = client.list_comments(id, &item_id).await;
                ExplorerEvent::CommentsLoaded { item_id, comments }
            }
            ExplorerRequest::CreateItem(item) => {
                ExplorerEvent::ItemCreated(client.create_item(id, &item).await)
            }
            ExplorerRequest::AddComment { item_id, body } => {
                let comment = client.add_comment(id, &item_id, &NewComment { body }).await;
                ExplorerEvent::CommentAdded { item_id, comment }
            }
        }
    }
}

/// What the item tab shows.
#[derive(Debug)]
pub enum ItemView<'a> {
    Placeholder,
    Loading,
    Failed(&'a EnvelopeError),
    Loaded {
        item: &'a Item,
        comments: &'a Load<Vec<Comment>>,
    },
}

pub struct ExplorerState {
    pub connection_id: String,
    pub query: ExplorerQuery,
    pub connection: Load<Value>,
    pub containers: Load<Vec<Container>>,
    pub items: Load<Vec<Item>>,
    pub item: Load<Item>,
    pub comments: Load<Vec<Comment>>,
    pub cursor: usize,
    pub busy: bool,
    pub notice: Option<String>,
    pub action_error: Option<EnvelopeError>,
    items_key: Option<ItemsKey>,
    item_key: Option<String>,
}

impl ExplorerState {
    pub fn new(connection_id: impl Into<String>, query: ExplorerQuery) -> Self {
        Self {
            connection_id: connection_id.into(),
            query,
            connection: Load::Idle,
            containers: Load::Idle,
            items: Load::Idle,
            item: Load::Idle,
            comments: Load::Idle,
            cursor: 0,
            busy: false,
            notice: None,
            action_error: None,
            items_key: None,
            item_key: None,
        }
    }

    /// A fresh explorer plus whatever the initial tab needs.
    pub fn open(connection_id: impl Into<String>, query: ExplorerQuery) -> (Self, Vec<ExplorerEffect>) {
        let mut state = Self::new(connection_id, query);
        let effects = state.load_current_tab();
        (state, effects)
    }

    pub fn location(&self) -> String {
        Route::Explorer {
            connection_id: self.connection_id.clone(),
            query: self.query.clone(),
        }
        .to_string()
    }

    fn effect(&self, request: ExplorerRequest) -> ExplorerEffect {
        ExplorerEffect {
            connection_id: self.connection_id.clone(),
            request,
        }
    }

    fn fetch_containers(&mut self, force: bool) -> Option<ExplorerEffect> {
        if !force && !self.containers.needs_fetch() {
            return None;
        }
        self.containers = Load::Loading;
        Some(self.effect(ExplorerRequest::LoadContainers))
    }

    fn fetch_items(&mut self, force: bool) -> Option<ExplorerEffect> {
        let key = self.query.items_key();
        if !force && self.items_key.as_ref() == Some(&key) && !self.items.needs_fetch() {
            return None;
        }
        self.items = Load::Loading;
        self.items_key = Some(key.clone());
        Some(self.effect(ExplorerRequest::LoadItems(key)))
    }

    fn fetch_item(&mut self, force: bool) -> Option<ExplorerEffect> {
        let item_id = self.query.item_id.clone()?;
        if !force && self.item_key.as_ref() == Some(&item_id) && !self.item.needs_fetch() {
            return None;
        }
        self.item = Load::Loading;
        self.comments = Load::Loading;
        self.item_key = Some(item_id.clone());
        Some(self.effect(ExplorerRequest::LoadItem { item_id }))
    }

    fn fetch_connection(&mut self, force: bool) -> Option<ExplorerEffect> {
        if !force && !self.connection.needs_fetch() {
            return None;
        }
        self.connection = Load::Loading;
        Some(self.effect(ExplorerRequest::LoadConnection))
    }

    fn load_tab(&mut self, force: bool) -> Vec<ExplorerEffect> {
        match self.query.tab {
            ExplorerTab::Containers => self.fetch_containers(force).into_iter().collect(),
            // The items tab lists containers as filters too.
            ExplorerTab::Items => self
                .fetch_items(force)
                .into_iter()
                .chain(self.fetch_containers(false))
                .collect(),
            ExplorerTab::Item => self.fetch_item(force).into_iter().collect(),
            ExplorerTab::Raw => self.fetch_connection(force).into_iter().collect(),
        }
    }

    pub fn load_current_tab(&mut self) -> Vec<ExplorerEffect> {
        self.load_tab(false)
    }

    pub fn refresh(&mut self) -> Vec<ExplorerEffect> {
        self.load_tab(true)
    }

    pub fn switch_tab(&mut self, tab: ExplorerTab) -> Vec<ExplorerEffect> {
        if tab != ExplorerTab::Item {
            self.query.item_id = None;
        }
        if self.query.tab != tab {
            self.cursor = 0;
        }
        self.query.tab = tab;
        self.load_current_tab()
    }

    pub fn neighbour_tab(&self, delta: isize) -> ExplorerTab {
        let len = ExplorerTab::ALL.len() as isize;
        let idx = (self.query.tab.index() as isize + delta).rem_euclid(len) as usize;
        ExplorerTab::ALL[idx]
    }

    /// Filters the item list by container and shows it.
    pub fn select_container(&mut self, container_id: Option<String>) -> Vec<ExplorerEffect> {
        self.query.container_id = container_id;
        self.switch_tab(ExplorerTab::Items)
    }

    pub fn set_search(&mut self, search: &str) -> Vec<ExplorerEffect> {
        let search = search.trim();
        self.query.search = (!search.is_empty()).then(|| search.to_string());
        if self.query.tab == ExplorerTab::Items {
            self.cursor = 0;
            self.load_current_tab()
        } else {
            Vec::new()
        }
    }

    pub fn open_item(&mut self, item_id: &str) -> Vec<ExplorerEffect> {
        self.query.item_id = Some(item_id.to_string());
        self.query.tab = ExplorerTab::Item;
        self.cursor = 0;
        self.load_current_tab()
    }

    pub fn item_view(&self) -> ItemView<'_> {
        if self.query.item_id.is_none() {
            return ItemView::Placeholder;
        }
        match self.item {
            Load::Idle | Load::Loading => ItemView::Loading,
            Load::Failed(ref error) => ItemView::Failed(error),
            Load::Loaded(ref item) => ItemView::Loaded {
                item,
                comments: &self.comments,
            },
        }
    }

    fn current_len(&self) -> usize {
        match self.query.tab {
            ExplorerTab::Containers => self.containers.loaded().map_or(0, Vec::len),
            ExplorerTab::Items => self.items.loaded().map_or(0, Vec::len),
            ExplorerTab::Item => self.comments.loaded().map_or(0, Vec::len),
            ExplorerTab::Raw => 0,
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.current_len();
        self.cursor = if len == 0 {
            0
        } else {
            self.cursor.saturating_add_signed(delta).min(len - 1)
        };
    }

    /// Enter on the current tab: drill from containers to items to an item.
    pub fn activate(&mut self) -> Vec<ExplorerEffect> {
        match self.query.tab {
            ExplorerTab::Containers => {
                let selected = self
                    .containers
                    .loaded()
                    .and_then(|list| list.get(self.cursor))
                    .map(|c| c.id.clone());
                match selected {
                    Some(id) => self.select_container(Some(id)),
                    None => Vec::new(),
                }
            }
            ExplorerTab::Items => {
                let selected = self
                    .items
                    .loaded()
                    .and_then(|list| list.get(self.cursor))
                    .map(|i| i.id.clone());
                match selected {
                    Some(id) => self.open_item(&id),
                    None => Vec::new(),
                }
            }
            ExplorerTab::Item | ExplorerTab::Raw => Vec::new(),
        }
    }

    pub fn create_item(&mut self, title: &str, body: &str) -> Option<ExplorerEffect> {
        if self.busy {
            return None;
        }
        let title = title.trim();
        if title.is_empty() {
            self.action_error = Some(EnvelopeError::new(MISSING_ITEM_TITLE, "Enter a title"));
            return None;
        }
        let body = body.trim();
        self.busy = true;
        self.notice = None;
        self.action_error = None;
        Some(self.effect(ExplorerRequest::CreateItem(NewItem {
            container_id: self.query.container_id.clone(),
            title: title.to_string(),
            body: (!body.is_empty()).then(|| body.to_string()),
        })))
    }

    pub fn add_comment(&mut self, body: &str) -> Option<ExplorerEffect> {
        if self.busy {
            return None;
        }
        let item_id = self.query.item_id.clone()?;
        let body = body.trim();
        if body.is_empty() {
            self.action_error = Some(EnvelopeError::new(MISSING_COMMENT_BODY, "Write a comment first"));
            return None;
        }
        self.busy = true;
        self.notice = None;
        self.action_error = None;
        Some(self.effect(ExplorerRequest::AddComment {
            item_id,
            body: body.to_string(),
        }))
    }

    /// Responses for a key that is no longer current are dropped.
    pub fn handle(&mut self, event: ExplorerEvent) -> Vec<ExplorerEffect> {
        match event {
            ExplorerEvent::ConnectionLoaded(envelope) => {
                self.connection = envelope.into();
            }
            ExplorerEvent::ContainersLoaded(envelope) => {
                self.containers = envelope.into();
                self.move_cursor(0);
            }
            ExplorerEvent::ItemsLoaded { key, items } => {
                if self.items_key.as_ref() != Some(&key) {
                    debug!(?key, "Dropping stale item list");
                    return Vec::new();
                }
                self.items = items.into();
                self.move_cursor(0);
            }
            ExplorerEvent::ItemLoaded {
                item_id,
                item,
                comments,
            } => {
                if self.item_key.as_deref() != Some(item_id.as_str()) {
                    debug!(%item_id, "Dropping stale item");
                    return Vec::new();
                }
                self.item = item.into();
                self.comments = comments.into();
            }
            ExplorerEvent::CommentsLoaded { item_id, comments } => {
                if self.item_key.as_deref() != Some(item_id.as_str()) {
                    debug!(%item_id, "Dropping stale comments");
                    return Vec::new();
                }
                self.comments = comments.into();
            }
            ExplorerEvent::ItemCreated(envelope) => {
                self.busy = false;
                match envelope {
                    Envelope::Ok(item) => {
                        self.notice = Some(format!("Created {}", item.title));
                        // Invalidate so the next visit refetches as well.
                        self.items = Load::Idle;
                        if self.query.tab == ExplorerTab::Items {
                            return self.fetch_items(true).into_iter().collect();
                        }
                    }
                    Envelope::Err(error) => self.action_error = Some(error),
                }
            }
            ExplorerEvent::CommentAdded { item_id, comment } => {
                self.busy = false;
                match comment {
                    Envelope::Ok(_) => {
                        self.notice = Some("Comment added".to_string());
                        if self.item_key.as_deref() == Some(item_id.as_str()) {
                            return vec![self.effect(ExplorerRequest::LoadComments { item_id })];
                        }
                    }
                    Envelope::Err(error) => self.action_error = Some(error),
                }
            }
        }
        Vec::new()
    }
}
