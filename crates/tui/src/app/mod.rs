use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDate};
use crossterm::event::{self, Event, KeyEvent};

use crate::{
    aggregate,
    client::{ApiError, Client},
    config::AppConfig,
    error::{AppError, Result},
    import::{ImportPhase, ImportState},
    quick_add,
    session::Session,
    ui,
    ui::keymap::AppAction,
};

use api_types::{
    analytics::{AnalyticsQuery, CategoryTotal, DateTotal},
    auth::Credentials,
    category::{Category, CategoryNew},
    import::BulkImportRequest,
    receipt::Receipt,
    transaction::{
        Transaction, TransactionNew, TransactionPage, TransactionQuery, TransactionType,
    },
};

const SESSION_EXPIRED: &str = "Session expired or unauthorized. Please log in again.";
const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Home,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Transactions,
    Import,
    Receipts,
    Stats,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Self::Transactions => "Transactions",
            Self::Import => "Import",
            Self::Receipts => "Receipts",
            Self::Stats => "Stats",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
    Username,
}

#[derive(Debug)]
pub struct LoginState {
    pub email: String,
    pub password: String,
    pub username: String,
    pub mode: LoginMode,
    pub focus: LoginField,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionsMode {
    List,
    QuickAdd,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterField {
    #[default]
    Start,
    End,
    Kind,
    PerPage,
}

#[derive(Debug, Default)]
pub struct FilterForm {
    pub start: String,
    pub end: String,
    pub kind: Option<TransactionType>,
    pub per_page: String,
    pub focus: FilterField,
    pub error: Option<String>,
}

impl FilterForm {
    fn advance_focus(&mut self) {
        self.focus = match self.focus {
            FilterField::Start => FilterField::End,
            FilterField::End => FilterField::Kind,
            FilterField::Kind => FilterField::PerPage,
            FilterField::PerPage => FilterField::Start,
        };
    }
}

#[derive(Debug)]
pub struct TransactionsState {
    pub items: Vec<Transaction>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub kind: Option<TransactionType>,
    pub selected: usize,
    pub error: Option<String>,
    pub mode: TransactionsMode,
    pub quick_input: String,
    pub quick_error: Option<String>,
    pub filter: FilterForm,
}

impl TransactionsState {
    fn new(per_page: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: per_page.max(1),
            start_date: None,
            end_date: None,
            kind: None,
            selected: 0,
            error: None,
            mode: TransactionsMode::List,
            quick_input: String::new(),
            quick_error: None,
            filter: FilterForm::default(),
        }
    }

    /// Takes over a fetched page. Whatever the server echoes for `page` and
    /// `per_page` wins over what was requested; when the echo is absent the
    /// requested values stand.
    fn adopt_page(&mut self, requested_page: u32, requested_per_page: u32, page: TransactionPage) {
        self.total = page.total.unwrap_or(page.items.len() as u64);
        self.page = page.page.unwrap_or(requested_page);
        self.per_page = page.per_page.unwrap_or(requested_per_page).max(1);
        self.items = page.items;
        self.selected = 0;
        self.error = None;
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) * u64::from(self.per_page) < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn page_count(&self) -> u64 {
        self.total.div_ceil(u64::from(self.per_page)).max(1)
    }

    fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.items.len() - 1);
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

/// Where the stats series currently come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSource {
    Server,
    /// Aggregated locally from the loaded transaction page because the
    /// analytics endpoints failed.
    PageFallback,
}

#[derive(Debug)]
pub struct StatsState {
    pub by_category: Vec<CategoryTotal>,
    pub by_date: Vec<DateTotal>,
    /// Provenance is tracked per series; one endpoint going down must not
    /// degrade the other series.
    pub category_source: SeriesSource,
    pub date_source: SeriesSource,
    pub error: Option<String>,
}

impl Default for StatsState {
    fn default() -> Self {
        Self {
            by_category: Vec::new(),
            by_date: Vec::new(),
            category_source: SeriesSource::Server,
            date_source: SeriesSource::Server,
            error: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ReceiptsState {
    pub items: Vec<Receipt>,
    pub selected: usize,
    pub path_input: String,
    pub editing_path: bool,
    pub loaded: bool,
    pub error: Option<String>,
}

impl ReceiptsState {
    fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.items.len() - 1);
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    shown_at: Instant,
}

impl ToastState {
    fn new(message: &str, level: ToastLevel) -> Self {
        Self {
            message: message.to_string(),
            level,
            shown_at: Instant::now(),
        }
    }

    fn expired(&self) -> bool {
        self.shown_at.elapsed() > TOAST_TTL
    }
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub login: LoginState,
    pub section: Section,
    pub transactions: TransactionsState,
    pub import: ImportState,
    pub receipts: ReceiptsState,
    pub stats: StatsState,
    pub categories: Vec<Category>,
    pub currency: String,
    pub base_url: String,
    pub last_refresh: Option<DateTime<Local>>,
    pub connection_ok: bool,
    pub toast: Option<ToastState>,
}

pub struct App {
    config: AppConfig,
    client: Client,
    session: Session,
    pub state: AppState,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::new(&config.base_url)?;
        let session = Session::open(&config.session_path)?;
        let state = AppState {
            screen: Screen::Login,
            login: LoginState {
                email: config.email.clone(),
                password: String::new(),
                username: String::new(),
                mode: LoginMode::Login,
                focus: LoginField::Email,
                message: None,
            },
            section: Section::Transactions,
            transactions: TransactionsState::new(config.per_page),
            import: ImportState::default(),
            receipts: ReceiptsState::default(),
            stats: StatsState::default(),
            categories: Vec::new(),
            currency: config.currency.clone(),
            base_url: config.base_url.clone(),
            last_refresh: None,
            connection_ok: true,
            toast: None,
        };

        Ok(Self {
            config,
            client,
            session,
            state,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.bootstrap().await?;
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    /// Validates a stored token against the API before showing any screen.
    /// An auth failure drops the token; any other failure keeps it, since a
    /// broken server says nothing about the credentials.
    async fn bootstrap(&mut self) -> Result<()> {
        if self.session.token().is_none() {
            return Ok(());
        }
        let auth = self.session.bearer();
        match self.client.categories(auth.as_deref()).await {
            Ok(categories) => {
                self.state.categories = categories;
                self.enter_home().await?;
            }
            Err(err) if err.is_auth_failure() => self.expire_session(),
            Err(err) => {
                tracing::debug!("startup check failed: {err}");
                self.state.login.message = Some(err.detail());
            }
        }
        Ok(())
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);

        while !self.should_quit {
            if self.state.toast.as_ref().is_some_and(ToastState::expired) {
                self.state.toast = None;
            }

            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key).await?,
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }

        Ok(())
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let action = crate::ui::keymap::map_key(key);
        if action == AppAction::Quit {
            self.should_quit = true;
            return Ok(());
        }
        match self.state.screen {
            Screen::Login => self.handle_login_key(action).await?,
            Screen::Home => self.handle_home_key(action).await?,
        }
        Ok(())
    }

    async fn handle_login_key(&mut self, action: AppAction) -> Result<()> {
        match action {
            AppAction::NextField => self.advance_login_focus(),
            AppAction::Submit => self.attempt_login().await?,
            AppAction::Backspace => {
                self.active_login_field_mut().pop();
            }
            AppAction::ToggleRegister => self.toggle_login_mode(),
            AppAction::Cancel => self.state.login.message = None,
            AppAction::Input(ch) => self.active_login_field_mut().push(ch),
            _ => {}
        }
        Ok(())
    }

    fn advance_login_focus(&mut self) {
        let login = &mut self.state.login;
        login.focus = match (login.mode, login.focus) {
            (_, LoginField::Email) => LoginField::Password,
            (LoginMode::Login, LoginField::Password) => LoginField::Email,
            (LoginMode::Register, LoginField::Password) => LoginField::Username,
            (_, LoginField::Username) => LoginField::Email,
        };
    }

    fn toggle_login_mode(&mut self) {
        let login = &mut self.state.login;
        login.mode = match login.mode {
            LoginMode::Login => LoginMode::Register,
            LoginMode::Register => LoginMode::Login,
        };
        if login.mode == LoginMode::Login && login.focus == LoginField::Username {
            login.focus = LoginField::Email;
        }
        login.message = None;
    }

    fn active_login_field_mut(&mut self) -> &mut String {
        match self.state.login.focus {
            LoginField::Email => &mut self.state.login.email,
            LoginField::Password => &mut self.state.login.password,
            LoginField::Username => &mut self.state.login.username,
        }
    }

    async fn attempt_login(&mut self) -> Result<()> {
        let email = self.state.login.email.trim().to_string();
        let password = self.state.login.password.trim().to_string();

        if email.is_empty() || password.is_empty() {
            self.state.login.message = Some("Fill in all fields.".to_string());
            return Ok(());
        }

        let username = self.state.login.username.trim();
        let credentials = Credentials {
            email,
            password,
            username: (self.state.login.mode == LoginMode::Register && !username.is_empty())
                .then(|| username.to_string()),
        };
        // Both endpoints answer with a token grant, so a fresh registration
        // goes straight to the main screen like a login.
        let result = match self.state.login.mode {
            LoginMode::Login => self.client.login(&credentials).await,
            LoginMode::Register => self.client.register(&credentials).await,
        };
        match result {
            Ok(token) => {
                if let Err(err) = self.session.store_token(&token.access_token) {
                    tracing::warn!("failed to persist session: {err}");
                }
                self.state.login.password.clear();
                self.state.login.message = None;
                self.refresh_categories().await?;
                self.enter_home().await?;
            }
            Err(err) => self.state.login.message = Some(err.detail()),
        }

        Ok(())
    }

    async fn enter_home(&mut self) -> Result<()> {
        self.state.screen = Screen::Home;
        self.state.section = Section::Transactions;
        self.load_transactions(true).await?;
        self.fetch_analytics().await?;
        Ok(())
    }

    /// Drops the stored token and sends the user back to the login screen
    /// with everything cleared.
    fn expire_session(&mut self) {
        self.reset_to_login(SESSION_EXPIRED);
    }

    fn log_out(&mut self) {
        self.reset_to_login("Logged out.");
    }

    fn reset_to_login(&mut self, message: &str) {
        if let Err(err) = self.session.forget_token() {
            tracing::warn!("failed to clear session: {err}");
        }
        self.state.screen = Screen::Login;
        self.state.section = Section::Transactions;
        self.state.login.password.clear();
        self.state.login.focus = LoginField::Email;
        self.state.login.message = Some(message.to_string());
        self.state.transactions = TransactionsState::new(self.config.per_page);
        self.state.import = ImportState::default();
        self.state.receipts = ReceiptsState::default();
        self.state.stats = StatsState::default();
        self.state.categories.clear();
        self.state.toast = None;
    }

    async fn handle_home_key(&mut self, action: AppAction) -> Result<()> {
        if self.state.section == Section::Transactions {
            match self.state.transactions.mode {
                TransactionsMode::QuickAdd => return self.handle_quick_add_key(action).await,
                TransactionsMode::Filter => return self.handle_filter_key(action).await,
                TransactionsMode::List => {}
            }
        }
        if self.state.section == Section::Import && self.state.import.editing_path {
            return self.handle_import_path_key(action).await;
        }
        if self.state.section == Section::Receipts && self.state.receipts.editing_path {
            return self.handle_receipt_path_key(action).await;
        }

        match action {
            AppAction::Up => self.select_prev_in_section(),
            AppAction::Down => self.select_next_in_section(),
            AppAction::Submit => {
                if self.state.section == Section::Import
                    && self.state.import.phase == ImportPhase::Staged
                {
                    self.run_import().await?;
                }
            }
            AppAction::Cancel => {
                if self.state.section == Section::Import {
                    self.state.import.reset();
                }
            }
            AppAction::Input(ch) => self.handle_section_key(ch).await?,
            _ => {}
        }

        Ok(())
    }

    fn select_next_in_section(&mut self) {
        match self.state.section {
            Section::Transactions => self.state.transactions.select_next(),
            Section::Import => self.state.import.select_next(),
            Section::Receipts => self.state.receipts.select_next(),
            Section::Stats => {}
        }
    }

    fn select_prev_in_section(&mut self) {
        match self.state.section {
            Section::Transactions => self.state.transactions.select_prev(),
            Section::Import => self.state.import.select_prev(),
            Section::Receipts => self.state.receipts.select_prev(),
            Section::Stats => {}
        }
    }

    async fn handle_section_key(&mut self, ch: char) -> Result<()> {
        match ch {
            'q' | 'Q' => {
                self.should_quit = true;
            }
            't' | 'T' => {
                self.state.section = Section::Transactions;
            }
            'i' | 'I' => {
                self.state.section = Section::Import;
            }
            'c' | 'C' => {
                self.enter_receipts().await?;
            }
            's' | 'S' => {
                self.state.section = Section::Stats;
            }
            'r' | 'R' => {
                self.refresh_section().await?;
            }
            'j' | 'J' => self.select_next_in_section(),
            'k' | 'K' => self.select_prev_in_section(),
            'n' | 'N' => {
                if self.state.section == Section::Transactions {
                    self.next_page().await?;
                }
            }
            'p' | 'P' => {
                if self.state.section == Section::Transactions {
                    self.prev_page().await?;
                }
            }
            'a' | 'A' => match self.state.section {
                Section::Transactions => {
                    self.state.transactions.mode = TransactionsMode::QuickAdd;
                    self.state.transactions.quick_error = None;
                }
                Section::Import => self.state.import.select_all(),
                _ => {}
            },
            'f' | 'F' => {
                if self.state.section == Section::Transactions {
                    self.enter_filter_mode();
                }
            }
            'x' | 'X' => match self.state.section {
                Section::Transactions => self.clear_filters().await?,
                Section::Import => self.state.import.clear_selection(),
                _ => {}
            },
            ' ' => {
                if self.state.section == Section::Import {
                    self.state.import.toggle_current();
                }
            }
            'o' | 'O' => match self.state.section {
                Section::Import => {
                    if !self.state.import.busy() {
                        self.state.import.editing_path = true;
                        self.state.import.message = None;
                    }
                }
                Section::Receipts => {
                    self.state.receipts.editing_path = true;
                    self.state.receipts.error = None;
                }
                _ => {}
            },
            'l' | 'L' => self.log_out(),
            _ => {}
        }
        Ok(())
    }

    async fn refresh_section(&mut self) -> Result<()> {
        match self.state.section {
            Section::Transactions => {
                self.load_transactions(true).await?;
                self.fetch_analytics().await?;
            }
            Section::Stats => self.fetch_analytics().await?,
            Section::Receipts => self.load_receipts().await?,
            Section::Import => {}
        }
        Ok(())
    }

    async fn enter_receipts(&mut self) -> Result<()> {
        self.state.section = Section::Receipts;
        if !self.state.receipts.loaded {
            self.load_receipts().await?;
        }
        Ok(())
    }

    async fn next_page(&mut self) -> Result<()> {
        if self.state.transactions.has_next() {
            self.state.transactions.page += 1;
            self.load_transactions(false).await?;
        }
        Ok(())
    }

    async fn prev_page(&mut self) -> Result<()> {
        if self.state.transactions.has_prev() {
            self.state.transactions.page -= 1;
            self.load_transactions(false).await?;
        }
        Ok(())
    }

    async fn load_transactions(&mut self, reset: bool) -> Result<()> {
        if reset {
            self.state.transactions.page = 1;
        }
        let query = TransactionQuery {
            page: self.state.transactions.page,
            per_page: self.state.transactions.per_page,
            start_date: self.state.transactions.start_date,
            end_date: self.state.transactions.end_date,
            kind: self.state.transactions.kind,
        };
        tracing::debug!("loading transactions page {}", query.page);

        let auth = self.session.bearer();
        match self.client.transactions(auth.as_deref(), &query).await {
            Ok(page) => {
                self.state
                    .transactions
                    .adopt_page(query.page, query.per_page, page);
                self.state.connection_ok = true;
                self.state.last_refresh = Some(Local::now());
                self.recompute_fallback();
            }
            Err(err) if err.is_auth_failure() => self.expire_session(),
            Err(err) => {
                let tx = &mut self.state.transactions;
                tx.error = Some(err.detail());
                tx.items.clear();
                tx.total = 0;
                tx.selected = 0;
                self.state.connection_ok = false;
                self.recompute_fallback();
            }
        }
        Ok(())
    }

    /// Fetches the two analytics series independently; a series whose call
    /// fails drops to local aggregates of the loaded page while the other
    /// keeps its server data.
    async fn fetch_analytics(&mut self) -> Result<()> {
        let query = AnalyticsQuery {
            start_date: self.state.transactions.start_date,
            end_date: self.state.transactions.end_date,
        };
        let auth = self.session.bearer();
        let by_category = self
            .client
            .analytics_by_category(auth.as_deref(), &query)
            .await;
        let by_date = self.client.analytics_by_date(auth.as_deref(), &query).await;

        if by_category.as_ref().err().is_some_and(ApiError::is_auth_failure)
            || by_date.as_ref().err().is_some_and(ApiError::is_auth_failure)
        {
            self.expire_session();
            return Ok(());
        }
        self.apply_analytics(
            by_category.map_err(|err| err.detail()),
            by_date.map_err(|err| err.detail()),
        );
        Ok(())
    }

    /// Takes over the per-series outcomes. A failed series is flagged and
    /// replaced by page aggregates; a successful one adopts the server rows.
    fn apply_analytics(
        &mut self,
        by_category: std::result::Result<Vec<CategoryTotal>, String>,
        by_date: std::result::Result<Vec<DateTotal>, String>,
    ) {
        let stats = &mut self.state.stats;
        stats.error = None;
        match by_category {
            Ok(rows) => {
                stats.by_category = rows;
                stats.category_source = SeriesSource::Server;
            }
            Err(detail) => {
                tracing::debug!("by_category failed, aggregating the loaded page: {detail}");
                stats.error = Some(detail);
                stats.category_source = SeriesSource::PageFallback;
            }
        }
        match by_date {
            Ok(rows) => {
                stats.by_date = rows;
                stats.date_source = SeriesSource::Server;
            }
            Err(detail) => {
                tracing::debug!("by_date failed, aggregating the loaded page: {detail}");
                stats.error = Some(detail);
                stats.date_source = SeriesSource::PageFallback;
            }
        }
        self.recompute_fallback();
    }

    /// Recomputes whichever series is in fallback mode from the loaded page.
    fn recompute_fallback(&mut self) {
        if self.state.stats.category_source == SeriesSource::PageFallback {
            self.state.stats.by_category = aggregate::by_category(&self.state.transactions.items);
        }
        if self.state.stats.date_source == SeriesSource::PageFallback {
            self.state.stats.by_date = aggregate::by_date(&self.state.transactions.items);
        }
    }

    async fn refresh_categories(&mut self) -> Result<()> {
        let auth = self.session.bearer();
        match self.client.categories(auth.as_deref()).await {
            Ok(categories) => self.state.categories = categories,
            Err(err) if err.is_auth_failure() => self.expire_session(),
            Err(err) => tracing::debug!("failed to load categories: {err}"),
        }
        Ok(())
    }

    async fn handle_quick_add_key(&mut self, action: AppAction) -> Result<()> {
        match action {
            AppAction::Cancel => {
                self.state.transactions.mode = TransactionsMode::List;
                self.state.transactions.quick_input.clear();
                self.state.transactions.quick_error = None;
            }
            AppAction::Submit => self.submit_quick_add().await?,
            AppAction::Backspace => {
                self.state.transactions.quick_input.pop();
            }
            AppAction::Input(ch) => self.state.transactions.quick_input.push(ch),
            _ => {}
        }
        Ok(())
    }

    async fn submit_quick_add(&mut self) -> Result<()> {
        let draft = match quick_add::parse(&self.state.transactions.quick_input) {
            Ok(draft) => draft,
            Err(err) => {
                self.state.transactions.quick_error = Some(err.to_string());
                return Ok(());
            }
        };

        let category_id = match draft.category.as_deref() {
            Some(name) => self.ensure_category_id(name).await,
            None => None,
        };
        let payload = TransactionNew {
            kind: draft.kind,
            amount: draft.amount,
            currency: self.state.currency.clone(),
            date: draft.date.unwrap_or_else(|| Local::now().date_naive()),
            description: draft.description.clone(),
            category_id,
        };

        let auth = self.session.bearer();
        match self.client.create_transaction(auth.as_deref(), &payload).await {
            Ok(_) => {
                self.state.transactions.mode = TransactionsMode::List;
                self.state.transactions.quick_input.clear();
                self.state.transactions.quick_error = None;
                self.show_toast("Transaction added", ToastLevel::Success);
                self.load_transactions(true).await?;
                self.fetch_analytics().await?;
            }
            Err(err) if err.is_auth_failure() => self.expire_session(),
            Err(err) => self.state.transactions.quick_error = Some(err.detail()),
        }
        Ok(())
    }

    /// Resolves a category name to an id: case-insensitive match against the
    /// loaded categories first, otherwise create it. Failures fall back to
    /// no category rather than blocking the transaction.
    async fn ensure_category_id(&mut self, name: &str) -> Option<i64> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(existing) = find_category(&self.state.categories, name) {
            return Some(existing.id);
        }

        let auth = self.session.bearer();
        let payload = CategoryNew {
            name: name.to_string(),
        };
        match self.client.create_category(auth.as_deref(), &payload).await {
            Ok(category) => {
                let id = category.id;
                self.state.categories.push(category);
                Some(id)
            }
            Err(err) => {
                tracing::debug!("category create failed: {err}");
                None
            }
        }
    }

    fn enter_filter_mode(&mut self) {
        let transactions = &mut self.state.transactions;
        transactions.filter.start = transactions
            .start_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        transactions.filter.end = transactions
            .end_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        transactions.filter.kind = transactions.kind;
        transactions.filter.per_page = transactions.per_page.to_string();
        transactions.filter.focus = FilterField::Start;
        transactions.filter.error = None;
        transactions.mode = TransactionsMode::Filter;
    }

    async fn handle_filter_key(&mut self, action: AppAction) -> Result<()> {
        match action {
            AppAction::Cancel => {
                self.state.transactions.mode = TransactionsMode::List;
                self.state.transactions.filter.error = None;
            }
            AppAction::NextField => self.state.transactions.filter.advance_focus(),
            AppAction::Submit => self.apply_filters().await?,
            AppAction::Up | AppAction::Down => {
                if self.state.transactions.filter.focus == FilterField::Kind {
                    let filter = &mut self.state.transactions.filter;
                    filter.kind = cycle_kind(filter.kind);
                }
            }
            AppAction::Backspace => {
                let filter = &mut self.state.transactions.filter;
                match filter.focus {
                    FilterField::Start => {
                        filter.start.pop();
                    }
                    FilterField::End => {
                        filter.end.pop();
                    }
                    FilterField::Kind => filter.kind = None,
                    FilterField::PerPage => {
                        filter.per_page.pop();
                    }
                }
            }
            AppAction::Input(ch) => {
                let filter = &mut self.state.transactions.filter;
                match filter.focus {
                    FilterField::Start => filter.start.push(ch),
                    FilterField::End => filter.end.push(ch),
                    FilterField::Kind => {
                        if ch == ' ' {
                            filter.kind = cycle_kind(filter.kind);
                        }
                    }
                    FilterField::PerPage => filter.per_page.push(ch),
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn apply_filters(&mut self) -> Result<()> {
        let start = match parse_filter_date(&self.state.transactions.filter.start) {
            Ok(date) => date,
            Err(message) => {
                self.state.transactions.filter.error = Some(message);
                return Ok(());
            }
        };
        let end = match parse_filter_date(&self.state.transactions.filter.end) {
            Ok(date) => date,
            Err(message) => {
                self.state.transactions.filter.error = Some(message);
                return Ok(());
            }
        };
        let per_page = match parse_per_page(&self.state.transactions.filter.per_page) {
            Ok(value) => value,
            Err(message) => {
                self.state.transactions.filter.error = Some(message);
                return Ok(());
            }
        };

        let transactions = &mut self.state.transactions;
        transactions.start_date = start;
        transactions.end_date = end;
        transactions.kind = transactions.filter.kind;
        transactions.per_page = per_page;
        transactions.filter.error = None;
        transactions.mode = TransactionsMode::List;

        self.load_transactions(true).await?;
        self.fetch_analytics().await?;
        Ok(())
    }

    async fn clear_filters(&mut self) -> Result<()> {
        let default_per_page = self.config.per_page.max(1);
        let transactions = &mut self.state.transactions;
        let had_filters = transactions.start_date.is_some()
            || transactions.end_date.is_some()
            || transactions.kind.is_some()
            || transactions.per_page != default_per_page;
        transactions.start_date = None;
        transactions.end_date = None;
        transactions.kind = None;
        transactions.per_page = default_per_page;
        transactions.filter = FilterForm::default();
        if had_filters {
            self.show_toast("Filters cleared", ToastLevel::Info);
            self.load_transactions(true).await?;
            self.fetch_analytics().await?;
        }
        Ok(())
    }

    async fn handle_import_path_key(&mut self, action: AppAction) -> Result<()> {
        match action {
            AppAction::Cancel => {
                self.state.import.editing_path = false;
            }
            AppAction::Submit => self.run_parse().await?,
            AppAction::Backspace => {
                self.state.import.path_input.pop();
            }
            AppAction::Input(ch) => self.state.import.path_input.push(ch),
            _ => {}
        }
        Ok(())
    }

    async fn run_parse(&mut self) -> Result<()> {
        let path = self.state.import.path_input.trim().to_string();
        if path.is_empty() {
            self.state.import.message = Some("Please select a PDF file first".to_string());
            return Ok(());
        }
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.state.import.message = Some(format!("Cannot read {path}: {err}"));
                return Ok(());
            }
        };
        if !self.state.import.begin_parse() {
            return Ok(());
        }
        self.state.import.editing_path = false;

        let file_name = file_name_of(&path);
        let auth = self.session.bearer();
        tracing::debug!("uploading {file_name} for parsing");
        match self.client.upload_pdf(auth.as_deref(), &file_name, bytes).await {
            Err(err) if err.is_auth_failure() => self.expire_session(),
            result => self
                .state
                .import
                .finish_parse(result.map_err(|err| err.detail())),
        }
        Ok(())
    }

    async fn run_import(&mut self) -> Result<()> {
        let Some(rows) = self.state.import.start_import() else {
            return Ok(());
        };

        let auth = self.session.bearer();
        let payload = BulkImportRequest { rows };
        match self.client.bulk_import(auth.as_deref(), &payload).await {
            Err(err) if err.is_auth_failure() => self.expire_session(),
            result => {
                self.state
                    .import
                    .finish_import(result.map_err(|err| err.detail()));
                if self.state.import.take_refresh_request() {
                    if let Some(message) = self.state.import.message.clone() {
                        self.show_toast(&message, ToastLevel::Success);
                    }
                    self.load_transactions(true).await?;
                    self.fetch_analytics().await?;
                }
            }
        }
        Ok(())
    }

    async fn handle_receipt_path_key(&mut self, action: AppAction) -> Result<()> {
        match action {
            AppAction::Cancel => {
                self.state.receipts.editing_path = false;
            }
            AppAction::Submit => self.run_receipt_upload().await?,
            AppAction::Backspace => {
                self.state.receipts.path_input.pop();
            }
            AppAction::Input(ch) => self.state.receipts.path_input.push(ch),
            _ => {}
        }
        Ok(())
    }

    async fn run_receipt_upload(&mut self) -> Result<()> {
        let path = self.state.receipts.path_input.trim().to_string();
        if path.is_empty() {
            self.state.receipts.error = Some("Enter a file path first".to_string());
            return Ok(());
        }
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.state.receipts.error = Some(format!("Cannot read {path}: {err}"));
                return Ok(());
            }
        };

        let file_name = file_name_of(&path);
        let auth = self.session.bearer();
        match self
            .client
            .upload_receipt(auth.as_deref(), &file_name, bytes)
            .await
        {
            Ok(_) => {
                self.state.receipts.editing_path = false;
                self.state.receipts.path_input.clear();
                self.state.receipts.error = None;
                self.show_toast("Receipt uploaded", ToastLevel::Success);
                self.load_receipts().await?;
            }
            Err(err) if err.is_auth_failure() => self.expire_session(),
            Err(err) => {
                // The header shows the path editor while it is open, so a
                // plain error line would stay hidden until Esc.
                let detail = err.detail();
                self.state.receipts.error = Some(detail.clone());
                self.show_toast(&detail, ToastLevel::Error);
            }
        }
        Ok(())
    }

    async fn load_receipts(&mut self) -> Result<()> {
        let auth = self.session.bearer();
        match self.client.receipts(auth.as_deref()).await {
            Ok(items) => {
                self.state.receipts.items = items;
                self.state.receipts.selected = 0;
                self.state.receipts.loaded = true;
                self.state.receipts.error = None;
            }
            Err(err) if err.is_auth_failure() => self.expire_session(),
            Err(err) => self.state.receipts.error = Some(err.detail()),
        }
        Ok(())
    }

    fn show_toast(&mut self, message: &str, level: ToastLevel) {
        self.state.toast = Some(ToastState::new(message, level));
    }
}

fn cycle_kind(kind: Option<TransactionType>) -> Option<TransactionType> {
    match kind {
        None => Some(TransactionType::Expense),
        Some(TransactionType::Expense) => Some(TransactionType::Income),
        Some(TransactionType::Income) => None,
    }
}

fn find_category<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    categories
        .iter()
        .find(|category| category.name.eq_ignore_ascii_case(name))
}

fn parse_filter_date(input: &str) -> std::result::Result<Option<NaiveDate>, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| format!("Invalid date {trimmed}, expected YYYY-MM-DD"))
}

/// The service accepts page sizes of 1..=200; out-of-range values are
/// clamped here instead of bouncing off its validation.
fn parse_per_page(input: &str) -> std::result::Result<u32, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Page size is required".to_string());
    }
    trimmed
        .parse::<u32>()
        .map(|value| value.clamp(1, 200))
        .map_err(|_| format!("Invalid page size {trimmed}, expected a number"))
}

fn file_name_of(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn test_app(base_url: &str, tag: &str) -> App {
        let session_path = std::env::temp_dir()
            .join(format!("paisa-tui-{tag}-{}.json", std::process::id()))
            .to_string_lossy()
            .into_owned();
        let _ = std::fs::remove_file(&session_path);
        let config = AppConfig {
            base_url: base_url.to_string(),
            session_path,
            ..AppConfig::default()
        };
        App::new(config).unwrap()
    }

    /// Minimal HTTP/1.1 responder; each route is a path prefix with a canned
    /// status and JSON body.
    async fn spawn_stub(routes: Vec<(&'static str, u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(answer(socket, routes.clone()));
            }
        });
        format!("http://{addr}/")
    }

    async fn answer(mut socket: TcpStream, routes: Vec<(&'static str, u16, &'static str)>) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let Ok(n) = socket.read(&mut chunk).await else {
                return;
            };
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let body_len = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.trim()
                    .eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < header_end + body_len {
            let Ok(n) = socket.read(&mut chunk).await else {
                return;
            };
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let path = head.split_whitespace().nth(1).unwrap_or("/");
        let (status, body) = routes
            .iter()
            .find(|(route, _, _)| path.starts_with(route))
            .map_or((404, r#"{"detail":"not found"}"#), |(_, status, body)| {
                (*status, *body)
            });
        let reason = if status < 400 { "OK" } else { "ERR" };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }

    fn page(
        items: usize,
        total: Option<u64>,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> TransactionPage {
        let items = (0..items)
            .map(|i| Transaction {
                id: i as i64,
                kind: TransactionType::Expense,
                amount: 1.0,
                currency: None,
                date: None,
                description: None,
                category_id: None,
                category: None,
                created_at: None,
            })
            .collect();
        TransactionPage {
            items,
            total,
            page,
            per_page,
        }
    }

    #[test]
    fn server_echo_wins_over_the_request() {
        let mut state = TransactionsState::new(25);
        state.adopt_page(3, 500, page(10, Some(1000), Some(3), Some(200)));
        assert_eq!(state.page, 3);
        assert_eq!(state.per_page, 200);
        assert_eq!(state.total, 1000);
    }

    #[test]
    fn missing_echo_keeps_the_requested_values() {
        let mut state = TransactionsState::new(25);
        state.adopt_page(2, 25, page(5, Some(30), None, None));
        assert_eq!(state.page, 2);
        assert_eq!(state.per_page, 25);
    }

    #[test]
    fn missing_total_falls_back_to_item_count() {
        let mut state = TransactionsState::new(25);
        state.adopt_page(1, 25, page(7, None, Some(1), Some(25)));
        assert_eq!(state.total, 7);
    }

    #[test]
    fn selection_resets_on_adoption() {
        let mut state = TransactionsState::new(25);
        state.adopt_page(1, 25, page(10, Some(10), Some(1), Some(25)));
        state.selected = 9;
        state.adopt_page(2, 25, page(3, Some(13), Some(2), Some(25)));
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn paging_bounds_follow_total() {
        let mut state = TransactionsState::new(25);
        state.adopt_page(1, 25, page(25, Some(60), Some(1), Some(25)));
        assert!(state.has_next());
        assert!(!state.has_prev());
        assert_eq!(state.page_count(), 3);

        state.adopt_page(3, 25, page(10, Some(60), Some(3), Some(25)));
        assert!(!state.has_next());
        assert!(state.has_prev());
    }

    #[test]
    fn zero_per_page_echo_is_clamped() {
        let mut state = TransactionsState::new(25);
        state.adopt_page(1, 25, page(0, Some(0), Some(1), Some(0)));
        assert_eq!(state.per_page, 1);
        assert_eq!(state.page_count(), 1);
    }

    #[test]
    fn kind_filter_cycles_through_all_states() {
        let mut kind = None;
        kind = cycle_kind(kind);
        assert_eq!(kind, Some(TransactionType::Expense));
        kind = cycle_kind(kind);
        assert_eq!(kind, Some(TransactionType::Income));
        kind = cycle_kind(kind);
        assert_eq!(kind, None);
    }

    #[test]
    fn filter_dates_parse_or_reject() {
        assert_eq!(parse_filter_date("  "), Ok(None));
        assert_eq!(
            parse_filter_date("2024-03-05"),
            Ok(Some(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()))
        );
        assert!(parse_filter_date("05/03/2024").is_err());
    }

    #[test]
    fn category_lookup_ignores_case() {
        let categories = vec![
            Category {
                id: 1,
                name: "Food".to_string(),
                description: None,
            },
            Category {
                id: 2,
                name: "Travel".to_string(),
                description: None,
            },
        ];
        assert_eq!(find_category(&categories, "food").map(|c| c.id), Some(1));
        assert_eq!(find_category(&categories, "TRAVEL").map(|c| c.id), Some(2));
        assert!(find_category(&categories, "Rent").is_none());
    }

    #[test]
    fn page_size_parses_and_clamps_to_service_bounds() {
        assert_eq!(parse_per_page("25"), Ok(25));
        assert_eq!(parse_per_page(" 50 "), Ok(50));
        assert_eq!(parse_per_page("0"), Ok(1));
        assert_eq!(parse_per_page("999"), Ok(200));
        assert!(parse_per_page("ten").is_err());
        assert!(parse_per_page("").is_err());
    }

    #[test]
    fn filter_focus_cycles_through_every_field() {
        let mut form = FilterForm::default();
        assert_eq!(form.focus, FilterField::Start);
        form.advance_focus();
        assert_eq!(form.focus, FilterField::End);
        form.advance_focus();
        assert_eq!(form.focus, FilterField::Kind);
        form.advance_focus();
        assert_eq!(form.focus, FilterField::PerPage);
        form.advance_focus();
        assert_eq!(form.focus, FilterField::Start);
    }

    #[test]
    fn failed_series_falls_back_without_touching_the_other() {
        let mut app = test_app("http://127.0.0.1:9/", "apply-series");
        app.state.transactions.items = vec![Transaction {
            id: 1,
            kind: TransactionType::Expense,
            amount: 4.0,
            currency: None,
            date: NaiveDate::from_ymd_opt(2025, 8, 1),
            description: None,
            category_id: None,
            category: None,
            created_at: None,
        }];
        let server_daily = vec![DateTotal {
            date: NaiveDate::from_ymd_opt(2025, 8, 2).unwrap(),
            total: 5.0,
        }];

        app.apply_analytics(Err("boom".to_string()), Ok(server_daily.clone()));

        let stats = &app.state.stats;
        assert_eq!(stats.category_source, SeriesSource::PageFallback);
        assert_eq!(stats.by_category.len(), 1);
        assert_eq!(stats.by_category[0].category, "Uncategorized");
        assert_eq!(stats.by_category[0].total, 4.0);
        assert_eq!(stats.date_source, SeriesSource::Server);
        assert_eq!(stats.by_date, server_daily);
        assert_eq!(stats.error.as_deref(), Some("boom"));

        // The next clean fetch recovers both series.
        app.apply_analytics(Ok(Vec::new()), Ok(Vec::new()));
        assert_eq!(app.state.stats.category_source, SeriesSource::Server);
        assert!(app.state.stats.by_category.is_empty());
        assert!(app.state.stats.error.is_none());
    }

    #[tokio::test]
    async fn one_failing_series_keeps_the_other_on_server_data() {
        let base = spawn_stub(vec![
            ("/analytics/by_category", 500, r#"{"detail":"boom"}"#),
            ("/analytics/by_date", 200, r#"[{"date":"2025-08-01","total":5.0}]"#),
        ])
        .await;
        let mut app = test_app(&base, "analytics-split");

        app.fetch_analytics().await.unwrap();

        let stats = &app.state.stats;
        assert_eq!(stats.date_source, SeriesSource::Server);
        assert_eq!(stats.by_date.len(), 1);
        assert_eq!(stats.by_date[0].total, 5.0);
        assert_eq!(stats.category_source, SeriesSource::PageFallback);
        assert_eq!(stats.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn register_grant_is_stored_and_home_opens() {
        let base = spawn_stub(vec![
            (
                "/auth/register",
                201,
                r#"{"access_token":"tok-123","token_type":"bearer"}"#,
            ),
            ("/categories", 200, "[]"),
            (
                "/transactions",
                200,
                r#"{"items":[],"total":0,"page":1,"per_page":25}"#,
            ),
            ("/analytics/by_category", 200, "[]"),
            ("/analytics/by_date", 200, "[]"),
        ])
        .await;
        let mut app = test_app(&base, "register-grant");
        app.state.login.mode = LoginMode::Register;
        app.state.login.email = "user@example.com".to_string();
        app.state.login.password = "hunter2".to_string();

        app.attempt_login().await.unwrap();

        assert_eq!(app.session.token(), Some("tok-123"));
        assert_eq!(app.state.screen, Screen::Home);
        assert!(app.state.login.message.is_none());
        assert!(app.state.login.password.is_empty());
    }
}
