//! The terminal application: event loop, navigation and background work.

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::routes::{Route, Router};
use crate::screens::{execute, Context, Effect, NotificationLevel, Outcome, Screen};
use crate::tasks::{Tagged, TaskScope};
use crate::ui::views::{self, Chrome};
use crate::ui::{install_panic_hook, HelpDialog, TerminalGuard, ToastStack};
use crate::workflow::{Navigator, WorkflowTracker};

pub struct App {
    config: Config,
    router: Router,
    tracker: WorkflowTracker,
    ctx: Context,
    screen: Screen,
    /// Work started by the visible screen
    scope: TaskScope<Outcome>,
    outcomes: mpsc::UnboundedReceiver<Tagged<Outcome>>,
    help_dialog: HelpDialog,
    toasts: ToastStack,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, ctx: Context, start: Route) -> Self {
        let (tx, outcomes) = mpsc::unbounded_channel();
        let screen = Screen::for_route(&start, &config);
        let toasts = ToastStack::new(Duration::from_secs(config.ui.toast_secs));
        Self {
            router: Router::new(start),
            tracker: WorkflowTracker::new(),
            ctx,
            screen,
            scope: TaskScope::new(0, tx),
            outcomes,
            help_dialog: HelpDialog::new(),
            toasts,
            should_quit: false,
            config,
        }
    }

    /// Wire the HTTP backend and the session cache from configuration
    pub fn from_config(config: Config, start: Route) -> Result<Self> {
        let ctx = Context::from_config(&config)?;
        Ok(Self::new(config, ctx, start))
    }

    pub async fn run(&mut self) -> Result<()> {
        install_panic_hook();
        let guard = TerminalGuard::new()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;

        let tick_rate = Duration::from_millis(self.config.ui.refresh_rate_ms);
        info!(route = %self.router.current_path(), "tui started");

        while !self.should_quit {
            self.sync_route();
            terminal.draw(|f| self.draw(f))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        if key.modifiers.contains(KeyModifiers::CONTROL)
                            && key.code == KeyCode::Char('c')
                        {
                            self.should_quit = true;
                        } else {
                            self.handle_key(key.code);
                        }
                    }
                }
            }

            self.drain_outcomes();
            self.tick(Instant::now());
        }

        self.scope.cancel();
        terminal.show_cursor()?;
        drop(guard);
        info!("tui stopped");
        Ok(())
    }

    pub fn current_route(&self) -> &Route {
        self.router.current()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn toasts(&self) -> &ToastStack {
        &self.toasts
    }

    pub fn help_visible(&self) -> bool {
        self.help_dialog.visible
    }

    fn draw(&mut self, frame: &mut Frame) {
        let session = self.ctx.session.snapshot();
        let chrome = Chrome {
            route: self.router.current(),
            session: &session,
            tracker: &self.tracker,
        };
        views::render(frame, &mut self.screen, &chrome);

        let context = self.screen.state().shortcut_context();
        self.help_dialog.render(frame, context);
        self.toasts.render(frame);
    }

    /// Global keys first, unless the screen is capturing input
    pub fn handle_key(&mut self, key: KeyCode) {
        if self.help_dialog.visible {
            self.help_dialog.visible = false;
            return;
        }
        if key == KeyCode::F(1) {
            self.help_dialog.toggle();
            return;
        }

        if !self.screen.state().is_capturing() {
            match key {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('?') => {
                    self.help_dialog.toggle();
                    return;
                }
                KeyCode::Char('x') => {
                    self.toasts.dismiss_latest();
                    return;
                }
                KeyCode::Esc => {
                    if !self.router.back() {
                        debug!("no previous screen");
                    }
                    self.sync_route();
                    return;
                }
                KeyCode::Char(c @ '1'..='9') if self.router.current().is_wizard() => {
                    let index = (c as usize) - ('1' as usize);
                    let path = self.router.current_path();
                    if self.tracker.on_step_select(index, &path, &mut self.router) {
                        self.sync_route();
                    }
                    return;
                }
                _ => {}
            }
        }

        let effects = self.screen.state_mut().handle_key(key);
        self.process(effects);
    }

    /// Rebuild the screen if the route changed since the last call
    pub fn sync_route(&mut self) {
        if !self.router.take_changed() {
            return;
        }
        let route = self.router.current().clone();
        debug!(route = %route.path(), "entering screen");
        self.scope.renew();
        self.screen = Screen::for_route(&route, &self.config);
        let effects = self.screen.state_mut().enter();
        self.process(effects);
    }

    fn process(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Run(command) => {
                    let ctx = self.ctx.clone();
                    self.scope.spawn(move |emit| execute(command, ctx, emit));
                }
                Effect::RefreshSession => {
                    let session = self.ctx.session.clone();
                    self.scope.spawn(move |emit| async move {
                        let snapshot = session.ensure_fresh().await;
                        emit.emit(Outcome::Session(snapshot));
                    });
                }
                Effect::Navigate(path) => self.router.navigate(&path),
                Effect::Notify(notification) => {
                    match notification.level {
                        NotificationLevel::Error => warn!(message = %notification.message, "notify"),
                        _ => info!(message = %notification.message, "notify"),
                    }
                    self.toasts.push(notification, Instant::now());
                }
            }
        }
        self.sync_route();
    }

    fn apply(&mut self, tagged: Tagged<Outcome>) {
        if tagged.generation != self.scope.generation() {
            debug!(
                generation = tagged.generation,
                current = self.scope.generation(),
                "dropping result for a screen that is gone"
            );
            return;
        }
        let effects = self.screen.state_mut().apply(tagged.value);
        self.process(effects);
    }

    /// Apply every result that has already arrived
    pub fn drain_outcomes(&mut self) {
        while let Ok(tagged) = self.outcomes.try_recv() {
            self.apply(tagged);
        }
    }

    /// Apply results as they arrive until none has come for `idle`
    pub async fn settle(&mut self, idle: Duration) {
        while let Ok(Some(tagged)) = tokio::time::timeout(idle, self.outcomes.recv()).await {
            self.apply(tagged);
        }
    }

    pub fn tick(&mut self, now: Instant) {
        let effects = self.screen.state_mut().tick(now);
        self.process(effects);
        self.toasts.expire(now);
    }
}
