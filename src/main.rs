use healthbot::api::{ChatReply, ConnectionStatus, HealthApiClient, FALLBACK_REPLY};
use healthbot::config::Config;
use healthbot::formatter::{Block, Formatter, Inline};
use healthbot::history::{self, ChatEntry};
use healthbot::quick_actions::{self, QuickAction};
use healthbot::state::{AppState, MessageKind, SendBlocked, Tab, Theme as UiTheme};
use healthbot::store::{self, Store};

use iced::{
    widget::{
        button, column, container, horizontal_space, rich_text, row, scrollable, span, text,
        text::Span, text_input, text_input::Id, Column,
    },
    Element, Length, Task, Theme, Font, Color, Subscription,
    time,
    keyboard::{self, Key},
    event::{self, Event as IcedEvent},
    alignment, font,
    window,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const WELCOME: &str = "Hello! I'm HealthBot AI. Ask me about symptoms, vaccinations, health alerts or emergency help.\n\nTip: use Ctrl+1-6 for quick actions.";

const BOLD: Font = Font {
    weight: font::Weight::Bold,
    ..Font::MONOSPACE
};

const LINK_COLOR: Color = Color::from_rgb(0.25, 0.5, 0.95);

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load();

    iced::application("HealthBot AI", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window::Settings {
            size: iced::Size::new(config.window.width as f32, config.window.height as f32),
            min_size: Some(iced::Size::new(
                config.window.min_width as f32,
                config.window.min_height as f32,
            )),
            position: window::Position::Centered,
            ..Default::default()
        })
        .default_font(Font::MONOSPACE)
        .run_with(move || App::new(config.clone()))
}

#[derive(Debug, Clone)]
enum Message {
    InputChanged(String),
    Submit,
    QuickAction(QuickAction),
    ApplySuggestion(String),
    ReplyReceived(Result<ChatReply, String>),
    ConnectionChecked(ConnectionStatus),
    Tick,
    ToggleTheme,
    SetTheme(UiTheme),
    ClearChat,
    ExportChat,
    SetTab(Tab),
    ToggleSidebar,
    ToggleSettings,
    ToggleQuickActions,
    OpenLink(String),
    Exit,
}

struct App {
    state: AppState,
    store: Option<Store>,
    client: HealthApiClient,
    formatter: Formatter,
    input_text: String,
    suggestions: Vec<String>,
    status_line: Option<String>,
    is_loading: bool,
    loading_frame: usize,
    input_id: Id,
}

impl App {
    fn new(config: Config) -> (Self, Task<Message>) {
        // Persistence is optional; the chat still works without it.
        let store = match Store::open(&store::default_db_path()) {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!(error = %e, "could not open local store, history will not be saved");
                None
            }
        };

        let state = store
            .as_ref()
            .map(|s| {
                AppState::load(s).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "could not load saved state");
                    AppState::default()
                })
            })
            .unwrap_or_default();

        let client = HealthApiClient::new(&config.api);
        let input_id = Id::unique();

        let app = App {
            state,
            store,
            client: client.clone(),
            formatter: Formatter::new(config.formatter),
            input_text: String::new(),
            suggestions: Vec::new(),
            status_line: None,
            is_loading: false,
            loading_frame: 0,
            input_id: input_id.clone(),
        };

        let focus_task = text_input::focus(input_id);
        let connect_task = Task::perform(
            async move { client.check_connection().await },
            Message::ConnectionChecked,
        );

        (app, Task::batch([focus_task, connect_task]))
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = self.state.persist(store) {
                tracing::warn!(error = %e, "could not save chat state");
            }
        }
    }

    fn send(&mut self, prompt: String) -> Task<Message> {
        if let Err(reason) = self.state.check_send(&prompt, self.is_loading) {
            tracing::warn!(?reason, "message not sent");
            if reason == SendBlocked::Offline {
                self.status_line = Some(format!("Not sent: {}", self.state.connection.message));
            }
            return Task::none();
        }

        let prompt = prompt.trim().to_string();
        self.state.record(ChatEntry::user(prompt.clone()));
        self.input_text.clear();
        self.is_loading = true;

        let client = self.client.clone();
        Task::perform(
            async move { client.chat(&prompt).await.map_err(|e| e.to_string()) },
            Message::ReplyReceived,
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::InputChanged(value) => {
                self.suggestions = quick_actions::suggestions_for(&value)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                self.input_text = value;
                Task::none()
            }
            Message::Submit => {
                let prompt = self.input_text.clone();
                self.send(prompt)
            }
            Message::ApplySuggestion(suggestion) => {
                self.suggestions.clear();
                self.input_text = suggestion;
                text_input::focus(self.input_id.clone())
            }
            Message::QuickAction(action) => {
                let plan = quick_actions::plan(action);
                if let Some(notice) = plan.notice {
                    self.state.record(ChatEntry::bot(notice, Some("location_unsupported".into()), None));
                }
                if let Some(follow_ups) = plan.suggestions() {
                    self.suggestions = follow_ups;
                }
                self.send(plan.message.to_string())
            }
            Message::ReplyReceived(result) => {
                self.is_loading = false;
                let entry = match result {
                    Ok(reply) => ChatEntry::bot(reply.response, reply.intent, reply.confidence),
                    Err(e) => {
                        tracing::error!(error = %e, "error sending message");
                        ChatEntry::bot(FALLBACK_REPLY, Some("error".into()), None)
                    }
                };
                self.state.record(entry);
                self.persist();
                text_input::focus(self.input_id.clone())
            }
            Message::ConnectionChecked(status) => {
                self.state.set_connection(status);
                Task::none()
            }
            Message::Tick => {
                if self.is_loading {
                    self.loading_frame = (self.loading_frame + 1) % 80;
                }
                Task::none()
            }
            Message::ToggleTheme => {
                self.state.toggle_theme();
                self.persist();
                Task::none()
            }
            Message::SetTheme(theme) => {
                self.state.theme = theme;
                self.persist();
                Task::none()
            }
            Message::ClearChat => {
                self.state.clear_chat();
                self.persist();
                Task::none()
            }
            Message::ExportChat => {
                match history::write_export(&export_dir(), &self.state.history, chrono::Utc::now()) {
                    Ok(path) => self.status_line = Some(format!("Exported to {}", path.display())),
                    Err(e) => {
                        tracing::error!(error = %e, "export failed");
                        self.status_line = Some(format!("Export failed: {}", e));
                    }
                }
                Task::none()
            }
            Message::SetTab(tab) => {
                self.state.set_active_tab(tab);
                Task::none()
            }
            Message::ToggleSidebar => {
                self.state.toggle_sidebar();
                Task::none()
            }
            Message::ToggleSettings => {
                self.state.toggle_settings();
                Task::none()
            }
            Message::ToggleQuickActions => {
                self.state.toggle_quick_actions();
                Task::none()
            }
            Message::OpenLink(url) => {
                if let Err(e) = open::that(&url) {
                    tracing::warn!(%url, error = %e, "could not open link");
                }
                Task::none()
            }
            Message::Exit => iced::exit(),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let timer = if self.is_loading {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let events = event::listen_with(|event, _status, _id| match event {
            IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) => Some(Message::Exit),
            IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Character(c),
                modifiers,
                ..
            }) if modifiers.control() => c
                .chars()
                .next()
                .and_then(QuickAction::from_shortcut)
                .map(Message::QuickAction),
            _ => None,
        });

        Subscription::batch([timer, events])
    }

    fn view(&self) -> Element<Message> {
        let theme_label = match self.state.theme {
            UiTheme::Light => "Dark",
            UiTheme::Dark => "Light",
        };

        let header = row![
            button(text("☰")).on_press(Message::ToggleSidebar),
            text("HealthBot AI").size(20),
            horizontal_space(),
            text(format!(
                "{} · {}",
                self.state.connection.label(),
                self.state.connection.message
            ))
            .size(13),
            button(text(theme_label)).on_press(Message::ToggleTheme),
            button(text("Clear")).on_press(Message::ClearChat),
            button(text("Export")).on_press(Message::ExportChat),
            button(text("Settings")).on_press(Message::ToggleSettings),
        ]
        .spacing(8)
        .align_y(alignment::Vertical::Center);

        let body: Element<Message> = match self.state.active_tab {
            Tab::Chat => self.chat_view(),
            Tab::History => self.history_view(),
        };

        let mut main_column = column![header].spacing(10).padding(10);
        if self.state.settings_open {
            main_column = main_column.push(self.settings_view());
        }
        main_column = main_column.push(body);
        if let Some(status) = &self.status_line {
            main_column = main_column.push(text(status.clone()).size(12));
        }

        let content: Element<Message> = if self.state.sidebar_open {
            row![self.sidebar_view(), main_column].into()
        } else {
            main_column.into()
        };

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn sidebar_view(&self) -> Element<Message> {
        let tab_button = |label: &'static str, tab: Tab| {
            let b = button(text(label)).width(Length::Fill);
            if self.state.active_tab == tab {
                b
            } else {
                b.on_press(Message::SetTab(tab))
            }
        };

        container(
            column![
                tab_button("Chat", Tab::Chat),
                tab_button("History", Tab::History),
                text("Tip: Use Ctrl+1-6 for quick shortcuts").size(11),
            ]
            .spacing(8),
        )
        .padding(10)
        .width(Length::Fixed(180.0))
        .height(Length::Fill)
        .style(container::rounded_box)
        .into()
    }

    fn settings_view(&self) -> Element<Message> {
        container(
            row![
                text("Theme").size(14),
                button(text("Light")).on_press(Message::SetTheme(UiTheme::Light)),
                button(text("Dark")).on_press(Message::SetTheme(UiTheme::Dark)),
                horizontal_space(),
                text(format!("API: {}", self.client.base_url())).size(12),
            ]
            .spacing(8)
            .align_y(alignment::Vertical::Center),
        )
        .padding(10)
        .style(container::rounded_box)
        .into()
    }

    fn chat_view(&self) -> Element<Message> {
        let mut transcript = Column::new().spacing(10).push(welcome_bubble(&self.formatter));
        for entry in self.state.history.entries() {
            transcript = transcript.push(message_bubble(&self.formatter, entry));
        }

        if self.is_loading {
            let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
            let spinner = frames[self.loading_frame % frames.len()];
            transcript = transcript.push(text(format!("{} HealthBot AI is typing...", spinner)).size(14));
        }

        let transcript = scrollable(container(transcript).padding(5).width(Length::Fill))
            .anchor_bottom()
            .height(Length::Fill);

        let mut input = text_input("Ask about your health...", &self.input_text)
            .padding(12)
            .size(16)
            .id(self.input_id.clone());
        if !self.is_loading && self.state.connection.connected {
            input = input.on_input(Message::InputChanged).on_submit(Message::Submit);
        }

        let send_button = if self.state.can_send(&self.input_text) && !self.is_loading {
            button(text("Send")).on_press(Message::Submit)
        } else {
            button(text("Send"))
        };

        let suggestions = self.suggestions.iter().fold(row![].spacing(6), |r, s| {
            r.push(
                button(text(s.clone()).size(12))
                    .on_press(Message::ApplySuggestion(s.clone()))
                    .style(button::secondary),
            )
        });

        let mut chat = column![transcript].spacing(8);
        chat = chat.push(self.quick_actions_view());
        chat = chat.push(suggestions);
        chat = chat.push(row![input, send_button].spacing(8).align_y(alignment::Vertical::Center));
        chat.into()
    }

    fn quick_actions_view(&self) -> Element<Message> {
        let toggle_label = if self.state.quick_actions_collapsed { "▾ Quick actions" } else { "▴ Quick actions" };
        let toggle = button(text(toggle_label).size(12))
            .on_press(Message::ToggleQuickActions)
            .style(button::text);

        if self.state.quick_actions_collapsed {
            return toggle.into();
        }

        let actions = QuickAction::ALL.iter().fold(row![].spacing(6), |r, action| {
            r.push(button(text(action.title()).size(13)).on_press(Message::QuickAction(*action)))
        });
        column![toggle, actions].spacing(4).into()
    }

    fn history_view(&self) -> Element<Message> {
        if self.state.history.is_empty() {
            return text("No saved messages yet.").into();
        }

        let list = self.state.history.entries().iter().fold(Column::new().spacing(4), |c, entry| {
            c.push(
                text(format!(
                    "[{}] {}: {}",
                    entry.display_time(),
                    entry.sender.label(),
                    entry.text
                ))
                .size(13),
            )
        });
        scrollable(list).height(Length::Fill).into()
    }

    fn theme(&self) -> Theme {
        match self.state.theme {
            UiTheme::Light => Theme::Light,
            UiTheme::Dark => Theme::TokyoNight,
        }
    }
}

fn welcome_bubble(formatter: &Formatter) -> Element<'static, Message> {
    bubble("HealthBot AI", String::new(), render_blocks(formatter.parse(WELCOME)), MessageKind::Normal)
}

fn message_bubble(formatter: &Formatter, entry: &ChatEntry) -> Element<'static, Message> {
    bubble(
        entry.sender.label(),
        entry.display_time(),
        render_blocks(formatter.parse(&entry.text)),
        MessageKind::of(entry),
    )
}

fn bubble(
    sender: &'static str,
    time: String,
    body: Element<'static, Message>,
    kind: MessageKind,
) -> Element<'static, Message> {
    let header = row![text(sender).size(13).font(BOLD), text(time).size(11)]
        .spacing(8)
        .align_y(alignment::Vertical::Center);

    container(column![header, body].spacing(4))
        .padding(10)
        .width(Length::Fill)
        .style(move |theme: &Theme| bubble_style(theme, kind))
        .into()
}

fn bubble_style(theme: &Theme, kind: MessageKind) -> container::Style {
    let palette = theme.extended_palette();
    let pair = match kind {
        MessageKind::Emergency => palette.danger.weak,
        MessageKind::Error => palette.danger.base,
        MessageKind::Success => palette.success.weak,
        MessageKind::Normal => palette.background.weak,
    };

    container::Style {
        text_color: Some(pair.text),
        background: Some(pair.color.into()),
        border: iced::Border {
            radius: 8.0.into(),
            ..Default::default()
        },
        ..container::Style::default()
    }
}

/// Lays out formatter blocks as rich text: bold short codes, clickable links,
/// one line per list item.
fn render_blocks(blocks: Vec<Block>) -> Element<'static, Message> {
    let mut col = Column::new().spacing(6);
    for block in blocks {
        match block {
            Block::Paragraph(inlines) => {
                col = col.push(rich_text(spans(inlines)).size(15));
            }
            Block::List(items) => {
                for item in items {
                    let mut line = vec![span("  • ")];
                    line.extend(spans(item));
                    col = col.push(rich_text(line).size(15));
                }
            }
        }
    }
    col.into()
}

fn spans(inlines: Vec<Inline>) -> Vec<Span<'static, Message>> {
    inlines
        .into_iter()
        .map(|inline| match inline {
            Inline::Text(t) | Inline::Grouped(t) => span(t),
            Inline::SoftBreak => span("\n"),
            Inline::Strong(digits) => span(digits).font(BOLD),
            Inline::Link(url) => span(url.clone())
                .color(LINK_COLOR)
                .link(Message::OpenLink(url)),
        })
        .collect()
}

fn export_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join("Downloads"))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(Config::get_config_dir)
}
