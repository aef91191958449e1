use crate::app::{Action, AppState, MyTasksTab, NoticeLevel, View};
use crate::effects::EffectRunner;
use crate::filter::CategoryFilter;
use crate::form::{Field, FormInput};
use crate::payments::PaymentsTab;
use crate::task::{Task, TaskCategory, TaskStatus};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const TICK: Duration = Duration::from_millis(100);

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &mut AppState,
    effects: &EffectRunner,
    results: &mut UnboundedReceiver<Action>,
) -> io::Result<()> {
    loop {
        while let Ok(action) = results.try_recv() {
            dispatch(state, effects, action);
        }

        terminal.draw(|f| draw(f, state))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if let Some(action) = key_action(state, key) {
                    dispatch(state, effects, action);
                }
            }
        }

        if state.should_quit {
            return Ok(());
        }
    }
}

fn dispatch(state: &mut AppState, effects: &EffectRunner, action: Action) {
    if let Some(effect) = state.apply(action) {
        effects.run(effect);
    }
}

/// Maps a key press to an action for the current view.
pub fn key_action(state: &AppState, key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    if state.notice.is_some() {
        return matches!(key.code, KeyCode::Enter | KeyCode::Esc).then_some(Action::DismissNotice);
    }

    if state.view == View::PostTask {
        return match key.code {
            KeyCode::Esc => Some(Action::Navigate(View::Home)),
            KeyCode::Enter => Some(Action::SubmitPost),
            KeyCode::Tab | KeyCode::Down => Some(Action::Form(FormInput::NextField)),
            KeyCode::BackTab | KeyCode::Up => Some(Action::Form(FormInput::PrevField)),
            KeyCode::Right => Some(Action::Form(FormInput::NextChoice)),
            KeyCode::Left => Some(Action::Form(FormInput::PrevChoice)),
            KeyCode::Backspace => Some(Action::Form(FormInput::Backspace)),
            KeyCode::Char(c) => Some(Action::Form(FormInput::Char(c))),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char(c @ '1'..='6') => {
            let index = c as usize - '1' as usize;
            Some(Action::Navigate(View::ALL[index]))
        }
        KeyCode::Up => Some(Action::MoveCursor(-1)),
        KeyCode::Down => Some(Action::MoveCursor(1)),
        KeyCode::Tab => Some(Action::SwitchTab),
        KeyCode::Left if state.view == View::BrowseTasks => Some(Action::CycleCategory(-1)),
        KeyCode::Right if state.view == View::BrowseTasks => Some(Action::CycleCategory(1)),
        KeyCode::Enter | KeyCode::Char('a') if state.view == View::BrowseTasks => {
            Some(Action::AcceptSelected)
        }
        KeyCode::Char('s') if state.view == View::MyTasks => Some(Action::StartSelected),
        KeyCode::Char('c') if state.view == View::MyTasks => Some(Action::CompleteSelected),
        KeyCode::Char('b') if state.view == View::Home => Some(Action::Navigate(View::BrowseTasks)),
        KeyCode::Char('p') if state.view == View::Home => Some(Action::Navigate(View::PostTask)),
        _ => None,
    }
}

pub fn draw(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_header(f, chunks[0], state);
    match state.view {
        View::Home => draw_home(f, chunks[1]),
        View::BrowseTasks => draw_browse(f, chunks[1], state),
        View::PostTask => draw_post(f, chunks[1], state),
        View::MyTasks => draw_my_tasks(f, chunks[1], state),
        View::Profile => draw_profile(f, chunks[1], state),
        View::Payments => draw_payments(f, chunks[1], state),
    }
    draw_nav(f, chunks[2], state.view);

    if let Some(notice) = &state.notice {
        let color = match notice.level {
            NoticeLevel::Info => Color::Green,
            NoticeLevel::Error => Color::Red,
        };
        let area = centered(f.area(), 50, 5);
        let popup = Paragraph::new(vec![
            Line::from(notice.message.as_str()),
            Line::from(Span::styled("Enter to dismiss", Style::default().fg(Color::DarkGray))),
        ])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn draw_header(f: &mut Frame, area: Rect, state: &AppState) {
    let user = &state.user;
    let mut spans = vec![Span::styled(
        state.view.title(),
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
    )];
    if state.loading() {
        spans.push(Span::styled("  loading…", Style::default().fg(Color::DarkGray)));
    }
    let left = Paragraph::new(Line::from(spans));
    let right = Paragraph::new(Line::from(vec![
        Span::styled(format!("({}) ", user.initial()), Style::default().fg(Color::Blue)),
        Span::raw(format!("{}  ", user.name)),
        Span::styled(
            format!("⭐ {} ({} reviews)", user.rating, user.total_reviews),
            Style::default().fg(Color::Gray),
        ),
    ]))
    .alignment(Alignment::Right);

    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(left, inner);
    f.render_widget(right, inner);
}

fn draw_nav(f: &mut Frame, area: Rect, current: View) {
    let titles = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| format!("{} {}", i + 1, view.nav_label()));
    let selected = View::ALL.iter().position(|v| *v == current).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(tabs, area);
}

fn draw_home(f: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Your All-in-One Task Marketplace",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("Connect with skilled taskers or offer your services to earn money"),
        Line::from(""),
        Line::from("[b] Find Services    [p] Post a Task"),
        Line::from(""),
        Line::from("10K+ Active Taskers  ·  50K+ Tasks Completed  ·  4.9★ Average Rating"),
        Line::from(""),
        Line::from(Span::styled("Popular Services", Style::default().add_modifier(Modifier::BOLD))),
    ];
    for pair in TaskCategory::ALL.chunks(2) {
        let cells: Vec<String> = pair
            .iter()
            .map(|c| format!("{} {:<24}", c.icon(), c.label()))
            .collect();
        lines.push(Line::from(cells.join("  ")));
    }
    lines.extend([
        Line::from(""),
        Line::from(Span::styled("How It Works", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("📋 Post your task  →  🤝 Get matched  →  ✅ Get it done"),
    ]);

    let home = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(home, area);
}

fn task_item(task: &Task, show_status: bool) -> ListItem<'_> {
    let mut header = vec![
        Span::raw(format!("{} ", task.category.icon())),
        Span::styled(&task.title, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(task.budget_range(), Style::default().fg(Color::Green)),
    ];
    if show_status {
        header.push(Span::raw("  "));
        header.push(Span::styled(task.status.label(), status_style(task.status)));
    }

    let mut details = vec![
        Span::raw(format!("   {}", task.category.label())),
        Span::raw(format!(" · {}", task.priority.label())),
    ];
    if let Some(minutes) = task.estimated_duration {
        details.push(Span::raw(format!(" · {minutes} min")));
    }
    if let Some(address) = &task.location.address {
        details.push(Span::raw(format!(" · 📍 {address}")));
    }

    ListItem::new(vec![
        Line::from(header),
        Line::from(Span::styled(
            format!("   {}", task.description),
            Style::default().fg(Color::Gray),
        )),
        Line::from(details),
    ])
}

fn status_style(status: TaskStatus) -> Style {
    let color = match status {
        TaskStatus::Posted => Color::Blue,
        TaskStatus::Accepted => Color::Yellow,
        TaskStatus::InProgress => Color::Magenta,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Cancelled => Color::Red,
        TaskStatus::Disputed => Color::Gray,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn task_list<'a>(tasks: &[&'a Task], title: String, empty: &'a str, show_status: bool) -> List<'a> {
    let items: Vec<ListItem> = if tasks.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            empty,
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        tasks.iter().map(|&t| task_item(t, show_status)).collect()
    };
    List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ")
}

fn draw_browse(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let tabs = Tabs::new(CategoryFilter::tabs().map(CategoryFilter::label))
        .select(state.category.index())
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().title("←/→ category").borders(Borders::ALL));
    f.render_widget(tabs, chunks[0]);

    let tasks = state.browse_tasks();
    let list = task_list(
        &tasks,
        format!("Available tasks ({}) · Enter to accept", tasks.len()),
        "No tasks available in this category",
        false,
    );
    let mut list_state = ListState::default();
    if !tasks.is_empty() {
        list_state.select(Some(state.browse_cursor));
    }
    f.render_stateful_widget(list, chunks[1], &mut list_state);
}

fn draw_post(f: &mut Frame, area: Rect, state: &AppState) {
    let form = &state.form;
    let focused = form.focused();
    let mut lines = Vec::with_capacity(Field::ORDER.len() + 2);
    for field in Field::ORDER {
        let active = field == focused;
        let label_style = if active {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let value = if field.is_choice() {
            format!("◀ {} ▶", form.value(field))
        } else if active {
            format!("{}▏", form.value(field))
        } else {
            form.value(field).to_string()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<20}", field.label()), label_style),
            Span::raw(value),
        ]));
    }
    lines.push(Line::from(""));
    let footer = if state.posting {
        "Posting…"
    } else {
        "Tab/↑↓ field · ←/→ choice · Enter Post Task · Esc cancel"
    };
    lines.push(Line::from(Span::styled(footer, Style::default().fg(Color::DarkGray))));

    let form_view =
        Paragraph::new(lines).block(Block::default().title("Post a Task").borders(Borders::ALL));
    f.render_widget(form_view, area);
}

fn draw_my_tasks(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let titles = vec![
        format!("As Client ({})", state.client_tasks().len()),
        format!("As Tasker ({})", state.tasker_tasks().len()),
    ];
    let selected = match state.my_tasks_tab {
        MyTasksTab::Client => 0,
        MyTasksTab::Tasker => 1,
    };
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().title("Tab to switch").borders(Borders::ALL));
    f.render_widget(tabs, chunks[0]);

    let tasks = state.my_tasks();
    let (title, empty) = match state.my_tasks_tab {
        MyTasksTab::Client => ("Tasks you posted".to_string(), "Start by posting your first task!"),
        MyTasksTab::Tasker => (
            "Tasks you accepted · s start · c complete".to_string(),
            "Browse available tasks to get started!",
        ),
    };
    let list = task_list(&tasks, title, empty, true);
    let mut list_state = ListState::default();
    if !tasks.is_empty() {
        list_state.select(Some(state.my_tasks_cursor));
    }
    f.render_stateful_widget(list, chunks[1], &mut list_state);
}

fn draw_profile(f: &mut Frame, area: Rect, state: &AppState) {
    let user = &state.user;
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled(user.name.as_str(), bold)),
        Line::from(user.role.label()),
        Line::from(format!("⭐ {} ({} reviews)", user.rating, user.total_reviews)),
        Line::from(""),
        Line::from(format!("Email: {}", user.email)),
        Line::from(format!("Phone: {}", user.phone)),
    ];
    if let Some(bio) = &user.bio {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("About", bold)));
        lines.push(Line::from(bio.as_str()));
    }
    if !user.skills.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Skills", bold)));
        lines.push(Line::from(user.skills.join(" · ")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Location Sharing", bold)));
    lines.push(Line::from(if user.shares_location() {
        "✅ Enabled"
    } else {
        "❌ Disabled"
    }));
    if let Some(address) = user.location.as_ref().and_then(|l| l.address.as_deref()) {
        lines.push(Line::from(format!("📍 {address}")));
    }

    let profile = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(profile, area);
}

fn draw_payments(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let selected = PaymentsTab::ALL
        .iter()
        .position(|t| *t == state.payments_tab)
        .unwrap_or(0);
    let tabs = Tabs::new(PaymentsTab::ALL.iter().map(|t| t.label()))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().title("Tab to switch").borders(Borders::ALL));
    f.render_widget(tabs, chunks[0]);

    let wallet = &state.wallet;
    let lines: Vec<Line> = match state.payments_tab {
        PaymentsTab::Wallet => vec![
            Line::from("Available Balance"),
            Line::from(Span::styled(
                wallet.balance_display(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("💰 Add Money    💸 Withdraw"),
            Line::from(""),
            Line::from(
                "🏦 Your TaskMarket wallet acts as a digital bank account with instant \
                 transfers, payment splitting, and automatic earnings deposits. \
                 Gateway integration coming soon!",
            ),
        ],
        PaymentsTab::Methods => {
            let mut lines: Vec<Line> = wallet
                .methods
                .iter()
                .map(|m| Line::from(format!("{} {}  {}", m.icon(), m.name, m.display)))
                .collect();
            lines.push(Line::from(""));
            lines.push(Line::from(format!(
                "🔒 Payment gateway placeholder: {}",
                crate::payments::GATEWAY_PLACEHOLDER
            )));
            lines
        }
        PaymentsTab::History => wallet
            .transactions
            .iter()
            .map(|t| {
                let (icon, color) = if t.is_earning() {
                    ("💰", Color::Green)
                } else {
                    ("💸", Color::Red)
                };
                Line::from(vec![
                    Span::raw(format!("{icon} {:<24} {}  ", t.description, t.date)),
                    Span::styled(t.amount_display(), Style::default().fg(color)),
                ])
            })
            .collect(),
    };

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(body, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::sample_task;
    use crate::user::User;
    use ratatui::backend::TestBackend;
    use rstest::{fixture, rstest};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[fixture]
    fn state() -> AppState {
        AppState::init(User::demo()).0
    }

    fn render(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[rstest]
    #[case(KeyCode::Char('1'), Some(Action::Navigate(View::Home)))]
    #[case(KeyCode::Char('6'), Some(Action::Navigate(View::Payments)))]
    #[case(KeyCode::Char('q'), Some(Action::Quit))]
    #[case(KeyCode::Char('r'), Some(Action::Refresh))]
    #[case(KeyCode::Char('a'), None)]
    fn home_keys(state: AppState, #[case] code: KeyCode, #[case] expected: Option<Action>) {
        assert_eq!(key_action(&state, press(code)), expected);
    }

    #[rstest]
    fn form_captures_letters_including_q(mut state: AppState) {
        state.apply(Action::Navigate(View::PostTask));

        assert_eq!(
            key_action(&state, press(KeyCode::Char('q'))),
            Some(Action::Form(FormInput::Char('q')))
        );
        assert_eq!(key_action(&state, press(KeyCode::Enter)), Some(Action::SubmitPost));
    }

    #[rstest]
    fn browse_enter_accepts(mut state: AppState) {
        state.apply(Action::Navigate(View::BrowseTasks));
        assert_eq!(key_action(&state, press(KeyCode::Enter)), Some(Action::AcceptSelected));
        assert_eq!(key_action(&state, press(KeyCode::Right)), Some(Action::CycleCategory(1)));
    }

    #[rstest]
    fn notice_only_accepts_dismissal(mut state: AppState) {
        state.apply(Action::Navigate(View::BrowseTasks));
        state.apply(Action::TransitionFailed {
            id: crate::task::TaskId::new("t1"),
            transition: crate::app::Transition::Start,
            reason: "boom".to_string(),
        });

        assert_eq!(key_action(&state, press(KeyCode::Char('1'))), None);
        assert_eq!(key_action(&state, press(KeyCode::Esc)), Some(Action::DismissNotice));
        assert!(render(&state).contains("Error starting task"));
    }

    #[rstest]
    fn ctrl_c_quits_from_the_form(mut state: AppState) {
        state.apply(Action::Navigate(View::PostTask));
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_action(&state, key), Some(Action::Quit));
    }

    #[rstest]
    fn browse_with_no_tasks_renders_empty_state(mut state: AppState) {
        state.apply(Action::TasksLoaded {
            generation: 0,
            tasks: Vec::new(),
        });
        state.apply(Action::Navigate(View::BrowseTasks));

        let screen = render(&state);

        assert!(screen.contains("Available tasks (0)"));
        assert!(screen.contains("No tasks available in this category"));
    }

    #[rstest]
    fn browse_renders_open_task_cards(mut state: AppState) {
        state.apply(Action::TasksLoaded {
            generation: 0,
            tasks: vec![
                sample_task("Fix sink", "u1", TaskCategory::Handyman, TaskStatus::Posted),
                sample_task("Old job", "u1", TaskCategory::Handyman, TaskStatus::Completed),
            ],
        });
        state.apply(Action::Navigate(View::BrowseTasks));

        let screen = render(&state);

        assert!(screen.contains("Available tasks (1)"));
        assert!(screen.contains("Fix sink"));
        assert!(!screen.contains("Old job"));
    }

    #[rstest]
    fn my_tasks_tabs_show_counts(mut state: AppState) {
        let mine = sample_task(
            "Paint fence",
            "demo-user-123",
            TaskCategory::Other,
            TaskStatus::Posted,
        );
        state.apply(Action::TasksLoaded {
            generation: 0,
            tasks: vec![mine],
        });
        state.apply(Action::Navigate(View::MyTasks));

        let screen = render(&state);

        assert!(screen.contains("As Client (1)"));
        assert!(screen.contains("As Tasker (0)"));
        assert!(screen.contains("POSTED"));
    }
}
