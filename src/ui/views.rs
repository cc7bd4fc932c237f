//! Drawing for every screen plus the shared header, wizard bar and footer.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::dialogs::centered_rect;
use super::form_field::Form;
use super::keybindings::{footer_hints, ShortcutContext};
use crate::auth::SessionSnapshot;
use crate::routes::Route;
use crate::screens::chat::{ChatScreen, Role};
use crate::screens::chunks::ChunksScreen;
use crate::screens::courses::CoursesScreen;
use crate::screens::instruct::{InstructScreen, SUGGESTIONS};
use crate::screens::lessons::LessonsScreen;
use crate::screens::media::MediaScreen;
use crate::screens::quiz::QuizScreen;
use crate::screens::review::ReviewScreen;
use crate::screens::scores::ScoresScreen;
use crate::screens::signin::SignInScreen;
use crate::screens::tests_editor::TestsEditorScreen;
use crate::screens::upload::UploadScreen;
use crate::screens::{Screen, ScreenState};
use crate::workflow::{StepState, WorkflowTracker};

/// Everything outside the screen body
pub struct Chrome<'a> {
    pub route: &'a Route,
    pub session: &'a SessionSnapshot,
    pub tracker: &'a WorkflowTracker,
}

/// Draw the whole frame except help and toasts
pub fn render(frame: &mut Frame, screen: &mut Screen, chrome: &Chrome) {
    let wizard = chrome.route.is_wizard();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(if wizard { 3 } else { 0 }),
            Constraint::Min(5),
            Constraint::Length(2),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], chrome);
    if wizard {
        render_wizard_bar(frame, chunks[1], chrome);
    }
    let context = screen.state().shortcut_context();
    render_body(frame, chunks[2], screen);
    render_footer(frame, chunks[3], context);
}

fn render_header(frame: &mut Frame, area: Rect, chrome: &Chrome) {
    let mut spans = vec![
        Span::styled(
            " elevan",
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
        Span::styled(chrome.route.title(), Style::default().fg(Color::White)),
        Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
    ];

    let session = chrome.session;
    if session.is_loading && session.last_refresh.is_none() {
        spans.push(Span::styled(
            "checking session...",
            Style::default().fg(Color::DarkGray),
        ));
    } else if let Some(email) = session.email.as_deref().filter(|_| session.is_signed_in()) {
        spans.push(Span::styled(email.to_string(), Style::default().fg(Color::Cyan)));
        let (plan, color) = if session.is_paid_user {
            (" Pro", Color::Green)
        } else {
            (" Free", Color::Gray)
        };
        spans.push(Span::styled(plan, Style::default().fg(color)));
    } else {
        spans.push(Span::styled(
            "not signed in",
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_wizard_bar(frame: &mut Frame, area: Rect, chrome: &Chrome) {
    let path = chrome.route.path();
    let tracker = chrome.tracker;

    let mut spans = Vec::new();
    for (i, (step, state)) in tracker
        .steps()
        .iter()
        .zip(tracker.step_states(&path))
        .enumerate()
    {
        if i > 0 {
            spans.push(Span::styled(" › ", Style::default().fg(Color::DarkGray)));
        }
        let style = match state {
            StepState::Completed => Style::default().fg(Color::Green),
            StepState::Current => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            StepState::Upcoming => Style::default().fg(Color::DarkGray),
        };
        spans.push(Span::styled(format!("{} {}", i + 1, step.name), style));
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    frame.render_widget(Paragraph::new(Line::from(spans)), rows[0]);
    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
            .ratio(tracker.progress_ratio(&path).clamp(0.0, 1.0))
            .label(""),
        rows[1],
    );
}

fn render_footer(frame: &mut Frame, area: Rect, context: ShortcutContext) {
    let mut spans = Vec::new();
    for (key, description) in footer_hints(context, 7) {
        spans.push(Span::styled(
            format!(" [{}]", key),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::styled(
            format!(" {}", description),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(
        "  [?] Help",
        Style::default().fg(Color::DarkGray),
    ));
    let bar = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(bar, area);
}

fn render_body(frame: &mut Frame, area: Rect, screen: &mut Screen) {
    match screen {
        Screen::Courses(s) => render_courses(frame, area, s),
        Screen::SignIn(s) => render_sign_in(frame, area, s),
        Screen::Upload(s) => render_upload(frame, area, s),
        Screen::Instruct(s) => render_instruct(frame, area, s),
        Screen::Review(s) => render_review(frame, area, s),
        Screen::Chunks(s) => render_chunks(frame, area, s),
        Screen::Chat(s) => render_chat(frame, area, s),
        Screen::Lessons(s) => render_lessons(frame, area, s),
        Screen::TestsEditor(s) => render_tests_editor(frame, area, s),
        Screen::Quiz(s) => render_quiz(frame, area, s),
        Screen::Scores(s) => render_scores(frame, area, s),
        Screen::LessonMedia(s) => render_media(frame, area, s),
    }
}

fn panel(title: impl Into<String>, focused: bool) -> Block<'static> {
    let color = if focused { Color::Cyan } else { Color::Gray };
    Block::default()
        .title(format!(" {} ", title.into()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn dim(text: impl Into<String>) -> Paragraph<'static> {
    Paragraph::new(Span::styled(
        text.into(),
        Style::default().fg(Color::DarkGray),
    ))
    .wrap(Wrap { trim: true })
}

fn list<'a>(items: Vec<ListItem<'a>>, block: Block<'a>) -> List<'a> {
    List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ")
}

fn render_list(frame: &mut Frame, area: Rect, list: List, selected: usize, len: usize) {
    let mut state = ListState::default().with_selected((len > 0).then_some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Edit form in a popup over the body
fn render_editor(frame: &mut Frame, title: &str, form: &mut Form, saving: bool) {
    let area = centered_rect(80, 80, frame.area());
    frame.render_widget(Clear, area);
    let title = if saving {
        format!("{} (saving...)", title)
    } else {
        title.to_string()
    };
    let block = panel(title, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    form.render(frame, inner, true);
}

fn split_list_detail(area: Rect) -> (Rect, Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    (cols[0], cols[1])
}

fn render_courses(frame: &mut Frame, area: Rect, screen: &mut CoursesScreen) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let search = if screen.searching || !screen.query.is_empty() {
        Line::from(vec![
            Span::styled("/ ", Style::default().fg(Color::Yellow)),
            Span::raw(screen.query.clone()),
            Span::styled(
                if screen.searching { "|" } else { "" },
                Style::default().fg(Color::Cyan),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "Press / to search",
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(
        Paragraph::new(search).block(panel("Search", screen.searching)),
        rows[0],
    );

    let title = format!("Courses ({})", screen.visible.len());
    if let Some(error) = &screen.load_error {
        frame.render_widget(
            Paragraph::new(Span::styled(error.clone(), Style::default().fg(Color::Red)))
                .wrap(Wrap { trim: true })
                .block(panel(title, false)),
            rows[1],
        );
    } else if screen.loading && screen.all.is_empty() {
        frame.render_widget(dim("Loading courses...").block(panel(title, false)), rows[1]);
    } else if screen.visible.is_empty() {
        let message = if screen.all.is_empty() {
            "No courses yet. Press n to create one."
        } else {
            "No course matches the search."
        };
        frame.render_widget(dim(message).block(panel(title, false)), rows[1]);
    } else {
        let items: Vec<ListItem> = screen
            .visible
            .iter()
            .map(|c| {
                let deleting = screen.deleting.as_deref() == Some(c.course_id.as_str());
                let name = if c.name.is_empty() { "(untitled)" } else { c.name.as_str() };
                let mut spans = vec![
                    Span::styled(name.to_string(), Style::default().fg(Color::White)),
                    Span::styled(
                        format!("  {} questions", c.total_questions),
                        Style::default().fg(Color::Gray),
                    ),
                ];
                if !c.source.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", c.source),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                if deleting {
                    spans.push(Span::styled("  deleting...", Style::default().fg(Color::Red)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        let len = items.len();
        render_list(frame, rows[1], list(items, panel(title, !screen.searching)), screen.selected, len);
    }

    screen.confirm.render(frame);
}

fn render_sign_in(frame: &mut Frame, area: Rect, screen: &mut SignInScreen) {
    let popup = centered_rect(60, 60, area);
    let title = if screen.submitting { "Sign in (working...)" } else { "Sign in" };
    let block = panel(title, screen.editing);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    screen.form.render(frame, inner, screen.editing);
}

fn render_upload(frame: &mut Frame, area: Rect, screen: &mut UploadScreen) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    frame.render_widget(
        dim("Paste a link to a document or video. Its content becomes the course material."),
        rows[0],
    );

    let title = if screen.submitting { "Source link (submitting...)" } else { "Source link" };
    let block = panel(title, screen.editing);
    let inner = block.inner(rows[1]);
    frame.render_widget(block, rows[1]);
    screen.link.render(frame, inner, screen.editing);

    if screen.sign_in_prompt {
        let popup = centered_rect(50, 25, frame.area());
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(vec![
                Line::from("You need to be signed in to create a course."),
                Line::from(""),
                Line::from(Span::styled(
                    "[Enter] Sign in   [Esc] Cancel",
                    Style::default().fg(Color::Yellow),
                )),
            ])
            .wrap(Wrap { trim: true })
            .block(panel("Sign in required", true)),
            popup,
        );
    }
}

fn render_instruct(frame: &mut Frame, area: Rect, screen: &mut InstructScreen) {
    let title = match (screen.loading, screen.saving) {
        (true, _) => "Instructions (loading...)",
        (_, true) => "Instructions (saving...)",
        _ => "Instructions",
    };
    let block = panel(title, screen.editing);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    screen.form.render(frame, inner, screen.editing);

    if let Some(cursor) = screen.suggestion {
        let popup = centered_rect(70, 40, frame.area());
        frame.render_widget(Clear, popup);
        let items: Vec<ListItem> = SUGGESTIONS
            .iter()
            .map(|s| ListItem::new(Line::from(*s)))
            .collect();
        let len = items.len();
        render_list(frame, popup, list(items, panel("Suggestions", true)), cursor, len);
    }
}

fn render_review(frame: &mut Frame, area: Rect, screen: &mut ReviewScreen) {
    let title = match (screen.loading, screen.saving) {
        (true, _) => "Content (loading...)",
        (_, true) => "Content (saving...)",
        _ => "Content",
    };
    let block = panel(title, screen.editing);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    screen.form.render(frame, inner, screen.editing);
}

fn render_chunks(frame: &mut Frame, area: Rect, screen: &mut ChunksScreen) {
    let (left, right) = split_list_detail(area);
    let title = if screen.generating {
        "Chunks (generating tests and lessons...)".to_string()
    } else {
        format!("Chunks ({})", screen.chunks.len())
    };

    if screen.loading && screen.chunks.is_empty() {
        frame.render_widget(dim("Loading chunks...").block(panel(title, true)), left);
    } else {
        let items: Vec<ListItem> = screen
            .chunks
            .iter()
            .map(|c| ListItem::new(Line::from(c.chunk_title.clone())))
            .collect();
        let len = items.len();
        render_list(frame, left, list(items, panel(title, true)), screen.selected, len);
    }

    let body = screen
        .selected_chunk()
        .map(|c| c.chunk_content.clone())
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .block(panel("Content", false)),
        right,
    );

    let saving = screen.saving;
    if let Some((_, form)) = screen.editor.as_mut() {
        render_editor(frame, "Edit chunk", form, saving);
    }
    screen.confirm.render(frame);
}

fn render_chat(frame: &mut Frame, area: Rect, screen: &mut ChatScreen) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let mut lines = Vec::new();
    if screen.messages.is_empty() {
        lines.push(Line::from(Span::styled(
            "Ask the assistant anything about this course.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for message in &screen.messages {
        let (who, color) = match message.role {
            Role::User => ("You", Color::Cyan),
            Role::Assistant => ("Assistant", Color::Green),
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", who),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        if message.text.is_empty() && screen.busy {
            lines.push(Line::from(Span::styled(
                "...",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for line in message.text.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::from(""));
    }

    // Keep the newest text in view
    let inner_width = rows[0].width.saturating_sub(2).max(1) as usize;
    let inner_height = rows[0].height.saturating_sub(2) as usize;
    let wrapped: usize = lines
        .iter()
        .map(|l| l.width().div_ceil(inner_width).max(1))
        .sum();
    let scroll = u16::try_from(wrapped.saturating_sub(inner_height)).unwrap_or(u16::MAX);

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(panel("Conversation", false)),
        rows[0],
    );

    let title = if screen.busy { "Message (answering...)" } else { "Message" };
    let block = panel(title, screen.editing);
    let inner = block.inner(rows[1]);
    frame.render_widget(block, rows[1]);
    screen.input.render(frame, inner, screen.editing);
}

fn render_lessons(frame: &mut Frame, area: Rect, screen: &mut LessonsScreen) {
    let (left, right) = split_list_detail(area);
    let title = format!("Lessons ({})", screen.lessons.len());

    if screen.loading && screen.lessons.is_empty() {
        frame.render_widget(dim("Loading lessons...").block(panel(title, true)), left);
    } else {
        let items: Vec<ListItem> = screen
            .lessons
            .iter()
            .map(|l| ListItem::new(Line::from(l.title.clone())))
            .collect();
        let len = items.len();
        render_list(frame, left, list(items, panel(title, true)), screen.selected, len);
    }

    let mut detail = Vec::new();
    if let Some(lesson) = screen.selected_lesson() {
        detail.push(Line::from(Span::styled(
            lesson.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if !lesson.subtitle.is_empty() {
            detail.push(Line::from(Span::styled(
                lesson.subtitle.clone(),
                Style::default().fg(Color::Gray),
            )));
        }
        detail.push(Line::from(""));
        for point in &lesson.bullet_points {
            detail.push(Line::from(format!("• {}", point)));
        }
    }
    frame.render_widget(
        Paragraph::new(detail)
            .wrap(Wrap { trim: false })
            .block(panel("Slide", false)),
        right,
    );

    let saving = screen.saving;
    if let Some((_, form)) = screen.editor.as_mut() {
        render_editor(frame, "Edit lesson", form, saving);
    }
    screen.confirm.render(frame);
}

fn render_tests_editor(frame: &mut Frame, area: Rect, screen: &mut TestsEditorScreen) {
    let (left, right) = split_list_detail(area);
    let chunk_title = match screen.current_chunk() {
        Some(chunk) => format!(
            "← {}/{} {} →",
            screen.chunk_index + 1,
            screen.chunks.len(),
            chunk.chunk_title
        ),
        None => "Questions".to_string(),
    };

    if screen.loading && screen.tests.is_empty() {
        frame.render_widget(dim("Loading tests...").block(panel(chunk_title, true)), left);
    } else {
        let items: Vec<ListItem> = screen
            .chunk_tests()
            .iter()
            .map(|t| ListItem::new(Line::from(t.test_question.clone())))
            .collect();
        let len = items.len();
        render_list(frame, left, list(items, panel(chunk_title, true)), screen.selected, len);
    }

    let mut detail = Vec::new();
    if let Some(test) = screen.selected_test() {
        detail.push(Line::from(Span::styled(
            test.test_question.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        detail.push(Line::from(""));
        detail.push(Line::from(Span::styled(
            format!("✓ {}", test.correct_option),
            Style::default().fg(Color::Green),
        )));
        for option in &test.incorrect_options {
            detail.push(Line::from(Span::styled(
                format!("✗ {}", option),
                Style::default().fg(Color::Gray),
            )));
        }
    }
    frame.render_widget(
        Paragraph::new(detail)
            .wrap(Wrap { trim: false })
            .block(panel("Question", false)),
        right,
    );

    let saving = screen.saving;
    if let Some((_, form)) = screen.editor.as_mut() {
        render_editor(frame, "Edit question", form, saving);
    }
    screen.confirm.render(frame);
}

fn render_quiz(frame: &mut Frame, area: Rect, screen: &mut QuizScreen) {
    if screen.loading && screen.tests.is_empty() {
        frame.render_widget(dim("Loading test...").block(panel("Quiz", true)), area);
        return;
    }
    let Some(test) = screen.current_test() else {
        frame.render_widget(
            dim("This course has no questions yet.").block(panel("Quiz", true)),
            area,
        );
        return;
    };

    let title = format!(
        "Question {}/{} · {} answered",
        screen.index + 1,
        screen.tests.len(),
        screen.answered_count()
    );

    if screen.show_chunk {
        let (heading, body) = screen
            .current_chunk()
            .map(|c| (c.chunk_title.clone(), c.chunk_content.clone()))
            .unwrap_or_else(|| ("Source".to_string(), "Source chunk not found.".to_string()));
        frame.render_widget(
            Paragraph::new(body)
                .wrap(Wrap { trim: false })
                .block(panel(format!("{} (v to hide)", heading), true)),
            area,
        );
        return;
    }

    let answer = screen.answers.get(screen.index).copied().flatten();
    let mut lines = vec![
        Line::from(Span::styled(
            test.test_question.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (i, option) in test.options().into_iter().enumerate() {
        let marker = if answer == Some(i) { "(•)" } else { "( )" };
        let style = if i == screen.cursor {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!("{} {}", marker, option), style)));
    }
    lines.push(Line::from(""));
    let status = if screen.submitting {
        Span::styled("Submitting...", Style::default().fg(Color::Yellow))
    } else if screen.can_finish() {
        Span::styled("Press f to finish", Style::default().fg(Color::Green))
    } else {
        Span::styled(
            "Answer a question to enable finishing",
            Style::default().fg(Color::DarkGray),
        )
    };
    lines.push(Line::from(status));

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(panel(title, true)),
        area,
    );
}

fn render_scores(frame: &mut Frame, area: Rect, screen: &mut ScoresScreen) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let lines: Vec<Line> = screen.summary().into_iter().map(Line::from).collect();
    frame.render_widget(
        Paragraph::new(lines).block(panel("Your score", true)),
        rows[0],
    );

    if let Some(Some(score)) = &screen.score {
        let percent = u16::try_from(score.percentage().min(100)).unwrap_or(100);
        let color = if percent >= 50 { Color::Green } else { Color::Yellow };
        frame.render_widget(
            Gauge::default()
                .block(Block::default().borders(Borders::ALL))
                .gauge_style(Style::default().fg(color))
                .percent(percent),
            rows[1],
        );
    }
}

fn render_media(frame: &mut Frame, area: Rect, screen: &mut MediaScreen) {
    let mut lines = vec![
        Line::from("Download the generated lesson slides for this course."),
        Line::from(""),
        Line::from(vec![
            Span::styled("[p] ", Style::default().fg(Color::Yellow)),
            Span::raw("PowerPoint (.pptx)"),
        ]),
        Line::from(vec![
            Span::styled("[d] ", Style::default().fg(Color::Yellow)),
            Span::raw("PDF (.pdf)"),
        ]),
        Line::from(""),
    ];
    if let Some(format) = screen.downloading {
        lines.push(Line::from(Span::styled(
            format!("Downloading .{}...", format.extension()),
            Style::default().fg(Color::Yellow),
        )));
    }
    for path in &screen.saved {
        lines.push(Line::from(Span::styled(
            format!("Saved {}", path.display()),
            Style::default().fg(Color::Green),
        )));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(panel("Lesson decks", true)),
        area,
    );
}
