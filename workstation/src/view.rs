use crate::app::{LoginField, Message, RegistrationField, Workstation};
use iced::{
    mouse,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path},
        column, image, row, scrollable, text, text_input, Column, Container,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Theme,
};
use std::f32::consts::PI;
use triagecore::annotation::RenderOutcome;
use triagecore::dialogue::{DialogueSession, Role};
use triagecore::session::Analysis;
use triagecore::{SessionController, SessionState};

const DISCLAIMER: &str = "AI-assisted triage. Findings must be confirmed by a qualified clinician before any treatment decision.";
const SPINNER_DOTS: usize = 8;

const WARNING: Color = Color {
    r: 0.94,
    g: 0.27,
    b: 0.27,
    a: 1.0,
};
const CLEAR: Color = Color {
    r: 0.13,
    g: 0.77,
    b: 0.37,
    a: 1.0,
};
const MUTED: Color = Color {
    r: 0.6,
    g: 0.6,
    b: 0.65,
    a: 1.0,
};

pub fn view(state: &Workstation) -> Element<'_, Message> {
    let body: Element<'_, Message> = match &state.controller {
        Err(reason) => column![
            text("Workstation unavailable").size(26),
            text(format!("The session engine could not start: {reason}")).size(14),
        ]
        .spacing(10)
        .padding(20)
        .into(),
        Ok(controller) => match controller.state() {
            SessionState::LoggedOut => login_view(state),
            SessionState::Dashboard => row![sidebar(state, controller), dashboard(state, controller)]
                .spacing(20)
                .align_y(Alignment::Start)
                .into(),
            SessionState::AnalysisView => {
                let main = match controller.analysis() {
                    Some(analysis) => analysis_view(state, controller, analysis),
                    None => text("Preparing analysis...").size(16).into(),
                };
                row![sidebar(state, controller), main]
                    .spacing(20)
                    .align_y(Alignment::Start)
                    .into()
            }
        },
    };

    Container::new(body)
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(20)
        .into()
}

fn login_view(state: &Workstation) -> Element<'_, Message> {
    let can_sign_in = !state.login.name.trim().is_empty();
    let form = column![
        text("Pneumonia Triage").size(28),
        text("Sign in with your clinical identity").size(14).color(MUTED),
        text_input("Full name", &state.login.name)
            .on_input(|value| Message::LoginFieldChanged(LoginField::Name, value))
            .on_submit(Message::SignIn)
            .padding(8),
        text_input("Email", &state.login.email)
            .on_input(|value| Message::LoginFieldChanged(LoginField::Email, value))
            .on_submit(Message::SignIn)
            .padding(8),
        button("Sign in")
            .on_press_maybe(can_sign_in.then_some(Message::SignIn))
            .padding(10),
        text(&state.status).size(12).color(MUTED),
    ]
    .spacing(12)
    .width(Length::Fixed(360.0));

    Container::new(form)
        .width(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

fn sidebar<'a>(state: &'a Workstation, controller: &'a SessionController) -> Element<'a, Message> {
    let operator = controller
        .identity()
        .map(|identity| {
            let initial = identity.initial().unwrap_or('?');
            format!("[{}] {}", initial.to_ascii_uppercase(), identity.name)
        })
        .unwrap_or_default();

    let matches = state.directory.search(&state.search);
    let patients = if matches.is_empty() {
        Column::new().push(text("No matching patients").size(12).color(MUTED))
    } else {
        matches.into_iter().fold(Column::new().spacing(6), |col, entry| {
            col.push(
                button(
                    column![
                        text(entry.name.clone()).size(14),
                        text(format!(
                            "{} yrs, {} | {} | {}",
                            entry.age,
                            entry.gender,
                            entry.last_visit.format("%Y-%m-%d"),
                            entry.status.badge()
                        ))
                        .size(11),
                    ]
                    .spacing(2),
                )
                .on_press(Message::SelectPatient(entry.id.clone()))
                .width(Length::Fill)
                .padding(6),
            )
        })
    };

    let history = state
        .history
        .iter()
        .rev()
        .fold(Column::new().spacing(2), |col, entry| {
            col.push(text(entry.clone()).size(11).color(MUTED))
        });

    column![
        text(operator).size(16),
        button("New patient").on_press(Message::NewPatient).padding(8),
        text_input("Search patients", &state.search)
            .on_input(Message::SearchChanged)
            .padding(6),
        scrollable(patients).height(Length::Fixed(320.0)),
        text("Activity").size(14),
        scrollable(history).height(Length::Fixed(120.0)),
        button("Sign out").on_press(Message::SignOut).padding(8),
    ]
    .spacing(10)
    .width(Length::Fixed(260.0))
    .into()
}

fn dashboard<'a>(state: &'a Workstation, controller: &'a SessionController) -> Element<'a, Message> {
    let selected = match controller.machine().patient() {
        Some(patient) => format!(
            "Patient: {} ({} yrs, {})",
            patient.name, patient.age, patient.gender
        ),
        None => "No patient selected".into(),
    };
    let image_note = match controller.machine().image() {
        Some(upload) => format!("X-ray: {}", upload.file_name),
        None => "No X-ray uploaded".into(),
    };

    let registration = column![
        text("Register patient").size(22),
        text_input("Patient name", &state.registration.name)
            .on_input(|value| Message::RegistrationFieldChanged(RegistrationField::Name, value))
            .padding(6),
        text_input("Age", &state.registration.age)
            .on_input(|value| Message::RegistrationFieldChanged(RegistrationField::Age, value))
            .padding(6),
        text_input("Gender", &state.registration.gender)
            .on_input(|value| Message::RegistrationFieldChanged(RegistrationField::Gender, value))
            .on_submit(Message::Register)
            .padding(6),
        button("Save patient").on_press(Message::Register).padding(8),
    ]
    .spacing(8);

    let upload = column![
        text("Upload chest X-ray").size(22),
        text_input("Path to PNG or JPEG", &state.image_path)
            .on_input(Message::ImagePathChanged)
            .on_submit(Message::LoadImage)
            .padding(6),
        button("Upload").on_press(Message::LoadImage).padding(8),
    ]
    .spacing(8);

    column![
        text("Dashboard").size(26),
        text(selected).size(14),
        text(image_note).size(14),
        registration,
        upload,
        text(&state.status).size(12).color(MUTED),
    ]
    .spacing(16)
    .width(Length::Fill)
    .into()
}

fn analysis_view<'a>(
    state: &'a Workstation,
    controller: &'a SessionController,
    analysis: &'a Analysis,
) -> Element<'a, Message> {
    let detection = analysis.detection();
    let tone = if detection.has_condition { WARNING } else { CLEAR };

    let overlay: Element<'a, Message> = match analysis.annotation().render() {
        RenderOutcome::Ready(_) => match &state.overlay {
            Some(overlay) if overlay.epoch == analysis.epoch() => image(overlay.handle.clone())
                .width(Length::Fixed(400.0))
                .height(Length::Fixed(400.0))
                .into(),
            _ => loading(state.spinner),
        },
        RenderOutcome::Loading => loading(state.spinner),
        RenderOutcome::Failed(reason) => text(format!("X-ray could not be displayed: {reason}"))
            .size(12)
            .color(WARNING)
            .into(),
    };

    let recommendations = detection
        .recommendations
        .iter()
        .fold(Column::new().spacing(4), |col, item| {
            col.push(text(format!("- {item}")).size(13))
        });

    let findings = column![
        text(format!("Patient: {}", analysis.patient().name)).size(16),
        text(detection.headline()).size(24).color(tone),
        text(format!("Confidence {}", detection.confidence_label())).size(14),
        text(format!(
            "Severity: {} | Affected regions: {}",
            detection.severity,
            detection.affected_regions.len()
        ))
        .size(14),
        text("Recommendations").size(16),
        recommendations,
        button("Download report").on_press(Message::DownloadReport).padding(8),
        text(&state.status).size(12).color(MUTED),
    ]
    .spacing(8)
    .width(Length::Fill);

    let metrics = controller.metrics().snapshot();
    let footer = text(format!(
        "analyses {} | operator turns {} | replies {} | follow-ups {} | cancelled {}",
        metrics.analyses_opened,
        metrics.operator_turns,
        metrics.assistant_replies,
        metrics.follow_ups,
        metrics.cancelled
    ))
    .size(11)
    .color(MUTED);

    column![
        row![overlay, findings].spacing(20).align_y(Alignment::Start),
        chat_panel(analysis.dialogue(), state.spinner),
        text(DISCLAIMER).size(11).color(MUTED),
        footer,
    ]
    .spacing(14)
    .width(Length::Fill)
    .into()
}

fn chat_panel(dialogue: &DialogueSession, spinner: usize) -> Element<'_, Message> {
    let messages = dialogue
        .timeline()
        .iter()
        .fold(Column::new().spacing(8), |col, message| {
            let speaker = match message.role {
                Role::Operator => "You",
                Role::Assistant => "Assistant",
            };
            let mut entry = column![
                text(format!("{} | {}", speaker, message.created_at.format("%H:%M")))
                    .size(11)
                    .color(MUTED),
                text(message.text.clone()).size(13),
            ]
            .spacing(2);
            if let Some(suggestions) = &message.suggested_replies {
                let replies = suggestions.iter().fold(row![].spacing(6), |r, suggestion| {
                    r.push(
                        button(text(suggestion.clone()).size(12))
                            .on_press(Message::QuickReply(suggestion.clone()))
                            .padding(4),
                    )
                });
                entry = entry.push(replies);
            }
            col.push(entry)
        });

    let typing = if dialogue.pending_reply() {
        let dots = ".".repeat(spinner % 3 + 1);
        text(format!("Assistant is typing{dots}")).size(12).color(MUTED)
    } else {
        text("").size(12)
    };

    let can_send = !dialogue.draft().trim().is_empty();
    column![
        text("Consultation").size(18),
        scrollable(messages).height(Length::Fixed(220.0)),
        typing,
        row![
            text_input("Describe symptoms or ask a question", dialogue.draft())
                .on_input(Message::DraftChanged)
                .on_submit(Message::SendDraft)
                .padding(6),
            button("Send")
                .on_press_maybe(can_send.then_some(Message::SendDraft))
                .padding(6),
        ]
        .spacing(8),
    ]
    .spacing(8)
    .into()
}

fn loading<'a>(phase: usize) -> Element<'a, Message> {
    Canvas::new(LoadingIndicator { phase })
        .width(Length::Fixed(400.0))
        .height(Length::Fixed(400.0))
        .into()
}

/// Ring of dots with one highlighted position that advances each tick.
#[derive(Clone)]
struct LoadingIndicator {
    phase: usize,
}

impl canvas::Program<Message> for LoadingIndicator {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::BLACK);

        let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
        let radius = bounds.width.min(bounds.height) / 8.0;
        let active = self.phase % SPINNER_DOTS;

        for dot in 0..SPINNER_DOTS {
            let angle = dot as f32 / SPINNER_DOTS as f32 * 2.0 * PI;
            let position = Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );
            let color = if dot == active {
                Color::from_rgb(0.23, 0.51, 0.96)
            } else {
                Color::from_rgb(0.25, 0.25, 0.3)
            };
            let marker = Path::new(|builder| builder.circle(position, 5.0));
            frame.fill(&marker, color);
        }

        vec![frame.into_geometry()]
    }
}
