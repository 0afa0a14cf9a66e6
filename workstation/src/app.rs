use crate::config::WorkstationConfig;
use chrono::Utc;
use iced::widget::image;
use iced::Task;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use triagecore::annotation::{decode_in_background, RenderOutcome, SourceImage};
use triagecore::clinical::{FixedDetector, Identity, ImageUpload, PatientDirectory, PatientRecord};
use triagecore::session::Transition;
use triagecore::telemetry::MetricsRecorder;
use triagecore::{SessionController, SessionState, TriageError};

const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    LoginFieldChanged(LoginField, String),
    SignIn,
    SignOut,
    SearchChanged(String),
    SelectPatient(String),
    RegistrationFieldChanged(RegistrationField, String),
    Register,
    NewPatient,
    ImagePathChanged(String),
    LoadImage,
    ImageRead(Result<ImageUpload, String>),
    ImageDecoded(u64, Result<SourceImage, String>),
    DraftChanged(String),
    SendDraft,
    QuickReply(String),
    DownloadReport,
    ReportSaved(Result<PathBuf, String>),
}

#[derive(Debug, Clone, Copy)]
pub enum LoginField {
    Name,
    Email,
}

#[derive(Debug, Clone, Copy)]
pub enum RegistrationField {
    Name,
    Age,
    Gender,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub age: String,
    pub gender: String,
}

impl RegistrationForm {
    fn update_field(&mut self, field: RegistrationField, value: String) {
        match field {
            RegistrationField::Name => self.name = value,
            RegistrationField::Age => self.age = value,
            RegistrationField::Gender => self.gender = value,
        }
    }

    fn to_record(&self) -> PatientRecord {
        PatientRecord::new(self.name.trim(), self.age.trim(), self.gender.trim())
    }
}

/// Cached GPU handle for the composite of one analysis epoch.
pub struct Overlay {
    pub epoch: u64,
    pub handle: image::Handle,
}

pub struct Workstation {
    pub(crate) controller: Result<SessionController, String>,
    pub(crate) directory: PatientDirectory,
    pub(crate) report_dir: PathBuf,
    pub(crate) login: LoginForm,
    pub(crate) registration: RegistrationForm,
    pub(crate) search: String,
    pub(crate) image_path: String,
    pub(crate) overlay: Option<Overlay>,
    pub(crate) spinner: usize,
    pub(crate) status: String,
    pub(crate) history: Vec<String>,
}

impl Workstation {
    pub fn new(config: &WorkstationConfig, runtime: Handle) -> Self {
        let controller = SessionController::new(
            Box::new(FixedDetector::new(config.detection.clone())),
            config.engine.clone(),
            runtime,
            Arc::new(MetricsRecorder::new()),
        )
        .map_err(|err: TriageError| {
            error!("session engine unavailable: {}", err);
            err.to_string()
        });
        Self {
            controller,
            directory: config.directory.clone(),
            report_dir: config.report_dir.clone(),
            login: LoginForm::default(),
            registration: RegistrationForm::default(),
            search: String::new(),
            image_path: String::new(),
            overlay: None,
            spinner: 0,
            status: "Sign in to begin.".into(),
            history: Vec::new(),
        }
    }

    pub fn controller(&self) -> Option<&SessionController> {
        self.controller.as_ref().ok()
    }

    pub fn state(&self) -> SessionState {
        self.controller()
            .map(SessionController::state)
            .unwrap_or(SessionState::LoggedOut)
    }

    pub fn update(state: &mut Self, message: Message) -> Task<Message> {
        let Ok(controller) = state.controller.as_mut() else {
            return Task::none();
        };
        match message {
            Message::Tick => {
                state.spinner = state.spinner.wrapping_add(1);
                controller.pump_dialogue();
                Task::none()
            }
            Message::LoginFieldChanged(LoginField::Name, value) => {
                state.login.name = value;
                Task::none()
            }
            Message::LoginFieldChanged(LoginField::Email, value) => {
                state.login.email = value;
                Task::none()
            }
            Message::SignIn => {
                let identity = Identity::new(state.login.name.trim(), state.login.email.trim());
                if controller.login(identity) != Transition::Ignored {
                    state.login = LoginForm::default();
                    state.status = "Signed in. Register a patient and upload an X-ray.".into();
                    state.push_history("Operator signed in".into());
                }
                Task::none()
            }
            Message::SignOut => {
                controller.logout();
                state.reset_forms();
                state.status = "Signed out.".into();
                state.push_history("Operator signed out".into());
                Task::none()
            }
            Message::SearchChanged(value) => {
                state.search = value;
                Task::none()
            }
            Message::SelectPatient(id) => {
                let Some(record) = state.directory.get(&id).map(|entry| entry.to_record()) else {
                    warn!("unknown patient id {}", id);
                    return Task::none();
                };
                let name = record.name.clone();
                let transition = controller.select_or_register_patient(record);
                state.push_history(format!("Selected {}", name));
                state.after_transition(transition)
            }
            Message::RegistrationFieldChanged(field, value) => {
                state.registration.update_field(field, value);
                Task::none()
            }
            Message::Register => {
                let record = state.registration.to_record();
                let name = record.name.clone();
                let transition = controller.select_or_register_patient(record);
                if transition != Transition::Ignored {
                    state.push_history(format!("Registered {}", name));
                }
                state.after_transition(transition)
            }
            Message::NewPatient => {
                controller.new_patient();
                state.reset_forms();
                state.status = "Ready for a new patient.".into();
                Task::none()
            }
            Message::ImagePathChanged(value) => {
                state.image_path = value;
                Task::none()
            }
            Message::LoadImage => {
                let path = PathBuf::from(state.image_path.trim());
                if path.as_os_str().is_empty() {
                    return Task::none();
                }
                state.status = format!("Reading {}...", path.display());
                Task::perform(read_upload(path), Message::ImageRead)
            }
            Message::ImageRead(Ok(upload)) => {
                if !upload.looks_like_image() {
                    warn!("{} does not look like a PNG or JPEG", upload.file_name);
                }
                let file_name = upload.file_name.clone();
                let transition = controller.submit_image(upload);
                if transition != Transition::Ignored {
                    state.push_history(format!("Uploaded {}", file_name));
                }
                state.after_transition(transition)
            }
            Message::ImageRead(Err(err)) => {
                state.status = format!("Upload failed: {err}");
                Task::none()
            }
            Message::ImageDecoded(epoch, decoded) => {
                let decoded = decoded.map_err(TriageError::ImageDecode);
                if controller.attach_decoded(epoch, decoded) {
                    state.refresh_overlay();
                }
                Task::none()
            }
            Message::DraftChanged(value) => {
                if let Some(analysis) = controller.analysis_mut() {
                    analysis.dialogue_mut().set_draft(value);
                }
                Task::none()
            }
            Message::SendDraft => {
                if let Some(analysis) = controller.analysis_mut() {
                    analysis.dialogue_mut().submit_draft();
                }
                Task::none()
            }
            Message::QuickReply(suggestion) => {
                if let Some(analysis) = controller.analysis_mut() {
                    analysis.dialogue_mut().select_suggestion(&suggestion);
                }
                Task::none()
            }
            Message::DownloadReport => {
                let Some(report) = controller.report(Utc::now()) else {
                    return Task::none();
                };
                let dir = state.report_dir.clone();
                Task::perform(
                    async move {
                        tokio::task::spawn_blocking(move || report.write_to_dir(dir))
                            .await
                            .map_err(|err| err.to_string())?
                            .map_err(|err| err.to_string())
                    },
                    Message::ReportSaved,
                )
            }
            Message::ReportSaved(Ok(path)) => {
                info!("report written to {}", path.display());
                state.status = format!("Report saved to {}", path.display());
                state.push_history("Report downloaded".into());
                Task::none()
            }
            Message::ReportSaved(Err(err)) => {
                state.status = format!("Report failed: {err}");
                Task::none()
            }
        }
    }

    /// Starts decoding when the controller has just opened an analysis.
    fn after_transition(&mut self, transition: Transition) -> Task<Message> {
        if transition == Transition::Ignored {
            return Task::none();
        }
        if !transition.entered_analysis() {
            if self.state() != SessionState::AnalysisView {
                self.overlay = None;
            }
            self.status = match self.controller().and_then(|c| c.machine().patient()) {
                Some(patient) => format!("{} selected. Upload a chest X-ray.", patient.name),
                None => "Image received. Select or register a patient.".into(),
            };
            return Task::none();
        }

        self.overlay = None;
        self.registration = RegistrationForm::default();
        self.image_path.clear();
        self.status = "Analysis complete.".into();
        match self.controller().and_then(SessionController::decode_request) {
            Some((epoch, upload)) => Task::perform(decode_in_background(upload), move |result| {
                Message::ImageDecoded(epoch, result.map_err(|err| err.to_string()))
            }),
            None => Task::none(),
        }
    }

    fn refresh_overlay(&mut self) {
        let Some(analysis) = self.controller().and_then(SessionController::analysis) else {
            return;
        };
        let epoch = analysis.epoch();
        let rendered = match analysis.annotation().render() {
            RenderOutcome::Ready(composite) => Ok(Some(composite.to_rgba())),
            RenderOutcome::Failed(reason) => Err(reason.to_string()),
            RenderOutcome::Loading => Ok(None),
        };
        self.overlay = match rendered {
            Ok(Some((width, height, pixels))) => Some(Overlay {
                epoch,
                handle: image::Handle::from_rgba(width, height, pixels),
            }),
            Ok(None) => None,
            Err(reason) => {
                self.status = format!("Could not display the X-ray: {reason}");
                None
            }
        };
    }

    fn reset_forms(&mut self) {
        self.registration = RegistrationForm::default();
        self.image_path.clear();
        self.search.clear();
        self.overlay = None;
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
    }
}

async fn read_upload(path: PathBuf) -> Result<ImageUpload, String> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|err| format!("{}: {}", path.display(), err))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ImageUpload::new(file_name, bytes))
}
