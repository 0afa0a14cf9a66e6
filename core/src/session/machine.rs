use crate::clinical::{Identity, ImageUpload, PatientRecord};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    LoggedOut,
    Dashboard,
    AnalysisView,
}

/// Observable outcome of a session operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Input failed a gate; nothing changed.
    Ignored,
    /// Slots changed but the screen did not.
    Stayed(SessionState),
    Moved {
        from: SessionState,
        to: SessionState,
    },
    /// A new image replaced the one under analysis.
    Refreshed,
}

impl Transition {
    pub fn entered_analysis(&self) -> bool {
        matches!(
            self,
            Transition::Refreshed
                | Transition::Moved {
                    to: SessionState::AnalysisView,
                    ..
                }
        )
    }
}

/// Both slots filled is the only way into the analysis screen.
pub fn ready_for_analysis(patient: Option<&PatientRecord>, image: Option<&ImageUpload>) -> bool {
    patient.is_some() && image.is_some()
}

/// Workflow sequencing: login, registration and upload, analysis.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    state: SessionState,
    identity: Option<Identity>,
    patient: Option<PatientRecord>,
    image: Option<ImageUpload>,
    epoch: u64,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::LoggedOut,
            identity: None,
            patient: None,
            image: None,
            epoch: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn patient(&self) -> Option<&PatientRecord> {
        self.patient.as_ref()
    }

    pub fn image(&self) -> Option<&ImageUpload> {
        self.image.as_ref()
    }

    /// Increments on every entry into (or refresh of) the analysis screen.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn login(&mut self, identity: Identity) -> Transition {
        if self.state != SessionState::LoggedOut || !identity.is_valid() {
            return Transition::Ignored;
        }
        self.identity = Some(identity);
        self.move_to(SessionState::Dashboard)
    }

    pub fn select_or_register_patient(&mut self, record: PatientRecord) -> Transition {
        if !record.is_complete() {
            return Transition::Ignored;
        }
        match self.state {
            SessionState::LoggedOut => Transition::Ignored,
            SessionState::AnalysisView => {
                self.image = None;
                self.patient = Some(record);
                self.move_to(SessionState::Dashboard)
            }
            SessionState::Dashboard => {
                self.patient = Some(record);
                self.apply_gate()
            }
        }
    }

    pub fn submit_image(&mut self, image: ImageUpload) -> Transition {
        if image.is_empty() {
            return Transition::Ignored;
        }
        match self.state {
            SessionState::LoggedOut => Transition::Ignored,
            SessionState::AnalysisView => {
                self.image = Some(image);
                self.epoch += 1;
                Transition::Refreshed
            }
            SessionState::Dashboard => {
                self.image = Some(image);
                self.apply_gate()
            }
        }
    }

    pub fn new_patient(&mut self) -> Transition {
        if self.state == SessionState::LoggedOut {
            return Transition::Ignored;
        }
        self.patient = None;
        self.image = None;
        self.move_to(SessionState::Dashboard)
    }

    pub fn logout(&mut self) -> Transition {
        self.identity = None;
        self.patient = None;
        self.image = None;
        self.move_to(SessionState::LoggedOut)
    }

    fn apply_gate(&mut self) -> Transition {
        if ready_for_analysis(self.patient.as_ref(), self.image.as_ref()) {
            self.epoch += 1;
            self.move_to(SessionState::AnalysisView)
        } else {
            Transition::Stayed(self.state)
        }
    }

    fn move_to(&mut self, to: SessionState) -> Transition {
        let from = self.state;
        self.state = to;
        if from == to {
            Transition::Stayed(to)
        } else {
            Transition::Moved { from, to }
        }
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator() -> Identity {
        Identity::new("Dr. Grey", "grey@clinic.org")
    }

    fn patient() -> PatientRecord {
        PatientRecord::new("John Q Smith", "45", "male")
    }

    fn image() -> ImageUpload {
        ImageUpload::new("chest.png", vec![1u8, 2, 3])
    }

    fn logged_in() -> SessionMachine {
        let mut machine = SessionMachine::new();
        machine.login(operator());
        machine
    }

    #[test]
    fn starts_logged_out_and_logs_in() {
        let mut machine = SessionMachine::new();
        assert_eq!(machine.state(), SessionState::LoggedOut);
        assert_eq!(machine.login(Identity::new(" ", "x@y")), Transition::Ignored);
        assert_eq!(
            machine.login(operator()),
            Transition::Moved {
                from: SessionState::LoggedOut,
                to: SessionState::Dashboard
            }
        );
        assert_eq!(machine.login(operator()), Transition::Ignored);
    }

    #[test]
    fn image_before_patient_waits_on_dashboard() {
        let mut machine = logged_in();
        assert_eq!(
            machine.submit_image(image()),
            Transition::Stayed(SessionState::Dashboard)
        );
        assert!(machine.image().is_some());
        let transition = machine.select_or_register_patient(patient());
        assert!(transition.entered_analysis());
        assert_eq!(machine.state(), SessionState::AnalysisView);
    }

    #[test]
    fn patient_before_image_enters_on_upload() {
        let mut machine = logged_in();
        assert_eq!(
            machine.select_or_register_patient(patient()),
            Transition::Stayed(SessionState::Dashboard)
        );
        assert!(machine.submit_image(image()).entered_analysis());
        assert_eq!(machine.epoch(), 1);
    }

    #[test]
    fn incomplete_registration_is_a_silent_no_op() {
        let mut machine = logged_in();
        let transition = machine.select_or_register_patient(PatientRecord::new("Ann", "", "f"));
        assert_eq!(transition, Transition::Ignored);
        assert!(machine.patient().is_none());
        assert_eq!(machine.state(), SessionState::Dashboard);
    }

    #[test]
    fn empty_upload_is_ignored() {
        let mut machine = logged_in();
        machine.select_or_register_patient(patient());
        let empty = ImageUpload::new("empty.png", Vec::<u8>::new());
        assert_eq!(machine.submit_image(empty), Transition::Ignored);
        assert_eq!(machine.state(), SessionState::Dashboard);
    }

    #[test]
    fn logged_out_machine_ignores_slot_updates() {
        let mut machine = SessionMachine::new();
        assert_eq!(machine.select_or_register_patient(patient()), Transition::Ignored);
        assert_eq!(machine.submit_image(image()), Transition::Ignored);
        assert_eq!(machine.new_patient(), Transition::Ignored);
        assert!(machine.patient().is_none());
    }

    #[test]
    fn new_image_during_analysis_refreshes() {
        let mut machine = logged_in();
        machine.select_or_register_patient(patient());
        machine.submit_image(image());
        assert_eq!(machine.submit_image(image()), Transition::Refreshed);
        assert_eq!(machine.epoch(), 2);
        assert_eq!(machine.state(), SessionState::AnalysisView);
    }

    #[test]
    fn selecting_patient_during_analysis_returns_to_dashboard() {
        let mut machine = logged_in();
        machine.select_or_register_patient(patient());
        machine.submit_image(image());
        let other = PatientRecord::new("Maria Garcia", "28", "Female");
        machine.select_or_register_patient(other.clone());
        assert_eq!(machine.state(), SessionState::Dashboard);
        assert_eq!(machine.patient(), Some(&other));
        assert!(machine.image().is_none());
    }

    #[test]
    fn new_patient_clears_both_slots() {
        let mut machine = logged_in();
        machine.select_or_register_patient(patient());
        machine.submit_image(image());
        assert_eq!(
            machine.new_patient(),
            Transition::Moved {
                from: SessionState::AnalysisView,
                to: SessionState::Dashboard
            }
        );
        assert!(machine.patient().is_none());
        assert!(machine.image().is_none());
        assert!(machine.identity().is_some());
    }

    #[test]
    fn logout_clears_everything_from_any_state() {
        let mut machine = logged_in();
        machine.select_or_register_patient(patient());
        machine.submit_image(image());
        machine.logout();
        assert_eq!(machine.state(), SessionState::LoggedOut);
        assert!(machine.identity().is_none());
        assert!(machine.patient().is_none());
        assert!(machine.image().is_none());
        assert_eq!(
            SessionMachine::new().logout(),
            Transition::Stayed(SessionState::LoggedOut)
        );
    }

    #[test]
    fn gate_is_a_pure_two_slot_check() {
        assert!(!ready_for_analysis(None, None));
        assert!(!ready_for_analysis(Some(&patient()), None));
        assert!(!ready_for_analysis(None, Some(&image())));
        assert!(ready_for_analysis(Some(&patient()), Some(&image())));
    }
}
