use crate::annotation::{
    generate_report, AnalysisReport, AnnotationRenderer, AnnotationView, BlobRegistry, SourceImage,
};
use crate::clinical::{DetectionResult, Detector, Identity, ImageUpload, PatientRecord};
use crate::dialogue::DialogueSession;
use crate::prelude::{EngineConfig, TriageResult};
use crate::session::machine::{SessionMachine, SessionState, Transition};
use crate::telemetry::{LogManager, MetricsRecorder};
use chrono::{DateTime, Utc};
use log::warn;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Everything that lives exactly as long as one analysis screen.
pub struct Analysis {
    patient: PatientRecord,
    detection: Arc<DetectionResult>,
    annotation: AnnotationView,
    dialogue: DialogueSession,
}

impl Analysis {
    pub fn epoch(&self) -> u64 {
        self.annotation.epoch()
    }

    pub fn patient(&self) -> &PatientRecord {
        &self.patient
    }

    pub fn detection(&self) -> &DetectionResult {
        &self.detection
    }

    pub fn annotation(&self) -> &AnnotationView {
        &self.annotation
    }

    pub fn dialogue(&self) -> &DialogueSession {
        &self.dialogue
    }

    pub fn dialogue_mut(&mut self) -> &mut DialogueSession {
        &mut self.dialogue
    }
}

/// Drives a [`SessionMachine`] and owns the analysis it unlocks.
///
/// After every operation the controller reconciles: leaving the analysis
/// screen drops the [`Analysis`] (cancelling its dialogue and releasing the
/// image handle); entering or refreshing it builds a new one on the machine's
/// current epoch.
pub struct SessionController {
    machine: SessionMachine,
    detector: Box<dyn Detector>,
    blobs: BlobRegistry,
    config: EngineConfig,
    runtime: Handle,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
    analysis: Option<Analysis>,
}

impl SessionController {
    pub fn new(
        detector: Box<dyn Detector>,
        config: EngineConfig,
        runtime: Handle,
        metrics: Arc<MetricsRecorder>,
    ) -> TriageResult<Self> {
        config.validate()?;
        Ok(Self {
            machine: SessionMachine::new(),
            detector,
            blobs: BlobRegistry::new(),
            config,
            runtime,
            metrics,
            logger: LogManager::new("session"),
            analysis: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.machine.identity()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    pub fn blobs(&self) -> &BlobRegistry {
        &self.blobs
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.analysis.as_ref()
    }

    pub fn analysis_mut(&mut self) -> Option<&mut Analysis> {
        self.analysis.as_mut()
    }

    pub fn login(&mut self, identity: Identity) -> Transition {
        let transition = self.machine.login(identity);
        self.reconcile(transition)
    }

    pub fn select_or_register_patient(&mut self, record: PatientRecord) -> Transition {
        let transition = self.machine.select_or_register_patient(record);
        self.reconcile(transition)
    }

    pub fn submit_image(&mut self, image: ImageUpload) -> Transition {
        let transition = self.machine.submit_image(image);
        self.reconcile(transition)
    }

    pub fn new_patient(&mut self) -> Transition {
        let transition = self.machine.new_patient();
        self.reconcile(transition)
    }

    pub fn logout(&mut self) -> Transition {
        let transition = self.machine.logout();
        self.reconcile(transition)
    }

    /// Image the shell should decode for the current analysis, tagged with its epoch.
    pub fn decode_request(&self) -> Option<(u64, ImageUpload)> {
        self.analysis
            .as_ref()
            .filter(|analysis| !analysis.annotation.is_loaded())
            .map(|analysis| (analysis.epoch(), analysis.annotation.upload().clone()))
    }

    /// Hands a finished decode to the current analysis. `false` when it is stale.
    pub fn attach_decoded(&mut self, epoch: u64, decoded: TriageResult<SourceImage>) -> bool {
        match self.analysis.as_mut() {
            Some(analysis) => analysis.annotation.attach(epoch, decoded),
            None => false,
        }
    }

    /// Appends whatever assistant turns have arrived since the last call.
    pub fn pump_dialogue(&mut self) -> usize {
        self.analysis
            .as_mut()
            .map(|analysis| analysis.dialogue.drain_ready())
            .unwrap_or(0)
    }

    /// Report for the analysis on screen. Pure: writing it out is up to the caller.
    pub fn report(&self, timestamp: DateTime<Utc>) -> Option<AnalysisReport> {
        self.analysis
            .as_ref()
            .map(|analysis| generate_report(&analysis.patient, &analysis.detection, timestamp))
    }

    fn reconcile(&mut self, transition: Transition) -> Transition {
        if transition == Transition::Ignored {
            return transition;
        }
        if self.machine.state() != SessionState::AnalysisView || transition.entered_analysis() {
            if let Some(previous) = self.analysis.take() {
                self.logger.record(&format!(
                    "closed analysis #{} for {}",
                    previous.epoch(),
                    previous.patient.name
                ));
            }
        }
        if transition.entered_analysis() {
            self.analysis = self.open_analysis();
        }
        transition
    }

    fn open_analysis(&self) -> Option<Analysis> {
        let patient = self.machine.patient()?.clone();
        let image = self.machine.image()?.clone();
        let epoch = self.machine.epoch();

        let detection = Arc::new(self.detector.analyze(&patient, &image));
        if let Err(err) = detection.validate() {
            warn!("detector returned an inconsistent result: {}", err);
        }

        let annotation = AnnotationView::new(
            epoch,
            self.blobs.acquire(image),
            detection.clone(),
            AnnotationRenderer::new(self.config.canvas),
        );
        let dialogue = DialogueSession::open(
            &patient,
            detection.clone(),
            &self.config.dialogue,
            self.runtime.clone(),
            self.metrics.clone(),
        );
        self.metrics.record_analysis();
        self.logger.record(&format!(
            "opened analysis #{} for {}: {} ({})",
            epoch,
            patient.name,
            detection.headline(),
            detection.confidence_label()
        ));
        Some(Analysis {
            patient,
            detection,
            annotation,
            dialogue,
        })
    }
}
