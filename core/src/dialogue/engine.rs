use crate::clinical::{DetectionResult, PatientRecord};
use crate::dialogue::message::{Message, Timeline};
use crate::dialogue::pacing::{Pacer, UniformPacer};
use crate::dialogue::rules::{classify, Topic};
use crate::dialogue::script::{opening_for, FOLLOW_UP_PROMPT};
use crate::dialogue::tasks::TaskQueue;
use crate::prelude::DialogueConfig;
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    Idle,
    AwaitingReply,
}

#[derive(Debug)]
enum DeliveryKind {
    FollowUp,
    Reply(Topic),
}

/// Append request sent by a scheduled task back to the owning session.
#[derive(Debug)]
struct Delivery {
    kind: DeliveryKind,
    text: String,
}

/// Scripted triage conversation for one analysis.
///
/// The session is the only writer of its timeline. Delayed assistant turns
/// run as tokio tasks that post a [`Delivery`] on the session's channel; the
/// owner appends them through [`drain_ready`](Self::drain_ready) or
/// [`next_delivery`](Self::next_delivery). Dropping the session aborts every
/// task still in flight and discards deliveries not yet appended.
pub struct DialogueSession {
    detection: Arc<DetectionResult>,
    timeline: Timeline,
    draft: String,
    awaiting: usize,
    pending: usize,
    tasks: TaskQueue,
    sender: UnboundedSender<Delivery>,
    deliveries: UnboundedReceiver<Delivery>,
    pacer: Box<dyn Pacer>,
    runtime: Handle,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl DialogueSession {
    pub fn open(
        patient: &PatientRecord,
        detection: Arc<DetectionResult>,
        config: &DialogueConfig,
        runtime: Handle,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self::open_with_pacer(
            patient,
            detection,
            config.follow_up_delay(),
            Box::new(UniformPacer::from_config(config)),
            runtime,
            metrics,
        )
    }

    pub fn open_with_pacer(
        patient: &PatientRecord,
        detection: Arc<DetectionResult>,
        follow_up_delay: Duration,
        pacer: Box<dyn Pacer>,
        runtime: Handle,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        let (sender, deliveries) = mpsc::unbounded_channel();
        let mut session = Self {
            detection,
            timeline: Timeline::new(),
            draft: String::new(),
            awaiting: 0,
            pending: 0,
            tasks: TaskQueue::new(),
            sender,
            deliveries,
            pacer,
            runtime,
            metrics,
            logger: LogManager::new("dialogue"),
        };

        let opening = opening_for(&patient.name, &session.detection);
        session
            .timeline
            .append(Message::assistant(opening.text, Some(opening.suggested_replies)));
        if session.detection.has_condition {
            session.schedule(
                follow_up_delay,
                Delivery {
                    kind: DeliveryKind::FollowUp,
                    text: FOLLOW_UP_PROMPT.to_string(),
                },
            );
        }
        session.logger.record(&format!(
            "opened consultation for {} (condition: {})",
            patient.name, session.detection.has_condition
        ));
        session
    }

    pub fn detection(&self) -> &DetectionResult {
        &self.detection
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Copies a quick reply into the draft; sending stays with the operator.
    pub fn select_suggestion(&mut self, suggestion: &str) {
        self.draft = suggestion.to_string();
    }

    pub fn state(&self) -> DialogueState {
        if self.awaiting > 0 {
            DialogueState::AwaitingReply
        } else {
            DialogueState::Idle
        }
    }

    pub fn pending_reply(&self) -> bool {
        self.state() == DialogueState::AwaitingReply
    }

    /// Assistant turns scheduled but not yet on the timeline.
    pub fn pending_deliveries(&self) -> usize {
        self.pending
    }

    /// Accepts operator text. Blank input is ignored and leaves the state alone.
    pub fn submit(&mut self, text: &str) -> Option<Uuid> {
        if text.trim().is_empty() {
            return None;
        }
        let id = self.timeline.append(Message::operator(text)).id;
        self.draft.clear();
        self.awaiting += 1;
        self.metrics.record_operator_turn();

        let (topic, reply) = classify(text);
        let delay = self.pacer.next_delay();
        self.logger
            .trace(&format!("reply {:?} scheduled in {}ms", topic, delay.as_millis()));
        self.schedule(
            delay,
            Delivery {
                kind: DeliveryKind::Reply(topic),
                text: reply.to_string(),
            },
        );
        Some(id)
    }

    pub fn submit_draft(&mut self) -> Option<Uuid> {
        let draft = std::mem::take(&mut self.draft);
        let submitted = self.submit(&draft);
        if submitted.is_none() {
            self.draft = draft;
        }
        submitted
    }

    /// Appends every delivery that has already arrived, without waiting.
    pub fn drain_ready(&mut self) -> usize {
        let mut appended = 0;
        while let Ok(delivery) = self.deliveries.try_recv() {
            self.apply(delivery);
            appended += 1;
        }
        appended
    }

    /// Waits for the next scheduled turn; `None` once nothing is outstanding.
    pub async fn next_delivery(&mut self) -> Option<&Message> {
        if self.pending == 0 {
            return None;
        }
        let delivery = self.deliveries.recv().await?;
        Some(self.apply(delivery))
    }

    pub async fn settle(&mut self) {
        while self.next_delivery().await.is_some() {}
    }

    fn schedule(&mut self, delay: Duration, delivery: Delivery) {
        let sender = self.sender.clone();
        self.pending += 1;
        self.tasks.spawn(&self.runtime, async move {
            tokio::time::sleep(delay).await;
            // The receiver only disappears with the session itself.
            let _ = sender.send(delivery);
        });
    }

    fn apply(&mut self, delivery: Delivery) -> &Message {
        self.pending = self.pending.saturating_sub(1);
        match delivery.kind {
            DeliveryKind::FollowUp => self.metrics.record_follow_up(),
            DeliveryKind::Reply(topic) => {
                self.awaiting = self.awaiting.saturating_sub(1);
                self.metrics.record_reply();
                self.logger.trace(&format!("reply {:?} delivered", topic));
            }
        }
        self.timeline.append(Message::assistant(delivery.text, None))
    }
}

impl Drop for DialogueSession {
    fn drop(&mut self) {
        let sleeping = self.tasks.outstanding();
        self.tasks.cancel_all();
        if self.pending > 0 {
            self.metrics.record_cancelled(self.pending);
            self.logger.record(&format!(
                "discarded {} pending assistant turns ({} timers aborted)",
                self.pending, sleeping
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::message::Role;
    use crate::dialogue::pacing::ScriptedPacer;
    use crate::dialogue::rules::{GRATITUDE_REPLY, SYMPTOMS_REPLY, TREATMENT_REPLY};

    const SECOND: Duration = Duration::from_millis(1000);

    fn patient() -> PatientRecord {
        PatientRecord::new("John Q Smith", "45", "male")
    }

    fn session_with(
        detection: DetectionResult,
        delays: Vec<Duration>,
        metrics: Arc<MetricsRecorder>,
    ) -> DialogueSession {
        DialogueSession::open_with_pacer(
            &patient(),
            Arc::new(detection),
            2 * SECOND,
            Box::new(ScriptedPacer::new(delays, 2 * SECOND)),
            Handle::current(),
            metrics,
        )
    }

    fn texts(session: &DialogueSession) -> Vec<(Role, String)> {
        session
            .timeline()
            .iter()
            .map(|m| (m.role, m.text.clone()))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn positive_session_opens_then_follows_up() {
        let mut session = session_with(DetectionResult::reference(), vec![], Arc::default());
        assert_eq!(session.timeline().len(), 1);
        let opening = &session.timeline().messages()[0];
        assert_eq!(opening.role, Role::Assistant);
        assert_eq!(opening.suggested_replies.as_ref().map(Vec::len), Some(3));
        assert_eq!(session.state(), DialogueState::Idle);

        let follow_up = session.next_delivery().await.unwrap();
        assert_eq!(follow_up.text, FOLLOW_UP_PROMPT);
        assert!(follow_up.suggested_replies.is_none());
        assert!(session.next_delivery().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_session_has_no_follow_up() {
        let mut session = session_with(DetectionResult::clear(0.9), vec![], Arc::default());
        assert_eq!(session.pending_deliveries(), 0);
        session.settle().await;
        assert_eq!(session.timeline().len(), 1);
        assert!(session.timeline().messages()[0].text.starts_with("Good news!"));
    }

    #[tokio::test(start_paused = true)]
    async fn blank_submissions_are_ignored() {
        let mut session = session_with(DetectionResult::clear(0.9), vec![], Arc::default());
        assert!(session.submit("").is_none());
        assert!(session.submit("   \t\n").is_none());
        session.set_draft("  ");
        assert!(session.submit_draft().is_none());
        assert_eq!(session.draft(), "  ");
        assert_eq!(session.timeline().len(), 1);
        assert_eq!(session.state(), DialogueState::Idle);
        assert_eq!(session.pending_deliveries(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn submission_awaits_scripted_reply() {
        let metrics = Arc::new(MetricsRecorder::new());
        let mut session = session_with(DetectionResult::clear(0.9), vec![SECOND], metrics.clone());
        session.set_draft("cough and fever");
        let id = session.submit_draft().unwrap();
        assert_eq!(session.draft(), "");
        assert_eq!(session.timeline().last().unwrap().id, id);
        assert_eq!(session.state(), DialogueState::AwaitingReply);
        assert!(session.pending_reply());

        let reply = session.next_delivery().await.unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.text, SYMPTOMS_REPLY);
        assert_eq!(session.state(), DialogueState::Idle);
        assert_eq!(metrics.snapshot().assistant_replies, 1);
        assert_eq!(metrics.snapshot().operator_turns, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn replies_arrive_in_delay_order() {
        let mut session = session_with(
            DetectionResult::clear(0.9),
            vec![2 * SECOND, SECOND / 2],
            Arc::default(),
        );
        session.submit("I want treatment, thank you");
        session.submit("thanks");
        assert_eq!(session.state(), DialogueState::AwaitingReply);

        session.next_delivery().await;
        assert_eq!(session.state(), DialogueState::AwaitingReply);
        session.settle().await;
        assert_eq!(session.state(), DialogueState::Idle);

        let log = texts(&session);
        assert_eq!(log[1], (Role::Operator, "I want treatment, thank you".to_string()));
        assert_eq!(log[2], (Role::Operator, "thanks".to_string()));
        assert_eq!(log[3], (Role::Assistant, GRATITUDE_REPLY.to_string()));
        assert_eq!(log[4], (Role::Assistant, TREATMENT_REPLY.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn follow_up_interleaves_with_operator_turns() {
        let mut session = session_with(DetectionResult::reference(), vec![3 * SECOND], Arc::default());
        session.submit("medical history?");
        session.settle().await;
        let roles: Vec<_> = session.timeline().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::Assistant, Role::Operator, Role::Assistant, Role::Assistant]
        );
        assert_eq!(session.timeline().messages()[2].text, FOLLOW_UP_PROMPT);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_ready_appends_only_elapsed_deliveries() {
        let mut session = session_with(DetectionResult::clear(0.9), vec![SECOND], Arc::default());
        session.submit("thank you");
        assert_eq!(session.drain_ready(), 0);
        tokio::time::sleep(SECOND + SECOND / 10).await;
        assert_eq!(session.drain_ready(), 1);
        assert_eq!(session.timeline().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn quick_reply_fills_draft_without_sending() {
        let mut session = session_with(DetectionResult::reference(), vec![], Arc::default());
        let suggestion = session.timeline().messages()[0]
            .suggested_replies
            .clone()
            .unwrap()[2]
            .clone();
        session.select_suggestion(&suggestion);
        assert_eq!(session.draft(), "Treatment options");
        assert_eq!(session.timeline().len(), 1);
        assert_eq!(session.state(), DialogueState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_session_cancels_pending_turns() {
        let metrics = Arc::new(MetricsRecorder::new());
        let mut session = session_with(DetectionResult::reference(), vec![SECOND], metrics.clone());
        session.submit("fever");
        drop(session);
        tokio::time::sleep(10 * SECOND).await;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cancelled, 2);
        assert_eq!(snapshot.assistant_replies, 0);
        assert_eq!(snapshot.follow_ups, 0);

        let fresh = session_with(DetectionResult::reference(), vec![], metrics.clone());
        assert_eq!(fresh.timeline().len(), 1);
    }
}
