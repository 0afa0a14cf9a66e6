//! Ordered keyword table for scripted assistant replies.
//!
//! Rules are evaluated top to bottom against the lowercased operator text and
//! the first rule with a matching keyword answers. Keyword position inside the
//! text plays no part; only table order does.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Symptoms,
    History,
    Treatment,
    Duration,
    Gratitude,
    Fallback,
}

pub struct ResponseRule {
    pub topic: Topic,
    pub keywords: &'static [&'static str],
    pub reply: &'static str,
}

impl ResponseRule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

pub const SYMPTOMS_REPLY: &str = "Thank you for that information. Based on the symptoms you've described along with the X-ray findings, this confirms our pneumonia diagnosis. How long have these symptoms been present? This will help determine the urgency of treatment.";

pub const HISTORY_REPLY: &str = "Please tell me about any relevant medical history: Does the patient have any chronic conditions like diabetes, COPD, or heart disease? Are they currently taking any medications? Any allergies to antibiotics?";

pub const TREATMENT_REPLY: &str = "Based on the moderate pneumonia detected and the symptoms provided, I recommend: 1) Immediate antibiotic therapy (amoxicillin-clavulanate or azithromycin), 2) Supportive care with rest and fluids, 3) Follow-up chest X-ray in 7-10 days, 4) Monitor for worsening symptoms. Please consult with a physician for proper prescription and monitoring.";

pub const DURATION_REPLY: &str = "If symptoms have been present for more than 2-3 days and are worsening, this suggests an active infection that requires prompt treatment. I recommend starting antibiotic therapy as soon as possible and monitoring the patient closely.";

pub const GRATITUDE_REPLY: &str = "You're welcome! Is there anything else about the diagnosis or treatment plan you'd like me to explain?";

pub const DEFAULT_REPLY: &str = "I understand your concern. Could you please provide more specific details about the symptoms or medical history? This will help me give you more targeted recommendations for the pneumonia treatment.";

pub static RESPONSE_RULES: [ResponseRule; 5] = [
    ResponseRule {
        topic: Topic::Symptoms,
        keywords: &["cough", "fever", "shortness", "chest pain"],
        reply: SYMPTOMS_REPLY,
    },
    ResponseRule {
        topic: Topic::History,
        keywords: &["history", "medical"],
        reply: HISTORY_REPLY,
    },
    ResponseRule {
        topic: Topic::Treatment,
        keywords: &["treatment", "therapy"],
        reply: TREATMENT_REPLY,
    },
    ResponseRule {
        topic: Topic::Duration,
        keywords: &["days", "week"],
        reply: DURATION_REPLY,
    },
    ResponseRule {
        topic: Topic::Gratitude,
        keywords: &["thank"],
        reply: GRATITUDE_REPLY,
    },
];

/// Single dispatch point over [`RESPONSE_RULES`].
pub fn classify(text: &str) -> (Topic, &'static str) {
    let lowered = text.to_lowercase();
    RESPONSE_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| (rule.topic, rule.reply))
        .unwrap_or((Topic::Fallback, DEFAULT_REPLY))
}

pub fn respond(text: &str) -> &'static str {
    classify(text).1
}
