use crate::clinical::DetectionResult;

pub const FOLLOW_UP_PROMPT: &str = "Let's start with the current symptoms. Is the patient experiencing any of the following: cough, fever, shortness of breath, chest pain, or fatigue?";

const POSITIVE_SUGGESTIONS: [&str; 3] = [
    "Tell me about current symptoms",
    "Medical history questions",
    "Treatment options",
];

const CLEAR_SUGGESTIONS: [&str; 3] = [
    "Explain the results",
    "Preventive care",
    "General questions",
];

/// Opening assistant turn, chosen by the diagnosis outcome alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opening {
    pub text: String,
    pub suggested_replies: Vec<String>,
}

pub fn opening_for(patient_name: &str, detection: &DetectionResult) -> Opening {
    if detection.has_condition {
        Opening {
            text: format!(
                "I've detected pneumonia in {}'s chest X-ray. To provide the best treatment recommendations, I need to gather some additional medical history and current symptoms. Let's start with a few questions.",
                patient_name
            ),
            suggested_replies: POSITIVE_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    } else {
        Opening {
            text: format!(
                "Good news! The analysis shows no signs of pneumonia in {}'s chest X-ray. However, I'm here to help with any questions you might have about the results or general respiratory health.",
                patient_name
            ),
            suggested_replies: CLEAR_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
