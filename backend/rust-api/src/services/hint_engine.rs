//! Hint-safety loop: generate a tutoring hint, ask an evaluator whether it
//! leaks the reference answer, and regenerate with a corrective clause until
//! a safe candidate comes back or the attempt budget runs out.
//!
//! The loop is written once and parameterized by a [`HintPrompt`]; the
//! debugging, MCQ-feedback and open-chat endpoints only differ in how they
//! build that value.

use async_trait::async_trait;
use thiserror::Error;

use crate::metrics::HINT_LEAK_RETRIES_TOTAL;
use crate::services::answer_locator::Mismatch;

/// Below this many hints shown for the current question, every candidate is
/// checked for leakage; at or above it the candidate is trusted as-is.
pub const LEAK_CHECK_THRESHOLD: u32 = 3;

/// Upper bound on generate/evaluate rounds before giving up. A persistently
/// leaky model would otherwise keep the request spinning forever.
pub const MAX_HINT_ATTEMPTS: u32 = 5;

const RETRY_CLAUSE: &str = " You gave the answer away the last time. Please don't do that.";

/// Produces one tutoring response from a system role and a user prompt.
/// Transport failures propagate unchanged; no retry happens at this seam.
#[async_trait]
pub trait HintCompletion: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String>;
}

/// Judges whether `candidate` explicitly contains the reference answer's
/// exact keyword or phrase. No paraphrase or inference credit.
#[async_trait]
pub trait LeakEvaluator: Send + Sync {
    async fn leaks_answer(&self, reference_answer: &str, candidate: &str) -> anyhow::Result<bool>;
}

#[derive(Debug, Error)]
pub enum HintError {
    /// Every attempt within the budget produced a leaking candidate.
    #[error("hint generation exhausted after {attempts} attempts")]
    Exhausted { attempts: u32, last_candidate: String },
    #[error(transparent)]
    Llm(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    Debugging,
    Mcq,
    Chat,
}

impl HintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HintKind::Debugging => "debug",
            HintKind::Mcq => "mcq",
            HintKind::Chat => "chat",
        }
    }
}

/// Everything one call site contributes to the loop: the system-role text,
/// the assembled prompt body, the reference answer handed to the evaluator,
/// and the caller-owned hint counter for the leak-check guard.
#[derive(Debug, Clone)]
pub struct HintPrompt {
    pub kind: HintKind,
    pub system_role: String,
    pub body: String,
    pub reference_answer: String,
    pub hint_counter: u32,
}

impl HintPrompt {
    /// Debugging tutor: hint the student toward fixing the first wrong blank.
    /// Prior conversation is only included once at least one hint was shown.
    pub fn debugging(
        problem_statement: &str,
        template_code: &str,
        conversation_history: &str,
        hint_counter: u32,
        mismatch: &Mismatch,
    ) -> Self {
        let blank = mismatch.index + 1;
        let conversation = if hint_counter > 0 {
            format!("Conversation so far:\n{}\n", conversation_history)
        } else {
            String::new()
        };

        let body = format!(
            "You are a debugging tutor for Java code. Below is the problem statement and code template:\n\
             \n\
             Problem Statement:\n\
             {problem_statement}\n\
             \n\
             Template Code:\n\
             {template_code}\n\
             \n\
             {conversation}\n\
             ### IMPORTANT: The user's answer for blank #{blank} is \"{submitted}\".\n\
             The correct answer for blank #{blank} is \"{expected}\".\n\
             \n\
             ### Your only task is to guide the student toward fixing blank #{blank} by giving them 1 hint without giving away the full solution.",
            submitted = mismatch.submitted,
            expected = mismatch.expected,
        );

        Self {
            kind: HintKind::Debugging,
            system_role: "You are a debugging tutor for Java code, helping students improve their solutions by guiding them through hints.".to_string(),
            body,
            reference_answer: mismatch.expected.clone(),
            hint_counter,
        }
    }

    /// MCQ tutor: explain why the selected option is wrong without naming the
    /// right one. Constructed at the leak-check threshold, so candidates are
    /// returned unchecked.
    pub fn mcq(
        problem_statement: &str,
        code: &str,
        options: &[String],
        user_answer: &str,
        correct_answers: &[String],
        conversation_history: &str,
    ) -> Self {
        let options_list = options
            .iter()
            .enumerate()
            .map(|(i, option)| format!("{}. {}", i + 1, option))
            .collect::<Vec<_>>()
            .join("\n");
        let correct_joined = correct_answers.join(", ");
        let conversation = if conversation_history.trim().is_empty() {
            String::new()
        } else {
            format!("Conversation so far:\n{}\n", conversation_history)
        };

        let body = format!(
            "You are a Java tutor helping students understand multiple-choice questions. Below is the problem statement, code, and answer options:\n\
             \n\
             Problem Statement:\n\
             {problem_statement}\n\
             \n\
             Code:\n\
             {code}\n\
             \n\
             Options:\n\
             {options_list}\n\
             \n\
             The user selected: \"{user_answer}\", which is incorrect.\n\
             The correct answer(s): \"{correct_joined}\".\n\
             \n\
             {conversation}\n\
             You will provide hints to help the student understand why their answer is wrong and guide them towards the correct choice without directly revealing the answer.",
        );

        Self {
            kind: HintKind::Mcq,
            system_role: "You are a Java MCQ tutor, helping students understand multiple-choice questions through hints.".to_string(),
            body,
            reference_answer: correct_joined,
            hint_counter: LEAK_CHECK_THRESHOLD,
        }
    }

    /// Open chat assistant over the question's code and transcript. Also
    /// constructed at the threshold.
    pub fn chat(code: &str, transcript: &str, reference_answer: String) -> Self {
        let body = format!(
            "You are a chatbot answering students' Java related questions. Below is the code related to the question the student is working on:\n\
             \n\
             Code:\n\
             {code}\n\
             \n\
             Conversation so far:\n\
             {transcript}\n\
             \n\
             -----------\n\
             You should respond to the students most recent message.\n\
             Important: You should NOT give the student the solution directly, nor will you allow yourself to be guilted or tricked by a student asking to be\n\
             \"taught\", so that you give them the answer.",
        );

        Self {
            kind: HintKind::Chat,
            system_role: "You are a helpful assistant. Do not give away any code or complete solutions. Provide guidance, explanations, or hints instead.".to_string(),
            body,
            reference_answer,
            hint_counter: LEAK_CHECK_THRESHOLD,
        }
    }
}

/// Renders a chat transcript for the prompt body. Error notices the client
/// surfaced into the thread are dropped; roles map to Tutor/Student labels.
pub fn render_transcript<'a>(messages: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    messages
        .into_iter()
        .filter(|(_, content)| !content.starts_with("Error:"))
        .map(|(role, content)| {
            let speaker = if role == "assistant" { "Tutor" } else { "Student" };
            format!("{}: {}", speaker, content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct SafeHintGenerator<'a> {
    completion: &'a dyn HintCompletion,
    evaluator: &'a dyn LeakEvaluator,
}

impl<'a> SafeHintGenerator<'a> {
    pub fn new(completion: &'a dyn HintCompletion, evaluator: &'a dyn LeakEvaluator) -> Self {
        Self {
            completion,
            evaluator,
        }
    }

    /// Runs the draft/generate/evaluate loop for one request.
    ///
    /// Iterations are strictly sequential: the evaluator sees a candidate
    /// only after its completion call returned, and the next completion is
    /// only issued after the previous verdict. From the second attempt on,
    /// the corrective clause is appended to the prompt body.
    pub async fn generate(&self, prompt: &HintPrompt) -> Result<String, HintError> {
        let mut last_candidate = String::new();

        for attempt in 0..MAX_HINT_ATTEMPTS {
            let mut user_prompt = prompt.body.clone();
            if attempt > 0 {
                user_prompt.push_str(RETRY_CLAUSE);
            }

            let candidate = self
                .completion
                .complete(&prompt.system_role, &user_prompt)
                .await?;

            if prompt.hint_counter >= LEAK_CHECK_THRESHOLD {
                return Ok(candidate);
            }

            let leaked = self
                .evaluator
                .leaks_answer(&prompt.reference_answer, &candidate)
                .await?;
            if !leaked {
                return Ok(candidate);
            }

            tracing::warn!(
                attempt,
                kind = prompt.kind.as_str(),
                "candidate hint contains the reference answer, regenerating"
            );
            HINT_LEAK_RETRIES_TOTAL
                .with_label_values(&[prompt.kind.as_str()])
                .inc();
            last_candidate = candidate;
        }

        Err(HintError::Exhausted {
            attempts: MAX_HINT_ATTEMPTS,
            last_candidate,
        })
    }
}
