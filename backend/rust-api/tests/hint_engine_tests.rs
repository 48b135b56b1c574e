use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use javatutor_api::services::answer_locator::{self, Mismatch};
use javatutor_api::services::hint_engine::{
    HintCompletion, HintError, HintPrompt, LeakEvaluator, SafeHintGenerator, LEAK_CHECK_THRESHOLD,
    MAX_HINT_ATTEMPTS,
};

/// Shared ledger of outbound calls, used to assert strict sequencing.
#[derive(Default)]
struct CallLog(Mutex<Vec<&'static str>>);

impl CallLog {
    fn entries(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

struct ScriptedCompletion {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    log: Arc<CallLog>,
    fail: bool,
}

impl ScriptedCompletion {
    fn new(responses: &[&str], log: Arc<CallLog>) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            log,
            fail: false,
        }
    }

    fn failing(log: Arc<CallLog>) -> Self {
        let mut double = Self::new(&[], log);
        double.fail = true;
        double
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl HintCompletion for ScriptedCompletion {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> anyhow::Result<String> {
        if self.fail {
            anyhow::bail!("completion transport down");
        }

        self.log.0.lock().unwrap().push("complete");
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        let n = self.calls.fetch_add(1, Ordering::SeqCst);

        let scripted = self.responses.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| format!("candidate-{}", n)))
    }
}

struct ScriptedEvaluator {
    verdicts: Mutex<VecDeque<bool>>,
    calls: AtomicUsize,
    log: Arc<CallLog>,
    fail: bool,
    default_verdict: bool,
}

impl ScriptedEvaluator {
    fn new(verdicts: &[bool], default_verdict: bool, log: Arc<CallLog>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.iter().copied().collect()),
            calls: AtomicUsize::new(0),
            log,
            fail: false,
            default_verdict,
        }
    }

    fn failing(log: Arc<CallLog>) -> Self {
        let mut double = Self::new(&[], false, log);
        double.fail = true;
        double
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeakEvaluator for ScriptedEvaluator {
    async fn leaks_answer(&self, _reference_answer: &str, _candidate: &str) -> anyhow::Result<bool> {
        if self.fail {
            anyhow::bail!("evaluator transport down");
        }

        self.log.0.lock().unwrap().push("evaluate");
        self.calls.fetch_add(1, Ordering::SeqCst);

        let scripted = self.verdicts.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or(self.default_verdict))
    }
}

fn mismatch() -> Mismatch {
    Mismatch {
        index: 0,
        submitted: "wrong".to_string(),
        expected: "right".to_string(),
    }
}

fn debugging_prompt(hint_counter: u32) -> HintPrompt {
    HintPrompt::debugging("stmt", "code", "", hint_counter, &mismatch())
}

#[tokio::test]
async fn counter_at_or_above_threshold_skips_the_evaluator() {
    let log = Arc::new(CallLog::default());
    let completion = ScriptedCompletion::new(&["the hint"], log.clone());
    let evaluator = ScriptedEvaluator::new(&[], true, log.clone());

    let generator = SafeHintGenerator::new(&completion, &evaluator);
    let hint = generator.generate(&debugging_prompt(5)).await.unwrap();

    assert_eq!(hint, "the hint");
    assert_eq!(completion.calls(), 1);
    assert_eq!(evaluator.calls(), 0);
}

#[tokio::test]
async fn counter_below_threshold_checks_every_candidate() {
    let log = Arc::new(CallLog::default());
    let completion = ScriptedCompletion::new(&["first candidate"], log.clone());
    let evaluator = ScriptedEvaluator::new(&[false], true, log.clone());

    let generator = SafeHintGenerator::new(&completion, &evaluator);
    let hint = generator.generate(&debugging_prompt(2)).await.unwrap();

    assert_eq!(hint, "first candidate");
    assert_eq!(completion.calls(), 1);
    assert_eq!(evaluator.calls(), 1);
}

#[tokio::test]
async fn leaky_candidate_is_regenerated_with_the_corrective_clause() {
    let log = Arc::new(CallLog::default());
    let completion = ScriptedCompletion::new(&["leaky one", "safe one"], log.clone());
    let evaluator = ScriptedEvaluator::new(&[true, false], false, log.clone());

    let generator = SafeHintGenerator::new(&completion, &evaluator);
    let hint = generator.generate(&debugging_prompt(0)).await.unwrap();

    assert_eq!(hint, "safe one");
    assert_eq!(completion.calls(), 2);
    assert_eq!(evaluator.calls(), 2);

    assert!(!completion.prompt(0).contains("You gave the answer away"));
    assert!(completion
        .prompt(1)
        .ends_with(" You gave the answer away the last time. Please don't do that."));
}

#[tokio::test]
async fn completions_and_verdicts_strictly_alternate() {
    let log = Arc::new(CallLog::default());
    let completion = ScriptedCompletion::new(&[], log.clone());
    let evaluator = ScriptedEvaluator::new(&[true, true, false], false, log.clone());

    let generator = SafeHintGenerator::new(&completion, &evaluator);
    generator.generate(&debugging_prompt(0)).await.unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "complete", "evaluate", "complete", "evaluate", "complete", "evaluate"
        ]
    );
}

#[tokio::test]
async fn persistent_leaks_exhaust_the_attempt_budget() {
    let log = Arc::new(CallLog::default());
    let completion = ScriptedCompletion::new(&[], log.clone());
    let evaluator = ScriptedEvaluator::new(&[], true, log.clone());

    let generator = SafeHintGenerator::new(&completion, &evaluator);
    let err = generator.generate(&debugging_prompt(0)).await.unwrap_err();

    match err {
        HintError::Exhausted {
            attempts,
            last_candidate,
        } => {
            assert_eq!(attempts, MAX_HINT_ATTEMPTS);
            assert_eq!(
                last_candidate,
                format!("candidate-{}", MAX_HINT_ATTEMPTS - 1)
            );
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
    assert_eq!(completion.calls(), MAX_HINT_ATTEMPTS as usize);
    assert_eq!(evaluator.calls(), MAX_HINT_ATTEMPTS as usize);
}

#[tokio::test]
async fn completion_failure_propagates_before_any_verdict() {
    let log = Arc::new(CallLog::default());
    let completion = ScriptedCompletion::failing(log.clone());
    let evaluator = ScriptedEvaluator::new(&[], false, log.clone());

    let generator = SafeHintGenerator::new(&completion, &evaluator);
    let err = generator.generate(&debugging_prompt(0)).await.unwrap_err();

    assert!(matches!(err, HintError::Llm(_)));
    assert_eq!(evaluator.calls(), 0);
}

#[tokio::test]
async fn evaluator_failure_propagates() {
    let log = Arc::new(CallLog::default());
    let completion = ScriptedCompletion::new(&["candidate"], log.clone());
    let evaluator = ScriptedEvaluator::failing(log.clone());

    let generator = SafeHintGenerator::new(&completion, &evaluator);
    let err = generator.generate(&debugging_prompt(0)).await.unwrap_err();

    assert!(matches!(err, HintError::Llm(_)));
    assert_eq!(completion.calls(), 1);
}

#[tokio::test]
async fn located_mismatch_flows_through_to_a_checked_hint() {
    let submitted = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    let expected = vec!["A".to_string(), "X".to_string(), "C".to_string()];

    let located = answer_locator::locate(&submitted, &expected)
        .unwrap()
        .unwrap();
    assert_eq!(located.index, 1);
    assert_eq!(located.submitted, "B");
    assert_eq!(located.expected, "X");

    let prompt = HintPrompt::debugging("stmt", "code", "", 2, &located);
    assert!(prompt.body.contains("blank #2"));
    assert!(prompt.hint_counter < LEAK_CHECK_THRESHOLD);

    let log = Arc::new(CallLog::default());
    let completion = ScriptedCompletion::new(&["first candidate"], log.clone());
    let evaluator = ScriptedEvaluator::new(&[false], true, log.clone());

    let generator = SafeHintGenerator::new(&completion, &evaluator);
    let hint = generator.generate(&prompt).await.unwrap();

    assert_eq!(hint, "first candidate");
    assert_eq!(evaluator.calls(), 1);
}

#[tokio::test]
async fn mcq_and_chat_prompts_are_trusted_as_is() {
    let log = Arc::new(CallLog::default());
    let completion = ScriptedCompletion::new(&["mcq hint", "chat reply"], log.clone());
    let evaluator = ScriptedEvaluator::new(&[], true, log.clone());
    let generator = SafeHintGenerator::new(&completion, &evaluator);

    let options = vec!["int".to_string(), "long".to_string()];
    let correct = vec!["long".to_string()];
    let mcq = HintPrompt::mcq("stmt", "code", &options, "int", &correct, "");
    assert_eq!(generator.generate(&mcq).await.unwrap(), "mcq hint");

    let chat = HintPrompt::chat("code", "Student: help?", "long".to_string());
    assert_eq!(generator.generate(&chat).await.unwrap(), "chat reply");

    assert_eq!(evaluator.calls(), 0);
}
