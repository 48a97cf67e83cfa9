use std::collections::VecDeque;

/// Source of interactive answers.
///
/// The stores decide when a confirmation is needed; the caller decides how
/// the answer is obtained (stdin, a script, a test fixture).
pub trait Prompt {
    /// Shows `question` and returns the raw answer, or `None` once input is exhausted.
    fn ask(&mut self, question: &str) -> Option<String>;

    /// Shows context once, ahead of a series of questions.
    fn show(&mut self, text: &str);
}

/// Asks until the answer is yes or no. Exhausted input counts as no.
pub fn confirm(prompt: &mut dyn Prompt, question: &str) -> bool {
    loop {
        let Some(answer) = prompt.ask(question) else {
            return false;
        };
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return true,
            "n" | "no" => return false,
            _ => continue,
        }
    }
}

/// Prompt that replays a fixed sequence of answers.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    questions: Vec<String>,
    shown: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            questions: Vec::new(),
            shown: Vec::new(),
        }
    }

    /// Questions asked so far, in order.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    /// Context shown so far, in order.
    pub fn shown(&self) -> &[String] {
        &self.shown
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> Option<String> {
        self.questions.push(question.to_owned());
        self.answers.pop_front()
    }

    fn show(&mut self, text: &str) {
        self.shown.push(text.to_owned());
    }
}
