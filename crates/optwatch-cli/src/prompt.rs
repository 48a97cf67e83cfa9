use std::io::{self, BufRead, Write};

use optwatch_core::Prompt;

/// Reads answers from stdin, blocking without a timeout.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str) -> Option<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{question}").ok()?;
        stdout.flush().ok()?;

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(answer),
        }
    }

    fn show(&mut self, text: &str) {
        println!("{text}");
    }
}
