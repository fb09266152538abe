use std::io::{self, BufRead, Write};

use rpassword::read_password;

/// Source of answers for the login prompts.
pub trait Prompter {
    /// Ask for a visible line. `None` means input is exhausted.
    fn line(&mut self, label: &str) -> io::Result<Option<String>>;

    /// Ask for a secret without echoing it. `None` means input is exhausted.
    fn secret(&mut self, label: &str) -> io::Result<Option<String>>;
}

/// Prompts on the controlling terminal: lines come from stdin, secrets are
/// read with echo disabled.
pub struct Terminal;

impl Prompter for Terminal {
    fn line(&mut self, label: &str) -> io::Result<Option<String>> {
        print!("{label}");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }

    fn secret(&mut self, label: &str) -> io::Result<Option<String>> {
        print!("{label}");
        io::stdout().flush()?;
        match read_password() {
            Ok(secret) => Ok(Some(secret.trim().to_string())),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Answers from a fixed script, for tests.
#[cfg(test)]
pub struct Scripted(pub std::collections::VecDeque<String>);

#[cfg(test)]
impl Scripted {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(answers.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
impl Prompter for Scripted {
    fn line(&mut self, _label: &str) -> io::Result<Option<String>> {
        Ok(self.0.pop_front())
    }

    fn secret(&mut self, _label: &str) -> io::Result<Option<String>> {
        Ok(self.0.pop_front())
    }
}
