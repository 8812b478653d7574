//! Interactive creation and update of the configuration store contents.
//!
//! Provisioning is a plain prompt/response exchange over line-oriented
//! streams. Each key shows its current value as a default; an empty answer
//! keeps it, anything else replaces it. Stream failures never abort the pass:
//! a key whose prompt or answer fails simply keeps its existing value.

use std::io::{BufRead, Write};

use tracing::warn;

use crate::settings::{Configuration, REQUIRED_KEYS, is_secret_key, redacted};
use crate::store::STORE_TARGET;

/// Prompt/response driver over injectable input and output streams.
pub struct Provisioner<R, W> {
    input: R,
    output: W,
}

impl<R, W> Provisioner<R, W>
where
    R: BufRead,
    W: Write,
{
    /// Builds a provisioner reading answers from `input` and writing prompts
    /// to `output`.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prompts for every required key followed by `extra_keys`, starting from
    /// `existing`.
    pub fn provision(&mut self, existing: Configuration, extra_keys: &[String]) -> Configuration {
        let mut config = existing;
        for key in prompt_order(extra_keys) {
            if let Some(value) = self.ask(&key, config.get(&key)) {
                config.insert(key, value);
            }
        }
        config
    }

    /// Writes a free-form status line such as a banner or result.
    pub fn announce(&mut self, message: &str) {
        if let Err(error) = writeln!(self.output, "{message}").and_then(|()| self.output.flush()) {
            warn!(target: STORE_TARGET, error = %error, "failed to write provisioning output");
        }
    }

    /// Releases the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn ask(&mut self, key: &str, current: Option<&str>) -> Option<String> {
        let prompt = match current.filter(|value| !value.is_empty()) {
            Some(_) if is_secret_key(key) => format!("{key:<16} = ({}) ", redacted()),
            Some(value) => format!("{key:<16} = ({value}) "),
            None => format!("{key:<16} = "),
        };
        if let Err(error) = self
            .output
            .write_all(prompt.as_bytes())
            .and_then(|()| self.output.flush())
        {
            warn!(target: STORE_TARGET, key, error = %error, "failed to write prompt");
            return None;
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(_) => {
                let answer = line.trim();
                (!answer.is_empty()).then(|| answer.to_owned())
            }
            Err(error) => {
                warn!(target: STORE_TARGET, key, error = %error, "failed to read answer");
                None
            }
        }
    }
}

/// Required keys first, then extra keys in caller order without repeats.
fn prompt_order(extra_keys: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = REQUIRED_KEYS.iter().map(|key| (*key).to_owned()).collect();
    for key in extra_keys {
        let trimmed = key.trim();
        if !trimmed.is_empty() && !keys.iter().any(|known| known == trimmed) {
            keys.push(trimmed.to_owned());
        }
    }
    keys
}
