/// Sink for optional diagnostic messages.
pub trait Emit: Sync {
    fn emit(&self, message: &str);
}

/// Drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Emit for Silent {
    fn emit(&self, _message: &str) {}
}

/// Forwards messages to the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmitter;

impl Emit for LogEmitter {
    fn emit(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Collects messages in memory, mostly useful in tests.
#[derive(Debug, Default)]
pub struct Collected {
    messages: std::sync::Mutex<Vec<String>>,
}

impl Collected {
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Emit for Collected {
    fn emit(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}
