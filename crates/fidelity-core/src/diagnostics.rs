use std::cell::RefCell;
use std::rc::Rc;

use crate::error::FidelityError;

/// Category of a degradation event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DiagnosticKind {
    UnknownPreset,
    UnsupportedCapability,
    InvalidFrameTime,
    MissingData,
    InvalidConfig,
}

/// A structured "something degraded" event. The host decides whether it
/// ends up on screen, in a log, or nowhere.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub context: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, context: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
        }
    }
}

impl From<&FidelityError> for Diagnostic {
    fn from(err: &FidelityError) -> Self {
        let kind = match err {
            FidelityError::UnknownPreset(_) => DiagnosticKind::UnknownPreset,
            FidelityError::UnsupportedCapability(_) => DiagnosticKind::UnsupportedCapability,
            FidelityError::InvalidFrameTime(_) => DiagnosticKind::InvalidFrameTime,
            FidelityError::MissingData(_) => DiagnosticKind::MissingData,
            FidelityError::IncompleteTable(_)
            | FidelityError::InvalidPreset { .. }
            | FidelityError::InvalidTuning(_) => {
                DiagnosticKind::InvalidConfig
            }
        };
        Diagnostic::new(kind, err.to_string())
    }
}

/// Receiver of diagnostics.
pub trait DiagnosticSink {
    fn on_diagnostic(&self, diagnostic: &Diagnostic);
}

impl<F: Fn(&Diagnostic)> DiagnosticSink for F {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Fan-out point for diagnostics. Every event is also logged at `warn`.
#[derive(Default)]
pub struct DiagnosticHub {
    sinks: Vec<Rc<dyn DiagnosticSink>>,
}

impl DiagnosticHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: Rc<dyn DiagnosticSink>) {
        self.sinks.push(sink);
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        log::warn!("[{:?}] {}", diagnostic.kind, diagnostic.context);
        for sink in &self.sinks {
            sink.on_diagnostic(&diagnostic);
        }
    }

    /// Report a recovered error.
    pub fn report(&self, err: &FidelityError) {
        self.emit(Diagnostic::from(err));
    }
}

/// Sink that keeps every event, mostly useful for tests and overlays.
#[derive(Default)]
pub struct DiagnosticLog {
    events: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticLog {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.borrow().clone()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events.borrow().iter().filter(|d| d.kind == kind).count()
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        self.events.borrow_mut().push(diagnostic.clone());
    }
}
