//! Error kinds and propagation policy (§7).
//!
//! Configuration-time problems accumulate into a [`CreationException`]
//! returned once from [`crate::injector::Injector::create`]; run-time lookup
//! failures surface as a [`ProvisionError`] from `get_instance`/`get_provider`,
//! carrying the dependency chain active at the point of failure.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::key::Key;
use crate::source::ElementSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A short, stable identifier for a [`Message`], printed the way Guice
/// prints e.g. `BINDING_ALREADY_SET` — useful for grepping logs and for
/// tests that assert on error *kind* rather than wording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    BindingAlreadySet,
    DuplicateScopeRegistration,
    MissingBinding,
    AmbiguousBinding,
    CyclicDependency,
    RestrictionViolation,
    MalformedInjectionPoint,
    IllegalQualifierPlacement,
    ForbiddenBindingTarget,
    ScopeNotFound,
    ConverterFailed,
    ScannerMisuse,
    ModuleConfigureFailed,
    Internal,
    UserProvisioning,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BindingAlreadySet => "BINDING_ALREADY_SET",
            ErrorCode::DuplicateScopeRegistration => "DUPLICATE_SCOPE_REGISTRATION",
            ErrorCode::MissingBinding => "MISSING_BINDING",
            ErrorCode::AmbiguousBinding => "AMBIGUOUS_BINDING",
            ErrorCode::CyclicDependency => "CYCLIC_DEPENDENCY",
            ErrorCode::RestrictionViolation => "RESTRICTION_VIOLATION",
            ErrorCode::MalformedInjectionPoint => "MALFORMED_INJECTION_POINT",
            ErrorCode::IllegalQualifierPlacement => "ILLEGAL_QUALIFIER_PLACEMENT",
            ErrorCode::ForbiddenBindingTarget => "FORBIDDEN_BINDING_TARGET",
            ErrorCode::ScopeNotFound => "SCOPE_NOT_FOUND",
            ErrorCode::ConverterFailed => "CONVERTER_FAILED",
            ErrorCode::ScannerMisuse => "SCANNER_MISUSE",
            ErrorCode::ModuleConfigureFailed => "MODULE_CONFIGURE_FAILED",
            ErrorCode::Internal => "INTERNAL_ERROR",
            ErrorCode::UserProvisioning => "USER_PROVISIONING_ERROR",
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A single recorded problem. Mergeable messages (several missing-binding
/// messages for the same key) are grouped by callers that render a list of
/// these, not by `Message` itself.
#[derive(Error, Clone)]
pub struct Message {
    pub code: ErrorCode,
    pub text: String,
    pub sources: Vec<ElementSource>,
    #[source]
    pub cause: Option<Arc<dyn std::error::Error + Send + Sync>>,
    pub learn_more: Option<&'static str>,
}

impl Message {
    pub fn new(code: ErrorCode, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            sources: Vec::new(),
            cause: None,
            learn_more: None,
        }
    }

    pub fn at(mut self, source: ElementSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn caused_by(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn with_learn_more(mut self, url: &'static str) -> Self {
        self.learn_more = Some(url);
        self
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.text)?;
        if let Some(source) = self.sources.first() {
            write!(f, "\n  at {source}")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, "\n  caused by: {cause}")?;
        }
        if let Some(url) = self.learn_more {
            write!(f, "\n  learn more: {url}")?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// All configuration/restriction problems collected during compilation
/// (§4.E, §7). Compilation never short-circuits on the first error.
#[derive(Error, Clone, Debug)]
pub struct CreationException {
    pub messages: Vec<Message>,
}

impl CreationException {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl fmt::Display for CreationException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Unable to create injector, see the following errors:")?;
        for (i, m) in self.messages.iter().enumerate() {
            writeln!(f, "{i}) {m}")?;
        }
        write!(f, "{} error(s)", self.messages.len())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Raised from `get_instance`/`get_provider`/`Provider::get` call sites.
/// Carries the dependency chain active when the failure occurred, read from
/// [`crate::context`]'s per-thread stack snapshot.
#[derive(Error, Clone, Debug)]
pub struct ProvisionError {
    #[source]
    pub message: Message,
    pub dependency_chain: Vec<Key>,
}

impl ProvisionError {
    pub fn new(message: Message, dependency_chain: Vec<Key>) -> Self {
        Self {
            message,
            dependency_chain,
        }
    }

    pub fn missing_binding(key: &Key, dependency_chain: Vec<Key>) -> Self {
        Self::new(
            Message::new(ErrorCode::MissingBinding, format!("No binding for {key:?}")),
            dependency_chain,
        )
    }

    pub fn cyclic(dependency_chain: Vec<Key>) -> Self {
        let path = dependency_chain
            .iter()
            .map(|k| format!("{k:?}"))
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::new(
            Message::new(ErrorCode::CyclicDependency, format!("Cyclic dependency: {path}")),
            dependency_chain,
        )
    }

    /// Cyclic dependency through an interface-typed (`bind_interface`)
    /// binding. Guice resolves this shape with a dynamic proxy; this port has
    /// no runtime facility to synthesize one for an arbitrary trait (see
    /// DESIGN.md OQ-6), so it still fails, but with a message pointing at the
    /// actual escape hatch (`Lazy<T>`, see [`crate::lazy::Lazy`]) instead of a
    /// bare "cyclic dependency" report.
    pub fn cyclic_interface_proxy_unavailable(dependency_chain: Vec<Key>, key: &Key) -> Self {
        let path = dependency_chain
            .iter()
            .map(|k| format!("{k:?}"))
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::new(
            Message::new(
                ErrorCode::CyclicDependency,
                format!(
                    "Cyclic dependency through interface key {key:?}: {path}. Guice would normally \
                     proxy this interface to break the cycle; this port cannot synthesize a dynamic \
                     proxy for an arbitrary trait. Break the cycle by injecting Lazy<Arc<{key:?}>> at \
                     one of the call sites instead."
                ),
            ),
            dependency_chain,
        )
    }
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        write!(f, "Dependency chain:\n")?;
        for (i, k) in self.dependency_chain.iter().enumerate() {
            writeln!(f, "  {i}: {k:?}")?;
        }
        Ok(())
    }
}

