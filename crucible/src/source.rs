//! `ElementSource` / `ModuleSource`: where a configuration element came from
//! (§3, §4.B, §4.D). Source capture costs nothing beyond a `&'static str`
//! and a `Location` unless stack-trace collection is requested.

use std::fmt;
use std::sync::Arc;

use crate::key::TypeLiteral;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Controls how much source-capture cost is paid (§6 `includeStackTraceOption`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StackTraceOption {
    #[default]
    Off,
    OnlyForDeclaringSource,
    Complete,
}

impl StackTraceOption {
    /// Reads the single core environment variable, `GUICE_INCLUDE_STACK_TRACES`.
    pub fn from_env() -> Self {
        match std::env::var("GUICE_INCLUDE_STACK_TRACES").ok().as_deref() {
            Some("complete") => StackTraceOption::Complete,
            Some("only_for_declaring_source") => StackTraceOption::OnlyForDeclaringSource,
            Some("off") | None => StackTraceOption::Off,
            Some(_) => StackTraceOption::Off,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A human-identifiable origin: either the `#[track_caller]`-captured call
/// site of a binder method, or a caller-supplied description from
/// `Binder::with_source`.
#[derive(Clone, Debug)]
pub enum DeclaringSource {
    Location { file: &'static str, line: u32 },
    Described(Arc<str>),
}

impl DeclaringSource {
    #[track_caller]
    pub fn here() -> Self {
        let loc = std::panic::Location::caller();
        DeclaringSource::Location {
            file: loc.file(),
            line: loc.line(),
        }
    }

    pub fn described(text: impl Into<Arc<str>>) -> Self {
        DeclaringSource::Described(text.into())
    }
}

impl fmt::Display for DeclaringSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaringSource::Location { file, line } => write!(f, "{file}:{line}"),
            DeclaringSource::Described(text) => write!(f, "{text}"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// One node of the module installation path, rooted at a top-level module
/// (§3, §4.B point 2-3, §4.D). Rust has no runtime annotation scanning, so
/// `local_permits` is populated from [`crate::recorder::Module::permits`]
/// rather than by reflecting a `@Permit`-meta-annotated marker type — see
/// DESIGN.md OQ-3.
pub struct ModuleSource {
    pub module_name: &'static str,
    pub parent: Option<Arc<ModuleSource>>,
    pub local_permits: Vec<TypeLiteral>,
    /// True only when installed by a scanner re-rooted to the enclosing
    /// method's module (§4.D: "permits reset to the enclosing method's module").
    pub scanner_reset: bool,
}

impl ModuleSource {
    pub fn root(module_name: &'static str, local_permits: Vec<TypeLiteral>) -> Arc<Self> {
        Arc::new(Self {
            module_name,
            parent: None,
            local_permits,
            scanner_reset: false,
        })
    }

    pub fn child(self: &Arc<Self>, module_name: &'static str, local_permits: Vec<TypeLiteral>) -> Arc<Self> {
        Arc::new(Self {
            module_name,
            parent: Some(self.clone()),
            local_permits,
            scanner_reset: false,
        })
    }

    /// The chain of module class names from root to this node, used in
    /// restriction-violation messages and exemption-regex matching.
    pub fn chain_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut cur = Some(self);
        while let Some(n) = cur {
            names.push(n.module_name);
            cur = n.parent.as_deref();
        }
        names.reverse();
        names
    }

    pub fn identity(self: &Arc<Self>) -> usize {
        Arc::as_ptr(self) as usize
    }
}

impl fmt::Debug for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chain_names().join(" -> "))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// `(declaringSource, moduleSource, originalElementSource?, trustedOriginalFlag, scannerSource?)`.
#[derive(Clone)]
pub struct ElementSource {
    pub declaring_source: DeclaringSource,
    pub module_source: Arc<ModuleSource>,
    pub original_element_source: Option<Arc<ElementSource>>,
    pub trusted_original: bool,
    pub scanner_source: Option<&'static str>,
}

impl ElementSource {
    pub fn new(declaring_source: DeclaringSource, module_source: Arc<ModuleSource>) -> Self {
        Self {
            declaring_source,
            module_source,
            original_element_source: None,
            trusted_original: false,
            scanner_source: None,
        }
    }

    /// Only used internally when the recorder re-derives an element
    /// (e.g. a scanner rewriting a `@Provides`-like method into a binding);
    /// never settable from a public source-spoofing API (§3 invariant).
    pub(crate) fn trusted_copy_of(original: Arc<ElementSource>, new: ElementSource) -> Self {
        Self {
            original_element_source: Some(original),
            trusted_original: true,
            ..new
        }
    }
}

impl fmt::Display for ElementSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (installed via {:?})", self.declaring_source, self.module_source)
    }
}
