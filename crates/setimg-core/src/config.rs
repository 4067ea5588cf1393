//! Engine configuration

/// Kind never rewritten by default: CRD schemas describe images, they don't run them
pub const CRD_KIND: &str = "CustomResourceDefinition";

/// Pass configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Process documents on the rayon pool
    pub parallel: bool,
    /// Kinds passed through untouched
    pub skipped_kinds: Vec<String>,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With parallel document processing
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// With an additional kind to skip
    #[inline]
    #[must_use]
    pub fn with_skipped_kind(mut self, kind: impl Into<String>) -> Self {
        self.skipped_kinds.push(kind.into());
        self
    }

    /// Without any skipped kinds
    #[inline]
    #[must_use]
    pub fn without_skipped_kinds(mut self) -> Self {
        self.skipped_kinds.clear();
        self
    }

    /// Check whether documents of `kind` are skipped
    #[inline]
    #[must_use]
    pub fn skips(&self, kind: &str) -> bool {
        self.skipped_kinds.iter().any(|k| k == kind)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            skipped_kinds: vec![CRD_KIND.to_string()],
        }
    }
}
