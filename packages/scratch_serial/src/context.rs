/// Policy that a [`ByteBufferSerial`][crate::ByteBufferSerial] passes to its serializers on every
/// call.
///
/// The bridge itself does not interpret the context. Serializers may use it to adjust their
/// behavior, for example performing extra consistency checks in [`ContextMode::Debug`].
///
/// # Example
///
/// ```
/// use scratch_serial::{ContextMode, SerializationContext};
///
/// let context = SerializationContext::default();
/// assert!(context.is_release());
///
/// let context = SerializationContext::new(ContextMode::Debug);
/// assert!(context.is_debug());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SerializationContext {
    mode: ContextMode,
}

impl SerializationContext {
    /// A context that is always in [`ContextMode::Release`]. This is the default.
    pub const ALWAYS_RELEASE: Self = Self::new(ContextMode::Release);

    /// A context that is always in [`ContextMode::Debug`].
    pub const ALWAYS_DEBUG: Self = Self::new(ContextMode::Debug);

    /// Creates a context operating in the given mode.
    #[must_use]
    pub const fn new(mode: ContextMode) -> Self {
        Self { mode }
    }

    /// The mode serializers should operate in.
    #[must_use]
    pub const fn mode(&self) -> ContextMode {
        self.mode
    }

    /// Whether serializers should perform additional validation.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        matches!(self.mode, ContextMode::Debug)
    }

    /// Whether serializers should skip optional validation.
    #[must_use]
    pub const fn is_release(&self) -> bool {
        matches!(self.mode, ContextMode::Release)
    }
}

impl Default for SerializationContext {
    fn default() -> Self {
        Self::ALWAYS_RELEASE
    }
}

/// How strict a serializer is asked to be.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ContextMode {
    /// Serializers may verify invariants of the data they read and write, at extra cost.
    Debug,

    /// Serializers do only the work required to produce or consume the data.
    #[default]
    Release,
}
