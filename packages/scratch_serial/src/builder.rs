use std::num::NonZero;
use std::sync::Arc;

use crate::{ByteBufferSerial, ScratchPool, SerializationContext};

/// Builder for creating an instance of [`ByteBufferSerial`].
///
/// All settings are optional. Without any settings, the bridge has no scratch pool and uses
/// [`SerializationContext::ALWAYS_RELEASE`].
///
/// The scratch pool can either be created by the builder ([`buffers()`][Self::buffers]) or
/// supplied from outside ([`pool()`][Self::pool]), which allows several bridges to share one
/// pool. Whichever of the two is called last wins.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use scratch_serial::{ByteBufferSerial, SerializationContext};
///
/// let serial = ByteBufferSerial::builder()
///     .buffers(NonZero::new(8).unwrap(), 4096)
///     .context(SerializationContext::ALWAYS_DEBUG)
///     .build();
///
/// assert!(serial.context().is_debug());
/// assert_eq!(serial.pool().unwrap().idle_count(), 8);
/// ```
///
/// Sharing a pool:
///
/// ```
/// use std::num::NonZero;
/// use std::sync::Arc;
///
/// use scratch_serial::{ByteBufferSerial, ScratchPool};
///
/// let pool = Arc::new(ScratchPool::with_buffers(NonZero::new(4).unwrap(), 1024));
///
/// let first = ByteBufferSerial::builder().pool(Arc::clone(&pool)).build();
/// let second = ByteBufferSerial::builder().pool(Arc::clone(&pool)).build();
///
/// assert!(Arc::ptr_eq(first.pool().unwrap(), second.pool().unwrap()));
/// ```
#[derive(Debug)]
#[must_use]
pub struct ByteBufferSerialBuilder {
    context: SerializationContext,
    pool: PoolSetting,
}

#[derive(Debug)]
enum PoolSetting {
    Disabled,
    Create { count: NonZero<usize>, size: usize },
    Shared(Arc<ScratchPool>),
}

impl ByteBufferSerialBuilder {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            context: SerializationContext::ALWAYS_RELEASE,
            pool: PoolSetting::Disabled,
        }
    }

    /// Sets the [context][SerializationContext] passed to every serializer call.
    #[inline]
    pub fn context(mut self, context: SerializationContext) -> Self {
        self.context = context;
        self
    }

    /// Gives the bridge its own pool of `count` scratch buffers of `size` bytes each.
    #[inline]
    pub fn buffers(mut self, count: NonZero<usize>, size: usize) -> Self {
        self.pool = PoolSetting::Create { count, size };
        self
    }

    /// Makes the bridge take scratch buffers from an existing pool.
    #[inline]
    pub fn pool(mut self, pool: Arc<ScratchPool>) -> Self {
        self.pool = PoolSetting::Shared(pool);
        self
    }

    /// Builds the bridge with the specified configuration.
    #[must_use]
    pub fn build(self) -> ByteBufferSerial {
        let pool = match self.pool {
            PoolSetting::Disabled => None,
            PoolSetting::Create { count, size } => {
                Some(Arc::new(ScratchPool::with_buffers(count, size)))
            }
            PoolSetting::Shared(pool) => Some(pool),
        };

        ByteBufferSerial::new_inner(self.context, pool)
    }
}
