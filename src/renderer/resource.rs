// renderer/resource.rs

/// Lifecycle of a lazily realized GPU resource.
///
/// Allocation and upload are separate steps on the host API, so a resource
/// can hold a handle without its data being on the GPU yet. Holding data
/// without a handle is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuState<H> {
    Unrealized,
    Allocated(H),
    Uploaded(H),
}

impl<H: Copy> GpuState<H> {
    pub fn handle(&self) -> Option<H> {
        match *self {
            GpuState::Unrealized => None,
            GpuState::Allocated(handle) | GpuState::Uploaded(handle) => Some(handle),
        }
    }

    /// A GPU object exists for this resource.
    pub fn created(&self) -> bool {
        !matches!(self, GpuState::Unrealized)
    }

    /// The resource's data has reached the GPU.
    pub fn loaded(&self) -> bool {
        matches!(self, GpuState::Uploaded(_))
    }

    /// Promotes an allocated resource to uploaded. No-op in any other state.
    pub fn mark_uploaded(&mut self) {
        if let GpuState::Allocated(handle) = *self {
            *self = GpuState::Uploaded(handle);
        }
    }

    /// Drops back to `Unrealized`, returning the forgotten handle.
    ///
    /// The handle is not released; the caller decides whether to delete it
    /// (it may belong to a context that no longer exists).
    pub fn invalidate(&mut self) -> Option<H> {
        let handle = self.handle();
        *self = GpuState::Unrealized;
        handle
    }
}

impl<H> Default for GpuState<H> {
    fn default() -> Self {
        GpuState::Unrealized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocated_then_uploaded() {
        let mut state = GpuState::Allocated(7u32);
        assert!(state.created());
        assert!(!state.loaded());
        state.mark_uploaded();
        assert_eq!(state, GpuState::Uploaded(7));
        assert!(state.loaded());
    }

    #[test]
    fn upload_requires_allocation() {
        let mut state: GpuState<u32> = GpuState::Unrealized;
        state.mark_uploaded();
        assert_eq!(state, GpuState::Unrealized);
    }

    #[test]
    fn invalidate_returns_handle() {
        let mut state = GpuState::Uploaded(3u32);
        assert_eq!(state.invalidate(), Some(3));
        assert!(!state.created());
        assert_eq!(state.invalidate(), None);
    }
}
