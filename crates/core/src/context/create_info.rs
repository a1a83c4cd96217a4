//! Context creation configuration (spec §6.3).

/// Flags recognized at context creation (spec §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextCreateFlags(u32);

impl ContextCreateFlags {
    pub const DISABLE_JIT: ContextCreateFlags = ContextCreateFlags(1 << 0);
    pub const FALLBACK_TO_SYNC: ContextCreateFlags = ContextCreateFlags(1 << 1);
    pub const ISOLATED_THREAD_POOL: ContextCreateFlags = ContextCreateFlags(1 << 2);
    pub const ISOLATED_JIT_RUNTIME: ContextCreateFlags = ContextCreateFlags(1 << 3);
    pub const ISOLATED_JIT_LOGGING: ContextCreateFlags = ContextCreateFlags(1 << 4);
    pub const OVERRIDE_CPU_FEATURES: ContextCreateFlags = ContextCreateFlags(1 << 5);

    pub const fn empty() -> Self {
        ContextCreateFlags(0)
    }

    pub fn contains(self, other: ContextCreateFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ContextCreateFlags {
    type Output = ContextCreateFlags;
    fn bitor(self, rhs: ContextCreateFlags) -> ContextCreateFlags {
        ContextCreateFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ContextCreateFlags {
    fn bitor_assign(&mut self, rhs: ContextCreateFlags) {
        self.0 |= rhs.0;
    }
}

/// Configuration passed to `RenderingContext::begin` (spec §6.3).
///
/// `command_queue_limit` is accepted and stored but has no effect yet
/// (spec §9 open question: "the source exposes a `command_queue_limit`
/// field marked 'no effect at the moment'; the implementation should
/// accept and ignore it until a meaningful policy is decided").
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextCreateInfo {
    pub thread_count: u32,
    pub flags: ContextCreateFlagsSerde,
    pub command_queue_limit: u32,
    pub saved_state_limit: u32,
    pub pixel_origin_x: f64,
    pub pixel_origin_y: f64,
    pub cpu_features: Option<u64>,
}

/// `ContextCreateFlags` isn't itself `serde`-friendly (it's a bitset
/// newtype without a stable numeric meaning callers should serialize
/// directly), so the config struct stores the raw bits under this type
/// alias and `ContextCreateInfo::flags()` decodes it.
pub type ContextCreateFlagsSerde = u32;

impl Default for ContextCreateInfo {
    fn default() -> Self {
        ContextCreateInfo {
            thread_count: 0,
            flags: 0,
            command_queue_limit: 0,
            saved_state_limit: 0,
            pixel_origin_x: 0.0,
            pixel_origin_y: 0.0,
            cpu_features: None,
        }
    }
}

impl ContextCreateInfo {
    pub fn flags(&self) -> ContextCreateFlags {
        ContextCreateFlags(self.flags)
    }

    pub fn set_flags(&mut self, flags: ContextCreateFlags) {
        self.flags = flags.0;
    }

    /// `saved_state_limit == 0` means "use the default" (spec §6.3: "saved
    /// state limit (0 = 4096)").
    pub fn effective_saved_state_limit(&self) -> u32 {
        if self.saved_state_limit == 0 {
            4096
        } else {
            self.saved_state_limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_saved_state_limit_defaults_to_4096() {
        let info = ContextCreateInfo::default();
        assert_eq!(info.effective_saved_state_limit(), 4096);
    }

    #[test]
    fn flags_round_trip_through_raw_bits() {
        let mut info = ContextCreateInfo::default();
        info.set_flags(ContextCreateFlags::DISABLE_JIT | ContextCreateFlags::FALLBACK_TO_SYNC);
        assert!(info.flags().contains(ContextCreateFlags::DISABLE_JIT));
        assert!(info.flags().contains(ContextCreateFlags::FALLBACK_TO_SYNC));
        assert!(!info.flags().contains(ContextCreateFlags::ISOLATED_JIT_RUNTIME));
    }
}
