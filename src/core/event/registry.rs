//=========================================================================
// User Event Kind Registry
//=========================================================================
//
// Assigns each custom user event type a process-stable platform kind.
//
// Architecture:
//   CustomUserEvent<T>::new() → kind_of::<T>() → HashMap<TypeId, u32>
//                                                    ↓ (first use only)
//                                              next free kind in user range
//
// The generic `UserEvent` keeps `EventKind::USER`; custom types start right
// after it. Kinds are never recycled.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use log::debug;

//=== Internal Dependencies ===============================================

use crate::core::adaptor::EventKind;

//=== KindRegistry ========================================================

struct KindRegistry {
    kinds: HashMap<TypeId, u32>,
    next: u32,
}

impl KindRegistry {
    fn new() -> Self {
        Self {
            kinds: HashMap::new(),
            next: EventKind::USER + 1,
        }
    }

    fn kind_of(&mut self, type_id: TypeId, name: &'static str) -> u32 {
        if let Some(kind) = self.kinds.get(&type_id) {
            return *kind;
        }

        if self.next > EventKind::LAST {
            panic!(
                "User event kinds exhausted while registering {} ({} types registered)",
                name,
                self.kinds.len()
            );
        }

        let kind = self.next;
        self.next += 1;
        self.kinds.insert(type_id, kind);
        debug!(target: "bus", "Registered user event {} as kind {:#06x}", name, kind);
        kind
    }
}

static REGISTRY: OnceLock<Mutex<KindRegistry>> = OnceLock::new();

//=== Public API ==========================================================

/// Returns the platform kind for the custom user event payload `T`.
///
/// The first call for a given `T` allocates a fresh kind; every later call,
/// from any thread, returns the same value.
///
/// # Panics
///
/// Panics if the user kind range is exhausted.
pub fn kind_of<T: 'static>() -> u32 {
    let registry = REGISTRY.get_or_init(|| Mutex::new(KindRegistry::new()));
    // The registry holds plain data; a panic elsewhere cannot leave it torn.
    let mut registry = registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.kind_of(TypeId::of::<T>(), type_name::<T>())
}

/// Returns `true` if `kind` lies in the user event range.
pub const fn is_user_kind(kind: u32) -> bool {
    kind >= EventKind::USER && kind <= EventKind::LAST
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct First;
    struct Second;
    struct Threaded;

    #[test]
    fn kind_is_stable_for_same_type() {
        assert_eq!(kind_of::<First>(), kind_of::<First>());
    }

    #[test]
    fn distinct_types_get_distinct_kinds() {
        assert_ne!(kind_of::<First>(), kind_of::<Second>());
    }

    #[test]
    fn custom_kinds_stay_above_generic_user_kind() {
        let kind = kind_of::<Second>();
        assert!(kind > EventKind::USER);
        assert!(is_user_kind(kind));
    }

    #[test]
    fn concurrent_first_use_assigns_once() {
        let handles: Vec<_> = (0..8).map(|_| thread::spawn(kind_of::<Threaded>)).collect();
        let kinds: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(kinds.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn local_registry_rejects_exhaustion() {
        let mut registry = KindRegistry::new();
        registry.next = EventKind::LAST;
        assert_eq!(registry.kind_of(TypeId::of::<u8>(), "u8"), EventKind::LAST);
        let result = std::panic::catch_unwind(move || {
            registry.kind_of(TypeId::of::<u16>(), "u16");
        });
        assert!(result.is_err());
    }

    #[test]
    fn builtin_kinds_are_not_user_kinds() {
        assert!(!is_user_kind(EventKind::QUIT));
        assert!(!is_user_kind(EventKind::KEY_DOWN));
    }
}
