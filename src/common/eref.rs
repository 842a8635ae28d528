
use std::sync::{Arc, RwLock, Weak};

/// Entity Reference - newtype to express entity boundaries
pub struct ERef<T: ?Sized>(Arc<RwLock<T>>);

impl<T: ?Sized> Clone for ERef<T> {
    fn clone(&self) -> Self {
        ERef(self.0.clone())
    }
}

impl<T: ?Sized> std::fmt::Debug for ERef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ERef").finish()
    }
}

impl<T: ?Sized> ERef<T> {
    pub fn new(element: T) -> Self where T: Sized {
        Self(Arc::new(RwLock::new(element)))
    }

    pub fn read(&self) -> std::sync::RwLockReadGuard<'_, T> {
        self.0.read().unwrap()
    }

    pub fn write(&self) -> std::sync::RwLockWriteGuard<'_, T> {
        self.0.write().unwrap()
    }

    pub fn downgrade(&self) -> WeakERef<T> {
        WeakERef(Arc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &ERef<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Non-owning counterpart of [`ERef`], for listeners that must not keep
/// their target alive.
pub struct WeakERef<T: ?Sized>(Weak<RwLock<T>>);

impl<T: ?Sized> Clone for WeakERef<T> {
    fn clone(&self) -> Self {
        WeakERef(self.0.clone())
    }
}

impl<T: ?Sized> WeakERef<T> {
    pub fn upgrade(&self) -> Option<ERef<T>> {
        self.0.upgrade().map(ERef)
    }
}
