//! Downcasting support for aggregate and event trait objects.

use std::any::Any;

/// Gives access to the concrete type behind a trait object.
///
/// Implemented for every `'static + Send + Sync` type, so aggregates and
/// events never implement it by hand.
pub trait AsAny: Any + Send + Sync {
    /// Borrows `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Borrows `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Converts a boxed value into a boxed `Any`.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}
