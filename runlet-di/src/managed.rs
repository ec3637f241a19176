//! Base trait for types which can be materialized by an
//! [ApplicationContext](crate::context::ApplicationContext).

use crate::error::{convert_error, ErrorPtr};
use std::any::Any;
use std::error::Error;

/// A type which can be created with zero-valued fields, before configuration gets injected.
/// Typically automatically derived with `#[derive(Managed)]`.
pub trait Managed: Any + Sized {
    fn construct() -> Self;
}

/// Values which lifecycle methods may return.
pub trait LifecycleResult {
    fn into_lifecycle_result(self) -> Result<(), ErrorPtr>;
}

impl LifecycleResult for () {
    #[inline]
    fn into_lifecycle_result(self) -> Result<(), ErrorPtr> {
        Ok(())
    }
}

impl<E: Error + Send + Sync + 'static> LifecycleResult for Result<(), E> {
    #[inline]
    fn into_lifecycle_result(self) -> Result<(), ErrorPtr> {
        self.map_err(convert_error)
    }
}
