use error_stack::Report;

use crate::core::errors::ApiErrorResponse;

/// Run the error branch when `predicate` holds, otherwise succeed with unit.
/// Keeps validation call sites flat.
pub fn when<E, F>(predicate: bool, error_fn: F) -> Result<(), E>
where
    F: FnOnce() -> Result<(), E>,
{
    if predicate {
        error_fn()
    } else {
        Ok(())
    }
}

/// Extension for pulling required values out of options while surfacing a
/// typed error.
pub trait OptionExt<T> {
    fn get_required_value(
        self,
        field_name: &'static str,
    ) -> error_stack::Result<T, ApiErrorResponse>;
}

impl<T> OptionExt<T> for Option<T> {
    fn get_required_value(
        self,
        field_name: &'static str,
    ) -> error_stack::Result<T, ApiErrorResponse> {
        self.ok_or_else(|| {
            Report::new(ApiErrorResponse::InternalServerError)
                .attach_printable(format!("Missing required value: {field_name}"))
        })
    }
}
