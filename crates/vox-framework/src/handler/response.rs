//! Handler return values.

use tower::BoxError;
use vox_core::Response;

use crate::error::InvokeError;

/// A type that can be returned from an intent handler.
///
/// Bare strings are wrapped into a [`Response::tell`]. A `Result` whose error
/// converts into a [`BoxError`] surfaces that error unchanged as
/// [`InvokeError::Handler`].
pub trait IntoResponse: Send + 'static {
    fn into_response(self) -> Result<Response, InvokeError>;
}

impl IntoResponse for Response {
    fn into_response(self) -> Result<Response, InvokeError> {
        Ok(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Result<Response, InvokeError> {
        Ok(Response::tell(self))
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Result<Response, InvokeError> {
        Ok(Response::tell(self))
    }
}

impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: Into<BoxError> + Send + 'static,
{
    fn into_response(self) -> Result<Response, InvokeError> {
        match self {
            Ok(value) => value.into_response(),
            Err(error) => Err(InvokeError::Handler(error.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_core::ResponseType;

    #[test]
    fn test_string_is_wrapped() {
        let response = "Hello".into_response().unwrap();
        assert_eq!(response, Response::tell("Hello"));

        let response = String::from("Hi").into_response().unwrap();
        assert_eq!(response.kind, ResponseType::Tell);
    }

    #[test]
    fn test_result_error_propagates() {
        let result: Result<String, std::io::Error> =
            Err(std::io::Error::other("disk on fire"));
        let error = result.into_response().unwrap_err();

        let source = error.as_handler_error().unwrap();
        assert_eq!(source.to_string(), "disk on fire");
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }
}
