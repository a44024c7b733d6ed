//! The request-execution primitive the NTLM transport wraps.


use std::future::Future;

use reqwest::{Client, Request, Response};


/// Anything that can send an HTTP request and obtain its response.
///
/// [`reqwest::Client`] is the canonical implementation; [`NtlmTransport`](crate::NtlmTransport)
/// implements it as well, so transports can be stacked and passed wherever an executor is
/// expected.
pub trait RequestExecutor {
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(&self, request: Request) -> impl Future<Output = Result<Response, Self::Error>> + Send;
}

impl RequestExecutor for Client {
    type Error = reqwest::Error;

    fn execute(&self, request: Request) -> impl Future<Output = Result<Response, Self::Error>> + Send {
        Client::execute(self, request)
    }
}

impl<X: RequestExecutor> RequestExecutor for &X {
    type Error = X::Error;

    fn execute(&self, request: Request) -> impl Future<Output = Result<Response, Self::Error>> + Send {
        (**self).execute(request)
    }
}
