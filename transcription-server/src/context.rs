use crate::headers::RequestId;

/// Holds the context in which a request is being executed.
#[cfg_attr(debug_assertions, derive(Debug))]
#[derive(Clone)]
pub struct Context {
    request_id: RequestId,
}

impl Context {
    pub fn new(request_id: RequestId) -> Self {
        Self { request_id }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}
