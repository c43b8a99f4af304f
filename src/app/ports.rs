use crate::error::Result;
use crate::oss::{ObjectRequest, UploadRequest};
use crate::types::SheetRows;

// Extract-side ports
pub trait WorkbookPort {
    fn sheet_names(&self) -> Vec<String>;
    fn read_sheet(&mut self, name: &str) -> Result<SheetRows>;
}

// Publish-side ports
pub trait HttpPutPort {
    fn put(&self, request: &UploadRequest) -> std::result::Result<HttpResponse, String>;
}

// Bucket maintenance: signed GET (listing) and DELETE without a body
pub trait HttpObjectPort {
    fn send(&self, request: &ObjectRequest) -> std::result::Result<HttpResponse, String>;
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
