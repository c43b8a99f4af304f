use crate::app::ports::{HttpObjectPort, HttpPutPort, HttpResponse};
use crate::error::Result;
use crate::oss::{ObjectRequest, UploadRequest, DELETE, GET};
use reqwest::blocking::{Client, RequestBuilder, Response};
use std::time::Duration;

#[derive(Clone)]
pub struct ReqwestHttp {
    client: Client,
}

impl ReqwestHttp {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn execute(builder: RequestBuilder) -> std::result::Result<HttpResponse, String> {
        let resp = builder.send().map_err(|e| e.to_string())?;
        Ok(Self::into_response(resp))
    }

    /// A body that cannot be read is reported in place of the server's message.
    fn into_response(resp: Response) -> HttpResponse {
        let status = resp.status().as_u16();
        let body = match resp.text() {
            Ok(body) => body,
            Err(e) => format!("<unreadable body: {}>", e),
        };
        HttpResponse { status, body }
    }
}

impl HttpPutPort for ReqwestHttp {
    fn put(&self, request: &UploadRequest) -> std::result::Result<HttpResponse, String> {
        let mut builder = self.client.put(&request.url);
        for (name, value) in request.header_pairs() {
            builder = builder.header(name, value);
        }
        Self::execute(builder.body(request.body.clone()))
    }
}

impl HttpObjectPort for ReqwestHttp {
    fn send(&self, request: &ObjectRequest) -> std::result::Result<HttpResponse, String> {
        let mut builder = match request.method {
            GET => self.client.get(&request.url),
            DELETE => self.client.delete(&request.url),
            other => return Err(format!("unsupported method {}", other)),
        };
        for (name, value) in request.header_pairs() {
            builder = builder.header(name, value);
        }
        Self::execute(builder)
    }
}
