use crate::request::Body;

/// Hand-assembled multipart/form-data body with a random boundary.
///
/// Kept as plain bytes so builders stay pure data and tests can assert on
/// the exact payload without a network.
pub struct MultipartForm {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("Boundary-{}", uuid::Uuid::new_v4()),
            bytes: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.bytes
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.bytes.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        self.bytes.extend_from_slice(value.as_bytes());
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(mut self, name: &str, filename: &str, mime_type: &str, bytes: &[u8]) -> Self {
        self.bytes
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.bytes.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        self.bytes
            .extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
        self.bytes.extend_from_slice(bytes);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    /// Appends the closing boundary and returns the content-type header value
    /// together with the finished body.
    pub fn finish(mut self) -> (String, Body) {
        self.bytes
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            Body::MultipartFormData {
                boundary: self.boundary,
                bytes: self.bytes,
            },
        )
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}
