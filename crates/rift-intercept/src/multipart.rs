//! multipart/form-data encoding shared by the client and the multipart matcher.

use bytes::{BufMut, Bytes, BytesMut};
use rand::Rng;

/// A file part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Text fields followed by file parts, encoded in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add a file part whose filename is the field name.
    pub fn file(self, name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        self.file_named(name.clone(), name, data)
    }

    pub fn file_named(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.files.push(FilePart {
            name: name.into(),
            filename: filename.into(),
            content_type: None,
            data: data.into(),
        });
        self
    }

    pub fn file_with_type(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.files.push(FilePart {
            name: name.into(),
            filename: filename.into(),
            content_type: Some(content_type.into()),
            data: data.into(),
        });
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    /// `Content-Type` header value for the given boundary.
    pub fn content_type(boundary: &str) -> String {
        format!("multipart/form-data; boundary={}", boundary)
    }

    pub fn encode(&self, boundary: &str) -> Bytes {
        let mut buf = BytesMut::new();
        for (name, value) in &self.fields {
            put_line(&mut buf, &format!("--{}", boundary));
            put_line(
                &mut buf,
                &format!("Content-Disposition: form-data; name=\"{}\"", name),
            );
            put_line(&mut buf, "");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }
        for file in &self.files {
            put_line(&mut buf, &format!("--{}", boundary));
            put_line(
                &mut buf,
                &format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                    file.name, file.filename
                ),
            );
            if let Some(ct) = &file.content_type {
                put_line(&mut buf, &format!("Content-Type: {}", ct));
            }
            put_line(&mut buf, "");
            buf.put_slice(&file.data);
            buf.put_slice(b"\r\n");
        }
        put_line(&mut buf, &format!("--{}--", boundary));
        buf.freeze()
    }
}

fn put_line(buf: &mut BytesMut, line: &str) {
    buf.put_slice(line.as_bytes());
    buf.put_slice(b"\r\n");
}

/// Fresh 32 hex character boundary.
pub fn random_boundary() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Extract the `boundary` parameter of a multipart `Content-Type`.
pub fn boundary_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}
