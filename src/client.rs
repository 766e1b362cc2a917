use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

/// Decoded gateway response.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Synchronous client stub: one connection, one request in flight, one
/// response per request. No pooling, no retry; reconnection after a
/// transport error is the caller's job.
pub struct Client {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl Client {
    pub fn connect(addr: &str) -> Result<Client> {
        let stream = TcpStream::connect(addr)
            .with_context(|| format!("failed to connect to {addr}"))?;
        let writer = stream.try_clone()?;
        Ok(Client {
            writer,
            reader: BufReader::new(stream),
        })
    }

    /// Send one request and block for its response.
    pub fn call(&mut self, operation: &str, args: Value) -> Result<Response> {
        let request = json!({ "operation": operation, "args": args });
        writeln!(self.writer, "{request}")?;
        self.writer.flush()?;

        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            bail!("server closed the connection");
        }
        Ok(serde_json::from_str(line.trim())?)
    }

    /// Send a raw line as-is. Only useful for protocol tests.
    pub fn call_raw(&mut self, payload: &str) -> Result<Response> {
        writeln!(self.writer, "{payload}")?;
        self.writer.flush()?;
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            bail!("server closed the connection");
        }
        Ok(serde_json::from_str(line.trim())?)
    }

    // Convenience wrappers mirroring the operation catalog.

    pub fn login(&mut self, username: &str, password: &str) -> Result<Response> {
        self.call("login", json!({ "username": username, "password": password }))
    }

    pub fn change_password(&mut self, username: &str, old: &str, new: &str) -> Result<Response> {
        self.call(
            "change_password",
            json!({ "username": username, "old_password": old, "new_password": new }),
        )
    }

    pub fn list_courses(&mut self) -> Result<Response> {
        self.call("list_courses", json!({}))
    }

    pub fn enroll_course(&mut self, student_id: &str, course_id: &str) -> Result<Response> {
        self.call(
            "enroll_course",
            json!({ "student_id": student_id, "course_id": course_id }),
        )
    }

    pub fn drop_course(&mut self, student_id: &str, course_id: &str) -> Result<Response> {
        self.call(
            "drop_course",
            json!({ "student_id": student_id, "course_id": course_id }),
        )
    }

    pub fn list_student_courses(&mut self, student_id: &str) -> Result<Response> {
        self.call("list_student_courses", json!({ "student_id": student_id }))
    }

    pub fn list_student_grades(&mut self, student_id: &str) -> Result<Response> {
        self.call("list_student_grades", json!({ "student_id": student_id }))
    }

    pub fn list_course_grades(&mut self, course_id: &str) -> Result<Response> {
        self.call("list_course_grades", json!({ "course_id": course_id }))
    }

    pub fn record_grade(
        &mut self,
        student_id: &str,
        course_id: &str,
        usual_score: f64,
        exam_score: f64,
        semester: &str,
    ) -> Result<Response> {
        self.call(
            "record_grade",
            json!({
                "student_id": student_id,
                "course_id": course_id,
                "usual_score": usual_score,
                "exam_score": exam_score,
                "semester": semester,
            }),
        )
    }
}
