use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use session::{Receipt, Submission, Transport, TransportError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// POSTs score reports as JSON.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quiz/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, submission: &Submission) -> Result<Receipt, TransportError> {
        let response = self
            .client
            .post(&submission.endpoint)
            .json(&submission.report)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "results endpoint responded");

        if status.is_success() {
            Ok(Receipt::from_body(&body))
        } else {
            Err(TransportError::Status {
                code: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::thread::{self, JoinHandle};

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::Value;

    use session::{Dispatch, Quiz, Respondent, Submission};

    use super::*;

    const SOURCE: &str = "Animals\n---\nquestions\nQ: Which barks?\nA: dog [correct]\nA: cat\n";

    /// Accept one request, answer it with `status` and `body`, and hand back
    /// the request body.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}/submit", listener.local_addr().expect("local addr"));
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream);
            let mut length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("read header");
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        length = value.trim().parse().expect("content length");
                    }
                }
            }
            let mut request = vec![0; length];
            reader.read_exact(&mut request).expect("read body");

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            reader.get_mut().write_all(response.as_bytes()).expect("write response");
            String::from_utf8(request).expect("utf-8 body")
        });
        (url, handle)
    }

    /// A checked quiz pointed at `endpoint`, with its outgoing submission.
    fn submission(endpoint: &str) -> Submission {
        let document = quizdoc::Parser::new(SOURCE.to_string(), 0)
            .parse_with_rng(&mut StdRng::seed_from_u64(0))
            .document;
        let mut quiz = Quiz::new(Arc::new(document), Some(endpoint.to_string()), StdRng::seed_from_u64(1));
        quiz.unlock(Respondent {
            name: "Ada".to_string(),
            email: Some("ada@example.org".to_string()),
            group: None,
        })
        .expect("unlock");
        let index = quiz.session().attempt().questions().next().expect("question").index;
        quiz.answer_question(index, "dog").expect("answer");
        match quiz.check().expect("check").dispatch {
            Dispatch::Send(submission) => submission,
            other => panic!("expected a submission, got {:?}", other),
        }
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn plain_success_body_gets_generic_message() {
        let (url, server) = serve_once("200 OK", "ok");
        let receipt = transport().send(&submission(&url)).expect("send");
        assert_eq!(receipt.message, "Results submitted.");

        let posted: Value = serde_json::from_str(&server.join().expect("server")).expect("json body");
        assert_eq!(posted["quizName"], "Animals");
        assert_eq!(posted["name"], "Ada");
        assert_eq!(posted["email"], "ada@example.org");
        assert_eq!(posted["score"], 1);
        assert_eq!(posted["total"], 1);
        assert!(posted["timestamp"].is_string());
        assert!(posted.get("group").is_none());
    }

    #[test]
    fn json_message_is_passed_through() {
        let (url, server) = serve_once("201 Created", r#"{"message":"hi"}"#);
        let receipt = transport().send(&submission(&url)).expect("send");
        assert_eq!(receipt.message, "hi");
        server.join().expect("server");
    }

    #[test]
    fn error_status_keeps_the_body() {
        let (url, server) = serve_once("500 Internal Server Error", "boom");
        let error = transport().send(&submission(&url)).expect_err("status error");
        assert_eq!(
            error,
            TransportError::Status {
                code: 500,
                body: "boom".to_string(),
            }
        );
        server.join().expect("server");
    }

    #[test]
    fn unreachable_endpoint_is_a_network_error() {
        let url = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            format!("http://{}/submit", listener.local_addr().expect("local addr"))
        };
        let error = transport().send(&submission(&url)).expect_err("network error");
        assert!(matches!(error, TransportError::Network(_)), "{:?}", error);
    }
}
