//! Remote SPARQL endpoint over HTTP.
//!
//! Queries are POSTed form-encoded (`query=...`) and answered in the W3C
//! SPARQL 1.1 Query Results JSON format.

use std::collections::BTreeMap;
use std::time::Duration;

use abstractor_core::{QueryError, QueryExecutor, Row};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

#[derive(Debug, Clone)]
pub struct SparqlEndpoint {
    url: String,
    client: Client,
    credentials: Option<(String, Option<String>)>,
}

impl SparqlEndpoint {
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self, QueryError> {
        url::Url::parse(url).map_err(|e| QueryError::Transport(format!("invalid endpoint url `{url}`: {e}")))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| QueryError::Transport(format!("failed to build http client: {e}")))?;

        Ok(Self {
            url: url.to_string(),
            client,
            credentials: None,
        })
    }

    /// HTTP basic authentication for every request.
    pub fn with_credentials(mut self, user: &str, password: Option<&str>) -> Self {
        self.credentials = Some((user.to_string(), password.map(str::to_string)));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl QueryExecutor for SparqlEndpoint {
    fn execute(&self, query: &str) -> Result<Vec<Row>, QueryError> {
        let mut request = self
            .client
            .post(&self.url)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", query)]);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_deref());
        }

        let response = request
            .send()
            .map_err(|e| QueryError::Transport(format!("{}: {e}", self.url)))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| QueryError::Transport(format!("{}: failed to read response: {e}", self.url)))?;
        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            return Err(QueryError::Transport(format!(
                "{} returned {status}: {snippet}",
                self.url
            )));
        }

        let rows = parse_results(&body)?;
        tracing::debug!(endpoint = %self.url, rows = rows.len(), "endpoint answered");
        Ok(rows)
    }
}

// ============================================================================
// SPARQL JSON results
// ============================================================================

#[derive(Debug, Deserialize)]
struct ResultsDocument {
    results: Bindings,
}

#[derive(Debug, Deserialize)]
struct Bindings {
    bindings: Vec<BTreeMap<String, Binding>>,
}

#[derive(Debug, Deserialize)]
struct Binding {
    value: String,
}

/// Decode a SPARQL JSON results document into rows of lexical values.
pub fn parse_results(body: &str) -> Result<Vec<Row>, QueryError> {
    let doc: ResultsDocument = serde_json::from_str(body)
        .map_err(|e| QueryError::Parse(format!("invalid SPARQL JSON results: {e}")))?;
    Ok(doc
        .results
        .bindings
        .into_iter()
        .map(|binding| binding.into_iter().map(|(k, v)| (k, v.value)).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const RESULTS: &str = r#"{
      "head": { "vars": ["entity", "label"] },
      "results": {
        "bindings": [
          { "entity": { "type": "uri", "value": "http://ex/Gene" },
            "label": { "type": "literal", "xml:lang": "en", "value": "Gene" } },
          { "entity": { "type": "uri", "value": "http://ex/Exon" } },
          { "entity": { "type": "bnode", "value": "b0" },
            "label": { "type": "typed-literal", "datatype": "http://www.w3.org/2001/XMLSchema#boolean", "value": "true" } }
        ]
      }
    }"#;

    #[test]
    fn decodes_bindings_and_leaves_unbound_columns_out() {
        let rows = parse_results(RESULTS).expect("parse");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["entity"], "http://ex/Gene");
        assert_eq!(rows[0]["label"], "Gene");
        assert!(!rows[1].contains_key("label"));
        assert_eq!(rows[2]["label"], "true");
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        assert!(matches!(parse_results("<html/>"), Err(QueryError::Parse(_))));
        assert!(matches!(
            parse_results(r#"{"head": {}}"#),
            Err(QueryError::Parse(_))
        ));
    }

    #[test]
    fn invalid_url_is_rejected_up_front() {
        assert!(matches!(
            SparqlEndpoint::new("not a url", None),
            Err(QueryError::Transport(_))
        ));
    }

    /// Serve one canned HTTP response; returns the endpoint url and the raw request.
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}/sparql", listener.local_addr().expect("addr"));
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).expect("read");
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {SPARQL_RESULTS_JSON}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write");
            String::from_utf8_lossy(&request).into_owned()
        });
        (url, handle)
    }

    #[test]
    fn posts_form_encoded_query_with_credentials() {
        let (url, server) = serve_once("200 OK", RESULTS);
        let endpoint = SparqlEndpoint::new(&url, Some(Duration::from_secs(5)))
            .expect("endpoint")
            .with_credentials("dba", Some("secret"));
        let rows = endpoint.execute("SELECT ?entity WHERE { ?s a ?entity }").expect("rows");
        assert_eq!(rows.len(), 3);

        let request = server.join().expect("server thread");
        let lower = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /sparql"));
        assert!(lower.contains("accept: application/sparql-results+json"));
        assert!(lower.contains("content-type: application/x-www-form-urlencoded"));
        assert!(lower.contains("authorization: basic"));
        assert!(request.contains("query=SELECT"));
    }

    #[test]
    fn error_status_is_a_transport_error() {
        let (url, server) = serve_once("500 Internal Server Error", "{}");
        let endpoint = SparqlEndpoint::new(&url, Some(Duration::from_secs(5))).expect("endpoint");
        let err = endpoint.execute("SELECT * WHERE { ?s ?p ?o }").unwrap_err();
        server.join().expect("server thread");
        match err {
            QueryError::Transport(message) => assert!(message.contains("500")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
