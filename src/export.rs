//! Export types and serializers for committed triples.
//!
//! Two formats are supported: N-Triples (one `<s> <p> o .` line per triple,
//! literals typed with XSD datatypes) and JSON (a list of [`TripleExport`]
//! records).

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::Triple;
use crate::value::{Literal, Value};

const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Errors from exporting triples.
#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error("failed to encode triples as JSON: {message}")]
    #[diagnostic(
        code(motif::export::json),
        help("This is a bug in the exporter; please report it.")
    )]
    Json { message: String },

    #[error("failed to write export: {path}")]
    #[diagnostic(
        code(motif::export::write),
        help("Ensure you have write permissions to the output directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown export format: \"{name}\"")]
    #[diagnostic(code(motif::export::unknown_format), help("Supported formats: ntriples, json."))]
    UnknownFormat { name: String },
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Output format for [`serialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializeFormat {
    NTriples,
    Json,
}

impl FromStr for SerializeFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ntriples" | "nt" => Ok(SerializeFormat::NTriples),
            "json" => Ok(SerializeFormat::Json),
            _ => Err(ExportError::UnknownFormat { name: s.to_string() }),
        }
    }
}

/// Exported triple with every position rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleExport {
    /// Subject identifier.
    pub subject: String,
    /// Predicate identifier.
    pub predicate: String,
    /// Object identifier or literal lexical form.
    pub object: String,
    /// `resource`, `integer`, `float`, `string` or `boolean`.
    pub object_kind: String,
}

impl From<&Triple> for TripleExport {
    fn from(t: &Triple) -> Self {
        let object = match &t.object {
            Value::Uri(uri) => uri.as_str().to_string(),
            Value::Literal(lit) => lexical_form(lit),
        };
        Self {
            subject: t.subject.as_str().to_string(),
            predicate: t.predicate.as_str().to_string(),
            object,
            object_kind: t.object.kind().to_string(),
        }
    }
}

/// Render triples in the requested format.
pub fn serialize<'a>(
    triples: impl IntoIterator<Item = &'a Triple>,
    format: SerializeFormat,
) -> ExportResult<String> {
    match format {
        SerializeFormat::NTriples => Ok(to_ntriples(triples)),
        SerializeFormat::Json => to_json(triples),
    }
}

/// Render triples and write them to `path`.
pub fn write_to<'a>(
    path: &Path,
    triples: impl IntoIterator<Item = &'a Triple>,
    format: SerializeFormat,
) -> ExportResult<()> {
    let content = serialize(triples, format)?;
    std::fs::write(path, content).map_err(|e| ExportError::Write {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn to_json<'a>(triples: impl IntoIterator<Item = &'a Triple>) -> ExportResult<String> {
    let records: Vec<TripleExport> = triples.into_iter().map(TripleExport::from).collect();
    serde_json::to_string_pretty(&records).map_err(|e| ExportError::Json {
        message: e.to_string(),
    })
}

pub fn to_ntriples<'a>(triples: impl IntoIterator<Item = &'a Triple>) -> String {
    let mut out = String::new();
    for t in triples {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "<{}> <{}> {} .",
            t.subject.as_str(),
            t.predicate.as_str(),
            ntriples_object(&t.object)
        );
    }
    out
}

fn ntriples_object(value: &Value) -> String {
    match value {
        Value::Uri(uri) => format!("<{}>", uri.as_str()),
        Value::Literal(Literal::String(s)) => format!("\"{}\"", escape(s)),
        Value::Literal(lit) => {
            let datatype = match lit {
                Literal::Integer(_) => "integer",
                Literal::Float(_) => "double",
                Literal::Boolean(_) => "boolean",
                Literal::String(_) => "string",
            };
            format!("\"{}\"^^<{XSD}{datatype}>", lexical_form(lit))
        }
    }
}

fn lexical_form(lit: &Literal) -> String {
    match lit {
        Literal::Integer(n) => n.to_string(),
        Literal::Float(x) => format!("{x:?}"),
        Literal::String(s) => s.clone(),
        Literal::Boolean(b) => b.to_string(),
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Uri;

    fn uri(s: &str) -> Uri {
        Uri::new(s)
    }

    fn sample() -> Vec<Triple> {
        vec![
            Triple::new(uri("http://x/a"), uri("http://x/p"), uri("http://x/b")),
            Triple::new(uri("http://x/a"), uri("http://x/n"), 3i64),
            Triple::new(
                uri("http://x/a"),
                uri("http://x/s"),
                Literal::String("say \"hi\"\n".into()),
            ),
        ]
    }

    #[test]
    fn ntriples_lines() {
        let nt = to_ntriples(&sample());
        let lines: Vec<&str> = nt.lines().collect();
        assert_eq!(lines[0], "<http://x/a> <http://x/p> <http://x/b> .");
        assert_eq!(
            lines[1],
            "<http://x/a> <http://x/n> \"3\"^^<http://www.w3.org/2001/XMLSchema#integer> ."
        );
        assert_eq!(lines[2], r#"<http://x/a> <http://x/s> "say \"hi\"\n" ."#);
    }

    #[test]
    fn json_records() {
        let json = to_json(&sample()).unwrap();
        let records: Vec<TripleExport> = serde_json::from_str(&json).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].object, "3");
        assert_eq!(records[1].object_kind, "integer");
        assert_eq!(records[0].object_kind, "resource");
    }

    #[test]
    fn format_names_parse() {
        assert_eq!("nt".parse::<SerializeFormat>().unwrap(), SerializeFormat::NTriples);
        assert_eq!("JSON".parse::<SerializeFormat>().unwrap(), SerializeFormat::Json);
        assert!(matches!(
            "xml".parse::<SerializeFormat>(),
            Err(ExportError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nt");
        write_to(&path, &sample(), SerializeFormat::NTriples).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }
}
