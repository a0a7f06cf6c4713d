// ghostmail-cli/src/output.rs
use ghostmail_client::Error;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// Output format option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `{"ok":...}` envelope on stdout
    Json,
    Human,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Trait for types that can be formatted for output
pub trait Formattable: Serialize {
    /// Format as human-readable string
    fn to_human(&self) -> String;
}

/// Format output based on the specified format
pub fn format_output<T: Formattable>(data: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(&Response::ok(data))?),
        OutputFormat::Human => Ok(data.to_human()),
    }
}

pub fn emit<T: Formattable>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", format_output(data, format)?);
    Ok(())
}

/// Standard JSON response envelope
#[derive(Debug, Serialize)]
pub struct Response<T> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorResponse>,
}

impl<T> Response<T> {
    pub fn ok(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(error: ErrorResponse) -> Response<()> {
        Response::<()> {
            ok: false,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    type_: &'static str,
    message: String,
}

impl ErrorResponse {
    /// Library errors keep their taxonomy name; anything else is generic
    pub fn from_error(err: &anyhow::Error) -> Self {
        let type_ = err
            .downcast_ref::<Error>()
            .map(Error::kind)
            .unwrap_or("error");
        Self {
            type_,
            message: format!("{:#}", err),
        }
    }
}

/// Process exit codes
#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

impl ExitCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

/// Report a failed command on stdout in the selected format
pub fn report_error(err: &anyhow::Error, format: OutputFormat) {
    let mut term = console::Term::stdout();
    let _ = write_error(&mut term, err, format);
}

pub fn write_error<W: Write>(out: &mut W, err: &anyhow::Error, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let resp = Response::<()>::error(ErrorResponse::from_error(err));
            let line = serde_json::to_string(&resp).map_err(io::Error::other)?;
            writeln!(out, "{}", line)
        }
        OutputFormat::Human => writeln!(out, "{} {:#}", console::style("Error:").red(), err),
    }
}

/// Print a styled success message
pub fn print_success(message: &str) {
    let term = console::Term::stdout();
    let _ = term.write_str(&format!("{} {}\n", console::style("✓").green(), message));
}

/// Print a styled warning message
pub fn print_warning(message: &str) {
    let term = console::Term::stdout();
    let _ = term.write_str(&format!("{} {}\n", console::style("Warning:").yellow(), message));
}

/// One `key: value` line with a bold key
pub fn header(key: &str, value: &str) -> String {
    format!("{}: {}", console::style(key).bold(), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct TestData {
        message: String,
    }

    impl Formattable for TestData {
        fn to_human(&self) -> String {
            format!("Message: {}", self.message)
        }
    }

    #[test]
    fn test_format_output_json() {
        let data = TestData {
            message: "hello".to_string(),
        };
        let result = format_output(&data, OutputFormat::Json).unwrap();
        assert_eq!(result, r#"{"ok":true,"result":{"message":"hello"}}"#);
    }

    #[test]
    fn test_format_output_human() {
        let data = TestData {
            message: "hello".to_string(),
        };
        let result = format_output(&data, OutputFormat::Human).unwrap();
        assert_eq!(result, "Message: hello");
    }

    #[test]
    fn test_error_envelope_names_the_kind() {
        let err = anyhow::Error::new(Error::Integrity);
        let resp = Response::<()>::error(ErrorResponse::from_error(&err));
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["type"], "integrity_error");
        assert!(json.get("result").is_none());
    }

    #[test]
    fn test_foreign_error_is_generic() {
        let err = anyhow::anyhow!("boom");
        let resp = ErrorResponse::from_error(&err);
        assert_eq!(resp.type_, "error");
        assert_eq!(resp.message, "boom");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Failure.code(), 1);
    }

    #[test]
    fn test_human_error_is_one_readable_line() {
        let err = anyhow::Error::new(Error::NotFound("/tmp/creds.json".into()));
        let mut out = Vec::new();
        write_error(&mut out, &err, OutputFormat::Human).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error:"));
        assert!(text.contains("not found: /tmp/creds.json"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_json_error_is_envelope_line() {
        let err = anyhow::Error::new(Error::Unavailable);
        let mut out = Vec::new();
        write_error(&mut out, &err, OutputFormat::Json).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["type"], "unavailable");
    }
}
