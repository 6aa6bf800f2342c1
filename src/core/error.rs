use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidYaml,
    ConfigInvalidValue,

    ValidationInvalidArgument,

    RetrievalFailed,
    RetrievalNotFound,

    ArchiveInvalid,
    ArchiveMissingFile,

    LayoutNoTopCell,
    LayoutAmbiguousTop,
    LayoutInvalid,

    RecordNotFound,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidYaml => "config.invalid_yaml",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::RetrievalFailed => "retrieval.failed",
            ErrorCode::RetrievalNotFound => "retrieval.not_found",

            ErrorCode::ArchiveInvalid => "archive.invalid",
            ErrorCode::ArchiveMissingFile => "archive.missing_file",

            ErrorCode::LayoutNoTopCell => "layout.no_top_cell",
            ErrorCode::LayoutAmbiguousTop => "layout.ambiguous_top",
            ErrorCode::LayoutInvalid => "layout.invalid",

            ErrorCode::RecordNotFound => "record.not_found",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidYamlDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalFailedDetails {
    pub repo: String,
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAmbiguousTopDetails {
    pub candidates: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordNotFoundDetails {
    pub file: String,
    pub record: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::ConfigMissingKey,
            format!("Missing required configuration key '{}'", key),
            to_details(ConfigMissingKeyDetails { key, path }),
        )
    }

    pub fn config_invalid_yaml(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidYaml,
            "Invalid YAML in configuration",
            to_details(ConfigInvalidYamlDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let problem = problem.into();
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid configuration value: {}", problem),
            to_details(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem,
            }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
    ) -> Self {
        let problem = problem.into();
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            format!("Invalid argument: {}", problem),
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem,
                id,
            }),
        )
    }

    pub fn retrieval_failed(
        repo: impl Into<String>,
        step: impl Into<String>,
        status: Option<u16>,
        body: Option<String>,
    ) -> Self {
        let repo = repo.into();
        let step = step.into();
        let message = match status {
            Some(code) => format!("Failed to {} for {}: HTTP {}", step, repo, code),
            None => format!("Failed to {} for {}", step, repo),
        };
        Self::new(
            ErrorCode::RetrievalFailed,
            message,
            to_details(RetrievalFailedDetails {
                repo,
                step,
                status,
                body,
            }),
        )
    }

    pub fn retrieval_not_found(repo: impl Into<String>, what: impl Into<String>) -> Self {
        let repo = repo.into();
        let what = what.into();
        Self::new(
            ErrorCode::RetrievalNotFound,
            format!("No {} found for {}", what, repo),
            serde_json::json!({ "repo": repo, "missing": what }),
        )
    }

    pub fn archive_invalid(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ArchiveInvalid,
            "Artifact archive could not be read",
            serde_json::json!({ "path": path.into(), "error": error.into() }),
        )
    }

    pub fn archive_missing_file(dir: impl Into<String>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self::new(
            ErrorCode::ArchiveMissingFile,
            format!("Artifact contains no .{} file", extension),
            serde_json::json!({ "dir": dir.into(), "extension": extension }),
        )
    }

    pub fn layout_no_top_cell(problem: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::LayoutNoTopCell,
            "No top cell found in the layout",
            serde_json::json!({ "problem": problem.into() }),
        )
    }

    pub fn layout_ambiguous_top(candidates: Vec<String>) -> Self {
        Self::new(
            ErrorCode::LayoutAmbiguousTop,
            format!("Layout has {} top cell candidates", candidates.len()),
            to_details(LayoutAmbiguousTopDetails { candidates }),
        )
        .with_hint("Run without --strict-top to rename the first candidate")
    }

    pub fn layout_invalid(problem: impl Into<String>) -> Self {
        let problem = problem.into();
        Self::new(
            ErrorCode::LayoutInvalid,
            format!("Invalid GDSII layout: {}", problem),
            serde_json::json!({ "problem": problem }),
        )
    }

    pub fn record_not_found(file: impl Into<String>, record: impl Into<String>) -> Self {
        let record = record.into();
        Self::new(
            ErrorCode::RecordNotFound,
            format!("No {} record found", record),
            to_details(RecordNotFoundDetails {
                file: file.into(),
                record,
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalJsonErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_dotted() {
        assert_eq!(ErrorCode::LayoutNoTopCell.as_str(), "layout.no_top_cell");
        assert_eq!(ErrorCode::RecordNotFound.as_str(), "record.not_found");
    }

    #[test]
    fn retrieval_failed_message_includes_status() {
        let err = Error::retrieval_failed("acme/tile", "list workflow runs", Some(404), None);
        assert_eq!(err.code, ErrorCode::RetrievalFailed);
        assert!(err.message.contains("HTTP 404"));
        assert_eq!(err.details["repo"], "acme/tile");
    }

    #[test]
    fn ambiguous_top_lists_candidates_and_hint() {
        let err = Error::layout_ambiguous_top(vec!["A".into(), "B".into()]);
        assert_eq!(err.details["candidates"][1], "B");
        assert_eq!(err.hints.len(), 1);
    }
}
