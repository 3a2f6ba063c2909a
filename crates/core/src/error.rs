#[derive(Debug, thiserror::Error)]
pub enum SolaceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read file {}: {source}", .path.display())]
    FileRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {}: {source}", .path.display())]
    FileWrite {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create directory: {0}")]
    CreateDir(std::io::Error),
    #[error("failed to deserialize JSON content: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("content has not been loaded yet")]
    DataNotReady,
    #[error("option {option_id:?} is not offered at step {step}")]
    UnknownOption { step: usize, option_id: String },
    #[error("questionnaire already finished; restart to answer again")]
    SessionFinished,
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid text: {0}")]
    Text(#[from] solace_types::TextError),
}

pub type SolaceResult<T> = std::result::Result<T, SolaceError>;
