use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReginCoreError {
    #[error("configuration is missing the required key '{0}'")]
    MissingConfigKey(&'static str),
    #[error("invalid value '{value}' for configuration key '{key}': {source}")]
    InvalidConfigValue {
        key: String,
        value: String,
        source: std::num::ParseIntError,
    },
    #[error("input ended before a header line could be read")]
    MissingHeader,
    #[error("header has no column {0}")]
    MissingHeaderColumn(usize),
    #[error("line {line}: row has no column {column}")]
    MissingColumn { line: u64, column: usize },
    #[error("identifier mapping line {line}: expected 4 tab-separated fields, found {found}")]
    MalformedMappingRow { line: u64, found: usize },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReginCoreError>;
