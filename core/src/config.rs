use crate::errors::{ReginCoreError, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub const NAME: &str = "name";
pub const ORGANISM: &str = "organism";
pub const VERSION: &str = "version";
pub const SOURCE_COLUMNS: &str = "source_columns";
pub const TARGET_COLUMNS: &str = "target_columns";
pub const EDGE_COLUMNS: &str = "edge_columns";

pub const SOURCE_ID_COLUMN: &str = "source_id_column";
pub const SOURCE_TYPE: &str = "source_type";
pub const SOURCE_LABEL_COLUMN: &str = "source_label_column";
pub const SOURCE_BRIDGEDB: &str = "source_bridgedb";
pub const SOURCE_SYSCODE_IN: &str = "source_syscode_in";
pub const SOURCE_SYSCODES_OUT: &str = "source_syscodes_out";

pub const TARGET_ID_COLUMN: &str = "target_id_column";
pub const TARGET_TYPE: &str = "target_type";
pub const TARGET_LABEL_COLUMN: &str = "target_label_column";
pub const TARGET_BRIDGEDB: &str = "target_bridgedb";
pub const TARGET_SYSCODE_IN: &str = "target_syscode_in";
pub const TARGET_SYSCODES_OUT: &str = "target_syscodes_out";

pub const INTERACTION_TYPE: &str = "interaction_type";

/// Column configuration for one endpoint (source or target) of a row.
#[derive(Debug, Clone, Default)]
pub struct EndpointMapping {
    /// 0-based index of the identifier column. Without it no node and
    /// therefore no edge can be created for this endpoint.
    pub id_column: Option<usize>,
    /// Optional label column, falls back to the identifier.
    pub label_column: Option<usize>,
    /// Literal value for the `biologicalType` node attribute.
    pub node_type: Option<String>,
    /// Columns copied verbatim as node attributes, keyed by header name.
    pub attribute_columns: BTreeSet<usize>,
    /// Identifier mapping backend for this endpoint, absent = resolution disabled.
    pub mapping_file: Option<PathBuf>,
    /// System code of the namespace the raw identifiers belong to.
    pub syscode_in: Option<String>,
    /// System codes of the namespaces to resolve into.
    pub syscodes_out: Vec<String>,
}

/// Declarative mapping from input columns to network, node and edge
/// attributes, read from a flat `key=value` configuration file.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    pub name: String,
    pub organism: Option<String>,
    pub version: Option<String>,
    pub source: EndpointMapping,
    pub target: EndpointMapping,
    /// Columns copied verbatim onto every edge, keyed by header name.
    pub edge_columns: BTreeSet<usize>,
    /// Literal value for the `interaction` attribute of every edge.
    pub interaction_type: Option<String>,
}

impl ColumnMapping {
    pub fn from_file(path: &Path) -> Result<ColumnMapping> {
        let file = File::open(path)?;
        ColumnMapping::parse(BufReader::new(file))
    }

    /// Parses the flat configuration format. Lines that are not a
    /// `key=value` pair with a recognized key are logged and skipped.
    pub fn parse<R: BufRead>(reader: R) -> Result<ColumnMapping> {
        let mut mapping = ColumnMapping::default();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!("invalid attribute\t{}", line);
                continue;
            };
            match key {
                NAME => mapping.name = value.to_string(),
                ORGANISM => mapping.organism = Some(value.to_string()),
                VERSION => mapping.version = Some(value.to_string()),
                SOURCE_COLUMNS => mapping.source.attribute_columns = parse_column_set(key, value)?,
                TARGET_COLUMNS => mapping.target.attribute_columns = parse_column_set(key, value)?,
                EDGE_COLUMNS => mapping.edge_columns = parse_column_set(key, value)?,
                SOURCE_ID_COLUMN => mapping.source.id_column = Some(parse_column(key, value)?),
                SOURCE_LABEL_COLUMN => mapping.source.label_column = Some(parse_column(key, value)?),
                SOURCE_TYPE => mapping.source.node_type = Some(value.to_string()),
                SOURCE_BRIDGEDB => mapping.source.mapping_file = Some(PathBuf::from(value)),
                SOURCE_SYSCODE_IN => mapping.source.syscode_in = Some(value.to_string()),
                SOURCE_SYSCODES_OUT => {
                    mapping.source.syscodes_out = value.split(',').map(String::from).collect()
                }
                TARGET_ID_COLUMN => mapping.target.id_column = Some(parse_column(key, value)?),
                TARGET_LABEL_COLUMN => mapping.target.label_column = Some(parse_column(key, value)?),
                TARGET_TYPE => mapping.target.node_type = Some(value.to_string()),
                TARGET_BRIDGEDB => mapping.target.mapping_file = Some(PathBuf::from(value)),
                TARGET_SYSCODE_IN => mapping.target.syscode_in = Some(value.to_string()),
                TARGET_SYSCODES_OUT => {
                    mapping.target.syscodes_out = value.split(',').map(String::from).collect()
                }
                INTERACTION_TYPE => mapping.interaction_type = Some(value.to_string()),
                _ => warn!("invalid attribute\t{}", line),
            }
        }
        if mapping.name.is_empty() {
            return Err(ReginCoreError::MissingConfigKey(NAME));
        }
        Ok(mapping)
    }

    /// Display name of the network: `name[_organism][_version]`.
    pub fn network_name(&self) -> String {
        let mut name = self.name.clone();
        if let Some(organism) = &self.organism {
            name.push('_');
            name.push_str(organism);
        }
        if let Some(version) = &self.version {
            name.push('_');
            name.push_str(version);
        }
        name
    }
}

fn parse_column(key: &str, value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .map_err(|source| ReginCoreError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
            source,
        })
}

fn parse_column_set(key: &str, value: &str) -> Result<BTreeSet<usize>> {
    value.split(',').map(|c| parse_column(key, c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FULL_CONFIG: &str = "name=TargetScan\n\
organism=Hs\n\
version=6.2\n\
source_id_column=0\n\
source_label_column=1\n\
source_type=microRNA\n\
source_columns=1,4\n\
source_bridgedb=mappings/mirbase.tsv\n\
source_syscode_in=Mb\n\
source_syscodes_out=Mbm,En\n\
target_id_column=2\n\
target_type=gene\n\
target_columns=3\n\
edge_columns=5,6\n\
interaction_type=represses\n";

    #[test]
    fn parses_all_recognized_keys() {
        let mapping = ColumnMapping::parse(FULL_CONFIG.as_bytes()).unwrap();

        assert_eq!("TargetScan", mapping.name);
        assert_eq!("TargetScan_Hs_6.2", mapping.network_name());
        assert_eq!(Some(0), mapping.source.id_column);
        assert_eq!(Some(1), mapping.source.label_column);
        assert_eq!(Some("microRNA".to_string()), mapping.source.node_type);
        assert_eq!(
            vec![1, 4],
            mapping.source.attribute_columns.iter().copied().collect::<Vec<_>>()
        );
        assert_eq!(
            Some(PathBuf::from("mappings/mirbase.tsv")),
            mapping.source.mapping_file
        );
        assert_eq!(Some("Mb".to_string()), mapping.source.syscode_in);
        assert_eq!(vec!["Mbm".to_string(), "En".to_string()], mapping.source.syscodes_out);
        assert_eq!(Some(2), mapping.target.id_column);
        assert_eq!(None, mapping.target.label_column);
        assert_eq!(
            vec![5, 6],
            mapping.edge_columns.iter().copied().collect::<Vec<_>>()
        );
        assert_eq!(Some("represses".to_string()), mapping.interaction_type);
    }

    #[test]
    fn network_name_without_suffixes() {
        let mapping = ColumnMapping::parse("name=SimpleNet\n".as_bytes()).unwrap();
        assert_eq!("SimpleNet", mapping.network_name());
    }

    #[test]
    fn unknown_and_malformed_lines_are_skipped() {
        let config = "name=Net\nnot a pair\nunknown_key=1\n";
        let mapping = ColumnMapping::parse(config.as_bytes()).unwrap();
        assert_eq!("Net", mapping.name);
    }

    #[test]
    fn missing_name_is_a_configuration_error() {
        let result = ColumnMapping::parse("source_id_column=0\n".as_bytes());
        assert!(matches!(
            result,
            Err(ReginCoreError::MissingConfigKey("name"))
        ));
    }

    #[test]
    fn invalid_column_index_is_reported_with_key_and_value() {
        let result = ColumnMapping::parse("name=Net\nsource_id_column=abc\n".as_bytes());
        match result {
            Err(ReginCoreError::InvalidConfigValue { key, value, .. }) => {
                assert_eq!("source_id_column", key);
                assert_eq!("abc", value);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
