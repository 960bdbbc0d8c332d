use crate::errors::{ReginCoreError, Result};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// System code for miRBase microRNA identifiers.
pub const MIRBASE_SYSCODE: &str = "Mb";
/// System code for miRBase mature accessions.
pub const MIRBASE_MATURE_SYSCODE: &str = "Mbm";
/// Prefix of a miRBase mature accession number.
pub const MATURE_ACCESSION_PREFIX: &str = "MIMAT";

/// Capability to map a raw identifier to equivalent identifiers in
/// other namespaces.
///
/// A conversion run never depends on a backend being present: the
/// no-op implementation is used for endpoints without a configured
/// mapping file, and a failed lookup is treated by the caller as "no
/// additional aliases found".
pub trait IdentifierResolver {
    /// Returns `true` when an actual mapping backend is attached.
    fn available(&self) -> bool;

    /// Maps `identifier` from the `syscode_in` namespace into all
    /// `syscodes_out` namespaces and returns the union of the results,
    /// excluding `identifier` itself.
    fn resolve(
        &self,
        identifier: &str,
        syscode_in: &str,
        syscodes_out: &[String],
    ) -> Result<BTreeSet<String>>;
}

/// Resolver used when no mapping backend is configured for an endpoint.
#[derive(Debug, Default)]
pub struct NoOpResolver;

impl IdentifierResolver for NoOpResolver {
    fn available(&self) -> bool {
        false
    }

    fn resolve(&self, _: &str, _: &str, _: &[String]) -> Result<BTreeSet<String>> {
        Ok(BTreeSet::new())
    }
}

/// In-memory resolver over a tab-delimited mapping dump.
///
/// Each line of the dump has four fields:
/// `syscode_in <TAB> identifier <TAB> syscode_out <TAB> mapped_identifier`.
pub struct TabularResolver {
    mappings: HashMap<(String, String), HashMap<String, BTreeSet<String>>>,
}

impl TabularResolver {
    pub fn open(path: &Path) -> Result<TabularResolver> {
        let file = File::open(path)?;
        TabularResolver::from_reader(file)
    }

    pub fn from_reader<R: Read>(input: R) -> Result<TabularResolver> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .quote(0) // effectively disable quoting
            .flexible(true)
            .from_reader(input);

        let mut mappings: HashMap<(String, String), HashMap<String, BTreeSet<String>>> =
            HashMap::new();
        for record in reader.records() {
            let record = record?;
            if record.len() != 4 {
                return Err(ReginCoreError::MalformedMappingRow {
                    line: record.position().map(|p| p.line()).unwrap_or_default(),
                    found: record.len(),
                });
            }
            let key = (record[0].to_string(), record[1].to_string());
            mappings
                .entry(key)
                .or_default()
                .entry(record[2].to_string())
                .or_default()
                .insert(record[3].to_string());
        }
        Ok(TabularResolver { mappings })
    }
}

impl IdentifierResolver for TabularResolver {
    fn available(&self) -> bool {
        true
    }

    fn resolve(
        &self,
        identifier: &str,
        syscode_in: &str,
        syscodes_out: &[String],
    ) -> Result<BTreeSet<String>> {
        let mut result = BTreeSet::new();
        let key = (syscode_in.to_string(), identifier.to_string());
        if let Some(by_syscode) = self.mappings.get(&key) {
            for syscode in syscodes_out {
                if let Some(mapped) = by_syscode.get(syscode) {
                    result.extend(mapped.iter().cloned());
                }
            }
        }
        result.remove(identifier);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const MAPPING_DUMP: &str = "Mb\thsa-miR-21-5p\tMbm\tMIMAT0000076\n\
Mb\thsa-miR-21-5p\tEn\tENSG00000199004\n\
Mb\thsa-miR-21-5p\tMb\thsa-miR-21-5p\n\
L\t5728\tEn\tENSG00000171862\n";

    fn syscodes(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn resolves_union_over_target_syscodes() {
        let resolver = TabularResolver::from_reader(MAPPING_DUMP.as_bytes()).unwrap();
        let result = resolver
            .resolve("hsa-miR-21-5p", "Mb", &syscodes(&["Mbm", "En"]))
            .unwrap();
        let expected: BTreeSet<String> = ["MIMAT0000076", "ENSG00000199004"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(expected, result);
    }

    #[test]
    fn identifier_itself_is_excluded() {
        let resolver = TabularResolver::from_reader(MAPPING_DUMP.as_bytes()).unwrap();
        let result = resolver
            .resolve("hsa-miR-21-5p", "Mb", &syscodes(&["Mb"]))
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn unknown_identifier_resolves_to_empty_set() {
        let resolver = TabularResolver::from_reader(MAPPING_DUMP.as_bytes()).unwrap();
        let result = resolver
            .resolve("hsa-miR-9999", "Mb", &syscodes(&["Mbm"]))
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn malformed_dump_line_is_an_error() {
        let result = TabularResolver::from_reader("Mb\tonly-three\tfields\n".as_bytes());
        assert!(matches!(
            result,
            Err(ReginCoreError::MalformedMappingRow { found: 3, .. })
        ));
    }

    #[test]
    fn open_reads_a_dump_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MAPPING_DUMP.as_bytes()).unwrap();
        let resolver = TabularResolver::open(file.path()).unwrap();
        assert!(resolver.available());
        let result = resolver.resolve("5728", "L", &syscodes(&["En"])).unwrap();
        assert_eq!(1, result.len());
        assert!(result.contains("ENSG00000171862"));
    }

    #[test]
    fn missing_backend_file_is_an_error() {
        assert!(TabularResolver::open(Path::new("/does/not/exist.tsv")).is_err());
    }

    #[test]
    fn noop_resolver_is_unavailable_and_empty() {
        let resolver = NoOpResolver;
        assert!(!resolver.available());
        let result = resolver.resolve("x", "Mb", &syscodes(&["Mbm"])).unwrap();
        assert!(result.is_empty());
    }
}
