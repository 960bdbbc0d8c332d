use crate::config::{ColumnMapping, EndpointMapping};
use crate::errors::{ReginCoreError, Result};
use crate::graph::{Edge, Graph, Node};
use crate::resolver::{
    IdentifierResolver, NoOpResolver, TabularResolver, MATURE_ACCESSION_PREFIX,
    MIRBASE_MATURE_SYSCODE, MIRBASE_SYSCODE,
};
use crate::types::AttrValue;
use crate::util::remove_invalid_xml_chars;
use std::collections::{HashMap, HashSet};
use std::io::Read;

/// Counters reported at the end of a successful conversion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub edges: usize,
    pub source_nodes: usize,
    pub target_nodes: usize,
    pub unmapped_micro_rnas: usize,
}

#[derive(Clone, Copy, Debug)]
enum Side {
    Source,
    Target,
}

/// A fully built node together with the bookkeeping needed to register
/// it in the per-run identity map.
struct BuiltNode {
    node: Node,
    aliases: Vec<String>,
    unmapped_micro_rna: bool,
}

/// Per-run conversion context: consumes rows and a column mapping and
/// produces a populated [`Graph`].
///
/// All mutable state (identity map, edge-dedup index, counters) is
/// owned by the builder and discarded with it, so every run starts
/// fresh. `convert` consumes the builder; an aborted run drops the
/// partial graph along with it.
pub struct GraphBuilder {
    mapping: ColumnMapping,
    source_resolver: Box<dyn IdentifierResolver>,
    target_resolver: Box<dyn IdentifierResolver>,
    network_name: String,
    graph: Graph,
    header: Vec<String>,
    /// Every known alias of a node, mapped to its canonical identity.
    node_by_alias: HashMap<String, String>,
    /// Ordered (source identity, target identity) pairs that already
    /// produced an edge.
    connected: HashSet<(String, String)>,
    edge_count: usize,
    source_count: usize,
    target_count: usize,
    unmapped_micro_rnas: usize,
}

impl GraphBuilder {
    /// Creates a builder for one conversion run. Identifier mapping
    /// backends are opened per endpoint as configured; an unavailable
    /// backend disables resolution for that endpoint instead of
    /// failing the run.
    pub fn new(mapping: ColumnMapping, input_file_name: &str) -> GraphBuilder {
        let source_resolver = open_resolver(&mapping.source);
        let target_resolver = open_resolver(&mapping.target);
        GraphBuilder::with_resolvers(mapping, input_file_name, source_resolver, target_resolver)
    }

    pub fn with_resolvers(
        mapping: ColumnMapping,
        input_file_name: &str,
        source_resolver: Box<dyn IdentifierResolver>,
        target_resolver: Box<dyn IdentifierResolver>,
    ) -> GraphBuilder {
        let network_name = mapping.network_name();
        let mut graph = Graph::new(network_name.clone());
        graph.set_attribute("Source File", input_file_name);
        graph.set_attribute("RegIN Name", network_name.clone());
        GraphBuilder {
            mapping,
            source_resolver,
            target_resolver,
            network_name,
            graph,
            header: Vec::new(),
            node_by_alias: HashMap::new(),
            connected: HashSet::new(),
            edge_count: 0,
            source_count: 0,
            target_count: 0,
            unmapped_micro_rnas: 0,
        }
    }

    /// Runs the conversion over `input` and returns the populated graph.
    pub fn convert<R: Read>(self, input: R) -> Result<Graph> {
        let (graph, _) = self.convert_with_report(input)?;
        Ok(graph)
    }

    /// Like [`convert`](Self::convert), but also returns the run counters.
    pub fn convert_with_report<R: Read>(mut self, input: R) -> Result<(Graph, ConversionReport)> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .quote(0) // effectively disable quoting
            .flexible(true)
            .from_reader(input);
        let mut records = reader.records();

        let header = records.next().ok_or(ReginCoreError::MissingHeader)??;
        self.header = header
            .iter()
            .map(|field| remove_invalid_xml_chars(field).into_owned())
            .collect();

        // The header is line 1, the first data row line 2.
        for (index, record) in records.enumerate() {
            let record = record?;
            let line = index as u64 + 2;
            let row: Vec<String> = record
                .iter()
                .map(|field| remove_invalid_xml_chars(field).into_owned())
                .collect();

            // A row only contributes to the graph when both endpoints
            // are present, otherwise not even the present endpoint's
            // node is created.
            let source_present = endpoint_present(&self.mapping.source, &row, line)?;
            let target_present = endpoint_present(&self.mapping.target, &row, line)?;
            if source_present && target_present {
                let source = self.resolve_node(&row, Side::Source, line)?;
                let target = self.resolve_node(&row, Side::Target, line)?;
                self.add_edge_if_new(&source, &target, &row, line)?;
            } else {
                warn!(
                    "Error in line {}. Source = \"{}\". Target = \"{}\"",
                    line,
                    raw_endpoint(&self.mapping.source, &row),
                    raw_endpoint(&self.mapping.target, &row)
                );
            }
        }

        info!(
            "edges: {}\nsource nodes: {}\ntarget nodes: {}",
            self.edge_count, self.source_count, self.target_count
        );
        if self.unmapped_micro_rnas > 0 {
            info!(
                "{} microRNAs could not be mapped to a MIMAT accession number.",
                self.unmapped_micro_rnas
            );
        }

        let report = ConversionReport {
            edges: self.edge_count,
            source_nodes: self.source_count,
            target_nodes: self.target_count,
            unmapped_micro_rnas: self.unmapped_micro_rnas,
        };
        Ok((self.graph, report))
    }

    /// Resolves the endpoint of `row` on the given side to a node
    /// identity, creating and registering the node on first sight.
    /// Callers must have checked with [`endpoint_present`] that the
    /// identifier cell exists.
    fn resolve_node(&mut self, row: &[String], side: Side, line: u64) -> Result<String> {
        let endpoint = self.endpoint(side);
        let id_column = endpoint.id_column.unwrap_or_default();
        let raw = field(row, id_column, line)?;
        if let Some(existing) = self.node_by_alias.get(raw) {
            return Ok(existing.clone());
        }

        let built = self.build_node(raw, row, side, line)?;

        let canonical = raw.to_string();
        self.node_by_alias.insert(canonical.clone(), canonical.clone());
        for alias in &built.aliases {
            // first registration of an alias wins
            self.node_by_alias
                .entry(alias.clone())
                .or_insert_with(|| canonical.clone());
        }
        if built.unmapped_micro_rna {
            self.unmapped_micro_rnas += 1;
        }
        self.graph.add_node(built.node);
        match side {
            Side::Source => self.source_count += 1,
            Side::Target => self.target_count += 1,
        }
        Ok(canonical)
    }

    fn build_node(&self, raw: &str, row: &[String], side: Side, line: u64) -> Result<BuiltNode> {
        let endpoint = self.endpoint(side);
        let resolver = self.resolver(side);

        let mut aliases: Vec<String> = Vec::new();
        let mut unmapped_micro_rna = false;
        if resolver.available() {
            if let Some(syscode_in) = configured_syscode(endpoint) {
                if syscode_in == MIRBASE_SYSCODE {
                    unmapped_micro_rna = !has_mature_accession(resolver, raw);
                }
                match resolver.resolve(raw, syscode_in, &endpoint.syscodes_out) {
                    Ok(mapped) => {
                        aliases = mapped.into_iter().filter(|a| a != raw).collect();
                    }
                    Err(e) => {
                        warn!("line {}: could not resolve identifier \"{}\": {}", line, raw, e);
                    }
                }
            }
        }

        let mut identifiers = Vec::with_capacity(aliases.len() + 1);
        identifiers.push(raw.to_string());
        identifiers.extend(aliases.iter().cloned());

        let mut node = Node::new(raw);
        node.set_attribute("identifiers", identifiers);
        node.set_attribute(
            "biologicalType",
            endpoint.node_type.clone().unwrap_or_default(),
        );
        let label = match endpoint.label_column {
            Some(column) => field(row, column, line)?,
            None => raw,
        };
        node.set_attribute("label", label);
        for &column in &endpoint.attribute_columns {
            node.set_attribute(self.header_name(column)?, field(row, column, line)?);
        }

        Ok(BuiltNode {
            node,
            aliases,
            unmapped_micro_rna,
        })
    }

    /// Creates an edge for the resolved pair unless one exists already.
    /// Duplicate rows for the same ordered pair keep the first row's
    /// attributes and do not increment the edge counter.
    fn add_edge_if_new(
        &mut self,
        source: &str,
        target: &str,
        row: &[String],
        line: u64,
    ) -> Result<()> {
        let pair = (source.to_string(), target.to_string());
        if self.connected.contains(&pair) {
            return Ok(());
        }

        let mut edge = Edge::new(self.edge_count.to_string(), source, target);
        for &column in &self.mapping.edge_columns {
            edge.set_attribute(self.header_name(column)?, field(row, column, line)?);
        }
        edge.set_attribute("datasource", self.network_name.as_str());
        edge.set_attribute(
            "interaction",
            self.mapping.interaction_type.clone().unwrap_or_default(),
        );

        self.graph.add_edge(edge);
        self.connected.insert(pair);
        self.edge_count += 1;
        Ok(())
    }

    fn endpoint(&self, side: Side) -> &EndpointMapping {
        match side {
            Side::Source => &self.mapping.source,
            Side::Target => &self.mapping.target,
        }
    }

    fn resolver(&self, side: Side) -> &dyn IdentifierResolver {
        match side {
            Side::Source => self.source_resolver.as_ref(),
            Side::Target => self.target_resolver.as_ref(),
        }
    }

    fn header_name(&self, column: usize) -> Result<&str> {
        self.header
            .get(column)
            .map(|name| name.as_str())
            .ok_or(ReginCoreError::MissingHeaderColumn(column))
    }
}

fn open_resolver(endpoint: &EndpointMapping) -> Box<dyn IdentifierResolver> {
    match &endpoint.mapping_file {
        Some(path) => match TabularResolver::open(path) {
            Ok(resolver) => Box::new(resolver),
            Err(e) => {
                warn!(
                    "identifier mapping backend {} unavailable, resolution disabled: {}",
                    path.display(),
                    e
                );
                Box::new(NoOpResolver)
            }
        },
        None => Box::new(NoOpResolver),
    }
}

fn configured_syscode(endpoint: &EndpointMapping) -> Option<&str> {
    endpoint
        .syscode_in
        .as_deref()
        .filter(|code| !code.is_empty())
}

/// Checks whether a microRNA identifier maps to a miRBase mature
/// accession. Purely diagnostic, a lookup failure counts as unmapped.
fn has_mature_accession(resolver: &dyn IdentifierResolver, identifier: &str) -> bool {
    let mature = [MIRBASE_MATURE_SYSCODE.to_string()];
    match resolver.resolve(identifier, MIRBASE_SYSCODE, &mature) {
        Ok(mapped) => mapped
            .iter()
            .any(|id| id.starts_with(MATURE_ACCESSION_PREFIX)),
        Err(e) => {
            warn!(
                "could not check \"{}\" for a mature accession: {}",
                identifier, e
            );
            false
        }
    }
}

/// Returns whether the endpoint's identifier cell is present and
/// non-empty. A row that is too short to reach a configured identifier
/// column is a structural error.
fn endpoint_present(endpoint: &EndpointMapping, row: &[String], line: u64) -> Result<bool> {
    let Some(id_column) = endpoint.id_column else {
        return Ok(false);
    };
    Ok(!field(row, id_column, line)?.is_empty())
}

fn field<'a>(row: &'a [String], column: usize, line: u64) -> Result<&'a str> {
    row.get(column)
        .map(|value| value.as_str())
        .ok_or(ReginCoreError::MissingColumn { line, column })
}

fn raw_endpoint<'a>(endpoint: &EndpointMapping, row: &'a [String]) -> &'a str {
    endpoint
        .id_column
        .and_then(|column| row.get(column))
        .map(|value| value.as_str())
        .unwrap_or("")
}
