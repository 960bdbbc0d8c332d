use crate::errors::Result;
use crate::graph::{Edge, Graph, Node};
use crate::types::AttrValue;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::time::{SystemTime, UNIX_EPOCH};

const XGMML_NS: &str = "http://www.cs.rpi.edu/XGMML";

/// Score-like attributes that downstream visualization tooling expects
/// to be real-numbered, regardless of how the value was stored.
const FORCED_REAL_ATTRIBUTES: [&str; 3] = ["context+ score", "score", "pvalue"];

/// Serializes `graph` as an XGMML document to `output`.
pub fn export<W: std::io::Write>(graph: &Graph, output: W) -> Result<()> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    export_with_document_id(graph, &timestamp.to_string(), output)
}

fn export_with_document_id<W: std::io::Write>(
    graph: &Graph,
    document_id: &str,
    output: W,
) -> Result<()> {
    let mut writer = Writer::new_with_indent(output, b' ', 4);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut graph_start = BytesStart::new("graph");
    graph_start.push_attribute(("xmlns", XGMML_NS));
    graph_start.push_attribute(("id", document_id));
    graph_start.push_attribute(("label", graph.title()));
    writer.write_event(Event::Start(graph_start))?;

    for (name, value) in graph.attributes() {
        write_attribute(&mut writer, name, value)?;
    }
    for node in graph.nodes() {
        write_node(&mut writer, node)?;
    }
    for edge in graph.edges() {
        write_edge(&mut writer, edge)?;
    }

    writer.write_event(Event::End(BytesEnd::new("graph")))?;
    Ok(())
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &Node) -> Result<()> {
    let mut node_start = BytesStart::new("node");
    node_start.push_attribute(("id", node.id()));
    node_start.push_attribute(("label", node.id()));
    writer.write_event(Event::Start(node_start))?;

    for (name, value) in node.attributes() {
        write_attribute(writer, name, value)?;
    }

    writer.write_event(Event::End(BytesEnd::new("node")))?;
    Ok(())
}

fn write_edge<W: std::io::Write>(writer: &mut Writer<W>, edge: &Edge) -> Result<()> {
    let mut edge_start = BytesStart::new("edge");
    edge_start.push_attribute(("id", edge.id()));
    edge_start.push_attribute(("label", edge.id()));
    edge_start.push_attribute(("source", edge.source()));
    edge_start.push_attribute(("target", edge.target()));
    writer.write_event(Event::Start(edge_start))?;

    // The interaction type is always present as a plain string
    // attribute, even though the generic pass below repeats it.
    let interaction = edge
        .attribute("interaction")
        .and_then(|value| value.as_text())
        .unwrap_or("");
    let mut interaction_att = BytesStart::new("att");
    interaction_att.push_attribute(("label", "interaction"));
    interaction_att.push_attribute(("name", "interaction"));
    interaction_att.push_attribute(("value", interaction));
    interaction_att.push_attribute(("type", "string"));
    writer.write_event(Event::Empty(interaction_att))?;

    for (name, value) in edge.attributes() {
        write_attribute(writer, name, value)?;
    }

    writer.write_event(Event::End(BytesEnd::new("edge")))?;
    Ok(())
}

fn write_attribute<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &AttrValue,
) -> Result<()> {
    match value {
        AttrValue::List(items) => {
            let mut list_start = BytesStart::new("att");
            list_start.push_attribute(("type", "list"));
            list_start.push_attribute(("name", name));
            writer.write_event(Event::Start(list_start))?;
            for item in items {
                let mut item_att = BytesStart::new("att");
                item_att.push_attribute(("type", "string"));
                item_att.push_attribute(("name", name));
                item_att.push_attribute(("value", item.as_str()));
                writer.write_event(Event::Empty(item_att))?;
            }
            writer.write_event(Event::End(BytesEnd::new("att")))?;
        }
        AttrValue::Real(number) => {
            write_simple_attribute(writer, name, &number.to_string(), "real")?;
        }
        AttrValue::Text(text) => {
            let att_type = if FORCED_REAL_ATTRIBUTES.contains(&name) {
                "real"
            } else {
                "string"
            };
            write_simple_attribute(writer, name, text, att_type)?;
        }
    }
    Ok(())
}

fn write_simple_attribute<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
    att_type: &str,
) -> Result<()> {
    let mut att = BytesStart::new("att");
    att.push_attribute(("label", name));
    att.push_attribute(("name", name));
    att.push_attribute(("value", value));
    att.push_attribute(("type", att_type));
    writer.write_event(Event::Empty(att))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new("TestNet");
        graph.set_attribute("Source File", "input.txt");
        graph.set_attribute("RegIN Name", "TestNet");

        let mut mirna = Node::new("g1");
        mirna.set_attribute(
            "identifiers",
            vec!["g1".to_string(), "MIMAT0000076".to_string()],
        );
        mirna.set_attribute("biologicalType", "microRNA");
        mirna.set_attribute("label", "g1");
        graph.add_node(mirna);

        let mut gene = Node::new("g2");
        gene.set_attribute("identifiers", vec!["g2".to_string()]);
        gene.set_attribute("biologicalType", "gene");
        gene.set_attribute("label", "G2");
        graph.add_node(gene);

        let mut edge = Edge::new("0", "g1", "g2");
        edge.set_attribute("datasource", "TestNet");
        edge.set_attribute("interaction", "represses");
        edge.set_attribute("score", "0.9");
        graph.add_edge(edge);

        graph
    }

    #[test]
    fn export_matches_expected_document() {
        let graph = sample_graph();

        let mut xml_data: Vec<u8> = Vec::default();
        export_with_document_id(&graph, "1400000000000", &mut xml_data).unwrap();

        let expected = include_str!("output_example.xml");
        let actual = String::from_utf8(xml_data).unwrap();
        assert_eq!(expected, actual);
    }

    #[test]
    fn list_attributes_have_one_child_per_element() {
        let mut graph = Graph::new("net");
        let mut node = Node::new("n");
        node.set_attribute(
            "identifiers",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        );
        graph.add_node(node);

        let mut xml_data: Vec<u8> = Vec::default();
        export_with_document_id(&graph, "0", &mut xml_data).unwrap();
        let actual = String::from_utf8(xml_data).unwrap();

        assert_eq!(3, actual.matches("type=\"string\" name=\"identifiers\"").count());
        for value in ["a", "b", "c"] {
            assert!(actual.contains(&format!("name=\"identifiers\" value=\"{}\"", value)));
        }
        let order = (
            actual.find("value=\"a\""),
            actual.find("value=\"b\""),
            actual.find("value=\"c\""),
        );
        assert!(order.0 < order.1 && order.1 < order.2);
    }

    #[test]
    fn score_like_attributes_are_forced_to_real() {
        let mut writer = Writer::new(Vec::new());
        write_attribute(&mut writer, "pvalue", &AttrValue::Text("0.05".to_string())).unwrap();
        write_attribute(&mut writer, "comment", &AttrValue::Text("0.05".to_string())).unwrap();
        write_attribute(&mut writer, "weight", &AttrValue::Real(0.5)).unwrap();
        let actual = String::from_utf8(writer.into_inner()).unwrap();

        assert!(actual.contains(r#"<att label="pvalue" name="pvalue" value="0.05" type="real"/>"#));
        assert!(
            actual.contains(r#"<att label="comment" name="comment" value="0.05" type="string"/>"#)
        );
        assert!(actual.contains(r#"<att label="weight" name="weight" value="0.5" type="real"/>"#));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut graph = Graph::new("a<b");
        let mut node = Node::new("n");
        node.set_attribute("label", "x & y");
        graph.add_node(node);

        let mut xml_data: Vec<u8> = Vec::default();
        export_with_document_id(&graph, "0", &mut xml_data).unwrap();
        let actual = String::from_utf8(xml_data).unwrap();

        assert!(actual.contains(r#"label="a&lt;b""#));
        assert!(actual.contains(r#"value="x &amp; y""#));
    }
}
