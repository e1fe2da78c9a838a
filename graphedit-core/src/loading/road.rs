//! Road graph assembly from a validated site plan

use geo::{Distance, Euclidean, Point};
use log::info;
use petgraph::graph::{NodeIndex, UnGraph};

use super::config::{NodeLabel, SitePlan};
use crate::model::{AttrValue, ConnectionData, GraphModel, NodeData};

/// Road graph node
#[derive(Debug, Clone)]
pub struct RoadNode {
    /// Node coordinates
    pub position: Point<f64>,
    pub label: NodeLabel,
}

/// Road graph edge (road segment)
#[derive(Debug, Clone)]
pub struct RoadSegment {
    /// Euclidean segment length in plan units
    pub length: f64,
}

/// Undirected road network built once from the plan's node/edge arrays.
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    pub graph: UnGraph<RoadNode, RoadSegment>,
}

fn label_for(plan: &SitePlan, index: usize) -> NodeLabel {
    // nodes beyond the label array get the default label for new nodes
    plan.node_labels
        .get(index)
        .copied()
        .unwrap_or(NodeLabel::FreePoint)
}

impl RoadNetwork {
    /// Assembles the network from a plan.
    ///
    /// # Panics
    ///
    /// On a road edge referencing a node index out of range; like the label
    /// range check, that is a broken build-time artifact.
    #[must_use]
    pub fn from_plan(plan: &SitePlan) -> Self {
        let mut graph = UnGraph::with_capacity(plan.road_nodes.len(), plan.road_edges.len());

        let indices: Vec<NodeIndex> = plan
            .road_nodes
            .iter()
            .enumerate()
            .map(|(i, position)| {
                graph.add_node(RoadNode {
                    position: *position,
                    label: label_for(plan, i),
                })
            })
            .collect();

        for &(a, b) in &plan.road_edges {
            let (Some(&ia), Some(&ib)) = (indices.get(a), indices.get(b)) else {
                panic!("road edge ({a}, {b}) references a node index out of range");
            };
            let length = Euclidean.distance(plan.road_nodes[a], plan.road_nodes[b]);
            graph.add_edge(ia, ib, RoadSegment { length });
        }

        info!(
            "Built road network: {} nodes, {} segments",
            graph.node_count(),
            graph.edge_count()
        );
        Self { graph }
    }
}

/// Imports the plan's road graph into a fresh [`GraphModel`]: one node item
/// per road node carrying its label as an enum attribute, one fully linked
/// connection per road edge.
///
/// # Panics
///
/// On a road edge referencing a node index out of range.
#[must_use]
pub fn populate_model(plan: &SitePlan) -> GraphModel {
    let mut model = GraphModel::new();

    let node_ids: Vec<_> = plan
        .road_nodes
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let id = model.add_node(NodeData::at(*position));
            model.set_attribute(id, "label", AttrValue::Enum(label_for(plan, i).as_str().into()));
            id
        })
        .collect();

    for &(a, b) in &plan.road_edges {
        let (Some(&first), Some(&last)) = (node_ids.get(a), node_ids.get(b)) else {
            panic!("road edge ({a}, {b}) references a node index out of range");
        };
        let conn = model.add_connection(ConnectionData::default());
        model.set_first(conn, Some(first));
        model.set_last(conn, Some(last));
    }

    info!(
        "Imported road graph into the model: {} items",
        model.len()
    );
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::config::parse_site_plan;
    use crate::model::ConnectionData;

    fn triangle_plan() -> SitePlan {
        parse_site_plan(
            r#"{
                "nodes": [[0.0, 0.0], [3.0, 0.0], [3.0, 4.0]],
                "edges": [[0, 1], [1, 2]],
                "node_labels": [0, 4]
            }"#,
        )
    }

    #[test]
    fn network_carries_labels_and_lengths() {
        let network = RoadNetwork::from_plan(&triangle_plan());

        assert_eq!(network.graph.node_count(), 3);
        assert_eq!(network.graph.edge_count(), 2);

        let labels: Vec<NodeLabel> = network
            .graph
            .node_weights()
            .map(|n| n.label)
            .collect();
        assert_eq!(
            labels,
            [NodeLabel::Entrance, NodeLabel::Intersection, NodeLabel::FreePoint]
        );

        let lengths: Vec<f64> = network
            .graph
            .edge_weights()
            .map(|segment| segment.length)
            .collect();
        assert_eq!(lengths, [3.0, 4.0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn edge_index_out_of_range_is_fatal() {
        let plan = parse_site_plan(r#"{"nodes": [[0.0, 0.0]], "edges": [[0, 7]]}"#);
        let _ = RoadNetwork::from_plan(&plan);
    }

    #[test]
    fn populate_model_links_every_edge() {
        let model = populate_model(&triangle_plan());

        let nodes: Vec<_> = model
            .iter()
            .filter(|(_, item)| item.as_node().is_some())
            .map(|(id, _)| id)
            .collect();
        assert_eq!(nodes.len(), 3);
        assert_eq!(
            model.attribute(nodes[1], "label"),
            Some(AttrValue::Enum("Intersection".into()))
        );
        assert_eq!(
            model.attribute(nodes[2], "label"),
            Some(AttrValue::Enum("FreePoint".into()))
        );

        let connections: Vec<&ConnectionData> = model
            .iter()
            .filter_map(|(_, item)| item.as_connection())
            .collect();
        assert_eq!(connections.len(), 2);
        assert!(connections.iter().all(|c| c.is_valid()));
    }
}
