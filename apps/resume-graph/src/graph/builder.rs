use anyhow::anyhow;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::{Graph, GraphEdge, GraphNode, Member};
use crate::scoring::PairScores;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphOptions {
    /// An edge exists iff the pair score is strictly greater than this.
    pub threshold: f64,
    /// Linear factor applied to the score to get the edge weight. The
    /// threshold always applies to the unscaled score.
    pub weight_scale: f64,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            weight_scale: 1.0,
        }
    }
}

/// Builds the graph from precomputed pair scores.
///
/// One node per member in input order. Pairs are visited in `(i, j)`
/// enumeration order, so edge order is deterministic.
pub fn build_graph(
    members: &[Member],
    scores: &PairScores,
    options: &GraphOptions,
) -> Result<Graph, AppError> {
    if scores.population() != members.len() {
        return Err(AppError::Internal(anyhow!(
            "pair scores cover {} members, population has {}",
            scores.population(),
            members.len()
        )));
    }

    let nodes: Vec<GraphNode> = members.iter().map(GraphNode::from).collect();

    let edges: Vec<GraphEdge> = PairScores::pairs(members.len())
        .filter_map(|(i, j)| {
            let score = scores.get(i, j)?;
            if score > options.threshold {
                debug!(from = %members[i].id, to = %members[j].id, score, "Edge kept");
                Some(GraphEdge {
                    from: members[i].id.clone(),
                    to: members[j].id.clone(),
                    weight: score * options.weight_scale,
                    label: Some(format!("{score:.2}")),
                })
            } else {
                None
            }
        })
        .collect();

    let graph = Graph { nodes, edges };
    info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        isolated = graph.isolated_count(),
        threshold = options.threshold,
        "Graph built"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn members(n: usize) -> Vec<Member> {
        (1..=n)
            .map(|i| Member {
                id: i.to_string(),
                display_name: format!("Member {i}"),
                image_reference: format!("https://img.example/{i}.png"),
                resume_reference: format!("resumes/{i}.pdf"),
            })
            .collect()
    }

    #[test]
    fn test_threshold_scenario() {
        let members = members(3);
        let scores = PairScores::from_values(3, vec![0.6, 0.3, 0.7]).unwrap();
        let options = GraphOptions {
            threshold: 0.5,
            weight_scale: 1.0,
        };

        let graph = build_graph(&members, &scores, &options).unwrap();
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(
            graph.edges,
            vec![
                GraphEdge {
                    from: "1".into(),
                    to: "2".into(),
                    weight: 0.6,
                    label: Some("0.60".into()),
                },
                GraphEdge {
                    from: "2".into(),
                    to: "3".into(),
                    weight: 0.7,
                    label: Some("0.70".into()),
                },
            ]
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        let members = members(2);
        let scores = PairScores::from_values(2, vec![0.5]).unwrap();
        let options = GraphOptions {
            threshold: 0.5,
            weight_scale: 1.0,
        };
        let graph = build_graph(&members, &scores, &options).unwrap();
        assert!(graph.edges.is_empty());
        assert_eq!(graph.isolated_count(), 2);
    }

    #[test]
    fn test_weight_scale_does_not_move_threshold() {
        let members = members(2);
        let scores = PairScores::from_values(2, vec![0.4]).unwrap();
        let options = GraphOptions {
            threshold: 0.3,
            weight_scale: 10.0,
        };
        let graph = build_graph(&members, &scores, &options).unwrap();
        assert_eq!(graph.edges.len(), 1);
        assert!((graph.edges[0].weight - 4.0).abs() < 1e-9);
        assert_eq!(graph.edges[0].label.as_deref(), Some("0.40"));
    }

    #[test]
    fn test_no_self_loops_or_duplicate_pairs() {
        let members = members(12);
        let scores = PairScores::from_fn(12, |_, _| 1.0);
        let graph = build_graph(&members, &scores, &GraphOptions::default()).unwrap();

        assert_eq!(graph.nodes.len(), 12);
        assert_eq!(graph.edges.len(), PairScores::pair_count(12));
        let mut seen = HashSet::new();
        for edge in &graph.edges {
            assert_ne!(edge.from, edge.to);
            let key = if edge.from < edge.to {
                (edge.from.clone(), edge.to.clone())
            } else {
                (edge.to.clone(), edge.from.clone())
            };
            assert!(seen.insert(key), "duplicate edge {edge:?}");
        }
    }

    #[test]
    fn test_nodes_keep_input_order_and_isolated_members() {
        let members = members(3);
        let scores = PairScores::from_fn(3, |_, _| 0.0);
        let graph = build_graph(&members, &scores, &GraphOptions::default()).unwrap();

        let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(graph.edges.is_empty());
        assert_eq!(graph.isolated_count(), 3);
    }

    #[test]
    fn test_population_mismatch_is_an_error() {
        let scores = PairScores::from_fn(2, |_, _| 1.0);
        assert!(build_graph(&members(3), &scores, &GraphOptions::default()).is_err());
    }

    #[test]
    fn test_empty_population() {
        let graph = build_graph(&[], &PairScores::from_fn(0, |_, _| 1.0), &GraphOptions::default())
            .unwrap();
        assert_eq!(graph, Graph::default());
    }
}
