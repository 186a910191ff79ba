//! Sibling group renumbering
//!
//! A group is renumbered in two phases: every member is first parked at its
//! placeholder position (`PLACEHOLDER_OFFSET + id`), then members receive
//! `1..=N` in their planned order. No intermediate state ever holds two
//! members at the same position.

use crate::db::{DatabaseError, NodeStore};
use crate::models::Node;
use std::collections::HashMap;

/// Final member order of one group
///
/// Members are sorted by requested position, falling back to their current
/// `order_no`; ties are broken by current `order_no`, then id.
pub fn plan_order(members: &[&Node], requested: &HashMap<i64, i64>) -> Vec<i64> {
    let mut keyed: Vec<(i64, i64, i64)> = members
        .iter()
        .map(|node| {
            let position = requested.get(&node.id).copied().unwrap_or(node.order_no);
            (position, node.order_no, node.id)
        })
        .collect();
    keyed.sort_unstable();
    keyed.into_iter().map(|(_, _, id)| id).collect()
}

/// True when applying `plan` would not change any member's position
pub fn is_in_place(members: &[&Node], plan: &[i64]) -> bool {
    let current: HashMap<i64, i64> = members.iter().map(|n| (n.id, n.order_no)).collect();
    plan.iter()
        .zip(1i64..)
        .all(|(id, position)| current.get(id) == Some(&position))
}

/// Write `plan` as positions `1..=N`
pub async fn apply_order<S>(store: &S, plan: &[i64]) -> Result<(), DatabaseError>
where
    S: NodeStore + ?Sized,
{
    for id in plan {
        store.park_node(*id).await?;
    }
    for (id, position) in plan.iter().zip(1i64..) {
        store.set_order(*id, position).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeKind;
    use chrono::Utc;

    fn member(id: i64, order_no: i64) -> Node {
        Node {
            id,
            statute_id: 1,
            kind: NodeKind::Section,
            parent_id: Some(100),
            order_no,
            label_no: None,
            name: Some(format!("s{}", id)),
            content: None,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        }
    }

    #[test]
    fn test_plan_keeps_current_order_without_requests() {
        let nodes = [member(7, 2), member(3, 1), member(9, 3)];
        let members: Vec<&Node> = nodes.iter().collect();

        let plan = plan_order(&members, &HashMap::new());
        assert_eq!(plan, vec![3, 7, 9]);
        assert!(is_in_place(&members, &plan));
    }

    #[test]
    fn test_plan_follows_requested_positions() {
        let nodes = [member(1, 1), member(2, 2), member(3, 3)];
        let members: Vec<&Node> = nodes.iter().collect();
        let requested = HashMap::from([(3, 1), (1, 2), (2, 3)]);

        let plan = plan_order(&members, &requested);
        assert_eq!(plan, vec![3, 1, 2]);
        assert!(!is_in_place(&members, &plan));
    }

    #[test]
    fn test_plan_closes_gaps() {
        // Positions 2 and 5 after a delete and a late insert
        let nodes = [member(4, 2), member(8, 5)];
        let members: Vec<&Node> = nodes.iter().collect();

        let plan = plan_order(&members, &HashMap::new());
        assert_eq!(plan, vec![4, 8]);
        assert!(!is_in_place(&members, &plan), "gapped numbering must be rewritten");
    }

    #[test]
    fn test_plan_tie_breaks_by_current_position() {
        let nodes = [member(1, 1), member(2, 2), member(5, 3)];
        let members: Vec<&Node> = nodes.iter().collect();
        // Node 5 asks for position 1, which node 1 still holds
        let requested = HashMap::from([(5, 1)]);

        assert_eq!(plan_order(&members, &requested), vec![1, 5, 2]);
    }
}
