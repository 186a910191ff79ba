//! End-to-end statute editing tests
//!
//! Drives the public API the way an editor session does: build a statute,
//! submit a bulk save as JSON, then read the book view back.

#[cfg(test)]
mod statute_book_tests {
    use anyhow::Result;
    use serde_json::json;
    use statute_core::markup::nl2br;
    use statute_core::models::{NewAnnotation, NewNode, NewStatute, NodeKind, ParentRef};
    use statute_core::operations::{BulkSaveRequest, MoveRequest};
    use statute_core::{
        AnnotationService, DatabaseService, HierarchyService, Hierarchy, StatuteService,
    };
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Book {
        statutes: StatuteService,
        annotations: AnnotationService,
        hierarchy: HierarchyService,
        _temp_dir: TempDir,
    }

    async fn open_book() -> Result<Book> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("books").join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await?);

        Ok(Book {
            statutes: StatuteService::new(db.clone()),
            annotations: AnnotationService::new(db.clone()),
            hierarchy: HierarchyService::new(db),
            _temp_dir: temp_dir,
        })
    }

    #[tokio::test]
    async fn test_editor_session_round_trip() -> Result<()> {
        let book = open_book().await?;
        let statute = book
            .statutes
            .create(NewStatute::new("Companies Act").with_act_no("7 of 2007"))
            .await?;
        book.annotations
            .add(NewAnnotation::new(statute.id, "1").with_footnote("Inserted by Act 12 of 2010"))
            .await?;

        let request: BulkSaveRequest = serde_json::from_value(json!({
            "created": [
                {"temp_id": "p1", "level": "part", "number": "I", "name": "Preliminary"},
                {"temp_id": "p2", "level": "part", "number": "II", "name": "Incorporation"},
                {"temp_id": "c1", "level": "chapter", "number": "1", "name": "Definitions",
                 "parent_id": "p1"},
                {"temp_id": "s1", "level": "set", "name": "General", "parent_id": "c1"},
                {"temp_id": "sec1", "level": "section", "number": "1", "name": "Short title",
                 "parent_id": "s1"},
                {"temp_id": "sub1", "level": "subsection", "number": "(1)",
                 "content": "This Act may be cited as <fa a=1>the Companies Act</fa>.",
                 "parent_id": "sec1"},
                {"temp_id": "sch", "level": "sch_part", "name": "First Schedule"}
            ],
            "order": [
                {"id": "p2", "order_no": 1},
                {"id": "p1", "order_no": 2}
            ]
        }))?;

        let result = book.hierarchy.bulk_save(statute.id, &request).await?;
        assert_eq!(result.created, 7);

        let tree = book.hierarchy.load_tree(statute.id).await?;
        let parts: Vec<&str> = tree
            .roots(Hierarchy::Main)
            .iter()
            .filter_map(|p| p.node.name.as_deref())
            .collect();
        assert_eq!(parts, vec!["Incorporation", "Preliminary"]);
        assert_eq!(tree.roots(Hierarchy::Schedule).len(), 1);
        assert_eq!(tree.node_count(), 7);

        let view = book.hierarchy.book(statute.id).await?;
        let subsection = &view.parts[1].children[0].children[0].children[0].children[0];
        assert_eq!(subsection.kind, NodeKind::Subsection);
        assert!(subsection
            .content
            .as_deref()
            .unwrap_or_default()
            .contains(r#"<sup class="annotation-number">1</sup>[the Companies Act]"#));
        assert_eq!(view.footnotes.len(), 1);
        assert_eq!(view.footnotes[0].text, "Inserted by Act 12 of 2010");

        // The book serializes for the reader front end
        let json = serde_json::to_value(&view)?;
        assert_eq!(json["statute"]["name"], "Companies Act");
        assert!(json["scheduleParts"].is_array());
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_save_result_maps_temporary_ids() -> Result<()> {
        let book = open_book().await?;
        let statute = book.statutes.create(NewStatute::new("Mapping Act")).await?;

        let request: BulkSaveRequest = serde_json::from_value(json!({
            "created": [{"temp_id": "new-part", "level": "part", "name": "Only"}]
        }))?;
        let result = book.hierarchy.bulk_save(statute.id, &request).await?;

        let json = serde_json::to_value(&result)?;
        let id = json["idMap"]["new-part"].as_i64().unwrap_or_default();
        assert!(id > 0);
        assert_eq!(book.hierarchy.get_node(id).await?.order_no, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_sibling_groups_stay_dense_through_mixed_edits() -> Result<()> {
        let book = open_book().await?;
        let statute = book.statutes.create(NewStatute::new("Dense Act")).await?;

        let mut parts = Vec::new();
        for i in 0..6 {
            parts.push(
                book.hierarchy
                    .add_node(
                        NewNode::new(statute.id, NodeKind::Part, ParentRef::Statute(statute.id))
                            .with_name(format!("Part {}", i)),
                    )
                    .await?,
            );
        }

        book.hierarchy.delete_node(parts[1].id).await?;
        book.hierarchy
            .move_node(&MoveRequest {
                node_id: parts[5].id,
                kind: NodeKind::Part,
                new_parent: ParentRef::Statute(statute.id),
                new_index: 0,
            })
            .await?;
        book.hierarchy.delete_node(parts[3].id).await?;
        book.hierarchy
            .move_node(&MoveRequest {
                node_id: parts[0].id,
                kind: NodeKind::Part,
                new_parent: ParentRef::Statute(statute.id),
                new_index: 10,
            })
            .await?;

        let tree = book.hierarchy.load_tree(statute.id).await?;
        let names: Vec<(String, i64)> = tree
            .parts
            .iter()
            .map(|p| (p.node.name.clone().unwrap_or_default(), p.node.order_no))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Part 5".to_string(), 1),
                ("Part 2".to_string(), 2),
                ("Part 4".to_string(), 3),
                ("Part 0".to_string(), 4),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_book_rendering_is_stable() -> Result<()> {
        let book = open_book().await?;
        let statute = book
            .statutes
            .create(
                NewStatute::new("Stable Act")
                    .with_preface("<fa a=1>Whereas</fa> it is expedient\n<pa a=2>unclosed"),
            )
            .await?;
        book.annotations
            .add(NewAnnotation::new(statute.id, "1").with_footnote(r#"See "Gazette" & notes"#))
            .await?;

        let first = book.hierarchy.book(statute.id).await?;
        let second = book.hierarchy.book(statute.id).await?;
        assert_eq!(first, second);

        let preface = first.preface.unwrap_or_default();
        assert!(preface.contains(r#"title="See &quot;Gazette&quot; &amp; notes""#));
        assert!(preface.ends_with("&lt;pa a=2>unclosed"));
        assert!(nl2br(&preface).contains("<br>\n"));
        Ok(())
    }
}
