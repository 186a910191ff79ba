//! Tests for statute and annotation CRUD

#[cfg(test)]
mod statute_service_tests {
    use crate::db::{ChangeAction, ChangeTable, DatabaseService};
    use crate::models::{
        AnnotationUpdate, NewAnnotation, NewNode, NewStatute, NodeKind, ParentRef, StatuteUpdate,
    };
    use crate::services::{AnnotationService, HierarchyService, ServiceError, StatuteService};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn create_test_services(
    ) -> (StatuteService, AnnotationService, Arc<DatabaseService>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());

        (
            StatuteService::new(db.clone()),
            AnnotationService::new(db.clone()),
            db,
            temp_dir,
        )
    }

    #[tokio::test]
    async fn test_create_and_get_statute() {
        let (statutes, _, _, _temp) = create_test_services().await;
        let date = NaiveDate::from_ymd_opt(1956, 3, 1).unwrap();

        let created = statutes
            .create(
                NewStatute::new("  Penal Code ")
                    .with_act_no("45 of 1860")
                    .with_date(date),
            )
            .await
            .unwrap();

        assert_eq!(created.name, "Penal Code");
        let fetched = statutes.get(created.id).await.unwrap();
        assert_eq!(fetched.act_no.as_deref(), Some("45 of 1860"));
        assert_eq!(fetched.date, Some(date));
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let (statutes, _, _, _temp) = create_test_services().await;
        statutes.create(NewStatute::new("Penal Code")).await.unwrap();

        let err = statutes
            .create(NewStatute::new("Penal Code"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateStatute { ref name } if name == "Penal Code"));

        let other = statutes.create(NewStatute::new("Evidence Act")).await.unwrap();
        let err = statutes
            .update(
                other.id,
                StatuteUpdate {
                    name: Some("Penal Code".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateStatute { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_act_numbers_rejected() {
        let (statutes, _, _, _temp) = create_test_services().await;
        statutes
            .create(NewStatute::new("First").with_act_no("1 of 2001"))
            .await
            .unwrap();

        let err = statutes
            .create(NewStatute::new("Second").with_act_no("1 of 2001"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateActNo { .. }));
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (statutes, _, _, _temp) = create_test_services().await;
        let err = statutes.create(NewStatute::new("   ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_update_clears_nullable_fields() {
        let (statutes, _, _, _temp) = create_test_services().await;
        let created = statutes
            .create(NewStatute::new("Contract Act").with_preface("Whereas"))
            .await
            .unwrap();

        let update: StatuteUpdate =
            serde_json::from_str(r#"{"preface": null, "actNo": "9 of 1872"}"#).unwrap();
        let updated = statutes.update(created.id, update).await.unwrap();

        assert_eq!(updated.preface, None);
        assert_eq!(updated.act_no.as_deref(), Some("9 of 1872"));
        assert!(statutes
            .update(404, StatuteUpdate::default())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_list_and_search() {
        let (statutes, _, _, _temp) = create_test_services().await;
        for (name, act_no) in [
            ("Penal Code", "45 of 1860"),
            ("Evidence Act", "1 of 1872"),
            ("Contract Act", "9 of 1872"),
        ] {
            statutes
                .create(NewStatute::new(name).with_act_no(act_no))
                .await
                .unwrap();
        }

        assert_eq!(statutes.list(None).await.unwrap().len(), 3);
        assert_eq!(statutes.list(Some("  ")).await.unwrap().len(), 3);

        let mut acts: Vec<String> = statutes
            .list(Some("act"))
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        acts.sort();
        assert_eq!(acts, vec!["Contract Act", "Evidence Act"]);

        let by_number = statutes.list(Some("1872")).await.unwrap();
        assert_eq!(by_number.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_statute_cascades() {
        let (statutes, annotations, db, _temp) = create_test_services().await;
        let hierarchy = HierarchyService::new(db.clone());
        let statute = statutes.create(NewStatute::new("Doomed Act")).await.unwrap();

        let part = hierarchy
            .add_node(
                NewNode::new(statute.id, NodeKind::Part, ParentRef::Statute(statute.id))
                    .with_name("Only part"),
            )
            .await
            .unwrap();
        let note = annotations
            .add(NewAnnotation::new(statute.id, "1").with_footnote("note"))
            .await
            .unwrap();

        assert!(statutes.delete(statute.id).await.unwrap().existed);
        assert!(hierarchy.get_node(part.id).await.unwrap_err().is_not_found());
        assert!(annotations.get(note.id).await.unwrap_err().is_not_found());
        assert!(!statutes.delete(statute.id).await.unwrap().existed);

        let log = db
            .session()
            .await
            .unwrap()
            .change_log(ChangeTable::Statute, statute.id)
            .await
            .unwrap();
        let actions: Vec<ChangeAction> = log.into_iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![ChangeAction::Insert, ChangeAction::Delete]);
    }

    #[tokio::test]
    async fn test_annotation_crud() {
        let (statutes, annotations, _, _temp) = create_test_services().await;
        let statute = statutes.create(NewStatute::new("Noted Act")).await.unwrap();

        let first = annotations
            .add(NewAnnotation::new(statute.id, "2").with_footnote("Substituted"))
            .await
            .unwrap();
        annotations
            .add(
                NewAnnotation::new(statute.id, "1")
                    .with_page("14")
                    .with_footnote("Omitted"),
            )
            .await
            .unwrap();

        let listed: Vec<String> = annotations
            .list(statute.id, None)
            .await
            .unwrap()
            .iter()
            .map(|a| a.key())
            .collect();
        assert_eq!(listed, vec!["1_14", "2"]);

        let found = annotations.list(statute.id, Some("subst")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, first.id);

        let edited = annotations
            .edit(
                first.id,
                AnnotationUpdate {
                    footnote: Some(Some("Substituted by Act 3".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.footnote.as_deref(), Some("Substituted by Act 3"));

        assert!(annotations.delete(first.id).await.unwrap().existed);
        assert!(annotations.get(first.id).await.unwrap_err().is_not_found());
        assert!(annotations
            .edit(first.id, AnnotationUpdate::default())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_annotation_requires_statute() {
        let (_, annotations, _, _temp) = create_test_services().await;
        let err = annotations
            .add(NewAnnotation::new(12, "1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_writes_roll_back_with_change_log_failure() {
        let (statutes, annotations, db, _temp) = create_test_services().await;
        let kept = statutes.create(NewStatute::new("Kept Act")).await.unwrap();
        let note = annotations
            .add(NewAnnotation::new(kept.id, "1").with_footnote("Original"))
            .await
            .unwrap();

        db.session()
            .await
            .unwrap()
            .connection()
            .execute(
                "CREATE TRIGGER fail_change_log BEFORE INSERT ON change_log
                 BEGIN SELECT RAISE(ABORT, 'forced failure'); END",
                (),
            )
            .await
            .unwrap();

        let err = statutes
            .create(NewStatute::new("Orphan Act"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DatabaseError(_)));
        let names: Vec<String> = statutes
            .list(None)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Kept Act"]);

        statutes
            .update(
                kept.id,
                StatuteUpdate {
                    name: Some("Renamed Act".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(statutes.get(kept.id).await.unwrap().name, "Kept Act");

        annotations
            .add(NewAnnotation::new(kept.id, "2"))
            .await
            .unwrap_err();
        annotations
            .edit(
                note.id,
                AnnotationUpdate {
                    footnote: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        annotations.delete(note.id).await.unwrap_err();
        let remaining = annotations.list(kept.id, None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].footnote.as_deref(), Some("Original"));

        statutes.delete(kept.id).await.unwrap_err();
        assert!(statutes.get(kept.id).await.is_ok());
    }
}
