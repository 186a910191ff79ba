//! Benchmarks for citation rewriting and sibling reordering
//!
//! Run with: `cargo bench -p statute-core`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use statute_core::markup::{AnnotationTable, MarkupRewriter};
use statute_core::models::{NewNode, NewStatute, NodeKind, ParentRef};
use statute_core::operations::MoveRequest;
use statute_core::{DatabaseService, HierarchyService, StatuteService};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Section text with `citations` tags, a third of them nested
fn generate_cited_text(citations: usize) -> String {
    let mut text = String::new();
    for i in 0..citations {
        match i % 3 {
            0 => text.push_str(&format!(
                "The provisions of <fa a={}>this section</fa> apply. ",
                i % 50
            )),
            1 => text.push_str(&format!(
                "Subject to <pa a={} p={}>clause (b)</pa>, the Board shall act.\n",
                i % 50,
                i % 7
            )),
            _ => text.push_str(&format!(
                "<fa a={}>Amended <pa a={}>in part</pa> by a later Act</fa>. ",
                i % 50,
                (i + 1) % 50
            )),
        }
    }
    text
}

fn annotation_table() -> AnnotationTable {
    let mut table = AnnotationTable::default();
    for no in 0..50 {
        table.insert(&no.to_string(), None, format!("Footnote {}", no));
        for page in 0..7 {
            table.insert(
                &no.to_string(),
                Some(&page.to_string()),
                format!("Footnote {} on page {}", no, page),
            );
        }
    }
    table
}

/// Benchmark rewriting a long section with many citations
fn bench_rewrite(c: &mut Criterion) {
    let table = annotation_table();
    let rewriter = MarkupRewriter::new(&table);

    let mut group = c.benchmark_group("markup_rewrite");
    for citations in [10, 1000] {
        let text = generate_cited_text(citations);
        group.bench_function(format!("{}_citations", citations), |b| {
            b.iter(|| black_box(rewriter.rewrite(black_box(&text))))
        });
    }

    let plain = "No citations here. ".repeat(500);
    group.bench_function("plain_text", |b| {
        b.iter(|| black_box(rewriter.rewrite_text(black_box(&plain))))
    });
    group.finish();
}

/// Benchmark moving the last of 100 chapters to the front
fn bench_move_to_front(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("reorder");
    group.sample_size(10);

    group.bench_function("move_last_of_100_to_front", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let temp_dir = TempDir::new().unwrap();
                let db = Arc::new(
                    DatabaseService::new(temp_dir.path().join("bench.db"))
                        .await
                        .unwrap(),
                );
                let statute = StatuteService::new(db.clone())
                    .create(NewStatute::new("Bench Act"))
                    .await
                    .unwrap();
                let hierarchy = HierarchyService::new(db);

                let part = hierarchy
                    .add_node(
                        NewNode::new(statute.id, NodeKind::Part, ParentRef::Statute(statute.id))
                            .with_name("Part"),
                    )
                    .await
                    .unwrap();
                let mut last = None;
                for i in 0..100 {
                    let chapter = hierarchy
                        .add_node(
                            NewNode::new(statute.id, NodeKind::Chapter, ParentRef::Node(part.id))
                                .with_name(format!("Chapter {}", i)),
                        )
                        .await
                        .unwrap();
                    last = Some(chapter.id);
                }
                let last = last.unwrap();

                let start = std::time::Instant::now();
                for i in 0..iters {
                    hierarchy
                        .move_node(&MoveRequest {
                            node_id: last,
                            kind: NodeKind::Chapter,
                            new_parent: ParentRef::Node(part.id),
                            new_index: if i % 2 == 0 { 0 } else { 99 },
                        })
                        .await
                        .unwrap();
                }
                start.elapsed()
            })
        });
    });

    group.finish();
}

criterion_group!(benches, bench_rewrite, bench_move_to_front);
criterion_main!(benches);
