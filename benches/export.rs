//! Benchmarks for the export pipeline.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use folio::export::epub::inspect_epub;
use folio::export::{html_to_rtf, html_to_text};
use folio::{ExportOptions, ExportService, Project};

const SCENE_HTML: &str = "<h2>Night</h2><p>The wind came off the water in <em>long</em>, \
    patient gusts, and the lamp room hummed with it.<br>He counted the seconds between \
    flashes &amp; wrote them down.</p><blockquote>Forty-one.</blockquote>\
    <ul><li>oil</li><li>wick</li><li>glass</li></ul><p><strong>Café</strong> at dawn.</p>";

/// A novel-sized project: 30 chapters of 8 scenes.
fn sample_project() -> Project {
    let mut project = Project::new("Benchmark Novel", "Generated for benchmarks.");
    for c in 0..30 {
        let chapter = project.add_chapter(format!("Chapter {c}"));
        for s in 0..8 {
            let scene = project
                .add_scene(&chapter, format!("Scene {s}"))
                .unwrap();
            let html = SCENE_HTML.repeat(12);
            project.set_scene_content(&chapter, &scene, &html).unwrap();
        }
    }
    project
}

// ============================================================================
// Transform Benchmarks
// ============================================================================

fn bench_html_to_text(c: &mut Criterion) {
    let html = SCENE_HTML.repeat(100);
    c.bench_function("html_to_text", |b| b.iter(|| html_to_text(black_box(&html))));
}

fn bench_html_to_rtf(c: &mut Criterion) {
    let html = SCENE_HTML.repeat(100);
    c.bench_function("html_to_rtf", |b| b.iter(|| html_to_rtf(black_box(&html))));
}

// ============================================================================
// Export Benchmarks
// ============================================================================

fn bench_export(c: &mut Criterion) {
    let project = sample_project();
    let service = ExportService::new();

    for format in ["txt", "rtf", "epub"] {
        let options = ExportOptions::new(format).with_scene_titles(true);
        c.bench_function(&format!("export_{format}"), |b| {
            b.iter(|| service.export_content(&project, &options).unwrap());
        });
    }
}

fn bench_inspect_epub(c: &mut Criterion) {
    let project = sample_project();
    let bytes = ExportService::new()
        .export_content(&project, &ExportOptions::new("epub"))
        .unwrap()
        .into_bytes();

    c.bench_function("inspect_epub", |b| b.iter(|| inspect_epub(&bytes).unwrap()));
}

criterion_group!(
    benches,
    // Transforms
    bench_html_to_text,
    bench_html_to_rtf,
    // Export
    bench_export,
    bench_inspect_epub,
);
criterion_main!(benches);
