//! Benchmarks for full bootstrap and total recomputation.
//!
//! Run with: cargo bench -p formwire-behaviors --bench bootstrap_bench

use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use formwire_behaviors::default_registry;
use formwire_dom::Document;
use formwire_runtime::{ManualClock, Page, PageEnvironment, RuntimeConfig};

/// Form with `rows` conditional questions and one fine per row feeding a total.
fn generate_page(rows: usize) -> String {
    let mut html = String::from(r#"<form id="plea">"#);
    for i in 0..rows {
        html.push_str(&format!(
            r#"<label><input type="radio" name="q{i}" value="guilty">Guilty</label>
               <label><input type="radio" name="q{i}" value="not_guilty">Not guilty</label>
               <div data-conditional="q{i}" data-conditional-value="not_guilty">Why?</div>
               <input class="term" name="fine_{i}" value="{i}.25">"#
        ));
    }
    html.push_str(r#"<p class="js-CalculateTotals" id="total"></p></form>"#);
    html
}

fn new_page(html: &str) -> Option<Page> {
    let doc = Document::parse(html).ok()?;
    Some(Page::new(doc, PageEnvironment::new(), Rc::new(ManualClock::at_unix(0))))
}

fn bench_bootstrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("bootstrap/init_all");
    let config = RuntimeConfig::default();
    for rows in [10, 100] {
        let html = generate_page(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &html, |b, html| {
            b.iter(|| {
                let Some(mut page) = new_page(html) else {
                    return;
                };
                let mut registry = default_registry(&config);
                black_box(registry.init_all(&mut page).is_ok());
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("bootstrap/render");
    for rows in [10, 100] {
        let Some(mut page) = new_page(&generate_page(rows)) else {
            continue;
        };
        if default_registry(&RuntimeConfig::default())
            .init_all(&mut page)
            .is_err()
        {
            continue;
        }
        group.bench_function(BenchmarkId::from_parameter(rows), |b| {
            b.iter(|| black_box(page.render().is_ok()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_bootstrap, bench_render);
criterion_main!(benches);
