use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wireframe_editor::{
    Component, ComponentKind, ComponentPayload, Document, HistoryStack, IdAllocator, Rect, Viewport,
};

fn populated_document(per_viewport: usize) -> Document {
    let mut document = Document::new(0);
    let mut ids = IdAllocator::new();
    for viewport in Viewport::ALL {
        let components = (0..per_viewport)
            .map(|i| {
                Component::new(
                    ids.allocate(),
                    Rect::new(10.0, i as f64 * 50.0, 200.0, 40.0),
                    ComponentPayload::default_for(ComponentKind::Text),
                )
            })
            .collect();
        document.replace_components(viewport, components).unwrap();
    }
    document
}

fn history_push(c: &mut Criterion) {
    let document = populated_document(200);

    c.bench_function("history_push_200_per_viewport", |b| {
        b.iter(|| {
            let mut history = HistoryStack::new(document.content());
            for _ in 0..150 {
                history.push(black_box(document.content()), "edit");
            }
            history
        })
    });
}

fn edit_then_snapshot(c: &mut Criterion) {
    let document = populated_document(200);

    c.bench_function("move_one_component_then_snapshot", |b| {
        b.iter(|| {
            let mut doc = document.clone();
            let mut list = doc.components(Viewport::Desktop).to_vec();
            list[0].rect.x += 10.0;
            doc.replace_components(Viewport::Desktop, list).unwrap();
            black_box(doc.content())
        })
    });
}

fn id_resync(c: &mut Criterion) {
    let document = populated_document(1_000);

    c.bench_function("resync_3000_ids", |b| {
        b.iter(|| {
            let mut ids = IdAllocator::new();
            ids.resync(black_box(&document));
            ids.peek()
        })
    });
}

criterion_group!(benches, history_push, edit_then_snapshot, id_resync);
criterion_main!(benches);
