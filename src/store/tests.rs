use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::model::{BoxPatch, BoxSpec, ExportSettings, ProjectSpec, SplitRatios, YoloClass};

fn image_spec(name: &str) -> ImageSpec {
    ImageSpec {
        filename: name.to_string(),
        source: ImageSource::Embedded(vec![]),
        width: 100,
        height: 100,
    }
}

/// Store with one project, two classes, and two images; cursor on image 0.
fn store_with_project() -> AnnotationStore {
    let mut store = AnnotationStore::in_memory();
    store
        .create_project(
            ProjectSpec::new("test")
                .with_classes(vec![
                    YoloClass::new(0, "car", "#ff0000"),
                    YoloClass::new(1, "person", "#00ff00"),
                ])
                .with_export(ExportSettings::default()),
        )
        .unwrap();
    store.add_images(vec![image_spec("a.jpg"), image_spec("b.jpg")]);
    store
}

fn half_box(class_id: u32) -> BoxSpec {
    BoxSpec::new(0.25, 0.25, 0.5, 0.5, class_id)
}

#[test]
fn test_create_project_rejects_bad_ratios() {
    let mut store = AnnotationStore::in_memory();
    let spec = ProjectSpec::new("bad").with_export(ExportSettings {
        include_images: false,
        split: Some(SplitRatios::new(0.0, 0.0, 0.0)),
    });
    assert!(matches!(
        store.create_project(spec),
        Err(StoreError::InvalidSpec(_))
    ));
    assert!(store.current_project().is_none());
}

#[test]
fn test_create_project_rejects_duplicate_class_ids() {
    let mut store = AnnotationStore::in_memory();
    let spec = ProjectSpec::new("bad").with_classes(vec![
        YoloClass::new(0, "a", "#ff0000"),
        YoloClass::new(0, "b", "#00ff00"),
    ]);
    assert!(store.create_project(spec).is_err());
}

#[test]
fn test_create_box_requires_image() {
    let mut store = AnnotationStore::in_memory();
    assert!(store.create_bounding_box(half_box(0)).is_none());

    store.create_project(ProjectSpec::new("empty")).unwrap();
    // Project but no images: still a no-op.
    assert!(store.create_bounding_box(half_box(0)).is_none());
}

#[test]
fn test_create_update_delete_box() {
    let mut store = store_with_project();
    let id = store.create_bounding_box(half_box(0)).unwrap();

    let image = store.current_image().unwrap();
    assert_eq!(image.boxes.len(), 1);
    assert_eq!(image.boxes[0].class_name, "car");

    store.update_bounding_box(id, BoxPatch::geometry(0.1, 0.1, 0.3, 0.3));
    assert_eq!(store.current_image().unwrap().boxes[0].x, 0.1);

    store.delete_bounding_box(id);
    assert!(store.current_image().unwrap().boxes.is_empty());
}

#[test]
fn test_class_reassignment_refreshes_name_cache() {
    let mut store = store_with_project();
    let id = store.create_bounding_box(half_box(0)).unwrap();

    store.update_bounding_box(id, BoxPatch::class(1));
    let b = &store.current_image().unwrap().boxes[0];
    assert_eq!(b.class_id, 1);
    assert_eq!(b.class_name, "person");
}

#[test]
fn test_update_unknown_id_leaves_history_unchanged() {
    let mut store = store_with_project();
    store.create_bounding_box(half_box(0)).unwrap();
    let depth = store.history().undo_count();

    store.update_bounding_box(9999, BoxPatch::geometry(0.1, 0.1, 0.2, 0.2));
    assert_eq!(store.history().undo_count(), depth);
}

#[test]
fn test_undo_redo_inverse_law() {
    let mut store = store_with_project();
    let baseline = store.current_image().unwrap().boxes.clone();

    let id = store.create_bounding_box(half_box(0)).unwrap();
    store.update_bounding_box(id, BoxPatch::geometry(0.1, 0.1, 0.2, 0.2));
    let id2 = store.create_bounding_box(half_box(1)).unwrap();
    store.delete_bounding_box(id2);

    let final_state = store.current_image().unwrap().boxes.clone();

    for _ in 0..4 {
        store.undo();
    }
    assert_eq!(store.current_image().unwrap().boxes, baseline);

    for _ in 0..4 {
        store.redo();
    }
    assert_eq!(store.current_image().unwrap().boxes, final_state);
}

#[test]
fn test_new_action_after_undo_clears_redo() {
    let mut store = store_with_project();
    store.create_bounding_box(half_box(0)).unwrap();
    store.undo();
    assert!(store.can_redo());

    store.create_bounding_box(half_box(1)).unwrap();
    assert!(!store.can_redo());

    let count = store.current_image().unwrap().boxes.len();
    store.redo();
    assert_eq!(store.current_image().unwrap().boxes.len(), count);
}

#[test]
fn test_history_capped_at_50() {
    let mut store = store_with_project();
    let id = store.create_bounding_box(half_box(0)).unwrap();

    // 60 updates walking x from 0.0 upward; only the last 50 are undoable.
    for i in 0..60u32 {
        let x = i as f32 * 0.005;
        store.update_bounding_box(id, BoxPatch::geometry(x, 0.1, 0.2, 0.2));
    }
    assert_eq!(store.history().undo_count(), MAX_HISTORY);

    for _ in 0..100 {
        store.undo();
    }
    // The 50th-most-recent state, not the original creation geometry.
    let b = &store.current_image().unwrap().boxes[0];
    assert!((b.x - 9.0 * 0.005).abs() < 1e-6);
}

#[test]
fn test_delete_clears_selection() {
    let mut store = store_with_project();
    let id = store.create_bounding_box(half_box(0)).unwrap();
    store.select_bounding_box(Some(id));
    assert!(store.selected_box().is_some());

    store.delete_bounding_box(id);
    assert!(store.selected_box().is_none());
}

#[test]
fn test_undo_of_create_clears_selection() {
    let mut store = store_with_project();
    let id = store.create_bounding_box(half_box(0)).unwrap();
    store.select_bounding_box(Some(id));

    store.undo();
    assert!(store.selected_box().is_none());
}

#[test]
fn test_select_unknown_box_is_cleared() {
    let mut store = store_with_project();
    store.select_bounding_box(Some(12345));
    assert!(store.selected_box().is_none());
}

#[test]
fn test_navigation_clamps_without_wraparound() {
    let mut store = store_with_project();
    assert_eq!(store.current_image_index(), 0);

    store.previous_image();
    assert_eq!(store.current_image_index(), 0);

    store.select_image(99);
    assert_eq!(store.current_image_index(), 1);

    store.next_image();
    assert_eq!(store.current_image_index(), 1);
}

#[test]
fn test_navigation_clears_box_selection() {
    let mut store = store_with_project();
    let id = store.create_bounding_box(half_box(0)).unwrap();
    store.select_bounding_box(Some(id));

    store.select_image(1);
    assert!(store.selected_box().is_none());
}

#[test]
fn test_select_image_empty_list_is_noop() {
    let mut store = AnnotationStore::in_memory();
    store.create_project(ProjectSpec::new("empty")).unwrap();
    store.select_image(3);
    assert_eq!(store.current_image_index(), 0);
    assert!(store.current_image().is_none());
}

#[test]
fn test_delete_class_cascades_and_undoes() {
    let mut store = store_with_project();
    store.create_bounding_box(half_box(0)).unwrap();
    store.create_bounding_box(half_box(1)).unwrap();
    store.select_image(1);
    store.create_bounding_box(half_box(0)).unwrap();
    store.select_image(0);

    store.delete_class(0);

    let project = store.current_project().unwrap();
    assert_eq!(project.classes.len(), 1);
    assert_eq!(project.classes[0].id, 1);
    // Only the class-1 box survives on image 0, nothing on image 1.
    assert_eq!(project.images[0].boxes.len(), 1);
    assert_eq!(project.images[0].boxes[0].class_id, 1);
    assert!(project.images[1].boxes.is_empty());

    store.undo();
    let project = store.current_project().unwrap();
    assert_eq!(project.classes.len(), 2);
    assert_eq!(project.images[0].boxes.len(), 2);
    assert_eq!(project.images[1].boxes.len(), 1);
}

#[test]
fn test_class_rename_refreshes_box_caches() {
    let mut store = store_with_project();
    store.create_bounding_box(half_box(0)).unwrap();

    store.update_class(0, ClassPatch::rename("vehicle"));
    assert_eq!(store.current_image().unwrap().boxes[0].class_name, "vehicle");
}

#[test]
fn test_import_annotations_batch_replace_undo() {
    let mut store = store_with_project();
    store.create_bounding_box(half_box(0)).unwrap();
    let image_id = store.current_image().unwrap().id;
    let before = store.current_image().unwrap().boxes.clone();

    let imported = vec![
        BoundingBox::new(0, 0.1, 0.1, 0.2, 0.2, 0),
        BoundingBox::new(0, 0.5, 0.5, 0.3, 0.3, 1),
    ];
    store.import_annotations(image_id, imported);

    let boxes = &store.current_image().unwrap().boxes;
    assert_eq!(boxes.len(), 2);
    // Fresh ids, no collisions.
    assert_ne!(boxes[0].id, boxes[1].id);

    store.undo();
    assert_eq!(store.current_image().unwrap().boxes, before);
}

#[test]
fn test_persists_on_every_mutation() {
    let mut store = store_with_project();
    let project_id = store.current_project().unwrap().id;
    store.create_bounding_box(half_box(0)).unwrap();

    // A second store sharing no memory sees nothing; reloading through the
    // same store round-trips the snapshot.
    assert!(store.load_project(project_id).unwrap());
    let project = store.current_project().unwrap();
    assert_eq!(project.images[0].boxes.len(), 1);
    // Reload resets navigation and history.
    assert_eq!(store.current_image_index(), 0);
    assert!(!store.can_undo());
}

#[test]
fn test_load_unknown_project_is_noop() {
    let mut store = store_with_project();
    assert!(!store.load_project(9999).unwrap());
    assert!(store.current_project().is_some());
}

#[test]
fn test_delete_project_unloads_current() {
    let mut store = store_with_project();
    let id = store.current_project().unwrap().id;
    store.delete_project(id).unwrap();
    assert!(store.current_project().is_none());
    assert!(store.stored_projects().unwrap().is_empty());
}

#[test]
fn test_progress() {
    let mut store = store_with_project();
    assert_eq!(store.progress().percentage, 0);

    store.mark_image_completed(None);
    let progress = store.progress();
    assert_eq!(progress.completed, 1);
    assert_eq!(progress.total, 2);
    assert_eq!(progress.percentage, 50);
}

#[test]
fn test_observers_notified_after_commit() {
    let events: Rc<RefCell<Vec<StoreEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);

    let mut store = store_with_project();
    store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    let image_id = store.current_image().unwrap().id;
    store.create_bounding_box(half_box(0)).unwrap();

    assert_eq!(
        events.borrow().last(),
        Some(&StoreEvent::BoxesChanged { image_id })
    );
}
