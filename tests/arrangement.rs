//! Orchestrator behavior against in-memory sources, sinks, and generators.

mod common;

use std::sync::Arc;

use common::{desktop_icons, fast_tuning, ExplodingSource, FakeSource, FixedShape, RecordingSink};
use deskshape::{
    AccessError, ArrangeError, ArrangeToken, Arranger, Bounds, LayoutError, PhallusShape, Point,
    ShapeRegistry,
};

fn registry_with_penis() -> Arc<ShapeRegistry> {
    let registry = Arc::new(ShapeRegistry::new());
    registry.register(Arc::new(PhallusShape)).expect("register");
    registry
}

fn arranger(
    source: Arc<FakeSource>,
    sink: Arc<RecordingSink>,
    registry: Arc<ShapeRegistry>,
) -> Arranger {
    Arranger::new(source, sink, registry, fast_tuning())
}

#[tokio::test]
async fn end_to_end_places_every_icon_within_bounds() {
    let bounds = Bounds::new(1920, 1080);
    let source = Arc::new(FakeSource::new(desktop_icons(3), bounds));
    let sink = Arc::new(RecordingSink::new());
    let arranger = arranger(source, Arc::<RecordingSink>::clone(&sink), registry_with_penis());

    let summary = arranger
        .arrange("penis", &ArrangeToken::new())
        .await
        .expect("arrange");

    assert_eq!(summary.icons_arranged, 3);
    assert_eq!(summary.shape, "penis");
    assert_eq!(summary.request_id.len(), 8);

    let applied = sink.last_applied().expect("sink invoked");
    assert_eq!(applied.len(), 3);
    assert!(applied.iter().all(|icon| bounds.contains(icon.position)));
    // Identity survives the merge: indices and labels, new positions only.
    for (i, icon) in applied.iter().enumerate() {
        assert_eq!(icon.index, i);
        assert_eq!(icon.text.as_deref(), Some(format!("icon-{i}").as_str()));
    }
}

#[tokio::test]
async fn shape_key_is_matched_case_insensitively() {
    let bounds = Bounds::new(1920, 1080);
    let source = Arc::new(FakeSource::new(desktop_icons(5), bounds));
    let sink = Arc::new(RecordingSink::new());
    let arranger = arranger(source, Arc::<RecordingSink>::clone(&sink), registry_with_penis());

    arranger
        .arrange("PENIS", &ArrangeToken::new())
        .await
        .expect("arrange");
    assert_eq!(sink.apply_count(), 1);
}

#[tokio::test]
async fn blank_shape_key_fails_before_any_io() {
    let source = Arc::new(FakeSource::new(desktop_icons(3), Bounds::new(1920, 1080)));
    let sink = Arc::new(RecordingSink::new());
    let arranger = arranger(Arc::clone(&source), Arc::<RecordingSink>::clone(&sink), registry_with_penis());

    let err = arranger
        .arrange("   ", &ArrangeToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ArrangeError::InvalidArgument(_)));
    assert_eq!(source.icon_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(sink.apply_count(), 0);
}

#[tokio::test]
async fn unknown_shape_reports_available_keys() {
    let source = Arc::new(FakeSource::new(desktop_icons(3), Bounds::new(1920, 1080)));
    let sink = Arc::new(RecordingSink::new());
    let arranger = arranger(source, Arc::<RecordingSink>::clone(&sink), registry_with_penis());

    let err = arranger
        .arrange("spiral", &ArrangeToken::new())
        .await
        .unwrap_err();

    match err {
        ArrangeError::ShapeNotFound { key, available } => {
            assert_eq!(key, "spiral");
            assert!(available.contains(&"penis".to_string()));
        }
        other => panic!("expected ShapeNotFound, got {other:?}"),
    }
    assert_eq!(sink.apply_count(), 0);
}

#[tokio::test]
async fn zero_icons_completes_without_touching_the_sink() {
    let source = Arc::new(FakeSource::new(Vec::new(), Bounds::new(1920, 1080)));
    let sink = Arc::new(RecordingSink::new());
    let arranger = arranger(source, Arc::<RecordingSink>::clone(&sink), registry_with_penis());

    let summary = arranger
        .arrange("penis", &ArrangeToken::new())
        .await
        .expect("arrange");

    assert_eq!(summary.icons_arranged, 0);
    assert_eq!(sink.apply_count(), 0);
}

#[tokio::test]
async fn layout_count_mismatch_is_rejected_before_apply() {
    let registry = Arc::new(ShapeRegistry::new());
    registry
        .register(Arc::new(FixedShape {
            shape_key: "short",
            points: vec![Point::new(10, 10); 5],
        }))
        .expect("register");

    let source = Arc::new(FakeSource::new(desktop_icons(10), Bounds::new(1920, 1080)));
    let sink = Arc::new(RecordingSink::new());
    let arranger = Arranger::new(source, Arc::<RecordingSink>::clone(&sink), registry, fast_tuning());

    let err = arranger
        .arrange("short", &ArrangeToken::new())
        .await
        .unwrap_err();

    match err {
        ArrangeError::Layout(LayoutError::CountMismatch { expected, actual }) => {
            assert_eq!(expected, 10);
            assert_eq!(actual, 5);
        }
        other => panic!("expected CountMismatch, got {other:?}"),
    }
    assert_eq!(sink.apply_count(), 0);
}

#[tokio::test]
async fn out_of_bounds_layout_point_is_rejected_before_apply() {
    let mut points = vec![Point::new(100, 100); 9];
    points.push(Point::new(3000, 3000));
    let registry = Arc::new(ShapeRegistry::new());
    registry
        .register(Arc::new(FixedShape {
            shape_key: "wild",
            points,
        }))
        .expect("register");

    let source = Arc::new(FakeSource::new(desktop_icons(10), Bounds::new(1920, 1080)));
    let sink = Arc::new(RecordingSink::new());
    let arranger = Arranger::new(source, Arc::<RecordingSink>::clone(&sink), registry, fast_tuning());

    let err = arranger
        .arrange("wild", &ArrangeToken::new())
        .await
        .unwrap_err();

    match &err {
        ArrangeError::Layout(LayoutError::OutOfBounds { outside, total, .. }) => {
            assert_eq!(*outside, 1);
            assert_eq!(*total, 10);
        }
        other => panic!("expected OutOfBounds, got {other:?}"),
    }
    assert!(err.to_string().contains("outside"));
    assert_eq!(sink.apply_count(), 0);
}

#[tokio::test]
async fn below_minimum_icon_count_becomes_a_layout_error() {
    let source = Arc::new(FakeSource::new(desktop_icons(2), Bounds::new(1920, 1080)));
    let sink = Arc::new(RecordingSink::new());
    let arranger = arranger(source, Arc::<RecordingSink>::clone(&sink), registry_with_penis());

    let err = arranger
        .arrange("penis", &ArrangeToken::new())
        .await
        .unwrap_err();

    match &err {
        ArrangeError::Layout(LayoutError::Generation(message)) => {
            assert!(message.contains("at least 3"));
        }
        other => panic!("expected Generation, got {other:?}"),
    }
    assert_eq!(sink.apply_count(), 0);
}

#[tokio::test]
async fn cancellation_before_any_io_reaches_neither_port() {
    let source = Arc::new(FakeSource::new(desktop_icons(3), Bounds::new(1920, 1080)));
    let sink = Arc::new(RecordingSink::new());
    let arranger = arranger(Arc::clone(&source), Arc::<RecordingSink>::clone(&sink), registry_with_penis());

    let token = ArrangeToken::new();
    token.cancel();
    let err = arranger.arrange("penis", &token).await.unwrap_err();

    assert!(matches!(err, ArrangeError::Cancelled));
    assert_eq!(source.icon_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(sink.apply_count(), 0);
}

#[tokio::test]
async fn unexpected_faults_are_wrapped_with_request_identity() {
    let sink = Arc::new(RecordingSink::new());
    let arranger = Arranger::new(
        Arc::new(ExplodingSource),
        Arc::<RecordingSink>::clone(&sink),
        registry_with_penis(),
        fast_tuning(),
    );

    let err = arranger
        .arrange("penis", &ArrangeToken::new())
        .await
        .unwrap_err();

    match err {
        ArrangeError::Internal {
            shape,
            request_id,
            source,
        } => {
            assert_eq!(shape, "penis");
            assert_eq!(request_id.len(), 8);
            assert!(source.to_string().contains("surface exploded"));
        }
        other => panic!("expected Internal, got {other:?}"),
    }
    assert_eq!(sink.apply_count(), 0);
}

#[tokio::test]
async fn access_errors_pass_through_unwrapped() {
    struct DeadSource;

    #[async_trait::async_trait]
    impl deskshape::ports::IconSource for DeadSource {
        async fn icons(
            &self,
            _token: &ArrangeToken,
        ) -> Result<Vec<deskshape::Icon>, ArrangeError> {
            Err(AccessError::SurfaceNotFound.into())
        }

        async fn bounds(&self, _token: &ArrangeToken) -> Result<Bounds, ArrangeError> {
            Ok(Bounds::new(1920, 1080))
        }
    }

    let sink = Arc::new(RecordingSink::new());
    let arranger = Arranger::new(
        Arc::new(DeadSource),
        Arc::<RecordingSink>::clone(&sink),
        registry_with_penis(),
        fast_tuning(),
    );

    let err = arranger
        .arrange("penis", &ArrangeToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ArrangeError::Access(AccessError::SurfaceNotFound)
    ));
    assert_eq!(sink.apply_count(), 0);
}
