//! Integration tests for the tree structure, derived state and the scene root.

use std::cell::RefCell;
use std::rc::Rc;

use lumen_ui::{
    Animator, Color, ConfigError, DrawCommand, EventKind, EventPayload, Facet, HierarchyError,
    NodeId, Rect, Registry, Scene, UiConfig, UiError, Vec2,
};

fn sized(scene: &mut Scene, name: &str, rect: Rect) -> NodeId {
    let id = scene.create_node(name).unwrap();
    scene.tree_mut().node_mut(id).unwrap().rect = rect;
    id
}

#[test]
fn test_derived_alpha_composition() {
    let mut scene = Scene::new();
    let a = scene.create_node("a").unwrap();
    let b = scene.create_node("b").unwrap();
    let c = scene.create_node("c").unwrap();
    scene.tree_mut().attach(a, b).unwrap();
    scene.tree_mut().attach(b, c).unwrap();
    scene.tree_mut().node_mut(a).unwrap().set_alpha(128);
    scene.tree_mut().node_mut(b).unwrap().set_alpha(128);

    let tree = scene.tree();
    assert_eq!(tree.effective_alpha(a), Some(128));
    assert_eq!(tree.effective_alpha(b), Some(64));
    // 255 * 64 / 255
    assert_eq!(tree.effective_alpha(c), Some(64));

    scene.tree_mut().node_mut(c).unwrap().set_inherits_alpha(false);
    assert_eq!(scene.tree().effective_alpha(c), Some(255));
}

#[test]
fn test_z_order_tie_break() {
    let mut scene = Scene::new();
    let full = Rect::new(0.0, 0.0, 100.0, 100.0);
    let p = sized(&mut scene, "p", full);
    let x = sized(&mut scene, "x", full);
    let y = sized(&mut scene, "y", full);
    let z = sized(&mut scene, "z", full);
    for child in [x, y, z] {
        scene.tree_mut().attach(p, child).unwrap();
    }
    scene.add_root(p).unwrap();

    let point = Vec2::new(10.0, 10.0);
    assert_eq!(scene.hit_test(point), Some(z));
    scene.tree_mut().set_z_order(y, 1).unwrap();
    assert_eq!(scene.hit_test(point), Some(y));
}

#[test]
fn test_hit_test_skips_hidden_disabled_clickthrough_and_animators() {
    let mut scene = Scene::new();
    let full = Rect::new(0.0, 0.0, 100.0, 100.0);
    let p = sized(&mut scene, "p", full);
    let under = sized(&mut scene, "under", full);
    let over = sized(&mut scene, "over", full);
    scene.tree_mut().attach(p, under).unwrap();
    scene.tree_mut().attach(p, over).unwrap();
    let anim = scene
        .create_animator("spin", Animator::new(Facet::Angle))
        .unwrap();
    scene.tree_mut().attach(p, anim).unwrap();
    scene.add_root(p).unwrap();
    let point = Vec2::new(5.0, 5.0);

    assert_eq!(scene.hit_test(point), Some(over));
    scene.tree_mut().node_mut(over).unwrap().set_clickthrough(true);
    assert_eq!(scene.hit_test(point), Some(under));
    scene.tree_mut().node_mut(under).unwrap().set_enabled(false);
    assert_eq!(scene.hit_test(point), Some(p));
    scene.tree_mut().node_mut(p).unwrap().set_visible(false);
    assert_eq!(scene.hit_test(point), None);
}

#[test]
fn test_clickthrough_parent_still_yields_children() {
    let mut scene = Scene::new();
    let p = sized(&mut scene, "p", Rect::new(0.0, 0.0, 100.0, 100.0));
    let c = sized(&mut scene, "c", Rect::new(10.0, 10.0, 10.0, 10.0));
    scene.tree_mut().attach(p, c).unwrap();
    scene.tree_mut().node_mut(p).unwrap().set_clickthrough(true);
    scene.add_root(p).unwrap();

    assert_eq!(scene.hit_test(Vec2::new(15.0, 15.0)), Some(c));
    assert_eq!(scene.hit_test(Vec2::new(50.0, 50.0)), None);
}

#[test]
fn test_double_attach_is_rejected_atomically() {
    let mut scene = Scene::new();
    let p1 = scene.create_node("p1").unwrap();
    let p2 = scene.create_node("p2").unwrap();
    let a = scene.create_node("a").unwrap();
    scene.tree_mut().attach(p1, a).unwrap();

    let err = scene.tree_mut().attach(p2, a).unwrap_err();
    assert_eq!(
        err,
        UiError::Hierarchy(HierarchyError::AlreadyAttached {
            child: "a".into(),
            parent: "p1".into(),
        })
    );
    let tree = scene.tree();
    assert_eq!(tree.parent(a), Some(p1));
    assert_eq!(tree.children(p1), &[a]);
    assert!(tree.children(p2).is_empty());
}

#[test]
fn test_stale_ids_never_alias() {
    let mut scene = Scene::new();
    let p = scene.create_node("p").unwrap();
    let old = scene.create_node("old").unwrap();
    scene.destroy(old).unwrap();
    let fresh = scene.create_node("fresh").unwrap();
    assert_eq!(fresh.index(), old.index());
    assert_ne!(fresh, old);
    assert!(matches!(
        scene.tree_mut().attach(p, old),
        Err(UiError::Hierarchy(HierarchyError::StaleId(_)))
    ));
}

#[test]
fn test_unsupported_facet_names_the_facet() {
    let registry = Registry::default();
    let mut scene = Scene::new();
    let owner = scene.create_node("plain").unwrap();
    let anim = registry
        .spawn_animator(scene.tree_mut(), "FrameAnimation", "frames")
        .unwrap();
    let err = scene.tree_mut().attach(owner, anim).unwrap_err();
    assert!(err.to_string().contains("custom:frame"));
    assert!(matches!(err, UiError::Config(ConfigError::UnsupportedFacet { .. })));
}

#[test]
fn test_focus_events() {
    let mut scene = Scene::new();
    let a = scene.create_node("a").unwrap();
    let b = scene.create_node("b").unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    for id in [a, b] {
        for kind in [EventKind::GainFocus, EventKind::LoseFocus] {
            let log = Rc::clone(&log);
            scene
                .tree_mut()
                .subscribe(id, kind, move |_, event| {
                    log.borrow_mut()
                        .push((event.target, event.kind, event.payload.clone()));
                })
                .unwrap();
        }
    }

    scene.set_focus(Some(a)).unwrap();
    scene.set_focus(Some(b)).unwrap();
    scene.set_focus(Some(b)).unwrap();
    scene.set_focus(None).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            (a, EventKind::GainFocus, None),
            (a, EventKind::LoseFocus, Some(EventPayload::Node(b))),
            (b, EventKind::GainFocus, Some(EventPayload::Node(a))),
            (b, EventKind::LoseFocus, None),
        ]
    );
    assert_eq!(scene.focused(), None);
}

#[test]
fn test_destroying_focused_node_clears_focus() {
    let mut scene = Scene::new();
    let a = scene.create_node("a").unwrap();
    scene.set_focus(Some(a)).unwrap();
    scene.destroy(a).unwrap();
    assert_eq!(scene.focused(), None);
    assert!(scene.set_focus(Some(a)).is_err());
}

#[test]
fn test_callbacks() {
    let mut scene = Scene::new();
    let panel = scene.create_node("panel").unwrap();
    scene.register_callback("hide_panel", move |tree| {
        if let Some(node) = tree.node_mut(panel) {
            node.set_visible(false);
        }
    });
    assert!(scene.trigger_callback("hide_panel"));
    assert!(!scene.tree().node(panel).unwrap().is_visible());
    assert!(!scene.trigger_callback("missing"));
}

#[test]
fn test_mutation_during_update_is_safe() {
    let mut scene = Scene::new();
    let root = scene.create_node("root").unwrap();
    let trigger = scene
        .create_animator(
            "trigger",
            Animator::new(Facet::X).with_delay(0.05).with_periods(-1.0),
        )
        .unwrap();
    let moved = scene.create_node("moved").unwrap();
    let moved_anim = scene
        .create_animator("moved_anim", Animator::new(Facet::X).with_periods(-1.0))
        .unwrap();
    let doomed = scene.create_node("doomed").unwrap();
    let late = scene.create_node("late").unwrap();
    {
        let tree = scene.tree_mut();
        tree.attach(root, trigger).unwrap();
        tree.attach(root, moved).unwrap();
        tree.attach(moved, moved_anim).unwrap();
        tree.attach(root, doomed).unwrap();
        tree.subscribe(trigger, EventKind::OnDelayEnd, move |tree, _| {
            tree.detach(moved).unwrap();
            tree.destroy(doomed).unwrap();
            tree.attach(root, late).unwrap();
        })
        .unwrap();
    }
    scene.add_root(root).unwrap();

    scene.update(0.1);

    let tree = scene.tree();
    assert!(!tree.contains(doomed));
    assert_eq!(tree.parent(moved), None);
    assert_eq!(tree.children(root), &[trigger, late]);
    // `moved` left the tree before its turn, so its animator never ran.
    assert_eq!(tree.animator(moved_anim).unwrap().timer(), 0.0);
    assert_eq!(scene.find("doomed"), None);
}

#[test]
fn test_handler_may_destroy_its_own_node() {
    let mut scene = Scene::new();
    let root = scene.create_node("root").unwrap();
    let anim = scene
        .create_animator("once", Animator::new(Facet::X))
        .unwrap();
    scene.tree_mut().attach(root, anim).unwrap();
    scene
        .tree_mut()
        .subscribe(anim, EventKind::OnExpire, move |tree, event| {
            tree.destroy(event.target).unwrap();
        })
        .unwrap();
    scene.add_root(root).unwrap();

    scene.update(2.0);
    assert!(!scene.tree().contains(anim));
    assert!(scene.tree().children(root).is_empty());
    assert_eq!(scene.tree().events().count(anim, EventKind::OnExpire), 0);
}

#[test]
fn test_attach_and_detach_propagate_to_subtree() {
    let mut scene = Scene::new();
    let p = scene.create_node("p").unwrap();
    let a = scene.create_node("a").unwrap();
    let b = scene.create_node("b").unwrap();
    scene.tree_mut().attach(a, b).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in [EventKind::AttachedToParent, EventKind::DetachedFromParent] {
        let log = Rc::clone(&log);
        scene
            .tree_mut()
            .subscribe(b, kind, move |_, event| {
                log.borrow_mut().push((event.kind, event.source));
            })
            .unwrap();
    }
    scene.tree_mut().attach(p, a).unwrap();
    scene.tree_mut().detach(a).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            (EventKind::AttachedToParent, a),
            (EventKind::DetachedFromParent, a),
        ]
    );
}

#[test]
fn test_draw_order_and_alpha() {
    let mut scene = Scene::new();
    let root = sized(&mut scene, "root", Rect::new(0.0, 0.0, 100.0, 100.0));
    let top = sized(&mut scene, "top", Rect::new(10.0, 10.0, 10.0, 10.0));
    let bottom = sized(&mut scene, "bottom", Rect::new(20.0, 20.0, 10.0, 10.0));
    {
        let tree = scene.tree_mut();
        tree.attach(root, top).unwrap();
        tree.attach(root, bottom).unwrap();
        tree.set_z_order(top, 2).unwrap();
        tree.node_mut(root).unwrap().color = Color::rgba(255, 0, 0, 128);
    }
    scene.add_root(root).unwrap();

    let list = scene.draw();
    assert_eq!(list.nodes().collect::<Vec<_>>(), vec![root, bottom, top]);
    match &list.commands()[2] {
        DrawCommand::Quad { bounds, color, .. } => {
            assert_eq!(*bounds, Rect::new(10.0, 10.0, 10.0, 10.0));
            assert_eq!(color.a, 128);
        }
        other => panic!("unexpected command {other:?}"),
    }
    assert_eq!(list.vertices().len(), 18);
}

#[test]
fn test_roots_hit_in_z_order() {
    let mut scene = Scene::new();
    let full = Rect::new(0.0, 0.0, 50.0, 50.0);
    let first = sized(&mut scene, "first", full);
    let second = sized(&mut scene, "second", full);
    scene.add_root(first).unwrap();
    scene.add_root(second).unwrap();
    assert_eq!(scene.hit_test(Vec2::new(1.0, 1.0)), Some(second));
    scene.tree_mut().set_z_order(first, 5).unwrap();
    assert_eq!(scene.hit_test(Vec2::new(1.0, 1.0)), Some(first));
}

#[test]
fn test_scene_update_drives_all_roots() {
    let mut scene = Scene::new();
    let mut animated = Vec::new();
    for name in ["left", "right"] {
        let root = scene.create_node(name).unwrap();
        let anim = scene
            .create_animator(
                &format!("{name}_mover"),
                Animator::new(Facet::X).with_amplitude(4.0).with_periods(-1.0),
            )
            .unwrap();
        scene.tree_mut().attach(root, anim).unwrap();
        scene.add_root(root).unwrap();
        animated.push(root);
    }
    scene.update(0.5);
    for root in animated {
        assert_eq!(scene.tree().node(root).unwrap().rect.x, 2.0);
    }
}

#[test]
fn test_configure_strict_and_values() {
    let mut scene = Scene::new();
    let owner = scene.create_node("owner").unwrap();
    let anim = scene
        .create_animator("anim", Animator::new(Facet::X))
        .unwrap();
    scene.tree_mut().attach(owner, anim).unwrap();

    scene
        .configure(anim, [("function", "sine"), ("amp", "3"), ("delay", "0.5")])
        .unwrap();
    assert_eq!(scene.tree().get_property(anim, "amplitude").as_deref(), Some("3"));

    assert_eq!(
        scene.configure(owner, [("wobble", "1")]),
        Err(UiError::Config(ConfigError::UnknownProperty {
            node: "owner".into(),
            name: "wobble".into(),
        }))
    );
    assert_eq!(
        scene.configure(anim, [("function", "zigzag")]),
        Err(UiError::Config(ConfigError::UnknownWaveform("zigzag".into())))
    );
    assert!(matches!(
        scene.configure(owner, [("alpha", "lots")]),
        Err(UiError::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[test]
fn test_config_flows_from_toml() {
    let config = UiConfig::from_toml_str(
        r"
        acceleration_epsilon = 5.0

        [animator]
        speed = 2.0
        periods = -1.0
        ",
    )
    .unwrap();
    let registry = Registry::with_defaults(config.animator);
    let mut scene = Scene::with_config(config);
    let root = scene.create_node("root").unwrap();
    let anim = registry
        .spawn_animator(scene.tree_mut(), "MoverX", "mover")
        .unwrap();
    scene.tree_mut().set_property(anim, "acceleration", "2").unwrap();
    scene.tree_mut().attach(root, anim).unwrap();
    scene.add_root(root).unwrap();

    scene.update(1.0);
    let animator = scene.tree().animator(anim).unwrap();
    // Acceleration below the configured epsilon is ignored.
    assert_eq!(animator.speed(), 2.0);
    assert_eq!(scene.tree().node(root).unwrap().rect.x, 1.0);
}
