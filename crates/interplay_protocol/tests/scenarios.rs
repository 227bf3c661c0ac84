use interplay_protocol::Vec3;
use interplay_protocol::config::{FocusConfig, InteractableConfig};
use interplay_protocol::events::{InteractionEvent, InteractionEventKind};
use interplay_protocol::geometry::{Collider, SceneGeometry, ViewPoint};
use interplay_protocol::handle::{EntityRef, ObjectHandle};
use interplay_protocol::presentation::SharedPrompt;
use interplay_protocol::session::SessionOutcome;
use interplay_protocol::world::InteractionWorld;

const PLAYER: EntityRef = EntityRef(1);
const FRAME: f32 = 1.0 / 60.0;

struct Scene {
    world: InteractionWorld,
    geometry: SceneGeometry,
}

impl Scene {
    fn new() -> Self {
        let mut world = InteractionWorld::authoritative();
        world.add_controller(PLAYER, None, FocusConfig::default());
        Self {
            world,
            geometry: SceneGeometry::default(),
        }
    }

    /// A thin panel whose front face sits at `z`.
    fn panel(&mut self, z: f32, config: InteractableConfig) -> ObjectHandle {
        let object = self.world.spawn_object();
        self.geometry.insert(
            object,
            Collider::Aabb {
                min: Vec3::new(-0.5, -0.5, z - 0.1),
                max: Vec3::new(0.5, 0.5, z),
            },
        );
        self.world
            .attach_interactable(object, config, Box::new(SharedPrompt::default()));
        object
    }

    fn stand_at(&mut self, z: f32) {
        self.world.set_view(
            PLAYER,
            ViewPoint {
                eye: Vec3::new(0.0, 0.0, z),
                direction: Vec3::NEG_Z,
            },
        );
    }

    fn run(&mut self, seconds: f32) {
        let frames = (seconds / FRAME).round() as usize;
        for _ in 0..frames {
            self.world.step(FRAME, &self.geometry);
        }
    }

    fn events(&self) -> Vec<InteractionEvent> {
        self.world.drain_events()
    }
}

fn count(events: &[InteractionEvent], kind: InteractionEventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}

#[test]
fn walking_out_of_range_ends_focus() {
    let mut scene = Scene::new();
    let a = scene.panel(0.0, InteractableConfig::default().with_radius(2.0));

    scene.stand_at(1.0);
    scene.run(FRAME);
    let events = scene.events();
    assert_eq!(
        events,
        vec![InteractionEvent {
            kind: InteractionEventKind::FocusBegun,
            interactable: a,
            entity: PLAYER,
        }]
    );

    scene.stand_at(3.0);
    scene.run(FRAME);
    let events = scene.events();
    assert_eq!(count(&events, InteractionEventKind::FocusEnded), 1);
    assert_eq!(events[0].interactable, a);
    assert_eq!(
        scene.world.controller(PLAYER).unwrap().current_target(),
        None
    );
}

#[test]
fn early_release_of_a_hold_never_interacts() {
    let mut scene = Scene::new();
    let b = scene.panel(0.0, InteractableConfig::default().with_duration(3.0));
    scene.stand_at(1.0);
    scene.run(FRAME);

    assert_eq!(scene.world.begin_interact(PLAYER), SessionOutcome::Pending);
    scene.run(1.0);
    assert!(scene.world.is_interacting(PLAYER));
    scene.world.end_interact(PLAYER);
    scene.run(5.0);

    let events = scene.events();
    assert_eq!(count(&events, InteractionEventKind::Interacted), 0);
    assert_eq!(count(&events, InteractionEventKind::InteractEnded), 1);
    assert!(!scene.world.is_interacting(PLAYER));
    assert!(
        !scene
            .world
            .interactable(b)
            .unwrap()
            .interactors()
            .contains(&PLAYER)
    );
}

#[test]
fn full_hold_interacts_exactly_once() {
    let mut scene = Scene::new();
    scene.panel(0.0, InteractableConfig::default().with_duration(0.5));
    scene.stand_at(1.0);
    scene.run(FRAME);

    scene.world.begin_interact(PLAYER);
    scene.run(2.0);

    assert_eq!(count(&scene.events(), InteractionEventKind::Interacted), 1);
}

#[test]
fn instant_interaction_fires_inside_begin() {
    let mut scene = Scene::new();
    scene.panel(0.0, InteractableConfig::default());
    scene.stand_at(1.0);
    scene.run(FRAME);
    scene.events();

    assert_eq!(scene.world.begin_interact(PLAYER), SessionOutcome::Fired);
    let kinds: Vec<_> = scene.events().into_iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            InteractionEventKind::InteractBegun,
            InteractionEventKind::Interacted
        ]
    );
    assert!(!scene.world.is_interacting(PLAYER));
}

#[test]
fn only_the_nearer_of_two_props_is_focused() {
    let mut scene = Scene::new();
    let near = scene.panel(0.0, InteractableConfig::default().with_radius(5.0));
    let far = scene.panel(-1.0, InteractableConfig::default().with_radius(5.0));
    scene.stand_at(1.0);
    scene.run(0.5);

    let events = scene.events();
    assert_eq!(count(&events, InteractionEventKind::FocusBegun), 1);
    assert!(events.iter().all(|e| e.interactable == near));
    assert!(events.iter().all(|e| e.interactable != far));
}

#[test]
fn looking_away_mid_hold_cancels_it() {
    let mut scene = Scene::new();
    scene.panel(0.0, InteractableConfig::default().with_duration(1.0));
    scene.stand_at(1.0);
    scene.run(FRAME);
    scene.world.begin_interact(PLAYER);
    scene.run(0.5);

    scene.world.set_view(
        PLAYER,
        ViewPoint {
            eye: Vec3::new(0.0, 0.0, 1.0),
            direction: Vec3::Z,
        },
    );
    scene.run(2.0);

    let events = scene.events();
    assert_eq!(count(&events, InteractionEventKind::Interacted), 0);
    assert_eq!(count(&events, InteractionEventKind::FocusEnded), 1);
    assert_eq!(count(&events, InteractionEventKind::InteractEnded), 1);
    assert!(!scene.world.controller(PLAYER).unwrap().focus().interact_held);
}

#[test]
fn switching_targets_mid_hold_moves_focus_and_ends_the_old_interaction() {
    let mut scene = Scene::new();
    let left = scene.world.spawn_object();
    scene
        .geometry
        .insert(left, Collider::cube(Vec3::new(-1.0, 0.0, 0.0), 0.25));
    scene.world.attach_interactable(
        left,
        InteractableConfig::default().with_duration(2.0),
        Box::new(SharedPrompt::default()),
    );
    let right = scene.world.spawn_object();
    scene
        .geometry
        .insert(right, Collider::cube(Vec3::new(1.0, 0.0, 0.0), 0.25));
    scene.world.attach_interactable(
        right,
        InteractableConfig::default().with_duration(2.0),
        Box::new(SharedPrompt::default()),
    );

    scene.world.set_view(
        PLAYER,
        ViewPoint {
            eye: Vec3::ZERO,
            direction: Vec3::NEG_X,
        },
    );
    scene.run(FRAME);
    scene.world.begin_interact(PLAYER);
    scene.run(0.5);
    scene.events();

    scene.world.set_view(
        PLAYER,
        ViewPoint {
            eye: Vec3::ZERO,
            direction: Vec3::X,
        },
    );
    scene.run(FRAME);

    let events: Vec<_> = scene
        .events()
        .into_iter()
        .map(|e| (e.kind, e.interactable))
        .collect();
    assert_eq!(
        events,
        vec![
            (InteractionEventKind::InteractEnded, left),
            (InteractionEventKind::FocusEnded, left),
            (InteractionEventKind::FocusBegun, right),
        ]
    );
    assert!(!scene.world.is_interacting(PLAYER));
}

#[test]
fn zero_radius_panel_is_never_focused() {
    let mut scene = Scene::new();
    scene.panel(0.0, InteractableConfig::default().with_radius(0.0));

    for z in [1.0, 0.5, 0.05] {
        scene.stand_at(z);
        scene.run(0.5);
    }

    let events = scene.events();
    assert_eq!(count(&events, InteractionEventKind::FocusBegun), 0);
    assert_eq!(scene.world.controller(PLAYER).unwrap().current_target(), None);
    assert_eq!(scene.world.begin_interact(PLAYER), SessionOutcome::Ignored);
}
