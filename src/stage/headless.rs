//! Headless stage: ballistic physics with circular hit regions
//!
//! Used by the tests and the demo runner. Sounds, effects and trail draws
//! are recorded instead of played.

use glam::Vec2;

use super::{Effect, Handle, LoopHandle, Stage};
use crate::audio::SoundEffect;
use crate::consts::{BOMB_RADIUS, ENTITY_RADIUS, GRAVITY};
use crate::sim::{EntityKind, Launch};

#[derive(Debug, Clone)]
struct Body {
    handle: Handle,
    kind: EntityKind,
    parent: Option<Handle>,
    pos: Vec2,
    vel: Vec2,
    angular_vel: f32,
    rotation: f32,
    radius: f32,
    attached: Vec<Effect>,
}

/// A stage with no renderer behind it
#[derive(Debug, Default)]
pub struct HeadlessStage {
    /// Bodies in creation order
    bodies: Vec<Body>,
    next_handle: u32,
    next_loop: u32,
    loops: Vec<(LoopHandle, SoundEffect)>,
    loops_started: usize,
    sounds: Vec<SoundEffect>,
    effects: Vec<(Effect, Vec2)>,
    trail: Vec<Vec2>,
    trail_faded: bool,
}

impl HeadlessStage {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            next_loop: 1,
            ..Default::default()
        }
    }

    fn body(&self, handle: Handle) -> Option<&Body> {
        self.bodies.iter().find(|b| b.handle == handle)
    }

    fn body_mut(&mut self, handle: Handle) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.handle == handle)
    }

    fn alloc(&mut self) -> Handle {
        let handle = Handle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Teleport a body (and its children)
    pub fn set_position(&mut self, handle: Handle, pos: Vec2) {
        for body in &mut self.bodies {
            if body.handle == handle || body.parent == Some(handle) {
                body.pos = pos;
            }
        }
    }

    /// Overwrite a body's velocity
    pub fn set_velocity(&mut self, handle: Handle, vel: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.vel = vel;
        }
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.body(handle).is_some()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn kind_of(&self, handle: Handle) -> Option<EntityKind> {
        self.body(handle).map(|b| b.kind)
    }

    pub fn rotation(&self, handle: Handle) -> Option<f32> {
        self.body(handle).map(|b| b.rotation)
    }

    pub fn attached_effects(&self, handle: Handle) -> &[Effect] {
        self.body(handle).map(|b| b.attached.as_slice()).unwrap_or(&[])
    }

    pub fn sounds(&self) -> &[SoundEffect] {
        &self.sounds
    }

    pub fn effects(&self) -> &[(Effect, Vec2)] {
        &self.effects
    }

    pub fn trail(&self) -> &[Vec2] {
        &self.trail
    }

    pub fn trail_faded(&self) -> bool {
        self.trail_faded
    }

    pub fn active_loops(&self) -> usize {
        self.loops.len()
    }

    pub fn loops_started(&self) -> usize {
        self.loops_started
    }
}

impl Stage for HeadlessStage {
    fn spawn(&mut self, kind: EntityKind, launch: &Launch) -> Handle {
        let handle = self.alloc();
        self.bodies.push(Body {
            handle,
            kind,
            parent: None,
            pos: launch.position,
            vel: launch.velocity,
            angular_vel: launch.angular_velocity,
            rotation: 0.0,
            radius: ENTITY_RADIUS,
            attached: Vec::new(),
        });
        handle
    }

    fn attach(&mut self, parent: Handle, kind: EntityKind) -> Handle {
        let handle = self.alloc();
        let pos = self.position(parent).unwrap_or(Vec2::ZERO);
        let radius = match kind {
            EntityKind::Bomb => BOMB_RADIUS,
            _ => ENTITY_RADIUS,
        };
        if let Some(body) = self.body_mut(parent) {
            body.attached.push(Effect::Fuse);
        }
        self.bodies.push(Body {
            handle,
            kind,
            parent: Some(parent),
            pos,
            vel: Vec2::ZERO,
            angular_vel: 0.0,
            rotation: 0.0,
            radius,
            attached: Vec::new(),
        });
        handle
    }

    fn position(&self, handle: Handle) -> Option<Vec2> {
        self.body(handle).map(|b| b.pos)
    }

    fn remove(&mut self, handle: Handle) {
        self.bodies
            .retain(|b| b.handle != handle && b.parent != Some(handle));
    }

    fn clear_actions(&mut self, handle: Handle) {
        if let Some(body) = self.body_mut(handle) {
            body.attached.clear();
        }
    }

    fn hit_test_point(&self, point: Vec2) -> Vec<Handle> {
        self.bodies
            .iter()
            .filter(|b| b.pos.distance(point) <= b.radius)
            .map(|b| b.handle)
            .collect()
    }

    fn step(&mut self, dt: f32, time_scale: f32) {
        let dt = dt * time_scale;
        if dt <= 0.0 {
            return;
        }

        // Roots first: ballistic motion, no body-body collisions
        for body in self.bodies.iter_mut().filter(|b| b.parent.is_none()) {
            body.vel.y += GRAVITY * dt;
            body.pos += body.vel * dt;
            body.rotation += body.angular_vel * dt;
        }

        // Children ride along with their parent
        let roots: Vec<(Handle, Vec2, f32)> = self
            .bodies
            .iter()
            .filter(|b| b.parent.is_none())
            .map(|b| (b.handle, b.pos, b.rotation))
            .collect();
        for body in self.bodies.iter_mut() {
            if let Some(parent) = body.parent {
                if let Some(&(_, pos, rotation)) = roots.iter().find(|(h, _, _)| *h == parent) {
                    body.pos = pos;
                    body.rotation = rotation;
                }
            }
        }
    }

    fn play_sound(&mut self, sound: SoundEffect) {
        self.sounds.push(sound);
    }

    fn start_loop(&mut self, sound: SoundEffect) -> LoopHandle {
        let handle = LoopHandle(self.next_loop);
        self.next_loop += 1;
        self.loops.push((handle, sound));
        self.loops_started += 1;
        handle
    }

    fn stop_loop(&mut self, handle: LoopHandle) {
        self.loops.retain(|(h, _)| *h != handle);
    }

    fn play_effect(&mut self, effect: Effect, at: Vec2) {
        self.effects.push((effect, at));
    }

    fn draw_trail(&mut self, points: &[Vec2]) {
        self.trail_faded = false;
        self.trail.clear();
        if points.len() >= 2 {
            self.trail.extend_from_slice(points);
        }
    }

    fn fade_trail(&mut self) {
        self.trail_faded = true;
    }
}
