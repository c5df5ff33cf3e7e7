//! Force-directed graph layout.
//!
//! A small Fruchterman-Reingold style simulation:
//! - Repulsive forces between all visible nodes (Coulomb's law)
//! - Spring forces along edges toward a rest length (Hooke's law)
//! - Velocity damping so the system settles
//!
//! Hidden nodes are frozen: they keep their position and exert no force, so
//! they come back where they were when the isolation filter is switched off.

use std::collections::HashMap;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use super::adapter::AdaptedGraph;
use crate::config::PhysicsConfig;

/// Golden angle in radians, for the initial spiral placement.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Distances below this are treated as this, to keep forces finite.
const MIN_DISTANCE: f64 = 1.0;

/// 2D vector for positions, velocities and forces.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (self - other).length()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }
}

#[derive(Debug, Clone)]
struct Body {
    position: Vec2,
    velocity: Vec2,
    force: Vec2,
    frozen: bool,
}

/// Force-directed layout over one adapted graph.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    bodies: Vec<Body>,
    springs: Vec<(usize, usize)>,
    config: PhysicsConfig,
    iterations: u32,
    stabilized: bool,
}

impl ForceLayout {
    /// Place every node of `graph` on a deterministic spiral.
    pub fn new(graph: &AdaptedGraph, config: PhysicsConfig) -> Self {
        let spacing = config.spring_length * 0.5;
        let mut ids = Vec::with_capacity(graph.nodes.len());
        let mut index = HashMap::with_capacity(graph.nodes.len());
        let mut bodies = Vec::with_capacity(graph.nodes.len());

        for (i, node) in graph.nodes.iter().enumerate() {
            let radius = spacing * ((i + 1) as f64).sqrt();
            let angle = i as f64 * GOLDEN_ANGLE;
            index.insert(node.id.clone(), i);
            ids.push(node.id.clone());
            bodies.push(Body {
                position: Vec2::new(radius * angle.cos(), radius * angle.sin()),
                velocity: Vec2::ZERO,
                force: Vec2::ZERO,
                frozen: node.hidden,
            });
        }

        let springs = graph
            .edges
            .iter()
            .filter_map(|e| Some((*index.get(&e.from)?, *index.get(&e.to)?)))
            .filter(|(a, b)| a != b)
            .collect();

        let stabilized = !config.enabled || bodies.iter().all(|b| b.frozen);

        Self {
            ids,
            index,
            bodies,
            springs,
            config,
            iterations: 0,
            stabilized,
        }
    }

    /// Advance the simulation one step. Returns true once stabilized.
    pub fn step(&mut self) -> bool {
        if self.stabilized {
            return true;
        }

        for body in &mut self.bodies {
            body.force = Vec2::ZERO;
        }
        self.apply_repulsion();
        self.apply_springs();

        let dt = self.config.time_step;
        let max_speed = self.config.spring_length;
        let mut fastest: f64 = 0.0;

        for body in self.bodies.iter_mut().filter(|b| !b.frozen) {
            let mut velocity = (body.velocity + body.force * dt) * self.config.damping;
            let speed = velocity.length();
            if speed > max_speed {
                velocity = velocity * (max_speed / speed);
            }
            body.velocity = velocity;
            body.position += velocity * dt;
            fastest = fastest.max(velocity.length());
        }

        self.iterations += 1;
        self.stabilized =
            fastest < self.config.min_velocity || self.iterations >= self.config.max_iterations;
        self.stabilized
    }

    /// Step until stabilized; returns the number of steps taken in total.
    pub fn run_until_stable(&mut self) -> u32 {
        while !self.step() {}
        self.iterations
    }

    fn apply_repulsion(&mut self) {
        let n = self.bodies.len();
        for i in 0..n {
            if self.bodies[i].frozen {
                continue;
            }
            for j in (i + 1)..n {
                if self.bodies[j].frozen {
                    continue;
                }
                let delta = self.bodies[i].position - self.bodies[j].position;
                let distance = delta.length();
                let direction = if distance > f64::EPSILON {
                    delta * (1.0 / distance)
                } else {
                    // Coincident nodes: push apart along a fixed axis.
                    Vec2::new(1.0, 0.0)
                };
                let distance = distance.max(MIN_DISTANCE);
                let force = direction * (self.config.repulsion / (distance * distance));
                self.bodies[i].force += force;
                self.bodies[j].force -= force;
            }
        }
    }

    fn apply_springs(&mut self) {
        for &(a, b) in &self.springs {
            if self.bodies[a].frozen || self.bodies[b].frozen {
                continue;
            }
            let delta = self.bodies[b].position - self.bodies[a].position;
            let distance = delta.length().max(MIN_DISTANCE);
            let stretch = distance - self.config.spring_length;
            let force = delta * (self.config.spring_strength * stretch / distance);
            self.bodies[a].force += force;
            self.bodies[b].force -= force;
        }
    }

    pub fn is_stabilized(&self) -> bool {
        self.stabilized
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.index.get(id).map(|&i| self.bodies[i].position)
    }

    /// Bounding box of the nodes that take part in the simulation.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut active = self.bodies.iter().filter(|b| !b.frozen).map(|b| b.position);
        let first = active.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in active {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    /// Closest non-frozen node to `point` within `radius`.
    pub fn nearest(&self, point: Vec2, radius: f64) -> Option<&str> {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.frozen)
            .map(|(i, b)| (i, b.position.distance(point)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| self.ids[i].as_str())
    }
}
