use crate::geometry::{Rect, Vec2};
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// Role of a rectangle in the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    /// Kills any dot that enters it.
    Wall,
    /// Rewarding target region; never kills.
    Goal,
}

impl ObstacleKind {
    /// Draw colour used by renderers.
    pub fn color(self) -> &'static str {
        match self {
            ObstacleKind::Wall => "black",
            ObstacleKind::Goal => "red",
        }
    }

    pub fn is_lethal(self) -> bool {
        matches!(self, ObstacleKind::Wall)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub rect: Rect,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn wall(rect: Rect) -> Self {
        Self {
            rect,
            kind: ObstacleKind::Wall,
        }
    }

    pub fn goal(rect: Rect) -> Self {
        Self {
            rect,
            kind: ObstacleKind::Goal,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.rect.contains(point)
    }
}

/// Scoring view of the goal: its centre and the radius used for the
/// reached-goal test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub center: Vec2,
    pub radius: f64,
}

impl Goal {
    pub fn new(center: Vec2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Square goal rectangle of side `2 * radius` centred on the goal.
    pub fn rect(&self) -> Rect {
        let side = 2.0 * self.radius;
        Rect::new(
            self.center.x - self.radius,
            self.center.y - self.radius,
            side,
            side,
        )
    }
}

/// Point collision against everything that can kill a dot.
pub trait CollisionQuery {
    fn collides(&self, point: Vec2) -> bool;
}

impl CollisionQuery for [Obstacle] {
    fn collides(&self, point: Vec2) -> bool {
        self.iter().any(|o| o.kind.is_lethal() && o.contains(point))
    }
}

impl CollisionQuery for Vec<Obstacle> {
    fn collides(&self, point: Vec2) -> bool {
        self.as_slice().collides(point)
    }
}

/// Index entry pointing back into `ObstacleField::obstacles`.
#[derive(Clone, Debug)]
struct ObstacleEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for ObstacleEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Static obstacle set with exactly one goal, indexed for point queries.
#[derive(Clone, Debug)]
pub struct ObstacleField {
    goal: Goal,
    obstacles: Vec<Obstacle>,
    index: RTree<ObstacleEnvelope>,
}

impl ObstacleField {
    /// Build a field from walls plus the goal. The goal is appended as an
    /// [`ObstacleKind::Goal`] obstacle.
    pub fn new(goal: Goal, walls: Vec<Rect>) -> Self {
        let mut obstacles: Vec<Obstacle> = walls.into_iter().map(Obstacle::wall).collect();
        obstacles.push(Obstacle::goal(goal.rect()));
        let entries = obstacles
            .iter()
            .enumerate()
            .map(|(index, o)| ObstacleEnvelope {
                index,
                envelope: AABB::from_corners(
                    [o.rect.left(), o.rect.top()],
                    [o.rect.right(), o.rect.bottom()],
                ),
            })
            .collect();
        Self {
            goal,
            obstacles,
            index: RTree::bulk_load(entries),
        }
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn walls(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter().filter(|o| o.kind.is_lethal())
    }
}

impl CollisionQuery for ObstacleField {
    fn collides(&self, point: Vec2) -> bool {
        // Envelope lookup is closed on every edge; `contains` applies the
        // half-open rule.
        let query = AABB::from_point(point.to_array());
        self.index
            .locate_in_envelope_intersecting(&query)
            .any(|entry| {
                let obstacle = &self.obstacles[entry.index];
                obstacle.kind.is_lethal() && obstacle.contains(point)
            })
    }
}
