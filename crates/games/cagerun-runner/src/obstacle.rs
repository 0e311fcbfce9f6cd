use serde::{Deserialize, Serialize};

use cagerun_core::geom::Rect;

use crate::EntityId;

/// Ground-lane obstacle silhouettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneProfile {
    /// The body lying across the lane.
    Body,
    /// Sits on the ground; jump over it.
    Low,
    /// Raised off the ground; slide under it.
    High,
}

impl LaneProfile {
    /// Width, height and lift above the ground line.
    fn dimensions(self) -> (f32, f32, f32) {
        match self {
            LaneProfile::Body => (150.0, 50.0, 0.0),
            LaneProfile::Low => (120.0, 100.0, 0.0),
            LaneProfile::High => (140.0, 110.0, 60.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Triangle,
    Square,
    Hexagon,
    /// Oversized rotating head, swapped in by head mode.
    Head,
}

impl Shape {
    pub const SPAWNABLE: [Shape; 3] = [Shape::Triangle, Shape::Square, Shape::Hexagon];

    /// Side of the square bounding box.
    fn extent(self) -> f32 {
        match self {
            Shape::Triangle => 120.0,
            Shape::Square | Shape::Hexagon => 140.0,
            Shape::Head => 120.0,
        }
    }

    /// Degrees per second.
    fn spin(self) -> f32 {
        match self {
            Shape::Head => 120.0,
            _ => 90.0,
        }
    }
}

/// Neon palette for geometric obstacles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeColor {
    Cyan,
    Magenta,
    Yellow,
    Green,
}

impl ShapeColor {
    pub const ALL: [ShapeColor; 4] = [
        ShapeColor::Cyan,
        ShapeColor::Magenta,
        ShapeColor::Yellow,
        ShapeColor::Green,
    ];

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            ShapeColor::Cyan => (0, 255, 255),
            ShapeColor::Magenta => (255, 0, 255),
            ShapeColor::Yellow => (255, 255, 0),
            ShapeColor::Green => (0, 255, 100),
        }
    }
}

/// Shootable floating shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometric {
    pub shape: Shape,
    pub color: ShapeColor,
    pub health: u8,
    /// Degrees, for drawing only.
    pub rotation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Lane(LaneProfile),
    Geometric(Geometric),
}

/// A scrolling hazard. Falling cages are a separate type with their own
/// state machine; see [`crate::cage::FallingCage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub kind: ObstacleKind,
    pub rect: Rect,
    pub speed: f32,
    /// Dodge bonus already paid out.
    pub scored: bool,
    pub alive: bool,
    despawn_x: f32,
}

impl Obstacle {
    /// A lane obstacle centered on `x` whose base sits `lift` above the ground.
    pub fn lane(id: EntityId, profile: LaneProfile, x: f32, ground_y: f32, speed: f32) -> Self {
        let (w, h, lift) = profile.dimensions();
        Self::with_rect(
            id,
            ObstacleKind::Lane(profile),
            Rect::from_midbottom(x, ground_y - lift, w, h),
            speed,
        )
    }

    /// A geometric obstacle centered on `x` with its bottom at `bottom`.
    pub fn geometric(
        id: EntityId,
        shape: Shape,
        color: ShapeColor,
        x: f32,
        bottom: f32,
        speed: f32,
    ) -> Self {
        let side = shape.extent();
        Self::with_rect(
            id,
            ObstacleKind::Geometric(Geometric {
                shape,
                color,
                health: 1,
                rotation: 0.0,
            }),
            Rect::from_midbottom(x, bottom, side, side),
            speed,
        )
    }

    fn with_rect(id: EntityId, kind: ObstacleKind, rect: Rect, speed: f32) -> Self {
        Self {
            id,
            kind,
            rect,
            speed,
            scored: false,
            alive: true,
            despawn_x: -50.0,
        }
    }

    pub fn with_despawn_margin(mut self, margin: f32) -> Self {
        self.despawn_x = -margin;
        self
    }

    pub fn hitbox(&self) -> Rect {
        match self.kind {
            ObstacleKind::Lane(LaneProfile::Body) => self.rect.inflate(-20.0, -10.0),
            ObstacleKind::Lane(_) => self.rect.inflate(-20.0, -15.0),
            ObstacleKind::Geometric(_) => self.rect.inflate(-10.0, -10.0),
        }
    }

    pub fn lane_profile(&self) -> Option<LaneProfile> {
        match self.kind {
            ObstacleKind::Lane(p) => Some(p),
            ObstacleKind::Geometric(_) => None,
        }
    }

    pub fn is_shootable(&self) -> bool {
        matches!(self.kind, ObstacleKind::Geometric(_))
    }

    /// Apply laser damage. Returns `true` when this destroyed the obstacle.
    /// Lane obstacles are immune.
    pub fn take_damage(&mut self, amount: u8) -> bool {
        let ObstacleKind::Geometric(geo) = &mut self.kind else {
            return false;
        };
        geo.health = geo.health.saturating_sub(amount);
        if geo.health == 0 {
            self.alive = false;
            return true;
        }
        false
    }

    /// Scroll left. Marks the obstacle dead once its right edge passes the
    /// despawn line.
    pub fn update(&mut self, dt: f32) {
        if !self.alive {
            return;
        }
        self.rect.x -= self.speed * dt;
        if let ObstacleKind::Geometric(geo) = &mut self.kind {
            geo.rotation = (geo.rotation + geo.shape.spin() * dt) % 360.0;
        }
        if self.rect.right() < self.despawn_x {
            self.alive = false;
        }
    }
}
