// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Component payloads and the 2D math they share
//!
//! Components are plain data. A [`Visual`] or [`AnimationController`] only
//! remembers the last transform pushed to it; drawing is the render
//! surface's job. A [`PhysicsBody`] only describes a body and remembers the
//! id the simulation gave it; stepping is the simulation's job.

use crate::physics::{BodyDesc, BodyId};
use crate::render::VisualHandle;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

/// 2D vector with double-precision components
///
/// # Examples
///
/// ```
/// use scene_sync::ecs::components::Vector2;
///
/// let v = Vector2::new(3.0, 4.0) - Vector2::new(0.0, 0.0);
/// assert_eq!(v.length_squared(), 25.0);
/// assert_eq!(v * 2.0, Vector2::new(6.0, 8.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    /// Horizontal component
    pub x: f64,
    /// Vertical component, growing downwards
    pub y: f64,
}

impl Vector2 {
    /// Create a vector
    pub fn new(x: f64, y: f64) -> Self {
        Vector2 { x, y }
    }

    /// The zero vector
    pub fn zero() -> Self {
        Vector2::new(0.0, 0.0)
    }

    /// Squared length
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Length
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Check that both components are finite
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;

    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}

/// Width and height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Size {
    /// Create a size
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Size::new(100.0, 100.0)
    }
}

/// Placement of a visual on the render surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
    /// Rotation in radians
    pub rotation: f64,
    /// Horizontal scale
    pub scale_x: f64,
    /// Vertical scale
    pub scale_y: f64,
}

impl Default for Transform2D {
    fn default() -> Self {
        Transform2D {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Which pointer interaction occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// Press and release over the visual
    Click,
    /// Pointer entered the visual
    Hover,
    /// Pointer moved over the visual
    Move,
    /// Pointer left the visual
    Out,
}

/// A pointer interaction delivered to a visual
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Interaction kind
    pub kind: PointerEventKind,
    /// Pointer position in surface coordinates
    pub position: Vector2,
}

impl PointerEvent {
    /// Create an event at `(x, y)`
    pub fn new(kind: PointerEventKind, x: f64, y: f64) -> Self {
        PointerEvent {
            kind,
            position: Vector2::new(x, y),
        }
    }
}

/// Callback invoked for a pointer interaction
pub type PointerCallback = Arc<dyn Fn(&PointerEvent) + Send + Sync>;

/// Pointer callbacks attached to a visual at construction
#[derive(Clone, Default)]
pub struct PointerHandlers {
    click: Option<PointerCallback>,
    hover: Option<PointerCallback>,
    moved: Option<PointerCallback>,
    out: Option<PointerCallback>,
}

impl PointerHandlers {
    /// No callbacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the callback for one kind, replacing any previous one
    pub fn set(&mut self, kind: PointerEventKind, callback: PointerCallback) {
        *self.slot_mut(kind) = Some(callback);
    }

    /// Builder form of [`set`](Self::set)
    pub fn on<F>(mut self, kind: PointerEventKind, callback: F) -> Self
    where
        F: Fn(&PointerEvent) + Send + Sync + 'static,
    {
        self.set(kind, Arc::new(callback));
        self
    }

    /// Whether a callback is set for `kind`
    pub fn handles(&self, kind: PointerEventKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Check if no callback is set
    pub fn is_empty(&self) -> bool {
        self.click.is_none() && self.hover.is_none() && self.moved.is_none() && self.out.is_none()
    }

    /// Invoke the callback for the event's kind; returns false if none is set
    pub fn dispatch(&self, event: &PointerEvent) -> bool {
        match self.slot(event.kind) {
            Some(callback) => {
                callback(event);
                true
            }
            None => false,
        }
    }

    fn slot(&self, kind: PointerEventKind) -> &Option<PointerCallback> {
        match kind {
            PointerEventKind::Click => &self.click,
            PointerEventKind::Hover => &self.hover,
            PointerEventKind::Move => &self.moved,
            PointerEventKind::Out => &self.out,
        }
    }

    fn slot_mut(&mut self, kind: PointerEventKind) -> &mut Option<PointerCallback> {
        match kind {
            PointerEventKind::Click => &mut self.click,
            PointerEventKind::Hover => &mut self.hover,
            PointerEventKind::Move => &mut self.moved,
            PointerEventKind::Out => &mut self.out,
        }
    }
}

impl fmt::Debug for PointerHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerHandlers")
            .field("click", &self.click.is_some())
            .field("hover", &self.hover.is_some())
            .field("move", &self.moved.is_some())
            .field("out", &self.out.is_some())
            .finish()
    }
}

/// Primitive drawn by a graphic visual
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphicShape {
    /// Rectangle of the given size, centred on the transform
    Rectangle(Size),
    /// Circle of the given radius
    Circle(f64),
}

/// Outline drawn around a graphic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    /// Line width in pixels
    pub width: u32,
    /// RGB colour
    pub color: u32,
}

/// What a visual displays
#[derive(Debug, Clone, PartialEq)]
pub enum VisualKind {
    /// A textured sprite
    Sprite {
        /// Resource name of the texture
        texture: String,
        /// Displayed size
        size: Size,
    },
    /// A filled primitive
    Graphic {
        /// Primitive
        shape: GraphicShape,
        /// RGB fill colour
        fill: u32,
        /// Optional outline
        stroke: Option<Stroke>,
    },
}

/// Something drawn on the render surface
#[derive(Debug, Clone)]
pub struct Visual {
    handle: VisualHandle,
    kind: VisualKind,
    pointer: PointerHandlers,
    transform: Transform2D,
}

impl Visual {
    /// Create a visual with a fresh handle
    pub fn new(kind: VisualKind) -> Self {
        Visual {
            handle: VisualHandle::next(),
            kind,
            pointer: PointerHandlers::default(),
            transform: Transform2D::default(),
        }
    }

    /// A sprite showing `texture` at `size`
    pub fn sprite(texture: impl Into<String>, size: Size) -> Self {
        Visual::new(VisualKind::Sprite {
            texture: texture.into(),
            size,
        })
    }

    /// A filled primitive without outline
    pub fn graphic(shape: GraphicShape, fill: u32) -> Self {
        Visual::new(VisualKind::Graphic {
            shape,
            fill,
            stroke: None,
        })
    }

    /// Attach pointer callbacks
    pub fn with_pointer(mut self, pointer: PointerHandlers) -> Self {
        self.pointer = pointer;
        self
    }

    /// Add an outline; ignored for sprites
    pub fn with_stroke(mut self, new_stroke: Stroke) -> Self {
        if let VisualKind::Graphic { stroke, .. } = &mut self.kind {
            *stroke = Some(new_stroke);
        }
        self
    }

    /// Handle the render surface knows this visual by
    pub fn handle(&self) -> VisualHandle {
        self.handle
    }

    /// What is displayed
    pub fn kind(&self) -> &VisualKind {
        &self.kind
    }

    /// Pointer callbacks
    pub fn pointer(&self) -> &PointerHandlers {
        &self.pointer
    }

    /// Last transform pushed to the visual
    pub fn transform(&self) -> Transform2D {
        self.transform
    }

    /// Record a new transform
    pub fn set_transform(&mut self, transform: Transform2D) {
        self.transform = transform;
    }
}

/// Simulated body description plus the id it was registered under
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsBody {
    desc: BodyDesc,
    body: Option<BodyId>,
}

impl PhysicsBody {
    /// A body not yet registered with the bridge
    pub fn new(desc: BodyDesc) -> Self {
        PhysicsBody { desc, body: None }
    }

    /// Shape and initial state
    pub fn desc(&self) -> &BodyDesc {
        &self.desc
    }

    /// Simulation id, once registered
    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    /// Record the simulation id
    pub fn bind(&mut self, body: BodyId) {
        self.body = Some(body);
    }
}

/// Membership of the entity's body in a named collision space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicsCollider {
    space: String,
    body: Option<BodyId>,
}

impl PhysicsCollider {
    /// Collider that will join `space` when the entity enters the world
    pub fn new(space: impl Into<String>) -> Self {
        PhysicsCollider {
            space: space.into(),
            body: None,
        }
    }

    /// Collision space name
    pub fn space(&self) -> &str {
        &self.space
    }

    /// The body shared with the entity's `PhysicsBody`, once registered
    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    /// Record the body shared with the `PhysicsBody`
    pub fn bind(&mut self, body: BodyId) {
        self.body = Some(body);
    }
}

/// Plays named animations on a visual
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationController {
    handle: VisualHandle,
    animations: Vec<String>,
    current: Option<String>,
    looping: bool,
    speed: f64,
    transform: Transform2D,
}

impl AnimationController {
    /// Controller over the given animation names
    pub fn new<I, S>(animations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnimationController {
            handle: VisualHandle::next(),
            animations: animations.into_iter().map(Into::into).collect(),
            current: None,
            looping: false,
            speed: 1.0,
            transform: Transform2D::default(),
        }
    }

    /// Handle of the animated visual
    pub fn handle(&self) -> VisualHandle {
        self.handle
    }

    /// Known animation names
    pub fn animations(&self) -> &[String] {
        &self.animations
    }

    /// Start an animation; unknown names are rejected
    pub fn play(&mut self, name: &str, looping: bool) -> bool {
        if !self.animations.iter().any(|a| a == name) {
            log::debug!("unknown animation '{}'", name);
            return false;
        }
        self.current = Some(name.to_string());
        self.looping = looping;
        true
    }

    /// Stop the current animation
    pub fn stop(&mut self) {
        self.current = None;
    }

    /// Animation being played
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Whether the current animation loops
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Playback speed multiplier
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the playback speed; non-finite or negative values are ignored
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed >= 0.0 {
            self.speed = speed;
        }
    }

    /// Last transform pushed to the animated visual
    pub fn transform(&self) -> Transform2D {
        self.transform
    }

    /// Record a new transform
    pub fn set_transform(&mut self, transform: Transform2D) {
        self.transform = transform;
    }
}
