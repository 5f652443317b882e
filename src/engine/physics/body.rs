use rapier2d::prelude::*;

pub use rapier2d::prelude::{ColliderHandle, RigidBodyHandle};

/// Builder for creating rigid bodies with common configurations
pub struct BodyBuilder {
    body_type: RigidBodyType,
    position: Isometry<Real>,
    linvel: Vector<Real>,
    angvel: Real,
    gravity_scale: Real,
    linear_damping: Real,
    angular_damping: Real,
    can_sleep: bool,
    locked_axes: LockedAxes,
}

impl BodyBuilder {
    /// Create a new dynamic body (affected by forces and collisions)
    pub fn new_dynamic() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            position: Isometry::identity(),
            linvel: Vector::zeros(),
            angvel: 0.0,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            can_sleep: true,
            locked_axes: LockedAxes::empty(),
        }
    }

    /// Create a new kinematic position-based body (not affected by forces)
    pub fn new_kinematic_position_based() -> Self {
        Self {
            body_type: RigidBodyType::KinematicPositionBased,
            position: Isometry::identity(),
            linvel: Vector::zeros(),
            angvel: 0.0,
            gravity_scale: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            can_sleep: false,
            locked_axes: LockedAxes::empty(),
        }
    }

    /// Create a new fixed (static) body (completely immovable)
    pub fn new_fixed() -> Self {
        Self {
            body_type: RigidBodyType::Fixed,
            position: Isometry::identity(),
            linvel: Vector::zeros(),
            angvel: 0.0,
            gravity_scale: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            can_sleep: false,
            locked_axes: LockedAxes::empty(),
        }
    }

    /// Set the initial position of the body
    pub fn position(mut self, x: Real, y: Real) -> Self {
        self.position = Isometry::translation(x, y);
        self
    }

    /// Set the initial position and rotation
    pub fn position_rotation(mut self, x: Real, y: Real, angle: Real) -> Self {
        self.position = Isometry::new(vector![x, y], angle);
        self
    }

    /// Set the initial linear velocity
    pub fn linvel(mut self, x: Real, y: Real) -> Self {
        self.linvel = vector![x, y];
        self
    }

    /// Set the initial angular velocity (radians per second)
    pub fn angvel(mut self, angvel: Real) -> Self {
        self.angvel = angvel;
        self
    }

    /// Set the gravity scale (1.0 = normal gravity, 0.0 = no gravity)
    pub fn gravity_scale(mut self, scale: Real) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Set linear damping (0.0 = none)
    pub fn linear_damping(mut self, damping: Real) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Set angular damping (0.0 = none)
    pub fn angular_damping(mut self, damping: Real) -> Self {
        self.angular_damping = damping;
        self
    }

    /// Set whether the body can sleep when inactive
    pub fn can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    /// Lock rotation (useful for upright characters)
    pub fn lock_rotation(mut self) -> Self {
        self.locked_axes = LockedAxes::ROTATION_LOCKED;
        self
    }

    /// Build the rigid body
    pub fn build(self) -> RigidBody {
        RigidBodyBuilder::new(self.body_type)
            .position(self.position)
            .linvel(self.linvel)
            .angvel(self.angvel)
            .gravity_scale(self.gravity_scale)
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .can_sleep(self.can_sleep)
            .locked_axes(self.locked_axes)
            .build()
    }
}

/// Builder for creating colliders with common configurations
pub struct ColliderBuilder2D {
    shape: SharedShape,
    is_sensor: bool,
    friction: Real,
    restitution: Real,
    density: Option<Real>,
    mass: Option<Real>,
    active_events: ActiveEvents,
    active_hooks: ActiveHooks,
}

impl ColliderBuilder2D {
    fn with_shape(shape: SharedShape) -> Self {
        Self {
            shape,
            is_sensor: false,
            friction: 0.5,
            restitution: 0.0,
            density: Some(1.0),
            mass: None,
            active_events: ActiveEvents::COLLISION_EVENTS,
            active_hooks: ActiveHooks::empty(),
        }
    }

    /// Create a ball-shaped collider
    pub fn ball(radius: Real) -> Self {
        Self::with_shape(SharedShape::ball(radius))
    }

    /// Create a box-shaped collider from half-extents
    pub fn cuboid(half_width: Real, half_height: Real) -> Self {
        Self::with_shape(SharedShape::cuboid(half_width, half_height))
    }

    /// Make this a sensor (detects contacts but doesn't cause physical response)
    pub fn sensor(mut self, is_sensor: bool) -> Self {
        self.is_sensor = is_sensor;
        self
    }

    /// Set friction coefficient (0.0 = no friction, 1.0 = high friction)
    pub fn friction(mut self, friction: Real) -> Self {
        self.friction = friction;
        self
    }

    /// Set restitution/bounciness (0.0 = no bounce, 1.0 = perfect bounce)
    pub fn restitution(mut self, restitution: Real) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set density (mass will be calculated from shape volume)
    pub fn density(mut self, density: Real) -> Self {
        self.density = Some(density);
        self.mass = None;
        self
    }

    /// Set mass directly (overrides density)
    pub fn mass(mut self, mass: Real) -> Self {
        self.mass = Some(mass);
        self.density = None;
        self
    }

    /// Enable post-solve force reports for this collider
    pub fn contact_force_events(mut self) -> Self {
        self.active_events |= ActiveEvents::CONTACT_FORCE_EVENTS;
        self
    }

    /// Route this collider's contact pairs through the pre-solve filter
    pub fn pre_solve_filter(mut self) -> Self {
        self.active_hooks |= ActiveHooks::FILTER_CONTACT_PAIRS;
        self
    }

    /// Build the collider
    pub fn build(self) -> Collider {
        let mut builder = ColliderBuilder::new(self.shape)
            .sensor(self.is_sensor)
            .friction(self.friction)
            .restitution(self.restitution)
            .active_events(self.active_events)
            .active_hooks(self.active_hooks);

        // Set mass or density
        if let Some(mass) = self.mass {
            builder = builder.mass(mass);
        } else if let Some(density) = self.density {
            builder = builder.density(density);
        }

        builder.build()
    }
}
