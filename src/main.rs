//! jazz2d - headless collision simulation
//!
//! Loads a scene template, steps the collision engine at a fixed rate and
//! logs what the bodies, rays and areas end up doing.

use std::error::Error;
use std::path::Path;

use jazz2d::config::AppConfig;
use jazz2d_core::{ObjectKey, ObjectTemplate, PhysicsRole, RoleTemplate, Scene, SceneTemplate, ShapeDesc, Vec2};
use jazz2d_physics::{DebugLine, ShapeKind};

/// Fixed-step driver around a live scene
struct Simulation {
    config: AppConfig,
    scene: Scene,
    tick: u32,
}

impl Simulation {
    fn new(config: AppConfig) -> Result<Self, Box<dyn Error>> {
        let template = if Path::new(&config.scene.path).exists() {
            log::info!("Loading scene from {}", config.scene.path);
            SceneTemplate::load(&config.scene.path)?
        } else {
            log::warn!("Scene file '{}' not found, using the built-in scene", config.scene.path);
            fallback_scene()
        };

        // The application config wins over whatever the scene file carries
        let scene = template.instantiate(Some(config.physics.clone()))?;
        log::info!(
            "Scene '{}': {} objects ({} rectangles, {} circles, {} polygons, {} rays)",
            scene.name,
            scene.world().len(),
            scene.count_shapes(ShapeKind::Rectangle),
            scene.count_shapes(ShapeKind::Circle),
            scene.count_shapes(ShapeKind::Polygon),
            scene.count_shapes(ShapeKind::Ray),
        );

        Ok(Self { config, scene, tick: 0 })
    }

    fn dynamic_bodies(&self) -> Vec<ObjectKey> {
        self.scene
            .world()
            .iter()
            .filter(|(_, obj)| obj.is_body() && !obj.is_static())
            .map(|(key, _)| key)
            .collect()
    }

    /// Advance one tick: refresh the queries, then drop every dynamic body
    fn step(&mut self) -> Result<(), Box<dyn Error>> {
        self.scene.fixed_update();

        let fall = Vec2::new(0.0, self.config.simulation.fall_speed * self.config.simulation.fixed_dt);
        for key in self.dynamic_bodies() {
            let contacts = self.scene.move_and_collide(key, fall)?;
            for contact in &contacts {
                log::debug!(
                    "tick {}: {} hit {} (depth {:.3})",
                    self.tick,
                    self.name(key),
                    self.name(contact.object),
                    contact.penetration.depth,
                );
            }
        }

        self.tick += 1;
        Ok(())
    }

    fn name(&self, key: ObjectKey) -> &str {
        self.scene.world().get(key).map_or("<removed>", |obj| obj.display_name())
    }

    fn report(&self) {
        let world = self.scene.world();
        for (key, obj) in world.iter() {
            let Some(binding) = &obj.physics else {
                continue;
            };
            match &binding.role {
                PhysicsRole::Body { .. } => {
                    if let Some(position) = world.world_position(key) {
                        log::info!("{} at ({:.2}, {:.2})", obj.display_name(), position.x, position.y);
                    }
                }
                PhysicsRole::Ray(_) => match self.scene.ray_hit(key) {
                    Some(hit) => log::info!(
                        "{} hits {} at ({:.2}, {:.2})",
                        obj.display_name(),
                        self.name(hit.object),
                        hit.point.x,
                        hit.point.y,
                    ),
                    None => log::info!("{} hits nothing", obj.display_name()),
                },
                PhysicsRole::Area(_) => {
                    let entered: Vec<&str> = self.scene.entered(key).iter().map(|k| self.name(*k)).collect();
                    log::info!("{} contains {:?}", obj.display_name(), entered);
                }
            }
        }

        if self.config.debug.export_debug_lines {
            let lines = self.scene.debug_lines();
            let bytes = DebugLine::as_bytes(&lines);
            log::info!("Exported {} debug lines ({} bytes)", lines.len(), bytes.len());
        }
    }
}

/// Scene used when no scene file is available
fn fallback_scene() -> SceneTemplate {
    let shape = |kind: &str| ShapeDesc {
        kind: kind.to_string(),
        ..Default::default()
    };

    let mut template = SceneTemplate::new("Fallback");
    template.add_object(
        ObjectTemplate::new(Vec2::new(0.0, 100.0))
            .with_name("floor")
            .with_collider(ShapeDesc {
                width: Some(200.0),
                height: Some(20.0),
                ..shape("Rect")
            })
            .with_role(RoleTemplate::Body { is_static: true }),
    );
    template.add_object(
        ObjectTemplate::new(Vec2::ZERO)
            .with_name("ball")
            .with_tag("falling")
            .with_collider(ShapeDesc {
                radius: Some(10.0),
                ..shape("Circle")
            })
            .with_role(RoleTemplate::Body { is_static: false }),
    );
    template
}

fn main() {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    // RUST_LOG takes precedence over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()))
        .init();
    log::info!("Starting jazz2d");

    if let Err(e) = run(config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(config: AppConfig) -> Result<(), Box<dyn Error>> {
    let ticks = config.simulation.ticks;
    let mut simulation = Simulation::new(config)?;
    for _ in 0..ticks {
        simulation.step()?;
    }
    // One last refresh so rays and areas see the final positions
    simulation.scene.fixed_update();
    log::info!("Simulated {} ticks", simulation.tick);
    simulation.report();
    Ok(())
}
