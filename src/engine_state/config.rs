//! # Engine Configuration
//!
//! Every tunable of the voxel world in one immutable structure, built once at
//! startup and shared read-only with the systems that need it.
//!
//! ## Loading
//!
//! `EngineConfig::load` reads `voxel_world.json` from the working directory when it
//! exists and falls back to defaults otherwise. Missing fields take their default
//! values (`#[serde(default)]` on every section), so a file only needs to list what
//! it overrides:
//!
//! ```json
//! { "world": { "chunk_size": 32 }, "streaming": { "load_radius": 6, "unload_radius": 9 } }
//! ```
//!
//! ## Validation
//!
//! Chunk size and height must be powers of two because block indices are computed
//! with shifts. `validate` rejects anything the index arithmetic or the face packing
//! cannot represent, and the caller treats a `ConfigError` as fatal.

use std::{collections::HashMap, fmt, path::Path};

use serde::{Deserialize, Serialize};

use crate::application_state::input_state::Control;

/// File name looked up in the working directory by [`EngineConfig::load`].
pub const CONFIG_FILE_NAME: &str = "voxel_world.json";

/// Environment variable consulted for the world seed when the file does not set one.
pub const SEED_ENV_VAR: &str = "VOXEL_WORLD_SEED";

/// Largest horizontal chunk size the packed face format can address.
pub const MAX_CHUNK_SIZE: u32 = 64;
/// Largest chunk height the packed face format can address.
pub const MAX_CHUNK_HEIGHT: u32 = 512;

/// Reasons a configuration is rejected at startup.
#[derive(Debug)]
pub enum ConfigError {
    /// A dimension that must be a power of two is not.
    NonPowerOfTwo {
        /// Name of the offending field
        field: &'static str,
        /// Value that was supplied
        value: u32,
    },
    /// A value lies outside its permitted range.
    OutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// Value that was supplied
        value: f64,
        /// Smallest accepted value
        min: f64,
        /// Largest accepted value
        max: f64,
    },
    /// The configuration file is not valid JSON for this structure.
    Parse(serde_json::Error),
    /// The configuration file exists but could not be read.
    Io(std::io::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPowerOfTwo { field, value } => {
                write!(f, "{field} must be a power of two, got {value}")
            }
            ConfigError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} must be within [{min}, {max}], got {value}"),
            ConfigError::Parse(err) => write!(f, "invalid configuration file: {err}"),
            ConfigError::Io(err) => write!(f, "could not read configuration file: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            ConfigError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

/// Terrain and decoration parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Horizontal chunk edge length in blocks (power of two)
    pub chunk_size: u32,
    /// Chunk column height in blocks (power of two)
    pub chunk_height: u32,
    /// Highest y level filled with water by the water plane
    pub sea_level: i32,
    /// Terrain height for a noise value of zero
    pub base_height: f32,
    /// Height change per unit of curved noise
    pub height_amplitude: f32,
    /// Surfaces up to this many blocks above sea level are sand
    pub beach_band: i32,
    /// Depth of the dirt layer below the surface block
    pub dirt_depth: i32,
    /// Number of noise octaves summed per sample
    pub noise_octaves: u32,
    /// Frequency of the first octave, in cycles per block
    pub noise_frequency: f64,
    /// Amplitude of the first octave
    pub noise_amplitude: f64,
    /// Frequency multiplier between octaves
    pub noise_lacunarity: f64,
    /// Amplitude multiplier between octaves
    pub noise_persistence: f64,
    /// Whether chunks with a full neighbor set get trees
    pub trees: bool,
    /// Whether air at or below sea level is filled with water
    pub water: bool,
    /// Chance per eligible grass column of starting a tree
    pub tree_density: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            chunk_height: 128,
            sea_level: 40,
            base_height: 46.0,
            height_amplitude: 24.0,
            beach_band: 2,
            dirt_depth: 3,
            noise_octaves: 4,
            noise_frequency: 0.008,
            noise_amplitude: 1.0,
            noise_lacunarity: 2.0,
            noise_persistence: 0.5,
            trees: true,
            water: true,
            tree_density: 0.012,
        }
    }
}

/// Chunk streaming radii, in chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Half-width of the square of chunks kept loaded around the focus
    pub load_radius: i32,
    /// Chunks farther than this (planar distance) from the focus are evicted
    pub unload_radius: i32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_radius: 4,
            unload_radius: 7,
        }
    }
}

/// Physics integrator tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration in blocks per second squared
    pub gravity: f32,
    /// Distance below the feet probed for ground contact
    pub ground_probe: f32,
    /// Velocities with every component below this skip the sweep
    pub velocity_epsilon: f32,
    /// Longest displacement swept in a single sub-step
    pub max_step: f32,
    /// Reach of block edits
    pub interaction_distance: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 28.0,
            ground_probe: 0.05,
            velocity_epsilon: 1.0e-4,
            max_step: 0.45,
            interaction_distance: 6.0,
        }
    }
}

/// Default movement parameters given to the player entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MovementDefaults {
    /// Walking speed in blocks per second
    pub walk_speed: f32,
    /// Running speed in blocks per second
    pub run_speed: f32,
    /// Crouching speed in blocks per second
    pub crouch_speed: f32,
    /// Flying speed in blocks per second
    pub fly_speed: f32,
    /// Apex height of a jump in blocks
    pub jump_height: f32,
    /// Collider half extents (x, y, z)
    pub half_extents: [f32; 3],
    /// Eye height above the collider's centre
    pub eye_offset: f32,
}

impl Default for MovementDefaults {
    fn default() -> Self {
        Self {
            walk_speed: 4.3,
            run_speed: 7.0,
            crouch_speed: 1.8,
            fly_speed: 11.0,
            jump_height: 1.25,
            half_extents: [0.3, 0.9, 0.3],
            eye_offset: 0.72,
        }
    }
}

/// Camera parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Degrees of rotation per unit of mouse delta
    pub sensitivity: f32,
    /// Orbit distance in third person
    pub third_person_distance: f32,
    /// Smoothing time in seconds; zero snaps to the target
    pub smooth_time: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 70.0,
            near: 0.05,
            far: 600.0,
            sensitivity: 0.12,
            third_person_distance: 5.0,
            smooth_time: 0.05,
        }
    }
}

/// Which mesher produces the draw buffers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MeshingStrategy {
    /// Faces are extracted on the CPU and uploaded
    Cpu,
    /// Faces are generated by a compute pass and drawn indirectly
    Gpu,
}

/// Renderer options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Meshing strategy
    pub meshing: MeshingStrategy,
    /// Optional texture strip (16 px wide, one 16x16 tile per layer)
    pub block_texture_path: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            meshing: MeshingStrategy::Cpu,
            block_texture_path: Some(String::from("assets/textures/blocks.png")),
        }
    }
}

/// Binding of each logical control to a platform key or button name.
///
/// Names are winit `KeyCode` variant names (`"KeyW"`, `"Space"`, `"F5"`) or
/// `"MouseLeft"`, `"MouseRight"`, `"MouseMiddle"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeyBindings {
    /// Control to key name
    pub bindings: HashMap<Control, String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings = [
            (Control::Forward, "KeyW"),
            (Control::Back, "KeyS"),
            (Control::Left, "KeyA"),
            (Control::Right, "KeyD"),
            (Control::Jump, "Space"),
            (Control::Sprint, "ShiftLeft"),
            (Control::Crouch, "ControlLeft"),
            (Control::Attack, "MouseLeft"),
            (Control::Place, "MouseRight"),
            (Control::CameraToggle, "F5"),
            (Control::FlyToggle, "KeyF"),
            (Control::NextBlock, "KeyE"),
            (Control::CycleMode, "KeyM"),
        ]
        .into_iter()
        .map(|(control, key)| (control, key.to_string()))
        .collect();

        Self { bindings }
    }
}

/// The full engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed world seed; drawn at startup when absent
    pub seed: Option<u32>,
    /// Terrain parameters
    pub world: WorldConfig,
    /// Streaming radii
    pub streaming: StreamingConfig,
    /// Physics tunables
    pub physics: PhysicsConfig,
    /// Player movement defaults
    pub movement: MovementDefaults,
    /// Camera parameters
    pub camera: CameraConfig,
    /// Renderer options
    pub render: RenderConfig,
    /// Input bindings
    pub key_bindings: KeyBindings,
}

impl EngineConfig {
    /// Loads and validates the configuration from the working directory.
    ///
    /// # Returns
    /// The validated configuration, or the first problem found
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE_NAME))
    }

    /// Loads and validates the configuration from `path`, defaulting when it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            log::info!("Loading configuration from {}", path.display());
            let text = std::fs::read_to_string(path)?;
            Self::from_json(&text)?
        } else {
            log::info!("No {} found, using default configuration", path.display());
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration from JSON without validating it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Checks every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        check_power_of_two("world.chunk_size", world.chunk_size)?;
        check_power_of_two("world.chunk_height", world.chunk_height)?;
        check_range("world.chunk_size", world.chunk_size as f64, 2.0, MAX_CHUNK_SIZE as f64)?;
        check_range(
            "world.chunk_height",
            world.chunk_height as f64,
            2.0,
            MAX_CHUNK_HEIGHT as f64,
        )?;

        let top = world.chunk_height as f64 - 1.0;
        check_range("world.sea_level", world.sea_level as f64, 0.0, top)?;
        check_range("world.base_height", world.base_height as f64, 0.0, top)?;
        check_range("world.dirt_depth", world.dirt_depth as f64, 0.0, top)?;
        check_range("world.beach_band", world.beach_band as f64, 0.0, top)?;
        check_range("world.noise_octaves", world.noise_octaves as f64, 1.0, 16.0)?;
        check_range("world.tree_density", world.tree_density, 0.0, 1.0)?;

        let streaming = &self.streaming;
        check_range("streaming.load_radius", streaming.load_radius as f64, 0.0, 32.0)?;
        // The corners of the loaded square sit at radius * sqrt(2).
        let min_unload = (streaming.load_radius as f64 * std::f64::consts::SQRT_2).ceil();
        check_range(
            "streaming.unload_radius",
            streaming.unload_radius as f64,
            min_unload,
            64.0,
        )?;

        let physics = &self.physics;
        check_range("physics.gravity", physics.gravity as f64, 0.0, 1000.0)?;
        check_range("physics.ground_probe", physics.ground_probe as f64, 0.001, 0.5)?;
        check_range("physics.max_step", physics.max_step as f64, 0.01, 1.0)?;

        let camera = &self.camera;
        check_range("camera.fov_degrees", camera.fov_degrees as f64, 10.0, 170.0)?;
        check_range("camera.near", camera.near as f64, 0.001, camera.far as f64)?;

        Ok(())
    }

    /// Picks the world seed: the configured one, then `VOXEL_WORLD_SEED`, then a random draw.
    pub fn resolve_seed(&self) -> u32 {
        if let Some(seed) = self.seed {
            log::info!("Using configured seed {seed}");
            return seed;
        }

        if let Some(seed) = std::env::var(SEED_ENV_VAR)
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
        {
            log::info!("Using seed {seed} from {SEED_ENV_VAR}");
            return seed;
        }

        let seed = fastrand::u32(..);
        log::info!("Drew random seed {seed}");
        seed
    }
}

fn check_power_of_two(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigError::NonPowerOfTwo { field, value })
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
