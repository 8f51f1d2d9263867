//! `level.dat`: the world's metadata document.
//!
//! On disk the file is a gzip-compressed NBT document whose unnamed root
//! compound holds a single `Data` compound. Only `Data` is kept in memory;
//! fields this module does not interpret are carried through untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use mc_nbt::{Compression, NbtCompound, NbtValue, nbt};
use tracing::{debug, info, warn};

use crate::fs::write_atomic;
use crate::{BlockPos, GeneratorRegistry, LevelConfig, LevelError, LevelResult};

/// File name of the metadata document inside a level directory.
pub const LEVEL_FILE: &str = "level.dat";

/// `version` written into newly created levels.
pub const LEVEL_VERSION: i32 = 19133;

const DATA: &str = "Data";
const LEVEL_NAME: &str = "LevelName";
const TIME: &str = "Time";
const RANDOM_SEED: &str = "RandomSeed";
const SPAWN_X: &str = "SpawnX";
const SPAWN_Y: &str = "SpawnY";
const SPAWN_Z: &str = "SpawnZ";
const GENERATOR_NAME: &str = "generatorName";
const GENERATOR_OPTIONS: &str = "generatorOptions";

const STRING_TAG: &str = "TAG_String";
const INT_TAG: &str = "TAG_Int";
const LONG_TAG: &str = "TAG_Long";

/// Parameters for a brand new level.
#[derive(Debug, Clone)]
pub struct LevelSettings {
    pub name: String,
    pub seed: i64,
    /// Generator name; resolved through the registry when the level is created.
    pub generator: String,
    pub generator_options: String,
    pub spawn: BlockPos,
}

impl LevelSettings {
    #[must_use]
    pub fn new(name: impl Into<String>, seed: i64) -> Self {
        Self {
            name: name.into(),
            seed,
            generator: crate::DEFAULT_GENERATOR.to_string(),
            generator_options: String::new(),
            spawn: BlockPos::new(256, 70, 256),
        }
    }

    #[must_use]
    pub fn with_generator(mut self, name: impl Into<String>, options: impl Into<String>) -> Self {
        self.generator = name.into();
        self.generator_options = options.into();
        self
    }

    #[must_use]
    pub fn with_spawn(mut self, spawn: impl Into<BlockPos>) -> Self {
        self.spawn = spawn.into();
        self
    }
}

/// In-memory `Data` compound of one level, bound to its directory.
#[derive(Debug, Clone)]
pub struct LevelData {
    dir: PathBuf,
    data: NbtCompound,
    compression: Compression,
}

impl LevelData {
    /// Read and repair `level.dat` from the configured directory.
    pub fn load(config: &LevelConfig, registry: &dyn GeneratorRegistry) -> LevelResult<Self> {
        let path = config.dir.join(LEVEL_FILE);
        let bytes = fs::read(&path)?;
        let data = decode(&bytes)?;

        let mut level = Self {
            dir: config.dir.clone(),
            data,
            compression: config.compression(),
        };
        level.repair(registry);

        debug!("Loaded {} ({} fields)", path.display(), level.data.len());
        Ok(level)
    }

    /// Write a fresh `level.dat` for a new world.
    ///
    /// Fails with `AlreadyExists` rather than overwrite an existing level.
    pub fn create(
        config: &LevelConfig,
        settings: &LevelSettings,
        registry: &dyn GeneratorRegistry,
    ) -> LevelResult<Self> {
        if Self::exists(&config.dir) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already contains a level", config.dir.display()),
            )
            .into());
        }
        fs::create_dir_all(&config.dir)?;

        let generator = registry.resolve(&settings.generator).unwrap_or_else(|| {
            warn!(
                "Unknown generator {:?}, using {}",
                settings.generator,
                registry.default_generator()
            );
            registry.default_generator()
        });

        let data = nbt! {
            "version" => LEVEL_VERSION,
            "initialized" => true,
            "gameType" => 0i32,
            "hardcore" => false,
            LEVEL_NAME => settings.name.as_str(),
            RANDOM_SEED => settings.seed,
            TIME => 0i64,
            "SizeOnDisk" => 0i64,
            "LastPlayed" => now_millis(),
            SPAWN_X => settings.spawn.x,
            SPAWN_Y => settings.spawn.y,
            SPAWN_Z => settings.spawn.z,
            GENERATOR_NAME => generator,
            GENERATOR_OPTIONS => settings.generator_options.as_str(),
            "raining" => false,
            "rainTime" => 0i32,
            "thundering" => false,
            "thunderTime" => 0i32,
        };

        let level = Self {
            dir: config.dir.clone(),
            data,
            compression: config.compression(),
        };
        level.save()?;

        info!(
            "Created level {:?} at {} (generator {})",
            settings.name,
            config.dir.display(),
            generator
        );
        Ok(level)
    }

    /// Whether `dir` holds a `level.dat`.
    #[must_use]
    pub fn exists(dir: &Path) -> bool {
        dir.join(LEVEL_FILE).is_file()
    }

    /// Fill in generator fields that older or hand-made files lack.
    ///
    /// Running it again changes nothing.
    pub fn repair(&mut self, registry: &dyn GeneratorRegistry) {
        if self.data.get_string(GENERATOR_NAME).is_none() {
            let generator = registry.default_generator();
            debug!("{GENERATOR_NAME} missing, defaulting to {generator}");
            self.data.insert(GENERATOR_NAME, generator);
        }

        if self.data.get_string(GENERATOR_OPTIONS).is_none() {
            self.data.insert(GENERATOR_OPTIONS, "");
        }
    }

    /// Write the document back to `level.dat`, replacing the previous file.
    pub fn save(&self) -> LevelResult<()> {
        let bytes = self.encode()?;
        let path = self.path();
        write_atomic(&path, &bytes)?;
        debug!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Encode as an unnamed root holding `Data`.
    ///
    /// Any other `Time` tag is rewritten as a long holding [`Self::time`].
    pub fn encode(&self) -> LevelResult<Vec<u8>> {
        let mut data = self.data.clone();
        if !matches!(data.get(TIME), None | Some(NbtValue::Long(_))) {
            data.insert(TIME, self.time());
        }

        let root = nbt! {
            DATA => data,
        };
        Ok(mc_nbt::write_compressed(
            "",
            &NbtValue::Compound(root),
            self.compression,
        )?)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(LEVEL_FILE)
    }

    pub fn name(&self) -> LevelResult<&str> {
        self.required_string(LEVEL_NAME)
    }

    pub fn set_name(&mut self, name: &str) {
        self.data.insert(LEVEL_NAME, name);
    }

    /// Elapsed world ticks; 0 when unset.
    ///
    /// Any integer width is accepted since some worlds stored `Time` as an
    /// int. A non-integer tag reads as 0.
    #[must_use]
    pub fn time(&self) -> i64 {
        match self.data.get(TIME) {
            None => 0,
            Some(value) => value.as_i64_lenient().unwrap_or_else(|| {
                warn!("{TIME} is a {}, treating as 0", value.type_name());
                0
            }),
        }
    }

    /// Always stored as a long, replacing any narrower tag.
    pub fn set_time(&mut self, ticks: i64) {
        self.data.insert(TIME, ticks);
    }

    pub fn seed(&self) -> LevelResult<i64> {
        match self.data.get(RANDOM_SEED) {
            None => Err(LevelError::MissingField(RANDOM_SEED)),
            Some(NbtValue::Long(seed)) => Ok(*seed),
            Some(_) => Err(LevelError::FieldType {
                field: RANDOM_SEED,
                expected: LONG_TAG,
            }),
        }
    }

    pub fn set_seed(&mut self, seed: i64) {
        self.data.insert(RANDOM_SEED, seed);
    }

    pub fn spawn(&self) -> LevelResult<BlockPos> {
        Ok(BlockPos::new(
            self.required_int(SPAWN_X)?,
            self.required_int(SPAWN_Y)?,
            self.required_int(SPAWN_Z)?,
        ))
    }

    /// Fractional positions are floored to the containing block.
    pub fn set_spawn(&mut self, pos: impl Into<BlockPos>) {
        let pos = pos.into();
        self.data.insert(SPAWN_X, pos.x);
        self.data.insert(SPAWN_Y, pos.y);
        self.data.insert(SPAWN_Z, pos.z);
    }

    pub fn generator_name(&self) -> LevelResult<&str> {
        self.required_string(GENERATOR_NAME)
    }

    pub fn generator_options(&self) -> LevelResult<&str> {
        self.required_string(GENERATOR_OPTIONS)
    }

    /// The raw `Data` compound.
    #[must_use]
    pub fn data(&self) -> &NbtCompound {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut NbtCompound {
        &mut self.data
    }

    fn required_string(&self, field: &'static str) -> LevelResult<&str> {
        match self.data.get(field) {
            None => Err(LevelError::MissingField(field)),
            Some(NbtValue::String(s)) => Ok(s),
            Some(_) => Err(LevelError::FieldType {
                field,
                expected: STRING_TAG,
            }),
        }
    }

    fn required_int(&self, field: &'static str) -> LevelResult<i32> {
        match self.data.get(field) {
            None => Err(LevelError::MissingField(field)),
            Some(NbtValue::Int(v)) => Ok(*v),
            Some(_) => Err(LevelError::FieldType {
                field,
                expected: INT_TAG,
            }),
        }
    }
}

/// Extract the `Data` compound from compressed `level.dat` bytes.
fn decode(bytes: &[u8]) -> LevelResult<NbtCompound> {
    let (_, root) =
        mc_nbt::read_compressed(bytes).map_err(|e| LevelError::InvalidFormat(e.to_string()))?;

    let NbtValue::Compound(mut root) = root else {
        return Err(LevelError::InvalidFormat(format!(
            "root is a {}, expected TAG_Compound",
            root.type_name()
        )));
    };

    match root.remove(DATA) {
        Some(NbtValue::Compound(data)) => Ok(data),
        Some(other) => Err(LevelError::InvalidFormat(format!(
            "{DATA} is a {}, expected TAG_Compound",
            other.type_name()
        ))),
        None => Err(LevelError::InvalidFormat(format!("no {DATA} compound"))),
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
