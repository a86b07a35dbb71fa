//! RON script loader

use crate::error::{Error, Result};
use crate::schema::GeneratorTypeDef;
use ampere_core::TypeRef;
use ampere_sim::{GeneratorMeta, SimConfig, TypeCatalog};
use indexmap::IndexMap;
use ron::extensions::Extensions;
use ron::Options;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Loaded game definitions
#[derive(Debug, Clone, Default)]
pub struct GameDefs {
    /// Generator types by ID, in load order
    pub generators: IndexMap<TypeRef, GeneratorTypeDef>,
    /// Simulator configuration (defaults unless a config file was loaded)
    pub config: SimConfig,
}

impl GameDefs {
    /// Create empty game definitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a generator type definition
    pub fn get_generator(&self, id: &TypeRef) -> Option<&GeneratorTypeDef> {
        self.generators.get(id)
    }

    /// Generator types in load order
    pub fn generators(&self) -> impl Iterator<Item = &GeneratorTypeDef> {
        self.generators.values()
    }
}

impl TypeCatalog for GameDefs {
    fn generator_meta(&self, type_ref: &TypeRef) -> Option<GeneratorMeta> {
        self.generators.get(type_ref).map(GeneratorTypeDef::meta)
    }
}

/// Parse RON with `implicit_some`, so optional wire fields can be written bare
fn parse<T: DeserializeOwned>(content: &str) -> Result<T> {
    let options = Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
    Ok(options.from_str(content)?)
}

/// Loader for RON game scripts
pub struct Loader {
    defs: GameDefs,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            defs: GameDefs::new(),
        }
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        debug!(file = %path.display(), "loading script");

        if filename.contains("config") {
            self.load_config_str(&content)?;
        } else if filename.contains("generator") || content.contains("generators:") {
            self.load_str(&content)?;
        } else {
            self.load_single_generator(&content)?;
        }
        Ok(())
    }

    /// Load generator types from a RON string of the form `(generators: [...])`
    pub fn load_str(&mut self, content: &str) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct GeneratorFile {
            generators: Vec<GeneratorTypeDef>,
        }

        let file: GeneratorFile = parse(content)?;
        for generator in file.generators {
            self.insert(generator)?;
        }
        Ok(())
    }

    /// Load one generator type definition
    pub fn load_single_generator(&mut self, content: &str) -> Result<()> {
        let generator: GeneratorTypeDef = parse(content)
            .map_err(|_| Error::InvalidSchema("Could not parse as a generator type".to_string()))?;
        self.insert(generator)
    }

    /// Load the simulator configuration from a RON string
    ///
    /// Missing fields keep their defaults.
    pub fn load_config_str(&mut self, content: &str) -> Result<()> {
        let config: SimConfig = parse(content)?;
        if config.min_delta_secs < 0.0 || config.cooling_rate < 0.0 {
            return Err(Error::InvalidSchema(
                "min_delta_secs and cooling_rate must be non-negative".to_string(),
            ));
        }
        self.defs.config = config;
        Ok(())
    }

    fn insert(&mut self, generator: GeneratorTypeDef) -> Result<()> {
        generator.validate()?;
        let id = generator.id.clone();
        if self.defs.generators.contains_key(&id) {
            return Err(Error::DuplicateDefinition(id.to_string()));
        }
        self.defs.generators.insert(id, generator);
        Ok(())
    }

    /// Load all RON files from a directory
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for file_path in entries {
            if file_path.extension().map(|e| e == "ron").unwrap_or(false) {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    /// Finish loading and return the game definitions
    pub fn finish(self) -> GameDefs {
        self.defs
    }

    /// Get the current definitions (for inspection during loading)
    pub fn defs(&self) -> &GameDefs {
        &self.defs
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const GENERATORS: &str = r#"
    (
        generators: [
            (
                id: "solar",
                name: "Solar Panel",
                cost: (plain: 10),
                production: (plain: 1.5),
            ),
            (
                id: "coal",
                name: "Coal Plant",
                description: "Cheap, hot",
                cost: (mantissa: 250000, tier: 1),
                production: (mantissa: 12000, tier: 0),
                heat_rate: 4.0,
                tolerance: 80.0,
                build_secs: 20.0,
            ),
        ]
    )
    "#;

    #[test]
    fn test_load_generators() {
        let mut loader = Loader::new();
        loader.load_str(GENERATORS).unwrap();

        let defs = loader.finish();
        let solar = defs.get_generator(&TypeRef::from("solar")).unwrap();
        assert_eq!(solar.cost.to_plain(), 10.0);
        assert_eq!(solar.production.to_wire(), (1_500, 0));
        assert_eq!(solar.tolerance, 100.0);

        let coal = defs.get_generator(&TypeRef::from("coal")).unwrap();
        assert_eq!(coal.cost.to_plain(), 2_500.0);
        assert_eq!(coal.build_secs, 20.0);

        let ids: Vec<_> = defs.generators().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["solar", "coal"]);
    }

    #[test]
    fn test_catalog_lookup() {
        let mut loader = Loader::new();
        loader.load_str(GENERATORS).unwrap();
        let defs = loader.finish();

        let meta = defs.generator_meta(&TypeRef::from("coal")).unwrap();
        assert_eq!(meta.heat_rate, 4.0);
        assert_eq!(meta.tolerance, 80.0);
        assert!(defs.generator_meta(&TypeRef::from("fusion")).is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut loader = Loader::new();
        loader.load_str(GENERATORS).unwrap();
        let err = loader.load_str(GENERATORS).unwrap_err();
        assert!(matches!(err, Error::DuplicateDefinition(ref id) if id == "solar"));
    }

    #[test]
    fn test_load_single_generator() {
        let mut loader = Loader::new();
        loader
            .load_single_generator(r#"(id: "wind", name: "Wind Turbine", heat_rate: 1.0)"#)
            .unwrap();
        assert!(loader.defs().get_generator(&TypeRef::from("wind")).is_some());

        assert!(matches!(
            loader.load_single_generator("(nonsense: true)"),
            Err(Error::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_invalid_definition() {
        let mut loader = Loader::new();
        let result = loader.load_str(r#"(generators: [(id: "bad", name: "Bad", tolerance: -5.0)])"#);
        assert!(matches!(result, Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn test_load_config() {
        let mut loader = Loader::new();
        loader
            .load_config_str("(max_delta_secs: 300.0, base_max_generators: 12)")
            .unwrap();
        let config = &loader.defs().config;
        assert_eq!(config.max_delta_secs, Some(300.0));
        assert_eq!(config.base_max_generators, 12);
        assert_eq!(config.cooling_rate, 1.0);

        assert!(loader.load_config_str("(cooling_rate: -1.0)").is_err());
    }

    #[test]
    fn test_load_directory() {
        let dir = std::env::temp_dir().join(format!("ampere-script-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("generators.ron"), GENERATORS).unwrap();
        fs::write(dir.join("config.ron"), "(cooling_rate: 2.0)").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let mut loader = Loader::new();
        loader.load_directory(&dir).unwrap();
        let defs = loader.finish();
        assert_eq!(defs.generators.len(), 2);
        assert_eq!(defs.config.cooling_rate, 2.0);

        fs::remove_dir_all(&dir).unwrap();
        assert!(Loader::new().load_directory(PathBuf::from("/nonexistent/ampere")).is_err());
    }
}
