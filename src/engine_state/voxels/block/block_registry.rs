//! # Block Registry
//!
//! The registry answers the four questions the pipeline asks about a block id:
//! is it opaque, is it solid, which atlas region does a given face sample, and
//! which id does a block name resolve to.
//!
//! ## Loading
//!
//! A registry is either built in code ([`BlockRegistry::with_defaults`]) or read
//! from JSON:
//!
//! ```json
//! { "blocks": [
//!     { "id": 1, "name": "Stone", "textures": { "all": { "uv": [0.0, 0.0, 0.0625, 0.0625] } } },
//!     { "id": 3, "name": "Grass",
//!       "textures": { "top": { "uv": [...] }, "bottom": { "uv": [...] }, "side": { "uv": [...] } } },
//!     { "id": 5, "name": "Water", "opaque": false, "solid": false }
//! ] }
//! ```
//!
//! `opaque` and `solid` default to `true`. `side` covers the four horizontal faces
//! and `front` then overrides SOUTH. Id 0 is always air and may not be redefined.
//!
//! The registry must be fully built before any chunk is generated or meshed; it is
//! immutable afterwards and shared as `Arc<BlockRegistry>`.

use std::collections::HashMap;
use std::path::Path;

use log::info;
use serde::Deserialize;

use super::{BlockDefinition, BlockId, BlockSide, UvRect, AIR};
use crate::error::RegistryError;

/// Number of tiles along one side of the atlas assumed by the built-in registry.
pub const DEFAULT_ATLAS_TILES: u32 = 16;

#[derive(Deserialize)]
struct RegistryFile {
    blocks: Vec<BlockEntry>,
}

#[derive(Deserialize)]
struct BlockEntry {
    id: BlockId,
    name: String,
    #[serde(default = "default_true")]
    opaque: bool,
    #[serde(default = "default_true")]
    solid: bool,
    #[serde(default)]
    textures: Option<TextureEntry>,
}

#[derive(Deserialize, Default)]
struct TextureEntry {
    all: Option<TextureRegion>,
    top: Option<TextureRegion>,
    bottom: Option<TextureRegion>,
    side: Option<TextureRegion>,
    front: Option<TextureRegion>,
}

#[derive(Deserialize, Clone, Copy)]
struct TextureRegion {
    uv: [f32; 4],
}

impl From<TextureRegion> for UvRect {
    fn from(region: TextureRegion) -> Self {
        let [u0, v0, u1, v1] = region.uv;
        UvRect::new([u0, v0], [u1, v1])
    }
}

fn default_true() -> bool {
    true
}

impl TextureEntry {
    fn face_uvs(&self) -> [UvRect; 6] {
        let mut uvs = [UvRect::default(); 6];
        if let Some(all) = self.all {
            return [all.into(); 6];
        }
        if let Some(top) = self.top {
            uvs[BlockSide::TOP.index()] = top.into();
        }
        if let Some(bottom) = self.bottom {
            uvs[BlockSide::BOTTOM.index()] = bottom.into();
        }
        if let Some(side) = self.side {
            for face in [BlockSide::NORTH, BlockSide::SOUTH, BlockSide::EAST, BlockSide::WEST] {
                uvs[face.index()] = side.into();
            }
        }
        if let Some(front) = self.front {
            uvs[BlockSide::SOUTH.index()] = front.into();
        }
        uvs
    }
}

/// Lookup table from block id to [`BlockDefinition`].
///
/// # Examples
///
/// ```
/// use voxel_world::{BlockRegistry, BlockSide, AIR};
///
/// let registry = BlockRegistry::with_defaults();
/// let stone = registry.by_name("Stone").unwrap();
/// assert!(registry.is_opaque(stone));
/// assert!(!registry.is_opaque(AIR));
/// let uv = registry.face_uv(stone, BlockSide::TOP);
/// assert!(uv.max[0] > uv.min[0]);
/// ```
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    blocks: Vec<BlockDefinition>,
    names: HashMap<String, BlockId>,
    air: BlockDefinition,
}

impl BlockRegistry {
    /// Builds a registry from a list of definitions.
    ///
    /// # Errors
    /// Fails when a definition claims id 0, or when an id or a name repeats.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = BlockDefinition>,
    ) -> Result<Self, RegistryError> {
        let air = BlockDefinition::air();
        let mut blocks = vec![air.clone()];
        let mut names = HashMap::new();
        let mut defined = vec![false; BlockId::MAX as usize + 1];
        defined[AIR as usize] = true;
        names.insert(air.name.clone(), AIR);

        for definition in definitions {
            if definition.id == AIR {
                return Err(RegistryError::ReservedAirId(definition.name));
            }
            if defined[definition.id as usize] {
                return Err(RegistryError::DuplicateId(definition.id));
            }
            if names.contains_key(&definition.name) {
                return Err(RegistryError::DuplicateName(definition.name));
            }
            defined[definition.id as usize] = true;

            let index = definition.id as usize;
            if index >= blocks.len() {
                blocks.resize(index + 1, air.clone());
            }
            names.insert(definition.name.clone(), definition.id);
            blocks[index] = definition;
        }

        Ok(Self { blocks, names, air })
    }

    /// Parses a registry from its JSON description.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_json::from_str(json)?;
        let definitions = file.blocks.into_iter().map(|entry| BlockDefinition {
            face_uvs: entry.textures.unwrap_or_default().face_uvs(),
            id: entry.id,
            name: entry.name,
            opaque: entry.opaque,
            solid: entry.solid,
        });
        let registry = Self::from_definitions(definitions)?;
        info!("Loaded {} block definitions", registry.len());
        Ok(registry)
    }

    /// Reads and parses a registry JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// The built-in block set: Stone, Dirt, Grass, Sand, Water and Snow on a
    /// 16x16 atlas.
    pub fn with_defaults() -> Self {
        let tile = |column| UvRect::atlas_tile(column, 0, DEFAULT_ATLAS_TILES);
        let uniform = |id, name: &str, column| BlockDefinition {
            id,
            name: name.to_string(),
            opaque: true,
            solid: true,
            face_uvs: [tile(column); 6],
        };

        let mut grass = uniform(3, "Grass", 3);
        grass.face_uvs[BlockSide::TOP.index()] = tile(2);
        grass.face_uvs[BlockSide::BOTTOM.index()] = tile(1);

        let mut water = uniform(5, "Water", 5);
        water.opaque = false;
        water.solid = false;

        let definitions = vec![
            uniform(1, "Stone", 0),
            uniform(2, "Dirt", 1),
            grass,
            uniform(4, "Sand", 4),
            water,
            uniform(6, "Snow", 6),
        ];

        Self::from_definitions(definitions).unwrap_or_else(|_| Self::empty())
    }

    /// A registry that only knows air.
    pub fn empty() -> Self {
        let air = BlockDefinition::air();
        let mut names = HashMap::new();
        names.insert(air.name.clone(), AIR);
        Self {
            blocks: vec![air.clone()],
            names,
            air,
        }
    }

    /// Returns the definition for `id`, or air for unknown ids.
    pub fn definition(&self, id: BlockId) -> &BlockDefinition {
        self.blocks.get(id as usize).unwrap_or(&self.air)
    }

    /// Whether the block hides faces of its neighbours.
    pub fn is_opaque(&self, id: BlockId) -> bool {
        self.definition(id).opaque
    }

    /// Whether the block occupies space.
    pub fn is_solid(&self, id: BlockId) -> bool {
        self.definition(id).solid
    }

    /// Atlas region sampled by `face` of block `id`.
    pub fn face_uv(&self, id: BlockId, face: BlockSide) -> UvRect {
        self.definition(id).face_uvs[face.index()]
    }

    /// Resolves a block name to its id.
    pub fn by_name(&self, name: &str) -> Option<BlockId> {
        self.names.get(name).copied()
    }

    /// First opaque block in id order, if any.
    pub fn first_opaque(&self) -> Option<BlockId> {
        self.blocks.iter().find(|block| block.opaque).map(|block| block.id)
    }

    /// Number of named blocks, air included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when only air is defined.
    pub fn is_empty(&self) -> bool {
        self.names.len() <= 1
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
