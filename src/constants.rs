// Entity layout constants
pub const ACTION_SLOTS: usize = 5;
pub const EQUIPMENT_SLOTS: usize = 4;

// Stat derivation constants
pub const HP_PER_STR: i64 = 3;
pub const CRIT_PER_DEX: f64 = 0.2;
pub const CRIT_DAMAGE_BASE: f64 = 1.5;

// Experience and progression constants
pub const MAX_HERO_LEVEL: u32 = 20;
pub const MAX_CRAFTER_LEVEL: u32 = 50;
pub const LEVEL_UP_ITERATION_CAP: u32 = 100;

// Combat constants
pub const MAX_COMBAT_LOOPS: u32 = 5;
pub const QUEST_FAILED_SCORE: f64 = -1.0;

// Crafting constants
pub const CRAFT_SLOTS: usize = 2;
pub const MAX_LOADED_MATERIALS: usize = 3;
pub const MASTERY_CAP: u32 = 10;
pub const LEVEL_DIFF_CLAMP: f64 = 10.0;
pub const MIN_QUALITY: f64 = 1.0;
pub const MAX_QUALITY: f64 = 100.0;
pub const BASE_QUALITY: f64 = 100.0; // non-crafted and basic cards
pub const CRAFT_SECONDS_PER_LEVEL: u64 = 60;

// Card catalog constants
pub const BASIC_ACTION_ID: u32 = 0;

// Economy constants
pub const STARTING_GOLD: i64 = 50;
pub const HERO_HIRE_BASE_COST: i64 = 50;

// Save system constants
pub const SAVE_VERSION_MAGIC: u64 = 0x4445434B46524700; // "DECKFRG\0" in hex
